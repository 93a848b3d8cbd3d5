use crate::analyzer::swing_analyzer::{SwingKind, SwingPoint};
use crate::config::PriceActionConfig;
use crate::indicator::IndicatorSeries;
use crate::model::Candle;
use log::debug;
use serde::{Deserialize, Serialize};

/// 거부 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionKind {
    /// 지지(스윙 저점)를 찍고 위에서 마감
    Bullish,
    /// 저항(스윙 고점)을 찍고 아래에서 마감
    Bearish,
}

/// 스윙 레벨 꼬리 거부
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub index: usize,
    pub kind: RejectionKind,
    /// 거부된 스윙 가격
    pub level: f64,
}

/// 가격 행동(거부) 분석기
///
/// 캔들 i마다 최근 `rejection_window`개 캔들 안에서 확정된 가장 최근 스윙을 찾고,
/// 그 레벨을 허용 오차 안에서 건드린 뒤 반대편에서 마감했는지 확인합니다.
/// 스윙은 오른쪽 윈도우가 i 이전에 닫힌 경우(`index + right_bars < i`)만 사용합니다.
#[derive(Debug, Clone)]
pub struct PriceActionAnalyzer {
    config: PriceActionConfig,
    right_bars: usize,
}

impl PriceActionAnalyzer {
    /// 새 가격 행동 분석기 생성
    ///
    /// # Arguments
    /// * `config` - 거부 판정 설정
    /// * `right_bars` - 스윙 확정에 필요한 오른쪽 캔들 수
    pub fn new(config: PriceActionConfig, right_bars: usize) -> Self {
        PriceActionAnalyzer { config, right_bars }
    }

    /// 캔들 i의 허용 오차 (ATR 워밍업 중이면 종가 비율)
    fn tolerance(&self, candle: &Candle, atr: Option<f64>) -> f64 {
        match atr {
            Some(atr) => self.config.atr_tolerance * atr,
            None => self.config.fallback_tolerance * candle.close,
        }
    }

    /// 캔들 i 기준으로 확정된 가장 최근 스윙
    fn recent_swing(&self, swings: &[SwingPoint], i: usize, kind: SwingKind) -> Option<f64> {
        let window_start = i.saturating_sub(self.config.rejection_window);
        swings
            .iter()
            .rev()
            .filter(|s| s.kind == kind)
            .filter(|s| s.index + self.right_bars < i)
            .take_while(|s| s.index >= window_start)
            .map(|s| s.price)
            .next()
    }

    /// 거부 캔들 목록
    ///
    /// # Arguments
    /// * `candles` - 시간 오름차순 캔들
    /// * `swings` - 인덱스 오름차순 스윙 포인트
    /// * `indicators` - ATR을 포함한 지표 시리즈
    ///
    /// # Returns
    /// * `Vec<Rejection>` - 인덱스 오름차순 (한 캔들에 양방향이 모두 나올 수 있음)
    pub fn analyze(
        &self,
        candles: &[Candle],
        swings: &[SwingPoint],
        indicators: &IndicatorSeries,
    ) -> Vec<Rejection> {
        let mut rejections = Vec::new();
        for (i, candle) in candles.iter().enumerate().skip(1) {
            let atr = indicators.get(i).and_then(|row| row.atr);
            let tol = self.tolerance(candle, atr);

            if let Some(level) = self.recent_swing(swings, i, SwingKind::Low) {
                if candle.low <= level + tol && candle.close > level {
                    rejections.push(Rejection {
                        index: i,
                        kind: RejectionKind::Bullish,
                        level,
                    });
                }
            }
            if let Some(level) = self.recent_swing(swings, i, SwingKind::High) {
                if candle.high >= level - tol && candle.close < level {
                    rejections.push(Rejection {
                        index: i,
                        kind: RejectionKind::Bearish,
                        level,
                    });
                }
            }
        }

        debug!("스윙 레벨 거부 {}개 탐지", rejections.len());
        rejections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndicatorConfig;
    use crate::indicator::IndicatorEngine;
    use chrono::{TimeZone, Utc};

    fn candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc.timestamp_opt(i as i64 * 60, 0).unwrap(), open, high, low, close, 0.0)
    }

    fn low_swing(index: usize, price: f64) -> SwingPoint {
        SwingPoint {
            index,
            price,
            kind: SwingKind::Low,
            is_rejection: false,
        }
    }

    #[test]
    fn test_bullish_rejection_after_swing_confirmed() {
        let mut candles: Vec<Candle> = (0..6).map(|i| candle(i, 101.0, 102.0, 100.5, 101.5)).collect();
        // 캔들 5가 스윙 저점 100을 찍고 위에서 마감
        candles[5] = candle(5, 101.0, 102.0, 100.05, 101.8);
        let swings = vec![low_swing(1, 100.0)];
        let indicators = IndicatorEngine::new(IndicatorConfig::default()).compute(&candles);

        let analyzer = PriceActionAnalyzer::new(PriceActionConfig::default(), 2);
        let rejections = analyzer.analyze(&candles, &swings, &indicators);
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].index, 5);
        assert_eq!(rejections[0].kind, RejectionKind::Bullish);
        assert_eq!(rejections[0].level, 100.0);
    }

    #[test]
    fn test_unconfirmed_swing_is_ignored() {
        let candles: Vec<Candle> = (0..4).map(|i| candle(i, 101.0, 102.0, 100.0, 101.5)).collect();
        let swings = vec![low_swing(2, 100.0)];
        let indicators = IndicatorEngine::new(IndicatorConfig::default()).compute(&candles);
        let analyzer = PriceActionAnalyzer::new(PriceActionConfig::default(), 2);
        assert!(analyzer.analyze(&candles, &swings, &indicators).is_empty());
    }

    #[test]
    fn test_swing_outside_window_is_ignored() {
        let candles: Vec<Candle> = (0..20).map(|i| candle(i, 101.0, 102.0, 100.0, 101.5)).collect();
        let swings = vec![low_swing(1, 100.0)];
        let indicators = IndicatorEngine::new(IndicatorConfig::default()).compute(&candles);
        let analyzer = PriceActionAnalyzer::new(PriceActionConfig::default(), 2);
        let rejections = analyzer.analyze(&candles, &swings, &indicators);
        assert!(rejections.iter().all(|r| r.index <= 11));
        assert!(!rejections.is_empty());
    }
}
