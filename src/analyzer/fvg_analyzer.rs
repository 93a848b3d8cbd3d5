use crate::config::FvgConfig;
use crate::indicator::utils::moving_average::calculate_mean;
use crate::model::Candle;
use log::debug;
use serde::{Deserialize, Serialize};

/// Fair Value Gap 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FVGType {
    /// 불리시 FVG (상승 갭)
    Bullish,
    /// 베어리시 FVG (하락 갭)
    Bearish,
}

/// Fair Value Gap
///
/// 3캔들 불균형. `index`는 갭을 완성한 세 번째 캔들의 인덱스입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    pub kind: FVGType,
    /// 갭 하단
    pub gap_low: f64,
    /// 갭 상단
    pub gap_high: f64,
    /// 트리거 캔들 인덱스
    pub index: usize,
}

impl FairValueGap {
    /// 갭 크기
    pub fn size(&self) -> f64 {
        self.gap_high - self.gap_low
    }

    /// 가격이 갭 안에 있는지 확인
    pub fn contains(&self, price: f64) -> bool {
        price >= self.gap_low && price <= self.gap_high
    }
}

/// FVG 분석기
///
/// 가운데 캔들의 몸통이 직전 `lookback_period`개 캔들 평균 몸통의 `body_multiplier`배를 넘고,
/// 첫째와 셋째 캔들 사이에 겹치지 않는 구간이 있으면 갭으로 판정합니다.
#[derive(Debug, Clone)]
pub struct FvgAnalyzer {
    config: FvgConfig,
}

impl Default for FvgAnalyzer {
    fn default() -> Self {
        FvgAnalyzer::new(FvgConfig::default())
    }
}

impl FvgAnalyzer {
    /// 새 FVG 분석기 생성
    pub fn new(config: FvgConfig) -> Self {
        FvgAnalyzer { config }
    }

    /// 가운데 캔들(middle) 이전 `lookback_period`개 캔들의 평균 몸통
    ///
    /// 구간이 비었거나 평균이 0이면 `min_avg_body`를 사용합니다.
    fn average_body(&self, candles: &[Candle], middle: usize) -> f64 {
        let start = middle.saturating_sub(self.config.lookback_period);
        let bodies: Vec<f64> = candles[start..middle].iter().map(Candle::body).collect();
        match calculate_mean(&bodies) {
            Some(avg) if avg > 0.0 => avg,
            _ => self.config.min_avg_body,
        }
    }

    /// 인덱스 i에서 완성되는 FVG 확인 (i >= 2)
    fn detect_at(&self, candles: &[Candle], i: usize) -> Option<FairValueGap> {
        let first = &candles[i - 2];
        let middle = &candles[i - 1];
        let third = &candles[i];

        let threshold = self.config.body_multiplier * self.average_body(candles, i - 1);
        if middle.body() <= threshold {
            return None;
        }

        if third.low > first.high {
            Some(FairValueGap {
                kind: FVGType::Bullish,
                gap_low: first.high,
                gap_high: third.low,
                index: i,
            })
        } else if third.high < first.low {
            Some(FairValueGap {
                kind: FVGType::Bearish,
                gap_low: third.high,
                gap_high: first.low,
                index: i,
            })
        } else {
            None
        }
    }

    /// 캔들별 FVG (캔들 수와 같은 길이, 인덱스당 최대 하나)
    pub fn analyze_per_candle(&self, candles: &[Candle]) -> Vec<Option<FairValueGap>> {
        (0..candles.len())
            .map(|i| if i >= 2 { self.detect_at(candles, i) } else { None })
            .collect()
    }

    /// FVG 목록 (인덱스 오름차순)
    ///
    /// # Arguments
    /// * `candles` - 시간 오름차순 캔들
    ///
    /// # Returns
    /// * `Vec<FairValueGap>` - 탐지된 갭 (캔들이 3개 미만이면 빈 목록)
    pub fn analyze(&self, candles: &[Candle]) -> Vec<FairValueGap> {
        let fvgs: Vec<FairValueGap> = self
            .analyze_per_candle(candles)
            .into_iter()
            .flatten()
            .collect();
        debug!("FVG {}개 탐지 ({}개 캔들)", fvgs.len(), candles.len());
        fvgs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc.timestamp_opt(i as i64 * 60, 0).unwrap(), open, high, low, close, 0.0)
    }

    #[test]
    fn test_bearish_gap_geometry() {
        let candles = vec![
            candle(0, 20.0, 21.0, 18.0, 19.0),
            candle(1, 19.0, 19.5, 13.0, 13.5),
            candle(2, 13.5, 14.0, 11.0, 12.0),
        ];
        let fvgs = FvgAnalyzer::default().analyze(&candles);
        assert_eq!(fvgs.len(), 1);
        assert_eq!(fvgs[0].kind, FVGType::Bearish);
        assert_eq!(fvgs[0].gap_low, 14.0);
        assert_eq!(fvgs[0].gap_high, 18.0);
        assert_eq!(fvgs[0].size(), 4.0);
    }

    #[test]
    fn test_small_middle_body_rejected() {
        // 평균 몸통 5, 가운데 몸통 1 -> 기준 미달
        let candles = vec![
            candle(0, 10.0, 16.0, 9.0, 15.0),
            candle(1, 15.0, 17.0, 14.0, 16.0),
            candle(2, 20.0, 22.0, 18.0, 21.0),
        ];
        assert!(FvgAnalyzer::default().analyze(&candles).is_empty());
    }

    #[test]
    fn test_fewer_than_three_candles() {
        let candles = vec![candle(0, 1.0, 2.0, 0.5, 1.5), candle(1, 1.5, 3.0, 1.0, 2.5)];
        assert!(FvgAnalyzer::default().analyze(&candles).is_empty());
        assert_eq!(FvgAnalyzer::default().analyze_per_candle(&candles).len(), 2);
    }
}
