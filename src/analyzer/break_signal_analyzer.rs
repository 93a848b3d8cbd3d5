use crate::analyzer::fvg_analyzer::{FVGType, FairValueGap};
use crate::analyzer::support_resistance_analyzer::{SupportResistanceAnalyzer, ZoneKind};
use crate::analyzer::swing_analyzer::SwingPoint;
use crate::model::{Candle, TradeDirection};
use log::debug;
use serde::{Deserialize, Serialize};

/// 구조 돌파 신호 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakDirection {
    Buy,
    Sell,
}

impl From<BreakDirection> for TradeDirection {
    fn from(direction: BreakDirection) -> Self {
        match direction {
            BreakDirection::Buy => TradeDirection::Buy,
            BreakDirection::Sell => TradeDirection::Sell,
        }
    }
}

/// 구조 돌파 신호
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakSignal {
    pub kind: BreakDirection,
    /// FVG 트리거 캔들 인덱스
    pub index: usize,
    /// 트리거 캔들 종가
    pub price: f64,
    /// 돌파된 구간 레벨
    pub level: f64,
}

/// 구조 돌파(Break of Structure) 신호 분석기
///
/// 인덱스 i에 FVG가 생겼을 때, 직전 캔들(i-1)의 몸통이 그 시점에 알려진 구간 레벨을 가로질렀으면 신호를 냅니다.
/// 불리시 FVG는 저항 구간의 상향 돌파(Buy), 베어리시 FVG는 지지 구간의 하향 돌파(Sell)와 짝지어집니다.
/// 구간은 i-1 시점까지 확정된 스윙(`index + right_bars <= i-1`)으로만 만듭니다.
#[derive(Debug, Clone)]
pub struct BreakSignalAnalyzer {
    zone_analyzer: SupportResistanceAnalyzer,
    right_bars: usize,
}

impl BreakSignalAnalyzer {
    /// 새 돌파 신호 분석기 생성
    ///
    /// # Arguments
    /// * `zone_analyzer` - 시점별 구간을 만들 클러스터러
    /// * `right_bars` - 스윙 확정에 필요한 오른쪽 캔들 수
    pub fn new(zone_analyzer: SupportResistanceAnalyzer, right_bars: usize) -> Self {
        BreakSignalAnalyzer {
            zone_analyzer,
            right_bars,
        }
    }

    /// 인덱스 i의 FVG에 대한 돌파 신호 확인
    fn signal_at(
        &self,
        candles: &[Candle],
        swings: &[SwingPoint],
        fvg: &FairValueGap,
    ) -> Option<BreakSignal> {
        let i = fvg.index;
        if i == 0 || i >= candles.len() {
            return None;
        }
        let prev = &candles[i - 1];

        let confirmed: Vec<SwingPoint> = swings
            .iter()
            .filter(|s| s.index + self.right_bars < i)
            .copied()
            .collect();
        let zones = self.zone_analyzer.analyze(&confirmed, prev.close);

        let (kind, broken) = match fvg.kind {
            FVGType::Bullish => (
                BreakDirection::Buy,
                zones.iter().find(|z| {
                    z.kind == ZoneKind::Resistance && prev.open < z.level && z.level < prev.close
                }),
            ),
            FVGType::Bearish => (
                BreakDirection::Sell,
                zones.iter().find(|z| {
                    z.kind == ZoneKind::Support && prev.open > z.level && z.level > prev.close
                }),
            ),
        };

        broken.map(|zone| BreakSignal {
            kind,
            index: i,
            price: candles[i].close,
            level: zone.level,
        })
    }

    /// 돌파 신호 목록 (인덱스 오름차순, 인덱스당 최대 하나)
    ///
    /// # Arguments
    /// * `candles` - 시간 오름차순 캔들
    /// * `swings` - 전체 스윙 포인트
    /// * `fvgs` - FVG 목록
    pub fn analyze(
        &self,
        candles: &[Candle],
        swings: &[SwingPoint],
        fvgs: &[FairValueGap],
    ) -> Vec<BreakSignal> {
        let signals: Vec<BreakSignal> = fvgs
            .iter()
            .filter_map(|fvg| self.signal_at(candles, swings, fvg))
            .collect();
        debug!("돌파 신호 {}개 (FVG {}개)", signals.len(), fvgs.len());
        signals
    }
}
