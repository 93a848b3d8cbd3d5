use crate::analyzer::candle_pattern_analyzer::{CandlePattern, PatternBias};
use crate::analyzer::fvg_analyzer::{FVGType, FairValueGap};
use crate::analyzer::order_block_analyzer::{OrderBlock, OrderBlockType};
use crate::analyzer::price_action_analyzer::{Rejection, RejectionKind};
use crate::config::ConfluenceConfig;
use crate::indicator::IndicatorRow;
use crate::model::{Candle, TradeDirection};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 시장 추세 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketTrend {
    Up,
    Down,
    Sideways,
}

impl MarketTrend {
    /// 종가와 단기/장기 EMA 배열로 추세 판정
    pub fn from_row(close: f64, row: &IndicatorRow) -> Self {
        if close > row.ema_fast && row.ema_fast > row.ema_slow {
            MarketTrend::Up
        } else if close < row.ema_fast && row.ema_fast < row.ema_slow {
            MarketTrend::Down
        } else {
            MarketTrend::Sideways
        }
    }
}

/// 컨플루언스 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// 점수에서 등급 계산 (80/60/40/20 경계)
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 80 => Grade::A,
            s if s >= 60 => Grade::B,
            s if s >= 40 => Grade::C,
            s if s >= 20 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// 컨플루언스 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceResult {
    /// 0~100
    pub score: u32,
    pub grade: Grade,
    pub factors: Vec<String>,
    pub direction: TradeDirection,
}

impl ConfluenceResult {
    fn no_signal() -> Self {
        ConfluenceResult {
            score: 0,
            grade: Grade::F,
            factors: vec!["No clear signal".to_string()],
            direction: TradeDirection::Wait,
        }
    }
}

/// 컨플루언스 계산 입력
///
/// 모든 목록은 같은 캔들 시퀀스에서 나온 값이며, 점수는 마지막 캔들 기준으로 계산합니다.
#[derive(Debug, Clone, Copy)]
pub struct ConfluenceInputs<'a> {
    pub candles: &'a [Candle],
    pub indicators: &'a [IndicatorRow],
    pub fvgs: &'a [FairValueGap],
    pub order_blocks: &'a [OrderBlock],
    /// 캔들별 패턴 집합
    pub patterns: &'a [Vec<CandlePattern>],
    pub rejections: &'a [Rejection],
    /// 외부 감성 점수 [-1, 1] (없으면 0)
    pub sentiment: f64,
}

/// 컨플루언스 분석기
///
/// 순간 방향 신호가 있을 때만 추세, RSI, 구조(FVG/OB), 가격 행동, 감성 요인마다 점수를 더합니다.
#[derive(Debug, Clone)]
pub struct ConfluenceAnalyzer {
    config: ConfluenceConfig,
}

impl Default for ConfluenceAnalyzer {
    fn default() -> Self {
        ConfluenceAnalyzer::new(ConfluenceConfig::default())
    }
}

impl ConfluenceAnalyzer {
    /// 새 컨플루언스 분석기 생성
    pub fn new(config: ConfluenceConfig) -> Self {
        ConfluenceAnalyzer { config }
    }

    /// 순간 방향 신호
    ///
    /// 종가가 장기 EMA 위이고 RSI가 과매도 기준 미만이면 Buy, 반대면 Sell.
    /// RSI 워밍업 중에는 Wait입니다.
    pub fn directional_signal(&self, close: f64, row: &IndicatorRow) -> TradeDirection {
        let Some(rsi) = row.rsi else {
            return TradeDirection::Wait;
        };
        if close > row.ema_slow && rsi < self.config.rsi_oversold {
            TradeDirection::Buy
        } else if close < row.ema_slow && rsi > self.config.rsi_overbought {
            TradeDirection::Sell
        } else {
            TradeDirection::Wait
        }
    }

    /// 마지막 캔들 기준 컨플루언스 점수 계산
    pub fn score(&self, inputs: &ConfluenceInputs<'_>) -> ConfluenceResult {
        let (Some(candle), Some(row)) = (inputs.candles.last(), inputs.indicators.last()) else {
            return ConfluenceResult::no_signal();
        };
        let last = inputs.candles.len() - 1;

        let direction = self.directional_signal(candle.close, row);
        let is_buy = match direction {
            TradeDirection::Buy => true,
            TradeDirection::Sell => false,
            TradeDirection::Wait => return ConfluenceResult::no_signal(),
        };

        let points = self.config.points_per_factor;
        let mut score = 0;
        let mut factors = Vec::new();

        let trend_up = candle.close > row.ema_slow;
        if trend_up == is_buy {
            score += points;
            factors.push("Trend aligned".to_string());
        }

        if let Some(rsi) = row.rsi {
            if is_buy && rsi < self.config.rsi_oversold {
                score += points;
                factors.push("RSI oversold".to_string());
            } else if !is_buy && rsi > self.config.rsi_overbought {
                score += points;
                factors.push("RSI overbought".to_string());
            }
        }

        let recent_from = (last + 1).saturating_sub(self.config.structure_lookback);
        let fvg_kind = if is_buy { FVGType::Bullish } else { FVGType::Bearish };
        let block_kind = if is_buy {
            OrderBlockType::Bullish
        } else {
            OrderBlockType::Bearish
        };
        let has_structure = inputs
            .fvgs
            .iter()
            .any(|f| f.index >= recent_from && f.kind == fvg_kind)
            || inputs
                .order_blocks
                .iter()
                .any(|b| b.index >= recent_from && b.kind == block_kind);
        if has_structure {
            score += points;
            factors.push("SMC zone present".to_string());
        }

        let bias = if is_buy {
            PatternBias::Bullish
        } else {
            PatternBias::Bearish
        };
        let rejection_kind = if is_buy {
            RejectionKind::Bullish
        } else {
            RejectionKind::Bearish
        };
        let has_pattern = inputs
            .patterns
            .get(last)
            .is_some_and(|set| set.iter().any(|p| p.bias() == bias))
            || inputs
                .rejections
                .iter()
                .any(|r| r.index == last && r.kind == rejection_kind);
        if has_pattern {
            score += points;
            factors.push("Price Action pattern".to_string());
        }

        let threshold = self.config.sentiment_threshold;
        if is_buy && inputs.sentiment >= -threshold {
            score += points;
            factors.push("Sentiment positive".to_string());
        } else if !is_buy && inputs.sentiment <= threshold {
            score += points;
            factors.push("Sentiment negative".to_string());
        }

        let score = score.min(100);
        debug!("컨플루언스: {direction} {score}점 {factors:?}");
        ConfluenceResult {
            score,
            grade: Grade::from_score(score),
            factors,
            direction,
        }
    }
}
