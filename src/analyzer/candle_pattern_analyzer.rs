use crate::config::PatternConfig;
use crate::model::Candle;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 캔들 패턴 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandlePattern {
    /// 망치 - 하단 반전 신호
    Hammer,
    /// 역망치 - 하단 반전 신호
    InvertedHammer,
    /// 행잉맨 - 상승 추세 끝의 망치형, 상단 반전 신호
    HangingMan,
    /// 드래곤플라이 도지 - 하단 반전 신호
    DragonflyDoji,
    /// 그레이브스톤 도지 - 상단 반전 신호
    GravestoneDoji,
    /// 불리시 엔걸핑 - 상승 반전
    BullishEngulfing,
    /// 베어리시 엔걸핑 - 하락 반전
    BearishEngulfing,
    /// 모닝 스타 - 상승 반전
    MorningStar,
    /// 이브닝 스타 - 하락 반전
    EveningStar,
    /// 불리시 핀바 - 아랫꼬리 거부
    BullishPinBar,
    /// 베어리시 핀바 - 윗꼬리 거부
    BearishPinBar,
}

/// 패턴 방향성
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

impl CandlePattern {
    /// 패턴이 암시하는 방향
    pub fn bias(&self) -> PatternBias {
        match self {
            CandlePattern::Hammer
            | CandlePattern::InvertedHammer
            | CandlePattern::DragonflyDoji
            | CandlePattern::BullishEngulfing
            | CandlePattern::MorningStar
            | CandlePattern::BullishPinBar => PatternBias::Bullish,
            CandlePattern::HangingMan
            | CandlePattern::GravestoneDoji
            | CandlePattern::BearishEngulfing
            | CandlePattern::EveningStar
            | CandlePattern::BearishPinBar => PatternBias::Bearish,
        }
    }

    /// 표시 이름
    pub fn name(&self) -> &'static str {
        match self {
            CandlePattern::Hammer => "Hammer",
            CandlePattern::InvertedHammer => "Inverted Hammer",
            CandlePattern::HangingMan => "Hanging Man",
            CandlePattern::DragonflyDoji => "Dragonfly Doji",
            CandlePattern::GravestoneDoji => "Gravestone Doji",
            CandlePattern::BullishEngulfing => "Bullish Engulfing",
            CandlePattern::BearishEngulfing => "Bearish Engulfing",
            CandlePattern::MorningStar => "Morning Star",
            CandlePattern::EveningStar => "Evening Star",
            CandlePattern::BullishPinBar => "Bullish Pin Bar",
            CandlePattern::BearishPinBar => "Bearish Pin Bar",
        }
    }
}

impl Display for CandlePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 망치형 몸통/꼬리 비율 (추세 조건 제외)
fn is_hammer_shape(candle: &Candle) -> bool {
    let range = candle.range();
    candle.lower_wick() > 2.0 * candle.body()
        && candle.body() < 0.3 * range
        && candle.upper_wick() < 0.1 * range
        && candle.close >= candle.low + 0.6 * range
}

fn is_inverted_hammer(candle: &Candle) -> bool {
    let range = candle.range();
    candle.upper_wick() > 2.0 * candle.body()
        && candle.body() < 0.3 * range
        && candle.lower_wick() < 0.1 * range
        && candle.close <= candle.low + 0.4 * range
}

fn is_dragonfly_doji(candle: &Candle) -> bool {
    let range = candle.range();
    candle.body() < 0.1 * range && candle.lower_wick() > 0.6 * range
}

fn is_gravestone_doji(candle: &Candle) -> bool {
    let range = candle.range();
    candle.body() < 0.1 * range && candle.upper_wick() > 0.6 * range
}

fn is_bullish_pin_bar(candle: &Candle) -> bool {
    let range = candle.range();
    candle.lower_wick() > 2.0 * candle.body()
        && candle.body() < 0.3 * range
        && candle.close > candle.low + 0.66 * range
}

fn is_bearish_pin_bar(candle: &Candle) -> bool {
    let range = candle.range();
    candle.upper_wick() > 2.0 * candle.body()
        && candle.body() < 0.3 * range
        && candle.close < candle.low + 0.33 * range
}

fn is_bullish_engulfing(prev: &Candle, curr: &Candle) -> bool {
    prev.is_bearish() && curr.is_bullish() && curr.open < prev.close && curr.close > prev.open
}

fn is_bearish_engulfing(prev: &Candle, curr: &Candle) -> bool {
    prev.is_bullish() && curr.is_bearish() && curr.open > prev.close && curr.close < prev.open
}

/// 모닝 스타 패턴 확인
///
/// 큰 음봉, 그 종가 아래의 작은 몸통, 첫 캔들 몸통 중간 위에서 마감하는 양봉
fn is_morning_star(first: &Candle, second: &Candle, third: &Candle) -> bool {
    if first.range() <= 0.0 {
        return false;
    }
    let first_midpoint = (first.open + first.close) / 2.0;
    first.is_bearish()
        && first.body() >= 0.5 * first.range()
        && second.body() < 0.3 * first.body()
        && second.body_top() < first.close
        && third.is_bullish()
        && third.close > first_midpoint
}

/// 이브닝 스타 패턴 확인
fn is_evening_star(first: &Candle, second: &Candle, third: &Candle) -> bool {
    if first.range() <= 0.0 {
        return false;
    }
    let first_midpoint = (first.open + first.close) / 2.0;
    first.is_bullish()
        && first.body() >= 0.5 * first.range()
        && second.body() < 0.3 * first.body()
        && second.body_bottom() > first.close
        && third.is_bearish()
        && third.close < first_midpoint
}

/// 캔들 패턴 분석기
///
/// 각 패턴은 독립된 조건이며 한 캔들이 여러 패턴에 동시에 해당할 수 있습니다.
/// 범위가 0인 캔들은 어떤 패턴에도 해당하지 않습니다.
#[derive(Debug, Clone)]
pub struct CandlePatternAnalyzer {
    config: PatternConfig,
}

impl Default for CandlePatternAnalyzer {
    fn default() -> Self {
        CandlePatternAnalyzer::new(PatternConfig::default())
    }
}

impl CandlePatternAnalyzer {
    /// 새 캔들 패턴 분석기 생성
    pub fn new(config: PatternConfig) -> Self {
        CandlePatternAnalyzer { config }
    }

    /// i 직전 `trend_lookback`개 캔들의 종가가 연속 상승했는지 확인
    fn is_prior_uptrend(&self, candles: &[Candle], i: usize) -> bool {
        let lookback = self.config.trend_lookback;
        if i < lookback + 1 {
            return false;
        }
        candles[i - lookback - 1..i]
            .windows(2)
            .all(|w| w[1].close > w[0].close)
    }

    /// 인덱스 i 캔들의 패턴 집합
    pub fn patterns_at(&self, candles: &[Candle], i: usize) -> Vec<CandlePattern> {
        let mut patterns = Vec::new();
        let Some(candle) = candles.get(i) else {
            return patterns;
        };
        if candle.range() <= 0.0 {
            return patterns;
        }

        if is_hammer_shape(candle) {
            patterns.push(CandlePattern::Hammer);
            if self.is_prior_uptrend(candles, i) {
                patterns.push(CandlePattern::HangingMan);
            }
        }
        if is_inverted_hammer(candle) {
            patterns.push(CandlePattern::InvertedHammer);
        }
        if is_dragonfly_doji(candle) {
            patterns.push(CandlePattern::DragonflyDoji);
        }
        if is_gravestone_doji(candle) {
            patterns.push(CandlePattern::GravestoneDoji);
        }
        if is_bullish_pin_bar(candle) {
            patterns.push(CandlePattern::BullishPinBar);
        }
        if is_bearish_pin_bar(candle) {
            patterns.push(CandlePattern::BearishPinBar);
        }

        if i >= 1 {
            let prev = &candles[i - 1];
            if is_bullish_engulfing(prev, candle) {
                patterns.push(CandlePattern::BullishEngulfing);
            }
            if is_bearish_engulfing(prev, candle) {
                patterns.push(CandlePattern::BearishEngulfing);
            }
        }

        if i >= 2 {
            let first = &candles[i - 2];
            let second = &candles[i - 1];
            if is_morning_star(first, second, candle) {
                patterns.push(CandlePattern::MorningStar);
            }
            if is_evening_star(first, second, candle) {
                patterns.push(CandlePattern::EveningStar);
            }
        }

        patterns
    }

    /// 캔들별 패턴 집합 (캔들과 1:1 정렬)
    pub fn analyze(&self, candles: &[Candle]) -> Vec<Vec<CandlePattern>> {
        let result: Vec<Vec<CandlePattern>> = (0..candles.len())
            .map(|i| self.patterns_at(candles, i))
            .collect();
        debug!(
            "캔들 패턴 분석 완료: {}개 캔들 중 {}개에서 패턴 발견",
            candles.len(),
            result.iter().filter(|p| !p.is_empty()).count()
        );
        result
    }
}
