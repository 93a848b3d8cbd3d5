use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// OHLCV 캔들
///
/// 한 번 생성된 캔들은 변경하지 않습니다. 분석 단계는 시퀀스 내 인덱스로 캔들을 참조합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// 새 캔들 생성
    pub fn new(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 몸통 크기 (|종가 - 시가|)
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// 윗꼬리 길이
    pub fn upper_wick(&self) -> f64 {
        self.high - self.close.max(self.open)
    }

    /// 아랫꼬리 길이
    pub fn lower_wick(&self) -> f64 {
        self.close.min(self.open) - self.low
    }

    /// 전체 범위 (고가 - 저가)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// 양봉 여부
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉 여부
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// 실체 상단
    pub fn body_top(&self) -> f64 {
        self.close.max(self.open)
    }

    /// 실체 하단
    pub fn body_bottom(&self) -> f64 {
        self.close.min(self.open)
    }

    /// 직전 종가 기준 True Range
    ///
    /// # Arguments
    /// * `prev_close` - 직전 캔들의 종가 (첫 캔들이면 None)
    ///
    /// # Returns
    /// * `f64` - max(high-low, |high-prevClose|, |low-prevClose|)
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let high_low = self.range();
        match prev_close {
            Some(prev) => high_low
                .max((self.high - prev).abs())
                .max((self.low - prev).abs()),
            None => high_low,
        }
    }
}

impl Display for Candle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Candle(t={}, o={}, h={}, l={}, c={}, v={})",
            self.time.to_rfc3339(),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume
        )
    }
}

/// 캔들 시퀀스 오류
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CandleError {
    /// 시간 순서 위반 (중복 포함)
    #[error("캔들 시간 순서 오류: 인덱스 {index}의 시간이 이전 캔들보다 크지 않습니다")]
    NotIncreasing { index: usize },
    /// 가격 값 오류
    #[error("캔들 가격 오류: 인덱스 {index} - {reason}")]
    InvalidPrice { index: usize, reason: String },
}

/// 캔들 시퀀스 유효성 검사
///
/// 시간이 엄격히 증가하는지, 가격이 유한한지, 고가가 저가 이상인지 확인합니다.
pub fn validate_candles(candles: &[Candle]) -> Result<(), CandleError> {
    for (index, candle) in candles.iter().enumerate() {
        let prices = [candle.open, candle.high, candle.low, candle.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(CandleError::InvalidPrice {
                index,
                reason: "유한하지 않은 가격".to_string(),
            });
        }
        if candle.high < candle.low {
            return Err(CandleError::InvalidPrice {
                index,
                reason: format!("고가({}) < 저가({})", candle.high, candle.low),
            });
        }
        if index > 0 && candle.time <= candles[index - 1].time {
            return Err(CandleError::NotIncreasing { index });
        }
    }
    Ok(())
}

/// 타임프레임
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl Timeframe {
    /// 전체 타임프레임 목록
    pub const ALL: [Timeframe; 7] = [
        Timeframe::Minute1,
        Timeframe::Minute5,
        Timeframe::Minute15,
        Timeframe::Minute30,
        Timeframe::Hour1,
        Timeframe::Hour4,
        Timeframe::Day1,
    ];

    /// 타임프레임 길이 (분)
    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::Minute1 => 1,
            Timeframe::Minute5 => 5,
            Timeframe::Minute15 => 15,
            Timeframe::Minute30 => 30,
            Timeframe::Hour1 => 60,
            Timeframe::Hour4 => 240,
            Timeframe::Day1 => 1440,
        }
    }

    /// 피벗 탐지용 좌/우 캔들 수
    ///
    /// 짧은 타임프레임은 반응성을, 긴 타임프레임은 노이즈 제거를 우선합니다.
    pub fn pivot_bars(&self) -> usize {
        match self.minutes() {
            m if m < 15 => 3,
            m if m < 60 => 5,
            _ => 7,
        }
    }
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
        };
        write!(f, "{label}")
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .iter()
            .find(|tf| tf.to_string() == s)
            .copied()
            .ok_or_else(|| format!("지원되지 않는 타임프레임: {s}"))
    }
}

/// 매매 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeDirection {
    /// 매수
    Buy,
    /// 매도
    Sell,
    /// 관망
    Wait,
}

impl Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "BUY"),
            TradeDirection::Sell => write!(f, "SELL"),
            TradeDirection::Wait => write!(f, "WAIT"),
        }
    }
}
