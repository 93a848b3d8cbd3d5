use crate::indicator::utils::moving_average::{calculate_ema_step, calculate_wilder_alpha};
use crate::model::Candle;
use std::fmt::Display;

/// 평균 이익/손실로 RSI 계산
///
/// 평균 손실이 0이면 100으로 포화합니다 (횡보 시리즈 포함).
fn calculate_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// 상대강도지수(RSI) 빌더
///
/// 캔들별 이익/손실에 `alpha = 1/period` 와일더 평활을 적용합니다.
/// 첫 캔들의 이익/손실은 0으로 시작하며, `period`개 캔들이 쌓이기 전(인덱스 `period-1` 미만)에는 값이 없습니다.
#[derive(Debug, Clone)]
pub struct RSIBuilder {
    /// RSI 계산 기간
    period: usize,
    alpha: f64,
    prev_close: Option<f64>,
    avg_gain: f64,
    avg_loss: f64,
    count: usize,
}

/// 상대강도지수(RSI)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RSI {
    period: usize,
    /// RSI 값 (0-100)
    pub value: f64,
}

impl Display for RSI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RSI({}: {:.2})", self.period, self.value)
    }
}

impl RSI {
    /// 과매수 여부
    ///
    /// # Arguments
    /// * `threshold` - 과매수 기준값
    pub fn is_overbought(&self, threshold: f64) -> bool {
        self.value > threshold
    }

    /// 과매도 여부
    ///
    /// # Arguments
    /// * `threshold` - 과매도 기준값
    pub fn is_oversold(&self, threshold: f64) -> bool {
        self.value < threshold
    }

    /// RSI 기간
    pub fn period(&self) -> usize {
        self.period
    }
}

impl RSIBuilder {
    /// 새 RSI 빌더 생성
    ///
    /// # Arguments
    /// * `period` - RSI 계산 기간 (일반적으로 14)
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생
    pub fn new(period: usize) -> Self {
        if period == 0 {
            panic!("RSI 기간은 0보다 커야 합니다");
        }

        RSIBuilder {
            period,
            alpha: calculate_wilder_alpha(period),
            prev_close: None,
            avg_gain: 0.0,
            avg_loss: 0.0,
            count: 0,
        }
    }

    /// 워밍업이 끝나는 첫 인덱스
    pub fn warmup(&self) -> usize {
        self.period - 1
    }

    /// 캔들 시퀀스 전체의 RSI 시리즈 계산
    ///
    /// # Returns
    /// * `Vec<Option<f64>>` - 워밍업 구간은 None
    pub fn build(&mut self, data: &[Candle]) -> Vec<Option<f64>> {
        self.prev_close = None;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
        self.count = 0;
        data.iter()
            .map(|candle| self.next(candle).map(|rsi| rsi.value))
            .collect()
    }

    /// 새 캔들로 RSI 업데이트
    ///
    /// # Returns
    /// * `Option<RSI>` - 워밍업 중이면 None
    pub fn next(&mut self, data: &Candle) -> Option<RSI> {
        let (gain, loss) = match self.prev_close {
            Some(prev) => {
                let change = data.close - prev;
                (change.max(0.0), (-change).max(0.0))
            }
            None => (0.0, 0.0),
        };

        if self.count == 0 {
            self.avg_gain = gain;
            self.avg_loss = loss;
        } else {
            self.avg_gain = calculate_ema_step(gain, self.avg_gain, self.alpha);
            self.avg_loss = calculate_ema_step(loss, self.avg_loss, self.alpha);
        }
        self.prev_close = Some(data.close);
        self.count += 1;

        if self.count < self.period {
            return None;
        }

        Some(RSI {
            period: self.period,
            value: calculate_rsi(self.avg_gain, self.avg_loss),
        })
    }
}
