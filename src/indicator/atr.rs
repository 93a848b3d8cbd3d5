use crate::indicator::utils::moving_average::{calculate_ema_step, calculate_wilder_alpha};
use crate::model::Candle;
use std::fmt::Display;

/// 평균 실제 범위(ATR) 빌더
///
/// True Range에 `alpha = 1/period` 지수 평활을 적용합니다.
/// 첫 캔들의 True Range는 고가-저가이며, 인덱스 `period-1`부터 값이 정의됩니다.
#[derive(Debug, Clone)]
pub struct ATRBuilder {
    period: usize,
    alpha: f64,
    prev_close: Option<f64>,
    smoothed: Option<f64>,
    count: usize,
}

/// ATR 값
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ATR {
    period: usize,
    /// ATR 값
    pub value: f64,
}

impl Display for ATR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ATR({}: {:.4})", self.period, self.value)
    }
}

impl ATRBuilder {
    /// 새 ATR 빌더 생성
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생
    pub fn new(period: usize) -> Self {
        if period == 0 {
            panic!("ATR 기간은 0보다 커야 합니다");
        }

        ATRBuilder {
            period,
            alpha: calculate_wilder_alpha(period),
            prev_close: None,
            smoothed: None,
            count: 0,
        }
    }

    /// 캔들 시퀀스 전체의 ATR 시리즈 계산
    pub fn build(&mut self, data: &[Candle]) -> Vec<Option<f64>> {
        self.prev_close = None;
        self.smoothed = None;
        self.count = 0;
        data.iter()
            .map(|candle| self.next(candle).map(|atr| atr.value))
            .collect()
    }

    /// 새 캔들로 ATR 업데이트
    pub fn next(&mut self, data: &Candle) -> Option<ATR> {
        let tr = data.true_range(self.prev_close);
        let smoothed = match self.smoothed {
            Some(prev) => calculate_ema_step(tr, prev, self.alpha),
            None => tr,
        };
        self.smoothed = Some(smoothed);
        self.prev_close = Some(data.close);
        self.count += 1;

        if self.count < self.period {
            return None;
        }

        Some(ATR {
            period: self.period,
            value: smoothed,
        })
    }
}
