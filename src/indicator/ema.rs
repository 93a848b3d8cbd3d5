use crate::indicator::utils::moving_average::{calculate_ema_alpha, calculate_ema_step};
use crate::model::Candle;
use std::fmt::Display;

/// 지수이동평균(EMA) 계산 빌더
///
/// 첫 종가로 시작하여 `alpha = 2/(span+1)`로 평활합니다.
/// 인덱스 0부터 값이 정의되며 워밍업 구간이 없습니다.
#[derive(Debug, Clone)]
pub struct EMABuilder {
    /// EMA 기간
    pub period: usize,
    alpha: f64,
    last: Option<f64>,
}

/// 지수이동평균(EMA) 값
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EMA {
    period: usize,
    /// 계산된 EMA 값
    pub value: f64,
}

impl Display for EMA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}: {:.2})", self.period, self.value)
    }
}

impl EMA {
    /// EMA 기간
    pub fn period(&self) -> usize {
        self.period
    }
}

impl EMABuilder {
    /// 새 EMA 빌더 생성
    ///
    /// # Arguments
    /// * `period` - EMA 기간
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생 (설정 검증을 거친 값만 전달해야 합니다)
    pub fn new(period: usize) -> Self {
        if period == 0 {
            panic!("EMA 기간은 0보다 커야 합니다");
        }

        EMABuilder {
            period,
            alpha: calculate_ema_alpha(period),
            last: None,
        }
    }

    /// 캔들 시퀀스 전체의 EMA 시리즈 계산
    ///
    /// 빌더 상태를 초기화한 뒤 처음부터 다시 계산합니다.
    ///
    /// # Returns
    /// * `Vec<f64>` - 캔들과 1:1로 정렬된 EMA 값
    pub fn build(&mut self, data: &[Candle]) -> Vec<f64> {
        self.last = None;
        data.iter().map(|candle| self.next(candle).value).collect()
    }

    /// 새 캔들로 EMA 업데이트
    pub fn next(&mut self, data: &Candle) -> EMA {
        let value = match self.last {
            Some(prev) => calculate_ema_step(data.close, prev, self.alpha),
            None => data.close,
        };
        self.last = Some(value);

        EMA {
            period: self.period,
            value,
        }
    }
}
