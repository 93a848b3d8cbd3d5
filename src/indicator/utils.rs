/// 공통 이동평균 계산 함수들
pub mod moving_average {
    /// 산술 평균 - 비어 있으면 None
    ///
    /// # Arguments
    /// * `values` - 값 배열
    ///
    /// # Returns
    /// * `Option<f64>` - 평균값
    pub fn calculate_mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// 지수이동평균(EMA) 계산을 위한 알파값 계산
    ///
    /// # Arguments
    /// * `span` - EMA 기간
    ///
    /// # Returns
    /// * `f64` - 알파값 2/(span+1)
    pub fn calculate_ema_alpha(span: usize) -> f64 {
        2.0 / (span + 1) as f64
    }

    /// 와일더 평활 알파값 (1/period)
    pub fn calculate_wilder_alpha(period: usize) -> f64 {
        1.0 / period as f64
    }

    /// 지수이동평균(EMA) 한 스텝 계산
    ///
    /// # Arguments
    /// * `current` - 현재 값
    /// * `previous` - 이전 평활값
    /// * `alpha` - 평활화 계수
    ///
    /// # Returns
    /// * `f64` - 계산된 평활값
    pub fn calculate_ema_step(current: f64, previous: f64, alpha: f64) -> f64 {
        alpha * current + (1.0 - alpha) * previous
    }
}
