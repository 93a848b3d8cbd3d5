use crate::config::SwingConfig;
use crate::model::Candle;
use log::debug;
use serde::{Deserialize, Serialize};

/// 스윙 포인트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwingKind {
    /// 스윙 고점
    High,
    /// 스윙 저점
    Low,
}

/// 스윙 포인트 (피벗)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    /// 캔들 인덱스
    pub index: usize,
    /// 고점이면 high, 저점이면 low
    pub price: f64,
    pub kind: SwingKind,
    /// 스윙 방향으로 긴 꼬리를 남긴 거부 캔들 여부
    pub is_rejection: bool,
}

/// 긴 아랫꼬리 여부 (꼬리 > 몸통, 꼬리 > 범위의 30%)
fn has_lower_rejection(candle: &Candle) -> bool {
    let wick = candle.lower_wick();
    wick > candle.body() && wick > 0.3 * candle.range()
}

/// 긴 윗꼬리 여부
fn has_upper_rejection(candle: &Candle) -> bool {
    let wick = candle.upper_wick();
    wick > candle.body() && wick > 0.3 * candle.range()
}

/// 스윙 포인트 분석기
///
/// 좌우 윈도우 안의 모든 캔들보다 엄격하게 높은 고가(낮은 저가)를 스윙으로 판정합니다.
/// 같은 값은 스윙이 아니며, 오른쪽 윈도우를 미래 캔들로 쓰기 때문에 확정된 캔들에만 적용해야 합니다.
#[derive(Debug, Clone)]
pub struct SwingAnalyzer {
    config: SwingConfig,
}

impl Default for SwingAnalyzer {
    fn default() -> Self {
        SwingAnalyzer::new(SwingConfig::default())
    }
}

impl SwingAnalyzer {
    /// 새 스윙 분석기 생성
    pub fn new(config: SwingConfig) -> Self {
        SwingAnalyzer { config }
    }

    /// 오른쪽 확인 캔들 수
    pub fn right_bars(&self) -> usize {
        self.config.right_bars
    }

    /// 인덱스 i가 스윙 고점인지 확인
    fn is_swing_high(&self, candles: &[Candle], i: usize) -> bool {
        let high = candles[i].high;
        let window = &candles[i - self.config.left_bars..=i + self.config.right_bars];
        window
            .iter()
            .enumerate()
            .all(|(offset, c)| offset == self.config.left_bars || high > c.high)
    }

    /// 인덱스 i가 스윙 저점인지 확인
    fn is_swing_low(&self, candles: &[Candle], i: usize) -> bool {
        let low = candles[i].low;
        let window = &candles[i - self.config.left_bars..=i + self.config.right_bars];
        window
            .iter()
            .enumerate()
            .all(|(offset, c)| offset == self.config.left_bars || low < c.low)
    }

    /// 스윙 포인트 탐지
    ///
    /// `[left_bars, n - right_bars)` 구간만 검사하며, 한 캔들은 고점 또는 저점 중 하나로만 분류됩니다 (고점 우선).
    ///
    /// # Arguments
    /// * `candles` - 시간 오름차순 캔들
    ///
    /// # Returns
    /// * `Vec<SwingPoint>` - 인덱스 오름차순 스윙 포인트
    pub fn analyze(&self, candles: &[Candle]) -> Vec<SwingPoint> {
        let left = self.config.left_bars;
        let right = self.config.right_bars;
        if candles.len() < left + right + 1 {
            debug!(
                "스윙 탐지 데이터 부족: {}개 (필요 {})",
                candles.len(),
                left + right + 1
            );
            return Vec::new();
        }

        let mut swings = Vec::new();
        for i in left..candles.len() - right {
            let candle = &candles[i];
            if self.is_swing_high(candles, i) {
                swings.push(SwingPoint {
                    index: i,
                    price: candle.high,
                    kind: SwingKind::High,
                    is_rejection: has_upper_rejection(candle),
                });
                continue;
            }
            if self.is_swing_low(candles, i) {
                swings.push(SwingPoint {
                    index: i,
                    price: candle.low,
                    kind: SwingKind::Low,
                    is_rejection: has_lower_rejection(candle),
                });
            }
        }

        debug!("스윙 포인트 {}개 탐지", swings.len());
        swings
    }
}
