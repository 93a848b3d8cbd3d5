use crate::config::TrendChannelConfig;
use crate::model::Candle;
use log::debug;
use serde::{Deserialize, Serialize};

/// 채널 추세 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelDirection {
    Up,
    Down,
    Sideways,
}

/// 차트 표시용 직선 구간
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelLine {
    pub start_index: usize,
    pub start_price: f64,
    pub end_index: usize,
    pub end_price: f64,
}

/// 추세 채널
///
/// 상단선은 그룹별 고가 최대값, 하단선은 그룹별 저가 최소값의 회귀선입니다.
/// 절편은 채널이 표본 극값을 모두 감싸도록 조정된 값입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendChannel {
    pub slope_upper: f64,
    pub slope_lower: f64,
    pub intercept_upper: f64,
    pub intercept_lower: f64,
    pub direction: ChannelDirection,
    /// 0~100
    pub strength: u32,
    /// 선택된 룩백에서 마지막 캔들 기준 채널 폭 (절편 조정 전)
    pub channel_width: f64,
    pub backcandles_used: usize,
    /// 마지막 캔들 인덱스
    pub end_index: usize,
}

impl TrendChannel {
    /// 인덱스 x에서의 상단선 가격
    pub fn upper_at(&self, x: f64) -> f64 {
        self.slope_upper * x + self.intercept_upper
    }

    /// 인덱스 x에서의 하단선 가격
    pub fn lower_at(&self, x: f64) -> f64 {
        self.slope_lower * x + self.intercept_lower
    }

    /// 룩백 시작부터 마지막 캔들까지의 (상단선, 하단선)
    pub fn line_points(&self) -> (ChannelLine, ChannelLine) {
        let start = self.end_index.saturating_sub(self.backcandles_used);
        let line = |at: &dyn Fn(f64) -> f64| ChannelLine {
            start_index: start,
            start_price: at(start as f64),
            end_index: self.end_index,
            end_price: at(self.end_index as f64),
        };
        (line(&|x| self.upper_at(x)), line(&|x| self.lower_at(x)))
    }
}

/// 최소제곱 직선 적합 (slope, intercept)
///
/// 표본이 2개 미만이거나 x가 모두 같으면 None
fn fit_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return None;
    }
    let n = xs.len() as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xx: f64 = xs.iter().map(|x| x * x).sum();
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    Some((slope, intercept))
}

/// 그룹별 극값 표본
struct Extremes {
    min_x: Vec<f64>,
    min_y: Vec<f64>,
    max_x: Vec<f64>,
    max_y: Vec<f64>,
}

/// 후보 룩백에서의 회귀 결과
struct Candidate {
    lookback: usize,
    width: f64,
    slope_upper: f64,
    slope_lower: f64,
    extremes: Extremes,
}

/// 추세 채널 회귀 분석기
///
/// 후보 룩백마다 최근 캔들을 `window_size` 단위 그룹으로 나누어 그룹 극값에 직선을 적합하고,
/// 마지막 캔들에서 폭이 양수이면서 가장 좁은 채널을 고릅니다.
#[derive(Debug, Clone)]
pub struct TrendChannelAnalyzer {
    config: TrendChannelConfig,
}

impl Default for TrendChannelAnalyzer {
    fn default() -> Self {
        TrendChannelAnalyzer::new(TrendChannelConfig::default())
    }
}

impl TrendChannelAnalyzer {
    /// 새 추세 채널 분석기 생성
    pub fn new(config: TrendChannelConfig) -> Self {
        TrendChannelAnalyzer { config }
    }

    /// 룩백 r에 대한 그룹 극값 수집
    ///
    /// 그룹 시작은 `last - r`부터 `window` 간격이며, `start + window < n`인 완전한 그룹만 사용합니다.
    fn collect_extremes(&self, candles: &[Candle], lookback: usize) -> Extremes {
        let n = candles.len();
        let window = self.config.window_size;
        let last = n - 1;
        let mut extremes = Extremes {
            min_x: Vec::new(),
            min_y: Vec::new(),
            max_x: Vec::new(),
            max_y: Vec::new(),
        };

        let first_start = last as i64 - lookback as i64;
        let mut start = first_start;
        while start <= last as i64 {
            if start >= 0 && (start as usize) + window < n {
                let s = start as usize;
                let group = &candles[s..s + window];
                let mut min_idx = 0;
                let mut max_idx = 0;
                for (k, c) in group.iter().enumerate() {
                    if c.low < group[min_idx].low {
                        min_idx = k;
                    }
                    if c.high > group[max_idx].high {
                        max_idx = k;
                    }
                }
                extremes.min_x.push((s + min_idx) as f64);
                extremes.min_y.push(group[min_idx].low);
                extremes.max_x.push((s + max_idx) as f64);
                extremes.max_y.push(group[max_idx].high);
            }
            start += window as i64;
        }
        extremes
    }

    /// 후보 룩백 하나를 평가
    fn evaluate(&self, candles: &[Candle], lookback: usize) -> Option<Candidate> {
        let extremes = self.collect_extremes(candles, lookback);
        let (slope_lower, intercept_lower) = fit_line(&extremes.min_x, &extremes.min_y)?;
        let (slope_upper, intercept_upper) = fit_line(&extremes.max_x, &extremes.max_y)?;

        let x = (candles.len() - 1) as f64;
        let width = (slope_upper * x + intercept_upper) - (slope_lower * x + intercept_lower);
        Some(Candidate {
            lookback,
            width,
            slope_upper,
            slope_lower,
            extremes,
        })
    }

    /// 추세 채널 계산
    ///
    /// # Arguments
    /// * `candles` - 시간 오름차순 캔들
    ///
    /// # Returns
    /// * `Option<TrendChannel>` - 캔들이 `backcandles + window_size`개 미만이거나 양수 폭 채널이 없으면 None
    pub fn analyze(&self, candles: &[Candle]) -> Option<TrendChannel> {
        let n = candles.len();
        let window = self.config.window_size;
        let back = self.config.backcandles;
        let range = self.config.search_range;
        if n < back + window {
            debug!("추세 채널 데이터 부족: {}개 (필요 {})", n, back + window);
            return None;
        }

        let lower_bound = (2 * window).max(back.saturating_sub(range));
        let upper_bound = (n - window).min(back + range);

        let mut best: Option<Candidate> = None;
        for lookback in lower_bound..upper_bound {
            let Some(candidate) = self.evaluate(candles, lookback) else {
                continue;
            };
            let best_width = best.as_ref().map_or(f64::INFINITY, |b| b.width);
            if candidate.width > 0.0 && candidate.width < best_width {
                best = Some(candidate);
            }
        }

        let Some(best) = best else {
            debug!("양수 폭 추세 채널 없음");
            return None;
        };

        let intercept_upper = best
            .extremes
            .max_x
            .iter()
            .zip(&best.extremes.max_y)
            .map(|(x, y)| y - best.slope_upper * x)
            .fold(f64::NEG_INFINITY, f64::max);
        let intercept_lower = best
            .extremes
            .min_x
            .iter()
            .zip(&best.extremes.min_y)
            .map(|(x, y)| y - best.slope_lower * x)
            .fold(f64::INFINITY, f64::min);

        let direction = if best.slope_upper > 0.0 && best.slope_lower > 0.0 {
            ChannelDirection::Up
        } else if best.slope_upper < 0.0 && best.slope_lower < 0.0 {
            ChannelDirection::Down
        } else {
            ChannelDirection::Sideways
        };
        let avg_slope = (best.slope_upper.abs() + best.slope_lower.abs()) / 2.0;
        let strength = (avg_slope * self.config.strength_scale).floor().min(100.0) as u32;

        debug!(
            "추세 채널: {:?}, 강도 {}, 룩백 {}, 폭 {:.4}",
            direction, strength, best.lookback, best.width
        );

        Some(TrendChannel {
            slope_upper: best.slope_upper,
            slope_lower: best.slope_lower,
            intercept_upper,
            intercept_lower,
            direction,
            strength,
            channel_width: best.width,
            backcandles_used: best.lookback,
            end_index: n - 1,
        })
    }
}
