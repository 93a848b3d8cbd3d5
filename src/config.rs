//! 분석 파이프라인 설정
//!
//! 각 단계의 설정은 독립된 구조체이며, 파일에서 일부 섹션만 지정해도 나머지는 기본값을 사용합니다.
//! 잘못된 값은 `validate`에서 거부하며 보정하지 않습니다.

use crate::config_loader::{ConfigError, ConfigResult, ConfigValidation};
use crate::model::Timeframe;
use serde::{Deserialize, Serialize};

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}

fn ensure_positive_finite(name: &str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(format!("{name}은(는) 0보다 큰 유한값이어야 합니다: {value}")));
    }
    Ok(())
}

/// 지표 엔진 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// 단기 EMA 기간
    pub ema_fast_span: usize,
    /// 장기 EMA 기간
    pub ema_slow_span: usize,
    /// RSI 기간
    pub rsi_period: usize,
    /// ATR 기간
    pub atr_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            ema_fast_span: 50,
            ema_slow_span: 200,
            rsi_period: 14,
            atr_period: 14,
        }
    }
}

impl ConfigValidation for IndicatorConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.ema_fast_span == 0 || self.ema_slow_span == 0 {
            return Err(invalid("EMA 기간은 0보다 커야 합니다"));
        }
        if self.ema_fast_span >= self.ema_slow_span {
            return Err(invalid(format!(
                "단기 EMA 기간({})은 장기 EMA 기간({})보다 작아야 합니다",
                self.ema_fast_span, self.ema_slow_span
            )));
        }
        if self.rsi_period == 0 {
            return Err(invalid("RSI 기간은 0보다 커야 합니다"));
        }
        if self.atr_period == 0 {
            return Err(invalid("ATR 기간은 0보다 커야 합니다"));
        }
        Ok(())
    }
}

/// 스윙 포인트 탐지 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    /// 왼쪽 비교 캔들 수
    pub left_bars: usize,
    /// 오른쪽 비교 캔들 수
    pub right_bars: usize,
}

impl Default for SwingConfig {
    fn default() -> Self {
        SwingConfig {
            left_bars: 5,
            right_bars: 5,
        }
    }
}

impl SwingConfig {
    /// 타임프레임에 맞는 좌우 윈도우 설정
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        let bars = timeframe.pivot_bars();
        SwingConfig {
            left_bars: bars,
            right_bars: bars,
        }
    }
}

impl ConfigValidation for SwingConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.left_bars == 0 || self.right_bars == 0 {
            return Err(invalid("스윙 윈도우 크기는 0보다 커야 합니다"));
        }
        Ok(())
    }
}

/// 지지/저항 구간 클러스터링 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// 같은 구간으로 묶는 상대 가격 허용치 (0.003 = 0.3%)
    pub bin_width: f64,
    /// 구간으로 인정하는 최소 터치 수
    pub min_touches: usize,
    /// 유지할 최대 구간 수
    pub max_zones: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig {
            bin_width: 0.003,
            min_touches: 3,
            max_zones: 5,
        }
    }
}

impl ConfigValidation for ZoneConfig {
    fn validate(&self) -> ConfigResult<()> {
        ensure_positive_finite("bin_width", self.bin_width)?;
        if self.min_touches < 1 {
            return Err(invalid("min_touches는 1 이상이어야 합니다"));
        }
        if self.max_zones == 0 {
            return Err(invalid("max_zones는 0보다 커야 합니다"));
        }
        Ok(())
    }
}

/// FVG 탐지 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FvgConfig {
    /// 평균 몸통 계산 기간
    pub lookback_period: usize,
    /// 가운데 캔들 몸통 배수 기준
    pub body_multiplier: f64,
    /// 평균 몸통이 0일 때 사용하는 하한값
    pub min_avg_body: f64,
}

impl Default for FvgConfig {
    fn default() -> Self {
        FvgConfig {
            lookback_period: 10,
            body_multiplier: 1.5,
            min_avg_body: 0.001,
        }
    }
}

impl ConfigValidation for FvgConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.lookback_period == 0 {
            return Err(invalid("lookback_period는 0보다 커야 합니다"));
        }
        ensure_positive_finite("body_multiplier", self.body_multiplier)?;
        ensure_positive_finite("min_avg_body", self.min_avg_body)
    }
}

/// 캔들 패턴 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// 행잉맨 판정 시 상승 추세로 볼 직전 캔들 수
    pub trend_lookback: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        PatternConfig { trend_lookback: 2 }
    }
}

impl ConfigValidation for PatternConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.trend_lookback == 0 {
            return Err(invalid("trend_lookback은 0보다 커야 합니다"));
        }
        Ok(())
    }
}

/// 스윙 레벨 꼬리 거부 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceActionConfig {
    /// 참조할 최근 스윙 범위 (캔들 수)
    pub rejection_window: usize,
    /// ATR 대비 허용 오차 배수
    pub atr_tolerance: f64,
    /// ATR이 없을 때 종가 대비 허용 오차 비율
    pub fallback_tolerance: f64,
}

impl Default for PriceActionConfig {
    fn default() -> Self {
        PriceActionConfig {
            rejection_window: 10,
            atr_tolerance: 0.5,
            fallback_tolerance: 0.001,
        }
    }
}

impl ConfigValidation for PriceActionConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.rejection_window == 0 {
            return Err(invalid("rejection_window는 0보다 커야 합니다"));
        }
        ensure_positive_finite("atr_tolerance", self.atr_tolerance)?;
        ensure_positive_finite("fallback_tolerance", self.fallback_tolerance)
    }
}

/// 추세 채널 회귀 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendChannelConfig {
    /// 기준 룩백 캔들 수
    pub backcandles: usize,
    /// 룩백 탐색 범위 (±)
    pub search_range: usize,
    /// 극값을 뽑는 그룹 크기
    pub window_size: usize,
    /// 기울기를 강도로 바꾸는 배율
    pub strength_scale: f64,
}

impl Default for TrendChannelConfig {
    fn default() -> Self {
        TrendChannelConfig {
            backcandles: 80,
            search_range: 30,
            window_size: 5,
            strength_scale: 10000.0,
        }
    }
}

impl ConfigValidation for TrendChannelConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.window_size == 0 {
            return Err(invalid("window_size는 0보다 커야 합니다"));
        }
        if self.backcandles == 0 {
            return Err(invalid("backcandles는 0보다 커야 합니다"));
        }
        if self.search_range >= self.backcandles {
            return Err(invalid(format!(
                "search_range({})는 backcandles({})보다 작아야 합니다",
                self.search_range, self.backcandles
            )));
        }
        ensure_positive_finite("strength_scale", self.strength_scale)
    }
}

/// 컨플루언스 점수 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfluenceConfig {
    /// 과매도 기준 RSI
    pub rsi_oversold: f64,
    /// 과매수 기준 RSI
    pub rsi_overbought: f64,
    /// 감성 점수 정렬 기준 (±)
    pub sentiment_threshold: f64,
    /// 요인당 점수
    pub points_per_factor: u32,
    /// 구조 신호(FVG/OB)를 찾을 최근 캔들 수
    pub structure_lookback: usize,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        ConfluenceConfig {
            rsi_oversold: 40.0,
            rsi_overbought: 60.0,
            sentiment_threshold: 0.2,
            points_per_factor: 20,
            structure_lookback: 1,
        }
    }
}

impl ConfigValidation for ConfluenceConfig {
    fn validate(&self) -> ConfigResult<()> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_range(self.rsi_oversold) || !in_range(self.rsi_overbought) {
            return Err(invalid("RSI 기준값은 0~100 범위여야 합니다"));
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(invalid(format!(
                "과매도 기준({})은 과매수 기준({})보다 작아야 합니다",
                self.rsi_oversold, self.rsi_overbought
            )));
        }
        if !self.sentiment_threshold.is_finite() || !(0.0..=1.0).contains(&self.sentiment_threshold)
        {
            return Err(invalid("sentiment_threshold는 0~1 범위여야 합니다"));
        }
        if self.points_per_factor == 0 || self.points_per_factor > 20 {
            return Err(invalid("points_per_factor는 1~20 범위여야 합니다"));
        }
        if self.structure_lookback == 0 {
            return Err(invalid("structure_lookback은 0보다 커야 합니다"));
        }
        Ok(())
    }
}

/// 트래커 레지스트리 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// 최대 보관 트래커 수
    pub max_entries: usize,
    /// 유휴 트래커 만료 시간 (초)
    pub idle_ttl_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            max_entries: 64,
            idle_ttl_secs: 3600,
        }
    }
}

impl ConfigValidation for TrackerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_entries == 0 {
            return Err(invalid("max_entries는 0보다 커야 합니다"));
        }
        if self.idle_ttl_secs == 0 {
            return Err(invalid("idle_ttl_secs는 0보다 커야 합니다"));
        }
        Ok(())
    }
}

/// 지표 계산 백엔드 설정
///
/// `remote_url`이 없으면 로컬 계산만 사용합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// 원격 지표 서비스 주소 (예: http://localhost:8001)
    pub remote_url: Option<String>,
    /// 원격 호출 타임아웃 (밀리초)
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            remote_url: None,
            timeout_ms: 2000,
        }
    }
}

impl ConfigValidation for BackendConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(url) = &self.remote_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid(format!("지원되지 않는 원격 주소: {url}")));
            }
        }
        if self.timeout_ms == 0 {
            return Err(invalid("timeout_ms는 0보다 커야 합니다"));
        }
        Ok(())
    }
}

/// 전체 분석 설정
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub indicator: IndicatorConfig,
    pub swing: SwingConfig,
    pub zone: ZoneConfig,
    pub fvg: FvgConfig,
    pub pattern: PatternConfig,
    pub price_action: PriceActionConfig,
    pub trend_channel: TrendChannelConfig,
    pub confluence: ConfluenceConfig,
    pub tracker: TrackerConfig,
    pub backend: BackendConfig,
}

impl AnalysisConfig {
    /// 타임프레임에 맞춘 기본 설정 (스윙 윈도우만 달라짐)
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        AnalysisConfig {
            swing: SwingConfig::for_timeframe(timeframe),
            ..AnalysisConfig::default()
        }
    }
}

impl ConfigValidation for AnalysisConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.indicator.validate()?;
        self.swing.validate()?;
        self.zone.validate()?;
        self.fvg.validate()?;
        self.pattern.validate()?;
        self.price_action.validate()?;
        self.trend_channel.validate()?;
        self.confluence.validate()?;
        self.tracker.validate()?;
        self.backend.validate()
    }
}
