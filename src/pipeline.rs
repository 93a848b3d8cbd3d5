//! 분석 파이프라인
//!
//! 지표 → 스윙 → 구간 → FVG/오더블록/패턴/거부 → 돌파 신호 → 추세 채널 → 컨플루언스 순서로
//! 각 단계를 실행하고, 결과를 `AnalysisContext`에 단계별로 쌓아 `AnalysisBundle`로 만듭니다.

use crate::analyzer::{
    BreakSignal, BreakSignalAnalyzer, CandlePattern, CandlePatternAnalyzer, ConfluenceAnalyzer,
    ConfluenceInputs, ConfluenceResult, FairValueGap, FvgAnalyzer, MarketTrend, OrderBlock,
    OrderBlockAnalyzer, PriceActionAnalyzer, Rejection, SupportResistanceAnalyzer, SwingAnalyzer,
    SwingPoint, TrendChannel, TrendChannelAnalyzer, Zone,
};
use crate::config::{AnalysisConfig, SwingConfig};
use crate::config_loader::{ConfigResult, ConfigValidation};
use crate::indicator::backend::{IndicatorBackend, LocalBackend, RemoteBackend};
use crate::indicator::{IndicatorRow, IndicatorSeries};
use crate::model::{Candle, CandleError, Timeframe, TradeDirection, validate_candles};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// 단계별 분석 결과를 쌓는 컨텍스트
///
/// 각 `with_*` 메서드는 한 단계의 결과를 받아 새 컨텍스트를 돌려줍니다.
/// 설정되지 않은 단계는 빈 결과로 남습니다.
#[derive(Debug, Clone)]
pub struct AnalysisContext<'a> {
    candles: &'a [Candle],
    indicators: Vec<IndicatorRow>,
    swings: Vec<SwingPoint>,
    zones: Vec<Zone>,
    fvgs: Vec<FairValueGap>,
    order_blocks: Vec<OrderBlock>,
    patterns: Vec<Vec<CandlePattern>>,
    rejections: Vec<Rejection>,
    break_signals: Vec<BreakSignal>,
    trend_channel: Option<TrendChannel>,
}

impl<'a> AnalysisContext<'a> {
    /// 캔들 시퀀스로 빈 컨텍스트 생성
    pub fn new(candles: &'a [Candle]) -> Self {
        AnalysisContext {
            candles,
            indicators: Vec::new(),
            swings: Vec::new(),
            zones: Vec::new(),
            fvgs: Vec::new(),
            order_blocks: Vec::new(),
            patterns: Vec::new(),
            rejections: Vec::new(),
            break_signals: Vec::new(),
            trend_channel: None,
        }
    }

    pub fn candles(&self) -> &'a [Candle] {
        self.candles
    }

    pub fn indicators(&self) -> &[IndicatorRow] {
        &self.indicators
    }

    pub fn swings(&self) -> &[SwingPoint] {
        &self.swings
    }

    pub fn fvgs(&self) -> &[FairValueGap] {
        &self.fvgs
    }

    pub fn with_indicators(mut self, indicators: Vec<IndicatorRow>) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn with_swings(mut self, swings: Vec<SwingPoint>) -> Self {
        self.swings = swings;
        self
    }

    pub fn with_zones(mut self, zones: Vec<Zone>) -> Self {
        self.zones = zones;
        self
    }

    pub fn with_fvgs(mut self, fvgs: Vec<FairValueGap>) -> Self {
        self.fvgs = fvgs;
        self
    }

    pub fn with_order_blocks(mut self, order_blocks: Vec<OrderBlock>) -> Self {
        self.order_blocks = order_blocks;
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<Vec<CandlePattern>>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_rejections(mut self, rejections: Vec<Rejection>) -> Self {
        self.rejections = rejections;
        self
    }

    pub fn with_break_signals(mut self, break_signals: Vec<BreakSignal>) -> Self {
        self.break_signals = break_signals;
        self
    }

    pub fn with_trend_channel(mut self, trend_channel: Option<TrendChannel>) -> Self {
        self.trend_channel = trend_channel;
        self
    }

    /// 컨플루언스 계산 입력
    pub fn confluence_inputs(&self, sentiment: f64) -> ConfluenceInputs<'_> {
        ConfluenceInputs {
            candles: self.candles,
            indicators: &self.indicators,
            fvgs: &self.fvgs,
            order_blocks: &self.order_blocks,
            patterns: &self.patterns,
            rejections: &self.rejections,
            sentiment,
        }
    }

    /// 컨텍스트를 결과 번들로 변환
    ///
    /// # Arguments
    /// * `analyzer` - 마지막 캔들의 방향 신호와 점수를 계산할 분석기
    /// * `sentiment` - 외부 감성 점수
    /// * `backend` - 지표 계산에 사용된 백엔드 이름
    pub fn into_bundle(
        self,
        analyzer: &ConfluenceAnalyzer,
        sentiment: f64,
        backend: &str,
    ) -> AnalysisBundle {
        let confluence = analyzer.score(&self.confluence_inputs(sentiment));
        let last = self.candles.last().zip(self.indicators.last());
        let signal = last.map_or(TradeDirection::Wait, |(candle, row)| {
            analyzer.directional_signal(candle.close, row)
        });
        let market_trend = last.map(|(candle, row)| MarketTrend::from_row(candle.close, row));
        let warmup_complete = self
            .indicators
            .last()
            .is_some_and(|row| row.rsi.is_some() && row.atr.is_some());

        AnalysisBundle {
            candle_count: self.candles.len(),
            warmup_complete,
            backend: backend.to_string(),
            indicators: self.indicators,
            swings: self.swings,
            zones: self.zones,
            fvgs: self.fvgs,
            order_blocks: self.order_blocks,
            patterns: self.patterns,
            rejections: self.rejections,
            break_signals: self.break_signals,
            trend_channel: self.trend_channel,
            market_trend,
            signal,
            confluence,
        }
    }
}

/// 한 캔들 시퀀스에 대한 전체 분석 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub candle_count: usize,
    /// 마지막 캔들의 RSI/ATR이 모두 정의되었는지 여부
    pub warmup_complete: bool,
    /// 지표 계산에 사용된 백엔드 ("local" 또는 "remote")
    pub backend: String,
    /// 캔들과 1:1로 정렬된 지표 행
    pub indicators: Vec<IndicatorRow>,
    pub swings: Vec<SwingPoint>,
    pub zones: Vec<Zone>,
    pub fvgs: Vec<FairValueGap>,
    pub order_blocks: Vec<OrderBlock>,
    /// 캔들별 패턴 집합
    pub patterns: Vec<Vec<CandlePattern>>,
    pub rejections: Vec<Rejection>,
    pub break_signals: Vec<BreakSignal>,
    pub trend_channel: Option<TrendChannel>,
    pub market_trend: Option<MarketTrend>,
    /// 마지막 캔들의 순간 방향 신호
    pub signal: TradeDirection,
    /// 마지막 캔들의 컨플루언스 결과
    pub confluence: ConfluenceResult,
}

/// 여러 (심볼, 타임프레임) 동시 분석 요청
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
    pub sentiment: f64,
}

/// 동시 분석 결과
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub result: Result<AnalysisBundle, CandleError>,
}

/// 시장 구조 분석 파이프라인
///
/// 각 호출은 입력 캔들에 대한 순수 계산이며 내부 상태를 바꾸지 않습니다.
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    primary: Arc<dyn IndicatorBackend>,
    fallback: LocalBackend,
    swing: SwingAnalyzer,
    zone: SupportResistanceAnalyzer,
    fvg: FvgAnalyzer,
    order_block: OrderBlockAnalyzer,
    pattern: CandlePatternAnalyzer,
    price_action: PriceActionAnalyzer,
    break_signal: BreakSignalAnalyzer,
    trend_channel: TrendChannelAnalyzer,
    confluence: ConfluenceAnalyzer,
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("backend", &self.primary.name())
            .field("config", &self.config)
            .finish()
    }
}

impl AnalysisPipeline {
    /// 새 파이프라인 생성
    ///
    /// `backend.remote_url`이 있으면 원격 백엔드를 우선 사용하고, 없으면 로컬 계산만 사용합니다.
    ///
    /// # Arguments
    /// * `config` - 분석 설정 (생성 시 검증)
    ///
    /// # Returns
    /// * `ConfigResult<Self>` - 설정이 유효하지 않으면 `ConfigError::ValidationError`
    pub fn new(config: AnalysisConfig) -> ConfigResult<Self> {
        config.validate()?;
        let primary: Arc<dyn IndicatorBackend> = match &config.backend.remote_url {
            Some(url) => {
                let timeout = Duration::from_millis(config.backend.timeout_ms);
                match RemoteBackend::new(url, timeout) {
                    Ok(remote) => {
                        info!("원격 지표 백엔드 사용: {url}");
                        Arc::new(remote)
                    }
                    Err(e) => {
                        warn!("원격 지표 백엔드 생성 실패, 로컬 계산 사용: {e}");
                        Arc::new(LocalBackend)
                    }
                }
            }
            None => Arc::new(LocalBackend),
        };
        Ok(Self::build(config, primary))
    }

    /// 지정한 백엔드를 우선 사용하는 파이프라인 생성
    pub fn with_backend(
        config: AnalysisConfig,
        backend: Box<dyn IndicatorBackend>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(config, Arc::from(backend)))
    }

    /// 타임프레임에 맞는 스윙 윈도우를 쓰는 파이프라인
    ///
    /// 스윙 설정만 `SwingConfig::for_timeframe`으로 바꾸고 나머지 설정과 지표 백엔드는 공유합니다.
    pub fn for_timeframe(&self, timeframe: Timeframe) -> Self {
        let config = AnalysisConfig {
            swing: SwingConfig::for_timeframe(timeframe),
            ..self.config.clone()
        };
        debug!(
            "{timeframe} 파이프라인: 스윙 윈도우 {}/{}",
            config.swing.left_bars, config.swing.right_bars
        );
        Self::build(config, Arc::clone(&self.primary))
    }

    fn build(config: AnalysisConfig, primary: Arc<dyn IndicatorBackend>) -> Self {
        let right_bars = config.swing.right_bars;
        let zone = SupportResistanceAnalyzer::new(config.zone.clone());
        AnalysisPipeline {
            primary,
            fallback: LocalBackend,
            swing: SwingAnalyzer::new(config.swing.clone()),
            break_signal: BreakSignalAnalyzer::new(zone.clone(), right_bars),
            zone,
            fvg: FvgAnalyzer::new(config.fvg.clone()),
            order_block: OrderBlockAnalyzer::new(),
            pattern: CandlePatternAnalyzer::new(config.pattern.clone()),
            price_action: PriceActionAnalyzer::new(config.price_action.clone(), right_bars),
            trend_channel: TrendChannelAnalyzer::new(config.trend_channel.clone()),
            confluence: ConfluenceAnalyzer::new(config.confluence.clone()),
            config,
        }
    }

    /// 파이프라인 설정
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// 지표 계산 (우선 백엔드 실패 시 로컬 계산)
    fn compute_indicators(&self, candles: &[Candle]) -> (IndicatorSeries, &str) {
        if !candles.is_empty() {
            match self.primary.compute(candles, &self.config.indicator) {
                Ok(series) if series.len() == candles.len() => {
                    return (series, self.primary.name());
                }
                Ok(series) => warn!(
                    "{} 백엔드 응답 길이 불일치 ({} != {}), 로컬 계산으로 대체",
                    self.primary.name(),
                    series.len(),
                    candles.len()
                ),
                Err(e) => warn!("{} 백엔드 실패, 로컬 계산으로 대체: {e}", self.primary.name()),
            }
        }
        match self.fallback.compute(candles, &self.config.indicator) {
            Ok(series) => (series, self.fallback.name()),
            Err(e) => {
                warn!("로컬 지표 계산 실패: {e}");
                (
                    IndicatorSeries {
                        rows: Vec::new(),
                        config: self.config.indicator.clone(),
                    },
                    self.fallback.name(),
                )
            }
        }
    }

    /// 캔들 시퀀스 분석
    ///
    /// # Arguments
    /// * `candles` - 시간 오름차순 캔들 (마지막 캔들은 확정된 캔들이어야 함)
    /// * `sentiment` - 외부 감성 점수 [-1, 1] (없으면 0, 범위 밖이면 잘라냄)
    ///
    /// # Returns
    /// * `Result<AnalysisBundle, CandleError>` - 캔들 순서/가격이 잘못되면 오류
    pub fn analyze(&self, candles: &[Candle], sentiment: f64) -> Result<AnalysisBundle, CandleError> {
        validate_candles(candles)?;
        let sentiment = if sentiment.is_finite() {
            sentiment.clamp(-1.0, 1.0)
        } else {
            warn!("유한하지 않은 감성 점수 {sentiment}, 0으로 처리");
            0.0
        };

        let (series, backend) = self.compute_indicators(candles);
        let current_price = candles.last().map_or(0.0, |c| c.close);

        let swings = self.swing.analyze(candles);
        let zones = self.zone.analyze(&swings, current_price);
        let ctx = AnalysisContext::new(candles)
            .with_indicators(series.rows.clone())
            .with_swings(swings)
            .with_zones(zones)
            .with_fvgs(self.fvg.analyze(candles))
            .with_order_blocks(self.order_block.analyze(candles))
            .with_patterns(self.pattern.analyze(candles));
        let rejections = self.price_action.analyze(candles, ctx.swings(), &series);
        let break_signals = self.break_signal.analyze(candles, ctx.swings(), ctx.fvgs());
        let ctx = ctx
            .with_rejections(rejections)
            .with_break_signals(break_signals)
            .with_trend_channel(self.trend_channel.analyze(candles));

        let bundle = ctx.into_bundle(&self.confluence, sentiment, backend);
        debug!(
            "분석 완료: 캔들 {}개, 스윙 {}개, 구간 {}개, FVG {}개, 신호 {} ({}점)",
            bundle.candle_count,
            bundle.swings.len(),
            bundle.zones.len(),
            bundle.fvgs.len(),
            bundle.signal,
            bundle.confluence.score
        );
        Ok(bundle)
    }

    /// 여러 (심볼, 타임프레임) 요청을 병렬로 분석
    ///
    /// 각 요청은 자신의 캔들 벡터를 소유하며 요청 간 공유 상태는 없습니다.
    /// 결과 순서는 요청 순서와 같습니다.
    pub fn analyze_many(&self, requests: Vec<AnalysisRequest>) -> Vec<AnalysisOutcome> {
        debug!("병렬 분석 요청 {}개", requests.len());
        requests
            .into_par_iter()
            .map(|request| {
                let result = self.analyze(&request.candles, request.sentiment);
                if let Err(e) = &result {
                    warn!("{} {} 분석 실패: {e}", request.symbol, request.timeframe);
                }
                AnalysisOutcome {
                    symbol: request.symbol,
                    timeframe: request.timeframe,
                    result,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndicatorConfig;
    use crate::config_loader::ConfigError;
    use crate::indicator::backend::BackendError;
    use chrono::{TimeZone, Utc};

    struct FailingBackend;

    impl IndicatorBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn compute(
            &self,
            _candles: &[Candle],
            _config: &IndicatorConfig,
        ) -> Result<IndicatorSeries, BackendError> {
            Err(BackendError::Transport("connection refused".to_string()))
        }
    }

    fn candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.3).sin() * 5.0;
                Candle::new(Utc.timestamp_opt(i as i64 * 60, 0).unwrap(), c - 0.5, c + 1.0, c - 1.0, c, 1.0)
            })
            .collect()
    }

    #[test]
    fn test_falls_back_to_local_backend() {
        let pipeline =
            AnalysisPipeline::with_backend(AnalysisConfig::default(), Box::new(FailingBackend)).unwrap();
        let input = candles(40);
        let bundle = pipeline.analyze(&input, 0.0).unwrap();
        assert_eq!(bundle.backend, "local");
        assert_eq!(bundle.indicators.len(), 40);
        assert_eq!(bundle.patterns.len(), 40);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.zone.min_touches = 0;
        assert!(matches!(
            AnalysisPipeline::new(config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_unordered_candles() {
        let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
        let mut input = candles(5);
        input.swap(1, 2);
        assert_eq!(
            pipeline.analyze(&input, 0.0),
            Err(CandleError::NotIncreasing { index: 2 })
        );
    }

    #[test]
    fn test_empty_input_gives_empty_bundle() {
        let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
        let bundle = pipeline.analyze(&[], 0.0).unwrap();
        assert_eq!(bundle.candle_count, 0);
        assert!(!bundle.warmup_complete);
        assert_eq!(bundle.signal, TradeDirection::Wait);
        assert!(bundle.market_trend.is_none());
        assert!(bundle.trend_channel.is_none());
    }

    #[test]
    fn test_for_timeframe_keeps_backend_and_other_sections() {
        let mut config = AnalysisConfig::default();
        config.zone.min_touches = 2;
        let base = AnalysisPipeline::with_backend(config, Box::new(FailingBackend)).unwrap();

        let minute = base.for_timeframe(Timeframe::Minute1);
        assert_eq!(minute.config().swing.left_bars, 3);
        assert_eq!(minute.config().swing.right_bars, 3);
        assert_eq!(minute.config().zone.min_touches, 2);
        assert_eq!(minute.primary.name(), "failing");
        assert_eq!(base.for_timeframe(Timeframe::Hour4).config().swing.left_bars, 7);
    }
}
