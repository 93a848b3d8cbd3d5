use common_test_utils::*;

use market_structure::config::AnalysisConfig;
use market_structure::config_loader::{ConfigError, ConfigFormat, ConfigLoader};
use market_structure::model::{CandleError, Timeframe, TradeDirection};
use market_structure::pipeline::{AnalysisBundle, AnalysisPipeline, AnalysisRequest};
use std::io::Write;

#[test]
fn test_analyze_many_preserves_request_order() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let mut broken = create_wave_candles(50, 100.0, 3.0, 10.0);
    broken.swap(10, 11);

    let requests = vec![
        AnalysisRequest {
            symbol: "BTCUSDT".to_string(),
            timeframe: Timeframe::Hour1,
            candles: create_wave_candles(120, 100.0, 5.0, 20.0),
            sentiment: 0.0,
        },
        AnalysisRequest {
            symbol: "ETHUSDT".to_string(),
            timeframe: Timeframe::Minute15,
            candles: broken,
            sentiment: 0.0,
        },
        AnalysisRequest {
            symbol: "SOLUSDT".to_string(),
            timeframe: Timeframe::Day1,
            candles: create_uptrend_candles(80, 20.0, 0.5),
            sentiment: 0.5,
        },
    ];

    let outcomes = pipeline.analyze_many(requests);
    assert_eq!(outcomes.len(), 3);
    let symbols: Vec<&str> = outcomes.iter().map(|o| o.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]);

    assert_eq!(outcomes[0].result.as_ref().unwrap().candle_count, 120);
    assert_eq!(
        outcomes[1].result.as_ref().unwrap_err(),
        &CandleError::NotIncreasing { index: 11 }
    );
    assert_eq!(outcomes[2].timeframe, Timeframe::Day1);
    assert_eq!(outcomes[2].result.as_ref().unwrap().candle_count, 80);
}

#[test]
fn test_parallel_and_sequential_results_match() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let candles = create_wave_candles(200, 100.0, 6.0, 25.0);
    let sequential = pipeline.analyze(&candles, -0.4).unwrap();

    let outcomes = pipeline.analyze_many(vec![AnalysisRequest {
        symbol: "BTCUSDT".to_string(),
        timeframe: Timeframe::Hour4,
        candles,
        sentiment: -0.4,
    }]);
    assert_eq!(outcomes[0].result.as_ref().unwrap(), &sequential);
}

#[test]
fn test_pipeline_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
[swing]
left_bars = 3
right_bars = 3

[zone]
min_touches = 2

[confluence]
points_per_factor = 10
"#
    )
    .unwrap();

    let config: AnalysisConfig = ConfigLoader::load_from_file(&path, ConfigFormat::Auto).unwrap();
    assert_eq!(config.swing.left_bars, 3);
    assert_eq!(config.indicator.ema_fast_span, 50);

    let pipeline = AnalysisPipeline::new(config).unwrap();
    assert_eq!(pipeline.config().confluence.points_per_factor, 10);
    let bundle = pipeline
        .analyze(&create_wave_candles(100, 100.0, 5.0, 20.0), 0.0)
        .unwrap();
    assert!(bundle.swings.iter().all(|s| s.index >= 3 && s.index < 97));
}

#[test]
fn test_invalid_file_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis.json");
    std::fs::write(&path, r#"{"indicator":{"ema_fast_span":200,"ema_slow_span":50}}"#).unwrap();

    let result = ConfigLoader::load_from_file::<AnalysisConfig>(&path, ConfigFormat::Auto);
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_bundle_json_round_trip() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let bundle = pipeline
        .analyze(&create_wave_candles(150, 100.0, 5.0, 20.0), 0.0)
        .unwrap();

    let json = serde_json::to_string(&bundle).unwrap();
    let decoded: AnalysisBundle = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.candle_count, bundle.candle_count);
    assert_eq!(decoded.swings, bundle.swings);
    assert_eq!(decoded.confluence, bundle.confluence);
    assert_eq!(decoded.backend, "local");
}

#[test]
fn test_short_input_is_not_warmed_up() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let bundle = pipeline
        .analyze(&create_sideways_candles(10, 100.0, 2.0), 0.0)
        .unwrap();

    assert!(!bundle.warmup_complete);
    assert_eq!(bundle.indicators.len(), 10);
    assert!(bundle.indicators.iter().all(|row| row.rsi.is_none()));
    assert!(bundle.swings.is_empty());
    assert!(bundle.trend_channel.is_none());
    assert_eq!(bundle.signal, TradeDirection::Wait);
}

#[test]
fn test_out_of_range_sentiment_is_clamped() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let candles = create_wave_candles(150, 100.0, 5.0, 20.0);
    let clamped = pipeline.analyze(&candles, 7.5).unwrap();
    let at_bound = pipeline.analyze(&candles, 1.0).unwrap();
    assert_eq!(clamped, at_bound);

    let nan = pipeline.analyze(&candles, f64::NAN).unwrap();
    let neutral = pipeline.analyze(&candles, 0.0).unwrap();
    assert_eq!(nan, neutral);
}
