use common_test_utils::*;

use market_structure::analyzer::confluence_analyzer::{ConfluenceAnalyzer, Grade, MarketTrend};
use market_structure::analyzer::order_block_analyzer::OrderBlockType;
use market_structure::config::{AnalysisConfig, ConfluenceConfig};
use market_structure::model::{Candle, TradeDirection};
use market_structure::pipeline::AnalysisPipeline;

/// 300개 일봉: 장기 상승 후 15개 연속 하락으로 RSI가 35 아래로 내려가고,
/// 마지막 캔들이 직전 음봉을 감싸는 불리시 오더 블록
fn uptrend_with_dip() -> Vec<Candle> {
    let mut candles: Vec<Candle> = (0..284)
        .map(|i| {
            let close = 100.0 + i as f64;
            create_candle(i, close - 0.5, close + 1.0, close - 1.0, close)
        })
        .collect();

    let mut prev_close = 383.0;
    for i in 284..299 {
        let close = prev_close - 2.0;
        candles.push(create_candle(i, prev_close, prev_close + 0.5, close - 0.5, close));
        prev_close = close;
    }
    // 직전 음봉(시가 355, 종가 353)의 시가 위에서 마감
    candles.push(create_candle(299, 352.5, 356.0, 352.0, 355.5));
    candles
}

#[test]
fn test_uptrend_dip_with_order_block_is_buy() {
    let candles = uptrend_with_dip();
    assert_eq!(candles.len(), 300);

    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let bundle = pipeline.analyze(&candles, 0.0).unwrap();

    let last = bundle.indicators.last().unwrap();
    assert!(last.ema_fast > last.ema_slow);
    assert!(last.rsi.unwrap() < 35.0);
    assert!(bundle.warmup_complete);

    let block = bundle.order_blocks.last().unwrap();
    assert_eq!(block.index, 299);
    assert_eq!(block.kind, OrderBlockType::Bullish);

    assert_eq!(bundle.signal, TradeDirection::Buy);
    assert_eq!(bundle.confluence.direction, TradeDirection::Buy);
    assert!(bundle.confluence.score >= 60);
    assert!(bundle.confluence.grade <= Grade::B);
    assert!(bundle.confluence.factors.contains(&"SMC zone present".to_string()));
    assert!(bundle.confluence.factors.contains(&"Trend aligned".to_string()));
}

#[test]
fn test_negative_sentiment_removes_one_factor() {
    let candles = uptrend_with_dip();
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();

    let neutral = pipeline.analyze(&candles, 0.0).unwrap().confluence;
    let bearish = pipeline.analyze(&candles, -0.9).unwrap().confluence;
    assert_eq!(neutral.score - bearish.score, 20);
    assert!(!bearish.factors.contains(&"Sentiment positive".to_string()));
}

#[test]
fn test_clean_uptrend_without_dip_is_wait() {
    let candles = create_uptrend_candles(300, 100.0, 1.0);
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let bundle = pipeline.analyze(&candles, 0.0).unwrap();

    assert_eq!(bundle.market_trend, Some(MarketTrend::Up));
    assert_eq!(bundle.signal, TradeDirection::Wait);
    assert_eq!(bundle.confluence.score, 0);
    assert_eq!(bundle.confluence.grade, Grade::F);
    assert_eq!(bundle.confluence.factors, vec!["No clear signal".to_string()]);
}

#[test]
fn test_warmup_rsi_gives_wait() {
    let candles = create_downtrend_candles(5, 100.0, 1.0);
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let bundle = pipeline.analyze(&candles, 0.0).unwrap();
    assert!(!bundle.warmup_complete);
    assert_eq!(bundle.signal, TradeDirection::Wait);
}

#[test]
fn test_fewer_points_per_factor() {
    let candles = uptrend_with_dip();
    let config = AnalysisConfig {
        confluence: ConfluenceConfig {
            points_per_factor: 10,
            ..ConfluenceConfig::default()
        },
        ..AnalysisConfig::default()
    };
    let default_score = AnalysisPipeline::new(AnalysisConfig::default())
        .unwrap()
        .analyze(&candles, 0.0)
        .unwrap()
        .confluence
        .score;
    let halved = AnalysisPipeline::new(config)
        .unwrap()
        .analyze(&candles, 0.0)
        .unwrap()
        .confluence
        .score;
    assert_eq!(halved * 2, default_score);
}

#[test]
fn test_directional_signal_thresholds() {
    let analyzer = ConfluenceAnalyzer::default();
    let row = market_structure::indicator::IndicatorRow {
        ema_fast: 100.0,
        ema_slow: 100.0,
        rsi: Some(40.0),
        atr: Some(1.0),
    };
    // 경계값은 신호가 아님
    assert_eq!(analyzer.directional_signal(101.0, &row), TradeDirection::Wait);
    let oversold = market_structure::indicator::IndicatorRow {
        rsi: Some(39.9),
        ..row
    };
    assert_eq!(analyzer.directional_signal(101.0, &oversold), TradeDirection::Buy);
    assert_eq!(analyzer.directional_signal(99.0, &oversold), TradeDirection::Wait);
}
