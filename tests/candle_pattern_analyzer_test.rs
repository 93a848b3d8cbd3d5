use common_test_utils::*;

use market_structure::analyzer::candle_pattern_analyzer::{
    CandlePattern, CandlePatternAnalyzer, PatternBias,
};
use market_structure::analyzer::order_block_analyzer::{OrderBlockAnalyzer, OrderBlockType};
use market_structure::config::AnalysisConfig;
use market_structure::tracker::SignalTracker;
use market_structure::pipeline::AnalysisPipeline;
use std::sync::Arc;

#[test]
fn test_sideways_series_has_no_patterns_or_order_blocks() {
    let candles = create_sideways_candles(120, 100.0, 2.0);

    let patterns = CandlePatternAnalyzer::default().analyze(&candles);
    assert_eq!(patterns.len(), candles.len());
    assert!(patterns.iter().all(|p| p.is_empty()));
    assert!(OrderBlockAnalyzer::new().analyze(&candles).is_empty());
}

#[test]
fn test_sideways_series_tracker_does_not_grow_pattern_lists() {
    let candles = create_sideways_candles(120, 100.0, 2.0);
    let pipeline = Arc::new(AnalysisPipeline::new(AnalysisConfig::default()).unwrap());
    let mut tracker = SignalTracker::new(pipeline);

    for end in [60, 90, 120] {
        let (updated, bundle) = tracker.update(&candles[..end], 0.0).unwrap();
        assert!(updated);
        assert_eq!(bundle.patterns.len(), end);
        assert!(bundle.patterns.iter().all(|p| p.is_empty()));
        assert!(bundle.order_blocks.is_empty());
    }
}

#[test]
fn test_hammer_and_hanging_man_after_rise() {
    let candles = create_candles(&[
        (10.0, 10.6, 9.8, 10.4),
        (10.4, 11.0, 10.2, 10.8),
        (10.8, 11.4, 10.6, 11.2),
        // 아랫꼬리 3.0, 몸통 0.2, 윗꼬리 0.1
        (11.2, 11.5, 8.2, 11.4),
    ]);
    let patterns = CandlePatternAnalyzer::default().patterns_at(&candles, 3);
    assert!(patterns.contains(&CandlePattern::Hammer));
    assert!(patterns.contains(&CandlePattern::HangingMan));
    assert!(patterns.contains(&CandlePattern::BullishPinBar));
}

#[test]
fn test_hammer_without_prior_rise_is_not_hanging_man() {
    let candles = create_candles(&[
        (11.2, 11.4, 10.6, 10.8),
        (10.8, 11.0, 10.2, 10.4),
        (11.2, 11.5, 8.2, 11.4),
    ]);
    let patterns = CandlePatternAnalyzer::default().patterns_at(&candles, 2);
    assert!(patterns.contains(&CandlePattern::Hammer));
    assert!(!patterns.contains(&CandlePattern::HangingMan));
}

#[test]
fn test_engulfing_and_order_block_share_candle() {
    let candles = create_candles(&[(10.0, 10.2, 8.8, 9.0), (8.9, 10.6, 8.7, 10.5)]);

    let patterns = CandlePatternAnalyzer::default().patterns_at(&candles, 1);
    assert!(patterns.contains(&CandlePattern::BullishEngulfing));

    let blocks = OrderBlockAnalyzer::new().analyze(&candles);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].kind, OrderBlockType::Bullish);
}

#[test]
fn test_evening_star() {
    let candles = create_candles(&[
        (10.0, 12.1, 9.9, 12.0),
        (12.3, 12.6, 12.2, 12.4),
        (12.2, 12.3, 10.4, 10.5),
    ]);
    let patterns = CandlePatternAnalyzer::default().patterns_at(&candles, 2);
    assert!(patterns.contains(&CandlePattern::EveningStar));
    assert!(patterns.iter().any(|p| p.bias() == PatternBias::Bearish));
}

#[test]
fn test_zero_range_candle_has_no_pattern() {
    let candles = create_candles(&[(10.0, 10.0, 10.0, 10.0)]);
    assert!(CandlePatternAnalyzer::default().patterns_at(&candles, 0).is_empty());
}
