use common_test_utils::*;

use market_structure::analyzer::trend_channel_analyzer::{ChannelDirection, TrendChannelAnalyzer};
use market_structure::config::TrendChannelConfig;
use market_structure::model::Candle;

fn zigzag(count: usize, base: f64, slope: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let mid = base + slope * i as f64 + if i % 6 < 3 { 1.5 } else { -1.5 };
            create_candle(i, mid - 0.3, mid + 1.0, mid - 1.0, mid + 0.3)
        })
        .collect()
}

fn analyzer() -> TrendChannelAnalyzer {
    TrendChannelAnalyzer::new(TrendChannelConfig {
        backcandles: 60,
        search_range: 20,
        window_size: 5,
        strength_scale: 10000.0,
    })
}

#[test]
fn test_downtrend_channel_wraps_extremes() {
    let candles = zigzag(150, 300.0, -0.8);
    let channel = analyzer().analyze(&candles).unwrap();

    assert_eq!(channel.direction, ChannelDirection::Down);
    assert!(channel.slope_upper < 0.0 && channel.slope_lower < 0.0);
    assert!(channel.channel_width > 0.0);
    assert!((40..80).contains(&channel.backcandles_used));
    assert_eq!(channel.end_index, 149);

    let start = channel.end_index - channel.backcandles_used;
    let last = channel.end_index as f64;
    assert!(channel.upper_at(last) > channel.lower_at(last));
    // 조정된 절편은 표본 극값을 감싸므로 최근 구간 대부분의 캔들이 채널 안에 있음
    let inside = candles[start..]
        .iter()
        .enumerate()
        .filter(|(k, c)| {
            let x = (start + k) as f64;
            c.high <= channel.upper_at(x) + 1e-9 && c.low >= channel.lower_at(x) - 1e-9
        })
        .count();
    assert!(inside * 10 >= (candles.len() - start) * 7);
}

#[test]
fn test_flat_range_is_sideways_and_weak() {
    let candles = zigzag(150, 100.0, 0.0);
    if let Some(channel) = analyzer().analyze(&candles) {
        assert!(channel.strength < 100);
        assert!(channel.slope_upper.abs() < 0.05);
        assert!(channel.slope_lower.abs() < 0.05);
    }
}

#[test]
fn test_strength_is_capped() {
    let channel = analyzer().analyze(&zigzag(150, 100.0, 2.0)).unwrap();
    assert_eq!(channel.direction, ChannelDirection::Up);
    assert_eq!(channel.strength, 100);
}

#[test]
fn test_requires_backcandles_plus_window() {
    assert!(analyzer().analyze(&zigzag(64, 100.0, 1.0)).is_none());
}
