// 시장 구조 분석기 모듈
// 스윙, 지지/저항 구간, FVG, 오더블록, 캔들 패턴, 돌파 신호, 추세 채널, 컨플루언스 점수를 제공합니다.

pub mod break_signal_analyzer;
pub mod candle_pattern_analyzer;
pub mod confluence_analyzer;
pub mod fvg_analyzer;
pub mod order_block_analyzer;
pub mod price_action_analyzer;
pub mod support_resistance_analyzer;
pub mod swing_analyzer;
pub mod trend_channel_analyzer;

pub use break_signal_analyzer::{BreakDirection, BreakSignal, BreakSignalAnalyzer};
pub use candle_pattern_analyzer::{CandlePattern, CandlePatternAnalyzer, PatternBias};
pub use confluence_analyzer::{
    ConfluenceAnalyzer, ConfluenceInputs, ConfluenceResult, Grade, MarketTrend,
};
pub use fvg_analyzer::{FVGType, FairValueGap, FvgAnalyzer};
pub use order_block_analyzer::{OrderBlock, OrderBlockAnalyzer, OrderBlockType};
pub use price_action_analyzer::{PriceActionAnalyzer, Rejection, RejectionKind};
pub use support_resistance_analyzer::{SupportResistanceAnalyzer, Zone, ZoneFilter, ZoneKind};
pub use swing_analyzer::{SwingAnalyzer, SwingKind, SwingPoint};
pub use trend_channel_analyzer::{ChannelDirection, ChannelLine, TrendChannel, TrendChannelAnalyzer};
