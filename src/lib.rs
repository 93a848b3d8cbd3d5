pub mod analyzer;
pub mod candle_store;
pub mod config;
pub mod indicator;
pub mod model;
pub mod pipeline;
pub mod tracker;

/// 설정 로더
pub mod config_loader;
