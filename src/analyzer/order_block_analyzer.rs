use crate::model::Candle;
use log::debug;
use serde::{Deserialize, Serialize};

/// 오더 블록 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderBlockType {
    /// 불리시 오더 블록 (수요 구역)
    Bullish,
    /// 베어리시 오더 블록 (공급 구역)
    Bearish,
}

/// 오더 블록
///
/// `index`는 반전을 확정한 캔들, `origin_index`는 그 직전의 반대 색 캔들이며
/// `top`/`bottom`은 원점 캔들의 고가/저가입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub kind: OrderBlockType,
    pub index: usize,
    pub origin_index: usize,
    pub top: f64,
    pub bottom: f64,
}

/// 오더 블록 분석기
///
/// 2캔들 반전 규칙: 불리시는 직전 음봉 뒤 양봉이 직전 시가 위에서 마감한 경우,
/// 베어리시는 직전 양봉 뒤 음봉이 직전 시가 아래에서 마감한 경우입니다.
#[derive(Debug, Clone, Default)]
pub struct OrderBlockAnalyzer;

impl OrderBlockAnalyzer {
    /// 새 오더 블록 분석기 생성
    pub fn new() -> Self {
        OrderBlockAnalyzer
    }

    fn detect_at(candles: &[Candle], i: usize) -> Option<OrderBlock> {
        let prev = &candles[i - 1];
        let current = &candles[i];

        let kind = if prev.is_bearish() && current.is_bullish() && current.close > prev.open {
            OrderBlockType::Bullish
        } else if prev.is_bullish() && current.is_bearish() && current.close < prev.open {
            OrderBlockType::Bearish
        } else {
            return None;
        };

        Some(OrderBlock {
            kind,
            index: i,
            origin_index: i - 1,
            top: prev.high,
            bottom: prev.low,
        })
    }

    /// 오더 블록 목록 (인덱스 오름차순)
    pub fn analyze(&self, candles: &[Candle]) -> Vec<OrderBlock> {
        let blocks: Vec<OrderBlock> = (1..candles.len())
            .filter_map(|i| Self::detect_at(candles, i))
            .collect();
        debug!("오더 블록 {}개 탐지", blocks.len());
        blocks
    }
}
