// 기술적 지표 모듈
// EMA / RSI / ATR 빌더와 캔들별 지표 행(IndicatorRow)을 제공합니다.

pub mod atr;
pub mod backend;
pub mod ema;
pub mod rsi;
pub mod utils;

use crate::config::IndicatorConfig;
use crate::indicator::atr::ATRBuilder;
use crate::indicator::ema::EMABuilder;
use crate::indicator::rsi::RSIBuilder;
use crate::model::Candle;
use log::debug;
use serde::{Deserialize, Serialize};

/// 캔들별 지표 값
///
/// 인덱스 i의 값은 캔들 `[0..=i]`에만 의존합니다.
/// EMA는 인덱스 0부터 정의되고, RSI/ATR은 워밍업 동안 None입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
}

/// 캔들과 1:1로 정렬된 지표 시리즈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub rows: Vec<IndicatorRow>,
    /// 시리즈 생성에 사용한 설정
    pub config: IndicatorConfig,
}

impl IndicatorSeries {
    /// 지표 행 수
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 인덱스의 지표 행
    pub fn get(&self, index: usize) -> Option<&IndicatorRow> {
        self.rows.get(index)
    }

    /// 마지막 지표 행
    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// 모든 지표가 정의되었는지 여부
    ///
    /// 마지막 행의 RSI와 ATR이 모두 있으면 워밍업이 끝난 것으로 봅니다.
    pub fn warmup_complete(&self) -> bool {
        self.rows
            .last()
            .is_some_and(|row| row.rsi.is_some() && row.atr.is_some())
    }
}

/// 지표 엔진
///
/// 캔들 시퀀스에서 EMA(단기/장기), RSI, ATR을 한 번에 계산합니다.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    /// 새 지표 엔진 생성 (검증된 설정을 전달해야 합니다)
    pub fn new(config: IndicatorConfig) -> Self {
        IndicatorEngine { config }
    }

    /// 캔들 시퀀스의 지표 시리즈 계산
    ///
    /// # Arguments
    /// * `candles` - 시간 오름차순 캔들
    ///
    /// # Returns
    /// * `IndicatorSeries` - 캔들과 같은 길이의 지표 시리즈
    pub fn compute(&self, candles: &[Candle]) -> IndicatorSeries {
        let mut ema_fast = EMABuilder::new(self.config.ema_fast_span);
        let mut ema_slow = EMABuilder::new(self.config.ema_slow_span);
        let mut rsi = RSIBuilder::new(self.config.rsi_period);
        let mut atr = ATRBuilder::new(self.config.atr_period);

        let rows = candles
            .iter()
            .map(|candle| IndicatorRow {
                ema_fast: ema_fast.next(candle).value,
                ema_slow: ema_slow.next(candle).value,
                rsi: rsi.next(candle).map(|v| v.value),
                atr: atr.next(candle).map(|v| v.value),
            })
            .collect::<Vec<_>>();

        debug!("지표 계산 완료: {}개 캔들", rows.len());

        IndicatorSeries {
            rows,
            config: self.config.clone(),
        }
    }
}
