//! 증분 신호 트래커
//!
//! 스트리밍 호출자는 짧은 간격으로 폴링하지만 확정 캔들은 타임프레임마다 한 번만 늘어납니다.
//! 트래커는 캔들 수가 늘었을 때만 파이프라인을 다시 실행하고, 그 외에는 캐시된 결과를 돌려줍니다.

use crate::config::TrackerConfig;
use crate::model::{Candle, CandleError, Timeframe};
use crate::pipeline::{AnalysisBundle, AnalysisPipeline};
use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// 트래커 상태 요약
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerStats {
    pub last_candle_count: usize,
    /// 마지막 재계산 시각 (한 번도 계산하지 않았으면 None)
    pub last_update_time: Option<DateTime<Utc>>,
    pub pivot_points: usize,
    pub fvg_zones: usize,
    pub break_signals: usize,
}

/// (심볼, 타임프레임) 하나에 대한 재계산 게이트
#[derive(Debug)]
pub struct SignalTracker {
    pipeline: Arc<AnalysisPipeline>,
    last_candle_count: usize,
    last_update_time: Option<DateTime<Utc>>,
    cached: Option<Arc<AnalysisBundle>>,
}

impl SignalTracker {
    /// 새 트래커 생성
    pub fn new(pipeline: Arc<AnalysisPipeline>) -> Self {
        SignalTracker {
            pipeline,
            last_candle_count: 0,
            last_update_time: None,
            cached: None,
        }
    }

    /// 캔들 시퀀스로 결과 갱신
    ///
    /// 캔들 수가 마지막 계산 때보다 많을 때만 전체 파이프라인을 다시 실행합니다.
    /// 같거나 적으면 캐시된 결과를 그대로 돌려줍니다.
    ///
    /// 재계산 여부는 길이로만 판단하므로 잘리지 않은 확정 캔들 전체를 넘겨야 합니다.
    /// 최대 크기에 도달한 `CandleStore`의 `items()`처럼 길이가 고정된 창을 넘기면
    /// 새 캔들이 들어와도 재계산되지 않습니다.
    ///
    /// # Arguments
    /// * `candles` - 확정된 캔들 시퀀스
    /// * `sentiment` - 외부 감성 점수
    ///
    /// # Returns
    /// * `(bool, Arc<AnalysisBundle>)` - (재계산 여부, 결과)
    pub fn update(
        &mut self,
        candles: &[Candle],
        sentiment: f64,
    ) -> Result<(bool, Arc<AnalysisBundle>), CandleError> {
        if let Some(cached) = &self.cached {
            if candles.len() <= self.last_candle_count {
                trace!(
                    "캐시 사용: 캔들 {}개 (마지막 계산 {}개)",
                    candles.len(),
                    self.last_candle_count
                );
                return Ok((false, Arc::clone(cached)));
            }
        }

        let bundle = Arc::new(self.pipeline.analyze(candles, sentiment)?);
        debug!(
            "재계산: 캔들 {}개 -> {}개",
            self.last_candle_count,
            candles.len()
        );
        self.last_candle_count = candles.len();
        self.last_update_time = Some(Utc::now());
        self.cached = Some(Arc::clone(&bundle));
        Ok((true, bundle))
    }

    /// 캐시된 결과
    pub fn cached(&self) -> Option<Arc<AnalysisBundle>> {
        self.cached.clone()
    }

    /// 트래커 상태 요약
    pub fn stats(&self) -> TrackerStats {
        let (pivot_points, fvg_zones, break_signals) = self.cached.as_ref().map_or((0, 0, 0), |b| {
            (b.swings.len(), b.fvgs.len(), b.break_signals.len())
        });
        TrackerStats {
            last_candle_count: self.last_candle_count,
            last_update_time: self.last_update_time,
            pivot_points,
            fvg_zones,
            break_signals,
        }
    }

    /// 캐시 초기화 (다음 호출에서 반드시 재계산)
    pub fn reset(&mut self) {
        self.last_candle_count = 0;
        self.last_update_time = None;
        self.cached = None;
    }
}

type TrackerKey = (String, Timeframe);

#[derive(Debug)]
struct RegistryEntry {
    tracker: Arc<Mutex<SignalTracker>>,
    last_access: Instant,
}

/// (심볼, 타임프레임)별 트래커 레지스트리
///
/// 맵은 `RwLock`으로, 개별 트래커는 `Mutex`로 보호합니다.
/// 같은 키의 동시 호출은 직렬화되고, 다른 키는 서로 막지 않습니다.
/// 새 키를 넣을 때 유휴 시간이 `idle_ttl_secs`를 넘은 항목을 지우고,
/// 그래도 `max_entries`에 도달해 있으면 가장 오래 사용하지 않은 항목을 지웁니다.
///
/// 트래커는 타임프레임별 파이프라인(`AnalysisPipeline::for_timeframe`)을 사용하므로
/// 스윙 윈도우는 키의 타임프레임을 따릅니다.
#[derive(Debug)]
pub struct TrackerRegistry {
    pipeline: Arc<AnalysisPipeline>,
    config: TrackerConfig,
    entries: RwLock<HashMap<TrackerKey, RegistryEntry>>,
    pipelines: Mutex<HashMap<Timeframe, Arc<AnalysisPipeline>>>,
}

impl TrackerRegistry {
    /// 새 레지스트리 생성 (설정은 파이프라인의 tracker 섹션 사용)
    pub fn new(pipeline: Arc<AnalysisPipeline>) -> Self {
        let config = pipeline.config().tracker.clone();
        TrackerRegistry {
            pipeline,
            config,
            entries: RwLock::new(HashMap::new()),
            pipelines: Mutex::new(HashMap::new()),
        }
    }

    /// 타임프레임별 파이프라인 (처음 요청될 때 생성)
    fn pipeline_for(&self, timeframe: Timeframe) -> Arc<AnalysisPipeline> {
        let mut pipelines = self.pipelines.lock().unwrap_or_else(|poisoned| {
            warn!("파이프라인 캐시 잠금 복구");
            poisoned.into_inner()
        });
        let pipeline = pipelines
            .entry(timeframe)
            .or_insert_with(|| Arc::new(self.pipeline.for_timeframe(timeframe)));
        Arc::clone(pipeline)
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<TrackerKey, RegistryEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!("트래커 레지스트리 잠금 복구 (읽기)");
            poisoned.into_inner()
        })
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<TrackerKey, RegistryEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("트래커 레지스트리 잠금 복구 (쓰기)");
            poisoned.into_inner()
        })
    }

    fn lock_tracker(tracker: &Mutex<SignalTracker>) -> MutexGuard<'_, SignalTracker> {
        tracker.lock().unwrap_or_else(|poisoned| {
            warn!("트래커 잠금 복구");
            poisoned.into_inner()
        })
    }

    fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.config.idle_ttl_secs)
    }

    /// 키의 트래커를 찾거나 새로 만듭니다
    fn tracker_for(&self, symbol: &str, timeframe: Timeframe) -> Arc<Mutex<SignalTracker>> {
        let key = (symbol.to_string(), timeframe);
        let now = Instant::now();
        let mut entries = self.write_entries();

        if let Some(entry) = entries.get_mut(&key) {
            entry.last_access = now;
            return Arc::clone(&entry.tracker);
        }

        let ttl = self.idle_ttl();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.last_access) <= ttl);
        if entries.len() < before {
            debug!("유휴 트래커 {}개 제거", before - entries.len());
        }

        if entries.len() >= self.config.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!("트래커 용량 초과, 제거: {} {}", oldest.0, oldest.1);
                entries.remove(&oldest);
            }
        }

        let tracker = Arc::new(Mutex::new(SignalTracker::new(self.pipeline_for(timeframe))));
        entries.insert(
            key,
            RegistryEntry {
                tracker: Arc::clone(&tracker),
                last_access: now,
            },
        );
        tracker
    }

    /// (심볼, 타임프레임)의 결과 갱신
    ///
    /// # Returns
    /// * `(bool, Arc<AnalysisBundle>)` - (재계산 여부, 결과)
    pub fn update(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
        sentiment: f64,
    ) -> Result<(bool, Arc<AnalysisBundle>), CandleError> {
        let tracker = self.tracker_for(symbol, timeframe);
        let mut tracker = Self::lock_tracker(&tracker);
        tracker.update(candles, sentiment)
    }

    /// 키의 트래커 상태 요약
    ///
    /// 맵 잠금은 트래커를 찾는 동안만 잡고, 트래커 잠금은 그 뒤에 잡습니다.
    pub fn stats(&self, symbol: &str, timeframe: Timeframe) -> Option<TrackerStats> {
        let tracker = self
            .read_entries()
            .get(&(symbol.to_string(), timeframe))
            .map(|entry| Arc::clone(&entry.tracker))?;
        let stats = Self::lock_tracker(&tracker).stats();
        Some(stats)
    }

    /// 기준 시각에서 유휴 시간이 지난 트래커 제거
    ///
    /// # Returns
    /// * `usize` - 제거된 항목 수
    pub fn evict_idle(&self, now: Instant) -> usize {
        let ttl = self.idle_ttl();
        let mut entries = self.write_entries();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.last_access) <= ttl);
        before - entries.len()
    }

    /// 키의 트래커 제거
    pub fn remove(&self, symbol: &str, timeframe: Timeframe) -> bool {
        self.write_entries()
            .remove(&(symbol.to_string(), timeframe))
            .is_some()
    }

    pub fn contains(&self, symbol: &str, timeframe: Timeframe) -> bool {
        self.read_entries()
            .contains_key(&(symbol.to_string(), timeframe))
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }
}
