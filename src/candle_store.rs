use crate::model::Candle;
use log::trace;

/// 제한된 크기의 캔들 저장소
///
/// 스트리밍으로 들어오는 캔들을 시간 오름차순으로 유지합니다.
/// 최대 크기를 초과하면 가장 오래된 캔들이 제거됩니다.
/// 같은 시각의 캔들이 다시 들어오면 진행 중인 캔들의 갱신으로 보고 교체합니다.
#[derive(Debug, Clone)]
pub struct CandleStore {
    items: Vec<Candle>,
    pub max_size: usize,
    pub use_duplicated_filter: bool,
}

impl CandleStore {
    /// 새로운 CandleStore 인스턴스를 생성합니다.
    ///
    /// # Arguments
    /// * `items` - 초기 캔들 목록 (순서 무관)
    /// * `max_size` - 저장소의 최대 크기
    /// * `use_duplicated_filter` - 마지막 캔들과 완전히 같은 캔들 무시 여부
    pub fn new(mut items: Vec<Candle>, max_size: usize, use_duplicated_filter: bool) -> CandleStore {
        items.sort_by(|a, b| a.time.cmp(&b.time));
        items.dedup_by(|later, earlier| later.time == earlier.time);

        if items.len() > max_size {
            let excess = items.len() - max_size;
            items.drain(..excess);
        }

        CandleStore {
            items,
            max_size,
            use_duplicated_filter,
        }
    }

    /// 캔들을 시간 순서 위치에 삽입합니다.
    ///
    /// 같은 시각이 이미 있으면 교체하고, 최대 크기를 넘으면 가장 오래된 캔들을 버립니다.
    ///
    /// # Returns
    /// * `bool` - 저장소 내용이 바뀌었으면 true
    pub fn add(&mut self, candle: Candle) -> bool {
        if self.use_duplicated_filter && self.items.last() == Some(&candle) {
            return false;
        }

        match self.items.binary_search_by(|item| item.time.cmp(&candle.time)) {
            Ok(idx) => {
                trace!("동일 시각 캔들 교체: {}", candle.time);
                self.items[idx] = candle;
            }
            Err(idx) => {
                self.items.insert(idx, candle);
                if self.items.len() > self.max_size {
                    self.items.remove(0);
                }
            }
        }
        true
    }

    /// 저장소에 있는 캔들 수
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 저장소가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 가장 최근 캔들
    pub fn latest(&self) -> Option<&Candle> {
        self.items.last()
    }

    /// 지정된 인덱스의 캔들 (0이 가장 오래된 캔들)
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.items.get(index)
    }

    /// 시간 오름차순 캔들 슬라이스
    pub fn items(&self) -> &[Candle] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(ts: i64, close: f64) -> Candle {
        Candle::new(
            Utc.timestamp_opt(ts, 0).unwrap(),
            close,
            close + 1.0,
            close - 1.0,
            close,
            1.0,
        )
    }

    #[test]
    fn test_new_sorts_and_truncates_oldest() {
        let store = CandleStore::new(vec![candle(3, 3.0), candle(1, 1.0), candle(2, 2.0)], 2, true);
        assert_eq!(store.len(), 2);
        assert_eq!(store.items()[0].close, 2.0);
        assert_eq!(store.latest().map(|c| c.close), Some(3.0));
    }

    #[test]
    fn test_add_replaces_same_time() {
        let mut store = CandleStore::new(vec![candle(1, 1.0)], 10, true);
        assert!(store.add(candle(1, 1.5)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.items()[0].close, 1.5);
        assert!(!store.add(candle(1, 1.5)));
    }

    #[test]
    fn test_add_evicts_when_full() {
        let mut store = CandleStore::new(Vec::new(), 3, false);
        for ts in 0..5 {
            store.add(candle(ts, ts as f64));
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.items()[0].close, 2.0);
        let closes: Vec<f64> = store.items().iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![2.0, 3.0, 4.0]);
    }
}
