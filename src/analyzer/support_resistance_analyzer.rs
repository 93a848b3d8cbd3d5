use crate::analyzer::swing_analyzer::{SwingKind, SwingPoint};
use crate::config::ZoneConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 구간 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    Support,
    Resistance,
}

/// 구간 조회 필터
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneFilter {
    Support,
    Resistance,
    Any,
}

impl ZoneFilter {
    fn matches(&self, kind: ZoneKind) -> bool {
        match self {
            ZoneFilter::Support => kind == ZoneKind::Support,
            ZoneFilter::Resistance => kind == ZoneKind::Resistance,
            ZoneFilter::Any => true,
        }
    }
}

/// 지지/저항 구간
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// 구성 스윙 가격의 평균
    pub level: f64,
    /// 구성 스윙 가격의 최대값
    pub top: f64,
    /// 구성 스윙 가격의 최소값
    pub bottom: f64,
    pub kind: ZoneKind,
    /// 구성 스윙 수 (터치 수)
    pub strength: usize,
    /// 거부 캔들 스윙 포함 여부
    pub has_rejection: bool,
    /// 현재 가격과의 거리
    pub distance: f64,
}

impl Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Zone({:?} {:.4} [{:.4}, {:.4}] x{}{})",
            self.kind,
            self.level,
            self.bottom,
            self.top,
            self.strength,
            if self.has_rejection { " R" } else { "" }
        )
    }
}

impl Zone {
    /// 가격이 구간 [bottom, top] 안에 있는지 확인
    pub fn contains(&self, price: f64) -> bool {
        price >= self.bottom && price <= self.top
    }
}

/// 지지/저항 구간 분석기
///
/// 스윙 가격을 정렬한 뒤, 클러스터 첫 멤버 대비 `bin_width` 상대 거리 안의 가격을 차례로 묶습니다.
#[derive(Debug, Clone)]
pub struct SupportResistanceAnalyzer {
    config: ZoneConfig,
}

impl Default for SupportResistanceAnalyzer {
    fn default() -> Self {
        SupportResistanceAnalyzer::new(ZoneConfig::default())
    }
}

impl SupportResistanceAnalyzer {
    /// 새 지지/저항 분석기 생성
    pub fn new(config: ZoneConfig) -> Self {
        SupportResistanceAnalyzer { config }
    }

    /// 가격이 클러스터 첫 멤버의 허용 범위 안인지 확인
    fn within_bin(&self, first: f64, price: f64) -> bool {
        (price - first).abs() <= self.config.bin_width * first.abs()
    }

    /// 클러스터를 구간으로 변환
    fn build_zone(&self, members: &[SwingPoint], current_price: f64) -> Zone {
        let count = members.len();
        let level = members.iter().map(|s| s.price).sum::<f64>() / count as f64;
        let top = members
            .iter()
            .map(|s| s.price)
            .fold(f64::NEG_INFINITY, f64::max);
        let bottom = members.iter().map(|s| s.price).fold(f64::INFINITY, f64::min);
        let highs = members.iter().filter(|s| s.kind == SwingKind::High).count();
        let lows = count - highs;

        let kind = if highs > lows {
            ZoneKind::Resistance
        } else if lows > highs {
            ZoneKind::Support
        } else if level > current_price {
            ZoneKind::Resistance
        } else {
            ZoneKind::Support
        };

        Zone {
            level,
            top,
            bottom,
            kind,
            strength: count,
            has_rejection: members.iter().any(|s| s.is_rejection),
            distance: (current_price - level).abs(),
        }
    }

    /// 스윙 포인트를 구간으로 묶습니다.
    ///
    /// 터치 수가 `min_touches` 미만인 클러스터는 거부 캔들을 포함할 때만 남깁니다.
    /// 결과는 (거부 여부, 강도) 내림차순으로 상위 `max_zones`개를 고른 뒤 현재 가격과의 거리 오름차순으로 정렬됩니다.
    ///
    /// # Arguments
    /// * `swings` - 스윙 포인트
    /// * `current_price` - 현재 가격 (타입 동률 판정과 거리 정렬에 사용)
    ///
    /// # Returns
    /// * `Vec<Zone>` - 거리 오름차순 구간
    pub fn analyze(&self, swings: &[SwingPoint], current_price: f64) -> Vec<Zone> {
        if swings.is_empty() {
            return Vec::new();
        }

        let mut sorted = swings.to_vec();
        sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

        let mut clusters: Vec<Vec<SwingPoint>> = Vec::new();
        let mut current: Vec<SwingPoint> = Vec::new();
        for swing in sorted {
            match current.first() {
                Some(first) if self.within_bin(first.price, swing.price) => current.push(swing),
                Some(_) => {
                    clusters.push(std::mem::take(&mut current));
                    current.push(swing);
                }
                None => current.push(swing),
            }
        }
        if !current.is_empty() {
            clusters.push(current);
        }

        let mut zones: Vec<Zone> = clusters
            .iter()
            .filter(|members| {
                members.len() >= self.config.min_touches || members.iter().any(|s| s.is_rejection)
            })
            .map(|members| self.build_zone(members, current_price))
            .collect();

        zones.sort_by(|a, b| {
            (b.has_rejection, b.strength).cmp(&(a.has_rejection, a.strength))
        });
        zones.truncate(self.config.max_zones);
        zones.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        debug!(
            "지지/저항 구간 {}개 (클러스터 {}개, 스윙 {}개)",
            zones.len(),
            clusters.len(),
            swings.len()
        );
        zones
    }

    /// 거리순 구간 목록에서 조건에 맞는 첫 구간
    ///
    /// # Arguments
    /// * `zones` - `analyze`가 반환한 거리 오름차순 구간
    /// * `filter` - 구간 타입 필터
    pub fn nearest_zone(zones: &[Zone], filter: ZoneFilter) -> Option<&Zone> {
        zones.iter().find(|zone| filter.matches(zone.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swing(index: usize, price: f64, kind: SwingKind, is_rejection: bool) -> SwingPoint {
        SwingPoint {
            index,
            price,
            kind,
            is_rejection,
        }
    }

    fn analyzer(min_touches: usize) -> SupportResistanceAnalyzer {
        SupportResistanceAnalyzer::new(ZoneConfig {
            bin_width: 0.01,
            min_touches,
            max_zones: 5,
        })
    }

    #[test]
    fn test_clusters_close_prices() {
        let swings = vec![
            swing(1, 100.0, SwingKind::High, false),
            swing(5, 100.5, SwingKind::High, false),
            swing(9, 100.8, SwingKind::Low, false),
            swing(12, 110.0, SwingKind::Low, false),
        ];
        let zones = analyzer(2).analyze(&swings, 105.0);
        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert_eq!(zone.strength, 3);
        assert_eq!(zone.kind, ZoneKind::Resistance);
        assert_eq!(zone.bottom, 100.0);
        assert_eq!(zone.top, 100.8);
        assert!((zone.level - 100.433_333_333).abs() < 1e-6);
        assert!((zone.distance - (105.0 - zone.level)).abs() < 1e-12);
    }

    #[test]
    fn test_single_rejection_cluster_survives() {
        let swings = vec![
            swing(1, 50.0, SwingKind::Low, true),
            swing(4, 80.0, SwingKind::High, false),
        ];
        let zones = analyzer(3).analyze(&swings, 60.0);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].strength, 1);
        assert!(zones[0].has_rejection);
        assert_eq!(zones[0].kind, ZoneKind::Support);
    }

    #[test]
    fn test_tie_resolved_by_current_price() {
        let swings = vec![
            swing(1, 100.0, SwingKind::High, false),
            swing(3, 100.2, SwingKind::Low, false),
        ];
        let above = analyzer(2).analyze(&swings, 90.0);
        assert_eq!(above[0].kind, ZoneKind::Resistance);
        let below = analyzer(2).analyze(&swings, 110.0);
        assert_eq!(below[0].kind, ZoneKind::Support);
    }

    #[test]
    fn test_ranked_then_sorted_by_distance() {
        let mut swings = Vec::new();
        // 강도 2 구간 6개 (10, 20, ..., 60)
        for (k, base) in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0].iter().enumerate() {
            swings.push(swing(k * 2, *base, SwingKind::Low, false));
            swings.push(swing(k * 2 + 1, *base, SwingKind::Low, false));
        }
        // 강도 3 구간 하나
        for i in 0..3 {
            swings.push(swing(20 + i, 5.0, SwingKind::Low, false));
        }
        let zones = analyzer(2).analyze(&swings, 58.0);
        assert_eq!(zones.len(), 5);
        assert!(zones.iter().any(|z| z.level == 5.0));
        assert!(zones.windows(2).all(|w| w[0].distance <= w[1].distance));
        // 동률 강도는 가격 순서가 유지되므로 50, 60 구간이 잘림
        assert!(zones.iter().all(|z| z.level < 50.0));
        assert_eq!(zones[0].level, 40.0);
    }

    #[test]
    fn test_nearest_zone_filters_by_kind() {
        let swings = vec![
            swing(1, 100.0, SwingKind::High, false),
            swing(2, 100.1, SwingKind::High, false),
            swing(3, 90.0, SwingKind::Low, false),
            swing(4, 90.1, SwingKind::Low, false),
        ];
        let zones = analyzer(2).analyze(&swings, 99.0);
        let support = SupportResistanceAnalyzer::nearest_zone(&zones, ZoneFilter::Support).unwrap();
        assert_eq!(support.kind, ZoneKind::Support);
        let any = SupportResistanceAnalyzer::nearest_zone(&zones, ZoneFilter::Any).unwrap();
        assert_eq!(any.kind, ZoneKind::Resistance);
        assert!(SupportResistanceAnalyzer::nearest_zone(&[], ZoneFilter::Any).is_none());
    }
}
