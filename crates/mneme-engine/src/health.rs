//! Health report: per-subsystem checks over a point-in-time snapshot.

use serde::{Deserialize, Serialize};

use mneme_core::constants::SCHEMA_VERSION;
use mneme_core::errors::MnemeResult;
use mneme_core::models::{QValueDistribution, TierCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

impl SubsystemHealth {
    fn healthy(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    fn with(name: &str, status: HealthStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(message),
        }
    }
}

/// Counts gathered from every subsystem at report time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub schema_version: u32,
    pub entries: usize,
    pub relations: usize,
    pub expired_relations: usize,
    pub templates: usize,
    pub prune_candidates: usize,
    pub vector_mappings: usize,
    pub indexed_vectors: usize,
    pub tiers: TierCounts,
    pub q_values: QValueDistribution,
    pub memrl_queries: usize,
    pub disagreements: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub subsystems: Vec<SubsystemHealth>,
    pub metrics: HealthSnapshot,
}

impl HealthReport {
    pub fn build(snapshot: HealthSnapshot) -> Self {
        let subsystems = vec![
            check_storage(&snapshot),
            check_vector_index(&snapshot),
            check_causal(&snapshot),
            check_patterns(&snapshot),
            check_memrl(&snapshot),
        ];
        Self {
            overall_status: worst(&subsystems),
            subsystems,
            metrics: snapshot,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall_status == HealthStatus::Healthy
    }

    pub fn subsystem(&self, name: &str) -> Option<&SubsystemHealth> {
        self.subsystems.iter().find(|s| s.name == name)
    }

    pub fn to_json(&self) -> MnemeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Unhealthy if any subsystem is, else degraded if any is, else healthy.
fn worst(subsystems: &[SubsystemHealth]) -> HealthStatus {
    let mut worst = HealthStatus::Healthy;
    for s in subsystems {
        match s.status {
            HealthStatus::Unhealthy => return HealthStatus::Unhealthy,
            HealthStatus::Degraded => worst = HealthStatus::Degraded,
            HealthStatus::Healthy => {}
        }
    }
    worst
}

fn check_storage(s: &HealthSnapshot) -> SubsystemHealth {
    if s.schema_version != SCHEMA_VERSION {
        return SubsystemHealth::with(
            "storage",
            HealthStatus::Unhealthy,
            format!("schema version {} (expected {SCHEMA_VERSION})", s.schema_version),
        );
    }
    SubsystemHealth::healthy("storage")
}

/// The index must hold one vector per mapping; a gap means a reindex is due.
fn check_vector_index(s: &HealthSnapshot) -> SubsystemHealth {
    if s.indexed_vectors != s.vector_mappings {
        return SubsystemHealth::with(
            "vector_index",
            HealthStatus::Degraded,
            format!(
                "{} vectors indexed for {} mapped entries",
                s.indexed_vectors, s.vector_mappings
            ),
        );
    }
    SubsystemHealth::healthy("vector_index")
}

fn check_causal(s: &HealthSnapshot) -> SubsystemHealth {
    if s.expired_relations > 0 {
        return SubsystemHealth::with(
            "causal",
            HealthStatus::Degraded,
            format!("{} expired relations awaiting cleanup", s.expired_relations),
        );
    }
    SubsystemHealth::healthy("causal")
}

fn check_patterns(s: &HealthSnapshot) -> SubsystemHealth {
    if s.prune_candidates > 0 {
        return SubsystemHealth::with(
            "patterns",
            HealthStatus::Degraded,
            format!("{} templates eligible for pruning", s.prune_candidates),
        );
    }
    SubsystemHealth::healthy("patterns")
}

/// Degraded when most entries have sunk into the low Q band.
fn check_memrl(s: &HealthSnapshot) -> SubsystemHealth {
    let total = s.q_values.total();
    if total > 0 && s.q_values.low * 2 > total {
        return SubsystemHealth::with(
            "memrl",
            HealthStatus::Degraded,
            format!("{} of {total} entries have a low Q-value", s.q_values.low),
        );
    }
    SubsystemHealth::healthy("memrl")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean() -> HealthSnapshot {
        HealthSnapshot {
            schema_version: SCHEMA_VERSION,
            entries: 3,
            vector_mappings: 3,
            indexed_vectors: 3,
            ..Default::default()
        }
    }

    #[test]
    fn clean_snapshot_is_healthy() {
        let report = HealthReport::build(clean());
        assert!(report.is_healthy());
        assert_eq!(report.subsystems.len(), 5);
    }

    #[test]
    fn index_gap_degrades() {
        let report = HealthReport::build(HealthSnapshot {
            indexed_vectors: 1,
            ..clean()
        });
        assert_eq!(report.overall_status, HealthStatus::Degraded);
        assert_eq!(
            report.subsystem("vector_index").map(|s| s.status),
            Some(HealthStatus::Degraded)
        );
    }

    #[test]
    fn schema_mismatch_is_unhealthy_over_degraded() {
        let report = HealthReport::build(HealthSnapshot {
            schema_version: 1,
            expired_relations: 4,
            ..clean()
        });
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
    }

    #[test]
    fn serializes_lowercase_status() {
        let json = HealthReport::build(clean()).to_json().unwrap();
        assert!(json.contains("\"overall_status\": \"healthy\""));
    }
}
