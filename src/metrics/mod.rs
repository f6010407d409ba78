pub mod logger;
pub mod analyzer;

use crate::game::RuleCounts;
use crate::network::Edge;
use crate::population::{Census, Population};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use parking_lot::RwLock;

/// Population state right after one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub index: usize,
    pub pass: u32,
    pub edge: Edge,
    pub cooperators: usize,
    pub cooperation_ratio: f64,
    /// Cumulative over the whole run.
    pub rule_wins: RuleCounts,
    pub rule_membership: RuleCounts,
}

/// Run-wide accumulators. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    inner: Arc<RwLock<MetricsInner>>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    baseline: Option<Census>,
    rule_wins: RuleCounts,
    rule_played: RuleCounts,
    snapshots: Vec<MatchSnapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsInner::default())),
        }
    }

    pub fn record_baseline(&self, population: &Population) {
        self.inner.write().baseline = Some(population.census());
    }

    /// Folds one match's tallies in and appends a snapshot. The population is
    /// scanned while the write lock is held so snapshot order and content agree.
    pub fn record_match(
        &self,
        pass: u32,
        edge: Edge,
        wins: &RuleCounts,
        played: &RuleCounts,
        population: &Population,
    ) -> MatchSnapshot {
        let mut inner = self.inner.write();
        inner.rule_wins.merge(wins);
        inner.rule_played.merge(played);

        let census = population.census();
        let snapshot = MatchSnapshot {
            index: inner.snapshots.len(),
            pass,
            edge,
            cooperators: census.cooperators,
            cooperation_ratio: census.cooperation_ratio(),
            rule_wins: inner.rule_wins,
            rule_membership: census.membership,
        };
        inner.snapshots.push(snapshot.clone());
        snapshot
    }

    pub fn baseline(&self) -> Option<Census> {
        self.inner.read().baseline
    }

    pub fn rule_wins(&self) -> RuleCounts {
        self.inner.read().rule_wins
    }

    pub fn rule_played(&self) -> RuleCounts {
        self.inner.read().rule_played
    }

    pub fn match_count(&self) -> usize {
        self.inner.read().snapshots.len()
    }

    pub fn get_snapshots(&self) -> Vec<MatchSnapshot> {
        self.inner.read().snapshots.clone()
    }

    /// Cooperation ratio over time, baseline first when one was recorded.
    pub fn cooperation_series(&self) -> Vec<f64> {
        let inner = self.inner.read();
        inner
            .baseline
            .iter()
            .map(Census::cooperation_ratio)
            .chain(inner.snapshots.iter().map(|s| s.cooperation_ratio))
            .collect()
    }

    pub fn membership_series(&self) -> Vec<RuleCounts> {
        let inner = self.inner.read();
        inner
            .baseline
            .iter()
            .map(|census| census.membership)
            .chain(inner.snapshots.iter().map(|s| s.rule_membership))
            .collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::game::{Strategy, UpdateRule};

    fn population() -> Population {
        Population::from_agents(vec![
            Agent::new(0, Strategy::Cooperate, UpdateRule::Adapt),
            Agent::new(1, Strategy::Defect, UpdateRule::Random),
            Agent::new(2, Strategy::Defect, UpdateRule::Adapt),
            Agent::new(3, Strategy::Cooperate, UpdateRule::TitForTat),
        ])
        .unwrap()
    }

    #[test]
    fn snapshots_accumulate_in_order() {
        let metrics = MetricsCollector::new();
        let population = population();
        metrics.record_baseline(&population);

        let mut wins = RuleCounts::new();
        wins.add(UpdateRule::Adapt, 3);
        let mut played = RuleCounts::new();
        played.add(UpdateRule::Adapt, 3);
        played.add(UpdateRule::Random, 3);

        let first = metrics.record_match(0, (0, 1), &wins, &played, &population);
        population.lock_set(&[1]).unwrap().get_mut(&1).unwrap().strategy = Strategy::Cooperate;
        let second = metrics.record_match(0, (1, 2), &wins, &played, &population);

        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);
        assert_eq!(first.rule_wins[UpdateRule::Adapt], 3);
        assert_eq!(second.rule_wins[UpdateRule::Adapt], 6);
        assert_eq!(metrics.rule_played()[UpdateRule::Random], 6);
        assert_eq!(second.rule_membership[UpdateRule::Adapt], 2);

        assert_eq!(metrics.cooperation_series(), vec![0.5, 0.5, 0.75]);
        assert_eq!(metrics.membership_series().len(), 3);
        assert_eq!(metrics.match_count(), 2);
        assert_eq!(metrics.get_snapshots()[1], second);
    }

    #[test]
    fn clones_share_state() {
        let metrics = MetricsCollector::new();
        let shared = metrics.clone();
        shared.record_match(0, (0, 1), &RuleCounts::new(), &RuleCounts::new(), &population());
        assert_eq!(metrics.match_count(), 1);
        assert!(metrics.baseline().is_none());
        assert_eq!(metrics.cooperation_series(), vec![0.5]);
    }
}
