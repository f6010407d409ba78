use super::MatchSnapshot;
use crate::agent::{Agent, AgentId};
use crate::game::{Strategy, UpdateRule};
use anyhow::Result;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

// csv can't serialize the nested counters, so every rule gets its own column
#[derive(Debug, Serialize)]
struct SnapshotRow {
    index: usize,
    pass: u32,
    row: AgentId,
    column: AgentId,
    cooperators: usize,
    cooperation_ratio: f64,
    defection_ratio: f64,
    wins_random: u64,
    wins_adapt: u64,
    wins_tit_for_tat: u64,
    wins_replicator_dynamics: u64,
    wins_best_takes_over: u64,
    wins_logit_replicator_dynamics: u64,
    members_random: u64,
    members_adapt: u64,
    members_tit_for_tat: u64,
    members_replicator_dynamics: u64,
    members_best_takes_over: u64,
    members_logit_replicator_dynamics: u64,
}

impl From<&MatchSnapshot> for SnapshotRow {
    fn from(s: &MatchSnapshot) -> Self {
        let w = |rule| s.rule_wins.get(rule);
        let m = |rule| s.rule_membership.get(rule);
        Self {
            index: s.index,
            pass: s.pass,
            row: s.edge.0,
            column: s.edge.1,
            cooperators: s.cooperators,
            cooperation_ratio: s.cooperation_ratio,
            defection_ratio: 1.0 - s.cooperation_ratio,
            wins_random: w(UpdateRule::Random),
            wins_adapt: w(UpdateRule::Adapt),
            wins_tit_for_tat: w(UpdateRule::TitForTat),
            wins_replicator_dynamics: w(UpdateRule::ReplicatorDynamics),
            wins_best_takes_over: w(UpdateRule::BestTakesOver),
            wins_logit_replicator_dynamics: w(UpdateRule::LogitReplicatorDynamics),
            members_random: m(UpdateRule::Random),
            members_adapt: m(UpdateRule::Adapt),
            members_tit_for_tat: m(UpdateRule::TitForTat),
            members_replicator_dynamics: m(UpdateRule::ReplicatorDynamics),
            members_best_takes_over: m(UpdateRule::BestTakesOver),
            members_logit_replicator_dynamics: m(UpdateRule::LogitReplicatorDynamics),
        }
    }
}

pub struct MetricsLogger {
    writer: Writer<File>,
}

impl MetricsLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log_batch(&mut self, snapshots: &[MatchSnapshot]) -> Result<()> {
        for snapshot in snapshots {
            self.writer.serialize(SnapshotRow::from(snapshot))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct AgentRow {
    id: AgentId,
    strategy_before: Strategy,
    strategy_after: Strategy,
    rule_before: UpdateRule,
    rule_after: UpdateRule,
    rounds_played: u64,
    rounds_won: u64,
    cooperative_wins: u64,
    defective_wins: u64,
    payoff_sum: f64,
    average_payoff: Option<f64>,
}

/// One row per agent comparing the initial copy with the final state.
/// Both slices are expected in id order.
pub fn write_agents(path: impl AsRef<Path>, before: &[Agent], after: &[Agent]) -> Result<()> {
    if before.len() != after.len() {
        anyhow::bail!(
            "before/after populations differ in size: {} vs {}",
            before.len(),
            after.len()
        );
    }

    let mut writer = Writer::from_path(path)?;
    for (old, new) in before.iter().zip(after) {
        let wins = new.strategy_wins();
        writer.serialize(AgentRow {
            id: new.id(),
            strategy_before: old.strategy(),
            strategy_after: new.strategy(),
            rule_before: old.update_rule(),
            rule_after: new.update_rule(),
            rounds_played: new.rounds_played(),
            rounds_won: new.rounds_won(),
            cooperative_wins: wins.get(Strategy::Cooperate),
            defective_wins: wins.get(Strategy::Defect),
            payoff_sum: new.payoff_sum(),
            average_payoff: new.average_payoff(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::RuleCounts;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("coopnet_{}_{}", std::process::id(), name))
    }

    #[test]
    fn snapshot_rows_have_one_column_per_rule() {
        let path = temp_path("matches.csv");
        let mut wins = RuleCounts::new();
        wins.add(UpdateRule::TitForTat, 7);
        let snapshot = MatchSnapshot {
            index: 0,
            pass: 0,
            edge: (2, 5),
            cooperators: 3,
            cooperation_ratio: 0.75,
            rule_wins: wins,
            rule_membership: RuleCounts::new(),
        };

        let mut logger = MetricsLogger::new(&path).unwrap();
        logger.log_batch(std::slice::from_ref(&snapshot)).unwrap();
        drop(logger);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("index,pass,row,column,cooperators,cooperation_ratio"));
        assert!(header.contains("members_logit_replicator_dynamics"));
        assert_eq!(lines.next().unwrap(), "0,0,2,5,3,0.75,0.25,0,0,7,0,0,0,0,0,0,0,0,0");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn agent_rows_compare_before_and_after() {
        let path = temp_path("agents.csv");
        let before = vec![Agent::new(0, Strategy::Cooperate, UpdateRule::Adapt)];
        let mut after = before.clone();
        after[0].strategy = Strategy::Defect;

        write_agents(&path, &before, &after).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.lines().nth(1).unwrap().starts_with("0,cooperate,defect,adapt,adapt,0,0"));
        std::fs::remove_file(&path).unwrap();

        assert!(write_agents(&path, &before, &[]).is_err());
    }
}
