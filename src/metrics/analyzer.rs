use super::MetricsCollector;
use crate::agent::Agent;
use crate::game::{RuleCounts, Strategy, UpdateRule};
use crate::population::Census;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub rule: UpdateRule,
    pub wins: u64,
    pub played: u64,
    /// Share of all rule wins.
    pub win_share: f64,
    /// Wins per round played under this rule.
    pub win_rate: f64,
    pub members_before: u64,
    pub members_after: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub name: String,
    pub agents: usize,
    pub matches: usize,
    pub cooperation_before: f64,
    pub cooperation_after: f64,
    pub cooperative_win_rate: f64,
    pub defective_win_rate: f64,
    pub rules: Vec<RuleSummary>,
    /// Baseline first, then one entry per match.
    pub cooperation_series: Vec<f64>,
    pub membership_series: Vec<RuleCounts>,
}

impl AnalysisReport {
    pub fn dominant_rule(&self) -> Option<&RuleSummary> {
        self.rules
            .iter()
            .filter(|r| r.members_after > 0)
            .max_by_key(|r| r.members_after)
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

pub fn analyze(
    name: &str,
    initial: &[Agent],
    current: &[Agent],
    metrics: &MetricsCollector,
) -> AnalysisReport {
    let before = Census::from_agents(initial);
    let after = Census::from_agents(current);

    let rounds_played: u64 = current.iter().map(Agent::rounds_played).sum();
    let cooperative_wins: u64 = current
        .iter()
        .map(|a| a.strategy_wins().get(Strategy::Cooperate))
        .sum();
    let defective_wins: u64 = current
        .iter()
        .map(|a| a.strategy_wins().get(Strategy::Defect))
        .sum();

    let wins = metrics.rule_wins();
    let played = metrics.rule_played();
    let rules = UpdateRule::ALL
        .into_iter()
        .map(|rule| RuleSummary {
            rule,
            wins: wins.get(rule),
            played: played.get(rule),
            win_share: ratio(wins.get(rule), wins.total()),
            win_rate: ratio(wins.get(rule), played.get(rule)),
            members_before: before.membership.get(rule),
            members_after: after.membership.get(rule),
        })
        .collect();

    AnalysisReport {
        name: name.to_string(),
        agents: current.len(),
        matches: metrics.match_count(),
        cooperation_before: before.cooperation_ratio(),
        cooperation_after: after.cooperation_ratio(),
        cooperative_win_rate: ratio(cooperative_wins, rounds_played),
        defective_win_rate: ratio(defective_wins, rounds_played),
        rules,
        cooperation_series: metrics.cooperation_series(),
        membership_series: metrics.membership_series(),
    }
}
