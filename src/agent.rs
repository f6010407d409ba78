use crate::game::{Adoption, Strategy, Transition, UpdateRule};
use serde::{Deserialize, Serialize};

pub type AgentId = u32;

/// Rounds won, split by the strategy that was played when winning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyWins([u64; 2]);

impl StrategyWins {
    pub fn get(&self, strategy: Strategy) -> u64 {
        self.0[strategy.index()]
    }

    pub fn total(&self) -> u64 {
        self.0[0] + self.0[1]
    }

    fn record(&mut self, strategy: Strategy) {
        self.0[strategy.index()] += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) strategy: Strategy,
    pub(crate) update_rule: UpdateRule,
    pub(crate) rounds_played: u64,
    pub(crate) rounds_won: u64,
    pub(crate) payoff_sum: f64,
    pub(crate) strategy_wins: StrategyWins,
}

/// Copy of the fields the update rules read from other agents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub strategy: Strategy,
    pub update_rule: UpdateRule,
    pub rounds_played: u64,
    pub payoff_sum: f64,
}

impl AgentView {
    pub fn average_payoff(&self) -> Option<f64> {
        average(self.payoff_sum, self.rounds_played)
    }
}

fn average(sum: f64, rounds: u64) -> Option<f64> {
    if rounds == 0 {
        None
    } else {
        Some(sum / rounds as f64)
    }
}

impl Agent {
    pub fn new(id: AgentId, strategy: Strategy, update_rule: UpdateRule) -> Self {
        Self {
            id,
            strategy,
            update_rule,
            rounds_played: 0,
            rounds_won: 0,
            payoff_sum: 0.0,
            strategy_wins: StrategyWins::default(),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn update_rule(&self) -> UpdateRule {
        self.update_rule
    }

    pub fn rounds_played(&self) -> u64 {
        self.rounds_played
    }

    pub fn rounds_won(&self) -> u64 {
        self.rounds_won
    }

    pub fn payoff_sum(&self) -> f64 {
        self.payoff_sum
    }

    pub fn strategy_wins(&self) -> StrategyWins {
        self.strategy_wins
    }

    /// `None` until the agent has played at least one round.
    pub fn average_payoff(&self) -> Option<f64> {
        average(self.payoff_sum, self.rounds_played)
    }

    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id,
            strategy: self.strategy,
            update_rule: self.update_rule,
            rounds_played: self.rounds_played,
            payoff_sum: self.payoff_sum,
        }
    }

    pub(crate) fn record_round(&mut self, payoff: f64) {
        self.payoff_sum += payoff;
        self.rounds_played += 1;
    }

    pub(crate) fn record_win(&mut self) {
        self.rounds_won += 1;
        self.strategy_wins.record(self.strategy);
    }

    /// Applies a decided transition and returns whether the strategy changed.
    /// The update rule is only replaced when `allow_rule_change` is set.
    pub fn apply(&mut self, transition: Transition, allow_rule_change: bool) -> bool {
        let changed = self.strategy != transition.strategy;
        self.strategy = transition.strategy;

        if allow_rule_change {
            match transition.adoption {
                Adoption::Always(rule) => self.update_rule = rule,
                Adoption::IfChanged(rule) if changed => self.update_rule = rule,
                Adoption::IfChanged(_) => {}
            }
        }

        changed
    }
}
