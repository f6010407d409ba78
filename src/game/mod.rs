pub mod payoff;
pub mod round;
pub mod rules;

pub use payoff::PayoffMatrix;
pub use round::{play_round, Winner};
pub use rules::{Adoption, Neighborhood, RuleInput, Transition, UpdateParams};

use crate::error::GameError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Cooperate = 0,
    Defect = 1,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Cooperate, Strategy::Defect];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_cooperative(self) -> bool {
        self == Strategy::Cooperate
    }

    // Single letter form used by strategy table files
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Cooperate => "C",
            Strategy::Defect => "D",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Cooperate => write!(f, "cooperate"),
            Strategy::Defect => write!(f, "defect"),
        }
    }
}

/// How an agent revises its strategy after a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRule {
    Random = 0,
    Adapt = 1,
    TitForTat = 2,
    ReplicatorDynamics = 3,
    BestTakesOver = 4,
    LogitReplicatorDynamics = 5,
}

impl UpdateRule {
    pub const COUNT: usize = 6;

    pub const ALL: [UpdateRule; UpdateRule::COUNT] = [
        UpdateRule::Random,
        UpdateRule::Adapt,
        UpdateRule::TitForTat,
        UpdateRule::ReplicatorDynamics,
        UpdateRule::BestTakesOver,
        UpdateRule::LogitReplicatorDynamics,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Uniform draw over all six rules.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::COUNT)]
    }

    pub fn name(self) -> &'static str {
        match self {
            UpdateRule::Random => "random",
            UpdateRule::Adapt => "adapt",
            UpdateRule::TitForTat => "tit-for-tat",
            UpdateRule::ReplicatorDynamics => "replicator-dynamics",
            UpdateRule::BestTakesOver => "best-takes-over",
            UpdateRule::LogitReplicatorDynamics => "logit-replicator-dynamics",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            UpdateRule::Random => "Random",
            UpdateRule::Adapt => "Adapt",
            UpdateRule::TitForTat => "Tit for tat",
            UpdateRule::ReplicatorDynamics => "Replicator dynamics",
            UpdateRule::BestTakesOver => "Best takes over",
            UpdateRule::LogitReplicatorDynamics => "Logit replicator dynamics",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            UpdateRule::Random => "on a loss, redraw the strategy from the cooperation probability",
            UpdateRule::Adapt => "on a loss, copy the opponent",
            UpdateRule::TitForTat => "always copy the opponent",
            UpdateRule::ReplicatorDynamics => "copy a fitter opponent with probability scaled by d_max",
            UpdateRule::BestTakesOver => "on a loss, copy the richest neighbour",
            UpdateRule::LogitReplicatorDynamics => "copy a random neighbour with logistic probability",
        }
    }
}

impl fmt::Display for UpdateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpdateRule {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|rule| rule.name() == normalized)
            .ok_or_else(|| GameError::UnknownRule(s.to_string()))
    }
}

/// One counter per update rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCounts([u64; UpdateRule::COUNT]);

impl RuleCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rule: UpdateRule) -> u64 {
        self.0[rule.index()]
    }

    pub fn add(&mut self, rule: UpdateRule, amount: u64) {
        self.0[rule.index()] += amount;
    }

    pub fn incr(&mut self, rule: UpdateRule) {
        self.add(rule, 1);
    }

    pub fn merge(&mut self, other: &RuleCounts) {
        for rule in UpdateRule::ALL {
            self.add(rule, other.get(rule));
        }
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UpdateRule, u64)> + '_ {
        UpdateRule::ALL.into_iter().map(move |rule| (rule, self.get(rule)))
    }
}

impl Index<UpdateRule> for RuleCounts {
    type Output = u64;

    fn index(&self, rule: UpdateRule) -> &u64 {
        &self.0[rule.index()]
    }
}
