use super::Strategy;
use crate::error::{GameError, Result};
use serde::{Deserialize, Serialize};

/// Payoff table indexed as `[row strategy][column strategy]`, each cell holding
/// `[row payoff, column payoff]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayoffMatrix([[[f64; 2]; 2]; 2]);

impl PayoffMatrix {
    pub fn new(cells: [[[f64; 2]; 2]; 2]) -> Self {
        Self(cells)
    }

    // Classic T > R > P > S prisoner's dilemma
    pub fn prisoners_dilemma() -> Self {
        Self([[[3.0, 3.0], [0.0, 5.0]], [[5.0, 0.0], [1.0, 1.0]]])
    }

    pub fn payoff_of(&self, row: Strategy, column: Strategy) -> (f64, f64) {
        let [row_payoff, column_payoff] = self.0[row.index()][column.index()];
        (row_payoff, column_payoff)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().flatten().flatten().copied()
    }

    /// Spread between the largest and smallest payoff.
    pub fn d_max(&self) -> f64 {
        let max = self.values().fold(f64::NEG_INFINITY, f64::max);
        let min = self.values().fold(f64::INFINITY, f64::min);
        max - min
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self.values().find(|v| !v.is_finite()) {
            return Err(GameError::InvalidConfig(format!(
                "pay_off contains a non-finite value: {}",
                bad
            )));
        }
        Ok(())
    }
}

impl Default for PayoffMatrix {
    fn default() -> Self {
        Self::prisoners_dilemma()
    }
}
