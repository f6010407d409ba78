use super::PayoffMatrix;
use crate::agent::Agent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Row,
    Column,
    Tie,
}

impl Winner {
    pub fn of(row_payoff: f64, column_payoff: f64) -> Self {
        if row_payoff > column_payoff {
            Winner::Row
        } else if column_payoff > row_payoff {
            Winner::Column
        } else {
            Winner::Tie
        }
    }
}

/// Plays one round and books it on both agents.
///
/// Only a strictly higher payoff counts as a won round, a tie is won by nobody.
/// The match level outcome handed to the update rules treats ties the other way
/// round (both sides win), the two feed different counters.
pub fn play_round(matrix: &PayoffMatrix, row: &mut Agent, column: &mut Agent) -> (f64, f64) {
    let (row_payoff, column_payoff) = matrix.payoff_of(row.strategy, column.strategy);

    row.record_round(row_payoff);
    column.record_round(column_payoff);

    match Winner::of(row_payoff, column_payoff) {
        Winner::Row => row.record_win(),
        Winner::Column => column.record_win(),
        Winner::Tie => {}
    }

    (row_payoff, column_payoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Strategy, UpdateRule};
    use proptest::prelude::{prop_assert, prop_assert_eq, prop_oneof, proptest, Just};

    fn pair(a: Strategy, b: Strategy) -> (Agent, Agent) {
        (
            Agent::new(0, a, UpdateRule::Adapt),
            Agent::new(1, b, UpdateRule::Adapt),
        )
    }

    #[test]
    fn mutual_cooperation_is_a_tie() {
        let matrix = PayoffMatrix::prisoners_dilemma();
        let (mut a, mut b) = pair(Strategy::Cooperate, Strategy::Cooperate);

        assert_eq!(play_round(&matrix, &mut a, &mut b), (3.0, 3.0));
        assert_eq!(a.rounds_won(), 0);
        assert_eq!(b.rounds_won(), 0);
        assert_eq!(a.rounds_played(), 1);
        assert_eq!(b.rounds_played(), 1);
        assert_eq!(a.payoff_sum(), 3.0);
    }

    #[test]
    fn defector_beats_cooperator() {
        let matrix = PayoffMatrix::prisoners_dilemma();
        let (mut a, mut b) = pair(Strategy::Cooperate, Strategy::Defect);

        let (pa, pb) = play_round(&matrix, &mut a, &mut b);
        assert!(pb > pa);

        assert_eq!(b.rounds_won(), 1);
        assert_eq!(b.strategy_wins().get(Strategy::Defect), 1);
        assert_eq!(b.strategy_wins().get(Strategy::Cooperate), 0);

        assert_eq!(a.rounds_won(), 0);
        assert_eq!(a.strategy_wins().total(), 0);
        assert_eq!(a.rounds_played(), 1);
    }

    fn strategy() -> impl proptest::strategy::Strategy<Value = Strategy> {
        prop_oneof![Just(Strategy::Cooperate), Just(Strategy::Defect)]
    }

    proptest! {
        #[test]
        fn win_split_matches_rounds_won(moves in proptest::collection::vec((strategy(), strategy()), 1..64)) {
            let matrix = PayoffMatrix::prisoners_dilemma();
            let (mut a, mut b) = pair(Strategy::Cooperate, Strategy::Cooperate);
            let mut expected_sum = 0.0;

            for (sa, sb) in moves.iter().copied() {
                a.strategy = sa;
                b.strategy = sb;
                let (pa, _) = play_round(&matrix, &mut a, &mut b);
                expected_sum += pa;

                for agent in [&a, &b] {
                    let wins = agent.strategy_wins();
                    prop_assert_eq!(
                        wins.get(Strategy::Cooperate) + wins.get(Strategy::Defect),
                        agent.rounds_won()
                    );
                }
            }

            prop_assert_eq!(a.rounds_played(), moves.len() as u64);
            prop_assert_eq!(b.rounds_played(), moves.len() as u64);
            prop_assert_eq!(a.payoff_sum(), expected_sum);
            prop_assert!(a.rounds_won() + b.rounds_won() <= moves.len() as u64);
        }
    }
}
