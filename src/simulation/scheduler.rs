use crate::agent::{Agent, AgentId, AgentView};
use crate::error::{GameError, Result};
use crate::game::rules;
use crate::game::{play_round, Neighborhood, PayoffMatrix, RuleCounts, UpdateParams, Winner};
use crate::metrics::{MatchSnapshot, MetricsCollector};
use crate::network::{Edge, Network};
use crate::population::Population;
use parking_lot::MutexGuard;
use rand::RngCore;
use std::collections::BTreeMap;
use tracing::debug;

/// Everything a match needs, shared by all workers for one run.
pub struct MatchContext<'a> {
    pub payoff: &'a PayoffMatrix,
    pub params: UpdateParams,
    pub rounds: u32,
    pub network: &'a Network,
    pub population: &'a Population,
    pub metrics: &'a MetricsCollector,
}

/// Result of the repeated rounds on one edge, before any update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockTally {
    pub row_payoff: f64,
    pub column_payoff: f64,
    pub rule_wins: RuleCounts,
    pub rule_played: RuleCounts,
}

impl BlockTally {
    /// Match level outcome, a tie is a win for both sides.
    pub fn outcome(&self) -> (bool, bool) {
        (
            self.row_payoff >= self.column_payoff,
            self.column_payoff >= self.row_payoff,
        )
    }
}

pub fn play_block(matrix: &PayoffMatrix, rounds: u32, row: &mut Agent, column: &mut Agent) -> BlockTally {
    let mut tally = BlockTally::default();

    for _ in 0..rounds {
        let (row_payoff, column_payoff) = play_round(matrix, row, column);
        tally.row_payoff += row_payoff;
        tally.column_payoff += column_payoff;

        // Rule tallies count a tied round for both rules
        match Winner::of(row_payoff, column_payoff) {
            Winner::Row => tally.rule_wins.incr(row.update_rule),
            Winner::Column => tally.rule_wins.incr(column.update_rule),
            Winner::Tie => {
                tally.rule_wins.incr(row.update_rule);
                tally.rule_wins.incr(column.update_rule);
            }
        }
    }

    tally.rule_played.add(row.update_rule, rounds as u64);
    tally.rule_played.add(column.update_rule, rounds as u64);
    tally
}

/// Every agent a match can touch: both players and their neighbourhoods.
/// Held from the first round until both updates are applied.
struct LockedAgents<'a> {
    network: &'a Network,
    guards: BTreeMap<AgentId, MutexGuard<'a, Agent>>,
}

impl<'a> LockedAgents<'a> {
    fn take(&mut self, id: AgentId) -> Result<MutexGuard<'a, Agent>> {
        self.guards.remove(&id).ok_or(GameError::AgentNotFound(id))
    }
}

impl Neighborhood for LockedAgents<'_> {
    fn neighbors(&self, id: AgentId) -> &[AgentId] {
        self.network.neighbors(id)
    }

    fn view(&self, id: AgentId) -> Result<AgentView> {
        self.guards
            .get(&id)
            .map(|agent| agent.view())
            .ok_or(GameError::AgentNotFound(id))
    }
}

// `agent` is taken out of `locked` so the rule can borrow the rest of it
fn update_side(
    ctx: &MatchContext<'_>,
    locked: &LockedAgents<'_>,
    agent: &mut Agent,
    opponent_id: AgentId,
    won_round: bool,
    rng: &mut dyn RngCore,
) -> Result<()> {
    let opponent = locked.view(opponent_id)?;
    let before = (agent.strategy, agent.update_rule);

    if rules::update(agent, &opponent, won_round, &ctx.params, locked, rng)? {
        debug!(
            "Agent {} ({}) switched {} -> {}, now {}",
            agent.id, before.1, before.0, agent.strategy, agent.update_rule
        );
    }

    Ok(())
}

/// Plays one edge: the repeated rounds, then one update per side (row first,
/// the column side sees the row's new state), then a population wide
/// snapshot. Both players and all their neighbours stay locked, in ascending
/// id order, until the updates are done, so a match never interleaves with
/// another one touching the same agents.
pub fn run_match<R: RngCore>(
    ctx: &MatchContext<'_>,
    pass: u32,
    edge: Edge,
    rng: &mut R,
) -> Result<MatchSnapshot> {
    let (row_id, column_id) = edge;
    if row_id == column_id {
        return Err(GameError::SelfMatch(row_id));
    }

    let mut ids = vec![row_id, column_id];
    ids.extend_from_slice(ctx.network.neighbors(row_id));
    ids.extend_from_slice(ctx.network.neighbors(column_id));

    let tally = {
        let mut locked = LockedAgents {
            network: ctx.network,
            guards: ctx.population.lock_set(&ids)?,
        };

        let mut row = locked.take(row_id)?;
        let mut column = locked.take(column_id)?;
        let tally = play_block(ctx.payoff, ctx.rounds, &mut row, &mut column);
        let (row_won, column_won) = tally.outcome();

        locked.guards.insert(column_id, column);
        update_side(ctx, &locked, &mut row, column_id, row_won, &mut *rng)?;
        locked.guards.insert(row_id, row);

        let mut column = locked.take(column_id)?;
        update_side(ctx, &locked, &mut column, row_id, column_won, &mut *rng)?;
        tally
    };

    let snapshot = ctx.metrics.record_match(
        pass,
        edge,
        &tally.rule_wins,
        &tally.rule_played,
        ctx.population,
    );
    debug!(
        "Match {} on ({}, {}): {:.1} vs {:.1}, cooperation {:.3}",
        snapshot.index, row_id, column_id, tally.row_payoff, tally.column_payoff, snapshot.cooperation_ratio
    );

    Ok(snapshot)
}
