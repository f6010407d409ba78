// The six update rules. Each rule is a plain function picked once per agent
// through `UpdateRule::handler`, deciding on copies of the agents involved
// and returning a `Transition` that is applied afterwards.

use super::{Strategy, UpdateRule};
use crate::agent::{Agent, AgentId, AgentView};
use crate::error::Result;
use rand::{Rng, RngCore};

/// Read access to the network around an agent.
pub trait Neighborhood {
    fn neighbors(&self, id: AgentId) -> &[AgentId];
    fn view(&self, id: AgentId) -> Result<AgentView>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateParams {
    /// Redraw probability for the random rule, `None` unless the population
    /// was seeded from a fixed cooperation probability.
    pub random_cooperation: Option<f64>,
    pub d_max: f64,
    /// Logit temperature.
    pub k: f64,
    pub allow_rule_change: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adoption {
    Always(UpdateRule),
    IfChanged(UpdateRule),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub strategy: Strategy,
    pub adoption: Adoption,
}

impl Transition {
    fn copy(donor: &AgentView) -> Self {
        Self {
            strategy: donor.strategy,
            adoption: Adoption::Always(donor.update_rule),
        }
    }

    fn copy_if_changed(donor: &AgentView) -> Self {
        Self {
            strategy: donor.strategy,
            adoption: Adoption::IfChanged(donor.update_rule),
        }
    }
}

pub struct RuleInput<'a> {
    pub agent: AgentView,
    pub opponent: AgentView,
    /// Match level outcome, a tied block counts as won for both sides.
    pub won_round: bool,
    pub params: &'a UpdateParams,
    pub neighborhood: &'a dyn Neighborhood,
}

pub type Handler = fn(&RuleInput<'_>, &mut dyn RngCore) -> Result<Option<Transition>>;

impl UpdateRule {
    pub fn handler(self) -> Handler {
        match self {
            UpdateRule::Random => random,
            UpdateRule::Adapt => adapt,
            UpdateRule::TitForTat => tit_for_tat,
            UpdateRule::ReplicatorDynamics => replicator_dynamics,
            UpdateRule::BestTakesOver => best_takes_over,
            UpdateRule::LogitReplicatorDynamics => logit_replicator_dynamics,
        }
    }
}

/// Runs the agent's own rule. `None` means the agent is left untouched.
pub fn decide(input: &RuleInput<'_>, rng: &mut dyn RngCore) -> Result<Option<Transition>> {
    (input.agent.update_rule.handler())(input, rng)
}

/// Decides and applies in one go, returns whether the strategy changed.
/// `neighborhood` must not hand out a view that needs `agent` itself.
pub fn update(
    agent: &mut Agent,
    opponent: &AgentView,
    won_round: bool,
    params: &UpdateParams,
    neighborhood: &dyn Neighborhood,
    rng: &mut dyn RngCore,
) -> Result<bool> {
    let input = RuleInput {
        agent: agent.view(),
        opponent: *opponent,
        won_round,
        params,
        neighborhood,
    };

    Ok(match decide(&input, rng)? {
        Some(transition) => agent.apply(transition, params.allow_rule_change),
        None => false,
    })
}

fn random(input: &RuleInput<'_>, rng: &mut dyn RngCore) -> Result<Option<Transition>> {
    if input.won_round {
        return Ok(None);
    }
    let Some(p) = input.params.random_cooperation else {
        return Ok(None);
    };

    let strategy = if rng.r#gen::<f64>() < p {
        Strategy::Cooperate
    } else {
        Strategy::Defect
    };

    Ok(Some(Transition {
        strategy,
        adoption: Adoption::IfChanged(input.opponent.update_rule),
    }))
}

fn adapt(input: &RuleInput<'_>, _rng: &mut dyn RngCore) -> Result<Option<Transition>> {
    if input.won_round {
        return Ok(None);
    }
    Ok(Some(Transition::copy(&input.opponent)))
}

fn tit_for_tat(input: &RuleInput<'_>, _rng: &mut dyn RngCore) -> Result<Option<Transition>> {
    Ok(Some(Transition::copy(&input.opponent)))
}

// Average payoff divided by rounds played once more. Kept as-is, this is not
// the squared average one might expect.
fn fitness(view: &AgentView) -> Option<f64> {
    view.average_payoff().map(|avg| avg / view.rounds_played as f64)
}

fn replicator_dynamics(input: &RuleInput<'_>, rng: &mut dyn RngCore) -> Result<Option<Transition>> {
    let (Some(g_i), Some(g_j)) = (fitness(&input.agent), fitness(&input.opponent)) else {
        return Ok(None);
    };
    if g_i >= g_j {
        return Ok(None);
    }

    // Negative whenever g_i < g_j
    let switch_probability = (g_i - g_j) / input.params.d_max;
    if rng.r#gen::<f64>() < switch_probability {
        Ok(Some(Transition::copy_if_changed(&input.opponent)))
    } else {
        Ok(None)
    }
}

/// Finds the first neighbour with the strictly highest payoff sum, starting
/// from a floor of zero with the agent itself as the fallback.
pub fn richest_neighbor(agent: &AgentView, neighborhood: &dyn Neighborhood) -> Result<AgentView> {
    let mut best = *agent;
    let mut max_payoff = 0.0;

    for &id in neighborhood.neighbors(agent.id) {
        let neighbor = neighborhood.view(id)?;
        if max_payoff < neighbor.payoff_sum {
            max_payoff = neighbor.payoff_sum;
            best = neighbor;
        }
    }

    Ok(best)
}

fn best_takes_over(input: &RuleInput<'_>, _rng: &mut dyn RngCore) -> Result<Option<Transition>> {
    if input.won_round {
        return Ok(None);
    }
    let best = richest_neighbor(&input.agent, input.neighborhood)?;
    Ok(Some(Transition::copy(&best)))
}

/// Logistic switch probability towards a neighbour earning `neighbor_avg`.
pub fn logit_probability(agent_avg: f64, neighbor_avg: f64, k: f64) -> f64 {
    1.0 / (1.0 + (-(neighbor_avg - agent_avg) / k).exp())
}

fn logit_replicator_dynamics(input: &RuleInput<'_>, rng: &mut dyn RngCore) -> Result<Option<Transition>> {
    let neighbors = input.neighborhood.neighbors(input.agent.id);
    if neighbors.is_empty() {
        return Ok(None);
    }

    let neighbor = input.neighborhood.view(neighbors[rng.gen_range(0..neighbors.len())])?;
    let (Some(agent_avg), Some(neighbor_avg)) =
        (input.agent.average_payoff(), neighbor.average_payoff())
    else {
        return Ok(None);
    };

    let p = logit_probability(agent_avg, neighbor_avg, input.params.k);
    if rng.r#gen::<f64>() <= p {
        Ok(Some(Transition::copy_if_changed(&neighbor)))
    } else {
        Ok(None)
    }
}
