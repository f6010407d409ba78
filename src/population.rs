use crate::agent::{Agent, AgentId};
use crate::error::{GameError, Result};
use crate::game::{RuleCounts, Strategy, UpdateRule};
use parking_lot::{Mutex, MutexGuard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Where initial strategies come from.
#[derive(Debug, Clone, PartialEq)]
pub enum CooperationSource {
    Probability(f64),
    /// Unbiased coin flip.
    Random,
    /// Per node strategies read from a JSON object such as `{"1": "C", "2": "D"}`.
    /// Keys are 1-based, node `i` is looked up under `i + 1`.
    Table {
        path: PathBuf,
        strategies: HashMap<String, String>,
    },
}

impl CooperationSource {
    pub fn load_table(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
        let strategies: HashMap<String, String> = serde_json::from_str(&content)?;
        Ok(Self::Table {
            path: path.to_path_buf(),
            strategies,
        })
    }

    /// The probability the random update rule redraws with, only defined for
    /// a fixed probability source.
    pub fn fixed_probability(&self) -> Option<f64> {
        match self {
            CooperationSource::Probability(p) => Some(*p),
            _ => None,
        }
    }

    pub fn draw<R: Rng + ?Sized>(&self, id: AgentId, rng: &mut R) -> Result<Strategy> {
        let cooperate = match self {
            CooperationSource::Probability(p) => rng.r#gen::<f64>() <= *p,
            CooperationSource::Random => rng.r#gen::<f64>() <= 0.5,
            CooperationSource::Table { path, strategies } => {
                let key = (id + 1).to_string();
                let value = strategies.get(&key).ok_or_else(|| GameError::MissingStrategy {
                    node: id,
                    key: key.clone(),
                    path: path.clone(),
                })?;
                if value != "C" && value != "D" {
                    warn!("Node {} has strategy {:?} in {}, treating it as defect", id, value, path.display());
                }
                value == "C"
            }
        };

        Ok(if cooperate { Strategy::Cooperate } else { Strategy::Defect })
    }
}

/// Head count of a population at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Census {
    pub size: usize,
    pub cooperators: usize,
    pub membership: RuleCounts,
}

impl Census {
    pub fn from_agents<'a>(agents: impl IntoIterator<Item = &'a Agent>) -> Self {
        let mut census = Census::default();
        for agent in agents {
            census.count(agent);
        }
        census
    }

    fn count(&mut self, agent: &Agent) {
        self.size += 1;
        if agent.strategy.is_cooperative() {
            self.cooperators += 1;
        }
        self.membership.incr(agent.update_rule);
    }

    pub fn cooperation_ratio(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.cooperators as f64 / self.size as f64
        }
    }
}

/// All agents, indexed by id. Each agent has its own lock so matches on
/// disjoint neighbourhoods never contend.
pub struct Population {
    agents: Vec<Mutex<Agent>>,
}

impl Population {
    pub fn initialize<R: Rng + ?Sized>(
        count: usize,
        source: &CooperationSource,
        rng: &mut R,
    ) -> Result<Self> {
        let mut agents = Vec::with_capacity(count);

        for index in 0..count {
            let id = index as AgentId;
            let update_rule = UpdateRule::random(rng);
            let strategy = if update_rule == UpdateRule::TitForTat {
                Strategy::Cooperate
            } else {
                source.draw(id, rng)?
            };
            agents.push(Agent::new(id, strategy, update_rule));
        }

        Self::from_agents(agents)
    }

    /// Ids must run from zero without gaps, in order.
    pub fn from_agents(agents: Vec<Agent>) -> Result<Self> {
        if let Some((index, agent)) = agents
            .iter()
            .enumerate()
            .find(|(index, agent)| agent.id as usize != *index)
        {
            return Err(GameError::InvalidConfig(format!(
                "agent at position {} has id {}",
                index, agent.id
            )));
        }

        Ok(Self {
            agents: agents.into_iter().map(Mutex::new).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    fn slot(&self, id: AgentId) -> Result<&Mutex<Agent>> {
        self.agents
            .get(id as usize)
            .ok_or(GameError::AgentNotFound(id))
    }

    pub fn lookup(&self, id: AgentId) -> Result<Agent> {
        Ok(self.slot(id)?.lock().clone())
    }

    /// Locks every listed agent, always in ascending id order, and holds the
    /// guards until the map is dropped. Duplicate ids are locked once. Unknown
    /// ids fail before anything is locked.
    pub fn lock_set(&self, ids: &[AgentId]) -> Result<BTreeMap<AgentId, MutexGuard<'_, Agent>>> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let slots = ids
            .iter()
            .map(|&id| self.slot(id).map(|slot| (id, slot)))
            .collect::<Result<Vec<_>>>()?;

        Ok(slots.into_iter().map(|(id, slot)| (id, slot.lock())).collect())
    }

    /// Deep copy of every agent.
    pub fn snapshot(&self) -> Vec<Agent> {
        self.agents.iter().map(|slot| slot.lock().clone()).collect()
    }

    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for slot in &self.agents {
            census.count(&slot.lock());
        }
        census
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn table(entries: &[(&str, &str)]) -> CooperationSource {
        CooperationSource::Table {
            path: PathBuf::from("strategies.json"),
            strategies: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn tit_for_tat_starts_cooperating() {
        let mut rng = StdRng::seed_from_u64(42);
        let population = Population::initialize(500, &CooperationSource::Probability(0.0), &mut rng).unwrap();

        let agents = population.snapshot();
        assert_eq!(agents.len(), 500);
        for agent in &agents {
            match agent.update_rule() {
                UpdateRule::TitForTat => assert_eq!(agent.strategy(), Strategy::Cooperate),
                _ => assert_eq!(agent.strategy(), Strategy::Defect),
            }
            assert_eq!(agent.rounds_played(), 0);
        }

        let rules: HashSet<_> = agents.iter().map(|a| a.update_rule()).collect();
        assert_eq!(rules.len(), UpdateRule::COUNT);
    }

    #[test]
    fn full_probability_cooperates() {
        let mut rng = StdRng::seed_from_u64(1);
        let population = Population::initialize(50, &CooperationSource::Probability(1.0), &mut rng).unwrap();
        assert_eq!(population.census().cooperators, 50);
        assert_eq!(population.census().cooperation_ratio(), 1.0);
    }

    #[test]
    fn random_source_flips_a_fair_coin() {
        let mut rng = StdRng::seed_from_u64(11);
        let population = Population::initialize(400, &CooperationSource::Random, &mut rng).unwrap();
        let agents = population.snapshot();

        let others: Vec<_> = agents
            .iter()
            .filter(|a| a.update_rule() != UpdateRule::TitForTat)
            .collect();
        let cooperators = others.iter().filter(|a| a.strategy().is_cooperative()).count();
        assert!(cooperators > others.len() / 4, "{} of {}", cooperators, others.len());
        assert!(cooperators < others.len() * 3 / 4, "{} of {}", cooperators, others.len());

        assert!(agents
            .iter()
            .filter(|a| a.update_rule() == UpdateRule::TitForTat)
            .all(|a| a.strategy() == Strategy::Cooperate));
        assert_eq!(CooperationSource::Random.fixed_probability(), None);
    }

    #[test]
    fn table_is_one_based() {
        let source = table(&[("1", "D"), ("2", "C"), ("3", "D")]);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(source.draw(0, &mut rng).unwrap(), Strategy::Defect);
        assert_eq!(source.draw(1, &mut rng).unwrap(), Strategy::Cooperate);
        assert_eq!(source.draw(2, &mut rng).unwrap(), Strategy::Defect);
        assert!(matches!(
            source.draw(3, &mut rng),
            Err(GameError::MissingStrategy { node: 3, .. })
        ));
        assert_eq!(source.fixed_probability(), None);
        assert_eq!(CooperationSource::Probability(0.3).fixed_probability(), Some(0.3));
    }

    #[test]
    fn table_loads_from_file() {
        let path = std::env::temp_dir().join(format!("coopnet_table_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"1": "C", "2": "D"}"#).unwrap();

        let source = CooperationSource::load_table(&path).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(source.draw(0, &mut rng).unwrap(), Strategy::Cooperate);
        assert_eq!(source.draw(1, &mut rng).unwrap(), Strategy::Defect);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            CooperationSource::load_table(&path),
            Err(GameError::Io { .. })
        ));
    }

    #[test]
    fn lookup_fails_on_unknown_id() {
        let population = Population::from_agents(vec![
            Agent::new(0, Strategy::Cooperate, UpdateRule::Adapt),
            Agent::new(1, Strategy::Defect, UpdateRule::Random),
        ])
        .unwrap();

        assert_eq!(population.lookup(1).unwrap().strategy(), Strategy::Defect);
        assert!(matches!(population.lookup(2), Err(GameError::AgentNotFound(2))));
        assert!(matches!(population.lookup(7), Err(GameError::AgentNotFound(7))));
    }

    #[test]
    fn rejects_gaps_in_ids() {
        let result = Population::from_agents(vec![
            Agent::new(0, Strategy::Cooperate, UpdateRule::Adapt),
            Agent::new(2, Strategy::Defect, UpdateRule::Random),
        ]);
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn lock_set_dedups_and_orders() {
        let population = Population::from_agents(vec![
            Agent::new(0, Strategy::Cooperate, UpdateRule::Adapt),
            Agent::new(1, Strategy::Defect, UpdateRule::Random),
            Agent::new(2, Strategy::Defect, UpdateRule::TitForTat),
        ])
        .unwrap();

        let mut guards = population.lock_set(&[2, 0, 2, 1, 0]).unwrap();
        assert_eq!(guards.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        guards.get_mut(&1).unwrap().strategy = Strategy::Cooperate;
        drop(guards);
        assert_eq!(population.lookup(1).unwrap().strategy(), Strategy::Cooperate);

        // nothing stays locked after a failed call
        assert!(matches!(population.lock_set(&[0, 9]), Err(GameError::AgentNotFound(9))));
        assert_eq!(population.lock_set(&[0, 1, 2]).unwrap().len(), 3);
    }

    #[test]
    fn census_counts_rules() {
        let agents = vec![
            Agent::new(0, Strategy::Cooperate, UpdateRule::Adapt),
            Agent::new(1, Strategy::Defect, UpdateRule::Adapt),
            Agent::new(2, Strategy::Cooperate, UpdateRule::BestTakesOver),
            Agent::new(3, Strategy::Defect, UpdateRule::Random),
        ];
        let census = Census::from_agents(&agents);
        assert_eq!(census.size, 4);
        assert_eq!(census.cooperators, 2);
        assert_eq!(census.cooperation_ratio(), 0.5);
        assert_eq!(census.membership[UpdateRule::Adapt], 2);
        assert_eq!(census.membership[UpdateRule::TitForTat], 0);
        assert_eq!(Census::default().cooperation_ratio(), 0.0);
    }
}
