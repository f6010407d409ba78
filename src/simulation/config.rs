use crate::error::{GameError, Result};
use crate::game::{PayoffMatrix, UpdateParams};
use crate::network::GraphKind;
use crate::population::CooperationSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `cooperation_probability` as written in the config: a number, `"random"`
/// or a path to a JSON strategy table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CooperationSetting {
    Probability(f64),
    Source(String),
}

impl CooperationSetting {
    pub fn fixed_probability(&self) -> Option<f64> {
        match self {
            CooperationSetting::Probability(p) => Some(*p),
            CooperationSetting::Source(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "SIMULATION")]
    pub simulation: SimConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub n: usize,
    #[serde(default = "default_p")]
    pub p: f64,
    #[serde(default = "default_m")]
    pub m: usize,
    #[serde(rename = "G")]
    pub graph: GraphKind,
    #[serde(default)]
    pub pajek_path: Option<PathBuf>,
    #[serde(alias = "competitive_probability")]
    pub cooperation_probability: CooperationSetting,
    #[serde(rename = "pay_off")]
    pub payoff: PayoffMatrix,
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "ROUNDS")]
    pub rounds: u32,
    pub change_update_rule: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_passes")]
    pub passes: u32,
}

fn default_name() -> String {
    "coopnet".to_string()
}

fn default_p() -> f64 {
    0.15
}

fn default_m() -> usize {
    2
}

fn default_workers() -> usize {
    5
}

fn default_passes() -> u32 {
    1
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            n: 50,
            p: default_p(),
            m: default_m(),
            graph: GraphKind::ErdosRenyi,
            pajek_path: None,
            cooperation_probability: CooperationSetting::Probability(0.5),
            payoff: PayoffMatrix::prisoners_dilemma(),
            k: 0.5,
            rounds: 10,
            change_update_rule: true,
            seed: None,
            workers: default_workers(),
            passes: default_passes(),
        }
    }
}

fn invalid(message: String) -> GameError {
    GameError::InvalidConfig(message)
}

impl SimConfig {
    /// Reads the `SIMULATION` block of a YAML file and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        file.simulation.validate()?;
        Ok(file.simulation)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(invalid("n must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.p) {
            return Err(invalid(format!("p must be in [0, 1], got {}", self.p)));
        }
        match self.graph {
            GraphKind::SmallWorld | GraphKind::BarabasiAlbert if self.m < 1 || self.m >= self.n => {
                return Err(invalid(format!(
                    "m must satisfy 1 <= m < n for {}, got m = {} and n = {}",
                    self.graph, self.m, self.n
                )));
            }
            GraphKind::Pajek if self.pajek_file().is_none() => {
                return Err(invalid("G is pajek but no pajek_path was given".into()));
            }
            _ => {}
        }
        if let CooperationSetting::Probability(p) = self.cooperation_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!(
                    "cooperation_probability must be in [0, 1], got {}",
                    p
                )));
            }
        }
        if let CooperationSetting::Source(s) = &self.cooperation_probability {
            if s.trim().is_empty() {
                return Err(invalid("cooperation_probability is an empty string".into()));
            }
        }
        self.payoff.validate()?;
        if !self.k.is_finite() || self.k <= 0.0 {
            return Err(invalid(format!("K must be a positive number, got {}", self.k)));
        }
        if self.rounds == 0 {
            return Err(invalid("ROUNDS must be positive".into()));
        }
        if self.workers == 0 {
            return Err(invalid("workers must be at least 1".into()));
        }
        if self.passes == 0 {
            return Err(invalid("passes must be at least 1".into()));
        }
        Ok(())
    }

    /// `pajek_path`, treating an empty string as unset.
    pub fn pajek_file(&self) -> Option<&Path> {
        self.pajek_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn cooperation_source(&self) -> Result<CooperationSource> {
        match &self.cooperation_probability {
            CooperationSetting::Probability(p) => Ok(CooperationSource::Probability(*p)),
            CooperationSetting::Source(s) if s.trim().eq_ignore_ascii_case("random") => {
                Ok(CooperationSource::Random)
            }
            CooperationSetting::Source(path) => CooperationSource::load_table(path.trim()),
        }
    }

    pub fn update_params(&self) -> UpdateParams {
        UpdateParams {
            random_cooperation: self.cooperation_probability.fixed_probability(),
            d_max: self.payoff.d_max(),
            k: self.k,
            allow_rule_change: self.change_update_rule,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_graph(mut self, graph: GraphKind, p: f64, m: usize) -> Self {
        self.graph = graph;
        self.p = p;
        self.m = m;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }
}
