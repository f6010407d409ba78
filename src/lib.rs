pub mod agent;
pub mod error;
pub mod game;
pub mod metrics;
pub mod network;
pub mod population;
pub mod simulation;

pub use agent::{Agent, AgentId};
pub use error::GameError;
pub use game::{PayoffMatrix, Strategy, UpdateRule};
pub use metrics::MetricsCollector;
pub use network::Network;
pub use population::Population;
pub use simulation::{SimConfig, Simulation};

pub mod prelude {
    pub use crate::agent::{Agent, AgentId, AgentView};
    pub use crate::error::GameError;
    pub use crate::game::{PayoffMatrix, RuleCounts, Strategy, UpdateRule};
    pub use crate::metrics::{MatchSnapshot, MetricsCollector};
    pub use crate::network::{Edge, GraphKind, Network};
    pub use crate::population::{CooperationSource, Population};
    pub use crate::simulation::{SimConfig, Simulation};
}
