pub mod generators;
pub mod pajek;

use crate::agent::AgentId;
use crate::error::{GameError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub type Edge = (AgentId, AgentId);

/// Simple undirected graph over nodes `0..n`. Adjacency and edge lists keep
/// insertion order, which is the order matches and neighbour scans follow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    adjacency: Vec<Vec<AgentId>>,
    edges: Vec<Edge>,
    edge_set: HashSet<Edge>,
}

impl Network {
    pub fn with_nodes(n: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); n],
            edges: Vec::new(),
            edge_set: HashSet::new(),
        }
    }

    pub fn from_edges(n: usize, edges: &[Edge]) -> Result<Self> {
        let mut network = Self::with_nodes(n);
        for &(a, b) in edges {
            if a as usize >= n || b as usize >= n {
                return Err(GameError::InvalidConfig(format!(
                    "edge ({}, {}) references a node outside 0..{}",
                    a, b, n
                )));
            }
            network.add_edge(a, b);
        }
        Ok(network)
    }

    fn key(a: AgentId, b: AgentId) -> Edge {
        if a < b { (a, b) } else { (b, a) }
    }

    /// Returns false for self loops, duplicates and unknown nodes.
    pub fn add_edge(&mut self, a: AgentId, b: AgentId) -> bool {
        let n = self.adjacency.len();
        if a == b || a as usize >= n || b as usize >= n {
            return false;
        }
        if !self.edge_set.insert(Self::key(a, b)) {
            return false;
        }

        self.adjacency[a as usize].push(b);
        self.adjacency[b as usize].push(a);
        self.edges.push((a, b));
        true
    }

    pub fn has_edge(&self, a: AgentId, b: AgentId) -> bool {
        self.edge_set.contains(&Self::key(a, b))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn neighbors(&self, id: AgentId) -> &[AgentId] {
        self.adjacency
            .get(id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn degree(&self, id: AgentId) -> usize {
        self.neighbors(id).len()
    }

    pub fn isolated_nodes(&self) -> usize {
        self.adjacency.iter().filter(|adj| adj.is_empty()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    ErdosRenyi,
    SmallWorld,
    BarabasiAlbert,
    Pajek,
}

impl GraphKind {
    pub fn name(self) -> &'static str {
        match self {
            GraphKind::ErdosRenyi => "erdos_renyi",
            GraphKind::SmallWorld => "small_world",
            GraphKind::BarabasiAlbert => "barabasi_albert",
            GraphKind::Pajek => "pajek",
        }
    }

    /// `p` is the link probability for Erdos-Renyi and the shortcut probability
    /// for the small world model, `m` the lattice degree or attachment count.
    pub fn build<R: Rng + ?Sized>(
        self,
        n: usize,
        p: f64,
        m: usize,
        pajek_path: Option<&Path>,
        rng: &mut R,
    ) -> Result<Network> {
        match self {
            GraphKind::ErdosRenyi => generators::erdos_renyi(n, p, rng),
            GraphKind::SmallWorld => generators::small_world(n, m, p, rng),
            GraphKind::BarabasiAlbert => generators::barabasi_albert(n, m, rng),
            GraphKind::Pajek => {
                let path = pajek_path.ok_or_else(|| {
                    GameError::InvalidConfig("G is pajek but no pajek_path was given".to_string())
                })?;
                pajek::read_pajek(path)
            }
        }
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GraphKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "erdos_renyi" | "er" => Ok(GraphKind::ErdosRenyi),
            "small_world" | "nws" => Ok(GraphKind::SmallWorld),
            "barabasi_albert" | "ba" => Ok(GraphKind::BarabasiAlbert),
            "pajek" => Ok(GraphKind::Pajek),
            _ => Err(GameError::UnknownGraph(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_loops_and_duplicates() {
        let mut network = Network::with_nodes(3);
        assert!(network.add_edge(0, 1));
        assert!(!network.add_edge(1, 0));
        assert!(!network.add_edge(2, 2));
        assert!(!network.add_edge(2, 5));
        assert!(network.add_edge(2, 0));

        assert_eq!(network.edges(), &[(0, 1), (2, 0)]);
        assert_eq!(network.neighbors(0), &[1, 2]);
        assert!(network.has_edge(0, 2));
        assert!(!network.has_edge(1, 2));
        assert_eq!(network.degree(1), 1);
        assert_eq!(network.neighbors(99), &[] as &[AgentId]);
    }

    #[test]
    fn from_edges_checks_bounds() {
        assert!(Network::from_edges(2, &[(0, 1)]).is_ok());
        assert!(matches!(
            Network::from_edges(2, &[(0, 2)]),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn graph_kind_parses() {
        assert_eq!("erdos_renyi".parse::<GraphKind>().unwrap(), GraphKind::ErdosRenyi);
        assert_eq!("small-world".parse::<GraphKind>().unwrap(), GraphKind::SmallWorld);
        assert_eq!("BA".parse::<GraphKind>().unwrap(), GraphKind::BarabasiAlbert);
        assert!(matches!("torus".parse::<GraphKind>(), Err(GameError::UnknownGraph(_))));
    }

    #[test]
    fn pajek_kind_needs_a_path() {
        let mut rng = rand::thread_rng();
        let result = GraphKind::Pajek.build(4, 0.1, 1, None, &mut rng);
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
    }
}
