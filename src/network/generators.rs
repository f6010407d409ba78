// Random graph models. All of them take the caller's rng so a seeded run
// always produces the same topology.

use super::Network;
use crate::agent::AgentId;
use crate::error::{GameError, Result};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

fn coin(p: f64) -> Result<Bernoulli> {
    Bernoulli::new(p).map_err(|_| {
        GameError::InvalidConfig(format!("probability p must be in [0, 1], got {}", p))
    })
}

/// G(n, p): every pair is linked independently with probability `p`.
pub fn erdos_renyi<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Result<Network> {
    let link = coin(p)?;
    let mut network = Network::with_nodes(n);

    for i in 0..n {
        for j in (i + 1)..n {
            if link.sample(rng) {
                network.add_edge(i as AgentId, j as AgentId);
            }
        }
    }

    Ok(network)
}

/// Newman-Watts-Strogatz: a ring where each node reaches its `k / 2` nearest
/// neighbours on both sides, plus random shortcuts. No ring edge is removed.
pub fn small_world<R: Rng + ?Sized>(n: usize, k: usize, p: f64, rng: &mut R) -> Result<Network> {
    if k >= n {
        return Err(GameError::InvalidConfig(format!(
            "small world lattice degree m = {} must be below n = {}",
            k, n
        )));
    }
    let shortcut = coin(p)?;
    let mut network = Network::with_nodes(n);

    for offset in 1..=k / 2 {
        for u in 0..n {
            network.add_edge(u as AgentId, ((u + offset) % n) as AgentId);
        }
    }

    let ring: Vec<_> = network.edges().to_vec();
    for (u, _) in ring {
        if !shortcut.sample(rng) || network.degree(u) >= n - 1 {
            continue;
        }
        let mut w = rng.gen_range(0..n) as AgentId;
        while w == u || network.has_edge(u, w) {
            w = rng.gen_range(0..n) as AgentId;
        }
        network.add_edge(u, w);
    }

    Ok(network)
}

/// Preferential attachment. Starts from `m` unconnected nodes, every new node
/// links to `m` distinct targets sampled proportionally to degree.
pub fn barabasi_albert<R: Rng + ?Sized>(n: usize, m: usize, rng: &mut R) -> Result<Network> {
    if m < 1 || m >= n {
        return Err(GameError::InvalidConfig(format!(
            "barabasi albert needs 1 <= m < n, got m = {} and n = {}",
            m, n
        )));
    }
    let mut network = Network::with_nodes(n);
    let mut targets: Vec<AgentId> = (0..m as AgentId).collect();
    let mut repeated: Vec<AgentId> = Vec::new();

    for source in m..n {
        let source = source as AgentId;
        for &target in &targets {
            network.add_edge(source, target);
        }
        repeated.extend(targets.iter().copied());
        repeated.extend(std::iter::repeat_n(source, m));
        targets = random_subset(&repeated, m, rng);
    }

    Ok(network)
}

fn random_subset<R: Rng + ?Sized>(pool: &[AgentId], m: usize, rng: &mut R) -> Vec<AgentId> {
    let mut chosen = Vec::with_capacity(m);
    while chosen.len() < m {
        let candidate = pool[rng.gen_range(0..pool.len())];
        if !chosen.contains(&candidate) {
            chosen.push(candidate);
        }
    }
    chosen
}
