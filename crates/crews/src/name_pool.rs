use std::collections::{HashMap, HashSet};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use shared::domain::ChannelId;

use crate::error::CrewError;

/// Hands out crew names per parent category without repeats until the pool is spent,
/// then starts over with the whole pool.
#[derive(Debug)]
pub struct NamePool {
    used: HashMap<ChannelId, HashSet<String>>,
    rng: StdRng,
}

impl Default for NamePool {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl NamePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            used: HashMap::new(),
            rng,
        }
    }

    pub fn allocate(&mut self, parent_id: ChannelId, pool: &[String]) -> Result<String, CrewError> {
        let mut seen = HashSet::new();
        let distinct: Vec<&String> = pool.iter().filter(|name| seen.insert(*name)).collect();
        if distinct.is_empty() {
            return Err(CrewError::PoolExhausted { parent: parent_id });
        }

        let used = self.used.entry(parent_id).or_default();
        let mut available: Vec<&String> = distinct
            .iter()
            .copied()
            .filter(|name| !used.contains(*name))
            .collect();
        if available.is_empty() {
            // Only reachable when the pool changed under us and the used set holds
            // names that are no longer configured.
            used.clear();
            available = distinct.clone();
        }

        let chosen = available
            .choose(&mut self.rng)
            .map(|name| (*name).clone())
            .ok_or(CrewError::PoolExhausted { parent: parent_id })?;
        used.insert(chosen.clone());

        if distinct.iter().all(|name| used.contains(*name)) {
            used.clear();
        }

        Ok(chosen)
    }

    pub fn used_count(&self, parent_id: ChannelId) -> usize {
        self.used.get(&parent_id).map_or(0, HashSet::len)
    }
}

#[cfg(test)]
#[path = "tests/name_pool_tests.rs"]
mod tests;
