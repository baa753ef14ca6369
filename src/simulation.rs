//! Drives a whole population: bootstrap join, stabilization rounds and
//! test lookups, all behind an injectable, seedable configuration.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::common::Id;
use crate::lookup::LookupOutcome;
use crate::network::Network;
use crate::{Error, Result};

/// Split an address-list text into addresses, one per line, discarding
/// blank lines.
pub fn parse_address_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Orchestration knobs for a [Simulation].
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Shuffle the supplied address order before picking the bootstrap
    /// participant.
    ///
    /// Defaults to `true`.
    pub shuffle: bool,
    /// Rounds of stabilization after the join phase: each round, every
    /// participant looks up a random target to refresh its table.
    ///
    /// Defaults to `0`.
    pub stabilization_rounds: usize,
    /// Number of random test lookups run by [Simulation::run].
    ///
    /// Defaults to `1`.
    pub test_lookups: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            shuffle: true,
            stabilization_rounds: 0,
            test_lookups: 1,
        }
    }
}

/// A full-population simulation: the first address (after the optional
/// shuffle) acts as the single bootstrap contact, every other participant
/// joins by looking up its own id against it.
#[derive(Debug)]
pub struct Simulation {
    network: Network,
    addresses: Vec<String>,
    bootstrap: Vec<String>,
    rng: StdRng,
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(addresses: Vec<String>, config: SimulationConfig) -> Result<Simulation> {
        let mut addresses = addresses;

        // Keep the driver's view of the population in sync with the
        // network, which collapses duplicates.
        let mut seen = HashSet::new();
        addresses.retain(|address| seen.insert(address.clone()));

        if addresses.is_empty() {
            return Err(Error::EmptyPopulation);
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::thread_rng().gen()),
        };

        if config.shuffle {
            addresses.shuffle(&mut rng);
        }

        let network = Network::new(addresses.iter().cloned())?;
        let bootstrap = vec![addresses[0].clone()];

        info!(
            participants = addresses.len(),
            bootstrap = %bootstrap[0],
            "Simulation ready"
        );

        Ok(Simulation {
            network,
            addresses,
            bootstrap,
            rng,
            config,
        })
    }

    // === Getters ===

    pub fn bootstrap_address(&self) -> &str {
        &self.bootstrap[0]
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    // === Public Methods ===

    /// Join phase, then the configured stabilization rounds, then the
    /// configured number of test lookups, whose outcomes are returned.
    pub fn run(&mut self) -> Result<Vec<LookupOutcome>> {
        self.bootstrap_all()?;
        self.stabilize(self.config.stabilization_rounds)?;

        let mut outcomes = Vec::with_capacity(self.config.test_lookups);
        for _ in 0..self.config.test_lookups {
            outcomes.push(self.test_lookup()?);
        }

        Ok(outcomes)
    }

    /// Sequentially join every non-bootstrap participant by looking up its
    /// own id against the bootstrap contact alone.
    pub fn bootstrap_all(&mut self) -> Result<()> {
        let total = self.addresses.len() - 1;

        for (joined, address) in self.addresses.iter().enumerate().skip(1) {
            debug!(joined, total, address = %address, "Joining participant");

            let target = Id::from_address(address);
            self.network.run_lookup(address, target, &self.bootstrap)?;
        }

        info!(total, "Join phase done");

        Ok(())
    }

    /// Run `rounds` stabilization rounds: every participant looks up one
    /// random target per round.
    pub fn stabilize(&mut self, rounds: usize) -> Result<()> {
        for round in 0..rounds {
            debug!(round, "Stabilization round");

            for address in &self.addresses {
                let target = Id::from_rng(&mut self.rng);
                self.network.run_lookup(address, target, &self.bootstrap)?;
            }
        }

        Ok(())
    }

    /// One lookup from a random participant towards a random target.
    pub fn test_lookup(&mut self) -> Result<LookupOutcome> {
        let querier = &self.addresses[self.rng.gen_range(0..self.addresses.len())];
        let target = Id::from_rng(&mut self.rng);

        info!(querier = %querier, ?target, "Test lookup");

        self.network.run_lookup(querier, target, &self.bootstrap)
    }
}
