//! Injectable latency and fault policy for remote-style operations.
//!
//! The store asks the policy for a [`SimulatedOutcome`] before each load,
//! add, update and delete, sleeps for the returned latency, and fails the
//! operation if told to. Nothing here touches storage.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;

/// The operations a simulation is consulted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Load,
    Add,
    Update,
    Delete,
}

impl Display for RemoteOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RemoteOp::Load => "load",
            RemoteOp::Add => "add",
            RemoteOp::Update => "update",
            RemoteOp::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// What the simulation decided for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulatedOutcome {
    pub latency: Duration,
    pub fail: bool,
}

pub trait NetworkSimulation: Send {
    fn plan(&mut self, op: RemoteOp) -> SimulatedOutcome;
}

/// No latency, never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSimulation;

impl NetworkSimulation for NoSimulation {
    fn plan(&mut self, _op: RemoteOp) -> SimulatedOutcome {
        SimulatedOutcome::default()
    }
}

/// Fixed per-operation latency plus an independent failure roll.
#[derive(Debug)]
pub struct RandomFaults {
    failure_rate: f64,
    load: Duration,
    add: Duration,
    update: Duration,
    delete: Duration,
    rng: StdRng,
}

impl RandomFaults {
    pub fn from_config(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let failure_rate = if config.failure_rate.is_nan() {
            0.0
        } else {
            config.failure_rate.clamp(0.0, 1.0)
        };
        Self {
            failure_rate,
            load: Duration::from_millis(config.load_ms),
            add: Duration::from_millis(config.add_ms),
            update: Duration::from_millis(config.update_ms),
            delete: Duration::from_millis(config.delete_ms),
            rng,
        }
    }

    pub fn latency_for(&self, op: RemoteOp) -> Duration {
        match op {
            RemoteOp::Load => self.load,
            RemoteOp::Add => self.add,
            RemoteOp::Update => self.update,
            RemoteOp::Delete => self.delete,
        }
    }
}

impl NetworkSimulation for RandomFaults {
    fn plan(&mut self, op: RemoteOp) -> SimulatedOutcome {
        SimulatedOutcome {
            latency: self.latency_for(op),
            fail: self.rng.random_bool(self.failure_rate),
        }
    }
}

/// Builds the policy a configuration asks for.
pub fn from_config(config: &SimulationConfig) -> Box<dyn NetworkSimulation> {
    if config.enabled {
        Box::new(RandomFaults::from_config(config))
    } else {
        Box::new(NoSimulation)
    }
}
