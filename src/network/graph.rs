//! Explicit signal-flow graph hosting clean-up memories.
//!
//! A [`Network`] is always passed by the caller; there is no ambient
//! "current network". Sources are sampled in insertion order on every
//! [`Network::step`], then every connection evaluates its clean-up memory
//! against the freshly sampled source value.

use crate::error::{CleanupError, Result};
use crate::kernel::Vector;
use crate::memory::{CleanupMemory, Normalization, ReferenceSet};
use crate::network::signal::Signal;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Index of a source node within its network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Handle to a clean-up connection and its output port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(usize);

/// One recorded output sample.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeSample {
    pub t: f64,
    pub value: Vec<f64>,
}

/// Read-only view over recorded probe samples.
#[derive(Clone, Copy, Debug)]
pub struct ProbeView<'a> {
    samples: &'a [ProbeSample],
}

impl<'a> ProbeView<'a> {
    pub fn new(samples: &'a [ProbeSample]) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &'a [ProbeSample] {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Output `index` of every sample, in time order.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.samples
            .iter()
            .filter_map(|s| s.value.get(index).copied())
            .collect()
    }

    /// Largest value of output `index`; `NEG_INFINITY` when empty.
    pub fn max(&self, index: usize) -> f64 {
        self.column(index)
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest magnitude of output `index`; `INFINITY` when empty.
    pub fn min_abs(&self, index: usize) -> f64 {
        self.column(index)
            .into_iter()
            .map(f64::abs)
            .fold(f64::INFINITY, f64::min)
    }

    /// Mean of output `index`; `None` when empty.
    pub fn mean(&self, index: usize) -> Option<f64> {
        let col = self.column(index);
        if col.is_empty() {
            return None;
        }
        Some(col.iter().sum::<f64>() / col.len() as f64)
    }
}

struct SourceNode {
    name: String,
    signal: Box<dyn Signal>,
    value: Vector,
}

struct Connection {
    source: usize,
    memory: CleanupMemory,
    output: Option<Vec<f64>>,
    probe: Option<Vec<ProbeSample>>,
}

/// Named sources wired to clean-up memories.
pub struct Network {
    name: String,
    time: f64,
    sources: Vec<SourceNode>,
    index: HashMap<String, NodeId>,
    connections: Vec<Connection>,
    outputs: HashMap<String, ConnectionHandle>,
}

impl Network {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            time: 0.0,
            sources: Vec::new(),
            index: HashMap::new(),
            connections: Vec::new(),
            outputs: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulated time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Register a source under a unique name.
    pub fn add_source(&mut self, name: &str, signal: Box<dyn Signal>) -> Result<NodeId> {
        if self.index.contains_key(name) {
            return Err(CleanupError::InvalidConfig(format!(
                "duplicate node name {:?}",
                name
            )));
        }
        let id = NodeId(self.sources.len());
        let dims = signal.dimensions();
        self.sources.push(SourceNode {
            name: name.to_string(),
            signal,
            value: Vector::zeros(dims),
        });
        self.index.insert(name.to_string(), id);
        debug!(network = %self.name, node = name, dimensions = dims, "added source");
        Ok(id)
    }

    /// Look up a source by name.
    pub fn node(&self, name: &str) -> Result<NodeId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CleanupError::UnknownNode(name.to_string()))
    }

    /// Evaluate `memory` against `source` on every step.
    ///
    /// The memory's name becomes the output port name.
    pub fn connect(&mut self, source: NodeId, memory: CleanupMemory) -> Result<ConnectionHandle> {
        let node = self
            .sources
            .get(source.0)
            .ok_or_else(|| CleanupError::UnknownNode(format!("node #{}", source.0)))?;

        let expected = memory.references().dimensions();
        if node.signal.dimensions() != expected {
            return Err(CleanupError::DimensionMismatch {
                expected,
                got: node.signal.dimensions(),
            });
        }
        if self.outputs.contains_key(memory.name()) {
            return Err(CleanupError::InvalidConfig(format!(
                "duplicate output port {:?}",
                memory.name()
            )));
        }

        let handle = ConnectionHandle(self.connections.len());
        debug!(
            network = %self.name,
            source = %node.name,
            port = memory.name(),
            references = ?memory.references().names(),
            "connected clean-up memory"
        );
        self.outputs.insert(memory.name().to_string(), handle);
        self.connections.push(Connection {
            source: source.0,
            memory,
            output: None,
            probe: None,
        });
        Ok(handle)
    }

    /// Look up an output port by name.
    pub fn port(&self, name: &str) -> Result<ConnectionHandle> {
        self.outputs
            .get(name)
            .copied()
            .ok_or_else(|| CleanupError::UnknownNode(name.to_string()))
    }

    /// Start recording every output of `handle`.
    pub fn probe(&mut self, handle: ConnectionHandle) -> Result<()> {
        let conn = self.connection_mut(handle)?;
        conn.probe.get_or_insert_with(Vec::new);
        Ok(())
    }

    /// Advance by `dt`, sampling every source and evaluating every connection.
    ///
    /// Either every output is updated or, on error, none is and time does
    /// not advance.
    pub fn step(&mut self, dt: f64) -> Result<()> {
        let t = self.time + dt;

        let mut sampled = Vec::with_capacity(self.sources.len());
        for node in self.sources.iter_mut() {
            let v = node.signal.sample(t)?;
            if v.dimensions() != node.value.dimensions() {
                return Err(CleanupError::DimensionMismatch {
                    expected: node.value.dimensions(),
                    got: v.dimensions(),
                });
            }
            sampled.push(v);
        }

        let outputs: Vec<Vec<f64>> = self
            .connections
            .iter()
            .map(|c| c.memory.evaluate(sampled[c.source].data()))
            .collect::<Result<_>>()?;

        for (node, v) in self.sources.iter_mut().zip(sampled) {
            node.value = v;
        }
        for (conn, out) in self.connections.iter_mut().zip(outputs) {
            if let Some(probe) = conn.probe.as_mut() {
                probe.push(ProbeSample {
                    t,
                    value: out.clone(),
                });
            }
            conn.output = Some(out);
        }

        self.time = t;
        trace!(network = %self.name, t, "stepped");
        Ok(())
    }

    /// Step until `duration` more seconds have elapsed. Returns the step count.
    pub fn run(&mut self, duration: f64, dt: f64) -> Result<usize> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(CleanupError::InvalidConfig(format!(
                "dt must be positive, got {}",
                dt
            )));
        }
        if !(duration >= 0.0) || !duration.is_finite() {
            return Err(CleanupError::InvalidConfig(format!(
                "duration must be finite and non-negative, got {}",
                duration
            )));
        }
        let steps = (duration / dt).round() as usize;
        for _ in 0..steps {
            self.step(dt)?;
        }
        Ok(steps)
    }

    /// Latest output of a connection; `None` before the first step.
    pub fn output(&self, handle: ConnectionHandle) -> Option<&[f64]> {
        self.connections
            .get(handle.0)
            .and_then(|c| c.output.as_deref())
    }

    /// Recorded samples of a probed connection.
    pub fn probe_data(&self, handle: ConnectionHandle) -> Option<&[ProbeSample]> {
        self.connections
            .get(handle.0)
            .and_then(|c| c.probe.as_deref())
    }

    /// Latest sampled value of a source.
    pub fn value(&self, node: NodeId) -> Option<&Vector> {
        self.sources.get(node.0).map(|n| &n.value)
    }

    fn connection_mut(&mut self, handle: ConnectionHandle) -> Result<&mut Connection> {
        self.connections
            .get_mut(handle.0)
            .ok_or_else(|| CleanupError::UnknownNode(format!("connection #{}", handle.0)))
    }
}

/// Wire a raw dot-product read-out of `reference_set` onto `source`.
///
/// The output port is named after the referenced symbols, e.g. `cleanup A`.
pub fn connect(
    network: &mut Network,
    source: NodeId,
    reference_set: ReferenceSet,
) -> Result<ConnectionHandle> {
    let name = format!("cleanup {}", reference_set.names().join(" "));
    let memory = CleanupMemory::new(&name, reference_set).with_normalization(Normalization::Raw);
    network.connect(source, memory)
}
