//! Signal sources: anything that produces a vector each simulation step.

use crate::error::{CleanupError, Result};
use crate::kernel::Vector;
use crate::rules::{Buffers, CompiledRules};
use tracing::debug;

/// Slack when comparing accumulated simulation times.
const TIME_TOLERANCE: f64 = 1e-9;

/// A time-varying vector source.
pub trait Signal: Send {
    /// Length of every vector this signal produces.
    fn dimensions(&self) -> usize;

    /// Value at simulation time `t` (seconds).
    fn sample(&mut self, t: f64) -> Result<Vector>;
}

/// Always the same vector.
#[derive(Clone, Debug)]
pub struct Constant {
    value: Vector,
}

impl Constant {
    pub fn new(value: Vector) -> Self {
        Self { value }
    }
}

impl Signal for Constant {
    fn dimensions(&self) -> usize {
        self.value.dimensions()
    }

    fn sample(&mut self, _t: f64) -> Result<Vector> {
        Ok(self.value.clone())
    }
}

/// A vector presented during `[start, end)`, zeros otherwise.
#[derive(Clone, Debug)]
pub struct Timed {
    value: Vector,
    start: f64,
    end: f64,
}

impl Timed {
    /// Present `value` for the first `duration` seconds.
    pub fn new(value: Vector, duration: f64) -> Self {
        Self::window(value, 0.0, duration)
    }

    pub fn window(value: Vector, start: f64, end: f64) -> Self {
        Self { value, start, end }
    }
}

impl Signal for Timed {
    fn dimensions(&self) -> usize {
        self.value.dimensions()
    }

    fn sample(&mut self, t: f64) -> Result<Vector> {
        if t >= self.start && t < self.end {
            Ok(self.value.clone())
        } else {
            Ok(Vector::zeros(self.value.dimensions()))
        }
    }
}

/// Wraps a closure `t -> vector`.
pub struct FnSignal<F> {
    dimensions: usize,
    f: F,
}

impl<F> FnSignal<F>
where
    F: FnMut(f64) -> Vector + Send,
{
    pub fn new(dimensions: usize, f: F) -> Self {
        Self { dimensions, f }
    }
}

impl<F> Signal for FnSignal<F>
where
    F: FnMut(f64) -> Vector + Send,
{
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn sample(&mut self, t: f64) -> Result<Vector> {
        let v = (self.f)(t);
        if v.dimensions() != self.dimensions {
            return Err(CleanupError::DimensionMismatch {
                expected: self.dimensions,
                got: v.dimensions(),
            });
        }
        Ok(v)
    }
}

/// A buffer driven by a rule table.
///
/// Each sample copies the input signals into their buffers, fires the
/// winning rule at most once per `dwell` seconds and reports one buffer.
pub struct Sequencer {
    rules: CompiledRules,
    buffers: Buffers,
    inputs: Vec<(String, Box<dyn Signal>)>,
    output: String,
    dwell: f64,
    last_fired: Option<f64>,
}

impl Sequencer {
    pub fn new(rules: CompiledRules, buffers: Buffers, output: &str, dwell: f64) -> Result<Self> {
        buffers.get(output)?;
        Ok(Self {
            rules,
            buffers,
            inputs: Vec::new(),
            output: output.to_string(),
            dwell,
            last_fired: None,
        })
    }

    /// Feed `signal` into `buffer` on every sample.
    pub fn with_input(mut self, buffer: &str, signal: Box<dyn Signal>) -> Result<Self> {
        self.buffers.get(buffer)?;
        if signal.dimensions() != self.buffers.dimensions() {
            return Err(CleanupError::DimensionMismatch {
                expected: self.buffers.dimensions(),
                got: signal.dimensions(),
            });
        }
        self.inputs.push((buffer.to_string(), signal));
        Ok(self)
    }

    pub fn buffers(&self) -> &Buffers {
        &self.buffers
    }
}

impl Signal for Sequencer {
    fn dimensions(&self) -> usize {
        self.buffers.dimensions()
    }

    fn sample(&mut self, t: f64) -> Result<Vector> {
        for (buffer, signal) in self.inputs.iter_mut() {
            let v = signal.sample(t)?;
            self.buffers.set(buffer, v)?;
        }

        let due = self
            .last_fired
            .map_or(true, |last| t - last >= self.dwell - TIME_TOLERANCE);
        if due {
            if let Some(sel) = self.rules.step(&mut self.buffers)? {
                debug!(t, rule = %sel.name, "sequencer transition");
                self.last_fired = Some(t);
            }
        }

        Ok(self.buffers.get(&self.output)?.clone())
    }
}
