//! Convenience wrapper that assembles a vocabulary, a rule-driven state
//! buffer, a stimulus and a probed clean-up memory from a [`ModelConfig`].
//!
//! For full control, build the pieces from [`kernel`](crate::kernel),
//! [`memory`](crate::memory), [`rules`](crate::rules) and
//! [`network`](crate::network) directly.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::kernel::{Vector, Vocabulary};
use crate::memory::{CleanupMemory, Recall, ReferenceSet};
use crate::network::{ConnectionHandle, Network, NodeId, ProbeView, Sequencer, Timed};
use crate::rules::{Buffers, RuleTable};
use tracing::info;

/// Similarity a state must reach to be reported by [`Model::current_state`].
pub const STATE_RECALL_THRESHOLD: f64 = 0.5;

/// The routing model: a sequenced state buffer watched by a clean-up memory.
///
/// # Example
///
/// ```rust
/// use spa_cleanup::config::ModelConfig;
/// use spa_cleanup::highlevel::Model;
///
/// let config = ModelConfig {
///     dimensions: 128,
///     ..ModelConfig::default()
/// };
/// let mut model = Model::from_config(&config).unwrap();
/// model.run(0.2).unwrap();
///
/// let trace = model.cleanup_trace();
/// assert_eq!(trace.len(), 200);
/// ```
pub struct Model {
    config: ModelConfig,
    vocabulary: Vocabulary,
    network: Network,
    state: NodeId,
    vision: NodeId,
    cleanup: ConnectionHandle,
    sequence_memory: CleanupMemory,
}

impl Model {
    /// Build the model described by `config`.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        config.validate()?;

        let mut vocabulary = Vocabulary::with_seed(config.dimensions, config.seed)
            .with_max_similarity(config.max_similarity);
        vocabulary.add_all(&config.symbols)?;

        let stimulus = vocabulary.parse(&config.input.expression)?;

        let table = RuleTable::sequence(
            &config.state_buffer,
            &config.input.buffer,
            &config.start_symbol,
            &config.sequence,
        );
        let rules = table.compile(&vocabulary)?;

        let buffers = Buffers::new(
            config.dimensions,
            &[config.state_buffer.as_str(), config.input.buffer.as_str()],
        );
        let sequencer = Sequencer::new(rules, buffers, &config.state_buffer, config.dwell)?
            .with_input(
                &config.input.buffer,
                Box::new(Timed::new(stimulus.clone(), config.input.duration)),
            )?;

        let mut network = Network::new("routing");
        let state = network.add_source(&config.state_buffer, Box::new(sequencer))?;
        let vision = network.add_source(
            &config.input.buffer,
            Box::new(Timed::new(stimulus, config.input.duration)),
        )?;

        let references = ReferenceSet::build(&vocabulary, &config.cleanup.symbols)?;
        let memory = CleanupMemory::new(&config.cleanup.name, references)
            .with_normalization(config.cleanup.normalization);
        let cleanup = network.connect(state, memory)?;
        network.probe(cleanup)?;

        let sequence_memory = CleanupMemory::new(
            "state recall",
            ReferenceSet::build(&vocabulary, &config.symbols)?,
        );

        info!(
            dimensions = config.dimensions,
            symbols = config.symbols.len(),
            rules = table.len(),
            port = %config.cleanup.name,
            "built routing model"
        );

        Ok(Self {
            config: config.clone(),
            vocabulary,
            network,
            state,
            vision,
            cleanup,
            sequence_memory,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn cleanup_port(&self) -> ConnectionHandle {
        self.cleanup
    }

    /// Advance one `dt`.
    pub fn step(&mut self) -> Result<()> {
        self.network.step(self.config.dt)
    }

    /// Advance by `duration` seconds. Returns the number of steps taken.
    pub fn run(&mut self, duration: f64) -> Result<usize> {
        self.network.run(duration, self.config.dt)
    }

    /// Simulated time in seconds.
    pub fn time(&self) -> f64 {
        self.network.time()
    }

    /// Current state buffer contents.
    pub fn state(&self) -> Option<&Vector> {
        self.network.value(self.state)
    }

    /// Current stimulus on the input buffer.
    pub fn vision(&self) -> Option<&Vector> {
        self.network.value(self.vision)
    }

    /// Latest clean-up output.
    pub fn cleanup_output(&self) -> Option<&[f64]> {
        self.network.output(self.cleanup)
    }

    /// Every clean-up output recorded so far.
    pub fn cleanup_trace(&self) -> ProbeView<'_> {
        ProbeView::new(self.network.probe_data(self.cleanup).unwrap_or(&[]))
    }

    /// Vocabulary symbol the state buffer currently holds, if any is clear.
    pub fn current_state(&self) -> Result<Option<Recall>> {
        let state = match self.state() {
            Some(v) => v,
            None => return Ok(None),
        };
        let recall = self.sequence_memory.recall(state.data())?;
        if recall.score < STATE_RECALL_THRESHOLD {
            return Ok(None);
        }
        Ok(Some(recall))
    }

    /// Human-readable summary of the state buffer, e.g. `1.00A;0.08D`.
    pub fn state_text(&self, threshold: f64) -> Result<String> {
        match self.state() {
            Some(v) => self.vocabulary.text(v, threshold),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Normalization;

    fn config() -> ModelConfig {
        ModelConfig {
            dimensions: 128,
            seed: 3,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_sequence_visits_states_in_order() {
        let mut model = Model::from_config(&config()).unwrap();

        let mut visited: Vec<String> = Vec::new();
        for _ in 0..400 {
            model.step().unwrap();
            if let Some(recall) = model.current_state().unwrap() {
                if visited.last() != Some(&recall.name) {
                    visited.push(recall.name);
                }
            }
        }

        // vision (0.8*LETTER+D) is routed into state first, which reads as D.
        assert_eq!(&visited[..6], &["D", "E", "A", "B", "C", "D"]);
    }

    #[test]
    fn test_transitions_keep_dwell_period() {
        let mut model = Model::from_config(&config()).unwrap();

        let mut current: Option<String> = None;
        let mut changes = Vec::new();
        for step in 1..=800 {
            model.step().unwrap();
            let name = model.current_state().unwrap().map(|r| r.name);
            if name != current {
                changes.push(step);
                current = name;
            }
        }

        let gaps: Vec<usize> = changes.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(changes.len(), 16, "{:?}", changes);
        assert!(gaps.iter().all(|&g| g == 50), "{:?}", gaps);
    }

    #[test]
    fn test_run_rejects_bad_duration() {
        let mut model = Model::from_config(&config()).unwrap();
        assert!(model.run(-0.1).is_err());
        assert!(model.run(f64::NAN).is_err());
        assert!(model.run(f64::INFINITY).is_err());
        assert_eq!(model.time(), 0.0);
    }

    #[test]
    fn test_cleanup_tracks_a() {
        let mut model = Model::from_config(&config()).unwrap();
        let steps = model.run(0.5).unwrap();
        assert_eq!(steps, 500);

        let trace = model.cleanup_trace();
        assert_eq!(trace.len(), 500);
        assert!(trace.max(0) > 0.95, "max {}", trace.max(0));
        assert!(trace.min_abs(0) < 0.2, "min {}", trace.min_abs(0));
    }

    #[test]
    fn test_cosine_output_bounded() {
        let mut cfg = config();
        cfg.cleanup.normalization = Normalization::Cosine;
        let mut model = Model::from_config(&cfg).unwrap();
        model.run(0.3).unwrap();
        for sample in model.cleanup_trace().samples() {
            assert!(sample.value[0].abs() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_vision_turns_off() {
        let mut cfg = config();
        cfg.input.duration = 0.01;
        let mut model = Model::from_config(&cfg).unwrap();
        model.run(0.005).unwrap();
        assert!(model.vision().unwrap().norm() > 0.5);
        model.run(0.01).unwrap();
        assert_eq!(model.vision().unwrap().norm(), 0.0);
    }

    #[test]
    fn test_state_text() {
        let mut model = Model::from_config(&config()).unwrap();
        model.step().unwrap();
        let text = model.state_text(0.5).unwrap();
        assert!(text.contains('D'), "{}", text);
        assert!(text.contains("LETTER"), "{}", text);
    }

    #[test]
    fn test_bad_expression_rejected() {
        let mut cfg = config();
        cfg.input.expression = "0.8*WORD".to_string();
        assert!(Model::from_config(&cfg).is_err());
    }
}
