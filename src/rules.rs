//! Symbolic routing rules as an explicit transition table.
//!
//! Each [`Rule`] pairs a [`Condition`] (a buffer resembling a symbol) with an
//! [`Action`] (write a symbol, or copy one buffer into another). Utilities
//! are dot products read out through [`ReferenceSet`]s; the winner is a
//! plain argmax over those utilities.
//!
//! ```rust
//! use spa_cleanup::kernel::Vocabulary;
//! use spa_cleanup::rules::{Buffers, RuleTable};
//!
//! let vocab = Vocabulary::with_symbols(64, 0, &["A", "B", "C"]).unwrap();
//! let table = RuleTable::cycle("state", &["A", "B", "C"]);
//! let rules = table.compile(&vocab).unwrap();
//!
//! let mut buffers = Buffers::new(64, &["state"]);
//! buffers.set("state", vocab.get("A").unwrap().clone()).unwrap();
//! let fired = rules.step(&mut buffers).unwrap().unwrap();
//! assert_eq!(fired.name, "A");
//! assert_eq!(buffers.get("state").unwrap(), vocab.get("B").unwrap());
//! ```

use crate::error::{CleanupError, Result};
use crate::kernel::{SymbolLookup, Vector};
use crate::memory::ReferenceSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Utility a rule must exceed before it is allowed to fire.
pub const DEFAULT_SELECTION_THRESHOLD: f64 = 0.3;

/// When a rule applies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Utility is the similarity between `buffer` and `symbol`.
    Matches { buffer: String, symbol: String },
    /// Fixed utility, independent of buffer contents.
    Constant { utility: f64 },
}

/// What a rule does when selected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Write the vocabulary vector for `symbol` into `buffer`.
    Set { buffer: String, symbol: String },
    /// Copy the contents of `from` into `to`.
    Copy { from: String, to: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub condition: Condition,
    pub action: Action,
}

impl Rule {
    pub fn new(name: &str, condition: Condition, action: Action) -> Self {
        Self {
            name: name.to_string(),
            condition,
            action,
        }
    }

    /// `buffer ≈ symbol  →  buffer = next`
    pub fn transition(buffer: &str, symbol: &str, next: &str) -> Self {
        Self::new(
            symbol,
            Condition::Matches {
                buffer: buffer.to_string(),
                symbol: symbol.to_string(),
            },
            Action::Set {
                buffer: buffer.to_string(),
                symbol: next.to_string(),
            },
        )
    }

    /// `from ≈ symbol  →  to = from`
    pub fn route(name: &str, from: &str, symbol: &str, to: &str) -> Self {
        Self::new(
            name,
            Condition::Matches {
                buffer: from.to_string(),
                symbol: symbol.to_string(),
            },
            Action::Copy {
                from: from.to_string(),
                to: to.to_string(),
            },
        )
    }
}

/// Ordered list of rules. Earlier rules win ties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `symbols[i] → symbols[i + 1]` on `buffer`, wrapping to the first.
    pub fn cycle<S: AsRef<str>>(buffer: &str, symbols: &[S]) -> Self {
        let mut table = Self::new();
        for (i, symbol) in symbols.iter().enumerate() {
            let next = &symbols[(i + 1) % symbols.len()];
            table.push(Rule::transition(buffer, symbol.as_ref(), next.as_ref()));
        }
        table
    }

    /// The routing table: a `start` rule copying `input` into `state` while
    /// `input` resembles `start_symbol`, followed by the cycle over `symbols`.
    pub fn sequence<S: AsRef<str>>(
        state: &str,
        input: &str,
        start_symbol: &str,
        symbols: &[S],
    ) -> Self {
        let mut table = Self::new().with_rule(Rule::route("start", input, start_symbol, state));
        table.rules.extend(Self::cycle(state, symbols).rules);
        table
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve every symbol against `vocabulary`.
    pub fn compile<L: SymbolLookup + ?Sized>(&self, vocabulary: &L) -> Result<CompiledRules> {
        let mut conditions = Vec::with_capacity(self.rules.len());
        let mut actions = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            conditions.push(match &rule.condition {
                Condition::Matches { buffer, symbol } => CompiledCondition::Matches {
                    buffer: buffer.clone(),
                    references: ReferenceSet::build(vocabulary, &[symbol])?,
                },
                Condition::Constant { utility } => CompiledCondition::Constant(*utility),
            });
            actions.push(match &rule.action {
                Action::Set { buffer, symbol } => CompiledAction::Set {
                    buffer: buffer.clone(),
                    value: vocabulary
                        .lookup(symbol)
                        .ok_or_else(|| CleanupError::UnknownSymbol {
                            name: symbol.clone(),
                        })?
                        .clone(),
                },
                Action::Copy { from, to } => CompiledAction::Copy {
                    from: from.clone(),
                    to: to.clone(),
                },
            });
        }

        debug!(rules = self.rules.len(), "compiled rule table");

        Ok(CompiledRules {
            names: self.rules.iter().map(|r| r.name.clone()).collect(),
            conditions,
            actions,
            threshold: DEFAULT_SELECTION_THRESHOLD,
        })
    }
}

#[derive(Clone, Debug)]
enum CompiledCondition {
    Matches {
        buffer: String,
        references: ReferenceSet,
    },
    Constant(f64),
}

#[derive(Clone, Debug)]
enum CompiledAction {
    Set { buffer: String, value: Vector },
    Copy { from: String, to: String },
}

/// The rule that won a selection round.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub name: String,
    pub utility: f64,
}

/// A rule table with its symbols resolved to vectors.
#[derive(Clone, Debug)]
pub struct CompiledRules {
    names: Vec<String>,
    conditions: Vec<CompiledCondition>,
    actions: Vec<CompiledAction>,
    threshold: f64,
}

impl CompiledRules {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Utility of every rule for the current buffer contents.
    pub fn utilities(&self, buffers: &Buffers) -> Result<Vec<f64>> {
        self.conditions
            .iter()
            .map(|c| match c {
                CompiledCondition::Matches { buffer, references } => {
                    Ok(references.evaluate(buffers.get(buffer)?.data())?[0])
                }
                CompiledCondition::Constant(u) => Ok(*u),
            })
            .collect()
    }

    /// Highest-utility rule above the threshold, if any.
    pub fn select(&self, buffers: &Buffers) -> Result<Option<Selection>> {
        let utilities = self.utilities(buffers)?;
        trace!(?utilities, "rule utilities");

        let mut best: Option<usize> = None;
        for (i, u) in utilities.iter().enumerate() {
            // Also skips NaN utilities.
            if !(*u > self.threshold) {
                continue;
            }
            if best.map_or(true, |b| *u > utilities[b]) {
                best = Some(i);
            }
        }

        Ok(best.map(|i| Selection {
            index: i,
            name: self.names[i].clone(),
            utility: utilities[i],
        }))
    }

    /// Perform the action of rule `index`.
    pub fn apply(&self, index: usize, buffers: &mut Buffers) -> Result<()> {
        let action = self
            .actions
            .get(index)
            .ok_or_else(|| CleanupError::UnknownNode(format!("rule #{}", index)))?;

        match action {
            CompiledAction::Set { buffer, value } => buffers.set(buffer, value.clone()),
            CompiledAction::Copy { from, to } => {
                let value = buffers.get(from)?.clone();
                buffers.set(to, value)
            }
        }
    }

    /// Select and apply in one go.
    pub fn step(&self, buffers: &mut Buffers) -> Result<Option<Selection>> {
        let selection = self.select(buffers)?;
        if let Some(sel) = &selection {
            self.apply(sel.index, buffers)?;
            debug!(rule = %sel.name, utility = sel.utility, "rule fired");
        }
        Ok(selection)
    }
}

/// Named working-memory slots, all of one dimensionality.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffers {
    dimensions: usize,
    values: BTreeMap<String, Vector>,
}

impl Buffers {
    /// Declare `names`, each starting at zero.
    pub fn new<S: AsRef<str>>(dimensions: usize, names: &[S]) -> Self {
        let values = names
            .iter()
            .map(|n| (n.as_ref().to_string(), Vector::zeros(dimensions)))
            .collect();
        Self { dimensions, values }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn get(&self, name: &str) -> Result<&Vector> {
        self.values
            .get(name)
            .ok_or_else(|| CleanupError::UnknownNode(name.to_string()))
    }

    pub fn set(&mut self, name: &str, value: Vector) -> Result<()> {
        if value.dimensions() != self.dimensions {
            return Err(CleanupError::DimensionMismatch {
                expected: self.dimensions,
                got: value.dimensions(),
            });
        }
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| CleanupError::UnknownNode(name.to_string()))?;
        *slot = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Vocabulary;

    const SEQUENCE: [&str; 5] = ["A", "B", "C", "D", "E"];

    fn vocab() -> Vocabulary {
        Vocabulary::with_symbols(128, 1, &["A", "B", "C", "D", "E", "LETTER"]).unwrap()
    }

    fn routing_table() -> RuleTable {
        RuleTable::sequence("state", "vision", "LETTER", &SEQUENCE)
    }

    #[test]
    fn test_cycle_wraps() {
        let table = RuleTable::cycle("state", &SEQUENCE);
        assert_eq!(table.len(), 5);
        assert_eq!(
            table.rules()[4].action,
            Action::Set {
                buffer: "state".to_string(),
                symbol: "A".to_string()
            }
        );
    }

    #[test]
    fn test_sequence_table_layout() {
        let table = routing_table();
        assert_eq!(table.len(), 6);
        assert_eq!(
            table.rules()[0],
            Rule::route("start", "vision", "LETTER", "state")
        );
        assert_eq!(&table.rules()[1..], RuleTable::cycle("state", &SEQUENCE).rules());
    }

    #[test]
    fn test_nan_utility_never_fires() {
        let vocab = vocab();
        let set = |symbol: &str| Action::Set {
            buffer: "state".to_string(),
            symbol: symbol.to_string(),
        };
        let table = RuleTable::new()
            .with_rule(Rule::new(
                "broken",
                Condition::Constant { utility: f64::NAN },
                set("A"),
            ))
            .with_rule(Rule::new(
                "fallback",
                Condition::Constant { utility: 0.5 },
                set("B"),
            ));
        let rules = table.compile(&vocab).unwrap();
        let buffers = Buffers::new(128, &["state"]);
        assert_eq!(rules.select(&buffers).unwrap().unwrap().name, "fallback");

        let only_nan = RuleTable::new()
            .with_rule(Rule::new(
                "broken",
                Condition::Constant { utility: f64::NAN },
                set("A"),
            ))
            .compile(&vocab)
            .unwrap();
        assert_eq!(only_nan.select(&buffers).unwrap(), None);
    }

    #[test]
    fn test_sequence_runs_around() {
        let vocab = vocab();
        let rules = RuleTable::cycle("state", &SEQUENCE).compile(&vocab).unwrap();
        let mut buffers = Buffers::new(128, &["state"]);
        buffers.set("state", vocab.get("A").unwrap().clone()).unwrap();

        let mut fired = Vec::new();
        for _ in 0..6 {
            fired.push(rules.step(&mut buffers).unwrap().unwrap().name);
        }
        assert_eq!(fired, vec!["A", "B", "C", "D", "E", "A"]);
        assert_eq!(buffers.get("state").unwrap(), vocab.get("B").unwrap());
    }

    #[test]
    fn test_start_rule_routes_vision() {
        let vocab = vocab();
        let rules = routing_table().compile(&vocab).unwrap();
        let mut buffers = Buffers::new(128, &["state", "vision"]);
        buffers
            .set("vision", vocab.parse("0.8*LETTER+D").unwrap())
            .unwrap();

        let sel = rules.step(&mut buffers).unwrap().unwrap();
        assert_eq!(sel.name, "start");
        assert_eq!(buffers.get("state").unwrap(), buffers.get("vision").unwrap());

        // state now carries D, so the D rule comes next once vision clears.
        buffers.set("vision", Vector::zeros(128)).unwrap();
        let sel = rules.step(&mut buffers).unwrap().unwrap();
        assert_eq!(sel.name, "D");
    }

    #[test]
    fn test_nothing_fires_on_empty_buffers() {
        let rules = routing_table().compile(&vocab()).unwrap();
        let mut buffers = Buffers::new(128, &["state", "vision"]);
        assert_eq!(rules.step(&mut buffers).unwrap(), None);
    }

    #[test]
    fn test_constant_condition() {
        let vocab = vocab();
        let table = RuleTable::new().with_rule(Rule::new(
            "default",
            Condition::Constant { utility: 0.5 },
            Action::Set {
                buffer: "state".to_string(),
                symbol: "E".to_string(),
            },
        ));
        let rules = table.compile(&vocab).unwrap();
        let mut buffers = Buffers::new(128, &["state"]);
        assert_eq!(rules.step(&mut buffers).unwrap().unwrap().name, "default");
        assert_eq!(buffers.get("state").unwrap(), vocab.get("E").unwrap());
    }

    #[test]
    fn test_compile_unknown_symbol() {
        let table = RuleTable::cycle("state", &["A", "Z"]);
        assert!(matches!(
            table.compile(&vocab()),
            Err(CleanupError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn test_unknown_buffer() {
        let rules = RuleTable::cycle("state", &SEQUENCE).compile(&vocab()).unwrap();
        let buffers = Buffers::new(128, &["vision"]);
        assert!(matches!(
            rules.utilities(&buffers),
            Err(CleanupError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_rule_table_serde() {
        let table = routing_table();
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains(r#""kind":"copy""#));
        let back: RuleTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
