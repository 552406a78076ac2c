//! Transition rules: which source states may move into a target state, per
//! dataset type.
//!
//! The table is configuration, looked up by `(target, type)`. Adding a
//! workflow for a new dataset type is a table edit.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::models::{DatasetType, State};

/// One rule of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Target state.
    pub label: State,
    #[serde(rename = "type")]
    pub dataset_type: DatasetType,
    pub allowed_source_states: Vec<State>,
}

impl Transition {
    pub fn new(label: State, dataset_type: DatasetType, allowed: &[State]) -> Self {
        Self {
            label,
            dataset_type,
            allowed_source_states: allowed.to_vec(),
        }
    }
}

const IN_PROGRESS: [State; 5] = [
    State::Created,
    State::Submitted,
    State::Completed,
    State::EditionConfirmed,
    State::Associated,
];

/// Rules for imported (filterable, cantabular, nomis) datasets.
fn imported_rules(dataset_type: DatasetType) -> Vec<Transition> {
    let publishable: &[State] = if dataset_type.is_cantabular() {
        &[State::EditionConfirmed, State::Associated, State::Published]
    } else {
        &[State::Associated, State::Published]
    };

    vec![
        Transition::new(State::Created, dataset_type, &[State::Created]),
        Transition::new(
            State::Submitted,
            dataset_type,
            &[State::Created, State::Submitted],
        ),
        Transition::new(
            State::Completed,
            dataset_type,
            &[State::Created, State::Submitted, State::Completed],
        ),
        Transition::new(
            State::EditionConfirmed,
            dataset_type,
            &[State::Completed, State::EditionConfirmed, State::Published],
        ),
        Transition::new(
            State::Associated,
            dataset_type,
            &[State::EditionConfirmed, State::Associated],
        ),
        Transition::new(State::Published, dataset_type, publishable),
        Transition::new(State::Detached, dataset_type, &IN_PROGRESS),
        Transition::new(State::Failed, dataset_type, &IN_PROGRESS),
    ]
}

/// Rules for static datasets, which have no import step.
fn static_rules() -> Vec<Transition> {
    let ty = DatasetType::Static;
    vec![
        Transition::new(State::Created, ty, &[State::Created]),
        Transition::new(State::Associated, ty, &[State::Created, State::Associated]),
        Transition::new(State::Published, ty, &[State::Associated, State::Published]),
        Transition::new(State::Detached, ty, &[State::Created, State::Associated]),
        Transition::new(State::Failed, ty, &[State::Created, State::Associated]),
    ]
}

/// Lookup table keyed by `(target state, dataset type)`.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rules: HashMap<(State, DatasetType), Vec<State>>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::default_table()
    }
}

impl TransitionTable {
    /// Build a table; two rules for the same `(label, type)` are rejected.
    pub fn new(transitions: impl IntoIterator<Item = Transition>) -> Result<Self> {
        let mut rules = HashMap::new();
        for transition in transitions {
            let key = (transition.label, transition.dataset_type);
            if rules
                .insert(key, transition.allowed_source_states)
                .is_some()
            {
                return Err(CatalogError::InvalidConfig(format!(
                    "duplicate transition rule for {} ({})",
                    key.0, key.1
                )));
            }
        }
        Ok(Self { rules })
    }

    /// The built-in workflow for every known dataset type.
    pub fn default_table() -> Self {
        let rules = DatasetType::ALL
            .into_iter()
            .flat_map(|dataset_type| {
                if dataset_type.is_static() {
                    static_rules()
                } else {
                    imported_rules(dataset_type)
                }
            })
            .map(|t| ((t.label, t.dataset_type), t.allowed_source_states))
            .collect();
        Self { rules }
    }

    /// Parse a YAML list of `{label, type, allowed_source_states}` rules.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let transitions: Vec<Transition> = serde_yaml::from_str(yaml)
            .map_err(|e| CatalogError::InvalidConfig(format!("transition table: {e}")))?;
        Self::new(transitions)
    }

    /// Allowed source states for entering `target` on a `dataset_type` version.
    pub fn allowed_sources(&self, target: State, dataset_type: DatasetType) -> Option<&[State]> {
        self.rules
            .get(&(target, dataset_type))
            .map(Vec::as_slice)
    }

    /// Fails with `StateTransitionNotAllowed` unless a rule for
    /// `(target, dataset_type)` exists and lists `current`.
    pub fn check(
        &self,
        current: Option<State>,
        target: State,
        dataset_type: DatasetType,
    ) -> Result<()> {
        let allowed = self
            .allowed_sources(target, dataset_type)
            .ok_or(CatalogError::StateTransitionNotAllowed)?;
        match current {
            Some(state) if allowed.contains(&state) => Ok(()),
            _ => Err(CatalogError::StateTransitionNotAllowed),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
