use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Flattened outputs: output name to its value.
pub type Outputs = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid state JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state has no 'modules' field")]
    MissingModules,

    #[error("output '{name}' has no 'value' field")]
    MissingValue { name: String },
}

/// Terraform remote state parser.
///
/// Understands the legacy layout, where outputs live under `modules[].outputs`,
/// and the format version 4 layout with a single top-level `outputs` map.
#[derive(Debug, Clone, PartialEq)]
pub struct StateDocument {
    pub modules: Vec<StateModule>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StateModule {
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub outputs: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawState {
    #[serde(default)]
    version: Option<u64>,
    modules: Option<Vec<StateModule>>,
    outputs: Option<BTreeMap<String, serde_json::Value>>,
}

impl StateDocument {
    pub fn parse(text: &str) -> Result<Self, StateError> {
        let raw: RawState = serde_json::from_str(text)?;

        let modules = match (raw.modules, raw.outputs) {
            (Some(modules), _) => modules,
            (None, Some(outputs)) => {
                tracing::debug!(version = ?raw.version, "state uses top-level outputs");
                vec![StateModule {
                    path: vec!["root".to_string()],
                    outputs,
                }]
            }
            (None, None) => return Err(StateError::MissingModules),
        };

        Ok(Self { modules })
    }

    /// Merges every module's outputs in order and reduces each entry to its
    /// `value`. A later module replaces an earlier one's output of the same name.
    pub fn flatten(&self) -> Result<Outputs, StateError> {
        let mut merged: BTreeMap<&str, &serde_json::Value> = BTreeMap::new();
        for module in &self.modules {
            for (name, entry) in &module.outputs {
                merged.insert(name.as_str(), entry);
            }
        }

        merged
            .into_iter()
            .map(|(name, entry)| {
                entry
                    .get("value")
                    .cloned()
                    .map(|value| (name.to_string(), value))
                    .ok_or_else(|| StateError::MissingValue {
                        name: name.to_string(),
                    })
            })
            .collect()
    }
}
