use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::module::ModuleOutcome;
use crate::terraform::Outputs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Ansible result object
    #[default]
    Json,
    /// Human-readable table of outputs
    Table,
}

#[derive(Tabled)]
struct OutputRow {
    #[tabled(rename = "OUTPUT")]
    name: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

pub fn render(format: OutputFormat, outcome: &ModuleOutcome) -> String {
    match (format, outcome) {
        (OutputFormat::Table, ModuleOutcome::Success { outputs, .. }) => render_table(outputs),
        (OutputFormat::Table, ModuleOutcome::Failure { msg }) => format!("error: {}", msg),
        (OutputFormat::Json, _) => outcome.to_json().to_string(),
    }
}

pub fn render_table(outputs: &Outputs) -> String {
    let rows = outputs.iter().map(|(name, value)| OutputRow {
        name: name.clone(),
        // NOTE: Strings print bare, everything else as compact JSON
        value: match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    });

    Table::new(rows).with(Style::rounded()).to_string()
}
