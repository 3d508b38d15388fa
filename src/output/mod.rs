// Output module for drinv

pub mod diff;
pub mod errors;

pub use diff::*;
pub use errors::*;

use serde::{Deserialize, Serialize};

/// Output format for CLI reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text output with colors
    #[default]
    Text,
    /// Machine-readable JSON output
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = DrinvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(DrinvError::Config {
                message: format!("Unknown output format '{}' (expected text or json)", other),
                path: None,
            }),
        }
    }
}
