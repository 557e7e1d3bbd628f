//! Inbound configuration messages from an embedding page
//!
//! Messages are JSON objects tagged with `type`. Only
//! [`CONFIG_MESSAGE_TYPE`] is recognized; everything else is ignored.

use crate::core::settings::SettingsPatch;
use serde::{Deserialize, Serialize};

pub const CONFIG_MESSAGE_TYPE: &str = "sql-visualizer-config";

/// Query and settings supplied by the host
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsPatch>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExternalConfigError {
    #[error("Malformed configuration message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode a raw channel message.
///
/// Returns `Ok(None)` for messages addressed to someone else (non-objects,
/// or any other `type`), and an error when a config message has the wrong shape.
pub fn decode_message(message: &serde_json::Value) -> Result<Option<ExternalConfig>, ExternalConfigError> {
    let is_config = message
        .get("type")
        .and_then(|t| t.as_str())
        .is_some_and(|t| t == CONFIG_MESSAGE_TYPE);
    if !is_config {
        return Ok(None);
    }

    let config = ExternalConfig::deserialize(message)?;
    Ok(Some(config))
}
