//! Visualization session state
//!
//! `VisualizerStore` owns the query text, the last structural graph, settings
//! and UI flags, and decides when the extractor runs. Every operation is
//! synchronous and leaves `parsed_query` and `error` mutually exclusive.

use crate::core::external_config::{ExternalConfig, decode_message};
use crate::core::extractor::QueryExtractor;
use crate::core::persistence::{self, Persistence};
use crate::core::query_graph::ParsedQuery;
use crate::core::settings::{SettingsPatch, VisualizerSettings};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_QUERY: &str = "SELECT u.name, u.email, COUNT(o.id) AS order_count
FROM users u
LEFT JOIN orders o ON u.id = o.user_id
WHERE u.active = 1 AND o.total > 100
GROUP BY u.name, u.email";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizerState {
    pub query: String,
    pub parsed_query: Option<ParsedQuery>,
    pub settings: VisualizerSettings,
    pub show_settings: bool,
    pub is_editing: bool,
    pub error: Option<String>,
    pub selected_node: Option<String>,
}

impl Default for VisualizerState {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            parsed_query: None,
            settings: VisualizerSettings::default(),
            show_settings: false,
            is_editing: false,
            error: None,
            selected_node: None,
        }
    }
}

pub struct VisualizerStore {
    state: VisualizerState,
    extractor: QueryExtractor,
    persistence: Arc<dyn Persistence>,
}

impl VisualizerStore {
    /// Create the store, restoring persisted query and settings, and parse once
    pub fn new(extractor: QueryExtractor, persistence: Arc<dyn Persistence>) -> Self {
        let defaults = VisualizerState::default();
        let state = VisualizerState {
            query: persistence::load_query(persistence.as_ref()).unwrap_or(defaults.query),
            settings: persistence::load_settings(persistence.as_ref(), defaults.settings),
            ..VisualizerState::default()
        };

        let mut store = Self {
            state,
            extractor,
            persistence,
        };
        store.parse_query();
        store
    }

    pub fn state(&self) -> &VisualizerState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.state.query
    }

    pub fn parsed_query(&self) -> Option<&ParsedQuery> {
        self.state.parsed_query.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn settings(&self) -> &VisualizerSettings {
        &self.state.settings
    }

    /// Replace the query text; re-parses only when auto layout is on
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.replace_query(text.into());
        if self.state.settings.auto_layout {
            self.parse_query();
        }
    }

    fn replace_query(&mut self, text: String) {
        self.state.query = text;
        self.state.error = None;
        persistence::save_query(self.persistence.as_ref(), &self.state.query);
    }

    pub fn parse_query(&mut self) {
        if self.state.query.trim().is_empty() {
            self.state.parsed_query = None;
            self.state.error = None;
            return;
        }

        match self.extractor.parse(&self.state.query) {
            Ok(parsed) => {
                self.state.parsed_query = Some(parsed);
                self.state.error = None;
            }
            Err(e) => {
                tracing::debug!("Query rejected: {}", e);
                self.state.parsed_query = None;
                self.state.error = Some(e.to_string());
            }
        }
    }

    /// Merge a partial settings update; switching auto layout on re-parses
    pub fn set_settings(&mut self, patch: &SettingsPatch) {
        self.state.settings.apply(patch);
        persistence::save_settings(self.persistence.as_ref(), &self.state.settings);
        if patch.enables_auto_layout() {
            self.parse_query();
        }
    }

    pub fn set_show_settings(&mut self, show: bool) {
        self.state.show_settings = show;
    }

    pub fn set_is_editing(&mut self, editing: bool) {
        self.state.is_editing = editing;
    }

    pub fn set_selected_node(&mut self, node: Option<String>) {
        self.state.selected_node = node;
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    /// Apply host-supplied configuration.
    ///
    /// An initial query always re-parses, regardless of auto layout.
    pub fn handle_external_config(&mut self, config: ExternalConfig) {
        if let Some(query) = config.initial_query {
            self.replace_query(query);
            self.parse_query();
        }
        if let Some(patch) = config.settings {
            self.set_settings(&patch);
        }
    }

    /// Decode and apply a raw channel message; foreign or malformed messages are ignored
    pub fn handle_external_message(&mut self, message: &serde_json::Value) {
        match decode_message(message) {
            Ok(Some(config)) => {
                tracing::info!("Applying external configuration");
                self.handle_external_config(config);
            }
            Ok(None) => tracing::debug!("Ignoring message with unrecognized type"),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    pub fn reset_to_defaults(&mut self) {
        self.state = VisualizerState::default();
        persistence::save_query(self.persistence.as_ref(), &self.state.query);
        persistence::save_settings(self.persistence.as_ref(), &self.state.settings);
        self.parse_query();
    }
}

impl std::fmt::Debug for VisualizerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualizerStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
