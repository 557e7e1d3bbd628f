//! Visualizer context module for sharing the store across components
//!
//! Provides:
//! - VisualizerContext wrapping the store in a Leptos signal
//! - Tracked reads for renderer components
//! - Store operations routed through a single `update` path

use crate::core::{
    ExternalConfig, ParsedQuery, QueryDiagram, SettingsPatch, VisualizerSettings, VisualizerStore,
};
use leptos::prelude::*;

/// Reactive handle to the visualizer store
#[derive(Clone, Copy)]
pub struct VisualizerContext {
    pub store: RwSignal<VisualizerStore>,
}

impl VisualizerContext {
    pub fn new(store: VisualizerStore) -> Self {
        Self {
            store: RwSignal::new(store),
        }
    }

    pub fn query(&self) -> String {
        self.store.with(|s| s.query().to_string())
    }

    pub fn parsed_query(&self) -> Option<ParsedQuery> {
        self.store.with(|s| s.parsed_query().cloned())
    }

    pub fn error(&self) -> Option<String> {
        self.store.with(|s| s.error().map(str::to_string))
    }

    pub fn settings(&self) -> VisualizerSettings {
        self.store.with(|s| s.settings().clone())
    }

    pub fn selected_node(&self) -> Option<String> {
        self.store.with(|s| s.state().selected_node.clone())
    }

    pub fn show_settings(&self) -> bool {
        self.store.with(|s| s.state().show_settings)
    }

    pub fn is_editing(&self) -> bool {
        self.store.with(|s| s.state().is_editing)
    }

    /// Diagram for the current graph, `None` while there is no graph
    pub fn diagram(&self) -> Option<QueryDiagram> {
        self.store.with(|s| s.parsed_query().map(ParsedQuery::to_diagram))
    }

    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.store.update(|s| s.set_query(text));
    }

    pub fn parse_query(&self) {
        self.store.update(|s| s.parse_query());
    }

    pub fn set_settings(&self, patch: SettingsPatch) {
        self.store.update(|s| s.set_settings(&patch));
    }

    pub fn set_show_settings(&self, show: bool) {
        self.store.update(|s| s.set_show_settings(show));
    }

    pub fn set_is_editing(&self, editing: bool) {
        self.store.update(|s| s.set_is_editing(editing));
    }

    pub fn set_selected_node(&self, node: Option<String>) {
        self.store.update(|s| s.set_selected_node(node));
    }

    pub fn clear_error(&self) {
        self.store.update(|s| s.clear_error());
    }

    pub fn handle_external_config(&self, config: ExternalConfig) {
        self.store.update(|s| s.handle_external_config(config));
    }

    pub fn handle_external_message(&self, message: &serde_json::Value) {
        self.store.update(|s| s.handle_external_message(message));
    }

    pub fn reset_to_defaults(&self) {
        self.store.update(|s| s.reset_to_defaults());
    }
}

/// Provide visualizer context to the application
pub fn provide_visualizer_context(store: VisualizerStore) -> VisualizerContext {
    let ctx = VisualizerContext::new(store);

    // Forward configuration posted by the embedding page
    #[cfg(feature = "hydrate")]
    {
        Effect::new(move |_| {
            crate::ui::message_listener::listen_for_external_config(ctx);
        });
    }

    provide_context(ctx);

    ctx
}

/// Use visualizer context from anywhere in the component tree
pub fn use_visualizer_context() -> VisualizerContext {
    use_context::<VisualizerContext>().expect("VisualizerContext should be provided")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NoPersistence, QueryExtractor, SqlparserGrammar};
    use std::sync::Arc;

    fn context() -> VisualizerContext {
        VisualizerContext::new(VisualizerStore::new(
            QueryExtractor::new(Arc::new(SqlparserGrammar::default())),
            Arc::new(NoPersistence),
        ))
    }

    #[test]
    fn test_context_routes_updates_to_store() {
        let ctx = context();
        ctx.set_query("SELECT c.id FROM customers c");

        assert_eq!(ctx.query(), "SELECT c.id FROM customers c");
        assert_eq!(ctx.parsed_query().unwrap().tables[0].name, "customers");
        assert!(ctx.error().is_none());
        assert_eq!(ctx.diagram().unwrap().node_count(), 2);
    }

    #[test]
    fn test_context_error_and_clear() {
        let ctx = context();
        ctx.set_query("SELEC nothing");
        assert!(ctx.error().is_some());
        assert!(ctx.parsed_query().is_none());
        assert!(ctx.diagram().is_none());

        ctx.clear_error();
        assert!(ctx.error().is_none());
    }

    #[test]
    fn test_context_flags_and_settings() {
        let ctx = context();
        ctx.set_show_settings(true);
        ctx.set_is_editing(true);
        ctx.set_selected_node(Some("join-1".to_string()));
        ctx.set_settings(SettingsPatch::default().dark_mode(true));

        assert!(ctx.show_settings());
        assert!(ctx.is_editing());
        assert_eq!(ctx.selected_node().as_deref(), Some("join-1"));
        assert!(ctx.settings().dark_mode);

        ctx.reset_to_defaults();
        assert!(!ctx.show_settings());
        assert!(ctx.selected_node().is_none());
        assert!(!ctx.settings().dark_mode);
    }

    #[test]
    fn test_context_external_message() {
        let ctx = context();
        ctx.set_settings(SettingsPatch::default().auto_layout(false));
        ctx.handle_external_message(&serde_json::json!({
            "type": crate::core::CONFIG_MESSAGE_TYPE,
            "initialQuery": "SELECT 1"
        }));
        assert_eq!(ctx.query(), "SELECT 1");
        assert!(ctx.parsed_query().is_some());
    }
}
