use serde::{Deserialize, Serialize};

/// User-facing visualizer settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizerSettings {
    pub dark_mode: bool,
    /// Re-parse on every text edit
    pub auto_layout: bool,
    pub show_table_columns: bool,
    pub node_spacing: u32,
    pub theme: String,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            auto_layout: true,
            show_table_columns: true,
            node_spacing: 150,
            theme: "default".to_string(),
        }
    }
}

impl VisualizerSettings {
    /// Shallow merge: every key present in the patch overrides the current value
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(dark_mode) = patch.dark_mode {
            self.dark_mode = dark_mode;
        }
        if let Some(auto_layout) = patch.auto_layout {
            self.auto_layout = auto_layout;
        }
        if let Some(show_table_columns) = patch.show_table_columns {
            self.show_table_columns = show_table_columns;
        }
        if let Some(node_spacing) = patch.node_spacing {
            self.node_spacing = node_spacing;
        }
        if let Some(theme) = &patch.theme {
            self.theme = theme.clone();
        }
    }

    pub fn merged(mut self, patch: &SettingsPatch) -> Self {
        self.apply(patch);
        self
    }
}

/// Partial settings update
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_layout: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_table_columns: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_spacing: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl SettingsPatch {
    pub fn dark_mode(mut self, value: bool) -> Self {
        self.dark_mode = Some(value);
        self
    }

    pub fn auto_layout(mut self, value: bool) -> Self {
        self.auto_layout = Some(value);
        self
    }

    pub fn show_table_columns(mut self, value: bool) -> Self {
        self.show_table_columns = Some(value);
        self
    }

    pub fn node_spacing(mut self, value: u32) -> Self {
        self.node_spacing = Some(value);
        self
    }

    pub fn theme(mut self, value: impl Into<String>) -> Self {
        self.theme = Some(value.into());
        self
    }

    /// True when the patch explicitly switches auto layout on
    pub fn enables_auto_layout(&self) -> bool {
        self.auto_layout == Some(true)
    }
}
