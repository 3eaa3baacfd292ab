//! Grid configuration.
//!
//! A [`GridConfig`] can be built in code or loaded from TOML or JSON:
//!
//! ```
//! use horizon_grid::{GridConfig, SelectionMode};
//!
//! let config = GridConfig::from_toml_str(r#"
//!     selection_mode = "multi"
//!     multi_sort = true
//! "#).unwrap();
//! assert_eq!(config.selection_mode, SelectionMode::Multi);
//! assert!(config.column_reordering_allowed);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Which selection model the grid uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Selection is disabled.
    None,
    /// At most one item is selected.
    #[default]
    Single,
    /// Any number of items can be selected.
    Multi,
}

/// What happens to the selection when the data is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPreservation {
    /// Keep every selected item.
    #[default]
    PreserveAll,
    /// Keep the selected items that still exist.
    PreserveExisting,
    /// Clear the selection.
    Discard,
}

/// Visibility of the multi-selection "select all" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectAllCheckbox {
    /// Visible for in-memory data only.
    #[default]
    Default,
    /// Always visible.
    Visible,
    /// Always hidden.
    Hidden,
}

/// Grid settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Selection model.
    pub selection_mode: SelectionMode,
    /// Selection behaviour on refresh.
    pub selection_preservation: SelectionPreservation,
    /// Whether the client may deselect the selected item (single selection).
    pub deselect_allowed: bool,
    /// Select-all checkbox visibility (multi selection).
    pub select_all_checkbox: SelectAllCheckbox,
    /// Whether more than one column can be sorted at a time.
    pub multi_sort: bool,
    /// Whether the client may reorder columns.
    pub column_reordering_allowed: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::default(),
            selection_preservation: SelectionPreservation::default(),
            deselect_allowed: true,
            select_all_checkbox: SelectAllCheckbox::default(),
            multi_sort: false,
            column_reordering_allowed: true,
        }
    }
}

impl GridConfig {
    /// Parse TOML.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Parse JSON.
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| GridError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_toml_str(&source)
        }
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GridError::invalid(e.to_string()))
    }
}
