//! Editor configuration
//!
//! Settings for one editing session: how entries are ordered on export, how
//! the output document looks and which input limits apply. A configuration
//! can be built in code with the `with_*` methods or read from JSON, where
//! missing keys take their default.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::limits::Limits;

/// Order of `field` elements in an exported document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPreference {
    /// Keep the original document order (new fields go last)
    #[default]
    #[serde(alias = "original")]
    Preserve,
    /// Sort fields by destination name
    Alphabetical,
}

/// Configuration of a mapping editing session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Field order on export
    pub order_preference: OrderPreference,
    /// File name offered for the exported document
    pub output_file_name: String,
    /// Root element name of newly created documents
    pub root_element: String,
    /// Spaces per nesting level in the output
    pub indent: usize,
    /// Write tickets in prefix / latest-first order
    pub sort_tickets: bool,
    /// Drop the document nodes of deleted entries on export
    pub prune_deleted: bool,
    /// Input limits
    pub limits: Limits,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            order_preference: OrderPreference::default(),
            output_file_name: "mapping.xml".to_string(),
            root_element: "mappings".to_string(),
            indent: 2,
            sort_tickets: true,
            prune_deleted: true,
            limits: Limits::default(),
        }
    }
}

impl EditorConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Set the export order
    pub fn with_order_preference(mut self, order: OrderPreference) -> Self {
        self.order_preference = order;
        self
    }

    /// Set the output file name
    pub fn with_output_file_name(mut self, name: impl Into<String>) -> Self {
        self.output_file_name = name.into();
        self
    }

    /// Set the root element name of new documents
    pub fn with_root_element(mut self, name: impl Into<String>) -> Self {
        self.root_element = name.into();
        self
    }

    /// Set the indentation width
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Enable or disable ticket sorting on output
    pub fn with_sort_tickets(mut self, sort: bool) -> Self {
        self.sort_tickets = sort;
        self
    }

    /// Enable or disable pruning of deleted entries
    pub fn with_prune_deleted(mut self, prune: bool) -> Self {
        self.prune_deleted = prune;
        self
    }

    /// Set the input limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
