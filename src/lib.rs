//! # fieldmap
//!
//! Editor core for field-mapping XML files.
//!
//! A mapping file describes how source fields feed destination fields: pass
//! through, value tables, rule-derived values and so on. This crate reads such
//! a file into a typed model, applies edits to it and writes it back, patching
//! the original document so that anything the model does not own survives.
//!
//! ## Features
//!
//! - Strict, limit-checked parsing of mapping documents
//! - Typed entries: direct and conditional value tables, derived condition sets, tickets
//! - Atomic edit operations with change notifications
//! - In-place patching of the original document and pretty-printed output
//! - FIX tag dictionary and a JSON diff with exclusions
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldmap::{EditorConfig, EntryField, MappingSession};
//!
//! let mut session = MappingSession::from_xml(&xml, EditorConfig::default())?;
//! let index = session.add_entry();
//! session.set_field(index, EntryField::FieldName, "OrderQty")?;
//! session.set_field(index, EntryField::MappingType, "PASSED_THROUGH")?;
//! session.set_field(index, EntryField::Source, "38")?;
//! let xml = session.export()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod documents;

// Mapping model and codec
pub mod model;
pub mod parser;
pub mod codec;

// Editing
pub mod config;
pub mod session;

// Companion tools
pub mod fix_fields;
pub mod json_diff;

// Re-exports for convenience
pub use codec::XmlCodec;
pub use config::{EditorConfig, OrderPreference};
pub use error::{Error, ParseError, Result};
pub use limits::Limits;
pub use model::{EntryField, MappingEntry, MappingType};
pub use parser::parse;
pub use session::{ChangeEvent, ChangeSink, MappingSession};

/// Version of the fieldmap library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
