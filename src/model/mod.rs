//! Typed mapping model
//!
//! A mapping file is read into an ordered sequence of [`MappingEntry`], one per
//! destination field. The sub-structures that only make sense for some
//! mapping types live in their own modules.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod derived;
pub mod table;
pub mod tickets;

pub use derived::{Condition, ConditionSet, DerivedMapping, Operator, OutputFormat};
pub use table::{ConditionalBranch, DirectTable, MappedTable, TableRow};
pub use tickets::TicketList;

/// Strategy used to compute a destination field's value
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MappingType {
    /// Combined from several source fields
    AGGREGATED,
    /// Source value, or a default when absent
    DEFAULTED,
    /// Computed by condition sets
    DERIVED,
    /// Looked up from external data
    ENRICHED,
    /// Reformatted source value
    FORMATTED,
    /// Value-substitution table
    MAPPED,
    /// Copied from one source field
    PASSED_THROUGH,
    /// Not mapped
    #[default]
    NONE,
}

impl MappingType {
    /// Every mapping type, in the order offered to users
    pub const ALL: [MappingType; 8] = [
        MappingType::AGGREGATED,
        MappingType::DEFAULTED,
        MappingType::DERIVED,
        MappingType::ENRICHED,
        MappingType::FORMATTED,
        MappingType::MAPPED,
        MappingType::PASSED_THROUGH,
        MappingType::NONE,
    ];

    /// Textual form used in mapping files
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingType::AGGREGATED => "AGGREGATED",
            MappingType::DEFAULTED => "DEFAULTED",
            MappingType::DERIVED => "DERIVED",
            MappingType::ENRICHED => "ENRICHED",
            MappingType::FORMATTED => "FORMATTED",
            MappingType::MAPPED => "MAPPED",
            MappingType::PASSED_THROUGH => "PASSED_THROUGH",
            MappingType::NONE => "NONE",
        }
    }

    /// True for the types that read a single source field
    pub fn uses_source(&self) -> bool {
        matches!(self, MappingType::PASSED_THROUGH | MappingType::DEFAULTED)
    }
}

impl FromStr for MappingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(MappingType::NONE);
        }
        MappingType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::Value(format!("unknown mapping type '{}'", s)))
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar attribute of an entry addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryField {
    /// `fieldName`
    FieldName,
    /// `source`
    Source,
    /// `mappingType`
    MappingType,
    /// `notes`
    Notes,
    /// `tickets`, newline-joined
    Tickets,
    /// `status`
    Status,
}

impl FromStr for EntryField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fieldName" => Ok(EntryField::FieldName),
            "source" => Ok(EntryField::Source),
            "mappingType" => Ok(EntryField::MappingType),
            "notes" => Ok(EntryField::Notes),
            "tickets" => Ok(EntryField::Tickets),
            "status" => Ok(EntryField::Status),
            other => Err(Error::Value(format!("unknown entry field '{}'", other))),
        }
    }
}

/// One destination field configuration row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingEntry {
    /// Destination field name; the key used to find the entry in a document
    pub field_name: String,
    /// Mapping strategy
    pub mapping_type: MappingType,
    /// Source field, meaningful for PASSED_THROUGH and DEFAULTED
    pub source: String,
    /// Free-form notes
    pub notes: String,
    /// Review status as written in the file (e.g. `GOOD`)
    pub status: Option<String>,
    /// Associated issue-tracker tickets
    pub tickets: TicketList,
    /// Present iff the type is MAPPED
    pub mapped_data: Option<MappedTable>,
    /// Present iff the type is DERIVED
    pub derived_mapping: Option<DerivedMapping>,
}

impl MappingEntry {
    /// Create an entry with the given destination name and type
    pub fn new(field_name: impl Into<String>, mapping_type: MappingType) -> Self {
        let mut entry = Self {
            field_name: field_name.into(),
            ..Self::default()
        };
        entry.set_mapping_type(mapping_type);
        entry
    }

    /// Change the mapping type, resetting the data tied to the old type
    ///
    /// Setting the current type again changes nothing.
    pub fn set_mapping_type(&mut self, mapping_type: MappingType) {
        if self.mapping_type == mapping_type {
            return;
        }
        self.mapping_type = mapping_type;
        if !mapping_type.uses_source() {
            self.source.clear();
        }
        self.mapped_data = match mapping_type {
            MappingType::MAPPED => Some(MappedTable::direct()),
            _ => None,
        };
        self.derived_mapping = match mapping_type {
            MappingType::DERIVED => Some(DerivedMapping::default()),
            _ => None,
        };
    }

    /// Set a scalar attribute from its textual form
    pub fn set_field(&mut self, field: EntryField, value: &str) -> Result<()> {
        match field {
            EntryField::FieldName => self.field_name = value.to_string(),
            EntryField::Source => self.source = value.to_string(),
            EntryField::MappingType => self.set_mapping_type(value.parse()?),
            EntryField::Notes => self.notes = value.to_string(),
            EntryField::Tickets => self.tickets = TicketList::from_text(value),
            EntryField::Status => {
                let value = value.trim();
                self.status = (!value.is_empty()).then(|| value.to_string());
            }
        }
        Ok(())
    }

    /// Check that the entry can be written out
    pub fn validate(&self) -> Result<()> {
        if self.field_name.trim().is_empty() {
            return Err(Error::Serialization(
                "entry has an empty field name".to_string(),
            ));
        }
        self.check_structure()
    }

    /// Check the table and rule invariants, ignoring the field name
    pub fn check_structure(&self) -> Result<()> {
        let context = |e: Error| match e {
            Error::Serialization(msg) => {
                Error::Serialization(format!("field '{}': {}", self.field_name, msg))
            }
            other => other,
        };
        if let Some(table) = &self.mapped_data {
            table.validate().map_err(context)?;
        }
        if let Some(derived) = &self.derived_mapping {
            derived.validate().map_err(context)?;
        }
        Ok(())
    }
}

/// Order of field names in a session: case-insensitive, then by raw text
///
/// Case folding is Unicode lowercase compared by code point. This is an
/// approximation of locale collation: accented letters sort after `z`
/// (`"Zeta" < "Été"`), and names equal up to case order uppercase first.
pub fn compare_field_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort entries by field name (stable)
pub fn sort_entries(entries: &mut [MappingEntry]) {
    entries.sort_by(|a, b| compare_field_names(&a.field_name, &b.field_name));
}
