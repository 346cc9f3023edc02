//! Value-substitution tables for MAPPED entries

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One table row: a composite key aligned with the table sources, and the output
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableRow {
    /// Key values, positionally aligned with the table sources
    pub keys: Vec<String>,
    /// Value emitted when the keys match
    pub output: String,
}

/// A direct table keyed on one or more source fields
///
/// Every row has exactly one key per source column; the methods here keep
/// that true.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectTable {
    sources: Vec<String>,
    rows: Vec<TableRow>,
}

impl DirectTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given source columns and no rows
    pub fn with_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Source field identifiers
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Table rows
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Append a source column; existing rows get an empty key for it
    pub fn add_source(&mut self, source: impl Into<String>) {
        self.sources.push(source.into());
        for row in &mut self.rows {
            row.keys.push(String::new());
        }
    }

    /// Rename a source column
    pub fn set_source(&mut self, index: usize, source: impl Into<String>) -> Result<()> {
        let len = self.sources.len();
        let slot = self
            .sources
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, len))?;
        *slot = source.into();
        Ok(())
    }

    /// Remove a source column together with its key in every row
    pub fn remove_source(&mut self, index: usize) -> Result<String> {
        if index >= self.sources.len() {
            return Err(Error::out_of_range(index, self.sources.len()));
        }
        for row in &mut self.rows {
            row.keys.remove(index);
        }
        Ok(self.sources.remove(index))
    }

    /// Append a row; the key count must match the source count
    pub fn add_row(&mut self, keys: Vec<String>, output: impl Into<String>) -> Result<()> {
        if keys.len() != self.sources.len() {
            return Err(Error::Invariant(format!(
                "row has {} key value(s) but the table has {} source(s)",
                keys.len(),
                self.sources.len()
            )));
        }
        self.rows.push(TableRow {
            keys,
            output: output.into(),
        });
        Ok(())
    }

    /// Set one key value of a row
    pub fn set_key(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<()> {
        let row = self.row_mut(row)?;
        let len = row.keys.len();
        let slot = row
            .keys
            .get_mut(column)
            .ok_or_else(|| Error::out_of_range(column, len))?;
        *slot = value.into();
        Ok(())
    }

    /// Set the output value of a row
    pub fn set_output(&mut self, row: usize, value: impl Into<String>) -> Result<()> {
        self.row_mut(row)?.output = value.into();
        Ok(())
    }

    /// Remove a row
    pub fn remove_row(&mut self, index: usize) -> Result<TableRow> {
        if index >= self.rows.len() {
            return Err(Error::out_of_range(index, self.rows.len()));
        }
        Ok(self.rows.remove(index))
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut TableRow> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, len))
    }

    /// Check the row width invariant
    pub fn validate(&self) -> Result<()> {
        for (i, row) in self.rows.iter().enumerate() {
            if row.keys.len() != self.sources.len() {
                return Err(Error::Serialization(format!(
                    "row {} has {} key value(s) for {} source(s)",
                    i,
                    row.keys.len(),
                    self.sources.len()
                )));
            }
        }
        Ok(())
    }
}

/// A direct table guarded by a reference condition
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionalBranch {
    /// Reference condition selecting this branch
    pub reference: String,
    /// Table applied when the reference matches
    pub table: DirectTable,
}

/// Value-substitution table of a MAPPED entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MappedTable {
    /// A single table
    Direct(DirectTable),
    /// Tables selected by reference conditions
    Conditional {
        /// Branches in document order
        branches: Vec<ConditionalBranch>,
    },
}

impl Default for MappedTable {
    fn default() -> Self {
        Self::direct()
    }
}

impl MappedTable {
    /// An empty direct table
    pub fn direct() -> Self {
        MappedTable::Direct(DirectTable::new())
    }

    /// True for the conditional shape
    pub fn is_conditional(&self) -> bool {
        matches!(self, MappedTable::Conditional { .. })
    }

    /// All direct tables, in order
    pub fn tables(&self) -> Vec<&DirectTable> {
        match self {
            MappedTable::Direct(table) => vec![table],
            MappedTable::Conditional { branches } => branches.iter().map(|b| &b.table).collect(),
        }
    }

    /// Mutable access to the table of a direct mapping
    pub fn as_direct_mut(&mut self) -> Option<&mut DirectTable> {
        match self {
            MappedTable::Direct(table) => Some(table),
            MappedTable::Conditional { .. } => None,
        }
    }

    /// Mutable access to the branch at `index` of a conditional mapping
    pub fn branch_mut(&mut self, index: usize) -> Result<&mut ConditionalBranch> {
        match self {
            MappedTable::Conditional { branches } => {
                let len = branches.len();
                branches
                    .get_mut(index)
                    .ok_or_else(|| Error::out_of_range(index, len))
            }
            MappedTable::Direct(_) => Err(Error::Invariant(
                "direct table has no conditional branches".to_string(),
            )),
        }
    }

    /// Check every table's row width invariant
    pub fn validate(&self) -> Result<()> {
        self.tables().into_iter().try_for_each(DirectTable::validate)
    }
}
