//! Editing sessions
//!
//! A [`MappingSession`] owns the entries of one mapping document together
//! with the text they were read from. Every mutation goes through the session,
//! fails without side effects, and is reported to an optional [`ChangeSink`].

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::codec::XmlCodec;
use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::model::{sort_entries, EntryField, MappingEntry};
use crate::parser::parse_with_limits;

/// A change made to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A scalar attribute of an entry was set
    FieldChanged {
        /// Entry index
        index: usize,
        /// Attribute that changed
        field: EntryField,
    },
    /// An entry was changed through [`MappingSession::edit_entry`]
    EntryEdited {
        /// Entry index
        index: usize,
    },
    /// An entry was inserted
    EntryAdded {
        /// Entry index
        index: usize,
    },
    /// An entry was removed
    EntryDeleted {
        /// Index the entry had
        index: usize,
        /// Its field name
        field_name: String,
    },
    /// An entry's tickets changed
    TicketsChanged {
        /// Entry index
        index: usize,
    },
    /// Entries were reordered
    Reordered,
    /// Views should re-read the entries
    ///
    /// Follows every other event. Stamps are milliseconds since the Unix
    /// epoch and strictly increase within a session, so a receiver can drop
    /// refreshes it has already handled.
    Refresh {
        /// Refresh stamp
        stamp: u64,
    },
}

/// Receiver of session change notifications
pub trait ChangeSink {
    /// Handle one event
    fn notify(&mut self, event: &ChangeEvent);
}

impl<F: FnMut(&ChangeEvent)> ChangeSink for F {
    fn notify(&mut self, event: &ChangeEvent) {
        self(event)
    }
}

/// One document being edited
pub struct MappingSession {
    codec: XmlCodec,
    entries: Vec<MappingEntry>,
    original: Option<String>,
    deleted: Vec<String>,
    sink: Option<Box<dyn ChangeSink>>,
    last_stamp: u64,
}

impl fmt::Debug for MappingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingSession")
            .field("config", self.codec.config())
            .field("entries", &self.entries.len())
            .field("has_original", &self.original.is_some())
            .field("deleted", &self.deleted)
            .finish_non_exhaustive()
    }
}

impl MappingSession {
    /// Start an empty session with no original document
    pub fn new(config: EditorConfig) -> Self {
        Self {
            codec: XmlCodec::new(config),
            entries: Vec::new(),
            original: None,
            deleted: Vec::new(),
            sink: None,
            last_stamp: 0,
        }
    }

    /// Start a session on a mapping document
    pub fn from_xml(xml: &str, config: EditorConfig) -> Result<Self> {
        let entries = parse_with_limits(xml, &config.limits)?;
        debug!(entries = entries.len(), "opened mapping session");
        let mut session = Self::new(config);
        session.entries = entries;
        session.original = Some(xml.to_string());
        Ok(session)
    }

    /// Attach a change sink
    pub fn with_sink(mut self, sink: impl ChangeSink + 'static) -> Self {
        self.set_sink(sink);
        self
    }

    /// Replace the change sink
    pub fn set_sink(&mut self, sink: impl ChangeSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Entries in session order
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Entry at `index`
    pub fn entry(&self, index: usize) -> Result<&MappingEntry> {
        self.entries
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.entries.len()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the session has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text of the document the session was opened on
    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    /// Field names of deleted entries, in deletion order
    pub fn deleted_names(&self) -> &[String] {
        &self.deleted
    }

    /// Session configuration
    pub fn config(&self) -> &EditorConfig {
        self.codec.config()
    }

    /// File name for the exported document
    pub fn output_file_name(&self) -> &str {
        &self.config().output_file_name
    }

    /// Set a scalar attribute of the entry at `index`
    ///
    /// Changing the mapping type resets the data that belonged to the old type.
    pub fn set_field(&mut self, index: usize, field: EntryField, value: &str) -> Result<()> {
        self.commit(index, |entry| entry.set_field(field, value))?;
        debug!(index, ?field, "set entry field");
        self.emit(ChangeEvent::FieldChanged { index, field });
        Ok(())
    }

    /// Insert an empty entry at the head of the sequence
    pub fn add_entry(&mut self) -> usize {
        self.entries.insert(0, MappingEntry::default());
        debug!(entries = self.entries.len(), "added entry");
        self.emit(ChangeEvent::EntryAdded { index: 0 });
        0
    }

    /// Remove the entry at `index`
    ///
    /// Its name is remembered so that export can drop the matching node of
    /// the original document.
    pub fn delete_entry(&mut self, index: usize) -> Result<MappingEntry> {
        self.check_index(index)?;
        let entry = self.entries.remove(index);
        if !entry.field_name.is_empty() {
            self.deleted.push(entry.field_name.clone());
        }
        debug!(index, field = %entry.field_name, "deleted entry");
        self.emit(ChangeEvent::EntryDeleted {
            index,
            field_name: entry.field_name.clone(),
        });
        Ok(entry)
    }

    /// Add a ticket to the entry at `index`
    ///
    /// Returns false, and reports nothing, when the trimmed ticket is empty
    /// or already present.
    pub fn add_ticket(&mut self, index: usize, ticket: &str) -> Result<bool> {
        self.check_index(index)?;
        let added = self.entries[index].tickets.add(ticket);
        if added {
            self.emit(ChangeEvent::TicketsChanged { index });
        }
        Ok(added)
    }

    /// Remove the ticket at `ticket_index` from the entry at `index`
    pub fn remove_ticket(&mut self, index: usize, ticket_index: usize) -> Result<String> {
        self.check_index(index)?;
        let ticket = self.entries[index].tickets.remove(ticket_index)?;
        self.emit(ChangeEvent::TicketsChanged { index });
        Ok(ticket)
    }

    /// Apply a structured edit to the entry at `index`
    ///
    /// `edit` works on a copy; the copy replaces the entry only when `edit`
    /// succeeds and the result still satisfies the table and rule invariants.
    pub fn edit_entry<F>(&mut self, index: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut MappingEntry) -> Result<()>,
    {
        self.commit(index, |entry| {
            edit(entry)?;
            entry.check_structure().map_err(|e| match e {
                Error::Serialization(msg) => Error::Invariant(msg),
                other => other,
            })
        })?;
        self.emit(ChangeEvent::EntryEdited { index });
        Ok(())
    }

    /// Re-apply the alphabetical field name order
    pub fn sort_entries(&mut self) {
        sort_entries(&mut self.entries);
        self.emit(ChangeEvent::Reordered);
    }

    /// Serialize the session, patching the original document if there is one
    pub fn export(&self) -> Result<String> {
        let original = self.original.as_deref();
        if self.config().prune_deleted {
            self.codec
                .serialize_pruned(&self.entries, original, &self.deleted)
        } else {
            self.codec.serialize(&self.entries, original)
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(Error::out_of_range(index, self.entries.len()));
        }
        Ok(())
    }

    fn commit<F>(&mut self, index: usize, change: F) -> Result<()>
    where
        F: FnOnce(&mut MappingEntry) -> Result<()>,
    {
        let mut entry = self.entry(index)?.clone();
        change(&mut entry)?;
        self.entries[index] = entry;
        Ok(())
    }

    fn emit(&mut self, event: ChangeEvent) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let stamp = now.max(self.last_stamp + 1);
        self.last_stamp = stamp;

        sink.notify(&event);
        sink.notify(&ChangeEvent::Refresh { stamp });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MappedTable, MappingType};
    use std::cell::RefCell;
    use std::rc::Rc;

    const THREE: &str = "<mappings>\
        <field><dest>Account</dest><mapping-type>PASSED_THROUGH</mapping-type><src>1</src></field>\
        <field><dest>Side</dest><mapping-type>MAPPED</mapping-type><ctable><cols><src>54</src></cols>\
          <row><value>1</value><value>BUY</value></row></ctable></field>\
        <field><dest>OrderQty</dest><mapping-type>PASSED_THROUGH</mapping-type><src>38</src></field>\
        </mappings>";

    fn session() -> MappingSession {
        MappingSession::from_xml(THREE, EditorConfig::default()).unwrap()
    }

    fn names(session: &MappingSession) -> Vec<&str> {
        session.entries().iter().map(|e| e.field_name.as_str()).collect()
    }

    #[test]
    fn test_add_entry_shifts_existing() {
        let mut session = session();
        let before = session.entries().to_vec();
        assert_eq!(session.add_entry(), 0);

        assert_eq!(session.len(), 4);
        assert_eq!(session.entries()[0], MappingEntry::default());
        assert_eq!(&session.entries()[1..], &before[..]);
    }

    #[test]
    fn test_mapped_to_none_clears() {
        let mut session = session();
        let side = names(&session).iter().position(|n| *n == "Side").unwrap();
        session.set_field(side, EntryField::MappingType, "NONE").unwrap();

        let entry = session.entry(side).unwrap();
        assert!(entry.mapped_data.is_none());
        assert_eq!(entry.source, "");
    }

    #[test]
    fn test_failed_mutations_leave_session_unchanged() {
        let mut session = session();
        let before = session.entries().to_vec();

        assert!(matches!(
            session.set_field(7, EntryField::Notes, "x"),
            Err(Error::IndexOutOfRange { index: 7, len: 3 })
        ));
        assert!(session.set_field(0, EntryField::MappingType, "NOPE").is_err());
        assert!(session.delete_entry(3).is_err());
        assert!(session.add_ticket(9, "A-1").is_err());
        assert!(session.remove_ticket(0, 0).is_err());
        assert!(session
            .edit_entry(1, |entry| {
                entry.notes = "half done".to_string();
                Err(Error::Value("rejected".to_string()))
            })
            .is_err());

        assert_eq!(session.entries(), &before[..]);
    }

    #[test]
    fn test_edit_entry_rejects_broken_table() {
        let mut session = session();
        let side = names(&session).iter().position(|n| *n == "Side").unwrap();
        let before = session.entries().to_vec();

        let result = session.edit_entry(side, |entry| {
            entry.mapped_data = Some(serde_json::from_str(
                r#"{"kind":"direct","sources":["54","40"],"rows":[{"keys":["1"],"output":"B"}]}"#,
            )?);
            Ok(())
        });
        assert!(matches!(result, Err(Error::Invariant(_))));
        assert_eq!(session.entries(), &before[..]);

        session
            .edit_entry(side, |entry| match entry.mapped_data.as_mut() {
                Some(MappedTable::Direct(table)) => table.add_row(vec!["2".to_string()], "SELL"),
                _ => Err(Error::Invariant("not a direct table".to_string())),
            })
            .unwrap();
        let rows = session.entry(side).unwrap().mapped_data.as_ref().unwrap().tables()[0]
            .rows()
            .len();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_tickets() {
        let mut session = session();
        assert!(session.add_ticket(0, " ABC-1 ").unwrap());
        assert!(!session.add_ticket(0, "ABC-1").unwrap());
        assert!(!session.add_ticket(0, "").unwrap());
        assert_eq!(session.entry(0).unwrap().tickets.len(), 1);
        assert_eq!(session.remove_ticket(0, 0).unwrap(), "ABC-1");
    }

    #[test]
    fn test_sink_receives_events_and_increasing_stamps() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&events);
        let mut session = session().with_sink(move |event: &ChangeEvent| {
            recorded.borrow_mut().push(event.clone());
        });

        session.add_entry();
        session.set_field(0, EntryField::FieldName, "NewField").unwrap();
        session.add_ticket(0, "A-1").unwrap();
        session.add_ticket(0, "A-1").unwrap();
        assert!(session.delete_entry(10).is_err());

        let events = events.borrow();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0], ChangeEvent::EntryAdded { index: 0 });
        assert_eq!(
            events[2],
            ChangeEvent::FieldChanged {
                index: 0,
                field: EntryField::FieldName
            }
        );
        assert_eq!(events[4], ChangeEvent::TicketsChanged { index: 0 });

        let stamps: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                ChangeEvent::Refresh { stamp } => Some(*stamp),
                _ => None,
            })
            .collect();
        assert_eq!(stamps.len(), 3);
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_export_prunes_deleted_entries() {
        let mut session = session();
        let qty = names(&session).iter().position(|n| *n == "OrderQty").unwrap();
        session.delete_entry(qty).unwrap();
        assert_eq!(session.deleted_names(), &["OrderQty".to_string()]);

        let xml = session.export().unwrap();
        assert!(!xml.contains("OrderQty"));
        assert!(xml.contains("<dest>Side</dest>"));

        let mut keep = MappingSession::from_xml(THREE, EditorConfig::new().with_prune_deleted(false)).unwrap();
        keep.delete_entry(qty).unwrap();
        assert!(keep.export().unwrap().contains("OrderQty"));
    }

    #[test]
    fn test_export_without_original() {
        let mut session = MappingSession::new(EditorConfig::default());
        session.add_entry();
        assert!(matches!(session.export(), Err(Error::Serialization(_))));

        session.set_field(0, EntryField::FieldName, "Price").unwrap();
        session.set_field(0, EntryField::MappingType, "DEFAULTED").unwrap();
        session.set_field(0, EntryField::Source, "44").unwrap();
        let xml = session.export().unwrap();
        assert!(xml.contains("<mappings>"));
        assert!(xml.contains("<src>44</src>"));
        assert_eq!(session.output_file_name(), "mapping.xml");
    }

    #[test]
    fn test_sort_entries() {
        let mut session = session();
        session.add_entry();
        session.set_field(0, EntryField::FieldName, "Zeta").unwrap();
        session.set_field(0, EntryField::MappingType, MappingType::ENRICHED.as_str()).unwrap();
        session.sort_entries();
        assert_eq!(names(&session), vec!["Account", "OrderQty", "Side", "Zeta"]);
    }
}
