//! Mapping document serialization
//!
//! [`XmlCodec`] writes entries back out as mapping XML. Given the text of the
//! document the entries came from, it patches that document: matching `field`
//! elements are updated in place and keep every child and attribute the model
//! does not own, entries without a match are appended to the root. Without an
//! original a fresh document is built.

use tracing::{debug, trace};

use crate::config::{EditorConfig, OrderPreference};
use crate::documents::{Document, Element, Node};
use crate::error::Result;
use crate::model::{
    compare_field_names, ConditionSet, DerivedMapping, DirectTable, MappedTable, MappingEntry,
    MappingType, OutputFormat, TicketList,
};

/// Children of `field` that hold the table or rules of an entry
const TABLE_TAGS: [&str; 2] = ["ctable", "ifelse"];

/// Serializer for mapping entries
#[derive(Debug, Clone, Default)]
pub struct XmlCodec {
    config: EditorConfig,
}

impl XmlCodec {
    /// Create a codec with the given configuration
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Serialize entries, patching `original` when given
    ///
    /// Fields of the original document that no entry refers to are kept.
    pub fn serialize(&self, entries: &[MappingEntry], original: Option<&str>) -> Result<String> {
        self.serialize_pruned(entries, original, &[])
    }

    /// Serialize entries, dropping original fields named in `removed`
    ///
    /// A field is only dropped when no remaining entry uses its name.
    pub fn serialize_pruned(
        &self,
        entries: &[MappingEntry],
        original: Option<&str>,
        removed: &[String],
    ) -> Result<String> {
        entries.iter().try_for_each(MappingEntry::validate)?;

        let mut document = match original {
            Some(xml) => {
                let mut document = Document::parse(xml, &self.config.limits)?;
                self.patch(document.root_mut(), entries, removed);
                document
            }
            None => {
                let mut document = Document::new(self.config.root_element.as_str());
                for entry in entries {
                    document.root_mut().add_child(self.build_field(entry));
                }
                debug!(created = entries.len(), "built new mapping document");
                document
            }
        };

        if self.config.order_preference == OrderPreference::Alphabetical {
            sort_fields(document.root_mut());
        }
        document.to_xml(self.config.indent)
    }

    fn patch(&self, root: &mut Element, entries: &[MappingEntry], removed: &[String]) {
        let pruned = if removed.is_empty() {
            0
        } else {
            prune_fields(root, entries, removed)
        };

        let mut candidates = field_candidates(root);
        let mut appended = Vec::new();
        let mut patched = 0;

        for entry in entries {
            let slot = candidates
                .iter_mut()
                .find(|c| !c.used && c.name == entry.field_name);
            let field = match slot {
                Some(candidate) => {
                    candidate.used = true;
                    root.element_at_mut(&candidate.path)
                }
                None => None,
            };
            match field {
                Some(field) => {
                    self.patch_field(field, entry);
                    patched += 1;
                }
                None => appended.push(self.build_field(entry)),
            }
        }

        let created = appended.len();
        for field in appended {
            root.add_child(field);
        }
        debug!(patched, created, pruned, "patched mapping document");
    }

    /// Update the model-owned children of an existing `field` element
    fn patch_field(&self, field: &mut Element, entry: &MappingEntry) {
        trace!(field = %entry.field_name, "patching field");
        field.set_child_text("mapping-type", entry.mapping_type.as_str(), Some("dest"));

        if entry.mapping_type.uses_source() {
            field.set_child_text("src", &entry.source, Some("mapping-type"));
        } else {
            field.remove_children(&["src"]);
        }

        let old_position = field.remove_children(&TABLE_TAGS);
        if let Some(table) = table_element(entry) {
            let position = old_position.unwrap_or_else(|| {
                field
                    .child_position("src")
                    .or_else(|| field.child_position("mapping-type"))
                    .map(|i| i + 1)
                    .unwrap_or(field.children.len())
            });
            field.insert_child(position, table);
        }

        if entry.notes.is_empty() {
            field.remove_children(&["notes"]);
        } else {
            field.set_child_text("notes", &entry.notes, None);
        }

        if let Some(status) = &entry.status {
            field.set_child_text("status", status, None);
        }

        let old_position = field.remove_children(&["tickets", "jira"]);
        if !entry.tickets.is_empty() {
            let tickets = self.tickets_element(&entry.tickets);
            match old_position {
                Some(position) => field.insert_child(position, tickets),
                None => field.add_child(tickets),
            }
        }
    }

    fn build_field(&self, entry: &MappingEntry) -> Element {
        trace!(field = %entry.field_name, "creating field");
        let mut field = Element::new("field");
        field.add_child(Element::with_text("dest", entry.field_name.as_str()));
        field.add_child(Element::with_text("mapping-type", entry.mapping_type.as_str()));
        if entry.mapping_type.uses_source() {
            field.add_child(Element::with_text("src", entry.source.as_str()));
        }
        if let Some(table) = table_element(entry) {
            field.add_child(table);
        }
        if !entry.notes.is_empty() {
            field.add_child(Element::with_text("notes", entry.notes.as_str()));
        }
        if let Some(status) = &entry.status {
            field.add_child(Element::with_text("status", status.as_str()));
        }
        if !entry.tickets.is_empty() {
            field.add_child(self.tickets_element(&entry.tickets));
        }
        field
    }

    fn tickets_element(&self, tickets: &TicketList) -> Element {
        let ordered: Vec<&str> = if self.config.sort_tickets {
            tickets.sorted_for_output()
        } else {
            tickets.iter().collect()
        };
        let mut element = Element::new("tickets");
        for ticket in ordered {
            element.add_child(Element::with_text("jira", ticket));
        }
        element
    }
}

/// Serialize entries with the default configuration
pub fn serialize(entries: &[MappingEntry], original: Option<&str>) -> Result<String> {
    XmlCodec::default().serialize(entries, original)
}

/// Build a complete `field` element for an entry
pub fn synthesize_field(entry: &MappingEntry) -> Element {
    XmlCodec::default().build_field(entry)
}

/// The `ctable`/`ifelse` element of an entry, if its type has one
fn table_element(entry: &MappingEntry) -> Option<Element> {
    match entry.mapping_type {
        MappingType::MAPPED => Some(match &entry.mapped_data {
            Some(table) => mapped_element(table),
            None => mapped_element(&MappedTable::default()),
        }),
        MappingType::DERIVED => Some(match &entry.derived_mapping {
            Some(derived) => derived_element(derived),
            None => derived_element(&DerivedMapping::default()),
        }),
        _ => None,
    }
}

fn mapped_element(table: &MappedTable) -> Element {
    match table {
        MappedTable::Direct(table) => ctable_element(table),
        MappedTable::Conditional { branches } => {
            let mut ifelse = Element::new("ifelse");
            for branch in branches {
                let mut branch_element = Element::new("if");
                branch_element.add_child(Element::with_text("ref", branch.reference.as_str()));
                branch_element.add_child(ctable_element(&branch.table));
                ifelse.add_child(branch_element);
            }
            ifelse
        }
    }
}

fn ctable_element(table: &DirectTable) -> Element {
    let mut ctable = Element::new("ctable");
    let mut cols = Element::new("cols");
    for source in table.sources() {
        cols.add_child(Element::with_text("src", source.as_str()));
    }
    ctable.add_child(cols);

    for row in table.rows() {
        let mut row_element = Element::new("row");
        for value in row.keys.iter().chain(std::iter::once(&row.output)) {
            row_element.add_child(Element::with_text("value", value.as_str()));
        }
        ctable.add_child(row_element);
    }
    ctable
}

/// Emit condition sets in order as `if`, `else-if`...
///
/// A trailing set without conditions becomes the `else`; any other set
/// without conditions keeps its place as a branch with an empty `<and/>`.
fn derived_element(derived: &DerivedMapping) -> Element {
    let mut ifelse = Element::new("ifelse");
    let sets = derived.condition_sets();
    let (branches, fallback) = match sets.split_last() {
        Some((last, rest)) if last.conditions().is_empty() => (rest, Some(last)),
        _ => (sets, None),
    };

    for (i, set) in branches.iter().enumerate() {
        let mut branch = Element::new(if i == 0 { "if" } else { "else-if" });
        let mut and = Element::new("and");
        for condition in set.conditions() {
            let mut cond = Element::new("cond");
            cond.add_child(Element::with_text("src", condition.source_field.as_str()));
            cond.add_child(Element::with_text("oper", condition.operator.as_str()));
            cond.add_child(Element::with_text("value", condition.value.as_str()));
            and.add_child(cond);
        }
        branch.add_child(and);
        branch.add_child(result_element(set));
        ifelse.add_child(branch);
    }

    if let Some(set) = fallback {
        let mut branch = Element::new("else");
        branch.add_child(result_element(set));
        ifelse.add_child(branch);
    }
    ifelse
}

fn result_element(set: &ConditionSet) -> Element {
    let tag = match set.output_format() {
        OutputFormat::Source => "src",
        OutputFormat::Value => "value",
    };
    Element::with_text(tag, set.result_value())
}

/// A `field` element of the original document available for matching
struct Candidate {
    path: Vec<usize>,
    name: String,
    used: bool,
}

fn field_candidates(root: &Element) -> Vec<Candidate> {
    let mut paths = root.descendant_paths("field");
    if root.local_name() == "field" {
        paths.insert(0, Vec::new());
    }
    paths
        .into_iter()
        .filter_map(|path| {
            let name = root.element_at(&path)?.child_text("dest").unwrap_or_default();
            Some(Candidate {
                path,
                name,
                used: false,
            })
        })
        .collect()
}

/// Remove fields whose name was deleted and is not used by any entry
fn prune_fields(root: &mut Element, entries: &[MappingEntry], removed: &[String]) -> usize {
    let doomed: Vec<Vec<usize>> = field_candidates(root)
        .into_iter()
        .filter(|c| {
            !c.path.is_empty()
                && removed.contains(&c.name)
                && !entries.iter().any(|e| e.field_name == c.name)
        })
        .map(|c| c.path)
        .collect();

    let mut pruned = 0;
    // later paths first so earlier ones stay valid
    for path in doomed.iter().rev() {
        if let Some((&last, parent_path)) = path.split_last() {
            if let Some(parent) = root.element_at_mut(parent_path) {
                if last < parent.children.len() {
                    parent.children.remove(last);
                    pruned += 1;
                }
            }
        }
    }
    pruned
}

/// Reorder sibling `field` elements by destination name, at every level
///
/// Other nodes keep their positions; fields are redistributed over the slots
/// fields occupied.
fn sort_fields(element: &mut Element) {
    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            sort_fields(child);
        }
    }

    let slots: Vec<usize> = element
        .children
        .iter()
        .enumerate()
        .filter(|(_, n)| matches!(n, Node::Element(e) if e.local_name() == "field"))
        .map(|(i, _)| i)
        .collect();
    if slots.len() < 2 {
        return;
    }

    let mut fields: Vec<(String, Node)> = slots
        .iter()
        .map(|&i| {
            let node = std::mem::replace(&mut element.children[i], Node::Text(String::new()));
            let name = node
                .as_element()
                .and_then(|e| e.child_text("dest"))
                .unwrap_or_default();
            (name, node)
        })
        .collect();
    fields.sort_by(|(a, _), (b, _)| compare_field_names(a, b));

    for (slot, (_, node)) in slots.into_iter().zip(fields) {
        element.children[slot] = node;
    }
}
