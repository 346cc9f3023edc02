//! Ticket lists attached to mapping entries

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `PREFIX-NUMBER` ticket identifiers, e.g. `ABC-123`
static TICKET_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^-\s]+)-(\d+)$").unwrap());

/// Ordered, duplicate-free list of issue-tracker identifiers
///
/// Tickets are compared by their trimmed text. Insertion order is kept;
/// sorting only happens when the list is written out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TicketList(Vec<String>);

impl TicketList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from newline-joined text
    pub fn from_text(text: &str) -> Self {
        text.lines().collect()
    }

    /// Newline-joined form used at the UI boundary
    pub fn to_text(&self) -> String {
        self.0.join("\n")
    }

    /// Add a ticket; returns false when it is blank or already present
    pub fn add(&mut self, ticket: &str) -> bool {
        let ticket = ticket.trim();
        if ticket.is_empty() || self.contains(ticket) {
            return false;
        }
        self.0.push(ticket.to_string());
        true
    }

    /// Remove the ticket at `index`
    pub fn remove(&mut self, index: usize) -> Result<String> {
        if index >= self.0.len() {
            return Err(Error::out_of_range(index, self.0.len()));
        }
        Ok(self.0.remove(index))
    }

    /// Check whether a ticket (trimmed) is present
    pub fn contains(&self, ticket: &str) -> bool {
        let ticket = ticket.trim();
        self.0.iter().any(|t| t == ticket)
    }

    /// Number of tickets
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no tickets
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Tickets in output order
    ///
    /// `PREFIX-NUMBER` tickets come first, by prefix ascending and then by
    /// number descending so the latest ticket of a project leads its group.
    /// Anything else follows in insertion order.
    pub fn sorted_for_output(&self) -> Vec<&str> {
        let (mut keyed, other): (Vec<_>, Vec<_>) = self
            .0
            .iter()
            .map(|t| (ticket_key(t), t.as_str()))
            .partition(|(key, _)| key.is_some());

        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some((pa, na)), Some((pb, nb))) => pa.cmp(pb).then(nb.cmp(na)),
            _ => Ordering::Equal,
        });

        keyed
            .into_iter()
            .chain(other)
            .map(|(_, ticket)| ticket)
            .collect()
    }
}

fn ticket_key(ticket: &str) -> Option<(&str, u64)> {
    let caps = TICKET_KEY.captures(ticket)?;
    let prefix = caps.get(1)?.as_str();
    let number = caps.get(2)?.as_str().parse().ok()?;
    Some((prefix, number))
}

impl<S: AsRef<str>> FromIterator<S> for TicketList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = TicketList::new();
        for ticket in iter {
            list.add(ticket.as_ref());
        }
        list
    }
}

impl From<Vec<String>> for TicketList {
    fn from(tickets: Vec<String>) -> Self {
        tickets.into_iter().collect()
    }
}

impl From<TicketList> for Vec<String> {
    fn from(list: TicketList) -> Self {
        list.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_trims_and_suppresses_duplicates() {
        let mut list = TicketList::new();
        assert!(list.add(" ABC-1 "));
        assert!(!list.add("ABC-1"));
        assert!(!list.add("   "));
        assert!(list.add("ABC-2"));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["ABC-1", "ABC-2"]);
    }

    #[test]
    fn test_from_text_round_trip() {
        let list = TicketList::from_text("ABC-1\n\nXYZ-9\nABC-1\n");
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_text(), "ABC-1\nXYZ-9");
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut list = TicketList::from_text("A-1");
        assert!(matches!(
            list.remove(3),
            Err(Error::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(list.remove(0).unwrap(), "A-1");
        assert!(list.is_empty());
    }

    #[test]
    fn test_output_order() {
        let list: TicketList = ["ABC-1", "ABC-5", "XYZ-2"].into_iter().collect();
        assert_eq!(list.sorted_for_output(), vec!["ABC-5", "ABC-1", "XYZ-2"]);
    }

    #[test]
    fn test_output_order_numeric_not_lexical() {
        let list: TicketList = ["OPS-9", "legacy note", "OPS-10", "ADM-3"].into_iter().collect();
        assert_eq!(
            list.sorted_for_output(),
            vec!["ADM-3", "OPS-10", "OPS-9", "legacy note"]
        );
    }

    #[test]
    fn test_serde_dedupes() {
        let list: TicketList = serde_json::from_str(r#"["A-1","A-1","B-2"]"#).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["A-1","B-2"]"#);
    }
}
