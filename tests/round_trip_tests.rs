//! Round-trip tests: parse a mapping file, write it back, parse it again

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use fieldmap::codec::{serialize, XmlCodec};
use fieldmap::model::{MappedTable, MappingEntry, MappingType, Operator, OutputFormat};
use fieldmap::{parse, EditorConfig, OrderPreference};

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e))
}

fn names(entries: &[MappingEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.field_name.as_str()).collect()
}

fn entry<'a>(entries: &'a [MappingEntry], name: &str) -> &'a MappingEntry {
    entries
        .iter()
        .find(|e| e.field_name == name)
        .unwrap_or_else(|| panic!("no entry {}", name))
}

#[test]
fn test_fixture_parses() {
    let entries = parse(&fixture("mapping.xml")).unwrap();
    assert_eq!(
        names(&entries),
        vec!["account", "OrderQty", "OrdType", "Side", "Text", "TimeInForce"]
    );

    let qty = entry(&entries, "OrderQty");
    assert_eq!(qty.mapping_type, MappingType::PASSED_THROUGH);
    assert_eq!(qty.source, "38");
    assert_eq!(qty.status.as_deref(), Some("GOOD"));
    assert_eq!(qty.tickets.iter().collect::<Vec<_>>(), vec!["OPS-12", "OPS-7"]);

    let ord_type = entry(&entries, "OrdType");
    match ord_type.mapped_data.as_ref().unwrap() {
        MappedTable::Conditional { branches } => {
            assert_eq!(branches.len(), 2);
            assert_eq!(branches[0].table.sources().len(), 2);
            assert_eq!(branches[0].table.rows()[0].output, "MARKET_DAY");
        }
        other => panic!("expected conditional table, got {:?}", other),
    }

    let tif = entry(&entries, "TimeInForce");
    let sets = tif.derived_mapping.as_ref().unwrap().condition_sets();
    assert_eq!(sets.len(), 3);
    assert_eq!(sets[1].conditions().len(), 2);
    assert_eq!(sets[1].conditions()[1].operator, Operator::Contains);
    assert_eq!(sets[1].output_format(), OutputFormat::Source);
    assert_eq!(tif.tickets.iter().collect::<Vec<_>>(), vec!["OPS-3"]);

    assert_eq!(entry(&entries, "Text").mapping_type, MappingType::NONE);
}

#[test]
fn test_patched_round_trip_preserves_entries() {
    let original = fixture("mapping.xml");
    let entries = parse(&original).unwrap();

    let xml = serialize(&entries, Some(&original)).unwrap();
    let again = parse(&xml).unwrap();
    assert_eq!(again, entries);
}

#[test]
fn test_fresh_round_trip_preserves_entries() {
    let entries = parse(&fixture("mapping.xml")).unwrap();

    let xml = serialize(&entries, None).unwrap();
    let again = parse(&xml).unwrap();
    assert_eq!(again, entries);
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<mappings>\n  <field>\n"));
}

#[test]
fn test_patched_output_keeps_unowned_content() {
    let original = fixture("mapping.xml");
    let entries = parse(&original).unwrap();
    let xml = serialize(&entries, Some(&original)).unwrap();

    assert!(xml.contains("<!-- Order routing mappings -->"));
    assert!(xml.contains("<mappings version=\"2\" owner=\"trading-ops\">"));
    assert!(xml.contains("<field id=\"side\">"));
    assert!(xml.contains("<reviewed-by>jdoe</reviewed-by>"));
    assert!(xml.contains("<group name=\"venue\">"));
    assert!(xml.contains("<!-- venue specific -->"));
}

#[test]
fn test_output_is_stable() {
    let original = fixture("mapping.xml");
    let entries = parse(&original).unwrap();

    let first = serialize(&entries, Some(&original)).unwrap();
    let second = serialize(&parse(&first).unwrap(), Some(&first)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_tickets_written_latest_first() {
    let original = fixture("mapping.xml");
    let entries = parse(&original).unwrap();
    let xml = serialize(&entries, Some(&original)).unwrap();

    let twelve = xml.find("<jira>OPS-12</jira>").unwrap();
    let seven = xml.find("<jira>OPS-7</jira>").unwrap();
    assert!(twelve < seven);
    // bare ticket is moved into a tickets element
    assert!(xml.contains("<tickets>\n      <jira>OPS-3</jira>\n    </tickets>"));
}

#[test]
fn test_alphabetical_export_reorders_top_level_fields() {
    let original = fixture("mapping.xml");
    let entries = parse(&original).unwrap();
    let codec = XmlCodec::new(EditorConfig::new().with_order_preference(OrderPreference::Alphabetical));
    let xml = codec.serialize(&entries, Some(&original)).unwrap();

    let positions: Vec<usize> = ["account", "OrderQty", "Side", "Text", "TimeInForce"]
        .iter()
        .map(|name| xml.find(&format!("<dest>{}</dest>", name)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(parse(&xml).unwrap(), entries);
}

#[test]
fn test_edited_entries_are_written() {
    let original = fixture("mapping.xml");
    let mut entries = parse(&original).unwrap();

    let side = entries.iter().position(|e| e.field_name == "Side").unwrap();
    if let Some(MappedTable::Direct(table)) = entries[side].mapped_data.as_mut() {
        table.add_source("40");
        table.set_key(0, 1, "2").unwrap();
    }
    entries[side].notes = "two columns".to_string();
    let qty = entries.iter().position(|e| e.field_name == "OrderQty").unwrap();
    entries[qty].set_mapping_type(MappingType::FORMATTED);

    let xml = serialize(&entries, Some(&original)).unwrap();
    let again = parse(&xml).unwrap();
    assert_eq!(again, entries);

    let side = entry(&again, "Side");
    let keys = side.mapped_data.as_ref().unwrap().tables()[0].rows()[0].keys.clone();
    assert_eq!(keys, vec!["1".to_string(), "2".to_string()]);
    assert_eq!(entry(&again, "OrderQty").source, "");
}
