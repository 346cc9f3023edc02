//! Mapping document parsing
//!
//! Turns mapping XML into the typed entry model. Every `field` element, at
//! any depth, yields one [`MappingEntry`]; the result is ordered by field name.
//! Parsing is all-or-nothing: one bad field fails the whole document.

use tracing::{debug, trace, warn};

use crate::documents::{Document, Element};
use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::model::{
    sort_entries, Condition, ConditionSet, ConditionalBranch, DerivedMapping, DirectTable,
    MappedTable, MappingEntry, MappingType, Operator, OutputFormat,
};

/// Parse mapping XML with default limits
pub fn parse(xml: &str) -> Result<Vec<MappingEntry>> {
    parse_with_limits(xml, &Limits::default())
}

/// Parse mapping XML, enforcing `limits`
pub fn parse_with_limits(xml: &str, limits: &Limits) -> Result<Vec<MappingEntry>> {
    let document = Document::parse(xml, limits)?;
    parse_document(&document, limits)
}

/// Read the entries of an already parsed document
pub fn parse_document(document: &Document, limits: &Limits) -> Result<Vec<MappingEntry>> {
    let fields = field_elements(document.root());
    limits.check_fields(fields.len())?;

    let mut entries = fields
        .into_iter()
        .map(read_field)
        .collect::<Result<Vec<_>>>()?;
    sort_entries(&mut entries);

    debug!(entries = entries.len(), "parsed mapping document");
    Ok(entries)
}

/// All `field` elements of the document, the root included, in document order
pub(crate) fn field_elements(root: &Element) -> Vec<&Element> {
    let mut fields = Vec::new();
    if root.local_name() == "field" {
        fields.push(root);
    }
    fields.extend(root.descendants("field"));
    fields
}

fn field_error(field_name: &str, message: impl Into<String>) -> Error {
    let location = if field_name.is_empty() {
        "field without dest".to_string()
    } else {
        format!("field '{}'", field_name)
    };
    ParseError::new(message).with_location(location).into()
}

fn read_field(field: &Element) -> Result<MappingEntry> {
    let field_name = field.child_text("dest").unwrap_or_default();
    if field_name.is_empty() {
        warn!("field element without a destination name");
    }

    let mapping_type = match field.child_text("mapping-type") {
        Some(text) => text
            .parse::<MappingType>()
            .map_err(|e| field_error(&field_name, e.to_string()))?,
        None => MappingType::NONE,
    };

    let mut entry = MappingEntry {
        mapping_type,
        notes: field.child_text("notes").unwrap_or_default(),
        status: field.child_text("status").filter(|s| !s.is_empty()),
        tickets: field
            .descendants("jira")
            .iter()
            .map(|jira| jira.text_content())
            .collect(),
        ..MappingEntry::default()
    };

    match mapping_type {
        t if t.uses_source() => {
            entry.source = field.child_text("src").ok_or_else(|| {
                field_error(&field_name, format!("{} field has no <src>", t))
            })?;
        }
        MappingType::MAPPED => {
            entry.mapped_data = Some(read_mapped(field, &field_name)?);
        }
        MappingType::DERIVED => {
            entry.derived_mapping = Some(read_derived(field, &field_name)?);
        }
        _ => {}
    }

    trace!(field = %field_name, mapping_type = %mapping_type, "read field");
    entry.field_name = field_name;
    Ok(entry)
}

fn read_mapped(field: &Element, field_name: &str) -> Result<MappedTable> {
    if let Some(ifelse) = field.find_child("ifelse") {
        let branches = ifelse
            .find_children("if")
            .into_iter()
            .map(|branch| {
                let ctable = branch
                    .find_child("ctable")
                    .ok_or_else(|| field_error(field_name, "<if> branch has no <ctable>"))?;
                Ok(ConditionalBranch {
                    reference: branch.child_text("ref").unwrap_or_default(),
                    table: read_ctable(ctable, field_name)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(MappedTable::Conditional { branches });
    }

    match field.find_child("ctable") {
        Some(ctable) => Ok(MappedTable::Direct(read_ctable(ctable, field_name)?)),
        None => Err(field_error(field_name, "MAPPED field has no <ctable> or <ifelse>")),
    }
}

/// Read a `ctable`: `cols/src` are the sources, each `row` holds its key
/// values followed by the output value.
fn read_ctable(ctable: &Element, field_name: &str) -> Result<DirectTable> {
    let sources: Vec<String> = ctable
        .find_child("cols")
        .map(|cols| {
            cols.find_children("src")
                .iter()
                .map(|src| src.text_content().trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut table = DirectTable::with_sources(sources);
    for (i, row) in ctable.find_children("row").into_iter().enumerate() {
        let mut keys: Vec<String> = row
            .find_children("value")
            .iter()
            .map(|value| value.text_content().trim().to_string())
            .collect();
        let output = keys.pop().unwrap_or_default();
        if keys.len() != table.sources().len() {
            return Err(field_error(
                field_name,
                format!(
                    "ctable row {} has {} key value(s) for {} source(s)",
                    i,
                    keys.len(),
                    table.sources().len()
                ),
            ));
        }
        table.add_row(keys, output)?;
    }
    Ok(table)
}

fn read_derived(field: &Element, field_name: &str) -> Result<DerivedMapping> {
    if let Some(ifelse) = field.find_child("ifelse") {
        let mut sets = Vec::new();
        let mut fallback = None;
        for child in ifelse.child_elements() {
            let default = match child.local_name() {
                "if" | "else-if" => {
                    sets.push(read_branch(child, field_name)?);
                    continue;
                }
                "else" => read_condition_set(child, field_name)?,
                // default written directly under <ifelse>
                "value" => ConditionSet::from_parts(
                    Vec::new(),
                    child.text_content().trim(),
                    OutputFormat::Value,
                ),
                "src" => ConditionSet::from_parts(
                    Vec::new(),
                    child.text_content().trim(),
                    OutputFormat::Source,
                ),
                other => {
                    warn!(field = %field_name, element = other, "ignoring element in <ifelse>");
                    continue;
                }
            };
            if fallback.is_some() {
                warn!(field = %field_name, element = child.local_name(), "ignoring second default in <ifelse>");
            } else {
                fallback = Some(default);
            }
        }
        sets.extend(fallback);
        if sets.is_empty() {
            return Ok(DerivedMapping::default());
        }
        return DerivedMapping::from_sets(sets);
    }

    if let Some(ctable) = field.find_child("ctable") {
        let table = read_ctable(ctable, field_name)?;
        let sets: Vec<ConditionSet> = table
            .rows()
            .iter()
            .map(|row| {
                let conditions = table
                    .sources()
                    .iter()
                    .zip(&row.keys)
                    .map(|(source, key)| Condition::new(source.as_str(), Operator::Equals, key.as_str()))
                    .collect();
                ConditionSet::from_parts(conditions, row.output.as_str(), OutputFormat::Value)
            })
            .collect();
        if !sets.is_empty() {
            return DerivedMapping::from_sets(sets);
        }
    }

    Ok(DerivedMapping::default())
}

/// Read an `if` or `else-if` element
///
/// A branch without `cond` elements needs either an `and` (an explicitly
/// empty condition list) or a `ref`, which becomes a single EQUALS condition
/// on the reference value.
fn read_branch(element: &Element, field_name: &str) -> Result<ConditionSet> {
    let set = read_condition_set(element, field_name)?;
    if !set.conditions().is_empty() || element.find_child("and").is_some() {
        return Ok(set);
    }

    let reference = element.child_text("ref").ok_or_else(|| {
        field_error(
            field_name,
            format!("<{}> branch has no <and> or <ref>", element.local_name()),
        )
    })?;
    let source_field = match set.output_format() {
        OutputFormat::Source => set.result_value().to_string(),
        OutputFormat::Value => String::new(),
    };
    Ok(ConditionSet::from_parts(
        vec![Condition::new(source_field, Operator::Equals, reference)],
        set.result_value(),
        set.output_format(),
    ))
}

/// Read the conditions and result of a branch or `else`
///
/// Conditions are the `cond` elements beneath it; a direct `src` child makes
/// the result a source reference, otherwise a direct `value` child is the
/// literal result.
fn read_condition_set(element: &Element, field_name: &str) -> Result<ConditionSet> {
    let conditions = element
        .descendants("cond")
        .into_iter()
        .map(|cond| {
            let operator = match cond.child_text("oper").filter(|o| !o.is_empty()) {
                Some(text) => text
                    .parse::<Operator>()
                    .map_err(|e| field_error(field_name, e.to_string()))?,
                None => Operator::default(),
            };
            Ok(Condition {
                source_field: cond.child_text("src").unwrap_or_default(),
                operator,
                value: cond.child_text("value").unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (result, format) = match element.child_text("src") {
        Some(src) => (src, OutputFormat::Source),
        None => (element.child_text("value").unwrap_or_default(), OutputFormat::Value),
    };
    Ok(ConditionSet::from_parts(conditions, result, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableRow;

    fn parse_one(xml: &str) -> MappingEntry {
        let mut entries = parse(xml).unwrap();
        assert_eq!(entries.len(), 1);
        entries.remove(0)
    }

    #[test]
    fn test_passed_through_field() {
        let entry = parse_one(
            "<mappings><field><dest>OrderQty</dest><mapping-type>PASSED_THROUGH</mapping-type><src>38</src></field></mappings>",
        );
        assert_eq!(entry.field_name, "OrderQty");
        assert_eq!(entry.mapping_type, MappingType::PASSED_THROUGH);
        assert_eq!(entry.source, "38");
        assert!(entry.mapped_data.is_none());
    }

    #[test]
    fn test_defaults_when_children_missing() {
        let entry = parse_one("<root><field><dest>Account</dest></field></root>");
        assert_eq!(entry.mapping_type, MappingType::NONE);
        assert_eq!(entry.notes, "");
        assert!(entry.tickets.is_empty());
        assert_eq!(entry.status, None);
    }

    #[test]
    fn test_dest_with_nested_markup() {
        let entry = parse_one("<root><field><dest>\n  Order<i>Qty</i>\n</dest></field></root>");
        assert_eq!(entry.field_name, "OrderQty");
    }

    #[test]
    fn test_tickets_and_status() {
        let entry = parse_one(
            "<root><field><dest>A</dest><status>GOOD</status>\
             <tickets><jira>ABC-1</jira><jira> ABC-1 </jira></tickets><jira>XYZ-2</jira></field></root>",
        );
        assert_eq!(entry.tickets.iter().collect::<Vec<_>>(), vec!["ABC-1", "XYZ-2"]);
        assert_eq!(entry.status.as_deref(), Some("GOOD"));
    }

    #[test]
    fn test_missing_src_is_parse_error() {
        let err = parse("<root><field><dest>A</dest><mapping-type>DEFAULTED</mapping-type></field></root>")
            .unwrap_err();
        match err {
            Error::Parse(e) => assert_eq!(e.location.as_deref(), Some("field 'A'")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_mapping_type_is_parse_error() {
        let err = parse("<root><field><dest>A</dest><mapping-type>COPIED</mapping-type></field></root>")
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_direct_table() {
        let entry = parse_one(
            r#"<root><field><dest>Side</dest><mapping-type>MAPPED</mapping-type>
            <ctable><cols><src>54</src><src>40</src></cols>
              <row><value>1</value><value>2</value><value>BUY_LIMIT</value></row>
              <row><value>2</value><value>1</value><value>SELL_MARKET</value></row>
            </ctable></field></root>"#,
        );
        let table = match entry.mapped_data.unwrap() {
            MappedTable::Direct(table) => table,
            other => panic!("expected direct table, got {:?}", other),
        };
        assert_eq!(table.sources(), &["54".to_string(), "40".to_string()]);
        assert_eq!(
            table.rows()[0],
            TableRow {
                keys: vec!["1".to_string(), "2".to_string()],
                output: "BUY_LIMIT".to_string()
            }
        );
    }

    #[test]
    fn test_conditional_table() {
        let entry = parse_one(
            r#"<root><field><dest>Side</dest><mapping-type>MAPPED</mapping-type>
            <ifelse>
              <if><ref>IS_EQUITY</ref><ctable><cols><src>54</src></cols><row><value>1</value><value>B</value></row></ctable></if>
              <if><ref>IS_FX</ref><ctable><cols><src>54</src></cols></ctable></if>
            </ifelse></field></root>"#,
        );
        match entry.mapped_data.unwrap() {
            MappedTable::Conditional { branches } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[0].reference, "IS_EQUITY");
                assert_eq!(branches[0].table.rows()[0].output, "B");
                assert!(branches[1].table.rows().is_empty());
            }
            other => panic!("expected conditional table, got {:?}", other),
        }
    }

    #[test]
    fn test_mapped_shape_errors() {
        assert!(parse("<r><field><dest>A</dest><mapping-type>MAPPED</mapping-type></field></r>").is_err());
        assert!(parse(
            "<r><field><dest>A</dest><mapping-type>MAPPED</mapping-type><ifelse><if><ref>X</ref></if></ifelse></field></r>"
        )
        .is_err());
        assert!(parse(
            "<r><field><dest>A</dest><mapping-type>MAPPED</mapping-type>\
             <ctable><cols><src>1</src><src>2</src></cols><row><value>x</value><value>y</value></row></ctable></field></r>"
        )
        .is_err());
    }

    #[test]
    fn test_derived_condition_sets() {
        let entry = parse_one(
            r#"<root><field><dest>Px</dest><mapping-type>DERIVED</mapping-type>
            <ifelse>
              <if><and><cond><src>40</src><oper>EQUALS</oper><value>2</value></cond></and><src>44</src></if>
              <else-if><and><cond><src>40</src><oper>NOT_EQUALS</oper><value>1</value></cond></and><value>0</value></else-if>
              <value>DEFAULT</value>
            </ifelse></field></root>"#,
        );
        let derived = entry.derived_mapping.unwrap();
        let sets = derived.condition_sets();
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].output_format(), OutputFormat::Source);
        assert_eq!(sets[0].result_value(), "44");
        assert_eq!(sets[1].conditions()[0].operator, Operator::NotEquals);
        assert_eq!(sets[1].result_value(), "0");
        assert!(sets[2].conditions().is_empty());
        assert_eq!(sets[2].result_value(), "DEFAULT");
        assert_eq!(derived.legacy_value(), "44");
    }

    #[test]
    fn test_derived_ref_branches() {
        let entry = parse_one(
            r#"<root><field><dest>Px</dest><mapping-type>DERIVED</mapping-type>
            <ifelse>
              <if><ref>IS_EQ</ref><value>A</value></if>
              <if><ref>IS_FX</ref><src>55</src></if>
              <else><value>C</value></else>
            </ifelse></field></root>"#,
        );
        let derived = entry.derived_mapping.unwrap();
        let sets = derived.condition_sets();
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].conditions(), &[Condition::new("", Operator::Equals, "IS_EQ")]);
        assert_eq!(sets[0].result_value(), "A");
        assert_eq!(sets[1].conditions(), &[Condition::new("55", Operator::Equals, "IS_FX")]);
        assert_eq!(sets[1].output_format(), OutputFormat::Source);
        assert!(sets[2].conditions().is_empty());
        assert_eq!(sets[2].result_value(), "C");
    }

    #[test]
    fn test_derived_empty_and_branch() {
        let entry = parse_one(
            r#"<root><field><dest>Px</dest><mapping-type>DERIVED</mapping-type>
            <ifelse><if><and/><value>FIRST</value></if><else-if><and/><value>SECOND</value></else-if></ifelse>
            </field></root>"#,
        );
        let derived = entry.derived_mapping.unwrap();
        let results: Vec<&str> = derived.condition_sets().iter().map(|s| s.result_value()).collect();
        assert_eq!(results, vec!["FIRST", "SECOND"]);
        assert!(derived.condition_sets().iter().all(|s| s.conditions().is_empty()));
    }

    #[test]
    fn test_derived_branch_without_conditions_is_error() {
        let err = parse(
            "<r><field><dest>Px</dest><mapping-type>DERIVED</mapping-type>\
             <ifelse><if><value>A</value></if></ifelse></field></r>",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("no <and> or <ref>"));
    }

    #[test]
    fn test_derived_second_default_ignored() {
        let entry = parse_one(
            r#"<root><field><dest>Px</dest><mapping-type>DERIVED</mapping-type>
            <ifelse><else><value>ONE</value></else><else><value>TWO</value></else></ifelse>
            </field></root>"#,
        );
        let derived = entry.derived_mapping.unwrap();
        assert_eq!(derived.condition_sets().len(), 1);
        assert_eq!(derived.condition_sets()[0].result_value(), "ONE");
    }

    #[test]
    fn test_derived_from_ctable() {
        let entry = parse_one(
            r#"<root><field><dest>Px</dest><mapping-type>DERIVED</mapping-type>
            <ctable><cols><src>54</src></cols><row><value>1</value><value>BUY</value></row></ctable>
            </field></root>"#,
        );
        let derived = entry.derived_mapping.unwrap();
        let set = &derived.condition_sets()[0];
        assert_eq!(set.conditions(), &[Condition::new("54", Operator::Equals, "1")]);
        assert_eq!(set.result_value(), "BUY");
    }

    #[test]
    fn test_derived_without_rules() {
        let entry = parse_one("<r><field><dest>A</dest><mapping-type>DERIVED</mapping-type></field></r>");
        assert_eq!(entry.derived_mapping, Some(DerivedMapping::default()));
    }

    #[test]
    fn test_fields_at_any_depth_sorted_by_name() {
        let entries = parse(
            "<mappings><field><dest>beta</dest></field><group><field><dest>Alpha</dest></field></group>\
             <field><dest>Gamma</dest></field></mappings>",
        )
        .unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "Gamma"]);
    }

    #[test]
    fn test_empty_document_and_malformed_input() {
        assert!(parse("<mappings/>").unwrap().is_empty());
        assert!(matches!(parse("<mappings><field>").unwrap_err(), Error::Parse(_)));
    }

    #[test]
    fn test_field_limit() {
        let limits = Limits {
            max_fields: 1,
            ..Limits::default()
        };
        let xml = "<r><field><dest>A</dest></field><field><dest>B</dest></field></r>";
        assert!(matches!(parse_with_limits(xml, &limits), Err(Error::LimitExceeded(_))));
    }
}
