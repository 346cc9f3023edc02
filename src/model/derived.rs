//! Rule-based (DERIVED) mappings
//!
//! A derived mapping is an ordered list of condition sets. Each set holds
//! conditions on source fields and a result; the result is either a literal
//! value or, with [`OutputFormat::Source`], the identifier of a source field.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// Comparison applied by a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Source equals value
    #[default]
    Equals,
    /// Source differs from value
    NotEquals,
    /// Source contains value
    Contains,
    /// Source does not contain value
    NotContains,
    /// Source starts with value
    StartsWith,
    /// Source ends with value
    EndsWith,
}

impl Operator {
    /// Textual form used in mapping files
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::NotEquals => "NOT_EQUALS",
            Operator::Contains => "CONTAINS",
            Operator::NotContains => "NOT_CONTAINS",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "EQUALS" => Ok(Operator::Equals),
            "NOT_EQUALS" => Ok(Operator::NotEquals),
            "CONTAINS" => Ok(Operator::Contains),
            "NOT_CONTAINS" => Ok(Operator::NotContains),
            "STARTS_WITH" => Ok(Operator::StartsWith),
            "ENDS_WITH" => Ok(Operator::EndsWith),
            other => Err(Error::Value(format!("unknown operator '{}'", other))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a condition set's result is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputFormat {
    /// Literal configured value, written as `<value>`
    #[default]
    Value,
    /// Source field identifier, written as `<src>`
    Source,
}

/// One rule condition
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Source field the condition looks at
    pub source_field: String,
    /// Comparison
    #[serde(default)]
    pub operator: Operator,
    /// Value compared against
    #[serde(default)]
    pub value: String,
}

impl Condition {
    /// Create a condition
    pub fn new(source_field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            source_field: source_field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Conditions plus their result policy
///
/// With [`OutputFormat::Source`] and at least one condition, the result
/// mirrors the source field of the last edited condition (the last condition
/// when none was edited yet) and cannot be set directly. Values read from a
/// file are kept as written until the set is edited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSet {
    #[serde(default)]
    conditions: Vec<Condition>,
    #[serde(default)]
    result_value: String,
    #[serde(default)]
    output_format: OutputFormat,
    #[serde(skip)]
    last_edited: Option<usize>,
}

impl PartialEq for ConditionSet {
    fn eq(&self, other: &Self) -> bool {
        self.conditions == other.conditions
            && self.result_value == other.result_value
            && self.output_format == other.output_format
    }
}

impl ConditionSet {
    /// Create an empty set with the given output format
    pub fn new(output_format: OutputFormat) -> Self {
        Self {
            output_format,
            ..Self::default()
        }
    }

    /// Build a set from stored parts without re-deriving the result
    pub fn from_parts(
        conditions: Vec<Condition>,
        result_value: impl Into<String>,
        output_format: OutputFormat,
    ) -> Self {
        Self {
            conditions,
            result_value: result_value.into(),
            output_format,
            last_edited: None,
        }
    }

    /// Conditions in order
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Result value
    pub fn result_value(&self) -> &str {
        &self.result_value
    }

    /// Output format
    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// True when the result is bound to a condition's source field
    pub fn is_result_bound(&self) -> bool {
        self.output_format == OutputFormat::Source && !self.conditions.is_empty()
    }

    /// Append a condition and return its index
    pub fn add_condition(&mut self, condition: Condition) -> usize {
        self.conditions.push(condition);
        let index = self.conditions.len() - 1;
        self.last_edited = Some(index);
        self.sync_result();
        index
    }

    /// Replace the condition at `index`
    pub fn set_condition(&mut self, index: usize, condition: Condition) -> Result<()> {
        *self.condition_mut(index)? = condition;
        self.last_edited = Some(index);
        self.sync_result();
        Ok(())
    }

    /// Change the source field of the condition at `index`
    pub fn set_condition_source(&mut self, index: usize, source_field: impl Into<String>) -> Result<()> {
        self.condition_mut(index)?.source_field = source_field.into();
        self.last_edited = Some(index);
        self.sync_result();
        Ok(())
    }

    /// Remove the condition at `index`
    pub fn remove_condition(&mut self, index: usize) -> Result<Condition> {
        if index >= self.conditions.len() {
            return Err(Error::out_of_range(index, self.conditions.len()));
        }
        let removed = self.conditions.remove(index);
        self.last_edited = match self.last_edited {
            Some(i) if i == index => None,
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        self.sync_result();
        Ok(removed)
    }

    /// Switch the output format; switching to `Source` re-derives the result
    pub fn set_output_format(&mut self, output_format: OutputFormat) {
        self.output_format = output_format;
        self.sync_result();
    }

    /// Set a literal result value
    pub fn set_result_value(&mut self, value: impl Into<String>) -> Result<()> {
        if self.is_result_bound() {
            return Err(Error::Invariant(
                "result of a source-format condition set follows its conditions".to_string(),
            ));
        }
        self.result_value = value.into();
        Ok(())
    }

    fn condition_mut(&mut self, index: usize) -> Result<&mut Condition> {
        let len = self.conditions.len();
        self.conditions
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, len))
    }

    fn sync_result(&mut self) {
        if self.output_format != OutputFormat::Source {
            return;
        }
        let bound = self
            .last_edited
            .and_then(|i| self.conditions.get(i))
            .or_else(|| self.conditions.last());
        if let Some(condition) = bound {
            self.result_value = condition.source_field.clone();
        }
    }
}

/// Derived mapping: a non-empty, ordered list of condition sets
///
/// The JSON form also carries `conditions` and `value` mirrored from the
/// first condition set for consumers of the single-set shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "DerivedMappingRepr")]
pub struct DerivedMapping {
    condition_sets: Vec<ConditionSet>,
}

impl Default for DerivedMapping {
    fn default() -> Self {
        Self {
            condition_sets: vec![ConditionSet::default()],
        }
    }
}

impl DerivedMapping {
    /// Build from condition sets; at least one is required
    pub fn from_sets(condition_sets: Vec<ConditionSet>) -> Result<Self> {
        if condition_sets.is_empty() {
            return Err(Error::Invariant(
                "a derived mapping needs at least one condition set".to_string(),
            ));
        }
        Ok(Self { condition_sets })
    }

    /// Condition sets in order
    pub fn condition_sets(&self) -> &[ConditionSet] {
        &self.condition_sets
    }

    /// Mutable access to the condition set at `index`
    pub fn condition_set_mut(&mut self, index: usize) -> Result<&mut ConditionSet> {
        let len = self.condition_sets.len();
        self.condition_sets
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, len))
    }

    /// Append a condition set and return its index
    pub fn add_condition_set(&mut self, set: ConditionSet) -> usize {
        self.condition_sets.push(set);
        self.condition_sets.len() - 1
    }

    /// Remove a condition set; the last remaining one cannot be removed
    pub fn remove_condition_set(&mut self, index: usize) -> Result<ConditionSet> {
        if index >= self.condition_sets.len() {
            return Err(Error::out_of_range(index, self.condition_sets.len()));
        }
        if self.condition_sets.len() == 1 {
            return Err(Error::Invariant(
                "cannot remove the only condition set".to_string(),
            ));
        }
        Ok(self.condition_sets.remove(index))
    }

    /// First set's conditions (single-set shape)
    pub fn legacy_conditions(&self) -> &[Condition] {
        self.condition_sets
            .first()
            .map(|s| s.conditions())
            .unwrap_or_default()
    }

    /// First set's result (single-set shape)
    pub fn legacy_value(&self) -> &str {
        self.condition_sets
            .first()
            .map(|s| s.result_value())
            .unwrap_or_default()
    }

    /// Check the non-empty invariant
    pub fn validate(&self) -> Result<()> {
        if self.condition_sets.is_empty() {
            return Err(Error::Serialization(
                "derived mapping has no condition sets".to_string(),
            ));
        }
        Ok(())
    }
}

impl Serialize for DerivedMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DerivedMapping", 3)?;
        state.serialize_field("conditionSets", &self.condition_sets)?;
        state.serialize_field("conditions", self.legacy_conditions())?;
        state.serialize_field("value", self.legacy_value())?;
        state.end()
    }
}

/// Accepts both the condition-set shape and the older single-set shape
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DerivedMappingRepr {
    #[serde(default)]
    condition_sets: Vec<ConditionSet>,
    #[serde(default)]
    conditions: Vec<Condition>,
    #[serde(default)]
    value: String,
}

impl From<DerivedMappingRepr> for DerivedMapping {
    fn from(repr: DerivedMappingRepr) -> Self {
        if !repr.condition_sets.is_empty() {
            return Self {
                condition_sets: repr.condition_sets,
            };
        }
        Self {
            condition_sets: vec![ConditionSet::from_parts(
                repr.conditions,
                repr.value,
                OutputFormat::Value,
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format_follows_condition() {
        let mut set = ConditionSet::new(OutputFormat::Source);
        set.add_condition(Condition::new("55", Operator::Equals, "IBM"));
        assert_eq!(set.result_value(), "55");

        set.add_condition(Condition::new("48", Operator::Equals, "X"));
        assert_eq!(set.result_value(), "48");

        set.set_condition_source(0, "207").unwrap();
        assert_eq!(set.result_value(), "207");

        assert!(matches!(set.set_result_value("free"), Err(Error::Invariant(_))));
    }

    #[test]
    fn test_switching_format_resyncs() {
        let mut set = ConditionSet::new(OutputFormat::Value);
        set.add_condition(Condition::new("55", Operator::Equals, "IBM"));
        set.set_result_value("LITERAL").unwrap();
        assert_eq!(set.result_value(), "LITERAL");

        set.set_output_format(OutputFormat::Source);
        assert_eq!(set.result_value(), "55");

        set.set_output_format(OutputFormat::Value);
        set.set_result_value("AGAIN").unwrap();
        assert_eq!(set.result_value(), "AGAIN");
    }

    #[test]
    fn test_remove_condition_rebinds() {
        let mut set = ConditionSet::new(OutputFormat::Source);
        set.add_condition(Condition::new("1", Operator::Equals, ""));
        set.add_condition(Condition::new("2", Operator::Equals, ""));
        set.set_condition_source(0, "10").unwrap();
        assert_eq!(set.result_value(), "10");

        set.remove_condition(0).unwrap();
        assert_eq!(set.result_value(), "2");
        assert!(set.remove_condition(5).is_err());
    }

    #[test]
    fn test_from_parts_keeps_stored_result() {
        let set = ConditionSet::from_parts(
            vec![Condition::new("55", Operator::Equals, "IBM")],
            "60",
            OutputFormat::Source,
        );
        assert_eq!(set.result_value(), "60");
    }

    #[test]
    fn test_last_condition_set_cannot_be_removed() {
        let mut derived = DerivedMapping::default();
        assert!(matches!(derived.remove_condition_set(0), Err(Error::Invariant(_))));
        derived.add_condition_set(ConditionSet::new(OutputFormat::Source));
        assert!(derived.remove_condition_set(0).is_ok());
        assert_eq!(derived.condition_sets().len(), 1);
        assert!(DerivedMapping::from_sets(Vec::new()).is_err());
    }

    #[test]
    fn test_legacy_projection_in_json() {
        let mut first = ConditionSet::new(OutputFormat::Value);
        first.add_condition(Condition::new("54", Operator::Equals, "1"));
        first.set_result_value("BUY").unwrap();
        let derived = DerivedMapping::from_sets(vec![first, ConditionSet::default()]).unwrap();

        let json = serde_json::to_value(&derived).unwrap();
        assert_eq!(json["value"], "BUY");
        assert_eq!(json["conditions"][0]["sourceField"], "54");
        assert_eq!(json["conditionSets"].as_array().unwrap().len(), 2);

        let back: DerivedMapping = serde_json::from_value(json).unwrap();
        assert_eq!(back, derived);
    }

    #[test]
    fn test_single_set_json_is_upgraded() {
        let json = r#"{"conditions":[{"sourceField":"54","operator":"NOT_EQUALS","value":"2"}],"value":"X"}"#;
        let derived: DerivedMapping = serde_json::from_str(json).unwrap();
        assert_eq!(derived.condition_sets().len(), 1);
        assert_eq!(derived.legacy_value(), "X");
        assert_eq!(derived.legacy_conditions()[0].operator, Operator::NotEquals);
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!("STARTS_WITH".parse::<Operator>().unwrap(), Operator::StartsWith);
        assert!("LIKE".parse::<Operator>().is_err());
        assert_eq!(Operator::NotContains.to_string(), "NOT_CONTAINS");
    }
}
