//! Structural and value diff of two JSON documents
//!
//! Both documents are flattened to leaf paths (`order.legs[0].side`); paths
//! found on one side only are structural differences, shared paths with
//! unequal values are value differences. Paths on the exclusion list, and
//! everything beneath them, are left out of the result.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;

/// A shared path whose values differ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDifference {
    /// Leaf path
    pub path: String,
    /// Value in the left document
    pub left: Value,
    /// Value in the right document
    pub right: Value,
}

/// Result of [`compare`]; every list is sorted by path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JsonDiff {
    /// Paths present only in the left document
    pub only_in_left: Vec<String>,
    /// Paths present only in the right document
    pub only_in_right: Vec<String>,
    /// Shared paths with different values
    pub different_values: Vec<ValueDifference>,
}

impl JsonDiff {
    /// True when the documents match outside the excluded paths
    pub fn is_empty(&self) -> bool {
        self.only_in_left.is_empty()
            && self.only_in_right.is_empty()
            && self.different_values.is_empty()
    }
}

/// Paths the user chose to ignore, e.g. timestamps or generated ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionList(IndexSet<String>);

impl ExclusionList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a path; returns false if it already was
    pub fn exclude(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.0.contains(&path) {
            return false;
        }
        info!(path = %path, "field excluded");
        self.0.insert(path)
    }

    /// Include a previously excluded path again; returns false if it was not excluded
    pub fn include(&mut self, path: &str) -> bool {
        let removed = self.0.shift_remove(path);
        if removed {
            info!(path, "field un-excluded");
        }
        removed
    }

    /// True when `path` is excluded or lies beneath an excluded path
    pub fn is_excluded(&self, path: &str) -> bool {
        self.0.iter().any(|excluded| {
            path.strip_prefix(excluded.as_str())
                .map(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
                .unwrap_or(false)
        })
    }

    /// Excluded paths in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of excluded paths
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing is excluded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Flatten a document to its leaf values
///
/// Object members are joined with `.`, array items get `[i]`. Empty objects
/// and arrays have no leaves, and neither does a scalar document.
pub fn flatten(value: &Value) -> IndexMap<String, Value> {
    let mut leaves = IndexMap::new();
    flatten_into(value, "", &mut leaves);
    leaves
}

fn flatten_into(value: &Value, prefix: &str, leaves: &mut IndexMap<String, Value>) {
    let mut visit = |path: String, child: &Value| match child {
        Value::Object(_) | Value::Array(_) => flatten_into(child, &path, leaves),
        scalar => {
            leaves.insert(path, scalar.clone());
        }
    };
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                visit(path, child);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                visit(format!("{}[{}]", prefix, i), child);
            }
        }
        _ => {}
    }
}

/// Compare two documents
pub fn compare(left: &Value, right: &Value, exclusions: &ExclusionList) -> JsonDiff {
    let left = flatten(left);
    let right = flatten(right);
    let kept = |path: &&String| !exclusions.is_excluded(path);

    let mut diff = JsonDiff {
        only_in_left: left
            .keys()
            .filter(|p| !right.contains_key(*p))
            .filter(kept)
            .cloned()
            .collect(),
        only_in_right: right
            .keys()
            .filter(|p| !left.contains_key(*p))
            .filter(kept)
            .cloned()
            .collect(),
        different_values: left
            .iter()
            .filter(|(path, _)| !exclusions.is_excluded(path))
            .filter_map(|(path, value)| {
                let other = right.get(path)?;
                (other != value).then(|| ValueDifference {
                    path: path.clone(),
                    left: value.clone(),
                    right: other.clone(),
                })
            })
            .collect(),
    };
    diff.only_in_left.sort();
    diff.only_in_right.sort();
    diff.different_values.sort_by(|a, b| a.path.cmp(&b.path));

    debug!(
        only_in_left = diff.only_in_left.len(),
        only_in_right = diff.only_in_right.len(),
        different_values = diff.different_values.len(),
        "compared JSON documents"
    );
    diff
}

/// Parse and compare two JSON texts
pub fn compare_str(left: &str, right: &str, exclusions: &ExclusionList) -> Result<JsonDiff> {
    let left: Value = serde_json::from_str(left)?;
    let right: Value = serde_json::from_str(right)?;
    Ok(compare(&left, &right, exclusions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_flatten_paths() {
        let value = json!({"a": {"b": 1, "c": [true, {"d": null}]}, "e": {}, "f": []});
        let leaves = flatten(&value);
        let paths: Vec<&str> = leaves.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["a.b", "a.c[0]", "a.c[1].d"]);
        assert_eq!(leaves["a.b"], json!(1));
        assert!(flatten(&json!(42)).is_empty());
    }

    #[test]
    fn test_compare() {
        let left = json!({"id": 1, "side": "BUY", "legs": [{"qty": 5}]});
        let right = json!({"id": 2, "side": "BUY", "legs": [{"qty": 5}, {"qty": 7}], "extra": "x"});

        let diff = compare(&left, &right, &ExclusionList::new());
        assert!(diff.only_in_left.is_empty());
        assert_eq!(diff.only_in_right, vec!["extra", "legs[1].qty"]);
        assert_eq!(
            diff.different_values,
            vec![ValueDifference {
                path: "id".to_string(),
                left: json!(1),
                right: json!(2)
            }]
        );
    }

    #[test]
    fn test_type_change_is_value_difference() {
        let diff = compare(&json!({"a": 1}), &json!({"a": "1"}), &ExclusionList::new());
        assert_eq!(diff.different_values.len(), 1);
    }

    #[test]
    fn test_exclusions() {
        let mut exclusions = ExclusionList::new();
        assert!(exclusions.exclude("header"));
        assert!(!exclusions.exclude("header"));
        assert!(exclusions.is_excluded("header.time"));
        assert!(exclusions.is_excluded("header[0]"));
        assert!(!exclusions.is_excluded("headers"));

        let left = json!({"header": {"time": 1}, "body": 1});
        let right = json!({"header": {"time": 2, "seq": 3}, "body": 1});
        assert!(compare(&left, &right, &exclusions).is_empty());

        assert!(exclusions.include("header"));
        assert!(!exclusions.include("header"));
        assert!(!compare(&left, &right, &exclusions).is_empty());
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_exclusion_toggles_logged_once() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut exclusions = ExclusionList::new();
            exclusions.exclude("header");
            exclusions.exclude("header");
            exclusions.include("header");
            exclusions.include("header");
            exclusions.include("never");
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("field excluded").count(), 1);
        assert_eq!(output.matches("field un-excluded").count(), 1);
    }

    #[test]
    fn test_exclusion_list_json() {
        let list: ExclusionList = ["b", "a"].into_iter().collect();
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["b","a"]"#);
        let back: ExclusionList = serde_json::from_str(r#"["b","a"]"#).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn test_compare_str_rejects_invalid_json() {
        assert!(compare_str("{", "{}", &ExclusionList::new()).is_err());
        assert!(compare_str("[1]", "[1]", &ExclusionList::new()).unwrap().is_empty());
    }
}
