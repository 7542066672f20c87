//! Nested eager-load specifications from dotted include paths

use crate::core::error::ApiError;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Tree of relationships to eager-load, keyed by path segment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeTree {
    children: BTreeMap<String, IncludeTree>,
}

impl IncludeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated include parameter
    ///
    /// ```
    /// use resource_api::core::include::IncludeTree;
    /// use serde_json::json;
    ///
    /// let tree = IncludeTree::parse("b.c.d,b.c.e,a");
    /// assert_eq!(tree.to_value(), json!(["a", { "b": { "c": ["d", "e"] } }]));
    /// ```
    pub fn parse(input: &str) -> Self {
        Self::from_paths(parse_paths(input))
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        for path in paths {
            let segments: Vec<&str> = path
                .as_ref()
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            tree.insert(&segments);
        }
        tree
    }

    fn insert(&mut self, segments: &[&str]) {
        if let Some((first, rest)) = segments.split_first() {
            self.children
                .entry(first.to_string())
                .or_default()
                .insert(rest);
        }
    }

    /// Fold another tree into this one
    pub fn merge(&mut self, other: &IncludeTree) {
        for (name, child) in &other.children {
            self.children.entry(name.clone()).or_default().merge(child);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Top-level relationship names
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn child(&self, name: &str) -> Option<&IncludeTree> {
        self.children.get(name)
    }

    /// Reject roots outside an allow-list; an empty allow-list accepts all
    pub fn ensure_includable(&self, includable: &[String]) -> Result<(), ApiError> {
        if includable.is_empty() {
            return Ok(());
        }
        match self.roots().find(|root| !includable.iter().any(|i| i == root)) {
            Some(root) => Err(ApiError::bad_input(format!("unsupported include: {}", root))),
            None => Ok(()),
        }
    }

    /// Render as eager-load specification
    ///
    /// Leaves are bare names, inner nodes `{name: child}`; a child with a
    /// single entry collapses to that entry.
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.children
                .iter()
                .map(|(name, child)| {
                    if child.is_empty() {
                        Value::String(name.clone())
                    } else {
                        let mut node = Map::new();
                        node.insert(name.clone(), child.collapsed());
                        Value::Object(node)
                    }
                })
                .collect(),
        )
    }

    fn collapsed(&self) -> Value {
        match self.to_value() {
            Value::Array(mut entries) if entries.len() == 1 => entries.remove(0),
            other => other,
        }
    }
}

impl Serialize for IncludeTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Split an include parameter into sorted, trimmed, non-blank paths
pub fn parse_paths(input: &str) -> Vec<String> {
    let mut paths: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_includes() {
        let tree = IncludeTree::parse("owner,tags");
        assert_eq!(tree.to_value(), json!(["owner", "tags"]));
    }

    #[test]
    fn test_overlapping_paths_merge() {
        let tree = IncludeTree::parse("a.b.c,a.b.d");
        assert_eq!(tree.to_value(), json!([{ "a": { "b": ["c", "d"] } }]));
    }

    #[test]
    fn test_single_child_collapses() {
        let tree = IncludeTree::parse("manager.user");
        assert_eq!(tree.to_value(), json!([{ "manager": "user" }]));
    }

    #[test]
    fn test_prefix_and_longer_path() {
        let tree = IncludeTree::parse("owner.user,owner");
        assert_eq!(tree.to_value(), json!([{ "owner": "user" }]));
    }

    #[test]
    fn test_blank_segments_ignored() {
        let tree = IncludeTree::parse(" ,a..b, ,");
        assert_eq!(tree.to_value(), json!([{ "a": "b" }]));
        assert!(IncludeTree::parse("").is_empty());
    }

    #[test]
    fn test_merge_default_includes() {
        let mut tree = IncludeTree::parse("owner.user");
        tree.merge(&IncludeTree::from_paths(["access_role", "owner.company"]));
        assert_eq!(
            tree.to_value(),
            json!(["access_role", { "owner": ["company", "user"] }])
        );
    }

    #[test]
    fn test_ensure_includable() {
        let tree = IncludeTree::parse("owner.user,tags");
        assert!(tree.ensure_includable(&[]).is_ok());
        assert!(tree.ensure_includable(&["owner".into(), "tags".into()]).is_ok());

        let err = tree.ensure_includable(&["owner".into()]).unwrap_err();
        assert_eq!(err.public_message(), "unsupported include: tags");
    }

    #[test]
    fn test_parse_paths_sorted() {
        assert_eq!(parse_paths("b, a ,b,,c.d"), vec!["a", "b", "c.d"]);
    }

    #[test]
    fn test_serializes_as_value() {
        let tree = IncludeTree::parse("x.y");
        assert_eq!(serde_json::to_value(&tree).unwrap(), json!([{ "x": "y" }]));
    }
}
