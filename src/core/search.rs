//! Search and record-store collaborator contracts

use crate::core::expression::MATCH_ALL;
use crate::core::filter::{Filter, SortSpec};
use crate::core::include::IncludeTree;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

/// A fully validated, tenant-scoped search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Filters every hit must match (base scope first, then user filters)
    pub must: Vec<Filter>,
    /// Filters no hit may match
    pub must_not: Vec<Filter>,
    /// Full-text term, `*` for everything
    pub text: String,
    /// Internal names of the declared text fields free text may match
    pub text_fields: Vec<String>,
    pub sort: SortSpec,
    /// 1-based page
    pub page: usize,
    pub per_page: usize,
    pub includes: IncludeTree,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            must: Vec::new(),
            must_not: Vec::new(),
            text: MATCH_ALL.to_string(),
            text_fields: Vec::new(),
            sort: SortSpec::default(),
            page: 1,
            per_page: 1,
            includes: IncludeTree::default(),
        }
    }
}

impl SearchQuery {
    /// Index of the first hit, saturating for absurd page numbers
    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }

    pub fn matches_all_text(&self) -> bool {
        let text = self.text.trim();
        text.is_empty() || text == MATCH_ALL
    }

    /// Full-text clause
    ///
    /// Free text never reaches a query parser with field syntax: it is a
    /// `simple_query_string` restricted to the declared text fields, and
    /// matches nothing when none are declared.
    pub fn text_query(&self) -> Value {
        if self.matches_all_text() {
            json!({ "match_all": {} })
        } else if self.text_fields.is_empty() {
            json!({ "match_none": {} })
        } else {
            json!({
                "simple_query_string": {
                    "query": self.text,
                    "fields": self.text_fields,
                    "default_operator": "and",
                    "flags": "AND|OR|NOT|PHRASE|PREFIX|WHITESPACE|PRECEDENCE|ESCAPE",
                }
            })
        }
    }

    /// Search-engine request body
    pub fn to_body(&self) -> Value {
        json!({
            "query": {
                "bool": {
                    "must": self.must.iter().map(Filter::to_query).collect::<Vec<_>>(),
                    "must_not": self.must_not.iter().map(Filter::to_query).collect::<Vec<_>>(),
                    "filter": self.text_query(),
                }
            },
            "sort": self.sort.to_query(),
            "from": self.offset(),
            "size": self.per_page,
            "track_total_hits": true,
        })
    }
}

/// One page of hits plus the total hit count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub records: Vec<Value>,
    pub total: usize,
}

/// Executes searches for a resource type
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, resource_type: &str, query: &SearchQuery) -> Result<SearchPage>;
}

/// Loads single records by id
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find(&self, resource_type: &str, id: &str) -> Result<Option<Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let query = SearchQuery {
            page: 3,
            per_page: 20,
            ..Default::default()
        };
        assert_eq!(query.offset(), 40);
        assert_eq!(SearchQuery::default().offset(), 0);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let query = SearchQuery {
            page: usize::MAX,
            per_page: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), usize::MAX);
    }

    #[test]
    fn test_body_shape() {
        let query = SearchQuery {
            must: vec![Filter::term("company_id", "c-1")],
            must_not: vec![Filter::term("owner_id", "U1")],
            text: "review".into(),
            text_fields: vec!["name".into()],
            page: 2,
            per_page: 10,
            ..Default::default()
        };
        let body = query.to_body();
        assert_eq!(body["query"]["bool"]["must"][0], json!({ "term": { "company_id": "c-1" } }));
        assert_eq!(body["query"]["bool"]["must_not"][0], json!({ "term": { "owner_id": "U1" } }));
        let text = &body["query"]["bool"]["filter"]["simple_query_string"];
        assert_eq!(text["query"], "review");
        assert_eq!(text["fields"], json!(["name"]));
        assert_eq!(body["from"], 10);
        assert_eq!(body["size"], 10);
        assert_eq!(body["sort"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_field_syntax_in_text_stays_text() {
        let parsed = crate::core::expression::parse_expression("(color:red) review");
        assert!(parsed.clauses.is_empty());

        let query = SearchQuery {
            text: parsed.text,
            text_fields: vec!["name".into()],
            ..Default::default()
        };
        let filter = &query.to_body()["query"]["bool"]["filter"];
        assert!(filter.get("query_string").is_none());
        assert_eq!(filter["simple_query_string"]["fields"], json!(["name"]));
    }

    #[test]
    fn test_text_without_text_fields_matches_nothing() {
        let query = SearchQuery {
            text: "review".into(),
            ..Default::default()
        };
        assert_eq!(query.text_query(), json!({ "match_none": {} }));
        assert_eq!(SearchQuery::default().text_query(), json!({ "match_all": {} }));
    }

    #[test]
    fn test_matches_all_text() {
        assert!(SearchQuery::default().matches_all_text());
        let query = SearchQuery {
            text: "x".into(),
            ..Default::default()
        };
        assert!(!query.matches_all_text());
    }
}
