//! Compact filter expression language used by the `q` parameter
//!
//! ```text
//! q = status:active -owner:U1 name:"Jane Doe" quarterly review
//! ```
//!
//! Groups are whitespace separated; a double-quoted run stays atomic. A group
//! shaped like `field:value` (optionally `-field:value`) becomes a
//! [`FilterClause`]; everything else is residual full text.
//!
//! Negation written on the value side (`owner:-U1`) is left in the value:
//! whether a leading `-` negates or is a literal (a negative number) depends
//! on the field's declared type, which only [`crate::core::filter`] knows.

use regex::Regex;
use std::sync::LazyLock;

/// Full-text term used when a query carries no residual text
pub const MATCH_ALL: &str = "*";

static CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(-?)([A-Za-z_][A-Za-z0-9_.]*):(.*)$").expect("clause pattern is valid")
});

/// A parsed `field:value` group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    /// `-` written before the field
    pub negated: bool,
    pub field: String,
    /// Raw value, quotes removed
    pub value: String,
}

impl FilterClause {
    pub fn new(negated: bool, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            negated,
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Clauses plus residual text extracted from an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    pub clauses: Vec<FilterClause>,
    /// Residual text re-joined with single spaces; [`MATCH_ALL`] when empty
    pub text: String,
}

impl Default for ParsedExpression {
    fn default() -> Self {
        Self {
            clauses: Vec::new(),
            text: MATCH_ALL.to_string(),
        }
    }
}

/// Parse a filter expression
///
/// # Examples
///
/// ```
/// use resource_api::core::expression::parse_expression;
///
/// let parsed = parse_expression("status:open -owner:U1 late");
/// assert_eq!(parsed.clauses.len(), 2);
/// assert!(parsed.clauses[1].negated);
/// assert_eq!(parsed.text, "late");
/// ```
pub fn parse_expression(input: &str) -> ParsedExpression {
    let mut parsed = ParsedExpression::default();
    let mut residual: Vec<String> = Vec::new();

    for group in tokenize(input) {
        match CLAUSE.captures(&group) {
            Some(caps) => {
                let value = unquote(&caps[3]);
                if value.is_empty() || value == "-" {
                    residual.push(group);
                } else {
                    parsed
                        .clauses
                        .push(FilterClause::new(!caps[1].is_empty(), &caps[2], value));
                }
            }
            None => residual.push(group),
        }
    }

    if !residual.is_empty() {
        parsed.text = residual.join(" ");
    }
    parsed
}

/// Split on whitespace outside double quotes
fn tokenize(input: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Strip one pair of surrounding quotes, keeping a leading `-` outside them
fn unquote(value: &str) -> String {
    let (sign, rest) = match value.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", value),
    };
    let inner = rest
        .strip_prefix('"')
        .map(|r| r.strip_suffix('"').unwrap_or(r))
        .unwrap_or(rest);
    format!("{}{}", sign, inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_expression_matches_all() {
        assert_eq!(parse_expression(""), ParsedExpression::default());
        assert_eq!(parse_expression("   ").text, MATCH_ALL);
    }

    #[test]
    fn test_single_clause() {
        let parsed = parse_expression("status:open");
        assert_eq!(parsed.clauses, vec![FilterClause::new(false, "status", "open")]);
        assert_eq!(parsed.text, MATCH_ALL);
    }

    #[test]
    fn test_field_negation() {
        let parsed = parse_expression("-status:archived");
        assert_eq!(parsed.clauses, vec![FilterClause::new(true, "status", "archived")]);
    }

    #[test]
    fn test_value_negation_kept_in_value() {
        let parsed = parse_expression("owner:-U1");
        assert_eq!(parsed.clauses, vec![FilterClause::new(false, "owner", "-U1")]);
    }

    #[test]
    fn test_quoted_value_is_atomic() {
        let parsed = parse_expression(r#"name:"Jane Doe" status:open"#);
        assert_eq!(
            parsed.clauses,
            vec![
                FilterClause::new(false, "name", "Jane Doe"),
                FilterClause::new(false, "status", "open"),
            ]
        );
    }

    #[test]
    fn test_residual_text_keeps_order() {
        let parsed = parse_expression("quarterly status:open   review");
        assert_eq!(parsed.text, "quarterly review");
        assert_eq!(parsed.clauses.len(), 1);
    }

    #[test]
    fn test_non_identifier_colon_is_text() {
        let parsed = parse_expression("10:30 :x 3d:y");
        assert!(parsed.clauses.is_empty());
        assert_eq!(parsed.text, "10:30 :x 3d:y");
    }

    #[test]
    fn test_empty_value_is_text() {
        let parsed = parse_expression("status: owner:-");
        assert!(parsed.clauses.is_empty());
        assert_eq!(parsed.text, "status: owner:-");
    }

    #[test]
    fn test_dotted_field() {
        let parsed = parse_expression("owner.email:a@b.c");
        assert_eq!(parsed.clauses, vec![FilterClause::new(false, "owner.email", "a@b.c")]);
    }

    #[test]
    fn test_value_with_colon() {
        let parsed = parse_expression("url:http://x");
        assert_eq!(parsed.clauses, vec![FilterClause::new(false, "url", "http://x")]);
    }

    #[test]
    fn test_quoted_negated_value() {
        let parsed = parse_expression(r#"owner:-"Jane Doe""#);
        assert_eq!(parsed.clauses, vec![FilterClause::new(false, "owner", "-Jane Doe")]);
    }
}
