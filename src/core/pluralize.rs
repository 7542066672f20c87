//! English inflection helpers used by the resource naming conventions
//!
//! Route identities are plural snake_case (`company_tests`); conventions
//! derive the resource type (`company_test`), the human model name
//! (`company test`) and CamelCase identities (`CompanyTests::Create`).

/// Words whose singular form does not follow the suffix rules
const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("analyses", "analysis"),
    ("statuses", "status"),
    ("aliases", "alias"),
    ("policies", "policy"),
    ("lives", "life"),
    ("knives", "knife"),
    ("wives", "wife"),
];

/// Words that are the same in singular and plural
const UNCOUNTABLE: &[&str] = &["data", "evidence", "information", "equipment", "series", "news"];

/// Inflection for snake_case resource identities
pub struct Pluralizer;

impl Pluralizer {
    /// Convert a plural noun to its singular form
    ///
    /// Only the last `_`-separated word is inflected.
    ///
    /// # Examples
    ///
    /// ```
    /// use resource_api::core::pluralize::Pluralizer;
    ///
    /// assert_eq!(Pluralizer::singularize("company_tests"), "company_test");
    /// assert_eq!(Pluralizer::singularize("companies"), "company");
    /// assert_eq!(Pluralizer::singularize("company_users"), "company_user");
    /// ```
    pub fn singularize(plural: &str) -> String {
        match plural.rsplit_once('_') {
            Some((head, last)) => format!("{}_{}", head, Self::singularize_word(last)),
            None => Self::singularize_word(plural),
        }
    }

    fn singularize_word(word: &str) -> String {
        if word.is_empty() || UNCOUNTABLE.contains(&word) {
            return word.to_string();
        }
        if let Some((_, singular)) = IRREGULAR.iter().find(|(p, _)| *p == word) {
            return singular.to_string();
        }

        match word {
            s if s.ends_with("ies") && s.len() > 3 => format!("{}y", &s[..s.len() - 3]),
            s if s.ends_with("ves") && s.len() > 3 => format!("{}f", &s[..s.len() - 3]),
            s if s.len() > 3
                && (s.ends_with("sses")
                    || s.ends_with("shes")
                    || s.ends_with("ches")
                    || s.ends_with("xes")
                    || s.ends_with("zes")) =>
            {
                s[..s.len() - 2].to_string()
            }
            s if s.ends_with("oes") && s.len() > 3 => s[..s.len() - 2].to_string(),
            s if s.ends_with("ss") || s.ends_with("us") || s.ends_with("is") => s.to_string(),
            s if s.ends_with('s') && s.len() > 1 => s[..s.len() - 1].to_string(),
            s => s.to_string(),
        }
    }

    /// `company_tests` → `CompanyTests`
    pub fn camelize(snake: &str) -> String {
        snake
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect()
    }

    /// `company_test` → `company test`
    pub fn humanize(snake: &str) -> String {
        snake
            .split('_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
