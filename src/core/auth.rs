//! Authorization model for resource requests
//!
//! Three layers decide whether a caller may act:
//! - the credential gate ([`crate::core::credential`]) establishes a [`Principal`]
//! - a [`PermissionOracle`] answers whether the principal holds the endpoint permission
//! - a [`RecordAuthorizer`] answers whether the principal may apply an [`Action`]
//!   to one record, and which record ids it may read at all

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The owner of a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Tenant-scoped principal (a company user)
    pub id: String,
    /// Global user behind the principal
    pub user_id: String,
    /// Tenant (company) the principal belongs to
    pub tenant_id: String,
}

impl Principal {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
        }
    }
}

/// A CRUD action as seen by ability checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Destroy,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record-level ability policy
///
/// Policies can be declared in YAML through [`AbilityPolicy::parse_policy`]
/// or composed in code.
#[derive(Debug, Clone)]
pub enum AbilityPolicy {
    /// Every principal may act
    Allow,

    /// Nobody may act
    Deny,

    /// The record's field must equal the principal's tenant
    SameTenant(String),

    /// The record's field must equal the principal's id
    Owner(String),

    /// The inner policy applies to the listed actions, everything else is denied
    Actions(Vec<Action>, Box<AbilityPolicy>),

    /// Combination of policies (AND)
    And(Vec<AbilityPolicy>),

    /// Combination of policies (OR)
    Or(Vec<AbilityPolicy>),

    /// Custom policy function
    Custom(fn(&Principal, Action, &Value) -> bool),
}

impl AbilityPolicy {
    /// Check whether the principal may apply the action to the record
    pub fn check(&self, principal: &Principal, action: Action, record: &Value) -> bool {
        match self {
            AbilityPolicy::Allow => true,

            AbilityPolicy::Deny => false,

            AbilityPolicy::SameTenant(field) => field_equals(record, field, &principal.tenant_id),

            AbilityPolicy::Owner(field) => field_equals(record, field, &principal.id),

            AbilityPolicy::Actions(actions, inner) => {
                actions.contains(&action) && inner.check(principal, action, record)
            }

            AbilityPolicy::And(policies) => {
                policies.iter().all(|p| p.check(principal, action, record))
            }

            AbilityPolicy::Or(policies) => {
                policies.iter().any(|p| p.check(principal, action, record))
            }

            AbilityPolicy::Custom(f) => f(principal, action, record),
        }
    }

    /// Parse policy from string (for YAML config)
    ///
    /// Unknown strings deny.
    pub fn parse_policy(s: &str) -> Self {
        match s.trim() {
            "allow" => AbilityPolicy::Allow,
            "deny" => AbilityPolicy::Deny,
            s if s.starts_with("tenant:") => {
                AbilityPolicy::SameTenant(s["tenant:".len()..].to_string())
            }
            s if s.starts_with("owner:") => AbilityPolicy::Owner(s["owner:".len()..].to_string()),
            s if s.starts_with("read_only:") => AbilityPolicy::Actions(
                vec![Action::Read],
                Box::new(AbilityPolicy::parse_policy(&s["read_only:".len()..])),
            ),
            _ => AbilityPolicy::Deny,
        }
    }
}

fn field_equals(record: &Value, field: &str, expected: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        _ => false,
    }
}

/// Answers whether a principal holds a named permission
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    async fn has_permission(&self, principal: &Principal, permission: &str) -> Result<bool>;
}

/// Per-resource record ability capability
#[async_trait]
pub trait RecordAuthorizer: Send + Sync {
    /// Decide whether the principal may apply `action` to `record`
    async fn authorize(&self, principal: &Principal, action: Action, record: &Value)
    -> Result<bool>;

    /// Ids of the records the principal may read
    ///
    /// Used to scope listings of resources that have no tenant field.
    async fn accessible_ids(&self, _principal: &Principal) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl RecordAuthorizer for AbilityPolicy {
    async fn authorize(
        &self,
        principal: &Principal,
        action: Action,
        record: &Value,
    ) -> Result<bool> {
        Ok(self.check(principal, action, record))
    }
}

/// Permission oracle granting everything (for development)
pub struct AllowAllPermissions;

#[async_trait]
impl PermissionOracle for AllowAllPermissions {
    async fn has_permission(&self, _: &Principal, _: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Permission oracle backed by a static grant table keyed by principal id
#[derive(Debug, Default, Clone)]
pub struct StaticPermissions {
    grants: HashMap<String, HashSet<String>>,
}

impl StaticPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, principal_id: impl Into<String>, permission: impl Into<String>) -> Self {
        self.grants
            .entry(principal_id.into())
            .or_default()
            .insert(permission.into());
        self
    }
}

#[async_trait]
impl PermissionOracle for StaticPermissions {
    async fn has_permission(&self, principal: &Principal, permission: &str) -> Result<bool> {
        Ok(self
            .grants
            .get(&principal.id)
            .is_some_and(|perms| perms.contains(permission)))
    }
}
