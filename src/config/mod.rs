//! Configuration loading and management
//!
//! [`ApiConfig`] holds the global paging and timeout settings plus per-resource
//! overrides. It loads from YAML and can be adjusted by environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `API_DEFAULT_PER_PAGE` | 1000 | Page size when none is requested |
//! | `API_MAX_PER_PAGE` | 1000 | Upper bound for requested page sizes |
//! | `API_BACKEND_TIMEOUT_MS` | 30000 | Timeout for search and handler calls |
//!
//! # Example
//!
//! ```yaml
//! default_per_page: 50
//! resources:
//!   - name: company_tests
//!     permission: tests
//!     tenant_field: company_id
//!     default_filters:
//!       - term: { field: visible, value: true }
//!     default_includes: [owner.user]
//!     fields:
//!       name: text
//!       owner: { key: owner_id, type: text }
//!       due: { key: due_date, type: date }
//! ```

use crate::core::auth::Action;
use crate::core::error::ConfigError;
use crate::core::filter::{FieldMapping, FieldType, Filter};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PER_PAGE: usize = 1000;
pub const MAX_PER_PAGE: usize = 1000;
pub const BACKEND_TIMEOUT_MS: u64 = 30_000;

/// Global configuration of the resource API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub default_per_page: usize,
    pub max_per_page: usize,
    pub backend_timeout_ms: u64,
    pub resources: Vec<ResourceConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
            backend_timeout_ms: BACKEND_TIMEOUT_MS,
            resources: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `API_*` environment variable overrides
    pub fn apply_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "API_DEFAULT_PER_PAGE")? {
            self.default_per_page = v;
        }
        if let Some(v) = parse_var(&lookup, "API_MAX_PER_PAGE")? {
            self.max_per_page = v;
        }
        if let Some(v) = parse_var(&lookup, "API_BACKEND_TIMEOUT_MS")? {
            self.backend_timeout_ms = v;
        }
        Ok(self)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Check global settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, message: &str| ConfigError::InvalidValue {
            resource: "*".to_string(),
            field: field.to_string(),
            message: message.to_string(),
        };
        if self.max_per_page == 0 {
            return Err(invalid("max_per_page", "must be at least 1"));
        }
        if self.default_per_page == 0 || self.default_per_page > self.max_per_page {
            return Err(invalid("default_per_page", "must be within 1..=max_per_page"));
        }
        if self.backend_timeout_ms == 0 {
            return Err(invalid("backend_timeout_ms", "must be positive"));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value: raw,
            }),
    }
}

// =============================================================================
// Resource Configuration
// =============================================================================

/// Declared field: either just a type, or an internal key and a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldConfig {
    Type(FieldType),
    Mapping {
        #[serde(default)]
        key: Option<String>,
        #[serde(rename = "type", default)]
        field_type: FieldType,
    },
}

impl FieldConfig {
    /// Resolve against the public name
    pub fn to_mapping(&self, public_name: &str) -> FieldMapping {
        match self {
            FieldConfig::Type(field_type) => FieldMapping::new(public_name, *field_type),
            FieldConfig::Mapping { key, field_type } => {
                FieldMapping::new(key.as_deref().unwrap_or(public_name), *field_type)
            }
        }
    }
}

/// One accepted input attribute for create or update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputField {
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

/// An input parameter that references a record of another resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedCheck {
    /// Input parameter carrying the referenced id
    pub param: String,
    /// Registered resource name of the referenced record
    pub resource: String,
    /// Action the caller must be able to apply to it
    #[serde(default = "default_related_action")]
    pub action: Action,
}

fn default_related_action() -> Action {
    Action::Update
}

/// Handler identity overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerNames {
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
}

/// Per-resource declaration; every `None`/empty value falls back to a
/// naming convention or a global default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Route identity, plural snake_case (`company_tests`)
    pub name: String,
    pub resource_type: Option<String>,
    pub model_name: Option<String>,
    pub permission: Option<String>,
    pub tenant_field: Option<String>,
    pub default_filters: Vec<Filter>,
    pub default_includes: Vec<String>,
    pub includable: Vec<String>,
    pub serializer: Option<String>,
    pub handlers: HandlerNames,
    pub fields: IndexMap<String, FieldConfig>,
    pub create_inputs: Vec<InputField>,
    pub update_inputs: Vec<InputField>,
    pub related: Vec<RelatedCheck>,
    pub per_page: Option<usize>,
    pub max_per_page: Option<usize>,
    /// Record ability policy, see [`crate::core::auth::AbilityPolicy::parse_policy`]
    pub ability: Option<String>,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn tenant_field(mut self, field: impl Into<String>) -> Self {
        self.tenant_field = Some(field.into());
        self
    }

    pub fn default_filter(mut self, filter: Filter) -> Self {
        self.default_filters.push(filter);
        self
    }

    pub fn default_include(mut self, path: impl Into<String>) -> Self {
        self.default_includes.push(path.into());
        self
    }

    pub fn includable(mut self, root: impl Into<String>) -> Self {
        self.includable.push(root.into());
        self
    }

    pub fn serializer(mut self, identity: impl Into<String>) -> Self {
        self.serializer = Some(identity.into());
        self
    }

    pub fn create_handler(mut self, identity: impl Into<String>) -> Self {
        self.handlers.create = Some(identity.into());
        self
    }

    pub fn update_handler(mut self, identity: impl Into<String>) -> Self {
        self.handlers.update = Some(identity.into());
        self
    }

    pub fn delete_handler(mut self, identity: impl Into<String>) -> Self {
        self.handlers.delete = Some(identity.into());
        self
    }

    /// Declare a field filtered and sorted under its own name
    pub fn field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        self.field_as(name.clone(), name, field_type)
    }

    /// Declare a public field backed by a differently named internal field
    pub fn field_as(
        mut self,
        name: impl Into<String>,
        key: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldConfig::Mapping {
                key: Some(key.into()),
                field_type,
            },
        );
        self
    }

    pub fn create_input(mut self, name: impl Into<String>, required: bool) -> Self {
        self.create_inputs.push(InputField {
            name: name.into(),
            required,
        });
        self
    }

    pub fn update_input(mut self, name: impl Into<String>, required: bool) -> Self {
        self.update_inputs.push(InputField {
            name: name.into(),
            required,
        });
        self
    }

    /// Require `action` ability on the `resource` record referenced by `param`
    pub fn related(
        mut self,
        param: impl Into<String>,
        resource: impl Into<String>,
        action: Action,
    ) -> Self {
        self.related.push(RelatedCheck {
            param: param.into(),
            resource: resource.into(),
            action,
        });
        self
    }

    pub fn per_page(mut self, default: usize, max: usize) -> Self {
        self.per_page = Some(default);
        self.max_per_page = Some(max);
        self
    }

    pub fn ability(mut self, policy: impl Into<String>) -> Self {
        self.ability = Some(policy.into());
        self
    }

    /// Overlay another declaration of the same resource
    ///
    /// Set values in `other` win; its fields are added to (or replace) ours.
    pub fn overlay(&mut self, other: ResourceConfig) {
        fn pick<T>(ours: &mut Option<T>, theirs: Option<T>) {
            if theirs.is_some() {
                *ours = theirs;
            }
        }
        fn pick_vec<T>(ours: &mut Vec<T>, theirs: Vec<T>) {
            if !theirs.is_empty() {
                *ours = theirs;
            }
        }

        pick(&mut self.resource_type, other.resource_type);
        pick(&mut self.model_name, other.model_name);
        pick(&mut self.permission, other.permission);
        pick(&mut self.tenant_field, other.tenant_field);
        pick(&mut self.serializer, other.serializer);
        pick(&mut self.handlers.create, other.handlers.create);
        pick(&mut self.handlers.update, other.handlers.update);
        pick(&mut self.handlers.delete, other.handlers.delete);
        pick(&mut self.per_page, other.per_page);
        pick(&mut self.max_per_page, other.max_per_page);
        pick(&mut self.ability, other.ability);
        pick_vec(&mut self.default_filters, other.default_filters);
        pick_vec(&mut self.default_includes, other.default_includes);
        pick_vec(&mut self.includable, other.includable);
        pick_vec(&mut self.create_inputs, other.create_inputs);
        pick_vec(&mut self.update_inputs, other.update_inputs);
        pick_vec(&mut self.related, other.related);
        self.fields.extend(other.fields);
    }
}
