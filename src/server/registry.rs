//! Resource registry: resolves resource declarations into descriptors
//!
//! Every configurable property of a resource is either declared explicitly or
//! derived from its route identity by convention:
//!
//! | Property | Convention for `company_tests` |
//! |----------|--------------------------------|
//! | resource type | `company_test` |
//! | model name | `company test` |
//! | serializer | `CompanyTestSerializer` |
//! | handlers | `CompanyTests::Create`, `CompanyTests::Update`, `CompanyTests::Delete` |
//! | page sizes | global [`ApiConfig`] values |
//!
//! Serializers, handlers and authorizers are looked up by identity in a
//! [`Catalog`]; nothing is discovered by reflection. Resolution happens once,
//! when the registry is built, and the result is shared read-only.

use crate::config::{ApiConfig, InputField, RelatedCheck, ResourceConfig};
use crate::core::auth::{AbilityPolicy, Action, RecordAuthorizer};
use crate::core::error::ConfigError;
use crate::core::filter::{FieldTable, Filter};
use crate::core::include::IncludeTree;
use crate::core::outcome::Handler;
use crate::core::pluralize::Pluralizer;
use crate::core::serializer::{JsonSerializer, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// Fully resolved, immutable configuration of one resource
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub name: String,
    pub resource_type: String,
    pub model_name: String,
    pub permission: Option<String>,
    pub tenant_field: Option<String>,
    pub default_filters: Vec<Filter>,
    pub default_includes: IncludeTree,
    pub includable: Vec<String>,
    pub serializer: String,
    pub create_handler: String,
    pub update_handler: String,
    pub delete_handler: String,
    pub fields: FieldTable,
    pub create_inputs: Vec<InputField>,
    pub update_inputs: Vec<InputField>,
    pub related: Vec<RelatedCheck>,
    pub per_page: usize,
    pub max_per_page: usize,
}

impl ResourceDescriptor {
    /// Resolve a declaration against conventions and global settings
    pub fn resolve(config: &ResourceConfig, api: &ApiConfig) -> Result<Self, ConfigError> {
        let name = config.name.trim().to_string();
        let invalid = |field: &str, message: &str| ConfigError::InvalidValue {
            resource: name.clone(),
            field: field.to_string(),
            message: message.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name", "resource identity cannot be empty"));
        }

        let resource_type = config
            .resource_type
            .clone()
            .unwrap_or_else(|| Pluralizer::singularize(&name));
        let model_name = config
            .model_name
            .clone()
            .unwrap_or_else(|| Pluralizer::humanize(&resource_type));
        let plural_camel = Pluralizer::camelize(&name);
        let handler = |explicit: &Option<String>, action: &str| {
            explicit
                .clone()
                .unwrap_or_else(|| format!("{}::{}", plural_camel, action))
        };

        if let Some(field) = &config.tenant_field {
            if field.trim().is_empty() {
                return Err(invalid("tenant_field", "cannot be blank"));
            }
        }
        if config.default_filters.iter().any(|f| f.field().trim().is_empty()) {
            return Err(invalid("default_filters", "filter references no field"));
        }
        if config.permission.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(invalid("permission", "cannot be blank"));
        }

        let max_per_page = config.max_per_page.unwrap_or(api.max_per_page);
        let per_page = config
            .per_page
            .unwrap_or_else(|| api.default_per_page.min(max_per_page));
        if max_per_page == 0 {
            return Err(invalid("max_per_page", "must be at least 1"));
        }
        if per_page == 0 || per_page > max_per_page {
            return Err(invalid("per_page", "must be within 1..=max_per_page"));
        }

        let fields: FieldTable = config
            .fields
            .iter()
            .map(|(public, field)| (public.clone(), field.to_mapping(public)))
            .collect();

        Ok(Self {
            serializer: config
                .serializer
                .clone()
                .unwrap_or_else(|| format!("{}Serializer", Pluralizer::camelize(&resource_type))),
            create_handler: handler(&config.handlers.create, "Create"),
            update_handler: handler(&config.handlers.update, "Update"),
            delete_handler: handler(&config.handlers.delete, "Delete"),
            permission: config.permission.clone(),
            tenant_field: config.tenant_field.clone(),
            default_filters: config.default_filters.clone(),
            default_includes: IncludeTree::from_paths(&config.default_includes),
            includable: config.includable.clone(),
            fields,
            create_inputs: config.create_inputs.clone(),
            update_inputs: config.update_inputs.clone(),
            related: config.related.clone(),
            per_page,
            max_per_page,
            name,
            resource_type,
            model_name,
        })
    }

    pub fn handler_identity(&self, action: Action) -> &str {
        match action {
            Action::Create => &self.create_handler,
            Action::Update => &self.update_handler,
            Action::Destroy | Action::Read => &self.delete_handler,
        }
    }

    pub fn inputs(&self, action: Action) -> &[InputField] {
        match action {
            Action::Create => &self.create_inputs,
            Action::Update => &self.update_inputs,
            Action::Read | Action::Destroy => &[],
        }
    }
}

/// Named serializers, handlers and per-resource authorizers
#[derive(Default, Clone)]
pub struct Catalog {
    pub handlers: HashMap<String, Arc<dyn Handler>>,
    pub serializers: HashMap<String, Arc<dyn Serializer>>,
    /// Keyed by resource name
    pub authorizers: HashMap<String, Arc<dyn RecordAuthorizer>>,
}

/// A resolved resource with its collaborators
#[derive(Clone)]
pub struct ResourceEntry {
    pub descriptor: ResourceDescriptor,
    pub serializer: Arc<dyn Serializer>,
    pub authorizer: Arc<dyn RecordAuthorizer>,
    handlers: HashMap<Action, Arc<dyn Handler>>,
}

impl ResourceEntry {
    /// Handler for a write action
    ///
    /// A missing handler is a configuration fault of the invoked action only.
    pub fn handler(&self, action: Action) -> Result<Arc<dyn Handler>, ConfigError> {
        self.handlers
            .get(&action)
            .cloned()
            .ok_or_else(|| ConfigError::MissingHandler {
                resource: self.descriptor.name.clone(),
                action,
                identity: self.descriptor.handler_identity(action).to_string(),
            })
    }
}

/// Registry for all resources served by the API
#[derive(Default)]
pub struct ResourceRegistry {
    entries: HashMap<String, Arc<ResourceEntry>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Resolve declarations from code and from `api.resources`
    ///
    /// Declarations sharing a name are merged, YAML values winning.
    pub fn build(
        declared: Vec<ResourceConfig>,
        api: &ApiConfig,
        catalog: &Catalog,
    ) -> Result<Self, ConfigError> {
        api.validate()?;

        let mut merged: Vec<ResourceConfig> = Vec::new();
        for config in declared {
            if merged.iter().any(|c| c.name == config.name) {
                return Err(ConfigError::DuplicateResource(config.name));
            }
            merged.push(config);
        }
        for overlay in &api.resources {
            match merged.iter_mut().find(|c| c.name == overlay.name) {
                Some(existing) => existing.overlay(overlay.clone()),
                None => merged.push(overlay.clone()),
            }
        }

        let mut registry = Self::new();
        for config in &merged {
            let descriptor = ResourceDescriptor::resolve(config, api)?;
            let entry = Self::bind(descriptor, config, catalog)?;
            tracing::debug!(
                resource = %entry.descriptor.name,
                resource_type = %entry.descriptor.resource_type,
                serializer = %entry.descriptor.serializer,
                "registered resource"
            );
            registry.register(entry)?;
        }

        for entry in registry.entries.values() {
            for check in &entry.descriptor.related {
                if !registry.entries.contains_key(&check.resource) {
                    return Err(ConfigError::InvalidValue {
                        resource: entry.descriptor.name.clone(),
                        field: "related".to_string(),
                        message: format!("references unknown resource '{}'", check.resource),
                    });
                }
            }
        }

        Ok(registry)
    }

    fn bind(
        descriptor: ResourceDescriptor,
        config: &ResourceConfig,
        catalog: &Catalog,
    ) -> Result<ResourceEntry, ConfigError> {
        let serializer = match catalog.serializers.get(&descriptor.serializer) {
            Some(serializer) => serializer.clone(),
            None if config.serializer.is_some() => {
                return Err(ConfigError::MissingSerializer {
                    resource: descriptor.name.clone(),
                    identity: descriptor.serializer.clone(),
                });
            }
            None => Arc::new(JsonSerializer) as Arc<dyn Serializer>,
        };

        let authorizer: Arc<dyn RecordAuthorizer> = match catalog.authorizers.get(&descriptor.name) {
            Some(authorizer) => authorizer.clone(),
            None => Arc::new(default_policy(config, &descriptor)),
        };

        let handlers = [Action::Create, Action::Update, Action::Destroy]
            .into_iter()
            .filter_map(|action| {
                catalog
                    .handlers
                    .get(descriptor.handler_identity(action))
                    .map(|h| (action, h.clone()))
            })
            .collect();

        Ok(ResourceEntry {
            descriptor,
            serializer,
            authorizer,
            handlers,
        })
    }

    /// Register a resolved entry
    pub fn register(&mut self, entry: ResourceEntry) -> Result<(), ConfigError> {
        let name = entry.descriptor.name.clone();
        if self.entries.contains_key(&name) {
            return Err(ConfigError::DuplicateResource(name));
        }
        self.entries.insert(name, Arc::new(entry));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceEntry>> {
        self.entries.get(name).cloned()
    }

    /// Get all registered resource names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

/// Ability used when no authorizer is registered for a resource
///
/// Declared policy first, then tenant ownership, otherwise deny.
fn default_policy(config: &ResourceConfig, descriptor: &ResourceDescriptor) -> AbilityPolicy {
    match (&config.ability, &descriptor.tenant_field) {
        (Some(policy), _) => AbilityPolicy::parse_policy(policy),
        (None, Some(field)) => AbilityPolicy::SameTenant(field.clone()),
        (None, None) => AbilityPolicy::Deny,
    }
}
