//! Wire payloads shared by the ingestion client and the API

use crate::error::{CoreError, CoreResult};
use crate::types::{Component, Granularity, SystemDescriptor};
use serde::{Deserialize, Serialize};

/// System section of a config payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
}

/// Component section of a config payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Body of `POST /config/ingest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPayload {
    pub system: SystemConfig,
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

impl ConfigPayload {
    /// Build payload from catalog data
    #[must_use]
    pub fn from_parts(system: &SystemDescriptor, components: &[Component]) -> Self {
        Self {
            system: SystemConfig {
                name: system.name.clone(),
                label: Some(system.label.clone()),
                description: system.description.clone(),
                domain: system.domain.clone(),
                granularity: Some(system.granularity),
            },
            components: components
                .iter()
                .map(|c| ComponentConfig {
                    name: c.name.clone(),
                    label: Some(c.label.clone()),
                    system: c.system.clone(),
                    parent: c.parent.clone(),
                })
                .collect(),
        }
    }

    /// Validate and fill defaults
    ///
    /// Labels default to names; every component is owned by the payload's
    /// system regardless of its own `system` field.
    ///
    /// # Errors
    /// `CoreError::InvalidPayload` for empty system or component names.
    pub fn into_parts(self) -> CoreResult<(SystemDescriptor, Vec<Component>)> {
        let name = self.system.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::invalid_payload("system.name must not be empty"));
        }

        let mut components = Vec::with_capacity(self.components.len());
        for (i, c) in self.components.into_iter().enumerate() {
            if c.name.trim().is_empty() {
                return Err(CoreError::invalid_payload(format!(
                    "components[{i}].name must not be empty"
                )));
            }
            components.push(Component {
                label: non_empty(c.label).unwrap_or_else(|| c.name.clone()),
                system: Some(name.clone()),
                parent: non_empty(c.parent),
                name: c.name,
            });
        }

        let system = SystemDescriptor {
            label: non_empty(self.system.label).unwrap_or_else(|| name.clone()),
            description: self.system.description,
            domain: non_empty(self.system.domain),
            granularity: self.system.granularity.unwrap_or_default(),
            name,
        };
        Ok((system, components))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
