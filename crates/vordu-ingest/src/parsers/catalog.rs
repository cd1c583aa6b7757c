//! Catalog extraction
//!
//! Reads Backstage-style multi-document YAML and keeps the System and
//! Component entities, together with their `vordu.io/*` annotations:
//!
//! | annotation | applies to | meaning |
//! |------------|------------|---------|
//! | `vordu.io/row-label` | System, Component | display label |
//! | `vordu.io/granularity` | System | row mapping policy |
//! | `vordu.io/parent-component` | Component | rollup parent |

use crate::error::{IngestError, ParseError};
use crate::parsers::SourceParser;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use vordu_core::{Component, ConfigPayload, Granularity, SystemDescriptor};

const ROW_LABEL: &str = "vordu.io/row-label";
const GRANULARITY: &str = "vordu.io/granularity";
const PARENT_COMPONENT: &str = "vordu.io/parent-component";

#[derive(Debug, Deserialize)]
struct Entity {
    kind: String,
    metadata: Metadata,
    #[serde(default)]
    spec: Option<EntitySpec>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    system: Option<String>,
    #[serde(default)]
    annotations: BTreeMap<String, Value>,
}

impl Metadata {
    /// Scalar annotation as text; mappings and sequences read as absent
    fn annotation(&self, key: &str) -> Option<String> {
        match self.annotations.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct EntitySpec {
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    system: Option<String>,
    #[serde(default, rename = "partOf")]
    part_of: Option<String>,
}

/// System and components extracted from a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// The System entity, if the catalog has one
    pub system: Option<SystemDescriptor>,
    /// Component entities in document order
    pub components: Vec<Component>,
}

impl Catalog {
    /// Descriptor used to aggregate status
    ///
    /// Without a System entity, a descriptor is synthesized from the first
    /// component that names an owning system.
    ///
    /// # Errors
    /// `IngestError::NoProject` when no project name can be found.
    pub fn project_descriptor(&self) -> Result<SystemDescriptor, IngestError> {
        if let Some(system) = &self.system {
            return Ok(system.clone());
        }
        self.components
            .iter()
            .find_map(|c| c.system.as_deref())
            .map(SystemDescriptor::new)
            .ok_or(IngestError::NoProject)
    }

    /// Payload for `POST /config/ingest`; `None` without a System entity
    #[must_use]
    pub fn config_payload(&self) -> Option<ConfigPayload> {
        self.system
            .as_ref()
            .map(|system| ConfigPayload::from_parts(system, &self.components))
    }
}

/// Parser for catalog YAML
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogParser;

impl CatalogParser {
    fn extract(entity: Entity, catalog: &mut Catalog) {
        let Entity {
            kind,
            metadata,
            spec,
        } = entity;
        let spec = spec.unwrap_or_default();
        let label = metadata
            .annotation(ROW_LABEL)
            .unwrap_or_else(|| metadata.name.clone());

        match kind.as_str() {
            "System" => {
                let granularity = metadata
                    .annotation(GRANULARITY)
                    .map(|g| Granularity::parse(&g))
                    .unwrap_or_default();
                catalog.system = Some(SystemDescriptor {
                    name: metadata.name,
                    label,
                    description: metadata.description,
                    domain: spec.domain,
                    granularity,
                });
            }
            "Component" => {
                let parent = metadata.annotation(PARENT_COMPONENT);
                catalog.components.push(Component {
                    name: metadata.name,
                    label,
                    system: spec.system.or(metadata.system).or(spec.part_of),
                    parent,
                });
            }
            _ => {}
        }
    }
}

impl SourceParser for CatalogParser {
    type Output = Catalog;

    fn parse(&self, content: &str) -> Result<Catalog, ParseError> {
        let mut catalog = Catalog::default();
        let mut entities = 0usize;

        for doc in serde_yaml::Deserializer::from_str(content) {
            let value = Value::deserialize(doc).map_err(|e| {
                ParseError::syntax_error("catalog-info.yaml", format!("YAML parse error: {e}"))
            })?;

            if value.get("kind").is_none() || value.get("metadata").is_none() {
                continue;
            }

            let entity: Entity = serde_yaml::from_value(value).map_err(|e| {
                ParseError::syntax_error("catalog-info.yaml", format!("invalid entity: {e}"))
            })?;
            if matches!(entity.kind.as_str(), "System" | "Component") {
                entities += 1;
            }
            Self::extract(entity, &mut catalog);
        }

        if entities == 0 {
            return Err(ParseError::NoEntities("catalog-info.yaml".into()));
        }
        Ok(catalog)
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}
