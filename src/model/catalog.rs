use std::{
    borrow::Borrow,
    collections::BTreeMap,
    fmt::{self, Display},
    path::Path,
};

use log::{debug, info};
use serde::{
    de::{self, IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};

use crate::model::ParseError;

/// Key of the single-entry mapping that introduces a choose-one group.
pub const EITHER_KEY: &str = "either";

#[derive(Clone, Hash, Deserialize, Serialize, Debug, PartialEq, Eq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        ResourceName(s)
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        ResourceName(s.to_string())
    }
}

/// One entry of `requires.mandatory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A single named resource.
    Resource(ResourceName),
    /// At least one of these resources satisfies the requirement.
    Either(Vec<ResourceName>),
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RequirementVisitor;

        impl<'de> Visitor<'de> for RequirementVisitor {
            type Value = Requirement;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a resource name or a single-key mapping")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Requirement::Resource(ResourceName::from(v)))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Requirement::Resource(ResourceName::from(v)))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let key: String = map
                    .next_key()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let requirement = if key == EITHER_KEY {
                    Requirement::Either(map.next_value()?)
                } else {
                    // `{name: description}` form, only the key matters
                    map.next_value::<IgnoredAny>()?;
                    Requirement::Resource(ResourceName::from(key))
                };
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(requirement)
            }
        }

        deserializer.deserialize_any(RequirementVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Requires {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mandatory: Vec<Requirement>,
    #[serde(default, deserialize_with = "optional_names")]
    pub optional: Vec<ResourceName>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fqrn_scheme: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provides: Vec<ResourceName>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requires: Requires,
}

impl Resource {
    /// Plain mandatory requirements in declaration order, either-groups skipped.
    pub fn mandatory_names(&self) -> impl Iterator<Item = &ResourceName> {
        self.requires
            .mandatory
            .iter()
            .filter_map(|requirement| match requirement {
                Requirement::Resource(name) => Some(name),
                Requirement::Either(_) => None,
            })
    }

    pub fn requires_mandatory(&self, name: &str) -> bool {
        self.mandatory_names().any(|dep| dep.as_str() == name)
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default, deserialize_with = "null_as_default")]
    resources: BTreeMap<ResourceName, Resource>,
}

/// Read-only mapping from resource name to its declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    resources: BTreeMap<ResourceName, Resource>,
    providers: BTreeMap<ResourceName, Vec<ResourceName>>,
}

impl Catalog {
    pub fn new(resources: BTreeMap<ResourceName, Resource>) -> Self {
        let mut providers: BTreeMap<ResourceName, Vec<ResourceName>> = BTreeMap::new();
        for (name, resource) in &resources {
            for provided in &resource.provides {
                let entry = providers.entry(provided.clone()).or_default();
                if !entry.contains(name) {
                    entry.push(name.clone());
                }
            }
        }
        Catalog {
            resources,
            providers,
        }
    }

    pub fn from_file(path: &Path) -> Result<Catalog, ParseError> {
        debug!("Attempting to read resource catalog from {}", path.display());
        let contents = std::fs::read_to_string(path)?;

        let is_toml = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));
        let catalog = if is_toml {
            Catalog::from_toml_str(&contents)
        } else {
            Catalog::from_yaml_str(&contents)
        };
        if let Ok(catalog) = &catalog {
            info!(
                "Loaded {} resources from {}",
                catalog.len(),
                path.display()
            );
        }
        catalog
    }

    pub fn from_yaml_str(data: &str) -> Result<Catalog, ParseError> {
        if data.trim().is_empty() {
            return Ok(Catalog::default());
        }
        let file: Option<CatalogFile> = serde_yaml::from_str(data)?;
        Ok(Catalog::new(file.unwrap_or_default().resources))
    }

    pub fn from_toml_str(data: &str) -> Result<Catalog, ParseError> {
        let file: CatalogFile = toml::from_str(data)?;
        Ok(Catalog::new(file.resources))
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resource names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &ResourceName> {
        self.resources.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceName, &Resource)> {
        self.resources.iter()
    }

    /// Resources that directly declare `name` in their `provides` list, ascending.
    pub fn providers_of(&self, name: &str) -> &[ResourceName] {
        self.providers.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn optional_names<'de, D>(deserializer: D) -> Result<Vec<ResourceName>, D::Error>
where
    D: Deserializer<'de>,
{
    let requirements: Vec<Requirement> = null_as_default(deserializer)?;
    Ok(requirements
        .into_iter()
        .flat_map(|requirement| match requirement {
            Requirement::Resource(name) => vec![name],
            Requirement::Either(group) => group,
        })
        .collect())
}
