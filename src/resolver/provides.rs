use std::{collections::BTreeMap, slice};

use log::trace;

use crate::{
    model::{Catalog, ResourceName},
    resolver::budget::{Budget, Limits},
};

/// Everything a resource stands in for, directly or through other providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidedResources {
    /// Provided names in traversal order.
    pub provided: Vec<ResourceName>,
    /// Provided name to the nearest resource that declares it.
    pub provider_of: BTreeMap<ResourceName, ResourceName>,
}

impl ProvidedResources {
    pub fn contains(&self, name: &str) -> bool {
        self.provider_of.contains_key(name)
    }

    pub fn provider_of(&self, name: &str) -> Option<&ResourceName> {
        self.provider_of.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.provided.is_empty()
    }
}

/// Walks `provides` edges depth first from `name`. The first provider reaching a name
/// is kept; names missing from the catalog simply provide nothing.
pub fn provided_resources(catalog: &Catalog, name: &str, limits: Limits) -> ProvidedResources {
    let mut budget = Budget::new("provides", limits);
    let mut result = ProvidedResources::default();

    // Each frame is a provider and the part of its `provides` list not yet walked.
    let mut stack: Vec<(&str, slice::Iter<'_, ResourceName>)> = Vec::new();
    if let Some(resource) = catalog.get(name) {
        if budget.enter(0) {
            stack.push((name, resource.provides.iter()));
        }
    }
    while let Some((provider, pending)) = stack.last_mut() {
        let provider = *provider;
        let Some(provided) = pending.next() else {
            stack.pop();
            continue;
        };
        if provided.as_str() == name || result.contains(provided.as_str()) {
            continue;
        }
        trace!("{provider} provides {provided}");
        result.provided.push(provided.clone());
        result
            .provider_of
            .insert(provided.clone(), ResourceName::from(provider));

        let Some(resource) = catalog.get(provided.as_str()) else {
            continue;
        };
        if budget.enter(stack.len()) {
            stack.push((provided.as_str(), resource.provides.iter()));
        }
    }
    result
}
