use std::collections::{BTreeSet, VecDeque};

use log::debug;

use crate::model::{Catalog, ResourceName};

/// Resources naming `name` among their plain mandatory requirements, ascending.
pub fn direct_dependents(catalog: &Catalog, name: &str) -> Vec<ResourceName> {
    catalog
        .iter()
        .filter(|(dependent, resource)| {
            dependent.as_str() != name && resource.requires_mandatory(name)
        })
        .map(|(dependent, _)| dependent.clone())
        .collect()
}

/// Everything that directly or transitively requires `name`, never `name` itself.
pub fn all_dependents(catalog: &Catalog, name: &str) -> BTreeSet<ResourceName> {
    let mut collected = BTreeSet::new();
    let mut queue = VecDeque::from([ResourceName::from(name)]);
    while let Some(current) = queue.pop_front() {
        for dependent in direct_dependents(catalog, current.as_str()) {
            if dependent.as_str() != name && collected.insert(dependent.clone()) {
                queue.push_back(dependent);
            }
        }
    }
    debug!("{name} has {} dependents", collected.len());
    collected
}
