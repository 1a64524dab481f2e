use std::collections::{BTreeSet, HashSet};

use log::{debug, trace};

use crate::{
    model::{Catalog, Requirement, ResourceName},
    resolver::budget::{Budget, Limits},
};

/// Flat transitive requirements of a resource, the resource itself excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
    pub mandatory: BTreeSet<ResourceName>,
    pub optional: BTreeSet<ResourceName>,
}

/// Collects every resource `target` needs, directly or transitively.
///
/// A single visited set is shared by the mandatory and optional branches, so a
/// resource is expanded at most once whichever way it is reached first. Members of
/// either-groups are expanded like any requirer and end up in the optional set
/// unless something requires them outright.
pub fn resolve_closure(catalog: &Catalog, target: &str, limits: Limits) -> Closure {
    let mut budget = Budget::new("closure", limits);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut either_members = BTreeSet::new();
    let mut closure = Closure::default();

    let mut stack: Vec<(&str, usize)> = vec![(target, 0)];
    while let Some((name, depth)) = stack.pop() {
        if !visited.insert(name) {
            continue;
        }
        let Some(resource) = catalog.get(name) else {
            trace!("{name} is not in the catalog, treating it as a leaf");
            continue;
        };
        if !budget.enter(depth) {
            continue;
        }

        let mut next: Vec<&ResourceName> = Vec::new();
        for requirement in &resource.requires.mandatory {
            match requirement {
                Requirement::Resource(dep) => {
                    if closure.mandatory.insert(dep.clone()) {
                        next.push(dep);
                    }
                }
                Requirement::Either(group) => {
                    for member in group {
                        either_members.insert(member.clone());
                        next.push(member);
                    }
                }
            }
        }
        for dep in &resource.requires.optional {
            if closure.optional.insert(dep.clone()) {
                next.push(dep);
            }
        }
        // Reversed so requirements are expanded in declaration order.
        stack.extend(next.into_iter().rev().map(|dep| (dep.as_str(), depth + 1)));
    }

    for member in either_members {
        if !closure.mandatory.contains(&member) {
            closure.optional.insert(member);
        }
    }
    closure.mandatory.remove(target);
    closure.optional.remove(target);

    debug!(
        "Closure of {target}: {} mandatory, {} optional after {} visits",
        closure.mandatory.len(),
        closure.optional.len(),
        budget.visits()
    );
    closure
}
