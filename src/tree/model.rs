use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    slice,
};

use log::{debug, trace};

use crate::{
    model::{Catalog, Requirement, ResourceName},
    resolver::{Budget, Limits},
};

/// How far [`TreeModel::build`] follows requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Build entries for every mandatory dependency and either-option, recursively.
    Transitive,
    /// Build the entry of the target only.
    Direct,
}

/// Requirements of one resource as seen by the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeEntry {
    /// Direct mandatory requirements, duplicate free, in declaration order.
    pub mandatory: Vec<ResourceName>,
    /// Direct optional requirements. These are never expanded.
    pub optional: Vec<ResourceName>,
    pub either_groups: Vec<Vec<ResourceName>>,
    pub either_members: BTreeSet<ResourceName>,
}

/// Per-resource adjacency for everything the target needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeModel {
    entries: BTreeMap<ResourceName, TreeEntry>,
}

impl TreeModel {
    pub fn build(catalog: &Catalog, target: &str, expansion: Expansion, limits: Limits) -> Self {
        let mut builder = Builder {
            catalog,
            expansion,
            budget: Budget::new("tree model", limits),
            model: TreeModel::default(),
            branches: vec![HashSet::new()],
            frames: Vec::new(),
        };
        builder.run(&ResourceName::from(target));
        debug!(
            "Tree model for {target} has {} entries after {} visits",
            builder.model.entries.len(),
            builder.budget.visits()
        );
        builder.model
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceName, &TreeEntry)> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &ResourceName> {
        self.entries.keys()
    }

    /// Mandatory requirements of `name`, empty when it has no entry.
    pub fn mandatory(&self, name: &str) -> &[ResourceName] {
        self.entries
            .get(name)
            .map(|entry| entry.mandatory.as_slice())
            .unwrap_or(&[])
    }

    pub fn optional(&self, name: &str) -> &[ResourceName] {
        self.entries
            .get(name)
            .map(|entry| entry.optional.as_slice())
            .unwrap_or(&[])
    }

    pub fn either_groups(&self, name: &str) -> &[Vec<ResourceName>] {
        self.entries
            .get(name)
            .map(|entry| entry.either_groups.as_slice())
            .unwrap_or(&[])
    }

    /// Every resource listed in some either-group of the model.
    pub fn either_members(&self) -> BTreeSet<ResourceName> {
        self.entries
            .values()
            .flat_map(|entry| entry.either_members.iter().cloned())
            .collect()
    }

    /// Adds `dependents` with their plain mandatory requirements.
    pub fn merge_dependents(&mut self, catalog: &Catalog, dependents: &BTreeSet<ResourceName>) {
        for dependent in dependents {
            let entry = self.entries.entry(dependent.clone()).or_default();
            let Some(resource) = catalog.get(dependent.as_str()) else {
                continue;
            };
            for requirement in resource.mandatory_names() {
                if !entry.mandatory.contains(requirement) {
                    entry.mandatory.push(requirement.clone());
                }
            }
        }
    }
}

/// A resource whose mandatory requirements are being walked.
struct Frame<'a> {
    name: ResourceName,
    depth: usize,
    /// Index of the visited set this walk checks against.
    branch: usize,
    /// Set when this frame owns the topmost visited set.
    opens_branch: bool,
    requirements: slice::Iter<'a, Requirement>,
}

struct Builder<'a> {
    catalog: &'a Catalog,
    expansion: Expansion,
    budget: Budget,
    model: TreeModel,
    /// Visited sets. Every either option walks with its own copy.
    branches: Vec<HashSet<ResourceName>>,
    frames: Vec<Frame<'a>>,
}

impl<'a> Builder<'a> {
    fn run(&mut self, target: &ResourceName) {
        self.enter(target, 0, 0, false);
        let transitive = self.expansion == Expansion::Transitive;

        while let Some(frame) = self.frames.last_mut() {
            let Some(requirement) = frame.requirements.next() else {
                if let Some(Frame {
                    opens_branch: true,
                    ..
                }) = self.frames.pop()
                {
                    self.branches.pop();
                }
                continue;
            };
            let name = frame.name.clone();
            let depth = frame.depth + 1;
            let branch = frame.branch;

            match requirement {
                Requirement::Either(group) => {
                    if group.is_empty() || !self.record_either(&name, group) || !transitive {
                        continue;
                    }
                    // Options are alternatives: one must not hide another.
                    for option in group.iter().rev() {
                        let visited = self.branches[branch].clone();
                        self.branches.push(visited);
                        let option_branch = self.branches.len() - 1;
                        if !self.enter(option, depth, option_branch, true) {
                            self.branches.pop();
                        }
                    }
                }
                Requirement::Resource(dep) => {
                    if self.record_mandatory(&name, dep) && transitive {
                        self.enter(dep, depth, branch, false);
                    }
                }
            }
        }
    }

    /// Builds the entry of `name` and schedules its requirements. False when the
    /// resource is already visited, unknown or beyond the budget.
    fn enter(
        &mut self,
        name: &ResourceName,
        depth: usize,
        branch: usize,
        opens_branch: bool,
    ) -> bool {
        if !self.branches[branch].insert(name.clone()) {
            return false;
        }
        let catalog = self.catalog;
        let Some(resource) = catalog.get(name.as_str()) else {
            trace!("{name} is not in the catalog, no entry built");
            return false;
        };
        if !self.budget.enter(depth) {
            return false;
        }

        // Optional requirements stay leaves.
        let entry = self.entry(name);
        for dep in &resource.requires.optional {
            if !entry.optional.contains(dep) {
                entry.optional.push(dep.clone());
            }
        }
        self.frames.push(Frame {
            name: name.clone(),
            depth,
            branch,
            opens_branch,
            requirements: resource.requires.mandatory.iter(),
        });
        true
    }

    fn entry(&mut self, name: &ResourceName) -> &mut TreeEntry {
        self.model.entries.entry(name.clone()).or_default()
    }

    fn record_mandatory(&mut self, name: &ResourceName, dep: &ResourceName) -> bool {
        let entry = self.entry(name);
        if entry.mandatory.contains(dep) {
            return false;
        }
        entry.mandatory.push(dep.clone());
        true
    }

    fn record_either(&mut self, name: &ResourceName, group: &[ResourceName]) -> bool {
        let entry = self.entry(name);
        if entry.either_groups.iter().any(|known| known == group) {
            return false;
        }
        entry.either_groups.push(group.to_vec());
        entry.either_members.extend(group.iter().cloned());
        true
    }
}
