//! Canonical tree construction and rendering for a single target resource.
//!
//! [`resolve`] runs the whole pipeline: flat closure, tree model, placement and
//! optional annotations. The returned [`Resolution`] renders lazily through
//! [`Resolution::lines`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, info};
use thiserror::Error;

use crate::{
    model::{Catalog, ResourceName},
    resolver::{
        all_dependents, provided_resources, resolve_closure, Closure, Limits, ProvidedResources,
    },
};

pub mod canonical;
pub mod model;
pub mod render;

pub use canonical::{CanonicalNode, CanonicalTree, NodeId, Relation};
pub use model::{Expansion, TreeEntry, TreeModel};
pub use render::Lines;

use canonical::Canonicalizer;
use render::Renderer;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Pad names and append descriptions, and describe the target in the header.
    pub show_descriptions: bool,
    /// Annotate resources reached only through a provider chain.
    pub direct_only: bool,
    /// Also place everything that requires the target.
    pub include_dependents: bool,
    pub show_kind: bool,
    pub show_type: bool,
    /// Overrides the catalog-derived traversal limits.
    pub limits: Option<Limits>,
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Resource '{name}' not found in dependencies file")]
    UnknownResource {
        name: String,
        available: Vec<ResourceName>,
    },
}

/// Everything known about one target, ready to be rendered.
#[derive(Debug)]
pub struct Resolution<'a> {
    catalog: &'a Catalog,
    target: ResourceName,
    options: ResolveOptions,
    closure: Closure,
    provided: ProvidedResources,
    dependents: BTreeSet<ResourceName>,
    tree: CanonicalTree,
    annotations: BTreeMap<ResourceName, String>,
}

impl<'a> Resolution<'a> {
    pub fn target(&self) -> &ResourceName {
        &self.target
    }

    pub fn closure(&self) -> &Closure {
        &self.closure
    }

    pub fn provided(&self) -> &ProvidedResources {
        &self.provided
    }

    pub fn dependents(&self) -> &BTreeSet<ResourceName> {
        &self.dependents
    }

    pub fn tree(&self) -> &CanonicalTree {
        &self.tree
    }

    pub fn annotation(&self, name: &str) -> Option<&str> {
        self.annotations.get(name).map(String::as_str)
    }

    /// A fresh line iterator. Every call starts from the header again.
    pub fn lines(&self) -> Lines<'_> {
        Lines::new(Renderer {
            catalog: self.catalog,
            target: &self.target,
            options: &self.options,
            closure: &self.closure,
            provided: &self.provided,
            tree: &self.tree,
            annotations: &self.annotations,
        })
    }
}

pub fn resolve<'a>(
    catalog: &'a Catalog,
    target: &str,
    options: &ResolveOptions,
) -> Result<Resolution<'a>, ResolveError> {
    if !catalog.contains(target) {
        return Err(ResolveError::UnknownResource {
            name: target.to_string(),
            available: catalog.names().cloned().collect(),
        });
    }
    let limits = options
        .limits
        .unwrap_or_else(|| Limits::for_catalog(catalog));
    info!("Resolving dependencies of {target}");

    let closure = resolve_closure(catalog, target, limits);
    let provided = provided_resources(catalog, target, limits);

    let mut model = TreeModel::build(catalog, target, Expansion::Transitive, limits);
    let dependents = if options.include_dependents {
        all_dependents(catalog, target)
    } else {
        BTreeSet::new()
    };
    model.merge_dependents(catalog, &dependents);

    let annotations = if options.direct_only {
        provider_annotations(catalog, target, limits)
    } else {
        BTreeMap::new()
    };

    let tree = Canonicalizer::new(catalog, &model, target, &dependents, limits).canonicalize();
    debug!("Canonical tree of {target} has {} nodes", tree.len());

    Ok(Resolution {
        catalog,
        target: ResourceName::from(target),
        options: options.clone(),
        closure,
        provided,
        dependents,
        tree,
        annotations,
    })
}

/// `(provided by X)` notes for everything reachable from the target and its direct
/// requirements that some reachable resource provides. The first note wins.
fn provider_annotations(
    catalog: &Catalog,
    target: &str,
    limits: Limits,
) -> BTreeMap<ResourceName, String> {
    let direct = TreeModel::build(catalog, target, Expansion::Direct, limits);
    let target = ResourceName::from(target);
    let mut starts = vec![target.clone()];
    if let Some(entry) = direct.get(target.as_str()) {
        starts.extend(entry.mandatory.iter().cloned());
        starts.extend(entry.optional.iter().cloned());
        starts.extend(entry.either_groups.iter().flatten().cloned());
    }

    let mut annotations = BTreeMap::new();
    for start in &starts {
        for reached in requirement_walk(catalog, start) {
            let provided = provided_resources(catalog, reached.as_str(), limits);
            for name in &provided.provided {
                if let Some(provider) = provided.provider_of(name.as_str()) {
                    annotations
                        .entry(name.clone())
                        .or_insert_with(|| format!("(provided by {provider})"));
                }
            }
        }
    }
    debug!("{} provider annotations for {target}", annotations.len());
    annotations
}

/// Pre-order walk over plain mandatory and optional requirements.
fn requirement_walk<'c>(catalog: &'c Catalog, start: &ResourceName) -> Vec<ResourceName> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![start.clone()];
    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if let Some(resource) = catalog.get(current.as_str()) {
            let next: Vec<&'c ResourceName> = resource
                .mandatory_names()
                .chain(resource.requires.optional.iter())
                .collect();
            stack.extend(next.into_iter().rev().cloned());
        }
        order.push(current);
    }
    order
}
