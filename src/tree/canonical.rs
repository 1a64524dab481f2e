use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    fmt::{self, Display},
    iter,
};

use log::{debug, trace};

use crate::{
    model::{Catalog, ResourceName},
    resolver::{Budget, Limits},
    tree::model::TreeModel,
};

/// How a rendered node relates to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Mandatory,
    Optional,
    EitherOption,
    /// Requires the target rather than being required by it.
    Dependent,
}

impl Relation {
    pub fn marker(self) -> &'static str {
        match self {
            Relation::Mandatory => "✅",
            Relation::Optional => "🔹",
            Relation::EitherOption => "🔶",
            Relation::Dependent => "🔻",
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Relation::Mandatory => "mandatory",
            Relation::Optional => "optional",
            Relation::EitherOption => "either-option",
            Relation::Dependent => "dependent-of-target",
        };
        f.write_str(label)
    }
}

/// Why a node was attached to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The parent is one of its requirements or providers.
    Structural,
    /// The parent declares it as an optional requirement.
    DeclaredOptional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalNode {
    pub name: ResourceName,
    pub relation: Relation,
    pub origin: Origin,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub children: Vec<NodeId>,
    /// Either-groups declared by this resource, rendered after its children.
    pub either_groups: Vec<Vec<ResourceName>>,
}

/// Forest in which every resource appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalTree {
    nodes: Vec<CanonicalNode>,
    roots: Vec<NodeId>,
    index: HashMap<ResourceName, NodeId>,
    spine: Vec<ResourceName>,
}

impl CanonicalTree {
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &CanonicalNode {
        &self.nodes[id.0]
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn find(&self, name: &str) -> Option<&CanonicalNode> {
        self.id_of(name).map(|id| self.node(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn parent_of(&self, name: &str) -> Option<&ResourceName> {
        let parent = self.find(name)?.parent?;
        Some(&self.node(parent).name)
    }

    pub fn children_of(&self, name: &str) -> Vec<&ResourceName> {
        self.find(name)
            .map(|node| {
                node.children
                    .iter()
                    .map(|child| &self.node(*child).name)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Longest root-to-target chain the placement favored.
    pub fn spine(&self) -> &[ResourceName] {
        &self.spine
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names in depth-first pre-order, the order lines are rendered in.
    pub fn preorder(&self) -> Vec<&ResourceName> {
        let mut names = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            names.push(&node.name);
            stack.extend(node.children.iter().rev().copied());
        }
        names
    }

    fn insert(
        &mut self,
        name: ResourceName,
        relation: Relation,
        origin: Origin,
        parent: Option<NodeId>,
        either_groups: Vec<Vec<ResourceName>>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = match parent {
            Some(parent) => self.nodes[parent.0].depth + 1,
            None => 0,
        };
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        self.index.insert(name.clone(), id);
        self.nodes.push(CanonicalNode {
            name,
            relation,
            origin,
            parent,
            depth,
            children: Vec::new(),
            either_groups,
        });
        id
    }
}

/// For every resource, which requirers ask for it and whether they ask optionally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSources {
    sources: BTreeMap<ResourceName, BTreeMap<ResourceName, bool>>,
}

impl RequirementSources {
    pub fn build(catalog: &Catalog, model: &TreeModel, target: &str) -> Self {
        let mut sources = RequirementSources::default();
        let either_members = model.either_members();

        for (requirer, entry) in model.iter() {
            let requirer_is_option = either_members.contains(requirer);
            for dep in &entry.mandatory {
                sources.record(dep, requirer, requirer_is_option);
            }
            for dep in &entry.optional {
                sources.record(dep, requirer, true);
            }
            for option in entry.either_groups.iter().flatten() {
                sources.record(option, requirer, true);
                // What an option needs is only needed if the option is picked.
                let Some(resource) = catalog.get(option.as_str()) else {
                    continue;
                };
                for dep in resource.mandatory_names() {
                    sources.record(dep, option, true);
                }
            }
        }

        // The target's own declarations are authoritative.
        if let Some((target, entry)) = model.iter().find(|(name, _)| name.as_str() == target) {
            for dep in &entry.mandatory {
                sources.record(dep, target, false);
            }
            for dep in &entry.optional {
                sources.record(dep, target, true);
            }
            for option in entry.either_groups.iter().flatten() {
                sources.record(option, target, true);
            }
        }
        sources
    }

    fn record(&mut self, dep: &ResourceName, requirer: &ResourceName, optional: bool) {
        self.sources
            .entry(dep.clone())
            .or_default()
            .insert(requirer.clone(), optional);
    }

    pub fn requirers(&self, name: &str) -> Option<&BTreeMap<ResourceName, bool>> {
        self.sources.get(name)
    }

    /// True when something asks for `name` and every request is optional.
    pub fn is_optional(&self, name: &str) -> bool {
        self.sources.get(name).is_some_and(|requirers| {
            !requirers.is_empty() && requirers.values().all(|optional| *optional)
        })
    }
}

#[derive(Debug, Clone, Default)]
struct Spine {
    path: Vec<ResourceName>,
    positions: HashMap<ResourceName, usize>,
}

impl Spine {
    fn new(path: Vec<ResourceName>) -> Self {
        let positions = path
            .iter()
            .enumerate()
            .map(|(position, name)| (name.clone(), position))
            .collect();
        Spine { path, positions }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
}

#[derive(Debug, Clone)]
struct Child {
    name: ResourceName,
    origin: Origin,
    relation: Relation,
}

/// Turns the requirement graph into a [`CanonicalTree`].
///
/// Resources are placed from their root requirements downwards. A resource is attached
/// under the most specific of its requirements once all of them are placed, with the
/// longest root-to-target chain taking precedence so the target ends up as deep as the
/// graph allows. Whatever the walk cannot place is adopted afterwards, so every node of
/// the graph shows up exactly once.
pub struct Canonicalizer<'a> {
    catalog: &'a Catalog,
    model: &'a TreeModel,
    target: ResourceName,
    dependents: &'a BTreeSet<ResourceName>,
    nodes: BTreeSet<ResourceName>,
    reverse: BTreeMap<ResourceName, Vec<ResourceName>>,
    sources: RequirementSources,
    either_members: BTreeSet<ResourceName>,
    spine: Spine,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(
        catalog: &'a Catalog,
        model: &'a TreeModel,
        target: &str,
        dependents: &'a BTreeSet<ResourceName>,
        limits: Limits,
    ) -> Self {
        let target = ResourceName::from(target);

        let mut nodes: BTreeSet<ResourceName> = model.names().cloned().collect();
        nodes.insert(target.clone());
        for (_, entry) in model.iter() {
            nodes.extend(entry.mandatory.iter().cloned());
        }

        let mut reverse: BTreeMap<ResourceName, Vec<ResourceName>> = BTreeMap::new();
        for (name, entry) in model.iter() {
            for dep in &entry.mandatory {
                push_unique(reverse.entry(dep.clone()).or_default(), name);
            }
        }
        for (name, resource) in catalog.iter() {
            for provided in &resource.provides {
                push_unique(reverse.entry(name.clone()).or_default(), provided);
            }
        }

        let mut canonicalizer = Canonicalizer {
            catalog,
            model,
            sources: RequirementSources::build(catalog, model, target.as_str()),
            either_members: model.either_members(),
            target,
            dependents,
            nodes,
            reverse,
            spine: Spine::default(),
        };
        let limits = Limits {
            max_depth: limits.max_depth.max(canonicalizer.nodes.len()),
            ..limits
        };
        let path = canonicalizer.find_spine(limits);
        debug!(
            "Spine: {}",
            path.iter()
                .map(ResourceName::as_str)
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        canonicalizer.spine = Spine::new(path);
        canonicalizer
    }

    pub fn canonicalize(&self) -> CanonicalTree {
        let mut tree = CanonicalTree {
            spine: self.spine.path.clone(),
            ..Default::default()
        };
        for root in self.roots() {
            if tree.contains(root.as_str()) {
                continue;
            }
            let id = self.place(&mut tree, root, Origin::Structural, None);
            self.grow(&mut tree, id);
        }
        self.adopt_orphans(&mut tree);
        self.sort(&mut tree);
        tree
    }

    /// Nodes without requirements of their own, ascending. A node with a single
    /// provider in the graph is left for that provider to place.
    fn roots(&self) -> Vec<&ResourceName> {
        self.nodes
            .iter()
            .filter(|name| {
                self.model.mandatory(name.as_str()).is_empty()
                    && self.model.optional(name.as_str()).is_empty()
            })
            .filter(|name| **name == self.target || !self.has_sole_provider(name))
            .collect()
    }

    fn has_sole_provider(&self, name: &ResourceName) -> bool {
        match self.catalog.providers_of(name.as_str()) {
            [provider] => provider != name && self.nodes.contains(provider),
            _ => false,
        }
    }

    fn reverse_of(&self, name: &str) -> &[ResourceName] {
        self.reverse.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn find_spine(&self, limits: Limits) -> Vec<ResourceName> {
        let mut budget = Budget::new("spine", limits);
        let mut best = Vec::new();
        for root in self.roots() {
            let path = self.longest_path(root, &mut budget);
            if path.len() > best.len() {
                best = path;
            }
        }
        best
    }

    /// Longest simple path from `root` to the target along reverse edges. Among
    /// paths of equal length the first one found is kept.
    fn longest_path(&self, root: &ResourceName, budget: &mut Budget) -> Vec<ResourceName> {
        if *root == self.target {
            return vec![root.clone()];
        }
        let mut best: Vec<ResourceName> = Vec::new();
        let mut path = vec![root.clone()];
        let mut on_path: HashSet<ResourceName> = HashSet::from([root.clone()]);
        let mut cursors = vec![0usize];
        while let Some(cursor) = cursors.last_mut() {
            let Some(current) = path.last() else {
                break;
            };
            let next = self.reverse_of(current.as_str()).get(*cursor);
            *cursor += 1;
            let Some(child) = next else {
                if let Some(left) = path.pop() {
                    on_path.remove(&left);
                }
                cursors.pop();
                continue;
            };
            if on_path.contains(child) {
                continue;
            }
            if *child == self.target {
                if path.len() + 1 > best.len() {
                    best = path.iter().chain(iter::once(child)).cloned().collect();
                }
                continue;
            }
            if !budget.enter(path.len()) {
                continue;
            }
            on_path.insert(child.clone());
            path.push(child.clone());
            cursors.push(0);
        }
        best
    }

    fn place(
        &self,
        tree: &mut CanonicalTree,
        name: &ResourceName,
        origin: Origin,
        parent: Option<NodeId>,
    ) -> NodeId {
        let relation = self.relation(name, origin);
        tree.insert(
            name.clone(),
            relation,
            origin,
            parent,
            self.model.either_groups(name.as_str()).to_vec(),
        )
    }

    /// Depth-first placement below `start`. Children are chosen when their parent is
    /// placed and skipped if something placed them in the meantime.
    fn grow(&self, tree: &mut CanonicalTree, start: NodeId) {
        let mut frames: Vec<(NodeId, VecDeque<Child>)> =
            vec![(start, self.children(tree, start).into())];
        loop {
            let Some((parent, pending)) = frames.last_mut() else {
                break;
            };
            let parent = *parent;
            let Some(child) = pending.pop_front() else {
                frames.pop();
                continue;
            };
            if tree.contains(child.name.as_str()) {
                continue;
            }
            trace!(
                "Placing {} ({}) under {}",
                child.name,
                child.relation,
                tree.node(parent).name
            );
            let id = tree.insert(
                child.name.clone(),
                child.relation,
                child.origin,
                Some(parent),
                self.model.either_groups(child.name.as_str()).to_vec(),
            );
            frames.push((id, self.children(tree, id).into()));
        }
    }

    fn children(&self, tree: &CanonicalTree, parent: NodeId) -> Vec<Child> {
        let parent = &tree.node(parent).name;

        let mut structural: Vec<&ResourceName> = self
            .reverse_of(parent.as_str())
            .iter()
            .filter(|child| !tree.contains(child.as_str()))
            .filter(|child| self.is_ready(tree, child))
            .filter(|child| self.is_canonical_parent(parent, child))
            .collect();
        let deferred: Vec<&ResourceName> = structural
            .iter()
            .copied()
            .filter(|child| self.defers_to_sibling(child, &structural))
            .collect();
        structural.retain(|child| !deferred.contains(child));

        let mut children: Vec<Child> = structural
            .into_iter()
            .map(|name| Child {
                name: name.clone(),
                origin: Origin::Structural,
                relation: self.relation(name, Origin::Structural),
            })
            .collect();
        for dep in self.model.optional(parent.as_str()) {
            if dep == parent
                || tree.contains(dep.as_str())
                || children.iter().any(|child| &child.name == dep)
            {
                continue;
            }
            children.push(Child {
                name: dep.clone(),
                origin: Origin::DeclaredOptional,
                relation: Relation::Optional,
            });
        }

        children.sort_by_cached_key(|child| {
            (
                self.group(parent, &child.name, child.relation, child.origin),
                child.name.clone(),
            )
        });
        children
    }

    /// A child waits until all of its requirements are placed, unless it lies on the
    /// spine.
    fn is_ready(&self, tree: &CanonicalTree, child: &ResourceName) -> bool {
        *child == self.target
            || self.spine.contains(child.as_str())
            || self
                .model
                .mandatory(child.as_str())
                .iter()
                .all(|dep| dep == child || tree.contains(dep.as_str()))
    }

    fn is_canonical_parent(&self, parent: &ResourceName, child: &ResourceName) -> bool {
        let requirements = self.model.mandatory(child.as_str());

        // A sole provider that is also the only requirement owns the child.
        if let [provider] = self.catalog.providers_of(child.as_str()) {
            if provider != child && requirements.iter().all(|dep| dep == provider) {
                if provider == parent {
                    return true;
                }
                if self.nodes.contains(provider) {
                    return false;
                }
            }
        }

        if !requirements.contains(parent) {
            return false;
        }

        let others: Vec<&ResourceName> = requirements
            .iter()
            .filter(|other| *other != parent)
            .collect();
        match self.spine.position(parent.as_str()) {
            None => {
                if others
                    .iter()
                    .any(|other| self.spine.contains(other.as_str()))
                {
                    return false;
                }
            }
            Some(at) => {
                if others.iter().any(|other| {
                    self.spine
                        .position(other.as_str())
                        .is_some_and(|position| position > at)
                }) {
                    return false;
                }
            }
        }

        for other in others {
            if self.reaches(parent, other) {
                continue;
            }
            if self.reaches(other, parent) {
                return false;
            }
        }
        true
    }

    /// Whether `from` requires `to`, directly or transitively.
    fn reaches(&self, from: &ResourceName, to: &ResourceName) -> bool {
        let mut seen: HashSet<&ResourceName> = HashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            for dep in self.model.mandatory(current.as_str()) {
                if dep == to {
                    return true;
                }
                if seen.insert(dep) {
                    stack.push(dep);
                }
            }
        }
        false
    }

    /// A child that requires one of its siblings belongs below that sibling.
    fn defers_to_sibling(&self, child: &ResourceName, siblings: &[&ResourceName]) -> bool {
        let requirements = self.model.mandatory(child.as_str());
        siblings
            .iter()
            .any(|sibling| *sibling != child && requirements.contains(sibling))
    }

    fn adopt_orphans(&self, tree: &mut CanonicalTree) {
        loop {
            let orphans: Vec<&ResourceName> = self
                .nodes
                .iter()
                .filter(|name| !tree.contains(name.as_str()))
                .collect();
            let Some(first) = orphans.first().copied() else {
                break;
            };
            let adoption = orphans.iter().find_map(|orphan| {
                self.fallback_parent(tree, orphan)
                    .map(|parent| (*orphan, parent))
            });
            let id = match adoption {
                Some((orphan, parent)) => {
                    debug!(
                        "{orphan} has no canonical parent, attaching it under {}",
                        tree.node(parent).name
                    );
                    self.place(tree, orphan, Origin::Structural, Some(parent))
                }
                None => {
                    debug!("{first} has no placed requirement, promoting it to a root");
                    self.place(tree, first, Origin::Structural, None)
                }
            };
            self.grow(tree, id);
        }
    }

    /// The placed requirement or provider preferred for a late placement: spine
    /// members first, then the deepest node, then the smallest name.
    fn fallback_parent(&self, tree: &CanonicalTree, orphan: &ResourceName) -> Option<NodeId> {
        self.model
            .mandatory(orphan.as_str())
            .iter()
            .chain(self.catalog.providers_of(orphan.as_str()))
            .filter(|candidate| *candidate != orphan)
            .filter_map(|candidate| tree.id_of(candidate.as_str()))
            .max_by_key(|id| {
                let node = tree.node(*id);
                (
                    self.spine.position(node.name.as_str()),
                    node.depth,
                    Reverse(node.name.clone()),
                )
            })
    }

    fn sort(&self, tree: &mut CanonicalTree) {
        for index in 0..tree.nodes.len() {
            let mut children = std::mem::take(&mut tree.nodes[index].children);
            let parent = &tree.nodes[index].name;
            children.sort_by_cached_key(|id| {
                let child = &tree.nodes[id.0];
                (
                    self.group(parent, &child.name, child.relation, child.origin),
                    child.name.clone(),
                )
            });
            tree.nodes[index].children = children;
        }
        let nodes = &tree.nodes;
        tree.roots.sort_by_key(|id| nodes[id.0].name.clone());
    }

    fn relation(&self, name: &ResourceName, origin: Origin) -> Relation {
        if origin == Origin::DeclaredOptional || self.sources.is_optional(name.as_str()) {
            Relation::Optional
        } else if self.either_members.contains(name) {
            Relation::EitherOption
        } else if self.dependents.contains(name) {
            Relation::Dependent
        } else {
            Relation::Mandatory
        }
    }

    /// Sibling ordering: optional children first, then what the parent provides, then
    /// plain requirers, with the spine and finally the target last.
    fn group(
        &self,
        parent: &ResourceName,
        child: &ResourceName,
        relation: Relation,
        origin: Origin,
    ) -> u8 {
        let provided_by_parent = self
            .catalog
            .get(parent.as_str())
            .is_some_and(|resource| resource.provides.contains(child));
        if *child == self.target {
            5
        } else if provided_by_parent {
            2
        } else if relation == Relation::Optional {
            match origin {
                Origin::Structural => 0,
                Origin::DeclaredOptional => 1,
            }
        } else if self.spine.contains(child.as_str()) {
            4
        } else {
            3
        }
    }
}

fn push_unique(list: &mut Vec<ResourceName>, name: &ResourceName) {
    if !list.contains(name) {
        list.push(name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::{resolver::all_dependents, tree::model::Expansion};

    fn canonical(yaml: &str, target: &str, with_dependents: bool) -> CanonicalTree {
        let catalog = Catalog::from_yaml_str(yaml).unwrap();
        let limits = Limits::for_catalog(&catalog);
        let mut model = TreeModel::build(&catalog, target, Expansion::Transitive, limits);
        let dependents = if with_dependents {
            all_dependents(&catalog, target)
        } else {
            BTreeSet::new()
        };
        model.merge_dependents(&catalog, &dependents);
        Canonicalizer::new(&catalog, &model, target, &dependents, limits).canonicalize()
    }

    fn names<'a>(names: impl IntoIterator<Item = &'a ResourceName>) -> Vec<&'a str> {
        names.into_iter().map(ResourceName::as_str).collect()
    }

    const COMPUTE: &str = r#"
resources:
  vcn:
    requires: {}
  subnet:
    requires:
      mandatory: [vcn]
  compute_instance:
    requires:
      mandatory: [subnet]
      optional: [bastion]
  bastion:
    requires:
      mandatory: [subnet]
"#;

    #[test]
    fn chain_ends_in_target_with_optional_leaf() {
        let tree = canonical(COMPUTE, "compute_instance", false);
        assert_eq!(
            names(tree.preorder()),
            vec!["vcn", "subnet", "compute_instance", "bastion"]
        );
        assert_eq!(names(tree.spine()), vec!["vcn", "subnet", "compute_instance"]);
        assert_eq!(
            tree.find("compute_instance").unwrap().relation,
            Relation::Mandatory
        );
        let bastion = tree.find("bastion").unwrap();
        assert_eq!(bastion.relation, Relation::Optional);
        assert_eq!(bastion.origin, Origin::DeclaredOptional);
        assert_eq!(tree.parent_of("bastion").unwrap().as_str(), "compute_instance");
    }

    #[test]
    fn diamond_places_target_under_spine() {
        let tree = canonical(
            r#"
resources:
  vcn: {}
  subnet:
    requires:
      mandatory: [vcn]
  nsg:
    requires:
      mandatory: [vcn]
  app:
    requires:
      mandatory: [subnet, nsg]
"#,
            "app",
            false,
        );
        assert_eq!(names(tree.spine()), vec!["vcn", "nsg", "app"]);
        assert_eq!(names(tree.children_of("vcn")), vec!["subnet", "nsg"]);
        assert_eq!(tree.parent_of("app").unwrap().as_str(), "nsg");
        assert!(tree.children_of("subnet").is_empty());
    }

    #[test]
    fn either_options_hang_under_their_requirements() {
        let tree = canonical(
            r#"
resources:
  vcn: {}
  vpn:
    requires:
      mandatory: [vcn]
  fastconnect:
    requires:
      mandatory: [vcn]
  network_either:
    requires:
      mandatory:
        - vcn
        - either: [vpn, fastconnect]
"#,
            "network_either",
            false,
        );
        assert_eq!(
            names(tree.children_of("vcn")),
            vec!["fastconnect", "vpn", "network_either"]
        );
        assert_eq!(tree.find("vpn").unwrap().relation, Relation::Optional);
        assert_eq!(
            tree.find("network_either").unwrap().either_groups,
            vec![vec![ResourceName::from("vpn"), ResourceName::from("fastconnect")]]
        );
    }

    #[test]
    fn provided_child_comes_before_requirers() {
        let tree = canonical(
            r#"
resources:
  vcn: {}
  zone:
    provides: [subnet]
    requires:
      mandatory: [vcn]
  subnet:
    requires:
      mandatory: [zone]
  router:
    requires:
      mandatory: [zone]
  app:
    requires:
      mandatory: [subnet, router]
"#,
            "app",
            false,
        );
        assert_eq!(names(tree.children_of("zone")), vec!["subnet", "router"]);
        assert_eq!(tree.parent_of("app").unwrap().as_str(), "router");
    }

    #[test]
    fn provider_owns_a_provided_resource_without_requirements() {
        let tree = canonical(
            r#"
resources:
  vcn: {}
  zone:
    provides: [subnet]
    requires:
      mandatory: [vcn]
  subnet: {}
  app:
    requires:
      mandatory: [zone, subnet]
"#,
            "app",
            false,
        );
        let roots = tree.roots().iter().map(|id| &tree.node(*id).name);
        assert_eq!(names(roots), vec!["vcn"]);
        assert_eq!(tree.parent_of("subnet").unwrap().as_str(), "zone");
        assert_eq!(tree.parent_of("app").unwrap().as_str(), "subnet");
        assert_eq!(tree.spine().len(), 4);
    }

    #[test]
    fn option_stays_optional_despite_provider() {
        let tree = canonical(
            r#"
resources:
  vcn: {}
  gateway:
    provides: [vpn]
    requires:
      mandatory: [vcn]
  vpn:
    requires:
      mandatory: [gateway]
  fastconnect:
    requires:
      mandatory: [vcn]
  app:
    requires:
      mandatory:
        - vcn
        - gateway
        - either: [vpn, fastconnect]
"#,
            "app",
            false,
        );
        assert_eq!(tree.find("vpn").unwrap().relation, Relation::Optional);
        assert_eq!(tree.parent_of("vpn").unwrap().as_str(), "gateway");
        assert_eq!(tree.find("gateway").unwrap().relation, Relation::Mandatory);
    }

    #[test]
    fn cycle_places_each_resource_once() {
        let tree = canonical(
            r#"
resources:
  r1:
    requires:
      mandatory: [r2]
  r2:
    requires:
      mandatory: [r1]
"#,
            "r1",
            false,
        );
        assert_eq!(names(tree.preorder()), vec!["r1", "r2"]);
    }

    #[test]
    fn dangling_requirement_becomes_a_root() {
        let tree = canonical(
            r#"
resources:
  vcn: {}
  subnet:
    requires:
      mandatory: [vcn, ghost]
"#,
            "subnet",
            false,
        );
        assert_eq!(names(tree.preorder()), vec!["ghost", "subnet", "vcn"]);
        assert_eq!(tree.roots().len(), 2);
    }

    #[test]
    fn dependents_hang_under_target() {
        let tree = canonical(COMPUTE, "subnet", true);
        assert_eq!(
            names(tree.children_of("subnet")),
            vec!["bastion", "compute_instance"]
        );
        assert_eq!(
            tree.find("compute_instance").unwrap().relation,
            Relation::Dependent
        );
    }

    #[test]
    fn placement_is_deterministic() {
        let catalog_path = project_root::get_project_root()
            .unwrap()
            .join("resources/resource_dependencies.yaml");
        let yaml = std::fs::read_to_string(catalog_path).unwrap();
        assert_eq!(
            canonical(&yaml, "compute_instance", false),
            canonical(&yaml, "compute_instance", false)
        );
    }

    #[test]
    fn every_node_is_placed_exactly_once() {
        let catalog_path = project_root::get_project_root()
            .unwrap()
            .join("resources/resource_dependencies.yaml");
        let yaml = std::fs::read_to_string(catalog_path).unwrap();
        let tree = canonical(&yaml, "vcn", true);
        let mut seen = names(tree.preorder());
        let total = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), total);
        assert_eq!(total, tree.len());
        assert!(tree.contains("app1_config"));
    }

    #[test]
    fn requirement_sources() {
        let catalog = Catalog::from_yaml_str(
            r#"
resources:
  vcn: {}
  vpn:
    requires:
      mandatory: [vcn]
  subnet:
    requires:
      mandatory: [vcn]
  app:
    requires:
      mandatory:
        - subnet
        - either: [vpn]
      optional: [bastion]
"#,
        )
        .unwrap();
        let limits = Limits::for_catalog(&catalog);
        let model = TreeModel::build(&catalog, "app", Expansion::Transitive, limits);
        let sources = RequirementSources::build(&catalog, &model, "app");

        assert!(!sources.is_optional("subnet"));
        assert!(sources.is_optional("vpn"));
        assert!(sources.is_optional("bastion"));
        // needed by subnet outright, by vpn only if it is picked
        assert!(!sources.is_optional("vcn"));
        assert_eq!(
            sources.requirers("vcn").unwrap(),
            &BTreeMap::from([
                (ResourceName::from("subnet"), false),
                (ResourceName::from("vpn"), true),
            ])
        );
        assert!(!sources.is_optional("app"));
    }

    #[test]
    fn relation_labels() {
        assert_eq!(Relation::Mandatory.to_string(), "mandatory");
        assert_eq!(Relation::EitherOption.to_string(), "either-option");
        assert_eq!(Relation::Dependent.to_string(), "dependent-of-target");
        assert_eq!(Relation::Dependent.marker(), "🔻");
    }
}
