use std::{collections::BTreeMap, vec};

use crate::{
    model::{Catalog, ResourceName},
    resolver::{Closure, ProvidedResources},
    tree::{
        canonical::{CanonicalTree, NodeId},
        ResolveOptions,
    },
};

const RULE_WIDTH: usize = 70;
const NAME_WIDTH: usize = 20;
const NOT_AVAILABLE: &str = "N/A";

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Everything a rendering pass reads. Cheap to copy.
#[derive(Clone, Copy)]
pub(crate) struct Renderer<'a> {
    pub(crate) catalog: &'a Catalog,
    pub(crate) target: &'a ResourceName,
    pub(crate) options: &'a ResolveOptions,
    pub(crate) closure: &'a Closure,
    pub(crate) provided: &'a ProvidedResources,
    pub(crate) tree: &'a CanonicalTree,
    pub(crate) annotations: &'a BTreeMap<ResourceName, String>,
}

impl<'a> Renderer<'a> {
    fn header(&self) -> Vec<String> {
        let mut lines = vec![
            "═".repeat(RULE_WIDTH),
            format!("Resource: {}", self.target.as_str().to_uppercase()),
            "═".repeat(RULE_WIDTH),
        ];
        if self.options.show_descriptions {
            let resource = self.catalog.get(self.target.as_str());
            let description = resource.and_then(|resource| resource.description.as_deref());
            let scheme = resource.and_then(|resource| resource.fqrn_scheme.as_deref());
            lines.push(String::new());
            lines.push(format!(
                "Description: {}",
                description.unwrap_or(NOT_AVAILABLE)
            ));
            lines.push(format!("FQRN Scheme: {}", scheme.unwrap_or(NOT_AVAILABLE)));
        }
        lines.push(String::new());
        lines.push("─".repeat(RULE_WIDTH));
        lines.push(
            if self.options.include_dependents {
                "DEPENDENCY TREE WITH DEPENDENTS (top to bottom):"
            } else {
                "DEPENDENCY TREE (top to bottom):"
            }
            .to_string(),
        );
        lines.push("─".repeat(RULE_WIDTH));
        lines.push(String::new());
        lines.push("✅ = Mandatory dependency".to_string());
        lines.push("🔹 = Optional dependency".to_string());
        lines.push("🔶 = One of (choose one)".to_string());
        if self.options.include_dependents {
            lines.push("🔻 = Dependent (depends on target)".to_string());
        }
        lines.push(String::new());
        lines
    }

    fn footer(&self) -> Vec<String> {
        let mut lines = vec![
            String::new(),
            summary("Mandatory", self.closure.mandatory.iter()),
            summary("Optional", self.closure.optional.iter()),
        ];
        if !self.provided.is_empty() {
            lines.push(summary("Provides", self.provided.provided.iter()));
        }
        lines
    }

    fn node_line(&self, id: NodeId, prefix: &str, last: bool) -> String {
        let node = self.tree.node(id);
        let name = node.name.as_str();
        let marker = node.relation.marker();
        let details = self.details(name);
        if self.options.show_descriptions {
            let description = self
                .catalog
                .get(name)
                .and_then(|resource| resource.description.as_deref())
                .unwrap_or(NOT_AVAILABLE);
            format!(
                "{prefix}{}{marker} {name:<NAME_WIDTH$}{details} - {description}",
                connector(last)
            )
        } else {
            format!("{prefix}{}{marker} {name}{details}", connector(last))
        }
    }

    /// Kind, type and provider annotation, each when enabled and known.
    fn details(&self, name: &str) -> String {
        let resource = self.catalog.get(name);
        let mut details = String::new();
        if self.options.show_kind {
            if let Some(kind) = resource.and_then(|resource| resource.kind.as_deref()) {
                details.push_str(&format!(" [{kind}]"));
            }
        }
        if self.options.show_type {
            if let Some(kind) = resource.and_then(|resource| resource.resource_type.as_deref()) {
                details.push_str(&format!(" <{kind}>"));
            }
        }
        if let Some(annotation) = self.annotations.get(name) {
            details.push(' ');
            details.push_str(annotation);
        }
        details
    }
}

fn connector(last: bool) -> &'static str {
    if last {
        LAST_BRANCH
    } else {
        BRANCH
    }
}

fn indent(prefix: &str, last: bool) -> String {
    format!("{prefix}{}", if last { SPACE } else { PIPE })
}

fn summary<'n>(label: &str, names: impl ExactSizeIterator<Item = &'n ResourceName>) -> String {
    let count = names.len();
    let names: Vec<&str> = names.map(ResourceName::as_str).collect();
    if names.is_empty() {
        format!("{label} ({count}): none")
    } else {
        format!("{label} ({count}): {}", names.join(", "))
    }
}

enum Step<'a> {
    Node {
        id: NodeId,
        prefix: String,
        last: bool,
    },
    Choice {
        group: &'a [ResourceName],
        prefix: String,
        last: bool,
    },
    Member {
        name: &'a ResourceName,
        prefix: String,
        last: bool,
    },
}

/// Rendered lines of a resolution, produced one at a time.
pub struct Lines<'a> {
    renderer: Renderer<'a>,
    header: vec::IntoIter<String>,
    stack: Vec<Step<'a>>,
    footer: vec::IntoIter<String>,
}

impl<'a> Lines<'a> {
    pub(crate) fn new(renderer: Renderer<'a>) -> Self {
        let roots = renderer.tree.roots();
        let stack = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(index, id)| Step::Node {
                id: *id,
                prefix: String::new(),
                last: index + 1 == roots.len(),
            })
            .collect();
        Lines {
            header: renderer.header().into_iter(),
            footer: renderer.footer().into_iter(),
            renderer,
            stack,
        }
    }

    fn step(&mut self, step: Step<'a>) -> String {
        match step {
            Step::Node { id, prefix, last } => {
                let line = self.renderer.node_line(id, &prefix, last);
                let tree: &'a CanonicalTree = self.renderer.tree;
                let node = tree.node(id);
                let child_prefix = indent(&prefix, last);
                let groups = &node.either_groups;
                let total = node.children.len() + groups.len();

                for (index, group) in groups.iter().enumerate().rev() {
                    self.stack.push(Step::Choice {
                        group,
                        prefix: child_prefix.clone(),
                        last: index + 1 == groups.len(),
                    });
                }
                for (index, child) in node.children.iter().enumerate().rev() {
                    self.stack.push(Step::Node {
                        id: *child,
                        prefix: child_prefix.clone(),
                        last: index + 1 == total,
                    });
                }
                line
            }
            Step::Choice {
                group,
                prefix,
                last,
            } => {
                let line = format!("{prefix}{}🔶 choose one:", connector(last));
                let member_prefix = indent(&prefix, last);
                for (index, name) in group.iter().enumerate().rev() {
                    self.stack.push(Step::Member {
                        name,
                        prefix: member_prefix.clone(),
                        last: index + 1 == group.len(),
                    });
                }
                line
            }
            Step::Member { name, prefix, last } => format!(
                "{prefix}{}{name}{}",
                connector(last),
                self.renderer.details(name.as_str())
            ),
        }
    }
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if let Some(line) = self.header.next() {
            return Some(line);
        }
        if let Some(step) = self.stack.pop() {
            return Some(self.step(step));
        }
        self.footer.next()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        model::Catalog,
        tree::{resolve, ResolveOptions},
    };

    const COMPUTE: &str = r#"
resources:
  vcn:
    kind: oci://resource
    type: bin/terraform
    requires: {}
  subnet:
    description: Regional subnet
    requires:
      mandatory: [vcn]
  compute_instance:
    description: Virtual machine instance
    fqrn_scheme: "oci://{region}/instance/{name}"
    requires:
      mandatory: [subnet]
      optional: [bastion]
  bastion:
    requires:
      mandatory: [subnet]
"#;

    fn tree_lines(yaml: &str, target: &str, options: ResolveOptions) -> Vec<String> {
        let catalog = Catalog::from_yaml_str(yaml).unwrap();
        let resolution = resolve(&catalog, target, &options).unwrap();
        let lines: Vec<String> = resolution.lines().collect();
        let legend = lines.iter().position(|line| line.starts_with("🔶 =")).unwrap();
        let start = legend + lines[legend..].iter().position(String::is_empty).unwrap() + 1;
        let end = lines.iter().rposition(|line| line.is_empty()).unwrap();
        lines[start..end].to_vec()
    }

    #[test]
    fn render_chain() {
        assert_eq!(
            tree_lines(COMPUTE, "compute_instance", ResolveOptions::default()),
            vec![
                "└── ✅ vcn",
                "    └── ✅ subnet",
                "        └── ✅ compute_instance",
                "            └── 🔹 bastion",
            ]
        );
    }

    #[test]
    fn render_header_and_footer() {
        let catalog = Catalog::from_yaml_str(COMPUTE).unwrap();
        let resolution = resolve(
            &catalog,
            "compute_instance",
            &ResolveOptions {
                show_descriptions: true,
                ..Default::default()
            },
        )
        .unwrap();
        let lines: Vec<String> = resolution.lines().collect();
        assert_eq!(
            lines[..14],
            [
                "═".repeat(70),
                "Resource: COMPUTE_INSTANCE".to_string(),
                "═".repeat(70),
                String::new(),
                "Description: Virtual machine instance".to_string(),
                "FQRN Scheme: oci://{region}/instance/{name}".to_string(),
                String::new(),
                "─".repeat(70),
                "DEPENDENCY TREE (top to bottom):".to_string(),
                "─".repeat(70),
                String::new(),
                "✅ = Mandatory dependency".to_string(),
                "🔹 = Optional dependency".to_string(),
                "🔶 = One of (choose one)".to_string(),
            ]
        );
        assert_eq!(
            lines[lines.len() - 3..],
            [
                String::new(),
                "Mandatory (2): subnet, vcn".to_string(),
                "Optional (1): bastion".to_string(),
            ]
        );
        assert!(lines.contains(&format!("    └── ✅ {:<20} - Regional subnet", "subnet")));
        assert!(lines.contains(&format!("└── ✅ {:<20} - N/A", "vcn")));
    }

    #[test]
    fn render_choose_one_block() {
        let yaml = r#"
resources:
  network_either:
    requires:
      mandatory:
        - either: [vpn, fastconnect]
"#;
        assert_eq!(
            tree_lines(yaml, "network_either", ResolveOptions::default()),
            vec![
                "└── ✅ network_either",
                "    └── 🔶 choose one:",
                "        ├── vpn",
                "        └── fastconnect",
            ]
        );
    }

    #[test]
    fn render_kind_and_type() {
        let lines = tree_lines(
            COMPUTE,
            "subnet",
            ResolveOptions {
                show_kind: true,
                show_type: true,
                ..Default::default()
            },
        );
        assert_eq!(
            lines,
            vec![
                "└── ✅ vcn [oci://resource] <bin/terraform>",
                "    └── ✅ subnet",
            ]
        );
    }

    #[test]
    fn render_dependents() {
        let catalog = Catalog::from_yaml_str(COMPUTE).unwrap();
        let options = ResolveOptions {
            include_dependents: true,
            ..Default::default()
        };
        let resolution = resolve(&catalog, "subnet", &options).unwrap();
        let lines: Vec<String> = resolution.lines().collect();
        assert!(lines.contains(&"DEPENDENCY TREE WITH DEPENDENTS (top to bottom):".to_string()));
        assert!(lines.contains(&"🔻 = Dependent (depends on target)".to_string()));
        assert_eq!(
            tree_lines(COMPUTE, "subnet", options),
            vec![
                "└── ✅ vcn",
                "    └── ✅ subnet",
                "        ├── 🔻 bastion",
                "        └── 🔻 compute_instance",
            ]
        );
    }

    #[test]
    fn lines_restart_on_every_call() {
        let catalog = Catalog::from_yaml_str(COMPUTE).unwrap();
        let resolution = resolve(&catalog, "compute_instance", &ResolveOptions::default()).unwrap();
        let first: Vec<String> = resolution.lines().collect();
        let mut partial = resolution.lines();
        partial.next();
        let second: Vec<String> = resolution.lines().collect();
        assert_eq!(first, second);
    }
}
