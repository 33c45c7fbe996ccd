//! Fragment materializer
//!
//! Summarizes an expanded event subgraph as a nested field selection, one
//! block per scope: the root block lists the fields touched where the
//! binding lives, a scope change becomes a `...Name` spread entry at its
//! path position, and the target scope's own block is emitted once after
//! the root. Rename nodes are transparent and flatten into their parent.
//!
//! Trees are ordered maps throughout, so rendering the same graph twice
//! yields byte-identical text.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt::Write;

use serde::Serialize;

use crate::flow::event::EventKind;
use crate::flow::expand::{EventGraph, EventNodeId};

/// Nested field selection; keys beginning with `...` are spread entries
/// and never carry children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathTree(pub BTreeMap<String, PathTree>);

impl PathTree {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn descend_mut(&mut self, segments: &[String]) -> &mut PathTree {
        let mut node = self;
        for segment in segments {
            node = node.0.entry(segment.clone()).or_default();
        }
        node
    }

    fn insert_spread(&mut self, name: &str) {
        self.0.entry(format!("...{name}")).or_default();
    }

    fn merge(&mut self, other: PathTree) {
        for (key, subtree) in other.0 {
            self.0.entry(key).or_default().merge(subtree);
        }
    }

    fn render_into(&self, out: &mut String, indent: usize) {
        for (key, subtree) in &self.0 {
            for _ in 0..indent {
                out.push_str("  ");
            }
            out.push_str(key);
            if subtree.is_empty() {
                out.push('\n');
            } else {
                out.push_str(" {\n");
                subtree.render_into(out, indent + 1);
                for _ in 0..indent {
                    out.push_str("  ");
                }
                out.push_str("}\n");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    /// Scope the tracked binding lives in.
    pub name: String,
    /// The tracked binding itself.
    pub source: String,
    pub content: PathTree,
    /// One body per referenced scope, keyed by scope name.
    pub spreads: BTreeMap<String, PathTree>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.spreads.is_empty()
    }

    /// Renders the root block followed by one block per spread scope.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_block(&mut out, &self.name, &self.source, &self.content);
        for (scope, tree) in &self.spreads {
            out.push('\n');
            render_block(&mut out, scope, &self.source, tree);
        }
        out
    }

    /// Renders only the named spread scope's block, for per-node display.
    pub fn render_spread(&self, scope: &str) -> Option<String> {
        let tree = self.spreads.get(scope)?;
        let mut out = String::new();
        render_block(&mut out, scope, &self.source, tree);
        Some(out)
    }
}

fn render_block(out: &mut String, name: &str, source: &str, tree: &PathTree) {
    let _ = writeln!(out, "fragment {name} on {source} {{");
    tree.render_into(out, 1);
    out.push_str("}\n");
}

pub fn materialize_fragment(
    graph: &EventGraph,
    root: EventNodeId,
    scope_name: &str,
    binding_name: &str,
) -> Fragment {
    let mut spreads = BTreeMap::new();
    let mut visiting = HashSet::new();
    visiting.insert(root);
    let content = build_tree(graph, root, &mut spreads, &mut visiting);
    Fragment {
        name: scope_name.to_string(),
        source: binding_name.to_string(),
        content,
        spreads,
    }
}

fn build_tree(
    graph: &EventGraph,
    node: EventNodeId,
    spreads: &mut BTreeMap<String, PathTree>,
    visiting: &mut HashSet<EventNodeId>,
) -> PathTree {
    let mut tree = PathTree::default();
    for &child_id in &graph.get(node).children {
        let child = graph.get(child_id);
        let paths: Vec<Vec<String>> = if child.paths.is_empty() {
            vec![Vec::new()]
        } else {
            child.paths.clone()
        };

        match child.event.kind {
            EventKind::Expression => {
                for path in &paths {
                    tree.descend_mut(path);
                }
            }
            EventKind::ScopeChange => {
                for path in &paths {
                    tree.descend_mut(path).insert_spread(&child.label);
                }
                if visiting.insert(child_id) {
                    let body = build_tree(graph, child_id, spreads, visiting);
                    visiting.remove(&child_id);
                    // Distinct scopes can share a display label; their
                    // bodies merge into one block under that label.
                    spreads.entry(child.label.clone()).or_default().merge(body);
                }
            }
            EventKind::InScope => {
                if visiting.insert(child_id) {
                    let body = build_tree(graph, child_id, spreads, visiting);
                    visiting.remove(&child_id);
                    for path in &paths {
                        tree.descend_mut(path).merge(body.clone());
                    }
                } else {
                    for path in &paths {
                        tree.descend_mut(path);
                    }
                }
            }
            EventKind::Declaration => {}
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::flow::event::Event;
    use crate::flow::expand::{expand_root, finalize_content};
    use crate::session::{AnalysisSession, FsHost, ScopeRef};
    use std::path::Path;

    fn fragment_for(source: &str, name: &str) -> Fragment {
        let mut session = AnalysisSession::new(
            TrackerConfig::default(),
            Box::new(FsHost),
            Path::new("/tmp"),
        );
        let file = session.load_root("test.tsx", source).unwrap();
        let root_scope = session.model(file).scope_tree.root().unwrap();
        let scope = ScopeRef {
            file,
            scope: root_scope,
        };
        let event = Event::declaration(name, scope);
        let root = expand_root(&mut session, event);
        finalize_content(session.graph_mut(), root);
        let scope_name = session.scope_name(scope).to_string();
        materialize_fragment(session.graph(), root, &scope_name, name)
    }

    #[test]
    fn unreferenced_binding_yields_an_empty_fragment() {
        let fragment = fragment_for("const data = load();\n", "data");

        assert!(fragment.is_empty());
        assert_eq!(fragment.render(), "fragment Program on data {\n}\n");
    }

    #[test]
    fn nested_member_reads_render_as_nested_blocks() {
        let fragment = fragment_for(
            "const data = load();\nconsole.log(data.user.name);\nconsole.log(data.user.email);\n",
            "data",
        );

        assert_eq!(
            fragment.render(),
            "fragment Program on data {\n  user {\n    email\n    name\n  }\n}\n"
        );
    }

    #[test]
    fn scope_change_appears_as_spread_with_its_own_block() {
        let fragment = fragment_for(
            "const fmt = (p) => p.sub;\nconst data = load();\nfmt(data.field);\n",
            "data",
        );

        let text = fragment.render();
        assert!(text.contains("field {\n    ...fmt\n  }"));
        assert!(text.contains("fragment fmt on data {\n  sub\n}"));
    }

    #[test]
    fn rename_flattens_into_the_parent_block() {
        let fragment = fragment_for(
            "const data = load();\nconst short = data.field;\nconsole.log(short.sub);\n",
            "data",
        );

        assert_eq!(
            fragment.render(),
            "fragment Program on data {\n  field {\n    sub\n  }\n}\n"
        );
    }

    #[test]
    fn shared_scope_emits_a_single_spread_block() {
        let fragment = fragment_for(
            "const fmt = (p) => p.sub;\nconst data = load();\nfmt(data.a);\nfmt(data.b);\n",
            "data",
        );

        let text = fragment.render();
        assert_eq!(text.matches("fragment fmt on data").count(), 1);
        assert!(text.contains("a {\n    ...fmt\n  }"));
        assert!(text.contains("b {\n    ...fmt\n  }"));
    }

    #[test]
    fn distinct_scopes_with_one_label_merge_their_spread_bodies() {
        let fragment = fragment_for(
            "const data = load();\ndata.a.map((x) => x.foo);\ndata.b.map((y) => y.bar);\n",
            "data",
        );

        let text = fragment.render();
        // Two anonymous callbacks share the ArrowFunction label; both
        // bodies land in the same block.
        assert_eq!(text.matches("fragment ArrowFunction on data").count(), 1);
        assert!(text.contains("foo"));
        assert!(text.contains("bar"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let fragment = fragment_for(
            "const data = load();\nconst { name } = data.user;\nshow(data.meta.id);\n",
            "data",
        );

        assert_eq!(fragment.render(), fragment.render());
    }
}
