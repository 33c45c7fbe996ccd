//! Render graph materializer
//!
//! Flattens an expanded event subgraph into display nodes and edges: the
//! declaration root, one access node per distinct path segment under each
//! event node, and a terminal node per scope change or rename. Shared
//! event nodes keep shared render nodes, and duplicate edges between the
//! same pair collapse, so a diamond in the event graph stays a diamond
//! here. Identifiers are assigned sequentially in visit order, which makes
//! materialization deterministic for a given graph.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::flow::event::EventKind;
use crate::flow::expand::{EventGraph, EventNodeId};
use crate::flow::fragment::Fragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderNodeKind {
    Declaration,
    Access,
    ScopeChange,
    Rename,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: String,
    pub name: String,
    pub kind: RenderNodeKind,
    /// Fragment text shown with the node: the whole fragment on the
    /// declaration, the spread body on a scope change, empty elsewhere.
    pub fragment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

pub fn materialize_graph(
    graph: &EventGraph,
    root: EventNodeId,
    fragment: &Fragment,
) -> RenderGraph {
    let mut builder = GraphBuilder {
        graph,
        fragment,
        nodes: Vec::new(),
        edges: Vec::new(),
        edge_seen: HashSet::new(),
        ports: HashMap::new(),
    };

    let root_name = graph.get(root).event.from_var.clone();
    let root_id = builder.push_node(&root_name, RenderNodeKind::Declaration, fragment.render());
    builder.ports.insert(
        root,
        Ports {
            entries: vec![root_id.clone()],
            exit: root_id,
        },
    );
    builder.visit(root);

    RenderGraph {
        nodes: builder.nodes,
        edges: builder.edges,
    }
}

/// Connection points of one materialized event node: edges from the parent
/// land on `entries`, edges to children leave from `exit`.
struct Ports {
    entries: Vec<String>,
    exit: String,
}

/// Access chains built for one event node: the head and tail render id of
/// each path, shared prefixes within the node already collapsed.
struct Chains {
    entries: Vec<String>,
    tails: Vec<String>,
}

struct GraphBuilder<'a> {
    graph: &'a EventGraph,
    fragment: &'a Fragment,
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    edge_seen: HashSet<(String, String)>,
    ports: HashMap<EventNodeId, Ports>,
}

impl GraphBuilder<'_> {
    fn visit(&mut self, node: EventNodeId) {
        let exit = self.ports[&node].exit.clone();
        for &child in &self.graph.get(node).children.clone() {
            let first_visit = !self.ports.contains_key(&child);
            if first_visit {
                let ports = self.build_event_node(child);
                self.ports.insert(child, ports);
            }
            let entries = self.ports[&child].entries.clone();
            for entry in entries {
                self.push_edge(&exit, &entry);
            }
            if first_visit {
                self.visit(child);
            }
        }
    }

    fn build_event_node(&mut self, id: EventNodeId) -> Ports {
        match self.graph.get(id).event.kind {
            EventKind::Expression => {
                let chains = self.build_chains(id);
                let exit = chains.tails.first().cloned().unwrap_or_default();
                Ports {
                    entries: chains.entries,
                    exit,
                }
            }
            EventKind::ScopeChange => {
                let label = self.graph.get(id).label.clone();
                let fragment_text = self.fragment.render_spread(&label).unwrap_or_default();
                self.build_terminal(id, RenderNodeKind::ScopeChange, fragment_text)
            }
            EventKind::InScope => self.build_terminal(id, RenderNodeKind::Rename, String::new()),
            // Declarations only occur as roots, which are materialized
            // before visiting starts.
            EventKind::Declaration => Ports {
                entries: Vec::new(),
                exit: String::new(),
            },
        }
    }

    /// Chains per path, each tail feeding one terminal kind node. A node
    /// whose paths are all empty connects the terminal directly.
    fn build_terminal(
        &mut self,
        id: EventNodeId,
        kind: RenderNodeKind,
        fragment_text: String,
    ) -> Ports {
        let label = self.graph.get(id).label.clone();
        let chains = self.build_chains(id);
        let terminal = self.push_node(&label, kind, fragment_text);

        let mut entries = chains.entries;
        if chains.tails.is_empty() {
            entries.push(terminal.clone());
        } else {
            for tail in &chains.tails {
                self.push_edge(tail, &terminal);
            }
        }
        Ports {
            entries,
            exit: terminal,
        }
    }

    fn build_chains(&mut self, id: EventNodeId) -> Chains {
        let paths = self.graph.get(id).paths.clone();
        let mut by_prefix: HashMap<String, String> = HashMap::new();
        let mut entries = Vec::new();
        let mut tails = Vec::new();

        for path in &paths {
            let mut prefix = String::new();
            let mut previous: Option<String> = None;
            for (i, segment) in path.iter().enumerate() {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(segment);
                let node_id = match by_prefix.get(&prefix) {
                    Some(existing) => existing.clone(),
                    None => {
                        let created =
                            self.push_node(segment, RenderNodeKind::Access, String::new());
                        by_prefix.insert(prefix.clone(), created.clone());
                        created
                    }
                };
                if i == 0 && !entries.contains(&node_id) {
                    entries.push(node_id.clone());
                }
                if let Some(prev) = &previous {
                    self.push_edge(prev, &node_id);
                }
                previous = Some(node_id);
            }
            if let Some(tail) = previous
                && !tails.contains(&tail)
            {
                tails.push(tail);
            }
        }
        Chains { entries, tails }
    }

    fn push_node(&mut self, name: &str, kind: RenderNodeKind, fragment: String) -> String {
        let id = format!("n{}", self.nodes.len());
        self.nodes.push(RenderNode {
            id: id.clone(),
            name: name.to_string(),
            kind,
            fragment,
        });
        id
    }

    fn push_edge(&mut self, source: &str, target: &str) {
        let key = (source.to_string(), target.to_string());
        if !self.edge_seen.insert(key) {
            return;
        }
        self.edges.push(RenderEdge {
            id: format!("e{}", self.edges.len()),
            source: source.to_string(),
            target: target.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::flow::event::Event;
    use crate::flow::expand::{expand_root, finalize_content};
    use crate::flow::fragment::materialize_fragment;
    use crate::session::{AnalysisSession, FsHost, ScopeRef};
    use std::path::Path;

    fn graph_for(source: &str, name: &str) -> RenderGraph {
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
        let root = expand_root(&mut session, Event::declaration(name, scope));
        finalize_content(session.graph_mut(), root);
        let scope_name = session.scope_name(scope).to_string();
        let fragment = materialize_fragment(session.graph(), root, &scope_name, name);
        materialize_graph(session.graph(), root, &fragment)
    }

    #[test]
    fn unreferenced_binding_is_a_single_declaration_node() {
        let graph = graph_for("const data = load();\n", "data");

        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].kind, RenderNodeKind::Declaration);
        assert_eq!(graph.nodes[0].name, "data");
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn member_chain_yields_one_node_per_segment() {
        let graph = graph_for("const a = load();\nconsole.log(a.b.c);\n", "a");

        assert_eq!(graph.nodes.len(), 3);
        let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let pairs: Vec<(&str, &str)> = graph
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        // Intra-chain edges are emitted while the chain is built, the edge
        // from the declaration once the chain is linked to its parent.
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("n0", "n1")));
        assert!(pairs.contains(&("n1", "n2")));
    }

    #[test]
    fn duplicate_reads_do_not_duplicate_nodes_or_edges() {
        let graph = graph_for(
            "const a = load();\nconsole.log(a.b.c);\nshow(a.b.c);\n",
            "a",
        );

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn scope_change_ends_in_a_kind_node_with_spread_fragment() {
        let graph = graph_for(
            "const fmt = (p) => p.sub;\nconst data = load();\nfmt(data.field);\n",
            "data",
        );

        let scope_node = graph
            .nodes
            .iter()
            .find(|n| n.kind == RenderNodeKind::ScopeChange)
            .expect("scope change node");
        assert_eq!(scope_node.name, "fmt");
        assert!(scope_node.fragment.contains("fragment fmt on data"));
        // data -> field -> fmt -> sub
        assert_eq!(graph.edges.len(), 3);
        let sub = graph
            .nodes
            .iter()
            .find(|n| n.name == "sub")
            .expect("access node inside the callee");
        assert!(graph
            .edges
            .iter()
            .any(|e| e.source == scope_node.id && e.target == sub.id));
    }

    #[test]
    fn rename_ends_in_a_rename_node() {
        let graph = graph_for(
            "const data = load();\nconst short = data.field;\n",
            "data",
        );

        let rename = graph
            .nodes
            .iter()
            .find(|n| n.kind == RenderNodeKind::Rename)
            .expect("rename node");
        assert_eq!(rename.name, "short");
        assert!(rename.fragment.is_empty());
    }

    #[test]
    fn declaration_node_carries_the_full_fragment() {
        let graph = graph_for(
            "const data = load();\nconsole.log(data.user.name);\n",
            "data",
        );

        assert!(graph.nodes[0].fragment.starts_with("fragment Program on data {"));
    }

    #[test]
    fn node_and_edge_ids_are_sequential() {
        let graph = graph_for(
            "const data = load();\nconsole.log(data.a.b);\nconsole.log(data.c);\n",
            "data",
        );

        for (i, node) in graph.nodes.iter().enumerate() {
            assert_eq!(node.id, format!("n{i}"));
        }
        for (i, edge) in graph.edges.iter().enumerate() {
            assert_eq!(edge.id, format!("e{i}"));
        }
    }
}
