//! Top-level entry point
//!
//! `DependencyTracker` runs the whole pipeline for one entry file: parse,
//! build the semantic model, then for every marker-designated binding
//! expand its event graph and materialize the three outputs. Imported
//! files load lazily as flow reaches them; their failures degrade, only a
//! broken entry file is an error.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::config::TrackerConfig;
use crate::error::TrackError;
use crate::flow::{
    expand_root, finalize_content, materialize_fragment, materialize_graph, Event, Fragment,
    RenderGraph,
};
use crate::session::{AnalysisSession, FileHost, FsHost, ScopeRef};

/// Everything produced for one tracked binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackReport {
    /// The tracked binding.
    pub name: String,
    /// Name of the scope declaring it.
    pub scope: String,
    pub graph: RenderGraph,
    pub fragment: Fragment,
    /// Rendered fragment blocks, byte-stable across runs.
    pub fragment_text: String,
    /// Flat dotted member paths reachable from the binding.
    pub paths: BTreeSet<String>,
}

impl TrackReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Default)]
pub struct DependencyTracker {
    config: TrackerConfig,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Analyzes `source` as the entry file; `base_dir` anchors alias
    /// imports. One report per marker-designated binding, in marker order.
    pub fn analyze(
        &self,
        filename: &str,
        source: &str,
        base_dir: &Path,
    ) -> Result<Vec<TrackReport>, TrackError> {
        self.analyze_with_host(Box::new(FsHost), filename, source, base_dir)
    }

    pub fn analyze_with_host(
        &self,
        host: Box<dyn FileHost>,
        filename: &str,
        source: &str,
        base_dir: &Path,
    ) -> Result<Vec<TrackReport>, TrackError> {
        let mut session = AnalysisSession::new(self.config.clone(), host, base_dir);
        let file = session.load_root(filename, source)?;

        let tracked = session.model(file).tracked.clone();
        tracing::debug!(count = tracked.len(), "tracked bindings found");

        let mut reports = Vec::new();
        for marker in tracked {
            let at = ScopeRef {
                file,
                scope: marker.scope,
            };
            let Some(binding) = session.lookup_binding(at, &marker.name) else {
                tracing::warn!(name = %marker.name, "marker names no visible binding");
                continue;
            };
            let scope = ScopeRef {
                file,
                scope: session.model(file).bindings.get(binding).scope,
            };

            let root = expand_root(&mut session, Event::declaration(&marker.name, scope));
            finalize_content(session.graph_mut(), root);

            let scope_name = session.scope_name(scope).to_string();
            let fragment =
                materialize_fragment(session.graph(), root, &scope_name, &marker.name);
            let graph = materialize_graph(session.graph(), root, &fragment);
            let paths = session.graph().get(root).content.clone();

            reports.push(TrackReport {
                name: marker.name,
                scope: scope_name,
                graph,
                fragment_text: fragment.render(),
                fragment,
                paths,
            });
        }
        Ok(reports)
    }
}
