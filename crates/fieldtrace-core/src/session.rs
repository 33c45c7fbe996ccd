//! Analysis session: the per-run context
//!
//! Owns everything one analysis run mutates: the parsed-file cache, the
//! lazily resolved import table, the per-binding event memo, and the event
//! node arena. A session is built fresh per entry-point call; nothing here
//! is shared between runs.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use id_arena::{Arena, Id};

use crate::config::TrackerConfig;
use crate::error::TrackError;
use crate::flow::event::Event;
use crate::flow::expand::EventGraph;
use crate::parser::{ParseError, ParsedFile};
use crate::semantic::{
    BindingId, ImportRecord, ImportedName, ScopeId, ScopeKind, SemanticModel,
};

/// File resolution service: given a candidate path, return contents or
/// "not found". The engine never touches the filesystem except through
/// this seam.
pub trait FileHost {
    fn read(&self, path: &Path) -> Option<String>;
}

/// Filesystem-backed host used by the default entry point.
#[derive(Debug, Default)]
pub struct FsHost;

impl FileHost for FsHost {
    fn read(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

pub struct FileAnalysis {
    pub path: PathBuf,
    pub model: SemanticModel,
}

pub type FileId = Id<FileAnalysis>;

/// A scope in some loaded file. Events reference scopes across files, so
/// a bare `ScopeId` is never enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeRef {
    pub file: FileId,
    pub scope: ScopeId,
}

pub struct AnalysisSession {
    config: TrackerConfig,
    host: Box<dyn FileHost>,
    base_dir: PathBuf,
    files: Arena<FileAnalysis>,
    loaded: HashMap<PathBuf, Option<FileId>>,
    import_memo: HashMap<(FileId, String), Option<ScopeRef>>,
    event_memo: HashMap<(FileId, BindingId), Vec<Event>>,
    graph: EventGraph,
}

impl AnalysisSession {
    pub fn new(config: TrackerConfig, host: Box<dyn FileHost>, base_dir: &Path) -> Self {
        Self {
            config,
            host,
            base_dir: base_dir.to_path_buf(),
            files: Arena::new(),
            loaded: HashMap::new(),
            import_memo: HashMap::new(),
            event_memo: HashMap::new(),
            graph: EventGraph::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn graph(&self) -> &EventGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut EventGraph {
        &mut self.graph
    }

    /// Parses the root file. A fatal parse failure here is the one error
    /// that aborts a run.
    pub fn load_root(&mut self, filename: &str, source: &str) -> Result<FileId, TrackError> {
        let file = ParsedFile::from_source(filename, source);
        let Some(model) = SemanticModel::build(&file, &self.config) else {
            let error = file.errors().last().cloned().unwrap_or(ParseError {
                line: 0,
                column: 0,
                span_lo: 0,
                span_hi: 0,
                message: "no module produced".to_string(),
            });
            return Err(TrackError::Parse {
                path: filename.to_string(),
                source: error,
            });
        };

        let path = normalize_path(Path::new(filename));
        let id = self.files.alloc(FileAnalysis {
            path: path.clone(),
            model,
        });
        self.loaded.insert(path, Some(id));
        Ok(id)
    }

    pub fn model(&self, file: FileId) -> &SemanticModel {
        &self.files[file].model
    }

    pub fn file_path(&self, file: FileId) -> &Path {
        &self.files[file].path
    }

    pub fn scope_name(&self, scope: ScopeRef) -> &str {
        &self.model(scope.file).scope_tree.get(scope.scope).name
    }

    pub fn scope_kind(&self, scope: ScopeRef) -> ScopeKind {
        self.model(scope.file).scope_tree.get(scope.scope).kind
    }

    pub fn lookup_binding(&self, at: ScopeRef, name: &str) -> Option<BindingId> {
        let model = self.model(at.file);
        model.bindings.lookup(name, at.scope, &model.scope_tree)
    }

    pub fn cached_events(&self, file: FileId, binding: BindingId) -> Option<&Vec<Event>> {
        self.event_memo.get(&(file, binding))
    }

    pub fn cache_events(&mut self, file: FileId, binding: BindingId, events: Vec<Event>) {
        self.event_memo.insert((file, binding), events);
    }

    /// Resolves a declared name to a scope: first through the scope tree of
    /// the referencing file, then through its imports. Failure yields
    /// `None`; the classifier degrades to a terminal reference.
    pub fn resolve_scope(&mut self, from: ScopeRef, name: &str) -> Option<ScopeRef> {
        let model = self.model(from.file);
        if let Some(scope) = model.scope_tree.resolve_named_scope(from.scope, name) {
            return Some(ScopeRef {
                file: from.file,
                scope,
            });
        }
        if model.imports.contains_key(name) {
            return self.resolve_import(from.file, name);
        }
        None
    }

    /// Lazy, memoized import resolution: the target file is read, parsed,
    /// and scope-built only on the first request.
    pub fn resolve_import(&mut self, file: FileId, local: &str) -> Option<ScopeRef> {
        let key = (file, local.to_string());
        if let Some(resolved) = self.import_memo.get(&key) {
            return *resolved;
        }

        let record = self.model(file).imports.get(local).cloned();
        let resolved = record.as_ref().and_then(|r| self.resolve_import_record(file, r));
        if resolved.is_none() {
            tracing::warn!(local, "import did not resolve to a scope");
        }
        self.import_memo.insert(key, resolved);
        resolved
    }

    fn resolve_import_record(&mut self, from: FileId, record: &ImportRecord) -> Option<ScopeRef> {
        let base = self.specifier_base(from, &record.specifier)?;
        let target = self.load_file_probing(&base)?;
        let model = self.model(target);

        let scope = match &record.imported {
            ImportedName::Named(name) => model
                .scope_tree
                .exported_scope(name)
                .or_else(|| {
                    let root = model.scope_tree.root()?;
                    model
                        .scope_tree
                        .children(root)
                        .find(|s| s.name == *name)
                        .map(|s| s.id)
                }),
            ImportedName::Default => model.scope_tree.default_exported_scope(),
        }?;

        Some(ScopeRef {
            file: target,
            scope,
        })
    }

    fn specifier_base(&self, from: FileId, specifier: &str) -> Option<PathBuf> {
        if let Some(rest) = specifier.strip_prefix(&self.config.alias_prefix) {
            return Some(self.base_dir.join(rest));
        }
        if specifier.starts_with('.') {
            let dir = self.files[from].path.parent().unwrap_or(Path::new(""));
            return Some(dir.join(specifier));
        }
        // Bare specifiers are package imports; nothing to trace there.
        None
    }

    /// Tries the base path as given, then with each configured extension.
    fn load_file_probing(&mut self, base: &Path) -> Option<FileId> {
        if base.extension().is_some()
            && let Some(id) = self.load_file(&normalize_path(base))
        {
            return Some(id);
        }
        let extensions = self.config.extensions.clone();
        for ext in &extensions {
            let mut candidate = base.as_os_str().to_owned();
            candidate.push(".");
            candidate.push(ext);
            let candidate = normalize_path(Path::new(&candidate));
            if let Some(id) = self.load_file(&candidate) {
                return Some(id);
            }
        }
        None
    }

    fn load_file(&mut self, path: &Path) -> Option<FileId> {
        if let Some(cached) = self.loaded.get(path) {
            return *cached;
        }

        let loaded = self.host.read(path).and_then(|source| {
            let parsed = ParsedFile::from_source(&path.to_string_lossy(), &source);
            match SemanticModel::build(&parsed, &self.config) {
                Some(model) => {
                    tracing::debug!(path = %path.display(), "imported file parsed");
                    Some(self.files.alloc(FileAnalysis {
                        path: path.to_path_buf(),
                        model,
                    }))
                }
                None => {
                    tracing::warn!(path = %path.display(), "imported file failed to parse");
                    None
                }
            }
        });

        self.loaded.insert(path.to_path_buf(), loaded);
        loaded
    }
}

/// Lexically resolves `.` and `..` components; files may not exist yet, so
/// this never touches the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn session_in(dir: &Path) -> AnalysisSession {
        AnalysisSession::new(TrackerConfig::default(), Box::new(FsHost), dir)
    }

    #[test]
    fn load_root_rejects_unparsable_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        let result = session.load_root("broken.ts", "const {{{{");

        assert!(matches!(result, Err(TrackError::Parse { .. })));
    }

    #[test]
    fn resolves_relative_import_with_extension_probing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("card.tsx"),
            "export const Card = (props) => props.user.name;\n",
        )
        .unwrap();

        let mut session = session_in(dir.path());
        let main = session
            .load_root(
                &dir.path().join("main.tsx").to_string_lossy(),
                "import { Card } from './card';\nconst x = 1;\n",
            )
            .unwrap();

        let root = session.model(main).scope_tree.root().unwrap();
        let resolved = session.resolve_scope(
            ScopeRef {
                file: main,
                scope: root,
            },
            "Card",
        );

        let resolved = resolved.expect("import should resolve");
        assert_eq!(session.scope_name(resolved), "Card");
        assert_ne!(resolved.file, main);
    }

    #[test]
    fn resolves_default_import() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("widget.tsx"),
            "const Widget = () => null;\nexport default Widget;\n",
        )
        .unwrap();

        let mut session = session_in(dir.path());
        let main = session
            .load_root(
                &dir.path().join("main.tsx").to_string_lossy(),
                "import Thing from './widget';\nconst x = 1;\n",
            )
            .unwrap();

        let root = session.model(main).scope_tree.root().unwrap();
        let resolved = session
            .resolve_scope(
                ScopeRef {
                    file: main,
                    scope: root,
                },
                "Thing",
            )
            .expect("default import should resolve");

        assert_eq!(session.scope_name(resolved), "Widget");
    }

    #[test]
    fn resolves_alias_prefixed_import() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(
            dir.path().join("lib/util.ts"),
            "export const pick = (v) => v.name;\n",
        )
        .unwrap();

        let mut session = session_in(dir.path());
        let main = session
            .load_root(
                &dir.path().join("main.tsx").to_string_lossy(),
                "import { pick } from '@/lib/util';\nconst x = 1;\n",
            )
            .unwrap();

        let root = session.model(main).scope_tree.root().unwrap();
        let resolved = session.resolve_scope(
            ScopeRef {
                file: main,
                scope: root,
            },
            "pick",
        );

        assert!(resolved.is_some());
    }

    #[test]
    fn missing_import_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let main = session
            .load_root("main.tsx", "import { gone } from './nowhere';\nconst x = 1;\n")
            .unwrap();

        let root = session.model(main).scope_tree.root().unwrap();
        let resolved = session.resolve_scope(
            ScopeRef {
                file: main,
                scope: root,
            },
            "gone",
        );

        assert!(resolved.is_none());
        // Memoized: the second query takes the cached path.
        let again = session.resolve_import(main, "gone");
        assert!(again.is_none());
    }

    #[test]
    fn bare_package_specifiers_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let main = session
            .load_root("main.tsx", "import { useState } from 'react';\nconst x = 1;\n")
            .unwrap();

        assert!(session.resolve_import(main, "useState").is_none());
    }

    #[test]
    fn normalize_path_collapses_dots() {
        assert_eq!(
            normalize_path(Path::new("/a/b/./../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_path(Path::new("./x/y")), PathBuf::from("x/y"));
    }
}
