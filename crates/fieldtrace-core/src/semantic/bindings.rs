//! Binding table: declared names per scope with their reference sites
//!
//! Each binding records every reference made to it, together with the
//! classification data captured while walking the AST: the extracted member
//! path, the object-literal wrapping prefix, and the syntactic role the
//! reference plays. The classifier turns these sites into flow events
//! without ever revisiting the AST.

use std::collections::HashMap;

use id_arena::{Arena, Id};
use swc_common::Span;

use super::scope::{PatternLeaf, ScopeId, ScopeTree};

pub type BindingId = Id<Binding>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Const,
    Let,
    Var,
    Param,
    Function,
    Class,
    Import,
    /// Synthetic per-class binding shared by all methods of one instance.
    This,
}

/// Syntactic role of one reference, decided by the nearest enclosing
/// consumer at the time the reference was visited.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceRole {
    /// Initializer of a `const`/`let` declarator; one leaf per bound name
    /// (a plain `const x = ...` is a single leaf with an empty path).
    Declarator { leaves: Vec<PatternLeaf> },
    /// Argument (not callee) of a call; callee named by its simple name.
    CallArg { callee: String, index: usize },
    /// Receiver of a reserved array-iteration call; the callback scope was
    /// already constructed when the site was recorded.
    IterationCall { callback: ScopeId },
    /// Expression value of a markup attribute on a capitalized element.
    JsxAttribute { component: String, attr: String },
    /// No structural consumer found.
    Bare,
}

#[derive(Debug, Clone)]
pub struct ReferenceSite {
    /// Scope in which the reference occurs (not necessarily the scope that
    /// declares the binding).
    pub scope: ScopeId,
    /// Full extracted member path, including the leading binding name or
    /// `this` segment.
    pub path: Vec<String>,
    /// Object-literal keys wrapping the reference, outermost first.
    pub wrap_prefix: Vec<String>,
    pub role: ReferenceRole,
    pub span: Span,
}

#[derive(Debug)]
pub struct Binding {
    pub id: BindingId,
    pub name: String,
    pub kind: BindingKind,
    pub scope: ScopeId,
    pub span: Span,
    pub references: Vec<ReferenceSite>,
}

#[derive(Default)]
pub struct BindingTable {
    arena: Arena<Binding>,
    by_scope: HashMap<ScopeId, HashMap<String, BindingId>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        &mut self,
        name: impl Into<String>,
        kind: BindingKind,
        scope: ScopeId,
        span: Span,
    ) -> BindingId {
        let name = name.into();
        let id = self.arena.alloc_with_id(|id| Binding {
            id,
            name: name.clone(),
            kind,
            scope,
            span,
            references: Vec::new(),
        });

        self.by_scope.entry(scope).or_default().insert(name, id);
        id
    }

    pub fn get(&self, id: BindingId) -> &Binding {
        &self.arena[id]
    }

    pub fn get_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.arena[id]
    }

    /// Resolves `name` starting at `scope` and walking outward through the
    /// scope tree, innermost declaration wins.
    pub fn lookup(&self, name: &str, scope: ScopeId, scope_tree: &ScopeTree) -> Option<BindingId> {
        for ancestor in scope_tree.ancestors(scope) {
            if let Some(id) = self
                .by_scope
                .get(&ancestor.id)
                .and_then(|names| names.get(name))
            {
                return Some(*id);
            }
        }
        None
    }

    /// Binding declared directly in `scope`, without walking outward.
    pub fn lookup_local(&self, name: &str, scope: ScopeId) -> Option<BindingId> {
        self.by_scope
            .get(&scope)
            .and_then(|names| names.get(name))
            .copied()
    }

    pub fn add_reference(&mut self, id: BindingId, site: ReferenceSite) {
        self.arena[id].references.push(site);
    }
}
