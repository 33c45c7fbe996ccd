//! Lexical scope tree for tracked programs
//!
//! One scope record per lexical region (module, function, arrow function,
//! class, class method). Scopes carry the inferred display name used for
//! cross-scope resolution and fragment naming, and the formal parameter
//! shapes used when a call binds a tracked path to a parameter.

use id_arena::{Arena, Id};
use swc_common::Span;

pub type ScopeId = Id<Scope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    ArrowFunction,
    Method,
    Class,
}

impl ScopeKind {
    /// Class-shaped scopes receive forwarded attributes through `this.props`,
    /// function-shaped scopes through their first formal parameter.
    pub fn is_class_shaped(self) -> bool {
        matches!(self, ScopeKind::Class)
    }

    pub fn is_function_shaped(self) -> bool {
        matches!(
            self,
            ScopeKind::Function | ScopeKind::ArrowFunction | ScopeKind::Method
        )
    }
}

/// One leaf of a destructuring pattern: the bound name plus the property
/// path from the pattern root down to the leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternLeaf {
    pub name: String,
    pub path: Vec<String>,
}

/// Shape of one formal parameter, recorded at scope construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamPattern {
    Ident(String),
    Object(Vec<PatternLeaf>),
    Opaque,
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub span: Span,
    pub params: Vec<ParamPattern>,
    pub is_exported: bool,
    pub is_default_export: bool,
}

pub struct ScopeTree {
    arena: Arena<Scope>,
    root: Option<ScopeId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn create_scope(
        &mut self,
        kind: ScopeKind,
        name: impl Into<String>,
        parent: Option<ScopeId>,
        span: Span,
    ) -> ScopeId {
        let name = name.into();
        let id = self.arena.alloc_with_id(|id| Scope {
            id,
            kind,
            name,
            parent,
            children: Vec::new(),
            span,
            params: Vec::new(),
            is_exported: false,
            is_default_export: false,
        });

        if let Some(parent_id) = parent {
            self.arena[parent_id].children.push(id);
        }

        if self.root.is_none() {
            self.root = Some(id);
        }

        id
    }

    pub fn root(&self) -> Option<ScopeId> {
        self.root
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.arena[id]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.arena[id]
    }

    pub fn children(&self, id: ScopeId) -> impl Iterator<Item = &Scope> {
        self.arena[id].children.iter().map(|&c| &self.arena[c])
    }

    pub fn ancestors(&self, id: ScopeId) -> AncestorIter<'_> {
        AncestorIter {
            tree: self,
            current: Some(id),
        }
    }

    /// Nearest enclosing class scope, used to register `this` references.
    pub fn enclosing_class(&self, id: ScopeId) -> Option<ScopeId> {
        self.ancestors(id)
            .find(|s| s.kind == ScopeKind::Class)
            .map(|s| s.id)
    }

    /// Resolves a declared name to a scope by walking from `from` towards
    /// the root, checking the direct children of each ancestor. This is the
    /// in-file half of callee and component-tag resolution; the session
    /// layer adds the cross-file import half.
    pub fn resolve_named_scope(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
        for ancestor in self.ancestors(from) {
            for &child in &ancestor.children {
                if self.arena[child].name == name {
                    return Some(child);
                }
            }
        }
        None
    }

    /// Child of the root whose declared name was exported under `name`.
    pub fn exported_scope(&self, name: &str) -> Option<ScopeId> {
        let root = self.root?;
        self.arena[root]
            .children
            .iter()
            .copied()
            .find(|&c| self.arena[c].is_exported && self.arena[c].name == name)
    }

    pub fn default_exported_scope(&self) -> Option<ScopeId> {
        let root = self.root?;
        self.arena[root]
            .children
            .iter()
            .copied()
            .find(|&c| self.arena[c].is_default_export)
    }
}

pub struct AncestorIter<'a> {
    tree: &'a ScopeTree,
    current: Option<ScopeId>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = &'a Scope;

    fn next(&mut self) -> Option<Self::Item> {
        let current_id = self.current?;
        let scope = &self.tree.arena[current_id];
        self.current = scope.parent;
        Some(scope)
    }
}
