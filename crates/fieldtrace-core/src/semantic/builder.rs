//! Scope tree construction
//!
//! Walks a parsed module once, creating scopes, declaring bindings, and
//! recording every reference site together with its classification data.
//! The parser exposes no parent links on AST nodes, so the syntactic role
//! of a reference is decided on the way down: the builder keeps a stack of
//! enclosing consumers (declarator, call argument, markup attribute,
//! object-literal key) and reads it when a member chain bottoms out.
//!
//! Tracking markers are collected here as well, from the leading comments
//! of variable declarations.

use std::collections::HashMap;

use regex::Regex;
use swc_common::comments::{Comments, SingleThreadedComments};
use swc_common::{BytePos, Span};
use swc_ecma_ast::{
    ArrowExpr, BlockStmtOrExpr, Callee, Class, ClassMember, Decl, DefaultDecl, Expr, ForHead,
    Function, ImportSpecifier, JSXAttrName, JSXAttrOrSpread, JSXAttrValue, JSXElement,
    JSXElementChild, JSXElementName, JSXExpr, Module, ModuleDecl as AstModuleDecl,
    ModuleExportName, ModuleItem, ObjectPatProp, Pat, Prop, PropName, PropOrSpread, Stmt, VarDecl,
    VarDeclKind, VarDeclOrExpr,
};

use crate::config::TrackerConfig;
use crate::parser::ParsedFile;
use crate::semantic::bindings::{BindingKind, BindingTable, ReferenceRole, ReferenceSite};
use crate::semantic::member_path::{self, PathBase};
use crate::semantic::scope::{ParamPattern, PatternLeaf, ScopeId, ScopeKind, ScopeTree};

/// How an imported local name maps onto the source module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Named(String),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub specifier: String,
    pub imported: ImportedName,
}

/// One binding designated for tracking by a marker comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedMarker {
    pub scope: ScopeId,
    pub name: String,
}

pub struct SemanticModel {
    pub scope_tree: ScopeTree,
    pub bindings: BindingTable,
    pub imports: HashMap<String, ImportRecord>,
    pub tracked: Vec<TrackedMarker>,
}

impl SemanticModel {
    /// Builds the model for a successfully parsed file. Returns `None` when
    /// the file has no module (fatal parse failure).
    pub fn build(file: &ParsedFile, config: &TrackerConfig) -> Option<Self> {
        let module = file.module()?;
        Some(ScopeBuilder::new(config, file.comments()).build(module))
    }
}

/// Enclosing consumer contexts, innermost last.
enum SynCtx {
    Declarator { leaves: Vec<PatternLeaf> },
    CallArg { callee: String, index: usize },
    JsxAttr { component: String, attr: String },
    ObjectKey(String),
    Guard,
}

pub struct ScopeBuilder<'a> {
    config: &'a TrackerConfig,
    comments: &'a SingleThreadedComments,
    named_marker_re: Regex,
    scope_tree: ScopeTree,
    bindings: BindingTable,
    imports: HashMap<String, ImportRecord>,
    tracked: Vec<TrackedMarker>,
    current_scope: ScopeId,
    context: Vec<SynCtx>,
}

impl<'a> ScopeBuilder<'a> {
    pub fn new(config: &'a TrackerConfig, comments: &'a SingleThreadedComments) -> Self {
        let named_marker_re = Regex::new(&format!(
            r"{}\s*=\s*([A-Za-z_$][A-Za-z0-9_$]*)",
            regex::escape(&config.named_marker)
        ))
        .unwrap_or_else(|_| Regex::new(r"track_variable\s*=\s*(\w+)").unwrap());

        let mut scope_tree = ScopeTree::new();
        let root = scope_tree.create_scope(ScopeKind::Module, "Program", None, Span::default());

        Self {
            config,
            comments,
            named_marker_re,
            scope_tree,
            bindings: BindingTable::new(),
            imports: HashMap::new(),
            tracked: Vec::new(),
            current_scope: root,
            context: Vec::new(),
        }
    }

    pub fn build(mut self, module: &Module) -> SemanticModel {
        self.scope_tree
            .get_mut(self.current_scope)
            .span = module.span;

        for item in &module.body {
            self.visit_module_item(item);
        }

        tracing::debug!(
            tracked = self.tracked.len(),
            imports = self.imports.len(),
            "scope tree built"
        );

        SemanticModel {
            scope_tree: self.scope_tree,
            bindings: self.bindings,
            imports: self.imports,
            tracked: self.tracked,
        }
    }

    fn visit_module_item(&mut self, item: &ModuleItem) {
        match item {
            ModuleItem::ModuleDecl(decl) => self.visit_module_decl(decl),
            ModuleItem::Stmt(stmt) => self.visit_stmt(stmt),
        }
    }

    fn visit_module_decl(&mut self, decl: &AstModuleDecl) {
        match decl {
            AstModuleDecl::Import(import) => {
                let specifier = import.src.value.to_string();
                for spec in &import.specifiers {
                    match spec {
                        ImportSpecifier::Named(named) => {
                            let local = named.local.sym.to_string();
                            let original = match &named.imported {
                                Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                                Some(ModuleExportName::Str(s)) => s.value.to_string(),
                                None => local.clone(),
                            };
                            self.imports.insert(
                                local.clone(),
                                ImportRecord {
                                    specifier: specifier.clone(),
                                    imported: ImportedName::Named(original),
                                },
                            );
                            self.bindings.declare(
                                local,
                                BindingKind::Import,
                                self.current_scope,
                                named.span,
                            );
                        }
                        ImportSpecifier::Default(default) => {
                            let local = default.local.sym.to_string();
                            self.imports.insert(
                                local.clone(),
                                ImportRecord {
                                    specifier: specifier.clone(),
                                    imported: ImportedName::Default,
                                },
                            );
                            self.bindings.declare(
                                local,
                                BindingKind::Import,
                                self.current_scope,
                                default.span,
                            );
                        }
                        ImportSpecifier::Namespace(_) => {}
                    }
                }
            }
            AstModuleDecl::ExportDecl(export) => {
                if let Decl::Var(var) = &export.decl {
                    self.scan_markers(export.span.lo, var);
                }
                let names = self.visit_decl(&export.decl);
                for name in names {
                    self.mark_exported(&name, false);
                }
            }
            AstModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                DefaultDecl::Fn(fn_expr) => {
                    let name = fn_expr
                        .ident
                        .as_ref()
                        .map(|i| i.sym.to_string())
                        .unwrap_or_else(|| "ArrowFunction".to_string());
                    let scope =
                        self.visit_function(&name, ScopeKind::Function, &fn_expr.function);
                    self.scope_tree.get_mut(scope).is_default_export = true;
                }
                DefaultDecl::Class(class_expr) => {
                    let name = class_expr
                        .ident
                        .as_ref()
                        .map(|i| i.sym.to_string())
                        .unwrap_or_else(|| "Class".to_string());
                    let scope = self.visit_class(&name, &class_expr.class);
                    self.scope_tree.get_mut(scope).is_default_export = true;
                }
                DefaultDecl::TsInterfaceDecl(_) => {}
            },
            AstModuleDecl::ExportDefaultExpr(export) => match &*export.expr {
                Expr::Ident(ident) => {
                    self.mark_exported(ident.sym.as_ref(), true);
                }
                Expr::Arrow(arrow) => {
                    let scope =
                        self.visit_arrow("ArrowFunction", ScopeKind::ArrowFunction, arrow);
                    self.scope_tree.get_mut(scope).is_default_export = true;
                }
                other => self.visit_expr(other),
            },
            AstModuleDecl::ExportNamed(named) => {
                if named.src.is_none() {
                    for spec in &named.specifiers {
                        if let swc_ecma_ast::ExportSpecifier::Named(s) = spec
                            && let ModuleExportName::Ident(orig) = &s.orig
                        {
                            self.mark_exported(orig.sym.as_ref(), false);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn mark_exported(&mut self, name: &str, default: bool) {
        let children: Vec<ScopeId> = self
            .scope_tree
            .get(self.current_scope)
            .children
            .clone();
        for child in children {
            if self.scope_tree.get(child).name == name {
                if default {
                    self.scope_tree.get_mut(child).is_default_export = true;
                } else {
                    self.scope_tree.get_mut(child).is_exported = true;
                }
                return;
            }
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(Decl::Var(var)) => {
                self.scan_markers(var.span.lo, var);
                self.visit_var_decl(var);
            }
            Stmt::Decl(decl) => {
                self.visit_decl(decl);
            }
            Stmt::Expr(expr) => self.visit_expr(&expr.expr),
            Stmt::Block(block) => {
                for s in &block.stmts {
                    self.visit_stmt(s);
                }
            }
            Stmt::Return(ret) => {
                if let Some(arg) = &ret.arg {
                    self.visit_expr(arg);
                }
            }
            Stmt::If(if_stmt) => {
                self.visit_expr(&if_stmt.test);
                self.visit_stmt(&if_stmt.cons);
                if let Some(alt) = &if_stmt.alt {
                    self.visit_stmt(alt);
                }
            }
            Stmt::For(for_stmt) => {
                match &for_stmt.init {
                    Some(VarDeclOrExpr::VarDecl(var)) => {
                        self.visit_var_decl(var);
                    }
                    Some(VarDeclOrExpr::Expr(expr)) => self.visit_expr(expr),
                    None => {}
                }
                if let Some(test) = &for_stmt.test {
                    self.visit_expr(test);
                }
                if let Some(update) = &for_stmt.update {
                    self.visit_expr(update);
                }
                self.visit_stmt(&for_stmt.body);
            }
            Stmt::ForIn(for_in) => {
                self.visit_for_head(&for_in.left);
                self.visit_expr(&for_in.right);
                self.visit_stmt(&for_in.body);
            }
            Stmt::ForOf(for_of) => {
                self.visit_for_head(&for_of.left);
                self.visit_expr(&for_of.right);
                self.visit_stmt(&for_of.body);
            }
            Stmt::While(while_stmt) => {
                self.visit_expr(&while_stmt.test);
                self.visit_stmt(&while_stmt.body);
            }
            Stmt::DoWhile(do_while) => {
                self.visit_stmt(&do_while.body);
                self.visit_expr(&do_while.test);
            }
            Stmt::Try(try_stmt) => {
                for s in &try_stmt.block.stmts {
                    self.visit_stmt(s);
                }
                if let Some(handler) = &try_stmt.handler {
                    if let Some(param) = &handler.param {
                        self.declare_pattern_names(param, BindingKind::Let);
                    }
                    for s in &handler.body.stmts {
                        self.visit_stmt(s);
                    }
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    for s in &finalizer.stmts {
                        self.visit_stmt(s);
                    }
                }
            }
            Stmt::Switch(switch) => {
                self.visit_expr(&switch.discriminant);
                for case in &switch.cases {
                    if let Some(test) = &case.test {
                        self.visit_expr(test);
                    }
                    for s in &case.cons {
                        self.visit_stmt(s);
                    }
                }
            }
            Stmt::Throw(throw) => self.visit_expr(&throw.arg),
            Stmt::Labeled(labeled) => self.visit_stmt(&labeled.body),
            _ => {}
        }
    }

    fn visit_for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::VarDecl(var) => {
                for decl in &var.decls {
                    self.declare_pattern_names(&decl.name, var_binding_kind(var.kind));
                }
            }
            ForHead::Pat(pat) => self.declare_pattern_names(pat, BindingKind::Let),
            ForHead::UsingDecl(_) => {}
        }
    }

    fn visit_decl(&mut self, decl: &Decl) -> Vec<String> {
        match decl {
            Decl::Var(var) => self.visit_var_decl(var),
            Decl::Fn(fn_decl) => {
                let name = fn_decl.ident.sym.to_string();
                self.bindings.declare(
                    name.clone(),
                    BindingKind::Function,
                    self.current_scope,
                    fn_decl.ident.span,
                );
                self.visit_function(&name, ScopeKind::Function, &fn_decl.function);
                vec![name]
            }
            Decl::Class(class_decl) => {
                let name = class_decl.ident.sym.to_string();
                self.bindings.declare(
                    name.clone(),
                    BindingKind::Class,
                    self.current_scope,
                    class_decl.ident.span,
                );
                self.visit_class(&name, &class_decl.class);
                vec![name]
            }
            _ => vec![],
        }
    }

    fn visit_var_decl(&mut self, var: &VarDecl) -> Vec<String> {
        let kind = var_binding_kind(var.kind);
        let mut declared = Vec::new();

        for decl in &var.decls {
            match &decl.name {
                Pat::Ident(ident) => {
                    let name = ident.id.sym.to_string();
                    declared.push(name.clone());

                    match decl.init.as_deref() {
                        Some(Expr::Arrow(arrow)) => {
                            self.bindings.declare(
                                name.clone(),
                                BindingKind::Function,
                                self.current_scope,
                                ident.id.span,
                            );
                            self.visit_arrow(&name, ScopeKind::ArrowFunction, arrow);
                        }
                        Some(Expr::Fn(fn_expr)) => {
                            self.bindings.declare(
                                name.clone(),
                                BindingKind::Function,
                                self.current_scope,
                                ident.id.span,
                            );
                            self.visit_function(&name, ScopeKind::Function, &fn_expr.function);
                        }
                        Some(Expr::Class(class_expr)) => {
                            self.bindings.declare(
                                name.clone(),
                                BindingKind::Class,
                                self.current_scope,
                                ident.id.span,
                            );
                            self.visit_class(&name, &class_expr.class);
                        }
                        Some(init) => {
                            self.bindings.declare(
                                name.clone(),
                                kind,
                                self.current_scope,
                                ident.id.span,
                            );
                            let leaves = vec![PatternLeaf {
                                name,
                                path: Vec::new(),
                            }];
                            self.context.push(SynCtx::Declarator { leaves });
                            self.visit_expr(init);
                            self.context.pop();
                        }
                        None => {
                            self.bindings.declare(
                                name,
                                kind,
                                self.current_scope,
                                ident.id.span,
                            );
                        }
                    }
                }
                pat => {
                    self.declare_pattern_names(pat, kind);
                    if let Some(init) = &decl.init {
                        let leaves = pattern_leaves(pat);
                        self.context.push(SynCtx::Declarator { leaves });
                        self.visit_expr(init);
                        self.context.pop();
                    }
                }
            }
        }

        declared
    }

    fn declare_pattern_names(&mut self, pat: &Pat, kind: BindingKind) {
        for (name, span) in pattern_names(pat) {
            self.bindings.declare(name, kind, self.current_scope, span);
        }
    }

    fn visit_function(&mut self, name: &str, kind: ScopeKind, function: &Function) -> ScopeId {
        let scope =
            self.scope_tree
                .create_scope(kind, name, Some(self.current_scope), function.span);

        let params: Vec<ParamPattern> = function
            .params
            .iter()
            .map(|p| param_pattern(&p.pat))
            .collect();
        self.scope_tree.get_mut(scope).params = params;

        let saved_scope = self.current_scope;
        let saved_context = std::mem::take(&mut self.context);
        self.current_scope = scope;

        for param in &function.params {
            self.declare_pattern_names(&param.pat, BindingKind::Param);
        }
        if let Some(body) = &function.body {
            for stmt in &body.stmts {
                self.visit_stmt(stmt);
            }
        }

        self.current_scope = saved_scope;
        self.context = saved_context;
        scope
    }

    fn visit_arrow(&mut self, name: &str, kind: ScopeKind, arrow: &ArrowExpr) -> ScopeId {
        let scope = self
            .scope_tree
            .create_scope(kind, name, Some(self.current_scope), arrow.span);

        let params: Vec<ParamPattern> = arrow.params.iter().map(param_pattern).collect();
        self.scope_tree.get_mut(scope).params = params;

        let saved_scope = self.current_scope;
        let saved_context = std::mem::take(&mut self.context);
        self.current_scope = scope;

        for pat in &arrow.params {
            self.declare_pattern_names(pat, BindingKind::Param);
        }
        match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(block) => {
                for stmt in &block.stmts {
                    self.visit_stmt(stmt);
                }
            }
            BlockStmtOrExpr::Expr(expr) => self.visit_expr(expr),
        }

        self.current_scope = saved_scope;
        self.context = saved_context;
        scope
    }

    fn visit_class(&mut self, name: &str, class: &Class) -> ScopeId {
        let scope = self.scope_tree.create_scope(
            ScopeKind::Class,
            name,
            Some(self.current_scope),
            class.span,
        );
        // `this` is shared across all methods of one instance.
        self.bindings
            .declare("this", BindingKind::This, scope, class.span);

        let saved_scope = self.current_scope;
        let saved_context = std::mem::take(&mut self.context);
        self.current_scope = scope;

        for member in &class.body {
            match member {
                ClassMember::Method(method) => {
                    let method_name =
                        prop_name_string(&method.key).unwrap_or_else(|| "method".to_string());
                    self.visit_function(&method_name, ScopeKind::Method, &method.function);
                }
                ClassMember::Constructor(ctor) => {
                    let ctor_scope = self.scope_tree.create_scope(
                        ScopeKind::Method,
                        "constructor",
                        Some(self.current_scope),
                        ctor.span,
                    );
                    let saved = self.current_scope;
                    self.current_scope = ctor_scope;
                    for param in &ctor.params {
                        if let swc_ecma_ast::ParamOrTsParamProp::Param(p) = param {
                            self.declare_pattern_names(&p.pat, BindingKind::Param);
                        }
                    }
                    if let Some(body) = &ctor.body {
                        for stmt in &body.stmts {
                            self.visit_stmt(stmt);
                        }
                    }
                    self.current_scope = saved;
                }
                ClassMember::ClassProp(prop) => {
                    if let Some(value) = &prop.value {
                        match &**value {
                            Expr::Arrow(arrow) => {
                                let prop_name = prop_name_string(&prop.key)
                                    .unwrap_or_else(|| "method".to_string());
                                self.visit_arrow(&prop_name, ScopeKind::Method, arrow);
                            }
                            other => self.visit_expr(other),
                        }
                    }
                }
                _ => {}
            }
        }

        self.current_scope = saved_scope;
        self.context = saved_context;
        scope
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => {
                self.record_reference(
                    ident.sym.as_ref(),
                    vec![ident.sym.to_string()],
                    ident.span,
                );
            }
            Expr::This(this) => self.record_this_reference(vec!["this".to_string()], this.span),
            Expr::Member(_) | Expr::OptChain(_) => self.visit_member_chain(expr),
            Expr::Call(call) => self.visit_call(call),
            Expr::New(new) => {
                self.visit_expr(&new.callee);
                if let Some(args) = &new.args {
                    for arg in args {
                        self.visit_expr(&arg.expr);
                    }
                }
            }
            Expr::Object(object) => {
                for prop in &object.props {
                    match prop {
                        PropOrSpread::Prop(prop) => match &**prop {
                            Prop::KeyValue(kv) => {
                                if let Some(key) = prop_name_string(&kv.key) {
                                    self.context.push(SynCtx::ObjectKey(key));
                                    self.visit_expr(&kv.value);
                                    self.context.pop();
                                } else {
                                    self.visit_expr(&kv.value);
                                }
                            }
                            Prop::Shorthand(ident) => {
                                self.context
                                    .push(SynCtx::ObjectKey(ident.sym.to_string()));
                                self.record_reference(
                                    ident.sym.as_ref(),
                                    vec![ident.sym.to_string()],
                                    ident.span,
                                );
                                self.context.pop();
                            }
                            Prop::Method(method) => {
                                let name = prop_name_string(&method.key)
                                    .unwrap_or_else(|| "method".to_string());
                                self.visit_function(&name, ScopeKind::Function, &method.function);
                            }
                            Prop::Getter(getter) => {
                                if let Some(body) = &getter.body {
                                    for stmt in &body.stmts {
                                        self.visit_stmt(stmt);
                                    }
                                }
                            }
                            Prop::Setter(setter) => {
                                if let Some(body) = &setter.body {
                                    for stmt in &body.stmts {
                                        self.visit_stmt(stmt);
                                    }
                                }
                            }
                            Prop::Assign(assign) => self.visit_expr(&assign.value),
                        },
                        PropOrSpread::Spread(spread) => self.visit_expr(&spread.expr),
                    }
                }
            }
            Expr::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.visit_expr(&elem.expr);
                }
            }
            Expr::Arrow(arrow) => {
                self.visit_arrow("ArrowFunction", ScopeKind::ArrowFunction, arrow);
            }
            Expr::Fn(fn_expr) => {
                let name = fn_expr
                    .ident
                    .as_ref()
                    .map(|i| i.sym.to_string())
                    .unwrap_or_else(|| "ArrowFunction".to_string());
                self.visit_function(&name, ScopeKind::Function, &fn_expr.function);
            }
            Expr::Class(class_expr) => {
                let name = class_expr
                    .ident
                    .as_ref()
                    .map(|i| i.sym.to_string())
                    .unwrap_or_else(|| "Class".to_string());
                self.visit_class(&name, &class_expr.class);
            }
            Expr::Bin(bin) => {
                if bin.op == swc_ecma_ast::BinaryOp::LogicalAnd {
                    // The left side only guards; it never forwards the value.
                    self.context.push(SynCtx::Guard);
                    self.visit_expr(&bin.left);
                    self.context.pop();
                    self.visit_expr(&bin.right);
                } else {
                    self.visit_expr(&bin.left);
                    self.visit_expr(&bin.right);
                }
            }
            Expr::Cond(cond) => {
                self.context.push(SynCtx::Guard);
                self.visit_expr(&cond.test);
                self.context.pop();
                self.visit_expr(&cond.cons);
                self.visit_expr(&cond.alt);
            }
            Expr::Paren(paren) => self.visit_expr(&paren.expr),
            Expr::Await(await_expr) => self.visit_expr(&await_expr.arg),
            Expr::Yield(yield_expr) => {
                if let Some(arg) = &yield_expr.arg {
                    self.visit_expr(arg);
                }
            }
            Expr::Unary(unary) => self.visit_expr(&unary.arg),
            Expr::Update(update) => self.visit_expr(&update.arg),
            Expr::Assign(assign) => {
                if let swc_ecma_ast::AssignTarget::Simple(
                    swc_ecma_ast::SimpleAssignTarget::Member(member),
                ) = &assign.left
                {
                    self.visit_member_chain(&Expr::Member(member.clone()));
                }
                self.visit_expr(&assign.right);
            }
            Expr::Tpl(tpl) => {
                for e in &tpl.exprs {
                    self.visit_expr(e);
                }
            }
            Expr::TaggedTpl(tagged) => {
                for e in &tagged.tpl.exprs {
                    self.visit_expr(e);
                }
            }
            Expr::Seq(seq) => {
                for e in &seq.exprs {
                    self.visit_expr(e);
                }
            }
            Expr::JSXElement(element) => self.visit_jsx_element(element),
            Expr::JSXFragment(fragment) => {
                for child in &fragment.children {
                    self.visit_jsx_child(child);
                }
            }
            Expr::TsAs(e) => self.visit_expr(&e.expr),
            Expr::TsNonNull(e) => self.visit_expr(&e.expr),
            Expr::TsSatisfies(e) => self.visit_expr(&e.expr),
            Expr::TsTypeAssertion(e) => self.visit_expr(&e.expr),
            Expr::TsConstAssertion(e) => self.visit_expr(&e.expr),
            _ => {}
        }
    }

    fn visit_member_chain(&mut self, expr: &Expr) {
        match member_path::extract(expr, self.config) {
            Some(extracted) => match extracted.base {
                PathBase::Ident { name, .. } => {
                    self.record_reference(&name, extracted.segments, member_path::chain_span(expr));
                }
                PathBase::This { .. } => {
                    self.record_this_reference(extracted.segments, member_path::chain_span(expr));
                }
            },
            None => {
                // Chain rooted in something opaque (a call result, usually);
                // still walk inward for references it contains.
                match expr {
                    Expr::Member(member) => self.visit_expr(&member.obj),
                    Expr::OptChain(chain) => {
                        if let swc_ecma_ast::OptChainBase::Member(member) = &*chain.base {
                            self.visit_expr(&member.obj);
                        } else if let swc_ecma_ast::OptChainBase::Call(call) = &*chain.base {
                            self.visit_expr(&call.callee);
                            for arg in &call.args {
                                self.visit_expr(&arg.expr);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn visit_call(&mut self, call: &swc_ecma_ast::CallExpr) {
        let callee_expr = match &call.callee {
            Callee::Expr(expr) => expr,
            _ => {
                for arg in &call.args {
                    self.visit_expr(&arg.expr);
                }
                return;
            }
        };

        // Reserved iteration method on a data chain: the first callback's
        // first parameter is the per-element binding.
        if let Expr::Member(member) = &**callee_expr
            && let swc_ecma_ast::MemberProp::Ident(prop) = &member.prop
            && self.config.is_iteration_method(prop.sym.as_ref())
            && let Some(extracted) = member_path::extract(&member.obj, self.config)
            && let PathBase::Ident { name, .. } = &extracted.base
        {
            let callback_scope = match call.args.first().map(|a| &*a.expr) {
                Some(Expr::Arrow(arrow)) => {
                    Some(self.visit_arrow("ArrowFunction", ScopeKind::ArrowFunction, arrow))
                }
                Some(Expr::Fn(fn_expr)) => {
                    let fn_name = fn_expr
                        .ident
                        .as_ref()
                        .map(|i| i.sym.to_string())
                        .unwrap_or_else(|| "ArrowFunction".to_string());
                    Some(self.visit_function(&fn_name, ScopeKind::Function, &fn_expr.function))
                }
                _ => None,
            };

            if let Some(callback) = callback_scope {
                let name = name.clone();
                let span = member_path::chain_span(callee_expr);
                self.record_reference_with_role(
                    &name,
                    extracted.segments,
                    span,
                    ReferenceRole::IterationCall { callback },
                );
                for arg in call.args.iter().skip(1) {
                    self.visit_expr(&arg.expr);
                }
                return;
            }
        }

        let callee_name = match &**callee_expr {
            Expr::Ident(ident) => Some(ident.sym.to_string()),
            Expr::Member(member) => {
                // The receiver chain is a data use of its own.
                self.visit_member_chain(&member.obj);
                match &member.prop {
                    swc_ecma_ast::MemberProp::Ident(prop) => Some(prop.sym.to_string()),
                    _ => None,
                }
            }
            other => {
                self.visit_expr(other);
                None
            }
        };

        for (index, arg) in call.args.iter().enumerate() {
            match &callee_name {
                Some(callee) => {
                    self.context.push(SynCtx::CallArg {
                        callee: callee.clone(),
                        index,
                    });
                    self.visit_expr(&arg.expr);
                    self.context.pop();
                }
                None => self.visit_expr(&arg.expr),
            }
        }
    }

    fn visit_jsx_element(&mut self, element: &JSXElement) {
        let component = match &element.opening.name {
            JSXElementName::Ident(ident) if starts_uppercase(ident.sym.as_ref()) => {
                Some(ident.sym.to_string())
            }
            _ => None,
        };

        for attr in &element.opening.attrs {
            match attr {
                JSXAttrOrSpread::JSXAttr(jsx_attr) => {
                    let attr_name = match &jsx_attr.name {
                        JSXAttrName::Ident(ident) => Some(ident.sym.to_string()),
                        JSXAttrName::JSXNamespacedName(_) => None,
                    };
                    match &jsx_attr.value {
                        Some(JSXAttrValue::JSXExprContainer(container)) => {
                            if let JSXExpr::Expr(expr) = &container.expr {
                                match (&component, &attr_name) {
                                    (Some(component), Some(attr)) => {
                                        self.context.push(SynCtx::JsxAttr {
                                            component: component.clone(),
                                            attr: attr.clone(),
                                        });
                                        self.visit_expr(expr);
                                        self.context.pop();
                                    }
                                    _ => self.visit_expr(expr),
                                }
                            }
                        }
                        Some(JSXAttrValue::JSXElement(nested)) => self.visit_jsx_element(nested),
                        _ => {}
                    }
                }
                JSXAttrOrSpread::SpreadElement(spread) => self.visit_expr(&spread.expr),
            }
        }

        for child in &element.children {
            self.visit_jsx_child(child);
        }
    }

    fn visit_jsx_child(&mut self, child: &JSXElementChild) {
        match child {
            JSXElementChild::JSXExprContainer(container) => {
                if let JSXExpr::Expr(expr) = &container.expr {
                    self.visit_expr(expr);
                }
            }
            JSXElementChild::JSXElement(element) => self.visit_jsx_element(element),
            JSXElementChild::JSXFragment(fragment) => {
                for c in &fragment.children {
                    self.visit_jsx_child(c);
                }
            }
            _ => {}
        }
    }

    fn record_reference(&mut self, name: &str, path: Vec<String>, span: Span) {
        let (wrap_prefix, role) = self.classify_context();
        self.push_reference(name, path, wrap_prefix, role, span);
    }

    fn record_reference_with_role(
        &mut self,
        name: &str,
        path: Vec<String>,
        span: Span,
        role: ReferenceRole,
    ) {
        let (wrap_prefix, _) = self.classify_context();
        self.push_reference(name, path, wrap_prefix, role, span);
    }

    fn push_reference(
        &mut self,
        name: &str,
        path: Vec<String>,
        wrap_prefix: Vec<String>,
        role: ReferenceRole,
        span: Span,
    ) {
        let Some(binding) = self
            .bindings
            .lookup(name, self.current_scope, &self.scope_tree)
        else {
            return;
        };
        self.bindings.add_reference(
            binding,
            ReferenceSite {
                scope: self.current_scope,
                path,
                wrap_prefix,
                role,
                span,
            },
        );
    }

    fn record_this_reference(&mut self, path: Vec<String>, span: Span) {
        let Some(class) = self.scope_tree.enclosing_class(self.current_scope) else {
            return;
        };
        let Some(binding) = self.bindings.lookup_local("this", class) else {
            return;
        };
        let (wrap_prefix, role) = self.classify_context();
        self.bindings.add_reference(
            binding,
            ReferenceSite {
                scope: self.current_scope,
                path,
                wrap_prefix,
                role,
                span,
            },
        );
    }

    /// Reads the consumer stack from the innermost entry outward, gathering
    /// object-literal keys until the first structural consumer.
    fn classify_context(&self) -> (Vec<String>, ReferenceRole) {
        let mut wrap = Vec::new();
        for ctx in self.context.iter().rev() {
            match ctx {
                SynCtx::ObjectKey(key) => wrap.push(key.clone()),
                SynCtx::Declarator { leaves } => {
                    wrap.reverse();
                    return (wrap, ReferenceRole::Declarator {
                        leaves: leaves.clone(),
                    });
                }
                SynCtx::CallArg { callee, index } => {
                    wrap.reverse();
                    return (wrap, ReferenceRole::CallArg {
                        callee: callee.clone(),
                        index: *index,
                    });
                }
                SynCtx::JsxAttr { component, attr } => {
                    wrap.reverse();
                    return (wrap, ReferenceRole::JsxAttribute {
                        component: component.clone(),
                        attr: attr.clone(),
                    });
                }
                SynCtx::Guard => {
                    wrap.reverse();
                    return (wrap, ReferenceRole::Bare);
                }
            }
        }
        wrap.reverse();
        (wrap, ReferenceRole::Bare)
    }

    fn scan_markers(&mut self, pos: BytePos, var: &VarDecl) {
        let Some(comments) = self.comments.get_leading(pos) else {
            return;
        };

        for comment in comments {
            let text = comment.text.as_ref();
            if let Some(captures) = self.named_marker_re.captures(text) {
                let name = captures[1].to_string();
                tracing::debug!(name = %name, "named tracking marker");
                self.tracked.push(TrackedMarker {
                    scope: self.current_scope,
                    name,
                });
            } else if text.contains(&self.config.marker) {
                for decl in &var.decls {
                    if let Pat::Ident(ident) = &decl.name {
                        let name = ident.id.sym.to_string();
                        tracing::debug!(name = %name, "tracking marker");
                        self.tracked.push(TrackedMarker {
                            scope: self.current_scope,
                            name,
                        });
                    }
                }
            }
        }
    }
}

fn var_binding_kind(kind: VarDeclKind) -> BindingKind {
    match kind {
        VarDeclKind::Const => BindingKind::Const,
        VarDeclKind::Let => BindingKind::Let,
        VarDeclKind::Var => BindingKind::Var,
    }
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

fn prop_name_string(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

/// Destructuring leaves of a pattern: bound name plus property path.
/// Array elements carry no statically meaningful property path and are
/// excluded; their names are still declared via `pattern_names`.
pub fn pattern_leaves(pat: &Pat) -> Vec<PatternLeaf> {
    let mut leaves = Vec::new();
    collect_leaves(pat, &mut Vec::new(), &mut leaves);
    leaves
}

fn collect_leaves(pat: &Pat, prefix: &mut Vec<String>, out: &mut Vec<PatternLeaf>) {
    match pat {
        Pat::Ident(ident) => out.push(PatternLeaf {
            name: ident.id.sym.to_string(),
            path: prefix.clone(),
        }),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => {
                        if let Some(key) = prop_name_string(&kv.key) {
                            prefix.push(key);
                            collect_leaves(&kv.value, prefix, out);
                            prefix.pop();
                        }
                    }
                    ObjectPatProp::Assign(assign) => {
                        let name = assign.key.id.sym.to_string();
                        let mut path = prefix.clone();
                        path.push(name.clone());
                        out.push(PatternLeaf { name, path });
                    }
                    ObjectPatProp::Rest(_) => {}
                }
            }
        }
        Pat::Assign(assign) => collect_leaves(&assign.left, prefix, out),
        _ => {}
    }
}

/// All identifiers bound anywhere in a pattern, with their spans.
pub fn pattern_names(pat: &Pat) -> Vec<(String, Span)> {
    let mut names = Vec::new();
    collect_names(pat, &mut names);
    names
}

fn collect_names(pat: &Pat, out: &mut Vec<(String, Span)>) {
    match pat {
        Pat::Ident(ident) => out.push((ident.id.sym.to_string(), ident.id.span)),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_names(&kv.value, out),
                    ObjectPatProp::Assign(assign) => {
                        out.push((assign.key.id.sym.to_string(), assign.key.id.span));
                    }
                    ObjectPatProp::Rest(rest) => collect_names(&rest.arg, out),
                }
            }
        }
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                collect_names(elem, out);
            }
        }
        Pat::Assign(assign) => collect_names(&assign.left, out),
        Pat::Rest(rest) => collect_names(&rest.arg, out),
        _ => {}
    }
}

/// Shape of a formal parameter as the classifier needs it.
pub fn param_pattern(pat: &Pat) -> ParamPattern {
    match pat {
        Pat::Ident(ident) => ParamPattern::Ident(ident.id.sym.to_string()),
        Pat::Object(_) => ParamPattern::Object(pattern_leaves(pat)),
        Pat::Assign(assign) => param_pattern(&assign.left),
        _ => ParamPattern::Opaque,
    }
}
