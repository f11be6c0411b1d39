//! AST extraction for a single module.
//!
//! Parsing happens once per module; everything resolution needs later is
//! condensed into a [`ModuleIr`]: class records with unresolved base tokens,
//! import bindings with absolute targets, and star-import anchors.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use classgraph::{MethodEntity, PendingBase};
use rustpython_ast::Stmt;
use rustpython_parser::{ast, Parse};

use crate::error::{ResolveError, Result};

/// Toggles for what extraction records per class
#[derive(Debug, Clone)]
pub struct VisitorFlags {
    /// Collect instance and class-level attributes
    pub collect_attrs: bool,

    /// Collect methods
    pub collect_methods: bool,

    /// Record method decorators so properties and setters stay
    /// distinguishable from plain methods
    pub separate_properties: bool,
}

impl Default for VisitorFlags {
    fn default() -> Self {
        Self {
            collect_attrs: true,
            collect_methods: true,
            separate_properties: true,
        }
    }
}

/// One import binding visible somewhere in a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Imported name as written
    pub name: String,

    /// Rebinding after `as`, if any
    pub asname: Option<String>,

    /// Absolute dotted path the binding refers to
    pub target: String,
}

/// A class definition as read from source, before any base resolution
#[derive(Debug, Clone)]
pub struct RawClass {
    /// Nesting-qualified name; bare for classes defined inside functions
    pub name: String,

    /// Whether the definition sits directly in the module body
    pub is_top_level: bool,

    /// Base tokens waiting for resolution
    pub pending_bases: Vec<PendingBase>,

    /// Methods defined directly in the class body
    pub methods: Vec<MethodEntity>,

    /// Instance attributes assigned through the method receiver
    pub attrs: BTreeSet<String>,

    /// Names assigned directly in the class body
    pub cls_attrs: BTreeSet<String>,
}

impl RawClass {
    fn new(name: String, is_top_level: bool) -> Self {
        Self {
            name,
            is_top_level,
            pending_bases: Vec::new(),
            methods: Vec::new(),
            attrs: BTreeSet::new(),
            cls_attrs: BTreeSet::new(),
        }
    }
}

/// Everything extraction learned about one module
#[derive(Debug, Default)]
pub struct ModuleIr {
    /// Classes in document order
    pub classes: Vec<RawClass>,

    /// Import bindings in document order
    pub imports: Vec<ImportBinding>,

    /// Absolute dotted anchors of `from x import *` statements
    pub star_imports: Vec<String>,

    class_index: HashMap<String, usize>,
}

impl ModuleIr {
    fn add_class(&mut self, raw: RawClass) {
        let position = self.classes.len();
        self.class_index.entry(raw.name.clone()).or_insert(position);
        self.classes.push(raw);
    }

    /// Position of the class answering to `name`.
    ///
    /// An exact nesting-qualified match wins; otherwise a nested class is
    /// found by its last segment, the way Python resolves a bare reference
    /// to a definition elsewhere in the same file.
    pub fn class_position(&self, name: &str) -> Option<usize> {
        if let Some(position) = self.class_index.get(name) {
            return Some(*position);
        }
        if name.contains('.') {
            return None;
        }
        self.classes
            .iter()
            .position(|raw| raw.name.rsplit('.').next() == Some(name))
    }

    /// First import binding matching `symbol` by written name or rebound name
    pub fn find_import(&self, symbol: &str) -> Option<&ImportBinding> {
        self.imports
            .iter()
            .find(|binding| binding.name == symbol || binding.asname.as_deref() == Some(symbol))
    }
}

/// Parse `source` and condense it into a [`ModuleIr`].
pub fn extract_module(
    source: &str,
    path: &Path,
    long_name: &str,
    is_init: bool,
    flags: &VisitorFlags,
) -> Result<ModuleIr> {
    let suite = ast::Suite::parse(source, &path.display().to_string())
        .map_err(|e| ResolveError::malformed_source(path, e.to_string()))?;

    let mut collector = Collector {
        ir: ModuleIr::default(),
        module: long_name,
        is_init,
        flags,
    };
    let mut class_stack = Vec::new();
    collector.walk(&suite, &mut class_stack, false);
    Ok(collector.ir)
}

/// Absolute module path an `import from` statement refers to.
///
/// For relative imports the anchor is derived from the importing module's
/// own dotted name: an `__init__` climbs `level - 1` segments, a regular
/// module climbs `level`, then the written module path is appended. Returns
/// `None` when the import reaches beyond the top-level package with nothing
/// left to name.
pub fn import_anchor(
    module: &str,
    is_init: bool,
    level: u32,
    target: Option<&str>,
) -> Option<String> {
    if level == 0 {
        return target.map(str::to_string);
    }
    let climb = if is_init { level - 1 } else { level } as usize;
    let segments: Vec<&str> = module.split('.').collect();
    let keep = segments.len().saturating_sub(climb);
    let mut anchor = segments[..keep].join(".");
    match target {
        Some(target) if anchor.is_empty() => anchor = target.to_string(),
        Some(target) => anchor = format!("{anchor}.{target}"),
        None => {}
    }
    if anchor.is_empty() {
        None
    } else {
        Some(anchor)
    }
}

struct Collector<'a> {
    ir: ModuleIr,
    module: &'a str,
    is_init: bool,
    flags: &'a VisitorFlags,
}

impl Collector<'_> {
    fn walk(&mut self, stmts: &[Stmt], class_stack: &mut Vec<String>, in_function: bool) {
        for stmt in stmts {
            match stmt {
                Stmt::ClassDef(class_def) => {
                    self.collect_class(class_def, class_stack, in_function);
                }
                Stmt::FunctionDef(func) => self.walk(&func.body, class_stack, true),
                Stmt::AsyncFunctionDef(func) => self.walk(&func.body, class_stack, true),
                Stmt::Import(import) => {
                    for alias in &import.names {
                        self.ir.imports.push(ImportBinding {
                            name: alias.name.to_string(),
                            asname: alias.asname.as_ref().map(|name| name.to_string()),
                            target: alias.name.to_string(),
                        });
                    }
                }
                Stmt::ImportFrom(node) => self.collect_import_from(node),
                Stmt::If(s) => {
                    self.walk(&s.body, class_stack, in_function);
                    self.walk(&s.orelse, class_stack, in_function);
                }
                Stmt::While(s) => {
                    self.walk(&s.body, class_stack, in_function);
                    self.walk(&s.orelse, class_stack, in_function);
                }
                Stmt::For(s) => {
                    self.walk(&s.body, class_stack, in_function);
                    self.walk(&s.orelse, class_stack, in_function);
                }
                Stmt::AsyncFor(s) => {
                    self.walk(&s.body, class_stack, in_function);
                    self.walk(&s.orelse, class_stack, in_function);
                }
                Stmt::With(s) => self.walk(&s.body, class_stack, in_function),
                Stmt::AsyncWith(s) => self.walk(&s.body, class_stack, in_function),
                Stmt::Try(s) => {
                    self.walk(&s.body, class_stack, in_function);
                    for handler in &s.handlers {
                        let ast::ExceptHandler::ExceptHandler(h) = handler;
                        self.walk(&h.body, class_stack, in_function);
                    }
                    self.walk(&s.orelse, class_stack, in_function);
                    self.walk(&s.finalbody, class_stack, in_function);
                }
                Stmt::TryStar(s) => {
                    self.walk(&s.body, class_stack, in_function);
                    for handler in &s.handlers {
                        let ast::ExceptHandler::ExceptHandler(h) = handler;
                        self.walk(&h.body, class_stack, in_function);
                    }
                    self.walk(&s.orelse, class_stack, in_function);
                    self.walk(&s.finalbody, class_stack, in_function);
                }
                Stmt::Match(s) => {
                    for case in &s.cases {
                        self.walk(&case.body, class_stack, in_function);
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_class(
        &mut self,
        class_def: &ast::StmtClassDef,
        class_stack: &mut Vec<String>,
        in_function: bool,
    ) {
        let name = if in_function || class_stack.is_empty() {
            class_def.name.to_string()
        } else {
            format!("{}.{}", class_stack.join("."), class_def.name.as_str())
        };
        let mut raw = RawClass::new(name, !in_function && class_stack.is_empty());

        for base in &class_def.bases {
            capture_base_token(base, &mut raw.pending_bases);
        }
        for keyword in &class_def.keywords {
            capture_base_token(&keyword.value, &mut raw.pending_bases);
        }

        for stmt in &class_def.body {
            match stmt {
                Stmt::FunctionDef(func) => {
                    self.collect_method(
                        func.name.as_str(),
                        &func.args,
                        &func.body,
                        &func.decorator_list,
                        &mut raw,
                    );
                }
                Stmt::AsyncFunctionDef(func) => {
                    self.collect_method(
                        func.name.as_str(),
                        &func.args,
                        &func.body,
                        &func.decorator_list,
                        &mut raw,
                    );
                }
                Stmt::Assign(assign) if self.flags.collect_attrs => {
                    for target in &assign.targets {
                        collect_cls_attr_target(target, &mut raw.cls_attrs);
                    }
                }
                _ => {}
            }
        }

        self.ir.add_class(raw);

        if in_function {
            self.walk(&class_def.body, class_stack, true);
        } else {
            class_stack.push(class_def.name.to_string());
            self.walk(&class_def.body, class_stack, false);
            class_stack.pop();
        }
    }

    fn collect_method(
        &mut self,
        name: &str,
        args: &ast::Arguments,
        body: &[Stmt],
        decorators: &[ast::Expr],
        raw: &mut RawClass,
    ) {
        if self.flags.collect_methods {
            let decorators = if self.flags.separate_properties {
                decorators.iter().filter_map(decorator_token).collect()
            } else {
                Vec::new()
            };
            raw.methods.push(
                MethodEntity::new(format!("{}.{name}", raw.name)).with_decorators(decorators),
            );
        }
        if self.flags.collect_attrs {
            if let Some(receiver) = first_param(args) {
                collect_receiver_attrs(body, &receiver, &mut raw.attrs);
            }
        }
    }

    fn collect_import_from(&mut self, node: &ast::StmtImportFrom) {
        let level = node.level.as_ref().map(|l| l.to_u32()).unwrap_or(0);
        let target = node.module.as_ref().map(|module| module.as_str());
        let Some(anchor) = import_anchor(self.module, self.is_init, level, target) else {
            return;
        };
        for alias in &node.names {
            if alias.name.as_str() == "*" {
                self.ir.star_imports.push(anchor.clone());
            } else {
                self.ir.imports.push(ImportBinding {
                    name: alias.name.to_string(),
                    asname: alias.asname.as_ref().map(|name| name.to_string()),
                    target: format!("{anchor}.{}", alias.name.as_str()),
                });
            }
        }
    }
}

/// Dotted token of a bare name or attribute chain, with a flag marking
/// whether it was written qualified. Anything else, including calls,
/// yields nothing: a dynamically computed base is not a resolvable name.
fn dotted_token(expr: &ast::Expr) -> Option<(String, bool)> {
    match expr {
        ast::Expr::Name(name) => Some((name.id.to_string(), false)),
        ast::Expr::Attribute(attr) => {
            let mut segments = vec![attr.attr.to_string()];
            let mut value = &*attr.value;
            loop {
                match value {
                    ast::Expr::Name(name) => {
                        segments.push(name.id.to_string());
                        break;
                    }
                    ast::Expr::Attribute(inner) => {
                        segments.push(inner.attr.to_string());
                        value = &inner.value;
                    }
                    _ => return None,
                }
            }
            segments.reverse();
            Some((segments.join("."), true))
        }
        _ => None,
    }
}

/// Dotted token of a decorator expression. A call decorator contributes
/// its callee, so `@deco.factory(arg)` records `deco.factory`.
fn decorator_token(expr: &ast::Expr) -> Option<String> {
    let expr = match expr {
        ast::Expr::Call(call) => &*call.func,
        other => other,
    };
    dotted_token(expr).map(|(token, _)| token)
}

fn capture_base_token(expr: &ast::Expr, pending: &mut Vec<PendingBase>) {
    if let Some((token, qualified)) = dotted_token(expr) {
        pending.push(PendingBase::new(token, qualified));
    }
}

fn first_param(args: &ast::Arguments) -> Option<String> {
    args.posonlyargs
        .first()
        .or_else(|| args.args.first())
        .map(|arg| arg.def.arg.to_string())
}

fn collect_receiver_attrs(stmts: &[Stmt], receiver: &str, attrs: &mut BTreeSet<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign(assign) => {
                for target in &assign.targets {
                    collect_attr_target(target, receiver, attrs);
                }
            }
            // A nested function rebinds the receiver to its own first
            // parameter.
            Stmt::FunctionDef(func) => {
                let inner = first_param(&func.args).unwrap_or_default();
                collect_receiver_attrs(&func.body, &inner, attrs);
            }
            Stmt::AsyncFunctionDef(func) => {
                let inner = first_param(&func.args).unwrap_or_default();
                collect_receiver_attrs(&func.body, &inner, attrs);
            }
            Stmt::If(s) => {
                collect_receiver_attrs(&s.body, receiver, attrs);
                collect_receiver_attrs(&s.orelse, receiver, attrs);
            }
            Stmt::While(s) => {
                collect_receiver_attrs(&s.body, receiver, attrs);
                collect_receiver_attrs(&s.orelse, receiver, attrs);
            }
            Stmt::For(s) => {
                collect_receiver_attrs(&s.body, receiver, attrs);
                collect_receiver_attrs(&s.orelse, receiver, attrs);
            }
            Stmt::AsyncFor(s) => {
                collect_receiver_attrs(&s.body, receiver, attrs);
                collect_receiver_attrs(&s.orelse, receiver, attrs);
            }
            Stmt::With(s) => collect_receiver_attrs(&s.body, receiver, attrs),
            Stmt::AsyncWith(s) => collect_receiver_attrs(&s.body, receiver, attrs),
            Stmt::Try(s) => {
                collect_receiver_attrs(&s.body, receiver, attrs);
                for handler in &s.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    collect_receiver_attrs(&h.body, receiver, attrs);
                }
                collect_receiver_attrs(&s.orelse, receiver, attrs);
                collect_receiver_attrs(&s.finalbody, receiver, attrs);
            }
            Stmt::TryStar(s) => {
                collect_receiver_attrs(&s.body, receiver, attrs);
                for handler in &s.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    collect_receiver_attrs(&h.body, receiver, attrs);
                }
                collect_receiver_attrs(&s.orelse, receiver, attrs);
                collect_receiver_attrs(&s.finalbody, receiver, attrs);
            }
            Stmt::Match(s) => {
                for case in &s.cases {
                    collect_receiver_attrs(&case.body, receiver, attrs);
                }
            }
            _ => {}
        }
    }
}

/// Record `x` for assignments like `receiver.x = ...` or `receiver.x.y = ...`,
/// unpacking tuple targets element-wise.
fn collect_attr_target(target: &ast::Expr, receiver: &str, attrs: &mut BTreeSet<String>) {
    match target {
        ast::Expr::Attribute(attr) => {
            let mut current = attr;
            loop {
                match &*current.value {
                    ast::Expr::Name(name) => {
                        if name.id.as_str() == receiver {
                            attrs.insert(current.attr.to_string());
                        }
                        break;
                    }
                    ast::Expr::Attribute(inner) => current = inner,
                    _ => break,
                }
            }
        }
        ast::Expr::Tuple(tuple) => {
            for elt in &tuple.elts {
                collect_attr_target(elt, receiver, attrs);
            }
        }
        _ => {}
    }
}

fn collect_cls_attr_target(target: &ast::Expr, cls_attrs: &mut BTreeSet<String>) {
    match target {
        ast::Expr::Name(name) => {
            cls_attrs.insert(name.id.to_string());
        }
        ast::Expr::Tuple(tuple) => {
            for elt in &tuple.elts {
                collect_cls_attr_target(elt, cls_attrs);
            }
        }
        _ => {}
    }
}
