//! Scope resolution.
//!
//! Walks the raw tree, assigns every declaration a nesting level and a
//! storage offset, and attaches a [`Resolution`] or [`SymbolEntry`] to every
//! use site. Errors are collected and the walk continues, so one pass reports
//! every independent problem.
//!
//! ## Offsets
//!
//! - variables, functions and classes in one scope share a counter that starts
//!   at `-2` and decreases
//! - parameters count up from `1`, restarting for every function or method
//! - fields count down from `-1`, methods up from `0`, both continuing after
//!   the inherited members; an override reuses the inherited offset
//!
//! Class bodies open a scope holding the class's virtual table. The virtual
//! table is also kept by class name for the rest of the pass, so `new`,
//! `object.member` and `extends` can find it.

mod scope;

pub use scope::{ScopeStack, SymbolTable};

use fool_core::ast::Ident;
use fool_core::{
    ClassDecl, ClassHierarchy, ClassType, DeclKind, Declaration, Expr, ExprKind, FunDecl,
    MethodDecl, Param, Program, Resolution, ResolveError, SymbolEntry, Type, VarDecl,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// A class's own and inherited members by name.
pub type VirtualTable = SymbolTable;

/// The enriched tree plus everything the later phases need from resolution.
#[derive(Debug)]
pub struct ResolveOutput {
    pub program: Program,
    pub hierarchy: ClassHierarchy,
    pub class_tables: FxHashMap<String, VirtualTable>,
    pub errors: Vec<ResolveError>,
}

impl ResolveOutput {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Resolve a raw tree.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve(program: Program) -> ResolveOutput {
    Resolver::new().resolve(program)
}

/// Traversal state of the scope resolver.
#[derive(Debug)]
pub struct Resolver {
    scopes: ScopeStack,
    class_tables: FxHashMap<String, VirtualTable>,
    hierarchy: ClassHierarchy,
    /// Next offset for a variable, function or class in the innermost scope.
    decl_offset: i32,
    errors: Vec<ResolveError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            class_tables: FxHashMap::default(),
            hierarchy: ClassHierarchy::new(),
            decl_offset: -2,
            errors: Vec::new(),
        }
    }

    pub fn resolve(mut self, mut program: Program) -> ResolveOutput {
        log::debug!(
            "resolving program with {} top-level declarations",
            program.declarations.len()
        );

        self.scopes.push_scope();
        for decl in &mut program.declarations {
            self.visit_decl(decl);
        }
        self.visit_expr(&mut program.body);
        self.scopes.pop_scope();

        log::debug!("scope resolution finished with {} errors", self.errors.len());

        ResolveOutput {
            program,
            hierarchy: self.hierarchy,
            class_tables: self.class_tables,
            errors: self.errors,
        }
    }

    fn report(&mut self, error: ResolveError) {
        log::debug!("scope error: {error}");
        self.errors.push(error);
    }

    fn level(&self) -> u32 {
        self.scopes.level()
    }

    fn next_decl_offset(&mut self) -> i32 {
        let offset = self.decl_offset;
        self.decl_offset -= 1;
        offset
    }

    fn declare(&mut self, kind: DeclKind, name: &str, entry: SymbolEntry, line: u32) {
        if self.scopes.declare(name, entry).is_err() {
            self.report(ResolveError::DuplicateDeclaration {
                kind,
                name: name.to_string(),
                line,
            });
        }
    }

    /// Report every class named in `ty` that has not been declared.
    fn check_type(&mut self, ty: &Type, line: u32) {
        match ty {
            Type::Ref(name) => {
                if !self.hierarchy.contains(name) {
                    self.report(ResolveError::UndeclaredClass {
                        name: name.clone(),
                        line,
                    });
                }
            }
            Type::Arrow(arrow) | Type::Method(arrow) => {
                for param in &arrow.params {
                    self.check_type(param, line);
                }
                self.check_type(&arrow.ret, line);
            }
            Type::Class(_) | Type::Int | Type::Bool | Type::Empty | Type::Incomplete => {}
        }
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn visit_decl(&mut self, decl: &mut Declaration) {
        match decl {
            Declaration::Var(var) => self.visit_var(var),
            Declaration::Fun(fun) => self.visit_fun(fun),
            Declaration::Class(class) => {
                if self.level() == 0 {
                    self.visit_class(class);
                } else {
                    self.report(ResolveError::NestedClass {
                        name: class.name.clone(),
                        line: class.line,
                    });
                }
            }
        }
    }

    fn visit_var(&mut self, var: &mut VarDecl) {
        // The initializer cannot see the variable it initializes.
        self.visit_expr(&mut var.init);
        self.check_type(&var.ty, var.line);

        let entry = SymbolEntry::new(self.level(), var.ty.clone(), self.next_decl_offset());
        self.declare(DeclKind::Var, &var.name, entry, var.line);
    }

    fn visit_fun(&mut self, fun: &mut FunDecl) {
        let signature = fun.signature();
        self.check_type(&signature, fun.line);

        // Declared before the body so the function can call itself.
        let entry = SymbolEntry::new(self.level(), signature, self.next_decl_offset());
        self.declare(DeclKind::Fun, &fun.name, entry, fun.line);

        self.visit_callable(&fun.params, &mut fun.locals, &mut fun.body);
    }

    /// Resolve a function or method body in a fresh scope.
    fn visit_callable(&mut self, params: &[Param], locals: &mut [Declaration], body: &mut Expr) {
        self.scopes.push_scope();
        let saved_offset = self.decl_offset;
        self.decl_offset = -2;

        let level = self.level();
        for (param, offset) in params.iter().zip(1..) {
            let entry = SymbolEntry::new(level, param.ty.clone(), offset);
            let line = param.line;
            self.declare(DeclKind::Par, &param.name, entry, line);
        }
        for decl in locals.iter_mut() {
            self.visit_decl(decl);
        }
        self.visit_expr(body);

        self.scopes.pop_scope();
        self.decl_offset = saved_offset;
    }

    fn visit_class(&mut self, class: &mut ClassDecl) {
        let (mut class_type, mut vtable, parent) = self.inherit(class);
        let fresh = self.hierarchy.declare(class.name.clone(), parent);
        let class_offset = self.next_decl_offset();

        let member_level = self.level() + 1;
        let mut own: FxHashSet<String> = FxHashSet::default();

        for field in &mut class.fields {
            self.check_type(&field.ty, field.line);
            if !own.insert(field.name.clone()) {
                self.report(ResolveError::DuplicateDeclaration {
                    kind: DeclKind::Field,
                    name: field.name.clone(),
                    line: field.line,
                });
                field.offset = vtable
                    .get(&field.name)
                    .map(|e| e.offset)
                    .unwrap_or_default();
                continue;
            }

            let inherited = vtable.get(&field.name).cloned();
            let offset = match inherited {
                Some(existing) if existing.ty.is_method() => {
                    self.report(ResolveError::InvalidOverride {
                        class: class.name.clone(),
                        member: field.name.clone(),
                        inherited: DeclKind::Method,
                        kind: DeclKind::Field,
                        line: field.line,
                    });
                    field.offset = ClassType::field_offset(class_type.fields.len());
                    class_type.fields.push(field.ty.clone());
                    continue;
                }
                Some(existing) => {
                    if let Some(slot) = class_type
                        .fields
                        .get_mut(ClassType::field_index(existing.offset))
                    {
                        *slot = field.ty.clone();
                    }
                    existing.offset
                }
                None => {
                    let offset = ClassType::field_offset(class_type.fields.len());
                    class_type.fields.push(field.ty.clone());
                    offset
                }
            };
            field.offset = offset;
            vtable.insert(
                field.name.clone(),
                SymbolEntry::new(member_level, field.ty.clone(), offset),
            );
        }

        for method in &mut class.methods {
            self.register_method(
                &class.name,
                method,
                member_level,
                &mut own,
                &mut class_type,
                &mut vtable,
            );
        }

        let entry = SymbolEntry::new(self.level(), Type::Class(class_type), class_offset);
        class.entry = Some(entry.clone());
        self.declare(DeclKind::Class, &class.name, entry, class.line);
        if fresh {
            self.class_tables.insert(class.name.clone(), vtable.clone());
        }

        // Method bodies see the members through the class scope.
        self.scopes.push_table(vtable);
        for method in &mut class.methods {
            self.visit_callable(&method.params, &mut method.locals, &mut method.body);
        }
        self.scopes.pop_scope();
    }

    /// Starting layout of a class: a copy of its superclass's, if any.
    fn inherit(&mut self, class: &mut ClassDecl) -> (ClassType, VirtualTable, Option<String>) {
        let Some(superclass) = class.superclass.clone() else {
            return (ClassType::default(), VirtualTable::default(), None);
        };

        let super_entry = self.scopes.lookup_global(&superclass).cloned();
        let vtable = self.class_tables.get(&superclass).cloned();
        if let (Some(entry), Some(vtable)) = (super_entry, vtable) {
            if let Type::Class(class_type) = &entry.ty {
                let class_type = class_type.clone();
                class.super_entry = Some(entry);
                return (class_type, vtable, Some(superclass));
            }
        }

        self.report(ResolveError::UndeclaredClass {
            name: superclass,
            line: class.line,
        });
        (ClassType::default(), VirtualTable::default(), None)
    }

    fn register_method(
        &mut self,
        class_name: &str,
        method: &mut MethodDecl,
        member_level: u32,
        own: &mut FxHashSet<String>,
        class_type: &mut ClassType,
        vtable: &mut VirtualTable,
    ) {
        let signature = method.signature();
        self.check_type(&Type::Arrow(signature.clone()), method.line);

        if !own.insert(method.name.clone()) {
            self.report(ResolveError::DuplicateDeclaration {
                kind: DeclKind::Method,
                name: method.name.clone(),
                line: method.line,
            });
            method.offset = vtable
                .get(&method.name)
                .map(|e| e.offset)
                .unwrap_or_default();
            return;
        }

        let offset = match vtable.get(&method.name) {
            Some(existing) if !existing.ty.is_method() => {
                self.report(ResolveError::InvalidOverride {
                    class: class_name.to_string(),
                    member: method.name.clone(),
                    inherited: DeclKind::Field,
                    kind: DeclKind::Method,
                    line: method.line,
                });
                method.offset = class_type.methods.len() as i32;
                class_type.methods.push(signature);
                return;
            }
            Some(existing) => {
                let offset = existing.offset;
                if let Some(slot) = usize::try_from(offset)
                    .ok()
                    .and_then(|i| class_type.methods.get_mut(i))
                {
                    *slot = signature.clone();
                }
                offset
            }
            None => {
                let offset = class_type.methods.len() as i32;
                class_type.methods.push(signature.clone());
                offset
            }
        };
        method.offset = offset;
        vtable.insert(
            method.name.clone(),
            SymbolEntry::new(member_level, Type::Method(signature), offset),
        );
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn visit_expr(&mut self, expr: &mut Expr) {
        let line = expr.line;
        match &mut expr.kind {
            ExprKind::Int(_) | ExprKind::Bool(_) | ExprKind::Null => {}
            ExprKind::Id(ident) => self.visit_ident(ident, line),
            ExprKind::Call(call) => {
                match self.scopes.lookup(&call.name) {
                    Some(entry) => {
                        call.resolution = Some(Resolution::new(entry.clone(), self.level()));
                    }
                    None => self.report(ResolveError::Undeclared {
                        kind: DeclKind::Fun,
                        name: call.name.clone(),
                        line,
                    }),
                }
                for arg in &mut call.args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::Binary(binary) => {
                self.visit_expr(&mut binary.lhs);
                self.visit_expr(&mut binary.rhs);
            }
            ExprKind::Not(operand) | ExprKind::Print(operand) => self.visit_expr(operand),
            ExprKind::If(if_expr) => {
                self.visit_expr(&mut if_expr.cond);
                self.visit_expr(&mut if_expr.then_branch);
                self.visit_expr(&mut if_expr.else_branch);
            }
            ExprKind::New(new) => {
                match self.scopes.lookup_global(&new.class) {
                    Some(entry) => new.entry = Some(entry.clone()),
                    None => self.report(ResolveError::UndeclaredClass {
                        name: new.class.clone(),
                        line,
                    }),
                }
                for arg in &mut new.args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::MethodCall(call) => {
                call.member = self.visit_member(&mut call.object, &call.method, line);
                for arg in &mut call.args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::Field(access) => {
                access.member = self.visit_member(&mut access.object, &access.field, line);
            }
        }
    }

    fn visit_ident(&mut self, ident: &mut Ident, line: u32) {
        match self.scopes.lookup(&ident.name) {
            Some(entry) => ident.resolution = Some(Resolution::new(entry.clone(), self.level())),
            None => self.report(ResolveError::Undeclared {
                kind: DeclKind::Var,
                name: ident.name.clone(),
                line,
            }),
        }
    }

    /// Resolve `object.member`: the object lexically, the member through the
    /// virtual table of the object's declared class.
    fn visit_member(&mut self, object: &mut Ident, member: &str, line: u32) -> Option<SymbolEntry> {
        self.visit_ident(object, line);
        let resolution = object.resolution.as_ref()?;

        let Type::Ref(class) = &resolution.entry.ty else {
            self.report(ResolveError::NotAnObject {
                name: object.name.clone(),
                line,
            });
            return None;
        };

        let found = self
            .class_tables
            .get(class)
            .and_then(|vtable| vtable.get(member))
            .cloned();
        if found.is_none() {
            self.report(ResolveError::UndeclaredMember {
                class: class.clone(),
                member: member.to_string(),
                line,
            });
        }
        found
    }
}
