//! Type checking of the enriched tree.
//!
//! Computes a type for every expression bottom-up and checks the subtype
//! obligations of calls, initializers, return types, operators, branches and
//! overrides. Errors are collected; a failing declaration does not stop its
//! siblings from being checked.

mod relations;

pub use relations::{is_subtype, join};

use fool_core::ast::{Call, FieldAccess, Ident, MethodCall, NewExpr};
use fool_core::{
    ArrowType, BinaryOp, ClassDecl, ClassHierarchy, Declaration, Expr, ExprKind, FunDecl,
    MethodDecl, Program, Type, TypeError,
};

/// Result of checking a whole program.
#[derive(Debug)]
pub struct CheckOutput {
    /// Type of the program body, if it could be computed.
    pub ty: Option<Type>,
    pub errors: Vec<TypeError>,
}

/// Type check an enriched program.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn check(program: &Program, hierarchy: &ClassHierarchy) -> CheckOutput {
    TypeChecker::new(hierarchy).check_program(program)
}

/// Why a check stopped early.
enum CheckError {
    /// A reportable type error.
    Type(TypeError),
    /// A missing resolution or incomplete type. Never reported.
    Incomplete,
}

impl From<TypeError> for CheckError {
    fn from(err: TypeError) -> Self {
        CheckError::Type(err)
    }
}

type CheckResult<T> = Result<T, CheckError>;

/// Traversal state of the type checker.
pub struct TypeChecker<'h> {
    hierarchy: &'h ClassHierarchy,
    errors: Vec<TypeError>,
}

impl<'h> TypeChecker<'h> {
    pub fn new(hierarchy: &'h ClassHierarchy) -> Self {
        Self {
            hierarchy,
            errors: Vec::new(),
        }
    }

    pub fn check_program(mut self, program: &Program) -> CheckOutput {
        log::debug!("type checking {} declarations", program.declarations.len());

        for decl in &program.declarations {
            self.check_declaration(decl);
        }
        let ty = match self.check_expr(&program.body) {
            Ok(ty) => Some(ty),
            Err(err) => {
                self.absorb(err);
                None
            }
        };

        log::debug!("type checking finished with {} errors", self.errors.len());
        CheckOutput {
            ty,
            errors: self.errors,
        }
    }

    fn absorb(&mut self, err: CheckError) {
        match err {
            CheckError::Type(err) => {
                log::debug!("type error: {err}");
                self.errors.push(err);
            }
            CheckError::Incomplete => log::trace!("skipping incomplete node"),
        }
    }

    fn is_subtype(&self, a: &Type, b: &Type) -> bool {
        is_subtype(a, b, self.hierarchy)
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    /// Check a declaration, reporting its error instead of returning it.
    fn check_declaration(&mut self, decl: &Declaration) {
        if let Err(err) = self.check_decl(decl) {
            self.absorb(err);
        }
    }

    fn check_decl(&mut self, decl: &Declaration) -> CheckResult<()> {
        match decl {
            Declaration::Var(var) => {
                let init = self.check_expr(&var.init)?;
                if var.ty.contains_incomplete() {
                    return Err(CheckError::Incomplete);
                }
                if !self.is_subtype(&init, &var.ty) {
                    return Err(TypeError::IncompatibleValue {
                        name: var.name.clone(),
                        line: var.line,
                    }
                    .into());
                }
                Ok(())
            }
            Declaration::Fun(fun) => self.check_fun(fun),
            Declaration::Class(class) => {
                self.check_class(class);
                Ok(())
            }
        }
    }

    fn check_fun(&mut self, fun: &FunDecl) -> CheckResult<()> {
        self.check_callable(&fun.name, &fun.locals, &fun.body, &fun.ret, fun.line)
    }

    fn check_method(&mut self, method: &MethodDecl) -> CheckResult<()> {
        self.check_callable(
            &method.name,
            &method.locals,
            &method.body,
            &method.ret,
            method.line,
        )
    }

    fn check_callable(
        &mut self,
        name: &str,
        locals: &[Declaration],
        body: &Expr,
        ret: &Type,
        line: u32,
    ) -> CheckResult<()> {
        for local in locals {
            self.check_declaration(local);
        }
        let body_ty = self.check_expr(body)?;
        if !self.is_subtype(&body_ty, ret) {
            return Err(TypeError::WrongReturnType {
                name: name.to_string(),
                line,
            }
            .into());
        }
        Ok(())
    }

    fn check_class(&mut self, class: &ClassDecl) {
        for method in &class.methods {
            if let Err(err) = self.check_method(method) {
                self.absorb(err);
            }
        }

        let Some(super_entry) = &class.super_entry else {
            return;
        };
        let Type::Class(inherited) = &super_entry.ty else {
            return;
        };

        for field in &class.fields {
            let Some(super_ty) = inherited.field_at(field.offset) else {
                continue;
            };
            if !self.is_subtype(&field.ty, super_ty) {
                self.absorb(CheckError::Type(TypeError::BadOverride {
                    class: class.name.clone(),
                    member: field.name.clone(),
                    line: field.line,
                }));
            }
        }
        for method in &class.methods {
            let Some(super_sig) = inherited.method_at(method.offset) else {
                continue;
            };
            let own = Type::Method(method.signature());
            if !self.is_subtype(&own, &Type::Method(super_sig.clone())) {
                self.absorb(CheckError::Type(TypeError::BadOverride {
                    class: class.name.clone(),
                    member: method.name.clone(),
                    line: method.line,
                }));
            }
        }
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn check_expr(&mut self, expr: &Expr) -> CheckResult<Type> {
        let line = expr.line;
        let ty = match &expr.kind {
            ExprKind::Int(_) => Type::Int,
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::Null => Type::Empty,
            ExprKind::Id(ident) => self.check_ident(ident, line)?,
            ExprKind::Call(call) => self.check_call(call, line)?,
            ExprKind::Binary(binary) => {
                let lhs = self.check_expr(&binary.lhs)?;
                let rhs = self.check_expr(&binary.rhs)?;
                self.check_binary(binary.op, &lhs, &rhs, line)?
            }
            ExprKind::Not(operand) => {
                let ty = self.check_expr(operand)?;
                if !self.is_subtype(&ty, &Type::Bool) {
                    return Err(TypeError::mismatch("Non boolean in not", line).into());
                }
                Type::Bool
            }
            ExprKind::If(if_expr) => {
                let cond = self.check_expr(&if_expr.cond)?;
                if !self.is_subtype(&cond, &Type::Bool) {
                    return Err(TypeError::mismatch("Non boolean condition in if", line).into());
                }
                let then_ty = self.check_expr(&if_expr.then_branch)?;
                let else_ty = self.check_expr(&if_expr.else_branch)?;
                join(&then_ty, &else_ty, self.hierarchy)
                    .ok_or(TypeError::IncompatibleBranches { line })?
            }
            ExprKind::Print(operand) => self.check_expr(operand)?,
            ExprKind::New(new) => self.check_new(new, line)?,
            ExprKind::MethodCall(call) => self.check_method_call(call, line)?,
            ExprKind::Field(access) => self.check_field(access, line)?,
        };
        if ty.is_incomplete() {
            return Err(CheckError::Incomplete);
        }
        Ok(ty)
    }

    fn check_ident(&mut self, ident: &Ident, line: u32) -> CheckResult<Type> {
        let resolution = ident.resolution.as_ref().ok_or(CheckError::Incomplete)?;
        let what = match &resolution.entry.ty {
            Type::Arrow(_) => "function identifier",
            Type::Method(_) => "method identifier",
            Type::Class(_) => "class identifier",
            ty => return Ok(ty.clone()),
        };
        Err(TypeError::IllegalUse {
            what,
            name: ident.name.clone(),
            line,
        }
        .into())
    }

    fn check_binary(&self, op: BinaryOp, lhs: &Type, rhs: &Type, line: u32) -> CheckResult<Type> {
        if op.is_comparison() {
            if !(self.is_subtype(lhs, rhs) || self.is_subtype(rhs, lhs)) {
                let message = match op {
                    BinaryOp::Eq => "Incompatible types in equal",
                    BinaryOp::LessEq => "Incompatible types in less or equal",
                    _ => "Incompatible types in greater or equal",
                };
                return Err(TypeError::mismatch(message, line).into());
            }
            return Ok(Type::Bool);
        }

        let (operand, result, message) = match op {
            BinaryOp::Add => (Type::Int, Type::Int, "Non integers in sum"),
            BinaryOp::Sub => (Type::Int, Type::Int, "Non integers in subtraction"),
            BinaryOp::Mul => (Type::Int, Type::Int, "Non integers in multiplication"),
            BinaryOp::Div => (Type::Int, Type::Int, "Non integers in division"),
            BinaryOp::And => (Type::Bool, Type::Bool, "Non booleans in and"),
            _ => (Type::Bool, Type::Bool, "Non booleans in or"),
        };
        if !(self.is_subtype(lhs, &operand) && self.is_subtype(rhs, &operand)) {
            return Err(TypeError::mismatch(message, line).into());
        }
        Ok(result)
    }

    fn check_call(&mut self, call: &Call, line: u32) -> CheckResult<Type> {
        let resolution = call.resolution.as_ref().ok_or(CheckError::Incomplete)?;
        let arrow = resolution
            .entry
            .ty
            .as_callable()
            .ok_or_else(|| TypeError::NotCallable {
                name: call.name.clone(),
                line,
            })?;
        self.check_arguments(&call.name, &arrow.params, &call.args, line)?;
        Ok((*arrow.ret).clone())
    }

    fn check_method_call(&mut self, call: &MethodCall, line: u32) -> CheckResult<Type> {
        let member = call.member.as_ref().ok_or(CheckError::Incomplete)?;
        let arrow: &ArrowType = match &member.ty {
            Type::Method(arrow) => arrow,
            _ => {
                return Err(TypeError::NotCallable {
                    name: call.method.clone(),
                    line,
                }
                .into());
            }
        };
        self.check_arguments(&call.method, &arrow.params, &call.args, line)?;
        Ok((*arrow.ret).clone())
    }

    fn check_new(&mut self, new: &NewExpr, line: u32) -> CheckResult<Type> {
        let entry = new.entry.as_ref().ok_or(CheckError::Incomplete)?;
        let Type::Class(class_type) = &entry.ty else {
            return Err(TypeError::NotAClass {
                name: new.class.clone(),
                line,
            }
            .into());
        };
        self.check_arguments(&new.class, &class_type.fields, &new.args, line)?;
        Ok(Type::Ref(new.class.clone()))
    }

    fn check_field(&mut self, access: &FieldAccess, line: u32) -> CheckResult<Type> {
        let member = access.member.as_ref().ok_or(CheckError::Incomplete)?;
        if member.ty.is_method() {
            return Err(TypeError::IllegalUse {
                what: "method identifier",
                name: access.field.clone(),
                line,
            }
            .into());
        }
        Ok(member.ty.clone())
    }

    /// Exact arity, then each argument against its formal, stopping at the
    /// first mismatch.
    fn check_arguments(
        &mut self,
        callee: &str,
        formals: &[Type],
        args: &[Expr],
        line: u32,
    ) -> CheckResult<()> {
        if formals.len() != args.len() {
            return Err(TypeError::WrongArity {
                callee: callee.to_string(),
                expected: formals.len(),
                found: args.len(),
                line,
            }
            .into());
        }
        for (index, (formal, arg)) in formals.iter().zip(args).enumerate() {
            let actual = self.check_expr(arg)?;
            if !self.is_subtype(&actual, formal) {
                return Err(TypeError::WrongArgument {
                    callee: callee.to_string(),
                    index: index + 1,
                    line,
                }
                .into());
            }
        }
        Ok(())
    }
}
