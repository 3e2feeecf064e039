//! Code generation for the resolved, type-checked tree.
//!
//! ## Activation records
//!
//! A call pushes, in order: the caller's frame pointer (control link), the
//! arguments last to first, and the access link. The callee sets FP to the
//! access link's slot, so parameter `i` lives at `FP + i`, the saved return
//! address at `FP - 1` and locals from `FP - 2` downward.
//!
//! ## Objects
//!
//! A class declaration copies its dispatch table onto the heap and keeps the
//! table's address in the class's global slot. An object is its field values
//! followed by a copy of that address; the object pointer is the address of
//! the copy, so field `-k` sits `k` words below it.

use fool_core::ast::{Call, FieldAccess, Ident, MethodCall, NewExpr};
use fool_core::{
    BinaryOp, Bytecode, ClassDecl, CodegenError, DEFAULT_MEMORY_SIZE, Declaration, Expr,
    ExprKind, NULL_POINTER, OpCode, Param, Program, Resolution, SymbolEntry, Type,
};
use rustc_hash::FxHashMap;

use crate::emit::{BytecodeEmitter, Label};

/// Code generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Words of machine memory. The global frame pointer equals this value,
    /// so global slots are addressed from it directly.
    pub memory_size: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
        }
    }
}

/// Generate bytecode for a program that resolved and checked without errors.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn generate(program: &Program, options: &CodegenOptions) -> Result<Bytecode, CodegenError> {
    CodeGenerator::new(options).generate(program)
}

/// Traversal state of the code generator.
#[derive(Debug)]
pub struct CodeGenerator {
    emitter: BytecodeEmitter,
    global_frame: i32,
    /// Method entry labels of every class generated so far, by dispatch
    /// offset.
    dispatch_tables: FxHashMap<String, Vec<Label>>,
}

type GenResult = Result<(), CodegenError>;

impl CodeGenerator {
    pub fn new(options: &CodegenOptions) -> Self {
        Self {
            emitter: BytecodeEmitter::new(),
            global_frame: i32::try_from(options.memory_size).unwrap_or(i32::MAX),
            dispatch_tables: FxHashMap::default(),
        }
    }

    pub fn generate(mut self, program: &Program) -> Result<Bytecode, CodegenError> {
        log::debug!("generating code");

        // Slot at FP - 1 of the global frame, where a callee would keep its
        // return address.
        self.emitter.emit_push(0);
        for decl in &program.declarations {
            self.gen_decl(decl)?;
        }
        self.gen_expr(&program.body)?;
        self.emitter.emit(OpCode::Halt);

        let code = self.emitter.finish()?;
        log::debug!("generated {} words", code.len());
        Ok(code)
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    /// Each declaration leaves exactly one word on the stack: its slot.
    fn gen_decl(&mut self, decl: &Declaration) -> GenResult {
        self.emitter.set_line(decl.line());
        match decl {
            Declaration::Var(var) => self.gen_expr(&var.init),
            Declaration::Fun(fun) => {
                let entry = self.emitter.fresh_label();
                self.emitter.emit_push_label(entry);
                self.gen_body(entry, &fun.params, &fun.locals, &fun.body)
            }
            Declaration::Class(class) => self.gen_class(class),
        }
    }

    /// Emit a function or method body as a deferred block starting at
    /// `entry`.
    fn gen_body(
        &mut self,
        entry: Label,
        params: &[Param],
        locals: &[Declaration],
        body: &Expr,
    ) -> GenResult {
        self.emitter.begin_deferred();
        self.emitter.bind_label(entry);
        self.emitter.emit(OpCode::CopyFp);
        self.emitter.emit(OpCode::LoadRa);
        for local in locals {
            self.gen_decl(local)?;
        }
        self.gen_expr(body)?;

        let e = &mut self.emitter;
        e.emit(OpCode::StoreTm);
        for _ in locals {
            e.emit(OpCode::Pop);
        }
        e.emit(OpCode::StoreRa);
        // access link
        e.emit(OpCode::Pop);
        for _ in params {
            e.emit(OpCode::Pop);
        }
        e.emit(OpCode::StoreFp);
        e.emit(OpCode::LoadTm);
        e.emit(OpCode::LoadRa);
        e.emit(OpCode::Js);
        e.end_deferred();
        Ok(())
    }

    fn gen_class(&mut self, class: &ClassDecl) -> GenResult {
        let mut table = class
            .superclass
            .as_ref()
            .and_then(|name| self.dispatch_tables.get(name))
            .cloned()
            .unwrap_or_default();

        let mut entries = Vec::with_capacity(class.methods.len());
        for method in &class.methods {
            let label = self.emitter.fresh_label();
            let slot = usize::try_from(method.offset).unwrap_or(table.len());
            if slot < table.len() {
                table[slot] = label;
            } else {
                table.push(label);
            }
            entries.push(label);
        }

        // The table's heap address becomes the class's slot value.
        self.emitter.emit(OpCode::LoadHp);
        for label in &table {
            self.emitter.emit_push_label(*label);
            self.emitter.emit_heap_store();
        }
        self.dispatch_tables.insert(class.name.clone(), table);

        for (method, entry) in class.methods.iter().zip(entries) {
            self.emitter.set_line(method.line);
            self.gen_body(entry, &method.params, &method.locals, &method.body)?;
        }
        Ok(())
    }

    // ==========================================================================
    // Addressing
    // ==========================================================================

    /// Push the frame pointer of the frame that declared `entry`, as seen
    /// from a use `resolution.hops()` levels deeper.
    ///
    /// Inside a method, the access link points at the receiver object, so
    /// global names cannot be reached by walking the chain; they are
    /// addressed from the fixed global frame pointer instead.
    fn gen_frame(&mut self, resolution: &Resolution) {
        if resolution.entry.level == 0 {
            self.emitter.emit_push(self.global_frame);
        } else {
            self.emitter.emit_frame_walk(resolution.hops());
        }
    }

    fn gen_ident(&mut self, ident: &Ident, line: u32) -> GenResult {
        let resolution = resolved(ident.resolution.as_ref(), &ident.name, line)?;
        self.gen_frame(resolution);
        self.emitter.emit_load_offset(resolution.entry.offset);
        Ok(())
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn gen_expr(&mut self, expr: &Expr) -> GenResult {
        self.emitter.set_line(expr.line);
        match &expr.kind {
            ExprKind::Int(value) => self.emitter.emit_push(*value),
            ExprKind::Bool(value) => self.emitter.emit_push(i32::from(*value)),
            ExprKind::Null => self.emitter.emit_push(NULL_POINTER),
            ExprKind::Id(ident) => self.gen_ident(ident, expr.line)?,
            ExprKind::Call(call) => self.gen_call(call, expr.line)?,
            ExprKind::Binary(binary) => self.gen_binary(binary.op, &binary.lhs, &binary.rhs)?,
            ExprKind::Not(operand) => {
                self.gen_expr(operand)?;
                self.emitter.emit_push(1);
                self.gen_select(OpCode::BranchEq, 0, 1);
            }
            ExprKind::If(if_expr) => {
                let then_label = self.emitter.fresh_label();
                let end = self.emitter.fresh_label();
                self.gen_expr(&if_expr.cond)?;
                self.emitter.emit_push(1);
                self.emitter.emit_branch(OpCode::BranchEq, then_label);
                self.gen_expr(&if_expr.else_branch)?;
                self.emitter.emit_branch(OpCode::Branch, end);
                self.emitter.bind_label(then_label);
                self.gen_expr(&if_expr.then_branch)?;
                self.emitter.bind_label(end);
            }
            ExprKind::Print(operand) => {
                self.gen_expr(operand)?;
                self.emitter.emit(OpCode::Print);
            }
            ExprKind::New(new) => self.gen_new(new, expr.line)?,
            ExprKind::MethodCall(call) => self.gen_method_call(call, expr.line)?,
            ExprKind::Field(access) => self.gen_field(access, expr.line)?,
        }
        Ok(())
    }

    /// Emit `branch_op L1; push otherwise; b L2; L1: push taken; L2:` over the
    /// two operands already on the stack.
    fn gen_select(&mut self, branch_op: OpCode, taken: i32, otherwise: i32) {
        let taken_label = self.emitter.fresh_label();
        let end = self.emitter.fresh_label();
        self.emitter.emit_branch(branch_op, taken_label);
        self.emitter.emit_push(otherwise);
        self.emitter.emit_branch(OpCode::Branch, end);
        self.emitter.bind_label(taken_label);
        self.emitter.emit_push(taken);
        self.emitter.bind_label(end);
    }

    fn gen_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> GenResult {
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                self.gen_expr(lhs)?;
                self.gen_expr(rhs)?;
                self.emitter.emit(match op {
                    BinaryOp::Add => OpCode::Add,
                    BinaryOp::Sub => OpCode::Sub,
                    BinaryOp::Mul => OpCode::Mult,
                    _ => OpCode::Div,
                });
            }
            BinaryOp::Eq => {
                self.gen_expr(lhs)?;
                self.gen_expr(rhs)?;
                self.gen_select(OpCode::BranchEq, 1, 0);
            }
            BinaryOp::LessEq => {
                self.gen_expr(lhs)?;
                self.gen_expr(rhs)?;
                self.gen_select(OpCode::BranchLessEq, 1, 0);
            }
            BinaryOp::GreaterEq => {
                self.gen_expr(lhs)?;
                self.gen_expr(rhs)?;
                // `lhs >= rhs` is `rhs <= lhs`.
                self.emitter.emit_swap();
                self.gen_select(OpCode::BranchLessEq, 1, 0);
            }
            // Short-circuit: a deciding left operand skips the right one.
            BinaryOp::And | BinaryOp::Or => {
                let decides = i32::from(op == BinaryOp::Or);
                let decided = self.emitter.fresh_label();
                let end = self.emitter.fresh_label();
                self.gen_expr(lhs)?;
                self.emitter.emit_push(decides);
                self.emitter.emit_branch(OpCode::BranchEq, decided);
                self.gen_expr(rhs)?;
                self.emitter.emit_push(decides);
                self.emitter.emit_branch(OpCode::BranchEq, decided);
                self.emitter.emit_push(1 - decides);
                self.emitter.emit_branch(OpCode::Branch, end);
                self.emitter.bind_label(decided);
                self.emitter.emit_push(decides);
                self.emitter.bind_label(end);
            }
        }
        Ok(())
    }

    /// Push the control link and the arguments, last first.
    fn gen_call_prologue(&mut self, args: &[Expr]) -> GenResult {
        self.emitter.emit(OpCode::LoadFp);
        for arg in args.iter().rev() {
            self.gen_expr(arg)?;
        }
        Ok(())
    }

    fn gen_call(&mut self, call: &Call, line: u32) -> GenResult {
        let resolution = resolved(call.resolution.as_ref(), &call.name, line)?;
        let offset = resolution.entry.offset;
        let is_method = resolution.entry.ty.is_method();

        self.gen_call_prologue(&call.args)?;
        self.emitter.set_line(line);
        // For a method called from a sibling, the declaring frame is the
        // receiver object.
        self.gen_frame(resolution);
        self.emitter.emit_call_through(|e| {
            if is_method {
                e.emit(OpCode::LoadW);
            }
            e.emit_load_offset(offset);
        });
        Ok(())
    }

    fn gen_method_call(&mut self, call: &MethodCall, line: u32) -> GenResult {
        let member = member(call.member.as_ref(), &call.method, line)?;
        let offset = member.offset;

        self.gen_call_prologue(&call.args)?;
        self.emitter.set_line(line);
        self.gen_ident(&call.object, line)?;
        self.emitter.emit_call_through(|e| {
            e.emit(OpCode::LoadW);
            e.emit_load_offset(offset);
        });
        Ok(())
    }

    fn gen_field(&mut self, access: &FieldAccess, line: u32) -> GenResult {
        let member = member(access.member.as_ref(), &access.field, line)?;
        let offset = member.offset;
        self.gen_ident(&access.object, line)?;
        self.emitter.emit_load_offset(offset);
        Ok(())
    }

    fn gen_new(&mut self, new: &NewExpr, line: u32) -> GenResult {
        let entry = member(new.entry.as_ref(), &new.class, line)?;
        if !matches!(entry.ty, Type::Class(_)) {
            return Err(CodegenError::NotAClass {
                name: new.class.clone(),
                line,
            });
        }
        let dispatch_slot = self.global_frame + entry.offset;

        for arg in &new.args {
            self.gen_expr(arg)?;
        }
        self.emitter.set_line(line);
        // The last argument lands lowest, so field -k ends up k words below
        // the object pointer.
        for _ in &new.args {
            self.emitter.emit_heap_store();
        }
        self.emitter.emit_push(dispatch_slot);
        self.emitter.emit(OpCode::LoadW);
        self.emitter.emit(OpCode::LoadHp);
        self.emitter.emit(OpCode::StoreW);
        self.emitter.emit(OpCode::LoadHp);
        self.emitter.emit_heap_bump();
        Ok(())
    }
}

fn resolved<'a>(
    resolution: Option<&'a Resolution>,
    name: &str,
    line: u32,
) -> Result<&'a Resolution, CodegenError> {
    resolution.ok_or_else(|| CodegenError::Unresolved {
        name: name.to_string(),
        line,
    })
}

fn member<'a>(
    entry: Option<&'a SymbolEntry>,
    name: &str,
    line: u32,
) -> Result<&'a SymbolEntry, CodegenError> {
    entry.ok_or_else(|| CodegenError::Unresolved {
        name: name.to_string(),
        line,
    })
}
