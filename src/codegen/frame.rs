use crate::ast::*;
use std::collections::HashMap;

/// Size of a machine word. Every C-minus value (int or array pointer) is one
/// word wide.
pub const WORD: u32 = 4;

/// The O32 calling convention mandates a 16-byte argument build area in any
/// frame that makes a call, even when fewer bytes are needed.
pub const O32_ARG_AREA: u32 = 16;

/// Per-function frame area sizes, all word-aligned.
///
/// The frame grows downward from `$sp`:
///
/// ```text
/// $sp -> [ output | temp | saved | local | input ]  -> higher addresses
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub output_size: u32,
    pub temp_size: u32,
    pub saved_size: u32,
    pub local_size: u32,
    pub input_size: u32,
}

impl FrameInfo {
    /// Total frame size, padded up to double-word alignment.
    pub fn total_size(&self) -> u32 {
        let sum =
            self.output_size + self.temp_size + self.saved_size + self.local_size + self.input_size;
        sum.next_multiple_of(8)
    }

    /// `$sp`-relative offset of byte `within` of the output area.
    pub fn output_offset(&self, within: u32) -> i32 {
        debug_assert!(within < self.output_size.max(1));
        within as i32
    }

    pub fn temp_offset(&self, within: u32) -> i32 {
        debug_assert!(within < self.temp_size.max(1));
        (self.output_size + within) as i32
    }

    pub fn saved_offset(&self, within: u32) -> i32 {
        debug_assert!(within < self.saved_size.max(1));
        (self.output_size + self.temp_size + within) as i32
    }

    pub fn local_offset(&self, within: u32) -> i32 {
        debug_assert!(within < self.local_size.max(1));
        (self.output_size + self.temp_size + self.saved_size + within) as i32
    }

    pub fn input_offset(&self, within: u32) -> i32 {
        debug_assert!(within < self.input_size.max(1));
        (self.output_size + self.temp_size + self.saved_size + self.local_size + within) as i32
    }
}

/// A computed frame: area sizes plus the `$sp`-relative slot of every
/// parameter and local of the function.
#[derive(Debug)]
pub struct FrameLayout {
    pub info: FrameInfo,
    pub slots: HashMap<DeclId, i32>,
}

/// Computes the frame layout of `fun`, a pre-pass over the function body
/// run before any code is emitted.
pub fn allocate_frame(pool: &DeclPool, fun: &FunDecl) -> FrameLayout {
    let body = fun.body.as_ref().expect("cannot lay out an extern function");

    let mut locals = Vec::new();
    collect_locals(body, &mut locals);

    let mut calls = CallInfo::default();
    collect_compound_calls(body, &mut calls);

    let local_size: u32 = locals
        .iter()
        .map(|&decl| decl_size(pool.get(decl)))
        .sum();

    let info = FrameInfo {
        output_size: if calls.has_call {
            O32_ARG_AREA.max(WORD * calls.max_args)
        } else {
            0
        },
        temp_size: WORD * compound_temp_depth(body),
        // $ra and $fp are saved unconditionally; no other callee-saved
        // register is ever touched by the stack-based evaluator.
        saved_size: 8,
        local_size,
        input_size: WORD * fun.params.len() as u32,
    };

    let mut slots = HashMap::new();
    for (k, &param) in fun.params.iter().enumerate() {
        slots.insert(param, info.input_offset(WORD * k as u32));
    }
    let mut within = 0;
    for &local in &locals {
        slots.insert(local, info.local_offset(within));
        within += decl_size(pool.get(local));
    }

    FrameLayout { info, slots }
}

fn decl_size(decl: &Decl) -> u32 {
    match decl {
        Decl::Var(var) => WORD * var.array_size.unwrap_or(1),
        Decl::Parm(_) => WORD,
        Decl::Fun(_) => unreachable!("functions do not occupy frame slots"),
    }
}

/// Collects every local declaration of the body, nested blocks included.
/// Slots are never overlaid between sibling blocks.
fn collect_locals(compound: &CompoundStmt, out: &mut Vec<DeclId>) {
    out.extend(&compound.decls);
    for stmt in &compound.stmts {
        collect_stmt_locals(stmt, out);
    }
}

fn collect_stmt_locals(stmt: &Stmt, out: &mut Vec<DeclId>) {
    match stmt {
        Stmt::Compound(compound) => collect_locals(compound, out),
        Stmt::Selection(selection) => {
            collect_stmt_locals(&selection.then, out);
            if let Some(els) = &selection.els {
                collect_stmt_locals(els, out);
            }
        }
        Stmt::Iteration(iteration) => collect_stmt_locals(&iteration.body, out),
        Stmt::Null | Stmt::Return(_) | Stmt::Expr(_) => {}
    }
}

#[derive(Default)]
struct CallInfo {
    has_call: bool,
    max_args: u32,
}

fn collect_compound_calls(compound: &CompoundStmt, calls: &mut CallInfo) {
    for stmt in &compound.stmts {
        collect_stmt_calls(stmt, calls);
    }
}

fn collect_stmt_calls(stmt: &Stmt, calls: &mut CallInfo) {
    match stmt {
        Stmt::Null => {}
        Stmt::Compound(compound) => collect_compound_calls(compound, calls),
        Stmt::Selection(selection) => {
            collect_expr_calls(&selection.cond, calls);
            collect_stmt_calls(&selection.then, calls);
            if let Some(els) = &selection.els {
                collect_stmt_calls(els, calls);
            }
        }
        Stmt::Iteration(iteration) => {
            collect_expr_calls(&iteration.cond, calls);
            collect_stmt_calls(&iteration.body, calls);
        }
        Stmt::Return(retn) => {
            if let Some(expr) = &retn.expr {
                collect_expr_calls(expr, calls);
            }
        }
        Stmt::Expr(expr) => collect_expr_calls(expr, calls),
    }
}

fn collect_expr_calls(expr: &Expr, calls: &mut CallInfo) {
    match &expr.kind {
        ExprKind::Number(_) => {}
        ExprKind::Var(var) => {
            if let Some(index) = &var.index {
                collect_expr_calls(index, calls);
            }
        }
        ExprKind::Binary(binary) => {
            collect_expr_calls(&binary.lhs, calls);
            collect_expr_calls(&binary.rhs, calls);
        }
        ExprKind::Call(call) => {
            calls.has_call = true;
            calls.max_args = calls.max_args.max(call.args.len() as u32);
            for arg in &call.args {
                collect_expr_calls(arg, calls);
            }
        }
    }
}

fn compound_temp_depth(compound: &CompoundStmt) -> u32 {
    compound.stmts.iter().map(stmt_temp_depth).max().unwrap_or(0)
}

fn stmt_temp_depth(stmt: &Stmt) -> u32 {
    match stmt {
        Stmt::Null => 0,
        Stmt::Compound(compound) => compound_temp_depth(compound),
        Stmt::Selection(selection) => {
            let mut depth = expr_temp_depth(&selection.cond).max(stmt_temp_depth(&selection.then));
            if let Some(els) = &selection.els {
                depth = depth.max(stmt_temp_depth(els));
            }
            depth
        }
        Stmt::Iteration(iteration) => {
            expr_temp_depth(&iteration.cond).max(stmt_temp_depth(&iteration.body))
        }
        Stmt::Return(retn) => retn.expr.as_ref().map_or(0, expr_temp_depth),
        Stmt::Expr(expr) => expr_temp_depth(expr),
    }
}

/// Upper bound on the number of temp slots live at once while evaluating
/// `expr`. Mirrors exactly how the generator spills:
///
///   * a binary operation holds its left operand in a slot while the right
///     side is evaluated (an assignment holds the target address);
///   * a call holds one slot per already-evaluated argument, and all of them
///     right before they are copied into the output area.
pub fn expr_temp_depth(expr: &Expr) -> u32 {
    match &expr.kind {
        ExprKind::Number(_) => 0,
        ExprKind::Var(var) => var.index.as_ref().map_or(0, |index| expr_temp_depth(index)),
        ExprKind::Binary(binary) => {
            expr_temp_depth(&binary.lhs).max(1 + expr_temp_depth(&binary.rhs))
        }
        ExprKind::Call(call) => {
            let during_args = call
                .args
                .iter()
                .enumerate()
                .map(|(held, arg)| held as u32 + expr_temp_depth(arg))
                .max()
                .unwrap_or(0);
            during_args.max(call.args.len() as u32)
        }
    }
}
