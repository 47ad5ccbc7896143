use super::*;
use std::fmt::Write;

/// Dumps a program in the canonical labeled-bracket notation, one node per
/// line, indented two spaces per nesting level.
pub fn dump_program(program: &Program) -> String {
    let dumper = Dumper { pool: &program.pool };
    let mut dest = String::new();
    dumper.program(program, &mut dest);
    dest
}

struct Dumper<'a> {
    pool: &'a DeclPool,
}

fn newline(dest: &mut String, depth: usize) {
    if !dest.is_empty() {
        dest.push('\n');
    }
    for _ in 0..2 * depth {
        dest.push(' ');
    }
}

impl Dumper<'_> {
    fn program(&self, program: &Program, dest: &mut String) {
        newline(dest, 0);
        dest.push_str("[program ");
        for &decl in &program.decls {
            self.decl(decl, dest, 1);
        }
        newline(dest, 0);
        dest.push(']');
    }

    fn decl(&self, id: DeclId, dest: &mut String, depth: usize) {
        match self.pool.get(id) {
            Decl::Var(decl) => Self::var_decl(decl, dest, depth),
            Decl::Parm(decl) => Self::parm_decl(decl, dest, depth),
            Decl::Fun(decl) => self.fun_decl(decl, dest, depth),
        }
    }

    fn var_decl(decl: &VarDecl, dest: &mut String, depth: usize) {
        newline(dest, depth);
        let _ = write!(dest, "[var-declaration [int] [{}]", decl.name);
        if let Some(size) = decl.array_size {
            let _ = write!(dest, " [{size}]");
        }
        dest.push(']');
    }

    fn parm_decl(decl: &ParmVarDecl, dest: &mut String, depth: usize) {
        newline(dest, depth);
        let _ = write!(dest, "[param [int] [{}]", decl.name);
        if decl.is_array {
            dest.push_str(" [\\[\\]]");
        }
        dest.push(']');
    }

    fn fun_decl(&self, decl: &FunDecl, dest: &mut String, depth: usize) {
        newline(dest, depth);
        dest.push_str("[fun-declaration ");

        newline(dest, depth + 1);
        dest.push_str(if decl.retn == ExprType::Void { "[void]" } else { "[int]" });

        newline(dest, depth + 1);
        let _ = write!(dest, "[{}]", decl.name);

        newline(dest, depth + 1);
        dest.push_str("[params");
        for &param in &decl.params {
            dest.push(' ');
            self.decl(param, dest, depth + 2);
        }
        dest.push(']');

        // Only the seeded externs lack a body, and those never show up in
        // the top-level declaration list.
        if let Some(body) = &decl.body {
            self.compound_stmt(body, dest, depth + 1);
        }

        newline(dest, depth);
        dest.push(']');
    }

    fn stmt(&self, stmt: &Stmt, dest: &mut String, depth: usize) {
        match stmt {
            Stmt::Null => {
                newline(dest, depth);
                dest.push_str("[;]");
            }
            Stmt::Compound(compound) => self.compound_stmt(compound, dest, depth),
            Stmt::Selection(selection) => self.selection_stmt(selection, dest, depth),
            Stmt::Iteration(iteration) => self.iteration_stmt(iteration, dest, depth),
            Stmt::Return(retn) => self.return_stmt(retn, dest, depth),
            Stmt::Expr(expr) => self.expr(expr, dest, depth),
        }
    }

    fn compound_stmt(&self, compound: &CompoundStmt, dest: &mut String, depth: usize) {
        newline(dest, depth);
        dest.push_str("[compound-stmt ");
        for &decl in &compound.decls {
            self.decl(decl, dest, depth + 1);
        }
        for stmt in &compound.stmts {
            self.stmt(stmt, dest, depth + 1);
        }
        newline(dest, depth);
        dest.push(']');
    }

    fn selection_stmt(&self, selection: &SelectionStmt, dest: &mut String, depth: usize) {
        newline(dest, depth);
        dest.push_str("[selection-stmt ");
        self.expr(&selection.cond, dest, depth + 1);
        self.stmt(&selection.then, dest, depth + 1);
        if let Some(els) = &selection.els {
            self.stmt(els, dest, depth + 1);
        }
        newline(dest, depth);
        dest.push(']');
    }

    fn iteration_stmt(&self, iteration: &IterationStmt, dest: &mut String, depth: usize) {
        newline(dest, depth);
        dest.push_str("[iteration-stmt ");
        self.expr(&iteration.cond, dest, depth + 1);
        self.stmt(&iteration.body, dest, depth + 1);
        newline(dest, depth);
        dest.push(']');
    }

    fn return_stmt(&self, retn: &ReturnStmt, dest: &mut String, depth: usize) {
        newline(dest, depth);
        dest.push_str("[return-stmt");
        if let Some(expr) = &retn.expr {
            dest.push(' ');
            self.expr(expr, dest, depth + 1);
        }
        dest.push(']');
    }

    fn expr(&self, expr: &Expr, dest: &mut String, depth: usize) {
        match &expr.kind {
            ExprKind::Number(value) => {
                let _ = write!(dest, "[{value}]");
            }
            ExprKind::Var(var) => self.var_ref(var, dest, depth),
            ExprKind::Call(call) => self.fun_call(call, dest, depth),
            ExprKind::Binary(binary) => self.binary_expr(binary, dest, depth),
        }
    }

    fn binary_expr(&self, binary: &BinaryExpr, dest: &mut String, depth: usize) {
        newline(dest, depth);
        let _ = write!(dest, "[{} ", binary.op.symbol());
        self.expr(&binary.lhs, dest, depth + 1);
        dest.push(' ');
        self.expr(&binary.rhs, dest, depth + 1);
        dest.push(']');
    }

    fn var_ref(&self, var: &VarRef, dest: &mut String, depth: usize) {
        let _ = write!(dest, "[var [{}]", var.name);
        if let Some(index) = &var.index {
            dest.push(' ');
            self.expr(index, dest, depth + 1);
        }
        dest.push(']');
    }

    fn fun_call(&self, call: &FunCall, dest: &mut String, depth: usize) {
        newline(dest, depth);
        dest.push_str("[call");

        newline(dest, depth + 1);
        let _ = write!(dest, "[{}]", call.name);

        newline(dest, depth + 1);
        dest.push_str("[args");
        for arg in &call.args {
            dest.push(' ');
            self.expr(arg, dest, depth + 2);
        }
        dest.push(']');

        newline(dest, depth);
        dest.push(']');
    }
}
