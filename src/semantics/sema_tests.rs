use crate::ast::*;
use crate::diagnostics::{Diag, DiagParam, DiagnosticManager};
use crate::sourceman::SourceFile;

fn parse_source(text: &str) -> (Option<Program>, Vec<Diag>) {
    let source = SourceFile::new(text.to_owned());
    let diagman = DiagnosticManager::new();
    let program = crate::parse(&source, &diagman);
    (program, diagman.codes())
}

fn main_body(program: &Program) -> &CompoundStmt {
    let main = program
        .decls
        .iter()
        .find_map(|&id| match program.pool.get(id) {
            Decl::Fun(fun) if fun.name == "main" => Some(fun),
            _ => None,
        })
        .expect("program has no main");
    main.body.as_ref().expect("main has no body")
}

#[test]
fn test_void_variable_is_rejected() {
    let (program, diags) = parse_source("void x;\nint main(void) { return 0; }\n");
    assert_eq!(diags, vec![Diag::SemaVarCannotBeVoid]);
    // The offending declaration is still returned and parsing goes on.
    assert!(program.is_some());
}

#[test]
fn test_void_parameter_is_rejected() {
    let (_, diags) = parse_source("int f(void a) { return 0; }\nint main(void) { return 0; }\n");
    assert_eq!(diags, vec![Diag::SemaVarCannotBeVoid]);
}

#[test]
fn test_redefinition_in_same_scope() {
    let source = "int a; int a;\nint main(void) { return 0; }\n";
    let file = SourceFile::new(source.to_owned());
    let diagman = DiagnosticManager::new();
    let program = crate::parse(&file, &diagman);
    assert!(program.is_some());
    let history = diagman.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].code, Diag::SemaRedefinition);
    assert_eq!(history[0].args, vec![DiagParam::Symbol(String::from("a"))]);
}

#[test]
fn test_function_and_variable_share_one_namespace() {
    let (_, diags) = parse_source("int a;\nint a(void) { return 0; }\nint main(void) { return 0; }\n");
    assert_eq!(diags, vec![Diag::SemaRedefinition]);
}

#[test]
fn test_call_to_undeclared_function() {
    let file = SourceFile::new(String::from("int main(void) { return f(); }\n"));
    let diagman = DiagnosticManager::new();
    let program = crate::parse(&file, &diagman);
    assert!(program.is_some());
    let history = diagman.history();
    assert_eq!(history[0].code, Diag::SemaUndeclaredIdentifier);
    assert_eq!(history[0].args, vec![DiagParam::Symbol(String::from("f"))]);
}

#[test]
fn test_undeclared_variable() {
    let (_, diags) = parse_source("int main(void) { return x; }\n");
    assert_eq!(diags, vec![Diag::SemaUndeclaredIdentifier]);
}

#[test]
fn test_variable_called_as_function() {
    let (program, diags) = parse_source("int a;\nint main(void) { return a(); }\n");
    assert_eq!(diags, vec![Diag::SemaFunIsNotAFun]);
    // The node survives with a cleared cross reference.
    let program = program.unwrap();
    let Stmt::Return(retn) = &main_body(&program).stmts[0] else {
        panic!("expected a return statement");
    };
    let ExprKind::Call(call) = &retn.expr.as_ref().unwrap().kind else {
        panic!("expected a call expression");
    };
    assert_eq!(call.decl, None);
}

#[test]
fn test_function_used_as_variable() {
    let (_, diags) =
        parse_source("int f(void) { return 0; }\nint main(void) { return f + 1; }\n");
    assert_eq!(diags, vec![Diag::SemaVarIsNotAVar]);
}

#[test]
fn test_recursive_function_resolves_itself() {
    let (program, diags) = parse_source(
        "int fact(int n) { if (n <= 1) return 1; return n * fact(n - 1); }\n\
         int main(void) { return fact(5); }\n",
    );
    assert!(diags.is_empty());
    assert!(program.is_some());
}

#[test]
fn test_every_reference_points_into_scope() {
    let (program, diags) = parse_source(
        "int g;\n\
         int fact(int n) { if (n <= 1) return 1; return n * fact(n - 1); }\n\
         int main(void) { g = fact(5); return g; }\n",
    );
    assert!(diags.is_empty());
    let program = program.unwrap();

    fn check_expr(expr: &Expr) {
        match &expr.kind {
            ExprKind::Number(_) => {}
            ExprKind::Var(var) => {
                assert!(var.decl.is_some(), "unresolved var '{}'", var.name);
                if let Some(index) = &var.index {
                    check_expr(index);
                }
            }
            ExprKind::Call(call) => {
                assert!(call.decl.is_some(), "unresolved call '{}'", call.name);
                call.args.iter().for_each(check_expr);
            }
            ExprKind::Binary(binary) => {
                check_expr(&binary.lhs);
                check_expr(&binary.rhs);
            }
        }
    }
    fn check_stmt(stmt: &Stmt) {
        match stmt {
            Stmt::Null => {}
            Stmt::Expr(expr) => check_expr(expr),
            Stmt::Compound(compound) => compound.stmts.iter().for_each(check_stmt),
            Stmt::Selection(selection) => {
                check_expr(&selection.cond);
                check_stmt(&selection.then);
                if let Some(els) = &selection.els {
                    check_stmt(els);
                }
            }
            Stmt::Iteration(iteration) => {
                check_expr(&iteration.cond);
                check_stmt(&iteration.body);
            }
            Stmt::Return(retn) => {
                if let Some(expr) = &retn.expr {
                    check_expr(expr);
                }
            }
        }
    }
    for &id in &program.decls {
        if let Decl::Fun(fun) = program.pool.get(id) {
            if let Some(body) = &fun.body {
                body.stmts.iter().for_each(check_stmt);
            }
        }
    }
}

#[test]
fn test_parameter_shadows_global() {
    let (_, diags) = parse_source("int x;\nint f(int x) { return x; }\nint main(void) { return f(1); }\n");
    assert!(diags.is_empty());
}

#[test]
fn test_local_in_inner_block_does_not_escape() {
    let (_, diags) = parse_source("int main(void) { { int y; y = 1; } return y; }\n");
    assert_eq!(diags, vec![Diag::SemaUndeclaredIdentifier]);
}

#[test]
fn test_builtins_are_predeclared() {
    let (program, diags) = parse_source("int main(void) { output(input()); return 0; }\n");
    assert!(diags.is_empty());
    assert!(program.is_some());
}

#[test]
fn test_redefining_a_builtin_is_a_redefinition() {
    let (_, diags) = parse_source("int input(void) { return 1; }\nint main(void) { return 0; }\n");
    assert_eq!(diags, vec![Diag::SemaRedefinition]);
}

#[test]
fn test_number_too_big_is_clamped() {
    let (program, diags) = parse_source("int main(void) { return 2147483648; }\n");
    assert_eq!(diags, vec![Diag::ParserNumberTooBig]);
    let program = program.unwrap();
    let Stmt::Return(retn) = &main_body(&program).stmts[0] else {
        panic!("expected a return statement");
    };
    assert_eq!(retn.expr.as_ref().unwrap().number_value(), Some(i32::MAX));
}

#[test]
fn test_array_reference_types() {
    let (program, diags) = parse_source(
        "int a[10];\n\
         int sum(int v[], int n) { return v[n]; }\n\
         int main(void) { return sum(a, 3) + a[0]; }\n",
    );
    assert!(diags.is_empty());
    let program = program.unwrap();
    let Stmt::Return(retn) = &main_body(&program).stmts[0] else {
        panic!("expected a return statement");
    };
    let ExprKind::Binary(plus) = &retn.expr.as_ref().unwrap().kind else {
        panic!("expected a binary expression");
    };
    let ExprKind::Call(call) = &plus.lhs.kind else {
        panic!("expected a call");
    };
    // Unindexed array argument keeps its array type; indexed access is int.
    assert_eq!(call.args[0].ty, ExprType::IntArray);
    assert_eq!(call.args[1].ty, ExprType::Int);
    assert_eq!(plus.rhs.ty, ExprType::Int);
}
