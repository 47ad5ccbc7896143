use crate::ast::*;
use crate::diagnostics::{Diag, DiagnosticManager};
use crate::sourceman::SourceFile;

fn parse_source(text: &str) -> (Option<Program>, Vec<Diag>) {
    let source = SourceFile::new(text.to_owned());
    let diagman = DiagnosticManager::new();
    let program = crate::parse(&source, &diagman);
    (program, diagman.codes())
}

/// The expression of the single `return` statement of `main`.
fn main_return_expr(program: &Program) -> &Expr {
    let fun = program
        .decls
        .iter()
        .find_map(|&id| match program.pool.get(id) {
            Decl::Fun(fun) if fun.name == "main" => Some(fun),
            _ => None,
        })
        .expect("no main function");
    let body = fun.body.as_ref().expect("main has no body");
    let Stmt::Return(retn) = body.stmts.last().expect("main has no statements") else {
        panic!("last statement of main is not a return");
    };
    retn.expr.as_ref().expect("return carries no expression")
}

fn as_binary(expr: &Expr) -> &BinaryExpr {
    match &expr.kind {
        ExprKind::Binary(binary) => binary,
        kind => panic!("expected a binary expression, got {kind:?}"),
    }
}

#[test]
fn test_empty_program_expects_a_type() {
    let (program, diags) = parse_source("\n");
    assert!(program.is_none());
    assert_eq!(diags, vec![Diag::ParserExpectedType]);
}

#[test]
fn test_fun_vs_var_declaration_needs_third_word() {
    let (program, diags) = parse_source("int a;\nint a(void) { return 0; }\nint b[8];\n");
    // Shapes only; the redefinition of `a` is sema's business.
    assert_eq!(diags, vec![Diag::SemaRedefinition]);
    let program = program.unwrap();
    assert_eq!(program.decls.len(), 3);
    assert!(matches!(program.pool.get(program.decls[0]), Decl::Var(_)));
    assert!(matches!(program.pool.get(program.decls[1]), Decl::Fun(_)));
    let Decl::Var(b) = program.pool.get(program.decls[2]) else {
        panic!("expected a var declaration");
    };
    assert_eq!(b.array_size, Some(8));
}

#[test]
fn test_void_params_against_void_named_param() {
    let (program, diags) = parse_source(
        "int f(void) { return 0; }\n\
         int g(int x, int v[]) { return x; }\n\
         int main(void) { return f() + g(1, 0); }\n",
    );
    assert!(diags.is_empty());
    let program = program.unwrap();
    let Decl::Fun(f) = program.pool.get(program.decls[0]) else {
        panic!()
    };
    assert!(f.params.is_empty());
    let Decl::Fun(g) = program.pool.get(program.decls[1]) else {
        panic!()
    };
    assert_eq!(g.params.len(), 2);
    let Decl::Parm(v) = program.pool.get(g.params[1]) else {
        panic!("expected a parameter");
    };
    assert!(v.is_array);
}

#[test]
fn test_additive_chain_associates_left() {
    let (program, diags) = parse_source("int main(void) { return 1 - 2 - 3; }\n");
    assert!(diags.is_empty());
    let program = program.unwrap();
    let outer = as_binary(main_return_expr(&program));
    assert_eq!(outer.op, Operation::Minus);
    assert_eq!(outer.rhs.number_value(), Some(3));
    let inner = as_binary(&outer.lhs);
    assert_eq!(inner.op, Operation::Minus);
    assert_eq!(inner.lhs.number_value(), Some(1));
    assert_eq!(inner.rhs.number_value(), Some(2));
}

#[test]
fn test_term_binds_tighter_than_addition() {
    let (program, diags) = parse_source("int main(void) { return 1 + 2 * 3; }\n");
    assert!(diags.is_empty());
    let program = program.unwrap();
    let outer = as_binary(main_return_expr(&program));
    assert_eq!(outer.op, Operation::Plus);
    assert_eq!(outer.lhs.number_value(), Some(1));
    let inner = as_binary(&outer.rhs);
    assert_eq!(inner.op, Operation::Multiply);
}

#[test]
fn test_parens_override_precedence() {
    let (program, diags) = parse_source("int main(void) { return (1 + 2) * 3; }\n");
    assert!(diags.is_empty());
    let program = program.unwrap();
    let outer = as_binary(main_return_expr(&program));
    assert_eq!(outer.op, Operation::Multiply);
    let inner = as_binary(&outer.lhs);
    assert_eq!(inner.op, Operation::Plus);
}

#[test]
fn test_assignment_is_right_associative() {
    let (program, diags) = parse_source("int main(void) { int x; int y; x = y = 1; return x; }\n");
    assert!(diags.is_empty());
    let program = program.unwrap();
    let fun = program
        .decls
        .iter()
        .find_map(|&id| match program.pool.get(id) {
            Decl::Fun(fun) => Some(fun),
            _ => None,
        })
        .unwrap();
    let Stmt::Expr(expr) = &fun.body.as_ref().unwrap().stmts[0] else {
        panic!("expected an expression statement");
    };
    let outer = as_binary(expr);
    assert_eq!(outer.op, Operation::Assign);
    assert!(outer.lhs.as_var().is_some());
    let inner = as_binary(&outer.rhs);
    assert_eq!(inner.op, Operation::Assign);
    assert_eq!(inner.rhs.number_value(), Some(1));
}

#[test]
fn test_relational_operators_do_not_chain() {
    let (program, diags) = parse_source("int main(void) { return 1 < 2 < 3; }\n");
    assert!(program.is_none());
    // `1 < 2` ends the simple-expression; the second `<` cannot start a `;`.
    assert_eq!(diags, vec![Diag::ParserExpectedToken]);
}

#[test]
fn test_assignment_needs_a_var_target() {
    // `1 = 2` never derives: after `1`, `=` is not a valid continuation.
    let (program, diags) = parse_source("int main(void) { 1 = 2; return 0; }\n");
    assert!(program.is_none());
    assert_eq!(diags, vec![Diag::ParserExpectedToken]);
}

#[test]
fn test_dangling_else_attaches_to_inner_if() {
    let (program, diags) = parse_source(
        "int main(void) { if (1) if (0) return 1; else return 2; return 3; }\n",
    );
    assert!(diags.is_empty());
    let program = program.unwrap();
    let fun = program
        .decls
        .iter()
        .find_map(|&id| match program.pool.get(id) {
            Decl::Fun(fun) => Some(fun),
            _ => None,
        })
        .unwrap();
    let Stmt::Selection(outer) = &fun.body.as_ref().unwrap().stmts[0] else {
        panic!("expected a selection statement");
    };
    assert!(outer.els.is_none());
    let Stmt::Selection(inner) = outer.then.as_ref() else {
        panic!("expected a nested selection statement");
    };
    assert!(inner.els.is_some());
}

#[test]
fn test_statement_in_wrong_place_is_reported() {
    let (program, diags) = parse_source("int main(void) { + }\n");
    assert!(program.is_none());
    assert_eq!(diags, vec![Diag::ParserExpectedStatement]);
}

#[test]
fn test_canonical_dump_of_a_minimal_program() {
    let (program, diags) = parse_source("int main(void) { return 0; }\n");
    assert!(diags.is_empty());
    let expected = concat!(
        "[program \n",
        "  [fun-declaration \n",
        "    [int]\n",
        "    [main]\n",
        "    [params]\n",
        "    [compound-stmt \n",
        "      [return-stmt [0]]\n",
        "    ]\n",
        "  ]\n",
        "]",
    );
    assert_eq!(dump_program(&program.unwrap()), expected);
}

#[test]
fn test_canonical_dump_covers_every_construct() {
    let (program, diags) = parse_source(
        "int a[3];\n\
         void tick(int v[], int n) {\n\
             ;\n\
             while (0 < n) {\n\
                 v[n] = n;\n\
                 n = n - 1;\n\
             }\n\
         }\n\
         int main(void) {\n\
             tick(a, 3);\n\
             if (a[1] == 1) return 1; else return 0;\n\
         }\n",
    );
    assert!(diags.is_empty());
    let dump = dump_program(&program.unwrap());
    for needle in [
        "[var-declaration [int] [a] [3]]",
        "[param [int] [v] [\\[\\]]]",
        "[param [int] [n]]",
        "[;]",
        "[iteration-stmt ",
        "[selection-stmt ",
        "[= [var [v] [var [n]]] [var [n]]]",
        "[call",
        "[args [var [a]] [3]]",
        "[== [var [a] [1]] [1]]",
    ] {
        assert!(dump.contains(needle), "dump is missing {needle:?}:\n{dump}");
    }
}

#[test]
fn test_dump_is_stable_across_runs() {
    let text = "int x;\nint main(void) { x = 1; return x; }\n";
    let (first, _) = parse_source(text);
    let (second, _) = parse_source(text);
    assert_eq!(
        dump_program(&first.unwrap()),
        dump_program(&second.unwrap())
    );
}
