mod scope;
#[cfg(test)]
mod sema_tests;

use crate::ast::*;
use crate::diagnostics::{Diag, DiagParam, DiagnosticManager};
use crate::scanner::{Category, Word};
use crate::sourceman::{SourceFile, SourceLocation};

pub use scope::{ScopeFlags, ScopeStack};

/// The semantic analyzer performs name resolution, context checks and AST
/// building. It is driven by actions called from within the parser and never
/// fails to return a node: misuse is reported through the diagnostic manager
/// and the offending node carries a `None` cross reference.
pub struct Semantics<'a> {
    source: &'a SourceFile,
    diagman: &'a DiagnosticManager,
    scopes: ScopeStack,
    pool: DeclPool,
}

impl<'a> Semantics<'a> {
    pub fn new(source: &'a SourceFile, diagman: &'a DiagnosticManager) -> Self {
        Self {
            source,
            diagman,
            scopes: ScopeStack::new(),
            pool: DeclPool::default(),
        }
    }

    fn name_of(&self, word: &Word) -> Identifier {
        self.source.lexeme(word.lexeme).to_owned()
    }

    pub fn enter_scope(&mut self, flags: ScopeFlags) {
        self.scopes.push(flags);
    }

    pub fn leave_scope(&mut self) {
        self.scopes.pop();
    }

    /// Opens the global scope and seeds the externally linked runtime
    /// entry points `int input(void)` and `void output(int x)`.
    pub fn act_on_program_start(&mut self) -> Program {
        self.scopes.push(ScopeFlags::default());

        let input = self.pool.alloc(Decl::Fun(FunDecl {
            retn: ExprType::Int,
            name: Identifier::from("input"),
            params: Vec::new(),
            body: None,
        }));
        self.install(Identifier::from("input"), input, None);

        let parm = self.pool.alloc(Decl::Parm(ParmVarDecl {
            ty: ExprType::Int,
            name: Identifier::from("x"),
            is_array: false,
        }));
        let output = self.pool.alloc(Decl::Fun(FunDecl {
            retn: ExprType::Void,
            name: Identifier::from("output"),
            params: vec![parm],
            body: None,
        }));
        self.install(Identifier::from("output"), output, None);

        Program::default()
    }

    /// Closes the global scope and hands the declaration pool over to the
    /// finished program; the symbol table does not outlive parsing.
    pub fn act_on_program_end(&mut self, mut program: Program) -> Program {
        self.scopes.pop();
        debug_assert_eq!(self.scopes.depth(), 0);
        program.pool = std::mem::take(&mut self.pool);
        program
    }

    pub fn act_on_top_level_decl(&mut self, program: &mut Program, decl: DeclId) {
        program.add_decl(decl);
    }

    /// Installs `decl` into the innermost scope, diagnosing redefinition.
    fn install(&mut self, name: Identifier, decl: DeclId, loc: Option<SourceLocation>) {
        if self.scopes.insert(name.clone(), decl).is_err() {
            if let Some(loc) = loc {
                self.diagman
                    .report(loc, Diag::SemaRedefinition)
                    .arg(DiagParam::Symbol(name))
                    .emit();
            }
        }
    }

    fn decl_type(type_word: &Word) -> ExprType {
        match type_word.category {
            Category::Int => ExprType::Int,
            Category::Void => ExprType::Void,
            category => panic!("not a type specifier: {category:?}"),
        }
    }

    pub fn act_on_var_decl(
        &mut self,
        type_word: &Word,
        name_word: &Word,
        array_size: Option<&Expr>,
    ) -> DeclId {
        debug_assert_eq!(name_word.category, Category::Identifier);
        let ty = Self::decl_type(type_word);
        let name = self.name_of(name_word);

        if ty == ExprType::Void {
            self.diagman
                .report(name_word.location(), Diag::SemaVarCannotBeVoid)
                .range(name_word.lexeme)
                .emit();
        }

        let array_size = array_size.and_then(Expr::number_value).map(|v| v as u32);
        let decl = self.pool.alloc(Decl::Var(VarDecl {
            ty,
            name: name.clone(),
            array_size,
        }));
        self.install(name, decl, Some(name_word.location()));
        decl
    }

    pub fn act_on_param_decl(&mut self, type_word: &Word, name_word: &Word, is_array: bool) -> DeclId {
        debug_assert_eq!(name_word.category, Category::Identifier);
        let ty = Self::decl_type(type_word);
        let name = self.name_of(name_word);

        if ty == ExprType::Void {
            self.diagman
                .report(name_word.location(), Diag::SemaVarCannotBeVoid)
                .range(name_word.lexeme)
                .emit();
        }

        let decl = self.pool.alloc(Decl::Parm(ParmVarDecl {
            ty,
            name: name.clone(),
            is_array,
        }));
        self.install(name, decl, Some(name_word.location()));
        decl
    }

    /// Creates the function shell and installs it into the enclosing scope
    /// right away, so the body can refer to the function recursively.
    pub fn act_on_fun_decl_start(&mut self, retn_word: &Word, name_word: &Word) -> DeclId {
        debug_assert_eq!(name_word.category, Category::Identifier);
        let retn = Self::decl_type(retn_word);
        let name = self.name_of(name_word);

        let decl = self.pool.alloc(Decl::Fun(FunDecl {
            retn,
            name: name.clone(),
            params: Vec::new(),
            body: None,
        }));
        self.install(name, decl, Some(name_word.location()));
        decl
    }

    pub fn add_param(&mut self, fun: DeclId, param: DeclId) {
        self.pool.get_fun_mut(fun).params.push(param);
    }

    pub fn set_body(&mut self, fun: DeclId, body: CompoundStmt) {
        self.pool.get_fun_mut(fun).body = Some(body);
    }

    pub fn act_on_fun_decl_end(&mut self, fun: DeclId) -> DeclId {
        fun
    }

    pub fn act_on_compound_stmt(&mut self, decls: Vec<DeclId>, stmts: Vec<Stmt>) -> CompoundStmt {
        CompoundStmt { decls, stmts }
    }

    pub fn act_on_null_stmt(&mut self) -> Stmt {
        Stmt::Null
    }

    pub fn act_on_expr_stmt(&mut self, expr: Expr) -> Stmt {
        Stmt::Expr(expr)
    }

    pub fn act_on_selection_stmt(&mut self, cond: Expr, then: Stmt, els: Option<Stmt>) -> Stmt {
        Stmt::Selection(SelectionStmt {
            cond,
            then: Box::new(then),
            els: els.map(Box::new),
        })
    }

    pub fn act_on_iteration_stmt(&mut self, cond: Expr, body: Stmt) -> Stmt {
        Stmt::Iteration(IterationStmt {
            cond,
            body: Box::new(body),
        })
    }

    pub fn act_on_return_stmt(&mut self, expr: Option<Expr>, return_word: Word) -> Stmt {
        Stmt::Return(ReturnStmt { expr, return_word })
    }

    /// Parses a decimal number word; values beyond the signed 32-bit range
    /// are diagnosed and clamped.
    pub fn act_on_number(&mut self, word: &Word) -> Expr {
        debug_assert_eq!(word.category, Category::Number);
        let lexeme = self.source.lexeme(word.lexeme);
        let value = match lexeme.parse::<i32>() {
            Ok(value) => value,
            Err(_) => {
                self.diagman
                    .report(word.location(), Diag::ParserNumberTooBig)
                    .range(word.lexeme)
                    .emit();
                i32::MAX
            }
        };
        Expr::number(value)
    }

    pub fn act_on_var(&mut self, name_word: &Word, index: Option<Expr>) -> Expr {
        let name = self.name_of(name_word);
        let decl = match self.scopes.lookup(&name) {
            None => {
                self.diagman
                    .report(name_word.location(), Diag::SemaUndeclaredIdentifier)
                    .arg(DiagParam::Symbol(name.clone()))
                    .range(name_word.lexeme)
                    .emit();
                None
            }
            Some(id) if self.pool.get(id).is_fun() => {
                self.diagman
                    .report(name_word.location(), Diag::SemaVarIsNotAVar)
                    .range(name_word.lexeme)
                    .emit();
                None
            }
            Some(id) => Some(id),
        };

        let is_array = decl.is_some_and(|id| match self.pool.get(id) {
            Decl::Var(var) => var.is_array(),
            Decl::Parm(parm) => parm.is_array,
            Decl::Fun(_) => false,
        });
        let ty = if index.is_none() && is_array {
            ExprType::IntArray
        } else {
            ExprType::Int
        };

        Expr {
            ty,
            kind: ExprKind::Var(VarRef {
                decl,
                name,
                index: index.map(Box::new),
            }),
        }
    }

    pub fn act_on_call(
        &mut self,
        name_word: &Word,
        args: Vec<Expr>,
        _rparen_loc: SourceLocation,
    ) -> Expr {
        let name = self.name_of(name_word);
        let (decl, ty) = match self.scopes.lookup(&name) {
            None => {
                self.diagman
                    .report(name_word.location(), Diag::SemaUndeclaredIdentifier)
                    .arg(DiagParam::Symbol(name.clone()))
                    .range(name_word.lexeme)
                    .emit();
                (None, ExprType::Int)
            }
            Some(id) if !self.pool.get(id).is_fun() => {
                self.diagman
                    .report(name_word.location(), Diag::SemaFunIsNotAFun)
                    .range(name_word.lexeme)
                    .emit();
                (None, ExprType::Int)
            }
            Some(id) => (Some(id), self.pool.get_fun(id).retn),
        };

        Expr {
            ty,
            kind: ExprKind::Call(FunCall { decl, name, args }),
        }
    }

    pub fn act_on_assign(&mut self, lhs: Expr, rhs: Expr, op_word: &Word) -> Expr {
        debug_assert!(lhs.as_var().is_some(), "assignment target must be a var");
        debug_assert_eq!(op_word.category, Category::Assign);
        Expr {
            ty: ExprType::Int,
            kind: ExprKind::Binary(BinaryExpr {
                op: Operation::Assign,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
        }
    }

    pub fn act_on_binary_expr(&mut self, lhs: Expr, rhs: Expr, op_word: &Word) -> Expr {
        Expr {
            ty: ExprType::Int,
            kind: ExprKind::Binary(BinaryExpr {
                op: Operation::from_category(op_word.category),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
        }
    }
}
