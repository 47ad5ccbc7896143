//! Recursive descent parser for the C-minus language. A sliding window of
//! three words of lookahead is enough to make every choice predictively, so
//! parsing is linear time with no backtracking.
//!
//! The parser never builds AST nodes itself; each recognized construct is
//! handed to the matching [Semantics] action. Productions return `None` as
//! soon as an expectation fails and the failure propagates up to
//! [Parser::parse_program]; there is no recovery.

#[cfg(test)]
mod parser_tests;

use crate::ast::{CompoundStmt, DeclId, Expr, Program, Stmt};
use crate::diagnostics::{Diag, DiagParam, DiagnosticManager};
use crate::scanner::{Category, Scanner, Word};
use crate::semantics::{ScopeFlags, Semantics};

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    sema: Semantics<'a>,
    diagman: &'a DiagnosticManager,
    window: [Word; 3],
}

impl<'a> Parser<'a> {
    pub fn new(
        mut scanner: Scanner<'a>,
        sema: Semantics<'a>,
        diagman: &'a DiagnosticManager,
    ) -> Self {
        let window = [
            scanner.next_word(),
            scanner.next_word(),
            scanner.next_word(),
        ];
        Self {
            scanner,
            sema,
            diagman,
            window,
        }
    }

    fn peek_word(&self) -> &Word {
        &self.window[0]
    }

    fn lookahead(&self, n: usize) -> &Word {
        &self.window[n]
    }

    fn consume(&mut self) -> Word {
        let word = self.window[0];
        self.window[0] = self.window[1];
        self.window[1] = self.window[2];
        self.window[2] = self.scanner.next_word();
        word
    }

    fn try_consume(&mut self, categories: &[Category]) -> Option<Word> {
        if self.peek_word().is_any_of(categories) {
            Some(self.consume())
        } else {
            None
        }
    }

    fn expect_and_consume(&mut self, category: Category) -> Option<Word> {
        if self.peek_word().category == category {
            Some(self.consume())
        } else {
            self.diagman
                .report(self.peek_word().location(), Diag::ParserExpectedToken)
                .arg(DiagParam::Category(category))
                .emit();
            None
        }
    }

    // <type-specifier> ::= int | void
    fn expect_and_consume_type(&mut self) -> Option<Word> {
        let type_word = self.try_consume(&[Category::Void, Category::Int]);
        if type_word.is_none() {
            self.diagman
                .report(self.peek_word().location(), Diag::ParserExpectedType)
                .emit();
        }
        type_word
    }

    /// Runs `f` inside a freshly pushed scope frame; the frame is popped on
    /// the way out regardless of the parse outcome.
    fn with_scope<T>(&mut self, flags: ScopeFlags, f: impl FnOnce(&mut Self) -> T) -> T {
        self.sema.enter_scope(flags);
        let result = f(self);
        self.sema.leave_scope();
        result
    }

    // <program> ::= <declaration-list>
    // <declaration-list> ::= <declaration-list> <declaration> | <declaration>
    pub fn parse_program(&mut self) -> Option<Program> {
        let mut program = self.sema.act_on_program_start();
        loop {
            let decl = self.parse_declaration()?;
            self.sema.act_on_top_level_decl(&mut program, decl);
            if self.peek_word().category == Category::Eof {
                break;
            }
        }
        Some(self.sema.act_on_program_end(program))
    }

    // <declaration> ::= <var-declaration> | <fun-declaration>
    fn parse_declaration(&mut self) -> Option<DeclId> {
        // Both alternatives share the two-word `type ID` prefix, so the
        // third lookahead word settles the choice.
        if self.lookahead(2).category == Category::OpenParen {
            self.parse_fun_declaration()
        } else {
            self.parse_var_declaration()
        }
    }

    // <var-declaration> ::= <type-specifier> ID ; | <type-specifier> ID [ NUM ] ;
    fn parse_var_declaration(&mut self) -> Option<DeclId> {
        let type_word = self.expect_and_consume_type()?;
        let id = self.expect_and_consume(Category::Identifier)?;

        let mut num = None;
        if self.peek_word().category == Category::OpenBracket {
            self.consume();
            num = Some(self.parse_number()?);
            self.expect_and_consume(Category::CloseBracket)?;
        }

        self.expect_and_consume(Category::Semicolon)?;
        Some(self.sema.act_on_var_decl(&type_word, &id, num.as_ref()))
    }

    // <fun-declaration> ::= <type-specifier> ID ( <params> ) <compound-stmt>
    // <params> ::= <param-list> | void
    // <param-list> ::= <param-list> , <param> | <param>
    fn parse_fun_declaration(&mut self) -> Option<DeclId> {
        let retn = self.expect_and_consume_type()?;
        let id = self.expect_and_consume(Category::Identifier)?;
        self.expect_and_consume(Category::OpenParen)?;

        // The declaration is installed before the body is parsed, so the
        // function can call itself.
        let fun = self.sema.act_on_fun_decl_start(&retn, &id);

        // The parameter scope stays active while the body is parsed.
        self.with_scope(ScopeFlags::FUN_PARAMS, |p| {
            if p.peek_word().category == Category::Void
                && p.lookahead(1).category == Category::CloseParen
            {
                // A single `void`: no parameters.
                p.consume();
            } else {
                let param = p.parse_param()?;
                p.sema.add_param(fun, param);

                while p.peek_word().category != Category::CloseParen {
                    p.expect_and_consume(Category::Comma)?;
                    let param = p.parse_param()?;
                    p.sema.add_param(fun, param);
                }
            }

            p.expect_and_consume(Category::CloseParen)?;

            let body = p.parse_compound_stmt(ScopeFlags::COMPOUND_STMT | ScopeFlags::FUN)?;
            p.sema.set_body(fun, body);
            Some(())
        })?;

        Some(self.sema.act_on_fun_decl_end(fun))
    }

    // <param> ::= <type-specifier> ID | <type-specifier> ID [ ]
    fn parse_param(&mut self) -> Option<DeclId> {
        let type_word = self.expect_and_consume_type()?;
        let id = self.expect_and_consume(Category::Identifier)?;

        let mut is_array = false;
        if self.try_consume(&[Category::OpenBracket]).is_some() {
            is_array = true;
            self.expect_and_consume(Category::CloseBracket)?;
        }

        Some(self.sema.act_on_param_decl(&type_word, &id, is_array))
    }

    // <statement> ::= <expression-stmt> | <compound-stmt> | <selection-stmt>
    //              | <iteration-stmt> | <return-stmt>
    fn parse_statement(&mut self) -> Option<Stmt> {
        // The FIRST sets of the alternatives are disjoint.
        match self.peek_word().category {
            Category::Identifier
            | Category::Number
            | Category::OpenParen
            | Category::Semicolon => self.parse_expr_stmt(),
            Category::OpenCurly => {
                let compound = self.parse_compound_stmt(ScopeFlags::COMPOUND_STMT)?;
                Some(Stmt::Compound(compound))
            }
            Category::If => self.parse_selection_stmt(),
            Category::While => self.parse_iteration_stmt(),
            Category::Return => self.parse_return_stmt(),
            _ => {
                self.diagman
                    .report(self.peek_word().location(), Diag::ParserExpectedStatement)
                    .emit();
                None
            }
        }
    }

    // <expression-stmt> ::= <expression> ; | ;
    fn parse_expr_stmt(&mut self) -> Option<Stmt> {
        if self.try_consume(&[Category::Semicolon]).is_some() {
            return Some(self.sema.act_on_null_stmt());
        }

        let expr = self.parse_expression()?;
        self.expect_and_consume(Category::Semicolon)?;
        Some(self.sema.act_on_expr_stmt(expr))
    }

    // <compound-stmt> ::= { <local-declarations> <statement-list> }
    // <local-declarations> ::= <local-declarations> <var-declaration> | empty
    // <statement-list> ::= <statement-list> <statement> | empty
    fn parse_compound_stmt(&mut self, flags: ScopeFlags) -> Option<CompoundStmt> {
        self.expect_and_consume(Category::OpenCurly)?;

        self.with_scope(flags, |p| {
            // The first and follow sets of <local-declarations> are
            // disjoint: keep taking declarations while a type specifier
            // leads.
            let mut decls = Vec::new();
            while p.peek_word().category.is_type_specifier() {
                decls.push(p.parse_var_declaration()?);
            }

            // `}` is the only follow of <statement-list> and never starts a
            // statement.
            let mut stmts = Vec::new();
            while p.peek_word().category != Category::CloseCurly {
                stmts.push(p.parse_statement()?);
            }
            p.consume();

            Some(p.sema.act_on_compound_stmt(decls, stmts))
        })
    }

    // <selection-stmt> ::= if ( <expression> ) <statement>
    //                   | if ( <expression> ) <statement> else <statement>
    fn parse_selection_stmt(&mut self) -> Option<Stmt> {
        self.expect_and_consume(Category::If)?;
        self.expect_and_consume(Category::OpenParen)?;
        let cond = self.parse_expression()?;
        self.expect_and_consume(Category::CloseParen)?;

        let then = self.parse_statement()?;
        if self.try_consume(&[Category::Else]).is_none() {
            return Some(self.sema.act_on_selection_stmt(cond, then, None));
        }

        let els = self.parse_statement()?;
        Some(self.sema.act_on_selection_stmt(cond, then, Some(els)))
    }

    // <iteration-stmt> ::= while ( <expression> ) <statement>
    fn parse_iteration_stmt(&mut self) -> Option<Stmt> {
        self.expect_and_consume(Category::While)?;
        self.expect_and_consume(Category::OpenParen)?;
        let cond = self.parse_expression()?;
        self.expect_and_consume(Category::CloseParen)?;
        let body = self.parse_statement()?;
        Some(self.sema.act_on_iteration_stmt(cond, body))
    }

    // <return-stmt> ::= return ; | return <expression> ;
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let return_word = self.expect_and_consume(Category::Return)?;

        if self.try_consume(&[Category::Semicolon]).is_some() {
            return Some(self.sema.act_on_return_stmt(None, return_word));
        }

        let expr = self.parse_expression()?;
        self.expect_and_consume(Category::Semicolon)?;
        Some(self.sema.act_on_return_stmt(Some(expr), return_word))
    }

    // <expression> ::= <var> = <expression> | <simple-expression>
    fn parse_expression(&mut self) -> Option<Expr> {
        let expr = self.parse_simple_expression()?;

        // <simple-expression> cannot derive an assignment, but when it stops
        // at a plain <var> and the next word is `=`, the assignment
        // production is the one to take. Recursing keeps `=`
        // right-associative.
        if expr.as_var().is_some() {
            if let Some(op_word) = self.try_consume(&[Category::Assign]) {
                let rhs = self.parse_expression()?;
                return Some(self.sema.act_on_assign(expr, rhs, &op_word));
            }
        }

        Some(expr)
    }

    // <simple-expression> ::= <additive-expression> <relop> <additive-expression>
    //                       | <additive-expression>
    // <relop> ::= <= | < | > | >= | == | !=
    fn parse_simple_expression(&mut self) -> Option<Expr> {
        const RELOPS: &[Category] = &[
            Category::LessEqual,
            Category::Less,
            Category::Greater,
            Category::GreaterEqual,
            Category::Equal,
            Category::NotEqual,
        ];

        let lhs = self.parse_additive_expression()?;
        if let Some(op_word) = self.try_consume(RELOPS) {
            let rhs = self.parse_additive_expression()?;
            return Some(self.sema.act_on_binary_expr(lhs, rhs, &op_word));
        }
        Some(lhs)
    }

    // <additive-expression> ::= <additive-expression> <addop> <term> | <term>
    // <addop> ::= + | -
    fn parse_additive_expression(&mut self) -> Option<Expr> {
        // The left recursion is derived iteratively, which also associates
        // the operators to the left.
        let mut lhs = self.parse_term()?;
        while let Some(op_word) = self.try_consume(&[Category::Plus, Category::Minus]) {
            let rhs = self.parse_term()?;
            lhs = self.sema.act_on_binary_expr(lhs, rhs, &op_word);
        }
        Some(lhs)
    }

    // <term> ::= <term> <mulop> <factor> | <factor>
    // <mulop> ::= * | /
    fn parse_term(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_factor()?;
        while let Some(op_word) = self.try_consume(&[Category::Multiply, Category::Divide]) {
            let rhs = self.parse_factor()?;
            lhs = self.sema.act_on_binary_expr(lhs, rhs, &op_word);
        }
        Some(lhs)
    }

    // <factor> ::= ( <expression> ) | <var> | <call> | NUM
    fn parse_factor(&mut self) -> Option<Expr> {
        match self.peek_word().category {
            Category::Number => self.parse_number(),
            Category::OpenParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect_and_consume(Category::CloseParen)?;
                Some(expr)
            }
            Category::Identifier => {
                // <var> and <call> both lead with an atomic ID; one extra
                // lookahead word tells them apart.
                if self.lookahead(1).category == Category::OpenParen {
                    self.parse_call()
                } else {
                    self.parse_var()
                }
            }
            _ => {
                self.diagman
                    .report(self.peek_word().location(), Diag::ParserExpectedExpression)
                    .emit();
                None
            }
        }
    }

    // NUM
    fn parse_number(&mut self) -> Option<Expr> {
        let word = self.expect_and_consume(Category::Number)?;
        Some(self.sema.act_on_number(&word))
    }

    // <var> ::= ID | ID [ <expression> ]
    fn parse_var(&mut self) -> Option<Expr> {
        let id = self.expect_and_consume(Category::Identifier)?;

        let mut index = None;
        if self.peek_word().category == Category::OpenBracket {
            self.consume();
            index = Some(self.parse_expression()?);
            self.expect_and_consume(Category::CloseBracket)?;
        }

        Some(self.sema.act_on_var(&id, index))
    }

    // <call> ::= ID ( <args> )
    // <args> ::= <arg-list> | empty
    // <arg-list> ::= <arg-list> , <expression> | <expression>
    fn parse_call(&mut self) -> Option<Expr> {
        let id = self.expect_and_consume(Category::Identifier)?;
        self.expect_and_consume(Category::OpenParen)?;

        let mut args = Vec::new();
        if self.peek_word().category != Category::CloseParen {
            args.push(self.parse_expression()?);
        }
        while self.peek_word().category != Category::CloseParen {
            self.expect_and_consume(Category::Comma)?;
            args.push(self.parse_expression()?);
        }

        let rparen = self.expect_and_consume(Category::CloseParen)?;
        Some(self.sema.act_on_call(&id, args, rparen.location()))
    }
}
