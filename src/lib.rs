/*!
A compiler for C-minus, a small C-like teaching language with `int`/`void`
types, one-dimensional arrays, functions, `if`/`while`/`return` and the usual
arithmetic and relational operators. The backend emits MIPS assembly that
follows the O32 calling convention, so compiled functions interoperate with
foreign O32 code (in particular the externally linked `input` and `output`
runtime entry points).

## Pipeline

1. **Scanning** - [Scanner](scanner::Scanner) turns the character stream into
   a stream of classified [Words](scanner::Word). Bad input is reported and
   skipped; the scanner never fails.
2. **Parsing** - [Parser](parser::Parser) derives the grammar with three
   words of lookahead and drives the [Semantics](semantics::Semantics)
   actions, which resolve names against a lexical scope stack and build the
   [ast]. Any expectation failure propagates up and no AST is produced.
3. **Frame allocation** - [allocate_frame](codegen::allocate_frame) computes
   each function's stack areas (output/temp/saved/local/input) and the slot
   of every parameter and local.
4. **Codegen** - [codegen](codegen::codegen) walks the AST and produces a
   MIPS [AsmAst](codegen::AsmAst); [emission] renders it through [Display].

User errors of every phase flow through the
[DiagnosticManager](diagnostics::DiagnosticManager) and never abort the
process; code generation is skipped when any were reported.

[Display]: std::fmt::Display
*/

#![deny(unused_must_use)]
#![warn(clippy::pedantic)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod emission;
pub mod parser;
pub mod scanner;
pub mod semantics;
pub mod sourceman;

use diagnostics::DiagnosticManager;
use parser::Parser;
use scanner::Scanner;
use semantics::Semantics;
use sourceman::SourceFile;

use thiserror::Error;

/// Failure of a whole compilation.
///
/// Individual problems are reported through the diagnostic manager as they
/// are found; this only says the source did not compile.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compilation failed with {count} error(s)")]
    ErrorsReported { count: usize },
}

/// Parses `source`, reporting diagnostics to `diagman`.
///
/// Returns `None` when any production failed; sema-level misuse leaves the
/// tree intact, so the program may come back `Some` with diagnostics
/// pending on the manager.
pub fn parse(source: &SourceFile, diagman: &DiagnosticManager) -> Option<ast::Program> {
    let scanner = Scanner::new(source, diagman);
    let sema = Semantics::new(source, diagman);
    let mut parser = Parser::new(scanner, sema, diagman);
    parser.parse_program()
}

/// Runs the full pipeline on `source` and returns the assembly text.
pub fn compile(source: &SourceFile, diagman: &DiagnosticManager) -> Result<String, CompileError> {
    match parse(source, diagman) {
        Some(program) if !diagman.has_errors() => Ok(codegen::codegen(&program).to_string()),
        _ => Err(CompileError::ErrorsReported {
            count: diagman.error_count().max(1),
        }),
    }
}
