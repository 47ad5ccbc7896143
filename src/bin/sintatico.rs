//! Parse-tree dump driver: parses the input and prints the AST in the
//! canonical labeled-bracket notation.

use anyhow::{Context, Result};
use cminus::ast::dump_program;
use cminus::diagnostics::DiagnosticManager;
use cminus::sourceman::SourceFile;

use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::rc::Rc;

struct Args {
    input: PathBuf,
}

impl Args {
    fn parse() -> Self {
        let mut input = None;
        for arg in env::args().skip(1) {
            match arg.as_str() {
                "-h" | "--help" => Self::usage(),
                _ => {
                    if input.is_some() {
                        Self::usage();
                    }
                    input = Some(PathBuf::from(arg));
                }
            }
        }
        let input = input.unwrap_or_else(|| Self::usage());
        Self { input }
    }

    fn usage() -> ! {
        print!(concat!(
            "Usage: sintatico FILE\n\n",
            "Parses a C-minus source file and dumps its syntax tree in\n",
            "labeled bracket notation. Pass - to read from stdin.\n",
        ));
        exit(0)
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let input_name = args.input.display().to_string();
    let source = Rc::new(SourceFile::new(read_input(&args.input)?));

    let diagman = DiagnosticManager::new();
    {
        let source = Rc::clone(&source);
        diagman.handler(move |diag| {
            let (line, column) = source.find_line_and_column(diag.loc);
            eprintln!("{input_name}:{line}:{column}: error: {diag}");
            true
        });
    }

    let program = cminus::parse(&source, &diagman);
    match program {
        Some(program) if !diagman.has_errors() => {
            println!("{}", dump_program(&program));
            Ok(())
        }
        _ => exit(1),
    }
}
