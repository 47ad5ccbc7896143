//! Word-stream dump driver: scans the input and prints one classified word
//! per line as `<class> <lexeme>`.

use anyhow::{Context, Result};
use cminus::diagnostics::DiagnosticManager;
use cminus::scanner::{Category, Scanner};
use cminus::sourceman::SourceFile;

use std::env;
use std::fmt::Write as _;
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
            "Usage: lexico FILE\n\n",
            "Dumps the word stream of a C-minus source file, one word per\n",
            "line. Pass - to read from stdin.\n",
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
        let input_name = input_name.clone();
        diagman.handler(move |diag| {
            let (line, column) = source.find_line_and_column(diag.loc);
            eprintln!("{input_name}:{line}:{column}: error: {diag}");
            true
        });
    }

    let mut scanner = Scanner::new(&source, &diagman);
    let mut out = String::new();
    loop {
        let word = scanner.next_word();
        if word.category == Category::Eof {
            break;
        }
        let _ = writeln!(
            out,
            "{} {}",
            word.category.class_name(),
            source.lexeme(word.lexeme)
        );
    }

    if diagman.has_errors() {
        exit(1);
    }
    print!("{out}");
    Ok(())
}
