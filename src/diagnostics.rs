use crate::ast::Identifier;
use crate::scanner::Category;
use crate::sourceman::{SourceLocation, SourceRange};

use std::cell::RefCell;
use std::fmt;

/// Every diagnostic the compiler can produce.
///
/// The enum is closed on purpose: drivers and tests match on kinds, never on
/// rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diag {
    LexerBadNumber,
    LexerBadChar,
    LexerUnclosedComment,

    /// Expects a [Category] argument.
    ParserExpectedToken,
    ParserExpectedType,
    ParserExpectedExpression,
    ParserExpectedStatement,
    ParserNumberTooBig,

    /// Expects a symbol-name argument.
    SemaRedefinition,
    /// Expects a symbol-name argument.
    SemaUndeclaredIdentifier,
    SemaFunIsNotAFun,
    SemaVarIsNotAVar,
    SemaVarCannotBeVoid,
}

/// Argument attached to a diagnostic for message formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagParam {
    Category(Category),
    Symbol(Identifier),
}

/// A single reported diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub loc: SourceLocation,
    pub code: Diag,
    pub args: Vec<DiagParam>,
    pub ranges: Vec<SourceRange>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = || match self.args.first() {
            Some(DiagParam::Symbol(name)) => name.as_str(),
            _ => "?",
        };
        match self.code {
            Diag::LexerBadNumber => write!(f, "malformed number"),
            Diag::LexerBadChar => write!(f, "unexpected character"),
            Diag::LexerUnclosedComment => write!(f, "unterminated comment"),
            Diag::ParserExpectedToken => match self.args.first() {
                Some(DiagParam::Category(category)) => write!(f, "expected {category}"),
                _ => write!(f, "expected token"),
            },
            Diag::ParserExpectedType => write!(f, "expected type specifier"),
            Diag::ParserExpectedExpression => write!(f, "expected expression"),
            Diag::ParserExpectedStatement => write!(f, "expected statement"),
            Diag::ParserNumberTooBig => write!(f, "number does not fit in 32 bits"),
            Diag::SemaRedefinition => write!(f, "redefinition of '{}'", symbol()),
            Diag::SemaUndeclaredIdentifier => write!(f, "use of undeclared identifier '{}'", symbol()),
            Diag::SemaFunIsNotAFun => write!(f, "called object is not a function"),
            Diag::SemaVarIsNotAVar => write!(f, "referenced name is a function, not a variable"),
            Diag::SemaVarCannotBeVoid => write!(f, "variable declared with void type"),
        }
    }
}

/// Handler invoked for each emitted diagnostic.
///
/// Returning `true` lets the previously installed handler run as well.
pub type DiagnosticHandler = Box<dyn FnMut(&Diagnostic) -> bool>;

/// Collects diagnostics and dispatches them to a replaceable handler chain.
///
/// The manager is shared by reference between the scanner, the semantic
/// analyzer and the parser, hence the interior mutability.
#[derive(Default)]
pub struct DiagnosticManager {
    inner: RefCell<ManagerInner>,
}

#[derive(Default)]
struct ManagerInner {
    handlers: Vec<DiagnosticHandler>,
    history: Vec<Diagnostic>,
}

impl DiagnosticManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the diagnostic handler.
    ///
    /// The previous handler stays in the chain and runs after the new one
    /// whenever the new one returns `true`.
    pub fn handler(&self, handler: impl FnMut(&Diagnostic) -> bool + 'static) {
        self.inner.borrow_mut().handlers.push(Box::new(handler));
    }

    /// Starts building a diagnostic report; finish it with
    /// [DiagnosticBuilder::emit].
    pub fn report(&self, loc: SourceLocation, code: Diag) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            manager: self,
            diag: Diagnostic {
                loc,
                code,
                args: Vec::new(),
                ranges: Vec::new(),
            },
        }
    }

    pub fn error_count(&self) -> usize {
        self.inner.borrow().history.len()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() != 0
    }

    /// The emitted diagnostics, in emission order.
    pub fn history(&self) -> Vec<Diagnostic> {
        self.inner.borrow().history.clone()
    }

    /// The emitted diagnostic kinds, in emission order.
    pub fn codes(&self) -> Vec<Diag> {
        self.inner.borrow().history.iter().map(|d| d.code).collect()
    }

    fn emit(&self, diag: Diagnostic) {
        let mut handlers = std::mem::take(&mut self.inner.borrow_mut().handlers);
        for handler in handlers.iter_mut().rev() {
            if !handler(&diag) {
                break;
            }
        }
        let mut inner = self.inner.borrow_mut();
        // A handler may itself have installed another handler; keep both.
        handlers.append(&mut inner.handlers);
        inner.handlers = handlers;
        inner.history.push(diag);
    }
}

/// Chain-builds a [Diagnostic]; consumed by the terminal [emit](Self::emit).
#[must_use = "a diagnostic builder does nothing until .emit() is called"]
pub struct DiagnosticBuilder<'a> {
    manager: &'a DiagnosticManager,
    diag: Diagnostic,
}

impl DiagnosticBuilder<'_> {
    /// Appends an argument for message formatting.
    pub fn arg(mut self, arg: DiagParam) -> Self {
        self.diag.args.push(arg);
        self
    }

    /// Appends a source range to be highlighted.
    pub fn range(mut self, range: SourceRange) -> Self {
        self.diag.ranges.push(range);
        self
    }

    pub fn emit(self) {
        self.manager.emit(self.diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_history_records_emission_order() {
        let diagman = DiagnosticManager::new();
        diagman.report(SourceLocation(0), Diag::LexerBadChar).emit();
        diagman
            .report(SourceLocation(3), Diag::SemaRedefinition)
            .arg(DiagParam::Symbol(String::from("a")))
            .emit();
        assert_eq!(diagman.codes(), vec![Diag::LexerBadChar, Diag::SemaRedefinition]);
        assert!(diagman.has_errors());
    }

    #[test]
    fn test_handler_chain_stops_on_false() {
        let diagman = DiagnosticManager::new();
        let old_calls = Rc::new(Cell::new(0));
        let old = Rc::clone(&old_calls);
        diagman.handler(move |_| {
            old.set(old.get() + 1);
            true
        });
        diagman.handler(|_| false);
        diagman.report(SourceLocation(0), Diag::LexerBadChar).emit();
        assert_eq!(old_calls.get(), 0);
        assert_eq!(diagman.error_count(), 1);
    }
}
