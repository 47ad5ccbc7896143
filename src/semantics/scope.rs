use crate::ast::{DeclId, Identifier};
use std::collections::HashMap;
use std::ops::BitOr;

/// Properties of a scope frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeFlags(u8);

impl ScopeFlags {
    /// Scope opened by a compound statement.
    pub const COMPOUND_STMT: Self = Self(1 << 0);
    /// Scope holding a function's parameters; stays active across the
    /// function body.
    pub const FUN_PARAMS: Self = Self(1 << 1);
    /// The outermost compound statement of a function.
    pub const FUN: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ScopeFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One lexical scope: a mapping from names to declarations.
#[derive(Debug, Default)]
struct ScopeFrame {
    #[allow(dead_code)]
    flags: ScopeFlags,
    symbols: HashMap<Identifier, DeclId>,
}

/// The stack of lexical scopes active during parsing.
///
/// Lookup searches inner to outer; insertion targets the innermost frame and
/// fails when the name already exists there.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flags: ScopeFlags) {
        self.frames.push(ScopeFrame {
            flags,
            symbols: HashMap::new(),
        });
    }

    pub fn pop(&mut self) {
        self.frames.pop().expect("scope stack underflow");
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Installs `name` in the innermost frame.
    ///
    /// Fails with the previous declaration when the name is already taken
    /// there; the new declaration is not installed in that case.
    pub fn insert(&mut self, name: Identifier, decl: DeclId) -> Result<(), DeclId> {
        let frame = self.frames.last_mut().expect("no active scope");
        if let Some(&existing) = frame.symbols.get(&name) {
            return Err(existing);
        }
        frame.symbols.insert(name, decl);
        Ok(())
    }

    /// Resolves `name`, innermost frame first.
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.symbols.get(name).copied())
    }
}
