mod dump;

use crate::scanner::{Category, Word};

pub use dump::dump_program;

pub type Identifier = String;

/// Stable index of a declaration inside a [DeclPool].
///
/// Cross references in expressions ([VarRef::decl], [FunCall::decl]) use
/// these indices as non-owning back edges, so the AST stays an acyclic
/// ownership tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

/// Arena owning every declaration of a program: globals, parameters and
/// locals alike.
#[derive(Debug, Default)]
pub struct DeclPool {
    decls: Vec<Decl>,
}

impl DeclPool {
    pub fn alloc(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0 as usize]
    }

    pub fn get_fun(&self, id: DeclId) -> &FunDecl {
        match self.get(id) {
            Decl::Fun(fun) => fun,
            decl => panic!("declaration {id:?} is not a function: {decl:?}"),
        }
    }

    pub fn get_fun_mut(&mut self, id: DeclId) -> &mut FunDecl {
        match self.get_mut(id) {
            Decl::Fun(fun) => fun,
            _ => panic!("declaration {id:?} is not a function"),
        }
    }
}

/// A whole translation unit: the declaration arena plus the ordered list of
/// top-level declarations.
#[derive(Debug, Default)]
pub struct Program {
    pub pool: DeclPool,
    pub decls: Vec<DeclId>,
}

impl Program {
    pub fn add_decl(&mut self, decl: DeclId) {
        self.decls.push(decl);
    }
}

/// Type of an expression or declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExprType {
    #[default]
    Int,
    Void,
    /// Only produced by unindexed references to array variables; legal as a
    /// call argument or as the base of an indexing expression.
    IntArray,
}

#[derive(Debug)]
pub enum Decl {
    Var(VarDecl),
    Parm(ParmVarDecl),
    Fun(FunDecl),
}

impl Decl {
    pub fn name(&self) -> &Identifier {
        match self {
            Decl::Var(decl) => &decl.name,
            Decl::Parm(decl) => &decl.name,
            Decl::Fun(decl) => &decl.name,
        }
    }

    pub fn is_fun(&self) -> bool {
        matches!(self, Decl::Fun(_))
    }
}

#[derive(Debug)]
pub struct VarDecl {
    pub ty: ExprType,
    pub name: Identifier,
    pub array_size: Option<u32>,
}

impl VarDecl {
    pub fn is_array(&self) -> bool {
        self.array_size.is_some()
    }
}

#[derive(Debug)]
pub struct ParmVarDecl {
    pub ty: ExprType,
    pub name: Identifier,
    pub is_array: bool,
}

/// A function declaration.
///
/// `body` is `None` for externally linked functions (the seeded `input` and
/// `output` runtime entry points).
#[derive(Debug)]
pub struct FunDecl {
    pub retn: ExprType,
    pub name: Identifier,
    pub params: Vec<DeclId>,
    pub body: Option<CompoundStmt>,
}

#[derive(Debug)]
pub enum Stmt {
    Null,
    Compound(CompoundStmt),
    Selection(SelectionStmt),
    Iteration(IterationStmt),
    Return(ReturnStmt),
    Expr(Expr),
}

#[derive(Debug)]
pub struct CompoundStmt {
    pub decls: Vec<DeclId>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug)]
pub struct SelectionStmt {
    pub cond: Expr,
    pub then: Box<Stmt>,
    pub els: Option<Box<Stmt>>,
}

#[derive(Debug)]
pub struct IterationStmt {
    pub cond: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug)]
pub struct ReturnStmt {
    pub expr: Option<Expr>,
    pub return_word: Word,
}

/// An expression together with its computed type.
#[derive(Debug)]
pub struct Expr {
    pub ty: ExprType,
    pub kind: ExprKind,
}

#[derive(Debug)]
pub enum ExprKind {
    Number(i32),
    Var(VarRef),
    Call(FunCall),
    Binary(BinaryExpr),
}

impl Expr {
    pub fn number(value: i32) -> Self {
        Self {
            ty: ExprType::Int,
            kind: ExprKind::Number(value),
        }
    }

    pub fn as_var(&self) -> Option<&VarRef> {
        match &self.kind {
            ExprKind::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn number_value(&self) -> Option<i32> {
        match self.kind {
            ExprKind::Number(value) => Some(value),
            _ => None,
        }
    }
}

/// Reference to a variable, optionally indexed.
///
/// `decl` is `None` when name resolution failed; such trees never reach
/// code generation.
#[derive(Debug)]
pub struct VarRef {
    pub decl: Option<DeclId>,
    pub name: Identifier,
    pub index: Option<Box<Expr>>,
}

#[derive(Debug)]
pub struct FunCall {
    pub decl: Option<DeclId>,
    pub name: Identifier,
    pub args: Vec<Expr>,
}

#[derive(Debug)]
pub struct BinaryExpr {
    pub op: Operation,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
}

/// Binary operations, including assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Plus,
    Minus,
    Multiply,
    Divide,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Assign,
}

impl Operation {
    /// Converts a word category into an operation.
    pub fn from_category(category: Category) -> Self {
        match category {
            Category::Plus => Self::Plus,
            Category::Minus => Self::Minus,
            Category::Multiply => Self::Multiply,
            Category::Divide => Self::Divide,
            Category::Less => Self::Less,
            Category::LessEqual => Self::LessEqual,
            Category::Greater => Self::Greater,
            Category::GreaterEqual => Self::GreaterEqual,
            Category::Equal => Self::Equal,
            Category::NotEqual => Self::NotEqual,
            Category::Assign => Self::Assign,
            _ => panic!("category {category:?} is not a binary operation"),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Assign => "=",
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
                | Self::Equal
                | Self::NotEqual
        )
    }
}
