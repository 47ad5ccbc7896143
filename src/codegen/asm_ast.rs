pub type Identifier = String;

/// A compiled translation unit: the `.data` items for global variables and
/// one block of instructions per defined function.
#[derive(Debug, Default)]
pub struct AsmAst {
    pub data: Vec<AsmDataItem>,
    pub functions: Vec<AsmFunction>,
}

/// Storage for one global variable, in words.
#[derive(Debug)]
pub struct AsmDataItem {
    pub label: Identifier,
    pub words: u32,
}

#[derive(Debug)]
pub struct AsmFunction {
    pub label: Identifier,
    pub body: AsmInstructions,
}

pub type AsmInstructions = Vec<Instruction>;

/// The MIPS working set of the generator.
///
/// `$v0` is the accumulator, `$t0` the reload register for two-operand
/// sequences; `$a0`-`$a3` carry call arguments per O32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Zero,
    V0,
    A0,
    A1,
    A2,
    A3,
    T0,
    Sp,
    Fp,
    Ra,
}

impl Register {
    /// The O32 argument register for position `k`.
    pub fn arg(k: usize) -> Self {
        match k {
            0 => Self::A0,
            1 => Self::A1,
            2 => Self::A2,
            3 => Self::A3,
            _ => panic!("argument {k} is passed on the stack, not in a register"),
        }
    }
}

/// Memory operand of a load or store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// `offset($sp)`; every frame slot is addressed off the stack pointer.
    Frame(i32),
    /// `offset($reg)` through a computed address.
    Indirect(Register, i32),
    /// A `.data` label.
    Global(Identifier),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Label(Identifier),
    Li(Register, i32),
    La(Register, Identifier),
    Lw(Register, Address),
    Sw(Register, Address),
    Addiu(Register, Register, i32),
    Addu(Register, Register, Register),
    Subu(Register, Register, Register),
    Mult(Register, Register),
    Div(Register, Register),
    Mflo(Register),
    Slt(Register, Register, Register),
    Sltu(Register, Register, Register),
    Sltiu(Register, Register, i32),
    Xor(Register, Register, Register),
    Xori(Register, Register, i32),
    Sll(Register, Register, u32),
    Beq(Register, Register, Identifier),
    J(Identifier),
    Jal(Identifier),
    Jr(Register),
}

impl Instruction {
    pub fn is_label(&self) -> bool {
        matches!(self, Self::Label(_))
    }
}
