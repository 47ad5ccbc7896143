//! MIPS O32 code generation.
//!
//! The generator walks each function's AST once, after the frame allocator
//! pre-pass has fixed the layout. Expression evaluation is strictly stack
//! based: every expression leaves its value (or, on the l-value path, its
//! address) in `$v0`, and partial results are spilled to the frame's temp
//! area rather than held in registers. Only `$v0`, `$t0` and the `$a*`
//! argument registers are ever written between the prologue and epilogue.
//!
//! Code generation assumes a resolved, error-free AST; an unresolved cross
//! reference here is a compiler bug and panics.

mod asm_ast;
mod frame;

pub use asm_ast::*;
pub use frame::{allocate_frame, expr_temp_depth, FrameInfo, FrameLayout, O32_ARG_AREA, WORD};

use crate::ast::{
    self, BinaryExpr, CompoundStmt, Decl, DeclId, DeclPool, Expr, ExprKind, FunCall, Operation,
    Program, Stmt, VarRef,
};

use Register::{Sp, T0, V0, Zero};

/// Where a resolved variable lives.
enum Storage {
    Global(Identifier),
    Local(i32),
    Param(i32),
}

/// Lowers a whole program. The caller must ensure no diagnostics were
/// emitted; this walk does not expect unresolved references.
pub fn codegen(program: &Program) -> AsmAst {
    let mut asm = AsmAst::default();
    let mut labels = LabelAllocator::default();

    for &id in &program.decls {
        match program.pool.get(id) {
            Decl::Var(var) => asm.data.push(AsmDataItem {
                label: var.name.clone(),
                words: var.array_size.unwrap_or(1),
            }),
            Decl::Fun(_) => {
                let function = FunCodegen::run(&program.pool, id, &mut labels);
                asm.functions.push(function);
            }
            Decl::Parm(parm) => unreachable!("parameter {} at top level", parm.name),
        }
    }

    asm
}

/// Label names are globally unique: one monotonic counter for the whole
/// translation unit. User identifiers contain no digits, so `L<n>` cannot
/// collide with them.
#[derive(Default)]
struct LabelAllocator {
    count: u32,
}

impl LabelAllocator {
    fn fresh(&mut self) -> Identifier {
        let label = format!("L{}", self.count);
        self.count += 1;
        label
    }
}

/// The label a call to `decl` jumps to. Defined functions get a `fun_`
/// prefix; body-less externs (the runtime's `input`/`output`) are called by
/// their plain name and resolved by the host assembler.
fn callee_label(pool: &DeclPool, decl: DeclId) -> Identifier {
    let fun = pool.get_fun(decl);
    if fun.body.is_some() {
        format!("fun_{}", fun.name)
    } else {
        fun.name.clone()
    }
}

struct FunCodegen<'a> {
    pool: &'a DeclPool,
    labels: &'a mut LabelAllocator,
    layout: FrameLayout,
    epilogue: Identifier,
    temp_pos: u32,
    body: AsmInstructions,
}

impl<'a> FunCodegen<'a> {
    fn run(pool: &'a DeclPool, id: DeclId, labels: &'a mut LabelAllocator) -> AsmFunction {
        let fun = pool.get_fun(id);
        let layout = allocate_frame(pool, fun);
        let epilogue = labels.fresh();

        let mut gen = Self {
            pool,
            labels,
            layout,
            epilogue,
            temp_pos: 0,
            body: AsmInstructions::new(),
        };

        gen.gen_prologue(fun);
        gen.gen_compound(fun.body.as_ref().expect("extern function in codegen"));
        gen.gen_epilogue();

        AsmFunction {
            label: format!("fun_{}", fun.name),
            body: gen.body,
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.body.push(instruction);
    }

    fn total_size(&self) -> i32 {
        self.layout.info.total_size() as i32
    }

    fn gen_prologue(&mut self, fun: &ast::FunDecl) {
        let total = self.total_size();
        self.emit(Instruction::Addiu(Sp, Sp, -total));
        self.emit(Instruction::Sw(
            Register::Ra,
            Address::Frame(self.layout.info.saved_offset(0)),
        ));
        self.emit(Instruction::Sw(
            Register::Fp,
            Address::Frame(self.layout.info.saved_offset(WORD)),
        ));
        self.emit(Instruction::Addiu(Register::Fp, Sp, total));

        // Spill the incoming arguments into the input area so parameter
        // access is uniform. The first four arrive in registers, the rest
        // sit in the caller's argument build area just above the frame.
        for (k, &param) in fun.params.iter().enumerate() {
            let slot = self.layout.slots[&param];
            if k < 4 {
                self.emit(Instruction::Sw(Register::arg(k), Address::Frame(slot)));
            } else {
                let incoming = total + (WORD as usize * k) as i32;
                self.emit(Instruction::Lw(V0, Address::Frame(incoming)));
                self.emit(Instruction::Sw(V0, Address::Frame(slot)));
            }
        }
    }

    fn gen_epilogue(&mut self) {
        let total = self.total_size();
        self.emit(Instruction::Label(self.epilogue.clone()));
        self.emit(Instruction::Lw(
            Register::Ra,
            Address::Frame(self.layout.info.saved_offset(0)),
        ));
        self.emit(Instruction::Lw(
            Register::Fp,
            Address::Frame(self.layout.info.saved_offset(WORD)),
        ));
        self.emit(Instruction::Addiu(Sp, Sp, total));
        self.emit(Instruction::Jr(Register::Ra));
    }

    fn alloc_temp(&mut self) -> i32 {
        let offset = self.layout.info.temp_offset(WORD * self.temp_pos);
        self.temp_pos += 1;
        offset
    }

    fn free_temp(&mut self) {
        debug_assert!(self.temp_pos > 0);
        self.temp_pos -= 1;
    }

    fn storage_of(&self, decl: DeclId) -> Storage {
        if let Some(&offset) = self.layout.slots.get(&decl) {
            match self.pool.get(decl) {
                Decl::Parm(_) => Storage::Param(offset),
                Decl::Var(_) => Storage::Local(offset),
                Decl::Fun(_) => unreachable!("function in a frame slot"),
            }
        } else {
            match self.pool.get(decl) {
                Decl::Var(var) => Storage::Global(var.name.clone()),
                decl => unreachable!("no storage for {decl:?}"),
            }
        }
    }

    fn is_array_decl(&self, decl: DeclId) -> bool {
        match self.pool.get(decl) {
            Decl::Var(var) => var.is_array(),
            Decl::Parm(parm) => parm.is_array,
            Decl::Fun(_) => false,
        }
    }

    // ----- statements -----

    fn gen_compound(&mut self, compound: &CompoundStmt) {
        for stmt in &compound.stmts {
            self.gen_stmt(stmt);
        }
    }

    fn gen_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Null => {}
            Stmt::Expr(expr) => self.gen_expr(expr),
            Stmt::Compound(compound) => self.gen_compound(compound),
            Stmt::Selection(selection) => self.gen_selection(selection),
            Stmt::Iteration(iteration) => self.gen_iteration(iteration),
            Stmt::Return(retn) => {
                if let Some(expr) = &retn.expr {
                    self.gen_expr(expr);
                }
                self.emit(Instruction::J(self.epilogue.clone()));
            }
        }
    }

    fn gen_selection(&mut self, selection: &ast::SelectionStmt) {
        self.gen_expr(&selection.cond);
        match &selection.els {
            None => {
                let end = self.labels.fresh();
                self.emit(Instruction::Beq(V0, Zero, end.clone()));
                self.gen_stmt(&selection.then);
                self.emit(Instruction::Label(end));
            }
            Some(els) => {
                let else_label = self.labels.fresh();
                let end = self.labels.fresh();
                self.emit(Instruction::Beq(V0, Zero, else_label.clone()));
                self.gen_stmt(&selection.then);
                self.emit(Instruction::J(end.clone()));
                self.emit(Instruction::Label(else_label));
                self.gen_stmt(els);
                self.emit(Instruction::Label(end));
            }
        }
    }

    fn gen_iteration(&mut self, iteration: &ast::IterationStmt) {
        let top = self.labels.fresh();
        let end = self.labels.fresh();
        self.emit(Instruction::Label(top.clone()));
        self.gen_expr(&iteration.cond);
        self.emit(Instruction::Beq(V0, Zero, end.clone()));
        self.gen_stmt(&iteration.body);
        self.emit(Instruction::J(top));
        self.emit(Instruction::Label(end));
    }

    // ----- expressions -----

    /// Evaluates `expr` into `$v0`.
    fn gen_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Number(value) => self.emit(Instruction::Li(V0, *value)),
            ExprKind::Var(var) => self.gen_var_load(var),
            ExprKind::Call(call) => self.gen_call(call),
            ExprKind::Binary(binary) if binary.op == Operation::Assign => self.gen_assign(binary),
            ExprKind::Binary(binary) => self.gen_binary(binary),
        }
    }

    fn resolved(var: &VarRef) -> DeclId {
        var.decl
            .unwrap_or_else(|| panic!("unresolved reference to '{}' in codegen", var.name))
    }

    fn gen_var_load(&mut self, var: &VarRef) {
        let decl = Self::resolved(var);
        if var.index.is_some() {
            self.gen_element_address(var);
            self.emit(Instruction::Lw(V0, Address::Indirect(V0, 0)));
            return;
        }

        match self.storage_of(decl) {
            // An unindexed local array decays to its address; it only
            // occurs as a call argument.
            Storage::Local(offset) if self.is_array_decl(decl) => {
                self.emit(Instruction::Addiu(V0, Sp, offset));
            }
            Storage::Local(offset) => self.emit(Instruction::Lw(V0, Address::Frame(offset))),
            // An array parameter's slot already holds a pointer, so scalar
            // and array parameters load alike.
            Storage::Param(offset) => self.emit(Instruction::Lw(V0, Address::Frame(offset))),
            Storage::Global(label) if self.is_array_decl(decl) => {
                self.emit(Instruction::La(V0, label));
            }
            Storage::Global(label) => self.emit(Instruction::Lw(V0, Address::Global(label))),
        }
    }

    /// Leaves the address of `var[index]` in `$v0`.
    fn gen_element_address(&mut self, var: &VarRef) {
        let decl = Self::resolved(var);
        let index = var.index.as_ref().expect("indexed access without index");

        self.gen_expr(index);
        self.emit(Instruction::Sll(V0, V0, 2));
        match self.storage_of(decl) {
            Storage::Local(offset) => {
                self.emit(Instruction::Addu(V0, V0, Sp));
                self.emit(Instruction::Addiu(V0, V0, offset));
            }
            Storage::Param(offset) => {
                self.emit(Instruction::Lw(T0, Address::Frame(offset)));
                self.emit(Instruction::Addu(V0, V0, T0));
            }
            Storage::Global(label) => {
                self.emit(Instruction::La(T0, label));
                self.emit(Instruction::Addu(V0, V0, T0));
            }
        }
    }

    /// Leaves the address of the assignment target in `$v0`.
    fn gen_addr(&mut self, var: &VarRef) {
        if var.index.is_some() {
            self.gen_element_address(var);
            return;
        }

        let decl = Self::resolved(var);
        match self.storage_of(decl) {
            Storage::Local(offset) | Storage::Param(offset) => {
                self.emit(Instruction::Addiu(V0, Sp, offset));
            }
            Storage::Global(label) => self.emit(Instruction::La(V0, label)),
        }
    }

    fn gen_assign(&mut self, binary: &BinaryExpr) {
        let target = binary
            .lhs
            .as_var()
            .expect("assignment target must be a var reference");

        self.gen_addr(target);
        let slot = self.alloc_temp();
        self.emit(Instruction::Sw(V0, Address::Frame(slot)));

        self.gen_expr(&binary.rhs);
        self.emit(Instruction::Lw(T0, Address::Frame(slot)));
        self.free_temp();

        // The assigned value stays in $v0 as the expression's result.
        self.emit(Instruction::Sw(V0, Address::Indirect(T0, 0)));
    }

    fn gen_binary(&mut self, binary: &BinaryExpr) {
        self.gen_expr(&binary.lhs);
        let slot = self.alloc_temp();
        self.emit(Instruction::Sw(V0, Address::Frame(slot)));

        self.gen_expr(&binary.rhs);
        self.emit(Instruction::Lw(T0, Address::Frame(slot)));
        self.free_temp();

        // Left operand in $t0, right operand in $v0.
        match binary.op {
            Operation::Plus => self.emit(Instruction::Addu(V0, T0, V0)),
            Operation::Minus => self.emit(Instruction::Subu(V0, T0, V0)),
            Operation::Multiply => {
                self.emit(Instruction::Mult(T0, V0));
                self.emit(Instruction::Mflo(V0));
            }
            Operation::Divide => {
                self.emit(Instruction::Div(T0, V0));
                self.emit(Instruction::Mflo(V0));
            }
            Operation::Less => self.emit(Instruction::Slt(V0, T0, V0)),
            Operation::Greater => self.emit(Instruction::Slt(V0, V0, T0)),
            Operation::LessEqual => {
                self.emit(Instruction::Slt(V0, V0, T0));
                self.emit(Instruction::Xori(V0, V0, 1));
            }
            Operation::GreaterEqual => {
                self.emit(Instruction::Slt(V0, T0, V0));
                self.emit(Instruction::Xori(V0, V0, 1));
            }
            Operation::Equal => {
                self.emit(Instruction::Xor(V0, T0, V0));
                self.emit(Instruction::Sltiu(V0, V0, 1));
            }
            Operation::NotEqual => {
                self.emit(Instruction::Xor(V0, T0, V0));
                self.emit(Instruction::Sltu(V0, Zero, V0));
            }
            Operation::Assign => unreachable!("assignment has its own path"),
        }
    }

    fn gen_call(&mut self, call: &FunCall) {
        let decl = call
            .decl
            .unwrap_or_else(|| panic!("unresolved call to '{}' in codegen", call.name));
        let label = callee_label(self.pool, decl);

        // Evaluate every argument first, parking the values in temp slots; a
        // nested call in a later argument would otherwise clobber the output
        // slots already filled.
        let mut parked = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            self.gen_expr(arg);
            let slot = self.alloc_temp();
            self.emit(Instruction::Sw(V0, Address::Frame(slot)));
            parked.push(slot);
        }

        // Move them into the O32 argument build area, the first four also
        // into the argument registers.
        for (k, &slot) in parked.iter().enumerate() {
            let out = self.layout.info.output_offset(WORD * k as u32);
            self.emit(Instruction::Lw(V0, Address::Frame(slot)));
            self.emit(Instruction::Sw(V0, Address::Frame(out)));
        }
        for k in 0..call.args.len().min(4) {
            let out = self.layout.info.output_offset(WORD * k as u32);
            self.emit(Instruction::Lw(Register::arg(k), Address::Frame(out)));
        }
        for _ in &parked {
            self.free_temp();
        }

        // The result is already in $v0.
        self.emit(Instruction::Jal(label));
    }
}
