use crate::machine::MachineEntry;
use crate::resource::PhysReg;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cond {
    O,
    No,
    B,
    Ae,
    E,
    Ne,
    Be,
    A,
    S,
    Ns,
    P,
    Np,
    L,
    Ge,
    Le,
    G,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cond::O => "O",
            Cond::No => "NO",
            Cond::B => "B",
            Cond::Ae => "AE",
            Cond::E => "E",
            Cond::Ne => "NE",
            Cond::Be => "BE",
            Cond::A => "A",
            Cond::S => "S",
            Cond::Ns => "NS",
            Cond::P => "P",
            Cond::Np => "NP",
            Cond::L => "L",
            Cond::Ge => "GE",
            Cond::Le => "LE",
            Cond::G => "G",
        };
        write!(f, "{}", s)
    }
}

macro_rules! mnemonics {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Native mnemonics the backend selects.
        #[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum Mnemonic {
            $($variant,)*
            Jcc(Cond),
            Cmov(Cond),
        }

        impl fmt::Display for Mnemonic {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Mnemonic::$variant => write!(f, $name),)*
                    Mnemonic::Jcc(cond) => write!(f, "J{}", cond),
                    Mnemonic::Cmov(cond) => write!(f, "CMOV{}", cond),
                }
            }
        }
    };
}

mnemonics! {
    Jmp => "JMP",
    Call => "CALL",
    Ret => "RET",
    Mov => "MOV",
    Adc => "ADC",
    Add => "ADD",
    And => "AND",
    Or => "OR",
    Sbb => "SBB",
    Sub => "SUB",
    Xor => "XOR",
    Cmp => "CMP",
    Test => "TEST",
    Dec => "DEC",
    Neg => "NEG",
    Not => "NOT",
    Lea => "LEA",
    Push => "PUSH",
    Sal => "SAL",
    Sar => "SAR",
    Shr => "SHR",
    Shld => "SHLD",
    Shrd => "SHRD",
    Xchg => "XCHG",
    Cmpxchg => "CMPXCHG",
    Cdq => "CDQ",
    Mul => "MUL",
    Imul => "IMUL",
    Div => "DIV",
    Idiv => "IDIV",
    Movd => "MOVD",
    Movq => "MOVQ",
    Movsx => "MOVSX",
    Movzx => "MOVZX",
    Movsd => "MOVSD",
    Movss => "MOVSS",
    Movapd => "MOVAPD",
    Movdqa => "MOVDQA",
    Addsd => "ADDSD",
    Addss => "ADDSS",
    Subsd => "SUBSD",
    Subss => "SUBSS",
    Mulsd => "MULSD",
    Mulss => "MULSS",
    Divsd => "DIVSD",
    Divss => "DIVSS",
    Comisd => "COMISD",
    Comiss => "COMISS",
    Ucomisd => "UCOMISD",
    Ucomiss => "UCOMISS",
    Cvtsd2ss => "CVTSD2SS",
    Cvtsd2si => "CVTSD2SI",
    Cvttsd2si => "CVTTSD2SI",
    Cvtss2sd => "CVTSS2SD",
    Cvtss2si => "CVTSS2SI",
    Cvttss2si => "CVTTSS2SI",
    Cvtsi2sd => "CVTSI2SD",
    Cvtsi2ss => "CVTSI2SS",
    Xorpd => "XORPD",
    Pand => "PAND",
    Pandn => "PANDN",
    Por => "POR",
    Pxor => "PXOR",
    Paddb => "PADDB",
    Paddw => "PADDW",
    Paddd => "PADDD",
    Paddq => "PADDQ",
    Psubb => "PSUBB",
    Psubw => "PSUBW",
    Psubd => "PSUBD",
    Psubq => "PSUBQ",
    Pmullw => "PMULLW",
    Pmulld => "PMULLD",
    Psllw => "PSLLW",
    Pslld => "PSLLD",
    Psllq => "PSLLQ",
    Psraw => "PSRAW",
    Psrad => "PSRAD",
    Psrlw => "PSRLW",
    Psrld => "PSRLD",
    Psrlq => "PSRLQ",
    Pmovsxbw => "PMOVSXBW",
    Pshufb => "PSHUFB",
    Pshufd => "PSHUFD",
    Pshuflw => "PSHUFLW",
    Pshufhw => "PSHUFHW",
    Phaddw => "PHADDW",
    Phaddsw => "PHADDSW",
    Phaddd => "PHADDD",
    Phsubw => "PHSUBW",
    Phsubsw => "PHSUBSW",
    Phsubd => "PHSUBD",
    Pextrb => "PEXTRB",
    Pextrw => "PEXTRW",
    Pextrd => "PEXTRD",
    Fld => "FLD",
    Fild => "FILD",
    Fst => "FST",
    Fstp => "FSTP",
    Fist => "FIST",
    Fistp => "FISTP",
    Fadd => "FADD",
    Faddp => "FADDP",
    Fsub => "FSUB",
    Fsubp => "FSUBP",
    Fmul => "FMUL",
    Fmulp => "FMULP",
    Fdiv => "FDIV",
    Fdivp => "FDIVP",
    Fsqrt => "FSQRT",
    Fabs => "FABS",
    Fucom => "FUCOM",
    Fucomp => "FUCOMP",
    Fucomi => "FUCOMI",
    Fucomip => "FUCOMIP",
    Fldcw => "FLDCW",
    Fnstcw => "FNSTCW",
}

impl Mnemonic {
    /// Control transfers end a native basic block.
    pub fn is_delimiter(self) -> bool {
        matches!(
            self,
            Mnemonic::Jmp | Mnemonic::Call | Mnemonic::Ret | Mnemonic::Jcc(_)
        )
    }

    pub fn is_move(self) -> bool {
        matches!(
            self,
            Mnemonic::Mov
                | Mnemonic::Movq
                | Mnemonic::Movsd
                | Mnemonic::Movss
                | Mnemonic::Movzx
                | Mnemonic::Movsx
                | Mnemonic::Movapd
                | Mnemonic::Movdqa
                | Mnemonic::Movd
                | Mnemonic::Xchg
        )
    }

    pub fn is_compare(self) -> bool {
        matches!(
            self,
            Mnemonic::Cmp
                | Mnemonic::Test
                | Mnemonic::Comisd
                | Mnemonic::Comiss
                | Mnemonic::Ucomisd
                | Mnemonic::Ucomiss
        )
    }

    pub fn is_convert(self) -> bool {
        matches!(
            self,
            Mnemonic::Cvtsd2ss
                | Mnemonic::Cvtsd2si
                | Mnemonic::Cvttsd2si
                | Mnemonic::Cvtss2sd
                | Mnemonic::Cvtss2si
                | Mnemonic::Cvttss2si
                | Mnemonic::Cvtsi2sd
                | Mnemonic::Cvtsi2ss
        )
    }

    pub fn is_shuffle(self) -> bool {
        matches!(
            self,
            Mnemonic::Pshufb | Mnemonic::Pshufd | Mnemonic::Pshuflw | Mnemonic::Pshufhw
        )
    }

    /// Arithmetic that consumes the carry flag.
    pub fn reads_carry(self) -> bool {
        matches!(self, Mnemonic::Adc | Mnemonic::Sbb)
    }

    pub fn is_x87(self) -> bool {
        matches!(
            self,
            Mnemonic::Fld
                | Mnemonic::Fild
                | Mnemonic::Fst
                | Mnemonic::Fstp
                | Mnemonic::Fist
                | Mnemonic::Fistp
                | Mnemonic::Fadd
                | Mnemonic::Faddp
                | Mnemonic::Fsub
                | Mnemonic::Fsubp
                | Mnemonic::Fmul
                | Mnemonic::Fmulp
                | Mnemonic::Fdiv
                | Mnemonic::Fdivp
                | Mnemonic::Fsqrt
                | Mnemonic::Fabs
                | Mnemonic::Fucom
                | Mnemonic::Fucomp
                | Mnemonic::Fucomi
                | Mnemonic::Fucomip
                | Mnemonic::Fldcw
                | Mnemonic::Fnstcw
        )
    }

    /// Multiply/divide family working on the eax:edx pair.
    pub fn uses_accumulator_pair(self) -> bool {
        matches!(
            self,
            Mnemonic::Mul | Mnemonic::Imul | Mnemonic::Div | Mnemonic::Idiv | Mnemonic::Cdq
        )
    }
}

/// Where a memory operand points, as far as the backend can tell.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryClass {
    /// Home slot of a virtual register.
    VirtualReg(u32),
    /// Native spill slot.
    Spill(u32),
    #[default]
    Unknown,
    /// Constant pool; never written at runtime.
    Constants,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemOperand {
    #[serde(default)]
    pub base: Option<PhysReg>,
    #[serde(default)]
    pub index: Option<PhysReg>,
    #[serde(default)]
    pub disp: i32,
    #[serde(default)]
    pub class: MemoryClass,
}

impl MemOperand {
    pub fn unknown(base: PhysReg, disp: i32) -> Self {
        Self {
            base: Some(base),
            index: None,
            disp,
            class: MemoryClass::Unknown,
        }
    }

    pub fn virtual_reg(base: PhysReg, vr: u32) -> Self {
        Self {
            base: Some(base),
            index: None,
            disp: (vr as i32).wrapping_mul(4),
            class: MemoryClass::VirtualReg(vr),
        }
    }

    pub fn spill(base: PhysReg, slot: u32) -> Self {
        Self {
            base: Some(base),
            index: None,
            disp: (slot as i32).wrapping_neg().wrapping_sub(4),
            class: MemoryClass::Spill(slot),
        }
    }

    pub fn constant(disp: i32) -> Self {
        Self {
            base: None,
            index: None,
            disp,
            class: MemoryClass::Constants,
        }
    }

    pub fn with_index(mut self, index: PhysReg) -> Self {
        self.index = Some(index);
        self
    }
}

impl fmt::Display for MemOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            MemoryClass::VirtualReg(vr) => write!(f, "vr{}:", vr)?,
            MemoryClass::Spill(slot) => write!(f, "spill{}:", slot)?,
            MemoryClass::Constants => write!(f, "const:")?,
            MemoryClass::Unknown => {}
        }
        write!(f, "[")?;
        let mut empty = true;
        if let Some(base) = self.base {
            write!(f, "{}", base)?;
            empty = false;
        }
        if let Some(index) = self.index {
            if !empty {
                write!(f, "+")?;
            }
            write!(f, "{}", index)?;
            empty = false;
        }
        if empty {
            write!(f, "{:#x}", self.disp)?;
        } else if self.disp > 0 {
            write!(f, "+{}", self.disp)?;
        } else if self.disp < 0 {
            write!(f, "-{}", self.disp.unsigned_abs())?;
        }
        write!(f, "]")
    }
}

/// Resolved operands. Two-operand forms are named source-to-destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operands {
    #[default]
    None,
    Imm(i64),
    Reg(PhysReg),
    Mem(MemOperand),
    ImmToReg { imm: i64, dst: PhysReg },
    ImmToMem { imm: i64, dst: MemOperand },
    RegToReg { src: PhysReg, dst: PhysReg },
    MemToReg { src: MemOperand, dst: PhysReg },
    RegToMem { src: PhysReg, dst: MemOperand },
    ImmRegReg { imm: i64, src: PhysReg, dst: PhysReg },
}

impl Operands {
    pub fn shape(&self) -> OperandShape {
        match self {
            Operands::None => OperandShape::None,
            Operands::Imm(_) => OperandShape::Imm,
            Operands::Reg(_) => OperandShape::Reg,
            Operands::Mem(_) => OperandShape::Mem,
            Operands::ImmToReg { .. } => OperandShape::ImmToReg,
            Operands::ImmToMem { .. } => OperandShape::ImmToMem,
            Operands::RegToReg { .. } => OperandShape::RegToReg,
            Operands::MemToReg { .. } => OperandShape::MemToReg,
            Operands::RegToMem { .. } => OperandShape::RegToMem,
            Operands::ImmRegReg { .. } => OperandShape::ImmRegReg,
        }
    }
}

impl fmt::Display for Operands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operands::None => Ok(()),
            Operands::Imm(imm) => write!(f, " {}", imm),
            Operands::Reg(reg) => write!(f, " {}", reg),
            Operands::Mem(mem) => write!(f, " {}", mem),
            Operands::ImmToReg { imm, dst } => write!(f, " {}, {}", dst, imm),
            Operands::ImmToMem { imm, dst } => write!(f, " {}, {}", dst, imm),
            Operands::RegToReg { src, dst } => write!(f, " {}, {}", dst, src),
            Operands::MemToReg { src, dst } => write!(f, " {}, {}", dst, src),
            Operands::RegToMem { src, dst } => write!(f, " {}, {}", dst, src),
            Operands::ImmRegReg { imm, src, dst } => write!(f, " {}, {}, {}", dst, src, imm),
        }
    }
}

/// Operand-shape category used to query the machine model.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum OperandShape {
    None,
    Imm,
    Reg,
    Mem,
    ImmToReg,
    ImmToMem,
    RegToReg,
    MemToReg,
    RegToMem,
    ImmRegReg,
}

impl fmt::Display for OperandShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperandShape::None => "none",
            OperandShape::Imm => "imm",
            OperandShape::Reg => "reg",
            OperandShape::Mem => "mem",
            OperandShape::ImmToReg => "imm_to_reg",
            OperandShape::ImmToMem => "imm_to_mem",
            OperandShape::RegToReg => "reg_to_reg",
            OperandShape::MemToReg => "mem_to_reg",
            OperandShape::RegToMem => "reg_to_mem",
            OperandShape::ImmRegReg => "imm_reg_reg",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandSize {
    S8,
    S16,
    #[default]
    S32,
    S64,
    S128,
}

impl OperandSize {
    /// Wide values occupy two memory-tracking slots.
    pub fn is_wide(self) -> bool {
        self >= OperandSize::S64
    }
}

/// A fully resolved native instruction handed over by instruction selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    #[serde(default)]
    pub operands: Operands,
    #[serde(default)]
    pub size: OperandSize,
    /// Volatile loads order every later access to undisambiguated memory.
    #[serde(default)]
    pub volatile: bool,
}

impl Instruction {
    pub fn new(mnemonic: Mnemonic, operands: Operands) -> Self {
        Self {
            mnemonic,
            operands,
            size: OperandSize::default(),
            volatile: false,
        }
    }

    pub fn none(mnemonic: Mnemonic) -> Self {
        Self::new(mnemonic, Operands::None)
    }

    pub fn imm(mnemonic: Mnemonic, imm: i64) -> Self {
        Self::new(mnemonic, Operands::Imm(imm))
    }

    pub fn reg(mnemonic: Mnemonic, reg: PhysReg) -> Self {
        Self::new(mnemonic, Operands::Reg(reg))
    }

    pub fn mem(mnemonic: Mnemonic, mem: MemOperand) -> Self {
        Self::new(mnemonic, Operands::Mem(mem))
    }

    pub fn imm_to_reg(mnemonic: Mnemonic, imm: i64, dst: PhysReg) -> Self {
        Self::new(mnemonic, Operands::ImmToReg { imm, dst })
    }

    pub fn imm_to_mem(mnemonic: Mnemonic, imm: i64, dst: MemOperand) -> Self {
        Self::new(mnemonic, Operands::ImmToMem { imm, dst })
    }

    pub fn reg_to_reg(mnemonic: Mnemonic, src: PhysReg, dst: PhysReg) -> Self {
        Self::new(mnemonic, Operands::RegToReg { src, dst })
    }

    pub fn mem_to_reg(mnemonic: Mnemonic, src: MemOperand, dst: PhysReg) -> Self {
        Self::new(mnemonic, Operands::MemToReg { src, dst })
    }

    pub fn reg_to_mem(mnemonic: Mnemonic, src: PhysReg, dst: MemOperand) -> Self {
        Self::new(mnemonic, Operands::RegToMem { src, dst })
    }

    pub fn imm_reg_reg(mnemonic: Mnemonic, imm: i64, src: PhysReg, dst: PhysReg) -> Self {
        Self::new(mnemonic, Operands::ImmRegReg { imm, src, dst })
    }

    pub fn with_size(mut self, size: OperandSize) -> Self {
        self.size = size;
        self
    }

    pub fn volatile(mut self) -> Self {
        self.volatile = true;
        self
    }

    pub fn shape(&self) -> OperandShape {
        self.operands.shape()
    }

    pub fn is_delimiter(&self) -> bool {
        self.mnemonic.is_delimiter()
    }

    /// A move whose source is memory. Consumers of its result pay the load latency.
    pub fn is_memory_load(&self) -> bool {
        self.mnemonic.is_move() && matches!(self.operands, Operands::MemToReg { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.mnemonic, self.operands)
    }
}

/// Parses a block written as a JSON array of instructions.
pub fn load_block(text: &str) -> Result<Vec<Instruction>, serde_json::Error> {
    serde_json::from_str(text)
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuePort {
    Port0,
    Port1,
    Either,
    Both,
}

impl IssuePort {
    pub fn conflicts_with(self, other: IssuePort) -> bool {
        match (self, other) {
            (IssuePort::Both, _) | (_, IssuePort::Both) => true,
            (IssuePort::Port0, IssuePort::Port0) | (IssuePort::Port1, IssuePort::Port1) => true,
            _ => false,
        }
    }
}

impl fmt::Display for IssuePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssuePort::Port0 => "0",
            IssuePort::Port1 => "1",
            IssuePort::Either => "either",
            IssuePort::Both => "both",
        };
        f.pad(s)
    }
}

/// Program-order index of an instruction within the current block.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotId(pub usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Per-slot scheduling state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstRecord {
    pub slot: SlotId,
    pub inst: Instruction,
    pub port: IssuePort,
    pub latency: u32,
    pub ready_time: u32,
    pub scheduled_time: Option<u32>,
    pub longest_path: Option<u32>,
}

impl InstRecord {
    pub fn new(slot: SlotId, inst: Instruction, entry: MachineEntry) -> Self {
        Self {
            slot,
            inst,
            port: entry.port,
            latency: entry.latency,
            ready_time: 0,
            scheduled_time: None,
            longest_path: None,
        }
    }
}
