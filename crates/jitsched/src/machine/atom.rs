use super::{MachineEntry, MachineModel};
use crate::instruction::{IssuePort, Mnemonic, OperandShape};

type Row = [Option<MachineEntry>; 6];

const INV: Option<MachineEntry> = None;

const fn p0(latency: u32) -> Option<MachineEntry> {
    Some(MachineEntry::new(IssuePort::Port0, latency))
}

const fn p1(latency: u32) -> Option<MachineEntry> {
    Some(MachineEntry::new(IssuePort::Port1, latency))
}

const fn either(latency: u32) -> Option<MachineEntry> {
    Some(MachineEntry::new(IssuePort::Either, latency))
}

const fn both(latency: u32) -> Option<MachineEntry> {
    Some(MachineEntry::new(IssuePort::Both, latency))
}

const ALU: Row = [INV, either(1), p0(1), either(1), p0(1), p0(1)];
const SSE_LOGIC: Row = [INV, INV, INV, either(1), p0(1), INV];
const SSE_ADD: Row = [INV, INV, INV, p1(5), both(5), INV];
const SSE_QWORD: Row = [INV, INV, INV, either(2), either(3), INV];
const SSE_SHIFT_QWORD: Row = [INV, either(1), INV, either(2), either(3), INV];
const SSE_SHIFT: Row = [INV, p0(1), INV, both(2), both(3), INV];
const SHIFT: Row = [INV, p0(1), p0(1), p0(1), INV, INV];
const DOUBLE_SHIFT: Row = [INV, INV, INV, both(4), both(4), both(2)];
const COMIS: Row = [INV, both(9), INV, both(9), both(10), INV];
const UNARY: Row = [INV, either(1), p0(10), INV, INV, INV];
const CMOV: Row = [INV, INV, INV, either(1), p0(1), INV];
const SHUFFLE: Row = [INV, INV, INV, p0(1), INV, INV];
const EXTRACT: Row = [INV, INV, INV, both(4), INV, INV];
const HADD_WORD: Row = [INV, INV, INV, both(7), both(8), INV];
const HADD_DWORD: Row = [INV, INV, INV, both(3), both(4), INV];
const FP_ADD: Row = [INV, INV, INV, INV, p1(5), INV];
const FP_MUL: Row = [INV, INV, INV, INV, p0(5), INV];
const FP_DIV: Row = [INV, INV, INV, INV, p0(65), INV];
const FP_COMPARE: Row = [INV, INV, INV, p1(1), INV, INV];
const FP_STORE: Row = [INV, INV, INV, INV, INV, either(1)];
const FP_STORE_INT: Row = [INV, INV, INV, INV, INV, either(6)];
const LOCKED: Row = [INV, INV, INV, INV, p0(5), p0(5)];
const DIVIDE: Row = [INV, both(57), both(57), INV, INV, INV];
const JCC: Row = [p1(1), INV, INV, INV, INV, INV];

/// Two-port in-order Atom pipeline, as documented in the Atom optimization manual.
///
/// Each mnemonic has six columns; the ten operand shapes fold onto them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomMachineModel;

impl AtomMachineModel {
    pub fn column(shape: OperandShape) -> usize {
        match shape {
            OperandShape::None | OperandShape::Imm => 0,
            OperandShape::Reg | OperandShape::ImmToReg => 1,
            OperandShape::Mem | OperandShape::ImmToMem => 2,
            OperandShape::RegToReg | OperandShape::ImmRegReg => 3,
            OperandShape::MemToReg => 4,
            OperandShape::RegToMem => 5,
        }
    }

    fn row(mnemonic: Mnemonic) -> Row {
        match mnemonic {
            Mnemonic::Jmp => [p1(1), p1(1), both(2), INV, INV, INV],
            Mnemonic::Jcc(_) => JCC,
            Mnemonic::Call => [both(1), both(1), either(2), INV, INV, INV],
            Mnemonic::Ret => [both(1), INV, INV, INV, INV, INV],
            Mnemonic::Mov
            | Mnemonic::Adc
            | Mnemonic::Add
            | Mnemonic::And
            | Mnemonic::Or
            | Mnemonic::Sbb
            | Mnemonic::Sub
            | Mnemonic::Xor
            | Mnemonic::Cmp => ALU,
            Mnemonic::Test => [INV, either(1), p0(1), either(1), INV, p0(1)],
            Mnemonic::Dec => [INV, either(1), p0(1), INV, INV, INV],
            Mnemonic::Neg | Mnemonic::Not => UNARY,
            Mnemonic::Lea => [INV, INV, INV, INV, p1(1), INV],
            Mnemonic::Push => [INV, both(1), both(2), INV, INV, INV],
            Mnemonic::Sal | Mnemonic::Sar | Mnemonic::Shr => SHIFT,
            Mnemonic::Shld | Mnemonic::Shrd => DOUBLE_SHIFT,
            Mnemonic::Xchg | Mnemonic::Cmpxchg => LOCKED,
            Mnemonic::Cdq => [INV, INV, INV, p0(1), INV, INV],
            Mnemonic::Mul => [INV, both(6), both(7), INV, INV, INV],
            Mnemonic::Imul => [INV, p0(5), p0(5), p0(5), p0(5), INV],
            Mnemonic::Div | Mnemonic::Idiv => DIVIDE,
            Mnemonic::Cmov(_) => CMOV,
            Mnemonic::Movd => [INV, INV, INV, p0(1), p0(1), p0(1)],
            Mnemonic::Movq => [INV, p0(1), p0(1), p0(1), p0(1), p0(1)],
            Mnemonic::Movsx | Mnemonic::Movzx => [INV, INV, INV, p0(1), p0(1), INV],
            Mnemonic::Movsd | Mnemonic::Movss => [INV, p0(1), INV, either(1), p0(1), p0(1)],
            Mnemonic::Movapd => [INV, INV, INV, INV, p0(1), p0(1)],
            Mnemonic::Movdqa => SSE_LOGIC,
            Mnemonic::Addsd | Mnemonic::Addss | Mnemonic::Subsd | Mnemonic::Subss => SSE_ADD,
            Mnemonic::Mulsd => [INV, INV, INV, p0(5), p0(5), INV],
            Mnemonic::Mulss => [INV, INV, INV, p0(4), p0(4), INV],
            Mnemonic::Divsd => [INV, INV, INV, both(62), both(62), INV],
            Mnemonic::Divss => [INV, INV, INV, both(34), both(34), INV],
            Mnemonic::Comisd | Mnemonic::Comiss | Mnemonic::Ucomisd | Mnemonic::Ucomiss => {
                COMIS
            }
            Mnemonic::Cvtsd2ss | Mnemonic::Cvtss2sd | Mnemonic::Cvtsi2sd => {
                [INV, INV, INV, both(7), both(8), INV]
            }
            Mnemonic::Cvtsd2si | Mnemonic::Cvttsd2si => [INV, INV, INV, both(8), both(9), INV],
            Mnemonic::Cvtss2si | Mnemonic::Cvttss2si => [INV, INV, INV, both(9), both(10), INV],
            Mnemonic::Cvtsi2ss => [INV, INV, INV, both(6), both(7), INV],
            Mnemonic::Xorpd
            | Mnemonic::Pand
            | Mnemonic::Pandn
            | Mnemonic::Por
            | Mnemonic::Pxor
            | Mnemonic::Paddb
            | Mnemonic::Paddw
            | Mnemonic::Paddd
            | Mnemonic::Psubb
            | Mnemonic::Psubw
            | Mnemonic::Psubd => SSE_LOGIC,
            Mnemonic::Paddq | Mnemonic::Psubq => SSE_QWORD,
            Mnemonic::Pmullw | Mnemonic::Pmulld => [INV, INV, INV, p0(5), p0(4), INV],
            Mnemonic::Psllq | Mnemonic::Psrlq => SSE_SHIFT_QWORD,
            Mnemonic::Psllw
            | Mnemonic::Pslld
            | Mnemonic::Psraw
            | Mnemonic::Psrad
            | Mnemonic::Psrlw
            | Mnemonic::Psrld => SSE_SHIFT,
            Mnemonic::Pmovsxbw => [INV, INV, INV, p0(3), INV, INV],
            Mnemonic::Pshufb | Mnemonic::Pshufd | Mnemonic::Pshuflw | Mnemonic::Pshufhw => {
                SHUFFLE
            }
            Mnemonic::Phaddw | Mnemonic::Phaddsw | Mnemonic::Phsubw | Mnemonic::Phsubsw => {
                HADD_WORD
            }
            Mnemonic::Phaddd | Mnemonic::Phsubd => HADD_DWORD,
            Mnemonic::Pextrb | Mnemonic::Pextrw | Mnemonic::Pextrd => EXTRACT,
            Mnemonic::Fld => [INV, INV, INV, INV, p0(1), INV],
            Mnemonic::Fild => [INV, INV, INV, INV, both(5), INV],
            Mnemonic::Fst | Mnemonic::Fstp => FP_STORE,
            Mnemonic::Fist | Mnemonic::Fistp => FP_STORE_INT,
            Mnemonic::Fadd | Mnemonic::Faddp | Mnemonic::Fsub | Mnemonic::Fsubp => FP_ADD,
            Mnemonic::Fmul | Mnemonic::Fmulp => FP_MUL,
            Mnemonic::Fdiv | Mnemonic::Fdivp | Mnemonic::Fsqrt => FP_DIV,
            Mnemonic::Fabs => [INV, INV, INV, INV, either(1), INV],
            Mnemonic::Fucom | Mnemonic::Fucomp | Mnemonic::Fucomi | Mnemonic::Fucomip => {
                FP_COMPARE
            }
            Mnemonic::Fldcw => [INV, INV, both(5), INV, both(5), INV],
            Mnemonic::Fnstcw => [INV, INV, both(5), INV, INV, both(5)],
        }
    }
}

impl MachineModel for AtomMachineModel {
    fn lookup(&self, mnemonic: Mnemonic, shape: OperandShape) -> Option<MachineEntry> {
        Self::row(mnemonic)[Self::column(shape)]
    }
}
