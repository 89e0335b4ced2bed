//! The 256-entry opcode table.
//!
//! Every byte decodes to exactly one (mnemonic, addressing mode, base cycles)
//! triple, including the undocumented opcodes the 2A03 executes. The table is
//! laid out as the usual 16x16 datasheet matrix (row = high nibble).

use std::fmt;

use crate::error::CpuError;

/// All documented and undocumented instruction mnemonics.
#[rustfmt::skip]
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRK, BVC, BVS, CLC, CLD, CLI, CLV, CMP, CPX,
    CPY, DEC, DEX, DEY, EOR, INC, INX, INY, JMP, JSR, LDA, LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA,
    PLP, ROL, ROR, RTI, RTS, SBC, SEC, SED, SEI, STA, STX, STY, TAX, TAY, TSX, TXA, TXS, TYA,
    // Undocumented
    AHX, ALR, ANC, ARR, AXS, DCP, ISC, KIL, LAS, LAX, LXA, RLA, RRA, SAX, SHX, SHY, SLO, SRE, TAS,
    XAA,
}

impl Mnemonic {
    #[rustfmt::skip]
    pub fn name(self) -> &'static str {
        use Mnemonic::*;
        match self {
            ADC => "ADC", AND => "AND", ASL => "ASL", BCC => "BCC", BCS => "BCS", BEQ => "BEQ",
            BIT => "BIT", BMI => "BMI", BNE => "BNE", BPL => "BPL", BRK => "BRK", BVC => "BVC",
            BVS => "BVS", CLC => "CLC", CLD => "CLD", CLI => "CLI", CLV => "CLV", CMP => "CMP",
            CPX => "CPX", CPY => "CPY", DEC => "DEC", DEX => "DEX", DEY => "DEY", EOR => "EOR",
            INC => "INC", INX => "INX", INY => "INY", JMP => "JMP", JSR => "JSR", LDA => "LDA",
            LDX => "LDX", LDY => "LDY", LSR => "LSR", NOP => "NOP", ORA => "ORA", PHA => "PHA",
            PHP => "PHP", PLA => "PLA", PLP => "PLP", ROL => "ROL", ROR => "ROR", RTI => "RTI",
            RTS => "RTS", SBC => "SBC", SEC => "SEC", SED => "SED", SEI => "SEI", STA => "STA",
            STX => "STX", STY => "STY", TAX => "TAX", TAY => "TAY", TSX => "TSX", TXA => "TXA",
            TXS => "TXS", TYA => "TYA", AHX => "AHX", ALR => "ALR", ANC => "ANC", ARR => "ARR",
            AXS => "AXS", DCP => "DCP", ISC => "ISC", KIL => "KIL", LAS => "LAS", LAX => "LAX",
            LXA => "LXA", RLA => "RLA", RRA => "RRA", SAX => "SAX", SHX => "SHX", SHY => "SHY",
            SLO => "SLO", SRE => "SRE", TAS => "TAS", XAA => "XAA",
        }
    }

    pub fn is_illegal(self) -> bool {
        use Mnemonic::*;
        matches!(
            self,
            AHX | ALR | ANC | ARR | AXS | DCP | ISC | KIL | LAS | LAX | LXA | RLA | RRA | SAX
                | SHX | SHY | SLO | SRE | TAS | XAA
        )
    }

    /// Read instructions that pay one extra cycle when indexing crosses a page.
    pub fn pays_page_penalty(self) -> bool {
        use Mnemonic::*;
        matches!(
            self,
            ADC | AND | CMP | EOR | LDA | LDX | LDY | ORA | SBC | LAX | LAS | NOP
        )
    }

    pub fn is_branch(self) -> bool {
        use Mnemonic::*;
        matches!(self, BCC | BCS | BEQ | BMI | BNE | BPL | BVC | BVS)
    }

    /// Instructions that work on the accumulator when given `Accumulator` mode
    /// and on memory otherwise.
    fn is_shift(self) -> bool {
        matches!(
            self,
            Mnemonic::ASL | Mnemonic::LSR | Mnemonic::ROL | Mnemonic::ROR
        )
    }

    fn is_implied_only(self) -> bool {
        use Mnemonic::*;
        matches!(
            self,
            BRK | CLC | CLD | CLI | CLV | DEX | DEY | INX | INY | KIL | PHA | PHP | PLA | PLP
                | RTI | RTS | SEC | SED | SEI | TAX | TAY | TSX | TXA | TXS | TYA
        )
    }

    fn needs_address(self) -> bool {
        use Mnemonic::*;
        matches!(
            self,
            STA | STX | STY | SAX | AHX | SHX | SHY | TAS | INC | DEC | DCP | ISC | RLA | RRA
                | SLO | SRE | JMP | JSR | BIT
        )
    }

    fn immediate_only(self) -> bool {
        use Mnemonic::*;
        matches!(self, ALR | ANC | ARR | AXS | LXA | XAA)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub fn operand_len(self) -> u8 {
        use AddressingMode::*;
        match self {
            Implied | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }

    pub fn is_indexed(self) -> bool {
        matches!(
            self,
            AddressingMode::AbsoluteX | AddressingMode::AbsoluteY | AddressingMode::IndirectY
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Cost before page-cross, branch and interrupt adjustments.
    pub cycles: u8,
}

impl Opcode {
    /// Total instruction length in bytes, opcode included.
    pub fn len(&self) -> u8 {
        1 + self.mode.operand_len()
    }

    /// Checks that the executor knows how to run this pairing.
    pub fn validate(&self, byte: u8) -> Result<(), CpuError> {
        use AddressingMode::*;
        let m = self.mnemonic;
        let ok = match self.mode {
            Implied => m.is_implied_only() || m == Mnemonic::NOP,
            Accumulator => m.is_shift(),
            Relative => m.is_branch(),
            Indirect => m == Mnemonic::JMP,
            Immediate => {
                !m.needs_address() && !m.is_shift() && !m.is_implied_only() && !m.is_branch()
            }
            ZeroPage | ZeroPageX | ZeroPageY | Absolute | AbsoluteX | AbsoluteY | IndirectX
            | IndirectY => {
                !m.is_implied_only()
                    && !m.is_branch()
                    && !m.immediate_only()
                    && !(matches!(m, Mnemonic::JMP | Mnemonic::JSR) && self.mode != Absolute)
            }
        };
        if ok {
            Ok(())
        } else {
            Err(CpuError::UnsupportedCombination {
                opcode: byte,
                mnemonic: m,
                mode: self.mode,
            })
        }
    }
}

/// Decodes an opcode byte. Total over `u8`.
#[inline]
pub fn decode(byte: u8) -> Opcode {
    OPCODES[byte as usize]
}

/// Opcode bytes outside the documented instruction set. Besides the illegal
/// mnemonics this covers every NOP other than 0xEA and the 0xEB SBC alias.
pub fn is_undocumented(byte: u8) -> bool {
    let mnemonic = decode(byte).mnemonic;
    mnemonic.is_illegal() || (mnemonic == Mnemonic::NOP && byte != 0xEA) || byte == 0xEB
}

mod short {
    use super::AddressingMode;

    pub const IMP: AddressingMode = AddressingMode::Implied;
    pub const ACC: AddressingMode = AddressingMode::Accumulator;
    pub const IMM: AddressingMode = AddressingMode::Immediate;
    pub const ZP: AddressingMode = AddressingMode::ZeroPage;
    pub const ZPX: AddressingMode = AddressingMode::ZeroPageX;
    pub const ZPY: AddressingMode = AddressingMode::ZeroPageY;
    pub const ABS: AddressingMode = AddressingMode::Absolute;
    pub const ABX: AddressingMode = AddressingMode::AbsoluteX;
    pub const ABY: AddressingMode = AddressingMode::AbsoluteY;
    pub const IND: AddressingMode = AddressingMode::Indirect;
    pub const IZX: AddressingMode = AddressingMode::IndirectX;
    pub const IZY: AddressingMode = AddressingMode::IndirectY;
    pub const REL: AddressingMode = AddressingMode::Relative;
}

macro_rules! op {
    ($mnemonic:ident, $mode:ident, $cycles:expr) => {
        Opcode {
            mnemonic: Mnemonic::$mnemonic,
            mode: short::$mode,
            cycles: $cycles,
        }
    };
}

#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    /* 0 */ op!(BRK, IMP, 7), op!(ORA, IZX, 6), op!(KIL, IMP, 2), op!(SLO, IZX, 8), op!(NOP, ZP, 3), op!(ORA, ZP, 3), op!(ASL, ZP, 5), op!(SLO, ZP, 5), op!(PHP, IMP, 3), op!(ORA, IMM, 2), op!(ASL, ACC, 2), op!(ANC, IMM, 2), op!(NOP, ABS, 4), op!(ORA, ABS, 4), op!(ASL, ABS, 6), op!(SLO, ABS, 6),
    /* 1 */ op!(BPL, REL, 2), op!(ORA, IZY, 5), op!(KIL, IMP, 2), op!(SLO, IZY, 8), op!(NOP, ZPX, 4), op!(ORA, ZPX, 4), op!(ASL, ZPX, 6), op!(SLO, ZPX, 6), op!(CLC, IMP, 2), op!(ORA, ABY, 4), op!(NOP, IMP, 2), op!(SLO, ABY, 7), op!(NOP, ABX, 4), op!(ORA, ABX, 4), op!(ASL, ABX, 7), op!(SLO, ABX, 7),
    /* 2 */ op!(JSR, ABS, 6), op!(AND, IZX, 6), op!(KIL, IMP, 2), op!(RLA, IZX, 8), op!(BIT, ZP, 3), op!(AND, ZP, 3), op!(ROL, ZP, 5), op!(RLA, ZP, 5), op!(PLP, IMP, 4), op!(AND, IMM, 2), op!(ROL, ACC, 2), op!(ANC, IMM, 2), op!(BIT, ABS, 4), op!(AND, ABS, 4), op!(ROL, ABS, 6), op!(RLA, ABS, 6),
    /* 3 */ op!(BMI, REL, 2), op!(AND, IZY, 5), op!(KIL, IMP, 2), op!(RLA, IZY, 8), op!(NOP, ZPX, 4), op!(AND, ZPX, 4), op!(ROL, ZPX, 6), op!(RLA, ZPX, 6), op!(SEC, IMP, 2), op!(AND, ABY, 4), op!(NOP, IMP, 2), op!(RLA, ABY, 7), op!(NOP, ABX, 4), op!(AND, ABX, 4), op!(ROL, ABX, 7), op!(RLA, ABX, 7),
    /* 4 */ op!(RTI, IMP, 6), op!(EOR, IZX, 6), op!(KIL, IMP, 2), op!(SRE, IZX, 8), op!(NOP, ZP, 3), op!(EOR, ZP, 3), op!(LSR, ZP, 5), op!(SRE, ZP, 5), op!(PHA, IMP, 3), op!(EOR, IMM, 2), op!(LSR, ACC, 2), op!(ALR, IMM, 2), op!(JMP, ABS, 3), op!(EOR, ABS, 4), op!(LSR, ABS, 6), op!(SRE, ABS, 6),
    /* 5 */ op!(BVC, REL, 2), op!(EOR, IZY, 5), op!(KIL, IMP, 2), op!(SRE, IZY, 8), op!(NOP, ZPX, 4), op!(EOR, ZPX, 4), op!(LSR, ZPX, 6), op!(SRE, ZPX, 6), op!(CLI, IMP, 2), op!(EOR, ABY, 4), op!(NOP, IMP, 2), op!(SRE, ABY, 7), op!(NOP, ABX, 4), op!(EOR, ABX, 4), op!(LSR, ABX, 7), op!(SRE, ABX, 7),
    /* 6 */ op!(RTS, IMP, 6), op!(ADC, IZX, 6), op!(KIL, IMP, 2), op!(RRA, IZX, 8), op!(NOP, ZP, 3), op!(ADC, ZP, 3), op!(ROR, ZP, 5), op!(RRA, ZP, 5), op!(PLA, IMP, 4), op!(ADC, IMM, 2), op!(ROR, ACC, 2), op!(ARR, IMM, 2), op!(JMP, IND, 5), op!(ADC, ABS, 4), op!(ROR, ABS, 6), op!(RRA, ABS, 6),
    /* 7 */ op!(BVS, REL, 2), op!(ADC, IZY, 5), op!(KIL, IMP, 2), op!(RRA, IZY, 8), op!(NOP, ZPX, 4), op!(ADC, ZPX, 4), op!(ROR, ZPX, 6), op!(RRA, ZPX, 6), op!(SEI, IMP, 2), op!(ADC, ABY, 4), op!(NOP, IMP, 2), op!(RRA, ABY, 7), op!(NOP, ABX, 4), op!(ADC, ABX, 4), op!(ROR, ABX, 7), op!(RRA, ABX, 7),
    /* 8 */ op!(NOP, IMM, 2), op!(STA, IZX, 6), op!(NOP, IMM, 2), op!(SAX, IZX, 6), op!(STY, ZP, 3), op!(STA, ZP, 3), op!(STX, ZP, 3), op!(SAX, ZP, 3), op!(DEY, IMP, 2), op!(NOP, IMM, 2), op!(TXA, IMP, 2), op!(XAA, IMM, 2), op!(STY, ABS, 4), op!(STA, ABS, 4), op!(STX, ABS, 4), op!(SAX, ABS, 4),
    /* 9 */ op!(BCC, REL, 2), op!(STA, IZY, 6), op!(KIL, IMP, 2), op!(AHX, IZY, 6), op!(STY, ZPX, 4), op!(STA, ZPX, 4), op!(STX, ZPY, 4), op!(SAX, ZPY, 4), op!(TYA, IMP, 2), op!(STA, ABY, 5), op!(TXS, IMP, 2), op!(TAS, ABY, 5), op!(SHY, ABX, 5), op!(STA, ABX, 5), op!(SHX, ABY, 5), op!(AHX, ABY, 5),
    /* A */ op!(LDY, IMM, 2), op!(LDA, IZX, 6), op!(LDX, IMM, 2), op!(LAX, IZX, 6), op!(LDY, ZP, 3), op!(LDA, ZP, 3), op!(LDX, ZP, 3), op!(LAX, ZP, 3), op!(TAY, IMP, 2), op!(LDA, IMM, 2), op!(TAX, IMP, 2), op!(LXA, IMM, 2), op!(LDY, ABS, 4), op!(LDA, ABS, 4), op!(LDX, ABS, 4), op!(LAX, ABS, 4),
    /* B */ op!(BCS, REL, 2), op!(LDA, IZY, 5), op!(KIL, IMP, 2), op!(LAX, IZY, 5), op!(LDY, ZPX, 4), op!(LDA, ZPX, 4), op!(LDX, ZPY, 4), op!(LAX, ZPY, 4), op!(CLV, IMP, 2), op!(LDA, ABY, 4), op!(TSX, IMP, 2), op!(LAS, ABY, 4), op!(LDY, ABX, 4), op!(LDA, ABX, 4), op!(LDX, ABY, 4), op!(LAX, ABY, 4),
    /* C */ op!(CPY, IMM, 2), op!(CMP, IZX, 6), op!(NOP, IMM, 2), op!(DCP, IZX, 8), op!(CPY, ZP, 3), op!(CMP, ZP, 3), op!(DEC, ZP, 5), op!(DCP, ZP, 5), op!(INY, IMP, 2), op!(CMP, IMM, 2), op!(DEX, IMP, 2), op!(AXS, IMM, 2), op!(CPY, ABS, 4), op!(CMP, ABS, 4), op!(DEC, ABS, 6), op!(DCP, ABS, 6),
    /* D */ op!(BNE, REL, 2), op!(CMP, IZY, 5), op!(KIL, IMP, 2), op!(DCP, IZY, 8), op!(NOP, ZPX, 4), op!(CMP, ZPX, 4), op!(DEC, ZPX, 6), op!(DCP, ZPX, 6), op!(CLD, IMP, 2), op!(CMP, ABY, 4), op!(NOP, IMP, 2), op!(DCP, ABY, 7), op!(NOP, ABX, 4), op!(CMP, ABX, 4), op!(DEC, ABX, 7), op!(DCP, ABX, 7),
    /* E */ op!(CPX, IMM, 2), op!(SBC, IZX, 6), op!(NOP, IMM, 2), op!(ISC, IZX, 8), op!(CPX, ZP, 3), op!(SBC, ZP, 3), op!(INC, ZP, 5), op!(ISC, ZP, 5), op!(INX, IMP, 2), op!(SBC, IMM, 2), op!(NOP, IMP, 2), op!(SBC, IMM, 2), op!(CPX, ABS, 4), op!(SBC, ABS, 4), op!(INC, ABS, 6), op!(ISC, ABS, 6),
    /* F */ op!(BEQ, REL, 2), op!(SBC, IZY, 5), op!(KIL, IMP, 2), op!(ISC, IZY, 8), op!(NOP, ZPX, 4), op!(SBC, ZPX, 4), op!(INC, ZPX, 6), op!(ISC, ZPX, 6), op!(SED, IMP, 2), op!(SBC, ABY, 4), op!(NOP, IMP, 2), op!(ISC, ABY, 7), op!(NOP, ABX, 4), op!(SBC, ABX, 4), op!(INC, ABX, 7), op!(ISC, ABX, 7),
];
