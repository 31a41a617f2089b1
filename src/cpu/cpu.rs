//! 6502 execution engine, stepped one cycle at a time.
//!
//! Each call to [`CPU::step`] advances one CPU cycle. At an instruction
//! boundary the next unit of work is chosen (OAM DMA, then NMI, then the
//! opcode at PC), executed in full, and its cycle cost is burned down over the
//! following calls. Descriptors come from the table in
//! [`instructions`](crate::cpu::instructions).

use crate::{
    bus::Bus,
    cpu::flags::{
        FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW,
        FLAG_UNUSED, FLAG_ZERO,
    },
    cpu::instructions::{self, Mnemonic, Mode},
};

/// Where an instruction's operand lives after address resolution.
#[derive(Clone, Copy)]
enum Operand {
    None,
    Accumulator,
    Address { addr: u16, page_crossed: bool },
}

pub struct CPU<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    /// Total cycles since power-on.
    pub cycles: u64,
    /// Cycles left to burn for the in-flight instruction; 0 = at a boundary.
    pub wait: u16,
    pub bus: B,
}

impl<B: Bus> CPU<B> {
    pub fn new(bus: B) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: FLAG_INTERRUPT_DISABLE | FLAG_BREAK | FLAG_UNUSED,
            cycles: 0,
            wait: 0,
            bus,
        }
    }

    /// Apply the documented cold-boot state: P=$34, SP=$FD, PC from $FFFC/$FFFD.
    pub fn power_on(&mut self) {
        let lo = self.bus.read(0xFFFC) as u16;
        let hi = self.bus.read(0xFFFD) as u16;
        self.pc = (hi << 8) | lo;

        self.sp = 0xFD;
        self.status = FLAG_INTERRUPT_DISABLE | FLAG_BREAK | FLAG_UNUSED;
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.cycles = 0;
        self.wait = 0;
    }

    /// Advance one CPU cycle. Work happens up front: the first cycle of an
    /// instruction executes it completely, the rest just count down.
    pub fn step(&mut self) {
        if self.wait == 0 {
            self.wait = self.dispatch();
        }
        self.wait -= 1;
        self.cycles += 1;
    }

    /// Step until the current instruction (or pseudo-instruction) retires.
    pub fn step_instruction(&mut self) {
        self.step();
        while self.wait > 0 {
            self.step();
        }
    }

    /// Pick the next unit of work at an instruction boundary. DMA outranks
    /// NMI; a pending NMI stays latched in the bus and fires at the next
    /// boundary.
    fn dispatch(&mut self) -> u16 {
        if let Some(page) = self.bus.poll_dma() {
            return self.oam_dma(page);
        }
        if self.bus.poll_nmi() {
            return self.nmi();
        }
        self.execute_next()
    }

    fn fetch_byte(&mut self) -> u8 {
        let byte = self.bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte() as u16;
        let hi = self.fetch_byte() as u16;
        (hi << 8) | lo
    }

    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.bus.read(addr) as u16;
        let hi = self.bus.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Fetch, decode, and execute the opcode at PC. Returns the full cycle
    /// cost including page-cross and branch extras.
    fn execute_next(&mut self) -> u16 {
        let pc = self.pc;
        let opcode = self.fetch_byte();
        let inst = match instructions::lookup(opcode) {
            Some(inst) => inst,
            None => panic!(
                "undocumented opcode ${:02X} at ${:04X} (cycle {})",
                opcode, pc, self.cycles
            ),
        };

        let operand = self.resolve(inst.mode);
        let page_extra = match operand {
            Operand::Address { page_crossed: true, .. } if inst.page_cycle => 1,
            _ => 0,
        };
        let op_extra = self.execute(inst.mnemonic, operand);
        inst.cycles + page_extra + op_extra
    }

    /// Resolve the effective address for an addressing mode. Reads only
    /// pointer bytes, never the operand itself, so memory-mapped registers see
    /// exactly one access per load.
    fn resolve(&mut self, mode: Mode) -> Operand {
        match mode {
            Mode::Implied => Operand::None,
            Mode::Accumulator => Operand::Accumulator,
            Mode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                Operand::Address { addr, page_crossed: false }
            }
            Mode::Relative => {
                let offset = self.fetch_byte() as i8;
                // i8 -> u16 sign-extends; wrapping_add gives the signed displacement
                let addr = self.pc.wrapping_add(offset as u16);
                Operand::Address { addr, page_crossed: false }
            }
            Mode::ZeroPage => {
                let addr = self.fetch_byte() as u16;
                Operand::Address { addr, page_crossed: false }
            }
            Mode::ZeroPageX => {
                let addr = self.fetch_byte().wrapping_add(self.x) as u16;
                Operand::Address { addr, page_crossed: false }
            }
            Mode::ZeroPageY => {
                let addr = self.fetch_byte().wrapping_add(self.y) as u16;
                Operand::Address { addr, page_crossed: false }
            }
            Mode::Absolute => {
                let addr = self.fetch_word();
                Operand::Address { addr, page_crossed: false }
            }
            Mode::AbsoluteX => {
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.x as u16);
                Operand::Address { addr, page_crossed: (base ^ addr) & 0xFF00 != 0 }
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.y as u16);
                Operand::Address { addr, page_crossed: (base ^ addr) & 0xFF00 != 0 }
            }
            Mode::Indirect => {
                // JMP ($xxFF) reads the high byte from $xx00: the pointer's
                // low byte wraps within its page, as on the real chip.
                let ptr = self.fetch_word();
                let lo = self.bus.read(ptr) as u16;
                let hi_ptr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
                let hi = self.bus.read(hi_ptr) as u16;
                Operand::Address { addr: (hi << 8) | lo, page_crossed: false }
            }
            Mode::IndirectX => {
                let zp = self.fetch_byte().wrapping_add(self.x);
                let lo = self.bus.read(zp as u16) as u16;
                let hi = self.bus.read(zp.wrapping_add(1) as u16) as u16;
                Operand::Address { addr: (hi << 8) | lo, page_crossed: false }
            }
            Mode::IndirectY => {
                let zp = self.fetch_byte();
                let lo = self.bus.read(zp as u16) as u16;
                let hi = self.bus.read(zp.wrapping_add(1) as u16) as u16;
                let base = (hi << 8) | lo;
                let addr = base.wrapping_add(self.y as u16);
                Operand::Address { addr, page_crossed: (base ^ addr) & 0xFF00 != 0 }
            }
        }
    }

    /// Execute one operation. Returns extra cycles beyond the descriptor's
    /// base cost (only branches produce any).
    fn execute(&mut self, mnemonic: Mnemonic, operand: Operand) -> u16 {
        match mnemonic {
            Mnemonic::Adc => {
                let v = self.read_operand(operand);
                self.adc(v);
            }
            Mnemonic::Sbc => {
                let v = self.read_operand(operand);
                self.adc(v ^ 0xFF);
            }
            Mnemonic::And => {
                self.a &= self.read_operand(operand);
                self.set_zn(self.a);
            }
            Mnemonic::Ora => {
                self.a |= self.read_operand(operand);
                self.set_zn(self.a);
            }
            Mnemonic::Eor => {
                self.a ^= self.read_operand(operand);
                self.set_zn(self.a);
            }
            Mnemonic::Asl => self.asl(operand),
            Mnemonic::Lsr => self.lsr(operand),
            Mnemonic::Rol => self.rol(operand),
            Mnemonic::Ror => self.ror(operand),
            Mnemonic::Bit => {
                let v = self.read_operand(operand);
                self.set_flag(FLAG_ZERO, self.a & v == 0);
                self.set_flag(FLAG_NEGATIVE, v & 0x80 != 0);
                self.set_flag(FLAG_OVERFLOW, v & 0x40 != 0);
            }
            Mnemonic::Bcc => return self.branch(operand, self.status & FLAG_CARRY == 0),
            Mnemonic::Bcs => return self.branch(operand, self.status & FLAG_CARRY != 0),
            Mnemonic::Bne => return self.branch(operand, self.status & FLAG_ZERO == 0),
            Mnemonic::Beq => return self.branch(operand, self.status & FLAG_ZERO != 0),
            Mnemonic::Bpl => return self.branch(operand, self.status & FLAG_NEGATIVE == 0),
            Mnemonic::Bmi => return self.branch(operand, self.status & FLAG_NEGATIVE != 0),
            Mnemonic::Bvc => return self.branch(operand, self.status & FLAG_OVERFLOW == 0),
            Mnemonic::Bvs => return self.branch(operand, self.status & FLAG_OVERFLOW != 0),
            Mnemonic::Brk => self.brk(),
            Mnemonic::Clc => self.set_flag(FLAG_CARRY, false),
            Mnemonic::Cld => self.set_flag(FLAG_DECIMAL, false),
            Mnemonic::Cli => self.set_flag(FLAG_INTERRUPT_DISABLE, false),
            Mnemonic::Clv => self.set_flag(FLAG_OVERFLOW, false),
            Mnemonic::Sec => self.set_flag(FLAG_CARRY, true),
            Mnemonic::Sed => self.set_flag(FLAG_DECIMAL, true),
            Mnemonic::Sei => self.set_flag(FLAG_INTERRUPT_DISABLE, true),
            Mnemonic::Cmp => {
                let v = self.read_operand(operand);
                self.compare(self.a, v);
            }
            Mnemonic::Cpx => {
                let v = self.read_operand(operand);
                self.compare(self.x, v);
            }
            Mnemonic::Cpy => {
                let v = self.read_operand(operand);
                self.compare(self.y, v);
            }
            Mnemonic::Dec => {
                let v = self.read_operand(operand).wrapping_sub(1);
                self.write_operand(operand, v);
                self.set_zn(v);
            }
            Mnemonic::Inc => {
                let v = self.read_operand(operand).wrapping_add(1);
                self.write_operand(operand, v);
                self.set_zn(v);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
            }
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
            }
            Mnemonic::Jmp => self.pc = self.operand_addr(operand),
            Mnemonic::Jsr => {
                let addr = self.operand_addr(operand);
                self.push_word(self.pc.wrapping_sub(1));
                self.pc = addr;
            }
            Mnemonic::Rts => self.pc = self.pull_word().wrapping_add(1),
            Mnemonic::Rti => {
                let status = self.pull_byte();
                self.status = (status & !FLAG_BREAK) | FLAG_UNUSED;
                self.pc = self.pull_word();
            }
            Mnemonic::Lda => {
                self.a = self.read_operand(operand);
                self.set_zn(self.a);
            }
            Mnemonic::Ldx => {
                self.x = self.read_operand(operand);
                self.set_zn(self.x);
            }
            Mnemonic::Ldy => {
                self.y = self.read_operand(operand);
                self.set_zn(self.y);
            }
            Mnemonic::Sta => {
                let addr = self.operand_addr(operand);
                self.bus.write(addr, self.a);
            }
            Mnemonic::Stx => {
                let addr = self.operand_addr(operand);
                self.bus.write(addr, self.x);
            }
            Mnemonic::Sty => {
                let addr = self.operand_addr(operand);
                self.bus.write(addr, self.y);
            }
            Mnemonic::Pha => self.push_byte(self.a),
            Mnemonic::Php => self.push_byte(self.status | FLAG_BREAK | FLAG_UNUSED),
            Mnemonic::Pla => {
                self.a = self.pull_byte();
                self.set_zn(self.a);
            }
            Mnemonic::Plp => {
                let status = self.pull_byte();
                self.status = (status & !FLAG_BREAK) | FLAG_UNUSED;
            }
            Mnemonic::Tax => {
                self.x = self.a;
                self.set_zn(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.set_zn(self.y);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.set_zn(self.a);
            }
            Mnemonic::Txs => self.sp = self.x, // no flags
            Mnemonic::Tya => {
                self.a = self.y;
                self.set_zn(self.a);
            }
            Mnemonic::Nop => {}
            Mnemonic::Nmi | Mnemonic::Dma => {
                unreachable!("pseudo-instructions are dispatched outside the opcode table")
            }
        }
        0
    }

    fn read_operand(&mut self, operand: Operand) -> u8 {
        match operand {
            Operand::Accumulator => self.a,
            Operand::Address { addr, .. } => self.bus.read(addr),
            Operand::None => unreachable!("operation requires an operand"),
        }
    }

    fn write_operand(&mut self, operand: Operand, data: u8) {
        match operand {
            Operand::Accumulator => self.a = data,
            Operand::Address { addr, .. } => self.bus.write(addr, data),
            Operand::None => unreachable!("operation requires an operand"),
        }
    }

    fn operand_addr(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Address { addr, .. } => addr,
            _ => unreachable!("operation requires an address"),
        }
    }

    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    fn set_zn(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }

    fn adc(&mut self, value: u8) {
        let carry = (self.status & FLAG_CARRY) as u16;
        let sum = self.a as u16 + value as u16 + carry;
        let result = sum as u8;
        self.set_flag(FLAG_CARRY, sum > 0xFF);
        // Overflow: operands agree in sign, result disagrees
        self.set_flag(FLAG_OVERFLOW, (self.a ^ result) & (value ^ result) & 0x80 != 0);
        self.a = result;
        self.set_zn(self.a);
    }

    fn compare(&mut self, reg: u8, value: u8) {
        let result = reg.wrapping_sub(value);
        self.set_flag(FLAG_CARRY, reg >= value);
        self.set_zn(result);
    }

    fn asl(&mut self, operand: Operand) {
        let v = self.read_operand(operand);
        self.set_flag(FLAG_CARRY, v & 0x80 != 0);
        let result = v << 1;
        self.write_operand(operand, result);
        self.set_zn(result);
    }

    fn lsr(&mut self, operand: Operand) {
        let v = self.read_operand(operand);
        self.set_flag(FLAG_CARRY, v & 0x01 != 0);
        let result = v >> 1;
        self.write_operand(operand, result);
        self.set_zn(result);
    }

    fn rol(&mut self, operand: Operand) {
        let v = self.read_operand(operand);
        let carry_in = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, v & 0x80 != 0);
        let result = (v << 1) | carry_in;
        self.write_operand(operand, result);
        self.set_zn(result);
    }

    fn ror(&mut self, operand: Operand) {
        let v = self.read_operand(operand);
        let carry_in = (self.status & FLAG_CARRY) << 7;
        self.set_flag(FLAG_CARRY, v & 0x01 != 0);
        let result = (v >> 1) | carry_in;
        self.write_operand(operand, result);
        self.set_zn(result);
    }

    /// Branch to the resolved target when `taken`. Not-taken costs nothing
    /// extra; taken adds 1, or 2 when the target is on another page than the
    /// instruction that follows the branch.
    fn branch(&mut self, operand: Operand, taken: bool) -> u16 {
        if !taken {
            return 0;
        }
        let target = self.operand_addr(operand);
        let crossed = (self.pc ^ target) & 0xFF00 != 0;
        self.pc = target;
        if crossed { 2 } else { 1 }
    }

    fn brk(&mut self) {
        // BRK pushes the address past its padding byte, with B set in the frame
        let ret = self.pc.wrapping_add(1);
        self.push_word(ret);
        self.push_byte(self.status | FLAG_BREAK | FLAG_UNUSED);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read_word(0xFFFE);
    }

    /// Interrupt entry at a boundary: push PC and P (B clear), set I, load the
    /// $FFFA vector. Fixed 7-cycle cost from the pseudo-instruction descriptor.
    fn nmi(&mut self) -> u16 {
        log::trace!("NMI taken at ${:04X} (cycle {})", self.pc, self.cycles);
        self.push_word(self.pc);
        self.push_byte((self.status | FLAG_UNUSED) & !FLAG_BREAK);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read_word(0xFFFA);
        instructions::NMI.cycles
    }

    /// OAM DMA: copy 256 bytes from `page << 8` into sprite memory through
    /// the ordinary bus read path, then stall for the fixed 513-cycle cost.
    fn oam_dma(&mut self, page: u8) -> u16 {
        let base = (page as u16) << 8;
        for i in 0..256u16 {
            let data = self.bus.read(base | i);
            self.bus.push_oam(data);
        }
        instructions::OAM_DMA.cycles
    }

    /// Stack lives in page 1; SP wraps within it by design.
    fn push_byte(&mut self, data: u8) {
        self.bus.write(0x0100 | self.sp as u16, data);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull_byte(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.bus.read(0x0100 | self.sp as u16)
    }

    fn push_word(&mut self, data: u16) {
        self.push_byte((data >> 8) as u8);
        self.push_byte(data as u8);
    }

    fn pull_word(&mut self) -> u16 {
        let lo = self.pull_byte() as u16;
        let hi = self.pull_byte() as u16;
        (hi << 8) | lo
    }
}
