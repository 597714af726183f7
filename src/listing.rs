//! A machine for the viewer to look at.
//!
//! `ListingMachine` walks a loaded program one instruction word per step. It
//! follows jumps and mirrors immediate register and timer loads, so the
//! listing and register panels track the program's straight-line behaviour.
//! `CLS` and `DRW` are applied to the display page so the screen panel shows
//! what the program draws; nothing else is executed. Timers count down once
//! per step.

use crate::error::MachineError;
use crate::machine::{DisassemblyLine, DisassemblyWindow, Machine, Snapshot};
use crate::memory::{Chip8MemoryMap, MemoryMap};

const DISPLAY_WIDTH: usize = 64;
const DISPLAY_HEIGHT: usize = 32;

pub struct ListingMachine {
    memory: Chip8MemoryMap,
    program_end: Option<u16>,
    program_counter: u16,
    index_register: u16,
    variable_registers: [u8; 16],
    delay_timer: u8,
    sound_timer: u8,
    keypad: [bool; 16],
}

impl ListingMachine {
    pub fn new() -> Self {
        let memory = Chip8MemoryMap::new();
        ListingMachine {
            program_counter: memory.program_addr,
            memory,
            program_end: None,
            index_register: 0,
            variable_registers: [0; 16],
            delay_timer: 0,
            sound_timer: 0,
            keypad: [false; 16],
        }
    }

    pub fn keypad(&self) -> [bool; 16] {
        self.keypad
    }

    /// xor an n-row sprite from I onto the display page at (Vx, Vy), wrapping
    /// at the edges; VF is set on collision
    fn draw_sprite(&mut self, x: usize, y: usize, rows: usize) {
        let left = self.variable_registers[x] as usize;
        let top = self.variable_registers[y] as usize;
        let size = self.memory.size();
        let sprite: Vec<u8> = (0..rows)
            .map(|row| {
                let addr = (self.index_register as usize + row) % size;
                self.memory.get_ro_slice(addr as u16, 1)[0]
            })
            .collect();

        let display = self.memory.display_mut();
        let mut collision = false;
        for (row, bits) in sprite.iter().enumerate() {
            for bit in 0..8 {
                if bits & (0x80 >> bit) == 0 {
                    continue;
                }
                let count = ((top + row) % DISPLAY_HEIGHT) * DISPLAY_WIDTH
                    + (left + bit) % DISPLAY_WIDTH;
                let mask = 0x80 >> (count % 8);
                collision |= display[count / 8] & mask != 0;
                display[count / 8] ^= mask;
            }
        }
        self.variable_registers[0xf] = collision as u8;
    }

    /// locations of every instruction word in the window, clipped to memory
    fn window_locations(&self, window: DisassemblyWindow) -> impl Iterator<Item = u16> {
        let pc = self.program_counter as usize;
        let start = pc.saturating_sub(window.before as usize * 2);
        let last_word = self.memory.size() - 2;
        let end = (pc + window.after as usize * 2).min(last_word);
        (start..=end).step_by(2).map(|location| location as u16)
    }
}

impl Default for ListingMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine for ListingMachine {
    fn create_snapshot(&mut self, window: DisassemblyWindow) -> Result<Snapshot, MachineError> {
        let partial_disassembly = self
            .window_locations(window)
            .map(|location| {
                let value = self.memory.get_word(location);
                DisassemblyLine {
                    location,
                    value: value.to_be_bytes(),
                    disassembly: disassemble(value),
                }
            })
            .collect();
        Ok(Snapshot {
            program_counter: self.program_counter,
            index_register: self.index_register,
            variable_registers: self.variable_registers,
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
            partial_disassembly,
        })
    }

    fn advance_one_step(&mut self) -> Result<(), MachineError> {
        let program_end = self.program_end.ok_or(MachineError::NoProgram)?;
        if self.program_counter as usize + 1 >= self.memory.size() {
            return Err(MachineError::OutOfBounds(self.program_counter));
        }

        let word = self.memory.get_word(self.program_counter);
        let x = ((word >> 8) & 0xf) as usize;
        let nn = (word & 0xff) as u8;
        let mut next = self.program_counter.wrapping_add(2);
        match word & 0xf000 {
            0x0000 if word == 0x00e0 => self.memory.display_mut().fill(0),
            0x1000 => next = word & 0x0fff,
            0x6000 => self.variable_registers[x] = nn,
            0x7000 => self.variable_registers[x] = self.variable_registers[x].wrapping_add(nn),
            0xa000 => self.index_register = word & 0x0fff,
            0xd000 => self.draw_sprite(x, ((word >> 4) & 0xf) as usize, (word & 0xf) as usize),
            0xf000 if nn == 0x15 => self.delay_timer = self.variable_registers[x],
            0xf000 if nn == 0x18 => self.sound_timer = self.variable_registers[x],
            _ => {}
        }
        if next < self.memory.program_addr || next >= program_end {
            next = self.memory.program_addr;
        }
        self.program_counter = next;

        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
        Ok(())
    }

    fn load_program(&mut self, bytes: &[u8]) -> Result<(), MachineError> {
        self.memory.load_program(bytes)?;
        self.program_end = Some(self.memory.program_addr + bytes.len() as u16);
        self.program_counter = self.memory.program_addr;
        self.index_register = 0;
        self.variable_registers = [0; 16];
        self.delay_timer = 0;
        self.sound_timer = 0;
        Ok(())
    }

    fn key_down(&mut self, key: u8) {
        if let Some(pressed) = self.keypad.get_mut(key as usize) {
            *pressed = true;
        }
    }

    fn key_up(&mut self, key: u8) {
        if let Some(pressed) = self.keypad.get_mut(key as usize) {
            *pressed = false;
        }
    }

    /// the display page, one character per pixel
    fn render_text(&self) -> String {
        let data = self.memory.display();
        let mut text = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT * 3);
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                let count = y * DISPLAY_WIDTH + x;
                let bit = 1 & (data[count / 8] >> (7 - count % 8));
                text.push(if bit == 1 { '◼' } else { ' ' });
            }
            text.push('\n');
        }
        text
    }
}

/// standard CHIP-8 mnemonics; anything unknown is shown as data
pub fn disassemble(word: u16) -> String {
    let x = (word >> 8) & 0xf;
    let y = (word >> 4) & 0xf;
    let n = word & 0xf;
    let nn = word & 0xff;
    let nnn = word & 0xfff;
    match (word >> 12, n) {
        (0x0, _) if word == 0x00e0 => "CLS".to_string(),
        (0x0, _) if word == 0x00ee => "RET".to_string(),
        (0x0, _) => format!("SYS 0x{:03x}", nnn),
        (0x1, _) => format!("JP 0x{:03x}", nnn),
        (0x2, _) => format!("CALL 0x{:03x}", nnn),
        (0x3, _) => format!("SE V{:X}, 0x{:02x}", x, nn),
        (0x4, _) => format!("SNE V{:X}, 0x{:02x}", x, nn),
        (0x5, 0x0) => format!("SE V{:X}, V{:X}", x, y),
        (0x6, _) => format!("LD V{:X}, 0x{:02x}", x, nn),
        (0x7, _) => format!("ADD V{:X}, 0x{:02x}", x, nn),
        (0x8, 0x0) => format!("LD V{:X}, V{:X}", x, y),
        (0x8, 0x1) => format!("OR V{:X}, V{:X}", x, y),
        (0x8, 0x2) => format!("AND V{:X}, V{:X}", x, y),
        (0x8, 0x3) => format!("XOR V{:X}, V{:X}", x, y),
        (0x8, 0x4) => format!("ADD V{:X}, V{:X}", x, y),
        (0x8, 0x5) => format!("SUB V{:X}, V{:X}", x, y),
        (0x8, 0x6) => format!("SHR V{:X}", x),
        (0x8, 0x7) => format!("SUBN V{:X}, V{:X}", x, y),
        (0x8, 0xe) => format!("SHL V{:X}", x),
        (0x9, 0x0) => format!("SNE V{:X}, V{:X}", x, y),
        (0xa, _) => format!("LD I, 0x{:03x}", nnn),
        (0xb, _) => format!("JP V0, 0x{:03x}", nnn),
        (0xc, _) => format!("RND V{:X}, 0x{:02x}", x, nn),
        (0xd, _) => format!("DRW V{:X}, V{:X}, {}", x, y, n),
        (0xe, _) if nn == 0x9e => format!("SKP V{:X}", x),
        (0xe, _) if nn == 0xa1 => format!("SKNP V{:X}", x),
        (0xf, _) => match nn {
            0x07 => format!("LD V{:X}, DT", x),
            0x0a => format!("LD V{:X}, K", x),
            0x15 => format!("LD DT, V{:X}", x),
            0x18 => format!("LD ST, V{:X}", x),
            0x1e => format!("ADD I, V{:X}", x),
            0x29 => format!("LD F, V{:X}", x),
            0x33 => format!("LD B, V{:X}", x),
            0x55 => format!("LD [I], V{:X}", x),
            0x65 => format!("LD V{:X}, [I]", x),
            _ => format!("DW 0x{:04x}", word),
        },
        _ => format!("DW 0x{:04x}", word),
    }
}
