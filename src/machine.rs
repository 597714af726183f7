//! The machine boundary. Everything the view knows about the virtual machine
//! comes through `Machine`: one snapshot per frame, one step per frame,
//! program loading and keypad edges.

use crate::error::MachineError;

/// one decoded instruction word around the program counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassemblyLine {
    pub location: u16,
    pub value: [u8; 2],
    pub disassembly: String,
}

/// Machine-visible state captured once per frame. The frame loop owns it for
/// the duration of one dispatch and then drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub program_counter: u16,
    pub index_register: u16,
    pub variable_registers: [u8; 16],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub partial_disassembly: Vec<DisassemblyLine>,
}

/// how many instructions either side of the program counter to disassemble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisassemblyWindow {
    pub before: u16,
    pub after: u16,
}

pub trait Machine {
    fn create_snapshot(&mut self, window: DisassemblyWindow) -> Result<Snapshot, MachineError>;

    /// move the machine on by one logical step
    fn advance_one_step(&mut self) -> Result<(), MachineError>;

    /// replace the current program; on error the old one must still be intact
    fn load_program(&mut self, bytes: &[u8]) -> Result<(), MachineError>;

    fn key_down(&mut self, key: u8);

    fn key_up(&mut self, key: u8);

    /// a secondary text view of the machine, independent of the node tree
    fn render_text(&self) -> String;
}
