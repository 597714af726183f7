use crate::error::MachineError;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents memory map, ROM, RAM etc.
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) {
        self.get_rw_slice(addr, data.len()).copy_from_slice(data);
    }

    /// get a two-byte word, high byte first
    fn get_word(&self, addr: u16) -> u16 {
        let word = self.get_ro_slice(addr, 2);
        ((word[0] as u16) << 8) | (word[1] as u16)
    }

    /// get a r/w slice of the underlying memory (heap)
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8];

    /// get a r/o slice of the underlying memory (heap)
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8];

    fn size(&self) -> usize;
}

/// Defines the CHIP-8 standard memory map
/// 4K configuration:
///   0x0000-0x01ff  interpreter
///   0x0200-0x0e9f  program
///   0x0ea0-0x0ecf  stack
///   0x0ed0-0x0eef  work area
///   0x0ef0-0x0eff  chip-8 variables
///   0x0f00-0x0fff  display
///
/// chip-8 programs *should* not access these directly
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    pub program_addr: u16,
    pub stack_addr: u16,
    pub display_addr: u16,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8] {
        let a = addr as usize;
        &mut self.bytes[a..(a + len)]
    }
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..(a + len)]
    }
    fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// how much RAM we have
const CHIP8_RAM_SIZE_BYTES: u16 = 4096;

/// offsets from the top of RAM
const CHIP8_STACK_OFFSET: u16 = 0x0160;
const CHIP8_DISPLAY_OFFSET: u16 = 0x100;

/// where the program is loaded
const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// how big the display page is (64x32, one bit per pixel)
pub const CHIP8_DISPLAY_BYTES: usize = 0x100;

impl Chip8MemoryMap {
    /// initialises CHIP-8 with contemporary memory contents
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: Box::new([0u8; CHIP8_RAM_SIZE_BYTES as usize]),
            program_addr: CHIP8_PROGRAM_ADDR,
            stack_addr: CHIP8_RAM_SIZE_BYTES - CHIP8_STACK_OFFSET,
            display_addr: CHIP8_RAM_SIZE_BYTES - CHIP8_DISPLAY_OFFSET,
        };
        mm.write(&CHIP8_CONTEMPORARY_FONT, CHIP8_CONTEMPORARY_FONT_ADDR);
        mm
    }

    /// room between the program start and the stack
    pub fn program_capacity(&self) -> usize {
        (self.stack_addr - self.program_addr) as usize
    }

    /// load a CHIP-8 program at 0x200, clearing whatever was there before
    /// along with the display page; a program that doesn't fit leaves memory
    /// untouched
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MachineError> {
        let capacity = self.program_capacity();
        if program.len() > capacity {
            return Err(MachineError::ProgramTooLarge {
                size: program.len(),
                capacity,
            });
        }
        self.get_rw_slice(self.program_addr, capacity).fill(0);
        self.write(program, self.program_addr);
        self.display_mut().fill(0);
        Ok(())
    }

    pub fn display(&self) -> &[u8] {
        self.get_ro_slice(self.display_addr, CHIP8_DISPLAY_BYTES)
    }

    pub fn display_mut(&mut self) -> &mut [u8] {
        self.get_rw_slice(self.display_addr, CHIP8_DISPLAY_BYTES)
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

const CHIP8_CONTEMPORARY_FONT_ADDR: u16 = 0x050;
const CHIP8_CONTEMPORARY_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_area_zeroed() {
        let m = Chip8MemoryMap::new();
        assert!(m.bytes[0x200..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_font_loaded() {
        let m = Chip8MemoryMap::new();
        assert_eq!(m.get_ro_slice(0x050, 5), &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
    }

    #[test]
    fn test_read_word() {
        let mut m = Chip8MemoryMap::new();
        m.write(&[0, 1, 2, 3, 4, 5, 6, 7], 0x300);
        assert_eq!(m.get_word(0x304), 0x0405);
    }

    #[test]
    fn test_program_load_ok() -> Result<(), MachineError> {
        let mut m = Chip8MemoryMap::new();
        m.load_program(&[0x00, 0xe0])?; // clear screen
        assert_eq!(m.get_ro_slice(0x200, 2), &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_program_reload_clears_old_program() -> Result<(), MachineError> {
        let mut m = Chip8MemoryMap::new();
        m.load_program(&[0x12, 0x34, 0x56, 0x78])?;
        m.load_program(&[0xab])?;
        assert_eq!(m.get_ro_slice(0x200, 4), &[0xab, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_program_load_clears_display() -> Result<(), MachineError> {
        let mut m = Chip8MemoryMap::new();
        m.display_mut()[0] = 0xff;
        m.load_program(&[0x00, 0xe0])?;
        assert!(m.display().iter().all(|b| *b == 0));
        Ok(())
    }

    #[test]
    fn test_program_too_large_leaves_memory() -> Result<(), MachineError> {
        let mut m = Chip8MemoryMap::new();
        m.load_program(&[0x12, 0x00])?;
        let result = m.load_program(&vec![0xff; m.program_capacity() + 1]);
        assert!(matches!(result, Err(MachineError::ProgramTooLarge { .. })));
        assert_eq!(m.get_word(0x200), 0x1200);
        Ok(())
    }

    #[test]
    fn test_mem_layout() {
        let m = Chip8MemoryMap::new();
        assert_eq!(m.stack_addr, 0x0ea0);
        assert_eq!(m.display_addr, 0x0f00);
        assert_eq!(m.program_capacity(), 0x0ca0);
        assert_eq!(m.size(), 4096);
    }
}
