use crossterm::event::{
    poll, read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use log::debug;
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::machine::Machine;

/// left-hand side of a qwerty keyboard, row-major onto the 4x4 keypad
///   1 2 3 4      0 1 2 3
///   q w e r  =>  4 5 6 7
///   a s d f      8 9 a b
///   z x c v      c d e f
const KEYPAD_LAYOUT: [(char, u8); 16] = [
    ('1', 0x00),
    ('2', 0x01),
    ('3', 0x02),
    ('4', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('r', 0x07),
    ('a', 0x08),
    ('s', 0x09),
    ('d', 0x0a),
    ('f', 0x0b),
    ('z', 0x0c),
    ('x', 0x0d),
    ('c', 0x0e),
    ('v', 0x0f),
];

/// host key identifier to keypad index; anything else is simply unmapped
pub fn map_key(key: &str) -> Option<u8> {
    let mut chars = key.chars();
    let c = chars.next()?.to_ascii_lowercase();
    if chars.next().is_some() {
        return None;
    }
    KEYPAD_LAYOUT
        .iter()
        .find(|(k, _)| *k == c)
        .map(|(_, index)| *index)
}

/// which of the 16 keys are down
///
/// NB. terminals without key release reporting never send a key-up; until
/// the host has sent one, a press holds its key down for `hold_frames`
/// frames, refreshed by every key repeat. once any key-up has arrived the
/// host is trusted and keys only go up when it says so.
pub struct Keypad {
    pressed: [bool; 16],
    hold: [u32; 16],
    hold_frames: u32,
    host_releases: bool,
}

impl Keypad {
    pub fn new(hold_frames: u32) -> Self {
        Keypad {
            pressed: [false; 16],
            hold: [0; 16],
            hold_frames,
            host_releases: false,
        }
    }

    pub fn state(&self) -> [bool; 16] {
        self.pressed
    }

    /// returns the keypad index the key mapped to, if any
    pub fn key_down(&mut self, key: &str, machine: &mut dyn Machine) -> Option<u8> {
        let index = map_key(key)?;
        let slot = index as usize;
        self.hold[slot] = self.hold_frames;
        if !self.pressed[slot] {
            self.pressed[slot] = true;
            machine.key_down(index);
        }
        Some(index)
    }

    pub fn key_up(&mut self, key: &str, machine: &mut dyn Machine) -> Option<u8> {
        if !self.host_releases {
            debug!("host reports key releases; hold timer off");
            self.host_releases = true;
        }
        let index = map_key(key)?;
        self.release(index, machine);
        Some(index)
    }

    /// one frame passed; let go of keys whose hold ran out
    pub fn tick(&mut self, machine: &mut dyn Machine) {
        if self.host_releases {
            return;
        }
        for index in 0..16u8 {
            let slot = index as usize;
            if !self.pressed[slot] {
                continue;
            }
            self.hold[slot] = self.hold[slot].saturating_sub(1);
            if self.hold[slot] == 0 {
                self.release(index, machine);
            }
        }
    }

    fn release(&mut self, index: u8, machine: &mut dyn Machine) {
        let slot = index as usize;
        self.hold[slot] = 0;
        if self.pressed[slot] {
            self.pressed[slot] = false;
            machine.key_up(index);
        }
    }
}

/// everything the host feeds into the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    KeyDown(String),
    KeyUp(String),
    TogglePause,
    Step,
    SelectPrevious,
    SelectNext,
    LoadSelected,
    Quit,
}

/// reads host events
pub trait Input {
    /// everything that happened since the last call, without blocking
    fn poll_events(&mut self) -> Result<Vec<HostEvent>, io::Error>;
}

/// terminal keyboard, via crossterm in raw mode, asking for key release
/// events where the terminal supports them
pub struct TermInput {
    enhanced: bool,
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        let enhanced = match execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        ) {
            Ok(()) => true,
            Err(err) => {
                debug!("no key release events: {}", err);
                false
            }
        };
        Ok(TermInput { enhanced })
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn poll_events(&mut self) -> Result<Vec<HostEvent>, io::Error> {
        let mut events = Vec::new();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(key) = read()? {
                if let Some(event) = translate(key) {
                    events.push(event);
                }
            }
        }
        Ok(events)
    }
}

fn translate(key: KeyEvent) -> Option<HostEvent> {
    match key.kind {
        KeyEventKind::Release => match key.code {
            KeyCode::Char(c) => Some(HostEvent::KeyUp(c.to_string())),
            _ => None,
        },
        // NB. a repeat only keeps a keypad key held; controls fire once
        KeyEventKind::Repeat => match key.code {
            KeyCode::Char(c) if map_key(&c.to_string()).is_some() => {
                Some(HostEvent::KeyDown(c.to_string()))
            }
            _ => None,
        },
        KeyEventKind::Press => match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(HostEvent::Quit)
            }
            KeyCode::Char(' ') => Some(HostEvent::TogglePause),
            KeyCode::Char('n') => Some(HostEvent::Step),
            KeyCode::Char(c) => Some(HostEvent::KeyDown(c.to_string())),
            KeyCode::Up => Some(HostEvent::SelectPrevious),
            KeyCode::Down => Some(HostEvent::SelectNext),
            KeyCode::Enter => Some(HostEvent::LoadSelected),
            KeyCode::Esc => Some(HostEvent::Quit),
            _ => None,
        },
    }
}

/// scripted Input for testing; one batch per poll
pub struct DummyInput {
    batches: VecDeque<Vec<HostEvent>>,
}

impl DummyInput {
    pub fn new(batches: Vec<Vec<HostEvent>>) -> Self {
        DummyInput {
            batches: batches.into(),
        }
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self) -> Result<Vec<HostEvent>, io::Error> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}
