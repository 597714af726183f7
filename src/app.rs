//! The environment: owns the machine, the mounted view, the frame loop, the
//! keypad and the catalog selector, and runs the host side of the main loop.

use log::{error, info, warn};
use std::io;
use std::time::{Duration, Instant};

use crate::catalog::{CatalogSelector, LoadedProgram};
use crate::config::Config;
use crate::display::{Display, Scene};
use crate::error::LoadError;
use crate::frame_loop::{dispatch, FrameLoop};
use crate::input::{HostEvent, Input, Keypad};
use crate::machine::{DisassemblyWindow, Machine};
use crate::report;
use crate::view::View;

/// how many log lines the messages panel asks for
const MESSAGE_LINES: usize = 16;

pub struct App<M: Machine> {
    machine: M,
    view: View,
    frame_loop: FrameLoop,
    keypad: Keypad,
    selector: CatalogSelector,
    window: DisassemblyWindow,
    running: bool,
}

impl<M: Machine> App<M> {
    pub fn new(machine: M, config: &Config) -> Self {
        App {
            machine,
            view: View::standard(),
            frame_loop: FrameLoop::new(config.window()),
            keypad: Keypad::new(config.key_hold_frames),
            selector: CatalogSelector::new(),
            window: config.window(),
            running: true,
        }
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn selector(&self) -> &CatalogSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut CatalogSelector {
        &mut self.selector
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::KeyDown(key) => {
                self.keypad.key_down(&key, &mut self.machine);
            }
            HostEvent::KeyUp(key) => {
                self.keypad.key_up(&key, &mut self.machine);
            }
            HostEvent::TogglePause => self.frame_loop.toggle_pause(),
            HostEvent::Step => {
                self.frame_loop.step(&mut self.machine, &mut self.view);
            }
            HostEvent::SelectPrevious => self.selector.select_previous(),
            HostEvent::SelectNext => self.selector.select_next(),
            HostEvent::LoadSelected => {
                self.selector.load_selected();
            }
            HostEvent::Quit => self.running = false,
        }
    }

    /// one host frame: commit a finished load, age the keypad, then let the
    /// frame loop do its iteration if it asked for one
    pub fn tick(&mut self) {
        if let Some(outcome) = self.selector.poll() {
            self.commit(outcome);
        }
        self.keypad.tick(&mut self.machine);
        self.frame_loop.on_frame(&mut self.machine, &mut self.view);
    }

    /// block up to `timeout` for an in-flight load and commit it
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        match self.selector.wait(timeout) {
            Some(outcome) => {
                self.commit(outcome);
                true
            }
            None => false,
        }
    }

    /// install a fetched program; on any failure the machine keeps what it had
    fn commit(&mut self, outcome: Result<LoadedProgram, LoadError>) {
        let program = match outcome {
            Ok(program) => program,
            Err(err) => {
                error!("{}", err);
                return;
            }
        };
        if let Err(err) = self.machine.load_program(&program.bytes) {
            error!("can't load {}: {}", program.title, err);
            return;
        }
        info!("loaded {} ({} bytes)", program.title, program.bytes.len());
        self.refresh();
        self.frame_loop.start();
    }

    /// show the machine as it is now, without stepping it
    fn refresh(&mut self) {
        match self.machine.create_snapshot(self.window) {
            Ok(snapshot) => {
                dispatch(&mut self.view, &snapshot);
            }
            Err(err) => warn!("no snapshot after load: {}", err),
        }
    }

    pub fn scene(&self) -> Scene {
        Scene {
            view: &self.view,
            screen: self.machine.render_text(),
            entries: self.selector.entries(),
            cursor: self.selector.cursor(),
            selected: self.selector.selected(),
            loading: self.selector.is_loading(),
            state: self.frame_loop.state(),
            messages: report::recent(MESSAGE_LINES),
        }
    }
}

/// main loop: input, tick, draw, then sleep off the rest of the frame
pub fn run<M: Machine>(
    app: &mut App<M>,
    display: &mut dyn Display,
    input: &mut dyn Input,
    frame: Duration,
) -> Result<(), io::Error> {
    while app.is_running() {
        let started = Instant::now();
        for event in input.poll_events()? {
            app.handle(event);
        }
        if !app.is_running() {
            break;
        }
        app.tick();
        display.present(&app.scene())?;
        if let Some(rest) = frame.checked_sub(started.elapsed()) {
            spin_sleep::sleep(rest);
        }
    }
    info!("quit after {} frames", app.frame_loop().iterations());
    Ok(())
}
