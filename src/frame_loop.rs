//! The frame loop controller: once per frame it steps the machine, takes a
//! snapshot and dispatches it to the mounted nodes.
//!
//! The host owns the clock. The controller only records whether it wants the
//! next frame; the host calls `on_frame` once per display frame and the
//! request is consumed by that call, like a per-frame callback.

use log::{debug, info, warn};

use crate::composite::{PARTIAL_DISASSEMBLER_ID, VARIABLE_REGISTERS_ID};
use crate::error::NodeError;
use crate::machine::{DisassemblyWindow, Machine, Snapshot};
use crate::node::{DELAY_TIMER_ID, INDEX_REGISTER_ID, PROGRAM_COUNTER_ID, SOUND_TIMER_ID};
use crate::view::View;

/// fixed dispatch order; nodes don't depend on each other so this is cosmetic
pub const DISPATCH_ORDER: [&str; 6] = [
    PROGRAM_COUNTER_ID,
    INDEX_REGISTER_ID,
    VARIABLE_REGISTERS_ID,
    DELAY_TIMER_ID,
    SOUND_TIMER_ID,
    PARTIAL_DISASSEMBLER_ID,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// no program loaded yet
    Unstarted,
    Running,
    Paused,
    /// inside a single synchronous step; always ends Paused
    Stepping,
}

/// what one dispatch pass did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// targets that re-rendered something
    pub rendered: usize,
    /// targets that were missing or rejected the snapshot
    pub failures: usize,
}

pub struct FrameLoop {
    state: LoopState,
    frame_requested: bool,
    window: DisassemblyWindow,
    iterations: u64,
}

impl FrameLoop {
    pub fn new(window: DisassemblyWindow) -> Self {
        FrameLoop {
            state: LoopState::Unstarted,
            frame_requested: false,
            window,
            iterations: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// completed iterations since construction
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// leave Unstarted; only the first call does anything
    pub fn start(&mut self) -> bool {
        if self.state != LoopState::Unstarted {
            return false;
        }
        info!("frame loop started");
        self.state = LoopState::Running;
        self.frame_requested = true;
        true
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            LoopState::Running => {
                info!("paused");
                self.state = LoopState::Paused;
            }
            LoopState::Paused => {
                info!("resumed");
                self.state = LoopState::Running;
                self.frame_requested = true;
            }
            LoopState::Unstarted | LoopState::Stepping => {
                debug!("pause toggle ignored while {:?}", self.state);
            }
        }
    }

    /// Running: pause, suppressing the next frame's work.
    /// Paused: run exactly one iteration now and stay paused.
    pub fn step(&mut self, machine: &mut dyn Machine, view: &mut View) -> Option<FrameReport> {
        match self.state {
            LoopState::Running => {
                info!("paused for stepping");
                self.state = LoopState::Paused;
                None
            }
            LoopState::Paused => {
                self.state = LoopState::Stepping;
                let report = self.iterate(machine, view);
                self.state = LoopState::Paused;
                report
            }
            LoopState::Unstarted | LoopState::Stepping => None,
        }
    }

    /// the host's per-frame callback
    pub fn on_frame(&mut self, machine: &mut dyn Machine, view: &mut View) -> Option<FrameReport> {
        if !std::mem::take(&mut self.frame_requested) || self.state != LoopState::Running {
            return None;
        }
        let report = self.iterate(machine, view);
        if self.state == LoopState::Running {
            self.frame_requested = true;
        }
        report
    }

    /// one iteration; a failure abandons this frame only
    fn iterate(&mut self, machine: &mut dyn Machine, view: &mut View) -> Option<FrameReport> {
        if let Err(error) = machine.advance_one_step() {
            warn!("frame abandoned, step failed: {}", error);
            return None;
        }
        let snapshot = match machine.create_snapshot(self.window) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!("frame abandoned, snapshot failed: {}", error);
                return None;
            }
        };
        self.iterations += 1;
        Some(dispatch(view, &snapshot))
    }
}

/// hand a snapshot to every target in `DISPATCH_ORDER`; a bad target is
/// reported and the rest still get their update
pub fn dispatch(view: &mut View, snapshot: &Snapshot) -> FrameReport {
    let mut report = FrameReport::default();
    for id in DISPATCH_ORDER {
        let Some(node) = view.node_mut(id) else {
            warn!("{}", NodeError::MissingTarget(id.to_string()));
            report.failures += 1;
            continue;
        };
        match node.sync(snapshot) {
            Ok(true) => report.rendered += 1,
            Ok(false) => {}
            Err(error) => {
                warn!("{}", error);
                report.failures += 1;
            }
        }
    }
    report
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::MachineError;
    use crate::machine::DisassemblyLine;

    /// counts steps; the program counter moves two bytes per step
    #[derive(Default)]
    pub(crate) struct ScriptedMachine {
        pub steps: u16,
        pub fail_snapshots: usize,
        pub loaded: Vec<u8>,
        pub keys: [bool; 16],
    }

    impl Machine for ScriptedMachine {
        fn create_snapshot(&mut self, window: DisassemblyWindow) -> Result<Snapshot, MachineError> {
            if self.fail_snapshots > 0 {
                self.fail_snapshots -= 1;
                return Err(MachineError::Other("snapshot unavailable".to_string()));
            }
            let pc = 0x200 + self.steps * 2;
            let start = pc - window.before.min(self.steps) * 2;
            let end = pc + window.after * 2;
            Ok(Snapshot {
                program_counter: pc,
                index_register: self.steps,
                variable_registers: [self.steps as u8; 16],
                delay_timer: 0,
                sound_timer: 0,
                partial_disassembly: (start..=end)
                    .step_by(2)
                    .map(|location| DisassemblyLine {
                        location,
                        value: [0x00, 0xe0],
                        disassembly: "CLS".to_string(),
                    })
                    .collect(),
            })
        }

        fn advance_one_step(&mut self) -> Result<(), MachineError> {
            self.steps += 1;
            Ok(())
        }

        fn load_program(&mut self, bytes: &[u8]) -> Result<(), MachineError> {
            self.loaded = bytes.to_vec();
            self.steps = 0;
            Ok(())
        }

        fn key_down(&mut self, key: u8) {
            self.keys[key as usize] = true;
        }

        fn key_up(&mut self, key: u8) {
            self.keys[key as usize] = false;
        }

        fn render_text(&self) -> String {
            format!("step {}", self.steps)
        }
    }

    const WINDOW: DisassemblyWindow = DisassemblyWindow {
        before: 2,
        after: 2,
    };

    fn running() -> FrameLoop {
        let mut frame_loop = FrameLoop::new(WINDOW);
        frame_loop.start();
        frame_loop
    }

    #[test]
    fn test_unstarted_loop_does_nothing() {
        let mut frame_loop = FrameLoop::new(WINDOW);
        let mut machine = ScriptedMachine::default();
        let mut view = View::standard();
        assert_eq!(frame_loop.on_frame(&mut machine, &mut view), None);
        assert_eq!(machine.steps, 0);
        assert_eq!(frame_loop.state(), LoopState::Unstarted);
    }

    #[test]
    fn test_running_loop_reschedules_each_frame() {
        let mut frame_loop = running();
        let mut machine = ScriptedMachine::default();
        let mut view = View::standard();
        for _ in 0..3 {
            assert!(frame_loop.on_frame(&mut machine, &mut view).is_some());
            assert!(frame_loop.is_frame_requested());
        }
        assert_eq!(machine.steps, 3);
        assert_eq!(frame_loop.iterations(), 3);
    }

    #[test]
    fn test_start_only_once() {
        let mut frame_loop = running();
        frame_loop.toggle_pause();
        assert!(!frame_loop.start());
        assert_eq!(frame_loop.state(), LoopState::Paused);
    }

    #[test]
    fn test_step_while_running_pauses_without_iterating() {
        let mut frame_loop = running();
        let mut machine = ScriptedMachine::default();
        let mut view = View::standard();

        assert_eq!(frame_loop.step(&mut machine, &mut view), None);
        assert_eq!(frame_loop.state(), LoopState::Paused);
        // the frame already requested is suppressed
        assert_eq!(frame_loop.on_frame(&mut machine, &mut view), None);
        assert_eq!(machine.steps, 0);
        assert!(!frame_loop.is_frame_requested());

        assert!(frame_loop.step(&mut machine, &mut view).is_some());
        assert_eq!(machine.steps, 1);
        assert_eq!(frame_loop.state(), LoopState::Paused);
        assert!(!frame_loop.is_frame_requested());
        assert_eq!(frame_loop.on_frame(&mut machine, &mut view), None);
        assert_eq!(machine.steps, 1);
    }

    #[test]
    fn test_toggle_pause_resumes_and_reschedules() {
        let mut frame_loop = running();
        let mut machine = ScriptedMachine::default();
        let mut view = View::standard();

        frame_loop.toggle_pause();
        assert_eq!(frame_loop.on_frame(&mut machine, &mut view), None);
        assert!(!frame_loop.is_frame_requested());

        frame_loop.toggle_pause();
        assert_eq!(frame_loop.state(), LoopState::Running);
        assert!(frame_loop.is_frame_requested());
        assert!(frame_loop.on_frame(&mut machine, &mut view).is_some());
        assert_eq!(machine.steps, 1);
    }

    #[test]
    fn test_failed_snapshot_skips_one_frame_only() {
        let mut frame_loop = running();
        let mut machine = ScriptedMachine {
            fail_snapshots: 1,
            ..Default::default()
        };
        let mut view = View::standard();

        assert_eq!(frame_loop.on_frame(&mut machine, &mut view), None);
        assert!(frame_loop.is_frame_requested());
        assert!(frame_loop.on_frame(&mut machine, &mut view).is_some());
        assert_eq!(frame_loop.iterations(), 1);
    }

    #[test]
    fn test_dispatch_renders_every_target_once() {
        let mut frame_loop = running();
        let mut machine = ScriptedMachine::default();
        let mut view = View::standard();

        let report = frame_loop.on_frame(&mut machine, &mut view);
        // pc, index, registers and disassembler change; both timers stay 0
        assert_eq!(
            report,
            Some(FrameReport {
                rendered: 4,
                failures: 0
            })
        );
    }

    #[test]
    fn test_dispatch_missing_target_does_not_stop_others() {
        let mut view = View::standard();
        view.unmount(INDEX_REGISTER_ID);
        let mut machine = ScriptedMachine::default();
        machine.advance_one_step().expect("step");
        let snapshot = machine.create_snapshot(WINDOW).expect("snapshot");

        let report = dispatch(&mut view, &snapshot);
        assert_eq!(report.failures, 1);
        assert_eq!(report.rendered, 3);
        let pc = view.node(PROGRAM_COUNTER_ID).expect("mounted");
        assert_eq!(pc.surface().text(), "PROGRAM: 0x0202 / 514");
    }
}
