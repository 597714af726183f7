//! A CHIP-8 state viewer for the terminal.
//!
//! ## Design
//!
//! * the machine sits behind a trait; the view only ever sees a snapshot
//! * one snapshot per frame, handed to every mounted node by id
//! * nodes cache what they last showed and only re-render on change
//! * composites own their children; the disassembler grows and shrinks its
//!   lines to fit the listing it's given
//! * pause and single-step live in the frame loop, not the machine
//! * programs come from a JSON catalog and load off-thread; the machine only
//!   changes once a load has completed
//!
//! Model
//!
//! App
//!  |-- machine, view(nodes), frame loop, keypad, catalog selector
//!  `-- main loop
//!       |-- input events -> keypad / pause / step / catalog
//!       |-- commit a finished load; start the frame loop on the first one
//!       |-- frame loop: advance, snapshot, dispatch
//!       |-- draw the scene
//!       `-- sleep out the rest of the frame
pub mod app;
pub mod catalog;
pub mod composite;
pub mod config;
pub mod display;
pub mod error;
pub mod format;
pub mod frame_loop;
pub mod input;
pub mod listing;
pub mod machine;
pub mod memory;
pub mod node;
pub mod report;
pub mod view;
