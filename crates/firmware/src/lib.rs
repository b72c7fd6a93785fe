//! Rivulet player firmware
//!
//! FLAC player application: system controller, input poller, terminal
//! display and the wiring that runs them next to the playback actors.
//!
//! # Architecture
//!
//! ```text
//! Application Layer (system, input, display, tasks)
//!         ↓
//! Playback core (playback: decode + audio output, library: catalog)
//!         ↓
//! Collaborator contracts (platform)
//!         ↓
//! Drivers (hardware, or the desktop simulator in `sim`)
//! ```
//!
//! # Features
//!
//! - `defmt` - log through defmt (hardware builds)
//! - `tracing` - log through tracing (desktop builds)
//! - `std` - enable the standard library and the platform mocks
//! - `simulator` - desktop collaborators: symphonia codec, rubato converter,
//!   WAV file DAC, host folder as media
//!
//! # Simulator
//!
//! ```bash
//! cargo run -p firmware --bin simulator --features simulator -- ./music --wav out.wav
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

#[macro_use]
mod fmt;

pub mod config;
pub mod cursor;
pub mod display;
pub mod input;
pub mod message;
pub mod system;
pub mod tasks;

#[cfg(feature = "simulator")]
pub mod sim;

pub use config::PlayerConfig;
pub use cursor::TrackCursor;
pub use display::{DisplayMsg, DisplayOutbox, TerminalDisplay};
pub use input::{CommandLine, Debouncer, InputPoller};
pub use message::{SystemMsg, SystemOutbox};
pub use system::{SystemController, SystemState};
pub use tasks::{run_player, AudioDrivers, InputSources, Mailboxes};
