//! Collaborator contracts for the Rivulet FLAC player.
//!
//! The playback core never talks to hardware directly. Everything it needs
//! from the outside world is described here as a trait, together with the
//! small set of value types that cross those seams.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: system controller, input, display)
//!         ↓
//! Core Layers (playback: decode + audio output, library: catalog)
//!         ↓
//! Collaborator contracts (this crate)
//!         ↓
//! Drivers (converter, DAC, codec, media volume, terminal)
//! ```
//!
//! # Contracts
//!
//! - [`StreamCodec`] - block-oriented decoder producing planar integer PCM
//! - [`ConverterInput`] / [`ConverterOutput`] - sample-rate converter write and read halves
//! - [`DacOutput`] - audio sink fed one PCM slot at a time
//! - [`MediaVolume`] - removable storage: attach polling, directory listing, file open
//! - [`DisplayNotifier`] - fire-and-forget status notifications
//! - [`Switch`], [`TouchPanel`], [`ConsoleInput`] - raw input sources
//!
//! # Features
//!
//! - `std`: expose [`mocks`] outside `cfg(test)`
//! - `defmt`: derive `defmt::Format` on value types

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

pub mod audio;
pub mod audio_types;
pub mod codec;
pub mod config;
pub mod display;
pub mod input;
pub mod slots;
pub mod storage;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use audio::{ChannelMap, ConverterConfig, ConverterInput, ConverterOutput, DacOutput, DriverError};
pub use audio_types::{BitDepth, ChannelCount, OutOfRangeError, SampleRateHz, StreamFormat, StreamSpecError};
pub use codec::{BlockHeader, BlockSink, BlockStatus, CodecError, StreamCodec, StreamInfo};
pub use display::{DisplayNotifier, PlayStatus};
pub use input::{ConsoleInput, KeyCode, NoSwitch, NoTouch, Switch, TouchPanel};
pub use slots::{PcmSlot, SlotBank, SlotId};
pub use storage::{EntryKind, MediaError, MediaVolume};
