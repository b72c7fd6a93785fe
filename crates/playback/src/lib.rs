//! Playback core: the decode and audio output actors of the Rivulet player.
//!
//! Both actors are plain state machines driven one message at a time from
//! their own [`Mailbox`]. They never block on anything but their mailbox
//! and never share mutable state except the PCM slots in a
//! [`platform::SlotBank`], whose ownership moves with the completion
//! messages that name them.
//!
//! ```text
//! system ──DecodeMsg──▶ DecodeController ──AudioOutMsg──▶ AudioOutController
//!    ▲                      │   ▲                              │    ▲
//!    │   open/close/status  │   │ write/flush done      read   │    │ DAC done
//!    └──────────────────────┘   └── ConverterInput     ConverterOutput / DacOutput
//! ```
//!
//! # Features
//!
//! - `defmt`: log through `defmt` (hardware)
//! - `tracing`: log through `tracing` (desktop simulator)
//! - `std`: enable the platform mocks for downstream integration tests
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

#[macro_use]
mod fmt;

pub mod audio_out;
pub mod decode;
pub mod mailbox;
pub mod message;
pub mod pcm;
pub mod playtime;
pub mod reply;

pub use audio_out::{AudioOutController, RingSnapshot, SlotOwner};
pub use decode::{DecodeBuffer, DecodeController, DecodeState};
pub use mailbox::{post, AudioOutClient, DecodeClient, Mailbox, MailboxFull};
pub use message::{AudioOutMsg, DecodeMsg, OpenError, OpenInfo, PlayReport};
pub use playtime::PlayClock;
pub use reply::{
    DataOutListener, DecodeListener, PlayStatusListener, RegistryFull, ReplyHandle, ReplyRegistry,
};
