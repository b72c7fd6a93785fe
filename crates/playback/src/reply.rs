//! Reply handles: callback identity as an index into a fixed registry.
//!
//! A requester does not pass a function to call back. It registers a
//! listener with the responding actor once, at wiring time, and from then
//! on names it by the [`ReplyHandle`] it got back. The responder looks the
//! handle up when the request completes.

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;
use thiserror_no_std::Error;

use crate::mailbox::{post, Mailbox};
use crate::message::{DecodeMsg, OpenError, OpenInfo, PlayReport};

/// Names one listener in a [`ReplyRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReplyHandle(u8);

impl ReplyHandle {
    /// Registry slot this handle refers to.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// The registry has no room for another listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("reply registry full")]
pub struct RegistryFull;

/// Fixed-capacity table of listeners, owned by the responding actor.
pub struct ReplyRegistry<'a, T: ?Sized, const N: usize> {
    listeners: Vec<&'a T, N>,
}

impl<'a, T: ?Sized, const N: usize> ReplyRegistry<'a, T, N> {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Add `listener` and return the handle that names it.
    pub fn register(&mut self, listener: &'a T) -> Result<ReplyHandle, RegistryFull> {
        let handle = u8::try_from(self.listeners.len())
            .map(ReplyHandle)
            .map_err(|_| RegistryFull)?;
        self.listeners.push(listener).map_err(|_| RegistryFull)?;
        Ok(handle)
    }

    /// The listener named by `handle`, if it was issued by this registry.
    pub fn get(&self, handle: ReplyHandle) -> Option<&'a T> {
        self.listeners.get(handle.index()).copied()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<T: ?Sized, const N: usize> Default for ReplyRegistry<'_, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives the answer to an audio output data-out request.
pub trait DataOutListener {
    /// `accepted` is false when output was already running or priming failed.
    fn data_out_done(&self, accepted: bool);
}

/// Receives the answers to decode open and close requests.
pub trait DecodeListener {
    /// The open request finished.
    fn open_done(&self, result: Result<OpenInfo, OpenError>);

    /// The close request finished. Closing never fails.
    fn close_done(&self);
}

/// Receives playback status and play-time changes from the decode actor.
pub trait PlayStatusListener {
    /// Status or displayed play time changed.
    fn play_status(&self, report: PlayReport);
}

impl<M: RawMutex, F> DataOutListener for Mailbox<M, DecodeMsg<F>> {
    fn data_out_done(&self, accepted: bool) {
        if post(self, DecodeMsg::DataOutDone { accepted }).is_err() {
            warn!("decode mailbox full, data-out answer dropped");
        }
    }
}
