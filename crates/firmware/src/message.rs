//! Mail for the system actor and the listener that delivers it.

use embassy_sync::blocking_mutex::raw::RawMutex;
use platform::KeyCode;
use playback::{
    post, DecodeListener, Mailbox, OpenError, OpenInfo, PlayReport, PlayStatusListener,
};

/// Everything the system actor reacts to, besides media polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemMsg {
    /// A key decoded by the input poller.
    Key(KeyCode),
    /// Play status or play time changed.
    PlayTime(PlayReport),
    /// The decoder answered an open request.
    OpenFinished(Result<OpenInfo, OpenError>),
    /// The decoder answered a close request.
    CloseFinished,
}

impl SystemMsg {
    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key(_) => "key",
            Self::PlayTime(_) => "play-time",
            Self::OpenFinished(_) => "open-finished",
            Self::CloseFinished => "close-finished",
        }
    }
}

/// Posts into the system mailbox on behalf of the decoder and input poller.
///
/// A full mailbox drops the notification with a warning; nothing here
/// blocks.
pub struct SystemOutbox<'a, M: RawMutex> {
    mailbox: &'a Mailbox<M, SystemMsg>,
}

impl<M: RawMutex> Clone for SystemOutbox<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for SystemOutbox<'_, M> {}

impl<'a, M: RawMutex> SystemOutbox<'a, M> {
    /// Wrap the system mailbox.
    pub fn new(mailbox: &'a Mailbox<M, SystemMsg>) -> Self {
        Self { mailbox }
    }

    /// Deliver a key event. Returns `false` if it was dropped.
    pub fn key(&self, key: KeyCode) -> bool {
        self.send(SystemMsg::Key(key))
    }

    fn send(&self, msg: SystemMsg) -> bool {
        let label = msg.as_str();
        if post(self.mailbox, msg).is_err() {
            warn!("system mailbox full, {} dropped", label);
            return false;
        }
        true
    }
}

impl<M: RawMutex> DecodeListener for SystemOutbox<'_, M> {
    fn open_done(&self, result: Result<OpenInfo, OpenError>) {
        self.send(SystemMsg::OpenFinished(result));
    }

    fn close_done(&self) {
        self.send(SystemMsg::CloseFinished);
    }
}

impl<M: RawMutex> PlayStatusListener for SystemOutbox<'_, M> {
    fn play_status(&self, report: PlayReport) {
        self.send(SystemMsg::PlayTime(report));
    }
}
