//! Bounded mailboxes and the request-side API of each actor.
//!
//! Every send is non-blocking. A full mailbox hands the message back in
//! [`MailboxFull`] so the caller can release whatever it owned (a file
//! handle in an open request) and take its failure branch.

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use platform::config::MAILBOX_DEPTH;

use crate::message::{AudioOutMsg, DecodeMsg};
use crate::reply::ReplyHandle;

/// An actor's inbox.
pub type Mailbox<M, T> = Channel<M, T, MAILBOX_DEPTH>;

/// The mailbox had no free entry; the rejected message is returned.
pub struct MailboxFull<T>(pub T);

impl<T> MailboxFull<T> {
    /// Recover the message that could not be delivered.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for MailboxFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MailboxFull(..)")
    }
}

impl<T> fmt::Display for MailboxFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("mailbox full")
    }
}

/// Try to enqueue `msg` without waiting.
pub fn post<M: RawMutex, T>(mailbox: &Mailbox<M, T>, msg: T) -> Result<(), MailboxFull<T>> {
    mailbox.try_send(msg).map_err(|TrySendError::Full(msg)| {
        debug!("mailbox full");
        MailboxFull(msg)
    })
}

/// Request-side handle to the audio output actor.
pub struct AudioOutClient<'a, M: RawMutex> {
    mailbox: &'a Mailbox<M, AudioOutMsg>,
}

impl<M: RawMutex> Clone for AudioOutClient<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for AudioOutClient<'_, M> {}

impl<'a, M: RawMutex> AudioOutClient<'a, M> {
    /// Wrap the audio output mailbox.
    pub fn new(mailbox: &'a Mailbox<M, AudioOutMsg>) -> Self {
        Self { mailbox }
    }

    /// Ask audio output to start pulling converted samples. The answer goes
    /// to the listener registered under `reply`.
    pub fn request_data_out(&self, reply: ReplyHandle) -> Result<(), MailboxFull<AudioOutMsg>> {
        post(self.mailbox, AudioOutMsg::DataOut { reply })
    }

    /// Ask audio output to stop pulling and let queued slots drain.
    pub fn request_zero_out(&self) -> Result<(), MailboxFull<AudioOutMsg>> {
        post(self.mailbox, AudioOutMsg::ZeroOut)
    }
}

/// Request-side handle to the decode actor.
pub struct DecodeClient<'a, M: RawMutex, F> {
    mailbox: &'a Mailbox<M, DecodeMsg<F>>,
}

impl<M: RawMutex, F> Clone for DecodeClient<'_, M, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, F> Copy for DecodeClient<'_, M, F> {}

impl<'a, M: RawMutex, F> DecodeClient<'a, M, F> {
    /// Wrap the decode mailbox.
    pub fn new(mailbox: &'a Mailbox<M, DecodeMsg<F>>) -> Self {
        Self { mailbox }
    }

    /// Hand `file` to the decoder. On failure the file comes back inside the
    /// rejected message.
    pub fn open(&self, file: F, reply: ReplyHandle) -> Result<(), MailboxFull<DecodeMsg<F>>> {
        post(self.mailbox, DecodeMsg::Open { file, reply })
    }

    /// Start playback of the opened stream.
    pub fn play(&self) -> Result<(), MailboxFull<DecodeMsg<F>>> {
        post(self.mailbox, DecodeMsg::Play)
    }

    /// Pause playback.
    pub fn pause_on(&self) -> Result<(), MailboxFull<DecodeMsg<F>>> {
        post(self.mailbox, DecodeMsg::PauseOn)
    }

    /// Resume playback.
    pub fn pause_off(&self) -> Result<(), MailboxFull<DecodeMsg<F>>> {
        post(self.mailbox, DecodeMsg::PauseOff)
    }

    /// Stop playback.
    pub fn stop(&self) -> Result<(), MailboxFull<DecodeMsg<F>>> {
        post(self.mailbox, DecodeMsg::Stop)
    }

    /// Release the stream.
    pub fn close(&self, reply: ReplyHandle) -> Result<(), MailboxFull<DecodeMsg<F>>> {
        post(self.mailbox, DecodeMsg::Close { reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn full_mailbox_returns_the_message() {
        let mailbox: Mailbox<NoopRawMutex, u32> = Channel::new();
        for i in 0..MAILBOX_DEPTH {
            post(&mailbox, i as u32).unwrap();
        }
        let rejected = post(&mailbox, 99).unwrap_err();
        assert_eq!(rejected.into_inner(), 99);
        assert_eq!(mailbox.try_receive().unwrap(), 0);
    }

    struct Nop;

    impl crate::reply::DataOutListener for Nop {
        fn data_out_done(&self, _accepted: bool) {}
    }

    #[test]
    fn open_on_full_mailbox_gives_file_back() {
        let mailbox: Mailbox<NoopRawMutex, DecodeMsg<&'static str>> = Channel::new();
        let client = DecodeClient::new(&mailbox);
        for _ in 0..MAILBOX_DEPTH {
            client.play().unwrap();
        }
        let nop = Nop;
        let mut registry: crate::reply::ReplyRegistry<'_, dyn crate::reply::DataOutListener, 1> =
            crate::reply::ReplyRegistry::new();
        let handle = registry.register(&nop).unwrap();
        match client.open("track.flac", handle).unwrap_err().into_inner() {
            DecodeMsg::Open { file, .. } => assert_eq!(file, "track.flac"),
            other => panic!("unexpected message {other:?}"),
        }
    }
}
