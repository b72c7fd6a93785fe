//! Input/key actor.
//!
//! Three sources are polled on a fixed tick and folded into at most one
//! [`KeyCode`](platform::KeyCode) per tick:
//!
//! | Source         | Polled          | Decoder           | Priority |
//! |----------------|-----------------|-------------------|----------|
//! | push switch    | every tick      | [`Debouncer`]     | highest  |
//! | touch panel    | every 25 ticks  | none (keys ready) | middle   |
//! | serial console | every tick      | [`CommandLine`]   | lowest   |
//!
//! Lower-priority sources are still polled when a higher one fires, so a
//! console byte is never lost; only its key is dropped for that tick.

pub mod command;
pub mod debounce;
pub mod poller;

pub use command::CommandLine;
pub use debounce::Debouncer;
pub use poller::InputPoller;
