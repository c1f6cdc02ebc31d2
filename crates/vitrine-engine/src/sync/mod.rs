//! Cross-thread hand-off primitives.

mod channel;

pub use channel::ConcurrentChannel;
