//! Shared types for the splitpaste content splitter.

mod block;
mod delimiter;
mod event;
mod outcome;
mod session;

pub use block::*;
pub use delimiter::*;
pub use event::*;
pub use outcome::*;
pub use session::*;
