//! Listener presence: which listener is tuned into which channel, and the
//! counts shown for each channel.
//!
//! The registry is the only owner of membership state. The ambient baseline
//! is a pure function consulted only when composing public counts.

pub mod ambient;
pub mod counts;
pub mod registry;
pub mod routes;
pub mod sweeper;

pub use ambient::AmbientBaseline;
pub use registry::{PresenceError, PresenceRegistry};
