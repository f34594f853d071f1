//! The in-memory heart of the match engine: an ordered pool of pending requests and the map of
//! live sessions. Both structures are plain containers; all locking is done by their owner,
//! [`crate::api::pairing_api::PairingApi`].
mod session_registry;
mod waiting_pool;

pub use session_registry::{SessionError, SessionRegistry};
pub use waiting_pool::WaitingPool;
