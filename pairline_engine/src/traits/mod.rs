//! The behaviour contracts the engine is built against.
//!
//! Backends (the SQLite store), the payment gateway and the message transport all plug in behind
//! the traits in this module, so the flow logic in [`crate::api`] never touches a concrete
//! database, HTTP client or bot API.
mod gateway;
mod message_sink;
mod payment_ledger;
mod user_store;

pub use gateway::{GatewayError, PaymentGateway, PaymentIntent};
pub use message_sink::{DeliveryError, MessageSink};
pub use payment_ledger::{PaymentLedgerDatabase, PaymentLedgerError, SettleResult};
pub use user_store::{UserAccountError, UserManagement};
