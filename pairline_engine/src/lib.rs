//! PairLine Engine
//!
//! The PairLine engine is the core of an anonymous one-on-one chat service. It pairs users who are
//! looking for a partner, relays messages between the two sides of a live session, and reconciles
//! coin purchases made through an external payment gateway.
//!
//! The library is divided into three main sections:
//! 1. Database management ([`mod@sqlite`]). SQLite is the supported backend. You should never need
//!    to access the database directly; use the public APIs instead. The exception is the data types
//!    used in the database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). [`PairingApi`] drives the waiting pool and the session
//!    registry, [`PaymentFlowApi`] drives purchase creation and reconciliation, and [`UserApi`]
//!    covers the thin registration/profile/referral surface. Backends implement the traits in the
//!    [`mod@traits`] module to plug in under these APIs.
//! 3. The collaborator seams ([`mod@traits`]): the payment gateway and the outbound message
//!    transport are injected behind traits, with concrete implementations in [`mod@gateway`] and in
//!    the server crate respectively.
//!
//! The engine also emits events when sessions start or end and when a payment settles. A simple
//! actor framework lets you hook into these events and perform custom actions.
pub mod api;
pub mod db_types;
pub mod events;
pub mod gateway;
pub mod matching;
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    errors::{PairingError, PaymentFlowError},
    pairing_api::{MatchOutcome, PairingApi, RelayOutcome},
    payment_flow_api::{PaymentFlowApi, PurchaseTicket, ReconcileOutcome},
    user_api::UserApi,
};
pub use gateway::ZarinpalGateway;
pub use sqlite::SqliteDatabase;
pub use traits::{
    DeliveryError,
    GatewayError,
    MessageSink,
    PaymentGateway,
    PaymentLedgerDatabase,
    PaymentLedgerError,
    UserAccountError,
    UserManagement,
};
