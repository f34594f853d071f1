//! The concrete payment gateway client.
//!
//! [`ZarinpalGateway`] speaks the Zarinpal v4 JSON API and implements the
//! [`crate::traits::PaymentGateway`] seam. Every call carries an explicit network timeout and a
//! bounded exponential-backoff retry, so a hung gateway can never wedge a handler.
mod zarinpal;

pub use zarinpal::{ZarinpalConfig, ZarinpalGateway};
