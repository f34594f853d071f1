//! # PairLine server
//!
//! This crate hosts the HTTP surface of the PairLine service. It is responsible for:
//! * Receiving inbound bot updates (messages and commands from users) and dispatching them to the
//!   engine.
//! * Receiving the payment gateway's callback and triggering reconciliation.
//! * Delivering outbound messages through the bot transport.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
//!
//! ## Routes
//! * `/health`: a health check that returns a 200 OK response.
//! * `GET /payment/callback`: the gateway's return URL. Idempotent.
//! * `POST /bot/update`: inbound transport events.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod sweep_worker;
pub mod transport;
pub mod update_handler;

#[cfg(test)]
mod endpoint_tests;
