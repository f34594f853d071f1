use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use pls_common::{Coins, Rial};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------       UserId       ----------------------------------------------------------
/// The transport-assigned numeric id of a user. This is the primary key for everything the engine
/// knows about a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl UserId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------       Gender       ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(pub String);

impl FromStr for Gender {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" | "male" | "M" | "m" => Ok(Self::Male),
            "Female" | "female" | "F" | "f" => Ok(Self::Female),
            s => Err(ConversionError(format!("Invalid gender: {s}"))),
        }
    }
}

impl From<String> for Gender {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid gender stored in the database: {value}. Defaulting to Male");
            Gender::Male
        })
    }
}

//--------------------------------------     UserProfile     ---------------------------------------------------------
/// A registered user, as stored in the `users` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub telegram_id: UserId,
    pub name: String,
    pub gender: Gender,
    pub province: String,
    pub city: String,
    pub age: i64,
    pub profile_pic: Option<String>,
    pub coins: Coins,
    pub registered_at: DateTime<Utc>,
    pub banned_until: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn is_banned(&self, now: DateTime<Utc>) -> bool {
        matches!(self.banned_until, Some(until) if until > now)
    }
}

//--------------------------------------       NewUser       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub telegram_id: UserId,
    pub name: String,
    pub gender: Gender,
    pub province: String,
    pub city: String,
    pub age: i64,
    pub profile_pic: Option<String>,
}

//--------------------------------------    WaitingEntry     ---------------------------------------------------------
/// A pending match request. Ephemeral and in-memory, owned exclusively by the waiting pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingEntry {
    pub user_id: UserId,
    pub gender: Gender,
    pub desired_gender: Gender,
    pub enqueued_at: DateTime<Utc>,
}

impl WaitingEntry {
    pub fn new(user_id: UserId, gender: Gender, desired_gender: Gender) -> Self {
        Self { user_id, gender, desired_gender, enqueued_at: Utc::now() }
    }

    /// Mutual compatibility: each side must be what the other is looking for.
    pub fn is_compatible_with(&self, other: &WaitingEntry) -> bool {
        self.gender == other.desired_gender && other.gender == self.desired_gender
    }
}

//--------------------------------------   MessagePayload    ---------------------------------------------------------
/// What gets relayed between the two sides of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessagePayload {
    Text(String),
    /// A transport-side file reference, not the image bytes themselves.
    Photo(String),
}

//--------------------------------------   AuthorityToken    ---------------------------------------------------------
/// The globally unique token the gateway assigns to one purchase attempt. Doubles as the
/// idempotency key for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct AuthorityToken(pub String);

impl FromStr for AuthorityToken {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for AuthorityToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for AuthorityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AuthorityToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
/// Lifecycle of a purchase attempt. `Pending` transitions exactly once to one of the two terminal
/// states and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The row has been created, but the gateway has not confirmed an outcome yet.
    Pending,
    /// The gateway verified the payment and the coins have been credited.
    Success,
    /// The payment was rejected or abandoned. No coins were credited.
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Success => write!(f, "Success"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status stored in the database: {value}. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------   PaymentRequest    ---------------------------------------------------------
/// A purchase attempt, as stored in the `payments` table. Rows are never deleted; the table is the
/// audit trail.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: i64,
    pub user_id: UserId,
    pub amount: Rial,
    pub coins: Coins,
    pub authority: AuthorityToken,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//-------------------------------------- NewPaymentRequest   ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPaymentRequest {
    pub user_id: UserId,
    pub amount: Rial,
    pub coins: Coins,
    pub authority: AuthorityToken,
}

impl NewPaymentRequest {
    pub fn new(user_id: UserId, amount: Rial, coins: Coins, authority: AuthorityToken) -> Self {
        Self { user_id, amount, coins, authority }
    }
}

//--------------------------------------      NewReport      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub reporter_id: UserId,
    pub reported_id: UserId,
    pub reason: Option<String>,
}
