use chrono::{DateTime, Utc};
use pls_common::Coins;
use thiserror::Error;

use crate::db_types::{NewReport, NewUser, UserId, UserProfile};

/// Store operations for user records, coin balances and the invite/report bookkeeping.
///
/// Balance invariant: no operation may drive a user's coin balance below zero. Debits are
/// compare-and-decrement at the store level, so a balance observed before an await point does not
/// need to still hold when the debit runs.
#[allow(async_fn_in_trait)]
pub trait UserManagement: Clone {
    /// Fetches the user with the given id, or `None` if they have not registered.
    async fn fetch_user(&self, user_id: UserId) -> Result<Option<UserProfile>, UserAccountError>;

    /// Inserts the user if no row with the same id exists yet, crediting the signup bonus on a
    /// fresh insert. Returns the stored profile and whether this call created it.
    async fn create_user(&self, user: NewUser, signup_bonus: Coins) -> Result<(UserProfile, bool), UserAccountError>;

    /// The current coin balance for the user. Errors with [`UserAccountError::UserNotFound`] for
    /// unregistered ids.
    async fn coin_balance(&self, user_id: UserId) -> Result<Coins, UserAccountError>;

    /// Credits `amount` coins to the user.
    async fn credit_coins(&self, user_id: UserId, amount: Coins) -> Result<Coins, UserAccountError>;

    /// Debits the pairing fee from both users in a single atomic transaction.
    ///
    /// Each debit is guarded by a balance check. If either check fails, nothing is debited and
    /// [`UserAccountError::InsufficientFunds`] identifies the side that was short.
    async fn debit_pairing_fee(&self, a: UserId, b: UserId, fee: Coins) -> Result<(), UserAccountError>;

    /// Returns a previously taken pairing fee to both users. Used to roll back a debit when the
    /// session could not be installed after all.
    async fn refund_pairing_fee(&self, a: UserId, b: UserId, fee: Coins) -> Result<(), UserAccountError>;

    /// Records that `invited` joined through `inviter`'s link and credits the reward to the
    /// inviter, both in one transaction. Idempotent on the invited id: repeated calls (or a second
    /// inviter claiming the same user) return `false` and credit nothing.
    async fn record_referral(&self, inviter: UserId, invited: UserId, reward: Coins)
        -> Result<bool, UserAccountError>;

    /// Appends a report row. Pure bookkeeping; no moderation side effects.
    async fn record_report(&self, report: NewReport) -> Result<(), UserAccountError>;

    /// Marks the user as banned until the given instant.
    async fn ban_user(&self, user_id: UserId, until: DateTime<Utc>) -> Result<(), UserAccountError>;
}

#[derive(Debug, Clone, Error)]
pub enum UserAccountError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The user {0} is not registered")]
    UserNotFound(UserId),
    #[error("User {0} does not have enough coins")]
    InsufficientFunds(UserId),
}

impl From<sqlx::Error> for UserAccountError {
    fn from(e: sqlx::Error) -> Self {
        UserAccountError::DatabaseError(e.to_string())
    }
}
