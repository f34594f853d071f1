//! `SqliteDatabase` is the concrete store backend for the PairLine engine.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the store traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use pls_common::Coins;
use sqlx::SqlitePool;

use super::db::{create_database_if_missing, new_pool, payments, referrals, reports, run_migrations, users};
use crate::{
    db_types::{AuthorityToken, NewPaymentRequest, NewReport, NewUser, PaymentRequest, PaymentStatus, UserId, UserProfile},
    traits::{PaymentLedgerDatabase, PaymentLedgerError, SettleResult, UserAccountError, UserManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database at `url`, creating the file and applying pending migrations as
    /// needed.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        create_database_if_missing(url).await?;
        let pool = new_pool(url, max_connections).await?;
        run_migrations(&pool).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl UserManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: UserId) -> Result<Option<UserProfile>, UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        users::user_by_id(user_id, &mut conn).await
    }

    async fn create_user(&self, user: NewUser, signup_bonus: Coins) -> Result<(UserProfile, bool), UserAccountError> {
        let user_id = user.telegram_id;
        let mut conn = self.pool.acquire().await?;
        match users::insert_if_absent(user, signup_bonus, &mut conn).await? {
            Some(profile) => Ok((profile, true)),
            None => {
                let existing = users::user_by_id(user_id, &mut conn)
                    .await?
                    .ok_or(UserAccountError::UserNotFound(user_id))?;
                Ok((existing, false))
            },
        }
    }

    async fn coin_balance(&self, user_id: UserId) -> Result<Coins, UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        users::coin_balance(user_id, &mut conn).await
    }

    async fn credit_coins(&self, user_id: UserId, amount: Coins) -> Result<Coins, UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        users::add_coins(user_id, amount, &mut conn).await
    }

    async fn debit_pairing_fee(&self, a: UserId, b: UserId, fee: Coins) -> Result<(), UserAccountError> {
        let mut tx = self.pool.begin().await?;
        if !users::try_debit(a, fee, &mut tx).await? {
            return Err(UserAccountError::InsufficientFunds(a));
        }
        if !users::try_debit(b, fee, &mut tx).await? {
            // dropping the transaction rolls the first debit back
            return Err(UserAccountError::InsufficientFunds(b));
        }
        tx.commit().await?;
        trace!("🧑️ Debited {fee} from {a} and {b}");
        Ok(())
    }

    async fn refund_pairing_fee(&self, a: UserId, b: UserId, fee: Coins) -> Result<(), UserAccountError> {
        let mut tx = self.pool.begin().await?;
        users::add_coins(a, fee, &mut tx).await?;
        users::add_coins(b, fee, &mut tx).await?;
        tx.commit().await?;
        debug!("🧑️ Refunded {fee} to {a} and {b}");
        Ok(())
    }

    async fn record_referral(
        &self,
        inviter: UserId,
        invited: UserId,
        reward: Coins,
    ) -> Result<bool, UserAccountError> {
        let mut tx = self.pool.begin().await?;
        if !referrals::insert_if_absent(inviter, invited, &mut tx).await? {
            return Ok(false);
        }
        users::add_coins(inviter, reward, &mut tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn record_report(&self, report: NewReport) -> Result<(), UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        reports::insert(report, &mut conn).await
    }

    async fn ban_user(&self, user_id: UserId, until: DateTime<Utc>) -> Result<(), UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        users::set_banned_until(user_id, until, &mut conn).await
    }
}

impl PaymentLedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_payment_request(&self, request: NewPaymentRequest) -> Result<PaymentRequest, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        payments::insert_new(request, &mut conn).await
    }

    async fn fetch_payment_request(
        &self,
        authority: &AuthorityToken,
    ) -> Result<Option<PaymentRequest>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_by_authority(authority, &mut conn).await
    }

    async fn settle_payment_request(
        &self,
        authority: &AuthorityToken,
        outcome: PaymentStatus,
    ) -> Result<SettleResult, PaymentLedgerError> {
        if !outcome.is_terminal() {
            return Err(PaymentLedgerError::NotATerminalStatus(outcome));
        }
        let mut tx = self.pool.begin().await?;
        match payments::mark_terminal(authority, outcome, &mut tx).await? {
            Some(row) => {
                // this call won the transition; the credit belongs to the same transaction
                if row.status == PaymentStatus::Success {
                    users::add_coins(row.user_id, row.coins, &mut tx).await?;
                }
                tx.commit().await?;
                Ok(SettleResult { request: row, transitioned: true })
            },
            None => {
                let row = payments::fetch_by_authority(authority, &mut tx)
                    .await?
                    .ok_or_else(|| PaymentLedgerError::UnknownAuthority(authority.clone()))?;
                Ok(SettleResult { request: row, transitioned: false })
            },
        }
    }
}
