use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use pls_common::Coins;

use crate::{
    db_types::{NewReport, NewUser, UserId, UserProfile},
    traits::{UserAccountError, UserManagement},
};

/// The thin collaborator surface: registration, profile lookups, referral rewards and report
/// bookkeeping. No algorithmic content; every call is a direct pass-through to the store with a
/// guard or two.
pub struct UserApi<B> {
    db: B,
}

impl<B> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi")
    }
}

impl<B: Clone> Clone for UserApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> UserApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> UserApi<B>
where B: UserManagement
{
    /// Registers the user if they are new, crediting the signup bonus on first insert. Returns the
    /// stored profile and whether this call created it.
    pub async fn register(&self, user: NewUser, signup_bonus: Coins) -> Result<(UserProfile, bool), UserAccountError> {
        let id = user.telegram_id;
        let (profile, created) = self.db.create_user(user, signup_bonus).await?;
        if created {
            info!("🧑️ Registered {id} with a signup bonus of {signup_bonus}");
        } else {
            debug!("🧑️ {id} tried to register again; keeping the existing profile");
        }
        Ok((profile, created))
    }

    pub async fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, UserAccountError> {
        self.db.fetch_user(user_id).await
    }

    pub async fn balance(&self, user_id: UserId) -> Result<Coins, UserAccountError> {
        self.db.coin_balance(user_id).await
    }

    /// Applies an invite reward. Self-referrals are ignored, and the reward is paid at most once
    /// per invited user however many times the invite link is replayed.
    pub async fn handle_referral(
        &self,
        inviter: UserId,
        invited: UserId,
        reward: Coins,
    ) -> Result<bool, UserAccountError> {
        if inviter == invited {
            debug!("🧑️ {inviter} tried to refer themselves; ignoring");
            return Ok(false);
        }
        let rewarded = self.db.record_referral(inviter, invited, reward).await?;
        if rewarded {
            info!("🧑️ {inviter} earned {reward} for inviting {invited}");
        }
        Ok(rewarded)
    }

    pub async fn report(&self, report: NewReport) -> Result<(), UserAccountError> {
        info!("🚨️ {} reported {}", report.reporter_id, report.reported_id);
        self.db.record_report(report).await
    }

    pub async fn ban(&self, user_id: UserId, until: DateTime<Utc>) -> Result<(), UserAccountError> {
        warn!("🚨️ Banning {user_id} until {until}");
        self.db.ban_user(user_id, until).await
    }
}
