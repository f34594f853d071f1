//! Dispatch of inbound bot updates.
//!
//! Everything here is a thin collaborator: each branch turns a well-formed update into one engine
//! call and some outbound messages. Input problems are answered with a re-prompt through the
//! sink, not an HTTP error — the transport already accepted the update.
use chrono::Utc;
use log::*;
use pairline_engine::{
    db_types::{MessagePayload, NewReport, NewUser, UserId, UserProfile},
    MatchOutcome,
    MessageSink,
    PairingApi,
    PairingError,
    PaymentFlowApi,
    PaymentGateway,
    PaymentLedgerDatabase,
    RelayOutcome,
    UserAccountError,
    UserApi,
    UserManagement,
};
use pls_common::Coins;

use crate::{
    data_objects::{find_package, InboundUpdate, UpdateCommand, COIN_PACKAGES},
    errors::ServerError,
};

/// The handful of knobs the dispatcher needs from the server configuration.
#[derive(Clone, Debug)]
pub struct AppSettings {
    pub signup_bonus: Coins,
    pub referral_reward: Coins,
}

/// Sends `text` to `user`, swallowing delivery failures. User feedback is best-effort
/// everywhere in the dispatcher.
async fn notify<S: MessageSink>(sink: &S, user: UserId, text: &str) {
    if let Err(e) = sink.send_text(user, text).await {
        debug!("📨️ Could not notify {user}: {e}");
    }
}

pub async fn dispatch_update<B, G, S>(
    update: InboundUpdate,
    users: &UserApi<B>,
    pairing: &PairingApi<B, S>,
    payments: &PaymentFlowApi<B, G>,
    sink: &S,
    settings: &AppSettings,
) -> Result<(), ServerError>
where
    B: UserManagement + PaymentLedgerDatabase,
    G: PaymentGateway,
    S: MessageSink,
{
    let sender = update.sender_id;
    let profile = users.profile(sender).await?;

    // ban gate: banned users get a notice and nothing else
    if let Some(p) = &profile {
        if p.is_banned(Utc::now()) {
            notify(sink, sender, "⛔ Your account is suspended.").await;
            return Ok(());
        }
    }

    match update.command {
        Some(UpdateCommand::Start) => handle_start(update, profile, users, sink, settings).await,
        Some(UpdateCommand::Register) => handle_register(update, profile, users, sink, settings).await,
        // auth gate: everything below requires a registered profile
        _ if profile.is_none() => {
            notify(sink, sender, "❌ You need to register first. Send the start command to begin.").await;
            Ok(())
        },
        Some(UpdateCommand::Match) => handle_match(update, profile.unwrap(), pairing, sink).await,
        Some(UpdateCommand::End) => handle_end(sender, pairing, sink).await,
        Some(UpdateCommand::Profile) => handle_partner_profile(sender, users, pairing, sink).await,
        Some(UpdateCommand::Balance) => {
            let balance = users.balance(sender).await?;
            notify(sink, sender, &format!("💰 Your balance is {balance}.")).await;
            Ok(())
        },
        Some(UpdateCommand::Buy) => handle_buy(update, payments, sink).await,
        Some(UpdateCommand::Report) => handle_report(update, users, pairing, sink).await,
        None => handle_relay(update, pairing, sink).await,
    }
}

async fn handle_start<B, S>(
    update: InboundUpdate,
    profile: Option<UserProfile>,
    users: &UserApi<B>,
    sink: &S,
    settings: &AppSettings,
) -> Result<(), ServerError>
where
    B: UserManagement,
    S: MessageSink,
{
    let sender = update.sender_id;
    if profile.is_some() {
        notify(sink, sender, "👋 Welcome back!").await;
        return Ok(());
    }
    // a first contact through an invite link pays the inviter, registered or not yet
    if let Some(referrer) = update.referrer {
        match users.handle_referral(referrer, sender, settings.referral_reward).await {
            Ok(_) => {},
            Err(UserAccountError::UserNotFound(id)) => {
                debug!("🧑️ Ignoring a referral from unknown inviter {id}");
            },
            Err(e) => return Err(e.into()),
        }
    }
    notify(sink, sender, "👋 Welcome! Send the register command with your profile details to sign up.").await;
    Ok(())
}

async fn handle_register<B, S>(
    update: InboundUpdate,
    profile: Option<UserProfile>,
    users: &UserApi<B>,
    sink: &S,
    settings: &AppSettings,
) -> Result<(), ServerError>
where
    B: UserManagement,
    S: MessageSink,
{
    let sender = update.sender_id;
    if profile.is_some() {
        notify(sink, sender, "✅ You are already registered.").await;
        return Ok(());
    }
    let Some(form) = update.registration else {
        notify(sink, sender, "❌ Registration details are missing.").await;
        return Ok(());
    };
    if let Err(reason) = form.validate() {
        notify(sink, sender, &format!("❌ {reason}")).await;
        return Ok(());
    }
    let new_user = NewUser {
        telegram_id: sender,
        name: form.name.trim().to_string(),
        gender: form.gender,
        province: form.province,
        city: form.city,
        age: form.age,
        profile_pic: form.photo_ref,
    };
    let (_, created) = users.register(new_user, settings.signup_bonus).await?;
    if created {
        notify(
            sink,
            sender,
            &format!("✅ Registration complete! 🎁 {} added to your account.", settings.signup_bonus),
        )
        .await;
    } else {
        notify(sink, sender, "✅ You are already registered.").await;
    }
    Ok(())
}

async fn handle_match<B, S>(
    update: InboundUpdate,
    profile: UserProfile,
    pairing: &PairingApi<B, S>,
    sink: &S,
) -> Result<(), ServerError>
where
    B: UserManagement,
    S: MessageSink,
{
    let sender = update.sender_id;
    let Some(desired) = update.desired_gender else {
        notify(sink, sender, "👫 Which gender would you like to be connected to?").await;
        return Ok(());
    };
    match pairing.request_match(sender, profile.gender, desired).await {
        Ok(MatchOutcome::Paired { partner }) => {
            notify(sink, sender, "✅ Partner found! Say hi.").await;
            notify(sink, partner, "✅ Partner found! Say hi.").await;
            Ok(())
        },
        Ok(MatchOutcome::Queued) => {
            notify(sink, sender, "⏳ Looking for a partner...").await;
            Ok(())
        },
        Ok(MatchOutcome::InsufficientFunds) => {
            notify(sink, sender, "❌ Not enough coins for a chat. Buy a coin package to continue.").await;
            Ok(())
        },
        Err(PairingError::AlreadyInSession(_)) => {
            notify(sink, sender, "❌ You are already in a chat.").await;
            Ok(())
        },
        Err(e) => Err(e.into()),
    }
}

async fn handle_end<B, S>(sender: UserId, pairing: &PairingApi<B, S>, sink: &S) -> Result<(), ServerError>
where
    B: UserManagement,
    S: MessageSink,
{
    match pairing.end_session(sender).await {
        Some(partner) => {
            notify(sink, sender, "❌ Chat ended.").await;
            notify(sink, partner, "❌ Your partner left the chat.").await;
        },
        None => notify(sink, sender, "❌ There is no active chat.").await,
    }
    Ok(())
}

async fn handle_partner_profile<B, S>(
    sender: UserId,
    users: &UserApi<B>,
    pairing: &PairingApi<B, S>,
    sink: &S,
) -> Result<(), ServerError>
where
    B: UserManagement,
    S: MessageSink,
{
    let Some(partner) = pairing.partner_of(sender).await else {
        notify(sink, sender, "❌ There is no partner to show.").await;
        return Ok(());
    };
    let Some(profile) = users.profile(partner).await? else {
        notify(sink, sender, "❌ The partner's profile could not be found.").await;
        return Ok(());
    };
    if let Some(pic) = &profile.profile_pic {
        if let Err(e) = sink.send(sender, &MessagePayload::Photo(pic.clone())).await {
            debug!("📨️ Could not send partner photo to {sender}: {e}");
        }
    }
    let text = format!(
        "👤 Partner profile\n\n🔹 Name: {}\n🔹 Gender: {}\n🔹 Age: {}\n📍 {} - {}",
        profile.name, profile.gender, profile.age, profile.province, profile.city
    );
    notify(sink, sender, &text).await;
    Ok(())
}

async fn handle_buy<B, G, S>(
    update: InboundUpdate,
    payments: &PaymentFlowApi<B, G>,
    sink: &S,
) -> Result<(), ServerError>
where
    B: PaymentLedgerDatabase,
    G: PaymentGateway,
    S: MessageSink,
{
    let sender = update.sender_id;
    let package = update.package.as_deref().and_then(find_package);
    let Some(package) = package else {
        let catalogue = COIN_PACKAGES
            .iter()
            .map(|p| format!("💰 {}: {} coins for {}", p.code, p.coins, p.amount()))
            .collect::<Vec<_>>()
            .join("\n");
        notify(sink, sender, &format!("💳 Pick one of the coin packages:\n{catalogue}")).await;
        return Ok(());
    };
    match payments.create_purchase(sender, package.amount(), package.granted(), &package.description()).await {
        Ok(ticket) => {
            let text = format!(
                "💳 Payment details:\n\n💰 Amount: {}\n🎁 You get: {}\n\n🔗 Pay here:\n{}\n\n⚠️ Your coins are \
                 added once the payment is confirmed.",
                ticket.request.amount, ticket.request.coins, ticket.redirect_url
            );
            notify(sink, sender, &text).await;
            Ok(())
        },
        Err(e) => {
            warn!("💳️ Could not open a purchase for {sender}: {e}");
            notify(sink, sender, "❌ Could not reach the payment gateway. Please try again later.").await;
            Ok(())
        },
    }
}

async fn handle_report<B, S>(
    update: InboundUpdate,
    users: &UserApi<B>,
    pairing: &PairingApi<B, S>,
    sink: &S,
) -> Result<(), ServerError>
where
    B: UserManagement,
    S: MessageSink,
{
    let sender = update.sender_id;
    let Some(partner) = pairing.partner_of(sender).await else {
        notify(sink, sender, "❌ There is no one to report.").await;
        return Ok(());
    };
    users.report(NewReport { reporter_id: sender, reported_id: partner, reason: update.reason }).await?;
    notify(sink, sender, "🚨 Report received. Thank you.").await;
    Ok(())
}

async fn handle_relay<B, S>(update: InboundUpdate, pairing: &PairingApi<B, S>, sink: &S) -> Result<(), ServerError>
where
    B: UserManagement,
    S: MessageSink,
{
    let sender = update.sender_id;
    let payload = match (update.text, update.photo_ref) {
        (Some(text), _) => MessagePayload::Text(text),
        (None, Some(photo)) => MessagePayload::Photo(photo),
        (None, None) => return Ok(()),
    };
    match pairing.relay(sender, payload).await? {
        RelayOutcome::Delivered { .. } => {},
        RelayOutcome::DeliveryFailed { .. } => {
            notify(sink, sender, "⚠️ Your partner could not be reached. The chat is still open.").await;
        },
        RelayOutcome::NotInSession => {
            notify(sink, sender, "❌ You are not in a chat. Send the match command to find a partner.").await;
        },
    }
    Ok(())
}
