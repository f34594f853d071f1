use std::{env, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use pairline_engine::gateway::ZarinpalConfig;
use pls_common::Secret;

const DEFAULT_PLS_HOST: &str = "127.0.0.1";
const DEFAULT_PLS_PORT: u16 = 8370;
const DEFAULT_PAIRING_FEE: i64 = 2;
const DEFAULT_SIGNUP_BONUS: i64 = 15;
const DEFAULT_REFERRAL_REWARD: i64 = 20;
const DEFAULT_WAITING_TIMEOUT: Duration = Duration::minutes(15);
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_TRANSPORT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Coins debited from each side when a pairing completes.
    pub pairing_fee: i64,
    /// Coins granted on first registration.
    pub signup_bonus: i64,
    /// Coins granted to the inviter when an invited user first shows up.
    pub referral_reward: i64,
    /// How long a match request may sit in the waiting pool before it is evicted and the user
    /// notified.
    pub waiting_timeout: Duration,
    /// How often the sweep worker looks for stale waiting entries.
    pub sweep_interval: StdDuration,
    /// Payment gateway configuration.
    pub zarinpal: ZarinpalConfig,
    /// Outbound bot transport configuration.
    pub transport: TransportConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PLS_HOST.to_string(),
            port: DEFAULT_PLS_PORT,
            database_url: String::default(),
            pairing_fee: DEFAULT_PAIRING_FEE,
            signup_bonus: DEFAULT_SIGNUP_BONUS,
            referral_reward: DEFAULT_REFERRAL_REWARD,
            waiting_timeout: DEFAULT_WAITING_TIMEOUT,
            sweep_interval: StdDuration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            zarinpal: ZarinpalConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PLS_HOST").ok().unwrap_or_else(|| DEFAULT_PLS_HOST.into());
        let port = env::var("PLS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for PLS_PORT. {e} Using the default, {DEFAULT_PLS_PORT}, instead.");
                    DEFAULT_PLS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PLS_PORT);
        let database_url = env::var("PLS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PLS_DATABASE_URL is not set. Please set it to the URL for the PairLine database.");
            String::default()
        });
        let pairing_fee = parse_coin_value("PLS_PAIRING_FEE", DEFAULT_PAIRING_FEE);
        let signup_bonus = parse_coin_value("PLS_SIGNUP_BONUS", DEFAULT_SIGNUP_BONUS);
        let referral_reward = parse_coin_value("PLS_REFERRAL_REWARD", DEFAULT_REFERRAL_REWARD);
        let waiting_timeout = env::var("PLS_WAITING_TIMEOUT_MINS")
            .map_err(|_| {
                info!(
                    "🪛️ PLS_WAITING_TIMEOUT_MINS is not set. Using the default value of {} min.",
                    DEFAULT_WAITING_TIMEOUT.num_minutes()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::minutes)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for PLS_WAITING_TIMEOUT_MINS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_WAITING_TIMEOUT);
        let sweep_interval = env::var("PLS_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(StdDuration::from_secs)
            .unwrap_or(StdDuration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS));
        let zarinpal = ZarinpalConfig::from_env_or_default();
        let transport = TransportConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            pairing_fee,
            signup_bonus,
            referral_reward,
            waiting_timeout,
            sweep_interval,
            zarinpal,
            transport,
        }
    }
}

fn parse_coin_value(var: &str, default: i64) -> i64 {
    match env::var(var) {
        Ok(s) => s.parse::<i64>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {var}: {e}. Using the default of {default}.");
            default
        }),
        Err(_) => default,
    }
}

//-------------------------------------------  TransportConfig  -------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct TransportConfig {
    /// Base URL of the bot API, e.g. "https://api.telegram.org".
    pub api_url: String,
    pub bot_token: Secret<String>,
    pub timeout: StdDuration,
}

impl TransportConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("PLS_BOT_API_URL").unwrap_or_else(|_| DEFAULT_TRANSPORT_API_URL.to_string());
        let bot_token = env::var("PLS_BOT_TOKEN").map(Secret::new).unwrap_or_else(|_| {
            error!("🪛️ PLS_BOT_TOKEN is not set. Outbound messages will be rejected by the transport.");
            Secret::default()
        });
        let timeout = env::var("PLS_BOT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(StdDuration::from_secs)
            .unwrap_or(StdDuration::from_secs(DEFAULT_TRANSPORT_TIMEOUT_SECS));
        Self { api_url, bot_token, timeout }
    }
}
