use std::{env, sync::Arc, time::Duration};

use log::*;
use pls_common::{Rial, Secret};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{
    db_types::AuthorityToken,
    traits::{GatewayError, PaymentGateway, PaymentIntent},
};

const DEFAULT_REQUEST_URL: &str = "https://api.zarinpal.com/pg/v4/payment/request.json";
const DEFAULT_VERIFY_URL: &str = "https://api.zarinpal.com/pg/v4/payment/verify.json";
const DEFAULT_START_PAY_URL: &str = "https://www.zarinpal.com/pg/StartPay";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_RETRIES: u32 = 2;

// gateway response codes
const CODE_VERIFIED: i64 = 100;
const CODE_ALREADY_VERIFIED: i64 = 101;

#[derive(Clone, Debug)]
pub struct ZarinpalConfig {
    pub merchant_id: Secret<String>,
    pub request_url: String,
    pub verify_url: String,
    pub start_pay_url: String,
    pub callback_url: String,
    pub timeout: Duration,
    /// Retries after the first attempt, for transport-level failures only.
    pub max_retries: u32,
}

impl Default for ZarinpalConfig {
    fn default() -> Self {
        Self {
            merchant_id: Secret::default(),
            request_url: DEFAULT_REQUEST_URL.to_string(),
            verify_url: DEFAULT_VERIFY_URL.to_string(),
            start_pay_url: DEFAULT_START_PAY_URL.to_string(),
            callback_url: String::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ZarinpalConfig {
    pub fn from_env_or_default() -> Self {
        let merchant_id = env::var("PLS_ZARINPAL_MERCHANT_ID").map(Secret::new).unwrap_or_else(|_| {
            error!("🪛️ PLS_ZARINPAL_MERCHANT_ID is not set. Payment requests will be rejected by the gateway.");
            Secret::default()
        });
        let request_url = env::var("PLS_ZARINPAL_REQUEST_URL").unwrap_or_else(|_| DEFAULT_REQUEST_URL.to_string());
        let verify_url = env::var("PLS_ZARINPAL_VERIFY_URL").unwrap_or_else(|_| DEFAULT_VERIFY_URL.to_string());
        let start_pay_url = env::var("PLS_ZARINPAL_START_PAY_URL").unwrap_or_else(|_| DEFAULT_START_PAY_URL.to_string());
        let callback_url = env::var("PLS_CALLBACK_URL").unwrap_or_else(|_| {
            error!("🪛️ PLS_CALLBACK_URL is not set. The gateway will have nowhere to send buyers back to.");
            String::default()
        });
        let timeout = env::var("PLS_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let max_retries =
            env::var("PLS_GATEWAY_MAX_RETRIES").ok().and_then(|s| s.parse::<u32>().ok()).unwrap_or(DEFAULT_MAX_RETRIES);
        Self { merchant_id, request_url, verify_url, start_pay_url, callback_url, timeout, max_retries }
    }
}

#[derive(Serialize)]
struct PaymentRequestBody<'a> {
    merchant_id: &'a str,
    amount: i64,
    description: &'a str,
    callback_url: &'a str,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    merchant_id: &'a str,
    authority: &'a str,
    amount: i64,
}

#[derive(Clone)]
pub struct ZarinpalGateway {
    config: ZarinpalConfig,
    client: Arc<Client>,
}

impl ZarinpalGateway {
    pub fn new(config: ZarinpalConfig) -> Result<Self, GatewayError> {
        let client =
            Client::builder().timeout(config.timeout).build().map_err(|e| GatewayError::Http(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// POSTs `body` to `url`, retrying transport-level failures with exponential backoff. A
    /// response the gateway actually produced (whatever its code) is never retried.
    async fn post_with_retry<B: Serialize>(&self, url: &str, body: &B) -> Result<Value, GatewayError> {
        let mut backoff = Duration::from_millis(500);
        let mut last_err = GatewayError::Timeout;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!("🏦️ Retrying gateway call to {url} (attempt {})", attempt + 1);
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.client.post(url).json(body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_server_error() {
                        last_err = GatewayError::Http(format!("gateway returned {status}"));
                        continue;
                    }
                    return resp.json::<Value>().await.map_err(|e| GatewayError::MalformedResponse(e.to_string()));
                },
                Err(e) if e.is_timeout() => {
                    last_err = GatewayError::Timeout;
                },
                Err(e) => {
                    last_err = GatewayError::Http(e.to_string());
                },
            }
        }
        warn!("🏦️ Gateway call to {url} failed after {} attempt(s): {last_err}", self.config.max_retries + 1);
        Err(last_err)
    }

    /// The v4 API reports `data` as an object on success and an empty array on error, so the code
    /// has to be dug out defensively.
    fn response_code(response: &Value) -> Option<i64> {
        response.get("data").and_then(|d| d.get("code")).and_then(Value::as_i64).or_else(|| {
            response.get("errors").and_then(|e| e.get("code")).and_then(Value::as_i64)
        })
    }
}

impl PaymentGateway for ZarinpalGateway {
    async fn request_payment(&self, amount: Rial, description: &str) -> Result<PaymentIntent, GatewayError> {
        let body = PaymentRequestBody {
            merchant_id: self.config.merchant_id.reveal(),
            amount: amount.value(),
            description,
            callback_url: &self.config.callback_url,
        };
        let response = self.post_with_retry(&self.config.request_url, &body).await?;
        let code = Self::response_code(&response)
            .ok_or_else(|| GatewayError::MalformedResponse("no response code".to_string()))?;
        if code != CODE_VERIFIED {
            return Err(GatewayError::Rejected(code));
        }
        let authority = response
            .get("data")
            .and_then(|d| d.get("authority"))
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::MalformedResponse("no authority in response".to_string()))?;
        let redirect_url = format!("{}/{authority}", self.config.start_pay_url);
        debug!("🏦️ Gateway opened payment of {amount}, authority [{authority}]");
        Ok(PaymentIntent { authority: AuthorityToken(authority.to_string()), redirect_url })
    }

    async fn verify_payment(&self, authority: &AuthorityToken, amount: Rial) -> Result<bool, GatewayError> {
        let body = VerifyBody {
            merchant_id: self.config.merchant_id.reveal(),
            authority: authority.as_str(),
            amount: amount.value(),
        };
        let response = self.post_with_retry(&self.config.verify_url, &body).await?;
        let code = Self::response_code(&response)
            .ok_or_else(|| GatewayError::MalformedResponse("no response code".to_string()))?;
        // 101 means "already verified": a duplicate verify of a paid transaction must not read as
        // a failure, or a racing callback could flip a paid row to Failed
        let verified = code == CODE_VERIFIED || code == CODE_ALREADY_VERIFIED;
        debug!("🏦️ Verification for [{authority}]: code {code} → {}", if verified { "verified" } else { "rejected" });
        Ok(verified)
    }
}
