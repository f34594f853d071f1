use pairline_engine::db_types::{Gender, UserId};
use pls_common::{Coins, Rial};
use serde::{Deserialize, Serialize};

/// One inbound event from the bot transport. Commands carry their arguments in the optional
/// fields; a plain message carries only `text` or `photo_ref`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundUpdate {
    pub sender_id: UserId,
    #[serde(default)]
    pub command: Option<UpdateCommand>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
    #[serde(default)]
    pub desired_gender: Option<Gender>,
    #[serde(default)]
    pub referrer: Option<UserId>,
    #[serde(default)]
    pub registration: Option<RegistrationForm>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCommand {
    Start,
    Register,
    Match,
    End,
    Profile,
    Balance,
    Buy,
    Report,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub gender: Gender,
    pub province: String,
    pub city: String,
    pub age: i64,
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl RegistrationForm {
    /// The original registration wizard's input rules, applied in one shot.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().len() < 2 {
            return Err("Please enter a valid name.".to_string());
        }
        if self.age <= 14 {
            return Err("You must be over 14 years old.".to_string());
        }
        if self.age > 100 {
            return Err("Please enter a valid age.".to_string());
        }
        Ok(())
    }
}

//-------------------------------------------  Coin packages  ---------------------------------------------------------
#[derive(Debug, Clone, Copy)]
pub struct CoinPackage {
    pub code: &'static str,
    pub amount_minor: i64,
    pub coins: i64,
}

impl CoinPackage {
    pub fn amount(&self) -> Rial {
        Rial::from(self.amount_minor)
    }

    pub fn granted(&self) -> Coins {
        Coins::from(self.coins)
    }

    pub fn description(&self) -> String {
        format!("Purchase of {} coins", self.coins)
    }
}

pub const COIN_PACKAGES: [CoinPackage; 3] = [
    CoinPackage { code: "coins50", amount_minor: 25_000, coins: 50 },
    CoinPackage { code: "coins120", amount_minor: 50_000, coins: 120 },
    CoinPackage { code: "coins300", amount_minor: 100_000, coins: 300 },
];

pub fn find_package(code: &str) -> Option<&'static CoinPackage> {
    COIN_PACKAGES.iter().find(|p| p.code == code)
}

//-------------------------------------------  Wire responses  --------------------------------------------------------
/// The gateway redirects the buyer's browser here, so the query parameter names are the
/// gateway's, not ours.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    #[serde(rename = "Authority")]
    pub authority: String,
    #[serde(rename = "Status")]
    pub status: String,
}

impl CallbackParams {
    pub fn reported_ok(&self) -> bool {
        self.status == "OK"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub status: String,
}

impl JsonResponse {
    pub fn new<S: Into<String>>(status: S) -> Self {
        Self { status: status.into() }
    }
}
