use crate::utils::error::{QuanterraError, Result};
use crate::utils::retry::RetryConfig;
use crate::utils::validation::{
    self, validate_country_code, validate_non_empty_string, validate_positive_number, validate_url,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

/// Deployment environment. Selects the config file and the bronze bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    pub fn bronze_bucket(&self) -> &'static str {
        match self {
            Environment::Dev => "datalake-dev-bronze",
            Environment::Prod => "datalake-prod-bronze",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API credential wrapper. Debug output is redacted so tokens never reach
/// logs via `{:?}` formatting.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when the token is empty or still holds an unexpanded `${VAR}`
    /// placeholder from the config file.
    pub fn is_unset(&self) -> bool {
        self.0.is_empty() || self.0.starts_with("${")
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LakeSettings {
    pub bucket: String,

    /// Object store backend override, e.g. `file:///tmp/lake` for local runs.
    /// Defaults to `gs://{bucket}`.
    #[serde(default)]
    pub url: Option<String>,
}

impl Validate for LakeSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("lake.bucket", &self.bucket)?;
        if let Some(url) = &self.url {
            Url::parse(url).map_err(|e| QuanterraError::InvalidConfigValueError {
                field: "lake.url".to_string(),
                value: url.clone(),
                reason: format!("Invalid URL format: {}", e),
            })?;
        }
        Ok(())
    }
}

fn default_eodhd_base_url() -> String {
    "https://eodhd.com/api/".to_string()
}

fn default_concurrent_requests() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EodhdSettings {
    #[serde(default)]
    pub api_token: ApiToken,

    #[serde(default = "default_eodhd_base_url")]
    pub base_url: String,

    /// Exchanges whose symbol lists are ingested. Empty means every exchange
    /// discovered by the exchanges processor.
    #[serde(default)]
    pub exchanges: Vec<String>,

    /// Exchanges ingested through the end-of-day bulk endpoint.
    #[serde(default)]
    pub exchanges_bulk: Vec<String>,

    /// Instruments as `CODE.EXCHANGE` pairs. Empty means every symbol
    /// discovered by the symbols processor.
    #[serde(default)]
    pub instruments: Vec<String>,

    #[serde(default)]
    pub macro_indicators: Vec<String>,

    #[serde(default)]
    pub macro_countries: Vec<String>,

    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
}

impl Default for EodhdSettings {
    fn default() -> Self {
        Self {
            api_token: ApiToken::default(),
            base_url: default_eodhd_base_url(),
            exchanges: Vec::new(),
            exchanges_bulk: Vec::new(),
            instruments: Vec::new(),
            macro_indicators: Vec::new(),
            macro_countries: Vec::new(),
            concurrent_requests: default_concurrent_requests(),
        }
    }
}

impl Validate for EodhdSettings {
    fn validate(&self) -> Result<()> {
        if self.api_token.is_unset() {
            return Err(QuanterraError::MissingConfigError {
                field: "eodhd.api_token".to_string(),
            });
        }
        validate_url("eodhd.base_url", &self.base_url)?;
        validate_positive_number("eodhd.concurrent_requests", self.concurrent_requests, 1)?;
        for country in &self.macro_countries {
            validate_country_code("eodhd.macro_countries", country)?;
        }
        Ok(())
    }
}

fn default_oanda_base_url() -> String {
    "https://api-fxtrade.oanda.com/v3/".to_string()
}

fn default_granularity() -> String {
    "D".to_string()
}

fn default_candle_count() -> usize {
    50
}

fn default_price() -> String {
    "MBA".to_string()
}

fn default_max_concurrent_fetches() -> usize {
    32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OandaSettings {
    #[serde(default)]
    pub api_token: ApiToken,

    #[serde(default)]
    pub account_id: String,

    #[serde(default = "default_oanda_base_url")]
    pub base_url: String,

    /// Instruments to fetch candles for. Empty means every instrument the
    /// account can trade.
    #[serde(default)]
    pub instruments: Vec<String>,

    #[serde(default = "default_granularity")]
    pub granularity: String,

    #[serde(default = "default_candle_count")]
    pub count: usize,

    /// Price components: mid, bid, ask.
    #[serde(default = "default_price")]
    pub price: String,

    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for OandaSettings {
    fn default() -> Self {
        Self {
            api_token: ApiToken::default(),
            account_id: String::new(),
            base_url: default_oanda_base_url(),
            instruments: Vec::new(),
            granularity: default_granularity(),
            count: default_candle_count(),
            price: default_price(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl Validate for OandaSettings {
    fn validate(&self) -> Result<()> {
        if self.api_token.is_unset() {
            return Err(QuanterraError::MissingConfigError {
                field: "oanda.api_token".to_string(),
            });
        }
        validate_non_empty_string("oanda.account_id", &self.account_id)?;
        validate_url("oanda.base_url", &self.base_url)?;
        validate_positive_number("oanda.count", self.count, 1)?;
        validate_positive_number(
            "oanda.max_concurrent_fetches",
            self.max_concurrent_fetches,
            1,
        )?;

        let valid_granularities = ["D", "M1"];
        if !valid_granularities.contains(&self.granularity.as_str()) {
            return Err(QuanterraError::InvalidConfigValueError {
                field: "oanda.granularity".to_string(),
                value: self.granularity.clone(),
                reason: format!(
                    "Unsupported granularity. Valid granularities: {}",
                    valid_granularities.join(", ")
                ),
            });
        }

        validate_non_empty_string("oanda.price", &self.price)?;
        Ok(())
    }
}

fn default_yahoo_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_yahoo_range() -> String {
    "max".to_string()
}

fn default_yahoo_interval() -> String {
    "1d".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooFinanceSettings {
    #[serde(default = "default_yahoo_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub tickers: Vec<String>,

    /// History window for chart requests, e.g. `max`, `1y`, `5d`.
    #[serde(default = "default_yahoo_range")]
    pub range: String,

    #[serde(default = "default_yahoo_interval")]
    pub interval: String,
}

impl Default for YahooFinanceSettings {
    fn default() -> Self {
        Self {
            base_url: default_yahoo_base_url(),
            tickers: Vec::new(),
            range: default_yahoo_range(),
            interval: default_yahoo_interval(),
        }
    }
}

impl Validate for YahooFinanceSettings {
    fn validate(&self) -> Result<()> {
        validate_url("yahoo_finance.base_url", &self.base_url)?;
        if self.tickers.is_empty() {
            return Err(QuanterraError::MissingConfigError {
                field: "yahoo_finance.tickers".to_string(),
            });
        }
        validate_non_empty_string("yahoo_finance.range", &self.range)?;
        validate_non_empty_string("yahoo_finance.interval", &self.interval)?;
        Ok(())
    }
}

/// Application settings for one environment.
///
/// Loaded from `{config_dir}/{env}.toml`. `${VAR}` placeholders are expanded
/// from the environment where set; credential env vars override file values
/// afterwards. Source sections are validated by the flow that uses them, so
/// an OANDA run does not require EODHD credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(skip)]
    pub environment: Environment,

    pub lake: LakeSettings,

    #[serde(default)]
    pub eodhd: Option<EodhdSettings>,

    #[serde(default)]
    pub oanda: Option<OandaSettings>,

    #[serde(default)]
    pub yahoo_finance: Option<YahooFinanceSettings>,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl Settings {
    pub fn load<P: AsRef<Path>>(config_dir: P, environment: Environment) -> Result<Self> {
        let path = config_dir.as_ref().join(format!("{}.toml", environment));
        if !path.exists() {
            return Err(QuanterraError::ConfigError {
                message: format!("Config file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(QuanterraError::IoError)?;
        Self::from_toml_str(&content, environment)
    }

    pub fn from_toml_str(content: &str, environment: Environment) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        let mut settings: Settings =
            toml::from_str(&processed_content).map_err(|e| QuanterraError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        settings.environment = environment;
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Credential overrides from the environment take precedence over file
    /// values, matching how secrets are mounted in scheduled runs.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("EODHD_API_TOKEN") {
            if let Some(eodhd) = self.eodhd.as_mut() {
                eodhd.api_token = ApiToken::new(token);
            }
        }
        if let Ok(url) = std::env::var("EODHD_BASE_URL") {
            if let Some(eodhd) = self.eodhd.as_mut() {
                eodhd.base_url = url;
            }
        }
        if let Ok(token) = std::env::var("OANDA_API_TOKEN") {
            if let Some(oanda) = self.oanda.as_mut() {
                oanda.api_token = ApiToken::new(token);
            }
        }
        if let Ok(account_id) = std::env::var("OANDA_ACCOUNT_ID") {
            if let Some(oanda) = self.oanda.as_mut() {
                oanda.account_id = account_id;
            }
        }
        if let Ok(bucket) = std::env::var("QUANTERRA_LAKE_BUCKET") {
            self.lake.bucket = bucket;
        }
        if let Ok(url) = std::env::var("QUANTERRA_LAKE_URL") {
            self.lake.url = Some(url);
        }
    }

    pub fn eodhd(&self) -> Result<&EodhdSettings> {
        let eodhd = validation::validate_required_field("eodhd", &self.eodhd)?;
        eodhd.validate()?;
        Ok(eodhd)
    }

    pub fn oanda(&self) -> Result<&OandaSettings> {
        let oanda = validation::validate_required_field("oanda", &self.oanda)?;
        oanda.validate()?;
        Ok(oanda)
    }

    pub fn yahoo_finance(&self) -> Result<&YahooFinanceSettings> {
        let yahoo = validation::validate_required_field("yahoo_finance", &self.yahoo_finance)?;
        yahoo.validate()?;
        Ok(yahoo)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.lake.validate()?;
        validate_positive_number("retry.max_attempts", self.retry.max_attempts, 1)?;
        Ok(())
    }
}

/// Expands `${VAR}` placeholders from the environment. Unset variables are
/// left as-is so validation can report them with the source field name.
fn substitute_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}
