use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

pub const DOMAIN: &str = "http://www.agc.gov.my";
pub const LANDING_URL: &str =
    "http://www.agc.gov.my/index.php?option=com_content&view=article&id=1406&Itemid=259";
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:18.0) Gecko/20100101 Firefox/18.0)";
pub const TIMEOUT_SECS: u64 = 30;

/// What happens to the batch when a single page fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// First failure cancels every in-flight request and fails the run.
    #[default]
    Abort,
    /// Failed pages are logged and skipped.
    Isolate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Prefix prepended verbatim to every scraped href.
    pub domain: String,
    pub landing_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            domain: DOMAIN.to_string(),
            landing_url: LANDING_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout_secs: TIMEOUT_SECS,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl Settings {
    /// Defaults overridden by `AGC_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder().add_source(Environment::with_prefix("AGC").try_parsing(true)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .set_default("domain", DOMAIN)?
            .set_default("landing_url", LANDING_URL)?
            .set_default("user_agent", USER_AGENT)?
            .set_default("timeout_secs", TIMEOUT_SECS as i64)?
            .set_default("failure_policy", "abort")?
            .build()?
            .try_deserialize()
    }
}
