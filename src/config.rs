use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::auth::Credentials;

/// Default Hydra API base URL
pub const DEFAULT_BASE_URL: &str = "https://dokken-api.wbagora.com";

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Hydra-Cpp/1.132.0";

/// Identity provider used in the token exchange body
pub const DEFAULT_AUTH_PROVIDER: &str = "steam";

/// Page size used by exact-match search after the first page
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 100;

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub client_id: String,
    pub user_agent: String,

    /// Key under `auth` in the token exchange body (e.g. "steam")
    pub auth_provider: String,

    // Timeouts
    pub connect_timeout: Duration,
    pub request_timeout: Duration,

    /// Page size for the second and later exact-match search pages
    pub search_page_size: u32,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the API key and client id
    pub fn new(api_key: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            client_id: client_id.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            auth_provider: DEFAULT_AUTH_PROVIDER.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_auth_provider(mut self, provider: impl Into<String>) -> Self {
        self.auth_provider = provider.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("HYDRA_API_KEY must not be empty");
        }
        if self.client_id.trim().is_empty() {
            anyhow::bail!("HYDRA_CLIENT_ID must not be empty");
        }
        if self.auth_provider.trim().is_empty() {
            anyhow::bail!("HYDRA_AUTH_PROVIDER must not be empty");
        }
        let url = url::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid HYDRA_BASE_URL: {}", self.base_url))?;
        if url.cannot_be_a_base() {
            anyhow::bail!("HYDRA_BASE_URL cannot be used as a base: {}", self.base_url);
        }
        if self.search_page_size == 0 {
            anyhow::bail!("Search page size must be greater than zero");
        }
        Ok(())
    }

    /// Join a request path onto the base URL
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Hydra CLI - query the Hydra game-platform API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Hydra API base URL
    #[arg(long, env = "HYDRA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Hydra API key
    #[arg(short = 'k', long, env = "HYDRA_API_KEY")]
    pub api_key: String,

    /// Hydra client id
    #[arg(short = 'c', long, env = "HYDRA_CLIENT_ID")]
    pub client_id: String,

    /// User agent sent with every request
    #[arg(long, env = "HYDRA_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Identity provider used for the token exchange
    #[arg(long, env = "HYDRA_AUTH_PROVIDER", default_value = DEFAULT_AUTH_PROVIDER)]
    pub auth_provider: String,

    /// Pre-issued hex-encoded ticket
    #[arg(long, env = "HYDRA_TICKET", conflicts_with = "ticket_command")]
    pub ticket: Option<String>,

    /// Helper program that prints a hex-encoded ticket
    #[arg(long, env = "HYDRA_TICKET_COMMAND")]
    pub ticket_command: Option<String>,

    /// Account username handed to the ticket helper
    #[arg(short = 'u', long, env = "HYDRA_USERNAME", default_value = "")]
    pub username: String,

    /// Account password handed to the ticket helper
    #[arg(short = 'p', long, env = "HYDRA_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HYDRA_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a profile by account id
    Profile { id: String },

    /// Fetch a single match
    Match { id: String },

    /// List matches for an account
    Matches {
        id: String,
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show a global leaderboard (1v1 or 2v2)
    Leaderboard { kind: String },

    /// Show an account's leaderboard standing, optionally for one character
    Rank {
        id: String,
        kind: String,
        #[arg(long)]
        character: Option<String>,
    },

    /// Search accounts by username
    Search {
        query: String,
        #[arg(long, default_value = "25")]
        limit: u32,
        /// Restrict to a platform (wb_network, steam, epic, xb1, ps4, ps5, switch)
        #[arg(long)]
        platform: Option<String>,
        /// Page through results until an exact username match is found
        #[arg(long)]
        exact: bool,
    },
}

impl CliArgs {
    /// Load CLI arguments, reading a `.env` file first if one exists
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        CliArgs::parse()
    }

    /// Build the client configuration from the parsed arguments
    pub fn client_config(&self) -> Result<ClientConfig> {
        let config = ClientConfig::new(&self.api_key, &self.client_id)
            .with_base_url(&self.base_url)
            .with_user_agent(&self.user_agent)
            .with_auth_provider(&self.auth_provider)
            .with_request_timeout(Duration::from_secs(self.request_timeout));
        config.validate().context("Invalid client configuration")?;
        Ok(config)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }
}
