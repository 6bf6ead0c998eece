use crate::llm::{LlmSettings, Provider};
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Default Azure `OpenAI` API version when none is configured.
pub const DEFAULT_API_VERSION: &str = "2024-08-01-preview";

/// Endpoint used when a key is configured without an explicit endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Front-end origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// Enable rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,

    /// Completion API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Completion API endpoint
    #[arg(long, env = "AZURE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Azure API version
    #[arg(long, env = "API_VERSION")]
    pub api_version: Option<String>,

    /// Azure deployment id
    #[arg(long, env = "AZURE_DEPLOYMENT")]
    pub deployment: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub limits: LimitsConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Directory served under `/static`.
    pub static_dir: String,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct CorsConfig {
    pub frontend_url: Option<String>,
}

impl CorsConfig {
    /// Origins allowed to call the API from a browser.
    pub fn allowed_origins(&self) -> Vec<String> {
        self.frontend_url
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .chain([
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ])
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub max_upload_bytes: usize,
    pub rate_limit_enabled: bool,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub api_version: String,
    pub deployment: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "static")?
            .set_default("limits.max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("limits.rate_limit_enabled", true)?
            .set_default("limits.rate_limit_max", 10)?
            .set_default("limits.rate_limit_window_secs", 15 * 60)?
            .set_default("limits.request_timeout_secs", 120)?
            .set_default("llm.api_version", DEFAULT_API_VERSION)?
            .set_default("llm.timeout_secs", 90)?;

        // Config file: explicit path is required, ./config.* is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // ADVISOR_SERVER__PORT=8000 etc.
        builder = builder.add_source(
            Environment::with_prefix("ADVISOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Flags and their plain env aliases win over everything else.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(url) = cli.frontend_url {
            builder = builder.set_override("cors.frontend_url", url)?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("limits.rate_limit_enabled", rl)?;
        }
        if let Some(key) = cli.api_key {
            builder = builder.set_override("llm.api_key", key)?;
        }
        if let Some(endpoint) = cli.endpoint {
            builder = builder.set_override("llm.endpoint", endpoint)?;
        }
        if let Some(version) = cli.api_version {
            builder = builder.set_override("llm.api_version", version)?;
        }
        if let Some(deployment) = cli.deployment {
            builder = builder.set_override("llm.deployment", deployment)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Listen address in `host:port` form.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Resolve completion client settings.
    ///
    /// An empty key is treated as missing so the analyze route can report the
    /// service as unconfigured instead of failing upstream.
    pub fn llm_settings(&self) -> LlmSettings {
        let base_url = self
            .llm
            .endpoint
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let mut provider = Provider::detect_from_url(&base_url);
        if let Provider::AzureOpenAI { .. } = provider {
            provider = Provider::AzureOpenAI {
                // Without an explicit deployment the model name doubles as one.
                deployment_name: self
                    .llm
                    .deployment
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| crate::advisor::MODEL.to_string()),
                api_version: self.llm.api_version.clone(),
            };
        }

        LlmSettings {
            base_url,
            api_key: self.llm.api_key.clone().filter(|s| !s.trim().is_empty()),
            provider,
            timeout: std::time::Duration::from_secs(self.llm.timeout_secs),
        }
    }
}
