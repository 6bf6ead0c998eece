use health_advisor::config::{AppConfig, DEFAULT_API_VERSION};
use health_advisor::llm::Provider;
use serial_test::serial;
use std::env;
use std::io::Write;

const ENV_VARS: &[&str] = &[
    "CONFIG_FILE",
    "PORT",
    "FRONTEND_URL",
    "RATE_LIMIT_ENABLED",
    "OPENAI_API_KEY",
    "AZURE_ENDPOINT",
    "API_VERSION",
    "AZURE_DEPLOYMENT",
    "ADVISOR_SERVER__PORT",
    "ADVISOR_LIMITS__RATE_LIMIT_MAX",
];

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    for var in ENV_VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

// Explicit args so the test runner's own flags never reach clap.
fn load() -> AppConfig {
    AppConfig::load_from_args(["health-advisor"]).expect("Failed to load config")
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = load();
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.limits.max_upload_bytes, 10 * 1024 * 1024);
    assert_eq!(config.limits.rate_limit_max, 10);
    assert_eq!(config.limits.rate_limit_window_secs, 900);
    assert!(config.limits.rate_limit_enabled);
    assert_eq!(config.llm.api_version, DEFAULT_API_VERSION);
    assert!(config.llm.api_key.is_none());
    assert!(config.llm_settings().api_key.is_none());
}

#[test]
#[serial]
fn test_prefixed_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("ADVISOR_SERVER__PORT", "9090");
        env::set_var("ADVISOR_LIMITS__RATE_LIMIT_MAX", "3");
    }

    let config = load();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.limits.rate_limit_max, 3);

    clear_env_vars();
}

#[test]
#[serial]
fn test_plain_env_vars_win() {
    clear_env_vars();
    unsafe {
        env::set_var("ADVISOR_SERVER__PORT", "9090");
        env::set_var("PORT", "8080");
        env::set_var("OPENAI_API_KEY", "sk-test");
        env::set_var("AZURE_ENDPOINT", "https://res.openai.azure.com");
        env::set_var("AZURE_DEPLOYMENT", "gpt-4o");
        env::set_var("RATE_LIMIT_ENABLED", "false");
    }

    let config = load();
    assert_eq!(config.server.port, 8080);
    assert!(!config.limits.rate_limit_enabled);

    let settings = config.llm_settings();
    assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
    assert_eq!(
        settings.provider,
        Provider::AzureOpenAI {
            deployment_name: "gpt-4o".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    );

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flags() {
    clear_env_vars();

    let config = AppConfig::load_from_args([
        "health-advisor",
        "--port",
        "6060",
        "--frontend-url",
        "https://advisor.example.com",
    ])
    .expect("Failed to load config");

    assert_eq!(config.server.port, 6060);
    assert_eq!(
        config.cors.allowed_origins().first().map(String::as_str),
        Some("https://advisor.example.com")
    );
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config");
    write!(
        file,
        r#"
[server]
port = 7070

[limits]
rate_limit_max = 25
"#
    )
    .expect("Failed to write temp config");

    let path = file.path().to_string_lossy().to_string();
    unsafe {
        env::set_var("CONFIG_FILE", &path);
    }

    let config = load();
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.limits.rate_limit_max, 25);
    // Untouched keys keep their defaults.
    assert_eq!(config.limits.rate_limit_window_secs, 900);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result =
        AppConfig::load_from_args(["health-advisor", "--config", "/nonexistent/advisor.toml"]);
    assert!(result.is_err());
}
