use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: i32 = 1024;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct TutorConfig {
    pub common: core_config::Config,
    pub provider: ProviderConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: i32,
    /// Upper bound on one completion call, in seconds.
    pub upstream_timeout_secs: u64,
}

impl GenerationConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Reject values that would make every completion call fail.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TUTOR_TEMPERATURE must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.max_tokens <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TUTOR_MAX_TOKENS must be positive, got {}",
                self.max_tokens
            )));
        }

        if self.upstream_timeout_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TUTOR_UPSTREAM_TIMEOUT_SECS must be at least 1"
            )));
        }

        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

/// Which completion backend the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Mock,
}

impl ProviderKind {
    fn api_key_var(self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GOOGLE_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Mock => None,
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Mock => "mock-tutor",
        }
    }

    fn base_url_var(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_BASE_URL",
            ProviderKind::OpenAi | ProviderKind::Mock => "OPENAI_BASE_URL",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Gemini => DEFAULT_GEMINI_BASE_URL,
            ProviderKind::OpenAi | ProviderKind::Mock => DEFAULT_OPENAI_BASE_URL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown COMPLETION_PROVIDER '{}', expected gemini, openai or mock",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Mock => "mock",
        };
        f.write_str(name)
    }
}

impl TutorConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let kind: ProviderKind = get_env("COMPLETION_PROVIDER", Some("gemini"), is_prod)?.parse()?;
        let api_key = match kind.api_key_var() {
            Some(var) => get_env(var, None, is_prod)?,
            None => String::new(),
        };

        let config = TutorConfig {
            common: common_config,
            provider: ProviderConfig {
                kind,
                api_key: Secret::new(api_key),
                model: get_env("TUTOR_MODEL", Some(kind.default_model()), is_prod)?,
                base_url: get_env(kind.base_url_var(), Some(kind.default_base_url()), is_prod)?,
            },
            generation: GenerationConfig {
                temperature: parse_env(
                    "TUTOR_TEMPERATURE",
                    &DEFAULT_TEMPERATURE.to_string(),
                    is_prod,
                )?,
                max_tokens: parse_env("TUTOR_MAX_TOKENS", &DEFAULT_MAX_TOKENS.to_string(), is_prod)?,
                upstream_timeout_secs: parse_env(
                    "TUTOR_UPSTREAM_TIMEOUT_SECS",
                    &DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string(),
                    is_prod,
                )?,
            },
        };

        config.generation.validate()?;
        Ok(config)
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = get_env(key, Some(default), is_prod)?;
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}
