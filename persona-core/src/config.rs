use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the OAuth bearer token for Sheets and Drive.
pub const SHEETS_TOKEN_ENV: &str = "GOOGLE_SHEETS_TOKEN";
/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PersonaConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8770,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// Human-readable spreadsheet title, used when `url` is not set.
    pub name: String,
    /// Explicit spreadsheet URL; takes precedence over `name`.
    pub url: Option<String>,
    pub create_if_missing: bool,
    pub include_prompt: bool,
    pub include_created_at: bool,
    pub sheets_base_url: String,
    pub drive_base_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "prompts_generated".to_string(),
            url: None,
            create_if_missing: false,
            include_prompt: true,
            include_created_at: true,
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            drive_base_url: DEFAULT_DRIVE_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub enabled: bool,
    pub model: String,
    /// Files or directories whose text is used as few-shot context.
    pub documents: Vec<String>,
    pub max_context_chars: usize,
    pub timeout_seconds: u64,
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gemini-1.5-flash".to_string(),
            documents: Vec::new(),
            max_context_chars: 8000,
            timeout_seconds: 60,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl PersonaConfig {
    /// Load from a TOML file, overlaid by `PERSONA__SECTION__KEY` variables.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("PERSONA").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}
