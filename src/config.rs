use crate::error::{LeafDoctorError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
pub const DEFAULT_API_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub max_image_size: u32,
    pub timeout_seconds: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            temperature: 0.3,
            max_completion_tokens: 1024,
            max_image_size: 1568,
            timeout_seconds: 60,
            log_level: "info".into(),
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数で上書き
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 設定ファイルのみ読み込む（保存用、環境変数は反映しない）
    pub fn load_file() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| LeafDoctorError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("leaf-doctor").join("config.json"))
    }

    /// 環境変数による上書き
    ///
    /// `lookup` は環境変数の取得関数（テストで差し替える）
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GROQ_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = get("VISION_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(model) = get("MODEL_NAME") {
            self.model = model;
        }
        if let Some(value) = get("MODEL_TEMPERATURE") {
            self.temperature = parse_env("MODEL_TEMPERATURE", &value)?;
        }
        if let Some(value) = get("MAX_COMPLETION_TOKENS") {
            self.max_completion_tokens = parse_env("MAX_COMPLETION_TOKENS", &value)?;
        }
        if let Some(value) = get("VISION_TIMEOUT_SECONDS") {
            self.timeout_seconds = parse_env("VISION_TIMEOUT_SECONDS", &value)?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        Ok(())
    }

    pub fn get_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LeafDoctorError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LeafDoctorError::Config(format!("{} の値が不正です: {}", key, value)))
}
