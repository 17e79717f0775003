use super::base::ProviderConfig;
use anyhow::Result;

pub const OPENAI_DEFAULT_HOST: &str = "https://api.openai.com/";

pub struct OpenAiProviderConfig {
    pub api_key: Option<String>,
    pub host: String,
}

impl OpenAiProviderConfig {
    pub fn new(api_key: Option<String>, host: String) -> Self {
        Self { api_key, host }
    }

    /// Endpoint for chat completions, tolerant of a host with or without a trailing slash.
    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.host.trim_end_matches('/'))
    }
}

impl Default for OpenAiProviderConfig {
    fn default() -> Self {
        Self::new(None, OPENAI_DEFAULT_HOST.to_string())
    }
}

impl ProviderConfig for OpenAiProviderConfig {
    // The key stays optional here: agents may carry their own, and a missing
    // key is reported on the first request instead.
    fn from_env() -> Result<Self> {
        let api_key = Self::get_env("OPENAI_API_KEY", false, None)?;

        let host = Self::get_env(
            "OPENAI_API_HOST",
            false,
            Some(OPENAI_DEFAULT_HOST.to_string()),
        )?
        .unwrap_or_else(|| OPENAI_DEFAULT_HOST.to_string());

        Ok(Self::new(api_key, host))
    }
}
