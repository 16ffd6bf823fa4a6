//! LLM provider types.

/// Provider type enum for matching.
///
/// Every supported provider speaks the OpenAI chat completions API; they
/// differ only in default endpoint and whether a key is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Together,
    OpenAI,
    OpenAiCompatible,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "together" => Some(Self::Together),
            "openai" => Some(Self::OpenAI),
            "openai-compatible" => Some(Self::OpenAiCompatible),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Together => "together",
            Self::OpenAI => "openai",
            Self::OpenAiCompatible => "openai-compatible",
            Self::Ollama => "ollama",
        }
    }

    /// Base URL used when no endpoint is configured.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::Together => Some("https://api.together.xyz/v1"),
            Self::OpenAI => Some("https://api.openai.com/v1"),
            Self::Ollama => Some("http://localhost:11434/v1"),
            Self::OpenAiCompatible => None,
        }
    }

    /// Whether the provider refuses unauthenticated requests.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Together | Self::OpenAI)
    }
}
