use serde::{Deserialize, Serialize};

/// One-shot notice shown on the next rendered page after a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashCategory {
    /// CSS class suffix used by the layout.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { category: FlashCategory::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { category: FlashCategory::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { category: FlashCategory::Warning, message: message.into() }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self { category: FlashCategory::Danger, message: message.into() }
    }
}
