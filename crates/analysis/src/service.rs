use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, warn};

use common::config::AiConfig;
use common::models::{MarketScanResult, NewsItem, Sentiment, TechnicalIndicator, TradeSignal};

use crate::prompts::{self, AlertTrigger};
use crate::remote::GeminiClient;
use crate::traits::{AnalysisError, TextService};

pub const SIGNAL_MISSING_KEY: &str =
    "Gemini API Key is missing. Please configure it to use this feature.";
pub const SIGNAL_FAILED: &str = "Failed to analyze signal due to an API error.";
pub const SIGNAL_EMPTY: &str = "Analysis could not be generated.";

pub const TECHNICAL_MISSING_KEY: &str = "Gemini API Key is missing. Please add it to .env.local";
pub const TECHNICAL_FAILED: &str = "Failed to generate technical analysis.";
pub const TECHNICAL_EMPTY: &str = "Technical analysis unavailable.";

pub const SUPPORT_FALLBACK: &str =
    "I'm having trouble connecting to the support brain right now. Please try again later.";
pub const SUPPORT_EMPTY: &str = "I'm sorry, I couldn't generate a response.";

const HEADLINE_DEFAULT: &str = "Neutral|Could not analyze";
const HEADLINE_MISSING_KEY: &str = "Please configure API_KEY to use AI features.";

const DEFAULT_EMAIL_SUBJECT: &str = "Trading Alert";
const DEFAULT_EMAIL_BODY: &str = "Please review your recent activity.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRating {
    pub rating: u8,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlineSentiment {
    pub sentiment: Sentiment,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub subject: String,
    pub body: String,
}

#[derive(Deserialize)]
struct RawScanRating {
    rating: Option<f64>,
    reason: Option<String>,
}

#[derive(Deserialize)]
struct RawEmailTemplate {
    subject: Option<String>,
    body: Option<String>,
}

enum Reply {
    MissingKey,
    Failed,
    Text(String),
}

/// AI text operations with fixed fallbacks.
///
/// Every operation resolves to a displayable value. Without a credential
/// the backend is never called.
#[derive(Clone)]
pub struct AnalysisService {
    backend: Option<Arc<dyn TextService>>,
}

impl AnalysisService {
    pub fn unconfigured() -> Self {
        Self { backend: None }
    }

    pub fn new(backend: Arc<dyn TextService>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Uses `backend` only when `api_key` is present and non-blank.
    pub fn with_credential(api_key: Option<&str>, backend: Arc<dyn TextService>) -> Self {
        match api_key {
            Some(key) if !key.trim().is_empty() => Self::new(backend),
            _ => Self::unconfigured(),
        }
    }

    pub fn from_config(config: &AiConfig) -> Result<Self, AnalysisError> {
        match config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                Ok(Self::new(Arc::new(GeminiClient::new(key, config)?)))
            }
            _ => {
                warn!("GEMINI_API_KEY not set, AI features will return placeholders");
                Ok(Self::unconfigured())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    async fn ask(&self, prompt: String, json: bool) -> Reply {
        let Some(backend) = &self.backend else {
            return Reply::MissingKey;
        };
        match backend.generate(&prompt, json).await {
            Ok(text) => Reply::Text(text),
            Err(e) => {
                error!("AI request failed: {}", e);
                Reply::Failed
            }
        }
    }

    /// Two-sentence commentary on a signal.
    pub async fn analyze_signal(&self, signal: &TradeSignal) -> String {
        match self.ask(prompts::signal_prompt(signal), false).await {
            Reply::MissingKey => SIGNAL_MISSING_KEY.to_string(),
            Reply::Failed => SIGNAL_FAILED.to_string(),
            Reply::Text(text) => non_empty_or(text, SIGNAL_EMPTY),
        }
    }

    pub async fn analyze_technical_context(&self, data: &TechnicalIndicator) -> String {
        match self.ask(prompts::technical_prompt(data), false).await {
            Reply::MissingKey => TECHNICAL_MISSING_KEY.to_string(),
            Reply::Failed => TECHNICAL_FAILED.to_string(),
            Reply::Text(text) => non_empty_or(text, TECHNICAL_EMPTY),
        }
    }

    pub async fn analyze_market_scan(&self, stock: &MarketScanResult) -> ScanRating {
        let text = match self.ask(prompts::scan_prompt(stock), true).await {
            Reply::MissingKey => return ScanRating::zero("API Key Missing"),
            Reply::Failed => return ScanRating::zero("AI Error"),
            Reply::Text(text) => text,
        };
        let raw = if text.trim().is_empty() { "{}" } else { text.as_str() };

        match serde_json::from_str::<RawScanRating>(raw) {
            Ok(parsed) => ScanRating {
                rating: parsed
                    .rating
                    .filter(|r| *r >= 1.0)
                    .map(|r| r.round().min(10.0) as u8)
                    .unwrap_or(5),
                reason: parsed
                    .reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| "Analysis unavailable".to_string()),
            },
            Err(e) => {
                error!("Scan rating was not valid JSON: {}", e);
                ScanRating::zero("AI Error")
            }
        }
    }

    /// Classifies a news item's headline from a `Sentiment|explanation` reply.
    pub async fn analyze_headline(&self, item: &NewsItem) -> HeadlineSentiment {
        match self.ask(prompts::headline_prompt(&item.headline), false).await {
            Reply::MissingKey => HeadlineSentiment {
                sentiment: Sentiment::Neutral,
                explanation: HEADLINE_MISSING_KEY.to_string(),
            },
            Reply::Failed => parse_headline(HEADLINE_DEFAULT),
            Reply::Text(text) if text.trim().is_empty() => parse_headline(HEADLINE_DEFAULT),
            Reply::Text(text) => parse_headline(&text),
        }
    }

    pub async fn draft_email_template(&self, trigger: AlertTrigger) -> EmailTemplate {
        let text = match self.ask(prompts::email_prompt(trigger), true).await {
            Reply::Text(text) => text,
            Reply::MissingKey | Reply::Failed => return EmailTemplate::default(),
        };
        match serde_json::from_str::<RawEmailTemplate>(&text) {
            Ok(raw) => EmailTemplate {
                subject: raw
                    .subject
                    .unwrap_or_else(|| DEFAULT_EMAIL_SUBJECT.to_string()),
                body: raw.body.unwrap_or_else(|| DEFAULT_EMAIL_BODY.to_string()),
            },
            Err(e) => {
                warn!("Email template reply was not valid JSON: {}", e);
                EmailTemplate::default()
            }
        }
    }

    pub async fn support_reply(&self, question: &str) -> String {
        match self.ask(prompts::support_prompt(question), false).await {
            Reply::MissingKey | Reply::Failed => SUPPORT_FALLBACK.to_string(),
            Reply::Text(text) => non_empty_or(text, SUPPORT_EMPTY),
        }
    }
}

impl ScanRating {
    fn zero(reason: &str) -> Self {
        Self {
            rating: 0,
            reason: reason.to_string(),
        }
    }
}

impl Default for EmailTemplate {
    fn default() -> Self {
        Self {
            subject: DEFAULT_EMAIL_SUBJECT.to_string(),
            body: DEFAULT_EMAIL_BODY.to_string(),
        }
    }
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

fn parse_headline(text: &str) -> HeadlineSentiment {
    let (label, explanation) = text.split_once('|').unwrap_or((text, ""));
    let sentiment = match label.trim().to_lowercase().as_str() {
        "bullish" => Sentiment::Bullish,
        "bearish" => Sentiment::Bearish,
        _ => Sentiment::Neutral,
    };
    HeadlineSentiment {
        sentiment,
        explanation: explanation.trim().to_string(),
    }
}
