//! Format checks for broker and data-provider credentials.
//!
//! These are pure string checks. Nothing here talks to a broker.

use std::collections::BTreeMap;

use common::models::{ApiConfig, Broker, TradingMode};
use thiserror::Error;

const MIN_KEY_LEN: usize = 5;
const MIN_PROVIDER_KEY_LEN: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyFormatError {
    #[error("Key is too short")]
    TooShort,
    #[error("Alpaca Paper keys must start with \"PK\"")]
    AlpacaPaperPrefix,
    #[error("Alpaca Live keys must start with \"AK\"")]
    AlpacaLivePrefix,
}

pub fn validate_key_format(
    provider: &str,
    mode: TradingMode,
    key: &str,
) -> Result<(), KeyFormatError> {
    if key.len() < MIN_KEY_LEN {
        return Err(KeyFormatError::TooShort);
    }

    if provider == "alpaca" {
        match mode {
            TradingMode::Paper if !key.starts_with("PK") => {
                return Err(KeyFormatError::AlpacaPaperPrefix);
            }
            TradingMode::Live if !key.starts_with("AK") => {
                return Err(KeyFormatError::AlpacaLivePrefix);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Loose check used while editing provider cards. An empty key means "not
/// configured" and is accepted.
pub fn is_valid_provider_key(provider: &str, key: &str) -> bool {
    if key.is_empty() {
        return true;
    }
    if key.len() < MIN_PROVIDER_KEY_LEN {
        return false;
    }
    if provider == "alpaca" && !key.starts_with("PK") && !key.starts_with("AK") {
        return false;
    }
    true
}

/// Provider ids whose api key fails `is_valid_provider_key`.
pub fn provider_key_errors(config: &ApiConfig) -> BTreeMap<String, String> {
    config
        .providers
        .iter()
        .filter_map(|(id, creds)| {
            let key = creds.api_key.as_deref().unwrap_or_default();
            (!is_valid_provider_key(id, key)).then(|| (id.clone(), format!("Invalid key format for {id}")))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCheck {
    pub success: bool,
    pub message: String,
}

impl CredentialCheck {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Local sanity check of the broker key pair for `mode`. A success only
/// means the credentials are well-formed.
pub fn check_broker_credentials(config: &ApiConfig, mode: TradingMode) -> CredentialCheck {
    let (key, secret) = config.alpaca_credentials(mode);
    let (Some(key), Some(secret)) = (key, secret) else {
        return CredentialCheck::failed("Missing API Key or Secret");
    };
    if key.is_empty() || secret.is_empty() {
        return CredentialCheck::failed("Missing API Key or Secret");
    }

    if let Err(e) = validate_key_format(&config.broker.to_string(), mode, key) {
        return CredentialCheck::failed(e.to_string());
    }

    CredentialCheck {
        success: true,
        message: format!(
            "Credentials for {} ({}) are well-formed",
            broker_label(config.broker),
            mode
        ),
    }
}

fn broker_label(broker: Broker) -> String {
    broker.to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::demo::default_settings;
    use common::models::ProviderCredentials;

    #[test]
    fn test_key_format_rules() {
        assert_eq!(
            validate_key_format("alpaca", TradingMode::Paper, "PK1"),
            Err(KeyFormatError::TooShort)
        );
        assert_eq!(
            validate_key_format("alpaca", TradingMode::Paper, "AK123456"),
            Err(KeyFormatError::AlpacaPaperPrefix)
        );
        assert_eq!(
            validate_key_format("alpaca", TradingMode::Live, "PK123456"),
            Err(KeyFormatError::AlpacaLivePrefix)
        );
        assert!(validate_key_format("alpaca", TradingMode::Live, "AK123456").is_ok());
        assert!(validate_key_format("binance", TradingMode::Live, "anything").is_ok());
    }

    #[test]
    fn test_provider_key_rules() {
        assert!(is_valid_provider_key("polygon", ""));
        assert!(!is_valid_provider_key("polygon", "short"));
        assert!(is_valid_provider_key("polygon", "poly_12345"));
        assert!(!is_valid_provider_key("alpaca", "XX123456789"));
        assert!(is_valid_provider_key("alpaca", "AK123456789"));
    }

    #[test]
    fn test_provider_key_errors_lists_only_bad_keys() {
        let mut config = default_settings().api_config;
        config.providers.insert(
            "finnhub".into(),
            ProviderCredentials {
                api_key: Some("abc".into()),
                ..Default::default()
            },
        );
        config.providers.insert("newsapi".into(), ProviderCredentials::default());

        let errors = provider_key_errors(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["finnhub"], "Invalid key format for finnhub");
    }

    #[test]
    fn test_broker_check_on_demo_config() {
        let config = default_settings().api_config;

        let paper = check_broker_credentials(&config, TradingMode::Paper);
        assert!(paper.success);
        assert_eq!(paper.message, "Credentials for ALPACA (paper) are well-formed");

        let live = check_broker_credentials(&config, TradingMode::Live);
        assert!(!live.success);
        assert_eq!(live.message, "Missing API Key or Secret");
    }

    #[test]
    fn test_broker_check_reports_format_error() {
        let mut config = default_settings().api_config;
        config.alpaca_live_key = Some("PK_WRONG_PREFIX".into());
        config.alpaca_live_secret = Some("secret-that-says-fail".into());

        let check = check_broker_credentials(&config, TradingMode::Live);
        assert!(!check.success);
        assert_eq!(check.message, "Alpaca Live keys must start with \"AK\"");
    }
}
