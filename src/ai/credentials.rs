use crate::error::ReorgError;
use keyring::Entry;

const SERVICE_NAME: &str = "com.drive-reorganizer";

/// Values people paste from docs instead of a real key
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-api-key",
    "your_api_key",
    "your api key",
    "yourapikey",
    "api-key-here",
    "api_key_here",
    "enter-your",
    "enter_your",
    "replace-with",
    "replace_with",
    "placeholder",
    "changeme",
];

/// Which remote service a credential is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// API key for the classification service
    Classifier,
    /// OAuth access token for the file store
    Drive,
}

impl CredentialKind {
    /// Keychain account name
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Classifier => "gemini",
            Self::Drive => "google-drive",
        }
    }

    /// Environment variables checked before the keychain, in priority order
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            Self::Classifier => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Self::Drive => &["GOOGLE_DRIVE_ACCESS_TOKEN"],
        }
    }
}

/// Credential lookup: environment first, then the OS keychain
pub struct CredentialManager;

impl CredentialManager {
    /// Validate `secret`, then save it to the keychain
    pub fn store(kind: CredentialKind, secret: &str) -> Result<(), ReorgError> {
        validate_credential(secret).map_err(ReorgError::Credential)?;
        let entry = Entry::new(SERVICE_NAME, kind.provider())
            .map_err(|e| ReorgError::Credential(format!("Keychain unavailable: {}", e)))?;
        entry
            .set_password(secret)
            .map_err(|e| ReorgError::Credential(format!("Failed to store credential: {}", e)))?;
        tracing::debug!(provider = kind.provider(), "Stored credential in keychain");
        Ok(())
    }

    pub fn delete(kind: CredentialKind) -> Result<(), ReorgError> {
        if let Ok(entry) = Entry::new(SERVICE_NAME, kind.provider()) {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => {
                    return Err(ReorgError::Credential(format!(
                        "Failed to delete credential: {}",
                        e
                    )))
                }
            }
        }
        Ok(())
    }

    fn from_keychain(kind: CredentialKind) -> Option<String> {
        Entry::new(SERVICE_NAME, kind.provider())
            .ok()
            .and_then(|entry| entry.get_password().ok())
    }

    /// Resolve a usable credential for `kind`
    pub fn resolve(kind: CredentialKind) -> Result<String, ReorgError> {
        resolve_with(kind, |var| std::env::var(var).ok(), || {
            Self::from_keychain(kind)
        })
    }
}

fn resolve_with(
    kind: CredentialKind,
    env: impl Fn(&str) -> Option<String>,
    keychain: impl FnOnce() -> Option<String>,
) -> Result<String, ReorgError> {
    let found = kind
        .env_vars()
        .iter()
        .find_map(|var| env(var).filter(|v| !v.trim().is_empty()))
        .or_else(keychain);

    match found {
        Some(value) => {
            let value = value.trim().to_string();
            validate_credential(&value).map_err(ReorgError::Credential)?;
            Ok(value)
        }
        None => Err(ReorgError::Credential(format!(
            "No {} credential found. Set {} or store one in the keychain.",
            kind.provider(),
            kind.env_vars().join(" or ")
        ))),
    }
}

/// Reject obviously bogus values before they reach the network
pub fn validate_credential(value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Credential is empty".to_string());
    }
    if trimmed.len() < 16 {
        return Err("Credential is too short to be valid".to_string());
    }

    let lower = trimmed.to_lowercase();
    if is_masked(&lower) {
        return Err("Credential appears to be a masked placeholder".to_string());
    }
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(format!(
                "Credential appears to be a placeholder (contains '{}')",
                pattern
            ));
        }
    }
    Ok(())
}

/// `xxxx...` or `sk-xxxx...`: nothing but `x` after an optional prefix.
/// Real tokens contain runs of `x` by chance, so a substring match is not enough.
fn is_masked(lower: &str) -> bool {
    let body = match lower.find(|c: char| matches!(c, '-' | '_' | '.')) {
        Some(idx) => &lower[idx + 1..],
        None => lower,
    };
    let mut letters = body.chars().filter(|c| !matches!(c, '-' | '_' | '.')).peekable();
    letters.peek().is_some() && letters.all(|c| c == 'x')
}

#[cfg(test)]
mod tests {
    use super::*;

    const REAL_LOOKING: &str = "AIzaSyD4-k1m9Qe7Lr2Tz8Vb3Nc6Wx0Yp5Uo";

    #[test]
    fn test_validate_rejects_placeholders() {
        assert!(validate_credential("").is_err());
        assert!(validate_credential("short").is_err());
        assert!(validate_credential("your-api-key-goes-here-please").is_err());
        assert!(validate_credential("sk-xxxxxxxxxxxxxxxxxxxxxxxx").is_err());
        assert!(validate_credential(REAL_LOOKING).is_ok());
    }

    #[test]
    fn test_validate_masked_values() {
        assert!(validate_credential("xxxxxxxxxxxxxxxxxxxx").is_err());
        assert!(validate_credential("ya29.XXXXXXXXXXXXXXXXXXXX").is_err());
        assert!(validate_credential("sk-xxxx-xxxx-xxxx-xxxx").is_err());
    }

    #[test]
    fn test_validate_accepts_tokens_with_x_runs() {
        assert!(validate_credential("ya29.a0AfB_byC3xXxq9LmN4pQ7rS2tU8vW1yZ").is_ok());
        assert!(validate_credential("AIzaSyXXXk1m9Qe7Lr2Tz8Vb3Nc6Wx0Yp5Uo").is_ok());
    }

    #[test]
    fn test_store_rejects_bogus_values_before_keychain() {
        for bogus in ["", "short", "placeholder-value-123456", "sk-xxxxxxxxxxxxxxxxxxxxxxxx"] {
            assert!(matches!(
                CredentialManager::store(CredentialKind::Classifier, bogus),
                Err(ReorgError::Credential(_))
            ));
        }
    }

    #[test]
    fn test_resolve_prefers_env_in_order() {
        let value = resolve_with(
            CredentialKind::Classifier,
            |var| match var {
                "GOOGLE_API_KEY" => Some("second-choice-key-0123456789".to_string()),
                "GEMINI_API_KEY" => Some(REAL_LOOKING.to_string()),
                _ => None,
            },
            || panic!("keychain should not be consulted"),
        )
        .unwrap();
        assert_eq!(value, REAL_LOOKING);
    }

    #[test]
    fn test_resolve_falls_back_to_keychain() {
        let value = resolve_with(
            CredentialKind::Drive,
            |_| Some("   ".to_string()),
            || Some(format!("  {}  ", REAL_LOOKING)),
        )
        .unwrap();
        assert_eq!(value, REAL_LOOKING);
    }

    #[test]
    fn test_resolve_missing_or_placeholder() {
        let missing = resolve_with(CredentialKind::Drive, |_| None, || None).unwrap_err();
        assert!(missing.to_string().contains("GOOGLE_DRIVE_ACCESS_TOKEN"));

        let placeholder = resolve_with(
            CredentialKind::Classifier,
            |_| Some("placeholder-value-123456".to_string()),
            || None,
        );
        assert!(matches!(placeholder, Err(ReorgError::Credential(_))));
    }
}
