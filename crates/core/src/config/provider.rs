//! Credentials for third-party providers that are not stored per integration.

use serde::Deserialize;

/// Provider application settings.
///
/// - `CLIENT_ID` / `CLIENT_SECRET`: Google OAuth client used to refresh
///   Drive tokens
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,
}

impl ProviderConfig {
    /// Load provider settings from unprefixed environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<ProviderConfig>()
    }

    /// Google OAuth client id and secret, when both are configured.
    pub fn google_client(&self) -> Option<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_client_requires_both() {
        let config = ProviderConfig {
            client_id: Some("id".to_string()),
            ..ProviderConfig::default()
        };
        assert!(config.google_client().is_none());

        let config = ProviderConfig {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
        };
        assert_eq!(config.google_client(), Some(("id", "secret")));
    }
}
