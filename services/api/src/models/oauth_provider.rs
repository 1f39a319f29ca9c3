//! Links between local users and third-party identities

use auth::TokenSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored provider link. Tokens are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OAuthProvider {
    pub id: i32,
    pub user_id: i32,
    pub provider: String,
    pub provider_id: String,
    #[serde(skip_serializing, default)]
    pub access_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub profile_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OAuthProvider {
    /// Access token usable at `now`, if any
    pub fn usable_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let expired = self
            .token_expires_at
            .map(|expires_at| expires_at <= now)
            .unwrap_or(false);

        if expired {
            None
        } else {
            self.access_token.as_deref()
        }
    }
}

/// Insert (or replace) payload for a provider link
#[derive(Debug, Clone)]
pub struct NewOAuthProvider {
    pub user_id: i32,
    pub provider: String,
    pub provider_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub profile_data: Option<serde_json::Value>,
}

/// Fresh tokens for an existing link
#[derive(Debug, Clone, PartialEq)]
pub struct TokenUpdate {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: DateTime<Utc>,
}

impl TokenUpdate {
    /// Tokens from an exchange or refresh. A provider that does not rotate
    /// the refresh token keeps `previous_refresh_token`.
    pub fn from_tokens(
        tokens: &TokenSet,
        previous_refresh_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens
                .refresh_token
                .clone()
                .or_else(|| previous_refresh_token.map(str::to_string)),
            token_expires_at: tokens.expires_at(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn link(expires_at: Option<DateTime<Utc>>) -> OAuthProvider {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        OAuthProvider {
            id: 1,
            user_id: 1,
            provider: "spotify".to_string(),
            provider_id: "sp1".to_string(),
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            token_expires_at: expires_at,
            profile_data: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_usable_access_token_respects_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        assert_eq!(link(Some(now + Duration::minutes(5))).usable_access_token(now), Some("access"));
        assert_eq!(link(Some(now - Duration::seconds(1))).usable_access_token(now), None);
        assert_eq!(link(None).usable_access_token(now), Some("access"));
    }

    #[test]
    fn test_token_update_keeps_unrotated_refresh_token() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let tokens = TokenSet {
            access_token: "new-access".to_string(),
            refresh_token: None,
            expires_in: Some(std::time::Duration::from_secs(3600)),
        };

        let update = TokenUpdate::from_tokens(&tokens, Some("old-refresh"), now);
        assert_eq!(update.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(update.token_expires_at, now + Duration::hours(1));

        let rotated = TokenSet {
            refresh_token: Some("new-refresh".to_string()),
            ..tokens
        };
        let update = TokenUpdate::from_tokens(&rotated, Some("old-refresh"), now);
        assert_eq!(update.refresh_token.as_deref(), Some("new-refresh"));
    }

    #[test]
    fn test_tokens_are_not_serialized() {
        let json = serde_json::to_string(&link(None)).unwrap();
        assert!(!json.contains("access"));
        assert!(!json.contains("refresh"));
    }
}
