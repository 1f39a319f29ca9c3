//! Provider link repository backed by PostgreSQL

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;

use super::OAuthProviderRepository;
use crate::models::{NewOAuthProvider, OAuthProvider, TokenUpdate};

const LINK_COLUMNS: &str = "id, user_id, provider, provider_id, access_token, refresh_token, \
                            token_expires_at, profile_data, created_at, updated_at";

#[derive(Clone)]
pub struct PgOAuthProviderRepository {
    pool: PgPool,
}

impl PgOAuthProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OAuthProviderRepository for PgOAuthProviderRepository {
    async fn create(&self, link: &NewOAuthProvider) -> DatabaseResult<OAuthProvider> {
        sqlx::query_as::<_, OAuthProvider>(&format!(
            r#"
            INSERT INTO oauth_providers
                (user_id, provider, provider_id, access_token, refresh_token,
                 token_expires_at, profile_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(link.user_id)
        .bind(&link.provider)
        .bind(&link.provider_id)
        .bind(&link.access_token)
        .bind(&link.refresh_token)
        .bind(link.token_expires_at)
        .bind(&link.profile_data)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> DatabaseResult<Option<OAuthProvider>> {
        sqlx::query_as::<_, OAuthProvider>(&format!(
            "SELECT {LINK_COLUMNS} FROM oauth_providers WHERE provider = $1 AND provider_id = $2"
        ))
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_by_user(
        &self,
        user_id: i32,
        provider: &str,
    ) -> DatabaseResult<Option<OAuthProvider>> {
        sqlx::query_as::<_, OAuthProvider>(&format!(
            "SELECT {LINK_COLUMNS} FROM oauth_providers WHERE user_id = $1 AND provider = $2"
        ))
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn update_tokens(&self, id: i32, tokens: &TokenUpdate) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE oauth_providers
            SET access_token = $2, refresh_token = $3, token_expires_at = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.token_expires_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(())
    }

    async fn relink(&self, id: i32, link: &NewOAuthProvider) -> DatabaseResult<OAuthProvider> {
        sqlx::query_as::<_, OAuthProvider>(&format!(
            r#"
            UPDATE oauth_providers
            SET provider_id = $2, access_token = $3, refresh_token = $4,
                token_expires_at = $5, profile_data = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&link.provider_id)
        .bind(&link.access_token)
        .bind(&link.refresh_token)
        .bind(link.token_expires_at)
        .bind(&link.profile_data)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }
}
