use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::GithubOAuthConfig;

pub mod handlers;
pub mod session;

/// Identity returned by an external sign-in provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: String,
    pub uid: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// External OAuth provider: builds the authorize redirect and turns a
/// callback `code` into a profile.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Short provider name stored on users (`github`).
    fn name(&self) -> &'static str;

    fn authorize_url(&self, state: &str) -> anyhow::Result<Url>;

    async fn exchange(&self, code: &str) -> anyhow::Result<ProviderProfile>;
}

// ── GitHub ────────────────────────────────────────────────────────────────────

pub struct GithubProvider {
    config: GithubOAuthConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GithubTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

impl GithubProvider {
    pub fn new(config: GithubOAuthConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("saasbook-reader")
            .build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn authorize_url(&self, state: &str) -> anyhow::Result<Url> {
        if self.config.client_id.is_empty() {
            return Err(anyhow::anyhow!("GITHUB_CLIENT_ID is not configured"));
        }
        let mut url = Url::parse(&self.config.authorize_url)
            .map_err(|e| anyhow::anyhow!("invalid GITHUB_AUTHORIZE_URL: {e}"))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("scope", "read:user user:email")
            .append_pair("state", state);
        Ok(url)
    }

    async fn exchange(&self, code: &str) -> anyhow::Result<ProviderProfile> {
        let token: GithubTokenResponse = self
            .client
            .post(&self.config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let access_token = match (token.access_token, token.error) {
            (Some(t), None) => t,
            (_, err) => {
                return Err(anyhow::anyhow!(
                    "token exchange failed: {} {}",
                    err.unwrap_or_default(),
                    token.error_description.unwrap_or_default()
                ))
            }
        };

        let user: GithubUser = self
            .client
            .get(format!("{}/user", self.config.api_base_url))
            .bearer_auth(&access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(ProviderProfile {
            provider: self.name().to_string(),
            uid: user.id.to_string(),
            nickname: Some(user.name.unwrap_or_else(|| user.login.clone())),
            email: user.email,
            avatar_url: user.avatar_url,
        })
    }
}

// ── Tokens and credentials ────────────────────────────────────────────────────

/// 32 random bytes, base64url without padding. Used for CSRF and OAuth state.
pub fn random_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use rand::RngCore;

    let mut raw = [0u8; 32];
    rand::rng().fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

/// Opaque credential stored for OAuth-created users: an argon2id hash of a
/// random secret nobody ever sees, so the row can never be signed into
/// with a password.
pub fn generate_credential() -> anyhow::Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };
    use rand::RngCore;

    let mut raw = [0u8; 10];
    rand::rng().fill_bytes(&mut raw);
    let secret = hex::encode(raw);
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("argon2 hash error: {e}"))?
        .to_string();
    Ok(hash)
}

/// Constant-time comparison for secrets taken from requests.
pub fn tokens_match(expected: &str, candidate: &str) -> bool {
    let (a, b) = (expected.as_bytes(), candidate.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_tokens_are_distinct_and_urlsafe() {
        let a = random_token();
        let b = random_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn credential_is_argon2_hash() {
        let hash = generate_credential().unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn tokens_match_requires_exact_equality() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
    }

    #[test]
    fn github_authorize_url_carries_state() {
        let provider = GithubProvider::new(GithubOAuthConfig {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            redirect_url: "http://localhost:9090/auth/github/callback".into(),
            authorize_url: "https://github.com/login/oauth/authorize".into(),
            token_url: "https://github.com/login/oauth/access_token".into(),
            api_base_url: "https://api.github.com".into(),
        })
        .unwrap();
        let url = provider.authorize_url("xyz").unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "cid");
        assert_eq!(pairs["state"], "xyz");
    }
}
