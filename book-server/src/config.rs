use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the server listens on
    pub port: u16,
    /// SQLite database holding users, pages, annotations and sessions
    pub database_url: String,
    /// Directory of rendered book content fragments (`chapter1section4.html`, ...)
    pub content_dir: PathBuf,
    /// Whether session cookies are marked `Secure` (HTTPS only)
    pub secure_cookies: bool,
    /// How long a session survives without activity
    pub session_idle_hours: i64,
    /// GitHub OAuth application settings
    pub github: GithubOAuthConfig,
}

#[derive(Debug, Clone)]
pub struct GithubOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback registered with the GitHub OAuth app.
    pub redirect_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port = env_parse("BOOK_SERVER_PORT", 9090)?;

        Ok(Self {
            port,
            database_url: env_str("BOOK_DATABASE_URL", "sqlite:./data/book.db"),
            content_dir: PathBuf::from(env_str("BOOK_CONTENT_DIR", "./content")),
            secure_cookies: env_parse("SESSION_SECURE_COOKIE", false)?,
            session_idle_hours: env_parse("SESSION_IDLE_HOURS", 24)?,
            github: GithubOAuthConfig {
                client_id: env_str("GITHUB_CLIENT_ID", ""),
                client_secret: env_str("GITHUB_CLIENT_SECRET", ""),
                redirect_url: env_str(
                    "GITHUB_REDIRECT_URL",
                    &format!("http://localhost:{port}/auth/github/callback"),
                ),
                authorize_url: env_str(
                    "GITHUB_AUTHORIZE_URL",
                    "https://github.com/login/oauth/authorize",
                ),
                token_url: env_str(
                    "GITHUB_TOKEN_URL",
                    "https://github.com/login/oauth/access_token",
                ),
                api_base_url: env_str("GITHUB_API_BASE_URL", "https://api.github.com"),
            },
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

/// Resolve the reader-ui build output served under `/wasm` and `/assets`.
///
/// If `FRONTEND_DIST` is set, that value is used as-is.
/// Otherwise resolve from the workspace root so this works whether the
/// server is launched from repository root or from `book-server/`.
pub fn frontend_dist_from_env() -> String {
    if let Ok(path) = std::env::var("FRONTEND_DIST") {
        return path;
    }

    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    workspace_root
        .join("reader-ui/target/dx/reader-ui/debug/web/public")
        .to_string_lossy()
        .to_string()
}
