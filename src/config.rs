use anyhow::Context;

/// Environment-driven settings, loaded once at startup.
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Frontend origin allowed by CORS. Unset means permissive (local dev).
    pub front_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = dotenv::var("DATABASE_URL")
            .context("DATABASE_URL must be set")?;

        let port = match dotenv::var("PORT") {
            Ok(port) => port.parse().context("PORT must be a number")?,
            Err(_) => 3000,
        };

        let front_url = dotenv::var("FRONT_URL").ok().filter(|url| !url.is_empty());

        Ok(Self {
            database_url,
            port,
            front_url,
        })
    }
}
