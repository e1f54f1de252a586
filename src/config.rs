use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// HS256 secret shared with the identity provider; issued user JWTs are
    /// verified against it.
    pub jwt_secret: String,
}

const PLACEHOLDER_SECRET: &str = "CHANGE_ME_DEV_ONLY_JWT_SECRET";

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let jwt_secret =
        std::env::var("CODEXI_JWT_SECRET").unwrap_or_else(|_| PLACEHOLDER_SECRET.into());

    if jwt_secret == PLACEHOLDER_SECRET {
        let env_mode = std::env::var("CODEXI_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "CODEXI_JWT_SECRET is still the insecure placeholder. \
                 Set the identity provider's signing secret before running in production."
            );
        }
        eprintln!("⚠️  CODEXI_JWT_SECRET is not set — using insecure placeholder. Set the identity provider's signing secret for production.");
    }

    Ok(Config {
        port: std::env::var("CODEXI_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/codexi".into()),
        jwt_secret,
    })
}
