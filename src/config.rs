use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub stripe: StripeConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    #[serde(default)]
    pub premium_price_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public URL of the web frontend, used for reset links and checkout redirects.
    pub base_url: String,
    /// Inbox for contact form messages. Falls back to the SMTP sender address.
    #[serde(default)]
    pub contact_email: Option<String>,
}

/// Session refresh throttle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

fn default_smtp_port() -> u16 {
    465
}

fn default_from_name() -> String {
    "OPTCL".to_string()
}

fn default_min_interval_secs() -> u64 {
    120
}

fn default_call_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn contact_recipient(&self) -> &str {
        self.app
            .contact_email
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(self.smtp.from_address.as_str())
    }

    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // No config file means everything comes from the environment
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("Failed to parse config file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse(
                            "JWT_ACCESS_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    smtp: SmtpConfig {
                        host: get_env("EMAIL_SERVER_HOST").unwrap_or_default(),
                        port: get_env_parse("EMAIL_SERVER_PORT", default_smtp_port()),
                        username: get_env("EMAIL_SERVER_USER").unwrap_or_default(),
                        password: get_env("EMAIL_SERVER_PASSWORD").unwrap_or_default(),
                        from_address: get_env("EMAIL_FROM").unwrap_or_default(),
                        from_name: get_env("EMAIL_FROM_NAME").unwrap_or_else(default_from_name),
                    },
                    stripe: StripeConfig {
                        secret_key: get_env("STRIPE_SECRET_KEY").unwrap_or_default(),
                        webhook_secret: get_env("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                        premium_price_id: get_env("STRIPE_PREMIUM_PRICE_ID"),
                    },
                    app: AppConfig {
                        base_url: get_env("APP_BASE_URL")
                            .unwrap_or_else(|| "http://localhost:3000".to_string()),
                        contact_email: get_env("CONTACT_EMAIL"),
                    },
                    refresh: RefreshConfig {
                        min_interval_secs: get_env_parse(
                            "REFRESH_MIN_INTERVAL_SECS",
                            default_min_interval_secs(),
                        ),
                        call_timeout_secs: get_env_parse(
                            "REFRESH_CALL_TIMEOUT_SECS",
                            default_call_timeout_secs(),
                        ),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    // Environment wins even when the file exists
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("EMAIL_SERVER_HOST") {
            self.smtp.host = v;
        }
        if let Ok(v) = env::var("EMAIL_SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.smtp.port = p;
        }
        if let Ok(v) = env::var("EMAIL_SERVER_USER") {
            self.smtp.username = v;
        }
        if let Ok(v) = env::var("EMAIL_SERVER_PASSWORD") {
            self.smtp.password = v;
        }
        if let Ok(v) = env::var("EMAIL_FROM") {
            self.smtp.from_address = v;
        }
        if let Ok(v) = env::var("STRIPE_SECRET_KEY") {
            self.stripe.secret_key = v;
        }
        if let Ok(v) = env::var("STRIPE_WEBHOOK_SECRET") {
            self.stripe.webhook_secret = v;
        }
        if let Ok(v) = env::var("STRIPE_PREMIUM_PRICE_ID") {
            self.stripe.premium_price_id = Some(v);
        }
        if let Ok(v) = env::var("APP_BASE_URL") {
            self.app.base_url = v;
        }
        if let Ok(v) = env::var("CONTACT_EMAIL") {
            self.app.contact_email = Some(v);
        }
        if let Ok(v) = env::var("REFRESH_MIN_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.refresh.min_interval_secs = n;
        }
        if let Ok(v) = env::var("REFRESH_CALL_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            self.refresh.call_timeout_secs = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [database]
        url = "postgres://localhost/studio"
        max_connections = 5

        [jwt]
        secret = "secret"
        access_token_expires_in = 3600

        [smtp]
        host = "smtp.example.com"
        username = "mailer@example.com"
        password = "pw"
        from_address = "noreply@example.com"

        [stripe]
        secret_key = "sk_test_123"
        webhook_secret = "whsec_123"

        [app]
        base_url = "http://localhost:3000"
    "#;

    #[test]
    fn test_optional_sections_take_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.refresh.min_interval_secs, 120);
        assert_eq!(config.refresh.call_timeout_secs, 30);
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.smtp.from_name, "OPTCL");
        assert!(config.stripe.premium_price_id.is_none());
        assert_eq!(config.contact_recipient(), "noreply@example.com");
    }

    #[test]
    fn test_contact_email_overrides_sender() {
        let toml_str = MINIMAL.replace(
            "base_url = \"http://localhost:3000\"",
            "base_url = \"http://localhost:3000\"\ncontact_email = \"support@example.com\"",
        );
        let config: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.contact_recipient(), "support@example.com");
    }

    #[test]
    fn test_refresh_section_overrides_defaults() {
        let toml_str = format!("{MINIMAL}\n[refresh]\nmin_interval_secs = 10\n");
        let config: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.refresh.min_interval_secs, 10);
        assert_eq!(config.refresh.call_timeout_secs, 30);
    }
}
