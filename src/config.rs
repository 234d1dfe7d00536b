use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ResetTokenConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    /// Receives shop approval requests.
    pub admin_inbox: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub base_url: String,
    pub reset: ResetTokenConfig,
    pub mail: MailConfig,
    pub admin: Option<AdminAccount>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".into())
            .trim_end_matches('/')
            .to_string();

        let reset = ResetTokenConfig {
            secret: std::env::var("SECRET_KEY")?,
            issuer: std::env::var("RESET_TOKEN_ISSUER").unwrap_or_else(|_| "shopfront".into()),
            audience: std::env::var("RESET_TOKEN_AUDIENCE")
                .unwrap_or_else(|_| "password-reset".into()),
            ttl_seconds: std::env::var("RESET_TOKEN_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };

        let username = std::env::var("EMAIL_USER").ok().filter(|v| !v.is_empty());
        let admin = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminAccount { email, password }),
            _ => None,
        };
        let mail = MailConfig {
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".into()),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(465),
            admin_inbox: username
                .clone()
                .or_else(|| admin.as_ref().map(|a| a.email.clone()))
                .unwrap_or_else(|| "noreply@demo.com".into()),
            username,
            password: std::env::var("EMAIL_PASS").ok().filter(|v| !v.is_empty()),
            from_address: std::env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@demo.com".into()),
        };

        Ok(Self {
            database_url,
            base_url,
            reset,
            mail,
            admin,
        })
    }

    /// Absolute link for mails.
    pub fn external_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
