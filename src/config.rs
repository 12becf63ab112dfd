/// SMTP relay used for outgoing mail
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub site_url: String,
    pub media_root: String,
    pub smtp: Option<SmtpConfig>,
}

const DEFAULT_JWT_MAXAGE: i64 = 60 * 60 * 24 * 14;
const DEFAULT_PORT: u16 = 8000;

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// Panics at startup when a required variable is missing or malformed.
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .map(|v| v.parse::<i64>().expect("JWT_MAXAGE must be a number of seconds"))
            .unwrap_or(DEFAULT_JWT_MAXAGE);
        let port = std::env::var("PORT")
            .map(|v| v.parse::<u16>().expect("PORT must be a valid port"))
            .unwrap_or(DEFAULT_PORT);
        let site_url = std::env::var("SITE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();
        let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string());

        Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            site_url,
            media_root,
            smtp: SmtpConfig::from_env(),
        }
    }
}

impl SmtpConfig {
    /// Only configured when all four SMTP variables are present.
    fn from_env() -> Option<SmtpConfig> {
        let server = std::env::var("SMTP_SERVER").ok()?;
        let port = std::env::var("SMTP_PORT").ok()?.parse::<u16>().ok()?;
        let username = std::env::var("SMTP_USERNAME").ok()?;
        let password = std::env::var("SMTP_PASSWORD").ok()?;

        Some(SmtpConfig {
            server,
            port,
            username,
            password,
        })
    }
}
