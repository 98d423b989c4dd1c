use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
    /// Address the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// SMTP relay; mail delivery is disabled when unset
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    // Sender block printed on every invoice
    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default = "default_company_street")]
    pub company_street: String,
    #[serde(default = "default_company_postal")]
    pub company_postal: String,
    #[serde(default = "default_company_cvr")]
    pub company_cvr: String,
    #[serde(default = "default_company_web")]
    pub company_web: String,
    #[serde(default = "default_company_email")]
    pub company_email: String,
    #[serde(default = "default_company_phone")]
    pub company_phone: String,
}

/// The contractor's own details, as printed on invoices and emails.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub name: String,
    pub street: String,
    pub postal: String,
    pub cvr: String,
    pub web: String,
    pub email: String,
    pub phone: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: default_company_name(),
            street: default_company_street(),
            postal: default_company_postal(),
            cvr: default_company_cvr(),
            web: default_company_web(),
            email: default_company_email(),
            phone: default_company_phone(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables from a `.env` file are loaded first when the file exists,
    /// then the process environment is deserialized into `Config`.
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn company(&self) -> CompanyProfile {
        CompanyProfile {
            name: self.company_name.clone(),
            street: self.company_street.clone(),
            postal: self.company_postal.clone(),
            cvr: self.company_cvr.clone(),
            web: self.company_web.clone(),
            email: self.company_email.clone(),
            phone: self.company_phone.clone(),
        }
    }
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_mail_from() -> String {
    "RAH Maler <info@rahmaler.dk>".to_string()
}

fn default_company_name() -> String {
    "RAH Maler".to_string()
}

fn default_company_street() -> String {
    "Tingbjerg ås 9".to_string()
}

fn default_company_postal() -> String {
    "2700 Brønshøj".to_string()
}

fn default_company_cvr() -> String {
    "12345678".to_string()
}

fn default_company_web() -> String {
    "rahmaler.dk".to_string()
}

fn default_company_email() -> String {
    "info@rahmaler.dk".to_string()
}

fn default_company_phone() -> String {
    "70 10 20 31".to_string()
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    let config = Config::load()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_everything_but_the_database_url() {
        let vars = vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/maler".to_string(),
        )];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.database_url(), "postgres://localhost/maler");
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.database_max_connections, 5);
        assert!(config.smtp_host.is_none());
        assert_eq!(config.company(), CompanyProfile::default());
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let vars: Vec<(String, String)> = vec![("BIND_ADDR".into(), "0.0.0.0:80".into())];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}
