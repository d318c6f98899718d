// config.rs
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bot_token: String,
    pub port: u16,
    pub admin_user_ids: Vec<i64>,
    pub support_channel_id: Option<i64>,
    pub telegram_api_url: String,
    pub poll_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = required("DATABASE_URL")?;
        let bot_token = required("BOT_TOKEN")?;

        let port = match optional("PORT") {
            Some(value) => parse_value("PORT", &value)?,
            None => 3000,
        };

        let admin_user_ids = match optional("ADMIN_USER_IDS") {
            Some(value) => parse_id_list("ADMIN_USER_IDS", &value)?,
            None => Vec::new(),
        };

        let support_channel_id = optional("SUPPORT_CHANNEL_ID")
            .map(|value| parse_value("SUPPORT_CHANNEL_ID", &value))
            .transpose()?;

        let telegram_api_url =
            optional("TELEGRAM_API_URL").unwrap_or_else(|| "https://api.telegram.org".to_string());

        let poll_timeout_secs = match optional("POLL_TIMEOUT_SECS") {
            Some(value) => parse_value("POLL_TIMEOUT_SECS", &value)?,
            None => 30,
        };

        let log_level = optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Config {
            database_url,
            bot_token,
            port,
            admin_user_ids,
            support_channel_id,
            telegram_api_url,
            poll_timeout_secs,
            log_level,
        })
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_id_list(name: &'static str, value: &str) -> Result<Vec<i64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| parse_value(name, id))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/desk"), ("BOT_TOKEN", "t")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.poll_timeout_secs, 30);
        assert_eq!(config.telegram_api_url, "https://api.telegram.org");
        assert_eq!(config.log_level, "info");
        assert!(config.admin_user_ids.is_empty());
        assert_eq!(config.support_channel_id, None);
    }

    #[test]
    fn admin_ids_are_parsed_strictly() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/desk"),
            ("BOT_TOKEN", "t"),
            ("ADMIN_USER_IDS", "12, 34,,56"),
            ("SUPPORT_CHANNEL_ID", "-100200"),
        ])
        .unwrap();
        assert_eq!(config.admin_user_ids, vec![12, 34, 56]);
        assert_eq!(config.support_channel_id, Some(-100200));

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/desk"),
            ("BOT_TOKEN", "t"),
            ("ADMIN_USER_IDS", "12,abc"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "ADMIN_USER_IDS",
                value: "abc".into()
            }
        );
    }

    #[test]
    fn missing_token_is_reported() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/desk")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BOT_TOKEN"));
    }
}
