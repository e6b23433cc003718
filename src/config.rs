// src/config.rs

use std::env;
use std::str::FromStr;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Pages are kept in memory when unset.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub rust_log: String,
    pub log_dir: String,
    /// Largest accepted `html` field, in characters.
    pub max_page_size: usize,
    /// Origin URLs are cut to this many characters before storage.
    pub original_url_max_length: usize,
    /// Variables that were set but could not be parsed; their defaults were
    /// used. Reported once logging is up.
    pub malformed_vars: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: "0.0.0.0:3000".to_string(),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            max_page_size: 2 * 1024 * 1024,
            original_url_max_length: 2000,
            malformed_vars: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();
        let mut malformed_vars = Vec::new();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let bind_addr = env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR").unwrap_or(defaults.log_dir);

        let max_page_size = parse_var(
            "MAX_PUBLISHED_PAGE_SIZE",
            defaults.max_page_size,
            &mut malformed_vars,
        );

        let original_url_max_length =
            parse_var(
                "ORIGINAL_URL_MAX_LENGTH",
                defaults.original_url_max_length,
                &mut malformed_vars,
            );

        Self {
            database_url,
            bind_addr,
            rust_log,
            log_dir,
            max_page_size,
            original_url_max_length,
            malformed_vars,
        }
    }
}

/// Reads a numeric variable, keeping `default` when it is unset or malformed.
/// Malformed keys are recorded in `malformed`.
fn parse_var<T: FromStr + Copy>(key: &str, default: T, malformed: &mut Vec<String>) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            malformed.push(key.to_string());
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_numbers_fall_back_and_are_reported() {
        let mut malformed = Vec::new();
        // SAFETY: only this test touches these variables.
        unsafe {
            env::set_var("SAFEPAGE_TEST_LIMIT_BAD", "lots");
            env::set_var("SAFEPAGE_TEST_LIMIT_GOOD", " 42 ");
        }

        assert_eq!(parse_var("SAFEPAGE_TEST_LIMIT_BAD", 7usize, &mut malformed), 7);
        assert_eq!(parse_var("SAFEPAGE_TEST_LIMIT_GOOD", 7usize, &mut malformed), 42);
        assert_eq!(parse_var("SAFEPAGE_TEST_LIMIT_UNSET", 7usize, &mut malformed), 7);
        assert_eq!(malformed, ["SAFEPAGE_TEST_LIMIT_BAD"]);
    }
}
