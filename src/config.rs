//! Application configuration loaded from environment variables.

use std::{env, str::FromStr};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} has an invalid value {value:?}")]
	Invalid { name: &'static str, value: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
	pub host: String,
	pub port: u16,
	/// PostgreSQL connection string. Without one, data lives in memory.
	pub database_url: Option<String>,
	/// Whether anyone may create an author account.
	pub allow_registration: bool,
	pub rate_limit: bool,
	/// Marks the session cookie `Secure`, which requires HTTPS.
	pub secure_cookies: bool,
	/// Exports traces and metrics over OTLP when set.
	pub otlp_endpoint: Option<String>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".into(),
			port: 3000,
			database_url: None,
			allow_registration: false,
			rate_limit: true,
			secure_cookies: !cfg!(debug_assertions),
			otlp_endpoint: None,
		}
	}
}

impl Config {
	/// Loads configuration from environment variables, falling back to the defaults.
	pub fn from_env() -> Result<Self, Error> {
		let defaults = Self::default();

		Ok(Self {
			host: env::var("HOST").unwrap_or(defaults.host),
			port: parse("PORT")?.unwrap_or(defaults.port),
			database_url: non_empty("DATABASE_URL"),
			allow_registration: parse_bool("ALLOW_REGISTRATION")?
				.unwrap_or(defaults.allow_registration),
			rate_limit: parse_bool("RATE_LIMIT")?.unwrap_or(defaults.rate_limit),
			secure_cookies: parse_bool("SECURE_COOKIES")?.unwrap_or(defaults.secure_cookies),
			otlp_endpoint: non_empty("OTEL_EXPORTER_OTLP_ENDPOINT"),
		})
	}
}

fn non_empty(name: &str) -> Option<String> {
	env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse<T: FromStr>(name: &'static str) -> Result<Option<T>, Error> {
	non_empty(name)
		.map(|value| {
			value
				.parse()
				.map_err(|_| Error::Invalid { name, value })
		})
		.transpose()
}

fn parse_bool(name: &'static str) -> Result<Option<bool>, Error> {
	non_empty(name)
		.map(|value| parse_flag(&value).ok_or(Error::Invalid { name, value }))
		.transpose()
}

fn parse_flag(value: &str) -> Option<bool> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_parse_flag() {
		assert_eq!(parse_flag("TRUE"), Some(true));
		assert_eq!(parse_flag("off"), Some(false));
		assert_eq!(parse_flag("maybe"), None);
	}

	#[test]
	fn test_defaults() {
		let config = Config::default();

		assert_eq!(config.port, 3000);
		assert!(!config.allow_registration);
		assert!(config.database_url.is_none());
	}
}
