//! Environment variable helpers shared by the config loaders.

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Reads `name` and parses it, or returns `default` when unset or blank.
pub fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        _ => Ok(default),
    }
}

/// Reads `name`, treating unset and blank the same.
pub fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}
