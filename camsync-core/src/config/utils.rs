//! Configuration utility functions
//!
//! This module provides helper functions for reading default values from
//! environment variables.

/// Get a u32 value from an environment variable or use the default
pub fn get_env_u32(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(val) => val.parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Get a u64 value from an environment variable or use the default
pub fn get_env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Get a f64 value from an environment variable or use the default
pub fn get_env_f64(key: &str, default: f64) -> f64 {
    match std::env::var(key) {
        Ok(val) => val.parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Get a whitespace-separated command line from an environment variable or use the default
pub fn get_env_command(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => {
            val.split_whitespace().map(str::to_string).collect()
        }
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}
