use std::{env, fmt::Display, str::FromStr};

use tracing::warn;

pub struct Config {
    pub port: u16,
    pub mongo_uri: String,
    pub geocoder_url: String,
    pub geocoder_timeout_ms: u64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "7860"),
            mongo_uri: require("MONGO_URI"),
            geocoder_url: try_load("GEOCODER_URL", "https://nominatim.openstreetmap.org"),
            geocoder_timeout_ms: try_load("GEOCODER_TIMEOUT_MS", "3000"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn require(key: &str) -> String {
    env::var(key)
        .map_err(|_| {
            warn!("Required environment variable {key} not set");
        })
        .expect("Environment misconfigured!")
}
