// config.rs
// Runtime configuration read from the environment (after dotenvy loads .env).

use anyhow::{Context, Result};
use std::{env, net::SocketAddr, path::PathBuf};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4001";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub broadcast_capacity: usize,
    /// Applied when a save-consumo request carries no rounding flag.
    pub round_to_tens_default: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 4001)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            round_to_tens_default: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid BIND_ADDR: {bind_addr}"))?;

        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());

        let broadcast_capacity = match env::var("BROADCAST_CAPACITY") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| format!("invalid BROADCAST_CAPACITY: {raw}"))?,
            Err(_) => DEFAULT_BROADCAST_CAPACITY,
        };

        let round_to_tens_default = env::var("ROUND_TO_TENS_DEFAULT")
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(data_dir),
            broadcast_capacity,
            round_to_tens_default,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
