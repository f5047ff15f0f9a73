//! Process configuration: listen address and the two collection files.
//!
//! Read from env in the binary: `HOST` (default `0.0.0.0`), `PORT` (default `8080`),
//! `PRODUCTS_FILE` (default `data/products.json`), `CARTS_FILE` (default `data/carts.json`).

use log::warn;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PRODUCTS_FILE: &str = "data/products.json";
pub const DEFAULT_CARTS_FILE: &str = "data/carts.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub products_path: PathBuf,
    pub carts_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            products_path: PathBuf::from(DEFAULT_PRODUCTS_FILE),
            carts_path: PathBuf::from(DEFAULT_CARTS_FILE),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unparsable values fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let host = match lookup("HOST") {
            Some(raw) => raw.trim().parse::<IpAddr>().unwrap_or_else(|_| {
                warn!("ignoring invalid HOST={}", raw);
                defaults.bind_addr.ip()
            }),
            None => defaults.bind_addr.ip(),
        };
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                warn!("ignoring invalid PORT={}", raw);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        let products_path = lookup("PRODUCTS_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.products_path);
        let carts_path = lookup("CARTS_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.carts_path);
        Self {
            bind_addr: SocketAddr::new(host, port),
            products_path,
            carts_path,
        }
    }
}
