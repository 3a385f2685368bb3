//! Configuration resolution.
//!
//! A pure function of the argument vector: resolving the same store twice
//! yields identical configurations. Numeric flags must parse as unsigned
//! integers; anything else (garbage, negative values) is rejected here so
//! startup halts before any transport or session work begins.

use crate::args::ArgStore;
use swarmbench_net::TransportKind;
use thiserror::Error;

/// Usage text printed for `-help`.
pub const USAGE: &str = "\
--== swarmbench headless load harness ==--
Flags:
  -server              run a listening server instance
  -client <n>          run <n> simulated clients against -address
  -transport <kind>    kcp | websocket (default kcp)
  -address <host>      target address for clients (default localhost)
  -port <port>         port override for the selected transport
  -monster <n>         synthetic entities to spawn on server activation
  -ramp <n>            concurrent connection attempts during launch (default 1)
  -help                print this text and exit";

/// Fatal configuration errors; none of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown transport kind `{0}`")]
    UnknownTransport(String),
    #[error("invalid value `{value}` for `{flag}`")]
    InvalidNumber { flag: &'static str, value: String },
}

/// Resolved harness configuration, immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub transport: TransportKind,
    pub port: Option<u16>,
    pub server: bool,
    /// Number of simulated clients; 0 disables the client role.
    pub clients: u32,
    pub address: String,
    pub monsters: u32,
    /// How many connection attempts may be in flight at once.
    pub ramp: usize,
    pub help: bool,
}

impl HarnessConfig {
    /// Resolve a configuration from the argument store.
    pub fn resolve(store: &ArgStore) -> Result<Self, ConfigError> {
        let transport = match store.value_of("-transport") {
            None => TransportKind::Kcp,
            Some(name) => name
                .parse()
                .map_err(|_| ConfigError::UnknownTransport(name.to_string()))?,
        };

        let clients = if store.has_flag("-client") {
            // Bare `-client` with no count runs a single client.
            numeric::<u32>(store, "-client")?.unwrap_or(1)
        } else {
            0
        };

        let ramp = numeric::<usize>(store, "-ramp")?.unwrap_or(1);
        if ramp == 0 {
            return Err(ConfigError::InvalidNumber {
                flag: "-ramp",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            transport,
            port: numeric::<u16>(store, "-port")?,
            server: store.has_flag("-server"),
            clients,
            address: store
                .value_of("-address")
                .unwrap_or("localhost")
                .to_string(),
            monsters: numeric::<u32>(store, "-monster")?.unwrap_or(0),
            ramp,
            help: store.has_flag("-help"),
        })
    }
}

fn numeric<T: std::str::FromStr>(
    store: &ArgStore,
    flag: &'static str,
) -> Result<Option<T>, ConfigError> {
    match store.value_of(flag) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::InvalidNumber {
            flag,
            value: raw.to_string(),
        }),
    }
}
