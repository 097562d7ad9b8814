//! Client for the Evohome EMEA web API: login, installation topology, and the refresh
//! passes that keep zone status and schedules current.

pub mod models {
    pub mod evohome;
}

pub mod client;
pub mod config;
pub mod env_file;
pub mod error;
pub mod evohome;
pub mod session;
pub mod topology;
pub mod utils;
pub mod services {
    pub mod poller;
    pub mod refresh;
}

#[cfg(test)]
mod testing;

pub use client::{Credentials, Endpoints, EvohomeApi, EvohomeClient};
pub use error::EvohomeError;
pub use evohome::Evohome;
pub use session::Session;
