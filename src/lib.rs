// Hydra Client - async client for the Hydra game-platform API

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod search;

pub use auth::{AuthManager, AuthStatus, Credentials, TicketProvider};
pub use client::{HydraClient, LeaderboardKind};
pub use config::ClientConfig;
pub use error::ApiError;
pub use models::{Platform, RequestDescriptor, RequestOptions, SearchPage};
