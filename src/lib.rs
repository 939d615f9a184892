//! # Shop Identity
//!
//! Registration, password login and Google sign-in for the online shop.
//! Every successful call returns the user, their roles and a signed session token.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: user model, account policy and the identity store trait
//! - **application**: authentication use-cases and the token issuer port
//! - **infrastructure**: SeaORM and in-memory stores, bcrypt, JWT
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: error types and shutdown coordination

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig};

pub use interfaces::http::create_api_router;
