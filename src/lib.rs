//! Declarative lifecycle management for TencentCloud resources
//!
//! Resources are described by a schema and a field mapping (see
//! `src/resources/*.json`) plus a small per-type handler. [`resource::Lifecycle`]
//! drives create, read, update, delete and import on top of the retry-wrapped
//! API calls of [`provider::Provider`].

pub mod config;
pub mod error;
pub mod id;
pub mod mapper;
pub mod provider;
pub mod resource;
pub mod retry;
pub mod schema;
pub mod services;
pub mod state;
pub mod tencentcloud;

/// Version injected at compile time via TCPROV_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TCPROV_VERSION") {
    Some(v) => v,
    None => "dev",
};
