//! Resource abstraction layer
//!
//! This module provides a data-driven approach to managing TencentCloud
//! resources. Schemas and field mappings are loaded from JSON files at compile
//! time; each type adds only a handler for the calls that differ.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`lifecycle`] - Create/read/update/delete/import driver and handler traits
//! - [`lock`] - Named action locks shared across concurrent operations
//! - [`waiter`] - Polling of asynchronous CLB tasks
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `clb.json` - Load balancer listener rules, rule queries, log sets
//! - `cls.json` - Log service COS recharge tasks
//!
//! # Example
//!
//! ```ignore
//! use tcprov::resource::Lifecycle;
//!
//! async fn create_rule(provider: &tcprov::provider::Provider, config: &tcprov::schema::AttrMap)
//!     -> Result<(), tcprov::error::ProviderError>
//! {
//!     let lifecycle = Lifecycle::new(provider, "tencentcloud_clb_listener_rule")?;
//!     let state = lifecycle.create(config).await?;
//!     println!("created {}", state.id);
//!     Ok(())
//! }
//! ```

pub mod lifecycle;
pub mod lock;
mod registry;
pub mod waiter;

pub use lifecycle::{read_data_source, Applied, DataSourceHandler, Lifecycle, Plan, ResourceHandler};
pub use registry::*;
