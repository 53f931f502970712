//! # Amber Monitor - usage and price reports for Amber Electric
//!
//! Authenticates against the Amber Electric REST API, fetches usage and
//! price intervals for the account's active site and reduces them to the
//! statistics a household dashboard shows.
//!
//! ## Features
//!
//! - **Overview**: trailing 30-day daily usage, export, cost and renewables,
//!   fetched in parallel 7-day chunks
//! - **Day detail**: half-hourly usage joined with the matching price
//! - **Live**: recent usage for the last 6, 12 or 24 hours or today
//! - **Prices**: the current price and the forecast ahead
//! - **Rate limits**: countdown and automatic retry when the API says wait
//! - **Web**: optional local JSON API (feature `web`)
//!
//! ## Architecture
//!
//! - `config`: YAML configuration and validation
//! - `logging`: Structured logging and tracing
//! - `store`: Session persistence (API key, site id, auth token)
//! - `auth`: Login and logout
//! - `amber`: API client and wire types
//! - `report`: Aggregation of raw intervals into reports
//! - `retry`: Rate-limit countdown
//! - `scheduler`: Periodic timers
//! - `dashboard`: Single-active-operation view controller
//! - `render`: Terminal output
//! - `web`: HTTP JSON API

pub mod amber;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod render;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod store;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{MonitorError, Result};
