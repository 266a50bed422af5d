//! Pricing Engine library crate.
//!
//! This crate exposes the service pricing calculator and its HTTP API
//! as reusable modules.  External applications may depend on the
//! `pricing_engine` crate and call `calculator::calculate_pricing`
//! directly or embed the API via `api::build_router`.

pub mod models;
pub mod error;
pub mod validation;
pub mod calculator;
pub mod display;
pub mod auth;
pub mod store;
pub mod config;
pub mod api;

pub use calculator::{calculate_pricing, calculate_scenarios};
pub use error::{PricingError, Result};
pub use models::{CostBreakdown, CostInputs, PricingConfig, PricingResult};
