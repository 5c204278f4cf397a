//! Ride Pricing API Library
//!
//! This library provides the core functionality for the dynamic ride pricing
//! API: feature encoding, the learned base-price estimator, the rule-based
//! pricing engine, and HTTP handlers.
//!
//! # Modules
//!
//! - `artifact`: Persisted pricing-system blob (save/load).
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `estimator`: Base-price estimator (MLP regression model).
//! - `features`: Feature encoding for the estimator.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `pricing`: Dynamic pricing engine (business rules and insights).

pub mod artifact;
pub mod config;
pub mod errors;
pub mod estimator;
pub mod features;
pub mod handlers;
pub mod models;
pub mod pricing;
