//! device-relay: HTTP relay between parent monitoring apps and the Firebase
//! backend holding child device state.
//!
//! The service validates inbound requests, performs a single read or write
//! against the realtime database (or asks FCM to deliver one push message),
//! and maps the outcome to a uniform JSON envelope.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod services;
pub mod startup;
