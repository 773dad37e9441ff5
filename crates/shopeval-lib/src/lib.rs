//! Shopeval Core Library
//!
//! This library implements the evaluation orchestration core:
//! - Tag codec for structured payloads embedded in free-form text
//! - A2A wire protocol types and the transport client
//! - Readiness probing for launched agent endpoints
//! - The environment adapter contract plus a deterministic simulated shop
//! - The step-bounded evaluation loop and its episode metrics

pub mod client;
pub mod env;
pub mod episode;
pub mod error;
pub mod probe;
pub mod protocol;
pub mod results;
pub mod tags;

pub use error::EvalError;
