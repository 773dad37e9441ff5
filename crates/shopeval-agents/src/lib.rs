//! The two A2A agent servers of the evaluation pair.
//!
//! The green (controller) agent receives the assessment task, instantiates
//! the environment, and drives the evaluation loop against the white
//! (solver) agent, which turns observations into actions via a pluggable
//! policy.

pub mod card;
pub mod green;
pub mod server;
pub mod white;
