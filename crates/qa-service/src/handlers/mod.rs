//! HTTP request handlers for the QA service.

mod health;
mod identity;

pub use health::health_check;
pub use identity::{ping, whoami, PingResponse, WhoAmIResponse};
