//! Infrastructure layer: external dependency implementations.
//!
//! - `ports` - the oracle port trait and its request/response types
//! - `openai` - OpenAI-compatible oracle client
//! - `websocket` - game server channel
//! - `config` - environment configuration

pub mod config;
pub mod correlation;
pub mod openai;
pub mod ports;
pub mod websocket;
