//! Oracle-backed decisions.
//!
//! Both clients call the same completion endpoint and fail closed: any error
//! becomes "no decision" (fold) or "no reply" (stay quiet). Nothing is retried.

mod action;
mod chat;
mod json;

pub use action::{ActionContext, ActionDecisionClient};
pub use chat::{ChatContext, ChatDecisionClient, TableContext};
