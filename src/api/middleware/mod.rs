//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Identity: resolve `X-Acting-User` or reject with 401
//! 2. Request log

pub mod auth;
pub mod logging;
