//! # sqlgate
//!
//! A fail-closed gate for agent-generated SQL.
//!
//! Every query an upstream agent wants to run passes through
//! [`QueryValidator::validate`], which returns a [`Verdict`]. Only single,
//! well-formed, read-only statements with no known injection shape are
//! allowed.
//!
//! ## Architecture
//!
//! - A single-pass lexical scanner separates code from strings and comments
//! - Keyword and structural guards run over the resulting token stream
//! - The validator applies the guards in a fixed order and packages the result
//!
//! Keyword sets and injection signatures are loaded once from configuration and
//! never change afterwards, so a validator can be shared freely across threads.

pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod security;

pub use config::Config;
pub use error::GateError;
pub use security::{QueryValidator, ReasonCode, Verdict};
