//! SupplyHub Core - Shared types library.
//!
//! This crate provides the types used across all SupplyHub components:
//! - `server` - The ordering API (orders, payments, notifications)
//! - `cli` - Command-line tools for migrations, seeding and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The order lifecycle transition table lives here so that
//! every caller (HTTP handlers, CLI, tests) agrees on which transitions exist
//! and which side effects they carry.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, roles and status enums
//! - [`lifecycle`] - The order state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod lifecycle;
pub mod types;

pub use lifecycle::{
    NotificationTarget, OrderAction, OrderState, Transition, TransitionError,
};
pub use types::*;
