//! Aegis — a gatekeeper for accounts that delegate to replaceable modules.
//!
//! An account runs a guard in front of third-party module code. The guard
//! only adopts modules whose exact code carries a `Safe` verdict in a shared
//! registry, charges a per-call fee, and freezes the account when a module
//! tampers with the guard's own state.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;

pub mod ring;
pub mod storage;
pub mod types;

pub mod fee;
pub mod module;
pub mod registry;
pub mod token;

pub mod guard;
pub mod runtime;

pub mod adoption;
pub mod sentinel;

pub mod modules;
