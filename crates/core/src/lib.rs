//! Bookshelf Core - Shared domain types.
//!
//! This crate provides the types shared by every Bookshelf component:
//! - `web` - The catalog web application (library and server binary)
//! - `cli` - Command-line tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no database
//! access, no HTTP. Values that reach the rest of the system have already
//! been validated here.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, e-mails, review text and permissions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
