//! Core types for Bookshelf.
//!
//! This module provides type-safe wrappers for the catalog's domain concepts.

pub mod email;
pub mod id;
pub mod permission;
pub mod price;
pub mod review;

pub use email::{Email, EmailError};
pub use id::*;
pub use permission::{Permission, PermissionError};
pub use price::{Price, PriceError};
pub use review::{ReviewText, ReviewTextError};
