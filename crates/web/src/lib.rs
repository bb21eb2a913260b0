//! Bookshelf web application.
//!
//! A server-rendered book catalog: visitors browse and search books, signed-in
//! readers with the `books.special_status` permission see the detail page and
//! leave reviews, and staff manage the catalog from the admin pages.
//!
//! # Architecture
//!
//! - Axum web framework with HTMX for review submission and deletion
//! - Askama templates for server-side rendering
//! - `PostgreSQL` behind repository traits (an in-memory store backs the tests)
//! - Sessions in `PostgreSQL` via `tower-sessions`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
