//! Core types and trait definitions for the LATS back-office data layer.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the domain model the UI consumes, the wire row shape the remote
//! store speaks, and the two seams every other crate plugs into:
//! [`store::RemoteStore`] and [`event::EventSink`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod event;
pub mod product;
pub mod purchase_order;
pub mod response;
pub mod sale;
pub mod shipping;
pub mod spare_part;
pub mod store;

pub use error::{Error, Result};
pub use response::{ApiResponse, Page};

/// The authenticated caller on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub user_id: String,
}

impl Session {
  pub fn new(user_id: impl Into<String>) -> Self {
    Self { user_id: user_id.into() }
  }

  pub fn is_authenticated(&self) -> bool { !self.user_id.trim().is_empty() }
}
