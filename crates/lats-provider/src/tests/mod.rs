//! Scenario tests for [`crate::DataProvider`] against an in-memory SQLite
//! store, with faults injected where a scenario needs one.

mod support;

mod catalog;
mod products;
mod purchase_orders;
