//! Core types, trait definitions and consistency engines for the Shelf
//! storefront.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::ShopStore`]; product data comes from any
//! [`catalog::Catalog`]. The engines in [`merge`], [`address`], [`materialize`]
//! and [`account`] are generic over both.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod address;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod materialize;
pub mod merge;
pub mod order;
pub mod store;
pub mod validation;

pub use error::{Error, Result};
