//! Upstream client for wishlist-edge.
//!
//! This crate provides the reqwest-backed [`Network`](wishlist_edge_core::Network)
//! used by the server and CLI, and the mapping from inbound request targets
//! onto the upstream origin.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork, UrlError, upstream_url};
