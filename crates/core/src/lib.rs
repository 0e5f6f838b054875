//! Core types and shared functionality for wishlist-edge.
//!
//! This crate provides:
//! - Versioned cache generations with in-memory and SQLite backends
//! - The worker lifecycle state machine and the network-first cache controller
//! - The share ingestion pipeline
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod exchange;
pub mod lifecycle;
pub mod network;
pub mod share;

pub use cache::{CacheDb, CacheStorage, CachedResponse, MemoryStorage, RequestKey, open_storage};
pub use config::{AppConfig, ConfigError, StorageKind};
pub use controller::{CacheController, ControllerConfig, ControllerStats, FetchOutcome, Served, StatsSnapshot};
pub use error::Error;
pub use exchange::{Request, Response};
pub use lifecycle::{Effect, Event, Lifecycle};
pub use network::{Network, NetworkError};
pub use share::{Ingestor, NormalizedShareTarget, RedirectTarget, ShareError, SharePayload};
