#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`LookupError`)
//! - [`config`]: Alternatives configuration (`AlternativesConfig`, builder)
//! - [`client`]: Product database abstraction (`ProductSource` trait, `OffClient`)
//! - [`filter`]: Region, retailer and grade filters
//! - [`image`]: Image URL allow-list (`ImagePolicy`)
//! - [`alternatives`]: Dual-search pipeline (`AlternativesPipeline`)
//! - [`session`]: Lookup orchestrator (`LookupSession`)
//! - [`scanner`]: Scanner adapter (`DecodeBackend` trait, `BarcodeScanner`, `LineDecoder`)

pub mod alternatives;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod image;
pub mod scanner;
pub mod session;

// --- Public API Re-exports ---

// Session (main orchestrator)
pub use session::{LookupSession, user_message, validate_code};

// Configuration
pub use config::{AlternativesConfig, AlternativesConfigBuilder, RegionRule, RetailerRule};

// Error
pub use error::LookupError;

// Product database
pub use client::{CategoryQuery, OffClient, ProductLookup, ProductSource, SortKey};

// Alternatives
pub use alternatives::{AlternativesPipeline, AlternativesState, Ticket};

// Filters
pub use filter::{
    derive_category_tag, filter_candidates, is_distributed_in_region, is_sold_at_retailer,
    is_valid_grade,
};

// Images
pub use image::ImagePolicy;

// Scanner
pub use scanner::{
    BarcodeScanner, DecodeBackend, DecodeOutcome, KEYBOARD_DEVICE_ID, LineDecoder, ScanOutcome,
};
