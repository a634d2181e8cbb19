//! Built-in reference adapters.
//!
//! Real provider scrapers live outside this crate; these adapters exist
//! to exercise the contract end to end. The static pair replays records
//! embedded in the source configuration (one per capability), and
//! [`JsonApiAdapter`] is a generic batch adapter for providers that
//! already expose their measurements as a JSON array, including the
//! common per-station fan-out pattern.

mod http_json;
mod static_data;

pub use http_json::JsonApiAdapter;
pub use static_data::{StaticBatchAdapter, StaticStreamAdapter};
