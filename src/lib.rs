//! Descriptive analytics over the historical bike-sharing dataset.
//!
//! The pipeline is two pure steps: [`normalize`](normalize::normalize) turns
//! raw hourly or daily rows into labelled canonical rows, and
//! [`aggregate`](query::aggregate) filters and groups them for display.

pub mod error;
pub mod labels;
pub mod normalize;
pub mod output;
pub mod query;
pub mod records;

pub use error::{DataError, DataResult};
