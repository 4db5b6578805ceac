//! Filtering and aggregation over the canonical table.
//!
//! Every query is recomputed from scratch: apply a [`FilterSpec`], group the
//! surviving rows by a [`GroupKey`], and reduce each group to casual,
//! registered and total counts. The table itself is never mutated.

pub mod aggregate;
pub mod filter;
pub mod summary;
pub mod trend;
pub mod types;
pub mod utility;

pub use aggregate::{aggregate, aggregate_with};
pub use filter::FilterSpec;
pub use summary::KeyMetrics;
pub use trend::{Rider, TrendLine, WeatherVariable, fit_trend, fit_trend_by_season};
pub use types::{AggregationResult, GroupKey, GroupRow, GroupValue, Metric, UserType};
