use serde::Serialize;

use crate::query::utility::pct;
use crate::records::CanonicalRecord;

/// Headline numbers for the rows that survive the current filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub rows: usize,
    pub total_rentals: u64,
    pub casual_rentals: u64,
    pub registered_rentals: u64,
    /// Mean total per row (per day for the daily table, per hour otherwise).
    pub mean_rentals: f64,
    pub casual_pct: f64,
    pub registered_pct: f64,
}

impl KeyMetrics {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a CanonicalRecord>) -> Self {
        let mut m = KeyMetrics::default();

        for r in rows {
            m.rows += 1;
            m.total_rentals += u64::from(r.total());
            m.casual_rentals += u64::from(r.casual());
            m.registered_rentals += u64::from(r.registered());
        }

        if m.rows > 0 {
            m.mean_rentals = m.total_rentals as f64 / m.rows as f64;
        }
        m.casual_pct = pct(m.casual_rentals, m.total_rentals);
        m.registered_pct = pct(m.registered_rentals, m.total_rentals);

        m
    }
}
