//! Least-squares trend lines of rider counts against weather measurements.

use clap::ValueEnum;
use serde::Serialize;

use crate::labels::Season;
use crate::query::utility::mean;
use crate::records::CanonicalRecord;

/// A normalized weather measurement usable as the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WeatherVariable {
    Temp,
    Atemp,
    Hum,
    Windspeed,
}

impl WeatherVariable {
    fn value(self, rec: &CanonicalRecord) -> Option<f64> {
        match self {
            WeatherVariable::Temp => Some(rec.raw.temp),
            WeatherVariable::Atemp => rec.raw.atemp,
            WeatherVariable::Hum => Some(rec.raw.hum),
            WeatherVariable::Windspeed => Some(rec.raw.windspeed),
        }
    }
}

/// Which count is the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Rider {
    Casual,
    Registered,
    #[default]
    Total,
}

impl Rider {
    fn count(self, rec: &CanonicalRecord) -> f64 {
        f64::from(match self {
            Rider::Casual => rec.casual(),
            Rider::Registered => rec.registered(),
            Rider::Total => rec.total(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub variable: WeatherVariable,
    pub rider: Rider,
    pub points: usize,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fits `rider = slope * variable + intercept` over `rows`.
///
/// Rows without the variable are skipped. Returns `None` with fewer than
/// two points or when every x is the same.
pub fn fit_trend<'a>(
    rows: impl IntoIterator<Item = &'a CanonicalRecord>,
    variable: WeatherVariable,
    rider: Rider,
) -> Option<TrendLine> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = rows
        .into_iter()
        .filter_map(|r| variable.value(r).map(|x| (x, rider.count(r))))
        .unzip();

    if xs.len() < 2 {
        return None;
    }

    let mx = mean(&xs);
    let my = mean(&ys);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        sxx += (x - mx).powi(2);
        sxy += (x - mx) * (y - my);
        syy += (y - my).powi(2);
    }

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    // constant y is fit exactly by a flat line
    let r_squared = if syy == 0.0 {
        1.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };

    Some(TrendLine {
        variable,
        rider,
        points: xs.len(),
        slope,
        intercept,
        r_squared,
    })
}

/// One trend line per season present in `rows`, Spring first.
pub fn fit_trend_by_season(
    rows: &[&CanonicalRecord],
    variable: WeatherVariable,
    rider: Rider,
) -> Vec<(Season, TrendLine)> {
    Season::ALL
        .iter()
        .filter_map(|&season| {
            let line = fit_trend(
                rows.iter().copied().filter(|r| r.season == season),
                variable,
                rider,
            )?;
            Some((season, line))
        })
        .collect()
}
