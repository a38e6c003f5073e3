//! Native date feature transforms.
//!
//! Dates are `Integral` values holding milliseconds since the Unix epoch (UTC).

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use std::f64::consts::PI;

use crate::error::{Result, ScoringError};
use crate::pipeline::NativeTransform;
use crate::value::{Feature, FeatureType, Row, Value};

pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

fn read_date(row: &Row, input: &str) -> Result<Option<i64>> {
    match row.get(input) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Integral(ms)) => Ok(Some(*ms)),
        Some(other) => Err(ScoringError::shape(
            format!("date in '{}'", input),
            other.kind(),
        )),
    }
}

fn to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
        ScoringError::shape("date in the supported calendar range", format!("{} ms", ms))
    })
}

/// Whole days elapsed from a date feature to a fixed reference date.
///
/// Partial days are floored, so a date later than the reference yields a
/// negative count. A null date yields null.
#[derive(Clone, Debug)]
pub struct DaysBetween {
    name: String,
    input: String,
    output: Feature,
    reference_ms: i64,
}

impl DaysBetween {
    pub fn new(input: impl Into<String>, output: impl Into<String>, reference_ms: i64) -> Self {
        let output = Feature::real(output);
        Self {
            name: format!("days_between_{}", output.name),
            input: input.into(),
            output,
            reference_ms,
        }
    }

    pub fn reference_ms(&self) -> i64 {
        self.reference_ms
    }
}

impl NativeTransform for DaysBetween {
    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &Feature {
        &self.output
    }

    fn transform(&self, row: &Row) -> Result<Value> {
        let ms = match read_date(row, &self.input)? {
            Some(ms) => ms,
            None => return Ok(Value::Null),
        };
        let elapsed = self.reference_ms.checked_sub(ms).ok_or_else(|| {
            ScoringError::Transform(format!(
                "date {} ms in '{}' is too far from the reference date",
                ms, self.input
            ))
        })?;
        Ok(Value::Real(elapsed.div_euclid(MS_PER_DAY) as f64))
    }
}

/// Calendar period a date is projected onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimePeriod {
    HourOfDay,
    /// Monday is position zero.
    DayOfWeek,
    /// January 1st is position zero; leap years have 366 positions.
    DayOfYear,
}

impl TimePeriod {
    /// Fraction of the period elapsed at `ms`, in `[0, 1)`.
    fn fraction(self, ms: i64) -> Result<f64> {
        let dt = to_datetime(ms)?;
        let fraction = match self {
            TimePeriod::HourOfDay => {
                let seconds = dt.num_seconds_from_midnight() as f64
                    + f64::from(dt.timestamp_subsec_millis()) / 1000.0;
                seconds / 86_400.0
            }
            TimePeriod::DayOfWeek => f64::from(dt.weekday().num_days_from_monday()) / 7.0,
            TimePeriod::DayOfYear => {
                let year_len = NaiveDate::from_ymd_opt(dt.year(), 12, 31)
                    .map_or(365, |last| last.ordinal());
                f64::from(dt.ordinal0()) / f64::from(year_len)
            }
        };
        Ok(fraction)
    }
}

/// Projects a date onto the unit circle of a calendar period, giving `[sin, cos]`.
///
/// Nearby positions at the wrap-around (Sunday and Monday, December and
/// January) end up close together. A null date yields `[0, 0]`.
#[derive(Clone, Debug)]
pub struct DateToUnitCircle {
    name: String,
    input: String,
    output: Feature,
    period: TimePeriod,
}

impl DateToUnitCircle {
    pub fn new(input: impl Into<String>, output: impl Into<String>, period: TimePeriod) -> Self {
        let output = Feature::new(output, FeatureType::Vector);
        Self {
            name: format!("unit_circle_{}", output.name),
            input: input.into(),
            output,
            period,
        }
    }
}

impl NativeTransform for DateToUnitCircle {
    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &Feature {
        &self.output
    }

    fn transform(&self, row: &Row) -> Result<Value> {
        let coords = match read_date(row, &self.input)? {
            None => vec![0.0, 0.0],
            Some(ms) => {
                let radians = 2.0 * PI * self.period.fraction(ms)?;
                vec![radians.sin(), radians.cos()]
            }
        };
        Ok(Value::Vector(coords))
    }
}
