//! Native feature transforms.
//!
//! | Transform | Output | Description |
//! |-----------|--------|-------------|
//! | [`DaysBetween`] | real | Whole days from a date to a reference date |
//! | [`DateToUnitCircle`] | vector | `[sin, cos]` position of a date in a calendar period |
//! | [`FnTransform`] | any | Any closure over the row |

pub mod date;
pub mod fn_transform;

pub use date::{DateToUnitCircle, DaysBetween, TimePeriod, MS_PER_DAY, MS_PER_HOUR};
pub use fn_transform::FnTransform;
