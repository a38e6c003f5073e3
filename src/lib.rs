//! # localscore
//!
//! Local, single-row scoring of trained pipelines, with no distributed engine
//! at runtime.
//!
//! A trained pipeline mixes two kinds of stages: native transforms that run
//! in-process, and wrapped stages whose trained operator belongs to a
//! distributed engine. Wrapped stages are compiled once into portable models
//! that an interchange interpreter can run on a single record.
//!
//! ## Core Design Principles
//!
//! - **Build Once, Score Many**: All classification and compilation happens
//!   when the plan is built. Scoring only reads the plan.
//! - **Closed Stage Kinds**: Every plan stage is either native or portable,
//!   resolved at build time. Unknown stages fail the build.
//! - **Exact Values**: Values cross into the portable domain unchanged. A shape
//!   that does not match its declared type is an error, never coerced.
//! - **Thread Safety**: A [`Plan`] is `Send + Sync`; the scoring function can be
//!   shared across threads.
//!
//! ## Quick Start
//!
//! ```ignore
//! use localscore::features::DaysBetween;
//! use localscore::interchange::ExternalTransformer;
//! use localscore::pipeline::{TrainedPipeline, WrappedStage};
//! use localscore::{Feature, PlanBuilder, Row, RowExecutor, Value};
//!
//! let scaler = ExternalTransformer::new("standard_scaler", "scaler_1")
//!     .with_param("inputCol", "age_days")
//!     .with_param("outputCol", "age_scaled")
//!     .with_param("mean", serde_json::json!([12000.0]))
//!     .with_param("std", serde_json::json!([3000.0]));
//!
//! let pipeline = TrainedPipeline::new(vec![Feature::real("age_scaled")])
//!     .add_native(DaysBetween::new("birth_date", "age_days", reference_ms))
//!     .add_wrapped(WrappedStage::new(
//!         scaler,
//!         vec![Feature::real("age_days")],
//!         Feature::real("age_scaled"),
//!     ));
//!
//! let plan = PlanBuilder::default().build(&pipeline)?;
//! let score = RowExecutor::new(plan).into_score_fn();
//!
//! let mut row = Row::new();
//! row.insert("birth_date".into(), Value::Integral(birth_ms));
//! let scored = score(&row)?;
//! ```
//!
//! ## Module Structure
//!
//! - `value`: Native values, feature types and rows
//! - `bridge`: Conversion between native values and portable JSON values
//! - `interchange`: Compiler/interpreter seams and the bundled JSON interchange
//! - `pipeline`: Trained pipelines, native transforms and wrapped stages
//! - `features`: Ready-made native transforms (date features, closures)
//! - `plan`: Plan building and wrapped-stage compilation
//! - `executor`: Row scoring against a built plan
//! - `config`: Compilation settings
//! - `error`: Error types

/// Conversion between native values and the portable JSON domain.
pub mod bridge;

/// Settings for compiling wrapped stages.
pub mod config;

pub mod error;

/// Scoring single rows against a built plan.
pub mod executor;

/// Ready-made native feature transforms.
pub mod features;

pub mod interchange;
pub mod pipeline;
pub mod plan;

/// Native values, feature types and rows.
pub mod value;

pub use config::CompilerConfig;
pub use error::{Result, ScoringError};
pub use executor::RowExecutor;
pub use plan::{Plan, PlanBuilder};
pub use value::{Feature, FeatureType, Row, Value};
