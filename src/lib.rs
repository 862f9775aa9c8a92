//! dayrates
//!
//! A small Rust library for turning a daily per-country count table and a set
//! of country boundaries into the data behind an interactive "count per day"
//! map. Pairs with the `dayrates` CLI.
//!
//! ### Features
//! - Load a wide CSV (date column + one column per country) with strict validation
//! - Day-over-day change and cumulative views over the same immutable table
//! - One global marker scale factor, computed once and reused for every day
//! - Load country polygons from GeoJSON, drop excluded regions, compute centroids
//! - Per-day frames of `{name, x, y, rate, scaled size}` and a selection session
//!
//! ### Example
//! ```no_run
//! use std::sync::Arc;
//! use dayrates::{Config, Context, Session};
//!
//! let config = Config {
//!     counts: Some("deaths.csv".into()),
//!     map: Some("countries.geojson".into()),
//!     ..Config::default()
//! };
//! let ctx = Arc::new(Context::load(&config)?);
//! let mut session = Session::new(ctx)?;
//! let ready = session.select_day(10)?;
//! println!("{}: {} countries", ready.label, ready.frame.len());
//! dayrates::storage::save_frame_geojson(&ready.frame, "day10.geojson")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod days;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod models;
pub mod scale;
pub mod series;
pub mod session;
pub mod stats;
pub mod storage;

pub use config::Config;
pub use days::DayIndex;
pub use error::{Error, Result};
pub use frame::{DayFrameBuilder, JoinPolicy};
pub use geometry::{ExclusionPolicy, GeoFeature, GeometryCatalog};
pub use models::{Centroid, DayFrame, DayFrameRow, FrameReady};
pub use scale::ScaleFactor;
pub use series::{SeriesView, TimeSeriesStore};
pub use session::{Context, Session};
