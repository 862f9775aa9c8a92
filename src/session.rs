//! Load-once context and the interactive day-selection flow.
//!
//! [`Context`] bundles everything derived at startup (counts, geometry, scale
//! factor, day span, join policy). It is immutable and can be shared behind an
//! `Arc`. [`Session`] owns the single piece of mutable state, the currently
//! selected day, and turns each selection into a [`FrameReady`] event.

use crate::config::Config;
use crate::days::DayIndex;
use crate::error::Result;
use crate::frame::{DayFrameBuilder, JoinPolicy};
use crate::geometry::GeometryCatalog;
use crate::models::{DayFrame, FrameReady};
use crate::scale::ScaleFactor;
use crate::series::TimeSeriesStore;
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

#[derive(Debug, Clone)]
pub struct Context {
    store: TimeSeriesStore,
    catalog: GeometryCatalog,
    scale: ScaleFactor,
    days: DayIndex,
    join: JoinPolicy,
}

impl Context {
    /// Assemble a context from already loaded parts.
    ///
    /// ### Errors
    /// `Error::InvalidConfig` when `days` does not cover exactly the store's dates.
    pub fn new(
        store: TimeSeriesStore,
        catalog: GeometryCatalog,
        scale: ScaleFactor,
        days: DayIndex,
        join: JoinPolicy,
    ) -> Result<Self> {
        days.check_matches(&store)?;
        Ok(Self {
            store,
            catalog,
            scale,
            days,
            join,
        })
    }

    /// Read both input files and derive everything the session needs.
    pub fn load(config: &Config) -> Result<Self> {
        let store = TimeSeriesStore::from_path(config.counts_path()?)?;
        let catalog = GeometryCatalog::from_path(
            config.map_path()?,
            &config.exclusion_policy(),
            &config.name_property,
        )?;
        let scale = match config.fallback_factor {
            Some(fallback) => ScaleFactor::compute_or(&store, config.target_range, fallback)?,
            None => ScaleFactor::compute(&store, config.target_range)?,
        };
        let days = config.day_index(&store)?;
        log::info!(
            "context ready: {} days, {} features, scale factor {}",
            days.len(),
            catalog.len(),
            scale
        );
        Self::new(store, catalog, scale, days, config.join_policy())
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    pub fn catalog(&self) -> &GeometryCatalog {
        &self.catalog
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    pub fn days(&self) -> &DayIndex {
        &self.days
    }

    pub fn join(&self) -> &JoinPolicy {
        &self.join
    }

    pub fn builder(&self) -> DayFrameBuilder<'_> {
        DayFrameBuilder::new(&self.store, &self.catalog, self.scale, &self.join)
    }

    /// Build the frame for one day without touching any session state.
    pub fn frame(&self, day: usize) -> Result<DayFrame> {
        self.builder().build(day)
    }
}

/// Selection state: which day is shown and the frame built for it.
#[derive(Debug)]
pub struct Session {
    ctx: Arc<Context>,
    current_day: usize,
    frame: DayFrame,
}

impl Session {
    /// Start at day 0 with its frame already built.
    pub fn new(ctx: Arc<Context>) -> Result<Self> {
        let frame = ctx.frame(0)?;
        Ok(Self {
            ctx,
            current_day: 0,
            frame,
        })
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn current_day(&self) -> usize {
        self.current_day
    }

    /// Frame of the last applied selection.
    pub fn frame(&self) -> &DayFrame {
        &self.frame
    }

    /// Validate, rebuild, then commit. On error nothing changes.
    pub fn select_day(&mut self, day: usize) -> Result<FrameReady> {
        let date = self.ctx.days.to_date(day)?;
        let label = self.ctx.days.label(day)?;
        let frame = self.ctx.frame(day)?;
        self.current_day = day;
        self.frame = frame.clone();
        log::debug!("selected day {} ({})", day, label);
        Ok(FrameReady { frame, date, label })
    }

    pub fn select_date(&mut self, date: NaiveDate) -> Result<FrameReady> {
        let day = self.ctx.days.from_date(date)?;
        self.select_day(day)
    }

    /// Drain every pending selection and apply only the newest one.
    ///
    /// Returns `None` when nothing was queued.
    pub fn select_latest(&mut self, pending: &Receiver<usize>) -> Option<Result<FrameReady>> {
        let mut latest = None;
        let mut skipped = 0usize;
        while let Ok(day) = pending.try_recv() {
            if latest.replace(day).is_some() {
                skipped += 1;
            }
        }
        if skipped > 0 {
            log::debug!("dropped {} superseded selection(s)", skipped);
        }
        latest.map(|day| self.select_day(day))
    }
}
