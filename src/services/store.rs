// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The app store: runs, shoes, usage aggregates and settings.
//!
//! All mutations go through `&mut self`, so wrapping the store in a
//! `tokio::sync::Mutex` gives a single writer. Each mutation:
//! 1. updates in-memory state (always authoritative)
//! 2. invalidates the memoized selectors it affects
//! 3. stages a debounced write of the touched collections

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use validator::Validate;

use crate::clock::SharedClock;
use crate::config::Config;
use crate::db::{keys, DebouncedWriter, KvStore, PersistedState};
use crate::error::{AppError, Result};
use crate::models::shoe::AUTO_RETIRE_REASON;
use crate::models::{
    NewShoe, Run, RunMetadata, RunStats, Settings, Shoe, ShoeStats, ShoeUpdate, ShoeUsage,
    StatsPeriod, UsageTrend,
};
use crate::services::memo::MemoCache;
use crate::services::stats;

/// Memoized selector names.
mod selectors {
    pub const SHOE_STATS: &str = "shoe_stats";
    pub const BRANDS: &str = "brands";
    pub const USAGE_TRENDS: &str = "usage_trends";
}

/// Store shared between handlers and the run tracker.
pub type SharedStore = Arc<tokio::sync::Mutex<StrideStore>>;

pub struct StrideStore {
    /// Newest first
    runs: Vec<Run>,
    shoes: Vec<Shoe>,
    shoe_usage: HashMap<String, ShoeUsage>,
    settings: Settings,
    /// Load failure, if any
    error: Option<String>,
    cache: MemoCache,
    writer: Option<DebouncedWriter>,
    clock: SharedClock,
}

impl StrideStore {
    /// Empty store without persistence.
    pub fn in_memory(config: &Config, clock: SharedClock) -> Self {
        Self::from_state(PersistedState::default(), config, clock, None)
    }

    /// Load persisted state and write changes back through `kv`.
    ///
    /// A load failure is logged and recorded in [`StrideStore::error`]; the
    /// store then starts empty.
    pub async fn load(kv: KvStore, config: &Config, clock: SharedClock) -> Self {
        let writer = DebouncedWriter::new(
            kv.clone(),
            config.storage_namespace.clone(),
            config.persist_debounce(),
        );

        match PersistedState::load(&kv, &config.storage_namespace).await {
            Ok(state) => Self::from_state(state, config, clock, Some(writer)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load persisted state");
                let mut store =
                    Self::from_state(PersistedState::default(), config, clock, Some(writer));
                store.error = Some(e.to_string());
                store
            }
        }
    }

    fn from_state(
        state: PersistedState,
        config: &Config,
        clock: SharedClock,
        writer: Option<DebouncedWriter>,
    ) -> Self {
        let mut runs = state.runs;
        runs.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        Self {
            runs,
            shoes: state.shoes,
            shoe_usage: state.shoe_usage,
            settings: state.settings,
            error: None,
            cache: MemoCache::new(config.cache_ttl(), clock.clone()),
            writer,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Last load or persistence error.
    pub fn error(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.writer.as_ref().and_then(|w| w.last_error()))
    }

    /// Write all staged changes now.
    pub async fn flush(&self) -> std::result::Result<(), crate::db::StorageError> {
        self.cache.purge_expired();
        match &self.writer {
            Some(writer) => writer.flush().await,
            None => Ok(()),
        }
    }

    // ─── Runs ────────────────────────────────────────────────────

    /// All runs, newest first.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn get_run(&self, id: &str) -> Option<&Run> {
        self.runs.iter().find(|run| run.id == id)
    }

    /// Runs worn with `shoe_id`, newest first.
    pub fn get_runs_for_shoe(&self, shoe_id: &str) -> Vec<Run> {
        self.runs
            .iter()
            .filter(|run| run.shoe_id.as_deref() == Some(shoe_id))
            .cloned()
            .collect()
    }

    /// Persist a finished run and credit its shoe.
    pub fn save_run(&mut self, run: Run) -> Result<Run> {
        if self.get_run(&run.id).is_some() {
            return Err(AppError::BadRequest(format!(
                "Run {} already exists",
                run.id
            )));
        }
        if !run.distance.is_finite() || run.distance < 0.0 {
            return Err(AppError::BadRequest(
                "Run distance must be a non-negative number".to_string(),
            ));
        }

        let position = self
            .runs
            .iter()
            .position(|existing| existing.start_time <= run.start_time)
            .unwrap_or(self.runs.len());
        self.runs.insert(position, run.clone());

        tracing::info!(
            run_id = %run.id,
            distance_km = run.distance,
            shoe_id = ?run.shoe_id,
            "Run saved"
        );

        if run.shoe_id.is_some() {
            self.update_shoe_mileage(&run);
        }
        self.cache.invalidate_function(selectors::USAGE_TRENDS);
        self.persist_runs();
        Ok(run)
    }

    /// Edit a saved run's metadata. Moving it to another shoe moves its mileage.
    pub fn update_run(&mut self, id: &str, metadata: &RunMetadata) -> Result<Option<Run>> {
        metadata.validate()?;

        let Some(run) = self.runs.iter_mut().find(|run| run.id == id) else {
            return Ok(None);
        };
        let old_shoe = run.shoe_id.clone();
        run.apply_metadata(metadata);
        let updated = run.clone();

        if updated.shoe_id != old_shoe {
            if let Some(old) = old_shoe.as_deref() {
                self.rebuild_usage(old);
            }
            if let Some(new) = updated.shoe_id.as_deref() {
                self.rebuild_usage(new);
                self.check_auto_retire(new);
            }
            self.persist_shoes();
            self.cache.invalidate_function(selectors::USAGE_TRENDS);
        }

        tracing::info!(run_id = %id, "Run updated");
        self.persist_runs();
        Ok(Some(updated))
    }

    /// Delete a run and take its distance off its shoe. Returns false if unknown.
    ///
    /// A shoe auto-retired by this run stays retired.
    pub fn delete_run(&mut self, id: &str) -> bool {
        let Some(position) = self.runs.iter().position(|run| run.id == id) else {
            return false;
        };
        let run = self.runs.remove(position);

        if let Some(shoe_id) = run.shoe_id.as_deref() {
            self.rebuild_usage(shoe_id);
        }
        self.cache.invalidate_function(selectors::USAGE_TRENDS);

        tracing::info!(run_id = %id, "Run deleted");
        self.persist_runs();
        true
    }

    // ─── Mileage ─────────────────────────────────────────────────

    /// Credit `run` to its shoe and auto-retire the shoe at its maximum.
    ///
    /// Called once per saved run. Unknown shoes are logged and ignored.
    pub fn update_shoe_mileage(&mut self, run: &Run) {
        let Some(shoe_id) = run.shoe_id.as_deref() else {
            return;
        };
        if self.get_shoe(shoe_id).is_none() {
            tracing::warn!(shoe_id, run_id = %run.id, "Run references unknown shoe");
            return;
        }

        if let Some(usage) = self.shoe_usage.get_mut(shoe_id) {
            usage.record_run(run);
        } else {
            // Cold usage: rebuild from every run on this shoe
            let stored = self.runs.iter().any(|existing| existing.id == run.id);
            let usage = ShoeUsage::from_runs(
                self.runs
                    .iter()
                    .filter(|existing| existing.shoe_id.as_deref() == Some(shoe_id))
                    .chain((!stored).then_some(run)),
            );
            tracing::debug!(shoe_id, total_km = usage.total, "Rebuilt cold shoe usage");
            self.shoe_usage.insert(shoe_id.to_string(), usage);
        }
        self.check_auto_retire(shoe_id);
        self.cache.invalidate(selectors::SHOE_STATS, shoe_id);

        self.persist_usage();
    }

    fn check_auto_retire(&mut self, shoe_id: &str) {
        let total = self
            .shoe_usage
            .get(shoe_id)
            .map(|usage| usage.total)
            .unwrap_or(0.0);
        let now = self.clock.now();

        if let Some(shoe) = self.shoes.iter_mut().find(|shoe| shoe.id == shoe_id) {
            if shoe.is_active && shoe.is_capped() && total >= shoe.max_distance {
                shoe.retire(AUTO_RETIRE_REASON, now);
                tracing::info!(
                    shoe_id,
                    total_km = total,
                    max_km = shoe.max_distance,
                    "Shoe auto-retired"
                );
                self.persist_shoes();
            }
        }
    }

    /// Recompute one shoe's usage from the run list.
    fn rebuild_usage(&mut self, shoe_id: &str) {
        if self.get_shoe(shoe_id).is_none() {
            return;
        }
        let usage = ShoeUsage::from_runs(
            self.runs
                .iter()
                .filter(|run| run.shoe_id.as_deref() == Some(shoe_id)),
        );
        self.shoe_usage.insert(shoe_id.to_string(), usage);
        self.cache.invalidate(selectors::SHOE_STATS, shoe_id);
        self.persist_usage();
    }

    pub fn get_shoe_usage(&self, shoe_id: &str) -> Option<&ShoeUsage> {
        self.shoe_usage.get(shoe_id)
    }

    // ─── Shoes ───────────────────────────────────────────────────

    pub fn get_shoes(&self) -> &[Shoe] {
        &self.shoes
    }

    pub fn get_shoe(&self, id: &str) -> Option<&Shoe> {
        self.shoes.iter().find(|shoe| shoe.id == id)
    }

    pub fn get_active_shoes(&self) -> Vec<Shoe> {
        self.shoes.iter().filter(|s| s.is_active).cloned().collect()
    }

    pub fn get_retired_shoes(&self) -> Vec<Shoe> {
        self.shoes.iter().filter(|s| !s.is_active).cloned().collect()
    }

    pub fn add_shoe(&mut self, new: NewShoe) -> Result<Shoe> {
        new.validate()?;
        if new.name.trim().is_empty() {
            return Err(AppError::BadRequest("Shoe name is required".to_string()));
        }

        let shoe = Shoe::from_new(new, self.clock.now());
        self.shoe_usage
            .insert(shoe.id.clone(), ShoeUsage::default());
        self.shoes.push(shoe.clone());

        tracing::info!(shoe_id = %shoe.id, name = %shoe.name, "Shoe added");
        self.cache.invalidate_function(selectors::BRANDS);
        self.persist_shoes();
        self.persist_usage();
        Ok(shoe)
    }

    /// Apply a partial update. Lowering `max_distance` never retires retroactively.
    pub fn update_shoe(&mut self, id: &str, update: &ShoeUpdate) -> Result<Option<Shoe>> {
        update.validate()?;
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::BadRequest(
                "Shoe name cannot be empty".to_string(),
            ));
        }

        let Some(shoe) = self.shoes.iter_mut().find(|shoe| shoe.id == id) else {
            return Ok(None);
        };
        shoe.apply_update(update);
        let updated = shoe.clone();

        tracing::info!(shoe_id = %id, "Shoe updated");
        self.cache.invalidate(selectors::SHOE_STATS, id);
        self.cache.invalidate_function(selectors::BRANDS);
        self.cache.invalidate_function(selectors::USAGE_TRENDS);
        self.persist_shoes();
        Ok(Some(updated))
    }

    pub fn retire_shoe(&mut self, id: &str, reason: &str) -> Option<Shoe> {
        let now = self.clock.now();
        let shoe = self.shoes.iter_mut().find(|shoe| shoe.id == id)?;
        shoe.retire(reason, now);
        let retired = shoe.clone();

        tracing::info!(shoe_id = %id, reason, "Shoe retired");
        self.cache.invalidate(selectors::SHOE_STATS, id);
        self.persist_shoes();
        Some(retired)
    }

    pub fn unretire_shoe(&mut self, id: &str) -> Option<Shoe> {
        let shoe = self.shoes.iter_mut().find(|shoe| shoe.id == id)?;
        shoe.unretire();
        let active = shoe.clone();

        tracing::info!(shoe_id = %id, "Shoe unretired");
        self.cache.invalidate(selectors::SHOE_STATS, id);
        self.persist_shoes();
        Some(active)
    }

    /// Delete a shoe and its usage. Runs keep their `shoe_id`.
    pub fn delete_shoe(&mut self, id: &str) -> bool {
        let before = self.shoes.len();
        self.shoes.retain(|shoe| shoe.id != id);
        if self.shoes.len() == before {
            return false;
        }
        self.shoe_usage.remove(id);

        tracing::info!(shoe_id = %id, "Shoe deleted");
        self.cache.invalidate(selectors::SHOE_STATS, id);
        self.cache.invalidate_function(selectors::BRANDS);
        self.cache.invalidate_function(selectors::USAGE_TRENDS);
        self.persist_shoes();
        self.persist_usage();
        true
    }

    /// Sorted unique non-empty brands.
    pub fn get_brands(&self) -> Arc<Vec<String>> {
        self.cache.get_or_compute(selectors::BRANDS, &(), || {
            self.shoes
                .iter()
                .map(|shoe| shoe.brand.trim())
                .filter(|brand| !brand.is_empty())
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>()
        })
    }

    // ─── Statistics ──────────────────────────────────────────────

    /// Memoized per-shoe statistics. `None` for an unknown shoe.
    pub fn get_shoe_stats(&self, shoe_id: &str) -> Option<Arc<ShoeStats>> {
        let shoe = self.get_shoe(shoe_id)?;
        let now = self.clock.now();
        Some(self.cache.get_or_compute(selectors::SHOE_STATS, shoe_id, || {
            stats::shoe_stats(shoe, &self.runs, now)
        }))
    }

    pub fn get_run_stats(&self, period: StatsPeriod) -> RunStats {
        stats::run_stats(&self.runs, period, self.clock.now())
    }

    /// Memoized monthly usage series for the last `periods` months.
    pub fn get_shoe_usage_trends(&self, periods: u32) -> Arc<Vec<UsageTrend>> {
        let now = self.clock.now();
        self.cache
            .get_or_compute(selectors::USAGE_TRENDS, &periods, || {
                stats::usage_trends(&self.runs, &self.shoes, periods, now)
            })
    }

    // ─── Settings ────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: Settings) -> Result<Settings> {
        if let (Some(rest), Some(max)) = (settings.resting_heart_rate, settings.max_heart_rate) {
            if max <= rest {
                return Err(AppError::BadRequest(
                    "Max heart rate must exceed resting heart rate".to_string(),
                ));
            }
        }
        self.settings = settings;
        tracing::info!("Settings updated");
        self.persist(keys::SETTINGS, &self.settings);
        Ok(self.settings.clone())
    }

    // ─── Persistence ─────────────────────────────────────────────

    fn persist<T: serde::Serialize + ?Sized>(&self, key: &'static str, value: &T) {
        if let Some(writer) = &self.writer {
            writer.schedule(key, value);
        }
    }

    fn persist_runs(&self) {
        self.persist(keys::RUNS, &self.runs);
    }

    fn persist_shoes(&self) {
        self.persist(keys::SHOES, &self.shoes);
    }

    fn persist_usage(&self) {
        self.persist(keys::SHOE_USAGE, &self.shoe_usage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn store() -> (StrideStore, ManualClock) {
        let clock = ManualClock::new(now());
        let store = StrideStore::in_memory(&Config::default(), Arc::new(clock.clone()));
        (store, clock)
    }

    fn new_shoe(name: &str, brand: &str, max: f64) -> NewShoe {
        NewShoe {
            name: name.to_string(),
            brand: brand.to_string(),
            model: String::new(),
            purchase_date: None,
            max_distance: max,
            notes: None,
        }
    }

    fn run_with(shoe_id: Option<&str>, days_ago: i64, distance: f64) -> Run {
        let mut run = Run::new_draft(now() - Duration::days(days_ago), shoe_id.map(String::from));
        run.distance = distance;
        run.duration = (distance * 330.0) as u64;
        run.end_time = Some(run.start_time + Duration::seconds(run.duration as i64));
        run.refresh_pace();
        run
    }

    #[test]
    fn test_save_run_credits_shoe_and_keeps_newest_first() {
        let (mut store, _clock) = store();
        let shoe = store.add_shoe(new_shoe("Daily", "Asics", 0.0)).unwrap();

        store.save_run(run_with(Some(&shoe.id), 3, 5.0)).unwrap();
        store.save_run(run_with(Some(&shoe.id), 1, 8.0)).unwrap();
        store.save_run(run_with(None, 2, 3.0)).unwrap();

        let distances: Vec<f64> = store.runs().iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![8.0, 3.0, 5.0]);

        let usage = store.get_shoe_usage(&shoe.id).unwrap();
        assert!((usage.total - 13.0).abs() < 1e-9);
        assert_eq!(usage.last_used, Some(now() - Duration::days(1)));
    }

    #[test]
    fn test_save_run_rejects_duplicates_and_bad_distance() {
        let (mut store, _clock) = store();
        let run = run_with(None, 1, 5.0);
        store.save_run(run.clone()).unwrap();
        assert!(matches!(
            store.save_run(run),
            Err(AppError::BadRequest(_))
        ));

        let mut bad = run_with(None, 1, 1.0);
        bad.distance = f64::NAN;
        assert!(store.save_run(bad).is_err());
        assert_eq!(store.runs().len(), 1);
    }

    #[test]
    fn test_unknown_shoe_is_ignored() {
        let (mut store, _clock) = store();
        store.save_run(run_with(Some("ghost"), 1, 5.0)).unwrap();
        assert!(store.get_shoe_usage("ghost").is_none());
        assert_eq!(store.runs().len(), 1);
    }

    #[test]
    fn test_auto_retire_sets_reason_once() {
        let (mut store, _clock) = store();
        let shoe = store.add_shoe(new_shoe("Racer", "Nike", 10.0)).unwrap();

        store.save_run(run_with(Some(&shoe.id), 2, 6.0)).unwrap();
        assert!(store.get_shoe(&shoe.id).unwrap().is_active);

        store.save_run(run_with(Some(&shoe.id), 1, 4.0)).unwrap();
        let retired = store.get_shoe(&shoe.id).unwrap();
        assert!(!retired.is_active);
        assert_eq!(retired.retirement_reason.as_deref(), Some(AUTO_RETIRE_REASON));
        assert_eq!(retired.retirement_date, Some(now()));
        assert_eq!(store.get_retired_shoes().len(), 1);
        assert!(store.get_active_shoes().is_empty());
    }

    #[test]
    fn test_manual_retire_and_unretire() {
        let (mut store, _clock) = store();
        let shoe = store.add_shoe(new_shoe("Trail", "Hoka", 0.0)).unwrap();

        let retired = store.retire_shoe(&shoe.id, "Worn sole").unwrap();
        assert!(!retired.is_active);
        assert_eq!(retired.retirement_reason.as_deref(), Some("Worn sole"));

        let active = store.unretire_shoe(&shoe.id).unwrap();
        assert!(active.is_active);
        assert_eq!(active.retirement_date, None);
        assert_eq!(active.retirement_reason, None);

        assert!(store.retire_shoe("missing", "x").is_none());
    }

    #[test]
    fn test_lowering_max_distance_does_not_retire() {
        let (mut store, _clock) = store();
        let shoe = store.add_shoe(new_shoe("Daily", "Asics", 100.0)).unwrap();
        store.save_run(run_with(Some(&shoe.id), 1, 50.0)).unwrap();

        let update = ShoeUpdate {
            max_distance: Some(40.0),
            ..Default::default()
        };
        let updated = store.update_shoe(&shoe.id, &update).unwrap().unwrap();
        assert!(updated.is_active);
    }

    #[test]
    fn test_add_shoe_validation() {
        let (mut store, _clock) = store();
        assert!(matches!(
            store.add_shoe(new_shoe("", "Asics", 0.0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.add_shoe(new_shoe("   ", "Asics", 0.0)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            store.add_shoe(new_shoe("Ok", "Asics", -5.0)),
            Err(AppError::Validation(_))
        ));
        assert!(store.get_shoes().is_empty());
    }

    #[test]
    fn test_update_run_moves_mileage_between_shoes() {
        let (mut store, _clock) = store();
        let a = store.add_shoe(new_shoe("A", "Asics", 0.0)).unwrap();
        let b = store.add_shoe(new_shoe("B", "Brooks", 0.0)).unwrap();
        let run = store.save_run(run_with(Some(&a.id), 1, 7.0)).unwrap();

        let metadata = RunMetadata {
            shoe_id: Some(b.id.clone()),
            name: Some("Tempo".to_string()),
            ..Default::default()
        };
        let updated = store.update_run(&run.id, &metadata).unwrap().unwrap();
        assert_eq!(updated.name.as_deref(), Some("Tempo"));

        assert_eq!(store.get_shoe_usage(&a.id).unwrap().total, 0.0);
        assert!((store.get_shoe_usage(&b.id).unwrap().total - 7.0).abs() < 1e-9);
        assert!(store.update_run("missing", &metadata).unwrap().is_none());
    }

    #[test]
    fn test_delete_run_rebuilds_usage() {
        let (mut store, _clock) = store();
        let shoe = store.add_shoe(new_shoe("A", "Asics", 0.0)).unwrap();
        let first = store.save_run(run_with(Some(&shoe.id), 2, 5.0)).unwrap();
        store.save_run(run_with(Some(&shoe.id), 1, 3.0)).unwrap();

        assert!(store.delete_run(&first.id));
        assert!(!store.delete_run(&first.id));
        assert!((store.get_shoe_usage(&shoe.id).unwrap().total - 3.0).abs() < 1e-9);
        assert_eq!(store.get_runs_for_shoe(&shoe.id).len(), 1);
    }

    #[test]
    fn test_brands_memoized_and_invalidated() {
        let (mut store, _clock) = store();
        store.add_shoe(new_shoe("A", "Nike", 0.0)).unwrap();
        store.add_shoe(new_shoe("B", "Asics", 0.0)).unwrap();
        store.add_shoe(new_shoe("C", "Nike", 0.0)).unwrap();
        store.add_shoe(new_shoe("D", "", 0.0)).unwrap();

        let first = store.get_brands();
        assert_eq!(*first, vec!["Asics".to_string(), "Nike".to_string()]);
        assert!(Arc::ptr_eq(&first, &store.get_brands()));

        store.add_shoe(new_shoe("E", "Brooks", 0.0)).unwrap();
        let after = store.get_brands();
        assert_eq!(after.len(), 3);
    }

    #[test]
    fn test_shoe_stats_recomputed_after_mutation() {
        let (mut store, _clock) = store();
        let shoe = store.add_shoe(new_shoe("A", "Asics", 500.0)).unwrap();
        store.save_run(run_with(Some(&shoe.id), 1, 5.0)).unwrap();

        let first = store.get_shoe_stats(&shoe.id).unwrap();
        assert!(Arc::ptr_eq(&first, &store.get_shoe_stats(&shoe.id).unwrap()));

        store.save_run(run_with(Some(&shoe.id), 0, 5.0)).unwrap();
        let second = store.get_shoe_stats(&shoe.id).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.total_runs, 2);
    }

    #[test]
    fn test_settings_reject_inverted_heart_rate() {
        let (mut store, _clock) = store();
        let bad = Settings {
            resting_heart_rate: Some(180),
            max_heart_rate: Some(60),
            ..Default::default()
        };
        assert!(store.update_settings(bad).is_err());
        assert_eq!(store.settings(), &Settings::default());
    }
}
