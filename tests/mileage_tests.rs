// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shoe mileage accumulation and auto-retirement.

use std::sync::Arc;
use stridesync::clock::ManualClock;
use stridesync::config::Config;
use stridesync::models::shoe::AUTO_RETIRE_REASON;
use stridesync::models::Run;
use stridesync::services::StrideStore;

mod common;

fn store() -> StrideStore {
    StrideStore::in_memory(
        &Config::default(),
        Arc::new(ManualClock::new(common::t0())),
    )
}

fn total_after(order: &[usize], runs: &[Run]) -> (f64, Vec<(String, f64)>) {
    let mut store = store();
    let shoe = store
        .add_shoe(common::new_shoe("Daily", "Asics", 0.0))
        .unwrap();
    for &i in order {
        let mut run = runs[i].clone();
        run.shoe_id = Some(shoe.id.clone());
        store.save_run(run).unwrap();
    }
    let usage = store.get_shoe_usage(&shoe.id).unwrap();
    (
        usage.total,
        usage
            .monthly
            .iter()
            .map(|(month, km)| (month.clone(), *km))
            .collect(),
    )
}

#[test]
fn test_accumulation_is_order_independent() {
    // Distances chosen to be exact in binary so any order sums identically
    let runs = vec![
        common::make_run(None, 40, 5.5),
        common::make_run(None, 20, 10.25),
        common::make_run(None, 3, 21.0),
    ];

    let (forward_total, forward_months) = total_after(&[0, 1, 2], &runs);
    for order in [[2, 1, 0], [1, 0, 2], [2, 0, 1]] {
        let (total, months) = total_after(&order, &runs);
        assert_eq!(total, forward_total);
        assert_eq!(months, forward_months);
    }
    assert_eq!(forward_total, 36.75);
}

#[test]
fn test_just_under_max_stays_active() {
    let mut store = store();
    let shoe = store
        .add_shoe(common::new_shoe("Racer", "Nike", 100.0))
        .unwrap();

    store
        .save_run(common::make_run(Some(&shoe.id), 3, 99.99))
        .unwrap();
    assert!(store.get_shoe(&shoe.id).unwrap().is_active);

    store
        .save_run(common::make_run(Some(&shoe.id), 2, 0.5))
        .unwrap();
    let shoe = store.get_shoe(&shoe.id).unwrap();
    assert!(!shoe.is_active);
    assert_eq!(shoe.retirement_reason.as_deref(), Some(AUTO_RETIRE_REASON));
}

#[test]
fn test_retires_when_run_reaches_max_exactly() {
    let mut store = store();
    let shoe = store
        .add_shoe(common::new_shoe("Racer", "Nike", 100.0))
        .unwrap();

    store
        .save_run(common::make_run(Some(&shoe.id), 3, 60.0))
        .unwrap();
    store
        .save_run(common::make_run(Some(&shoe.id), 2, 40.0))
        .unwrap();

    let retired = store.get_shoe(&shoe.id).unwrap();
    assert!(!retired.is_active);
    assert_eq!(retired.retirement_date, Some(common::t0()));
    assert_eq!(retired.retirement_reason.as_deref(), Some(AUTO_RETIRE_REASON));
}

#[test]
fn test_uncapped_shoe_never_retires() {
    let mut store = store();
    let shoe = store
        .add_shoe(common::new_shoe("Forever", "Asics", 0.0))
        .unwrap();
    store
        .save_run(common::make_run(Some(&shoe.id), 1, 5000.0))
        .unwrap();
    assert!(store.get_shoe(&shoe.id).unwrap().is_active);
}

#[test]
fn test_retired_shoe_keeps_original_retirement() {
    let mut store = store();
    let shoe = store
        .add_shoe(common::new_shoe("Old", "Brooks", 10.0))
        .unwrap();
    store.retire_shoe(&shoe.id, "Torn upper").unwrap();

    store
        .save_run(common::make_run(Some(&shoe.id), 1, 20.0))
        .unwrap();
    let shoe = store.get_shoe(&shoe.id).unwrap();
    assert_eq!(shoe.retirement_reason.as_deref(), Some("Torn upper"));
}

#[test]
fn test_delete_shoe_removes_usage_and_stats() {
    let mut store = store();
    let shoe = store
        .add_shoe(common::new_shoe("Gone", "Saucony", 0.0))
        .unwrap();
    store
        .save_run(common::make_run(Some(&shoe.id), 1, 8.0))
        .unwrap();
    assert!(store.get_shoe_stats(&shoe.id).is_some());

    assert!(store.delete_shoe(&shoe.id));
    assert!(store.get_shoe_usage(&shoe.id).is_none());
    assert!(store.get_shoe_stats(&shoe.id).is_none());
    assert_eq!(store.runs().len(), 1);
}
