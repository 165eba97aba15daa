//! Tests for named aggregates

mod common;

use approx::assert_abs_diff_eq;
use clinic_core::{AggregateKind, AggregateSpec, DateRange, FileRole};
use clinic_polars::{aggregate, filter_by_date, merge, ClinicFrameExt};
use common::*;
use polars::prelude::*;
use std::collections::BTreeSet;

fn wide_merged() -> DataFrame {
    let def = basic();
    let patients = load(&def, FileRole::Patients, PATIENTS_WIDE_CSV);
    let visits = load(&def, FileRole::Visits, VISITS_WIDE_CSV);
    let metrics = load(&def, FileRole::Metrics, METRICS_WIDE_CSV);
    merge(&patients, &visits, &metrics, &def.keys).unwrap()
}

#[test]
fn test_builtin_aggregates_all_present() {
    let def = basic();
    let results = aggregate(&wide_merged(), &def.aggregates).unwrap();

    let names: Vec<&str> = results.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "avg_charge_by_insurance",
            "avg_pain_by_insurance",
            "pain_mobility_corr",
            "revenue_by_city",
            "visit_counts",
        ]
    );
}

#[test]
fn test_group_mean_first_seen_order() {
    let def = basic();
    let results = aggregate(&wide_merged(), &def.aggregates).unwrap();
    let avg = &results["avg_charge_by_insurance"];

    // Raw labels group separately: "Blue Cross" is not folded into "BlueCross"
    assert_eq!(
        avg.group_keys().unwrap(),
        vec!["BlueCross", "Aetna", "Blue Cross"]
    );
    // Patient 2's second visit has no charge and is excluded
    assert_abs_diff_eq!(avg.value_of("Aetna").unwrap().unwrap(), 87.5, epsilon = 1e-12);
    assert_abs_diff_eq!(avg.value_of("BlueCross").unwrap().unwrap(), 115.0, epsilon = 1e-12);
    assert_eq!(avg.value_of("Cigna").unwrap(), None);
}

#[test]
fn test_group_sum_and_count() {
    let def = basic();
    let results = aggregate(&wide_merged(), &def.aggregates).unwrap();

    let revenue = &results["revenue_by_city"];
    assert_eq!(revenue.group_keys().unwrap(), vec!["Austin", "Dallas", "Houston"]);
    assert_abs_diff_eq!(revenue.value_of("Austin").unwrap().unwrap(), 370.0, epsilon = 1e-12);

    let counts = &results["visit_counts"];
    assert_eq!(counts.value_of("1").unwrap(), Some(2.0));
    assert_eq!(counts.value_of("4").unwrap(), Some(1.0));
    let names: Vec<&str> = counts
        .frame
        .get_column_names()
        .into_iter()
        .map(|c| c.as_str())
        .collect();
    assert_eq!(names, vec!["patientid", "visit_count"]);
}

#[test]
fn test_every_group_appears_once() {
    let def = basic();
    let merged = wide_merged();
    let results = merged.clinic_aggregates(&def.aggregates).unwrap();

    let distinct: BTreeSet<String> = strings(&merged, "city").into_iter().flatten().collect();
    let keys = results["revenue_by_city"].group_keys().unwrap();
    let unique: BTreeSet<String> = keys.iter().cloned().collect();

    assert_eq!(keys.len(), unique.len());
    assert_eq!(unique, distinct);
}

#[test]
fn test_correlation_over_complete_pairs() {
    let def = basic();
    let results = aggregate(&wide_merged(), &def.aggregates).unwrap();
    let corr = &results["pain_mobility_corr"];

    assert_eq!(corr.height(), 1);
    assert_eq!(floats(&corr.frame, "n"), vec![Some(5.0)]);
    let r = corr.pearson_r().unwrap().unwrap();
    assert!(r < -0.9 && r >= -1.0, "r = {r}");
    assert_eq!(
        strings(&corr.frame, "x"),
        vec![Some("painscore".to_string())]
    );
}

#[test]
fn test_correlation_undefined_for_one_pair() {
    let def = basic();
    let patients = load(&def, FileRole::Patients, PATIENTS_CSV);
    let visits = load(&def, FileRole::Visits, VISITS_CSV);
    let metrics = load(&def, FileRole::Metrics, METRICS_CSV);
    let merged = merge(&patients, &visits, &metrics, &def.keys).unwrap();
    let range = DateRange::parse(Some("2024-01-01"), Some("2024-01-31")).unwrap();
    let filtered = filter_by_date(&merged, "visitdate", &range).unwrap();

    let results = aggregate(&filtered, &def.aggregates).unwrap();
    let corr = &results["pain_mobility_corr"];
    assert_eq!(floats(&corr.frame, "n"), vec![Some(1.0)]);
    assert_eq!(corr.pearson_r().unwrap(), None);
}

#[test]
fn test_empty_dataset_yields_empty_tables() {
    let def = basic();
    let merged = wide_merged();
    let range = DateRange::parse(Some("2030-01-01"), None).unwrap();
    let empty = filter_by_date(&merged, "visitdate", &range).unwrap();

    let results = aggregate(&empty, &def.aggregates).unwrap();
    assert_eq!(results.len(), def.aggregates.len());
    assert_eq!(results["avg_charge_by_insurance"].height(), 0);
    assert_eq!(results["pain_mobility_corr"].pearson_r().unwrap(), None);
}

#[test]
fn test_custom_output_column() {
    let df = df!["city" => ["A", "B", "A"], "charge" => [1.0, 2.0, 3.0]].unwrap();
    let spec = AggregateSpec::new(
        "total",
        AggregateKind::GroupSum {
            group_by: "city".to_string(),
            value: "charge".to_string(),
        },
    )
    .with_output("total_charge");

    let results = aggregate(&df, &[spec]).unwrap();
    assert_eq!(floats(&results["total"].frame, "total_charge"), vec![Some(4.0), Some(2.0)]);
}
