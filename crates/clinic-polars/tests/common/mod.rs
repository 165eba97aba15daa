//! Common fixtures for clinic-polars tests
#![allow(dead_code)]

use clinic_core::{AnalysisDefinition, AnalysisRegistry, FileRole};
use clinic_polars::{load_table, InMemoryInputs, RawTable};
use polars::prelude::*;

pub const PATIENTS_CSV: &str = "\
Patient ID,Insurance,DOB,City,State
1,BlueCross,1980-05-01,X,TX
";

pub const VISITS_CSV: &str = "\
Patient ID,Visit Date,Service Charge
1,2024-01-10,100
1,2024-02-01,200
";

pub const METRICS_CSV: &str = "\
Patient ID,Metric Date,Pain Score,Mobility Score
1,2024-01-10,5,3
";

/// Two insurers, three cities, one visit without metrics
pub const PATIENTS_WIDE_CSV: &str = "\
patient_id,insurance,dob,city,state
1,BlueCross,1980-05-01,Austin,TX
2,Aetna,1975-02-11,Dallas,TX
3,Blue Cross,1990-12-30,Austin,TX
4,Aetna,1969-07-04,Houston,TX
";

pub const VISITS_WIDE_CSV: &str = "\
patient_id,visit_date,service_charge
1,2024-01-05,120
2,2024-01-06,80
3,2024-01-07,140
4,2024-01-08,95
1,2024-02-10,110
2,2024-02-11,
";

pub const METRICS_WIDE_CSV: &str = "\
patient_id,metric_date,pain_score,mobility_score
1,2024-01-05,6,4
2,2024-01-06,3,7
3,2024-01-07,7,3
4,2024-01-08,2,8
1,2024-02-10,5,5
";

pub fn registry() -> AnalysisRegistry {
    AnalysisRegistry::builtin()
}

pub fn basic() -> AnalysisDefinition {
    registry().lookup("basic_clinic").unwrap().clone()
}

/// The single-patient scenario inputs
pub fn scenario_inputs() -> InMemoryInputs {
    InMemoryInputs::new()
        .with(FileRole::Patients, PATIENTS_CSV)
        .with(FileRole::Visits, VISITS_CSV)
        .with(FileRole::Metrics, METRICS_CSV)
}

pub fn wide_inputs() -> InMemoryInputs {
    InMemoryInputs::new()
        .with(FileRole::Patients, PATIENTS_WIDE_CSV)
        .with(FileRole::Visits, VISITS_WIDE_CSV)
        .with(FileRole::Metrics, METRICS_WIDE_CSV)
}

pub fn load(def: &AnalysisDefinition, role: FileRole, csv: &str) -> RawTable {
    load_table(def, role, csv.as_bytes()).unwrap()
}

/// Strings of a column, nulls as `None`
pub fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

/// Floats of a column, nulls as `None`
pub fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}
