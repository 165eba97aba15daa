//! Tests for loading analysis definitions from JSON configuration

use clinic_core::{AggregateKind, AnalysisRegistry, ColumnKind, Error, FileRole};
use std::io::Write;

const CONFIG: &str = r#"
{
  "analyses": [
    {
      "key": "charges_only",
      "label": "Charges Only",
      "files": {
        "patients": { "required_columns": [
          { "name": "Patient ID", "kind": "key" },
          { "name": "Payer" }
        ] },
        "visits": { "required_columns": [
          { "name": "Patient ID", "kind": "key" },
          { "name": "Visit Date", "kind": "date" },
          { "name": "Charge", "kind": "numeric" }
        ] },
        "metrics": { "required_columns": [
          { "name": "Patient ID", "kind": "key" },
          { "name": "Metric Date", "kind": "date" }
        ] }
      },
      "aggregates": [
        { "name": "charge_by_payer", "kind": "group_mean", "group_by": "Payer", "value": "Charge" },
        { "name": "visits", "kind": "group_count", "group_by": "Patient ID", "output": "n" }
      ],
      "comparisons": [
        { "name": "payer_ttest", "group_field": "Payer", "group_a": "Medicare",
          "group_b": "Medicaid", "value_field": "Charge" }
      ]
    }
  ]
}
"#;

#[test]
fn test_registry_from_json_str() {
    let registry = AnalysisRegistry::from_json_str(CONFIG).unwrap();
    assert_eq!(registry.len(), 1);

    let def = registry.lookup("charges_only").unwrap();
    assert_eq!(def.label, "Charges Only");
    assert_eq!(
        def.schema(FileRole::Patients).unwrap().kind_of("payer"),
        Some(ColumnKind::Text)
    );
    assert_eq!(def.keys.identity, "patientid");
    assert_eq!(
        def.aggregates[0].kind,
        AggregateKind::GroupMean {
            group_by: "payer".to_string(),
            value: "charge".to_string(),
        }
    );
    assert_eq!(def.aggregates[1].output_column(), "n");
    assert_eq!(def.comparisons[0].group_field, "payer");
    assert_eq!(def.roles().count(), 3);
}

#[test]
fn test_registry_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let registry = AnalysisRegistry::from_json_file(file.path()).unwrap();
    assert!(registry.lookup("charges_only").is_ok());
    assert!(matches!(
        registry.lookup("basic_clinic"),
        Err(Error::UnknownAnalysis(_))
    ));
}

#[test]
fn test_malformed_config() {
    let result = AnalysisRegistry::from_json_str(r#"{"analyses": [ {"key": 1} ]}"#);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_missing_config_file() {
    let result = AnalysisRegistry::from_json_file("/definitely/not/here.json");
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_config_definition_is_validated() {
    // Identity declared as text in visits
    let config = CONFIG.replacen(
        r#"{ "name": "Patient ID", "kind": "key" },
          { "name": "Visit Date""#,
        r#"{ "name": "Patient ID" },
          { "name": "Visit Date""#,
        1,
    );
    let result = AnalysisRegistry::from_json_str(&config);
    assert!(matches!(result, Err(Error::InvalidDefinition { .. })));
}

#[test]
fn test_config_field_must_be_declared() {
    // Comparison reads a column no file declares
    let config = CONFIG.replacen(
        r#""value_field": "Charge""#,
        r#""value_field": "Copay""#,
        1,
    );
    match AnalysisRegistry::from_json_str(&config) {
        Err(Error::InvalidDefinition { key, reason }) => {
            assert_eq!(key, "charges_only");
            assert!(reason.contains("'copay'"), "{reason}");
        }
        other => panic!("expected InvalidDefinition, got {other:?}"),
    }
}
