//! Schema registry: analysis key -> required files, columns and computations
//!
//! The registry is built once (from the built-in set or a JSON document) and is
//! read-only afterwards, so a single instance can be shared across runs.
//!
//! # Configuration format
//!
//! ```json
//! {
//!   "analyses": [
//!     {
//!       "key": "basic_clinic",
//!       "label": "Basic Clinic Analysis",
//!       "files": {
//!         "patients": { "required_columns": [ { "name": "Patient ID", "kind": "key" } ] },
//!         "visits":   { "required_columns": [ ... ] },
//!         "metrics":  { "required_columns": [ ... ] }
//!       },
//!       "aggregates": [
//!         { "name": "revenue_by_city", "kind": "group_sum", "group_by": "City", "value": "Service Charge" }
//!       ],
//!       "comparisons": [
//!         { "name": "charge_ttest", "group_field": "Insurance", "group_a": "BlueCross",
//!           "group_b": "Aetna", "value_field": "Service Charge" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::normalize::normalize;
use crate::schema::{ColumnKind, ColumnSpec, FileRole, FileSchema};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Canonical names of the columns the merger joins on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeKeys {
    /// Patient identity, present in every file
    pub identity: String,
    /// Visit date in the visits file
    pub visit_date: String,
    /// Metric date in the metrics file
    pub metric_date: String,
}

impl Default for MergeKeys {
    fn default() -> Self {
        Self {
            identity: "patientid".to_string(),
            visit_date: "visitdate".to_string(),
            metric_date: "metricdate".to_string(),
        }
    }
}

impl MergeKeys {
    fn canonicalize(&mut self) {
        self.identity = normalize(&self.identity);
        self.visit_date = normalize(&self.visit_date);
        self.metric_date = normalize(&self.metric_date);
    }
}

/// The computation behind a named aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateKind {
    /// Arithmetic mean of `value` per `group_by` value
    GroupMean { group_by: String, value: String },
    /// Sum of `value` per `group_by` value
    GroupSum { group_by: String, value: String },
    /// Row count per `group_by` value
    GroupCount { group_by: String },
    /// Pearson correlation between two numeric fields
    Correlation { x: String, y: String },
}

impl AggregateKind {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::GroupMean { .. } => "group_mean",
            Self::GroupSum { .. } => "group_sum",
            Self::GroupCount { .. } => "group_count",
            Self::Correlation { .. } => "correlation",
        }
    }

    /// Every field this aggregate reads
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::GroupMean { group_by, value } | Self::GroupSum { group_by, value } => {
                vec![group_by.as_str(), value.as_str()]
            }
            Self::GroupCount { group_by } => vec![group_by.as_str()],
            Self::Correlation { x, y } => vec![x.as_str(), y.as_str()],
        }
    }

    fn canonicalize(&mut self) {
        match self {
            Self::GroupMean { group_by, value } | Self::GroupSum { group_by, value } => {
                *group_by = normalize(group_by);
                *value = normalize(value);
            }
            Self::GroupCount { group_by } => *group_by = normalize(group_by),
            Self::Correlation { x, y } => {
                *x = normalize(x);
                *y = normalize(y);
            }
        }
    }
}

/// A named aggregate computed on the filtered dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    /// Result name, also the artifact name
    pub name: String,
    /// Name of the computed column (defaults depend on the kind)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(flatten)]
    pub kind: AggregateKind,
}

impl AggregateSpec {
    /// Create an aggregate spec with the default output column
    pub fn new(name: impl Into<String>, kind: AggregateKind) -> Self {
        Self {
            name: name.into(),
            output: None,
            kind,
        }
    }

    /// Override the computed column name
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Name of the computed column in the result table
    pub fn output_column(&self) -> &str {
        if let Some(output) = &self.output {
            return output.as_str();
        }
        match &self.kind {
            AggregateKind::GroupMean { value, .. } | AggregateKind::GroupSum { value, .. } => {
                value.as_str()
            }
            AggregateKind::GroupCount { .. } => "count",
            AggregateKind::Correlation { .. } => "pearson_r",
        }
    }
}

/// A two-group comparison of a numeric field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSpec {
    pub name: String,
    /// Categorical field that splits the rows
    pub group_field: String,
    /// Label of the first group (matched after normalization)
    pub group_a: String,
    /// Label of the second group (matched after normalization)
    pub group_b: String,
    /// Numeric field compared between the groups
    pub value_field: String,
}

impl ComparisonSpec {
    fn canonicalize(&mut self) {
        self.group_field = normalize(&self.group_field);
        self.value_field = normalize(&self.value_field);
    }
}

/// Everything one analysis kind requires and computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDefinition {
    pub key: String,
    pub label: String,
    pub files: BTreeMap<FileRole, FileSchema>,
    #[serde(default)]
    pub keys: MergeKeys,
    #[serde(default)]
    pub aggregates: Vec<AggregateSpec>,
    #[serde(default)]
    pub comparisons: Vec<ComparisonSpec>,
}

impl AnalysisDefinition {
    /// Start an empty definition
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            files: BTreeMap::new(),
            keys: MergeKeys::default(),
            aggregates: Vec::new(),
            comparisons: Vec::new(),
        }
    }

    /// Declare the required columns of one file role
    pub fn with_file(mut self, role: FileRole, columns: Vec<ColumnSpec>) -> Self {
        self.files.insert(role, FileSchema::new(columns));
        self
    }

    /// Override the merge keys
    pub fn with_keys(mut self, keys: MergeKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Add a named aggregate
    pub fn with_aggregate(mut self, spec: AggregateSpec) -> Self {
        self.aggregates.push(spec);
        self
    }

    /// Add a named two-group comparison
    pub fn with_comparison(mut self, spec: ComparisonSpec) -> Self {
        self.comparisons.push(spec);
        self
    }

    /// Schema for a role; registered definitions always carry all three
    pub fn schema(&self, role: FileRole) -> Option<&FileSchema> {
        self.files.get(&role)
    }

    /// Roles this analysis requires, in merge order
    pub fn roles(&self) -> impl Iterator<Item = FileRole> + '_ {
        FileRole::ALL.into_iter().filter(|r| self.files.contains_key(r))
    }

    /// Rewrite every field reference into canonical form
    fn canonicalize(mut self) -> Self {
        self.keys.canonicalize();
        for spec in &mut self.aggregates {
            spec.kind.canonicalize();
        }
        for spec in &mut self.comparisons {
            spec.canonicalize();
        }
        self
    }

    fn validate(&self) -> Result<()> {
        for role in FileRole::ALL {
            if !self.files.contains_key(&role) {
                return Err(Error::invalid_definition(
                    &self.key,
                    format!("no schema declared for the {role} file"),
                ));
            }
        }

        let expect = |role: FileRole, column: &str, kind: ColumnKind| -> Result<()> {
            match self.files.get(&role).and_then(|s| s.kind_of(column)) {
                Some(k) if k == kind => Ok(()),
                Some(k) => Err(Error::invalid_definition(
                    &self.key,
                    format!("column '{column}' in {role} must be {kind:?}, declared {k:?}"),
                )),
                None => Err(Error::invalid_definition(
                    &self.key,
                    format!("merge column '{column}' is not declared in {role}"),
                )),
            }
        };

        for role in FileRole::ALL {
            expect(role, &self.keys.identity, ColumnKind::Key)?;
        }
        expect(FileRole::Visits, &self.keys.visit_date, ColumnKind::Date)?;
        expect(FileRole::Metrics, &self.keys.metric_date, ColumnKind::Date)?;

        let declared: HashSet<String> = self
            .files
            .values()
            .flat_map(|s| s.required_columns.iter().map(ColumnSpec::canonical))
            .collect();
        let referenced = self
            .aggregates
            .iter()
            .flat_map(|a| a.kind.fields().into_iter().map(move |f| (a.name.as_str(), f)))
            .chain(self.comparisons.iter().flat_map(|c| {
                [
                    (c.name.as_str(), c.group_field.as_str()),
                    (c.name.as_str(), c.value_field.as_str()),
                ]
            }));
        for (owner, field) in referenced {
            if !declared.contains(field) {
                return Err(Error::invalid_definition(
                    &self.key,
                    format!("'{owner}' references undeclared column '{field}'"),
                ));
            }
        }

        let mut names: Vec<&str> = self.aggregates.iter().map(|a| a.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::invalid_definition(
                &self.key,
                format!("aggregate '{}' declared twice", pair[0]),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    analyses: Vec<AnalysisDefinition>,
}

/// Immutable map from analysis key to definition
#[derive(Debug, Clone, Default)]
pub struct AnalysisRegistry {
    analyses: BTreeMap<String, AnalysisDefinition>,
}

impl AnalysisRegistry {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry holding the built-in analyses
    pub fn builtin() -> Self {
        let analyses = [basic_clinic(), clinic_outcomes()]
            .into_iter()
            .map(|d| {
                let d = d.canonicalize();
                (d.key.clone(), d)
            })
            .collect();
        Self { analyses }
    }

    /// Parse a registry from a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: RegistryDocument = serde_json::from_str(json)?;
        let mut builder = Self::builder();
        for definition in doc.analyses {
            builder = builder.register(definition)?;
        }
        Ok(builder.build())
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Look up an analysis by key
    pub fn lookup(&self, key: &str) -> Result<&AnalysisDefinition> {
        self.analyses
            .get(key)
            .ok_or_else(|| Error::UnknownAnalysis(key.to_string()))
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.analyses.keys().map(String::as_str)
    }

    /// Registered definitions in key order
    pub fn definitions(&self) -> impl Iterator<Item = &AnalysisDefinition> {
        self.analyses.values()
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }
}

/// Collects definitions, validating each as it is registered
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    analyses: BTreeMap<String, AnalysisDefinition>,
}

impl RegistryBuilder {
    /// Canonicalize, validate and add a definition
    pub fn register(mut self, definition: AnalysisDefinition) -> Result<Self> {
        if self.analyses.contains_key(&definition.key) {
            return Err(Error::DuplicateAnalysis(definition.key));
        }
        let definition = definition.canonicalize();
        definition.validate()?;
        debug!(
            key = %definition.key,
            aggregates = definition.aggregates.len(),
            comparisons = definition.comparisons.len(),
            "Registered analysis"
        );
        self.analyses.insert(definition.key.clone(), definition);
        Ok(self)
    }

    /// Freeze the registry
    pub fn build(self) -> AnalysisRegistry {
        AnalysisRegistry {
            analyses: self.analyses,
        }
    }
}

fn col(name: &str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec::new(name, kind)
}

fn mean_of(name: &str, group_by: &str, value: &str) -> AggregateSpec {
    AggregateSpec::new(
        name,
        AggregateKind::GroupMean {
            group_by: group_by.to_string(),
            value: value.to_string(),
        },
    )
}

fn visit_counts() -> AggregateSpec {
    AggregateSpec::new(
        "visit_counts",
        AggregateKind::GroupCount {
            group_by: "patient_id".to_string(),
        },
    )
    .with_output("visit_count")
}

fn pain_mobility_corr() -> AggregateSpec {
    AggregateSpec::new(
        "pain_mobility_corr",
        AggregateKind::Correlation {
            x: "pain_score".to_string(),
            y: "mobility_score".to_string(),
        },
    )
}

fn insurance_ttest(name: &str, value_field: &str) -> ComparisonSpec {
    ComparisonSpec {
        name: name.to_string(),
        group_field: "insurance".to_string(),
        group_a: "BlueCross".to_string(),
        group_b: "Aetna".to_string(),
        value_field: value_field.to_string(),
    }
}

/// Charges, revenue, pain and visit volume across the clinic
pub fn basic_clinic() -> AnalysisDefinition {
    use ColumnKind::*;

    AnalysisDefinition::new("basic_clinic", "Basic Clinic Analysis")
        .with_file(
            FileRole::Patients,
            vec![
                col("Patient ID", Key),
                col("Insurance", Text),
                col("DOB", Date),
                col("City", Text),
                col("State", Text),
            ],
        )
        .with_file(
            FileRole::Visits,
            vec![
                col("Patient ID", Key),
                col("Visit Date", Date),
                col("Service Charge", Numeric),
            ],
        )
        .with_file(
            FileRole::Metrics,
            vec![
                col("Patient ID", Key),
                col("Metric Date", Date),
                col("Pain Score", Numeric),
                col("Mobility Score", Numeric),
            ],
        )
        .with_aggregate(mean_of("avg_charge_by_insurance", "Insurance", "Service Charge"))
        .with_aggregate(AggregateSpec::new(
            "revenue_by_city",
            AggregateKind::GroupSum {
                group_by: "City".to_string(),
                value: "Service Charge".to_string(),
            },
        ))
        .with_aggregate(mean_of("avg_pain_by_insurance", "Insurance", "Pain Score"))
        .with_aggregate(visit_counts())
        .with_aggregate(pain_mobility_corr())
        .with_comparison(insurance_ttest("charge_ttest", "service_charge"))
}

/// Patient-reported outcomes by payer; needs no billing columns
pub fn clinic_outcomes() -> AnalysisDefinition {
    use ColumnKind::*;

    AnalysisDefinition::new("clinic_outcomes", "Clinical Outcomes Analysis")
        .with_file(
            FileRole::Patients,
            vec![
                col("patient_id", Key),
                col("insurance", Text),
                col("dob", Date),
            ],
        )
        .with_file(
            FileRole::Visits,
            vec![col("patient_id", Key), col("visit_date", Date)],
        )
        .with_file(
            FileRole::Metrics,
            vec![
                col("patient_id", Key),
                col("metric_date", Date),
                col("pain_score", Numeric),
                col("mobility_score", Numeric),
            ],
        )
        .with_aggregate(mean_of("avg_pain_by_insurance", "insurance", "pain_score"))
        .with_aggregate(mean_of(
            "avg_mobility_by_insurance",
            "insurance",
            "mobility_score",
        ))
        .with_aggregate(visit_counts())
        .with_aggregate(pain_mobility_corr())
        .with_comparison(insurance_ttest("pain_ttest", "pain_score"))
}
