//! Column name canonicalization
//!
//! Uploaded files spell the same column many ways ("Patient ID", "patient_id",
//! "PatientID"). Two names refer to the same column iff their canonical forms
//! are equal.

/// Canonicalize a column name: trim, lowercase, and drop whitespace, `-` and `_`
///
/// # Example
///
/// ```rust
/// use clinic_core::normalize;
///
/// assert_eq!(normalize("Patient ID"), "patientid");
/// assert_eq!(normalize(" PATIENT-ID "), normalize("patient_id"));
/// ```
pub fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !is_separator(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonicalize every name in a list, preserving order
pub fn normalize_all<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|n| normalize(n.as_ref())).collect()
}

/// Whether two names refer to the same column
pub fn same_column(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

#[inline]
fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equivalent_spellings() {
        assert_eq!(normalize("Patient ID"), "patientid");
        assert_eq!(normalize("patient_id"), "patientid");
        assert_eq!(normalize(" PATIENT-ID "), "patientid");
        assert_eq!(normalize("PatientID"), "patientid");
        assert_eq!(normalize("patient\tid"), "patientid");
    }

    #[test]
    fn test_distinct_names_stay_distinct() {
        assert_ne!(normalize("Visit Date"), normalize("Metric Date"));
        assert!(!same_column("pain score", "pain scores"));
    }

    #[test]
    fn test_empty_and_separator_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" -_ "), "");
    }

    #[test]
    fn test_normalize_all_keeps_order() {
        let names = normalize_all(["Service Charge", "Visit-Date", "patient_id"]);
        assert_eq!(names, vec!["servicecharge", "visitdate", "patientid"]);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(name in "[ A-Za-z0-9_-]{0,24}") {
            let once = normalize(&name);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_separators_and_case_ignored(word in "[a-z]{1,8}", other in "[a-z]{1,8}") {
            let snake = format!("{word}_{other}");
            let spaced = format!("  {} {} ", word.to_uppercase(), other);
            let kebab = format!("{word}-{}", other.to_uppercase());
            prop_assert!(same_column(&snake, &spaced));
            prop_assert!(same_column(&snake, &kebab));
        }
    }
}
