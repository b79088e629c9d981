use serde::{Deserialize, Serialize};

/// Labels and thresholds the catalog filters on. Source data is free text,
/// so every label comparison ignores ASCII case and surrounding blanks.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub intern_role: String,
    pub analyst_role: String,
    pub male_label: String,
    pub female_label: String,
    pub completed_status: String,
    pub in_execution_status: String,
    pub material_type: String,
    /// Inclusive bounds compared as text against ISO dates, so `2023-06`
    /// stops before any day in June.
    pub raise_window_from: String,
    pub raise_window_to: String,
    pub analyst_salary_min: f64,
    pub analyst_salary_max: f64,
    pub top_materials: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            intern_role: "Intern".into(),
            analyst_role: "Analyst".into(),
            male_label: "Male".into(),
            female_label: "Female".into(),
            completed_status: "completed".into(),
            in_execution_status: "in execution".into(),
            material_type: "material".into(),
            raise_window_from: "2023-01".into(),
            raise_window_to: "2023-06".into(),
            analyst_salary_min: 5000.0,
            analyst_salary_max: 9000.0,
            top_materials: 3,
        }
    }
}

pub(crate) fn label_matches(value: Option<&str>, label: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(label.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_ignore_case_and_padding() {
        assert!(label_matches(Some(" Completed "), "completed"));
        assert!(!label_matches(Some("in progress"), "completed"));
        assert!(!label_matches(None, "completed"));
    }

    #[test]
    fn partial_overrides_keep_defaults() {
        let settings: CatalogSettings =
            serde_json::from_str(r#"{"intern_role": "Estagiário"}"#).unwrap();
        assert_eq!(settings.intern_role, "Estagiário");
        assert_eq!(settings.top_materials, 3);
    }
}
