use std::env::VarError;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use platform_db::StoreSettings;
use products_hr::CatalogSettings;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreSettings,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub catalog: CatalogSettings,
}

impl AppConfig {
    /// Read the environment (after `.env`, if present). CLI flags are applied
    /// on top by the caller.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let store = lookup("DATABASE_URL")
            .map(StoreSettings::new)
            .unwrap_or_default();
        let data_dir = lookup("HR_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let output_dir = lookup("HR_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let mut catalog = CatalogSettings::default();
        let overrides = [
            (&mut catalog.intern_role, "HR_INTERN_ROLE"),
            (&mut catalog.analyst_role, "HR_ANALYST_ROLE"),
            (&mut catalog.male_label, "HR_MALE_LABEL"),
            (&mut catalog.female_label, "HR_FEMALE_LABEL"),
            (&mut catalog.completed_status, "HR_COMPLETED_STATUS"),
            (&mut catalog.in_execution_status, "HR_IN_EXECUTION_STATUS"),
            (&mut catalog.material_type, "HR_MATERIAL_TYPE"),
            (&mut catalog.raise_window_from, "HR_RAISE_WINDOW_FROM"),
            (&mut catalog.raise_window_to, "HR_RAISE_WINDOW_TO"),
        ];
        for (target, key) in overrides {
            override_label(target, key, lookup(key))?;
        }
        if catalog.raise_window_from > catalog.raise_window_to {
            return Err(anyhow!(
                "raise window is empty: {} is after {}",
                catalog.raise_window_from,
                catalog.raise_window_to
            ));
        }

        Ok(Self {
            store,
            data_dir,
            output_dir,
            catalog,
        })
    }
}

fn override_label(target: &mut String, key: &str, value: Result<String, VarError>) -> Result<()> {
    match value {
        Ok(value) if value.trim().is_empty() => Err(anyhow!("{key} is set but empty")),
        Ok(value) => {
            *target = value.trim().to_string();
            Ok(())
        }
        Err(VarError::NotPresent) => Ok(()),
        Err(err) => Err(err).with_context(|| format!("invalid {key}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        AppConfig::from_lookup(|key| vars.get(key).cloned().ok_or(VarError::NotPresent))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config(&[]).unwrap();
        assert_eq!(config.store.url(), platform_db::DEFAULT_DATABASE_URL);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.catalog, CatalogSettings::default());
    }

    #[test]
    fn environment_overrides_paths_and_labels() {
        let config = config(&[
            ("DATABASE_URL", "sqlite://other.db?mode=rwc"),
            ("HR_DATA_DIR", "/srv/hr"),
            ("HR_ANALYST_ROLE", " Analista "),
            ("HR_RAISE_WINDOW_TO", "2023-12"),
        ])
        .unwrap();
        assert_eq!(config.store.url(), "sqlite://other.db?mode=rwc");
        assert_eq!(config.data_dir, PathBuf::from("/srv/hr"));
        assert_eq!(config.catalog.analyst_role, "Analista");
        assert_eq!(config.catalog.raise_window_to, "2023-12");
        assert_eq!(config.catalog.intern_role, "Intern");
    }

    #[test]
    fn blank_labels_are_rejected() {
        let err = config(&[("HR_MATERIAL_TYPE", "   ")]).unwrap_err();
        assert!(err.to_string().contains("HR_MATERIAL_TYPE"), "{err}");
    }

    #[test]
    fn inverted_raise_window_is_rejected() {
        let err = config(&[
            ("HR_RAISE_WINDOW_FROM", "2023-07"),
            ("HR_RAISE_WINDOW_TO", "2023-01"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("raise window"), "{err}");
    }
}
