use std::{collections::HashMap, fs, sync::Arc};

use crate::engine::{AnalysisEngine, HttpAnalysisEngine, MissingAnalysisEngine};

#[derive(Debug, Clone)]
pub struct Settings {
    /// Workflow-engine endpoint; `None` leaves the controller on the
    /// synthesized-only path.
    pub engine_url: Option<String>,
    pub catalog_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine_url: None,
            catalog_path: "./data/shipments.json".into(),
        }
    }
}

/// Defaults, then an optional `rca.toml`, then `RCA_ENGINE_URL`. The endpoint
/// URL is the only environment knob.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("rca.toml") {
        apply_file_config(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("RCA_ENGINE_URL") {
        settings.engine_url = Some(v);
    }

    settings
}

fn apply_file_config(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("engine_url") {
            settings.engine_url = Some(v.clone());
        }
        if let Some(v) = file_cfg.get("catalog_path") {
            settings.catalog_path = v.clone();
        }
    }
}

pub fn build_engine(settings: &Settings) -> Arc<dyn AnalysisEngine> {
    match &settings.engine_url {
        Some(url) => Arc::new(HttpAnalysisEngine::new(url.clone())),
        None => Arc::new(MissingAnalysisEngine),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_engine_unconfigured() {
        let settings = Settings::default();
        assert_eq!(settings.engine_url, None);
        assert_eq!(settings.catalog_path, "./data/shipments.json");
    }

    #[test]
    fn file_config_overrides_defaults() {
        let mut settings = Settings::default();
        apply_file_config(
            &mut settings,
            "engine_url = \"http://localhost:5678/webhook/rca\"\ncatalog_path = \"./fixtures/shipments.json\"\n",
        );
        assert_eq!(
            settings.engine_url.as_deref(),
            Some("http://localhost:5678/webhook/rca")
        );
        assert_eq!(settings.catalog_path, "./fixtures/shipments.json");
    }

    #[test]
    fn unreadable_file_config_is_ignored() {
        let mut settings = Settings::default();
        apply_file_config(&mut settings, "{{ not toml");
        assert_eq!(settings.engine_url, None);
    }
}
