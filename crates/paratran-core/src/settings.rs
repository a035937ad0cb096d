//! Startup settings resolution.
//!
//! Precedence for every value: explicit flag → environment → built-in
//! default. Empty strings count as unset at every layer.

use crate::engine::ModelIdentity;

/// Model used when neither a flag nor the environment names one.
pub const DEFAULT_MODEL: &str = "istupakov/parakeet-tdt-0.6b-v3-onnx";

/// Environment variable naming the model.
pub const ENV_MODEL: &str = "PARATRAN_MODEL";
/// Environment variable naming the model cache directory.
pub const ENV_MODEL_DIR: &str = "PARATRAN_MODEL_DIR";
/// Environment variable naming a remote paratran server.
pub const ENV_SERVER: &str = "PARATRAN_SERVER";

/// Resolved model selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    /// Hub repo id or local model directory.
    pub model: String,
    /// Download/cache directory, if any.
    pub cache_dir: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            cache_dir: None,
        }
    }
}

impl ModelSettings {
    /// Resolve against the process environment.
    pub fn resolve(flag_model: Option<&str>, flag_cache_dir: Option<&str>) -> Self {
        Self::resolve_with(flag_model, flag_cache_dir, read_env_string)
    }

    /// Resolve against an arbitrary environment lookup.
    pub fn resolve_with(
        flag_model: Option<&str>,
        flag_cache_dir: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let model = non_empty(flag_model)
            .or_else(|| env(ENV_MODEL).filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let cache_dir =
            non_empty(flag_cache_dir).or_else(|| env(ENV_MODEL_DIR).filter(|v| !v.is_empty()));
        Self { model, cache_dir }
    }

    /// Cache key for these settings.
    pub fn identity(&self) -> ModelIdentity {
        ModelIdentity::new(self.model.clone(), self.cache_dir.clone())
    }
}

/// Remote server URL from `--server` or `PARATRAN_SERVER`; `None` means local mode.
pub fn resolve_server_url(
    flag: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    non_empty(flag).or_else(|| env(ENV_SERVER).filter(|v| !v.is_empty()))
}

/// Process environment lookup that treats empty values as unset.
pub fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_flags_or_env() {
        let s = ModelSettings::resolve_with(None, None, env_of(&[]));
        assert_eq!(s, ModelSettings::default());
        assert_eq!(s.model, DEFAULT_MODEL);
    }

    #[test]
    fn env_overrides_default() {
        let s = ModelSettings::resolve_with(
            None,
            None,
            env_of(&[(ENV_MODEL, "org/other"), (ENV_MODEL_DIR, "/models")]),
        );
        assert_eq!(s.model, "org/other");
        assert_eq!(s.cache_dir.as_deref(), Some("/models"));
    }

    #[test]
    fn flags_override_env() {
        let s = ModelSettings::resolve_with(
            Some("./local-model"),
            Some("/flag-cache"),
            env_of(&[(ENV_MODEL, "org/other"), (ENV_MODEL_DIR, "/models")]),
        );
        assert_eq!(s.model, "./local-model");
        assert_eq!(s.cache_dir.as_deref(), Some("/flag-cache"));
    }

    #[test]
    fn empty_values_are_unset() {
        let s = ModelSettings::resolve_with(
            Some(""),
            Some(""),
            env_of(&[(ENV_MODEL, ""), (ENV_MODEL_DIR, "")]),
        );
        assert_eq!(s, ModelSettings::default());
    }

    #[test]
    fn identity_carries_both_fields() {
        let s = ModelSettings {
            model: "m".into(),
            cache_dir: Some("/c".into()),
        };
        assert_eq!(s.identity(), ModelIdentity::new("m", Some("/c".into())));
    }

    #[test]
    fn server_url_precedence() {
        let env = env_of(&[(ENV_SERVER, "http://env:8000")]);
        assert_eq!(
            resolve_server_url(Some("http://flag:9000"), &env).as_deref(),
            Some("http://flag:9000")
        );
        assert_eq!(resolve_server_url(None, &env).as_deref(), Some("http://env:8000"));
        assert_eq!(resolve_server_url(Some(""), env_of(&[])), None);
    }
}
