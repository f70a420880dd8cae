//! Render-time configuration derived from application settings.

use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// Settings prefix under which renderer options are looked up by default.
pub const DEFAULT_SETTINGS_PREFIX: &str = "pug.";

/// File extension conventionally associated with the renderer by the host
/// application's registry.
pub const DEFAULT_EXTENSION: &str = ".pug";

/// Reload toggles consulted without a prefix, mirroring the host framework's own
/// setting names.
const RELOAD_KEYS: [&str; 2] = ["reload_all", "reload_templates"];

/// Process-wide rendering configuration.
///
/// Built once at application startup (typically via [`Self::from_settings()`]) and
/// injected into [`PugRendererFactory`](crate::PugRendererFactory); it is never
/// mutated during request handling, so sharing it across threads requires no locking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Whether to serve templates from the static cache ([`Self::from_settings()`]
    /// reads this from `{prefix}static_only`). `false` by default.
    #[serde(default)]
    pub static_only: bool,
    /// Whether template reloading is requested; a truthy reload toggle disables the
    /// static cache even when [`Self::static_only`] is set. `false` by default.
    #[serde(default)]
    pub reload: bool,
}

impl RenderConfig {
    /// Builds a config from a flat settings map. `{prefix}static_only` is parsed as a
    /// [bool-like value](as_bool); the unprefixed `reload_all` / `reload_templates`
    /// toggles are consulted verbatim, and either being truthy sets
    /// [`Self::reload`].
    pub fn from_settings(settings: &HashMap<String, String>, prefix: &str) -> Self {
        let static_only = settings
            .get(&format!("{prefix}static_only"))
            .is_some_and(|value| as_bool(value));
        let reload = RELOAD_KEYS
            .iter()
            .any(|key| settings.get(*key).is_some_and(|value| as_bool(value)));
        Self {
            static_only,
            reload,
        }
    }

    /// Checks whether renders should go through the static cache.
    pub fn use_static(self) -> bool {
        self.static_only && !self.reload
    }
}

/// Parses a bool-like setting value: truthy iff it starts with `t` or `T`
/// (`"true"`, `"True"`, `"t"`, ...).
pub(crate) fn as_bool(value: &str) -> bool {
    value
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'t'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_from_toml(toml: &str) -> HashMap<String, String> {
        let table: HashMap<String, String> = toml::from_str(toml).unwrap();
        table
    }

    #[test]
    fn bool_like_parsing() {
        for truthy in ["t", "T", "true", "True", "TRUE", "totally"] {
            assert!(as_bool(truthy), "{truthy} should parse as true");
        }
        for falsy in ["", "f", "false", "0", "1", "yes", "no"] {
            assert!(!as_bool(falsy), "{falsy} should parse as false");
        }
    }

    #[test]
    fn config_from_prefixed_settings() {
        let settings = settings_from_toml(r#""pug.static_only" = "true""#);
        let config = RenderConfig::from_settings(&settings, DEFAULT_SETTINGS_PREFIX);
        assert!(config.static_only);
        assert!(!config.reload);
        assert!(config.use_static());
    }

    #[test]
    fn prefix_scopes_lookups() {
        let settings = settings_from_toml(r#""jinja2.static_only" = "true""#);
        let config = RenderConfig::from_settings(&settings, DEFAULT_SETTINGS_PREFIX);
        assert!(!config.static_only);
    }

    #[test]
    fn either_reload_toggle_disables_static_mode() {
        for key in ["reload_all", "reload_templates"] {
            let settings = settings_from_toml(&format!(
                "\"pug.static_only\" = \"true\"\n{key} = \"true\""
            ));
            let config = RenderConfig::from_settings(&settings, DEFAULT_SETTINGS_PREFIX);
            assert!(config.static_only);
            assert!(config.reload);
            assert!(!config.use_static());
        }
    }

    #[test]
    fn missing_settings_default_to_disabled() {
        let config = RenderConfig::from_settings(&HashMap::new(), DEFAULT_SETTINGS_PREFIX);
        assert_eq!(config, RenderConfig::default());
        assert!(!config.use_static());
    }
}
