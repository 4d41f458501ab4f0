//! Effects configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top of it, so
//! a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [navigation]
//! base_path = ""                  # Prefix for page navigation URLs
//! current_page = ""               # home | services | testimonials | about | careers | contact
//! logo_path = "images/Logo-C.png" # Applied to #navLogo
//! navbar_selector = "#mainNavbar, .navbar"
//! logo_selector = ".main-logo"
//! scroll_threshold_px = 50.0      # Navbar gets `scrolled` beyond this offset
//! logo_height = "40px"
//! logo_height_scrolled = "35px"
//!
//! [reveal]
//! threshold = 0.1                 # Visible fraction that triggers a reveal
//! selector = ".scroll-animate, .achievement-card, .testimonial-card, .timeline-item"
//! hero_selector = ".hero-section .scroll-animate, .hero-banner .scroll-animate"
//!
//! [counter]
//! duration_ms = 2000
//!
//! [rotator]
//! container_selector = ".text-rotating"
//! selector = ".text-rotating span"
//! interval_ms = 3000
//! exit_ms = 500
//! entrance_ms = 50
//!
//! [form]
//! endpoint = "https://forms.gle/QjLMWKZg1ES6ZEWL7"
//! form_id = "contactForm"
//! success_id = "successMessage"
//! error_id = "errorMessage"
//! message_ms = 5000
//! sending_label = "Sending..."
//! idle_label = "Send Message"
//!
//! [scheduler]
//! frame_ms = 16
//! step_limit = 100000
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::nav;
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Effects configuration loaded from `config.toml`.
///
/// Passed explicitly to [`Engine::new`](crate::engine::Engine::new); there is
/// no process-wide configuration object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectsConfig {
    pub navigation: NavigationConfig,
    pub reveal: RevealConfig,
    pub counter: CounterConfig,
    pub rotator: RotatorConfig,
    pub form: FormConfig,
    pub scheduler: SchedulerConfig,
}

impl EffectsConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.reveal.threshold) {
            return Err(ConfigError::Validation(
                "reveal.threshold must be between 0 and 1".into(),
            ));
        }
        if self.counter.duration_ms == 0 {
            return Err(ConfigError::Validation(
                "counter.duration_ms must be non-zero".into(),
            ));
        }
        if self.rotator.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "rotator.interval_ms must be non-zero".into(),
            ));
        }
        if self.rotator.exit_ms + self.rotator.entrance_ms >= self.rotator.interval_ms {
            return Err(ConfigError::Validation(
                "rotator.exit_ms + rotator.entrance_ms must be shorter than rotator.interval_ms"
                    .into(),
            ));
        }
        if self.scheduler.frame_ms == 0 {
            return Err(ConfigError::Validation(
                "scheduler.frame_ms must be non-zero".into(),
            ));
        }
        if self.scheduler.step_limit == 0 {
            return Err(ConfigError::Validation(
                "scheduler.step_limit must be non-zero".into(),
            ));
        }
        let current = &self.navigation.current_page;
        if !current.is_empty() && nav::page_index(current).is_none() {
            return Err(ConfigError::Validation(format!(
                "navigation.current_page `{current}` is not one of {:?}",
                nav::PAGES
            )));
        }
        validate_endpoint(&self.form.endpoint)?;
        for (key, value) in [
            ("navigation.navbar_selector", &self.navigation.navbar_selector),
            ("navigation.logo_selector", &self.navigation.logo_selector),
            ("reveal.selector", &self.reveal.selector),
            ("reveal.hero_selector", &self.reveal.hero_selector),
            ("rotator.container_selector", &self.rotator.container_selector),
            ("rotator.selector", &self.rotator.selector),
        ] {
            Selector::parse(value)
                .map_err(|e| ConfigError::Validation(format!("{key}: {e}")))?;
        }
        Ok(())
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| ConfigError::Validation(format!("form.endpoint `{endpoint}`: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Validation(format!(
            "form.endpoint must be http(s), got `{other}`"
        ))),
    }
}

/// Navigation highlighting and navbar scroll styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationConfig {
    /// Prefix prepended to page names when navigating.
    pub base_path: String,
    /// Page whose nav link is marked active. Empty leaves all links inactive.
    pub current_page: String,
    /// Image source applied to `#navLogo`. Empty leaves it untouched.
    pub logo_path: String,
    pub navbar_selector: String,
    pub logo_selector: String,
    /// Scroll offset (px) beyond which the navbar gets the `scrolled` class.
    pub scroll_threshold_px: f64,
    pub logo_height: String,
    pub logo_height_scrolled: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            current_page: String::new(),
            logo_path: "images/Logo-C.png".to_string(),
            navbar_selector: "#mainNavbar, .navbar".to_string(),
            logo_selector: ".main-logo".to_string(),
            scroll_threshold_px: 50.0,
            logo_height: "40px".to_string(),
            logo_height_scrolled: "35px".to_string(),
        }
    }
}

/// Scroll-triggered reveal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    /// Visible fraction of an element's box that counts as "in view".
    pub threshold: f64,
    /// Elements hidden at load and revealed on first view.
    pub selector: String,
    /// Elements revealed immediately at load.
    pub hero_selector: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            selector: ".scroll-animate, .achievement-card, .testimonial-card, .timeline-item"
                .to_string(),
            hero_selector: ".hero-section .scroll-animate, .hero-banner .scroll-animate"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CounterConfig {
    /// Time from 0 to the target value.
    pub duration_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self { duration_ms: 2000 }
    }
}

/// Hero text rotation timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotatorConfig {
    /// Rotation only starts when this container exists.
    pub container_selector: String,
    /// The rotating fragments.
    pub selector: String,
    pub interval_ms: u64,
    /// Delay between hiding the old fragment and showing the new one.
    pub exit_ms: u64,
    /// Delay between showing the new fragment and fading it in.
    pub entrance_ms: u64,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            container_selector: ".text-rotating".to_string(),
            selector: ".text-rotating span".to_string(),
            interval_ms: 3000,
            exit_ms: 500,
            entrance_ms: 50,
        }
    }
}

/// Contact form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormConfig {
    pub endpoint: String,
    pub form_id: String,
    pub success_id: String,
    pub error_id: String,
    /// How long the success/error banner stays visible.
    pub message_ms: u64,
    pub sending_label: String,
    pub idle_label: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://forms.gle/QjLMWKZg1ES6ZEWL7".to_string(),
            form_id: "contactForm".to_string(),
            success_id: "successMessage".to_string(),
            error_id: "errorMessage".to_string(),
            message_ms: 5000,
            sending_label: "Sending...".to_string(),
            idle_label: "Send Message".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Animation frame period.
    pub frame_ms: u64,
    /// Maximum tasks run by a single `advance` call.
    pub step_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_ms: 16,
            step_limit: 100_000,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(EffectsConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EffectsConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EffectsConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory, on top of the
/// stock defaults.
pub fn load_config(dir: &Path) -> Result<EffectsConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# syntra-fx Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Navigation
# ---------------------------------------------------------------------------
[navigation]
# Prefix for navigate-to-page URLs (e.g. "../" for pages in a subfolder).
base_path = ""

# Page whose nav link gets `active` + aria-current="page".
# One of: home, services, testimonials, about, careers, contact.
current_page = ""

# Image applied to #navLogo. Empty leaves the markup value.
logo_path = "images/Logo-C.png"

navbar_selector = "#mainNavbar, .navbar"
logo_selector = ".main-logo"

# The navbar gets the `scrolled` class beyond this scroll offset (px).
scroll_threshold_px = 50.0
logo_height = "40px"
logo_height_scrolled = "35px"

# ---------------------------------------------------------------------------
# Scroll reveal
# ---------------------------------------------------------------------------
[reveal]
# Fraction of an element that must be visible before it is revealed.
threshold = 0.1
selector = ".scroll-animate, .achievement-card, .testimonial-card, .timeline-item"
hero_selector = ".hero-section .scroll-animate, .hero-banner .scroll-animate"

# ---------------------------------------------------------------------------
# Achievement counters
# ---------------------------------------------------------------------------
[counter]
duration_ms = 2000

# ---------------------------------------------------------------------------
# Hero text rotation
# ---------------------------------------------------------------------------
[rotator]
container_selector = ".text-rotating"
selector = ".text-rotating span"
interval_ms = 3000
exit_ms = 500
entrance_ms = 50

# ---------------------------------------------------------------------------
# Contact form
# ---------------------------------------------------------------------------
[form]
endpoint = "https://forms.gle/QjLMWKZg1ES6ZEWL7"
form_id = "contactForm"
success_id = "successMessage"
error_id = "errorMessage"
# How long the success/error banner stays visible.
message_ms = 5000
sending_label = "Sending..."
idle_label = "Send Message"

# ---------------------------------------------------------------------------
# Event loop
# ---------------------------------------------------------------------------
[scheduler]
# Animation frame period (ms).
frame_ms = 16
# Maximum tasks a single advance may run before failing.
step_limit = 100000
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_site_constants() {
        let config = EffectsConfig::default();
        assert_eq!(config.reveal.threshold, 0.1);
        assert_eq!(config.counter.duration_ms, 2000);
        assert_eq!(config.rotator.interval_ms, 3000);
        assert_eq!(config.rotator.exit_ms, 500);
        assert_eq!(config.rotator.entrance_ms, 50);
        assert_eq!(config.form.message_ms, 5000);
        assert_eq!(config.navigation.scroll_threshold_px, 50.0);
    }

    #[test]
    fn default_config_is_valid() {
        EffectsConfig::default().validate().unwrap();
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let parsed: EffectsConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, EffectsConfig::default());
    }

    #[test]
    fn parse_partial_config() {
        let config: EffectsConfig = toml::from_str(
            r#"
[counter]
duration_ms = 1500
"#,
        )
        .unwrap();
        assert_eq!(config.counter.duration_ms, 1500);
        assert_eq!(config.rotator.interval_ms, 3000);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, EffectsConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[navigation]
current_page = "about"
base_path = "../"

[form]
message_ms = 3000
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.navigation.current_page, "about");
        assert_eq!(config.navigation.base_path, "../");
        assert_eq!(config.form.message_ms, 3000);
        // Unspecified values stay at defaults
        assert_eq!(config.form.form_id, "contactForm");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1").unwrap();
        let overlay: toml::Value = toml::from_str("a = 2").unwrap();
        assert_eq!(merge_toml(base, overlay)["a"].as_integer(), Some(2));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
[rotator]
interval_ms = 3000
exit_ms = 500
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[rotator]
exit_ms = 300
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["rotator"]["interval_ms"].as_integer(), Some(3000));
        assert_eq!(merged["rotator"]["exit_ms"].as_integer(), Some(300));
    }

    // =========================================================================
    // Unknown keys and validation
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<EffectsConfig, _> = toml::from_str(
            r#"
[counter]
duraton_ms = 100
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[colors]\nbg = \"#fff\"\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn validate_threshold_range() {
        let mut config = EffectsConfig::default();
        config.reveal.threshold = 1.0;
        assert!(config.validate().is_ok());
        config.reveal.threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rotator_steps_fit_interval() {
        let mut config = EffectsConfig::default();
        config.rotator.interval_ms = 500;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rotator.exit_ms"));
    }

    #[test]
    fn validate_zero_durations() {
        let mut config = EffectsConfig::default();
        config.counter.duration_ms = 0;
        assert!(config.validate().is_err());

        let mut config = EffectsConfig::default();
        config.scheduler.frame_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_unknown_current_page() {
        let mut config = EffectsConfig::default();
        config.navigation.current_page = "blog".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("blog"));
    }

    #[test]
    fn validate_endpoint_scheme() {
        let mut config = EffectsConfig::default();
        config.form.endpoint = "mailto:hello@syntraedge.global".into();
        assert!(config.validate().unwrap_err().to_string().contains("http(s)"));
        config.form.endpoint = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_selectors() {
        let mut config = EffectsConfig::default();
        config.reveal.selector = ".scroll-animate >".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("Config validation error: reveal.selector"));
    }
}
