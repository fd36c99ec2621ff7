//! Controller configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file overrides any subset of keys. Per-carousel
//! `data-*` attributes are a third layer applied at carousel init.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [carousel]
//! auto_rotate = true         # Advance automatically
//! rotate_interval_ms = 5000  # Autoplay period
//! transition_ms = 500        # Animation lock window
//! swipe_threshold_px = 50.0  # Minimum horizontal swipe distance
//!
//! [lightbox]
//! fade_ms = 300              # Fade-out before the overlay is detached
//!
//! [loader]
//! observer_supported = true  # false = load every lazy image up front
//! root_margin_px = 50.0      # Prefetch margin around the viewport
//! resize_debounce_ms = 250   # Quiet period before responsive sources update
//! mobile_max_width = 768
//! tablet_max_width = 1024
//! ```
//!
//! ## Data Attributes
//!
//! A carousel element may carry `data-auto-rotate` and `data-rotate-interval`.
//! Any `data-auto-rotate` value other than `"false"` enables autoplay. The
//! interval is read like `parseInt`: leading digits count, anything that does
//! not yield a positive number falls back to the configured interval.
//!
//! Unknown keys are rejected to catch typos early.

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
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete configuration. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub carousel: CarouselConfig,
    pub lightbox: LightboxConfig,
    pub loader: LoaderConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.carousel.rotate_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "carousel.rotate_interval_ms must be greater than 0".into(),
            ));
        }
        if !self.carousel.swipe_threshold_px.is_finite() || self.carousel.swipe_threshold_px < 0.0
        {
            return Err(ConfigError::Validation(
                "carousel.swipe_threshold_px must be a non-negative number".into(),
            ));
        }
        if !self.loader.root_margin_px.is_finite() {
            return Err(ConfigError::Validation(
                "loader.root_margin_px must be a finite number".into(),
            ));
        }
        if self.loader.mobile_max_width > self.loader.tablet_max_width {
            return Err(ConfigError::Validation(
                "loader.mobile_max_width must not exceed loader.tablet_max_width".into(),
            ));
        }
        Ok(())
    }
}

/// Carousel behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarouselConfig {
    /// Advance automatically on a timer.
    pub auto_rotate: bool,
    /// Autoplay period in milliseconds.
    pub rotate_interval_ms: u64,
    /// Length of the animation lock. Navigation requests during the lock are
    /// dropped.
    pub transition_ms: u64,
    /// Horizontal distance a swipe must exceed.
    pub swipe_threshold_px: f64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            auto_rotate: true,
            rotate_interval_ms: 5000,
            transition_ms: 500,
            swipe_threshold_px: 50.0,
        }
    }
}

impl CarouselConfig {
    /// Apply a carousel element's `data-*` overrides on top of this config.
    ///
    /// `attr` looks up an attribute by its name without the `data-` prefix.
    pub fn with_data_attributes<'a>(&self, attr: impl Fn(&str) -> Option<&'a str>) -> Self {
        let mut resolved = self.clone();
        if let Some(value) = attr("auto-rotate") {
            resolved.auto_rotate = value != "false";
        }
        if let Some(value) = attr("rotate-interval") {
            resolved.rotate_interval_ms = parse_leading_int(value)
                .filter(|ms| *ms > 0)
                .unwrap_or(self.rotate_interval_ms);
        }
        resolved
    }
}

/// Parse the leading decimal digits of `value`, ignoring surrounding
/// whitespace and trailing garbage (`"1500ms"` → 1500).
fn parse_leading_int(value: &str) -> Option<u64> {
    let trimmed = value.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Lightbox behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightboxConfig {
    /// Fade-out duration; the overlay is detached when it elapses.
    pub fade_ms: u64,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self { fade_ms: 300 }
    }
}

/// Lazy loading and responsive image selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Whether the host can report viewport intersections. When false every
    /// lazy image is loaded at init.
    pub observer_supported: bool,
    /// Extra distance around the viewport within which images start loading.
    pub root_margin_px: f64,
    /// Quiet period after the last resize before sources are recomputed.
    pub resize_debounce_ms: u64,
    /// Widths up to this use the `mobile` source.
    pub mobile_max_width: u32,
    /// Widths up to this use the `tablet` source.
    pub tablet_max_width: u32,
    /// Pause between a blur-up image loading and its placeholder fading.
    pub placeholder_delay_ms: u64,
    /// Placeholder fade-out before it is removed.
    pub placeholder_fade_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            observer_supported: true,
            root_margin_px: 50.0,
            resize_debounce_ms: 250,
            mobile_max_width: 768,
            tablet_max_width: 1024,
            placeholder_delay_ms: 100,
            placeholder_fade_ms: 500,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock config does not serialize: {e}")))
}

/// Lay a `config.toml` over the stock defaults, section by section.
///
/// A section in the file replaces only the keys it names, so a file holding
/// just `[carousel] transition_ms = 300` keeps every other stock value. Keys
/// the stock table lacks pass through for `deny_unknown_fields` to reject.
/// Per-element `data-*` attributes are the last layer, applied at carousel
/// init by [`CarouselConfig::with_data_attributes`].
pub fn layer_config_file(stock: toml::Value, file: toml::Value) -> toml::Value {
    match (stock, file) {
        (toml::Value::Table(mut layered), toml::Value::Table(sections)) => {
            for (name, value) in sections {
                let value = match layered.remove(&name) {
                    Some(stock_value) => layer_config_file(stock_value, value),
                    None => value,
                };
                layered.insert(name, value);
            }
            toml::Value::Table(layered)
        }
        (_, value) => value,
    }
}

/// Layer an optional config file onto the stock defaults, then deserialize
/// and validate.
pub fn resolve_config(file: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let stock = stock_defaults_value()?;
    let layered = match file {
        Some(file) => layer_config_file(stock, file),
        None => stock,
    };
    let config: SiteConfig = layered.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("no config at {}, using stock defaults", path.display());
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# simple-carousel configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Carousel
# ---------------------------------------------------------------------------
[carousel]
# Advance to the next slide on a timer. A carousel element can override this
# with data-auto-rotate="false".
auto_rotate = true

# Autoplay period in milliseconds. Overridable per carousel with
# data-rotate-interval. Hovering the carousel stops the timer; leaving it
# starts a fresh one.
rotate_interval_ms = 5000

# Animation lock in milliseconds. Navigation requested while a transition is
# running is dropped, not queued.
transition_ms = 500

# Horizontal distance in pixels a swipe must exceed to change slides.
swipe_threshold_px = 50.0

# ---------------------------------------------------------------------------
# Lightbox
# ---------------------------------------------------------------------------
[lightbox]
# Fade-out in milliseconds before the overlay is removed from the page.
fade_ms = 300

# ---------------------------------------------------------------------------
# Lazy images
# ---------------------------------------------------------------------------
[loader]
# Set to false for hosts without intersection observation: every lazy image
# is then loaded immediately.
observer_supported = true

# Start loading images this many pixels before they scroll into view.
root_margin_px = 50.0

# Wait this long after the last resize before picking responsive sources.
resize_debounce_ms = 250

# Breakpoints for responsive sources (inclusive upper bounds).
mobile_max_width = 768
tablet_max_width = 1024

# Blur-up images: once the full image loads, wait this long, then fade the
# blurred placeholder out over placeholder_fade_ms and remove it.
placeholder_delay_ms = 100
placeholder_fade_ms = 500
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_documented_values() {
        let config = SiteConfig::default();
        assert!(config.carousel.auto_rotate);
        assert_eq!(config.carousel.rotate_interval_ms, 5000);
        assert_eq!(config.carousel.transition_ms, 500);
        assert_eq!(config.carousel.swipe_threshold_px, 50.0);
        assert_eq!(config.lightbox.fade_ms, 300);
        assert_eq!(config.loader.resize_debounce_ms, 250);
        assert_eq!(config.loader.placeholder_delay_ms, 100);
        assert_eq!(config.loader.placeholder_fade_ms, 500);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[carousel]
rotate_interval_ms = 1000
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.carousel.rotate_interval_ms, 1000);
        // Defaults preserved
        assert!(config.carousel.auto_rotate);
        assert_eq!(config.lightbox.fade_ms, 300);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = r#"
[carousel]
rotate_intervall = 1000
"#;
        assert!(toml::from_str::<SiteConfig>(toml).is_err());
    }

    #[test]
    fn stock_toml_parses_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn file_section_keeps_unnamed_stock_keys() {
        let file: toml::Value = toml::from_str("[carousel]\ntransition_ms = 300").unwrap();
        let layered = layer_config_file(stock_defaults_value().unwrap(), file);
        assert_eq!(layered["carousel"]["transition_ms"].as_integer(), Some(300));
        assert_eq!(layered["carousel"]["rotate_interval_ms"].as_integer(), Some(5000));
        assert_eq!(layered["lightbox"]["fade_ms"].as_integer(), Some(300));
    }

    #[test]
    fn data_attributes_layer_over_config_file() {
        let file: toml::Value = toml::from_str("[carousel]\nrotate_interval_ms = 4000").unwrap();
        let config = resolve_config(Some(file)).unwrap();
        let data = attrs(&[("rotate-interval", "2500")]);
        let carousel = config
            .carousel
            .with_data_attributes(|name| data.get(name).map(String::as_str));
        assert_eq!(carousel.rotate_interval_ms, 2500);
        assert_eq!(carousel.transition_ms, 500);
    }

    #[test]
    fn zero_interval_fails_validation() {
        let overlay: toml::Value = toml::from_str("[carousel]\nrotate_interval_ms = 0").unwrap();
        let err = resolve_config(Some(overlay)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn inverted_breakpoints_fail_validation() {
        let mut config = SiteConfig::default();
        config.loader.mobile_max_width = 2000;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[lightbox]\nfade_ms = 150\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.lightbox.fade_ms, 150);
        assert_eq!(config.carousel.rotate_interval_ms, 5000);
    }

    #[test]
    fn load_config_reports_bad_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[carousel\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // data attribute overrides
    // =========================================================================

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn data_attributes_override_config() {
        let data = attrs(&[("auto-rotate", "false"), ("rotate-interval", "1200")]);
        let resolved =
            CarouselConfig::default().with_data_attributes(|k| data.get(k).map(String::as_str));
        assert!(!resolved.auto_rotate);
        assert_eq!(resolved.rotate_interval_ms, 1200);
    }

    #[test]
    fn any_auto_rotate_value_but_false_enables() {
        let mut base = CarouselConfig::default();
        base.auto_rotate = false;
        let data = attrs(&[("auto-rotate", "no")]);
        let resolved = base.with_data_attributes(|k| data.get(k).map(String::as_str));
        assert!(resolved.auto_rotate);
    }

    #[test]
    fn interval_parses_like_parse_int() {
        assert_eq!(parse_leading_int("1500ms"), Some(1500));
        assert_eq!(parse_leading_int("  800"), Some(800));
        assert_eq!(parse_leading_int("fast"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn unusable_interval_falls_back() {
        for bad in ["0", "soon", ""] {
            let data = attrs(&[("rotate-interval", bad)]);
            let resolved =
                CarouselConfig::default().with_data_attributes(|k| data.get(k).map(String::as_str));
            assert_eq!(resolved.rotate_interval_ms, 5000, "value {bad:?}");
        }
    }
}
