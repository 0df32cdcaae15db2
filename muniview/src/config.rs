use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Everything adjustable about the map. The defaults reproduce the sf-muni
/// setup; a JSON config file overrides whichever fields it names.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Layers to load, in draw order. The vehicle layer is listed here too,
    /// even though it comes from the live feed instead of a GeoJSON file;
    /// the loading pipeline dispatches it separately.
    pub layers: Vec<String>,
    /// The layer whose bounds calibrate the shared projection.
    pub scale_layer: String,
    pub vehicle_layer: String,
    /// Too big to cache (~10MB).
    pub cache_exempt_layer: String,
    /// Where layer GeoJSON comes from: a directory, or an http(s) base URL.
    /// Either way, each layer lives at `<source>/<name>.json`.
    pub layer_source: String,
    pub cache_dir: String,
    pub feed_url: String,
    pub agency: String,
    /// Routes with unusable map data, dropped from every poll.
    pub dropped_routes: Vec<String>,
    pub poll_interval_secs: u64,
    /// Retry delays grow linearly with consecutive failures, but never past
    /// this multiple of the poll interval.
    pub backoff_cap: u32,
    pub width: f64,
    pub height: f64,
    pub marker_radius: f64,
    pub transition_ms: u64,
}

impl Default for AppConfig {
    fn default() -> AppConfig {
        AppConfig {
            layers: vec![
                "neighborhoods".to_string(),
                "arteries".to_string(),
                "freeways".to_string(),
                "vehicles".to_string(),
                "streets".to_string(),
            ],
            scale_layer: "neighborhoods".to_string(),
            vehicle_layer: "vehicles".to_string(),
            cache_exempt_layer: "streets".to_string(),
            layer_source: "res".to_string(),
            cache_dir: "cache".to_string(),
            feed_url: "http://webservices.nextbus.com/service/publicJSONFeed".to_string(),
            agency: "sf-muni".to_string(),
            dropped_routes: vec!["76X".to_string()],
            poll_interval_secs: 15,
            backoff_cap: 8,
            width: 750.0,
            height: 700.0,
            // d3's default point radius
            marker_radius: 4.5,
            transition_ms: 250,
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<String>) -> Result<AppConfig> {
        let cfg = match path {
            Some(path) => {
                let raw = fs_err::read_to_string(&path)?;
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?
            }
            None => AppConfig::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            anyhow::bail!("no layers configured");
        }
        if !self.layers.contains(&self.scale_layer) {
            anyhow::bail!(
                "the scale layer {} isn't in the layer list; nothing could ever render",
                self.scale_layer
            );
        }
        Ok(())
    }

    pub fn cacheable(&self, layer: &str) -> bool {
        layer != self.cache_exempt_layer
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_coherent() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.layers.contains(&cfg.vehicle_layer));
        assert!(!cfg.cacheable("streets"));
        assert!(cfg.cacheable("neighborhoods"));
        assert_eq!(cfg.poll_interval(), Duration::from_secs(15));
    }

    #[test]
    fn partial_config_files_keep_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"poll_interval_secs": 5, "agency": "ttc"}"#).unwrap();
        assert_eq!(cfg.poll_interval_secs, 5);
        assert_eq!(cfg.agency, "ttc");
        assert_eq!(cfg.scale_layer, "neighborhoods");
        assert_eq!(cfg.width, 750.0);
    }

    #[test]
    fn scale_layer_must_be_loadable() {
        let mut cfg = AppConfig::default();
        cfg.scale_layer = "transbay".to_string();
        assert!(cfg.validate().is_err());
    }
}
