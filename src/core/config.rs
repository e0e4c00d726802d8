//! Configuration for a pixel map session.
//!
//! Values come from [`Default`] or from the environment via
//! [`MapixConfig::from_env`]; the grid step is deliberately not configurable
//! because it has to match the placement endpoint.

use crate::core::constants::{
    RETENTION_BOUND, RETICLE_ALPHA, RETICLE_GAP_PX, RETICLE_LINE_WIDTH, RETICLE_RADIUS_PX,
};
use crate::rendering::color::Rgba;
use crate::{MapError, Result};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct MapixConfig {
    /// Placement endpoint (`POST`)
    pub placement_url: Option<String>,
    /// Table endpoint used for the bulk seed read
    pub seed_url: Option<String>,
    /// API identity key sent alongside the bearer credential
    pub api_key: Option<String>,
    /// Maximum number of cells kept by the store
    pub retention_bound: usize,
    /// Rows requested by the bulk seed read
    pub seed_limit: usize,
    /// Whole-request timeout for placements; `None` uses the transport default
    pub request_timeout: Option<Duration>,
    /// Skip projecting cells that lie outside the visible bounds
    pub culling: bool,
    pub reticle_enabled: bool,
    pub reticle: ReticleStyle,
}

impl Default for MapixConfig {
    fn default() -> Self {
        Self {
            placement_url: None,
            seed_url: None,
            api_key: None,
            retention_bound: RETENTION_BOUND,
            seed_limit: RETENTION_BOUND,
            request_timeout: None,
            culling: true,
            reticle_enabled: true,
            reticle: ReticleStyle::default(),
        }
    }
}

impl MapixConfig {
    /// Reads overrides from `MAPIX_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.placement_url = env_string("MAPIX_PLACE_URL").or_else(|| env_string("MAPIX_EDGE_PLACE_URL"));
        config.seed_url = env_string("MAPIX_SEED_URL");
        config.api_key = env_string("MAPIX_API_KEY");

        if let Some(retention) = env_parse::<usize>("MAPIX_RETENTION")? {
            config.retention_bound = retention;
            config.seed_limit = retention;
        }
        if let Some(limit) = env_parse::<usize>("MAPIX_SEED_LIMIT")? {
            config.seed_limit = limit;
        }
        if let Some(ms) = env_parse::<u64>("MAPIX_PLACE_TIMEOUT_MS")? {
            config.request_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(culling) = env_parse::<bool>("MAPIX_CULLING")? {
            config.culling = culling;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retention_bound == 0 {
            return Err(MapError::Config("retention bound must be positive".to_string()));
        }
        if self.seed_limit == 0 {
            return Err(MapError::Config("seed limit must be positive".to_string()));
        }
        self.reticle.validate()
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| MapError::Config(format!("{key}={raw}: {e}"))),
        None => Ok(None),
    }
}

/// Appearance of the cursor reticle.
#[derive(Debug, Clone, PartialEq)]
pub struct ReticleStyle {
    pub color: Rgba,
    pub line_width: f32,
    pub alpha: f32,
    pub radius: f64,
    pub gap: f64,
}

impl Default for ReticleStyle {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            line_width: RETICLE_LINE_WIDTH,
            alpha: RETICLE_ALPHA,
            radius: RETICLE_RADIUS_PX,
            gap: RETICLE_GAP_PX,
        }
    }
}

impl ReticleStyle {
    pub fn validate(&self) -> Result<()> {
        if self.radius <= 0.0 || self.line_width <= 0.0 {
            return Err(MapError::Config("reticle radius and line width must be positive".to_string()));
        }
        if self.gap < 0.0 || self.gap >= self.radius {
            return Err(MapError::Config("reticle gap must lie in [0, radius)".to_string()));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(MapError::Config("reticle alpha must lie in [0, 1]".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MapixConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retention_bound, 5000);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.reticle.radius, 10.0);
        assert_eq!(config.reticle.gap, 4.0);
    }

    #[test]
    fn zero_retention_is_rejected() {
        let config = MapixConfig {
            retention_bound: 0,
            ..MapixConfig::default()
        };
        assert!(matches!(config.validate(), Err(MapError::Config(_))));
    }

    #[test]
    fn reticle_gap_must_fit_inside_radius() {
        let style = ReticleStyle {
            gap: 12.0,
            ..ReticleStyle::default()
        };
        assert!(style.validate().is_err());
    }
}
