use serde::Deserialize;

use crate::error::{PlotError, Result};

/// Smallest accepted grid resolution
pub const MIN_RESOLUTION: u32 = 100;

pub const DEFAULT_RESOLUTION: u32 = 10_000;

/// How primitives are colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Cell colors where present, the specified color elsewhere
    #[default]
    Default,
    /// The specified color everywhere
    Specified,
    /// An independently drawn color per primitive
    Random,
}

/// Settings for one export, fixed for its whole duration
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Grid units along the longer side of the picture
    pub resolution: u32,
    pub color_mode: ColorMode,
    /// RGB in [0, 1]
    pub specified_color: [f64; 3],
    /// Draw back to front by depth
    pub sort: bool,
    /// Seed for [`ColorMode::Random`]; fresh entropy per export when absent
    pub random_seed: Option<u64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            color_mode: ColorMode::Default,
            specified_color: [0.0, 0.0, 0.0],
            sort: true,
            random_seed: None,
        }
    }
}

impl ExportConfig {
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    pub fn with_specified_color(mut self, color: [f64; 3]) -> Self {
        self.specified_color = color;
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Check ranges; exporters refuse to run with an invalid config
    pub fn validate(&self) -> Result<()> {
        if self.resolution < MIN_RESOLUTION {
            return Err(PlotError::InvalidConfig(format!(
                "resolution must be at least {MIN_RESOLUTION}, got {}",
                self.resolution
            )));
        }
        if let Some(c) = self
            .specified_color
            .iter()
            .find(|c| !(0.0..=1.0).contains(*c))
        {
            return Err(PlotError::InvalidConfig(format!(
                "specified color components must lie in [0, 1], got {c}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.resolution, 10_000);
        assert_eq!(config.color_mode, ColorMode::Default);
        assert_eq!(config.specified_color, [0.0, 0.0, 0.0]);
        assert!(config.sort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolution_boundary() {
        let err = ExportConfig::default()
            .with_resolution(99)
            .validate()
            .unwrap_err();
        assert!(matches!(err, PlotError::InvalidConfig(_)));
        assert!(
            ExportConfig::default()
                .with_resolution(100)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_color_out_of_range() {
        for bad in [[1.1, 0.0, 0.0], [0.0, -0.1, 0.0], [0.0, 0.0, f64::NAN]] {
            let config = ExportConfig::default().with_specified_color(bad);
            assert!(matches!(
                config.validate(),
                Err(PlotError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_color_mode_from_str() {
        let mode: ColorMode = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(mode, ColorMode::Random);
    }
}
