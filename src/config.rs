use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Directory scanned once at startup for gallery images.
    pub photo_library_path: PathBuf,
    /// Window title and page heading.
    pub title: String,
    pub window: WindowConfig,
    pub grid: GridConfig,
    pub lightbox: LightboxConfig,
    pub history: HistoryConfig,
    pub loader: LoaderConfig,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.photo_library_path.as_os_str().is_empty(),
            "photo-library-path must be set"
        );
        self.window
            .validate()
            .context("invalid window configuration")?;
        self.grid.validate().context("invalid grid configuration")?;
        self.lightbox
            .validate()
            .context("invalid lightbox configuration")?;
        ensure!(
            self.history.max_depth >= 2,
            "history.max-depth must be at least 2"
        );
        ensure!(
            self.loader.max_concurrent_decodes > 0,
            "loader.max-concurrent-decodes must be greater than zero"
        );
        ensure!(
            self.loader.full_image_max_dim >= self.grid.thumbnail_size,
            "loader.full-image-max-dim must not be smaller than grid.thumbnail-size"
        );
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            photo_library_path: PathBuf::new(),
            title: "Galería de fotos".to_string(),
            window: WindowConfig::default(),
            grid: GridConfig::default(),
            lightbox: LightboxConfig::default(),
            history: HistoryConfig::default(),
            loader: LoaderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl WindowConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "window.width and window.height must be greater than zero"
        );
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct GridConfig {
    /// Edge length of a square grid cell, in pixels.
    pub thumbnail_size: u32,
    /// Space between cells and around the grid, in pixels.
    pub gap: u32,
    /// How long a freshly loaded thumbnail takes to fade in.
    #[serde(with = "humantime_serde")]
    pub fade_in: Duration,
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.thumbnail_size > 0,
            "grid.thumbnail-size must be greater than zero"
        );
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: 220,
            gap: 12,
            fade_in: Duration::from_millis(300),
        }
    }
}

/// Gesture thresholds and transition timing for the lightbox.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LightboxConfig {
    /// Displacement after which a drag claims the pointer.
    pub jitter_threshold_px: f32,
    /// Displacement a released drag must exceed to navigate.
    pub commit_threshold_px: f32,
    /// Duration of each slide phase.
    #[serde(with = "humantime_serde")]
    pub phase_duration: Duration,
    /// Duration of the closing fade.
    #[serde(with = "humantime_serde")]
    pub close_duration: Duration,
}

impl LightboxConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.jitter_threshold_px.is_finite() && self.jitter_threshold_px > 0.0,
            "lightbox.jitter-threshold-px must be a positive number"
        );
        ensure!(
            self.commit_threshold_px.is_finite() && self.commit_threshold_px > 0.0,
            "lightbox.commit-threshold-px must be a positive number"
        );
        ensure!(
            self.jitter_threshold_px < self.commit_threshold_px,
            "lightbox.jitter-threshold-px must be smaller than lightbox.commit-threshold-px"
        );
        ensure!(
            !self.phase_duration.is_zero(),
            "lightbox.phase-duration must be greater than zero"
        );
        ensure!(
            !self.close_duration.is_zero(),
            "lightbox.close-duration must be greater than zero"
        );
        Ok(())
    }
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            jitter_threshold_px: 10.0,
            commit_threshold_px: 70.0,
            phase_duration: Duration::from_millis(220),
            close_duration: Duration::from_millis(220),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// When false every marker push is refused, as in a sandbox that forbids
    /// history mutation.
    pub enabled: bool,
    /// Maximum number of navigation-stack entries.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub max_concurrent_decodes: usize,
    /// Longest side of images decoded for the lightbox.
    pub full_image_max_dim: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_decodes: 2,
            full_image_max_dim: 2048,
        }
    }
}
