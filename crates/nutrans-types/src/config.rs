// ─────────────────────────────────────────────────────────────────────
// Nutrans — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::error::{TransportError, TransportResult};

/// Top-level transport run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub run_name: String,
    /// When false every metric query collapses to Minkowski values.
    #[serde(default = "default_relativistic")]
    pub relativistic: bool,
    pub grid: GridConfig,
    pub frequency_axis: AxisSpec,
    #[serde(default)]
    pub cdf: CdfConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub random_walk: RandomWalkConfig,
    #[serde(default)]
    pub rank: RankContext,
}

/// One of the construction modes of a bin-edge axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AxisSpec {
    /// `n` equal-width bins spanning `[start, stop]`.
    Uniform { start: f64, stop: f64, n: usize },
    /// Bins of width `delta` from `start`; the last edge is `stop`.
    Step { start: f64, stop: f64, delta: f64 },
    /// Explicit upper edges with a separate lower bound.
    Edges { min: f64, edges: Vec<f64> },
    /// Explicit upper edges and explicit bin midpoints.
    EdgesWithMid { min: f64, edges: Vec<f64>, mid: Vec<f64> },
}

/// Spatial discretization and its symmetry boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "geometry")]
pub enum GridConfig {
    #[serde(rename = "sphere_1d")]
    Sphere1D {
        r: AxisSpec,
        /// Particles leaving through the outer radius re-enter with reversed radial momentum.
        #[serde(default)]
        reflect_outer: bool,
    },
    #[serde(rename = "cylinder_2d")]
    Cylinder2D {
        rcyl: AxisSpec,
        z: AxisSpec,
        /// Mirror plane at z = 0.
        #[serde(default)]
        reflect_z: bool,
    },
    #[serde(rename = "cartesian_3d")]
    Cartesian3D {
        x: AxisSpec,
        y: AxisSpec,
        z: AxisSpec,
        #[serde(default)]
        reflect: [bool; 3],
        /// 180° rotation about z when crossing x = 0 (index 0) or y = 0 (index 1).
        #[serde(default)]
        rotate_hemisphere: [bool; 2],
        /// 90° rotation about z; only the x, y >= 0 quadrant is simulated.
        #[serde(default)]
        rotate_quadrant: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdfConfig {
    /// 0 = piecewise constant, 1 = linear, 2 = monotone cubic.
    #[serde(default = "default_interpolation_order")]
    pub interpolation_order: u8,
    /// Raw weights below this fraction of the total are dropped on normalization.
    #[serde(default)]
    pub cutoff: f64,
}

impl Default for CdfConfig {
    fn default() -> Self {
        CdfConfig {
            interpolation_order: default_interpolation_order(),
            cutoff: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Frequency bins of the escape spectrum. Falls back to `frequency_axis`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nu: Option<AxisSpec>,
    #[serde(default = "default_angular_bins")]
    pub n_mu: usize,
    #[serde(default = "default_angular_bins")]
    pub n_phi: usize,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        SpectrumConfig {
            nu: None,
            n_mu: default_angular_bins(),
            n_phi: default_angular_bins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomWalkConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Scattering optical depth across the zone above which a diffusion step is taken.
    #[serde(default = "default_min_optical_depth")]
    pub min_optical_depth: f64,
    /// Multiplier on the diffusion radius, in (0, 1].
    #[serde(default = "default_sphere_size")]
    pub sphere_size: f64,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        RandomWalkConfig {
            enabled: false,
            min_optical_depth: default_min_optical_depth(),
            sphere_size: default_sphere_size(),
        }
    }
}

/// Process rank and count, injected by the distributed driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankContext {
    #[serde(default)]
    pub rank: usize,
    #[serde(default = "default_nranks")]
    pub nranks: usize,
}

impl Default for RankContext {
    fn default() -> Self {
        RankContext {
            rank: 0,
            nranks: default_nranks(),
        }
    }
}

impl RankContext {
    pub fn new(rank: usize, nranks: usize) -> TransportResult<Self> {
        let ctx = RankContext { rank, nranks };
        ctx.validate()?;
        Ok(ctx)
    }

    /// Rank 0 owns diagnostics output.
    pub fn is_root(&self) -> bool {
        self.rank == 0
    }

    pub fn validate(&self) -> TransportResult<()> {
        if self.nranks == 0 {
            return Err(TransportError::ConfigError(
                "rank.nranks must be >= 1".to_string(),
            ));
        }
        if self.rank >= self.nranks {
            return Err(TransportError::ConfigError(format!(
                "rank.rank must be < nranks, got rank={}, nranks={}",
                self.rank, self.nranks
            )));
        }
        Ok(())
    }
}

fn default_relativistic() -> bool {
    true
}
fn default_interpolation_order() -> u8 {
    1
}
fn default_angular_bins() -> usize {
    1
}
fn default_min_optical_depth() -> f64 {
    100.0
}
fn default_sphere_size() -> f64 {
    1.0
}
fn default_nranks() -> usize {
    1
}

impl AxisSpec {
    /// Shape checks that do not depend on the axis implementation.
    pub fn validate(&self, label: &str) -> TransportResult<()> {
        let finite = |name: &str, v: f64| -> TransportResult<()> {
            if v.is_finite() {
                Ok(())
            } else {
                Err(TransportError::ConfigError(format!(
                    "{label}.{name} must be finite, got {v}"
                )))
            }
        };
        match self {
            AxisSpec::Uniform { start, stop, n } => {
                finite("start", *start)?;
                finite("stop", *stop)?;
                if *n == 0 || stop <= start {
                    return Err(TransportError::ConfigError(format!(
                        "{label} uniform axis needs n > 0 and stop > start, got n={n}, start={start}, stop={stop}"
                    )));
                }
            }
            AxisSpec::Step { start, stop, delta } => {
                finite("start", *start)?;
                finite("stop", *stop)?;
                finite("delta", *delta)?;
                if *delta <= 0.0 || stop <= start {
                    return Err(TransportError::ConfigError(format!(
                        "{label} step axis needs delta > 0 and stop > start, got delta={delta}"
                    )));
                }
            }
            AxisSpec::Edges { min, edges } => {
                finite("min", *min)?;
                if edges.is_empty() {
                    return Err(TransportError::ConfigError(format!(
                        "{label}.edges must not be empty"
                    )));
                }
            }
            AxisSpec::EdgesWithMid { min, edges, mid } => {
                finite("min", *min)?;
                if edges.is_empty() || edges.len() != mid.len() {
                    return Err(TransportError::ConfigError(format!(
                        "{label} needs matching non-empty edges/mid, got {} edges and {} mids",
                        edges.len(),
                        mid.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl GridConfig {
    pub fn validate(&self) -> TransportResult<()> {
        match self {
            GridConfig::Sphere1D { r, .. } => r.validate("grid.r"),
            GridConfig::Cylinder2D { rcyl, z, .. } => {
                rcyl.validate("grid.rcyl")?;
                z.validate("grid.z")
            }
            GridConfig::Cartesian3D {
                x,
                y,
                z,
                reflect,
                rotate_hemisphere,
                rotate_quadrant,
            } => {
                x.validate("grid.x")?;
                y.validate("grid.y")?;
                z.validate("grid.z")?;
                let any_rotation = *rotate_quadrant || rotate_hemisphere.iter().any(|&h| h);
                if (reflect[0] || reflect[1]) && any_rotation {
                    return Err(TransportError::ConfigError(
                        "grid.reflect in x or y cannot be combined with rotations".to_string(),
                    ));
                }
                if *rotate_quadrant && rotate_hemisphere.iter().any(|&h| h) {
                    return Err(TransportError::ConfigError(
                        "grid.rotate_quadrant excludes rotate_hemisphere".to_string(),
                    ));
                }
                if rotate_hemisphere[0] && rotate_hemisphere[1] {
                    return Err(TransportError::ConfigError(
                        "grid.rotate_hemisphere may be set for x or y, not both".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Number of spatial dimensions.
    pub fn dimensionality(&self) -> usize {
        match self {
            GridConfig::Sphere1D { .. } => 1,
            GridConfig::Cylinder2D { .. } => 2,
            GridConfig::Cartesian3D { .. } => 3,
        }
    }
}

impl TransportConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: &str) -> TransportResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> TransportResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TransportResult<()> {
        if self.run_name.trim().is_empty() {
            return Err(TransportError::ConfigError(
                "run_name must not be empty".to_string(),
            ));
        }
        self.grid.validate()?;
        self.frequency_axis.validate("frequency_axis")?;
        if self.cdf.interpolation_order > 2 {
            return Err(TransportError::ConfigError(format!(
                "cdf.interpolation_order must be 0, 1 or 2, got {}",
                self.cdf.interpolation_order
            )));
        }
        if !self.cdf.cutoff.is_finite() || !(0.0..1.0).contains(&self.cdf.cutoff) {
            return Err(TransportError::ConfigError(format!(
                "cdf.cutoff must lie in [0, 1), got {}",
                self.cdf.cutoff
            )));
        }
        if let Some(nu) = &self.spectrum.nu {
            nu.validate("spectrum.nu")?;
        }
        if self.spectrum.n_mu == 0 || self.spectrum.n_phi == 0 {
            return Err(TransportError::ConfigError(format!(
                "spectrum angular bins must be >= 1, got n_mu={}, n_phi={}",
                self.spectrum.n_mu, self.spectrum.n_phi
            )));
        }
        let rw = &self.random_walk;
        if !rw.min_optical_depth.is_finite() || rw.min_optical_depth < 0.0 {
            return Err(TransportError::ConfigError(format!(
                "random_walk.min_optical_depth must be finite and >= 0, got {}",
                rw.min_optical_depth
            )));
        }
        if !rw.sphere_size.is_finite() || rw.sphere_size <= 0.0 || rw.sphere_size > 1.0 {
            return Err(TransportError::ConfigError(format!(
                "random_walk.sphere_size must lie in (0, 1], got {}",
                rw.sphere_size
            )));
        }
        self.rank.validate()
    }

    /// Spectrum frequency bins, defaulting to the transport frequency axis.
    pub fn spectrum_nu_axis(&self) -> &AxisSpec {
        self.spectrum.nu.as_ref().unwrap_or(&self.frequency_axis)
    }
}
