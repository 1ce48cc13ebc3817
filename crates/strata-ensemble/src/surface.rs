//! Surface nodes: a 2D grid of depth values on a base surface.

/// Configuration of one surface parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceConfig {
    /// Surface defining the geometry.
    pub base_surface: Option<String>,
    /// File written to the run directory.
    pub output_file: Option<String>,
}
