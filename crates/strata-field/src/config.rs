//! Shared, immutable configuration of a grid property.
//!
//! One [`FieldConfig`] describes a property for the whole ensemble: the
//! grid it lives on, how its values are stored, which transforms apply and
//! where it is written. It is built once during configuration loading and
//! shared as `Arc<FieldConfig>` by every [`Field`](crate::Field) instance.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_core::{ElementType, Truncation, VarClass};
use strata_grid::{Dims, GridGeometry};

use crate::error::UserKeyError;
use crate::format::ExportFormat;
use crate::transform::FieldTransform;

/// Role of a field in the workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldVarType {
    /// Parameter written to the simulator and updated by the analysis.
    Parameter,
    /// Property produced by the forward model and loaded back.
    General,
}

impl FieldVarType {
    /// Variable class of nodes of this kind.
    pub fn var_class(self) -> VarClass {
        match self {
            Self::Parameter => VarClass::PARAMETER,
            Self::General => VarClass::DYNAMIC_RESULT,
        }
    }
}

/// Configuration shared by every instance of one grid property.
#[derive(Clone, Debug)]
pub struct FieldConfig {
    key: String,
    ecl_kw_name: String,
    var_type: FieldVarType,
    grid: Arc<dyn GridGeometry>,
    element_type: ElementType,
    keep_inactive_cells: bool,
    init_transform: Option<FieldTransform>,
    output_transform: Option<FieldTransform>,
    input_transform: Option<FieldTransform>,
    truncation: Truncation,
    export_format: ExportFormat,
    output_file: Option<String>,
    input_file: Option<String>,
    init_file_fmt: Option<String>,
}

impl FieldConfig {
    /// Start building a configuration for `key` on `grid`.
    pub fn builder(key: impl Into<String>, grid: Arc<dyn GridGeometry>) -> FieldConfigBuilder {
        let key = key.into();
        FieldConfigBuilder {
            config: FieldConfig {
                ecl_kw_name: key.clone(),
                key,
                var_type: FieldVarType::Parameter,
                grid,
                element_type: ElementType::Float,
                keep_inactive_cells: false,
                init_transform: None,
                output_transform: None,
                input_transform: None,
                truncation: Truncation::NONE,
                export_format: ExportFormat::EclKwAllCells,
                output_file: None,
                input_file: None,
                init_file_fmt: None,
            },
            export_format_set: false,
        }
    }

    /// A sibling configuration on the same grid storing the full volume,
    /// without transforms. Used to read init files that provide values for
    /// inactive cells.
    pub fn full_volume(&self) -> Arc<FieldConfig> {
        Arc::new(FieldConfig {
            keep_inactive_cells: true,
            init_transform: None,
            output_transform: None,
            input_transform: None,
            truncation: Truncation::NONE,
            ..self.clone()
        })
    }

    /// Storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Keyword name used in restart, GRDECL and ROFF files.
    pub fn ecl_kw_name(&self) -> &str {
        &self.ecl_kw_name
    }

    /// Parameter or general field.
    pub fn var_type(&self) -> FieldVarType {
        self.var_type
    }

    /// Grid the field lives on.
    pub fn grid(&self) -> &Arc<dyn GridGeometry> {
        &self.grid
    }

    /// Grid dimensions.
    pub fn dims(&self) -> Dims {
        self.grid.dims()
    }

    /// Storage element type.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Whether storage spans the full volume rather than the active cells.
    pub fn keep_inactive_cells(&self) -> bool {
        self.keep_inactive_cells
    }

    /// Number of stored values.
    pub fn data_size(&self) -> usize {
        if self.keep_inactive_cells {
            self.grid.volume()
        } else {
            self.grid.active_count()
        }
    }

    /// Number of stored bytes.
    pub fn byte_size(&self) -> usize {
        self.data_size() * self.element_type.size_of()
    }

    /// Total number of grid cells.
    pub fn volume(&self) -> usize {
        self.grid.volume()
    }

    /// Packed active index of `(i, j, k)`.
    pub fn active_index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        self.grid.active_index(i, j, k)
    }

    /// Position of `(i, j, k)` in this configuration's storage: the global
    /// index when inactive cells are kept, otherwise the active index.
    pub fn storage_index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        if self.keep_inactive_cells {
            Some(self.grid.global_index(i, j, k))
        } else {
            self.grid.active_index(i, j, k)
        }
    }

    /// Transform applied in place right after loading an init file.
    pub fn init_transform(&self) -> Option<&FieldTransform> {
        self.init_transform.as_ref()
    }

    /// Transform applied to a snapshot at export time.
    pub fn output_transform(&self) -> Option<&FieldTransform> {
        self.output_transform.as_ref()
    }

    /// Transform applied when a general field is loaded from the forward model.
    pub fn input_transform(&self) -> Option<&FieldTransform> {
        self.input_transform.as_ref()
    }

    /// Export-time clamping.
    pub fn truncation(&self) -> Truncation {
        self.truncation
    }

    /// Whether an export with output processing changes any value.
    pub fn has_output_processing(&self) -> bool {
        self.output_transform.is_some() || self.truncation.is_active()
    }

    /// Format used by [`Field::ecl_write`](crate::Field::ecl_write).
    pub fn export_format(&self) -> ExportFormat {
        self.export_format
    }

    /// File the field is written to in the run directory.
    pub fn output_file(&self) -> Option<&str> {
        self.output_file.as_deref()
    }

    /// File a general field is read from in the run directory.
    pub fn input_file(&self) -> Option<&str> {
        self.input_file.as_deref()
    }

    /// Init file name pattern; `%d` is replaced by the member index.
    pub fn init_file_fmt(&self) -> Option<&str> {
        self.init_file_fmt.as_deref()
    }

    /// Init file for member `iens`, joined to `run_path` when relative.
    ///
    /// Falls back to the input file for general fields.
    pub fn init_file(&self, run_path: &Path, iens: usize) -> Option<PathBuf> {
        let fmt = self.init_file_fmt.as_deref().or(self.input_file.as_deref())?;
        let name = fmt.replace("%d", &iens.to_string());
        let path = Path::new(&name);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(run_path.join(path))
        }
    }

    /// Parse a 1-based `"i,j,k"` cell key into 0-based indices of an
    /// active cell.
    pub fn parse_user_key(&self, key: &str) -> Result<(usize, usize, usize), UserKeyError> {
        let parts: Vec<&str> = key.split(',').map(str::trim).collect();
        let parsed: Option<Vec<i64>> = if parts.len() == 3 {
            parts.iter().map(|p| p.parse::<i64>().ok()).collect()
        } else {
            None
        };
        let Some(ijk) = parsed else {
            return Err(UserKeyError::Malformed {
                key: key.to_string(),
            });
        };
        let (i, j, k) = (ijk[0], ijk[1], ijk[2]);
        let dims = self.dims();
        let in_range = |v: i64, n: usize| v >= 1 && (v as u64) <= n as u64;
        if !(in_range(i, dims.nx) && in_range(j, dims.ny) && in_range(k, dims.nz)) {
            return Err(UserKeyError::OutOfRange { i, j, k });
        }
        let (i0, j0, k0) = ((i - 1) as usize, (j - 1) as usize, (k - 1) as usize);
        if self.grid.active_index(i0, j0, k0).is_none() {
            return Err(UserKeyError::Inactive {
                i: i0 + 1,
                j: j0 + 1,
                k: k0 + 1,
            });
        }
        Ok((i0, j0, k0))
    }
}

/// Builder for [`FieldConfig`].
#[derive(Debug)]
pub struct FieldConfigBuilder {
    config: FieldConfig,
    export_format_set: bool,
}

impl FieldConfigBuilder {
    /// Keyword name in external files (defaults to the key).
    pub fn ecl_kw_name(mut self, name: impl Into<String>) -> Self {
        self.config.ecl_kw_name = name.into();
        self
    }

    /// Parameter or general field (default parameter).
    pub fn var_type(mut self, var_type: FieldVarType) -> Self {
        self.config.var_type = var_type;
        self
    }

    /// Storage element type (default float32).
    pub fn element_type(mut self, element_type: ElementType) -> Self {
        self.config.element_type = element_type;
        self
    }

    /// Store the full volume instead of only the active cells.
    pub fn keep_inactive_cells(mut self, keep: bool) -> Self {
        self.config.keep_inactive_cells = keep;
        self
    }

    /// Transform applied after loading an init file.
    pub fn init_transform(mut self, t: FieldTransform) -> Self {
        self.config.init_transform = Some(t);
        self
    }

    /// Transform applied at export.
    pub fn output_transform(mut self, t: FieldTransform) -> Self {
        self.config.output_transform = Some(t);
        self
    }

    /// Transform applied when loading forward-model output.
    pub fn input_transform(mut self, t: FieldTransform) -> Self {
        self.config.input_transform = Some(t);
        self
    }

    /// Export-time clamping.
    pub fn truncation(mut self, truncation: Truncation) -> Self {
        self.config.truncation = truncation;
        self
    }

    /// Output file in the run directory. Unless an export format was set
    /// explicitly, the format follows the file extension.
    pub fn output_file(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.export_format_set {
            self.config.export_format = ExportFormat::from_file_name(&name);
        }
        self.config.output_file = Some(name);
        self
    }

    /// Force the export format.
    pub fn export_format(mut self, format: ExportFormat) -> Self {
        self.config.export_format = format;
        self.export_format_set = true;
        self
    }

    /// Input file of a general field.
    pub fn input_file(mut self, name: impl Into<String>) -> Self {
        self.config.input_file = Some(name.into());
        self
    }

    /// Init file pattern (`%d` is replaced by the member index).
    pub fn init_file_fmt(mut self, fmt: impl Into<String>) -> Self {
        self.config.init_file_fmt = Some(fmt.into());
        self
    }

    /// Finish and share.
    pub fn build(self) -> Arc<FieldConfig> {
        Arc::new(self.config)
    }
}
