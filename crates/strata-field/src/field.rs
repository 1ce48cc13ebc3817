//! One member's values of one grid property.
//!
//! A [`Field`] owns (or borrows, see [`Field::with_shared_buffer`]) a packed
//! value array laid out as its [`FieldConfig`] prescribes. Loading goes
//! through the codecs in this crate; exporting works on a scoped snapshot
//! so output transforms and truncation never touch the stored values.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use strata_core::{BufferMut, BufferRef, ImplType, TypedBuffer};
use strata_grid::IndexOrder;
use tracing::{debug, warn};

use crate::config::{FieldConfig, FieldVarType};
use crate::ecl_kw::{EclKwReader, EclKwWriter};
use crate::error::FieldError;
use crate::format::{ExportFormat, ImportFormat};
use crate::grdecl::{read_grdecl, write_grdecl};
use crate::native;
use crate::remap::{self, ExportFill};
use crate::roff::{self, RoffWriter};

// ── Storage ─────────────────────────────────────────────────────

#[derive(Debug)]
enum Storage<'a> {
    Owned(TypedBuffer),
    Shared(BufferMut<'a>),
}

impl Storage<'_> {
    fn view(&self) -> BufferRef<'_> {
        match self {
            Self::Owned(b) => b.view(),
            Self::Shared(b) => b.view(),
        }
    }

    fn view_mut(&mut self) -> BufferMut<'_> {
        match self {
            Self::Owned(b) => b.view_mut(),
            Self::Shared(b) => b.reborrow(),
        }
    }
}

/// Values handed to an exporter: the stored values themselves, or a
/// processed snapshot that lives only for one export call.
enum ExportData<'f> {
    Normal(BufferRef<'f>),
    Snapshot(TypedBuffer),
}

impl ExportData<'_> {
    fn view(&self) -> BufferRef<'_> {
        match self {
            Self::Normal(v) => *v,
            Self::Snapshot(b) => b.view(),
        }
    }
}

/// Where an export goes.
pub enum ExportTarget<'w> {
    /// A file, created (with parent directories) or truncated.
    Path(&'w Path),
    /// A restart stream opened by the caller; the keyword is appended.
    Restart(&'w mut dyn Write),
}

// ── Field ───────────────────────────────────────────────────────

/// Values of one grid property for one ensemble member.
#[derive(Debug)]
pub struct Field<'a> {
    config: Arc<FieldConfig>,
    storage: Storage<'a>,
}

impl Field<'static> {
    /// Allocate a zero-filled field.
    pub fn new(config: Arc<FieldConfig>) -> Self {
        let storage = TypedBuffer::zeroed(config.element_type(), config.data_size());
        Self {
            config,
            storage: Storage::Owned(storage),
        }
    }
}

impl<'a> Field<'a> {
    /// Wrap caller-owned memory. Only the first
    /// [`data_size`](FieldConfig::data_size) elements are used.
    ///
    /// # Panics
    ///
    /// If `buffer` has another element type than the configuration or is
    /// shorter than the configured data size.
    pub fn with_shared_buffer(config: Arc<FieldConfig>, buffer: BufferMut<'a>) -> Self {
        assert_eq!(
            buffer.element_type(),
            config.element_type(),
            "shared buffer for field {} has the wrong element type",
            config.key()
        );
        let found = buffer.len();
        let Some(buffer) = buffer.into_prefix(config.data_size()) else {
            panic!(
                "shared buffer for field {} holds {found} elements, {} required",
                config.key(),
                config.data_size()
            );
        };
        Self {
            config,
            storage: Storage::Shared(buffer),
        }
    }

    /// Shared configuration.
    pub fn config(&self) -> &Arc<FieldConfig> {
        &self.config
    }

    /// Whether the values live in caller-owned memory.
    pub fn is_shared(&self) -> bool {
        matches!(self.storage, Storage::Shared(_))
    }

    /// Stored values.
    pub fn data(&self) -> BufferRef<'_> {
        self.storage.view()
    }

    /// Stored values, mutably.
    pub fn data_mut(&mut self) -> BufferMut<'_> {
        self.storage.view_mut()
    }

    /// Overwrite with the values of `other`.
    ///
    /// # Panics
    ///
    /// If `other` was built from a different configuration instance.
    pub fn copy_from(&mut self, other: &Field<'_>) -> Result<(), FieldError> {
        assert!(
            Arc::ptr_eq(&self.config, &other.config),
            "can not copy field {} from field {} with another configuration",
            self.config.key(),
            other.config.key()
        );
        self.storage.view_mut().copy_from(other.data())?;
        Ok(())
    }

    /// Zero every value.
    pub fn clear(&mut self) {
        self.storage.view_mut().clear();
    }

    // ── Point access ────────────────────────────────────────────

    /// Value at storage index `index` as `f64`.
    pub fn iget_f64(&self, index: usize) -> Option<f64> {
        self.data().get_f64(index)
    }

    /// Value at storage index `index` as `f32`.
    pub fn iget_f32(&self, index: usize) -> Option<f32> {
        self.iget_f64(index).map(|v| v as f32)
    }

    /// Value of cell `(i, j, k)` (0-based), or `None` for a cell that is
    /// not stored.
    pub fn ijk_get_f64(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        let index = self.config.storage_index(i, j, k)?;
        self.iget_f64(index)
    }

    /// Value addressed by a 1-based `"i,j,k"` key, with the output
    /// transform applied. Truncation is not applied.
    ///
    /// An invalid key is logged and yields `None`.
    pub fn user_get(&self, index_key: &str) -> Option<f64> {
        let (i, j, k) = match self.config.parse_user_key(index_key) {
            Ok(ijk) => ijk,
            Err(e) => {
                warn!(field = self.config.key(), index_key, reason = e.code(), "{e}");
                return None;
            }
        };
        let value = self.ijk_get_f64(i, j, k)?;
        Some(match self.config.output_transform() {
            Some(t) => t.apply(value),
            None => value,
        })
    }

    // ── Import ──────────────────────────────────────────────────

    /// Load values from `path`, guessing the format when `format` is
    /// `None`.
    ///
    /// A restart keyword may cover the full grid or exactly the active
    /// cells; GRDECL and ROFF data must cover the full grid.
    pub fn load(&mut self, path: &Path, format: Option<ImportFormat>) -> Result<(), FieldError> {
        let format = match format {
            Some(f) => f,
            None => ImportFormat::guess(path)?,
        };
        debug!(field = self.config.key(), path = %path.display(), ?format, "loading field");
        let file = File::open(path).map_err(|_| FieldError::NotFound {
            path: path.to_path_buf(),
        })?;
        let keyword = self.config.ecl_kw_name().to_string();
        let not_found = || FieldError::KeywordNotFound {
            keyword: keyword.clone(),
            path: path.to_path_buf(),
        };
        match format {
            ImportFormat::Roff => {
                let tags = roff::read_roff(&mut BufReader::new(file))?;
                if let Some(dims) = roff::dimensions(&tags) {
                    if dims != self.config.dims() {
                        return Err(FieldError::SizeMismatch {
                            key: self.config.key().to_string(),
                            expected: self.config.volume(),
                            found: dims.volume(),
                        });
                    }
                }
                let data = roff::parameter(&tags, &keyword).ok_or_else(not_found)?;
                self.import_full(data.view(), IndexOrder::Roff)
            }
            ImportFormat::EclKw => {
                let kw = EclKwReader::new(BufReader::new(file))
                    .find_keyword(&keyword)?
                    .ok_or_else(not_found)?;
                if kw.data.len() == self.config.volume() {
                    self.import_full(kw.data.view(), IndexOrder::Natural)
                } else if kw.data.len() == self.config.data_size() {
                    remap::check_import(kw.data.element_type(), self.config.element_type())?;
                    let packed = kw.data.view().convert(self.config.element_type());
                    self.storage.view_mut().copy_from(packed.view())?;
                    Ok(())
                } else {
                    Err(FieldError::SizeMismatch {
                        key: self.config.key().to_string(),
                        expected: self.config.data_size(),
                        found: kw.data.len(),
                    })
                }
            }
            ImportFormat::Grdecl => {
                let data = read_grdecl(
                    &mut BufReader::new(file),
                    &keyword,
                    self.config.element_type(),
                    self.config.volume(),
                )?
                .ok_or_else(not_found)?;
                self.import_full(data.view(), IndexOrder::Natural)
            }
        }
    }

    fn import_full(&mut self, src: BufferRef<'_>, order: IndexOrder) -> Result<(), FieldError> {
        remap::import_3d(&self.config, src, order, self.storage.view_mut())
    }

    /// Load an init file and apply the init transform.
    ///
    /// Non-finite values after the transform are a fatal
    /// [`FieldError::NonFinite`].
    pub fn initialize(&mut self, path: &Path) -> Result<(), FieldError> {
        self.load(path, None)?;
        let config = Arc::clone(&self.config);
        if let Some(t) = config.init_transform() {
            let mut data = self.storage.view_mut();
            data.apply(|x| t.apply(x))?;
            if !data.all_finite()? {
                return Err(FieldError::NonFinite {
                    key: config.key().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Initial values for member `iens` from the configured init file.
    ///
    /// Parameter fields go through [`initialize`](Self::initialize); general
    /// fields are loaded and the input transform applied.
    pub fn forward_init(&mut self, run_path: &Path, iens: usize) -> Result<(), FieldError> {
        let config = Arc::clone(&self.config);
        let path = config
            .init_file(run_path, iens)
            .ok_or_else(|| FieldError::NoInitFile {
                key: config.key().to_string(),
            })?;
        match config.var_type() {
            FieldVarType::Parameter => self.initialize(&path),
            FieldVarType::General => {
                self.load(&path, None)?;
                if let Some(t) = config.input_transform() {
                    self.storage.view_mut().apply(|x| t.apply(x))?;
                }
                Ok(())
            }
        }
    }

    // ── Export ──────────────────────────────────────────────────

    /// Export in `format` to `target`.
    ///
    /// With `output_transform` set the configured output transform runs on
    /// a snapshot; truncation always does. Full-volume formats keep the
    /// field's element type. Their inactive cells take values from
    /// `init_file` when given, otherwise zero (`-999` for ROFF).
    pub fn export(
        &self,
        target: ExportTarget<'_>,
        format: ExportFormat,
        output_transform: bool,
        init_file: Option<&Path>,
    ) -> Result<(), FieldError> {
        let data = self.export_data(output_transform)?;
        let keyword = self.config.ecl_kw_name();
        match (format, target) {
            (ExportFormat::RestartStream, ExportTarget::Restart(w)) => {
                let mut writer = EclKwWriter::new(w);
                writer.write_keyword(keyword, data.view())?;
                writer.flush()
            }
            (ExportFormat::RestartStream, ExportTarget::Path(_)) => Err(FieldError::ExportTarget {
                format,
                expected: "restart stream",
            }),
            (_, ExportTarget::Restart(_)) => Err(FieldError::ExportTarget {
                format,
                expected: "file path",
            }),
            (ExportFormat::EclKwActiveCells, ExportTarget::Path(path)) => {
                let mut writer = EclKwWriter::new(create_file(path)?);
                writer.write_keyword(keyword, data.view())?;
                writer.flush()
            }
            (ExportFormat::EclKwAllCells, ExportTarget::Path(path)) => {
                let init = self.load_init_fill(init_file)?;
                let full = self.expand(&data, init.as_ref(), IndexOrder::Natural, ExportFill::Zero)?;
                let mut writer = EclKwWriter::new(create_file(path)?);
                writer.write_keyword(keyword, full.view())?;
                writer.flush()
            }
            (ExportFormat::Grdecl, ExportTarget::Path(path)) => {
                let init = self.load_init_fill(init_file)?;
                let full = self.expand(&data, init.as_ref(), IndexOrder::Natural, ExportFill::Zero)?;
                let mut w = create_file(path)?;
                write_grdecl(&mut w, keyword, full.view())?;
                w.flush()?;
                Ok(())
            }
            (ExportFormat::Roff, ExportTarget::Path(path)) => {
                let init = self.load_init_fill(init_file)?;
                let full = self.expand(&data, init.as_ref(), IndexOrder::Roff, ExportFill::RoffInactive)?;
                let mut writer = RoffWriter::new(create_file(path)?, "parameter")?;
                writer.write_dimensions(self.config.dims())?;
                writer.write_parameter(keyword, full.view())?;
                writer.finish()?;
                Ok(())
            }
        }
    }

    /// Values as exported. Truncation applies whether or not the output
    /// transform is requested, so no exported file carries values outside
    /// the configured limits.
    fn export_data(&self, output_transform: bool) -> Result<ExportData<'_>, FieldError> {
        let transform = self.config.output_transform().filter(|_| output_transform);
        let truncation = self.config.truncation();
        if transform.is_none() && !truncation.is_active() {
            return Ok(ExportData::Normal(self.data()));
        }
        let mut snapshot = self.data().to_buffer();
        let mut view = snapshot.view_mut();
        if let Some(t) = transform {
            view.apply(|x| t.apply(x))?;
        }
        view.truncate(&truncation)?;
        Ok(ExportData::Snapshot(snapshot))
    }

    fn load_init_fill(&self, init_file: Option<&Path>) -> Result<Option<Field<'static>>, FieldError> {
        let Some(path) = init_file else {
            return Ok(None);
        };
        let mut fill = Field::new(self.config.full_volume());
        fill.load(path, None)?;
        Ok(Some(fill))
    }

    fn expand(
        &self,
        data: &ExportData<'_>,
        init: Option<&Field<'_>>,
        order: IndexOrder,
        fill: ExportFill,
    ) -> Result<TypedBuffer, FieldError> {
        remap::export_3d(
            &self.config,
            data.view(),
            init.map(|f| f.data()),
            order,
            self.config.element_type(),
            fill,
        )
    }

    /// Write `file` in `run_path` using the configured export format with
    /// the output transform applied. A symlink already at the target is
    /// replaced. For [`ExportFormat::RestartStream`] the keyword goes to
    /// `restart` instead.
    pub fn ecl_write(
        &self,
        run_path: &Path,
        file: &str,
        restart: Option<&mut dyn Write>,
    ) -> Result<(), FieldError> {
        let format = self.config.export_format();
        if format.needs_stream() {
            let Some(w) = restart else {
                return Err(FieldError::ExportTarget {
                    format,
                    expected: "restart stream",
                });
            };
            return self.export(ExportTarget::Restart(w), format, true, None);
        }
        let path = run_path.join(file);
        if fs::symlink_metadata(&path).is_ok_and(|m| m.file_type().is_symlink()) {
            fs::remove_file(&path)?;
        }
        self.export(ExportTarget::Path(&path), format, true, None)
    }

    // ── Native records ──────────────────────────────────────────

    /// Serialize for ensemble storage.
    pub fn write_to_buffer(&self, w: &mut dyn Write) -> Result<(), FieldError> {
        native::write_record(w, ImplType::Field, self.data())
    }

    /// Deserialize a record written by [`write_to_buffer`](Self::write_to_buffer).
    pub fn read_from_buffer(&mut self, r: &mut dyn Read) -> Result<(), FieldError> {
        let key = self.config.key().to_string();
        native::read_record_into(r, ImplType::Field, &key, self.storage.view_mut())
    }
}

fn create_file(path: &Path) -> Result<BufWriter<File>, FieldError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformTable;
    use strata_core::{Element, ElementType, Truncation};
    use strata_grid::ActnumGrid;

    fn grid() -> Arc<ActnumGrid> {
        Arc::new(ActnumGrid::new(2, 2, 2, &[1, 0, 1, 1, 1, 1, 0, 1]).unwrap())
    }

    fn config() -> Arc<FieldConfig> {
        FieldConfig::builder("PERMX", grid()).build()
    }

    fn filled(config: &Arc<FieldConfig>) -> Field<'static> {
        let mut f = Field::new(Arc::clone(config));
        for idx in 0..config.data_size() {
            f.data_mut().set_f64(idx, idx as f64 + 1.0);
        }
        f
    }

    #[test]
    fn new_field_is_zeroed() {
        let f = Field::new(config());
        assert_eq!(f.data(), BufferRef::Float(&[0.0; 6]));
        assert!(!f.is_shared());
    }

    #[test]
    fn shared_buffer_uses_prefix() {
        let mut raw = vec![7.0f32; 10];
        {
            let mut f = Field::with_shared_buffer(config(), f32::wrap_mut(&mut raw));
            assert!(f.is_shared());
            assert_eq!(f.data().len(), 6);
            f.clear();
        }
        assert_eq!(&raw[..6], &[0.0; 6]);
        assert_eq!(&raw[6..], &[7.0; 4]);
    }

    #[test]
    #[should_panic(expected = "required")]
    fn shared_buffer_too_small_panics() {
        let mut raw = vec![0.0f32; 5];
        let _ = Field::with_shared_buffer(config(), f32::wrap_mut(&mut raw));
    }

    #[test]
    #[should_panic(expected = "wrong element type")]
    fn shared_buffer_of_other_type_panics() {
        let mut raw = vec![0.0f64; 6];
        let _ = Field::with_shared_buffer(config(), f64::wrap_mut(&mut raw));
    }

    #[test]
    fn copy_between_instances_of_one_config() {
        let c = config();
        let src = filled(&c);
        let mut dst = Field::new(Arc::clone(&c));
        dst.copy_from(&src).unwrap();
        assert_eq!(dst.data(), src.data());
    }

    #[test]
    #[should_panic(expected = "another configuration")]
    fn copy_between_configs_panics() {
        let src = Field::new(config());
        let mut dst = Field::new(config());
        let _ = dst.copy_from(&src);
    }

    #[test]
    fn point_readers_widen_every_type() {
        let c = FieldConfig::builder("FIPNUM", grid())
            .element_type(ElementType::Int)
            .build();
        let f = filled(&c);
        assert_eq!(f.iget_f64(2), Some(3.0));
        assert_eq!(f.iget_f32(5), Some(6.0));
        assert_eq!(f.iget_f64(6), None);
        // (1,0,0) is inactive, (1,1,0) is the third active cell.
        assert_eq!(f.ijk_get_f64(1, 0, 0), None);
        assert_eq!(f.ijk_get_f64(1, 1, 0), Some(3.0));
    }

    #[test]
    fn user_get_applies_output_transform_only() {
        let table = TransformTable::default();
        let c = FieldConfig::builder("PERMX", grid())
            .output_transform(table.get("EXP").unwrap().clone())
            .truncation(Truncation {
                min: None,
                max: Some(0.5),
            })
            .build();
        let f = filled(&c);
        let v = f.user_get("1,1,1").unwrap();
        assert!((v - 1.0f64.exp()).abs() < 1e-6);
        assert_eq!(f.user_get("2,1,1"), None);
        assert_eq!(f.user_get("3,1,1"), None);
        assert_eq!(f.user_get("x"), None);
    }

    #[test]
    fn export_snapshot_leaves_values_untouched() {
        let c = FieldConfig::builder("PERMX", grid())
            .truncation(Truncation {
                min: Some(2.0),
                max: Some(4.0),
            })
            .build();
        let f = filled(&c);
        let data = f.export_data(true).unwrap();
        assert!(matches!(data, ExportData::Snapshot(_)));
        assert_eq!(
            data.view(),
            BufferRef::Float(&[2.0, 2.0, 3.0, 4.0, 4.0, 4.0])
        );
        assert_eq!(f.data(), BufferRef::Float(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        assert!(matches!(filled(&config()).export_data(true).unwrap(), ExportData::Normal(_)));
    }

    #[test]
    fn restart_stream_needs_matching_target() {
        let f = filled(&config());
        let err = f
            .export(
                ExportTarget::Path(Path::new("never-written")),
                ExportFormat::RestartStream,
                false,
                None,
            )
            .unwrap_err();
        assert!(err.is_fatal());

        let mut stream = Vec::new();
        f.export(
            ExportTarget::Restart(&mut stream),
            ExportFormat::RestartStream,
            false,
            None,
        )
        .unwrap();
        let kw = EclKwReader::new(stream.as_slice())
            .read_keyword()
            .unwrap()
            .unwrap();
        assert_eq!(kw.name, "PERMX");
        assert_eq!(kw.data.len(), 6);

        let mut other = Vec::new();
        let err = f
            .export(ExportTarget::Restart(&mut other), ExportFormat::Grdecl, false, None)
            .unwrap_err();
        assert!(matches!(err, FieldError::ExportTarget { expected: "file path", .. }));
    }

    #[test]
    fn native_record_round_trip() {
        let c = config();
        let src = filled(&c);
        let mut buf = Vec::new();
        src.write_to_buffer(&mut buf).unwrap();
        let mut dst = Field::new(Arc::clone(&c));
        dst.read_from_buffer(&mut buf.as_slice()).unwrap();
        assert_eq!(dst.data(), src.data());
    }

    #[test]
    fn forward_init_without_init_file() {
        let mut f = Field::new(config());
        let err = f.forward_init(Path::new("/tmp"), 0).unwrap_err();
        assert!(matches!(err, FieldError::NoInitFile { .. }));
        assert!(!err.is_fatal());
    }
}
