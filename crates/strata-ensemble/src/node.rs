//! Configuration nodes: one per named quantity in the ensemble.
//!
//! A [`ConfigNode`] carries the identity shared by every kind (key,
//! variable class, forward-init flag, observation keys) and a
//! [`NodeKind`] with the kind-specific configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::{ImplType, TypedBuffer, VarClass};
use strata_field::{native, Field, FieldConfig};

use crate::error::EnsembleError;
use crate::gen_data::{read_ascii_values, GenDataConfig};
use crate::gen_kw::GenKwConfig;
use crate::summary::{LoadFail, SummaryConfig};
use crate::surface::SurfaceConfig;

/// Kind-specific configuration.
#[derive(Debug)]
pub enum NodeKind {
    /// A grid property.
    Field(Arc<FieldConfig>),
    /// A group of scalar parameters.
    GenKw(GenKwConfig),
    /// One summary vector.
    Summary(SummaryConfig),
    /// A forward-model result vector.
    GenData(GenDataConfig),
    /// A parameter vector.
    GenParam(GenDataConfig),
    /// A surface parameter.
    Surface(SurfaceConfig),
    /// An ordered group of other nodes.
    Container(Vec<Arc<ConfigNode>>),
}

impl NodeKind {
    /// Implementation-type tag. GEN_PARAM shares the GEN_DATA tag.
    pub fn impl_type(&self) -> ImplType {
        match self {
            Self::Field(_) => ImplType::Field,
            Self::GenKw(_) => ImplType::GenKw,
            Self::Summary(_) => ImplType::Summary,
            Self::GenData(_) | Self::GenParam(_) => ImplType::GenData,
            Self::Surface(_) => ImplType::Surface,
            Self::Container(_) => ImplType::Container,
        }
    }
}

/// One named quantity of the ensemble.
#[derive(Debug)]
pub struct ConfigNode {
    key: String,
    var_class: VarClass,
    forward_init: bool,
    init_file_fmt: Option<String>,
    kind: NodeKind,
    obs_keys: Mutex<Vec<String>>,
}

impl ConfigNode {
    fn new(key: impl Into<String>, var_class: VarClass, forward_init: bool, kind: NodeKind) -> Self {
        Self {
            key: key.into(),
            var_class,
            forward_init,
            init_file_fmt: None,
            kind,
            obs_keys: Mutex::new(Vec::new()),
        }
    }

    /// A field node; the key and variable class come from `config`.
    pub fn field(config: Arc<FieldConfig>, forward_init: bool) -> Self {
        let var_class = config.var_type().var_class();
        Self::new(config.key().to_string(), var_class, forward_init, NodeKind::Field(config))
    }

    /// A GEN_KW parameter group.
    pub fn gen_kw(key: impl Into<String>, config: GenKwConfig, forward_init: bool) -> Self {
        Self::new(key, VarClass::PARAMETER, forward_init, NodeKind::GenKw(config))
    }

    /// A summary vector named by its key.
    pub fn summary(key: impl Into<String>, load_fail: LoadFail) -> Self {
        let key = key.into();
        let config = SummaryConfig::new(key.clone(), load_fail);
        Self::new(key, VarClass::DYNAMIC_RESULT, false, NodeKind::Summary(config))
    }

    /// A GEN_DATA result.
    pub fn gen_data(key: impl Into<String>, config: GenDataConfig) -> Self {
        Self::new(key, VarClass::DYNAMIC_RESULT, false, NodeKind::GenData(config))
    }

    /// A GEN_PARAM parameter.
    pub fn gen_param(key: impl Into<String>, config: GenDataConfig, forward_init: bool) -> Self {
        Self::new(key, VarClass::PARAMETER, forward_init, NodeKind::GenParam(config))
    }

    /// A surface parameter.
    pub fn surface(key: impl Into<String>, config: SurfaceConfig, forward_init: bool) -> Self {
        Self::new(key, VarClass::PARAMETER, forward_init, NodeKind::Surface(config))
    }

    /// A container of already registered nodes.
    pub fn container(key: impl Into<String>, children: Vec<Arc<ConfigNode>>) -> Self {
        Self::new(key, VarClass::PARAMETER, false, NodeKind::Container(children))
    }

    /// Set the init file pattern of a non-field node (`%d` is the member).
    /// Field nodes use the pattern of their [`FieldConfig`].
    pub fn with_init_file(mut self, fmt: impl Into<String>) -> Self {
        self.init_file_fmt = Some(fmt.into());
        self
    }

    /// Unique key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Variable class.
    pub fn var_class(&self) -> VarClass {
        self.var_class
    }

    /// Whether the initial value comes from the forward model's run
    /// directory.
    pub fn forward_init(&self) -> bool {
        self.forward_init
    }

    /// Implementation-type tag.
    pub fn impl_type(&self) -> ImplType {
        self.kind.impl_type()
    }

    /// Kind-specific configuration.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Field configuration of a field node.
    pub fn field_config(&self) -> Option<&Arc<FieldConfig>> {
        match &self.kind {
            NodeKind::Field(c) => Some(c),
            _ => None,
        }
    }

    /// Summary configuration of a summary node.
    pub fn summary_config(&self) -> Option<&SummaryConfig> {
        match &self.kind {
            NodeKind::Summary(c) => Some(c),
            _ => None,
        }
    }

    /// GEN_KW configuration of a GEN_KW node.
    pub fn gen_kw_config(&self) -> Option<&GenKwConfig> {
        match &self.kind {
            NodeKind::GenKw(c) => Some(c),
            _ => None,
        }
    }

    /// Children of a container node.
    pub fn children(&self) -> Option<&[Arc<ConfigNode>]> {
        match &self.kind {
            NodeKind::Container(c) => Some(c),
            _ => None,
        }
    }

    // ── Observations ────────────────────────────────────────────

    /// Attach an observation key; duplicates are ignored.
    pub fn add_obs_key(&self, obs_key: &str) {
        let mut keys = self.obs_keys.lock();
        if !keys.iter().any(|k| k == obs_key) {
            keys.push(obs_key.to_string());
        }
    }

    /// Detach every observation key.
    pub fn clear_obs_keys(&self) {
        self.obs_keys.lock().clear();
    }

    /// Attached observation keys in insertion order.
    pub fn obs_keys(&self) -> Vec<String> {
        self.obs_keys.lock().clone()
    }

    // ── Initialization ──────────────────────────────────────────

    /// Init file for member `iens`, joined to `run_path` when relative.
    pub fn init_file(&self, run_path: &Path, iens: usize) -> Option<PathBuf> {
        match &self.kind {
            NodeKind::Field(c) => c.init_file(run_path, iens),
            _ => {
                let name = self.init_file_fmt.as_deref()?.replace("%d", &iens.to_string());
                Some(run_path.join(name))
            }
        }
    }

    /// Load the initial value of member `iens` from its init file and
    /// encode it as a native storage record.
    pub fn load_initial_record(&self, run_path: &Path, iens: usize) -> Result<Vec<u8>, EnsembleError> {
        let mut record = Vec::new();
        if let NodeKind::Field(config) = &self.kind {
            let mut field = Field::new(Arc::clone(config));
            field.forward_init(run_path, iens)?;
            field.write_to_buffer(&mut record)?;
            return Ok(record);
        }
        let no_loader = || EnsembleError::NoInitLoader {
            key: self.key.clone(),
            kind: self.impl_type().name(),
        };
        let path = self.init_file(run_path, iens).ok_or_else(no_loader)?;
        let values = match &self.kind {
            NodeKind::GenKw(c) => TypedBuffer::Double(c.load_values(&path)?),
            NodeKind::GenParam(_) => TypedBuffer::Double(read_ascii_values(&path)?),
            NodeKind::Surface(_) => {
                TypedBuffer::Float(read_ascii_values(&path)?.into_iter().map(|v| v as f32).collect())
            }
            _ => return Err(no_loader()),
        };
        native::write_record(&mut record, self.impl_type(), values.view())?;
        Ok(record)
    }
}
