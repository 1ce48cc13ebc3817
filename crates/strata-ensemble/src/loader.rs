//! Building the registry from parsed configuration content.
//!
//! Keywords are processed in a fixed order so that later items can refer
//! to nodes created by earlier ones: the GEN_KW tag format first, then the
//! node keywords, and CONTAINER last.

use std::path::Path;
use std::sync::Arc;

use strata_core::Truncation;
use strata_field::{FieldConfig, FieldTransform, FieldVarType, TransformTable};
use strata_grid::GridGeometry;
use tracing::{debug, info};

use crate::content::{ConfigContent, ConfigItem, Options};
use crate::error::EnsembleError;
use crate::gen_data::{parse_report_steps, GenDataConfig, GenDataFormat};
use crate::gen_kw::GenKwConfig;
use crate::node::ConfigNode;
use crate::refcase::SummaryRefcase;
use crate::registry::EnsembleConfig;
use crate::surface::SurfaceConfig;

/// Configuration keywords understood by [`EnsembleConfig::from_content`].
pub mod keywords {
    /// `GEN_KW_TAG_FORMAT <format>`
    pub const GEN_KW_TAG_FORMAT: &str = "GEN_KW_TAG_FORMAT";
    /// `GEN_PARAM <key> <output file> [options]`
    pub const GEN_PARAM: &str = "GEN_PARAM";
    /// `GEN_DATA <key> [options]`
    pub const GEN_DATA: &str = "GEN_DATA";
    /// `GEN_KW <key> <template> <output file> <parameter file> [options]`
    pub const GEN_KW: &str = "GEN_KW";
    /// `SURFACE <key> [options]`
    pub const SURFACE: &str = "SURFACE";
    /// `SUMMARY <key> [<key> ...]`
    pub const SUMMARY: &str = "SUMMARY";
    /// `FIELD <key> PARAMETER|GENERAL <output file> [<input file>] [options]`
    pub const FIELD: &str = "FIELD";
    /// `SCHEDULE_PREDICTION_FILE <template> [options]`
    pub const SCHEDULE_PREDICTION_FILE: &str = "SCHEDULE_PREDICTION_FILE";
    /// `CONTAINER <key> <child> [<child> ...]`
    pub const CONTAINER: &str = "CONTAINER";
}

use keywords::*;

/// Key of the GEN_KW node created by `SCHEDULE_PREDICTION_FILE`.
pub const PREDICTION_KEY: &str = "PRED";

/// External inputs needed while loading.
#[derive(Clone, Default)]
pub struct LoadContext {
    /// Grid for FIELD nodes.
    pub grid: Option<Arc<dyn GridGeometry>>,
    /// Reference case for wildcard SUMMARY keys.
    pub refcase: Option<Arc<dyn SummaryRefcase>>,
    /// Named transforms for FIELD options.
    pub transforms: TransformTable,
}

impl EnsembleConfig {
    /// Build a registry from configuration content.
    pub fn from_content(content: &ConfigContent, ctx: &LoadContext) -> Result<Self, EnsembleError> {
        let mut ens = Self::new();
        if let Some(refcase) = &ctx.refcase {
            ens = ens.with_refcase(Arc::clone(refcase));
        }
        if let Some(format) = content.last_value(GEN_KW_TAG_FORMAT) {
            ens.set_gen_kw_format(format);
        }
        for item in content.items(GEN_PARAM) {
            ens.add_node(gen_param_node(item)?);
        }
        for item in content.items(GEN_DATA) {
            ens.add_node(gen_data_node(item)?);
        }
        for item in content.items(GEN_KW) {
            ens.add_node(gen_kw_node(item)?);
        }
        for item in content.items(SURFACE) {
            ens.add_node(surface_node(item)?);
        }
        for item in content.items(SUMMARY) {
            for key in &item.args {
                ens.init_summary_full(key);
            }
        }
        for item in content.items(FIELD) {
            ens.add_node(field_node(item, ctx)?);
        }
        if let Some(item) = content.items(SCHEDULE_PREDICTION_FILE).last() {
            if let Some(node) = prediction_node(item)? {
                ens.add_node(node);
            }
        }
        for item in content.items(CONTAINER) {
            let key = item.arg(0, "container key")?;
            let children: Vec<&str> = item.args[1..].iter().map(String::as_str).collect();
            ens.add_container(Some(key), &children);
        }
        info!(nodes = ens.len(), forward_init = ens.have_forward_init(), "ensemble configuration loaded");
        Ok(ens)
    }
}

fn invalid(keyword: &str, detail: impl Into<String>) -> EnsembleError {
    EnsembleError::InvalidConfig {
        keyword: keyword.to_string(),
        detail: detail.into(),
    }
}

fn data_format(keyword: &str, options: &Options, key: &str) -> Result<GenDataFormat, EnsembleError> {
    match options.get(key) {
        None => Ok(GenDataFormat::default()),
        Some(raw) => raw.parse().map_err(|detail: String| invalid(keyword, detail)),
    }
}

fn with_init_files(node: ConfigNode, options: &Options) -> ConfigNode {
    match options.get("INIT_FILES") {
        Some(fmt) => node.with_init_file(fmt),
        None => node,
    }
}

fn gen_param_node(item: &ConfigItem) -> Result<ConfigNode, EnsembleError> {
    let key = item.arg(0, "key")?;
    let output_file = item.arg(1, "output file")?;
    let options = item.options(2);
    let config = GenDataConfig {
        output_file: Some(output_file.to_string()),
        input_format: data_format(GEN_PARAM, &options, "INPUT_FORMAT")?,
        output_format: data_format(GEN_PARAM, &options, "OUTPUT_FORMAT")?,
        ..GenDataConfig::default()
    };
    let node = ConfigNode::gen_param(key, config, options.get_bool("FORWARD_INIT"));
    Ok(with_init_files(node, &options))
}

fn gen_data_node(item: &ConfigItem) -> Result<ConfigNode, EnsembleError> {
    let key = item.arg(0, "key")?;
    let options = item.options(1);
    let result_file = options
        .get("RESULT_FILE")
        .ok_or_else(|| invalid(GEN_DATA, format!("{key}: RESULT_FILE is required")))?;
    let report_steps = match options.get("REPORT_STEPS") {
        Some(raw) => parse_report_steps(GEN_DATA, raw)?,
        None => Vec::new(),
    };
    let config = GenDataConfig {
        result_file: Some(result_file.to_string()),
        input_format: data_format(GEN_DATA, &options, "INPUT_FORMAT")?,
        report_steps,
        ..GenDataConfig::default()
    };
    Ok(ConfigNode::gen_data(key, config))
}

fn gen_kw_node(item: &ConfigItem) -> Result<ConfigNode, EnsembleError> {
    let key = item.arg(0, "key")?;
    let template = item.arg(1, "template file")?;
    let output_file = item.arg(2, "output file")?;
    let parameter_file = item.arg(3, "parameter file")?;
    let options = item.options(4);
    let parameters = GenKwConfig::read_parameter_names(Path::new(parameter_file))?;
    let config = GenKwConfig::new(Some(template.to_string()), Some(output_file.to_string()), parameters);
    let node = ConfigNode::gen_kw(key, config, options.get_bool("FORWARD_INIT"));
    Ok(with_init_files(node, &options))
}

fn surface_node(item: &ConfigItem) -> Result<ConfigNode, EnsembleError> {
    let key = item.arg(0, "key")?;
    let options = item.options(1);
    let required = |name: &str| {
        options
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| invalid(SURFACE, format!("{key}: {name} is required")))
    };
    let init_files = required("INIT_FILES")?;
    let config = SurfaceConfig {
        base_surface: Some(required("BASE_SURFACE")?),
        output_file: Some(required("OUTPUT_FILE")?),
    };
    Ok(ConfigNode::surface(key, config, options.get_bool("FORWARD_INIT")).with_init_file(init_files))
}

fn transform(
    ctx: &LoadContext,
    key: &str,
    options: &Options,
    option: &str,
) -> Result<Option<FieldTransform>, EnsembleError> {
    let Some(name) = options.get(option) else {
        return Ok(None);
    };
    match ctx.transforms.get(name) {
        Some(t) => Ok(Some(t.clone())),
        None => Err(EnsembleError::UnknownTransform {
            key: key.to_string(),
            name: name.to_string(),
        }),
    }
}

fn field_node(item: &ConfigItem, ctx: &LoadContext) -> Result<ConfigNode, EnsembleError> {
    let key = item.arg(0, "key")?;
    let var_type = match item.arg(1, "field type")? {
        "PARAMETER" => FieldVarType::Parameter,
        "GENERAL" => FieldVarType::General,
        other => return Err(invalid(FIELD, format!("{key}: unknown field type {other}"))),
    };
    let output_file = item.arg(2, "output file")?;
    let grid = ctx.grid.clone().ok_or_else(|| EnsembleError::MissingGrid {
        key: key.to_string(),
    })?;

    let mut builder = FieldConfig::builder(key, grid)
        .var_type(var_type)
        .output_file(output_file);
    let options = match var_type {
        FieldVarType::Parameter => item.options(3),
        FieldVarType::General => {
            builder = builder.input_file(item.arg(3, "input file")?);
            item.options(4)
        }
    };
    if let Some(fmt) = options.get("INIT_FILES") {
        builder = builder.init_file_fmt(fmt);
    }
    builder = builder.truncation(Truncation {
        min: options.get_f64(FIELD, "MIN")?,
        max: options.get_f64(FIELD, "MAX")?,
    });
    if let Some(t) = transform(ctx, key, &options, "INIT_TRANSFORM")? {
        builder = builder.init_transform(t);
    }
    if let Some(t) = transform(ctx, key, &options, "OUTPUT_TRANSFORM")? {
        builder = builder.output_transform(t);
    }
    if let Some(t) = transform(ctx, key, &options, "INPUT_TRANSFORM")? {
        builder = builder.input_transform(t);
    }
    debug!(key, ?var_type, "field configured");
    Ok(ConfigNode::field(builder.build(), options.get_bool("FORWARD_INIT")))
}

/// The prediction schedule only becomes a node when it has parameters.
fn prediction_node(item: &ConfigItem) -> Result<Option<ConfigNode>, EnsembleError> {
    let template = item.arg(0, "template file")?;
    let options = item.options(1);
    let Some(parameter_file) = options.get("PARAMETERS") else {
        return Ok(None);
    };
    let parameters = GenKwConfig::read_parameter_names(Path::new(parameter_file))?;
    let output_file = Path::new(template)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| invalid(SCHEDULE_PREDICTION_FILE, format!("{template} is not a file name")))?;
    let config = GenKwConfig::new(Some(template.to_string()), Some(output_file), parameters);
    let node = ConfigNode::gen_kw(PREDICTION_KEY, config, false);
    Ok(Some(with_init_files(node, &options)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ImplType;
    use strata_grid::ActnumGrid;

    fn grid() -> Option<Arc<dyn GridGeometry>> {
        Some(Arc::new(ActnumGrid::all_active(3, 2, 1).unwrap()))
    }

    #[test]
    fn field_options() {
        let mut content = ConfigContent::new();
        content.push(
            FIELD,
            ["PERMX", "PARAMETER", "permx.grdecl", "INIT_FILES:permx_%d.grdecl", "MIN:1", "OUTPUT_TRANSFORM:EXP"],
        );
        let ctx = LoadContext {
            grid: grid(),
            ..LoadContext::default()
        };
        let ens = EnsembleConfig::from_content(&content, &ctx).unwrap();
        let node = ens.get_node("PERMX");
        let config = node.field_config().unwrap();
        assert_eq!(config.truncation().min, Some(1.0));
        assert_eq!(config.truncation().max, None);
        assert_eq!(config.output_transform().unwrap().name(), "EXP");
        assert_eq!(config.init_file_fmt(), Some("permx_%d.grdecl"));
        assert!(!node.forward_init());
    }

    #[test]
    fn general_field_takes_an_input_file() {
        let mut content = ConfigContent::new();
        content.push(FIELD, ["SGAS", "GENERAL", "sgas.grdecl", "sgas_in.grdecl", "FORWARD_INIT:TRUE"]);
        let ctx = LoadContext {
            grid: grid(),
            ..LoadContext::default()
        };
        let ens = EnsembleConfig::from_content(&content, &ctx).unwrap();
        let node = ens.get_node("SGAS");
        assert_eq!(node.field_config().unwrap().input_file(), Some("sgas_in.grdecl"));
        assert!(node.forward_init());
        assert!(ens.have_forward_init());
    }

    #[test]
    fn field_errors() {
        let mut content = ConfigContent::new();
        content.push(FIELD, ["PORO", "PARAMETER", "poro.grdecl"]);
        let err = EnsembleConfig::from_content(&content, &LoadContext::default()).unwrap_err();
        assert!(matches!(err, EnsembleError::MissingGrid { .. }));

        let mut content = ConfigContent::new();
        content.push(FIELD, ["PORO", "PARAMETER", "poro.grdecl", "INIT_TRANSFORM:SQUARE"]);
        let ctx = LoadContext {
            grid: grid(),
            ..LoadContext::default()
        };
        let err = EnsembleConfig::from_content(&content, &ctx).unwrap_err();
        assert!(matches!(err, EnsembleError::UnknownTransform { ref name, .. } if name == "SQUARE"));

        let mut content = ConfigContent::new();
        content.push(FIELD, ["PORO", "DYNAMIC", "poro.grdecl"]);
        assert!(EnsembleConfig::from_content(&content, &ctx).is_err());
    }

    #[test]
    fn gen_data_requires_result_file() {
        let mut content = ConfigContent::new();
        content.push(GEN_DATA, ["RFT", "REPORT_STEPS:10"]);
        assert!(matches!(
            EnsembleConfig::from_content(&content, &LoadContext::default()),
            Err(EnsembleError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn containers_come_last() {
        let mut content = ConfigContent::new();
        content.push(CONTAINER, ["GROUP", "RFT", "MULT"]);
        content.push(GEN_DATA, ["RFT", "RESULT_FILE:rft_%d.txt", "REPORT_STEPS:1,5"]);
        content.push(GEN_PARAM, ["MULT", "mult.txt", "INIT_FILES:mult_%d.txt", "INPUT_FORMAT:ASCII"]);
        let ens = EnsembleConfig::from_content(&content, &LoadContext::default()).unwrap();
        assert_eq!(ens.keylist(), vec!["GROUP", "MULT", "RFT"]);
        assert_eq!(ens.get_node("GROUP").children().unwrap().len(), 2);
        assert_eq!(ens.keylist_from_impl_type(ImplType::GenData), vec!["MULT", "RFT"]);
    }

    #[test]
    fn surface_needs_all_files() {
        let mut content = ConfigContent::new();
        content.push(SURFACE, ["TOP", "INIT_FILES:top_%d.irap", "OUTPUT_FILE:top.irap"]);
        let err = EnsembleConfig::from_content(&content, &LoadContext::default()).unwrap_err();
        assert!(err.to_string().contains("BASE_SURFACE"));
    }
}
