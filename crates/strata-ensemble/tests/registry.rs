//! Registry behavior across loading, lookup and concurrent use.

use std::fs;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use strata_core::{ElementType, ImplType, VarClass};
use strata_ensemble::{
    ConfigContent, ConfigNode, EnsembleConfig, GenDataConfig, GenKwConfig, LoadContext, LoadFail,
};
use strata_test_utils::fixtures::{field_config, holey_grid, ramp};
use strata_test_utils::MockRefcase;

fn refcase() -> Arc<MockRefcase> {
    Arc::new(MockRefcase::new([
        "WWCT:OP_1",
        "WWCT:OP_2",
        "WOPR:OP_1",
        "FOPT",
    ]))
}

#[test]
fn wildcard_summary_expands_through_refcase() {
    let mut ens = EnsembleConfig::new().with_refcase(refcase());
    assert!(ens.add_summary_observation("WWCT:*", LoadFail::Warn).is_none());
    assert_eq!(ens.keylist(), vec!["WWCT:OP_1", "WWCT:OP_2"]);
    assert!(!ens.has_key("WWCT:*"));
    for key in ens.keylist() {
        let node = ens.get_node(&key);
        assert_eq!(node.summary_config().unwrap().load_fail(), LoadFail::Warn);
    }
    let matcher = ens.summary_key_matcher();
    assert!(matcher.matches("WWCT:OP_9"));
    assert!(!matcher.is_required("WWCT:*"));
}

#[test]
fn observed_concrete_keys_are_required() {
    let mut ens = EnsembleConfig::new();
    let node = ens.add_summary_observation("FOPT", LoadFail::Exit).unwrap();
    assert_eq!(node.key(), "FOPT");
    assert!(ens.summary_key_matcher().is_required("FOPT"));
}

#[test]
fn user_keys_resolve_to_field_values() {
    let config = field_config("PORO", ElementType::Double);
    let mut ens = EnsembleConfig::new();
    ens.add_node(ConfigNode::field(Arc::clone(&config), false));
    ens.add_summary("WOPR:OP_1", LoadFail::Silent);

    let hit = ens.user_get_node("PORO:1,1,1").unwrap();
    assert_eq!(hit.node.impl_type(), ImplType::Field);
    let field = ramp(hit.node.field_config().unwrap());
    assert_eq!(field.user_get(hit.index_key.as_deref().unwrap()), Some(0.5));

    let hit = ens.user_get_node("WOPR:OP_1").unwrap();
    assert_eq!(hit.node.key(), "WOPR:OP_1");
    assert!(hit.index_key.is_none());
    assert!(ens.user_get_node("WOPR:OP_2").is_none());
}

#[test]
fn lazy_summary_creation_is_race_free() {
    let ens = EnsembleConfig::new();
    let created: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| ens.get_or_create_summary_node("FGPT")))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(ens.len(), 1);
    assert!(created.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn observation_keys_attach_and_clear() {
    let mut ens = EnsembleConfig::new();
    ens.add_summary("FOPT", LoadFail::Silent);
    ens.add_node(ConfigNode::gen_data("RFT", GenDataConfig::default()));
    ens.add_obs_key("FOPT", "FOPT_OBS");
    ens.add_obs_key("RFT", "RFT_1");
    assert_eq!(ens.get_node("FOPT").obs_keys(), vec!["FOPT_OBS"]);
    ens.clear_obs_keys();
    assert!(ens.get_node("FOPT").obs_keys().is_empty());
    assert!(ens.get_node("RFT").obs_keys().is_empty());
}

#[test]
fn content_builds_every_node_kind() {
    let dir = tempfile::tempdir().unwrap();
    let params = dir.path().join("mult.params");
    fs::write(&params, "MULTX UNIFORM 0 1\nMULTZ LOGUNIF 0.1 1\n").unwrap();
    let pred_params = dir.path().join("pred.params");
    fs::write(&pred_params, "RATE UNIFORM 100 200\n").unwrap();

    let text = format!(
        "GEN_KW_TAG_FORMAT __%s__\n\
         GEN_KW MULT mult.tmpl mult.txt {params} FORWARD_INIT:TRUE INIT_FILES:mult_%d.txt\n\
         GEN_DATA RFT RESULT_FILE:rft_%d.txt REPORT_STEPS:10,20\n\
         SUMMARY FOPT WWCT:*\n\
         SUMMARY WOPR:OP_1\n\
         FIELD PORO PARAMETER poro.roff INIT_FILES:poro_%d.grdecl MIN:0.01 MAX:0.4\n\
         SCHEDULE_PREDICTION_FILE schedule/pred.tmpl PARAMETERS:{pred}\n\
         CONTAINER GROUP MULT PORO\n",
        params = params.display(),
        pred = pred_params.display(),
    );
    let content = ConfigContent::from_lines(&text);
    let ctx = LoadContext {
        grid: Some(holey_grid()),
        refcase: Some(refcase()),
        ..LoadContext::default()
    };
    let ens = EnsembleConfig::from_content(&content, &ctx).unwrap();

    assert_eq!(
        ens.keylist(),
        vec!["FOPT", "GROUP", "MULT", "PORO", "PRED", "RFT", "WOPR:OP_1", "WWCT:OP_1", "WWCT:OP_2"]
    );
    assert_eq!(ens.gen_kw_format(), "__%s__");
    let mult = ens.get_node("MULT");
    let gen_kw: &GenKwConfig = mult.gen_kw_config().unwrap();
    assert_eq!(gen_kw.parameters(), ["MULTX", "MULTZ"]);
    assert_eq!(gen_kw.tag("MULTX"), "__MULTX__");
    assert!(mult.forward_init());
    assert!(ens.have_forward_init());

    let pred = ens.get_node("PRED");
    assert_eq!(pred.gen_kw_config().unwrap().output_file(), Some("pred.tmpl"));

    let poro = ens.get_node("PORO");
    let config = poro.field_config().unwrap();
    assert_eq!(config.export_format(), strata_field::ExportFormat::Roff);
    assert_eq!(config.truncation().max, Some(0.4));

    assert_eq!(
        ens.keylist_from_var_type(VarClass::PARAMETER),
        vec!["GROUP", "MULT", "PORO", "PRED"]
    );
    assert_eq!(ens.keylist_from_impl_type(ImplType::Summary).len(), 4);
    assert!(ens.summary_key_matcher().is_required("WOPR:OP_1"));
}

#[test]
fn prediction_file_without_parameters_adds_nothing() {
    let content = ConfigContent::from_lines("SCHEDULE_PREDICTION_FILE pred.tmpl\n");
    let ens = EnsembleConfig::from_content(&content, &LoadContext::default()).unwrap();
    assert!(ens.is_empty());
}

proptest! {
    #[test]
    fn forward_init_flag_is_any_node(flags in prop::collection::vec(any::<bool>(), 0..12)) {
        let mut ens = EnsembleConfig::new();
        for (n, flag) in flags.iter().enumerate() {
            ens.add_node(ConfigNode::gen_param(format!("P{n}"), GenDataConfig::default(), *flag));
        }
        prop_assert_eq!(ens.have_forward_init(), flags.iter().any(|f| *f));
        prop_assert_eq!(ens.len(), flags.len());
    }
}
