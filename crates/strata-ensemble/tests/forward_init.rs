//! Forward initialization against real run directories.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use strata_core::{ElementType, NodeId};
use strata_ensemble::{
    ConfigNode, EnsembleConfig, EnsembleError, EnsembleStorage, GenKwConfig, LoadFail, LoadStatus,
    MemoryStorage, RunArg, SurfaceConfig,
};
use strata_field::{ExportFormat, ExportTarget, Field, FieldConfig, FieldError, TransformTable};
use strata_test_utils::fixtures::{holey_grid, ramp};
use strata_test_utils::FailingStorage;

fn poro_config() -> Arc<FieldConfig> {
    FieldConfig::builder("PORO", holey_grid())
        .element_type(ElementType::Double)
        .init_file_fmt("poro_%d.grdecl")
        .build()
}

fn registry(poro: &Arc<FieldConfig>) -> EnsembleConfig {
    let mut ens = EnsembleConfig::new();
    ens.add_node(ConfigNode::field(Arc::clone(poro), true));
    ens.add_node(
        ConfigNode::gen_kw(
            "MULT",
            GenKwConfig::new(None, None, vec!["A".into(), "B".into()]),
            true,
        )
        .with_init_file("mult_%d.txt"),
    );
    ens.add_node(ConfigNode::surface("TOP", SurfaceConfig::default(), true).with_init_file("top_%d.txt"));
    ens.add_summary("FOPT", LoadFail::Warn);
    ens
}

fn write_member(run_path: &Path, poro: &Arc<FieldConfig>, iens: usize) {
    let path = run_path.join(format!("poro_{iens}.grdecl"));
    ramp(poro)
        .export(ExportTarget::Path(&path), ExportFormat::Grdecl, false, None)
        .unwrap();
    fs::write(run_path.join(format!("mult_{iens}.txt")), "A 1.5\nB 2.5\n").unwrap();
}

#[test]
fn failures_are_collected_and_the_rest_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let poro = poro_config();
    let ens = registry(&poro);
    write_member(dir.path(), &poro, 0);
    let storage = MemoryStorage::new();

    let outcome = ens.forward_init(&RunArg::new(0, 0, dir.path()), &storage).unwrap();
    assert_eq!(outcome.status, LoadStatus::Failure);
    assert_eq!(outcome.initialized, vec!["MULT", "PORO"]);
    assert_eq!(
        outcome.message,
        format!(
            "File not found: {} - failed to initialize node: TOP\n",
            dir.path().join("top_0.txt").display()
        )
    );

    let record = storage.read_node("PORO", NodeId::new(0, 0)).unwrap();
    let mut field = Field::new(Arc::clone(&poro));
    field.read_from_buffer(&mut record.as_slice()).unwrap();
    assert_eq!(field.iget_f64(3), ramp(&poro).iget_f64(3));
    assert!(!storage.has_node("FOPT", NodeId::new(0, 0)).unwrap());
}

#[test]
fn stored_nodes_are_skipped_on_retry() {
    let dir = tempfile::tempdir().unwrap();
    let poro = poro_config();
    let ens = registry(&poro);
    write_member(dir.path(), &poro, 0);
    let storage = MemoryStorage::new();
    ens.forward_init(&RunArg::new(0, 0, dir.path()), &storage).unwrap();

    fs::write(dir.path().join("top_0.txt"), "10 11 12").unwrap();
    let outcome = ens.forward_init(&RunArg::new(0, 0, dir.path()), &storage).unwrap();
    assert_eq!(outcome.status, LoadStatus::Successful);
    assert_eq!(outcome.initialized, vec!["TOP"]);
    assert!(outcome.message.is_empty());
    assert_eq!(storage.len(), 3);
}

#[test]
fn unreadable_file_reports_generic_failure() {
    let dir = tempfile::tempdir().unwrap();
    let poro = poro_config();
    let ens = registry(&poro);
    write_member(dir.path(), &poro, 0);
    fs::write(dir.path().join("mult_0.txt"), "A 1.5\n").unwrap();
    fs::write(dir.path().join("top_0.txt"), "1 2").unwrap();

    let outcome = ens
        .forward_init(&RunArg::new(0, 0, dir.path()), &MemoryStorage::new())
        .unwrap();
    assert_eq!(outcome.status, LoadStatus::Failure);
    assert_eq!(outcome.message, "Failed to initialize node: MULT\n");
}

#[test]
fn restarted_runs_are_not_initialized() {
    let dir = tempfile::tempdir().unwrap();
    let poro = poro_config();
    let ens = registry(&poro);
    let storage = MemoryStorage::new();
    let outcome = ens.forward_init(&RunArg::new(0, 5, dir.path()), &storage).unwrap();
    assert_eq!(outcome.status, LoadStatus::Successful);
    assert!(storage.is_empty());
}

#[test]
fn non_finite_init_values_abort() {
    let dir = tempfile::tempdir().unwrap();
    let table = TransformTable::new();
    let config = FieldConfig::builder("PERMX", holey_grid())
        .element_type(ElementType::Double)
        .init_file_fmt("permx_%d.grdecl")
        .init_transform(table.get("LN").unwrap().clone())
        .build();
    let zeros = Field::new(Arc::clone(&config));
    zeros
        .export(
            ExportTarget::Path(&dir.path().join("permx_0.grdecl")),
            ExportFormat::Grdecl,
            false,
            None,
        )
        .unwrap();
    let mut ens = EnsembleConfig::new();
    ens.add_node(ConfigNode::field(config, true));

    let err = ens
        .forward_init(&RunArg::new(0, 0, dir.path()), &MemoryStorage::new())
        .unwrap_err();
    assert!(matches!(err, EnsembleError::Field(FieldError::NonFinite { .. })));
}

#[test]
fn storage_failure_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let poro = poro_config();
    let ens = registry(&poro);
    write_member(dir.path(), &poro, 0);
    let storage = FailingStorage::new(1);

    let err = ens.forward_init(&RunArg::new(0, 0, dir.path()), &storage).unwrap_err();
    assert!(matches!(err, EnsembleError::Storage(_)));
    assert!(err.is_fatal());
    assert_eq!(storage.write_attempts(), 2);
}

#[test]
fn ensemble_results_are_ordered_by_member() {
    let root = tempfile::tempdir().unwrap();
    let poro = poro_config();
    let ens = registry(&poro);
    let mut run_args = Vec::new();
    for iens in [2, 0, 1] {
        let run_path = root.path().join(format!("realization-{iens}"));
        fs::create_dir(&run_path).unwrap();
        write_member(&run_path, &poro, iens);
        if iens != 1 {
            fs::write(run_path.join(format!("top_{iens}.txt")), "5 6").unwrap();
        }
        run_args.push(RunArg::new(iens, 0, run_path));
    }
    let storage = MemoryStorage::new();

    let results = ens.forward_init_ensemble(&run_args, &storage);
    let outcomes: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    let members: Vec<_> = outcomes.iter().map(|o| o.iens).collect();
    assert_eq!(members, vec![0, 1, 2]);
    assert_eq!(outcomes[0].status, LoadStatus::Successful);
    assert_eq!(outcomes[1].status, LoadStatus::Failure);
    assert_eq!(outcomes[2].status, LoadStatus::Successful);
    assert_eq!(storage.len(), 8);
    assert_eq!(storage.keys_for_member(1), vec!["MULT", "PORO"]);
}

#[test]
fn worker_count_does_not_change_results() {
    let root = tempfile::tempdir().unwrap();
    let poro = poro_config();
    let ens = registry(&poro);
    let mut run_args = Vec::new();
    for iens in (0..5).rev() {
        let run_path = root.path().join(format!("realization-{iens}"));
        fs::create_dir(&run_path).unwrap();
        write_member(&run_path, &poro, iens);
        fs::write(run_path.join(format!("top_{iens}.txt")), "5 6").unwrap();
        run_args.push(RunArg::new(iens, 0, run_path));
    }

    for workers in [0, 1, 2, 64] {
        let storage = MemoryStorage::new();
        let results = ens.forward_init_ensemble_with(&run_args, &storage, workers);
        let members: Vec<_> = results.iter().map(|r| r.as_ref().unwrap().iens).collect();
        assert_eq!(members, vec![0, 1, 2, 3, 4], "{workers} workers");
        assert!(results
            .iter()
            .all(|r| r.as_ref().unwrap().status == LoadStatus::Successful));
        assert_eq!(storage.len(), 15);
    }
    assert!(ens.forward_init_ensemble_with(&[], &MemoryStorage::new(), 4).is_empty());
}
