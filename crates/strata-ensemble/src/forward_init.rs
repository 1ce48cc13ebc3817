//! Forward initialization: load the initial value of every forward-init
//! node from the forward model's run directory into ensemble storage.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;

use strata_core::NodeId;
use tracing::{debug, info, warn};

use crate::error::EnsembleError;
use crate::registry::EnsembleConfig;
use crate::storage::EnsembleStorage;

/// One realization's run: member index, first report step and directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunArg {
    /// Ensemble member.
    pub iens: usize,
    /// First report step of the run.
    pub step1: usize,
    /// Run directory.
    pub run_path: PathBuf,
}

impl RunArg {
    /// A run of member `iens` starting at `step1` in `run_path`.
    pub fn new(iens: usize, step1: usize, run_path: impl Into<PathBuf>) -> Self {
        Self {
            iens,
            step1,
            run_path: run_path.into(),
        }
    }
}

/// Result of loading one realization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    /// Every node was loaded or already present.
    #[default]
    Successful,
    /// At least one node failed to load.
    Failure,
}

impl LoadStatus {
    /// Numeric status code: 0 for success, 2 for failure.
    pub fn code(self) -> u8 {
        match self {
            Self::Successful => 0,
            Self::Failure => 2,
        }
    }
}

/// Outcome of forward-initializing one member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardInitOutcome {
    /// Ensemble member.
    pub iens: usize,
    /// Overall status.
    pub status: LoadStatus,
    /// One line per failed node.
    pub message: String,
    /// Keys written to storage by this call.
    pub initialized: Vec<String>,
}

impl ForwardInitOutcome {
    fn new(iens: usize) -> Self {
        Self {
            iens,
            status: LoadStatus::Successful,
            message: String::new(),
            initialized: Vec::new(),
        }
    }
}

impl EnsembleConfig {
    /// Load every forward-init node of `run_arg.iens` that storage does not
    /// hold yet at report step 0.
    ///
    /// Only runs starting at report step 0 are initialized. Recoverable
    /// node failures are collected in the outcome and the remaining nodes
    /// are still processed; storage failures and fatal field errors abort.
    pub fn forward_init(
        &self,
        run_arg: &RunArg,
        storage: &dyn EnsembleStorage,
    ) -> Result<ForwardInitOutcome, EnsembleError> {
        let mut outcome = ForwardInitOutcome::new(run_arg.iens);
        if run_arg.step1 != 0 {
            return Ok(outcome);
        }
        let id = NodeId::new(0, run_arg.iens);
        for node in self.nodes().into_iter().filter(|n| n.forward_init()) {
            if storage.has_node(node.key(), id)? {
                continue;
            }
            match node.load_initial_record(&run_arg.run_path, run_arg.iens) {
                Ok(record) => {
                    storage.write_node(node.key(), id, &record)?;
                    outcome.initialized.push(node.key().to_string());
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(key = node.key(), iens = run_arg.iens, error = %e, "forward init failed");
                    outcome.status = LoadStatus::Failure;
                    let init_file = node.init_file(&run_arg.run_path, run_arg.iens);
                    match init_file {
                        Some(path) if !path.exists() => outcome.message.push_str(&format!(
                            "File not found: {} - failed to initialize node: {}\n",
                            path.display(),
                            node.key()
                        )),
                        _ => outcome
                            .message
                            .push_str(&format!("Failed to initialize node: {}\n", node.key())),
                    }
                }
            }
        }
        info!(
            iens = run_arg.iens,
            status = ?outcome.status,
            initialized = outcome.initialized.len(),
            "forward init finished"
        );
        Ok(outcome)
    }

    /// [`forward_init`](Self::forward_init) for many members in parallel on
    /// at most one worker per available CPU. Results are ordered by member
    /// index.
    pub fn forward_init_ensemble(
        &self,
        run_args: &[RunArg],
        storage: &dyn EnsembleStorage,
    ) -> Vec<Result<ForwardInitOutcome, EnsembleError>> {
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        self.forward_init_ensemble_with(run_args, storage, workers)
    }

    /// [`forward_init_ensemble`](Self::forward_init_ensemble) with an
    /// explicit worker count. Zero is treated as one.
    pub fn forward_init_ensemble_with(
        &self,
        run_args: &[RunArg],
        storage: &dyn EnsembleStorage,
        workers: usize,
    ) -> Vec<Result<ForwardInitOutcome, EnsembleError>> {
        let workers = workers.clamp(1, run_args.len().max(1));
        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        for slot in 0..run_args.len() {
            let _ = job_tx.send(slot);
        }
        drop(job_tx);
        let (tx, rx) = crossbeam_channel::unbounded();
        thread::scope(|s| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let tx = tx.clone();
                s.spawn(move || {
                    for slot in jobs.iter() {
                        let _ = tx.send((slot, self.forward_init(&run_args[slot], storage)));
                    }
                });
            }
        });
        drop(tx);
        debug!(members = run_args.len(), workers, "ensemble forward init finished");
        let mut results: Vec<_> = rx.iter().collect();
        results.sort_by_key(|(slot, _)| run_args[*slot].iens);
        results.into_iter().map(|(_, r)| r).collect()
    }
}
