//! The ensemble configuration registry.
//!
//! [`EnsembleConfig`] owns every [`ConfigNode`] keyed by name. It is
//! filled during configuration loading through `&mut self` methods, then
//! shared read-only between worker threads. The one mutation allowed after
//! loading, lazy creation of summary nodes through
//! [`get_or_create_summary_node`](EnsembleConfig::get_or_create_summary_node),
//! takes the internal write lock.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;
use strata_core::{ImplType, VarClass};
use tracing::debug;

use crate::gen_kw::DEFAULT_TAG_FORMAT;
use crate::matcher::{has_wildcard, SummaryKeyMatcher};
use crate::node::ConfigNode;
use crate::refcase::SummaryRefcase;
use crate::summary::LoadFail;

/// Separator between a node key and its index key in user keys.
pub const USER_KEY_JOIN: &str = ":";

const CONTAINER_KEY_PREFIX: &str = "ensemble_config_random";

/// A user key resolved against the registry.
#[derive(Clone, Debug)]
pub struct ResolvedKey {
    /// The matched node.
    pub node: Arc<ConfigNode>,
    /// The part of the user key after the node key, if any.
    pub index_key: Option<String>,
}

#[derive(Debug)]
struct Registry {
    nodes: BTreeMap<String, Arc<ConfigNode>>,
    have_forward_init: bool,
    matcher: SummaryKeyMatcher,
    gen_kw_format: String,
    rng: ChaCha8Rng,
}

impl Registry {
    fn insert(&mut self, node: ConfigNode) -> Arc<ConfigNode> {
        let key = node.key().to_string();
        if self.nodes.contains_key(&key) {
            panic!("a node with key {key} is already registered");
        }
        if let Some(gen_kw) = node.gen_kw_config() {
            gen_kw.set_tag_format(&self.gen_kw_format);
        }
        self.have_forward_init |= node.forward_init();
        debug!(key = %key, kind = %node.impl_type(), forward_init = node.forward_init(), "registered node");
        let node = Arc::new(node);
        self.nodes.insert(key, Arc::clone(&node));
        node
    }

    fn add_summary(
        &mut self,
        key: &str,
        load_fail: LoadFail,
        refcase: Option<&dyn SummaryRefcase>,
    ) -> Option<Arc<ConfigNode>> {
        if has_wildcard(key) {
            match refcase {
                Some(refcase) => {
                    for concrete in refcase.matching_keys(key) {
                        self.add_summary(&concrete, load_fail, None);
                    }
                }
                None => debug!(pattern = key, "no reference case, summary pattern not expanded"),
            }
            return None;
        }
        match self.nodes.get(key) {
            Some(node) => {
                let Some(summary) = node.summary_config() else {
                    panic!(
                        "ensemble key {key} already exists with type {}, can not add it as SUMMARY",
                        node.impl_type()
                    );
                };
                summary.update_load_fail(load_fail);
                Some(Arc::clone(node))
            }
            None => Some(self.insert(ConfigNode::summary(key, load_fail))),
        }
    }

    fn random_container_key(&mut self) -> String {
        loop {
            let key = format!("{CONTAINER_KEY_PREFIX}{:08x}", self.rng.next_u32());
            if !self.nodes.contains_key(&key) {
                return key;
            }
        }
    }
}

/// Registry of every node in the ensemble.
pub struct EnsembleConfig {
    inner: RwLock<Registry>,
    refcase: Option<Arc<dyn SummaryRefcase>>,
}

impl EnsembleConfig {
    /// Empty registry without a reference case.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Registry {
                nodes: BTreeMap::new(),
                have_forward_init: false,
                matcher: SummaryKeyMatcher::new(),
                gen_kw_format: DEFAULT_TAG_FORMAT.to_string(),
                rng: ChaCha8Rng::seed_from_u64(0x5eed_ca5e),
            }),
            refcase: None,
        }
    }

    /// Use `refcase` to expand wildcard summary keys.
    pub fn with_refcase(mut self, refcase: Arc<dyn SummaryRefcase>) -> Self {
        self.refcase = Some(refcase);
        self
    }

    /// Reference case, if any.
    pub fn refcase(&self) -> Option<&Arc<dyn SummaryRefcase>> {
        self.refcase.as_ref()
    }

    // ── Loading ─────────────────────────────────────────────────

    /// Register `node`.
    ///
    /// # Panics
    ///
    /// If a node with the same key is already registered.
    pub fn add_node(&mut self, node: ConfigNode) -> Arc<ConfigNode> {
        self.inner.get_mut().insert(node)
    }

    /// Register a summary vector, or raise the load-fail policy of an
    /// existing one.
    ///
    /// A wildcard key is expanded through the reference case and each
    /// concrete key registered; the pattern itself never is. Without a
    /// reference case a wildcard key registers nothing. Returns the node
    /// for a concrete key.
    ///
    /// # Panics
    ///
    /// If `key` is registered with another kind.
    pub fn add_summary(&mut self, key: &str, load_fail: LoadFail) -> Option<Arc<ConfigNode>> {
        let refcase = self.refcase.as_deref();
        self.inner.get_mut().add_summary(key, load_fail, refcase)
    }

    /// [`add_summary`](Self::add_summary) for a key referenced by an
    /// observation; the key is also registered with the summary matcher.
    pub fn add_summary_observation(&mut self, key: &str, load_fail: LoadFail) -> Option<Arc<ConfigNode>> {
        let node = self.add_summary(key, load_fail);
        self.inner.get_mut().matcher.add_summary_key(key);
        node
    }

    /// A `SUMMARY` configuration entry: register `key` with the matcher and
    /// add it silently.
    pub fn init_summary_full(&mut self, key: &str) {
        self.add_summary(key, LoadFail::Silent);
        self.inner.get_mut().matcher.add_summary_key(key);
    }

    /// Register a container of already registered nodes. Without a key a
    /// unique one is generated.
    ///
    /// # Panics
    ///
    /// If a child is not registered, or the key is taken.
    pub fn add_container(&mut self, key: Option<&str>, children: &[&str]) -> Arc<ConfigNode> {
        let reg = self.inner.get_mut();
        let key = match key {
            Some(k) => k.to_string(),
            None => reg.random_container_key(),
        };
        let children = children
            .iter()
            .map(|child| match reg.nodes.get(*child) {
                Some(node) => Arc::clone(node),
                None => panic!("container {key}: node {child} must be registered before it is added"),
            })
            .collect();
        reg.insert(ConfigNode::container(key, children))
    }

    /// Set the GEN_KW tag format of the registry and every GEN_KW node.
    pub fn set_gen_kw_format(&mut self, format: &str) {
        let reg = self.inner.get_mut();
        reg.gen_kw_format = format.to_string();
        for node in reg.nodes.values() {
            if let Some(gen_kw) = node.gen_kw_config() {
                gen_kw.set_tag_format(format);
            }
        }
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Whether `key` is registered.
    pub fn has_key(&self, key: &str) -> bool {
        self.inner.read().nodes.contains_key(key)
    }

    /// The node registered as `key`.
    ///
    /// # Panics
    ///
    /// If `key` is not registered. Use [`has_key`](Self::has_key) or
    /// [`user_get_node`](Self::user_get_node) for keys from user input.
    pub fn get_node(&self, key: &str) -> Arc<ConfigNode> {
        match self.inner.read().nodes.get(key) {
            Some(node) => Arc::clone(node),
            None => panic!("ensemble config has no node with key {key}"),
        }
    }

    /// The summary node `key`, created with [`LoadFail::Silent`] if absent.
    ///
    /// Safe to call while other threads read the registry.
    ///
    /// # Panics
    ///
    /// If `key` is a wildcard pattern or registered with another kind.
    pub fn get_or_create_summary_node(&self, key: &str) -> Arc<ConfigNode> {
        if let Some(node) = self.inner.read().nodes.get(key) {
            if node.summary_config().is_some() {
                return Arc::clone(node);
            }
        }
        match self.inner.write().add_summary(key, LoadFail::Silent, None) {
            Some(node) => node,
            None => panic!("can not create a summary node for pattern {key}"),
        }
    }

    /// Resolve a user key such as `PORO:1,4,7` or `WWCT:OP_1`.
    ///
    /// Tries the shortest `:`-joined prefix first and returns the first
    /// registered node, with the rest of the key as index key.
    ///
    /// ```
    /// use strata_ensemble::{ConfigNode, EnsembleConfig, LoadFail};
    ///
    /// let mut ens = EnsembleConfig::new();
    /// ens.add_node(ConfigNode::summary("WWCT:OP_1", LoadFail::Silent));
    /// let hit = ens.user_get_node("WWCT:OP_1").unwrap();
    /// assert_eq!(hit.node.key(), "WWCT:OP_1");
    /// assert_eq!(hit.index_key, None);
    /// assert!(ens.user_get_node("WWCT").is_none());
    /// ```
    pub fn user_get_node(&self, full_key: &str) -> Option<ResolvedKey> {
        let segments: SmallVec<[&str; 4]> = full_key.split(USER_KEY_JOIN).collect();
        let reg = self.inner.read();
        for n in 1..=segments.len() {
            let candidate = segments[..n].join(USER_KEY_JOIN);
            if let Some(node) = reg.nodes.get(&candidate) {
                let index_key = (n < segments.len()).then(|| segments[n..].join(USER_KEY_JOIN));
                return Some(ResolvedKey {
                    node: Arc::clone(node),
                    index_key,
                });
            }
        }
        None
    }

    /// Attach an observation key to node `key`.
    ///
    /// # Panics
    ///
    /// If `key` is not registered.
    pub fn add_obs_key(&self, key: &str, obs_key: &str) {
        self.get_node(key).add_obs_key(obs_key);
    }

    /// Detach observation keys from every node.
    pub fn clear_obs_keys(&self) {
        for node in self.inner.read().nodes.values() {
            node.clear_obs_keys();
        }
    }

    /// Current GEN_KW tag format.
    pub fn gen_kw_format(&self) -> String {
        self.inner.read().gen_kw_format.clone()
    }

    /// Whether any registered node is initialized by the forward model.
    pub fn have_forward_init(&self) -> bool {
        self.inner.read().have_forward_init
    }

    /// Summary keys and patterns requested by the configuration.
    pub fn summary_key_matcher(&self) -> MappedRwLockReadGuard<'_, SummaryKeyMatcher> {
        RwLockReadGuard::map(self.inner.read(), |reg| &reg.matcher)
    }

    // ── Bulk queries ────────────────────────────────────────────

    /// Every node, ordered by key.
    pub fn nodes(&self) -> Vec<Arc<ConfigNode>> {
        self.inner.read().nodes.values().cloned().collect()
    }

    /// Every key, sorted.
    pub fn keylist(&self) -> Vec<String> {
        self.inner.read().nodes.keys().cloned().collect()
    }

    /// Keys of nodes whose variable class intersects `mask`, sorted.
    pub fn keylist_from_var_type(&self, mask: VarClass) -> Vec<String> {
        self.keys_where(|node| node.var_class().intersects(mask))
    }

    /// Keys of nodes of implementation type `impl_type`, sorted.
    pub fn keylist_from_impl_type(&self, impl_type: ImplType) -> Vec<String> {
        self.keys_where(|node| node.impl_type() == impl_type)
    }

    fn keys_where(&self, pred: impl Fn(&ConfigNode) -> bool) -> Vec<String> {
        self.inner
            .read()
            .nodes
            .iter()
            .filter(|(_, node)| pred(node))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Whether any node has implementation type `impl_type`.
    pub fn has_impl_type(&self, impl_type: ImplType) -> bool {
        self.inner
            .read()
            .nodes
            .values()
            .any(|node| node.impl_type() == impl_type)
    }

    /// Whether simulator summary output must be loaded.
    pub fn require_summary(&self) -> bool {
        self.has_impl_type(ImplType::Summary)
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Whether no node is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnsembleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg = self.inner.read();
        f.debug_struct("EnsembleConfig")
            .field("nodes", &reg.nodes.keys().collect::<Vec<_>>())
            .field("have_forward_init", &reg.have_forward_init)
            .field("has_refcase", &self.refcase.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gen_data::GenDataConfig;
    use crate::gen_kw::GenKwConfig;

    #[test]
    fn keys_are_sorted_and_unique() {
        let mut ens = EnsembleConfig::new();
        ens.add_node(ConfigNode::summary("WOPR:P2", LoadFail::Silent));
        ens.add_node(ConfigNode::summary("FOPT", LoadFail::Silent));
        ens.add_node(ConfigNode::gen_data("RFT", GenDataConfig::default()));
        assert_eq!(ens.keylist(), vec!["FOPT", "RFT", "WOPR:P2"]);
        assert_eq!(ens.keylist_from_impl_type(ImplType::GenData), vec!["RFT"]);
        assert_eq!(ens.len(), 3);
        assert!(ens.require_summary());
        assert!(!ens.has_impl_type(ImplType::Field));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_key_panics() {
        let mut ens = EnsembleConfig::new();
        ens.add_node(ConfigNode::summary("FOPT", LoadFail::Silent));
        ens.add_node(ConfigNode::gen_data("FOPT", GenDataConfig::default()));
    }

    #[test]
    #[should_panic(expected = "no node with key")]
    fn missing_node_panics() {
        EnsembleConfig::new().get_node("PORO");
    }

    #[test]
    fn resolves_shortest_prefix() {
        let mut ens = EnsembleConfig::new();
        ens.add_node(ConfigNode::gen_data("PRESSURE", GenDataConfig::default()));
        let hit = ens.user_get_node("PRESSURE:1,4,7").unwrap();
        assert_eq!(hit.node.key(), "PRESSURE");
        assert_eq!(hit.index_key.as_deref(), Some("1,4,7"));
        let hit = ens.user_get_node("PRESSURE:a:b").unwrap();
        assert_eq!(hit.index_key.as_deref(), Some("a:b"));
        assert!(ens.user_get_node("SWAT:1,1,1").is_none());
    }

    #[test]
    fn summary_readd_keeps_stricter_policy() {
        let mut ens = EnsembleConfig::new();
        ens.add_summary("FOPT", LoadFail::Exit);
        let node = ens.add_summary("FOPT", LoadFail::Warn).unwrap();
        assert_eq!(node.summary_config().unwrap().load_fail(), LoadFail::Exit);
        assert_eq!(ens.len(), 1);
    }

    #[test]
    #[should_panic(expected = "can not add it as SUMMARY")]
    fn summary_kind_conflict_panics() {
        let mut ens = EnsembleConfig::new();
        ens.add_node(ConfigNode::gen_data("FOPT", GenDataConfig::default()));
        ens.add_summary("FOPT", LoadFail::Silent);
    }

    #[test]
    fn wildcard_without_refcase_registers_nothing() {
        let mut ens = EnsembleConfig::new();
        assert!(ens.add_summary("WWCT:*", LoadFail::Warn).is_none());
        assert!(ens.is_empty());
        ens.init_summary_full("WWCT:*");
        assert!(ens.is_empty());
        assert!(ens.summary_key_matcher().matches("WWCT:A1"));
    }

    #[test]
    fn generated_container_keys_are_unique() {
        let mut ens = EnsembleConfig::new();
        ens.add_node(ConfigNode::gen_data("A", GenDataConfig::default()));
        let c1 = ens.add_container(None, &["A"]);
        let c2 = ens.add_container(None, &["A"]);
        assert!(c1.key().starts_with("ensemble_config_random"));
        assert_ne!(c1.key(), c2.key());
        assert_eq!(c1.children().unwrap()[0].key(), "A");
        assert_eq!(c1.impl_type(), ImplType::Container);
    }

    #[test]
    #[should_panic(expected = "must be registered")]
    fn container_child_must_exist() {
        let mut ens = EnsembleConfig::new();
        ens.add_container(Some("GROUP"), &["MISSING"]);
    }

    #[test]
    fn gen_kw_format_reaches_every_node() {
        let mut ens = EnsembleConfig::new();
        ens.set_gen_kw_format("[%s]");
        let a = ens.add_node(ConfigNode::gen_kw("A", GenKwConfig::new(None, None, vec![]), false));
        assert_eq!(a.gen_kw_config().unwrap().tag("X"), "[X]");
        ens.set_gen_kw_format("{%s}");
        assert_eq!(a.gen_kw_config().unwrap().tag("X"), "{X}");
        assert_eq!(ens.gen_kw_format(), "{%s}");
    }

    #[test]
    fn var_type_mask() {
        let mut ens = EnsembleConfig::new();
        ens.add_node(ConfigNode::gen_param("P", GenDataConfig::default(), true));
        ens.add_node(ConfigNode::gen_data("D", GenDataConfig::default()));
        assert_eq!(ens.keylist_from_var_type(VarClass::PARAMETER), vec!["P"]);
        assert_eq!(
            ens.keylist_from_var_type(VarClass::PARAMETER | VarClass::DYNAMIC_RESULT),
            vec!["D", "P"]
        );
        assert!(ens.have_forward_init());
    }
}
