//! Sandbox listing filters.

use crate::error::{MetadataError, Result};
use crate::sandbox::PodSandboxMetadata;
use crate::selector::LabelSelector;
use crate::types::{PodSandboxInfo, PodSandboxState};

/// Criteria for [`MetadataStore::list_pod_sandboxes`](crate::MetadataStore::list_pod_sandboxes).
///
/// Every criterion that is set must hold. An empty ID is treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodSandboxFilter {
    /// Exact sandbox ID.
    pub id: Option<String>,
    /// Exact lifecycle state.
    pub state: Option<PodSandboxState>,
    /// Selector evaluated against the sandbox labels.
    pub label_selector: Option<LabelSelector>,
}

impl PodSandboxFilter {
    /// Filter matching a single sandbox ID.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Require the given state.
    pub fn with_state(mut self, state: PodSandboxState) -> Self {
        self.state = Some(state);
        self
    }

    /// Require labels matching `selector`.
    pub fn with_label_selector(mut self, selector: LabelSelector) -> Self {
        self.label_selector = Some(selector);
        self
    }
}

/// Decide whether the sandbox behind `meta` passes `filter`.
///
/// The ID check needs no I/O and runs first; only then is the record loaded
/// to check state and labels. A sandbox that is listed but has no record is
/// reported as [`MetadataError::DataInconsistency`].
pub fn matches_filter<M: PodSandboxMetadata>(
    meta: &M,
    filter: Option<&PodSandboxFilter>,
) -> Result<bool> {
    matches_filter_with(meta, filter, || meta.retrieve())
}

/// [`matches_filter`] with the record loaded by `load` instead of
/// [`PodSandboxMetadata::retrieve`]. `load` runs only if the ID check passes.
pub(crate) fn matches_filter_with<M, L>(
    meta: &M,
    filter: Option<&PodSandboxFilter>,
    load: L,
) -> Result<bool>
where
    M: PodSandboxMetadata,
    L: FnOnce() -> Result<Option<PodSandboxInfo>>,
{
    let Some(filter) = filter else {
        return Ok(true);
    };

    if let Some(id) = filter.id.as_deref() {
        if !id.is_empty() && id != meta.id() {
            return Ok(false);
        }
    }

    let info = load()?
        .ok_or_else(|| MetadataError::DataInconsistency(meta.id().to_string()))?;

    if let Some(state) = filter.state {
        if info.state != state {
            tracing::trace!(sandbox_id = %meta.id(), state = %info.state, "State mismatch");
            return Ok(false);
        }
    }

    if let Some(selector) = &filter.label_selector {
        if !selector.matches(info.labels()) {
            tracing::trace!(sandbox_id = %meta.id(), selector = %selector, "Labels mismatch");
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PodSandboxConfig;
    use std::cell::Cell;

    /// In-memory accessor that counts reads.
    struct FakeMeta {
        id: String,
        info: Option<PodSandboxInfo>,
        reads: Cell<usize>,
    }

    impl FakeMeta {
        fn new(id: &str, state: PodSandboxState, labels: &[(&str, &str)]) -> Self {
            let config = PodSandboxConfig {
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..PodSandboxConfig::default()
            };
            Self {
                id: id.to_string(),
                info: Some(PodSandboxInfo::new(config, state)),
                reads: Cell::new(0),
            }
        }
    }

    impl PodSandboxMetadata for FakeMeta {
        fn id(&self) -> &str {
            &self.id
        }

        fn retrieve(&self) -> Result<Option<PodSandboxInfo>> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.info.clone())
        }

        fn save<F>(&self, _updater: F) -> Result<()>
        where
            F: FnOnce(Option<PodSandboxInfo>) -> Result<Option<PodSandboxInfo>>,
        {
            unreachable!("filters never write")
        }
    }

    fn selector(expr: &str) -> LabelSelector {
        expr.parse().expect("valid selector")
    }

    #[test]
    fn test_no_filter_matches_without_reading() {
        let meta = FakeMeta::new("a", PodSandboxState::Ready, &[]);
        assert!(matches_filter(&meta, None).expect("match"));
        assert_eq!(meta.reads.get(), 0);
    }

    #[test]
    fn test_id_mismatch_short_circuits() {
        let meta = FakeMeta::new("a", PodSandboxState::Ready, &[]);
        let filter = PodSandboxFilter::by_id("zzz");
        assert!(!matches_filter(&meta, Some(&filter)).expect("match"));
        assert_eq!(meta.reads.get(), 0);
    }

    #[test]
    fn test_empty_id_is_ignored() {
        let meta = FakeMeta::new("a", PodSandboxState::Ready, &[]);
        let filter = PodSandboxFilter::by_id("");
        assert!(matches_filter(&meta, Some(&filter)).expect("match"));
        assert_eq!(meta.reads.get(), 1);
    }

    #[test]
    fn test_state_and_selector_are_conjunctive() {
        let a = FakeMeta::new("a", PodSandboxState::Ready, &[("env", "p")]);
        let b = FakeMeta::new("b", PodSandboxState::Ready, &[("env", "d")]);
        let c = FakeMeta::new("c", PodSandboxState::NotReady, &[("env", "p")]);
        let filter = PodSandboxFilter::default()
            .with_state(PodSandboxState::Ready)
            .with_label_selector(selector("env=p"));

        assert!(matches_filter(&a, Some(&filter)).expect("match"));
        assert!(!matches_filter(&b, Some(&filter)).expect("match"));
        assert!(!matches_filter(&c, Some(&filter)).expect("match"));
    }

    #[test]
    fn test_missing_record_is_inconsistent() {
        let mut meta = FakeMeta::new("a", PodSandboxState::Ready, &[]);
        meta.info = None;
        let filter = PodSandboxFilter::default().with_state(PodSandboxState::Ready);

        let err = matches_filter(&meta, Some(&filter)).expect_err("should fail");
        assert!(matches!(err, MetadataError::DataInconsistency(ref id) if id == "a"));
    }

    #[test]
    fn test_selector_on_record_without_config() {
        let mut meta = FakeMeta::new("a", PodSandboxState::Ready, &[]);
        if let Some(info) = meta.info.as_mut() {
            info.config = None;
        }

        let filter = PodSandboxFilter::default().with_label_selector(selector("env!=p"));
        assert!(matches_filter(&meta, Some(&filter)).expect("match"));

        let filter = PodSandboxFilter::default().with_label_selector(selector("env=p"));
        assert!(!matches_filter(&meta, Some(&filter)).expect("match"));
    }
}
