//! Pod sandbox records: per-ID accessor and filtered listing.

use crate::bucket;
use crate::error::{MetadataError, Result};
use crate::filter::{self, PodSandboxFilter};
use crate::store::MetadataStore;
use crate::types::PodSandboxInfo;
use redb::{ReadTransaction, WriteTransaction};

/// Access to the stored record of a single pod sandbox.
pub trait PodSandboxMetadata {
    /// ID of the sandbox this accessor is bound to.
    fn id(&self) -> &str;

    /// Load the stored record.
    ///
    /// Returns [`MetadataError::NotFound`] if the sandbox has no storage
    /// region at all, and `Ok(None)` if the region exists but holds no
    /// record yet.
    fn retrieve(&self) -> Result<Option<PodSandboxInfo>>;

    /// Create, modify or delete the record in one transaction.
    ///
    /// `updater` receives the current record (`None` if there is none) and
    /// returns the record to store, or `None` to delete the sandbox. If it
    /// returns an error, nothing is written and that error is returned
    /// unchanged.
    fn save<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(Option<PodSandboxInfo>) -> Result<Option<PodSandboxInfo>>;
}

/// [`PodSandboxMetadata`] backed by a [`MetadataStore`].
///
/// Constructing one performs no I/O; every call opens its own transaction.
#[derive(Debug, Clone)]
pub struct PodSandboxMeta {
    store: MetadataStore,
    id: String,
}

impl PodSandboxMeta {
    fn ensure_id(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(MetadataError::InvalidArgument(
                "pod sandbox ID cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Load the stored record as seen by `txn`.
    pub(crate) fn retrieve_in(&self, txn: &ReadTransaction) -> Result<Option<PodSandboxInfo>> {
        self.ensure_id()?;
        let Some(data) = bucket::read_payload(txn, &self.id)? else {
            tracing::trace!(sandbox_id = %self.id, "Sandbox region is empty");
            return Ok(None);
        };
        let mut info = decode(&self.id, &data)?;
        info.pod_id = self.id.clone();
        tracing::trace!(sandbox_id = %self.id, state = %info.state, "Sandbox retrieved");
        Ok(Some(info))
    }

    /// Read-modify-write step of [`save`](PodSandboxMetadata::save).
    ///
    /// Leaves committing or aborting `txn` to the caller.
    fn apply<F>(&self, txn: &WriteTransaction, updater: F) -> Result<()>
    where
        F: FnOnce(Option<PodSandboxInfo>) -> Result<Option<PodSandboxInfo>>,
    {
        let mut region = bucket::ensure_region(txn, &self.id)?;
        let current = match bucket::get_payload(&region)? {
            Some(data) => {
                let mut info = decode(&self.id, &data)?;
                info.pod_id = self.id.clone();
                Some(info)
            }
            None => None,
        };

        match updater(current)? {
            None => {
                drop(region);
                bucket::delete_region(txn, &self.id)?;
                tracing::debug!(sandbox_id = %self.id, "Sandbox deleted");
            }
            Some(info) => {
                let data = encode(&self.id, &info)?;
                bucket::put_payload(&mut region, &data)?;
                tracing::debug!(
                    sandbox_id = %self.id,
                    state = %info.state,
                    size = data.len(),
                    "Sandbox saved"
                );
            }
        }
        Ok(())
    }
}

impl PodSandboxMetadata for PodSandboxMeta {
    fn id(&self) -> &str {
        &self.id
    }

    fn retrieve(&self) -> Result<Option<PodSandboxInfo>> {
        self.ensure_id()?;
        let txn = self.store.begin_read()?;
        self.retrieve_in(&txn)
    }

    fn save<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(Option<PodSandboxInfo>) -> Result<Option<PodSandboxInfo>>,
    {
        self.ensure_id()?;
        let txn = self.store.begin_write()?;

        match self.apply(&txn, updater) {
            Ok(()) => {
                txn.commit()?;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(
                    sandbox_id = %self.id,
                    error = %e,
                    "Rolling back sandbox update"
                );
                if let Err(abort_err) = txn.abort() {
                    tracing::warn!(
                        sandbox_id = %self.id,
                        error = %abort_err,
                        "Failed to roll back sandbox update"
                    );
                }
                Err(e)
            }
        }
    }
}

impl MetadataStore {
    /// Accessor for the sandbox with the given ID.
    ///
    /// The sandbox does not need to exist.
    pub fn pod_sandbox(&self, id: impl Into<String>) -> PodSandboxMeta {
        PodSandboxMeta {
            store: self.clone(),
            id: id.into(),
        }
    }

    /// List sandboxes matching `filter` (all of them for `None`), ordered by ID.
    ///
    /// Every record is read from the same snapshot as the ID list, so writes
    /// committed while the listing runs do not affect it. Stops at the first
    /// error: a sandbox whose record cannot be read makes the whole listing
    /// fail.
    pub fn list_pod_sandboxes(
        &self,
        filter: Option<&PodSandboxFilter>,
    ) -> Result<Vec<PodSandboxMeta>> {
        let txn = self.begin_read()?;
        let ids = bucket::list_region_ids(&txn)?;
        tracing::trace!(candidates = ids.len(), "Scanning sandbox regions");

        let mut result = Vec::new();
        for id in ids {
            let meta = self.pod_sandbox(id);
            if filter::matches_filter_with(&meta, filter, || meta.retrieve_in(&txn))? {
                result.push(meta);
            }
        }
        drop(txn);

        tracing::debug!(matched = result.len(), "Listed pod sandboxes");
        Ok(result)
    }
}

fn decode(id: &str, data: &[u8]) -> Result<PodSandboxInfo> {
    serde_json::from_slice(data).map_err(|source| MetadataError::Decode {
        id: id.to_string(),
        source,
    })
}

fn encode(id: &str, info: &PodSandboxInfo) -> Result<Vec<u8>> {
    serde_json::to_vec(info).map_err(|source| MetadataError::Encode {
        id: id.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PodSandboxConfig, PodSandboxState};

    fn store() -> MetadataStore {
        MetadataStore::in_memory().expect("in-memory store")
    }

    fn ready() -> PodSandboxInfo {
        PodSandboxInfo::new(PodSandboxConfig::default(), PodSandboxState::Ready)
    }

    #[test]
    fn test_accessor_construction_does_no_io() {
        let store = store();
        let meta = store.pod_sandbox("missing");
        assert_eq!(meta.id(), "missing");
        assert!(store.list_pod_sandboxes(None).expect("list").is_empty());
    }

    #[test]
    fn test_empty_id_rejected() {
        let meta = store().pod_sandbox("");
        assert!(matches!(
            meta.retrieve(),
            Err(MetadataError::InvalidArgument(_))
        ));

        let mut called = false;
        let result = meta.save(|_| {
            called = true;
            Ok(Some(ready()))
        });
        assert!(matches!(result, Err(MetadataError::InvalidArgument(_))));
        assert!(!called);
    }

    #[test]
    fn test_save_then_retrieve_stamps_id() {
        let store = store();
        let meta = store.pod_sandbox("pod-1");
        let info = ready();

        meta.save(|current| {
            assert!(current.is_none());
            Ok(Some(info.clone()))
        })
        .expect("save");

        let loaded = meta.retrieve().expect("retrieve").expect("record");
        assert_eq!(loaded.pod_id, "pod-1");
        assert_eq!(loaded.state, info.state);
        assert_eq!(loaded.created_at, info.created_at);
    }

    #[test]
    fn test_updater_error_rolls_back() {
        let store = store();
        let meta = store.pod_sandbox("pod-1");

        let err = meta
            .save(|_| Err(MetadataError::updater("refused")))
            .expect_err("updater error should surface");
        assert_eq!(err.to_string(), "update rejected: refused");

        // The region created at the start of the transaction must be gone too
        assert!(meta.retrieve().expect_err("no region").is_not_found());
        assert!(store.list_pod_sandboxes(None).expect("list").is_empty());
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let store = store();
        store.pod_sandbox("ghost").save(|_| Ok(None)).expect("delete");
        assert!(store.list_pod_sandboxes(None).expect("list").is_empty());
    }

    #[test]
    fn test_retrieve_in_reads_from_transaction_snapshot() {
        let store = store();
        let meta = store.pod_sandbox("pod-1");
        meta.save(|_| Ok(Some(ready()))).expect("create");

        let txn = store.begin_read().expect("read txn");
        meta.save(|_| Ok(None)).expect("delete");

        let seen = meta.retrieve_in(&txn).expect("snapshot read");
        assert_eq!(seen.expect("record in snapshot").pod_id, "pod-1");
        drop(txn);

        assert!(meta.retrieve().expect_err("deleted").is_not_found());
    }

    #[test]
    fn test_corrupt_payload_reports_decode_error() {
        let store = store();
        let txn = store.begin_write().expect("write txn");
        {
            let mut region = bucket::ensure_region(&txn, "bad").expect("region");
            bucket::put_payload(&mut region, b"not json").expect("put");
        }
        txn.commit().expect("commit");

        let err = store.pod_sandbox("bad").retrieve().expect_err("decode");
        assert!(matches!(err, MetadataError::Decode { ref id, .. } if id == "bad"));

        let err = store
            .pod_sandbox("bad")
            .save(|_| Ok(None))
            .expect_err("save reads the payload first");
        assert!(err.is_corruption());
    }
}
