//! # bouvet-metadata
//!
//! Transactional metadata store for Bouvet pod sandboxes.
//!
//! This crate persists the lifecycle state of sandboxes in a single local
//! [redb](https://docs.rs/redb) file so the agent can recover its view of
//! the world after a restart.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 bouvet-metadata (host)                   │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ┌─────────────────────┐    ┌────────────────────────┐   │
//! │  │   MetadataStore     │───▶│   PodSandboxFilter     │   │
//! │  │ - pod_sandbox()     │    │   - id / state         │   │
//! │  │ - list_pod_         │    │   - LabelSelector      │   │
//! │  │   sandboxes()       │    └────────────────────────┘   │
//! │  └─────────────────────┘                                 │
//! │           │                                              │
//! │           ▼                                              │
//! │  ┌─────────────────────┐    ┌────────────────────────┐   │
//! │  │  PodSandboxMeta     │───▶│  redb table            │   │
//! │  │  - id()             │    │  "sandboxes/<id>"      │   │
//! │  │  - retrieve()       │    │    "data" => JSON      │   │
//! │  │  - save(updater)    │    └────────────────────────┘   │
//! │  └─────────────────────┘                                 │
//! │                                                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use bouvet_metadata::{
//!     MetadataStore, PodSandboxConfig, PodSandboxFilter, PodSandboxInfo,
//!     PodSandboxMetadata, PodSandboxState,
//! };
//!
//! # fn example() -> bouvet_metadata::Result<()> {
//! let store = MetadataStore::open_path("/var/lib/bouvet/metadata.redb")?;
//!
//! // Create
//! let sandbox = store.pod_sandbox("pod-1");
//! sandbox.save(|_| {
//!     Ok(Some(PodSandboxInfo::new(
//!         PodSandboxConfig::default(),
//!         PodSandboxState::Ready,
//!     )))
//! })?;
//!
//! // Update
//! sandbox.save(|current| {
//!     Ok(current.map(|mut info| {
//!         info.state = PodSandboxState::NotReady;
//!         info
//!     }))
//! })?;
//!
//! // List
//! let filter = PodSandboxFilter::default()
//!     .with_state(PodSandboxState::NotReady)
//!     .with_label_selector("env=prod".parse()?);
//! for meta in store.list_pod_sandboxes(Some(&filter))? {
//!     println!("{}", meta.id());
//! }
//!
//! // Delete
//! sandbox.save(|_| Ok(None))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Atomic Updates**: Create, update and delete through one read-modify-write call
//! - **Per-Sandbox Isolation**: Each sandbox lives in its own table
//! - **Snapshot Reads**: Readers never block the writer and see consistent data
//! - **Filtered Listing**: By ID, state and label selector

mod bucket;
mod config;
mod error;
mod filter;
mod sandbox;
mod selector;
mod store;
mod types;

pub use config::{StoreConfig, StoreConfigBuilder, DEFAULT_METADATA_PATH};
pub use error::{MetadataError, Result};
pub use filter::{matches_filter, PodSandboxFilter};
pub use sandbox::{PodSandboxMeta, PodSandboxMetadata};
pub use selector::LabelSelector;
pub use store::MetadataStore;
pub use types::{PodSandboxConfig, PodSandboxInfo, PodSandboxState};
