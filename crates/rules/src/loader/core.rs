//! Core [`PolicyLoader`] struct: filesystem-backed policy loading with optional hot-reload.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use sensor_core::{ConfigurationResolver, DetectionPoint, DetectionPointId, SystemId};

use crate::policy::PolicySet;
use crate::schema::{PolicyDocument, PolicyEnvelope};

use super::error::{LoadResult, LoadStatus, Result, RuleError};
use super::watcher::handle_fs_event;

/// Loaded documents keyed by source path. Ordered so duplicate ids resolve
/// deterministically when the policy set is rebuilt.
pub(super) type DocumentMap = BTreeMap<PathBuf, PolicyDocument>;

/// Filesystem-backed policy loader with optional hot-reload.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files, deserializes
/// them into [`PolicyDocument`] instances via two-pass deserialization, and
/// keeps a [`PolicySet`] built from them for the detection engine to query.
pub struct PolicyLoader {
    /// Root directory containing policy YAML files.
    rules_dir: PathBuf,
    documents: Arc<RwLock<DocumentMap>>,
    /// Resolver view rebuilt from `documents` after every change.
    policies: Arc<RwLock<PolicySet>>,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl PolicyLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(rules_dir: PathBuf) -> Self {
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            documents: Arc::new(RwLock::new(DocumentMap::new())),
            policies: Arc::new(RwLock::new(PolicySet::new())),
            _watcher: None,
        }
    }

    /// Recursively scan the rules directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. Parse and validation errors
    /// are reported per-file but do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.rules_dir, &mut results)?;
        rebuild_policies(&self.documents, &self.policies);
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            if !is_yaml(&path) {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            match self.load_file(&path) {
                Ok(doc) => {
                    let policy_id = doc.metadata().id.clone();
                    info!(policy_id = %policy_id, kind = %doc.kind(), path = %path.display(), "loaded policy");
                    self.documents
                        .write()
                        .expect("documents lock poisoned")
                        .insert(path.clone(), doc);
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { policy_id },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load policy file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(())
    }

    /// Parse and validate a single YAML file.
    pub fn load_file(&self, path: &Path) -> Result<PolicyDocument> {
        parse_policy_file(path)
    }

    /// Start a filesystem watcher with 500ms poll interval.
    ///
    /// Created or modified files are re-parsed and upserted; deleted files are
    /// dropped. The policy set is rebuilt after each change. Parse errors are
    /// logged as warnings and the previous version is kept.
    pub fn watch(&mut self) -> Result<()> {
        let documents = Arc::clone(&self.documents);
        let policies = Arc::clone(&self.policies);

        let mut watcher = notify::recommended_watcher(move |res: std::result::Result<notify::Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if handle_fs_event(&event, &documents) {
                        rebuild_policies(&documents, &policies);
                    }
                }
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            }
        })?;

        watcher.watch(&self.rules_dir, RecursiveMode::Recursive)?;

        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.rules_dir.display(), "watching rules directory for changes (recursive)");
        self._watcher = Some(watcher);
        Ok(())
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Snapshot of the current policy set.
    pub fn policies(&self) -> PolicySet {
        self.policies.read().expect("policies lock poisoned").clone()
    }

    /// Number of loaded documents of every kind.
    pub fn document_count(&self) -> usize {
        self.documents.read().expect("documents lock poisoned").len()
    }

    /// Atomically write a policy document to a YAML file and load it.
    ///
    /// Writes to a `.tmp` file first, then renames to the final path to
    /// avoid partial writes on crash.
    pub fn write_document(&self, doc: &PolicyDocument) -> Result<PathBuf> {
        doc.validate().map_err(RuleError::Validation)?;
        let meta = doc.metadata();
        let final_path = self.rules_dir.join(format!("{}.yml", meta.id));
        let tmp_path = self.rules_dir.join(format!(".{}.tmp", meta.id));

        let yaml = doc.to_yaml()?;
        fs::write(&tmp_path, yaml)?;
        fs::rename(&tmp_path, &final_path)?;

        info!(policy_id = %meta.id, kind = %doc.kind(), path = %final_path.display(), "wrote policy file");

        self.documents
            .write()
            .expect("documents lock poisoned")
            .insert(final_path.clone(), doc.clone());
        rebuild_policies(&self.documents, &self.policies);
        Ok(final_path)
    }
}

#[async_trait]
impl ConfigurationResolver for PolicyLoader {
    async fn find_detection_point(
        &self,
        id: &DetectionPointId,
    ) -> sensor_core::Result<Option<DetectionPoint>> {
        let policies = self.policies.read().expect("policies lock poisoned");
        Ok(policies.detection_point(id).cloned())
    }

    async fn related_systems(&self, system_id: &str) -> sensor_core::Result<BTreeSet<SystemId>> {
        let policies = self.policies.read().expect("policies lock poisoned");
        Ok(policies.related_systems(system_id))
    }
}

pub(super) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false)
}

/// Two-pass parse of one policy file followed by semantic validation.
pub(super) fn parse_policy_file(path: &Path) -> Result<PolicyDocument> {
    let contents = fs::read_to_string(path)?;

    // First pass: extract envelope (kind + metadata).
    let envelope: PolicyEnvelope = serde_yaml::from_str(&contents)?;

    if envelope.metadata.id.is_empty() {
        return Err(RuleError::Validation(
            "policy metadata.id must not be empty".to_string(),
        ));
    }

    // Second pass: deserialize into kind-specific type.
    let doc = envelope.parse_full().map_err(|e| {
        RuleError::Validation(format!("failed to parse policy '{}': {}", envelope.metadata.id, e))
    })?;
    doc.validate().map_err(RuleError::Validation)?;
    Ok(doc)
}

pub(super) fn rebuild_policies(documents: &RwLock<DocumentMap>, policies: &RwLock<PolicySet>) {
    let rebuilt = {
        let docs = documents.read().expect("documents lock poisoned");
        PolicySet::from_documents(docs.values())
    };
    info!(
        detection_points = rebuilt.detection_point_count(),
        system_groups = rebuilt.system_group_count(),
        "policy set rebuilt"
    );
    *policies.write().expect("policies lock poisoned") = rebuilt;
}
