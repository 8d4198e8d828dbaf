//! Filesystem event handler for the notify watcher (hot-reload).

use std::sync::RwLock;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::core::{is_yaml, parse_policy_file, DocumentMap};

/// Apply a single filesystem event to the document map.
///
/// Returns `true` when the map changed and the policy set must be rebuilt.
pub(super) fn handle_fs_event(event: &Event, documents: &RwLock<DocumentMap>) -> bool {
    let mut changed = false;

    for path in &event.paths {
        if !is_yaml(path) {
            continue;
        }

        // Skip dotfiles (including our .tmp files)
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_)) => {
                if !path.exists() {
                    // Rename away from this path.
                    changed |= remove_by_path(documents, path);
                    continue;
                }
                match parse_policy_file(path) {
                    Ok(doc) => {
                        info!(policy_id = %doc.metadata().id, kind = %doc.kind(), path = %path.display(), "hot-reloaded policy");
                        documents
                            .write()
                            .expect("documents lock poisoned")
                            .insert(path.clone(), doc);
                        changed = true;
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to parse policy during hot-reload, keeping previous version"
                        );
                    }
                }
            }
            EventKind::Remove(RemoveKind::File) => {
                changed |= remove_by_path(documents, path);
            }
            _ => {}
        }
    }

    changed
}

fn remove_by_path(documents: &RwLock<DocumentMap>, path: &std::path::Path) -> bool {
    let removed = documents
        .write()
        .expect("documents lock poisoned")
        .remove(path);
    if let Some(doc) = &removed {
        info!(policy_id = %doc.metadata().id, path = %path.display(), "removed policy after file deletion");
    }
    removed.is_some()
}
