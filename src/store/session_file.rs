// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::model::{DiagramGraph, ViewState};

/// Everything one session persists: the domain graph plus the geometry
/// overlay. Restoring replaces both atomically; stale in-memory state never
/// merges in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub graph: DiagramGraph,
    pub view: ViewState,
}

impl SessionSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to
    /// stable storage where possible. Exact guarantees are
    /// platform/filesystem-dependent.
    Durable,
}

#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    SymlinkRefused { path: PathBuf },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::SymlinkRefused { .. } => None,
        }
    }
}

/// One session's JSON file on disk.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
    durability: WriteDurability,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted snapshot. `Ok(None)` when no file exists yet.
    pub fn load(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let snapshot = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    /// Loads the snapshot, falling back to `default` only when no file was
    /// ever saved. An explicitly-saved empty snapshot wins over the default.
    pub fn load_or_default(
        &self,
        default: impl FnOnce() -> SessionSnapshot,
    ) -> Result<SessionSnapshot, StoreError> {
        Ok(self.load()?.unwrap_or_else(default))
    }

    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, &json, self.durability)
    }

    /// Removes the persisted file. Idempotent.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn write_atomic(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let Some(parent) = path.parent() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent"),
        });
    };
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".{file_name}.{}.{nanos}.tmp",
        std::process::id()
    ));

    let result = (|| -> Result<(), StoreError> {
        let mut file = fs::File::create(&tmp_path).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        file.write_all(contents).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        if durability == WriteDurability::Durable {
            file.sync_all().map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        }
        drop(file);
        fs::rename(&tmp_path, path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if durability == WriteDurability::Durable {
            // Flushing the parent directory is best-effort.
            if let Ok(dir) = fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use rstest::{fixture, rstest};

    use super::{SessionFile, SessionSnapshot, WriteDurability};
    use crate::model::{fixtures, GroupMode, NodeId, Point, ViewState};

    static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: std::path::PathBuf,
    }

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos();
            let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = env::temp_dir();
            path.push(format!(
                "proteus-{prefix}-{}-{nanos}-{counter}",
                std::process::id()
            ));
            std::fs::create_dir_all(&path).unwrap();
            Self { path }
        }

        fn path(&self) -> &std::path::Path {
            &self.path
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    struct SessionFileTestCtx {
        _tmp: TempDir,
        file: SessionFile,
    }

    #[fixture]
    fn ctx() -> SessionFileTestCtx {
        let tmp = TempDir::new("session-file");
        let file = SessionFile::new(tmp.path().join("session.json"));
        SessionFileTestCtx { _tmp: tmp, file }
    }

    fn demo_snapshot() -> SessionSnapshot {
        let graph = fixtures::demo_graph();
        let mut view = ViewState::new();
        view.set_node_position(
            NodeId::new("webapp").unwrap(),
            Point::new(10.0, 20.0),
        );
        view.set_mode(NodeId::new("aws").unwrap(), GroupMode::Free);
        SessionSnapshot { graph, view }
    }

    #[rstest]
    fn snapshot_roundtrips_through_disk(ctx: SessionFileTestCtx) {
        let snapshot = demo_snapshot();
        ctx.file.save(&snapshot).unwrap();

        let loaded = ctx.file.load().unwrap().expect("snapshot on disk");
        assert_eq!(loaded, snapshot);
        assert_eq!(
            loaded.view.mode_of(&NodeId::new("aws").unwrap()),
            GroupMode::Free
        );
    }

    #[rstest]
    fn load_without_a_file_is_none(ctx: SessionFileTestCtx) {
        assert!(ctx.file.load().unwrap().is_none());
    }

    #[rstest]
    fn saved_empty_snapshot_beats_the_default(ctx: SessionFileTestCtx) {
        ctx.file.save(&SessionSnapshot::empty()).unwrap();

        let loaded = ctx.file.load_or_default(demo_snapshot).unwrap();
        assert!(loaded.is_empty());

        // Without a file the default applies.
        ctx.file.clear().unwrap();
        let loaded = ctx.file.load_or_default(demo_snapshot).unwrap();
        assert!(!loaded.is_empty());
    }

    #[rstest]
    fn clear_is_idempotent(ctx: SessionFileTestCtx) {
        ctx.file.save(&demo_snapshot()).unwrap();
        ctx.file.clear().unwrap();
        ctx.file.clear().unwrap();
        assert!(ctx.file.load().unwrap().is_none());
    }

    #[rstest]
    fn save_creates_missing_parent_directories(ctx: SessionFileTestCtx) {
        let nested = SessionFile::new(ctx.file.path().parent().unwrap().join("a/b/session.json"))
            .with_durability(WriteDurability::Durable);
        nested.save(&demo_snapshot()).unwrap();
        assert!(nested.load().unwrap().is_some());
    }

    #[rstest]
    fn overwrite_keeps_the_newest_snapshot(ctx: SessionFileTestCtx) {
        ctx.file.save(&demo_snapshot()).unwrap();
        ctx.file.save(&SessionSnapshot::empty()).unwrap();
        let loaded = ctx.file.load().unwrap().expect("snapshot");
        assert!(loaded.is_empty());
    }

    #[cfg(unix)]
    #[rstest]
    fn save_refuses_to_write_through_a_symlink(ctx: SessionFileTestCtx) {
        use super::StoreError;

        let dir = ctx.file.path().parent().unwrap().to_path_buf();
        let target = dir.join("target.json");
        std::fs::write(&target, b"{}").unwrap();
        let link = dir.join("link.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let file = SessionFile::new(&link);
        let err = file.save(&SessionSnapshot::empty()).unwrap_err();
        assert!(matches!(err, StoreError::SymlinkRefused { .. }));
    }
}
