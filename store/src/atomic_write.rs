//! Atomic file write: temp file + rename.
//!
//! On Windows, rename-over-existing fails, so a backup-and-restore fallback
//! avoids losing the previous snapshot when overwriting.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

/// Durability knobs for snapshot writes.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// When true, `sync_all()` is called on the temp file before the rename.
    pub sync_all: bool,
    /// When true, best-effort `sync_all()` on the parent directory after the
    /// rename, narrowing the window where power loss drops the directory
    /// entry. Errors are logged, never propagated.
    pub dir_sync: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync_all: true,
            dir_sync: false,
        }
    }
}

pub fn atomic_write(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: WriteOptions,
) -> std::io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if options.sync_all {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if path.exists() {
            // Windows: rename refuses to clobber. Move the old file aside,
            // retry, and roll back on failure.
            let backup = path.with_extension("bak");
            let _ = std::fs::remove_file(&backup);
            std::fs::rename(path, &backup)?;

            if let Err(retry_err) = err.file.persist(path) {
                let _ = std::fs::rename(&backup, path);
                return Err(retry_err.error);
            }
            if let Err(e) = std::fs::remove_file(&backup) {
                tracing::warn!(path = %backup.display(), "Failed to remove .bak after write: {e}");
            }
        } else {
            return Err(err.error);
        }
    }

    if options.dir_sync {
        sync_parent_dir(parent);
    }

    Ok(())
}

fn sync_parent_dir(parent: &Path) {
    #[cfg(unix)]
    {
        if let Err(e) = std::fs::File::open(parent).and_then(|d| d.sync_all()) {
            debug!(path = %parent.display(), "Parent directory sync_all failed (best-effort): {e}");
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;

        // From winbase.h. Required to open a directory handle on Windows.
        const FILE_FLAG_BACKUP_SEMANTICS: u32 = 0x0200_0000;

        let mut opts = std::fs::OpenOptions::new();
        opts.read(true)
            .write(true)
            .custom_flags(FILE_FLAG_BACKUP_SEMANTICS);

        if let Err(e) = opts.open(parent).and_then(|d| d.sync_all()) {
            debug!(path = %parent.display(), "Parent directory sync_all failed (best-effort): {e}");
        }
    }
}
