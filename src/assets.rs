//! Bundled asset extraction and the auxiliary toolset binary.
//!
//! The installer ships native binaries (probe `app_process` builds, the
//! busybox toolset, the bridge jar). [`AssetStore`] is the seam: given a
//! logical asset name it copies the asset to a destination with the requested
//! permission bits.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

/// Asset name of the busybox build used as the extended toolset.
pub const TOOLSET_ASSET: &str = "busybox-xposed";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset {0} is not bundled")]
    Missing(String),

    #[error("could not write asset {name} to {dest}: {source}")]
    Write {
        name: String,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Source of bundled files.
pub trait AssetStore: Send + Sync {
    /// Copy `name` to `dest` with `mode` permission bits, creating parents.
    fn write_asset(&self, name: &str, dest: &Path, mode: u32) -> Result<PathBuf, AssetError>;

    /// Whether `name` is bundled at all.
    fn has_asset(&self, name: &str) -> bool;

    /// Writable, app-private scratch directory.
    fn cache_dir(&self) -> &Path;
}

/// Assets laid out as plain files under a directory.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
    cache_dir: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_dir: cache_dir.into(),
        }
    }
}

impl AssetStore for DirAssetStore {
    fn write_asset(&self, name: &str, dest: &Path, mode: u32) -> Result<PathBuf, AssetError> {
        let source = self.root.join(name);
        if !source.is_file() {
            return Err(AssetError::Missing(name.to_string()));
        }

        let write_err = |source: io::Error| AssetError::Write {
            name: name.to_string(),
            dest: dest.to_path_buf(),
            source,
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        // Replace rather than overwrite so a running copy is never truncated.
        if dest.exists() {
            fs::remove_file(dest).map_err(write_err)?;
        }
        fs::copy(&source, dest).map_err(write_err)?;
        fs::set_permissions(dest, fs::Permissions::from_mode(mode)).map_err(write_err)?;

        debug!(asset = name, dest = %dest.display(), mode = %format!("{:o}", mode), "asset written");
        Ok(dest.to_path_buf())
    }

    fn has_asset(&self, name: &str) -> bool {
        self.root.join(name).is_file()
    }

    fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

/// The busybox binary that provides `cp`, `mkdir`, `rm` and friends on
/// minimal device images.
#[derive(Clone)]
pub struct Toolset {
    store: Arc<dyn AssetStore>,
    asset: String,
    path: PathBuf,
}

impl Toolset {
    /// Toolset extracted from `asset` into the store's cache directory.
    pub fn new(store: Arc<dyn AssetStore>, asset: impl Into<String>) -> Self {
        let path = store.cache_dir().join(TOOLSET_ASSET);
        Self {
            store,
            asset: asset.into(),
            path,
        }
    }

    /// Toolset for the architecture folder (`arm/` or `x86/`) of this device.
    pub fn for_folder(store: Arc<dyn AssetStore>, folder: &str) -> Self {
        Self::new(store, format!("{}{}", folder, TOOLSET_ASSET))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extract the binary unless it is already in place.
    pub fn ensure(&self) -> Result<&Path, AssetError> {
        if !self.path.is_file() {
            self.store.write_asset(&self.asset, &self.path, 0o700)?;
        }
        Ok(&self.path)
    }

    /// Best-effort removal; absence is fine.
    pub fn remove(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "toolset removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), "could not remove toolset: {}", err),
        }
    }
}

impl std::fmt::Debug for Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolset")
            .field("asset", &self.asset)
            .field("path", &self.path)
            .finish()
    }
}
