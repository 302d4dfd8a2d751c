//! Storage backends the project layer reads scheme markup through.

use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tr_core::TrellisError;
use tr_core::TrellisResult;
use url::Url;

/// URL scheme of the virtual file system schemes are stored in.
pub const VFS_SCHEME: &str = "osjs";

const DEFAULT_MAX_SCHEME_BYTES: u64 = 16 * 1024 * 1024;

/// Reference to a file in the virtual file system, e.g.
/// `osjs://packages/demo/scheme.html`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileRef(Url);

impl FileRef {
    pub fn parse(input: &str) -> TrellisResult<Self> {
        Url::parse(input).map(Self).map_err(|error| {
            TrellisError::new(
                "storage.file_ref_invalid",
                format!("`{input}` is not a valid file reference: {error}"),
            )
        })
    }

    /// The scheme file of a package: `osjs://packages/<name>/scheme.html`.
    pub fn package_scheme(package: &str) -> TrellisResult<Self> {
        if package.is_empty() || package.contains(['/', '\\']) || package == "." || package == ".." {
            return Err(TrellisError::new(
                "storage.package_name_invalid",
                format!("`{package}` is not a valid package name"),
            ));
        }

        Self::parse(&format!("{VFS_SCHEME}://packages/{package}/scheme.html"))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Single-shot text reads of scheme files.
pub trait SchemeStorage {
    fn read_text(&self, file: &FileRef) -> TrellisResult<String>;
}

impl<T: SchemeStorage + ?Sized> SchemeStorage for &T {
    fn read_text(&self, file: &FileRef) -> TrellisResult<String> {
        (**self).read_text(file)
    }
}

/// File-system storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory the `osjs://` namespace is mounted at.
    pub root: PathBuf,
    pub max_scheme_bytes: u64,
    /// Charset used when the file carries no byte order mark.
    pub fallback_charset: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_scheme_bytes: DEFAULT_MAX_SCHEME_BYTES,
            fallback_charset: None,
        }
    }
}

fn default_storage_root() -> PathBuf {
    if let Some(override_root) = std::env::var_os("TRELLIS_STORAGE_DIR") {
        return PathBuf::from(override_root);
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Reads `osjs://` references from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsStorage {
    pub config: StorageConfig,
}

impl FsStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(StorageConfig {
            root: root.into(),
            ..StorageConfig::default()
        })
    }

    /// Maps a file reference to its location under the storage root.
    pub fn resolve_path(&self, file: &FileRef) -> TrellisResult<PathBuf> {
        let url = file.url();
        if url.scheme() != VFS_SCHEME {
            return Err(TrellisError::new(
                "storage.scheme_unsupported",
                format!("`{file}` is not an {VFS_SCHEME}:// reference"),
            ));
        }

        let mut path = self.config.root.clone();
        if let Some(host) = url.host_str() {
            path.push(host);
        }

        for segment in url.path_segments().into_iter().flatten() {
            if segment.is_empty() {
                continue;
            }
            if segment == ".." || segment == "." || segment.contains('\\') {
                return Err(TrellisError::new(
                    "storage.path_invalid",
                    format!("`{file}` contains a disallowed path segment"),
                ));
            }
            path.push(segment);
        }

        Ok(path)
    }
}

impl SchemeStorage for FsStorage {
    fn read_text(&self, file: &FileRef) -> TrellisResult<String> {
        let path = self.resolve_path(file)?;
        check_size(&path, self.config.max_scheme_bytes)?;

        let bytes = fs::read(&path).map_err(|error| {
            TrellisError::new(
                "storage.read_failed",
                format!("failed to read `{}`: {error}", path.display()),
            )
        })?;

        tracing::debug!(file = %file, bytes = bytes.len(), "read scheme file");
        Ok(decode_text(&bytes, self.config.fallback_charset.as_deref()))
    }
}

fn check_size(path: &Path, max_bytes: u64) -> TrellisResult<()> {
    let metadata = fs::metadata(path).map_err(|error| {
        TrellisError::new(
            "storage.read_failed",
            format!("failed to stat `{}`: {error}", path.display()),
        )
    })?;

    if metadata.len() > max_bytes {
        return Err(TrellisError::new(
            "storage.too_large",
            format!(
                "`{}` exceeds max_scheme_bytes ({} > {max_bytes})",
                path.display(),
                metadata.len()
            ),
        ));
    }

    Ok(())
}

/// Keeps files in memory; used by embedders and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: BTreeMap<FileRef, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: FileRef, content: impl Into<Vec<u8>>) {
        self.files.insert(file, content.into());
    }

}

impl SchemeStorage for MemoryStorage {
    fn read_text(&self, file: &FileRef) -> TrellisResult<String> {
        self.files
            .get(file)
            .map(|bytes| decode_text(bytes, None))
            .ok_or_else(|| {
                TrellisError::new("storage.not_found", format!("`{file}` does not exist"))
            })
    }
}

/// Decodes file content as text. A byte order mark wins over `charset`;
/// without either the content is read as UTF-8, replacing invalid sequences.
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = used.name(), "replaced malformed text sequences");
    }
    decoded.into_owned()
}
