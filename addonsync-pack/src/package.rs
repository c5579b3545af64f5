//! Loaded content packages and the loader that opens them.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use addonsync_types::{ContentId, PackVersion};
use sha2::{Digest, Sha256};
use tracing::debug;
use zip::ZipArchive;

use crate::entity::EntityDefinition;
use crate::json::strip_comments;
use crate::manifest::Manifest;
use crate::PackError;

const MANIFEST_ENTRY: &str = "manifest.json";
const NESTED_MANIFEST_SUFFIX: &str = "/manifest.json";
const LEGACY_MANIFEST_ENTRY: &str = "pack_manifest.json";
const ENTITIES_PREFIX: &str = "entities/";
const ARCHIVE_EXTENSIONS: [&str; 2] = ["zip", "mcpack"];

/// Anything the host can place on its resource stack and stream to clients.
pub trait PackSource: Send + Sync {
    fn pack_id(&self) -> ContentId;
    fn version(&self) -> PackVersion;
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    fn sha256(&self) -> Result<[u8; 32], PackError>;
    fn read_chunk(&self, start: u64, length: usize) -> Result<Vec<u8>, PackError>;
}

/// An opened addon archive with its parsed manifest and entity definitions.
///
/// Immutable after load apart from the memoized archive hash. The file
/// handle is closed when the package is dropped.
pub struct ContentPackage {
    path: PathBuf,
    manifest: Manifest,
    content_id: ContentId,
    entities: Vec<EntityDefinition>,
    has_scripts: bool,
    size: u64,
    encryption_key: Option<[u8; 32]>,
    file: Mutex<File>,
    sha256: OnceLock<[u8; 32]>,
}

impl ContentPackage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn content_id(&self) -> ContentId {
        self.content_id
    }

    pub fn version(&self) -> PackVersion {
        self.manifest.header.version
    }

    pub fn name(&self) -> &str {
        &self.manifest.header.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn has_scripts(&self) -> bool {
        self.has_scripts
    }

    pub fn entities(&self) -> &[EntityDefinition] {
        &self.entities
    }

    pub fn encryption_key(&self) -> Option<&[u8; 32]> {
        self.encryption_key.as_ref()
    }

    /// Attaches the key clients need to decrypt this pack.
    #[must_use]
    pub fn with_encryption_key(mut self, key: [u8; 32]) -> Self {
        self.encryption_key = Some(key);
        self
    }

    /// SHA-256 of the whole archive, computed on first use.
    ///
    /// Concurrent first callers serialize on the file handle; only one of
    /// them hashes and the rest read the stored digest.
    pub fn sha256(&self) -> Result<[u8; 32], PackError> {
        if let Some(digest) = self.sha256.get() {
            return Ok(*digest);
        }
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(digest) = self.sha256.get() {
            return Ok(*digest);
        }
        let digest = hash_file(&mut file)?;
        Ok(*self.sha256.get_or_init(|| digest))
    }

    /// Hashes the archive again, ignoring the memoized digest.
    pub fn sha256_uncached(&self) -> Result<[u8; 32], PackError> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        hash_file(&mut file)
    }

    /// Lowercase hex form of [`sha256`](Self::sha256).
    pub fn sha256_hex(&self) -> Result<String, PackError> {
        Ok(hex::encode(self.sha256()?))
    }

    /// Reads up to `length` bytes starting at `start`.
    ///
    /// `length` must be positive and `start` inside the archive. Fewer bytes
    /// are returned when the range runs past the end.
    pub fn read_chunk(&self, start: u64, length: usize) -> Result<Vec<u8>, PackError> {
        if length == 0 || start >= self.size {
            return Err(PackError::InvalidChunk {
                start,
                length,
                size: self.size,
            });
        }
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.seek(SeekFrom::Start(start))?;
        let mut chunk = Vec::with_capacity(length.min((self.size - start) as usize));
        (&mut *file).take(length as u64).read_to_end(&mut chunk)?;
        Ok(chunk)
    }
}

impl std::fmt::Debug for ContentPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentPackage")
            .field("content_id", &self.content_id)
            .field("name", &self.name())
            .field("version", &self.version())
            .field("size", &self.size)
            .field("has_scripts", &self.has_scripts)
            .field("entities", &self.entities.len())
            .field("encrypted", &self.encryption_key.is_some())
            .finish_non_exhaustive()
    }
}

impl PackSource for ContentPackage {
    fn pack_id(&self) -> ContentId {
        self.content_id
    }

    fn version(&self) -> PackVersion {
        ContentPackage::version(self)
    }

    fn name(&self) -> &str {
        ContentPackage::name(self)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn sha256(&self) -> Result<[u8; 32], PackError> {
        ContentPackage::sha256(self)
    }

    fn read_chunk(&self, start: u64, length: usize) -> Result<Vec<u8>, PackError> {
        ContentPackage::read_chunk(self, start, length)
    }
}

fn hash_file(file: &mut File) -> Result<[u8; 32], PackError> {
    file.seek(SeekFrom::Start(0))?;
    let mut hasher = Sha256::new();
    io::copy(file, &mut hasher)?;
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    Ok(digest)
}

/// Opens addon archives from disk.
pub struct ContentPackageLoader;

impl ContentPackageLoader {
    /// Loads and validates one archive. Either the whole package is built
    /// or an error is returned; nothing is partially populated.
    pub fn load(path: impl AsRef<Path>) -> Result<ContentPackage, PackError> {
        let path = path.as_ref();
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PackError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        if meta.is_dir() {
            return Err(PackError::DirectoryUnsupported(path.to_path_buf()));
        }
        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ARCHIVE_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)));
        if !recognized {
            return Err(PackError::UnrecognizedFormat(path.to_path_buf()));
        }
        if meta.len() == 0 {
            return Err(PackError::EmptyFile(path.to_path_buf()));
        }

        let mut archive = ZipArchive::new(File::open(path)?)?;
        let manifest_text = read_manifest(&mut archive)?;
        let entities = read_entities(&mut archive)?;
        drop(archive);

        let manifest = Manifest::from_json(&strip_comments(&manifest_text))?;
        let content_id =
            ContentId::parse(&manifest.header.uuid).map_err(|source| PackError::InvalidContentId {
                id: manifest.header.uuid.clone(),
                source,
            })?;
        let has_scripts = manifest.validate_scripts()?;

        let file = File::open(path)?;
        let size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            content_id = %content_id,
            entities = entities.len(),
            has_scripts,
            "content package loaded"
        );

        Ok(ContentPackage {
            path: path.to_path_buf(),
            manifest,
            content_id,
            entities,
            has_scripts,
            size,
            encryption_key: None,
            file: Mutex::new(file),
            sha256: OnceLock::new(),
        })
    }
}

/// Root `manifest.json`, else the shortest `*/manifest.json`.
fn read_manifest<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, PackError> {
    let mut nested: Option<(usize, usize)> = None;
    let mut root = None;
    let mut legacy = false;

    for i in 0..archive.len() {
        let name = archive.by_index_raw(i)?.name().to_string();
        if name == MANIFEST_ENTRY {
            root = Some(i);
            break;
        }
        if name.ends_with(NESTED_MANIFEST_SUFFIX)
            && nested.is_none_or(|(_, len)| name.len() < len)
        {
            nested = Some((i, name.len()));
        }
        if name == LEGACY_MANIFEST_ENTRY {
            legacy = true;
        }
    }

    let index = match (root, nested) {
        (Some(i), _) | (None, Some((i, _))) => i,
        (None, None) if legacy => return Err(PackError::UnsupportedOldFormat),
        (None, None) => return Err(PackError::ManifestNotFound),
    };

    let mut entry = archive.by_index(index)?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| PackError::ManifestInvalid(format!("failed to read manifest.json: {e}")))?;
    Ok(text)
}

fn read_entities<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Vec<EntityDefinition>, PackError> {
    let mut entities = Vec::new();

    for i in 0..archive.len() {
        let name = {
            let raw = archive.by_index_raw(i)?;
            if raw.is_dir() {
                continue;
            }
            raw.name().to_string()
        };
        if !name.starts_with(ENTITIES_PREFIX) || !name.to_ascii_lowercase().ends_with(".json") {
            continue;
        }
        let mut entry = archive.by_index(i)?;

        let mut raw = String::new();
        entry
            .read_to_string(&mut raw)
            .map_err(|e| PackError::MalformedEntity {
                path: name.clone(),
                reason: e.to_string(),
            })?;
        let definition = EntityDefinition::from_json(&strip_comments(&raw))
            .map_err(|reason| PackError::MalformedEntity { path: name, reason })?;
        entities.push(definition);
    }

    Ok(entities)
}
