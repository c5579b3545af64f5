//! Fluent builder for addon archives, used by tooling and tests.

use std::io::{Cursor, Write};
use std::path::Path;

use addonsync_types::{ContentId, PackVersion};
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::PackError;

enum ManifestSource {
    Generated,
    Raw(String),
    Absent,
}

/// Builds a `.mcpack` archive in memory.
///
/// The manifest is generated from the header fields and any script module
/// added; extra entries are written verbatim after it.
pub struct ArchiveBuilder {
    name: String,
    uuid: String,
    version: PackVersion,
    manifest_dir: String,
    script: Option<(String, String)>,
    manifest: ManifestSource,
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new(name: impl Into<String>, id: ContentId) -> Self {
        Self {
            name: name.into(),
            uuid: id.to_string(),
            version: PackVersion::new(1, 0, 0),
            manifest_dir: String::new(),
            script: None,
            manifest: ManifestSource::Generated,
            entries: Vec::new(),
        }
    }

    pub fn version(mut self, version: PackVersion) -> Self {
        self.version = version;
        self
    }

    /// Overrides the header uuid with arbitrary text.
    pub fn uuid_text(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    /// Places the manifest under `dir/` instead of the archive root.
    pub fn manifest_dir(mut self, dir: impl Into<String>) -> Self {
        self.manifest_dir = dir.into();
        self
    }

    /// Adds a script module with the given language and entry path.
    pub fn script(mut self, language: impl Into<String>, entry: impl Into<String>) -> Self {
        self.script = Some((language.into(), entry.into()));
        self
    }

    /// Replaces the generated manifest with `text`.
    pub fn raw_manifest(mut self, text: impl Into<String>) -> Self {
        self.manifest = ManifestSource::Raw(text.into());
        self
    }

    pub fn without_manifest(mut self) -> Self {
        self.manifest = ManifestSource::Absent;
        self
    }

    pub fn entry(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.entries.push((name.into(), data.into()));
        self
    }

    /// Adds `entities/<file>` with the given JSON text.
    pub fn entity(self, file: &str, json: impl Into<String>) -> Self {
        let name = format!("entities/{file}");
        self.entry(name, json.into().into_bytes())
    }

    /// The manifest text this builder would write.
    pub fn manifest_json(&self) -> String {
        if let ManifestSource::Raw(raw) = &self.manifest {
            return raw.clone();
        }
        let mut modules = vec![json!({
            "type": "data",
            "uuid": ContentId::random().to_string(),
            "version": self.version,
        })];
        if let Some((language, entry)) = &self.script {
            modules.push(json!({
                "type": "script",
                "uuid": ContentId::random().to_string(),
                "version": self.version,
                "language": language,
                "entry": entry,
            }));
        }
        let manifest = json!({
            "format_version": 2,
            "header": {
                "name": self.name,
                "uuid": self.uuid,
                "version": self.version,
                "min_engine_version": [1, 21, 0],
            },
            "modules": modules,
        });
        serde_json::to_string_pretty(&manifest).unwrap_or_default()
    }

    /// Builds the archive and returns the raw bytes.
    pub fn build(self) -> Result<Vec<u8>, PackError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        if !matches!(self.manifest, ManifestSource::Absent) {
            let manifest = self.manifest_json();
            let path = if self.manifest_dir.is_empty() {
                "manifest.json".to_string()
            } else {
                zip.add_directory(self.manifest_dir.as_str(), options)?;
                format!("{}/manifest.json", self.manifest_dir)
            };
            zip.start_file(path, options)?;
            zip.write_all(manifest.as_bytes())?;
        }

        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Builds the archive and writes it to `path`.
    pub fn write_to(self, path: impl AsRef<Path>) -> Result<(), PackError> {
        let bytes = self.build()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Manifest;

    #[test]
    fn generated_manifest_parses() {
        let id = ContentId::random();
        let builder = ArchiveBuilder::new("Demo", id)
            .version(PackVersion::new(2, 0, 1))
            .script("javascript", "scripts/main.js");
        let manifest = Manifest::from_json(&builder.manifest_json()).unwrap();
        assert_eq!(manifest.header.uuid, id.to_string());
        assert_eq!(manifest.header.version, PackVersion::new(2, 0, 1));
        assert_eq!(manifest.modules.len(), 2);
        assert!(manifest.validate_scripts().unwrap());
    }

    #[test]
    fn archive_contains_entries() {
        let bytes = ArchiveBuilder::new("Demo", ContentId::random())
            .manifest_dir("pack")
            .entry("textures/a.png", vec![1, 2, 3])
            .build()
            .unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"pack/manifest.json"));
        assert!(names.contains(&"textures/a.png"));
    }
}
