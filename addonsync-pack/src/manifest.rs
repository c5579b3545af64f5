//! Pack manifest (`manifest.json`) within an addon archive.

use addonsync_types::PackVersion;
use serde::{Deserialize, Serialize};

use crate::PackError;

/// Top-level manifest. Unknown fields are ignored; every field without a
/// default is required and must have the declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub header: ManifestHeader,
    pub modules: Vec<ManifestModule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ManifestMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<ManifestDependency>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestHeader {
    pub name: String,
    /// Content id. Validated as a UUID after parsing.
    pub uuid: String,
    pub version: PackVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_engine_version: Option<PackVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestModule {
    #[serde(rename = "type")]
    pub module_type: String,
    pub uuid: String,
    pub version: PackVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

impl ManifestModule {
    pub fn is_script(&self) -> bool {
        self.module_type.eq_ignore_ascii_case("script")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A dependency on another pack (by uuid) or on a script module (by name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestDependency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    /// A triple for pack dependencies, a semver string for script modules.
    pub version: serde_json::Value,
}

impl Manifest {
    /// Parses manifest text that has already had its comments removed.
    pub fn from_json(text: &str) -> Result<Self, PackError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| PackError::ManifestInvalid(format!("failed to parse: {e}")))?;
        if !value.is_object() {
            return Err(PackError::ManifestInvalid(format!(
                "manifest.json should contain a JSON object, not {}",
                json_type_name(&value)
            )));
        }
        serde_json::from_value(value).map_err(|e| PackError::ManifestInvalid(e.to_string()))
    }

    /// Checks every script module and reports whether any qualified.
    ///
    /// A script module must declare the `javascript` language and an entry
    /// path over `[a-z0-9_\-./]`, both compared case-insensitively.
    pub fn validate_scripts(&self) -> Result<bool, PackError> {
        let mut has_scripts = false;
        for module in self.modules.iter().filter(|m| m.is_script()) {
            let language = module.language.as_deref().unwrap_or_default();
            if !language.eq_ignore_ascii_case("javascript") {
                return Err(PackError::UnsupportedScriptLanguage(language.to_string()));
            }

            let entry = module.entry.as_deref().unwrap_or_default();
            if !is_valid_entry_path(entry) {
                return Err(PackError::InvalidScriptEntry(entry.to_string()));
            }

            has_scripts = true;
        }
        Ok(has_scripts)
    }
}

fn is_valid_entry_path(entry: &str) -> bool {
    !entry.is_empty()
        && entry
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "format_version": 2,
        "header": {
            "name": "Test Pack",
            "uuid": "5f0b4bd2-4c2c-4d4f-9f7e-0e1b2a3c4d5e",
            "version": [1, 2, 3],
            "min_engine_version": [1, 21, 0]
        },
        "modules": [
            { "type": "data", "uuid": "9d1f4c3a-1111-4222-8333-444455556666", "version": [1, 0, 0] }
        ]
    }"#;

    #[test]
    fn parses_minimal_manifest() {
        let m = Manifest::from_json(MINIMAL).unwrap();
        assert_eq!(m.format_version, 2);
        assert_eq!(m.header.name, "Test Pack");
        assert_eq!(m.header.version, PackVersion::new(1, 2, 3));
        assert_eq!(m.header.min_engine_version, Some(PackVersion::new(1, 21, 0)));
        assert_eq!(m.modules.len(), 1);
        assert!(m.dependencies.is_none());
        assert!(!m.validate_scripts().unwrap());
    }

    #[test]
    fn missing_field_is_named() {
        let err = Manifest::from_json(r#"{"format_version": 2, "modules": []}"#).unwrap_err();
        assert!(err.to_string().contains("header"), "{err}");
    }

    #[test]
    fn wrong_type_is_rejected() {
        let text = MINIMAL.replace("\"format_version\": 2", "\"format_version\": \"2\"");
        assert!(matches!(Manifest::from_json(&text), Err(PackError::ManifestInvalid(_))));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = Manifest::from_json("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("not an array"), "{err}");
    }

    fn with_script(language: Option<&str>, entry: Option<&str>) -> Manifest {
        let mut m = Manifest::from_json(MINIMAL).unwrap();
        m.modules.push(ManifestModule {
            module_type: "Script".into(),
            uuid: "0a0b0c0d-0000-4000-8000-000000000001".into(),
            version: PackVersion::new(1, 0, 0),
            description: None,
            language: language.map(str::to_string),
            entry: entry.map(str::to_string),
        });
        m
    }

    #[test]
    fn script_module_sets_flag() {
        let m = with_script(Some("JavaScript"), Some("Scripts/Main.js"));
        assert!(m.validate_scripts().unwrap());
    }

    #[test]
    fn script_module_language_must_be_javascript() {
        let m = with_script(Some("lua"), Some("scripts/main.lua"));
        assert!(matches!(m.validate_scripts(), Err(PackError::UnsupportedScriptLanguage(l)) if l == "lua"));
        let m = with_script(None, Some("scripts/main.js"));
        assert!(matches!(m.validate_scripts(), Err(PackError::UnsupportedScriptLanguage(_))));
    }

    #[test]
    fn script_entry_path_is_restricted() {
        for bad in ["scripts/main js", "scripts\\main.js", "", "scripts/ma*n.js"] {
            let m = with_script(Some("javascript"), Some(bad));
            assert!(
                matches!(m.validate_scripts(), Err(PackError::InvalidScriptEntry(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
