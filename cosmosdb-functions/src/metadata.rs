//! `host.json` and `function.json` generation
//!
//! The Functions host discovers a custom handler's functions from one folder per function, each
//! holding a `function.json`, next to a `host.json` that names the executable to start.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FunctionApp;

/// The extension bundle that provides the Cosmos DB trigger.
pub const EXTENSION_BUNDLE_ID: &str = "Microsoft.Azure.Functions.ExtensionBundle";
/// Bundle 4.x ships the Cosmos DB extension with `containerName`/`connection` properties.
pub const EXTENSION_BUNDLE_VERSION: &str = "[4.*, 5.0.0)";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode metadata: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The contents of `host.json` for a custom handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMetadata {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<serde_json::Value>,
    pub extension_bundle: ExtensionBundle,
    pub custom_handler: CustomHandler,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionBundle {
    pub id: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomHandler {
    pub description: CustomHandlerDescription,
    /// Only meaningful for HTTP triggered apps.
    #[serde(default)]
    pub enable_forwarding_http_request: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomHandlerDescription {
    pub default_executable_path: String,
    #[serde(default)]
    pub working_directory: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl HostMetadata {
    /// `host.json` for a handler started as `executable`, relative to the app root.
    ///
    /// Application Insights sampling is on, with requests excluded from it.
    pub fn for_executable(executable: impl Into<String>) -> Self {
        Self {
            version: "2.0".to_string(),
            logging: Some(serde_json::json!({
                "applicationInsights": {
                    "samplingSettings": {
                        "isEnabled": true,
                        "excludedTypes": "Request"
                    }
                }
            })),
            extension_bundle: ExtensionBundle {
                id: EXTENSION_BUNDLE_ID.to_string(),
                version: EXTENSION_BUNDLE_VERSION.to_string(),
            },
            custom_handler: CustomHandler {
                description: CustomHandlerDescription {
                    default_executable_path: executable.into(),
                    working_directory: String::new(),
                    arguments: vec![],
                },
                enable_forwarding_http_request: false,
            },
        }
    }
}

impl FunctionApp {
    /// Renders the named function's `function.json`.
    pub fn function_json(&self, name: &str) -> Option<Result<String, serde_json::Error>> {
        self.get(name)
            .map(|function| function.metadata().to_json_pretty())
    }

    /// Writes `host.json` and one `{name}/function.json` per function under `dir`, returning the
    /// paths written.
    pub fn write_metadata(
        &self,
        dir: &Path,
        host: &HostMetadata,
    ) -> Result<Vec<PathBuf>, MetadataError> {
        let mut written = Vec::with_capacity(self.len() + 1);

        let host_path = dir.join("host.json");
        write_file(&host_path, &serde_json::to_string_pretty(host)?)?;
        written.push(host_path);

        for function in self.functions() {
            let function_dir = dir.join(function.name());
            fs::create_dir_all(&function_dir).map_err(|source| MetadataError::Io {
                path: function_dir.clone(),
                source,
            })?;
            let path = function_dir.join("function.json");
            write_file(&path, &function.metadata().to_json_pretty()?)?;
            log::info!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), MetadataError> {
    fs::write(path, format!("{contents}\n")).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
