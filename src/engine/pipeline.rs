use std::sync::atomic::AtomicBool;

use serde_json::Value;

use crate::catalog::parser::recover_document;
use crate::error::{preview, CatalogError, CatalogResult};

use super::fetch::{run_catalog_command, CatalogCommand, FetchResult};

/// A decoded catalog, ready to be indexed on the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogLoad {
    pub document: Value,
    /// Whatever the simulator logged to stderr on a successful run.
    pub stderr: String,
}

/// The catalog pipeline: Run → Recover → Document
#[derive(Debug, Clone)]
pub struct CatalogEngine {
    command: CatalogCommand,
}

impl CatalogEngine {
    pub fn new(command: CatalogCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &CatalogCommand {
        &self.command
    }

    /// Run the catalog command through the full pipeline
    pub fn load(&self, cancel: &AtomicBool) -> CatalogResult<CatalogLoad> {
        let FetchResult { stdout, stderr } = run_catalog_command(&self.command, cancel)?;
        Self::process_output(&stdout, &stderr)
    }

    /// Recover the document from raw process output (for testing)
    pub fn process_output(stdout: &str, stderr: &str) -> CatalogResult<CatalogLoad> {
        match recover_document(stdout) {
            Some(map) => Ok(CatalogLoad {
                document: Value::Object(map),
                stderr: stderr.to_string(),
            }),
            None => {
                log::warn!("No catalog document in {} bytes of output", stdout.len());
                Err(CatalogError::Parse {
                    preview: preview(stdout.trim()),
                    stderr: stderr.to_string(),
                })
            }
        }
    }
}
