// src/source/mod.rs

//! Operation-definition sources.
//!
//! A `.qec` file groups operations into namespaces. Loading a file compiles
//! every operation into a VM [`Program`] and indexes it by its
//! namespace-qualified name, e.g. `QuantumErrorCorrection.TestBitFlipCode`.

pub mod lexer;
mod parser;

pub use parser::CompiledOperation;

use crate::core::{QecError, QecResult};
use crate::vm::Program;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Compiled operations keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct OperationLibrary {
    operations: BTreeMap<String, Program>,
}

impl OperationLibrary {
    /// Reads and compiles the source file at `path`.
    ///
    /// A file that cannot be read yields `QecError::BackendInitialization`;
    /// a malformed one yields `QecError::Parse`.
    pub fn load(path: &Path) -> QecResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| QecError::BackendInitialization {
            path: path.to_path_buf(),
            source,
        })?;
        let library = Self::parse_str(&text)?;
        debug!(path = %path.display(), operations = library.len(), "compiled operation source");
        Ok(library)
    }

    /// Compiles operation source text.
    pub fn parse_str(source: &str) -> QecResult<Self> {
        let mut operations = BTreeMap::new();
        for CompiledOperation { name, line, program } in parser::parse(source)? {
            if operations.contains_key(&name) {
                return Err(QecError::Parse {
                    line,
                    message: format!("operation '{}' is defined more than once", name),
                });
            }
            operations.insert(name, program);
        }
        Ok(Self { operations })
    }

    /// Looks up an operation by qualified name.
    pub fn get(&self, name: &str) -> Option<&Program> {
        self.operations.get(name)
    }

    /// Qualified names of all loaded operations, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Number of loaded operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if no operation was loaded.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
