use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors that can occur while discovering and resolving classes
#[derive(Error, Debug)]
pub enum ResolveError {
    /// I/O error reading a file
    #[error("Failed to read file {}: {}", path.display(), source)]
    Io { path: PathBuf, source: io::Error },

    /// Package root is missing or not a directory
    #[error("Invalid package root {}: {}", path.display(), message)]
    InvalidRoot { path: PathBuf, message: String },

    /// Invalid discovery options
    #[error("Invalid discovery options: {message}")]
    InvalidOptions { message: String },

    /// Referenced package was never registered
    #[error("Unknown package: {name}")]
    UnknownPackage { name: String },

    /// Dotted name with no module prefix inside its package
    #[error("Cannot resolve dotted name {name} inside package {package}")]
    UnresolvableDottedName { name: String, package: String },

    /// Python source failed to parse
    #[error("Malformed source in {}: {}", path.display(), message)]
    MalformedSource { path: PathBuf, message: String },
}

impl ResolveError {
    /// Create an Io error from a path and io::Error
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ResolveError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an InvalidRoot error
    pub fn invalid_root(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ResolveError::InvalidRoot {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidOptions error
    pub fn invalid_options(message: impl Into<String>) -> Self {
        ResolveError::InvalidOptions {
            message: message.into(),
        }
    }

    /// Create an UnknownPackage error
    pub fn unknown_package(name: impl Into<String>) -> Self {
        ResolveError::UnknownPackage { name: name.into() }
    }

    /// Create an UnresolvableDottedName error
    pub fn unresolvable_dotted_name(name: impl Into<String>, package: impl Into<String>) -> Self {
        ResolveError::UnresolvableDottedName {
            name: name.into(),
            package: package.into(),
        }
    }

    /// Create a MalformedSource error
    pub fn malformed_source(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ResolveError::MalformedSource {
            path: path.into(),
            message: message.into(),
        }
    }
}
