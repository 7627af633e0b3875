use std::path::PathBuf;

use xgrid_util::RString;

/// Raised while invoking the system C compiler. A compile failure is fatal
/// for the kernel being built, but does not poison the cache — the next
/// `compile` call will retry from scratch since the source file is only
/// written once its content has been decided to be the cache key.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
	#[error("no usable C compiler found among {tried:?}")]
	CompilerNotFound { tried: Vec<String> },

	#[error("failed to create compiler cache directory '{}': {reason}", path.display())]
	CacheDirUnavailable { path: PathBuf, reason: String },

	#[error("failed to invoke compiler '{cc}': {reason}")]
	SpawnFailed { cc: String, reason: String },

	#[error("compiling '{}' failed with exit status {status}:\n{stderr}", source_path.display())]
	CompileFailed {
		source_path: PathBuf,
		status: String,
		stderr: String,
	},
}

impl BuildError {
	pub(crate) fn log(self) -> Self {
		log::error!("{self}");
		self
	}
}

/// Raised while loading a compiled library or binding one of its symbols.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LinkError {
	#[error("failed to load library '{}': {reason}", path.display())]
	LoadFailed { path: PathBuf, reason: String },

	#[error("symbol '{symbol}' not found in '{}'", path.display())]
	SymbolNotFound { path: PathBuf, symbol: RString },

	#[error("kernel '{name}' returns {return_type}, which cannot cross the dynamic FFI boundary by value (only Void, Bool, Int, and Float returns are supported)")]
	UnsupportedReturnType { name: RString, return_type: String },
}

impl LinkError {
	pub(crate) fn log(self) -> Self {
		log::error!("{self}");
		self
	}
}

/// Raised at call time when the arguments given to a bound kernel don't
/// match its `Signature`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArgumentError {
	#[error("kernel '{name}' takes {expected} arguments, got {got}")]
	ArityMismatch { name: RString, expected: usize, got: usize },

	#[error("kernel '{name}' argument {index} ('{param}'): {reason}")]
	TypeMismatch {
		name: RString,
		index: usize,
		param: RString,
		reason: String,
	},
}

impl ArgumentError {
	pub(crate) fn log(self) -> Self {
		log::error!("{self}");
		self
	}
}
