//! [`Compiler`]: drives a system C compiler to turn generated source into a
//! shared library, caching the result on disk keyed by a content
//! fingerprint — a direct port of `util/ffi.py`'s `Compiler`, with `md5`
//! swapped for `sha3` (the hash crate already in this workspace's
//! dependency stack) and `subprocess.Popen` swapped for
//! `std::process::Command`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use sha3::{Digest, Sha3_256};

use crate::error::BuildError;

pub struct Compiler {
	cache_root: PathBuf,
	cc: PathBuf,
}

impl Compiler {
	/// Locate the first of `cc_candidates` found on `PATH` and create
	/// `cache_root` if it doesn't already exist.
	pub fn new(cache_root: impl Into<PathBuf>, cc_candidates: &[&str]) -> Result<Self, BuildError> {
		let cache_root = cache_root.into();
		fs::create_dir_all(&cache_root).map_err(|e| {
			BuildError::CacheDirUnavailable {
				path: cache_root.clone(),
				reason: e.to_string(),
			}
			.log()
		})?;

		let cc = cc_candidates
			.iter()
			.find_map(|&name| which::which(name).ok())
			.ok_or_else(|| {
				BuildError::CompilerNotFound {
					tried: cc_candidates.iter().map(|s| (*s).to_owned()).collect(),
				}
				.log()
			})?;

		log::info!("compiler initialized with cache_root = '{}', cc = '{}'", cache_root.display(), cc.display());
		Ok(Self { cache_root, cc })
	}

	/// Compile `source` with `cflags`, returning the path to the resulting
	/// shared library. If an identical (flags included) source was already
	/// compiled, the cached library is returned without invoking the
	/// compiler again.
	pub fn compile(&self, source: &str, cflags: &[String]) -> Result<PathBuf, BuildError> {
		let mut args = vec!["-fPIC".to_owned(), "-shared".to_owned()];
		args.extend(cflags.iter().cloned());

		// The flags are baked into the cache key via this header comment, so
		// a flag change alone is enough to invalidate a stale cache entry.
		let annotated = format!("// {} {}\n{source}", self.cc.display(), args.join(" "));

		let mut hasher = Sha3_256::new();
		hasher.update(annotated.as_bytes());
		let stem: String = hasher.finalize().iter().map(|b| format!("{b:02x}")).collect();

		let source_path = self.cache_root.join(format!("{stem}.c"));
		let lib_path = self.cache_root.join(format!("{stem}.so"));

		let cached = fs::read_to_string(&source_path).map(|existing| existing == annotated).unwrap_or(false);

		if !cached {
			fs::write(&source_path, &annotated).map_err(|e| {
				BuildError::CacheDirUnavailable {
					path: source_path.clone(),
					reason: e.to_string(),
				}
				.log()
			})?;

			self.run_compiler(&args, &source_path, &lib_path)?;
		}

		log::info!(
			"jit compiled '{}' {} cache to '{}'",
			source_path.display(),
			if cached { "with" } else { "without" },
			lib_path.display()
		);
		Ok(lib_path)
	}

	fn run_compiler(&self, args: &[String], source_path: &Path, lib_path: &Path) -> Result<(), BuildError> {
		let output = Command::new(&self.cc)
			.args(args)
			.arg(source_path)
			.arg("-o")
			.arg(lib_path)
			.output()
			.map_err(|e| {
				BuildError::SpawnFailed {
					cc: self.cc.display().to_string(),
					reason: e.to_string(),
				}
				.log()
			})?;

		if !output.status.success() {
			return Err(BuildError::CompileFailed {
				source_path: source_path.to_owned(),
				status: output.status.to_string(),
				stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
			}
			.log());
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn compiler() -> Option<Compiler> {
		let dir = std::env::temp_dir().join(format!("xgrid-exec-test-{}", std::process::id()));
		Compiler::new(dir, &["cc", "gcc", "clang"]).ok()
	}

	#[test]
	fn compiling_twice_reuses_the_cached_library() {
		let Some(compiler) = compiler() else {
			return; // no system compiler available in this environment
		};
		let source = "int answer(void) { return 42; }";
		let first = compiler.compile(source, &[]).unwrap();
		let second = compiler.compile(source, &[]).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn changing_flags_changes_the_cache_key() {
		let Some(compiler) = compiler() else {
			return;
		};
		let source = "int answer(void) { return 42; }";
		let no_flags = compiler.compile(source, &[]).unwrap();
		let with_flag = compiler.compile(source, &["-O2".to_owned()]).unwrap();
		assert_ne!(no_flags, with_flag);
	}

	#[test]
	fn missing_compiler_is_reported() {
		let dir = std::env::temp_dir().join(format!("xgrid-exec-test-missing-{}", std::process::id()));
		let err = Compiler::new(dir, &["definitely-not-a-real-compiler"]).unwrap_err();
		assert!(matches!(err, BuildError::CompilerNotFound { .. }));
	}
}
