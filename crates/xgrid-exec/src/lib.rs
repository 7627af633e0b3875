//! Compiles generated C, caches the result on disk, and binds and calls its
//! symbols through a dynamic foreign-function call (component C6).
//!
//! Kernel C signatures vary per-kernel and aren't known until a kernel is
//! actually generated, so a statically-typed function pointer can't express
//! the call the way a fixed FFI surface would. See `loader` for how this is
//! resolved.

mod compiler;
mod error;
mod loader;

pub use compiler::Compiler;
pub use error::{ArgumentError, BuildError, LinkError};
pub use loader::{bind, load, BoundKernel, CallArg};

use xgrid_ir::Signature;
use xgrid_util::RString;

/// Compile `source`, load the resulting library, and bind `entry_point` to
/// `signature` in one step — the common path from generated C straight to a
/// callable kernel.
pub fn build_and_bind(
	compiler: &Compiler,
	source: &str,
	cflags: &[String],
	entry_point: &str,
	name: &RString,
	signature: &Signature,
) -> Result<BoundKernel, ExecError> {
	let lib_path = compiler.compile(source, cflags)?;
	let library = load(&lib_path)?;
	let kernel = bind(&library, &lib_path, entry_point, name, signature)?;
	Ok(kernel)
}

/// Either half of the compile-then-bind pipeline can fail; this wraps both
/// so [`build_and_bind`] has a single error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecError {
	#[error(transparent)]
	Build(#[from] BuildError),
	#[error(transparent)]
	Link(#[from] LinkError),
}

/// The seam an embedding `Context` (C7) calls through to turn generated
/// source into a bound kernel — implemented for real by [`Compiler`], and by
/// a test double in an embedder's own test suite so exercising the cache and
/// invocation logic doesn't require a system C compiler.
pub trait Builder {
	fn build_and_bind(
		&self,
		source: &str,
		cflags: &[String],
		entry_point: &str,
		name: &RString,
		signature: &Signature,
	) -> Result<BoundKernel, ExecError>;
}

impl Builder for Compiler {
	fn build_and_bind(
		&self,
		source: &str,
		cflags: &[String],
		entry_point: &str,
		name: &RString,
		signature: &Signature,
	) -> Result<BoundKernel, ExecError> {
		build_and_bind(self, source, cflags, entry_point, name, signature)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use xgrid_types::{FloatWidth, HostValue, IntWidth, Type, ValueType};

	fn compiler() -> Option<Compiler> {
		let dir = std::env::temp_dir().join(format!("xgrid-exec-lib-test-{}", std::process::id()));
		Compiler::new(dir, &["cc", "gcc", "clang"]).ok()
	}

	#[test]
	fn build_and_bind_calls_a_real_kernel() {
		let Some(compiler) = compiler() else {
			return;
		};
		let source = "double scale(double x, int32_t n) { return x * (double)n; }";
		let signature = Signature::new(
			vec![
				(RString::new("x"), Type::Value(ValueType::Float(FloatWidth::F64))),
				(RString::new("n"), Type::Value(ValueType::Int(IntWidth::W32))),
			],
			Type::Value(ValueType::Float(FloatWidth::F64)),
		);
		let kernel = build_and_bind(&compiler, source, &[], "scale", &RString::new("scale"), &signature).unwrap();

		let result = kernel
			.call(&[CallArg::Value(HostValue::Float64(2.5)), CallArg::Value(HostValue::Int32(4))])
			.unwrap();
		assert_eq!(result, Some(HostValue::Float64(10.0)));
	}

	#[test]
	fn build_and_bind_calls_a_void_kernel() {
		let Some(compiler) = compiler() else {
			return;
		};
		let source = "void noop(void) {}";
		let signature = Signature::new(vec![], Type::Void);
		let kernel = build_and_bind(&compiler, source, &[], "noop", &RString::new("noop"), &signature).unwrap();
		assert_eq!(kernel.call(&[]).unwrap(), None);
	}

	#[test]
	fn bind_rejects_struct_return() {
		use std::sync::Arc as StdArc;
		use xgrid_types::StructType;

		let Some(compiler) = compiler() else {
			return;
		};
		let source = "struct Pair { int32_t a; int32_t b; };\nstruct Pair make(void) { struct Pair p = {1, 2}; return p; }";
		let lib_path = compiler.compile(source, &[]).unwrap();
		let library = load(&lib_path).unwrap();
		let s = StdArc::new(StructType {
			name: RString::new("Pair"),
			fields: vec![
				(RString::new("a"), ValueType::Int(IntWidth::W32)),
				(RString::new("b"), ValueType::Int(IntWidth::W32)),
			],
		});
		let signature = Signature::new(vec![], Type::Value(ValueType::Struct(s)));
		let err = bind(&library, &lib_path, "make", &RString::new("make"), &signature).unwrap_err();
		assert!(matches!(err, LinkError::UnsupportedReturnType { .. }));
	}
}
