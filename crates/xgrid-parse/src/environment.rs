use rustc_hash::FxHashMap;
use xgrid_ir::{ConstantValue, DefinitionMode, Signature};
use xgrid_types::{Type, ValueType};
use xgrid_util::RString;

/// A pragma keyword recognized by `with` statements: `with c(): ...` for
/// raw-C inline blocks, `with boundary(mask): ...` for boundary contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pragma {
	C,
	Boundary,
}

/// A callable binding in the [`Environment`]: a compiled kernel, a plain
/// function, or an `external` declaration. `receiver_type` is set when this
/// operator is a method — the call-site resolver then prepends the receiver
/// as the first argument (see the "Receivers and methods" design note).
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorHandle {
	pub name: RString,
	pub mode: DefinitionMode,
	pub signature: Signature,
	pub receiver_type: Option<ValueType>,
}

/// What a free name in kernel source may resolve to when the local scope
/// doesn't have it.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvEntry {
	Constant(ConstantValue),
	Operator(OperatorHandle),
	Type(Type),
	Pragma(Pragma),
}

/// The explicit substitute for "reach into host globals": every free name a
/// kernel body references resolves by lookup here, never through a hidden
/// global namespace. Constructed once by the host embedding this crate and
/// passed in alongside the host AST and `Config`.
#[derive(Debug, Clone, Default)]
pub struct Environment(FxHashMap<RString, EnvEntry>);

impl Environment {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, name: impl Into<RString>, entry: EnvEntry) {
		self.0.insert(name.into(), entry);
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&EnvEntry> {
		self.0.get(name)
	}

	/// A fresh `Environment` pre-populated with the built-in pragmas (`c`,
	/// `boundary`). `shape`/`dimension` are recognized directly by the call
	/// resolver and need no environment entry.
	#[must_use]
	pub fn with_builtins() -> Self {
		let mut env = Self::new();
		env.insert("c", EnvEntry::Pragma(Pragma::C));
		env.insert("boundary", EnvEntry::Pragma(Pragma::Boundary));
		env
	}

	/// Every name bound to a callable [`OperatorHandle`] — the subset of
	/// this environment a codegen call resolver treats as a real callable
	/// rather than a struct constructor.
	pub fn operators(&self) -> impl Iterator<Item = (&RString, &OperatorHandle)> {
		self.0.iter().filter_map(|(name, entry)| match entry {
			EnvEntry::Operator(handle) => Some((name, handle)),
			_ => None,
		})
	}
}
