use xgrid_hostast::FunctionDef;
use xgrid_ir::DefinitionMode;
use xgrid_types::ValueType;
use xgrid_util::RString;

/// A host function bound as a kernel, plain function, or `external`
/// declaration — ported from `lang/operator.py`'s `Operator`. Unlike the
/// original's decorator (which wraps a live host callable), this only holds
/// the data a kernel needs to be lowered and compiled; `invoke` is the
/// explicit substitute for `Operator.__call__`.
#[derive(Debug, Clone)]
pub struct Operator {
	pub func: FunctionDef,
	pub mode: DefinitionMode,
	pub name: RString,
	pub includes: Vec<RString>,
	/// Set when this operator is bound as a method: the type of the
	/// receiver prepended as the first call argument (see the "Receivers
	/// and methods" design note).
	pub receiver_type: Option<ValueType>,
}

impl Operator {
	#[must_use]
	pub fn kernel(func: FunctionDef) -> Self {
		Self::new(func, DefinitionMode::Kernel)
	}

	#[must_use]
	pub fn function(func: FunctionDef) -> Self {
		Self::new(func, DefinitionMode::Function)
	}

	#[must_use]
	pub fn external(func: FunctionDef) -> Self {
		Self::new(func, DefinitionMode::External)
	}

	fn new(func: FunctionDef, mode: DefinitionMode) -> Self {
		let name = func.name.clone();
		Self {
			func,
			mode,
			name,
			includes: Vec::new(),
			receiver_type: None,
		}
	}

	#[must_use]
	pub fn with_name(mut self, name: impl Into<RString>) -> Self {
		self.name = name.into();
		self
	}

	#[must_use]
	pub fn with_includes(mut self, includes: Vec<RString>) -> Self {
		self.includes = includes;
		self
	}

	#[must_use]
	pub fn as_method_of(mut self, receiver_type: ValueType) -> Self {
		self.receiver_type = Some(receiver_type);
		self
	}
}
