use xgrid_types::Type;
use xgrid_util::RString;

/// A named, typed storage slot: a parameter, a local, or a loop variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
	pub name: RString,
	pub ty: Type,
}

impl Variable {
	#[must_use]
	pub fn new(name: impl Into<RString>, ty: Type) -> Self {
		Self {
			name: name.into(),
			ty,
		}
	}
}

/// A callable's argument list and return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
	pub args: Vec<(RString, Type)>,
	pub return_type: Type,
}

impl Signature {
	#[must_use]
	pub fn new(args: Vec<(RString, Type)>, return_type: Type) -> Self {
		Self { args, return_type }
	}

	#[must_use]
	pub fn arg_type(&self, name: &str) -> Option<&Type> {
		self.args.iter().find(|(n, _)| n.as_str() == name).map(|(_, t)| t)
	}
}
