use std::fmt;

use crate::RString;

/// Where a node came from in the host source: the file it was defined in,
/// the enclosing function's name, and a line number. Carried by every host
/// AST node and every IR node so diagnostics can always point somewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
	pub file: RString,
	pub func: RString,
	pub line: u32,
}

impl Location {
	#[must_use]
	pub fn new(file: impl Into<RString>, func: impl Into<RString>, line: u32) -> Self {
		Self {
			file: file.into(),
			func: func.into(),
			line,
		}
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "File {}, line {}, in {}", self.file, self.line, self.func)
	}
}
