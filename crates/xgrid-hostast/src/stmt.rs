use xgrid_util::{Location, RString};

use crate::expr::Expr;
use crate::func::RawAnnotation;

/// One statement node, restricted to the forms the sublanguage in C3
/// recognizes. `With` carries the raw context-manager call so C3 can tell a
/// `boundary(mask)` block from a `c()` inline-C block from an unsupported
/// one.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
	Expr {
		value: Expr,
		location: Location,
	},
	Assign {
		target: Expr,
		annotation: Option<RawAnnotation>,
		value: Expr,
		location: Location,
	},
	AugAssign {
		target: Expr,
		op: crate::expr::BinOpKind,
		value: Expr,
		location: Location,
	},
	Return {
		value: Option<Expr>,
		location: Location,
	},
	If {
		test: Expr,
		body: Vec<Stmt>,
		orelse: Vec<Stmt>,
		location: Location,
	},
	While {
		test: Expr,
		body: Vec<Stmt>,
		location: Location,
	},
	For {
		target: RString,
		start: Expr,
		stop: Expr,
		step: Expr,
		body: Vec<Stmt>,
		location: Location,
	},
	With {
		context: Expr,
		body: Vec<Stmt>,
		location: Location,
	},
	Import {
		module: RString,
		location: Location,
	},
}

impl Stmt {
	#[must_use]
	pub fn location(&self) -> &Location {
		match self {
			Stmt::Expr { location, .. }
			| Stmt::Assign { location, .. }
			| Stmt::AugAssign { location, .. }
			| Stmt::Return { location, .. }
			| Stmt::If { location, .. }
			| Stmt::While { location, .. }
			| Stmt::For { location, .. }
			| Stmt::With { location, .. }
			| Stmt::Import { location, .. } => location,
		}
	}
}
