use indexmap::IndexMap;
use xgrid_types::Type;
use xgrid_util::{Location, RString};

use crate::expr::{Expression, Stencil};
use crate::variable::{Signature, Variable};

/// An assignment target: a bare local, a field projection, or a stencil
/// store. Kept separate from [`Expression`] because an assignment's
/// left-hand side is resolved differently from a read (a bare name may
/// introduce a new local; a stencil subscript is always a store).
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
	Identifier(Variable),
	Access {
		base: Box<Terminal>,
		field: RString,
		ty: Type,
	},
	Stencil(Stencil),
}

impl Terminal {
	#[must_use]
	pub fn ty(&self) -> Type {
		match self {
			Terminal::Identifier(v) => v.ty.clone(),
			Terminal::Access { ty, .. } => ty.clone(),
			Terminal::Stencil(s) => match &s.grid.ty {
				Type::Reference(xgrid_types::ReferenceType::Grid(elem, _)) => {
					Type::Value(elem.clone())
				}
				_ => unreachable!("Stencil target must be grid-typed"),
			},
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionMode {
	Kernel,
	Function,
	External,
}

/// One statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
	Return {
		value: Option<Expression>,
		location: Location,
	},
	Break {
		location: Location,
	},
	Continue {
		location: Location,
	},
	If {
		condition: Expression,
		body: Vec<Statement>,
		orelse: Vec<Statement>,
		location: Location,
	},
	While {
		condition: Expression,
		body: Vec<Statement>,
		location: Location,
	},
	For {
		variable: Variable,
		start: Expression,
		end: Expression,
		step: Expression,
		body: Vec<Statement>,
		location: Location,
	},
	Evaluation {
		value: Expression,
		location: Location,
	},
	Assignment {
		terminal: Terminal,
		value: Expression,
		location: Location,
	},
	Inline {
		source: RString,
		location: Location,
	},
	Definition {
		name: RString,
		mode: DefinitionMode,
		signature: Signature,
		scope: IndexMap<RString, Variable>,
		body: Vec<Statement>,
		location: Location,
	},
}

impl Statement {
	#[must_use]
	pub fn location(&self) -> &Location {
		match self {
			Statement::Return { location, .. }
			| Statement::Break { location }
			| Statement::Continue { location }
			| Statement::If { location, .. }
			| Statement::While { location, .. }
			| Statement::For { location, .. }
			| Statement::Evaluation { location, .. }
			| Statement::Assignment { location, .. }
			| Statement::Inline { location, .. }
			| Statement::Definition { location, .. } => location,
		}
	}
}
