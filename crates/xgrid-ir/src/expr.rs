use xgrid_types::Type;
use xgrid_util::{Location, RString};

use crate::operator::{BinOp, CmpOp, LogicOp, UnaryOp};
use crate::variable::Variable;

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
	Bool(bool),
	Int8(i8),
	Int16(i16),
	Int32(i32),
	Int64(i64),
	Float32(f32),
	Float64(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilCtx {
	Load,
	Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridInfoKind {
	Shape,
	Dimension,
}

/// A `grid[i1, …, iD]` or `grid[i1, …, iD][t]` subscript, lifted by C3 to its
/// own node rather than a generic index: the time offset, the per-axis space
/// offset, and the boundary mask captured from the context stack at the
/// point the subscript was written (0 if none was active).
#[derive(Debug, Clone, PartialEq)]
pub struct Stencil {
	pub grid: Variable,
	pub time_offset: i64,
	pub space_offset: Vec<i64>,
	pub boundary_mask: i32,
	pub ctx: StencilCtx,
	pub location: Location,
}

/// A typed expression node. Every variant carries the [`Type`] C3 resolved
/// for it, so later passes never need to re-infer.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
	Constant {
		value: ConstantValue,
		ty: Type,
		location: Location,
	},
	Identifier {
		variable: Variable,
		location: Location,
	},
	Access {
		base: Box<Expression>,
		field: RString,
		ty: Type,
		location: Location,
	},
	Stencil(Stencil),
	Binary {
		op: BinOp,
		left: Box<Expression>,
		right: Box<Expression>,
		ty: Type,
		location: Location,
	},
	Compare {
		op: CmpOp,
		left: Box<Expression>,
		right: Box<Expression>,
		location: Location,
	},
	Logic {
		op: LogicOp,
		left: Box<Expression>,
		right: Box<Expression>,
		location: Location,
	},
	Unary {
		op: UnaryOp,
		operand: Box<Expression>,
		ty: Type,
		location: Location,
	},
	Condition {
		test: Box<Expression>,
		body: Box<Expression>,
		orelse: Box<Expression>,
		ty: Type,
		location: Location,
	},
	Cast {
		target: Type,
		value: Box<Expression>,
		location: Location,
	},
	Call {
		operator: RString,
		args: Vec<Expression>,
		ty: Type,
		location: Location,
	},
	GridInfo {
		kind: GridInfoKind,
		grid: Variable,
		dim: Option<usize>,
		location: Location,
	},
}

impl Expression {
	#[must_use]
	pub fn ty(&self) -> Type {
		match self {
			Expression::Constant { ty, .. }
			| Expression::Access { ty, .. }
			| Expression::Binary { ty, .. }
			| Expression::Unary { ty, .. }
			| Expression::Condition { ty, .. }
			| Expression::Call { ty, .. } => ty.clone(),
			Expression::Identifier { variable, .. } => variable.ty.clone(),
			Expression::Stencil(s) => match &s.grid.ty {
				Type::Reference(xgrid_types::ReferenceType::Grid(elem, _)) => {
					Type::Value(elem.clone())
				}
				_ => unreachable!("Stencil target must be grid-typed"),
			},
			Expression::Compare { .. } => Type::Value(xgrid_types::ValueType::Bool),
			Expression::Logic { .. } => Type::Value(xgrid_types::ValueType::Bool),
			Expression::Cast { target, .. } => target.clone(),
			Expression::GridInfo { .. } => {
				Type::Value(xgrid_types::ValueType::Int(xgrid_types::IntWidth::W32))
			}
		}
	}

	#[must_use]
	pub fn location(&self) -> &Location {
		match self {
			Expression::Constant { location, .. }
			| Expression::Identifier { location, .. }
			| Expression::Access { location, .. }
			| Expression::Binary { location, .. }
			| Expression::Compare { location, .. }
			| Expression::Logic { location, .. }
			| Expression::Unary { location, .. }
			| Expression::Condition { location, .. }
			| Expression::Cast { location, .. }
			| Expression::Call { location, .. }
			| Expression::GridInfo { location, .. } => location,
			Expression::Stencil(s) => &s.location,
		}
	}
}
