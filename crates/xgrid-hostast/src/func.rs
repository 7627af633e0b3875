use xgrid_util::{Location, RString};

use crate::stmt::Stmt;

/// A type annotation as it was written in host source, before C1's
/// `parse_annotation` resolves it. `None` parts are spelled out by the
/// annotation's own shape in the host language; here we only need the bare
/// name and any bracketed parameters a parametric annotation carries, e.g.
/// `Grid[Float[64], 2]` arrives as `name: "Grid"`, `params: [Float[64], 2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
	pub name: RString,
	pub params: Vec<AnnotationParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationParam {
	Annotation(RawAnnotation),
	IntLiteral(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
	pub name: RString,
	pub annotation: Option<RawAnnotation>,
	pub location: Location,
}

/// One function definition: the unit a kernel/function/external binding
/// wraps. Mirrors Python's `ast.FunctionDef`, restricted to what a stencil
/// kernel body may contain.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
	pub name: RString,
	pub params: Vec<Param>,
	pub returns: Option<RawAnnotation>,
	pub body: Vec<Stmt>,
	pub location: Location,
}
