use xgrid_codegen::CodegenError;
use xgrid_exec::{ArgumentError, BuildError, LinkError};
use xgrid_parse::SemanticError;
use xgrid_runtime::ShapeError;
use xgrid_types::TypeSystemError;

/// The union of every layer's error type, surfaced at whichever call site
/// triggered it — there is no retry and no swallowing anywhere in this
/// crate. Parser and codegen errors are fatal for the kernel definition that
/// produced them; argument and shape errors abort only the current
/// invocation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Semantic(#[from] SemanticError),
	#[error(transparent)]
	TypeSystem(#[from] TypeSystemError),
	#[error(transparent)]
	Codegen(#[from] CodegenError),
	#[error(transparent)]
	Build(#[from] BuildError),
	#[error(transparent)]
	Link(#[from] LinkError),
	#[error(transparent)]
	Argument(#[from] ArgumentError),
	#[error(transparent)]
	Shape(#[from] ShapeError),
}

impl From<xgrid_exec::ExecError> for Error {
	fn from(value: xgrid_exec::ExecError) -> Self {
		match value {
			xgrid_exec::ExecError::Build(e) => Error::Build(e),
			xgrid_exec::ExecError::Link(e) => Error::Link(e),
		}
	}
}
