use xgrid_util::{Location, RString};

/// An invariant violation discovered while emitting C for a kernel. Every
/// variant here is a configuration or authoring mistake caught before any
/// external compiler ever sees the generated source — there is no partial
/// recovery, the same single-fatal-error posture C3's `SemanticError` uses.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodegenError {
	#[error("{location}: kernel '{name}' updates grid '{grid}' in place at mask 0 (implicit in-place); this requires parallel execution to be enabled")]
	ImplicitInPlaceRequiresParallel {
		name: RString,
		grid: RString,
		location: Location,
	},

	#[error("code generation only applies to 'kernel' definitions, got {mode:?} definition '{name}'")]
	NotAKernel {
		name: RString,
		mode: xgrid_ir::DefinitionMode,
	},

	#[error("{location}: a stencil read or write may only appear as the target or right-hand side of an assignment, not in a bare expression")]
	StencilOutsideAssignment { location: Location },
}

impl CodegenError {
	pub(crate) fn log(self) -> Self {
		log::error!("{self}");
		self
	}
}
