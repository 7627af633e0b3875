use xgrid_util::RString;

/// A shape or index mismatch raised by a [`crate::Grid`] operation. These
/// abort the current invocation only — they never propagate as a fatal
/// compile-time error the way `xgrid_parse::SemanticError` or
/// `xgrid_codegen::CodegenError` do.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ShapeError {
	#[error("fill data has {got} cells, grid '{name}' has {expected}")]
	FillLengthMismatch { name: RString, expected: usize, got: usize },

	#[error("boundary index {index:?} is out of range for grid '{name}' with shape {shape:?}")]
	IndexOutOfRange { name: RString, index: Vec<i64>, shape: Vec<i32> },

	#[error("time offset {time} is deeper than grid '{name}''s history, which has {depth} buffers")]
	TimeIndexOutOfRange { name: RString, time: i64, depth: usize },

	#[error("grid '{name}', fill cell {cell}: {source}")]
	ElementTypeMismatch {
		name: RString,
		cell: usize,
		#[source]
		source: xgrid_types::TypeSystemError,
	},
}

impl ShapeError {
	pub(crate) fn log(self) -> Self {
		log::error!("{self}");
		self
	}
}
