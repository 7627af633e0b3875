mod annotation;
mod expr;
mod stmt;
#[cfg(test)]
mod test;

use indexmap::IndexMap;
use xgrid_hostast::FunctionDef;
use xgrid_ir::{DefinitionMode, Signature, Statement, Variable};
use xgrid_types::{FloatWidth, Type, ValueType};
use xgrid_util::RString;

use crate::context::ContextStack;
use crate::environment::Environment;
use crate::error::SemanticError;

pub use annotation::resolve_annotation;

/// The result of lowering one [`FunctionDef`]: the typed `Definition`
/// statement plus the `import` statements it contained, recorded as include
/// requests rather than IR (they produce no runtime statements).
#[derive(Debug, Clone)]
pub struct LoweredFunction {
	pub definition: Statement,
	pub includes: Vec<RString>,
}

/// Mutable state threaded through one function's lowering: the growing local
/// scope, the context stack, and the handful of facts fixed for the whole
/// definition (its declared return type, the environment it resolves names
/// against, the configured default float precision for untyped literals and
/// `^`-widening).
pub(crate) struct Lowerer<'a> {
	pub(crate) env: &'a Environment,
	pub(crate) scope: IndexMap<RString, Variable>,
	pub(crate) context: ContextStack,
	pub(crate) return_type: Type,
	pub(crate) default_precision: FloatWidth,
	pub(crate) includes: Vec<RString>,
}

/// Lower one host function definition into a typed IR `Definition`.
///
/// `self_type` supplies the type of an un-annotated first parameter — the
/// carve-out SPEC_FULL.md's signature-lowering rule makes for a method
/// receiver, whose type isn't written in source but is known to whoever is
/// binding this function as a method on a struct.
pub fn lower_function(
	func: &FunctionDef,
	mode: DefinitionMode,
	env: &Environment,
	default_precision: FloatWidth,
	self_type: Option<ValueType>,
) -> Result<LoweredFunction, SemanticError> {
	let location = func.location.clone();

	let return_type = match &func.returns {
		Some(raw) => resolve_annotation(raw, env, &location)?,
		None => {
			return Err(SemanticError::new(
				location,
				"kernel/function definitions require an explicit return annotation",
			))
		}
	};
	if matches!(return_type, Type::Reference(_)) {
		return Err(SemanticError::new(
			location,
			format!("return type may not be a reference type: {return_type}"),
		));
	}

	let mut scope = IndexMap::new();
	let mut args = Vec::with_capacity(func.params.len());

	for (i, param) in func.params.iter().enumerate() {
		let ty = match (&param.annotation, i == 0, &self_type) {
			(Some(raw), _, _) => resolve_annotation(raw, env, &param.location)?,
			(None, true, Some(recv)) => Type::Value(recv.clone()),
			_ => {
				return Err(SemanticError::new(
					param.location.clone(),
					format!("parameter '{}' requires a type annotation", param.name),
				))
			}
		};
		args.push((param.name.clone(), ty.clone()));
		scope.insert(param.name.clone(), Variable::new(param.name.clone(), ty));
	}

	let signature = Signature::new(args, return_type.clone());

	let body = if mode == DefinitionMode::External {
		Vec::new()
	} else {
		let mut lowerer = Lowerer {
			env,
			scope,
			context: ContextStack::new(mode),
			return_type,
			default_precision,
			includes: Vec::new(),
		};
		let body = lowerer.lower_block(&func.body)?;
		scope = lowerer.scope;
		let includes = lowerer.includes;
		return Ok(LoweredFunction {
			definition: Statement::Definition {
				name: func.name.clone(),
				mode,
				signature,
				scope,
				body,
				location,
			},
			includes,
		});
	};

	Ok(LoweredFunction {
		definition: Statement::Definition {
			name: func.name.clone(),
			mode,
			signature,
			scope,
			body,
			location,
		},
		includes: Vec::new(),
	})
}
