use xgrid_hostast::{AnnotationParam, Constant, Expr, RawAnnotation};
use xgrid_types::{parse_annotation, Type, TypeAnnotation};
use xgrid_util::Location;

use crate::environment::{EnvEntry, Environment};
use crate::error::SemanticError;

/// Read an expression written where a type annotation is expected — the
/// first argument of `cast(T, expr)` — as a [`RawAnnotation`]. The host
/// sublanguage spells annotations with the same `Name`/`Subscript` forms it
/// uses for values, so `Grid[Float[64], 2]` arrives as nested `Subscript`
/// nodes rather than a dedicated annotation grammar.
pub fn expr_to_raw_annotation(e: &Expr) -> Result<RawAnnotation, SemanticError> {
	match e {
		Expr::Name { id, .. } => Ok(RawAnnotation {
			name: id.clone(),
			params: Vec::new(),
		}),
		Expr::Subscript { value, slice, .. } => {
			let Expr::Name { id, .. } = value.as_ref() else {
				return Err(SemanticError::new(
					e.location().clone(),
					"annotation base must be a name",
				));
			};
			let params = slice
				.iter()
				.map(|elem| match elem {
					Expr::Constant {
						value: Constant::Int(n),
						..
					} => Ok(AnnotationParam::IntLiteral(*n)),
					other => Ok(AnnotationParam::Annotation(expr_to_raw_annotation(other)?)),
				})
				.collect::<Result<Vec<_>, SemanticError>>()?;
			Ok(RawAnnotation {
				name: id.clone(),
				params,
			})
		}
		other => Err(SemanticError::new(
			other.location().clone(),
			"expected a type annotation expression",
		)),
	}
}

/// Turn a host-written [`RawAnnotation`] into a resolved [`Type`]. Built-in
/// annotation shapes (`Void`, `Bool`, `Int[n]`, `Float[n]`, `Ptr[T]`,
/// `Grid[T, D]`) are handed to [`parse_annotation`] after being translated
/// into a [`TypeAnnotation`] tree; any other name is looked up as a
/// previously-registered struct type in `env`.
pub fn resolve_annotation(
	raw: &RawAnnotation,
	env: &Environment,
	location: &Location,
) -> Result<Type, SemanticError> {
	match raw.name.as_str() {
		"Void" | "Bool" | "Int" | "Float" | "Ptr" | "Grid" => {
			let annot = to_type_annotation(raw, location)?;
			parse_annotation(&annot)
				.map_err(|e| SemanticError::new(location.clone(), format!("bad annotation: {e}")))
		}
		other => match env.get(other) {
			Some(EnvEntry::Type(t)) => Ok(t.clone()),
			_ => Err(SemanticError::new(
				location.clone(),
				format!("unknown type '{other}'"),
			)),
		},
	}
}

fn to_type_annotation(
	raw: &RawAnnotation,
	location: &Location,
) -> Result<TypeAnnotation, SemanticError> {
	let int_param = |i: usize| -> Result<i64, SemanticError> {
		match raw.params.get(i) {
			Some(AnnotationParam::IntLiteral(n)) => Ok(*n),
			_ => Err(SemanticError::new(
				location.clone(),
				format!("'{}' expects an integer literal parameter", raw.name),
			)),
		}
	};
	let annot_param = |i: usize| -> Result<&RawAnnotation, SemanticError> {
		match raw.params.get(i) {
			Some(AnnotationParam::Annotation(a)) => Ok(a),
			_ => Err(SemanticError::new(
				location.clone(),
				format!("'{}' expects a type parameter", raw.name),
			)),
		}
	};

	Ok(match raw.name.as_str() {
		"Void" => TypeAnnotation::Void,
		"Bool" => TypeAnnotation::Bool,
		"Int" => TypeAnnotation::Int(int_param(0)? as u16),
		"Float" => TypeAnnotation::Float(int_param(0)? as u16),
		"Ptr" => TypeAnnotation::Ptr(Box::new(to_type_annotation(annot_param(0)?, location)?)),
		"Grid" => TypeAnnotation::Grid(
			Box::new(to_type_annotation(annot_param(0)?, location)?),
			int_param(1)? as usize,
		),
		other => {
			return Err(SemanticError::new(
				location.clone(),
				format!("'{other}' is not a built-in annotation"),
			))
		}
	})
}
