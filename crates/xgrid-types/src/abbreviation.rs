use crate::{ReferenceType, Type, ValueType};

/// Deterministic, collision-free short name for `t`, used to build emitted C
/// identifiers (accessor function names, record tags). Distinct types must
/// never collapse to the same abbreviation: struct names are already unique
/// per [`crate::StructType`] registration, and the width suffixes below are
/// exhaustive over [`crate::IntWidth`]/[`crate::FloatWidth`], so no two
/// branches here can produce the same string for different inputs.
#[must_use]
pub fn abbreviation(t: &Type) -> String {
	match t {
		Type::Void => "void".to_owned(),
		Type::Value(v) => value_abbreviation(v),
		Type::Reference(r) => match r {
			ReferenceType::Ptr(elem) => format!("__Ptr_{}", value_abbreviation(elem)),
			ReferenceType::Grid(elem, dim) => {
				format!("__Grid{dim}d_{}", value_abbreviation(elem))
			}
		},
	}
}

fn value_abbreviation(v: &ValueType) -> String {
	match v {
		ValueType::Bool => "b".to_owned(),
		ValueType::Int(w) => format!("i{}", w.bits()),
		ValueType::Float(w) => format!("f{}", w.bits()),
		ValueType::Struct(s) => format!("st{}", s.name),
	}
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use xgrid_util::RString;

	use super::*;
	use crate::{FloatWidth, IntWidth, StructType};

	#[test]
	fn scalars_abbreviate_as_spec_examples() {
		assert_eq!(abbreviation(&Type::Value(ValueType::Bool)), "b");
		assert_eq!(
			abbreviation(&Type::Value(ValueType::Int(IntWidth::W32))),
			"i32"
		);
		assert_eq!(
			abbreviation(&Type::Value(ValueType::Float(FloatWidth::F64))),
			"f64"
		);
	}

	#[test]
	fn struct_abbreviates_with_name() {
		let s = Arc::new(StructType {
			name: RString::new("Particle"),
			fields: vec![],
		});
		assert_eq!(
			abbreviation(&Type::Value(ValueType::Struct(s))),
			"stParticle"
		);
	}

	#[test]
	fn distinct_int_widths_never_collide() {
		let abbrevs: Vec<_> = [IntWidth::W8, IntWidth::W16, IntWidth::W32, IntWidth::W64]
			.into_iter()
			.map(|w| abbreviation(&Type::Value(ValueType::Int(w))))
			.collect();
		let mut unique = abbrevs.clone();
		unique.sort();
		unique.dedup();
		assert_eq!(abbrevs.len(), unique.len());
	}

	#[test]
	fn grid_abbreviation_carries_dimension_and_element() {
		let t = Type::Reference(ReferenceType::Grid(ValueType::Float(FloatWidth::F32), 2));
		assert_eq!(abbreviation(&t), "__Grid2d_f32");
	}
}
