use indexmap::IndexMap;
use xgrid_ir::{
	BinOp, ConstantValue, DefinitionMode, Expression, Signature, Statement, Stencil, StencilCtx, Terminal, Variable,
};
use xgrid_types::{FloatWidth, ReferenceType, Type, ValueType};
use xgrid_util::{Location, RString};

use crate::{generate, CodegenError, CodegenOptions, OverstepPolicy};

fn loc() -> Location {
	Location::new("k.xgk", "diffuse", 1)
}

fn grid_var(name: &str) -> Variable {
	Variable::new(name, Type::Reference(ReferenceType::Grid(ValueType::Float(FloatWidth::F64), 1)))
}

fn const_f64(v: f64) -> Expression {
	Expression::Constant {
		value: ConstantValue::Float64(v),
		ty: Type::Value(ValueType::Float(FloatWidth::F64)),
		location: loc(),
	}
}

fn stencil(grid: Variable, time_offset: i64, space_offset: i64, boundary_mask: i32, ctx: StencilCtx) -> Stencil {
	Stencil {
		grid,
		time_offset,
		space_offset: vec![space_offset],
		boundary_mask,
		ctx,
		location: loc(),
	}
}

fn no_ops() -> IndexMap<RString, Signature> {
	IndexMap::new()
}

/// `kernel k(g: Grid[Float[64],1]) -> void { x: Float[64] = 1.0; }` — the
/// target is a plain local, so no grid is touched and no loop is needed.
fn non_stencil_kernel() -> Statement {
	let g = grid_var("g");
	let x = Variable::new("x", Type::Value(ValueType::Float(FloatWidth::F64)));
	Statement::Definition {
		name: RString::new("k"),
		mode: DefinitionMode::Kernel,
		signature: Signature::new(vec![(g.name.clone(), g.ty.clone())], Type::Void),
		scope: IndexMap::from([(g.name.clone(), g.clone()), (x.name.clone(), x.clone())]),
		body: vec![Statement::Assignment {
			terminal: Terminal::Identifier(x),
			value: const_f64(1.0),
			location: loc(),
		}],
		location: loc(),
	}
}

/// `kernel k(g: Grid[Float[64],1]) -> void { g[0] = g[0][-1] + 1.0; }`
/// (a non-implicit stencil store: the RHS never reads `g` at time 0).
fn stencil_kernel(boundary_mask: i32) -> Statement {
	let g = grid_var("g");
	let load = Expression::Stencil(stencil(g.clone(), -1, 0, boundary_mask, StencilCtx::Load));
	let rhs = Expression::Binary {
		op: BinOp::Add,
		left: Box::new(load),
		right: Box::new(const_f64(1.0)),
		ty: Type::Value(ValueType::Float(FloatWidth::F64)),
		location: loc(),
	};
	Statement::Definition {
		name: RString::new("k"),
		mode: DefinitionMode::Kernel,
		signature: Signature::new(vec![(g.name.clone(), g.ty.clone())], Type::Void),
		scope: IndexMap::from([(g.name.clone(), g.clone())]),
		body: vec![Statement::Assignment {
			terminal: Terminal::Stencil(stencil(g, 0, 0, boundary_mask, StencilCtx::Store)),
			value: rhs,
			location: loc(),
		}],
		location: loc(),
	}
}

/// `kernel k(g: Grid[Float[64],1]) -> void { g[0] = g[0] + 1.0; }` — an
/// in-place update at mask 0, the canonical `implicit` hazard.
fn implicit_inplace_kernel() -> Statement {
	let g = grid_var("g");
	let load = Expression::Stencil(stencil(g.clone(), 0, 0, 0, StencilCtx::Load));
	let rhs = Expression::Binary {
		op: BinOp::Add,
		left: Box::new(load),
		right: Box::new(const_f64(1.0)),
		ty: Type::Value(ValueType::Float(FloatWidth::F64)),
		location: loc(),
	};
	Statement::Definition {
		name: RString::new("k"),
		mode: DefinitionMode::Kernel,
		signature: Signature::new(vec![(g.name.clone(), g.ty.clone())], Type::Void),
		scope: IndexMap::from([(g.name.clone(), g.clone())]),
		body: vec![Statement::Assignment {
			terminal: Terminal::Stencil(stencil(g, 0, 0, 0, StencilCtx::Store)),
			value: rhs,
			location: loc(),
		}],
		location: loc(),
	}
}

#[test]
fn non_stencil_assignment_has_no_loop() {
	let def = non_stencil_kernel();
	let out = generate(&def, &[], &no_ops(), &CodegenOptions::default()).unwrap();
	assert!(!out.source.contains("for ("));
	assert!(out.source.contains("void k(struct __Grid1d_f64* g)"));
}

#[test]
fn stencil_assignment_emits_loop_and_boundary_branch() {
	let def = stencil_kernel(0);
	let out = generate(&def, &[], &no_ops(), &CodegenOptions::default()).unwrap();
	assert!(out.source.contains("for (int32_t i0 = 0; i0 < g->shape[0]; i0++)"));
	assert!(out.source.contains("boundary_mask[i0] == 0"));
	assert!(out.source.contains("#pragma omp parallel for collapse(1)"));
	// history depth must cover the deepest load (time offset -1) plus "now".
	assert_eq!(out.history_depth, 2);
}

#[test]
fn boundary_mask_is_threaded_into_the_guard() {
	let def = stencil_kernel(3);
	let out = generate(&def, &[], &no_ops(), &CodegenOptions::default()).unwrap();
	assert!(out.source.contains("== 3"));
}

#[test]
fn implicit_inplace_splits_into_compute_and_copy_back() {
	let def = implicit_inplace_kernel();
	let out = generate(&def, &[], &no_ops(), &CodegenOptions::default()).unwrap();
	assert!(out.source.contains("__tmp"));
	assert!(out.source.contains("#pragma omp barrier"));
	assert!(out.source.contains("malloc"));
	assert!(out.source.contains("free(__tmp);"));
}

#[test]
fn implicit_inplace_without_parallel_is_rejected() {
	let def = implicit_inplace_kernel();
	let options = CodegenOptions {
		parallel: false,
		overstep: OverstepPolicy::None,
		comment: false,
	};
	let err = generate(&def, &[], &no_ops(), &options).unwrap_err();
	assert!(matches!(err, CodegenError::ImplicitInPlaceRequiresParallel { .. }));
}

#[test]
fn non_kernel_definition_is_rejected() {
	let g = grid_var("g");
	let def = Statement::Definition {
		name: RString::new("helper"),
		mode: DefinitionMode::Function,
		signature: Signature::new(vec![], Type::Void),
		scope: IndexMap::new(),
		body: vec![],
		location: loc(),
	};
	let _ = g;
	let err = generate(&def, &[], &no_ops(), &CodegenOptions::default()).unwrap_err();
	assert!(matches!(err, CodegenError::NotAKernel { .. }));
}

#[test]
fn bare_stencil_outside_assignment_is_rejected() {
	let g = grid_var("g");
	let load = Expression::Stencil(stencil(g.clone(), -1, 0, 0, StencilCtx::Load));
	let def = Statement::Definition {
		name: RString::new("k"),
		mode: DefinitionMode::Kernel,
		signature: Signature::new(vec![(g.name.clone(), g.ty.clone())], Type::Value(ValueType::Float(FloatWidth::F64))),
		scope: IndexMap::from([(g.name.clone(), g.clone())]),
		body: vec![Statement::Return {
			value: Some(load),
			location: loc(),
		}],
		location: loc(),
	};
	let err = generate(&def, &[], &no_ops(), &CodegenOptions::default()).unwrap_err();
	assert!(matches!(err, CodegenError::StencilOutsideAssignment { .. }));
}

#[test]
fn pow_and_float_mod_use_math_h_functions() {
	use crate::expr::{emit_expr, ExprCtx};

	let ops = no_ops();
	let ctx = ExprCtx {
		loop_vars: None,
		operators: &ops,
	};
	let pow = Expression::Binary {
		op: BinOp::Pow,
		left: Box::new(const_f64(2.0)),
		right: Box::new(const_f64(3.0)),
		ty: Type::Value(ValueType::Float(FloatWidth::F64)),
		location: loc(),
	};
	assert_eq!(emit_expr(&pow, &ctx), "pow(2.0, 3.0)");

	let rem = Expression::Binary {
		op: BinOp::Mod,
		left: Box::new(const_f64(5.0)),
		right: Box::new(const_f64(2.0)),
		ty: Type::Value(ValueType::Float(FloatWidth::F64)),
		location: loc(),
	};
	assert_eq!(emit_expr(&rem, &ctx), "fmod(5.0, 2.0)");
}

#[test]
fn struct_field_emitted_before_struct_definition_order() {
	use std::sync::Arc;

	use xgrid_types::StructType;

	let inner = Arc::new(StructType {
		name: RString::new("Vec2"),
		fields: vec![
			(RString::new("x"), ValueType::Float(FloatWidth::F64)),
			(RString::new("y"), ValueType::Float(FloatWidth::F64)),
		],
	});
	let outer = Arc::new(StructType {
		name: RString::new("Particle"),
		fields: vec![(RString::new("pos"), ValueType::Struct(inner.clone()))],
	});

	let def = Statement::Definition {
		name: RString::new("k"),
		mode: DefinitionMode::Kernel,
		signature: Signature::new(vec![], Type::Value(ValueType::Struct(outer.clone()))),
		scope: IndexMap::new(),
		body: vec![Statement::Return {
			value: Some(Expression::Call {
				operator: RString::new("Particle"),
				args: vec![],
				ty: Type::Value(ValueType::Struct(outer)),
				location: loc(),
			}),
			location: loc(),
		}],
		location: loc(),
	};
	let out = generate(&def, &[], &no_ops(), &CodegenOptions::default()).unwrap();
	let vec2_pos = out.source.find("struct Vec2 {").unwrap();
	let particle_pos = out.source.find("struct Particle {").unwrap();
	assert!(vec2_pos < particle_pos, "Vec2 must be defined before Particle uses it");
}
