use xgrid_hostast as host;
use xgrid_hostast::{AnnotationParam, FunctionDef, Param, RawAnnotation};
use xgrid_ir::{DefinitionMode, Statement, Terminal};
use xgrid_types::{FloatWidth, IntWidth, ReferenceType, Type, ValueType};
use xgrid_util::Location;

use crate::environment::{EnvEntry, Environment};

use super::lower_function;

fn loc(line: u32) -> Location {
	Location::new("test.xg", "k", line)
}

fn name_annot(name: &str) -> RawAnnotation {
	RawAnnotation {
		name: name.into(),
		params: Vec::new(),
	}
}

fn int_annot(bits: i64) -> RawAnnotation {
	RawAnnotation {
		name: "Int".into(),
		params: vec![AnnotationParam::IntLiteral(bits)],
	}
}

fn float_annot(bits: i64) -> RawAnnotation {
	RawAnnotation {
		name: "Float".into(),
		params: vec![AnnotationParam::IntLiteral(bits)],
	}
}

fn grid_annot(elem: RawAnnotation, dim: i64) -> RawAnnotation {
	RawAnnotation {
		name: "Grid".into(),
		params: vec![
			AnnotationParam::Annotation(elem),
			AnnotationParam::IntLiteral(dim),
		],
	}
}

/// `def k(g: Grid[Float[64], 1]) -> Void: g[0] = g[0][-1] + 1.0`
#[test]
fn stencil_load_store_round_trip() {
	let func = FunctionDef {
		name: "k".into(),
		params: vec![Param {
			name: "g".into(),
			annotation: Some(grid_annot(float_annot(64), 1)),
			location: loc(1),
		}],
		returns: Some(name_annot("Void")),
		body: vec![host::Stmt::Assign {
			target: host::Expr::Subscript {
				value: Box::new(host::Expr::Name {
					id: "g".into(),
					location: loc(2),
				}),
				slice: vec![host::Expr::Constant {
					value: host::Constant::Int(0),
					location: loc(2),
				}],
				location: loc(2),
			},
			annotation: None,
			value: host::Expr::BinOp {
				left: Box::new(host::Expr::Subscript {
					value: Box::new(host::Expr::Subscript {
						value: Box::new(host::Expr::Name {
							id: "g".into(),
							location: loc(2),
						}),
						slice: vec![host::Expr::Constant {
							value: host::Constant::Int(0),
							location: loc(2),
						}],
						location: loc(2),
					}),
					slice: vec![host::Expr::UnaryOp {
						op: host::UnaryOp::USub,
						operand: Box::new(host::Expr::Constant {
							value: host::Constant::Int(1),
							location: loc(2),
						}),
						location: loc(2),
					}],
					location: loc(2),
				}),
				op: host::BinOpKind::Add,
				right: Box::new(host::Expr::Constant {
					value: host::Constant::Float(1.0),
					location: loc(2),
				}),
				location: loc(2),
			},
			location: loc(2),
		}],
		location: loc(1),
	};

	let env = Environment::with_builtins();
	let lowered = lower_function(&func, DefinitionMode::Kernel, &env, FloatWidth::F64, None).unwrap();

	let Statement::Definition { body, .. } = lowered.definition else {
		panic!("expected a Definition");
	};
	assert_eq!(body.len(), 1);
	let Statement::Assignment { terminal, value, .. } = &body[0] else {
		panic!("expected an Assignment");
	};
	let Terminal::Stencil(store) = terminal else {
		panic!("expected a Stencil store target");
	};
	assert_eq!(store.time_offset, 0);
	assert_eq!(store.space_offset, vec![0]);

	let xgrid_ir::Expression::Binary { left, .. } = value else {
		panic!("expected a Binary expression");
	};
	let xgrid_ir::Expression::Stencil(load) = left.as_ref() else {
		panic!("expected the left operand to be a Stencil load");
	};
	assert_eq!(load.time_offset, -1);
	assert_eq!(load.space_offset, vec![0]);
}

/// `with boundary(1): g[0] = 0.0` captures the mask onto the store's Stencil.
#[test]
fn boundary_mask_is_captured() {
	let func = FunctionDef {
		name: "k".into(),
		params: vec![Param {
			name: "g".into(),
			annotation: Some(grid_annot(float_annot(32), 1)),
			location: loc(1),
		}],
		returns: Some(name_annot("Void")),
		body: vec![host::Stmt::With {
			context: host::Expr::Call {
				func: Box::new(host::Expr::Name {
					id: "boundary".into(),
					location: loc(2),
				}),
				args: vec![host::Expr::Constant {
					value: host::Constant::Int(1),
					location: loc(2),
				}],
				location: loc(2),
			},
			body: vec![host::Stmt::Assign {
				target: host::Expr::Subscript {
					value: Box::new(host::Expr::Name {
						id: "g".into(),
						location: loc(3),
					}),
					slice: vec![host::Expr::Constant {
						value: host::Constant::Int(0),
						location: loc(3),
					}],
					location: loc(3),
				},
				annotation: None,
				value: host::Expr::Constant {
					value: host::Constant::Float(0.0),
					location: loc(3),
				},
				location: loc(3),
			}],
			location: loc(2),
		}],
		location: loc(1),
	};

	let env = Environment::with_builtins();
	let lowered = lower_function(&func, DefinitionMode::Kernel, &env, FloatWidth::F32, None).unwrap();
	let Statement::Definition { body, .. } = lowered.definition else {
		panic!("expected a Definition");
	};
	let Statement::Assignment { terminal, .. } = &body[0] else {
		panic!("expected an Assignment");
	};
	let Terminal::Stencil(store) = terminal else {
		panic!("expected a Stencil store target");
	};
	assert_eq!(store.boundary_mask, 1);
}

/// `with c(): "asm();"` lifts straight to an Inline statement.
#[test]
fn raw_c_block_lifts_to_inline() {
	let func = FunctionDef {
		name: "k".into(),
		params: vec![],
		returns: Some(name_annot("Void")),
		body: vec![host::Stmt::With {
			context: host::Expr::Call {
				func: Box::new(host::Expr::Name {
					id: "c".into(),
					location: loc(2),
				}),
				args: vec![],
				location: loc(2),
			},
			body: vec![host::Stmt::Expr {
				value: host::Expr::Constant {
					value: host::Constant::Str("asm();".into()),
					location: loc(3),
				},
				location: loc(3),
			}],
			location: loc(2),
		}],
		location: loc(1),
	};

	let env = Environment::with_builtins();
	let lowered = lower_function(&func, DefinitionMode::Kernel, &env, FloatWidth::F32, None).unwrap();
	let Statement::Definition { body, .. } = lowered.definition else {
		panic!("expected a Definition");
	};
	assert_eq!(body.len(), 1);
	assert!(matches!(&body[0], Statement::Inline { source, .. } if source.as_str() == "asm();"));
}

/// A struct constructor call lowers to a `Call` whose `ty` names the struct
/// and whose `operator` equals the struct's own name.
#[test]
fn struct_constructor_call() {
	let particle = xgrid_types::StructType {
		name: "Particle".into(),
		fields: vec![
			("x".into(), ValueType::Float(FloatWidth::F64)),
			("y".into(), ValueType::Float(FloatWidth::F64)),
		],
	};
	let particle_ty = Type::Value(ValueType::Struct(std::sync::Arc::new(particle)));

	let mut env = Environment::with_builtins();
	env.insert("Particle", EnvEntry::Type(particle_ty));

	let func = FunctionDef {
		name: "make".into(),
		params: vec![],
		returns: Some(name_annot("Particle")),
		body: vec![host::Stmt::Return {
			value: Some(host::Expr::Call {
				func: Box::new(host::Expr::Name {
					id: "Particle".into(),
					location: loc(2),
				}),
				args: vec![
					host::Expr::Constant {
						value: host::Constant::Float(1.0),
						location: loc(2),
					},
					host::Expr::Constant {
						value: host::Constant::Float(2.0),
						location: loc(2),
					},
				],
				location: loc(2),
			}),
			location: loc(2),
		}],
		location: loc(1),
	};

	let lowered = lower_function(&func, DefinitionMode::Function, &env, FloatWidth::F64, None).unwrap();
	let Statement::Definition { body, .. } = lowered.definition else {
		panic!("expected a Definition");
	};
	let Statement::Return { value: Some(call), .. } = &body[0] else {
		panic!("expected a Return with a value");
	};
	let xgrid_ir::Expression::Call { operator, ty, .. } = call else {
		panic!("expected a Call expression");
	};
	assert_eq!(operator.as_str(), "Particle");
	assert!(matches!(ty, Type::Value(ValueType::Struct(s)) if s.name.as_str() == "Particle"));
}

/// A method call `p.scale(2.0)` resolves through the `"Struct.method"`
/// environment key and prepends the receiver as the first argument.
#[test]
fn method_call_prepends_receiver() {
	use xgrid_ir::Signature;

	let particle = xgrid_types::StructType {
		name: "Particle".into(),
		fields: vec![("x".into(), ValueType::Float(FloatWidth::F64))],
	};
	let particle_ty = ValueType::Struct(std::sync::Arc::new(particle));

	let mut env = Environment::with_builtins();
	env.insert(
		"Particle.scale",
		EnvEntry::Operator(crate::environment::OperatorHandle {
			name: "Particle.scale".into(),
			mode: DefinitionMode::Function,
			signature: Signature::new(
				vec![
					("self".into(), Type::Value(particle_ty.clone())),
					("factor".into(), Type::Value(ValueType::Float(FloatWidth::F64))),
				],
				Type::Void,
			),
			receiver_type: Some(particle_ty.clone()),
		}),
	);

	let func = FunctionDef {
		name: "apply".into(),
		params: vec![Param {
			name: "p".into(),
			annotation: None,
			location: loc(1),
		}],
		returns: Some(name_annot("Void")),
		body: vec![host::Stmt::Expr {
			value: host::Expr::Call {
				func: Box::new(host::Expr::Attribute {
					value: Box::new(host::Expr::Name {
						id: "p".into(),
						location: loc(2),
					}),
					attr: "scale".into(),
					location: loc(2),
				}),
				args: vec![host::Expr::Constant {
					value: host::Constant::Float(2.0),
					location: loc(2),
				}],
				location: loc(2),
			},
			location: loc(2),
		}],
		location: loc(1),
	};

	let lowered = lower_function(
		&func,
		DefinitionMode::Function,
		&env,
		FloatWidth::F64,
		Some(particle_ty),
	)
	.unwrap();
	let Statement::Definition { body, .. } = lowered.definition else {
		panic!("expected a Definition");
	};
	let Statement::Evaluation { value, .. } = &body[0] else {
		panic!("expected an Evaluation");
	};
	let xgrid_ir::Expression::Call { operator, args, .. } = value else {
		panic!("expected a Call expression");
	};
	assert_eq!(operator.as_str(), "Particle.scale");
	assert_eq!(args.len(), 2);
	assert!(matches!(&args[0], xgrid_ir::Expression::Identifier { variable, .. } if variable.name.as_str() == "p"));
}

/// Untyped int literals default to Int32, untyped floats to the configured
/// `default_precision`.
#[test]
fn literal_default_widths() {
	let func = FunctionDef {
		name: "k".into(),
		params: vec![],
		returns: Some(int_annot(32)),
		body: vec![host::Stmt::Return {
			value: Some(host::Expr::Constant {
				value: host::Constant::Int(7),
				location: loc(2),
			}),
			location: loc(2),
		}],
		location: loc(1),
	};
	let env = Environment::with_builtins();
	let lowered = lower_function(&func, DefinitionMode::Function, &env, FloatWidth::F32, None).unwrap();
	let Statement::Definition { body, .. } = lowered.definition else {
		panic!("expected a Definition");
	};
	let Statement::Return { value: Some(e), .. } = &body[0] else {
		panic!("expected Return with value");
	};
	assert_eq!(e.ty(), Type::Value(ValueType::Int(IntWidth::W32)));
}

/// Mismatched `for` start/end/step Number types are rejected (no implicit
/// widening).
#[test]
fn for_loop_rejects_mixed_number_types() {
	let func = FunctionDef {
		name: "k".into(),
		params: vec![],
		returns: Some(name_annot("Void")),
		body: vec![host::Stmt::For {
			target: "i".into(),
			start: host::Expr::Constant {
				value: host::Constant::Int(0),
				location: loc(2),
			},
			stop: host::Expr::Constant {
				value: host::Constant::Float(1.0),
				location: loc(2),
			},
			step: host::Expr::Constant {
				value: host::Constant::Int(1),
				location: loc(2),
			},
			body: vec![],
			location: loc(2),
		}],
		location: loc(1),
	};
	let env = Environment::with_builtins();
	let err = lower_function(&func, DefinitionMode::Function, &env, FloatWidth::F32, None).unwrap_err();
	assert!(err.reason.contains("Number type"));
}

/// Nested `boundary` contexts are rejected outright.
#[test]
fn nested_boundary_is_rejected() {
	let inner_assign = host::Stmt::With {
		context: host::Expr::Call {
			func: Box::new(host::Expr::Name {
				id: "boundary".into(),
				location: loc(3),
			}),
			args: vec![host::Expr::Constant {
				value: host::Constant::Int(2),
				location: loc(3),
			}],
			location: loc(3),
		},
		body: vec![],
		location: loc(3),
	};
	let func = FunctionDef {
		name: "k".into(),
		params: vec![],
		returns: Some(name_annot("Void")),
		body: vec![host::Stmt::With {
			context: host::Expr::Call {
				func: Box::new(host::Expr::Name {
					id: "boundary".into(),
					location: loc(2),
				}),
				args: vec![host::Expr::Constant {
					value: host::Constant::Int(1),
					location: loc(2),
				}],
				location: loc(2),
			},
			body: vec![inner_assign],
			location: loc(2),
		}],
		location: loc(1),
	};
	let env = Environment::with_builtins();
	let err = lower_function(&func, DefinitionMode::Function, &env, FloatWidth::F32, None).unwrap_err();
	assert!(err.reason.contains("nested"));
}

/// A method receiver's implicit `self` type comes from `self_type`, not an
/// annotation; without one and without an annotation, lowering fails.
#[test]
fn unannotated_first_param_requires_self_type() {
	let func = FunctionDef {
		name: "m".into(),
		params: vec![Param {
			name: "self_".into(),
			annotation: None,
			location: loc(1),
		}],
		returns: Some(name_annot("Void")),
		body: vec![],
		location: loc(1),
	};
	let env = Environment::with_builtins();
	assert!(lower_function(&func, DefinitionMode::Function, &env, FloatWidth::F32, None).is_err());

	let recv = ValueType::Bool;
	let ok = lower_function(
		&func,
		DefinitionMode::Function,
		&env,
		FloatWidth::F32,
		Some(recv.clone()),
	)
	.unwrap();
	let Statement::Definition { signature, .. } = ok.definition else {
		panic!("expected a Definition");
	};
	assert_eq!(signature.args[0].1, Type::Value(recv));
}

/// External definitions always get an empty body, even if the host AST
/// carries a `pass`-like statement list for one.
#[test]
fn external_body_is_always_empty() {
	let func = FunctionDef {
		name: "native_fn".into(),
		params: vec![],
		returns: Some(float_annot(64)),
		body: vec![host::Stmt::Return {
			value: Some(host::Expr::Constant {
				value: host::Constant::Float(0.0),
				location: loc(2),
			}),
			location: loc(2),
		}],
		location: loc(1),
	};
	let env = Environment::with_builtins();
	let lowered = lower_function(&func, DefinitionMode::External, &env, FloatWidth::F64, None).unwrap();
	let Statement::Definition { body, .. } = lowered.definition else {
		panic!("expected a Definition");
	};
	assert!(body.is_empty());
}

/// A grid subscript referencing a local that isn't grid-typed is rejected.
#[test]
fn subscript_on_non_grid_is_rejected() {
	let func = FunctionDef {
		name: "k".into(),
		params: vec![Param {
			name: "n".into(),
			annotation: Some(int_annot(32)),
			location: loc(1),
		}],
		returns: Some(name_annot("Void")),
		body: vec![host::Stmt::Expr {
			value: host::Expr::Subscript {
				value: Box::new(host::Expr::Name {
					id: "n".into(),
					location: loc(2),
				}),
				slice: vec![host::Expr::Constant {
					value: host::Constant::Int(0),
					location: loc(2),
				}],
				location: loc(2),
			},
			location: loc(2),
		}],
		location: loc(1),
	};
	let env = Environment::with_builtins();
	assert!(lower_function(&func, DefinitionMode::Function, &env, FloatWidth::F32, None).is_err());
}

/// `Grid[Float[64], 1]` parameters resolve to a `Reference` type, never
/// assignable as a whole value.
#[test]
fn grid_param_is_a_reference_type() {
	let func = FunctionDef {
		name: "k".into(),
		params: vec![Param {
			name: "g".into(),
			annotation: Some(grid_annot(float_annot(64), 1)),
			location: loc(1),
		}],
		returns: Some(name_annot("Void")),
		body: vec![],
		location: loc(1),
	};
	let env = Environment::with_builtins();
	let lowered = lower_function(&func, DefinitionMode::Kernel, &env, FloatWidth::F64, None).unwrap();
	let Statement::Definition { signature, .. } = lowered.definition else {
		panic!("expected a Definition");
	};
	assert!(matches!(
		signature.args[0].1,
		Type::Reference(ReferenceType::Grid(ValueType::Float(FloatWidth::F64), 1))
	));
}
