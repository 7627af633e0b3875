//! Statement emission: direct assignments translate line-for-line, while an
//! assignment whose target is a `Stencil` store expands into a generated
//! loop nest over its target grid's shape, per SPEC_FULL.md's "Kernel body
//! emission" section.

use indexmap::IndexMap;
use xgrid_ir::{Expression, Signature, Statement, Stencil, StencilCtx, Terminal};
use xgrid_types::Type;
use xgrid_util::{Location, RString};

use crate::ctype::value_ctype;
use crate::error::CodegenError;
use crate::expr::{emit_expr, grid_shape, stencil_access, ExprCtx};
use crate::format::CBuffer;
use crate::options::CodegenOptions;

pub(crate) struct StmtCtx<'a> {
	pub(crate) operators: &'a IndexMap<RString, Signature>,
	pub(crate) options: &'a CodegenOptions,
	pub(crate) kernel_name: &'a RString,
}

/// True if `e` contains a `Stencil` node anywhere in its tree.
fn contains_stencil(e: &Expression) -> bool {
	match e {
		Expression::Constant { .. } | Expression::Identifier { .. } => false,
		Expression::Stencil(_) => true,
		Expression::Access { base, .. } => contains_stencil(base),
		Expression::Binary { left, right, .. }
		| Expression::Compare { left, right, .. }
		| Expression::Logic { left, right, .. } => contains_stencil(left) || contains_stencil(right),
		Expression::Unary { operand, .. } => contains_stencil(operand),
		Expression::Condition { test, body, orelse, .. } => {
			contains_stencil(test) || contains_stencil(body) || contains_stencil(orelse)
		}
		Expression::Cast { value, .. } => contains_stencil(value),
		Expression::Call { args, .. } => args.iter().any(contains_stencil),
		Expression::GridInfo { .. } => false,
	}
}

/// True if `e` reads `grid_name` at time offset 0 anywhere in its tree —
/// the aliasing condition that makes an in-place stencil store `implicit`.
fn reads_same_grid_now(e: &Expression, grid_name: &RString) -> bool {
	match e {
		Expression::Constant { .. } | Expression::Identifier { .. } => false,
		Expression::Stencil(s) => s.ctx == StencilCtx::Load && s.grid.name == *grid_name && s.time_offset == 0,
		Expression::Access { base, .. } => reads_same_grid_now(base, grid_name),
		Expression::Binary { left, right, .. }
		| Expression::Compare { left, right, .. }
		| Expression::Logic { left, right, .. } => {
			reads_same_grid_now(left, grid_name) || reads_same_grid_now(right, grid_name)
		}
		Expression::Unary { operand, .. } => reads_same_grid_now(operand, grid_name),
		Expression::Condition { test, body, orelse, .. } => {
			reads_same_grid_now(test, grid_name)
				|| reads_same_grid_now(body, grid_name)
				|| reads_same_grid_now(orelse, grid_name)
		}
		Expression::Cast { value, .. } => reads_same_grid_now(value, grid_name),
		Expression::Call { args, .. } => args.iter().any(|a| reads_same_grid_now(a, grid_name)),
		Expression::GridInfo { .. } => false,
	}
}

fn emit_terminal(t: &Terminal, loop_vars: Option<&[String]>) -> String {
	match t {
		Terminal::Identifier(v) => {
			if matches!(v.ty, Type::Reference(xgrid_types::ReferenceType::Ptr(_))) {
				format!("(*{})", v.name)
			} else {
				v.name.to_string()
			}
		}
		Terminal::Access { base, field, .. } => format!("({}).{field}", emit_terminal(base, loop_vars)),
		Terminal::Stencil(s) => {
			let loop_vars = loop_vars.expect("a Stencil store must be emitted inside its own loop nest");
			stencil_access(s, loop_vars)
		}
	}
}

fn emit_location_comment(buf: &mut CBuffer, location: &Location, options: &CodegenOptions) {
	if options.comment {
		buf.println(&format!("// {}:{}", location.file, location.line));
	}
}

/// Row-major (axis 0 slowest) linear index over `grid_name`'s shape, built
/// from the plain iteration indices (no stencil offset applied — boundary
/// masks are keyed to the loop's own cell, not any offset target a store's
/// space subscript may name).
fn linear_index_expr(grid_name: &str, loop_vars: &[String]) -> String {
	let mut expr = loop_vars[0].clone();
	for (k, var) in loop_vars.iter().enumerate().skip(1) {
		expr = format!("(({expr}) * {grid_name}->shape[{k}] + {var})");
	}
	expr
}

fn emit_loop_nest(buf: &mut CBuffer, grid_name: &str, loop_vars: &[String], depth: usize, body: &dyn Fn(&mut CBuffer)) {
	if depth == loop_vars.len() {
		body(buf);
		return;
	}
	let var = &loop_vars[depth];
	buf.println(&format!(
		"for (int32_t {var} = 0; {var} < {grid_name}->shape[{depth}]; {var}++) {{"
	));
	{
		let mut inner = buf.indent();
		emit_loop_nest(&mut inner, grid_name, loop_vars, depth + 1, body);
	}
	buf.println("}");
}

pub(crate) fn emit_block(buf: &mut CBuffer, stmts: &[Statement], ctx: &StmtCtx<'_>) -> Result<(), CodegenError> {
	for s in stmts {
		emit_stmt(buf, s, ctx)?;
	}
	Ok(())
}

fn reject_bare_stencil(e: &Expression) -> Result<(), CodegenError> {
	if contains_stencil(e) {
		return Err(CodegenError::StencilOutsideAssignment {
			location: e.location().clone(),
		}
		.log());
	}
	Ok(())
}

pub(crate) fn emit_stmt(buf: &mut CBuffer, stmt: &Statement, ctx: &StmtCtx<'_>) -> Result<(), CodegenError> {
	match stmt {
		Statement::Return { value, location } => {
			emit_location_comment(buf, location, ctx.options);
			match value {
				Some(e) => {
					reject_bare_stencil(e)?;
					let rendered = emit_expr(e, &ExprCtx { loop_vars: None, operators: ctx.operators });
					buf.println(&format!("return {rendered};"));
				}
				None => buf.println("return;"),
			}
		}
		Statement::Break { location } => {
			emit_location_comment(buf, location, ctx.options);
			buf.println("break;");
		}
		Statement::Continue { location } => {
			emit_location_comment(buf, location, ctx.options);
			buf.println("continue;");
		}
		Statement::If {
			condition,
			body,
			orelse,
			location,
		} => {
			reject_bare_stencil(condition)?;
			emit_location_comment(buf, location, ctx.options);
			let rendered = emit_expr(condition, &ExprCtx { loop_vars: None, operators: ctx.operators });
			buf.println(&format!("if ({rendered}) {{"));
			{
				let mut inner = buf.indent();
				emit_block(&mut inner, body, ctx)?;
			}
			if orelse.is_empty() {
				buf.println("}");
			} else {
				buf.println("} else {");
				{
					let mut inner = buf.indent();
					emit_block(&mut inner, orelse, ctx)?;
				}
				buf.println("}");
			}
		}
		Statement::While { condition, body, location } => {
			reject_bare_stencil(condition)?;
			emit_location_comment(buf, location, ctx.options);
			let rendered = emit_expr(condition, &ExprCtx { loop_vars: None, operators: ctx.operators });
			buf.println(&format!("while ({rendered}) {{"));
			{
				let mut inner = buf.indent();
				emit_block(&mut inner, body, ctx)?;
			}
			buf.println("}");
		}
		Statement::For {
			variable,
			start,
			end,
			step,
			body,
			location,
		} => {
			reject_bare_stencil(start)?;
			reject_bare_stencil(end)?;
			reject_bare_stencil(step)?;
			emit_location_comment(buf, location, ctx.options);
			let expr_ctx = ExprCtx { loop_vars: None, operators: ctx.operators };
			let var = &variable.name;
			let start_s = emit_expr(start, &expr_ctx);
			let end_s = emit_expr(end, &expr_ctx);
			let step_s = emit_expr(step, &expr_ctx);
			// `step`'s sign isn't known at codegen time (it need not be a
			// literal), so the loop condition picks its comparator at
			// runtime rather than assuming an ascending range.
			buf.println(&format!(
				"for ({var} = {start_s}; (({step_s}) > 0) ? ({var} < ({end_s})) : ({var} > ({end_s})); {var} += {step_s}) {{"
			));
			{
				let mut inner = buf.indent();
				emit_block(&mut inner, body, ctx)?;
			}
			buf.println("}");
		}
		Statement::Evaluation { value, location } => {
			reject_bare_stencil(value)?;
			emit_location_comment(buf, location, ctx.options);
			let rendered = emit_expr(value, &ExprCtx { loop_vars: None, operators: ctx.operators });
			buf.println(&format!("{rendered};"));
		}
		Statement::Inline { source, location } => {
			emit_location_comment(buf, location, ctx.options);
			buf.println(source);
		}
		Statement::Assignment { terminal, value, location } => {
			emit_location_comment(buf, location, ctx.options);
			match terminal {
				Terminal::Stencil(store) => emit_stencil_assignment(buf, store, value, location, ctx),
				_ => {
					reject_bare_stencil(value)?;
					let lhs = emit_terminal(terminal, None);
					let rhs = emit_expr(value, &ExprCtx { loop_vars: None, operators: ctx.operators });
					buf.println(&format!("{lhs} = {rhs};"));
					Ok(())
				}
			}?;
		}
		Statement::Definition { .. } => {
			unreachable!("a kernel body never contains a nested Definition statement")
		}
	}
	Ok(())
}

fn emit_stencil_assignment(
	buf: &mut CBuffer,
	store: &Stencil,
	value: &Expression,
	location: &Location,
	ctx: &StmtCtx<'_>,
) -> Result<(), CodegenError> {
	let (elem, dim) = grid_shape(&store.grid.ty).expect("stencil store target must be grid-typed");
	let loop_vars: Vec<String> = (0..dim).map(|i| format!("i{i}")).collect();
	let grid_name = store.grid.name.to_string();
	let linear_idx = linear_index_expr(&grid_name, &loop_vars);
	let expr_ctx = ExprCtx { loop_vars: Some(loop_vars.as_slice()), operators: ctx.operators };
	let implicit = store.time_offset == 0 && reads_same_grid_now(value, &store.grid.name);

	let guard = |inner: &mut CBuffer, write: &dyn Fn(&mut CBuffer)| {
		inner.println(&format!(
			"if ((int32_t){grid_name}->boundary_mask[{linear_idx}] == {}) {{",
			store.boundary_mask
		));
		{
			let mut body = inner.indent();
			write(&mut body);
		}
		inner.println("}");
	};

	if implicit && store.boundary_mask == 0 {
		if !ctx.options.parallel {
			return Err(CodegenError::ImplicitInPlaceRequiresParallel {
				name: ctx.kernel_name.clone(),
				grid: store.grid.name.clone(),
				location: location.clone(),
			}
			.log());
		}
		let elem_ty = value_ctype(elem);
		let count_expr = (0..dim)
			.map(|k| format!("{grid_name}->shape[{k}]"))
			.collect::<Vec<_>>()
			.join(" * ");

		buf.println("{");
		{
			let mut outer = buf.indent();
			outer.println(&format!("{elem_ty}* __tmp = malloc(sizeof({elem_ty}) * ({count_expr}));"));
			outer.println("#pragma omp parallel");
			outer.println("{");
			{
				let mut region = outer.indent();
				region.println(&format!("#pragma omp for collapse({dim})"));
				emit_loop_nest(&mut region, &grid_name, &loop_vars, 0, &|inner| {
					guard(inner, &|body| {
						let rhs = emit_expr(value, &expr_ctx);
						body.println(&format!("__tmp[{linear_idx}] = {rhs};"));
					});
				});
				region.println("#pragma omp barrier");
				region.println(&format!("#pragma omp for collapse({dim})"));
				emit_loop_nest(&mut region, &grid_name, &loop_vars, 0, &|inner| {
					guard(inner, &|body| {
						let target = stencil_access(store, &loop_vars);
						body.println(&format!("{target} = __tmp[{linear_idx}];"));
					});
				});
			}
			outer.println("}");
			outer.println("free(__tmp);");
		}
		buf.println("}");
	} else {
		if ctx.options.parallel {
			buf.println(&format!("#pragma omp parallel for collapse({dim})"));
		}
		emit_loop_nest(buf, &grid_name, &loop_vars, 0, &|inner| {
			guard(inner, &|body| {
				let rhs = emit_expr(value, &expr_ctx);
				let target = stencil_access(store, &loop_vars);
				body.println(&format!("{target} = {rhs};"));
			});
		});
	}
	Ok(())
}
