//! Walks typed IR for a kernel [`Statement::Definition`] and emits a
//! self-contained C translation unit: struct/Grid type declarations, an
//! inline accessor per distinct Grid shape, and the kernel function body
//! itself — the stencil-aware loop nests, boundary branches and parallel
//! pragmas generalizing `lang/generator.py`'s `visit_*` walk to the full IR.

mod ctype;
mod error;
mod expr;
mod format;
mod inventory;
mod options;
mod stmt;
#[cfg(test)]
mod test;

use indexmap::IndexMap;
use xgrid_ir::{DefinitionMode, Expression, Signature, Statement, Terminal};
use xgrid_types::ValueType;
use xgrid_util::RString;

pub use error::CodegenError;
pub use options::{CodegenOptions, OverstepPolicy};

use crate::ctype::{grid_accessor_name, grid_type_name, param_ctype, return_ctype, value_ctype};
use crate::format::CBuffer;
use crate::inventory::TypeInventory;
use crate::stmt::StmtCtx;

/// The emitted C source for one kernel, plus the grid time-history depth
/// that source requires — the grid runtime must extend a grid's history to
/// at least this many buffers before the first call.
#[derive(Debug, Clone)]
pub struct GeneratedKernel {
	pub source: String,
	pub history_depth: usize,
}

/// Compile one kernel `Definition` into a C translation unit.
///
/// `includes` are extra header paths the parser recorded from `import`
/// statements (see `LoweredFunction::includes`); `operators` is the subset
/// of the calling `Environment` that resolves to a real callable — a
/// `Call` whose name isn't in this map is a struct constructor.
pub fn generate(
	definition: &Statement,
	includes: &[RString],
	operators: &IndexMap<RString, Signature>,
	options: &CodegenOptions,
) -> Result<GeneratedKernel, CodegenError> {
	let Statement::Definition {
		name,
		mode,
		signature,
		scope,
		body,
		..
	} = definition
	else {
		unreachable!("generate() is only ever called with a Definition statement")
	};

	if *mode != DefinitionMode::Kernel {
		return Err(CodegenError::NotAKernel {
			name: name.clone(),
			mode: *mode,
		}
		.log());
	}

	let inventory = TypeInventory::collect(definition);
	let history_depth = (max_abs_time_offset(body) + 1) as usize;

	let mut buf = CBuffer::new();
	emit_preamble(&mut buf, includes, options);
	emit_types(&mut buf, &inventory, options);

	let param_names: rustc_hash::FxHashSet<&RString> = signature.args.iter().map(|(n, _)| n).collect();

	let params = signature
		.args
		.iter()
		.map(|(n, ty)| format!("{} {n}", param_ctype(ty)))
		.collect::<Vec<_>>()
		.join(", ");
	buf.println(&format!("{} {name}({params}) {{", return_ctype(&signature.return_type)));
	{
		let mut fn_body = buf.indent();
		for (var_name, var) in scope {
			if param_names.contains(var_name) {
				continue;
			}
			fn_body.println(&format!("{} {var_name};", param_ctype(&var.ty)));
		}
		if !scope.is_empty() {
			fn_body.blank();
		}
		let stmt_ctx = StmtCtx {
			operators,
			options,
			kernel_name: name,
		};
		stmt::emit_block(&mut fn_body, body, &stmt_ctx)?;
	}
	buf.println("}");

	Ok(GeneratedKernel {
		source: buf.finish(),
		history_depth,
	})
}

fn emit_preamble(buf: &mut CBuffer, includes: &[RString], options: &CodegenOptions) {
	for header in ["<stdint.h>", "<stdbool.h>", "<stddef.h>", "<stdlib.h>", "<math.h>"] {
		buf.println(&format!("#include {header}"));
	}
	if options.parallel {
		buf.println("#include <omp.h>");
	}
	for inc in includes {
		buf.println(&format!("#include \"{}.h\"", inc.replace('.', "/")));
	}
	buf.blank();
}

fn emit_types(buf: &mut CBuffer, inventory: &TypeInventory, options: &CodegenOptions) {
	for s in &inventory.structs {
		buf.println(&format!("struct {};", s.name));
	}
	if !inventory.structs.is_empty() {
		buf.blank();
	}

	for s in &inventory.structs {
		buf.println(&format!("struct {} {{", s.name));
		{
			let mut fields = buf.indent();
			for (fname, fty) in &s.fields {
				fields.println(&format!("{} {fname};", value_ctype(fty)));
			}
		}
		buf.println("};");
		buf.blank();
	}

	for (elem, dim) in &inventory.grids {
		emit_grid_type(buf, elem, *dim, options);
	}
}

fn emit_grid_type(buf: &mut CBuffer, elem: &ValueType, dim: usize, options: &CodegenOptions) {
	let type_name = grid_type_name(elem, dim);
	let elem_ty = value_ctype(elem);

	buf.println(&format!("struct {type_name} {{"));
	{
		let mut fields = buf.indent();
		fields.println("int32_t time_depth;");
		fields.println(&format!("int32_t shape[{dim}];"));
		fields.println(&format!("{elem_ty}** data;"));
		fields.println("int32_t* boundary_mask;");
	}
	buf.println("};");
	buf.blank();

	let accessor = grid_accessor_name(elem, dim);
	let mut params = vec![format!("struct {type_name}* grid")];
	for d in (0..dim).rev() {
		params.push(format!("int32_t space{d}"));
	}
	params.push("int32_t time_offset".to_owned());

	buf.println(&format!(
		"static inline {elem_ty}* {accessor}({}) {{",
		params.join(", ")
	));
	{
		let mut fn_body = buf.indent();
		for d in 0..dim {
			fn_body.println(&format!(
				"int32_t __idx{d} = {};",
				overstepped_index(&format!("space{d}"), &format!("grid->shape[{d}]"), options.overstep)
			));
		}
		let mut linear = "__idx0".to_owned();
		for d in 1..dim {
			linear = format!("(({linear}) * grid->shape[{d}] + __idx{d})");
		}
		fn_body.println(&format!("int32_t __linear = {linear};"));
		fn_body.println("return &grid->data[time_offset][__linear];");
	}
	buf.println("}");
	buf.blank();
}

/// Bake the configured out-of-range policy into a per-dimension space index.
fn overstepped_index(value: &str, extent: &str, policy: OverstepPolicy) -> String {
	match policy {
		OverstepPolicy::None => value.to_owned(),
		OverstepPolicy::Limit => {
			format!("(({value}) < 0 ? 0 : (({value}) >= ({extent}) ? ({extent}) - 1 : ({value})))")
		}
		OverstepPolicy::Wrap => format!("(((({value}) % ({extent})) + ({extent})) % ({extent}))"),
	}
}

/// The deepest `|time_offset|` any `Stencil` node (load or store) in `body`
/// uses, walked independently of the stencil-tagged-assignment rules in
/// `stmt.rs` since it must see offsets inside non-assignment expressions too
/// (a condition, a return value) for an accurate history-depth count.
fn max_abs_time_offset(body: &[Statement]) -> i64 {
	let mut max = 0i64;
	for s in body {
		note_stmt_depth(s, &mut max);
	}
	max
}

fn note_stmt_depth(s: &Statement, max: &mut i64) {
	match s {
		Statement::Return { value, .. } => {
			if let Some(e) = value {
				note_expr_depth(e, max);
			}
		}
		Statement::Break { .. } | Statement::Continue { .. } | Statement::Inline { .. } => {}
		Statement::If { condition, body, orelse, .. } => {
			note_expr_depth(condition, max);
			body.iter().for_each(|s| note_stmt_depth(s, max));
			orelse.iter().for_each(|s| note_stmt_depth(s, max));
		}
		Statement::While { condition, body, .. } => {
			note_expr_depth(condition, max);
			body.iter().for_each(|s| note_stmt_depth(s, max));
		}
		Statement::For { start, end, step, body, .. } => {
			note_expr_depth(start, max);
			note_expr_depth(end, max);
			note_expr_depth(step, max);
			body.iter().for_each(|s| note_stmt_depth(s, max));
		}
		Statement::Evaluation { value, .. } => note_expr_depth(value, max),
		Statement::Assignment { terminal, value, .. } => {
			note_terminal_depth(terminal, max);
			note_expr_depth(value, max);
		}
		Statement::Definition { body, .. } => body.iter().for_each(|s| note_stmt_depth(s, max)),
	}
}

fn note_terminal_depth(t: &Terminal, max: &mut i64) {
	match t {
		Terminal::Identifier(_) => {}
		Terminal::Access { base, .. } => note_terminal_depth(base, max),
		Terminal::Stencil(s) => *max = (*max).max(s.time_offset.abs()),
	}
}

fn note_expr_depth(e: &Expression, max: &mut i64) {
	match e {
		Expression::Constant { .. } | Expression::Identifier { .. } => {}
		Expression::Stencil(s) => *max = (*max).max(s.time_offset.abs()),
		Expression::Access { base, .. } => note_expr_depth(base, max),
		Expression::Binary { left, right, .. }
		| Expression::Compare { left, right, .. }
		| Expression::Logic { left, right, .. } => {
			note_expr_depth(left, max);
			note_expr_depth(right, max);
		}
		Expression::Unary { operand, .. } => note_expr_depth(operand, max),
		Expression::Condition { test, body, orelse, .. } => {
			note_expr_depth(test, max);
			note_expr_depth(body, max);
			note_expr_depth(orelse, max);
		}
		Expression::Cast { value, .. } => note_expr_depth(value, max),
		Expression::Call { args, .. } => args.iter().for_each(|a| note_expr_depth(a, max)),
		Expression::GridInfo { .. } => {}
	}
}
