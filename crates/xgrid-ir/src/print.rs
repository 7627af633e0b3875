//! A `--dump-ir`-style pretty-printer: renders any IR node back to readable
//! text for diagnostics. Grounded in the original's `ElementFormat`/`write`
//! pattern — an indent-scoped line buffer rather than a generic tree
//! formatter, so the emitted structure mirrors the source control flow.

use std::fmt::Write as _;

use crate::expr::{Expression, GridInfoKind, StencilCtx};
use crate::stmt::{DefinitionMode, Statement, Terminal};

/// An indent-scoped line buffer. [`Formatter::indent`] returns a guard that
/// restores the previous indent when dropped, so nested `write!`-style calls
/// can't forget to dedent on an early return.
pub struct Formatter {
	indent_size: usize,
	indents: usize,
	buf: String,
}

impl Default for Formatter {
	fn default() -> Self {
		Self::new(2)
	}
}

impl Formatter {
	#[must_use]
	pub fn new(indent_size: usize) -> Self {
		Self {
			indent_size,
			indents: 0,
			buf: String::new(),
		}
	}

	pub fn println(&mut self, line: &str) {
		let _ = writeln!(self.buf, "{:indent$}{line}", "", indent = self.indents);
	}

	pub fn indent(&mut self) -> IndentGuard<'_> {
		self.indents += self.indent_size;
		IndentGuard { format: self }
	}

	#[must_use]
	pub fn finish(self) -> String {
		self.buf
	}
}

pub struct IndentGuard<'a> {
	format: &'a mut Formatter,
}

impl Drop for IndentGuard<'_> {
	fn drop(&mut self) {
		self.format.indents -= self.format.indent_size;
	}
}

impl std::ops::Deref for IndentGuard<'_> {
	type Target = Formatter;

	fn deref(&self) -> &Self::Target {
		self.format
	}
}

impl std::ops::DerefMut for IndentGuard<'_> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.format
	}
}

/// Render a top-level `Definition` statement to a complete textual dump.
#[must_use]
pub fn render(def: &Statement) -> String {
	let mut f = Formatter::default();
	write_statement(&mut f, def);
	f.finish()
}

fn write_statement(f: &mut Formatter, s: &Statement) {
	match s {
		Statement::Definition {
			name,
			mode,
			signature,
			scope,
			body,
			..
		} => {
			let mode_kw = match mode {
				DefinitionMode::Kernel => "kernel",
				DefinitionMode::Function => "function",
				DefinitionMode::External => "external",
			};
			let args = signature
				.args
				.iter()
				.map(|(n, t)| format!("{t} %{n}"))
				.collect::<Vec<_>>()
				.join(", ");
			f.println(&format!(
				"{mode_kw} {} {name}({args}) requires",
				signature.return_type
			));
			{
				let mut body_f = f.indent();
				let arg_names: std::collections::HashSet<_> =
					signature.args.iter().map(|(n, _)| n.clone()).collect();
				for (name, var) in scope {
					if !arg_names.contains(name) {
						body_f.println(&format!("%{name}: {}", var.ty));
					}
				}
			}
			f.println("begin");
			{
				let mut body_f = f.indent();
				for stmt in body {
					write_statement(&mut body_f, stmt);
				}
			}
			f.println("end");
		}
		Statement::Return { value, .. } => match value {
			Some(e) => f.println(&format!("return {}", write_expr(e))),
			None => f.println("return"),
		},
		Statement::Break { .. } => f.println("break"),
		Statement::Continue { .. } => f.println("continue"),
		Statement::If {
			condition,
			body,
			orelse,
			..
		} => {
			f.println(&format!("if {} do", write_expr(condition)));
			{
				let mut body_f = f.indent();
				for stmt in body {
					write_statement(&mut body_f, stmt);
				}
			}
			if !orelse.is_empty() {
				f.println("else");
				let mut body_f = f.indent();
				for stmt in orelse {
					write_statement(&mut body_f, stmt);
				}
			}
			f.println("end");
		}
		Statement::While { condition, body, .. } => {
			f.println(&format!("while {} do", write_expr(condition)));
			{
				let mut body_f = f.indent();
				for stmt in body {
					write_statement(&mut body_f, stmt);
				}
			}
			f.println("end");
		}
		Statement::For {
			variable,
			start,
			end,
			step,
			body,
			..
		} => {
			f.println(&format!(
				"for %{} in {}:{}:{}",
				variable.name,
				write_expr(start),
				write_expr(end),
				write_expr(step)
			));
			let mut body_f = f.indent();
			for stmt in body {
				write_statement(&mut body_f, stmt);
			}
		}
		Statement::Evaluation { value, .. } => f.println(&format!("evaluate {}", write_expr(value))),
		Statement::Assignment { terminal, value, .. } => f.println(&format!(
			"{}: {} = {}",
			write_terminal(terminal),
			terminal.ty(),
			write_expr(value)
		)),
		Statement::Inline { source, .. } => {
			f.println("inline begin");
			{
				let mut body_f = f.indent();
				body_f.println(source);
			}
			f.println("end");
		}
	}
}

fn write_terminal(t: &Terminal) -> String {
	match t {
		Terminal::Identifier(v) => format!("%{}", v.name),
		Terminal::Access { base, field, .. } => format!("({}).{field}", write_terminal(base)),
		Terminal::Stencil(s) => write_stencil(s),
	}
}

fn write_stencil(s: &crate::expr::Stencil) -> String {
	let space = s
		.space_offset
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join(", ");
	format!(
		"%{}[{space}][{}]@mask{}",
		s.grid.name, s.time_offset, s.boundary_mask
	)
}

fn write_expr(e: &Expression) -> String {
	match e {
		Expression::Constant { value, .. } => format!("{value:?}"),
		Expression::Identifier { variable, .. } => format!("%{}", variable.name),
		Expression::Access { base, field, .. } => format!("({}).{field}", write_expr(base)),
		Expression::Stencil(s) => {
			let mut rendered = write_stencil(s);
			if s.ctx == StencilCtx::Store {
				rendered.push_str(":store");
			}
			rendered
		}
		Expression::Binary { op, left, right, .. } => {
			format!("({} {} {})", write_expr(left), op.symbol(), write_expr(right))
		}
		Expression::Compare { op, left, right, .. } => {
			format!("({} {} {})", write_expr(left), op.symbol(), write_expr(right))
		}
		Expression::Logic { op, left, right, .. } => {
			format!("({} {} {})", write_expr(left), op.symbol(), write_expr(right))
		}
		Expression::Unary { op, operand, .. } => format!("({} {})", op.symbol(), write_expr(operand)),
		Expression::Condition {
			test, body, orelse, ..
		} => format!(
			"({} ? {} : {})",
			write_expr(test),
			write_expr(body),
			write_expr(orelse)
		),
		Expression::Cast { target, value, .. } => format!("cast({target}, {})", write_expr(value)),
		Expression::Call { operator, args, .. } => format!(
			"{operator}({})",
			args.iter().map(write_expr).collect::<Vec<_>>().join(", ")
		),
		Expression::GridInfo { kind, grid, dim, .. } => match kind {
			GridInfoKind::Shape => format!("shape(%{}, {})", grid.name, dim.unwrap_or(0)),
			GridInfoKind::Dimension => format!("dimension(%{})", grid.name),
		},
	}
}
