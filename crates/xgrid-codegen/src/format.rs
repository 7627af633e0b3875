//! An indent-scoped line buffer for emitted C source, grounded in the same
//! `LineFormat`/`Indentable` pattern C2's `xgrid-ir::print::Formatter` ports
//! — an RAII indent guard in place of a context-manager `__enter__`/`__exit__`
//! pair.

use std::fmt::Write as _;

pub(crate) struct CBuffer {
	indent_size: usize,
	indents: usize,
	buf: String,
}

impl CBuffer {
	pub(crate) fn new() -> Self {
		Self {
			indent_size: 4,
			indents: 0,
			buf: String::new(),
		}
	}

	pub(crate) fn println(&mut self, line: &str) {
		let _ = writeln!(self.buf, "{:indent$}{line}", "", indent = self.indents);
	}

	pub(crate) fn blank(&mut self) {
		self.buf.push('\n');
	}

	pub(crate) fn indent(&mut self) -> IndentGuard<'_> {
		self.indents += self.indent_size;
		IndentGuard { buf: self }
	}

	pub(crate) fn finish(self) -> String {
		self.buf
	}
}

pub(crate) struct IndentGuard<'a> {
	buf: &'a mut CBuffer,
}

impl Drop for IndentGuard<'_> {
	fn drop(&mut self) {
		self.buf.indents -= self.buf.indent_size;
	}
}

impl std::ops::Deref for IndentGuard<'_> {
	type Target = CBuffer;

	fn deref(&self) -> &Self::Target {
		self.buf
	}
}

impl std::ops::DerefMut for IndentGuard<'_> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.buf
	}
}
