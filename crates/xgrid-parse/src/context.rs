use xgrid_ir::DefinitionMode;

/// A tag pushed onto the [`ContextStack`] on entry to a construct and popped
/// on exit; gates which constructs are legal and what certain syntaxes mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextTag {
	Kernel,
	Function,
	External,
	If,
	While,
	C,
	Boundary(i32),
}

/// The parser's context stack. Boundary nesting is forbidden (SPEC_FULL.md
/// §4.3): at most one `Boundary` tag may be on the stack at a time.
#[derive(Debug, Clone, Default)]
pub struct ContextStack(Vec<ContextTag>);

impl ContextStack {
	#[must_use]
	pub fn new(mode: DefinitionMode) -> Self {
		let root = match mode {
			DefinitionMode::Kernel => ContextTag::Kernel,
			DefinitionMode::Function => ContextTag::Function,
			DefinitionMode::External => ContextTag::External,
		};
		Self(vec![root])
	}

	pub fn push(&mut self, tag: ContextTag) {
		self.0.push(tag);
	}

	pub fn pop(&mut self) {
		self.0.pop();
	}

	#[must_use]
	pub fn in_raw_c(&self) -> bool {
		matches!(self.0.last(), Some(ContextTag::C))
	}

	#[must_use]
	pub fn has_boundary(&self) -> bool {
		self.0.iter().any(|t| matches!(t, ContextTag::Boundary(_)))
	}

	/// The boundary mask captured by the innermost active `Boundary` tag, or
	/// 0 if none is active.
	#[must_use]
	pub fn current_boundary_mask(&self) -> i32 {
		self.0
			.iter()
			.rev()
			.find_map(|t| match t {
				ContextTag::Boundary(mask) => Some(*mask),
				_ => None,
			})
			.unwrap_or(0)
	}

	#[must_use]
	pub fn root_mode(&self) -> Option<ContextTag> {
		self.0.first().copied()
	}
}

/// An RAII guard that pops its tag off the stack when dropped, so a lowering
/// function can't forget to balance a push on an early `?`-propagated error.
pub struct ContextGuard<'a> {
	stack: &'a mut ContextStack,
}

impl<'a> ContextGuard<'a> {
	pub fn push(stack: &'a mut ContextStack, tag: ContextTag) -> Self {
		stack.push(tag);
		Self { stack }
	}
}

impl Drop for ContextGuard<'_> {
	fn drop(&mut self) {
		self.stack.pop();
	}
}

impl std::ops::Deref for ContextGuard<'_> {
	type Target = ContextStack;

	fn deref(&self) -> &Self::Target {
		self.stack
	}
}
