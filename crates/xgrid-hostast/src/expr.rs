use xgrid_util::{Location, RString};

/// A literal value as it appears in host source: `42`, `3.5`, `true`,
/// `"..."`. String literals never become IR constants — the only place one
/// may appear is as the sole statement inside a `with c(): ...` block, where
/// it is lifted verbatim into an `Inline` node instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(RString),
}

/// Binary arithmetic operator token, named after the host language's own
/// `ast.operator` node names rather than the symbol, since `Pow` is spelled
/// `**`/`^` differently across host languages but always means the same
/// thing to C3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
	Add,
	Sub,
	Mult,
	Div,
	Pow,
	Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
	Eq,
	NotEq,
	Lt,
	LtE,
	Gt,
	GtE,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
	And,
	Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	UAdd,
	USub,
	Not,
}

/// One expression node. This mirrors the subset of Python's `ast` expression
/// nodes the sublanguage in C3 recognizes; any other host-language construct
/// a real frontend might produce (lambdas, comprehensions, f-strings) simply
/// has no variant here and is therefore, by construction, something C3 can
/// never be asked to lower.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Name {
		id: RString,
		location: Location,
	},
	Constant {
		value: Constant,
		location: Location,
	},
	BinOp {
		left: Box<Expr>,
		op: BinOpKind,
		right: Box<Expr>,
		location: Location,
	},
	UnaryOp {
		op: UnaryOp,
		operand: Box<Expr>,
		location: Location,
	},
	BoolOp {
		op: BoolOp,
		values: Vec<Expr>,
		location: Location,
	},
	Compare {
		left: Box<Expr>,
		op: CmpOp,
		right: Box<Expr>,
		location: Location,
	},
	IfExp {
		test: Box<Expr>,
		body: Box<Expr>,
		orelse: Box<Expr>,
		location: Location,
	},
	Call {
		func: Box<Expr>,
		args: Vec<Expr>,
		location: Location,
	},
	Subscript {
		value: Box<Expr>,
		slice: Vec<Expr>,
		location: Location,
	},
	Attribute {
		value: Box<Expr>,
		attr: RString,
		location: Location,
	},
	Tuple {
		elements: Vec<Expr>,
		location: Location,
	},
}

impl Expr {
	#[must_use]
	pub fn location(&self) -> &Location {
		match self {
			Expr::Name { location, .. }
			| Expr::Constant { location, .. }
			| Expr::BinOp { location, .. }
			| Expr::UnaryOp { location, .. }
			| Expr::BoolOp { location, .. }
			| Expr::Compare { location, .. }
			| Expr::IfExp { location, .. }
			| Expr::Call { location, .. }
			| Expr::Subscript { location, .. }
			| Expr::Attribute { location, .. }
			| Expr::Tuple { location, .. } => location,
		}
	}
}
