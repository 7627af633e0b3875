/// The arithmetic operators, closed per the type system: equal-`Number`
/// operands, same-type result, except [`BinOp::Pow`] which widens (see
/// [`crate::expr::Expression::Binary`] type rule, enforced by the parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
	Add,
	Sub,
	Mul,
	Div,
	Pow,
	Mod,
}

impl BinOp {
	#[must_use]
	pub fn symbol(self) -> &'static str {
		match self {
			BinOp::Add => "+",
			BinOp::Sub => "-",
			BinOp::Mul => "*",
			BinOp::Div => "/",
			BinOp::Pow => "^",
			BinOp::Mod => "%",
		}
	}
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

impl CmpOp {
	#[must_use]
	pub fn symbol(self) -> &'static str {
		match self {
			CmpOp::Eq => "==",
			CmpOp::NotEq => "!=",
			CmpOp::Lt => "<",
			CmpOp::LtE => "<=",
			CmpOp::Gt => ">",
			CmpOp::GtE => ">=",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
	And,
	Or,
}

impl LogicOp {
	#[must_use]
	pub fn symbol(self) -> &'static str {
		match self {
			LogicOp::And => "&&",
			LogicOp::Or => "||",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Plus,
	Minus,
	Not,
}

impl UnaryOp {
	#[must_use]
	pub fn symbol(self) -> &'static str {
		match self {
			UnaryOp::Plus => "+",
			UnaryOp::Minus => "-",
			UnaryOp::Not => "!",
		}
	}
}
