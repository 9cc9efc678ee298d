use std::fmt::{self, Display};

use Operator::*;

/// Expected children of an operator node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
	/// No children at all.
	Leaf,
	/// A left child and nothing on the right.
	Unary,
	/// Both children.
	Binary,
	/// A left child, the right one may be absent.
	LeftRequired,
	/// A right child, the left one may be absent.
	RightRequired,
}

/// The closed set of operator tags an AST node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
	Add,
	Sub,
	UnarySub,
	Mul,
	Div,
	Pow,
	Sqrt,
	Sin,
	Cos,
	Tan,
	Cot,
	Assign,
	LineEnd,
	If,
	While,
	Less,
	Greater,
	LessEq,
	GreaterEq,
	Eq,
	NotEq,
	And,
	Or,
	Print,
	Read,
	Comma,
	TypeInt,
	Type,
	NewFunc,
	Func,
	FuncBody,
	FuncCall,
	Return,
}

impl Operator {
	pub const ALL: [Operator; 33] = [
		Add, Sub, UnarySub, Mul, Div, Pow, Sqrt, Sin, Cos, Tan, Cot, Assign, LineEnd, If, While, Less, Greater, LessEq,
		GreaterEq, Eq, NotEq, And, Or, Print, Read, Comma, TypeInt, Type, NewFunc, Func, FuncBody, FuncCall, Return,
	];

	/// Canonical upper-case spelling used by the interchange format.
	pub fn name(self) -> &'static str {
		match self {
			Add => "ADD",
			Sub => "SUB",
			UnarySub => "UNARY_SUB",
			Mul => "MUL",
			Div => "DIV",
			Pow => "POW",
			Sqrt => "SQRT",
			Sin => "SIN",
			Cos => "COS",
			Tan => "TAN",
			Cot => "COT",
			Assign => "ASSIGN",
			LineEnd => "LINE_END",
			If => "IF",
			While => "WHILE",
			Less => "LESS",
			Greater => "GREATER",
			LessEq => "LESS_EQ",
			GreaterEq => "GREATER_EQ",
			Eq => "EQ",
			NotEq => "NOT_EQ",
			And => "AND",
			Or => "OR",
			Print => "PRINT",
			Read => "READ",
			Comma => "COMMA",
			TypeInt => "TYPE_INT",
			Type => "TYPE",
			NewFunc => "NEW_FUNC",
			Func => "FUNC",
			FuncBody => "FUNC_BODY",
			FuncCall => "FUNC_CALL",
			Return => "RETURN",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> { Self::ALL.into_iter().find(|operator| operator.name() == name) }

	pub fn arity(self) -> Arity {
		match self {
			Read | TypeInt => Arity::Leaf,
			UnarySub | Sqrt | Sin | Cos | Tan | Cot | Print | Return => Arity::Unary,
			LineEnd => Arity::LeftRequired,
			FuncBody => Arity::RightRequired,
			FuncCall => Arity::LeftRequired,
			_ => Arity::Binary,
		}
	}
}

impl Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}
