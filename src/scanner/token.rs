/// A token produced by the scanner
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
	pub r#type: TokenType<'a>,
	pub lexeme: &'a str,
	pub line:   usize,
	pub column: usize,
}

impl<'a> Token<'a> {
	pub fn new(r#type: TokenType<'a>, lexeme: &'a str, line: usize, column: usize) -> Self {
		Self { r#type, lexeme, line, column }
	}

	/// How the token reads in a diagnostic.
	pub fn describe(&self) -> String {
		match self.r#type {
			TokenType::Eof => "end of input".to_string(),
			_ => format!("'{}'", self.lexeme),
		}
	}
}

/// The different types of tokens, The copying is lightweight.
///
/// Arithmetic and comparison variants are named after what they mean, not
/// after the glyph that produces them: `+` scans as [`TokenType::Sub`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenType<'a> {
	/// New Line Character `\n`.
	NewLine,
	/// Empty Character: ` `, `\r`, `\t`.
	EmptyChar,
	/// Comment `@` up to the end of the line.
	Comment,
	/// Left parenthesis `(`.
	LeftParen,
	/// Right parenthesis `)`.
	RightParen,
	/// Brace `{`: closes a block, opens a call, reads a number.
	Brace,
	/// Comma `,`.
	Comma,
	/// Dot `.`, the print statement.
	Print,
	/// Glyph `-`.
	Add,
	/// Glyph `+`.
	Sub,
	/// Glyph `/`.
	Mul,
	/// Glyph `*`.
	Div,
	/// Caret `^`.
	Pow,
	/// Equal equal `==`.
	Assign,
	/// Bang equal `!=`.
	Eq,
	/// Equal `=`.
	NotEq,
	/// Glyph `>`.
	Less,
	/// Glyph `>=`.
	LessEq,
	/// Glyph `<`.
	Greater,
	/// Glyph `<=`.
	GreaterEq,
	/// Logical AND keyword.
	And,
	/// Logical OR keyword.
	Or,
	Sin,
	Cos,
	Tan,
	Cot,
	Sqrt,
	/// Integer type marker `575757`.
	Type,
	/// If marker `57?`.
	If,
	/// While marker `57!`.
	While,
	/// Statement end and block open `57`.
	FiftySeven,
	/// Identifier, e.g. variable or function name.
	Identifier(&'a str),
	/// String literal, quotes included, e.g. `"hello"`.
	StringLiteral(&'a str),
	/// Integer literal, e.g. `123`.
	Number(i64),
	/// End of file/input.
	Eof,
}

impl<'a> TokenType<'a> {
	pub fn is_ignored(&self) -> bool {
		matches!(self, TokenType::EmptyChar | TokenType::NewLine | TokenType::Comment)
	}

	pub fn is_builtin(&self) -> bool {
		matches!(self, TokenType::Sin | TokenType::Cos | TokenType::Tan | TokenType::Cot | TokenType::Sqrt)
	}

	pub fn keyword_or_identifier(value: &'a str) -> Self {
		match value {
			"sin" => TokenType::Sin,
			"cos" => TokenType::Cos,
			"tan" => TokenType::Tan,
			"cot" => TokenType::Cot,
			"sqrt" => TokenType::Sqrt,
			"and" => TokenType::And,
			"or" => TokenType::Or,
			_ => TokenType::Identifier(value),
		}
	}
}
