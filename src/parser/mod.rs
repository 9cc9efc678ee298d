//! Recursive descent over the token sequence, building the tree and the name
//! table in the same pass.
//!
//! |Level|Tokens|Operator|Associates
//! --|--|--|--
//! Or|`or`|OR|Left
//! And|`and`|AND|Left
//! Comparison|`< <= > >= != =`|GREATER GREATER_EQ LESS LESS_EQ EQ NOT_EQ|Left
//! Term|`- +`|ADD SUB|Left
//! Factor|`/ *`|MUL DIV|Left
//! Power|`^`|POW|Left
//!
//! Grammar:
//!
//! ``` BNF
//! program   → function+ EOF ;
//! function  → "575757" IDENT params block ;
//! params    → ( "575757" IDENT ( "," "575757" IDENT )* )? ;
//! block     → "57" statement+ "{" ;
//! statement → "57?" or "57" statement
//!           | "57!" or "57" statement
//!           | block
//!           | ( vardef | print | assign | return ) "57" ;
//! vardef    → "575757" IDENT "==" or ;
//! print     → "." ( STRING | or ) ;
//! assign    → IDENT "==" or ;
//! return    → or ;
//! or        → and ( "or" and )* ;
//! and       → cmp ( "and" cmp )* ;
//! cmp       → term ( ( "<" | "<=" | ">" | ">=" | "!=" | "=" ) term )* ;
//! term      → factor ( ( "-" | "+" ) factor )* ;
//! factor    → power ( ( "/" | "*" ) power )* ;
//! power     → call ( "^" call )* ;
//! call      → BUILTIN "(" or ")" | "{" | IDENT "{" ( or ( "," or )* )? "57"
//!           | "(" or ")" | NUMBER | IDENT ;
//! ```
//!
//! Declarations always append a fresh name. Uses bind to the first entry of
//! the same spelling in the flat table, whichever function declared it.

use TokenType::*;
use anyhow::anyhow;
use tracing::{debug, error};

use crate::{CompileError, ParseError, ParseErrorType, error::parser::ParserError, scanner::{Token, TokenType}, symbols::{NameId, Symbols}, tree::{NameRole, Node, Operator, Tree}};

type NodeResult = Result<Box<Node>, ParserError>;

/// Parser for a whole 57 program.
pub struct Parser<'a> {
	/// The tokens to parse, ending with `Eof`.
	tokens:  Vec<Token<'a>>,
	/// Index of the next token to consume.
	current: usize,
	symbols: Symbols,
	/// Index of the function being parsed inside the global table.
	scope:   Option<usize>,
}

impl<'a> Parser<'a> {
	pub fn new(tokens: Vec<Token<'a>>) -> Self { Self { tokens, current: 0, symbols: Symbols::new(), scope: None } }

	/// Parse the program, stopping at the first error.
	pub fn parse(mut self) -> Result<(Tree, Symbols), CompileError> {
		match self.program() {
			Ok(root) => {
				debug!(functions = self.symbols.globals.len(), names = self.symbols.all.len(), "parsed program");
				Ok((Tree::new(root), self.symbols))
			}
			Err(ParserError::ParseError(e)) => {
				error!("Parse error: {e}");
				Err(e.into())
			}
			Err(ParserError::InternalError(e)) => Err(e.into()),
		}
	}

	fn program(&mut self) -> NodeResult {
		let mut root = self.function()?;
		while !self.check(Eof)? {
			root = Node::binary(Operator::NewFunc, root, self.function()?);
		}
		Ok(root)
	}

	fn function(&mut self) -> NodeResult {
		self.consume(Type, "'575757'")?;
		let name = self.identifier()?;
		let (id, scope) = self.symbols.declare_function(name);
		self.scope = Some(scope);
		debug!(function = name, "parsing function");

		let params = self.params()?;
		let body = self.block()?;
		let func = Node::binary(
			Operator::Func,
			Node::name(id, NameRole::Function),
			Node::operation(Operator::FuncBody, params, Some(body)),
		);
		Ok(Node::binary(Operator::Type, Node::leaf(Operator::TypeInt), func))
	}

	fn params(&mut self) -> Result<Option<Box<Node>>, ParserError> {
		if !self.check(Type)? {
			return Ok(None);
		}
		let mut params = self.param()?;
		while self.check(Comma)? {
			self.advance()?;
			params = Node::binary(Operator::Comma, params, self.param()?);
		}
		Ok(Some(params))
	}

	fn param(&mut self) -> NodeResult {
		self.consume(Type, "'575757'")?;
		let id = self.declare()?;
		Ok(Node::binary(Operator::Type, Node::leaf(Operator::TypeInt), id))
	}

	/// Parse `57 statement+ {` into a right-leaning `LINE_END` chain.
	fn block(&mut self) -> NodeResult {
		self.consume(FiftySeven, "'57'")?;
		let mut statements = vec![self.statement()?];
		while !self.check(Brace)? {
			statements.push(self.statement()?);
		}
		self.advance()?; // consume '{'

		let mut chain = None;
		for statement in statements.into_iter().rev() {
			chain = Some(Node::operation(Operator::LineEnd, Some(statement), chain));
		}
		chain.ok_or_else(|| anyhow!("Empty block").into())
	}

	fn statement(&mut self) -> NodeResult {
		let r#type = self.peek()?.r#type;
		match r#type {
			If | While => {
				self.advance()?;
				let condition = self.or()?;
				self.consume(FiftySeven, "'57'")?;
				let operator = if r#type == If { Operator::If } else { Operator::While };
				Ok(Node::binary(operator, condition, self.statement()?))
			}
			FiftySeven => self.block(),
			_ => {
				let statement = match r#type {
					Type => self.vardef()?,
					Print => self.print()?,
					Identifier(_) if self.peek_at(1)?.r#type == Assign => self.assign()?,
					_ => Node::unary(Operator::Return, self.or()?),
				};
				self.consume(FiftySeven, "'57'")?;
				Ok(statement)
			}
		}
	}

	fn vardef(&mut self) -> NodeResult {
		self.advance()?; // consume '575757'
		let name = self.declare()?;
		self.consume(Assign, "'=='")?;
		let value = self.or()?;
		Ok(Node::binary(Operator::Type, Node::leaf(Operator::TypeInt), Node::binary(Operator::Assign, name, value)))
	}

	fn print(&mut self) -> NodeResult {
		self.advance()?; // consume '.'
		let r#type = self.peek()?.r#type;
		if let StringLiteral(text) = r#type {
			self.advance()?;
			return Ok(Node::unary(Operator::Print, Node::string(self.symbols.intern_string(text))));
		}
		Ok(Node::unary(Operator::Print, self.or()?))
	}

	fn assign(&mut self) -> NodeResult {
		let target = self.variable(NameRole::Variable)?;
		self.advance()?; // consume '=='
		Ok(Node::binary(Operator::Assign, target, self.or()?))
	}

	fn or(&mut self) -> NodeResult {
		let mut expression = self.and()?;
		while self.check(Or)? {
			self.advance()?;
			expression = Node::binary(Operator::Or, expression, self.and()?);
		}
		Ok(expression)
	}

	fn and(&mut self) -> NodeResult {
		let mut expression = self.comparison()?;
		while self.check(And)? {
			self.advance()?;
			expression = Node::binary(Operator::And, expression, self.comparison()?);
		}
		Ok(expression)
	}

	fn comparison(&mut self) -> NodeResult {
		let mut expression = self.term()?;
		loop {
			let operator = match self.peek()?.r#type {
				Less => Operator::Less,
				LessEq => Operator::LessEq,
				Greater => Operator::Greater,
				GreaterEq => Operator::GreaterEq,
				Eq => Operator::Eq,
				NotEq => Operator::NotEq,
				_ => return Ok(expression),
			};
			self.advance()?;
			expression = Node::binary(operator, expression, self.term()?);
		}
	}

	fn term(&mut self) -> NodeResult {
		let mut expression = self.factor()?;
		loop {
			let operator = match self.peek()?.r#type {
				Add => Operator::Add,
				Sub => Operator::Sub,
				_ => return Ok(expression),
			};
			self.advance()?;
			expression = Node::binary(operator, expression, self.factor()?);
		}
	}

	fn factor(&mut self) -> NodeResult {
		let mut expression = self.power()?;
		loop {
			let operator = match self.peek()?.r#type {
				Mul => Operator::Mul,
				Div => Operator::Div,
				_ => return Ok(expression),
			};
			self.advance()?;
			expression = Node::binary(operator, expression, self.power()?);
		}
	}

	fn power(&mut self) -> NodeResult {
		let mut expression = self.call()?;
		while self.check(Pow)? {
			self.advance()?;
			expression = Node::binary(Operator::Pow, expression, self.call()?);
		}
		Ok(expression)
	}

	fn call(&mut self) -> NodeResult {
		let token = self.peek()?.clone();
		match token.r#type {
			builtin if builtin.is_builtin() => {
				self.advance()?;
				self.consume(LeftParen, "'('")?;
				let argument = self.or()?;
				self.consume(RightParen, "')'")?;
				let operator = match builtin {
					Sin => Operator::Sin,
					Cos => Operator::Cos,
					Tan => Operator::Tan,
					Cot => Operator::Cot,
					_ => Operator::Sqrt,
				};
				Ok(Node::unary(operator, argument))
			}
			Brace => {
				self.advance()?;
				Ok(Node::leaf(Operator::Read))
			}
			Identifier(_) if self.peek_at(1)?.r#type == Brace => {
				let callee = self.variable(NameRole::Function)?;
				self.advance()?; // consume '{'
				let mut arguments = None;
				if !self.check(FiftySeven)? {
					let mut list = self.or()?;
					while self.check(Comma)? {
						self.advance()?;
						list = Node::binary(Operator::Comma, list, self.or()?);
					}
					arguments = Some(list);
				}
				self.consume(FiftySeven, "'57'")?;
				Ok(Node::operation(Operator::FuncCall, Some(callee), arguments))
			}
			LeftParen => {
				self.advance()?; // consume '('
				let expression = self.or()?;
				self.consume(RightParen, "')'")?;
				Ok(expression)
			}
			Number(value) => {
				self.advance()?;
				Ok(Node::literal(value))
			}
			Identifier(_) => self.variable(NameRole::Variable),
			_ => Err(self.error(&token, ParseErrorType::ExpectedExpression(token.describe()))),
		}
	}

	/// Consume a name being declared and append it to the current scope.
	fn declare(&mut self) -> NodeResult {
		let name = self.identifier()?;
		Ok(Node::name(self.symbols.declare(name, self.scope), NameRole::Declaration))
	}

	/// Consume a used name and bind it by flat lookup.
	fn variable(&mut self, role: NameRole) -> NodeResult {
		let token = self.peek()?.clone();
		let name = self.identifier()?;
		let id: NameId = match self.symbols.lookup(name) {
			Some(id) => id,
			None => return Err(self.error(&token, ParseErrorType::UndefinedName(name.to_string()))),
		};
		Ok(Node::name(id, role))
	}

	fn identifier(&mut self) -> Result<&'a str, ParserError> {
		let token = self.advance()?;
		match token.r#type {
			Identifier(name) => Ok(name),
			_ => Err(self.unexpected(&token, "a name")),
		}
	}

	fn consume(&mut self, r#type: TokenType<'a>, expected: &str) -> Result<Token<'a>, ParserError> {
		if self.check(r#type)? {
			return self.advance();
		}
		let token = self.peek()?.clone();
		Err(self.unexpected(&token, expected))
	}

	fn check(&self, r#type: TokenType<'a>) -> Result<bool, ParserError> { Ok(self.peek()?.r#type == r#type) }

	/// Advance to the next token. `Eof` is never consumed.
	fn advance(&mut self) -> Result<Token<'a>, ParserError> {
		let token = self.peek()?.clone();
		if token.r#type != Eof {
			self.current += 1;
		}
		Ok(token)
	}

	/// Peek at the current token.
	fn peek(&self) -> Result<&Token<'a>, ParserError> { self.peek_at(0) }

	/// Peek `distance` tokens ahead, stopping at `Eof`.
	fn peek_at(&self, distance: usize) -> Result<&Token<'a>, ParserError> {
		self.tokens
			.get(self.current + distance)
			.or_else(|| self.tokens.last())
			.ok_or_else(|| anyhow!("Unexpected EOF").into())
	}

	fn unexpected(&self, token: &Token<'a>, expected: &str) -> ParserError {
		self.error(token, ParseErrorType::UnexpectedToken { expected: expected.to_string(), found: token.describe() })
	}

	fn error(&self, token: &Token<'a>, r#type: ParseErrorType) -> ParserError {
		ParseError::new(token.line, token.column, r#type).into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{scanner::Scanner, tree::prefix};

	fn parse_program(input: &str) -> Result<(Tree, Symbols), CompileError> {
		let tokens = Scanner::new(input).scan_tokens()?;
		Parser::new(tokens).parse()
	}

	/// Parse `input` as the returned expression of `main` and compare its
	/// prefix form.
	fn parse(input: &str, equals: &str) {
		let (tree, symbols) = parse_program(&format!("575757 main 57 {input} 57 {{")).unwrap();
		let func = tree.root.as_deref().unwrap().right().unwrap();
		let statement = func.right().unwrap().right().unwrap().left().unwrap();
		assert_eq!(statement.operator(), Some(Operator::Return));
		let expression = Tree::new(Box::new(statement.left().unwrap().clone()));
		assert_eq!(prefix::write(&expression, &symbols).unwrap(), equals);
	}

	fn parse_error(input: &str) -> ParseErrorType {
		match parse_program(input) {
			Err(CompileError::ParseError(e)) => e.r#type,
			other => panic!("expected a parse error, got {other:?}"),
		}
	}

	#[test]
	fn parse_precedence() {
		parse("2 - 3 / 4", "(ADD (2 nil nil) (MUL (3 nil nil) (4 nil nil)))");
		parse("2 / 3 - 4", "(ADD (MUL (2 nil nil) (3 nil nil)) (4 nil nil))");
		parse("(2 - 3) / 4", "(MUL (ADD (2 nil nil) (3 nil nil)) (4 nil nil))");
		parse("2 * 3 ^ 4", "(DIV (2 nil nil) (POW (3 nil nil) (4 nil nil)))");
	}

	#[test]
	fn parse_left_associative() {
		parse("1 + 2 + 3", "(SUB (SUB (1 nil nil) (2 nil nil)) (3 nil nil))");
		parse("2 ^ 3 ^ 4", "(POW (POW (2 nil nil) (3 nil nil)) (4 nil nil))");
	}

	#[test]
	fn parse_logic() {
		parse("1 < 2 and 3 or 4", "(OR (AND (GREATER (1 nil nil) (2 nil nil)) (3 nil nil)) (4 nil nil))");
		parse("1 != 2 = 3", "(NOT_EQ (EQ (1 nil nil) (2 nil nil)) (3 nil nil))");
	}

	#[test]
	fn parse_builtins_and_read() {
		parse("sin(1) / {", "(MUL (SIN (1 nil nil) nil) (READ nil nil))");
		parse("sqrt(cot(2))", "(SQRT (COT (2 nil nil) nil) nil)");
	}

	#[test]
	fn parse_function_and_call() {
		let source = "575757 add 575757 a, 575757 b 57\n    a - b 57\n{\n575757 main 57\n    . add { 1, 2 57 57\n{\n";
		let (tree, symbols) = parse_program(source).unwrap();
		assert_eq!(tree.verify(&symbols), Ok(()));

		let root = tree.root.as_deref().unwrap();
		assert_eq!(root.operator(), Some(Operator::NewFunc));
		assert_eq!(symbols.function_scope("add"), Some(0));
		assert_eq!(symbols.local(0).unwrap().len(), 2);
		assert_eq!(symbols.local(1).unwrap().len(), 0);

		let params = root.left().unwrap().right().unwrap().right().unwrap().left().unwrap();
		assert_eq!(
			prefix::write(&Tree::new(Box::new(params.clone())), &symbols).unwrap(),
			"(COMMA (TYPE (TYPE_INT nil nil) (a nil nil)) (TYPE (TYPE_INT nil nil) (b nil nil)))"
		);

		let main_body = root.right().unwrap().right().unwrap().right().unwrap().right().unwrap();
		let call = main_body.left().unwrap().left().unwrap();
		assert_eq!(call.left(), Some(&Node::Name { id: 0, role: NameRole::Function }));
		assert_eq!(call.right().and_then(Node::operator), Some(Operator::Comma));
	}

	#[test]
	fn parse_statements() {
		let source = "575757 main 57 575757 i == 0 57 57! i > 3 57 57 i == i - 1 57 . \"step\" 57 { 57? i 57 . i 57 i 57 {";
		let (tree, symbols) = parse_program(source).unwrap();
		assert_eq!(tree.verify(&symbols), Ok(()));
		assert_eq!(
			prefix::write(&tree, &symbols).unwrap(),
			"(TYPE (TYPE_INT nil nil) (FUNC (main nil nil) (FUNC_BODY nil (LINE_END (TYPE (TYPE_INT nil nil) (ASSIGN \
			 (i nil nil) (0 nil nil))) (LINE_END (WHILE (LESS (i nil nil) (3 nil nil)) (LINE_END (ASSIGN (i nil nil) \
			 (ADD (i nil nil) (1 nil nil))) (LINE_END (PRINT (\"step\" nil nil) nil) nil))) (LINE_END (IF (i nil nil) \
			 (PRINT (i nil nil) nil)) (LINE_END (RETURN (i nil nil) nil) nil)))))))"
		);
	}

	#[test]
	fn parse_flat_lookup() {
		let source = "575757 f 57 575757 x == 1 57 x 57 {\n575757 main 57 575757 x == 2 57 . x 57 {";
		let (tree, _) = parse_program(source).unwrap();
		let main_body = tree.root.as_deref().unwrap().right().unwrap().right().unwrap().right().unwrap().right().unwrap();
		let printed = main_body.right().unwrap().left().unwrap().left().unwrap();
		// `x` of `f` was declared first, so it wins inside `main` too.
		assert_eq!(printed, &Node::Name { id: 1, role: NameRole::Variable });
	}

	#[test]
	fn parse_errors() {
		assert_eq!(parse_error("575757 main 57 . y 57 {"), ParseErrorType::UndefinedName("y".to_string()));
		assert_eq!(
			parse_error("575757 main 57 1 {"),
			ParseErrorType::UnexpectedToken { expected: "'57'".to_string(), found: "'{'".to_string() }
		);
		assert_eq!(parse_error("575757 main 57 . 57 {"), ParseErrorType::ExpectedExpression("'57'".to_string()));
		assert_eq!(
			parse_error("main 57 1 57 {"),
			ParseErrorType::UnexpectedToken { expected: "'575757'".to_string(), found: "'main'".to_string() }
		);
		assert_eq!(
			parse_error("575757 main 57 1 57"),
			ParseErrorType::ExpectedExpression("end of input".to_string())
		);
	}

	#[test]
	fn parse_error_position() {
		match parse_program("575757 main 57\n  . nope 57 {") {
			Err(CompileError::ParseError(e)) => assert_eq!((e.line, e.column), (2, 5)),
			other => panic!("expected a parse error, got {other:?}"),
		}
	}
}
