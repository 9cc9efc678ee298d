//! Turns a tree back into 57 source.
//!
//! Expressions come out fully parenthesised and statements one per line, so
//! the text scans and parses back into the same tree.
use tracing::debug;

use crate::{TreeError, symbols::Symbols, tree::{Node, Operator, Tree}};

const INDENT: &str = "    ";

/// Regenerate source text for `tree`.
pub fn unparse(tree: &Tree, symbols: &Symbols) -> Result<String, TreeError> {
	let mut unparser = Unparser { symbols, out: String::new() };
	if let Some(root) = &tree.root {
		unparser.program(root)?;
	}
	debug!(bytes = unparser.out.len(), "unparsed");
	Ok(unparser.out)
}

struct Unparser<'s> {
	symbols: &'s Symbols,
	out:     String,
}

impl<'s> Unparser<'s> {
	fn program(&mut self, node: &Node) -> Result<(), TreeError> {
		match node.operator() {
			Some(Operator::NewFunc) => {
				self.program(required(node.left(), "a program")?)?;
				self.out.push('\n');
				self.program(required(node.right(), "a program")?)
			}
			Some(Operator::Type) => self.function(required(node.right(), "a function")?),
			_ => Err(misplaced(node, "at the top level")),
		}
	}

	fn function(&mut self, node: &Node) -> Result<(), TreeError> {
		if node.operator() != Some(Operator::Func) {
			return Err(misplaced(node, "as a function"));
		}
		let name = self.name(required(node.left(), "a function")?)?;
		let body = required(node.right(), "a function")?;
		let (params, code) = match body.operator() {
			Some(Operator::FuncBody) => (body.left(), required(body.right(), "a function")?),
			_ => (None, body),
		};

		let mut header = format!("575757 {name}");
		let mut declared = Vec::new();
		flatten(params, &mut declared);
		for (index, param) in declared.into_iter().enumerate() {
			let param = param.right().unwrap_or(param);
			header.push_str(if index == 0 { " 575757 " } else { ", 575757 " });
			header.push_str(self.name(param)?);
		}
		header.push_str(" 57");
		self.line(0, &header);
		self.statements(code, 1)?;
		self.line(0, "{");
		Ok(())
	}

	/// Every statement of a `LINE_END` chain, or a lone statement.
	fn statements(&mut self, node: &Node, depth: usize) -> Result<(), TreeError> {
		let mut current = Some(node);
		while let Some(node) = current {
			if node.operator() != Some(Operator::LineEnd) {
				return self.statement(node, depth);
			}
			self.statement(required(node.left(), "a block")?, depth)?;
			current = node.right();
		}
		Ok(())
	}

	fn statement(&mut self, node: &Node, depth: usize) -> Result<(), TreeError> {
		let text = match node.operator() {
			Some(Operator::LineEnd) => {
				self.line(depth, "57");
				self.statements(node, depth + 1)?;
				self.line(depth, "{");
				return Ok(());
			}
			Some(operator @ (Operator::If | Operator::While)) => {
				let marker = if operator == Operator::If { "57?" } else { "57!" };
				let condition = self.expression(required(node.left(), "a condition")?)?;
				self.line(depth, &format!("{marker} {condition} 57"));
				return self.statement(required(node.right(), "a condition")?, depth + 1);
			}
			Some(Operator::Type) => match node.right() {
				Some(assign) if assign.operator() == Some(Operator::Assign) => {
					format!("575757 {}", self.assignment(assign)?)
				}
				_ => return Err(misplaced(node, "as a statement")),
			},
			Some(Operator::Assign) => self.assignment(node)?,
			Some(Operator::Print) => match required(node.left(), "print")? {
				Node::StringLiteral(id) => format!(". {}", self.spelling(*id)?),
				value => format!(". {}", self.expression(value)?),
			},
			Some(Operator::Return) => self.expression(required(node.left(), "a return")?)?,
			_ => return Err(misplaced(node, "as a statement")),
		};
		self.line(depth, &format!("{text} 57"));
		Ok(())
	}

	fn assignment(&self, node: &Node) -> Result<String, TreeError> {
		let target = self.name(required(node.left(), "an assignment")?)?;
		Ok(format!("{target} == {}", self.expression(required(node.right(), "an assignment")?)?))
	}

	fn expression(&self, node: &Node) -> Result<String, TreeError> {
		let operator = match node {
			Node::Literal(value) if *value >= 0 => return Ok(value.to_string()),
			Node::Name { id, .. } => return Ok(self.spelling(*id)?.to_string()),
			Node::Operation { operator, .. } => *operator,
			_ => return Err(misplaced(node, "in an expression")),
		};

		use Operator::*;
		let glyph = match operator {
			Add => "-",
			Sub => "+",
			Mul => "/",
			Div => "*",
			Pow => "^",
			Less => ">",
			LessEq => ">=",
			Greater => "<",
			GreaterEq => "<=",
			Eq => "!=",
			NotEq => "=",
			And => "and",
			Or => "or",
			Sqrt | Sin | Cos | Tan | Cot => {
				let argument = self.expression(required(node.left(), "a builtin")?)?;
				return Ok(format!("{}({argument})", operator.name().to_lowercase()));
			}
			Read => return Ok("{".to_string()),
			FuncCall => {
				let callee = self.name(required(node.left(), "a call")?)?;
				let mut arguments = Vec::new();
				flatten(node.right(), &mut arguments);
				let arguments =
					arguments.into_iter().map(|argument| self.expression(argument)).collect::<Result<Vec<_>, _>>()?;
				return Ok(if arguments.is_empty() {
					format!("{callee} {{ 57")
				} else {
					format!("{callee} {{ {} 57", arguments.join(", "))
				});
			}
			_ => return Err(misplaced(node, "in an expression")),
		};
		let left = self.expression(required(node.left(), "a binary operator")?)?;
		let right = self.expression(required(node.right(), "a binary operator")?)?;
		Ok(format!("({left} {glyph} {right})"))
	}

	fn name(&self, node: &Node) -> Result<&'s str, TreeError> {
		match node {
			Node::Name { id, .. } => self.spelling(*id),
			_ => Err(misplaced(node, "where a name is expected")),
		}
	}

	fn spelling(&self, id: usize) -> Result<&'s str, TreeError> {
		self.symbols.spelling(id).ok_or(TreeError::DanglingName(id))
	}

	fn line(&mut self, depth: usize, text: &str) {
		self.out.push_str(&INDENT.repeat(depth));
		self.out.push_str(text);
		self.out.push('\n');
	}
}

/// Items of a left-leaning `COMMA` chain, in source order.
fn flatten<'n>(node: Option<&'n Node>, out: &mut Vec<&'n Node>) {
	match node {
		Some(node) if node.operator() == Some(Operator::Comma) => {
			flatten(node.left(), out);
			flatten(node.right(), out);
		}
		Some(node) => out.push(node),
		None => {}
	}
}

fn required<'n>(node: Option<&'n Node>, place: &'static str) -> Result<&'n Node, TreeError> {
	node.ok_or(TreeError::Misplaced { what: "a missing child".to_string(), place })
}

fn misplaced(node: &Node, place: &'static str) -> TreeError {
	let what = match node {
		Node::Literal(value) => format!("literal {value}"),
		Node::Name { .. } => "a name".to_string(),
		Node::StringLiteral(_) => "a string literal".to_string(),
		Node::Operation { operator, .. } => operator.to_string(),
	};
	TreeError::Misplaced { what, place }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{parser::Parser, scanner::Scanner, tree::prefix};

	fn parse(input: &str) -> (Tree, Symbols) { Parser::new(Scanner::new(input).scan_tokens().unwrap()).parse().unwrap() }

	/// Unparse `input` and check the text parses back into the same tree.
	fn roundtrip(input: &str) -> String {
		let (tree, symbols) = parse(input);
		let source = unparse(&tree, &symbols).unwrap();
		let (again, again_symbols) = parse(&source);
		assert_eq!(prefix::write(&again, &again_symbols).unwrap(), prefix::write(&tree, &symbols).unwrap());
		source
	}

	#[test]
	fn unparse_program() {
		let source = roundtrip("575757 main 57 575757 x == 7 57 . x 57 {");
		assert_eq!(source, "575757 main 57\n    575757 x == 7 57\n    . x 57\n{\n");
	}

	#[test]
	fn unparse_inverts_glyphs() {
		let source = roundtrip("575757 main 57 (1 - 2 / 3 < 4) and 5 != 6 or 7 = 8 57 {");
		assert_eq!(source.lines().nth(1), Some("    ((((1 - (2 / 3)) < 4) and (5 != 6)) or (7 = 8)) 57"));
	}

	#[test]
	fn unparse_control_flow_and_calls() {
		let source = roundtrip(
			"575757 f 575757 a, 575757 b 57 57? a > b 57 57 . \"big\" 57 a 57 { b 57 {\n\
			 575757 main 57 575757 i == { 57 57! i 57 i == i + 1 57 . f { i, sqrt(4) 57 57 . f { 1, 2 57 + 0 57 {",
		);
		assert!(source.starts_with("575757 f 575757 a, 575757 b 57\n    57? (a > b) 57\n        57\n"));
		assert!(source.contains("\n    575757 i == { 57\n    57! i 57\n        i == (i + 1) 57\n"));
		assert!(source.contains("    . f { i, sqrt(4) 57 57\n"));
	}

	#[test]
	fn unparse_rejects_what_has_no_source_form() {
		let (_, symbols) = parse("575757 main 57 1 57 {");
		let tree = Tree::new(Node::unary(Operator::UnarySub, Node::literal(1)));
		assert!(matches!(unparse(&tree, &symbols), Err(TreeError::Misplaced { .. })));
	}
}
