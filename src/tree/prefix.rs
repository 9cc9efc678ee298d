//! Fully parenthesised prefix text for handing a tree between stages.
//!
//! Every node prints as `(text left right)` and an absent child as `nil`.
//! `text` is a decimal literal, a name's spelling, a string literal with its
//! quotes or an operator's upper-case name:
//!
//! ```text
//! (ASSIGN (x nil nil) (7 nil nil))
//! ```
//!
//! Reading rebuilds the name table with the same policy the parser applies,
//! so ids and roles come back identical. Identifiers may be spelled like an
//! operator (`ADD`, `IF`, ...); position and children tell them apart. An
//! operator always has a child except `READ` and `TYPE_INT`, and a bare
//! `READ` is a name only when such a name was declared before it.
use tracing::debug;

use super::{Arity, NameRole, Node, Operator, Tree};
use crate::{TreeError, symbols::Symbols};

/// Render `tree` in prefix form.
pub fn write(tree: &Tree, symbols: &Symbols) -> Result<String, TreeError> {
	let mut out = String::new();
	match &tree.root {
		Some(root) => write_node(root, symbols, &mut out)?,
		None => out.push_str("nil"),
	}
	Ok(out)
}

fn write_node(node: &Node, symbols: &Symbols, out: &mut String) -> Result<(), TreeError> {
	out.push('(');
	match node {
		Node::Literal(value) => out.push_str(&value.to_string()),
		Node::Name { id, .. } | Node::StringLiteral(id) => {
			out.push_str(symbols.spelling(*id).ok_or(TreeError::DanglingName(*id))?)
		}
		Node::Operation { operator, .. } => out.push_str(operator.name()),
	}
	for child in [node.left(), node.right()] {
		out.push(' ');
		match child {
			Some(child) => write_node(child, symbols, out)?,
			None => out.push_str("nil"),
		}
	}
	out.push(')');
	Ok(())
}

/// Parse prefix text back into a tree and a fresh name table.
pub fn read(source: &str) -> Result<(Tree, Symbols), TreeError> {
	let mut reader = Reader { source, cursor: 0 };
	let raw = reader.subtree()?;
	reader.skip_whitespace();
	if reader.cursor < source.len() {
		return Err(TreeError::TrailingInput { offset: reader.cursor });
	}

	let mut builder = Builder { symbols: Symbols::new(), scope: None };
	let root = raw.map(|raw| builder.build(raw, Position::Other)).transpose()?;
	let tree = Tree { root };
	debug!(nodes = tree.root.as_ref().map_or(0, |root| root.size()), "read prefix tree");
	Ok((tree, builder.symbols))
}

/// A node as spelled, before names are resolved.
struct RawNode<'a> {
	text:   &'a str,
	offset: usize,
	left:   Option<Box<RawNode<'a>>>,
	right:  Option<Box<RawNode<'a>>>,
}

struct Reader<'a> {
	source: &'a str,
	cursor: usize,
}

impl<'a> Reader<'a> {
	fn subtree(&mut self) -> Result<Option<Box<RawNode<'a>>>, TreeError> {
		self.skip_whitespace();
		if self.rest().starts_with("nil") {
			self.cursor += 3;
			return Ok(None);
		}
		self.expect('(', "'(' or 'nil'")?;
		self.skip_whitespace();
		let offset = self.cursor;
		let text = self.text()?;
		let left = self.subtree()?;
		let right = self.subtree()?;
		self.skip_whitespace();
		self.expect(')', "')'")?;
		Ok(Some(Box::new(RawNode { text, offset, left, right })))
	}

	fn text(&mut self) -> Result<&'a str, TreeError> {
		let rest = self.rest();
		let len = if let Some(quoted) = rest.strip_prefix('"') {
			match quoted.find('"') {
				Some(end) => end + 2,
				None => return Err(self.malformed("a closing '\"'")),
			}
		} else {
			rest.find(|c: char| c.is_whitespace() || c == '(' || c == ')').unwrap_or(rest.len())
		};
		if len == 0 {
			return Err(self.malformed("node text"));
		}
		let text = &rest[..len];
		self.cursor += len;
		Ok(text)
	}

	fn expect(&mut self, c: char, expected: &'static str) -> Result<(), TreeError> {
		if self.rest().starts_with(c) {
			self.cursor += c.len_utf8();
			Ok(())
		} else {
			Err(self.malformed(expected))
		}
	}

	fn skip_whitespace(&mut self) {
		let rest = self.rest();
		self.cursor += rest.len() - rest.trim_start().len();
	}

	fn rest(&self) -> &'a str { &self.source[self.cursor..] }

	fn malformed(&self, expected: &'static str) -> TreeError { TreeError::Malformed { offset: self.cursor, expected } }
}

/// Where a node sits, which decides the role of a name found there.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Position {
	Other,
	/// Left of `FUNC`.
	FunctionName,
	/// Left of `FUNC_CALL`.
	Callee,
	/// Right of `TYPE`, or left of an `ASSIGN` sitting there.
	Declared,
	/// Left of any other `ASSIGN`.
	Target,
	/// Left of `TYPE`.
	TypeMarker,
}

struct Builder {
	symbols: Symbols,
	/// Index of the function whose body is being read.
	scope:   Option<usize>,
}

impl Builder {
	fn build(&mut self, raw: Box<RawNode<'_>>, position: Position) -> Result<Box<Node>, TreeError> {
		let RawNode { text, offset, left, right } = *raw;

		let has_children = left.is_some() || right.is_some();
		let operator = Operator::from_name(text).filter(|&operator| self.is_operator(operator, text, position, has_children));
		if let Some(operator) = operator {
			let left_position = match operator {
				Operator::Func => Position::FunctionName,
				Operator::FuncCall => Position::Callee,
				Operator::Assign if position == Position::Declared => Position::Declared,
				Operator::Assign => Position::Target,
				Operator::Type => Position::TypeMarker,
				_ => Position::Other,
			};
			let right_position = if operator == Operator::Type { Position::Declared } else { Position::Other };
			let left = left.map(|left| self.build(left, left_position)).transpose()?;
			let right = right.map(|right| self.build(right, right_position)).transpose()?;
			return Ok(Node::operation(operator, left, right));
		}

		if has_children {
			return Err(TreeError::Malformed { offset, expected: "'nil' children under a literal or a name" });
		}
		if text.starts_with('"') {
			return Ok(Node::string(self.symbols.intern_string(text)));
		}
		if let Ok(value) = text.parse::<i64>() {
			return Ok(Node::literal(value));
		}

		let node = match position {
			Position::FunctionName => {
				let (id, scope) = self.symbols.declare_function(text);
				self.scope = Some(scope);
				Node::name(id, NameRole::Function)
			}
			Position::Declared => Node::name(self.symbols.declare(text, self.scope), NameRole::Declaration),
			Position::Callee => Node::name(self.lookup(text, offset)?, NameRole::Function),
			Position::Other | Position::Target | Position::TypeMarker => {
				Node::name(self.lookup(text, offset)?, NameRole::Variable)
			}
		};
		Ok(node)
	}

	/// Whether `text`, spelled like `operator`, is that operator here.
	fn is_operator(&self, operator: Operator, text: &str, position: Position, has_children: bool) -> bool {
		match position {
			Position::FunctionName | Position::Callee | Position::Target => false,
			Position::TypeMarker => true,
			Position::Declared => has_children && matches!(operator, Operator::Assign | Operator::Func),
			Position::Other if operator.arity() == Arity::Leaf => has_children || self.symbols.lookup(text).is_none(),
			Position::Other => has_children,
		}
	}

	fn lookup(&self, name: &str, offset: usize) -> Result<usize, TreeError> {
		self.symbols.lookup(name).ok_or_else(|| TreeError::UnknownName { offset, name: name.to_string() })
	}
}
