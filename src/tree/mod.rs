//! The abstract syntax tree shared by every stage.
//!
//! Nodes are binary: operators own up to two children, literals and names
//! own none. Children are boxed and owned by their parent, so a subtree is
//! released as soon as whoever holds it goes out of scope and a node can
//! never be shared or be its own child.
mod operator;
pub mod prefix;

pub use operator::*;

use crate::{TreeError, symbols::{NameId, Symbols}};

/// How a name node is used at its position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRole {
	/// A read of, or a store into, an existing variable.
	Variable,
	/// A parameter or a variable being declared.
	Declaration,
	/// The name of a function, declared or called.
	Function,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	Literal(i64),
	Name { id: NameId, role: NameRole },
	/// Points at the verbatim quoted text in the name table.
	StringLiteral(NameId),
	Operation { operator: Operator, left: Option<Box<Node>>, right: Option<Box<Node>> },
}

impl Node {
	pub fn literal(value: i64) -> Box<Self> { Box::new(Node::Literal(value)) }

	pub fn name(id: NameId, role: NameRole) -> Box<Self> { Box::new(Node::Name { id, role }) }

	pub fn string(id: NameId) -> Box<Self> { Box::new(Node::StringLiteral(id)) }

	pub fn binary(operator: Operator, left: Box<Self>, right: Box<Self>) -> Box<Self> {
		Box::new(Node::Operation { operator, left: Some(left), right: Some(right) })
	}

	pub fn unary(operator: Operator, left: Box<Self>) -> Box<Self> {
		Box::new(Node::Operation { operator, left: Some(left), right: None })
	}

	pub fn leaf(operator: Operator) -> Box<Self> { Box::new(Node::Operation { operator, left: None, right: None }) }

	pub fn operation(operator: Operator, left: Option<Box<Self>>, right: Option<Box<Self>>) -> Box<Self> {
		Box::new(Node::Operation { operator, left, right })
	}

	pub fn operator(&self) -> Option<Operator> {
		match self {
			Node::Operation { operator, .. } => Some(*operator),
			_ => None,
		}
	}

	pub fn left(&self) -> Option<&Node> {
		match self {
			Node::Operation { left, .. } => left.as_deref(),
			_ => None,
		}
	}

	pub fn right(&self) -> Option<&Node> {
		match self {
			Node::Operation { right, .. } => right.as_deref(),
			_ => None,
		}
	}

	/// Number of nodes in this subtree.
	pub fn size(&self) -> usize { 1 + self.left().map_or(0, Node::size) + self.right().map_or(0, Node::size) }
}

/// A whole program.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tree {
	pub root: Option<Box<Node>>,
}

impl Tree {
	pub fn new(root: Box<Node>) -> Self { Self { root: Some(root) } }

	/// Check the shape of every operator node and that every name id points
	/// into `symbols`.
	pub fn verify(&self, symbols: &Symbols) -> Result<(), TreeError> {
		match &self.root {
			Some(root) => verify_node(root, symbols),
			None => Ok(()),
		}
	}
}

fn verify_node(node: &Node, symbols: &Symbols) -> Result<(), TreeError> {
	let (operator, left, right) = match node {
		Node::Literal(_) => return Ok(()),
		Node::Name { id, .. } | Node::StringLiteral(id) => {
			return symbols.spelling(*id).map(|_| ()).ok_or(TreeError::DanglingName(*id));
		}
		Node::Operation { operator, left, right } => (*operator, left.as_deref(), right.as_deref()),
	};

	let bad = |reason| Err(TreeError::BadArity { operator, reason });
	match (operator.arity(), left.is_some(), right.is_some()) {
		(Arity::Leaf, false, false)
		| (Arity::Unary, true, false)
		| (Arity::Binary, true, true)
		| (Arity::LeftRequired, true, _)
		| (Arity::RightRequired, _, true) => {}
		(Arity::Leaf, ..) => return bad("a leaf operator has children"),
		(Arity::Unary, ..) => return bad("a unary operator needs exactly a left child"),
		(Arity::Binary, ..) => return bad("a binary operator needs both children"),
		(Arity::LeftRequired, ..) => return bad("the left child is missing"),
		(Arity::RightRequired, ..) => return bad("the right child is missing"),
	}

	match operator {
		Operator::Func | Operator::FuncCall => {
			if !matches!(left, Some(Node::Name { role: NameRole::Function, .. })) {
				return bad("the left child must be a function name");
			}
		}
		Operator::Assign => {
			if !matches!(left, Some(Node::Name { .. })) {
				return bad("the left child must be a name");
			}
		}
		_ => {}
	}

	if let Some(left) = left {
		verify_node(left, symbols)?;
	}
	if let Some(right) = right {
		verify_node(right, symbols)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn symbols() -> Symbols {
		let mut symbols = Symbols::new();
		let (_, main) = symbols.declare_function("main");
		symbols.declare("x", Some(main));
		symbols
	}

	#[test]
	fn verify_accepts_well_formed_trees() {
		let call = Node::operation(Operator::FuncCall, Some(Node::name(0, NameRole::Function)), None);
		let body = Node::unary(Operator::LineEnd, Node::unary(Operator::Return, call));
		let tree = Tree::new(Node::binary(Operator::Assign, Node::name(1, NameRole::Variable), Node::literal(1)));

		assert_eq!(tree.verify(&symbols()), Ok(()));
		assert_eq!(Tree::new(body).verify(&symbols()), Ok(()));
		assert_eq!(Tree::default().verify(&symbols()), Ok(()));
	}

	#[test]
	fn verify_rejects_bad_shapes() {
		let missing = Tree::new(Node::unary(Operator::Add, Node::literal(1)));
		let extra = Tree::new(Node::binary(Operator::Sin, Node::literal(1), Node::literal(2)));
		let call = Tree::new(Node::unary(Operator::FuncCall, Node::name(1, NameRole::Variable)));

		assert!(matches!(missing.verify(&symbols()), Err(TreeError::BadArity { operator: Operator::Add, .. })));
		assert!(matches!(extra.verify(&symbols()), Err(TreeError::BadArity { operator: Operator::Sin, .. })));
		assert!(matches!(call.verify(&symbols()), Err(TreeError::BadArity { operator: Operator::FuncCall, .. })));
	}

	#[test]
	fn verify_rejects_dangling_names() {
		let tree = Tree::new(Node::unary(Operator::Print, Node::name(7, NameRole::Variable)));
		assert_eq!(tree.verify(&symbols()), Err(TreeError::DanglingName(7)));
	}

	#[test]
	fn size_counts_every_node() {
		let node = Node::binary(Operator::Add, Node::literal(1), Node::unary(Operator::Sin, Node::literal(2)));
		assert_eq!(node.size(), 4);
	}
}
