//! Constant folding over the tree, run between the front and the back end.
//!
//! `ADD`, `SUB`, `MUL` and `DIV` on two literals are replaced by their value.
//! Adding or subtracting 0 and multiplying or dividing by 1 leave the other
//! operand. A product with a literal 0 becomes 0 when the other operand does
//! no input, call or store.
//!
//! Nothing is folded that the stack machine would compute differently or the
//! decompiler could not spell: division by zero, overflow and negative
//! results stay as they are.
use tracing::debug;

use crate::tree::{Node, Operator, Tree};

/// Fold `tree` in place. Returns the number of nodes replaced.
pub fn simplify(tree: &mut Tree) -> usize {
	let mut folds = 0;
	if let Some(root) = tree.root.take() {
		tree.root = Some(fold(root, &mut folds));
	}
	debug!(folds, "simplified");
	folds
}

fn fold(node: Box<Node>, folds: &mut usize) -> Box<Node> {
	let (operator, left, right) = match *node {
		Node::Operation { operator, left, right } => (operator, left, right),
		leaf => return Box::new(leaf),
	};
	let left = left.map(|left| fold(left, folds));
	let right = right.map(|right| fold(right, folds));

	match (operator, left, right) {
		(Operator::Add | Operator::Sub | Operator::Mul | Operator::Div, Some(left), Some(right)) => {
			match arithmetic(operator, left, right) {
				Ok(folded) => {
					*folds += 1;
					folded
				}
				Err((left, right)) => Node::binary(operator, left, right),
			}
		}
		(operator, left, right) => Node::operation(operator, left, right),
	}
}

/// The folded node, or both operands back when nothing applies.
fn arithmetic(operator: Operator, left: Box<Node>, right: Box<Node>) -> Result<Box<Node>, (Box<Node>, Box<Node>)> {
	use Operator::*;
	match (operator, literal(&left), literal(&right)) {
		(_, Some(a), Some(b)) => {
			let value = match operator {
				Add => a.checked_add(b),
				Sub => a.checked_sub(b),
				Mul => a.checked_mul(b),
				_ => a.checked_div(b),
			};
			match value.filter(|value| *value >= 0) {
				Some(value) => Ok(Node::literal(value)),
				None => Err((left, right)),
			}
		}
		(Add, _, Some(0)) | (Sub, _, Some(0)) | (Mul, _, Some(1)) | (Div, _, Some(1)) => Ok(left),
		(Add, Some(0), _) | (Mul, Some(1), _) => Ok(right),
		(Mul, Some(0), _) if pure(&right) => Ok(left),
		(Mul, _, Some(0)) if pure(&left) => Ok(right),
		_ => Err((left, right)),
	}
}

fn literal(node: &Node) -> Option<i64> {
	match node {
		Node::Literal(value) => Some(*value),
		_ => None,
	}
}

/// No input, call or store anywhere below `node`.
fn pure(node: &Node) -> bool {
	!matches!(node.operator(), Some(Operator::Read | Operator::FuncCall | Operator::Assign))
		&& node.left().is_none_or(pure)
		&& node.right().is_none_or(pure)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{parser::Parser, scanner::Scanner, symbols::Symbols, tree::prefix};

	fn parse(input: &str) -> (Tree, Symbols) {
		let tokens = Scanner::new(input).scan_tokens().unwrap();
		Parser::new(tokens).parse().unwrap()
	}

	fn simplified(input: &str, equals: &str, folds: usize) {
		let (mut tree, symbols) = parse(input);
		assert_eq!(simplify(&mut tree), folds);
		assert_eq!(tree.verify(&symbols), Ok(()));
		let body = prefix::write(&tree, &symbols).unwrap();
		assert!(body.contains(equals), "{body} does not contain {equals}");
	}

	#[test]
	fn literals_fold() {
		// `-` adds and `/` multiplies.
		simplified("575757 main 57 . 2 - 3 / 4 57 {", "(PRINT (14 nil nil) nil)", 2);
		simplified("575757 main 57 . 9 + 6 * 3 57 {", "(PRINT (7 nil nil) nil)", 2);
	}

	#[test]
	fn identities_fold() {
		let declare = "575757 main 57 575757 x == { 57 ";
		simplified(&format!("{declare}. x - 0 57 {{"), "(PRINT (x nil nil) nil)", 1);
		simplified(&format!("{declare}. 0 - x 57 {{"), "(PRINT (x nil nil) nil)", 1);
		simplified(&format!("{declare}. x + 0 57 {{"), "(PRINT (x nil nil) nil)", 1);
		simplified(&format!("{declare}. 1 / x 57 {{"), "(PRINT (x nil nil) nil)", 1);
		simplified(&format!("{declare}. x * 1 57 {{"), "(PRINT (x nil nil) nil)", 1);
		simplified(&format!("{declare}. x / 0 57 {{"), "(PRINT (0 nil nil) nil)", 1);
	}

	#[test]
	fn effects_and_traps_stay() {
		simplified("575757 main 57 . { / 0 57 {", "(MUL (READ nil nil) (0 nil nil))", 0);
		simplified("575757 main 57 . 1 * 0 57 {", "(DIV (1 nil nil) (0 nil nil))", 0);
		simplified("575757 main 57 . 1 + 2 57 {", "(SUB (1 nil nil) (2 nil nil))", 0);
		simplified("575757 main 57 . 9223372036854775807 - 1 57 {", "(ADD (9223372036854775807 nil nil) (1 nil nil))", 0);
	}

	#[test]
	fn empty_tree() {
		let mut tree = Tree::default();
		assert_eq!(simplify(&mut tree), 0);
		assert_eq!(tree, Tree::default());
	}
}
