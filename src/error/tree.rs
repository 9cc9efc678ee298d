use crate::tree::Operator;

/// Errors of the AST interchange reader and of tree verification.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TreeError {
	#[error("offset {offset}: expected {expected}")]
	Malformed { offset: usize, expected: &'static str },
	#[error("offset {offset}: unknown name '{name}'")]
	UnknownName { offset: usize, name: String },
	#[error("offset {offset}: trailing input after the tree")]
	TrailingInput { offset: usize },
	#[error("{operator} node has a wrong shape: {reason}")]
	BadArity { operator: Operator, reason: &'static str },
	#[error("name id {0} is not in the name table")]
	DanglingName(usize),
	#[error("{what} has no source form {place}")]
	Misplaced { what: String, place: &'static str },
}
