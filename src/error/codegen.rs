use crate::tree::Operator;

/// Internal consistency failures of the backend.
///
/// The parser only hands over trees it accepted, so each of these points at a
/// defect upstream rather than at the user's program.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CodegenError {
	#[error("'{name}' has no entry in the local table of '{function}'")]
	Unbound { name: String, function: String },
	#[error("'{name}' is read before anything was stored into it")]
	Unassigned { name: String },
	#[error("operator {0} has no stack machine lowering")]
	Unsupported(Operator),
	#[error("malformed tree: {0}")]
	Malformed(&'static str),
}
