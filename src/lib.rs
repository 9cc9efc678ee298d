//! # The 57 compiler
//!
//! Source in the 57 language goes through three stages:
//!
//! ## Scanning
//!
//! [`scanner::Scanner`] turns characters into tokens. The lexical grammar is
//! twisted on purpose: `57` and its variants are keywords, `+` subtracts and
//! `-` adds, `==` assigns.
//!
//! ``` text
//! 575757 main 57
//!     575757 x == 7 57
//!     . x 57
//! {
//! ```
//!
//! ## Parsing
//!
//! [`parser::Parser`] builds the [`tree::Tree`] and the [`symbols::Symbols`]
//! name table together. The program above becomes
//!
//! ``` markdown
//! TYPE
//! ├── TYPE_INT
//! └── FUNC
//!     ├── main
//!     └── FUNC_BODY
//!         └── LINE_END
//!             ├── TYPE
//!             │   ├── TYPE_INT
//!             │   └── ASSIGN (x, 7)
//!             └── LINE_END
//!                 └── PRINT (x)
//! ```
//!
//! The tree can be handed to another process in a prefix text form, see
//! [`tree::prefix`], folded by [`simplify::simplify`] and turned back into
//! source by [`unparser::unparse`].
//!
//! ## Code generation
//!
//! [`codegen::generate`] walks the tree and writes assembly for a stack
//! machine:
//!
//! ``` text
//! call main:
//! hlt
//!
//! main:
//!     push 7
//!     pop [0]
//!     push [0]
//!     out
//!     pop
//!     ret
//! ```

pub mod cli;
pub mod codegen;
mod compiler;
mod error;
pub mod parser;
pub mod scanner;
pub mod simplify;
pub mod symbols;
pub mod tree;
pub mod unparser;

pub use compiler::{Compiler, Stage};
pub use error::{
	CompileError,
	codegen::CodegenError,
	parser::{ParseError, ParseErrorType},
	scanner::{ScanError, ScanErrorType},
	tree::TreeError,
};
