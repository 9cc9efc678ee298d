//! Turns raw source text into a flat sequence of tokens.
//!
//! The lexical grammar is small but deliberately twisted:
//!
//! - The number `57` is not a number. Alone it ends a statement or opens a
//!   block, `57?` starts an `if`, `57!` starts a `while`, and `575757` is the
//!   integer type. Any other digit run is an ordinary integer literal, so the
//!   markers are recognised only after the whole digit run is consumed
//!   (`570` and `5757` stay numbers).
//! - Arithmetic glyphs swap meaning pairwise: `+` subtracts, `-` adds, `*`
//!   divides and `/` multiplies. Comparisons are mirrored the same way: `<`
//!   is "greater", `>` is "less", `==` assigns, `=` tests inequality and `!=`
//!   tests equality.
//! - `@` comments to the end of the line, `.` prints, `{` closes blocks,
//!   opens calls and reads input.
//!
//! Scanning is `maximal munch` and fail-fast: the first lexical error aborts.
mod token;

use std::{iter::Peekable, str::CharIndices};

use TokenType::*;
use anyhow::Context;
pub use token::*;
use tracing::{debug, error};

use crate::{CompileError, ScanError, ScanErrorType, error::scanner::ScannerError};

/// A scanner for 57 source code
pub struct Scanner<'a> {
	/// User input source code
	source:      &'a str,
	/// User input source code iterator
	source_iter: Peekable<CharIndices<'a>>,
	/// Points at the beginning of the current lexeme
	start:       usize,
	/// Points at the character currently being considered
	cursor:      usize,
	/// Tracks what source line `cursor` is on so we can produce tokens that
	/// know their location.
	line:        usize,
	/// Byte offset where `line` begins
	line_start:  usize,
}

impl<'a> Scanner<'a> {
	pub fn new(source: &'a str) -> Self {
		let source_iter = source.char_indices().peekable();

		Self { source, source_iter, start: 0, cursor: 0, line: 1, line_start: 0 }
	}

	/// Scan all tokens from the source code
	pub fn scan_tokens(&mut self) -> Result<Vec<Token<'a>>, CompileError> {
		let mut tokens = Vec::new();
		while let Some(&(index, _)) = self.source_iter.peek() {
			// We are at the beginning of the next lexeme.
			self.start = index;
			self.cursor = self.start;
			if let Err(e) = self.scan_token(&mut tokens) {
				if let ScannerError::ScanError(e) = &e {
					error!("Scan error: {e}");
				}
				return Err(e.into());
			}
		}
		tokens.push(Token::new(Eof, "", self.line, self.column(self.source.len())));
		debug!(count = tokens.len(), "scanned tokens");
		Ok(tokens)
	}

	/// Scan a single token from the source code
	fn scan_token(&mut self, tokens: &mut Vec<Token<'a>>) -> Result<(), ScannerError> {
		let (line, column) = (self.line, self.column(self.start));
		let next_char = self.advance().context("Unexpected EOF")?;
		#[rustfmt::skip]
		let r#type = match next_char {
			'(' => LeftParen,
			')' => RightParen,
			'{' => Brace,
			',' => Comma,
			'.' => Print,
			'^' => Pow,
			'+' => Sub,
			'-' => Add,
			'*' => Div,
			'/' => Mul,
			'=' => if self.match_next('=') { Assign } else { NotEq },
			'<' => if self.match_next('=') { GreaterEq } else { Greater },
			'>' => if self.match_next('=') { LessEq } else { Less },
			'!' => if self.match_next('=') { Eq } else {
				return Err(ScanError::new(line, column, ScanErrorType::MalformedMarker('!')).into());
			},
			'@' => {
				while self.peek().is_some_and(|c| c != '\n') { self.advance(); }
				Comment
			}
			' ' | '\r' | '\t' => EmptyChar,
			'\n' => { self.new_line(); NewLine }
			'"' => self.string(line, column)?,
			c if c.is_ascii_digit() => self.number(line, column)?,
			c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
			_ => return Err(ScanError::new(line, column, ScanErrorType::UnexpectedCharacter(next_char)).into()),
		};

		if !r#type.is_ignored() {
			let lexeme = &self.source[self.start..self.cursor];
			tokens.push(Token::new(r#type, lexeme, line, column));
		}

		Ok(())
	}

	/// Match the next character if it is the expected one
	fn match_next(&mut self, expected: char) -> bool {
		matches!(self.peek(), Some(c) if c == expected && { self.advance(); true })
	}

	/// Advance to the next character
	fn advance(&mut self) -> Option<char> {
		let (i, c) = self.source_iter.next()?;
		self.cursor = i + c.len_utf8();
		Some(c)
	}

	/// Peek the current character
	fn peek(&mut self) -> Option<char> { self.source_iter.peek().map(|&(_, c)| c) }

	fn new_line(&mut self) {
		self.line += 1;
		self.line_start = self.cursor;
	}

	/// 1-based byte column of `offset` inside the current line
	fn column(&self, offset: usize) -> usize { offset - self.line_start + 1 }

	/// Scan a string literal, both quotes are kept in the lexeme
	fn string(&mut self, line: usize, column: usize) -> Result<TokenType<'a>, ScannerError> {
		while let Some(c) = self.peek() {
			if c == '"' {
				break;
			}
			self.advance();
			if c == '\n' {
				self.new_line();
			}
		}

		self.peek().ok_or_else(|| ScanError::new(line, column, ScanErrorType::UnterminatedString))?;
		self.advance(); // The closing "
		Ok(StringLiteral(&self.source[self.start..self.cursor]))
	}

	/// Scan a digit run, which is either an integer or one of the `57` markers
	fn number(&mut self, line: usize, column: usize) -> Result<TokenType<'a>, ScannerError> {
		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.advance();
		}

		let text = &self.source[self.start..self.cursor];
		match text {
			"575757" => return Ok(Type),
			"57" => {
				return Ok(if self.match_next('?') {
					If
				} else if self.match_next('!') {
					While
				} else {
					FiftySeven
				});
			}
			_ => {}
		}

		text.parse()
			.map(Number)
			.map_err(|_| ScanError::new(line, column, ScanErrorType::InvalidNumber(text.to_string())).into())
	}

	/// Scan an identifier or keyword
	fn identifier(&mut self) -> TokenType<'a> {
		while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
			self.advance();
		}
		let text = &self.source[self.start..self.cursor];
		TokenType::keyword_or_identifier(text)
	}
}
