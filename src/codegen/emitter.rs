use std::fmt::Display;

/// Line-oriented assembly text with indentation.
pub(super) struct Emitter {
	out:      String,
	indent:   usize,
	annotate: bool,
	pub depth: usize,
	lines:    usize,
}

impl Emitter {
	pub fn new(indent: usize, annotate: bool) -> Self {
		Self { out: String::new(), indent, annotate, depth: 0, lines: 0 }
	}

	/// One instruction or label at the current depth.
	pub fn line(&mut self, text: impl Display) {
		self.out.extend(std::iter::repeat_n(' ', self.indent * self.depth));
		self.out.push_str(&text.to_string());
		self.out.push('\n');
		self.lines += 1;
	}

	/// An `@` comment, emitted only when annotating.
	pub fn comment(&mut self, text: &str) {
		if self.annotate {
			self.line(format_args!("@ {text}"));
		}
	}

	/// A separator line, emitted only when annotating.
	pub fn gap(&mut self) {
		if self.annotate {
			self.out.push('\n');
		}
	}

	/// A separator line emitted unconditionally.
	pub fn blank(&mut self) { self.out.push('\n'); }

	pub fn lines(&self) -> usize { self.lines }

	pub fn finish(self) -> String { self.out }
}
