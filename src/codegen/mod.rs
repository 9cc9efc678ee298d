//! Lowers the tree into text for the stack machine.
//!
//! The walk threads two counters through the whole program: a label id that
//! makes every jump target unique and a slot id for variable storage. Both
//! only ever grow. Each function gets its own slot table, filled with its
//! parameters and then with every variable at its first store.
//!
//! Calls save the caller's slots on the stack, push the arguments so that the
//! first one ends on top, and restore the slots in reverse order once the
//! return value is parked in `rax`:
//!
//! ```text
//! push [0]
//! push 2
//! push 1
//! call add:
//! pop rax
//! pop [0]
//! push rax
//! ```
mod emitter;

use emitter::Emitter;
use tracing::{debug, error};

use crate::{CodegenError, symbols::{Name, NameTable, Symbols}, tree::{Node, Operator, Tree}};

/// Backend settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CodegenOptions {
	/// Spaces per nesting level.
	pub indent:   usize,
	/// Emit `@` comments and separator lines around control flow and calls.
	pub annotate: bool,
}

impl Default for CodegenOptions {
	fn default() -> Self { Self { indent: 4, annotate: false } }
}

/// Generate assembly for a whole program.
///
/// Slots handed out are written back into the local tables of `symbols`.
pub fn generate(tree: &Tree, symbols: &mut Symbols, options: &CodegenOptions) -> Result<String, CodegenError> {
	let mut codegen = Codegen::new(symbols, options);
	match codegen.program(tree) {
		Ok(()) => {
			debug!(lines = codegen.emitter.lines(), labels = codegen.next_label, slots = codegen.next_slot, "generated");
			Ok(codegen.emitter.finish())
		}
		Err(e) => {
			error!("Codegen error: {e}");
			Err(e)
		}
	}
}

struct Codegen<'s> {
	symbols:    &'s mut Symbols,
	emitter:    Emitter,
	next_label: usize,
	next_slot:  usize,
	/// Function being emitted: its name and its index among the globals.
	function:   Option<(String, Option<usize>)>,
	/// Slots of the function being emitted, in order of first store.
	slots:      NameTable,
}

impl<'s> Codegen<'s> {
	fn new(symbols: &'s mut Symbols, options: &CodegenOptions) -> Self {
		Self {
			symbols,
			emitter: Emitter::new(options.indent, options.annotate),
			next_label: 0,
			next_slot: 0,
			function: None,
			slots: NameTable::new(),
		}
	}

	fn program(&mut self, tree: &Tree) -> Result<(), CodegenError> {
		self.emitter.line("call main:");
		self.emitter.line("hlt");
		self.emitter.blank();
		match &tree.root {
			Some(root) => self.node(root),
			None => Ok(()),
		}
	}

	fn node(&mut self, node: &Node) -> Result<(), CodegenError> {
		let (operator, left, right) = match node {
			Node::Literal(value) => {
				self.emitter.line(format_args!("push {value}"));
				return Ok(());
			}
			Node::Name { id, .. } => {
				let slot = self.load(*id)?;
				self.emitter.line(format_args!("push [{slot}]"));
				return Ok(());
			}
			Node::StringLiteral(_) => return Err(CodegenError::Malformed("a string literal outside of print")),
			Node::Operation { operator, left, right } => (*operator, left.as_deref(), right.as_deref()),
		};

		use Operator::*;
		match operator {
			Add | Sub | Mul | Div => {
				self.children(left, right)?;
				self.emitter.line(instruction(operator));
			}
			Sqrt | Sin | Cos | Tan | Cot => {
				self.children(left, right)?;
				self.emitter.line(instruction(operator));
			}
			UnarySub => {
				self.emitter.line("push 0");
				self.children(left, right)?;
				self.emitter.line("sub");
			}
			Pow => return Err(CodegenError::Unsupported(Pow)),
			Less | Greater | LessEq | GreaterEq | Eq | NotEq => {
				self.children(left, right)?;
				self.comparison(operator);
			}
			And => self.and(left, right)?,
			Or => self.or(left, right)?,
			Assign => self.assign(left, right)?,
			If => self.if_statement(left, right)?,
			While => self.while_statement(left, right)?,
			Print => self.print(left)?,
			Read => self.emitter.line("in"),
			Return => {
				self.children(left, right)?;
				self.emitter.line("ret");
			}
			Func => self.function(left, right)?,
			FuncCall => self.call(left, right)?,
			// Arguments were chained left to right; emitting the right child
			// first leaves the first argument on top.
			Comma => self.children(right, left)?,
			NewFunc => {
				self.optional(left)?;
				self.emitter.blank();
				self.optional(right)?;
			}
			Type => self.optional(right)?,
			TypeInt => {}
			LineEnd | FuncBody => self.children(left, right)?,
		}
		Ok(())
	}

	fn children(&mut self, first: Option<&Node>, second: Option<&Node>) -> Result<(), CodegenError> {
		self.optional(first)?;
		self.optional(second)
	}

	fn optional(&mut self, node: Option<&Node>) -> Result<(), CodegenError> {
		match node {
			Some(node) => self.node(node),
			None => Ok(()),
		}
	}

	fn label(&mut self) -> usize {
		self.next_label += 1;
		self.next_label - 1
	}

	/// Turn the value on top of the stack into 1 if it is not 0.
	fn normalize(&mut self, zero: &str, end: &str) {
		self.emitter.line("push 0");
		self.emitter.line(format_args!("je {zero}:"));
		self.emitter.line("push 1");
		self.emitter.line(format_args!("jmp {end}:"));
		self.emitter.line(format_args!("{zero}:"));
		self.emitter.line("push 0");
		self.emitter.line(format_args!("{end}:"));
	}

	fn comparison(&mut self, operator: Operator) {
		let (jump, name) = match operator {
			Operator::Less => ("jb", "LESS"),
			Operator::LessEq => ("jbe", "LESS_EQ"),
			Operator::Greater => ("ja", "GREATER"),
			Operator::GreaterEq => ("jae", "GREATER_EQ"),
			Operator::NotEq => ("jne", "NOT_EQ"),
			_ => ("je", "EQ"),
		};
		let id = self.label();
		self.emitter.line(format_args!("{jump} {name}_{id}:"));
		self.emitter.line("push 0");
		self.emitter.line(format_args!("jmp AFTER_{name}_{id}:"));
		self.emitter.line(format_args!("{name}_{id}:"));
		self.emitter.line("push 1");
		self.emitter.line(format_args!("AFTER_{name}_{id}:"));
		self.emitter.gap();
	}

	/// Both operands always run; their product decides.
	fn and(&mut self, left: Option<&Node>, right: Option<&Node>) -> Result<(), CodegenError> {
		self.children(left, right)?;
		self.emitter.line("mul");
		let id = self.label();
		self.normalize(&format!("AND_FALSE_{id}"), &format!("AND_END_{id}"));
		self.emitter.gap();
		Ok(())
	}

	fn or(&mut self, left: Option<&Node>, right: Option<&Node>) -> Result<(), CodegenError> {
		let id = self.label();
		self.optional(left)?;
		self.normalize(&format!("OR_FIRST_VAL_SET_ZERO_{id}"), &format!("OR_FIRST_VAL_END_{id}"));
		self.optional(right)?;
		self.normalize(&format!("OR_SECOND_VAL_SET_ZERO_{id}"), &format!("OR_SECOND_VAL_END_{id}"));
		self.emitter.line("add");
		self.normalize(&format!("OR_FALSE_{id}"), &format!("OR_END_{id}"));
		self.emitter.gap();
		Ok(())
	}

	fn if_statement(&mut self, condition: Option<&Node>, body: Option<&Node>) -> Result<(), CodegenError> {
		self.emitter.gap();
		self.emitter.comment("if condition:");
		self.optional(condition)?;
		let id = self.label();
		self.emitter.line("push 0");
		self.emitter.line(format_args!("je END_IF_{id}:"));
		self.emitter.comment("if code block:");
		self.nested(body)?;
		self.emitter.line(format_args!("END_IF_{id}:"));
		self.emitter.gap();
		Ok(())
	}

	fn while_statement(&mut self, condition: Option<&Node>, body: Option<&Node>) -> Result<(), CodegenError> {
		self.emitter.gap();
		let id = self.label();
		self.emitter.line(format_args!("WHILE_{id}:"));
		self.emitter.comment("while condition:");
		self.optional(condition)?;
		self.emitter.line("push 0");
		self.emitter.line(format_args!("je END_WHILE_{id}:"));
		self.emitter.comment("while code block:");
		self.nested(body)?;
		self.emitter.line(format_args!("jmp WHILE_{id}:"));
		self.emitter.line(format_args!("END_WHILE_{id}:"));
		self.emitter.gap();
		Ok(())
	}

	fn nested(&mut self, node: Option<&Node>) -> Result<(), CodegenError> {
		self.emitter.depth += 1;
		let result = self.optional(node);
		self.emitter.depth -= 1;
		result
	}

	fn assign(&mut self, target: Option<&Node>, value: Option<&Node>) -> Result<(), CodegenError> {
		self.optional(value)?;
		let Some(Node::Name { id, .. }) = target else {
			return Err(CodegenError::Malformed("assignment to something other than a name"));
		};
		let slot = self.store(*id)?;
		self.emitter.line(format_args!("pop [{slot}]"));
		Ok(())
	}

	fn print(&mut self, value: Option<&Node>) -> Result<(), CodegenError> {
		if let Some(Node::StringLiteral(id)) = value {
			let text = self.spelling(*id)?.to_string();
			let inner = text.strip_prefix('"').and_then(|text| text.strip_suffix('"')).unwrap_or(&text);
			for code in inner.chars().map(u32::from).chain([10]) {
				self.emitter.line(format_args!("push {code}"));
				self.emitter.line("outc");
				self.emitter.line("pop");
			}
			return Ok(());
		}
		self.optional(value)?;
		self.emitter.line("out");
		self.emitter.line("pop");
		Ok(())
	}

	fn function(&mut self, name: Option<&Node>, body: Option<&Node>) -> Result<(), CodegenError> {
		let Some(Node::Name { id, .. }) = name else {
			return Err(CodegenError::Malformed("a function without a name"));
		};
		let name = self.spelling(*id)?.to_string();
		let scope = self.symbols.function_scope(&name);
		self.function = Some((name.clone(), scope));
		self.slots = NameTable::new();
		debug!(function = %name, "emitting function");

		let previous = self.emitter.depth;
		self.emitter.line(format_args!("{name}:"));
		self.emitter.depth += 1;

		let (params, code) = match body {
			Some(body @ Node::Operation { operator: Operator::FuncBody, .. }) => (body.left(), body.right()),
			other => (None, other),
		};
		let mut declared = Vec::new();
		collect_params(params, &mut declared);
		for id in declared {
			let name = self.spelling(id)?.to_string();
			let slot = self.allocate(name);
			self.emitter.line(format_args!("pop [{slot}]"));
		}
		self.optional(code)?;
		self.emitter.line("ret");

		self.emitter.depth = previous;
		self.finish_function();
		Ok(())
	}

	/// Copy the slots of the finished function into its local table.
	fn finish_function(&mut self) {
		let slots = std::mem::take(&mut self.slots);
		let Some((_, Some(scope))) = self.function.take() else {
			return;
		};
		if let Some(local) = self.symbols.local_mut(scope) {
			let mut seen: Vec<String> = Vec::new();
			for entry in local.iter_mut() {
				// The n-th declaration of a spelling takes its n-th slot when there is one.
				let repeat = seen.iter().filter(|name| **name == entry.name).count();
				let mut matching = slots.iter().filter(|name| name.name == entry.name);
				let first = matching.next();
				let nth = if repeat == 0 { first } else { matching.nth(repeat - 1) };
				entry.slot = nth.or(first).and_then(|name| name.slot);
				seen.push(entry.name.clone());
			}
		}
	}

	fn call(&mut self, callee: Option<&Node>, arguments: Option<&Node>) -> Result<(), CodegenError> {
		let Some(Node::Name { id, .. }) = callee else {
			return Err(CodegenError::Malformed("a call without a function name"));
		};
		let callee = self.spelling(*id)?.to_string();
		let saved: Vec<usize> = self.slots.iter().filter_map(|name| name.slot).collect();

		self.emitter.comment("pushing func local vars:");
		for slot in &saved {
			self.emitter.line(format_args!("push [{slot}]"));
		}
		self.emitter.comment("pushing func args:");
		self.optional(arguments)?;
		self.emitter.line(format_args!("call {callee}:"));
		self.emitter.comment("saving func return");
		self.emitter.line("pop rax");
		for slot in saved.iter().rev() {
			self.emitter.line(format_args!("pop [{slot}]"));
		}
		self.emitter.line("push rax");
		Ok(())
	}

	/// Slot for a store into `id`, allocated at the first store.
	fn store(&mut self, id: usize) -> Result<usize, CodegenError> {
		let name = self.spelling(id)?.to_string();
		if let Some(slot) = self.slots.find(&name).and_then(|index| self.slots.get(index)).and_then(|n| n.slot) {
			return Ok(slot);
		}
		Ok(self.allocate(name))
	}

	/// A fresh slot under `name`, even if the spelling already has one.
	fn allocate(&mut self, name: String) -> usize {
		let slot = self.next_slot;
		self.next_slot += 1;
		self.slots.push(Name { slot: Some(slot), ..Name::new(name) });
		slot
	}

	/// Slot holding `id` in the current function.
	fn load(&self, id: usize) -> Result<usize, CodegenError> {
		let name = self.spelling(id)?;
		if let Some(slot) = self.slots.find(name).and_then(|index| self.slots.get(index)).and_then(|n| n.slot) {
			return Ok(slot);
		}
		let Some((function, scope)) = &self.function else {
			return Err(CodegenError::Malformed("a name outside of any function"));
		};
		let declared = scope.and_then(|scope| self.symbols.local(scope)).is_some_and(|local| local.find(name).is_some());
		if declared {
			Err(CodegenError::Unassigned { name: name.to_string() })
		} else {
			Err(CodegenError::Unbound { name: name.to_string(), function: function.clone() })
		}
	}

	fn spelling(&self, id: usize) -> Result<&str, CodegenError> {
		self.symbols.spelling(id).ok_or(CodegenError::Malformed("a name id outside of the name table"))
	}
}

/// Declared parameter ids, left to right.
fn collect_params(node: Option<&Node>, out: &mut Vec<usize>) {
	match node {
		Some(Node::Name { id, .. }) => out.push(*id),
		Some(node @ Node::Operation { operator: Operator::Comma | Operator::Type, .. }) => {
			collect_params(node.left(), out);
			collect_params(node.right(), out);
		}
		_ => {}
	}
}

fn instruction(operator: Operator) -> &'static str {
	match operator {
		Operator::Add => "add",
		Operator::Sub => "sub",
		Operator::Mul => "mul",
		Operator::Div => "div",
		Operator::Sqrt => "sqrt",
		Operator::Sin => "sin",
		Operator::Cos => "cos",
		Operator::Tan => "tan",
		_ => "cot",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{parser::Parser, scanner::Scanner};

	fn compile_with(input: &str, options: &CodegenOptions) -> Result<(String, Symbols), CodegenError> {
		let tokens = Scanner::new(input).scan_tokens().unwrap();
		let (tree, mut symbols) = Parser::new(tokens).parse().unwrap();
		let asm = generate(&tree, &mut symbols, options)?;
		Ok((asm, symbols))
	}

	fn compile(input: &str) -> Vec<String> {
		let (asm, _) = compile_with(input, &CodegenOptions::default()).unwrap();
		asm.lines().map(|line| line.trim().to_string()).filter(|line| !line.is_empty()).collect()
	}

	fn count(lines: &[String], prefix: &str) -> usize { lines.iter().filter(|line| line.starts_with(prefix)).count() }

	#[test]
	fn declare_assign_print() {
		let (asm, symbols) = compile_with("575757 main 57 575757 x == 7 57 . x 57 {", &CodegenOptions::default()).unwrap();
		assert_eq!(asm, "call main:\nhlt\n\nmain:\n    push 7\n    pop [0]\n    push [0]\n    out\n    pop\n    ret\n");
		assert_eq!(symbols.local(0).unwrap().get(0).unwrap().slot, Some(0));
	}

	#[test]
	fn arithmetic_follows_tree_order() {
		let lines = compile("575757 main 57 2 - 3 / 4 57 {");
		assert_eq!(lines[3..], ["push 2", "push 3", "push 4", "mul", "add", "ret", "ret"]);
	}

	#[test]
	fn and_normalizes_the_product() {
		let lines = compile("575757 main 57 575757 a == 1 57 575757 b == 0 57 . a and b 57 {");
		let start = lines.iter().position(|line| line == "mul").unwrap();
		assert_eq!(lines[start - 2..start], ["push [0]", "push [1]"]);
		assert_eq!(
			lines[start..start + 8],
			["mul", "push 0", "je AND_FALSE_0:", "push 1", "jmp AND_END_0:", "AND_FALSE_0:", "push 0", "AND_END_0:"]
		);
		let labels: Vec<_> = lines.iter().filter(|line| line.ends_with(':') && !line.contains(' ')).collect();
		assert_eq!(labels, ["main:", "AND_FALSE_0:", "AND_END_0:"]);
	}

	#[test]
	fn or_normalizes_each_side_and_the_sum() {
		let lines = compile("575757 main 57 . 0 or 5 57 {");
		assert_eq!(count(&lines, "je OR_"), 3);
		assert!(lines.contains(&"OR_FIRST_VAL_END_0:".to_string()));
		assert!(lines.contains(&"OR_SECOND_VAL_END_0:".to_string()));
		assert!(lines.contains(&"OR_END_0:".to_string()));
		assert_eq!(count(&lines, "add"), 1);
	}

	#[test]
	fn comparisons_get_fresh_labels() {
		let lines = compile("575757 main 57 . 1 < 2 57 . 1 != 2 57 {");
		assert_eq!(
			lines[3..9],
			["push 1", "push 2", "ja GREATER_0:", "push 0", "jmp AFTER_GREATER_0:", "GREATER_0:"]
		);
		assert!(lines.contains(&"je EQ_1:".to_string()));
		assert!(lines.contains(&"AFTER_EQ_1:".to_string()));
	}

	#[test]
	fn while_jumps_back() {
		let lines = compile("575757 main 57 575757 i == 3 57 57! i 57 i == i + 1 57 . i 57 {");
		assert_eq!(
			lines[5..],
			[
				"WHILE_0:",
				"push [0]",
				"push 0",
				"je END_WHILE_0:",
				"push [0]",
				"push 1",
				"sub",
				"pop [0]",
				"jmp WHILE_0:",
				"END_WHILE_0:",
				"push [0]",
				"out",
				"pop",
				"ret",
			]
		);
	}

	#[test]
	fn if_skips_the_body() {
		let (asm, _) = compile_with("575757 main 57 57? 1 57 . 2 57 0 57 {", &CodegenOptions::default()).unwrap();
		assert!(asm.contains("    push 1\n    push 0\n    je END_IF_0:\n        push 2\n        out\n        pop\n    END_IF_0:\n"));
	}

	#[test]
	fn calls_save_and_restore_locals() {
		let source = "575757 add 575757 a, 575757 b 57 a - b 57 {\n\
		              575757 main 57 575757 x == 1 57 575757 y == 2 57 . add { x, y 57 57 {";
		let lines = compile(source);

		let add = lines.iter().position(|line| line == "add:").unwrap();
		assert_eq!(lines[add + 1..add + 3], ["pop [0]", "pop [1]"]);

		let call = lines.iter().position(|line| line == "call add:").unwrap();
		assert_eq!(lines[call - 4..call], ["push [2]", "push [3]", "push [3]", "push [2]"]);
		assert_eq!(lines[call + 1..call + 5], ["pop rax", "pop [3]", "pop [2]", "push rax"]);
	}

	#[test]
	fn repeated_parameters_get_their_own_slots() {
		let source = "575757 f 575757 a, 575757 a 57 a 57 {\n575757 main 57 . f { 1, 2 57 57 {";
		let (asm, symbols) = compile_with(source, &CodegenOptions::default()).unwrap();
		let lines: Vec<_> = asm.lines().map(str::trim).collect();
		let f = lines.iter().position(|line| *line == "f:").unwrap();
		assert_eq!(lines[f + 1..f + 5], ["pop [0]", "pop [1]", "push [0]", "ret"]);

		let slots: Vec<_> = symbols.local(0).unwrap().iter().map(|name| name.slot).collect();
		assert_eq!(slots, [Some(0), Some(1)]);
	}

	#[test]
	fn print_string_emits_characters() {
		let lines = compile("575757 main 57 . \"hi\" 57 {");
		assert_eq!(
			lines[3..12],
			["push 104", "outc", "pop", "push 105", "outc", "pop", "push 10", "outc", "pop"]
		);
	}

	#[test]
	fn read_and_builtins() {
		let lines = compile("575757 main 57 575757 x == sqrt({) 57 x 57 {");
		assert_eq!(lines[3..7], ["in", "sqrt", "pop [0]", "push [0]"]);
	}

	#[test]
	fn functions_are_separated() {
		let (asm, _) = compile_with("575757 f 57 1 57 {\n575757 main 57 f { 57 57 {", &CodegenOptions::default()).unwrap();
		assert!(asm.starts_with("call main:\nhlt\n\nf:\n    push 1\n    ret\n    ret\n\nmain:\n"));
	}

	#[test]
	fn annotations_and_indent() {
		let options = CodegenOptions { indent: 2, annotate: true };
		let (asm, _) = compile_with("575757 main 57 57? 1 57 . 2 57 0 57 {", &options).unwrap();
		assert!(asm.contains("\n  @ if condition:\n  push 1\n"));
		assert!(asm.contains("  @ if code block:\n    push 2\n"));
	}

	#[test]
	fn pow_is_unsupported() {
		let error = compile_with("575757 main 57 2 ^ 3 57 {", &CodegenOptions::default()).unwrap_err();
		assert_eq!(error, CodegenError::Unsupported(Operator::Pow));
	}

	#[test]
	fn names_must_live_in_the_function() {
		let error = compile_with("575757 f 57 575757 x == 1 57 x 57 {\n575757 main 57 . x 57 {", &CodegenOptions::default())
			.unwrap_err();
		assert_eq!(error, CodegenError::Unbound { name: "x".to_string(), function: "main".to_string() });
	}
}
