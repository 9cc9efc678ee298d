//! Name tables shared by the parser, the interchange reader and the backend.
//!
//! Two facilities live side by side and are kept separate on purpose:
//!
//! - `all` is one flat, append-only table. Every declaration appends to it and
//!   every AST name node stores an index into it. Lookup of a used name walks
//!   it front to back and takes the first entry with the same spelling, no
//!   matter which function declared it.
//! - `globals` holds one entry per function, each owning the local table of
//!   that function's parameters and variables in declaration order. The
//!   backend iterates it to assign memory slots and to save and restore live
//!   locals around calls.

/// Index into [`Symbols::all`].
pub type NameId = usize;

/// One table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
	pub name:  String,
	/// Only function entries of the global table own one.
	pub local: Option<NameTable>,
	/// Memory slot, assigned during code generation.
	pub slot:  Option<usize>,
}

impl Name {
	pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), local: None, slot: None } }

	pub fn function(name: impl Into<String>) -> Self {
		Self { name: name.into(), local: Some(NameTable::new()), slot: None }
	}
}

/// Append-only table of names.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NameTable {
	names: Vec<Name>,
}

impl NameTable {
	pub fn new() -> Self { Self { names: Vec::new() } }

	/// Append an entry, returning its index.
	pub fn push(&mut self, name: Name) -> usize {
		self.names.push(name);
		self.names.len() - 1
	}

	/// Index of the first entry spelled `name`.
	pub fn find(&self, name: &str) -> Option<usize> { self.names.iter().position(|entry| entry.name == name) }

	pub fn get(&self, index: usize) -> Option<&Name> { self.names.get(index) }

	pub fn get_mut(&mut self, index: usize) -> Option<&mut Name> { self.names.get_mut(index) }

	pub fn len(&self) -> usize { self.names.len() }

	pub fn is_empty(&self) -> bool { self.names.is_empty() }

	pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Name> { self.names.iter() }

	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Name> { self.names.iter_mut() }
}

/// The flat lookup table plus the per-function grouping.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Symbols {
	pub all:     NameTable,
	pub globals: NameTable,
}

impl Symbols {
	pub fn new() -> Self { Self::default() }

	/// Declare a function and open its local table.
	///
	/// Returns the flat id of the name and the index of the function inside
	/// `globals`, which later declarations use as their scope.
	pub fn declare_function(&mut self, name: &str) -> (NameId, usize) {
		let id = self.all.push(Name::new(name));
		let scope = self.globals.push(Name::function(name));
		(id, scope)
	}

	/// Declare a parameter or a variable. A reused spelling still gets a fresh
	/// entry; nothing checks for redeclaration.
	pub fn declare(&mut self, name: &str, scope: Option<usize>) -> NameId {
		let id = self.all.push(Name::new(name));
		match scope.and_then(|scope| self.globals.get_mut(scope)).and_then(|function| function.local.as_mut()) {
			Some(local) => local.push(Name::new(name)),
			None => self.globals.push(Name::new(name)),
		};
		id
	}

	/// Record a string literal, quotes included.
	pub fn intern_string(&mut self, text: &str) -> NameId { self.all.push(Name::new(text)) }

	/// Flat lookup: the first entry spelled `name`, whoever declared it.
	pub fn lookup(&self, name: &str) -> Option<NameId> { self.all.find(name) }

	pub fn spelling(&self, id: NameId) -> Option<&str> { self.all.get(id).map(|entry| entry.name.as_str()) }

	/// Index inside `globals` of the function spelled `name`.
	pub fn function_scope(&self, name: &str) -> Option<usize> {
		self.globals.iter().position(|entry| entry.name == name && entry.local.is_some())
	}

	pub fn local(&self, scope: usize) -> Option<&NameTable> { self.globals.get(scope)?.local.as_ref() }

	pub fn local_mut(&mut self, scope: usize) -> Option<&mut NameTable> { self.globals.get_mut(scope)?.local.as_mut() }
}
