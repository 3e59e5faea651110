//! Binding registry
//!
//! Declarations are appended as-is. Duplicates and contradictions are only
//! reported when a request actually hits them, so a binding that is never
//! resolved never fails the container.

use crate::binding::BindingEntry;
use crate::key::{BindingKey, Tag, TypeInfo};
use std::any::TypeId;
use std::collections::HashMap;

/// Outcome of a registry lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
	NoMatch,
	/// Index of the single matching entry
	Unique(usize),
	/// Number of matching entries
	Ambiguous(usize),
}

/// Ordered, immutable collection of binding entries.
#[derive(Default)]
pub(crate) struct Registry {
	entries: Vec<BindingEntry>,
	by_type: HashMap<TypeId, Vec<usize>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn push(&mut self, entry: BindingEntry) {
		let index = self.entries.len();
		self.by_type
			.entry(entry.key.type_info().id())
			.or_default()
			.push(index);
		self.entries.push(entry);
	}

	/// Finds the entries able to serve `ty`/`tag` under the caller's `context`.
	pub(crate) fn find(&self, ty: TypeInfo, tag: Option<&Tag>, context: Option<TypeInfo>) -> Lookup {
		let Some(candidates) = self.by_type.get(&ty.id()) else {
			return Lookup::NoMatch;
		};

		let mut matched = candidates
			.iter()
			.copied()
			.filter(|&index| self.entries[index].matches(ty, tag, context));

		match (matched.next(), matched.count()) {
			(None, _) => Lookup::NoMatch,
			(Some(index), 0) => Lookup::Unique(index),
			(Some(_), rest) => Lookup::Ambiguous(rest + 1),
		}
	}

	pub(crate) fn entry(&self, index: usize) -> &BindingEntry {
		&self.entries[index]
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Declared keys in declaration order, duplicates included.
	pub fn keys(&self) -> impl Iterator<Item = &BindingKey> {
		self.entries.iter().map(BindingEntry::key)
	}
}

impl FromIterator<BindingEntry> for Registry {
	fn from_iter<I: IntoIterator<Item = BindingEntry>>(iter: I) -> Self {
		let mut registry = Registry::new();
		for entry in iter {
			registry.push(entry);
		}
		registry
	}
}
