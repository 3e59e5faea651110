//! Singleton scopes
//!
//! A [`Scope`] caches the instances of every singleton binding attached to it.
//! Each key owns a once-cell, so concurrent first resolutions of the same binding
//! construct it exactly once while different keys populate independently.
//! Populates hold the scope gate shared; [`Scope::close`] holds it exclusively,
//! so closing waits for in-flight constructions instead of clearing them.

use crate::binding::{CloseHook, ErasedValue};
use crate::error::DiResult;
use crate::key::BindingKey;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Close-notification capability.
///
/// Instances cached in a scope are notified when the scope closes, provided
/// their binding was declared with `notify_on_close()`. Implementing the trait
/// alone registers nothing: a binding declared without `notify_on_close()` is
/// released silently.
///
/// # Examples
///
/// ```
/// use bindery_di::ScopeClose;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Connection {
///     open: AtomicBool,
/// }
///
/// impl ScopeClose for Connection {
///     fn notify_close(&self) {
///         self.open.store(false, Ordering::SeqCst);
///     }
/// }
/// ```
pub trait ScopeClose: Send + Sync + 'static {
	fn notify_close(&self);
}

/// Cache slot of one declared binding.
///
/// Several containers may share a scope and declare equal keys, so the slot is
/// identified by the owning container and the entry's declaration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SlotId {
	pub(crate) owner: u64,
	pub(crate) entry: usize,
}

struct CachedInstance {
	key: BindingKey,
	value: ErasedValue,
	on_close: Option<CloseHook>,
}

/// Lifetime boundary caching singleton instances.
///
/// A scope stays usable after [`close`](Scope::close): the next resolution of a
/// singleton bound to it constructs a fresh instance.
///
/// # Examples
///
/// ```
/// use bindery_di::{Binding, Container, Scope};
/// use std::sync::Arc;
///
/// let session = Arc::new(Scope::named("session"));
/// let container = Container::builder()
///     .bind(Binding::provider(|_| Ok(String::from("token"))).scoped(&session))
///     .build();
///
/// let first = container.instance::<String>().unwrap();
/// let second = container.instance::<String>().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
///
/// session.close();
/// let third = container.instance::<String>().unwrap();
/// assert!(!Arc::ptr_eq(&first, &third));
/// ```
pub struct Scope {
	name: String,
	gate: RwLock<()>,
	slots: Mutex<HashMap<SlotId, Arc<OnceCell<ErasedValue>>>>,
	/// Constructed instances in creation order
	created: Mutex<Vec<CachedInstance>>,
	closed: AtomicBool,
}

impl Scope {
	/// Creates an empty, open scope.
	pub fn new() -> Self {
		Self::named("scope")
	}

	/// Creates an empty scope with a name used in log output.
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			gate: RwLock::new(()),
			slots: Mutex::new(HashMap::new()),
			created: Mutex::new(Vec::new()),
			closed: AtomicBool::new(false),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Number of cached instances.
	pub fn len(&self) -> usize {
		self.created.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Whether the scope was closed and nothing has been cached since.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Whether an instance is cached for a binding declared with `key`.
	pub fn contains(&self, key: &BindingKey) -> bool {
		self.created.lock().iter().any(|instance| &instance.key == key)
	}

	/// Returns the instance cached in slot `id`, constructing it with `create` on a miss.
	///
	/// Concurrent callers for the same slot block until the first construction
	/// finishes and then share its result. A failed construction caches nothing.
	pub(crate) fn get_or_create<F>(
		&self,
		id: SlotId,
		key: &BindingKey,
		on_close: Option<&CloseHook>,
		create: F,
	) -> DiResult<ErasedValue>
	where
		F: FnOnce() -> DiResult<ErasedValue>,
	{
		// Recursive read: a producer may populate another key of this scope
		// while a close is already waiting for the gate.
		let _gate = self.gate.read_recursive();

		let slot = {
			let mut slots = self.slots.lock();
			slots.entry(id).or_default().clone()
		};

		if let Some(value) = slot.get() {
			tracing::trace!(scope = %self.name, key = %key, "singleton cache hit");
			return Ok(value.clone());
		}

		let mut constructed = false;
		let value = slot
			.get_or_try_init(|| {
				constructed = true;
				create()
			})?
			.clone();

		if constructed {
			tracing::debug!(scope = %self.name, key = %key, "singleton created");
			self.created.lock().push(CachedInstance {
				key: key.clone(),
				value: value.clone(),
				on_close: on_close.cloned(),
			});
			self.closed.store(false, Ordering::SeqCst);
		}

		Ok(value)
	}

	/// Closes the scope.
	///
	/// Waits for in-flight constructions, then empties the cache and notifies
	/// every released instance carrying a close hook once, in creation order.
	/// Hooks run after the gate is released, so a hook may resolve from this
	/// scope again. Must not be called from a producer running in this scope.
	pub fn close(&self) {
		let cached = {
			let _gate = self.gate.write();
			self.slots.lock().clear();
			self.closed.store(true, Ordering::SeqCst);
			std::mem::take(&mut *self.created.lock())
		};

		let mut notified = 0usize;
		for instance in &cached {
			if let Some(on_close) = &instance.on_close {
				tracing::trace!(scope = %self.name, key = %instance.key, "notifying close");
				on_close(&instance.value);
				notified += 1;
			}
		}

		tracing::debug!(
			scope = %self.name,
			released = cached.len(),
			notified,
			"scope closed"
		);
	}
}

impl Default for Scope {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Scope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Scope")
			.field("name", &self.name)
			.field("len", &self.len())
			.field("closed", &self.is_closed())
			.finish()
	}
}
