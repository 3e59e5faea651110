//! Thread-local circular dependency detection
//!
//! Resolution is synchronous: a producer resolving its own dependencies re-enters
//! the resolver on the same call stack. The keys currently under construction are
//! therefore tracked per thread, and a [`ResolutionGuard`] pops its key when the
//! producer returns, whether it succeeded or not.
//!
//! Providers and factories invoked later, outside the producer that created them,
//! start from whatever is on the stack at call time, so a finished binding never
//! shows up as a false cycle.

use crate::key::BindingKey;
use std::cell::RefCell;
use std::collections::HashSet;

/// Default bound on nested resolutions
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 100;

struct CycleDetectionState {
	/// Keys currently being resolved
	resolution_set: HashSet<BindingKey>,
	/// Resolution path, outermost first
	resolution_path: Vec<BindingKey>,
}

impl CycleDetectionState {
	fn new() -> Self {
		Self {
			resolution_set: HashSet::new(),
			resolution_path: Vec::new(),
		}
	}
}

thread_local! {
	static CYCLE_STATE: RefCell<CycleDetectionState> = RefCell::new(CycleDetectionState::new());
}

/// Record the start of resolution for `key`.
///
/// Fails when `key` is already being resolved further up the stack, or when the
/// stack is already `max_depth` keys deep.
pub(crate) fn begin_resolution(
	key: &BindingKey,
	max_depth: usize,
) -> Result<ResolutionGuard, CycleError> {
	CYCLE_STATE.with(|state| {
		let mut s = state.borrow_mut();

		if s.resolution_set.contains(key) {
			return Err(CycleError::CircularDependency {
				key: key.to_string(),
				path: build_cycle_path(&s.resolution_path, key),
			});
		}

		let depth = s.resolution_path.len() + 1;
		if depth > max_depth {
			return Err(CycleError::MaxDepthExceeded(depth));
		}

		s.resolution_set.insert(key.clone());
		s.resolution_path.push(key.clone());
		Ok(ResolutionGuard { key: key.clone() })
	})
}

/// Current nesting depth on this thread.
pub fn resolution_depth() -> usize {
	CYCLE_STATE.with(|state| state.borrow().resolution_path.len())
}

/// RAII guard removing its key from the resolution stack on drop
#[derive(Debug)]
pub(crate) struct ResolutionGuard {
	key: BindingKey,
}

impl Drop for ResolutionGuard {
	fn drop(&mut self) {
		let _ = CYCLE_STATE.try_with(|state| {
			let mut s = state.borrow_mut();
			s.resolution_set.remove(&self.key);
			if let Some(pos) = s.resolution_path.iter().rposition(|k| k == &self.key) {
				s.resolution_path.remove(pos);
			}
		});
	}
}

fn build_cycle_path(path: &[BindingKey], current: &BindingKey) -> String {
	match path.iter().position(|k| k == current) {
		Some(start) => {
			let cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
			format!("{} -> {}", cycle.join(" -> "), current)
		}
		None => format!("Unknown cycle involving {}", current),
	}
}

/// Circular dependency error
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
	#[error("Circular dependency detected: {key}\n  Path: {path}")]
	CircularDependency {
		/// Binding that was requested while already under construction
		key: String,
		/// Circular path (format: A -> B -> C -> A)
		path: String,
	},

	#[error(
		"Maximum resolution depth exceeded: {0}\nThis likely indicates an extremely deep dependency chain."
	)]
	MaxDepthExceeded(usize),
}
