//! Resolution errors

use crate::cycle_detection::CycleError;
use crate::key::BindingKey;

pub type DiResult<T> = Result<T, DiError>;

/// Failure raised while resolving a binding.
///
/// Every variant is produced at resolution time; building a container never fails.
#[derive(Debug, thiserror::Error)]
pub enum DiError {
	/// No binding matches the request, even after context translation
	#[error("No binding found for {key}")]
	NoBinding { key: BindingKey },

	/// More than one binding matches the request
	#[error("{count} bindings match {key}; a request must match exactly one binding")]
	MultipleBindings { key: BindingKey, count: usize },

	/// The context translator chain could not produce a usable context
	#[error("Context translation failed for {key}: {reason}")]
	ContextTranslation { key: BindingKey, reason: String },

	/// A producer failed, either on its own or because one of its dependencies did
	#[error("Failed to resolve {key}")]
	DependencyResolution {
		key: BindingKey,
		#[source]
		source: Box<DiError>,
	},

	#[error(transparent)]
	Cycle(#[from] CycleError),

	/// A supplied factory argument does not have the declared slot type
	#[error("Argument {position} of {key} expects {expected}, got {found}")]
	ArgumentMismatch {
		key: BindingKey,
		position: usize,
		expected: &'static str,
		found: &'static str,
	},

	/// A complete instance was requested with fewer arguments than the factory arity
	#[error("{key} takes {expected} argument(s) but {supplied} were supplied")]
	MissingArguments {
		key: BindingKey,
		expected: usize,
		supplied: usize,
	},

	/// A producer asked for a context that is not active
	#[error("No context of type {expected} is active")]
	MissingContext { expected: &'static str },

	/// Error raised by user code inside a producer or translator
	#[error("{0}")]
	Producer(Box<dyn std::error::Error + Send + Sync>),
}

impl DiError {
	/// Wraps an arbitrary error raised by a producer.
	///
	/// # Examples
	///
	/// ```
	/// use bindery_di::DiError;
	///
	/// let err = DiError::producer("connection refused");
	/// assert_eq!(err.to_string(), "connection refused");
	/// ```
	pub fn producer(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
		Self::Producer(err.into())
	}

	/// Follows `DependencyResolution` chains down to the failure that started them.
	pub fn root_cause(&self) -> &DiError {
		let mut current = self;
		while let DiError::DependencyResolution { source, .. } = current {
			current = &**source;
		}
		current
	}

	/// Keys of the bindings whose producers failed, outermost first.
	pub fn resolution_chain(&self) -> Vec<&BindingKey> {
		let mut chain = Vec::new();
		let mut current = self;
		while let DiError::DependencyResolution { key, source } = current {
			chain.push(key);
			current = &**source;
		}
		chain
	}

	pub fn is_no_binding(&self) -> bool {
		matches!(self, DiError::NoBinding { .. })
	}

	pub fn is_multiple_bindings(&self) -> bool {
		matches!(self, DiError::MultipleBindings { .. })
	}

	pub fn is_context_translation(&self) -> bool {
		matches!(self, DiError::ContextTranslation { .. })
	}

	pub fn is_dependency_resolution(&self) -> bool {
		matches!(self, DiError::DependencyResolution { .. })
	}
}
