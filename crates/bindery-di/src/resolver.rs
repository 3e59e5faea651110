//! Resolution engine
//!
//! A [`Resolver`] pairs the container with the active context. Producers receive
//! the resolver explicitly and resolve their own dependencies through it, so a
//! nested resolution inherits the context of the request that triggered it.
//!
//! Resolution of a request runs in three steps:
//!
//! 1. **Locate**: find the unique entry matching type, tag and caller context,
//!    following context translators when nothing matches directly.
//! 2. **Apply**: check the supplied arguments against the declared slots. Fewer
//!    arguments than the arity yield a partially applied [`Factory`].
//! 3. **Produce**: run the producer under the cycle guard, through the owning
//!    scope's cache for singleton bindings.

use crate::args::{Arg, Args, IntoArgs};
use crate::binding::{BindingEntry, ErasedValue, Producer, ScopeRef};
use crate::container::ContainerInner;
use crate::context::{ContextValue, TranslatorLookup};
use crate::cycle_detection::begin_resolution;
use crate::error::{DiError, DiResult};
use crate::key::{BindingKey, Tag, TypeInfo};
use crate::registry::Lookup;
use crate::scope::SlotId;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Request options: an optional tag and the arguments supplied so far.
///
/// # Examples
///
/// ```
/// use bindery_di::Query;
///
/// let query = Query::tagged("primary").args((8080u16,));
/// assert_eq!(query.supplied(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Query {
	tag: Option<Tag>,
	args: Args,
}

impl Query {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn tagged(tag: impl Into<Tag>) -> Self {
		Self::new().tag(tag)
	}

	pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
		self.tag = Some(tag.into());
		self
	}

	/// Appends arguments after those already supplied.
	pub fn args(mut self, args: impl IntoArgs) -> Self {
		self.args = std::mem::take(&mut self.args).concat(args.into_args());
		self
	}

	/// Number of arguments supplied so far.
	pub fn supplied(&self) -> usize {
		self.args.len()
	}
}

/// Result of applying arguments to a factory binding.
pub enum Applied<T> {
	/// Every slot was filled and the producer ran
	Complete(Arc<T>),
	/// Slots remain; the factory keeps the arguments supplied so far
	Partial(Factory<T>),
}

impl<T> Applied<T> {
	pub fn is_complete(&self) -> bool {
		matches!(self, Applied::Complete(_))
	}

	pub fn into_complete(self) -> Option<Arc<T>> {
		match self {
			Applied::Complete(value) => Some(value),
			Applied::Partial(_) => None,
		}
	}

	pub fn into_partial(self) -> Option<Factory<T>> {
		match self {
			Applied::Complete(_) => None,
			Applied::Partial(factory) => Some(factory),
		}
	}
}

impl<T> fmt::Debug for Applied<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Applied::Complete(_) => f.write_str("Applied::Complete"),
			Applied::Partial(factory) => f.debug_tuple("Applied::Partial").field(factory).finish(),
		}
	}
}

/// Handle to the container under one (possibly absent) context.
#[derive(Clone)]
pub struct Resolver {
	inner: Arc<ContainerInner>,
	context: Option<ContextValue>,
}

impl Resolver {
	pub(crate) fn root(inner: Arc<ContainerInner>) -> Self {
		Self {
			inner,
			context: None,
		}
	}

	pub(crate) fn inner(&self) -> &ContainerInner {
		&self.inner
	}

	/// Resolves the untagged binding for `T`.
	pub fn instance<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
		self.instance_with(Query::new())
	}

	/// Resolves the binding for `T` carrying `tag`.
	pub fn tagged<T: Any + Send + Sync>(&self, tag: impl Into<Tag>) -> DiResult<Arc<T>> {
		self.instance_with(Query::tagged(tag))
	}

	/// Resolves a complete instance of `T`.
	///
	/// Factory bindings need at least as many arguments as their arity; surplus
	/// arguments are dropped with a warning.
	pub fn instance_with<T: Any + Send + Sync>(&self, query: Query) -> DiResult<Arc<T>> {
		let (index, resolver) = self.locate(TypeInfo::of::<T>(), query.tag.as_ref())?;
		let entry = self.inner.registry.entry(index);
		let args = saturate(entry, query.args.as_slice())?;
		resolver.produce(index, args)
	}

	/// Resolves `T`, treating a missing binding for `T` itself as `None`.
	///
	/// Failures of `T`'s own dependencies are still reported.
	pub fn optional_instance<T: Any + Send + Sync>(&self) -> DiResult<Option<Arc<T>>> {
		self.optional_instance_with(Query::new())
	}

	pub fn optional_instance_with<T: Any + Send + Sync>(
		&self,
		query: Query,
	) -> DiResult<Option<Arc<T>>> {
		match self.instance_with::<T>(query) {
			Ok(value) => Ok(Some(value)),
			Err(DiError::NoBinding { key }) if key.type_info() == TypeInfo::of::<T>() => {
				tracing::trace!(key = %key, "optional binding absent");
				Ok(None)
			}
			Err(err) => Err(err),
		}
	}

	/// Returns a provider resolving `T` each time it is called.
	///
	/// The binding is located now; the producer runs on [`Provider::get`].
	pub fn provider<T: Any + Send + Sync>(&self) -> DiResult<Provider<T>> {
		self.provider_with(Query::new())
	}

	/// Like [`provider`](Self::provider), with a tag and an argument prefix.
	pub fn provider_with<T: Any + Send + Sync>(&self, query: Query) -> DiResult<Provider<T>> {
		let (index, resolver) = self.locate(TypeInfo::of::<T>(), query.tag.as_ref())?;
		let entry = self.inner.registry.entry(index);
		let args = saturate(entry, query.args.as_slice())?.to_vec();
		Ok(Provider {
			resolver,
			index,
			args,
			_marker: PhantomData,
		})
	}

	/// Returns a factory for `T` with no argument applied yet.
	pub fn factory<T: Any + Send + Sync>(&self) -> DiResult<Factory<T>> {
		self.factory_with(Query::new())
	}

	/// Returns a factory for `T` with the query's arguments already applied.
	pub fn factory_with<T: Any + Send + Sync>(&self, query: Query) -> DiResult<Factory<T>> {
		let (index, resolver) = self.locate(TypeInfo::of::<T>(), query.tag.as_ref())?;
		let entry = self.inner.registry.entry(index);
		check_arguments(entry, query.args.as_slice())?;
		Ok(Factory {
			resolver,
			index,
			args: query.args,
			_marker: PhantomData,
		})
	}

	/// Applies the query's arguments to the binding for `T`.
	///
	/// Produces an instance once every slot is filled and a partially applied
	/// factory otherwise.
	///
	/// # Examples
	///
	/// ```
	/// use bindery_di::{Applied, Binding, Container, Query};
	///
	/// let container = Container::builder()
	///     .bind(Binding::factory(|_, (a, b): (i32, i32)| Ok(a * b)))
	///     .build();
	///
	/// let partial = container.apply::<i32>(Query::new().args((6,))).unwrap();
	/// let double = partial.into_partial().unwrap();
	/// assert_eq!(*double.call((7,)).unwrap(), 42);
	/// ```
	pub fn apply<T: Any + Send + Sync>(&self, query: Query) -> DiResult<Applied<T>> {
		self.factory_with::<T>(query)?.apply(())
	}

	/// Whether a request for `T` would find exactly one binding.
	pub fn contains<T: Any>(&self, query: &Query) -> bool {
		self.locate(TypeInfo::of::<T>(), query.tag.as_ref()).is_ok()
	}

	/// Returns the active context if it has type `C`.
	pub fn context<C: Any + Send + Sync>(&self) -> DiResult<Arc<C>> {
		self.context
			.as_ref()
			.and_then(ContextValue::downcast::<C>)
			.ok_or(DiError::MissingContext {
				expected: std::any::type_name::<C>(),
			})
	}

	/// Returns a resolver making requests under `context`.
	pub fn on<C: Any + Send + Sync>(&self, context: C) -> Resolver {
		Self {
			inner: self.inner.clone(),
			context: Some(ContextValue::new(context)),
		}
	}

	pub fn context_type(&self) -> Option<TypeInfo> {
		self.context.as_ref().map(ContextValue::type_info)
	}

	fn requested_key(&self, ty: TypeInfo, tag: Option<&Tag>) -> BindingKey {
		BindingKey::new(ty, tag.cloned(), self.context_type())
	}

	/// Finds the entry for the request, translating the context as needed.
	///
	/// Returns the entry index together with the resolver its producer must run
	/// under.
	fn locate(&self, ty: TypeInfo, tag: Option<&Tag>) -> DiResult<(usize, Resolver)> {
		let registry = &self.inner.registry;
		let max_steps = self.inner.settings.max_translation_depth;
		let mut current = self.clone();
		let mut visited = Vec::new();

		loop {
			match registry.find(ty, tag, current.context_type()) {
				Lookup::Unique(index) => return Ok((index, current)),
				Lookup::Ambiguous(count) => {
					return Err(DiError::MultipleBindings {
						key: current.requested_key(ty, tag),
						count,
					});
				}
				Lookup::NoMatch => {}
			}

			let Some(context) = current.context.clone() else {
				return Err(DiError::NoBinding {
					key: self.requested_key(ty, tag),
				});
			};
			if max_steps == 0 {
				return Err(DiError::NoBinding {
					key: self.requested_key(ty, tag),
				});
			}
			let from = context.type_info();
			visited.push(from);

			let translator = match self.inner.translators.find(from) {
				TranslatorLookup::None => {
					return Err(DiError::NoBinding {
						key: self.requested_key(ty, tag),
					});
				}
				TranslatorLookup::Ambiguous(count) => {
					return Err(DiError::ContextTranslation {
						key: self.requested_key(ty, tag),
						reason: format!("{count} translators are registered from {from}"),
					});
				}
				TranslatorLookup::Unique(translator) => translator,
			};

			if visited.len() > max_steps {
				return Err(DiError::ContextTranslation {
					key: self.requested_key(ty, tag),
					reason: format!("translation chain exceeds {max_steps} steps"),
				});
			}
			if visited.contains(&translator.target()) {
				return Err(DiError::ContextTranslation {
					key: self.requested_key(ty, tag),
					reason: format!("translation from {from} revisits {}", translator.target()),
				});
			}

			let translated =
				translator
					.apply(&context)
					.map_err(|err| DiError::ContextTranslation {
						key: self.requested_key(ty, tag),
						reason: err.to_string(),
					})?;
			tracing::trace!(from = %from, to = %translated.type_info(), "context translated");

			current = Resolver {
				inner: self.inner.clone(),
				context: Some(translated),
			};
		}
	}

	/// Runs the entry's producer, through its scope cache for singletons.
	fn produce_erased(&self, index: usize, args: &[Arg]) -> DiResult<ErasedValue> {
		let entry = self.inner.registry.entry(index);
		let _guard = begin_resolution(&entry.key, self.inner.settings.max_resolution_depth)?;

		let scope = match &entry.scope {
			ScopeRef::Unscoped => return self.invoke(entry, args),
			ScopeRef::Default => &self.inner.default_scope,
			ScopeRef::Explicit(scope) => scope,
		};
		let slot = SlotId {
			owner: self.inner.id,
			entry: index,
		};
		scope.get_or_create(slot, &entry.key, entry.close_hook.as_ref(), || {
			self.invoke(entry, args)
		})
	}

	fn produce<T: Any + Send + Sync>(&self, index: usize, args: &[Arg]) -> DiResult<Arc<T>> {
		let value = self.produce_erased(index, args)?;
		value.downcast::<T>().map_err(|_| {
			let key = self.inner.registry.entry(index).key.clone();
			tracing::warn!(
				key = %key,
				requested = std::any::type_name::<T>(),
				"produced value has an unexpected type"
			);
			DiError::NoBinding { key }
		})
	}

	fn invoke(&self, entry: &BindingEntry, args: &[Arg]) -> DiResult<ErasedValue> {
		let produce = match &entry.producer {
			Producer::Instance(value) => return Ok(value.clone()),
			Producer::Provider(produce) | Producer::Factory(produce) => produce,
		};

		tracing::debug!(key = %entry.key, args = args.len(), "invoking producer");
		produce(self, args).map_err(|source| DiError::DependencyResolution {
			key: entry.key.clone(),
			source: Box::new(source),
		})
	}
}

impl fmt::Debug for Resolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Resolver")
			.field("context", &self.context_type())
			.field("bindings", &self.inner.registry.len())
			.finish()
	}
}

/// Checks every supplied argument against its declared slot type.
fn check_arguments(entry: &BindingEntry, args: &[Arg]) -> DiResult<()> {
	let slots = entry.arg_types.iter().zip(args).enumerate();
	for (position, (expected, arg)) in slots {
		if arg.type_info() != *expected {
			return Err(DiError::ArgumentMismatch {
				key: entry.key.clone(),
				position,
				expected: expected.name(),
				found: arg.type_info().name(),
			});
		}
	}
	Ok(())
}

/// Validates a complete argument list, dropping surplus arguments.
fn saturate<'a>(entry: &BindingEntry, args: &'a [Arg]) -> DiResult<&'a [Arg]> {
	check_arguments(entry, args)?;

	let arity = entry.arity();
	if args.len() < arity {
		return Err(DiError::MissingArguments {
			key: entry.key.clone(),
			expected: arity,
			supplied: args.len(),
		});
	}
	if args.len() > arity {
		tracing::warn!(
			key = %entry.key,
			arity,
			supplied = args.len(),
			"ignoring surplus arguments"
		);
	}
	Ok(&args[..arity])
}

/// Deferred resolution of a located binding.
pub struct Provider<T> {
	resolver: Resolver,
	index: usize,
	args: Vec<Arg>,
	_marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Provider<T> {
	/// Runs the resolution now.
	pub fn get(&self) -> DiResult<Arc<T>> {
		self.resolver.produce(self.index, &self.args)
	}

	pub fn key(&self) -> &BindingKey {
		&self.resolver.inner.registry.entry(self.index).key
	}
}

impl<T> Clone for Provider<T> {
	fn clone(&self) -> Self {
		Self {
			resolver: self.resolver.clone(),
			index: self.index,
			args: self.args.clone(),
			_marker: PhantomData,
		}
	}
}

impl<T> fmt::Debug for Provider<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Provider")
			.field("key", &self.resolver.inner.registry.entry(self.index).key)
			.finish()
	}
}

/// Curried factory: a binding plus the arguments applied so far.
///
/// Arguments fill the declared slots left to right. Applying a factory never
/// changes it; every application returns a new value.
///
/// # Examples
///
/// ```
/// use bindery_di::{Binding, Container};
///
/// let container = Container::builder()
///     .bind(Binding::factory(|_, (a, b, c): (i32, i32, i32)| Ok(a + b + c)))
///     .build();
///
/// let sum = container.factory::<i32>().unwrap();
/// let add_one = sum.apply((1,)).unwrap().into_partial().unwrap();
/// assert_eq!(add_one.remaining(), 2);
/// assert_eq!(*add_one.call((2, 3)).unwrap(), 6);
/// assert_eq!(*sum.call((1, 2, 3)).unwrap(), 6);
/// ```
pub struct Factory<T> {
	resolver: Resolver,
	index: usize,
	args: Args,
	_marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Factory<T> {
	fn entry(&self) -> &BindingEntry {
		self.resolver.inner.registry.entry(self.index)
	}

	pub fn key(&self) -> &BindingKey {
		&self.entry().key
	}

	/// Total number of argument slots.
	pub fn arity(&self) -> usize {
		self.entry().arity()
	}

	/// Slots still unfilled.
	pub fn remaining(&self) -> usize {
		self.arity().saturating_sub(self.args.len())
	}

	/// Applies `args` after those already captured.
	pub fn apply(&self, args: impl IntoArgs) -> DiResult<Applied<T>> {
		let args = self.args.clone().concat(args.into_args());
		let entry = self.entry();
		check_arguments(entry, args.as_slice())?;

		if args.len() < entry.arity() {
			tracing::trace!(
				key = %entry.key,
				remaining = entry.arity() - args.len(),
				"partial application"
			);
			return Ok(Applied::Partial(Factory {
				resolver: self.resolver.clone(),
				index: self.index,
				args,
				_marker: PhantomData,
			}));
		}

		let complete = saturate(entry, args.as_slice())?;
		self.resolver.produce(self.index, complete).map(Applied::Complete)
	}

	/// Applies `args` and requires the result to be complete.
	pub fn call(&self, args: impl IntoArgs) -> DiResult<Arc<T>> {
		match self.apply(args)? {
			Applied::Complete(value) => Ok(value),
			Applied::Partial(partial) => Err(DiError::MissingArguments {
				key: partial.key().clone(),
				expected: partial.arity(),
				supplied: partial.args.len(),
			}),
		}
	}
}

impl<T> Clone for Factory<T> {
	fn clone(&self) -> Self {
		Self {
			resolver: self.resolver.clone(),
			index: self.index,
			args: self.args.clone(),
			_marker: PhantomData,
		}
	}
}

impl<T> fmt::Debug for Factory<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Factory")
			.field("key", &self.resolver.inner.registry.entry(self.index).key)
			.field("applied", &self.args.len())
			.finish()
	}
}
