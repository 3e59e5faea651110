//! Binding declarations
//!
//! A [`Binding`] is the typed declaration handed to
//! [`ContainerBuilder::bind`](crate::ContainerBuilder::bind). It erases into a
//! [`BindingEntry`] holding the key, the declared argument slots and the producer.

use crate::args::{Arg, FactoryArgs};
use crate::error::{DiError, DiResult};
use crate::key::{BindingKey, Tag, TypeInfo};
use crate::resolver::Resolver;
use crate::scope::{Scope, ScopeClose};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;
pub(crate) type ProducerFn =
	Arc<dyn Fn(&Resolver, &[Arg]) -> DiResult<ErasedValue> + Send + Sync>;
pub(crate) type CloseHook = Arc<dyn Fn(&ErasedValue) + Send + Sync>;

/// How a binding produces its value
#[derive(Clone)]
pub(crate) enum Producer {
	Instance(ErasedValue),
	Provider(ProducerFn),
	Factory(ProducerFn),
}

impl Producer {
	fn kind(&self) -> &'static str {
		match self {
			Producer::Instance(_) => "instance",
			Producer::Provider(_) => "provider",
			Producer::Factory(_) => "factory",
		}
	}
}

/// Where a singleton binding caches its instance
#[derive(Clone, Default)]
pub(crate) enum ScopeRef {
	#[default]
	Unscoped,
	/// The container's default scope
	Default,
	Explicit(Arc<Scope>),
}

/// One registered producer, owned by the registry
#[derive(Clone)]
pub struct BindingEntry {
	pub(crate) key: BindingKey,
	pub(crate) arg_types: Vec<TypeInfo>,
	pub(crate) producer: Producer,
	pub(crate) scope: ScopeRef,
	pub(crate) close_hook: Option<CloseHook>,
}

impl BindingEntry {
	pub fn key(&self) -> &BindingKey {
		&self.key
	}

	/// Number of curried argument slots; zero for instances and providers.
	pub fn arity(&self) -> usize {
		self.arg_types.len()
	}

	pub fn is_singleton(&self) -> bool {
		!matches!(self.scope, ScopeRef::Unscoped)
	}

	/// Whether this entry satisfies a request for `ty`/`tag` made under `context`.
	///
	/// Context-free entries match under any context, including none.
	pub(crate) fn matches(&self, ty: TypeInfo, tag: Option<&Tag>, context: Option<TypeInfo>) -> bool {
		self.key.type_info() == ty
			&& self.key.tag() == tag
			&& match self.key.context() {
				None => true,
				Some(required) => Some(required) == context,
			}
	}
}

impl fmt::Debug for BindingEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BindingEntry")
			.field("key", &self.key)
			.field("kind", &self.producer.kind())
			.field("arg_types", &self.arg_types)
			.field("singleton", &self.is_singleton())
			.finish()
	}
}

/// Typed binding declaration for values of `T`.
///
/// # Examples
///
/// ```
/// use bindery_di::{Binding, Container};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// let container = Container::builder()
///     .bind(Binding::instance(String::from("hello")).tagged("greeting"))
///     .bind(Binding::provider(|r| {
///         let greeting = r.tagged::<String>("greeting")?;
///         Ok(Greeter { greeting: greeting.to_string() })
///     }))
///     .build();
///
/// assert_eq!(container.instance::<Greeter>().unwrap().greeting, "hello");
/// ```
pub struct Binding<T> {
	entry: BindingEntry,
	_marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Binding<T> {
	fn from_producer(producer: Producer, arg_types: Vec<TypeInfo>) -> Self {
		Self {
			entry: BindingEntry {
				key: BindingKey::of::<T>(),
				arg_types,
				producer,
				scope: ScopeRef::Unscoped,
				close_hook: None,
			},
			_marker: PhantomData,
		}
	}

	/// Binds a ready-made value. Every resolution returns the same `Arc`.
	pub fn instance(value: T) -> Self {
		Self::from_producer(Producer::Instance(Arc::new(value)), Vec::new())
	}

	/// Binds a producer invoked with the resolver on every resolution.
	pub fn provider<F>(produce: F) -> Self
	where
		F: Fn(&Resolver) -> DiResult<T> + Send + Sync + 'static,
	{
		let producer: ProducerFn = Arc::new(move |resolver: &Resolver, _args: &[Arg]| {
			produce(resolver).map(|value| Arc::new(value) as ErasedValue)
		});
		Self::from_producer(Producer::Provider(producer), Vec::new())
	}

	/// Binds a provider that requires an active context of type `C`.
	pub fn contexted_provider<C, F>(produce: F) -> Self
	where
		C: Any + Send + Sync,
		F: Fn(&Resolver, &C) -> DiResult<T> + Send + Sync + 'static,
	{
		let producer: ProducerFn = Arc::new(move |resolver: &Resolver, _args: &[Arg]| {
			let context = resolver.context::<C>()?;
			produce(resolver, &context).map(|value| Arc::new(value) as ErasedValue)
		});
		Self::from_producer(Producer::Provider(producer), Vec::new()).contexted::<C>()
	}

	/// Binds a factory whose argument slots are declared by the tuple type `A`.
	///
	/// Arguments are supplied left to right and may be spread over several
	/// partial applications.
	pub fn factory<A, F>(produce: F) -> Self
	where
		A: FactoryArgs,
		F: Fn(&Resolver, A) -> DiResult<T> + Send + Sync + 'static,
	{
		let producer: ProducerFn = Arc::new(move |resolver: &Resolver, args: &[Arg]| {
			let args = A::from_args(args).ok_or_else(|| argument_extraction_failed::<T, A>())?;
			produce(resolver, args).map(|value| Arc::new(value) as ErasedValue)
		});
		Self::from_producer(Producer::Factory(producer), A::slot_types())
	}

	/// Binds a factory that also receives the active context of type `C`.
	pub fn contexted_factory<C, A, F>(produce: F) -> Self
	where
		C: Any + Send + Sync,
		A: FactoryArgs,
		F: Fn(&Resolver, &C, A) -> DiResult<T> + Send + Sync + 'static,
	{
		let producer: ProducerFn = Arc::new(move |resolver: &Resolver, args: &[Arg]| {
			let context = resolver.context::<C>()?;
			let args = A::from_args(args).ok_or_else(|| argument_extraction_failed::<T, A>())?;
			produce(resolver, &context, args).map(|value| Arc::new(value) as ErasedValue)
		});
		Self::from_producer(Producer::Factory(producer), A::slot_types()).contexted::<C>()
	}

	pub fn tagged(mut self, tag: impl Into<Tag>) -> Self {
		self.entry.key = self.entry.key.with_tag(tag);
		self
	}

	/// Restricts the binding to requests made under a context of type `C`.
	pub fn contexted<C: Any>(mut self) -> Self {
		self.entry.key = self.entry.key.with_context::<C>();
		self
	}

	/// Caches the produced value in the container's default scope.
	pub fn singleton(mut self) -> Self {
		self.entry.scope = ScopeRef::Default;
		self
	}

	/// Caches the produced value in `scope`.
	pub fn scoped(mut self, scope: &Arc<Scope>) -> Self {
		self.entry.scope = ScopeRef::Explicit(scope.clone());
		self
	}

	pub fn key(&self) -> &BindingKey {
		&self.entry.key
	}

	pub(crate) fn into_entry(self) -> BindingEntry {
		self.entry
	}
}

impl<T: ScopeClose> Binding<T> {
	/// Notifies cached instances of this binding when their scope closes.
	pub fn notify_on_close(mut self) -> Self {
		let hook: CloseHook = Arc::new(|value: &ErasedValue| {
			if let Some(instance) = value.downcast_ref::<T>() {
				instance.notify_close();
			}
		});
		self.entry.close_hook = Some(hook);
		self
	}
}

impl<T> fmt::Debug for Binding<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Binding").field(&self.entry).finish()
	}
}

fn argument_extraction_failed<T, A>() -> DiError {
	DiError::producer(format!(
		"arguments for {} do not fit {}",
		std::any::type_name::<T>(),
		std::any::type_name::<A>()
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct Session;

	#[rstest]
	fn test_declaration_builds_key() {
		// Act
		let binding = Binding::instance(5u8).tagged("five").contexted::<Session>();

		// Assert
		assert_eq!(
			binding.key(),
			&BindingKey::of::<u8>().with_tag("five").with_context::<Session>()
		);
	}

	#[rstest]
	fn test_factory_records_slot_types() {
		// Act
		let entry = Binding::factory(|_, (a, b): (i32, String)| Ok(format!("{a}{b}"))).into_entry();

		// Assert
		assert_eq!(entry.arity(), 2);
		assert_eq!(entry.arg_types, vec![TypeInfo::of::<i32>(), TypeInfo::of::<String>()]);
		assert!(!entry.is_singleton());
	}

	#[rstest]
	#[case(None, None, true)]
	#[case(Some("a"), None, false)]
	fn test_untagged_matching(
		#[case] tag: Option<&str>,
		#[case] context: Option<TypeInfo>,
		#[case] expected: bool,
	) {
		let entry = Binding::instance(1u8).into_entry();
		let tag = tag.map(Tag::from);

		assert_eq!(entry.matches(TypeInfo::of::<u8>(), tag.as_ref(), context), expected);
	}

	#[rstest]
	fn test_context_free_entry_matches_under_any_context() {
		let entry = Binding::instance(1u8).into_entry();

		assert!(entry.matches(TypeInfo::of::<u8>(), None, Some(TypeInfo::of::<Session>())));
		assert!(entry.matches(TypeInfo::of::<u8>(), None, None));
	}

	#[rstest]
	fn test_contexted_entry_requires_its_context() {
		let entry = Binding::instance(1u8).contexted::<Session>().into_entry();

		assert!(entry.matches(TypeInfo::of::<u8>(), None, Some(TypeInfo::of::<Session>())));
		assert!(!entry.matches(TypeInfo::of::<u8>(), None, Some(TypeInfo::of::<u32>())));
		assert!(!entry.matches(TypeInfo::of::<u8>(), None, None));
	}

	#[rstest]
	fn test_singleton_flags() {
		let scope = Arc::new(Scope::new());

		assert!(Binding::instance(1u8).singleton().into_entry().is_singleton());
		assert!(Binding::instance(1u8).scoped(&scope).into_entry().is_singleton());
	}
}
