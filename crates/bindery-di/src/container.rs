//! Container construction
//!
//! A [`Container`] is built once from an ordered list of bindings and
//! translators and is immutable afterwards. Building never fails: duplicate or
//! unsatisfiable bindings are reported when a request reaches them.

use crate::binding::Binding;
use crate::context::{ContextTranslator, TranslatorRegistry};
use crate::error::DiResult;
use crate::key::{BindingKey, Tag};
use crate::registry::Registry;
use crate::resolver::{Applied, Factory, Provider, Query, Resolver};
use crate::scope::Scope;
use crate::settings::DiSettings;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct ContainerInner {
	/// Distinguishes this container's cache slots in shared scopes
	pub(crate) id: u64,
	pub(crate) registry: Registry,
	pub(crate) translators: TranslatorRegistry,
	pub(crate) default_scope: Arc<Scope>,
	pub(crate) settings: DiSettings,
}

/// Collects bindings and translators in declaration order.
#[derive(Default)]
pub struct ContainerBuilder {
	registry: Registry,
	translators: Vec<ContextTranslator>,
	settings: DiSettings,
}

impl ContainerBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn bind<T: Any + Send + Sync>(mut self, binding: Binding<T>) -> Self {
		self.registry.push(binding.into_entry());
		self
	}

	pub fn translate(mut self, translator: ContextTranslator) -> Self {
		self.translators.push(translator);
		self
	}

	pub fn with_settings(mut self, settings: DiSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn build(self) -> Container {
		tracing::debug!(
			bindings = self.registry.len(),
			translators = self.translators.len(),
			"container built"
		);
		let inner = ContainerInner {
			id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
			registry: self.registry,
			translators: TranslatorRegistry::new(self.translators),
			default_scope: Arc::new(Scope::named("default")),
			settings: self.settings,
		};
		Container {
			root: Resolver::root(Arc::new(inner)),
		}
	}
}

/// Immutable set of bindings plus the default singleton scope.
///
/// Cloning is cheap and clones share singletons.
///
/// # Examples
///
/// ```
/// use bindery_di::{Binding, Container};
///
/// let container = Container::builder()
///     .bind(Binding::instance(42i64))
///     .build();
///
/// assert_eq!(*container.instance::<i64>().unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct Container {
	root: Resolver,
}

impl Container {
	pub fn builder() -> ContainerBuilder {
		ContainerBuilder::new()
	}

	/// Resolver making requests without a context.
	pub fn resolver(&self) -> &Resolver {
		&self.root
	}

	pub fn instance<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
		self.root.instance()
	}

	pub fn tagged<T: Any + Send + Sync>(&self, tag: impl Into<Tag>) -> DiResult<Arc<T>> {
		self.root.tagged(tag)
	}

	pub fn instance_with<T: Any + Send + Sync>(&self, query: Query) -> DiResult<Arc<T>> {
		self.root.instance_with(query)
	}

	pub fn optional_instance<T: Any + Send + Sync>(&self) -> DiResult<Option<Arc<T>>> {
		self.root.optional_instance()
	}

	pub fn optional_instance_with<T: Any + Send + Sync>(
		&self,
		query: Query,
	) -> DiResult<Option<Arc<T>>> {
		self.root.optional_instance_with(query)
	}

	pub fn provider<T: Any + Send + Sync>(&self) -> DiResult<Provider<T>> {
		self.root.provider()
	}

	pub fn provider_with<T: Any + Send + Sync>(&self, query: Query) -> DiResult<Provider<T>> {
		self.root.provider_with(query)
	}

	pub fn factory<T: Any + Send + Sync>(&self) -> DiResult<Factory<T>> {
		self.root.factory()
	}

	pub fn factory_with<T: Any + Send + Sync>(&self, query: Query) -> DiResult<Factory<T>> {
		self.root.factory_with(query)
	}

	pub fn apply<T: Any + Send + Sync>(&self, query: Query) -> DiResult<Applied<T>> {
		self.root.apply(query)
	}

	/// Resolver making requests under `context`.
	pub fn on<C: Any + Send + Sync>(&self, context: C) -> Resolver {
		self.root.on(context)
	}

	/// Whether a context-free request for `T` would find exactly one binding.
	pub fn contains<T: Any>(&self, query: &Query) -> bool {
		self.root.contains::<T>(query)
	}

	/// Declared binding keys in declaration order.
	pub fn bindings(&self) -> Vec<BindingKey> {
		self.inner().registry.keys().cloned().collect()
	}

	/// Scope backing bindings declared with `singleton()`.
	pub fn default_scope(&self) -> &Arc<Scope> {
		&self.inner().default_scope
	}

	pub fn settings(&self) -> &DiSettings {
		&self.inner().settings
	}

	fn inner(&self) -> &ContainerInner {
		self.root.inner()
	}
}

impl fmt::Debug for Container {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Container")
			.field("bindings", &self.inner().registry.len())
			.field("translators", &self.inner().translators.len())
			.field("settings", &self.inner().settings)
			.finish()
	}
}
