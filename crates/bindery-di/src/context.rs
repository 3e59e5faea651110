//! Resolution contexts and context translators

use crate::binding::ErasedValue;
use crate::error::{DiError, DiResult};
use crate::key::TypeInfo;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Active context value carried through one resolution call tree.
#[derive(Clone)]
pub(crate) struct ContextValue {
	ty: TypeInfo,
	value: ErasedValue,
}

impl ContextValue {
	pub(crate) fn new<C: Any + Send + Sync>(value: C) -> Self {
		Self::from_arc(Arc::new(value))
	}

	pub(crate) fn from_arc<C: Any + Send + Sync>(value: Arc<C>) -> Self {
		Self {
			ty: TypeInfo::of::<C>(),
			value,
		}
	}

	pub(crate) fn type_info(&self) -> TypeInfo {
		self.ty
	}

	pub(crate) fn downcast<C: Any + Send + Sync>(&self) -> Option<Arc<C>> {
		self.value.clone().downcast::<C>().ok()
	}
}

impl fmt::Debug for ContextValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ContextValue<{}>", self.ty)
	}
}

type TranslateFn = Arc<dyn Fn(&ContextValue) -> DiResult<ContextValue> + Send + Sync>;

/// Converts a context of one type into a context of another.
///
/// When a request finds no binding under the caller's context, the resolver
/// applies the translator registered for that context type and retries.
///
/// # Examples
///
/// ```
/// use bindery_di::{Binding, Container, ContextTranslator};
///
/// struct Request { user: u32 }
/// struct User { id: u32 }
///
/// let container = Container::builder()
///     .bind(Binding::contexted_provider(|_, user: &User| Ok(format!("user-{}", user.id))))
///     .translate(ContextTranslator::new(|request: &Request| Ok(User { id: request.user })))
///     .build();
///
/// let name = container.on(Request { user: 7 }).instance::<String>().unwrap();
/// assert_eq!(*name, "user-7");
/// ```
#[derive(Clone)]
pub struct ContextTranslator {
	from: TypeInfo,
	to: TypeInfo,
	translate: TranslateFn,
}

impl ContextTranslator {
	pub fn new<From, To, F>(translate: F) -> Self
	where
		From: Any + Send + Sync,
		To: Any + Send + Sync,
		F: Fn(&From) -> DiResult<To> + Send + Sync + 'static,
	{
		let translate: TranslateFn = Arc::new(move |context: &ContextValue| {
			let source = context.downcast::<From>().ok_or(DiError::MissingContext {
				expected: std::any::type_name::<From>(),
			})?;
			translate(&source).map(ContextValue::new)
		});

		Self {
			from: TypeInfo::of::<From>(),
			to: TypeInfo::of::<To>(),
			translate,
		}
	}

	pub fn source(&self) -> TypeInfo {
		self.from
	}

	pub fn target(&self) -> TypeInfo {
		self.to
	}

	pub(crate) fn apply(&self, context: &ContextValue) -> DiResult<ContextValue> {
		(self.translate)(context)
	}
}

impl fmt::Debug for ContextTranslator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ContextTranslator<{} -> {}>", self.from, self.to)
	}
}

#[derive(Debug)]
pub(crate) enum TranslatorLookup<'a> {
	None,
	Unique(&'a ContextTranslator),
	Ambiguous(usize),
}

#[derive(Debug, Default)]
pub(crate) struct TranslatorRegistry {
	translators: Vec<ContextTranslator>,
}

impl TranslatorRegistry {
	pub(crate) fn new(translators: Vec<ContextTranslator>) -> Self {
		Self { translators }
	}

	pub(crate) fn find(&self, from: TypeInfo) -> TranslatorLookup<'_> {
		let mut matched = self.translators.iter().filter(|t| t.from == from);
		match (matched.next(), matched.count()) {
			(None, _) => TranslatorLookup::None,
			(Some(translator), 0) => TranslatorLookup::Unique(translator),
			(Some(_), rest) => TranslatorLookup::Ambiguous(rest + 1),
		}
	}

	pub(crate) fn len(&self) -> usize {
		self.translators.len()
	}
}
