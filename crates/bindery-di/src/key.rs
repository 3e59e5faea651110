//! Binding identity: requested type, tag and context type

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type identifier paired with its name for diagnostics.
///
/// Equality and hashing only consider the [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeInfo {
	id: TypeId,
	name: &'static str,
}

impl TypeInfo {
	/// Returns the type info of `T`.
	///
	/// # Examples
	///
	/// ```
	/// use bindery_di::TypeInfo;
	///
	/// let info = TypeInfo::of::<u32>();
	/// assert_eq!(info.name(), "u32");
	/// assert_eq!(info, TypeInfo::of::<u32>());
	/// assert_ne!(info, TypeInfo::of::<i32>());
	/// ```
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	pub fn id(&self) -> TypeId {
		self.id
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for TypeInfo {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

impl fmt::Display for TypeInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

trait TagValue: Any + Send + Sync + fmt::Debug {
	fn eq_tag(&self, other: &dyn TagValue) -> bool;
	fn hash_tag(&self, state: &mut dyn Hasher);
	fn as_any(&self) -> &dyn Any;
}

impl<T> TagValue for T
where
	T: Any + Eq + Hash + Send + Sync + fmt::Debug,
{
	fn eq_tag(&self, other: &dyn TagValue) -> bool {
		other
			.as_any()
			.downcast_ref::<T>()
			.is_some_and(|other| other == self)
	}

	fn hash_tag(&self, mut state: &mut dyn Hasher) {
		TypeId::of::<T>().hash(&mut state);
		self.hash(&mut state);
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// Discriminator distinguishing several bindings of the same type.
///
/// Any `Eq + Hash + Debug` value can serve as a tag. Tags of different types
/// never compare equal, so `Tag::new(1i32)` and `Tag::new(1i64)` are distinct.
/// String slices are stored as `String` so that `"a"` and `"a".to_string()`
/// denote the same tag.
///
/// # Examples
///
/// ```
/// use bindery_di::Tag;
///
/// assert_eq!(Tag::from("primary"), Tag::from(String::from("primary")));
/// assert_ne!(Tag::from("primary"), Tag::from("replica"));
/// assert_ne!(Tag::from(1i32), Tag::from(1i64));
/// ```
#[derive(Clone)]
pub struct Tag(Arc<dyn TagValue>);

impl Tag {
	/// Wraps `value`; a `&'static str` is stored as `String`.
	pub fn new<T>(value: T) -> Self
	where
		T: Any + Eq + Hash + Send + Sync + fmt::Debug,
	{
		if let Some(text) = (&value as &dyn Any).downcast_ref::<&'static str>() {
			return Self(Arc::new(text.to_string()));
		}
		Self(Arc::new(value))
	}

	/// Returns the tag value if it has type `T`.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.as_any().downcast_ref::<T>()
	}
}

impl PartialEq for Tag {
	fn eq(&self, other: &Self) -> bool {
		self.0.eq_tag(other.0.as_ref())
	}
}

impl Eq for Tag {}

impl Hash for Tag {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.hash_tag(state);
	}
}

impl fmt::Debug for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.0, f)
	}
}

impl From<&str> for Tag {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

macro_rules! tag_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Tag {
				fn from(value: $ty) -> Self {
					Self::new(value)
				}
			}
		)*
	};
}

tag_from!(String, bool, char, i32, i64, u32, u64, usize);

/// Identity of a binding.
///
/// Two keys are equal when the type, the tag and the context type all match.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
	ty: TypeInfo,
	tag: Option<Tag>,
	context: Option<TypeInfo>,
}

impl BindingKey {
	pub fn new(ty: TypeInfo, tag: Option<Tag>, context: Option<TypeInfo>) -> Self {
		Self { ty, tag, context }
	}

	/// Key of an untagged, context-free binding of `T`.
	pub fn of<T: 'static>() -> Self {
		Self::new(TypeInfo::of::<T>(), None, None)
	}

	pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
		self.tag = Some(tag.into());
		self
	}

	pub fn with_context<C: 'static>(mut self) -> Self {
		self.context = Some(TypeInfo::of::<C>());
		self
	}

	pub fn type_info(&self) -> TypeInfo {
		self.ty
	}

	pub fn tag(&self) -> Option<&Tag> {
		self.tag.as_ref()
	}

	pub fn context(&self) -> Option<TypeInfo> {
		self.context
	}
}

impl fmt::Display for BindingKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.ty)?;
		if let Some(tag) = &self.tag {
			write!(f, " (tag: {:?})", tag)?;
		}
		if let Some(context) = &self.context {
			write!(f, " on {}", context)?;
		}
		Ok(())
	}
}

impl fmt::Debug for BindingKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}
