//! Type-erased factory arguments
//!
//! A factory binding declares its argument slots through a tuple type implementing
//! [`FactoryArgs`]. Callers supply arguments as tuples implementing [`IntoArgs`];
//! partial applications accumulate them in an [`Args`] list until every slot is
//! filled.

use crate::key::TypeInfo;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A single type-erased argument value.
#[derive(Clone)]
pub struct Arg {
	value: Arc<dyn Any + Send + Sync>,
	ty: TypeInfo,
}

impl Arg {
	pub fn new<A: Any + Send + Sync>(value: A) -> Self {
		Self {
			value: Arc::new(value),
			ty: TypeInfo::of::<A>(),
		}
	}

	pub fn type_info(&self) -> TypeInfo {
		self.ty
	}

	/// Clones the value out if it has type `A`.
	pub fn downcast<A: Any + Clone>(&self) -> Option<A> {
		self.value.downcast_ref::<A>().cloned()
	}
}

impl fmt::Debug for Arg {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Arg<{}>", self.ty)
	}
}

/// Ordered list of arguments collected for a factory call.
///
/// # Examples
///
/// ```
/// use bindery_di::{Args, IntoArgs};
///
/// let args = Args::new().with(1u8).with("two");
/// assert_eq!(args.len(), 2);
///
/// let combined = args.concat((3.0f64,).into_args());
/// assert_eq!(combined.len(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Args(Vec<Arg>);

impl Args {
	pub fn new() -> Self {
		Self(Vec::new())
	}

	pub fn with<A: Any + Send + Sync>(mut self, value: A) -> Self {
		self.0.push(Arg::new(value));
		self
	}

	/// Appends `other` after the arguments already collected.
	pub fn concat(mut self, other: Args) -> Self {
		self.0.extend(other.0);
		self
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_slice(&self) -> &[Arg] {
		&self.0
	}
}

/// Conversion of caller-supplied values into an argument list.
///
/// Implemented for `()`, [`Args`] and tuples of up to five values.
pub trait IntoArgs {
	fn into_args(self) -> Args;
}

impl IntoArgs for Args {
	fn into_args(self) -> Args {
		self
	}
}

impl IntoArgs for () {
	fn into_args(self) -> Args {
		Args::new()
	}
}

/// Argument slots of a factory binding, declared as a tuple.
///
/// `ARITY` is the number of slots; `from_args` rebuilds the tuple from a
/// saturated argument list, returning `None` if a slot holds the wrong type.
pub trait FactoryArgs: Sized + Send + 'static {
	const ARITY: usize;

	fn slot_types() -> Vec<TypeInfo>;

	fn from_args(args: &[Arg]) -> Option<Self>;
}

macro_rules! tuple_args {
	($arity:literal; $($ty:ident $idx:tt),+) => {
		impl<$($ty: Any + Send + Sync),+> IntoArgs for ($($ty,)+) {
			fn into_args(self) -> Args {
				Args(vec![$(Arg::new(self.$idx)),+])
			}
		}

		impl<$($ty: Any + Clone + Send + Sync),+> FactoryArgs for ($($ty,)+) {
			const ARITY: usize = $arity;

			fn slot_types() -> Vec<TypeInfo> {
				vec![$(TypeInfo::of::<$ty>()),+]
			}

			fn from_args(args: &[Arg]) -> Option<Self> {
				Some(($(args.get($idx)?.downcast::<$ty>()?,)+))
			}
		}
	};
}

tuple_args!(1; A 0);
tuple_args!(2; A 0, B 1);
tuple_args!(3; A 0, B 1, C 2);
tuple_args!(4; A 0, B 1, C 2, D 3);
tuple_args!(5; A 0, B 1, C 2, D 3, E 4);
