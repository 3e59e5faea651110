//! # Bindery
//!
//! A runtime dependency injection container for Rust.
//!
//! Bindings map a requested type, an optional tag and an optional context type
//! to the logic producing instances. The container resolves object graphs on
//! demand, caches singletons in closeable scopes and curries multi-argument
//! factories.
//!
//! ## Feature Flags
//!
//! - `di` (default) - The resolution engine (`bindery-di`)
//!
//! ## Quick Example
//!
//! ```rust
//! use bindery::prelude::*;
//!
//! let container = Container::builder()
//!     .bind(Binding::instance(42i32))
//!     .bind(Binding::provider(|r| Ok(format!("answer: {}", r.instance::<i32>()?))))
//!     .build();
//!
//! assert_eq!(*container.instance::<String>().unwrap(), "answer: 42");
//! ```

#[cfg(feature = "di")]
pub use bindery_di as di;

#[cfg(feature = "di")]
pub use bindery_di::*;

pub mod prelude {
	#[cfg(feature = "di")]
	pub use crate::di::{
		Applied, Binding, Container, ContextTranslator, DiError, DiResult, Factory, Provider, Query,
		Resolver, Scope, ScopeClose,
	};
}
