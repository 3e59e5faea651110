//! # Bindery dependency injection
//!
//! Runtime resolution engine mapping declared bindings to the logic producing
//! their instances.
//!
//! ## Features
//!
//! - **Keys**: a binding is identified by its type, an optional tag and an optional context type
//! - **Producers**: ready-made instances, providers and curried factories
//! - **Scopes**: singletons cached per scope, with close notifications
//! - **Contexts**: requests made under a context value, translated between context types on demand
//! - **Diagnostics**: failures keep the chain of bindings that led to them
//!
//! All failures happen at resolution time. Building a container never fails.
//!
//! ## Example
//!
//! ```rust
//! use bindery_di::{Binding, Container};
//! use std::sync::Arc;
//!
//! struct Human {
//!     name: String,
//! }
//!
//! struct Pet {
//!     owner: Arc<Human>,
//! }
//!
//! let container = Container::builder()
//!     .bind(Binding::instance(Human { name: "Ada".into() }))
//!     .bind(Binding::provider(|r| Ok(Pet { owner: r.instance()? })))
//!     .build();
//!
//! let pet = container.instance::<Pet>().unwrap();
//! assert_eq!(pet.owner.name, "Ada");
//! assert!(Arc::ptr_eq(&pet.owner, &container.instance::<Human>().unwrap()));
//! ```
//!
//! ## Currying
//!
//! ```rust
//! use bindery_di::{Binding, Container};
//!
//! let container = Container::builder()
//!     .bind(Binding::factory(|_, (host, port): (String, u16)| Ok(format!("{host}:{port}"))))
//!     .build();
//!
//! let address = container.factory::<String>().unwrap();
//! let localhost = address.apply((String::from("localhost"),)).unwrap().into_partial().unwrap();
//! assert_eq!(*localhost.call((8080u16,)).unwrap(), "localhost:8080");
//! ```

mod args;
mod binding;
mod container;
mod context;
pub mod cycle_detection;
mod error;
mod key;
mod registry;
mod resolver;
mod scope;
mod settings;

pub use args::{Arg, Args, FactoryArgs, IntoArgs};
pub use binding::{Binding, BindingEntry};
pub use container::{Container, ContainerBuilder};
pub use context::ContextTranslator;
pub use cycle_detection::CycleError;
pub use error::{DiError, DiResult};
pub use key::{BindingKey, Tag, TypeInfo};
pub use resolver::{Applied, Factory, Provider, Query, Resolver};
pub use scope::{Scope, ScopeClose};
pub use settings::{DiSettings, SettingsError};
