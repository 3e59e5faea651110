//! Circular dependency detection tests

use bindery_di::cycle_detection::resolution_depth;
use bindery_di::{Binding, Container, CycleError, DiError, DiSettings};
use rstest::rstest;
use std::sync::Arc;

#[derive(Debug)]
struct ServiceA {
	_b: Arc<ServiceB>,
}

#[derive(Debug)]
struct ServiceB {
	_a: Arc<ServiceA>,
}

#[derive(Debug)]
struct Chain<const N: usize>;

fn cyclic_container() -> Container {
	Container::builder()
		.bind(Binding::provider(|r| Ok(ServiceA { _b: r.instance()? })))
		.bind(Binding::provider(|r| Ok(ServiceB { _a: r.instance()? })))
		.build()
}

#[rstest]
fn test_mutual_dependency_is_detected() {
	// Arrange
	let container = cyclic_container();

	// Act
	let err = container.instance::<ServiceA>().unwrap_err();

	// Assert
	match err.root_cause() {
		DiError::Cycle(CycleError::CircularDependency { path, .. }) => {
			assert!(path.contains("ServiceA"));
			assert!(path.contains("ServiceB"));
		}
		other => panic!("Expected CircularDependency, got {:?}", other),
	}
	assert_eq!(resolution_depth(), 0);
}

#[rstest]
fn test_cyclic_singleton_does_not_deadlock() {
	// Arrange
	let container = Container::builder()
		.bind(Binding::provider(|r| Ok(ServiceA { _b: r.instance()? })).singleton())
		.bind(Binding::provider(|r| Ok(ServiceB { _a: r.instance()? })).singleton())
		.build();

	// Act
	let result = container.instance::<ServiceB>();

	// Assert
	assert!(matches!(
		result.unwrap_err().root_cause(),
		DiError::Cycle(CycleError::CircularDependency { .. })
	));
	assert!(container.default_scope().is_empty());
}

#[rstest]
fn test_provider_called_after_resolution_is_not_a_cycle() {
	// Arrange
	#[derive(Debug)]
	struct Lazy {
		make: bindery_di::Provider<String>,
	}
	let container = Container::builder()
		.bind(Binding::provider(|r| Ok(Lazy { make: r.provider()? })))
		.bind(Binding::provider(|_| Ok(String::from("made"))))
		.build();

	// Act
	let lazy = container.instance::<Lazy>().unwrap();
	let made = lazy.make.get().unwrap();

	// Assert
	assert_eq!(*made, "made");
}

#[rstest]
fn test_depth_limit_from_settings() {
	// Arrange
	let container = Container::builder()
		.bind(Binding::provider(|r| {
			r.instance::<Chain<1>>()?;
			Ok(Chain::<0>)
		}))
		.bind(Binding::provider(|r| {
			r.instance::<Chain<2>>()?;
			Ok(Chain::<1>)
		}))
		.bind(Binding::provider(|_| Ok(Chain::<2>)))
		.with_settings(DiSettings::new().with_max_resolution_depth(2))
		.build();

	// Act
	let too_deep = container.instance::<Chain<0>>();
	let shallow = container.instance::<Chain<1>>();

	// Assert
	assert!(matches!(
		too_deep.unwrap_err().root_cause(),
		DiError::Cycle(CycleError::MaxDepthExceeded(3))
	));
	assert!(shallow.is_ok());
}
