//! Resolution tests
//!
//! These tests verify that:
//! 1. A key bound once resolves to its producer's output
//! 2. Missing and duplicate bindings fail at resolution time only
//! 3. Tags discriminate bindings of the same type
//! 4. Producer failures keep the chain of bindings that led to them

use bindery_di::{Binding, BindingKey, Container, DiError, Query};
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
struct Human {
	name: String,
}

#[derive(Debug)]
struct Pet {
	owner: Arc<Human>,
}

fn pet_binding() -> Binding<Pet> {
	Binding::provider(|r| Ok(Pet { owner: r.instance()? }))
}

#[rstest]
fn test_bound_instance_resolves() {
	// Arrange
	let container = Container::builder().bind(Binding::instance(42i32)).build();

	// Act
	let value = container.instance::<i32>().unwrap();

	// Assert
	assert_eq!(*value, 42);
}

#[rstest]
fn test_instance_binding_returns_same_arc() {
	let container = Container::builder()
		.bind(Binding::instance(String::from("same")))
		.build();

	let first = container.instance::<String>().unwrap();
	let second = container.instance::<String>().unwrap();

	assert!(Arc::ptr_eq(&first, &second));
}

#[rstest]
fn test_provider_runs_on_every_resolution() {
	// Arrange
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let container = Container::builder()
		.bind(Binding::provider(move |_| {
			Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
		}))
		.build();

	// Act
	let first = container.instance::<usize>().unwrap();
	let second = container.instance::<usize>().unwrap();

	// Assert
	assert_eq!((*first, *second), (1, 2));
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[rstest]
fn test_pet_without_human_fails_with_dependency_chain() {
	// Arrange
	let container = Container::builder().bind(pet_binding()).build();

	// Act
	let err = container.instance::<Pet>().unwrap_err();

	// Assert
	assert!(err.is_dependency_resolution());
	assert_eq!(err.resolution_chain(), vec![&BindingKey::of::<Pet>()]);
	match err.root_cause() {
		DiError::NoBinding { key } => assert_eq!(key, &BindingKey::of::<Human>()),
		other => panic!("Expected NoBinding for Human, got {:?}", other),
	}
}

#[rstest]
fn test_pet_owner_is_the_bound_human() {
	// Arrange
	let container = Container::builder()
		.bind(pet_binding())
		.bind(Binding::instance(Human {
			name: "Grace".to_string(),
		}))
		.build();

	// Act
	let pet = container.instance::<Pet>().unwrap();
	let human = container.instance::<Human>().unwrap();

	// Assert
	assert!(Arc::ptr_eq(&pet.owner, &human));
	assert_eq!(pet.owner.name, "Grace");
}

#[rstest]
fn test_unbound_type_fails_whatever_else_is_bound() {
	// Arrange
	let container = Container::builder()
		.bind(Binding::instance(1u8))
		.bind(Binding::instance(2u16).tagged("x"))
		.bind(Binding::instance(String::new()))
		.build();

	// Act
	let result = container.instance::<u32>();

	// Assert
	match result {
		Err(DiError::NoBinding { key }) => assert_eq!(key, BindingKey::of::<u32>()),
		other => panic!("Expected NoBinding, got {:?}", other),
	}
}

#[rstest]
fn test_duplicate_bindings_fail_only_when_resolved() {
	// Arrange
	let container = Container::builder()
		.bind(Binding::instance(1i32))
		.bind(Binding::instance(2i32))
		.bind(Binding::instance("fine"))
		.build();

	// Act
	let duplicate = container.instance::<i32>();
	let unrelated = container.instance::<&'static str>();

	// Assert
	assert!(matches!(
		duplicate,
		Err(DiError::MultipleBindings { count: 2, .. })
	));
	assert_eq!(*unrelated.unwrap(), "fine");
}

#[rstest]
#[case::untagged(None, 1)]
#[case::first_tag(Some("primary"), 2)]
#[case::second_tag(Some("replica"), 3)]
fn test_tags_select_bindings(#[case] tag: Option<&str>, #[case] expected: u32) {
	// Arrange
	let container = Container::builder()
		.bind(Binding::instance(1u32))
		.bind(Binding::instance(2u32).tagged("primary"))
		.bind(Binding::instance(3u32).tagged("replica"))
		.build();
	let query = match tag {
		Some(tag) => Query::tagged(tag),
		None => Query::new(),
	};

	// Act
	let value = container.instance_with::<u32>(query).unwrap();

	// Assert
	assert_eq!(*value, expected);
}

#[rstest]
fn test_untagged_request_never_matches_tagged_binding() {
	let container = Container::builder()
		.bind(Binding::instance(1u32).tagged("only"))
		.build();

	assert!(container.instance::<u32>().unwrap_err().is_no_binding());
	assert!(container.tagged::<u32>("other").unwrap_err().is_no_binding());
}

#[rstest]
fn test_non_string_tags() {
	let container = Container::builder()
		.bind(Binding::instance("zero").tagged(0i32))
		.bind(Binding::instance("one").tagged(1i32))
		.build();

	assert_eq!(*container.tagged::<&'static str>(1i32).unwrap(), "one");
	assert!(container.tagged::<&'static str>("1").is_err());
}

#[rstest]
fn test_optional_instance_tolerates_only_own_absence() {
	// Arrange
	let container = Container::builder().bind(pet_binding()).build();

	// Act
	let absent = container.optional_instance::<Human>().unwrap();
	let broken = container.optional_instance::<Pet>();

	// Assert
	assert!(absent.is_none());
	assert!(broken.unwrap_err().is_dependency_resolution());
}

#[rstest]
fn test_optional_dependency_inside_producer() {
	// Arrange
	let container = Container::builder()
		.bind(Binding::provider(|r| {
			let name = r.optional_instance::<String>()?;
			Ok(Human {
				name: name.map_or_else(|| "anonymous".to_string(), |n| n.to_string()),
			})
		}))
		.build();

	// Act
	let human = container.instance::<Human>().unwrap();

	// Assert
	assert_eq!(human.name, "anonymous");
}

#[rstest]
fn test_provider_defers_resolution() {
	// Arrange
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let container = Container::builder()
		.bind(Binding::provider(move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(Human {
				name: "lazy".to_string(),
			})
		}))
		.build();

	// Act
	let provider = container.provider::<Human>().unwrap();
	let before = calls.load(Ordering::SeqCst);
	let human = provider.get().unwrap();

	// Assert
	assert_eq!(before, 0);
	assert_eq!(human.name, "lazy");
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(provider.key(), &BindingKey::of::<Human>());
}

#[rstest]
fn test_provider_for_missing_binding_fails_eagerly() {
	let container = Container::builder().build();

	let result = container.provider::<Human>();

	assert!(result.unwrap_err().is_no_binding());
}

#[rstest]
fn test_producer_error_is_wrapped_with_key() {
	// Arrange
	let container = Container::builder()
		.bind(Binding::<Human>::provider(|_| {
			Err(DiError::producer("database unavailable"))
		}))
		.build();

	// Act
	let err = container.instance::<Human>().unwrap_err();

	// Assert
	assert_eq!(err.resolution_chain(), vec![&BindingKey::of::<Human>()]);
	assert_eq!(err.root_cause().to_string(), "database unavailable");
}

#[rstest]
fn test_error_chain_spans_nested_producers() {
	// Arrange
	#[derive(Debug)]
	struct Kennel {
		_pet: Arc<Pet>,
	}
	let container = Container::builder()
		.bind(Binding::provider(|r| Ok(Kennel { _pet: r.instance()? })))
		.bind(pet_binding())
		.build();

	// Act
	let err = container.instance::<Kennel>().unwrap_err();

	// Assert
	assert_eq!(
		err.resolution_chain(),
		vec![&BindingKey::of::<Kennel>(), &BindingKey::of::<Pet>()]
	);
	assert!(err.root_cause().is_no_binding());
}
