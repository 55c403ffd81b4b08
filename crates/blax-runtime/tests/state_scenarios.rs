//! End-to-end state scenarios through the public API.
//!
//! Covers the observable write path, subscriber identity, collection
//! auto-wiring, validation failures, and the container seam.

use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use blax_runtime::{
    AnyState, Callback, CallbackPolicy, ConfigurationIssue, FactoryConfig, Field, Injectable,
    Injector, ObservableDict, ObservableList, ResolutionError, ResolutionErrorKind, ServiceLifetime,
    ServiceMap, State, StateDefinition, StateError, StateFactory, StateHandle, TypeCandidate, field,
};

// ── Fixtures ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Counter {
    count: i32,
}

impl Counter {
    const COUNT: Field<Counter, i32> = field!(Counter, count);
}

impl State for Counter {
    fn define(def: &mut StateDefinition<Self>) {
        def.observable(&Self::COUNT);
    }
}

#[derive(Default)]
struct Basket {
    items: ObservableList<String>,
    stock: ObservableDict<String, u32>,
}

impl Basket {
    const ITEMS: Field<Basket, ObservableList<String>> = field!(Basket, items);
    const STOCK: Field<Basket, ObservableDict<String, u32>> = field!(Basket, stock);
}

impl State for Basket {
    fn define(def: &mut StateDefinition<Self>) {
        def.collection(&Self::ITEMS).collection(&Self::STOCK);
    }
}

#[derive(Default)]
struct Locked {
    level: u8,
}

impl Locked {
    const LEVEL: Field<Locked, u8> = field!(sealed Locked, level);
}

impl State for Locked {
    fn define(def: &mut StateDefinition<Self>) {
        def.observable(&Self::LEVEL);
    }
}

struct Clock(u64);
struct Locale(&'static str);

struct Session {
    started_at: u64,
    locale: String,
}

impl Session {
    const STARTED_AT: Field<Session, u64> = field!(Session, started_at);
    const LOCALE: Field<Session, String> = field!(Session, locale);
}

impl State for Session {
    fn define(def: &mut StateDefinition<Self>) {
        def.observable(&Self::STARTED_AT).plain(&Self::LOCALE);
    }
}

impl Injectable for Session {
    fn construct(injector: &dyn Injector) -> Result<Self, ResolutionError> {
        let clock = injector.resolve::<Clock>()?;
        Ok(Self {
            started_at: clock.0,
            locale: String::new(),
        })
    }

    fn inject_fields(&mut self, injector: &dyn Injector) -> Result<(), ResolutionError> {
        self.locale = injector.resolve::<Locale>()?.0.to_string();
        Ok(())
    }
}

fn counting() -> (Rc<Cell<u32>>, Callback) {
    let hits = Rc::new(Cell::new(0u32));
    let hits_clone = Rc::clone(&hits);
    let cb = Callback::new(move || hits_clone.set(hits_clone.get() + 1));
    (hits, cb)
}

// ── Write path ────────────────────────────────────────────────────────────

#[test]
fn counter_scenario() {
    let factory = StateFactory::new();
    let counter = factory.create::<Counter>().unwrap();
    let (hits, c1) = counting();

    counter.subscribe(&c1);
    counter.set(&Counter::COUNT, 5).unwrap();
    assert_eq!(hits.get(), 1);
    assert_eq!(counter.get(&Counter::COUNT), 5);

    counter.unsubscribe(&c1);
    counter.set(&Counter::COUNT, 10).unwrap();
    assert_eq!(hits.get(), 1);
    assert_eq!(counter.get(&Counter::COUNT), 10);
}

#[test]
fn every_subscriber_sees_the_new_value() {
    let counter = StateFactory::new().create::<Counter>().unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    for tag in 0..3 {
        let (state, seen) = (counter.clone(), Rc::clone(&seen));
        counter.subscribe(&Callback::new(move || {
            seen.borrow_mut().push((tag, state.get(&Counter::COUNT)));
        }));
    }

    counter.set(&Counter::COUNT, 8).unwrap();
    assert_eq!(*seen.borrow(), vec![(0, 8), (1, 8), (2, 8)]);
}

#[test]
fn duplicate_subscribe_invokes_once() {
    let counter = StateFactory::new().create::<Counter>().unwrap();
    let (hits, cb) = counting();
    counter.subscribe(&cb);
    counter.subscribe(&cb);
    counter.subscribe(&cb.clone());
    assert_eq!(counter.subscriber_count(), 1);

    counter.set(&Counter::COUNT, 1).unwrap();
    assert_eq!(hits.get(), 1);
}

#[test]
fn unsubscribing_unknown_callback_is_noop() {
    let counter = StateFactory::new().create::<Counter>().unwrap();
    let (_, stranger) = counting();
    counter.unsubscribe(&stranger);
    assert_eq!(counter.subscriber_count(), 0);
    assert!(!counter.is_wired());
}

#[test]
fn callback_unsubscribing_itself_mid_pass() {
    let counter = StateFactory::new().create::<Counter>().unwrap();
    let (later_hits, later) = counting();
    let slot: Rc<RefCell<Option<Callback>>> = Rc::new(RefCell::new(None));

    let (state, slot_clone) = (counter.clone(), Rc::clone(&slot));
    let once = Callback::new(move || {
        if let Some(me) = slot_clone.borrow().as_ref() {
            state.unsubscribe(me);
        }
    });
    *slot.borrow_mut() = Some(once.clone());

    counter.subscribe(&once);
    counter.subscribe(&later);
    counter.set(&Counter::COUNT, 1).unwrap();
    assert_eq!(later_hits.get(), 1);
    assert!(!counter.is_subscribed(&once));

    counter.set(&Counter::COUNT, 2).unwrap();
    assert_eq!(later_hits.get(), 2);
}

// ── Collections ───────────────────────────────────────────────────────────

#[test]
fn basket_scenario() {
    let basket = StateFactory::new().create::<Basket>().unwrap();
    let (hits, c2) = counting();
    basket.subscribe(&c2);

    let items = basket.get(&Basket::ITEMS);
    items.add("apple".to_string());
    assert_eq!(hits.get(), 1);
    assert_eq!(items.to_vec(), vec!["apple".to_string()]);

    items.extend(["pear".to_string(), "plum".to_string()]);
    assert_eq!(items.len(), 3);
    let before = hits.get();
    items.clear();
    assert_eq!(hits.get(), before + 1);
    assert!(items.is_empty());
}

#[test]
fn list_without_subscribers_has_no_wiring() {
    let basket = StateFactory::new().create::<Basket>().unwrap();
    let items = basket.get(&Basket::ITEMS);
    items.add("apple".to_string());
    assert!(!basket.is_wired());
    assert_eq!(items.changed().listener_count(), 0);
    assert_eq!(items.len(), 1);
}

#[test]
fn many_subscribers_one_notification_each_per_append() {
    let basket = StateFactory::new().create::<Basket>().unwrap();
    let counters: Vec<_> = (0..4).map(|_| counting()).collect();
    for (_, cb) in &counters {
        basket.subscribe(cb);
    }
    let items = basket.get(&Basket::ITEMS);
    assert_eq!(items.changed().listener_count(), 1);

    items.add("a".to_string());
    items.add("b".to_string());
    for (hits, _) in &counters {
        assert_eq!(hits.get(), 2);
    }
}

#[test]
fn dict_changes_notify_while_wired() {
    let basket = StateFactory::new().create::<Basket>().unwrap();
    let (hits, cb) = counting();
    let stock = basket.get(&Basket::STOCK);

    basket.subscribe(&cb);
    stock.insert("apple".to_string(), 3);
    stock.update(&"apple".to_string(), |n| *n -= 1);
    stock.remove(&"missing".to_string());
    assert_eq!(hits.get(), 2);
    assert_eq!(stock.get(&"apple".to_string()), Some(2));

    basket.unsubscribe(&cb);
    stock.clear();
    assert_eq!(hits.get(), 2);
}

#[test]
fn reassigned_collection_is_rewired() {
    let basket = StateFactory::new().create::<Basket>().unwrap();
    let (hits, cb) = counting();
    basket.subscribe(&cb);

    let old = basket.get(&Basket::ITEMS);
    let replacement: ObservableList<String> = ["x".to_string()].into_iter().collect();
    basket.set(&Basket::ITEMS, replacement.clone()).unwrap();
    assert_eq!(hits.get(), 1);

    old.add("ignored".to_string());
    replacement.add("y".to_string());
    assert_eq!(hits.get(), 2);
}

// ── Validation and errors ─────────────────────────────────────────────────

#[test]
fn sealed_observable_field_fails_before_instance() {
    let factory = StateFactory::new();
    let err = factory.create::<Locked>().unwrap_err();
    assert!(matches!(
        err,
        StateError::Configuration {
            field: "level",
            issue: ConfigurationIssue::NotInterceptable,
            ..
        }
    ));
    assert!(err.to_string().contains("level"));
    assert!(!factory.is_validated::<Locked>());
}

#[test]
fn injected_state_resolves_constructor_and_field_dependencies() {
    let mut services = ServiceMap::new();
    services.insert(Clock(1_700)).insert(Locale("en-GB"));
    let session = StateFactory::new().create_with::<Session>(&services).unwrap();
    assert_eq!(session.get(&Session::STARTED_AT), 1_700);
    assert_eq!(session.get(&Session::LOCALE), "en-GB");
}

#[test]
fn missing_dependency_is_construction_error() {
    let mut services = ServiceMap::new();
    services.insert(Clock(0));
    let err = StateFactory::new()
        .create_with::<Session>(&services)
        .unwrap_err();
    match &err {
        StateError::Construction { source, .. } => {
            assert_eq!(source.kind, ResolutionErrorKind::Unregistered);
            assert!(source.type_name.ends_with("Locale"));
        }
        other => panic!("expected construction error, got {other:?}"),
    }
    assert!(std::error::Error::source(&err).is_some());
}

// ── Registration ──────────────────────────────────────────────────────────

#[test]
fn scan_registers_only_state_types() {
    let factory = StateFactory::with_config(
        FactoryConfig::new().with_default_lifetime(ServiceLifetime::Singleton),
    );
    let regs = factory.scan([
        TypeCandidate::state::<Counter>(),
        TypeCandidate::other::<Clock>(),
        TypeCandidate::injectable::<Session>(),
        TypeCandidate::other::<String>(),
    ]);
    assert_eq!(regs.len(), 2);
    assert!(regs.iter().all(|r| r.lifetime() == ServiceLifetime::Singleton));

    let mut services = ServiceMap::new();
    services.insert(Clock(5)).insert(Locale("fr"));
    let built: Vec<AnyState> = regs
        .iter()
        .map(|r| r.build(&factory, Some(&services as &dyn Injector)).unwrap())
        .collect();
    assert!(built[0].is::<Counter>());
    let session = built[1].downcast::<Session>().unwrap();
    assert_eq!(session.get(&Session::LOCALE), "fr");
}

#[test]
fn construct_by_type_rejects_non_state() {
    let factory = StateFactory::new();
    let err = TypeCandidate::other::<Clock>()
        .construct(&factory, None)
        .unwrap_err();
    assert!(matches!(err, StateError::TypeMismatch { .. }));

    let counter = TypeCandidate::state::<Counter>()
        .construct(&factory, None)
        .unwrap();
    assert!(matches!(
        counter.downcast::<Basket>(),
        Err(StateError::TypeMismatch { .. })
    ));
}

// ── Consumer handle ───────────────────────────────────────────────────────

#[test]
fn dropping_handle_unwires_collections() {
    let basket = StateFactory::new().create::<Basket>().unwrap();
    let items = basket.get(&Basket::ITEMS);
    {
        let mut view = StateHandle::new(basket.clone());
        let (_, redraw) = counting();
        view.subscribe(&redraw);
        assert!(view.state().is_wired());
        assert_eq!(items.changed().listener_count(), 1);
    }
    assert!(!basket.is_wired());
    assert_eq!(items.changed().listener_count(), 0);
}

// ── Callback failures ─────────────────────────────────────────────────────

fn panicking() -> Callback {
    Callback::new(|| panic!("subscriber failed"))
}

#[test]
fn panicking_subscriber_propagates_by_default() {
    let counter = StateFactory::new().create::<Counter>().unwrap();
    let (hits, after) = counting();
    counter.subscribe(&panicking());
    counter.subscribe(&after);

    let result = catch_unwind(AssertUnwindSafe(|| {
        let _ = counter.set(&Counter::COUNT, 1);
    }));
    assert!(result.is_err());
    assert_eq!(hits.get(), 0);
    assert_eq!(counter.get(&Counter::COUNT), 1);
}

#[test]
fn isolate_policy_keeps_notifying() {
    let factory = StateFactory::with_config(
        FactoryConfig::new().with_callback_policy(CallbackPolicy::Isolate),
    );
    let basket = factory.create::<Basket>().unwrap();
    let (hits, after) = counting();
    basket.subscribe(&panicking());
    basket.subscribe(&after);

    basket.get(&Basket::ITEMS).add("apple".to_string());
    assert_eq!(hits.get(), 1);
}
