//! The service composition registry.
//!
//! [`ServiceRegistry`] is the name-keyed store at the heart of the bootstrap
//! kernel.  Services are registered as *factories* with explicitly declared
//! dependencies, extended additively through *composers*, and constructed
//! lazily — nothing is instantiated until a consumer calls
//! [`resolve`](ServiceRegistry::resolve), which then builds the full
//! dependency chain depth-first and memoizes every value for the life of the
//! registry.
//!
//! # Registration model
//!
//! Each key has at most one *initial producer* (a factory registered with
//! [`add_factory`](ServiceRegistry::add_factory), or a constant registered
//! with [`add_instance`](ServiceRegistry::add_instance)) and any number of
//! *composers* appended with
//! [`compose_factory`](ServiceRegistry::compose_factory).  Composers apply in
//! registration order, each receiving the output of the previous one.  Keys
//! that only composers target must be seeded with a default value at
//! construction time via [`ServiceRegistryBuilder::seed`].
//!
//! # Quick start
//!
//! ```rust,ignore
//! let registry = ServiceRegistry::builder()
//!     .seed(keys::MIDDLEWARES, MiddlewareSet::new())
//!     .build();
//!
//! registry.add_factory(keys::USER_STATE, &[keys::STORAGE], |deps| async move {
//!     let storage = deps.require::<Shared<dyn Storage>>(keys::STORAGE)?;
//!     Ok(into_instance(UserState::new(storage.inner())))
//! })?;
//!
//! let state = registry.resolve_as::<UserState>(keys::USER_STATE).await?;
//! ```
//!
//! # Resolution guarantees
//!
//! - A key's value is computed exactly once per registry; repeated `resolve`
//!   calls return the cached instance without re-invoking the factory or any
//!   composer.
//! - Concurrent `resolve` calls on one unresolved key are single-flight: one
//!   caller constructs, the rest wait for and receive its result.
//! - A factory or composer error propagates to the caller *unmemoized*; a
//!   later `resolve` re-attempts construction.
//! - Dependency cycles are detected via the in-progress resolution path and
//!   reported as [`RegistryError::DependencyCycle`], never as unbounded
//!   recursion.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::error::{RegistryError, RegistryResult};
use crate::services::{ResolvedServices, ServiceInstance, into_instance};

type FactoryFn =
    Arc<dyn Fn(ResolvedServices) -> BoxFuture<'static, anyhow::Result<ServiceInstance>> + Send + Sync>;

type ComposerFn = Arc<
    dyn Fn(ResolvedServices, ServiceInstance) -> BoxFuture<'static, anyhow::Result<ServiceInstance>>
        + Send
        + Sync,
>;

/// The sole initial producer for a key.
enum Producer {
    /// A constructor invoked with its resolved dependency mapping.
    Factory { deps: Vec<String>, build: FactoryFn },
    /// A pre-built constant (zero dependencies, no construction step).
    Instance(ServiceInstance),
}

/// One appended transform for a key.
struct Composer {
    deps: Vec<String>,
    apply: ComposerFn,
}

/// Registration state for one key: producer, construction-time seed, and the
/// ordered composer chain.
#[derive(Default)]
struct ServiceSlot {
    producer: Option<Producer>,
    seed: Option<ServiceInstance>,
    composers: Vec<Composer>,
}

/// Snapshot of a slot taken at resolution time, so no registration lock is
/// held across factory awaits.
struct ResolvePlan {
    initial: InitialPlan,
    composers: Vec<(Vec<String>, ComposerFn)>,
}

enum InitialPlan {
    Factory { deps: Vec<String>, build: FactoryFn },
    Instance(ServiceInstance),
    Seed(ServiceInstance),
}

fn own_deps(deps: &[&str]) -> Vec<String> {
    deps.iter().map(|dep| (*dep).to_string()).collect()
}

// =============================================================================
// ServiceRegistry
// =============================================================================

/// Name-keyed store of service factories, composers, and memoized instances.
///
/// Registration (`add_factory` / `compose_factory` / `add_instance`) happens
/// during one sequential bootstrap phase; `resolve` may then be called from
/// any task.  The registry is `Send + Sync` and is normally shared as an
/// `Arc<ServiceRegistry>` for the lifetime of one composition run.
pub struct ServiceRegistry {
    /// Registration tables.  Written during bootstrap, read at resolution.
    slots: RwLock<HashMap<String, ServiceSlot>>,
    /// Per-key memoization cells.  One `OnceCell` per key gives single-flight
    /// construction without serializing unrelated keys behind one lock.
    cells: Mutex<HashMap<String, Arc<OnceCell<ServiceInstance>>>>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry").finish_non_exhaustive()
    }
}

impl ServiceRegistry {
    /// Creates an empty registry with no seeded defaults.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for seeding default values before registration.
    pub fn builder() -> ServiceRegistryBuilder {
        ServiceRegistryBuilder::default()
    }

    // ─── Registration ────────────────────────────────────────────────────────

    /// Registers the sole initial factory for `key`.
    ///
    /// `deps` names the services resolved and handed to `factory` as a
    /// [`ResolvedServices`] mapping.  Returns
    /// [`RegistryError::DuplicateFactory`] if `key` already has an initial
    /// producer, regardless of registration order.
    pub fn add_factory<F, Fut>(
        &self,
        key: impl Into<String>,
        deps: &[&str],
        factory: F,
    ) -> RegistryResult<()>
    where
        F: Fn(ResolvedServices) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ServiceInstance>> + Send + 'static,
    {
        let build: FactoryFn = Arc::new(move |resolved| Box::pin(factory(resolved)));
        self.install_producer(
            key.into(),
            Producer::Factory {
                deps: own_deps(deps),
                build,
            },
        )
    }

    /// Registers a pre-built value for `key` — equivalent to a
    /// zero-dependency factory returning a constant.
    pub fn add_instance<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        value: T,
    ) -> RegistryResult<()> {
        self.install_producer(key.into(), Producer::Instance(into_instance(value)))
    }

    /// Appends a composer for `key`.
    ///
    /// Composers run after the initial producer (or the seeded default), in
    /// registration order, each receiving the previous value.  Registering a
    /// composer for a key with no producer is not an error here; absence of
    /// any producer or seed surfaces at resolution time as
    /// [`RegistryError::MissingProducer`].
    pub fn compose_factory<F, Fut>(&self, key: impl Into<String>, deps: &[&str], transform: F)
    where
        F: Fn(ResolvedServices, ServiceInstance) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ServiceInstance>> + Send + 'static,
    {
        let key = key.into();
        let apply: ComposerFn = Arc::new(move |resolved, current| Box::pin(transform(resolved, current)));
        let mut slots = self.slots.write();
        let slot = slots.entry(key.clone()).or_default();
        slot.composers.push(Composer {
            deps: own_deps(deps),
            apply,
        });
        trace!(key = %key, position = slot.composers.len(), "Registered composer");
    }

    fn install_producer(&self, key: String, producer: Producer) -> RegistryResult<()> {
        let mut slots = self.slots.write();
        let slot = slots.entry(key.clone()).or_default();
        if slot.producer.is_some() {
            return Err(RegistryError::DuplicateFactory(key));
        }
        slot.producer = Some(producer);
        trace!(key = %key, "Registered initial producer");
        Ok(())
    }

    /// Returns `true` when `key` has an initial producer or seeded default.
    pub fn is_registered(&self, key: &str) -> bool {
        self.slots
            .read()
            .get(key)
            .is_some_and(|slot| slot.producer.is_some() || slot.seed.is_some())
    }

    /// Returns the keys that currently have a producer or seed, unordered.
    pub fn registered_keys(&self) -> Vec<String> {
        self.slots
            .read()
            .iter()
            .filter(|(_, slot)| slot.producer.is_some() || slot.seed.is_some())
            .map(|(key, _)| key.clone())
            .collect()
    }

    // ─── Resolution ──────────────────────────────────────────────────────────

    /// Resolves `key`, constructing it (and its full dependency chain) on
    /// first access and returning the memoized instance thereafter.
    pub async fn resolve(&self, key: &str) -> RegistryResult<ServiceInstance> {
        self.resolve_on_path(key, &[]).await
    }

    /// Resolves `key` and downcasts the value to `T`.
    pub async fn resolve_as<T: Send + Sync + 'static>(&self, key: &str) -> RegistryResult<Arc<T>> {
        self.resolve(key)
            .await?
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                key: key.to_string(),
            })
    }

    fn cell_for(&self, key: &str) -> Arc<OnceCell<ServiceInstance>> {
        let mut cells = self.cells.lock();
        Arc::clone(cells.entry(key.to_string()).or_default())
    }

    /// Recursive resolution step.  `path` is the chain of keys currently
    /// in progress; encountering `key` on it again signals a cycle.
    fn resolve_on_path<'a>(
        &'a self,
        key: &'a str,
        path: &'a [String],
    ) -> BoxFuture<'a, RegistryResult<ServiceInstance>> {
        Box::pin(async move {
            if let Some(start) = path.iter().position(|seen| seen == key) {
                let mut cycle: Vec<String> = path[start..].to_vec();
                cycle.push(key.to_string());
                return Err(RegistryError::DependencyCycle(cycle));
            }

            let cell = self.cell_for(key);
            cell.get_or_try_init(|| self.construct(key, path))
                .await
                .cloned()
        })
    }

    /// Builds the final value for `key`: dependencies depth-first in declared
    /// order, then the initial producer, then the composer fold.
    async fn construct(&self, key: &str, path: &[String]) -> RegistryResult<ServiceInstance> {
        debug!(key = %key, "Resolving service");
        let plan = self.plan(key)?;

        let mut chain: Vec<String> = path.to_vec();
        chain.push(key.to_string());

        let mut value = match plan.initial {
            InitialPlan::Instance(instance) => instance,
            InitialPlan::Seed(seed) => seed,
            InitialPlan::Factory { deps, build } => {
                let resolved = self.resolve_deps(&deps, &chain).await?;
                build(resolved)
                    .await
                    .map_err(|source| RegistryError::Factory {
                        key: key.to_string(),
                        source,
                    })?
            }
        };

        for (deps, apply) in plan.composers {
            let resolved = self.resolve_deps(&deps, &chain).await?;
            value = apply(resolved, value)
                .await
                .map_err(|source| RegistryError::Composer {
                    key: key.to_string(),
                    source,
                })?;
        }

        trace!(key = %key, "Service resolved");
        Ok(value)
    }

    async fn resolve_deps(
        &self,
        deps: &[String],
        chain: &[String],
    ) -> RegistryResult<ResolvedServices> {
        let mut resolved = HashMap::with_capacity(deps.len());
        for dep in deps {
            let value = self.resolve_on_path(dep, chain).await?;
            resolved.insert(dep.clone(), value);
        }
        Ok(ResolvedServices::new(resolved))
    }

    /// Snapshots the registration state for `key` so the slot lock is not
    /// held across any await point.
    fn plan(&self, key: &str) -> RegistryResult<ResolvePlan> {
        let slots = self.slots.read();
        let Some(slot) = slots.get(key) else {
            return Err(RegistryError::MissingProducer(key.to_string()));
        };

        let initial = match (&slot.producer, &slot.seed) {
            (Some(Producer::Factory { deps, build }), _) => InitialPlan::Factory {
                deps: deps.clone(),
                build: Arc::clone(build),
            },
            (Some(Producer::Instance(instance)), _) => InitialPlan::Instance(Arc::clone(instance)),
            (None, Some(seed)) => InitialPlan::Seed(Arc::clone(seed)),
            (None, None) => return Err(RegistryError::MissingProducer(key.to_string())),
        };

        let composers = slot
            .composers
            .iter()
            .map(|composer| (composer.deps.clone(), Arc::clone(&composer.apply)))
            .collect();

        Ok(ResolvePlan { initial, composers })
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ServiceRegistryBuilder
// =============================================================================

/// Builder that seeds default values before the registry is used.
///
/// Seeds are the initial value for keys that only composers target — e.g. an
/// empty middleware collection that plugins append to.  A later
/// `add_factory` for a seeded key takes precedence over the seed.
#[derive(Default)]
pub struct ServiceRegistryBuilder {
    seeds: HashMap<String, ServiceInstance>,
}

impl ServiceRegistryBuilder {
    /// Seeds `key` with a default value.
    pub fn seed<T: Send + Sync + 'static>(mut self, key: impl Into<String>, value: T) -> Self {
        self.seeds.insert(key.into(), into_instance(value));
        self
    }

    /// Builds the registry with the collected seeds in place.
    pub fn build(self) -> ServiceRegistry {
        let slots = self
            .seeds
            .into_iter()
            .map(|(key, seed)| {
                (
                    key,
                    ServiceSlot {
                        seed: Some(seed),
                        ..Default::default()
                    },
                )
            })
            .collect();

        ServiceRegistry {
            slots: RwLock::new(slots),
            cells: Mutex::new(HashMap::new()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn factory_receives_declared_dependencies() {
        let registry = ServiceRegistry::new();
        registry.add_instance("base", 21usize).unwrap();
        registry
            .add_factory("doubled", &["base"], |deps| async move {
                let base = deps.require::<usize>("base")?;
                Ok(into_instance(*base * 2))
            })
            .unwrap();

        let doubled = registry.resolve_as::<usize>("doubled").await.unwrap();
        assert_eq!(*doubled, 42);
    }

    #[tokio::test]
    async fn composers_fold_in_registration_order_over_the_seed() {
        let registry = ServiceRegistry::builder()
            .seed("greeting", "base".to_string())
            .build();

        registry.compose_factory("greeting", &[], |_, current| async move {
            let current = current.downcast::<String>().expect("string value");
            Ok(into_instance(format!("{current}+c1")))
        });
        registry.compose_factory("greeting", &[], |_, current| async move {
            let current = current.downcast::<String>().expect("string value");
            Ok(into_instance(format!("{current}+c2")))
        });

        let value = registry.resolve_as::<String>("greeting").await.unwrap();
        assert_eq!(*value, "base+c1+c2");
    }

    #[tokio::test]
    async fn composers_also_apply_over_an_initial_factory() {
        let registry = ServiceRegistry::new();
        registry
            .add_factory("list", &[], |_| async move {
                Ok(into_instance(vec!["factory".to_string()]))
            })
            .unwrap();
        registry.compose_factory("list", &[], |_, current| async move {
            let current = current.downcast::<Vec<String>>().expect("vec value");
            let mut next = current.as_ref().clone();
            next.push("composer".to_string());
            Ok(into_instance(next))
        });

        let list = registry.resolve_as::<Vec<String>>("list").await.unwrap();
        assert_eq!(*list, vec!["factory".to_string(), "composer".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_initial_factory_is_rejected() {
        let registry = ServiceRegistry::new();
        registry
            .add_factory("svc", &[], |_| async { Ok(into_instance(1usize)) })
            .unwrap();

        let again = registry.add_factory("svc", &[], |_| async { Ok(into_instance(2usize)) });
        assert!(matches!(again, Err(RegistryError::DuplicateFactory(key)) if key == "svc"));

        // An instance counts as an initial producer too, in either order.
        let registry = ServiceRegistry::new();
        registry.add_instance("svc", 1usize).unwrap();
        let again = registry.add_factory("svc", &[], |_| async { Ok(into_instance(2usize)) });
        assert!(matches!(again, Err(RegistryError::DuplicateFactory(_))));
    }

    #[tokio::test]
    async fn resolve_memoizes_and_never_rebuilds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ServiceRegistry::new();
        let counter = Arc::clone(&calls);
        registry
            .add_factory("svc", &[], move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(into_instance("built".to_string()))
                }
            })
            .unwrap();

        let first = registry.resolve("svc").await.unwrap();
        let second = registry.resolve("svc").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn factory_errors_propagate_unmemoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ServiceRegistry::new();
        let counter = Arc::clone(&calls);
        registry
            .add_factory("flaky", &[], move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("backend unavailable");
                    }
                    Ok(into_instance("recovered".to_string()))
                }
            })
            .unwrap();

        let first = registry.resolve("flaky").await;
        assert!(matches!(first, Err(RegistryError::Factory { key, .. }) if key == "flaky"));

        let second = registry.resolve_as::<String>("flaky").await.unwrap();
        assert_eq!(*second, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dependency_cycle_is_detected_not_recursed() {
        let registry = ServiceRegistry::new();
        registry
            .add_factory("a", &["b"], |_| async { Ok(into_instance(0usize)) })
            .unwrap();
        registry
            .add_factory("b", &["a"], |_| async { Ok(into_instance(0usize)) })
            .unwrap();

        let err = registry.resolve("a").await.unwrap_err();
        match err {
            RegistryError::DependencyCycle(path) => {
                assert!(path.contains(&"a".to_string()));
                assert!(path.contains(&"b".to_string()));
            }
            other => panic!("expected cycle error, got {other}"),
        }
    }

    #[tokio::test]
    async fn self_dependency_is_a_cycle() {
        let registry = ServiceRegistry::new();
        registry
            .add_factory("narcissus", &["narcissus"], |_| async {
                Ok(into_instance(0usize))
            })
            .unwrap();

        assert!(matches!(
            registry.resolve("narcissus").await,
            Err(RegistryError::DependencyCycle(_))
        ));
    }

    #[tokio::test]
    async fn missing_producer_is_fatal() {
        let registry = ServiceRegistry::new();
        assert!(matches!(
            registry.resolve("ghost").await,
            Err(RegistryError::MissingProducer(key)) if key == "ghost"
        ));

        // A composer alone, with no seed, does not make a producer.
        registry.compose_factory("ghost", &[], |_, current| async move { Ok(current) });
        assert!(matches!(
            registry.resolve("ghost").await,
            Err(RegistryError::MissingProducer(_))
        ));
    }

    #[tokio::test]
    async fn resolve_as_reports_type_mismatch() {
        let registry = ServiceRegistry::new();
        registry.add_instance("svc", 1usize).unwrap();
        assert!(matches!(
            registry.resolve_as::<String>("svc").await,
            Err(RegistryError::TypeMismatch { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolves_are_single_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(ServiceRegistry::new());
        let counter = Arc::clone(&calls);
        registry
            .add_factory("slow", &[], move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(into_instance("ready".to_string()))
                }
            })
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.resolve("slow").await.unwrap()
            }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for value in &values[1..] {
            assert!(Arc::ptr_eq(&values[0], value));
        }
    }

    #[tokio::test]
    async fn shared_dependencies_resolve_once_across_consumers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ServiceRegistry::new();
        let counter = Arc::clone(&calls);
        registry
            .add_factory("shared", &[], move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(into_instance(1usize))
                }
            })
            .unwrap();
        registry
            .add_factory("left", &["shared"], |_| async { Ok(into_instance(2usize)) })
            .unwrap();
        registry
            .add_factory("right", &["shared"], |_| async { Ok(into_instance(3usize)) })
            .unwrap();

        registry.resolve("left").await.unwrap();
        registry.resolve("right").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn composer_dependencies_are_resolved_too() {
        let registry = ServiceRegistry::builder()
            .seed("sum", 0usize)
            .build();
        registry.add_instance("increment", 5usize).unwrap();
        registry.compose_factory("sum", &["increment"], |deps, current| async move {
            let increment = deps.require::<usize>("increment")?;
            let current = current.downcast::<usize>().expect("usize value");
            Ok(into_instance(*current + *increment))
        });

        let sum = registry.resolve_as::<usize>("sum").await.unwrap();
        assert_eq!(*sum, 5);
    }
}
