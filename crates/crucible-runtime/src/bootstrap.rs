//! The composition root.
//!
//! [`build_runtime`] turns a loaded [`Configuration`] into a fully
//! registered — but entirely unresolved — [`ServiceRegistry`]:
//!
//! 1. Inject bootstrap-computed settings into the override layer.
//! 2. Seed the composer-only keys (component metadata, custom adapters, the
//!    empty middleware collection).
//! 3. Register every baseline factory with its declared dependencies.
//! 4. Register feature-toggle composers onto the middleware collection.
//! 5. Apply configured plugins, in order, through the supplied loader.
//!
//! Nothing is constructed here; the first `resolve` call builds whatever
//! chain the consumer actually needs.  Every fatal condition — structural
//! registry errors, missing mandatory settings, plugin contract violations —
//! surfaces as a [`BootstrapError`] before the host starts serving.

use std::sync::Arc;

use crucible_core::{ServiceRegistry, Shared, into_instance};
use tracing::{debug, info};

use crate::config::{ConfigView, Configuration};
use crate::error::{BootstrapError, BootstrapResult};
use crate::logging;
use crate::plugin::{PluginLoader, apply_plugins};
use crate::services::keys;
use crate::services::{
    Adapter, Bot, ComponentDefinitions, ConversationState, CustomAdapters, EchoBot, FileStorage,
    FileStorageSettings, InspectionMiddleware, MemoryStorage, MiddlewareSet, NoopTelemetry,
    ShowTypingMiddleware, SkillConversationIdFactory, Storage, StorageTranscriptStore, Telemetry,
    TracingTelemetry, TranscriptLoggerMiddleware, UserState,
};

/// Default file name of the root dialog artifact, injected when the
/// configuration does not name one.
const DEFAULT_ROOT_DIALOG: &str = "main.dialog";

/// Builds the service graph for one composition run.
///
/// Returns the registry with every baseline and plugin registration in
/// place and nothing resolved yet.
pub async fn build_runtime(
    config: &Configuration,
    loader: &dyn PluginLoader,
) -> BootstrapResult<Arc<ServiceRegistry>> {
    let root = config.view();
    logging::init_from_view(&root);
    inject_computed_settings(&root);

    let registry = Arc::new(
        ServiceRegistry::builder()
            .seed(keys::COMPONENT_DEFINITIONS, ComponentDefinitions::default())
            .seed(keys::CUSTOM_ADAPTERS, CustomAdapters::default())
            .seed(keys::MIDDLEWARES, MiddlewareSet::new())
            .build(),
    );

    register_storage(&registry, &root)?;
    register_telemetry(&registry, &root)?;
    register_state(&registry)?;
    register_feature_middlewares(&registry, &root);
    register_adapter_and_bot(&registry)?;

    apply_plugins(&registry, &root, loader).await?;

    info!(
        services = registry.registered_keys().len(),
        "Runtime services registered"
    );
    Ok(registry)
}

/// Writes values computed by the bootstrap itself into the override layer,
/// without clobbering anything the operator configured.
fn inject_computed_settings(root: &ConfigView) {
    if root.get("runtime.application_root").is_none() {
        let application_root = std::env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|_| ".".to_string());
        root.set("runtime.application_root", application_root);
    }
    if root.get("runtime.root_dialog").is_none() {
        root.set("runtime.root_dialog", DEFAULT_ROOT_DIALOG);
    }
}

fn register_storage(registry: &ServiceRegistry, root: &ConfigView) -> BootstrapResult<()> {
    let backend = root
        .get_typed::<String>("runtime.storage")
        .unwrap_or_else(|| "memory".to_string());

    match backend.as_str() {
        "memory" => {
            registry.add_factory(keys::STORAGE, &[], |_| async {
                let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
                Ok(into_instance(Shared::new(storage)))
            })?;
        }
        "file" => {
            // Mandatory for this backend; fails the bootstrap before any
            // service can be resolved against a half-configured store.
            let settings: FileStorageSettings = root.require_typed("runtime.file_storage")?;
            registry.add_factory(keys::STORAGE, &[], move |_| {
                let settings = settings.clone();
                async move {
                    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&settings));
                    Ok(into_instance(Shared::new(storage)))
                }
            })?;
        }
        other => {
            return Err(BootstrapError::UnknownBackend {
                slot: "storage",
                value: other.to_string(),
            });
        }
    }

    debug!(backend = %backend, "Storage factory registered");
    Ok(())
}

fn register_telemetry(registry: &ServiceRegistry, root: &ConfigView) -> BootstrapResult<()> {
    let backend = root
        .get_typed::<String>("runtime.telemetry")
        .unwrap_or_else(|| "noop".to_string());

    match backend.as_str() {
        "noop" => {
            registry.add_factory(keys::TELEMETRY, &[], |_| async {
                let telemetry: Arc<dyn Telemetry> = Arc::new(NoopTelemetry);
                Ok(into_instance(Shared::new(telemetry)))
            })?;
        }
        "tracing" => {
            registry.add_factory(keys::TELEMETRY, &[], |_| async {
                let telemetry: Arc<dyn Telemetry> = Arc::new(TracingTelemetry);
                Ok(into_instance(Shared::new(telemetry)))
            })?;
        }
        other => {
            return Err(BootstrapError::UnknownBackend {
                slot: "telemetry",
                value: other.to_string(),
            });
        }
    }

    debug!(backend = %backend, "Telemetry factory registered");
    Ok(())
}

fn register_state(registry: &ServiceRegistry) -> BootstrapResult<()> {
    registry.add_factory(keys::USER_STATE, &[keys::STORAGE], |deps| async move {
        let storage = deps.require::<Shared<dyn Storage>>(keys::STORAGE)?;
        Ok(into_instance(UserState::new(storage.inner())))
    })?;

    registry.add_factory(
        keys::CONVERSATION_STATE,
        &[keys::STORAGE],
        |deps| async move {
            let storage = deps.require::<Shared<dyn Storage>>(keys::STORAGE)?;
            Ok(into_instance(ConversationState::new(storage.inner())))
        },
    )?;

    registry.add_factory(
        keys::SKILL_CONVERSATION_IDS,
        &[keys::STORAGE],
        |deps| async move {
            let storage = deps.require::<Shared<dyn Storage>>(keys::STORAGE)?;
            Ok(into_instance(SkillConversationIdFactory::new(
                storage.inner(),
            )))
        },
    )?;

    Ok(())
}

/// Feature toggles become composers on the shared middleware collection.
/// Each contributor appends without knowing about the others; the chain
/// order is the registration order below, then plugin order.
fn register_feature_middlewares(registry: &ServiceRegistry, root: &ConfigView) {
    if root.get_typed("feature.show_typing").unwrap_or(false) {
        registry.compose_factory(keys::MIDDLEWARES, &[], |_, current| async move {
            Ok(into_instance(
                MiddlewareSet::from_instance(current)?.with(ShowTypingMiddleware),
            ))
        });
        debug!("Enabled show-typing middleware");
    }

    if root.get_typed("feature.trace_transcript").unwrap_or(false) {
        registry.compose_factory(
            keys::MIDDLEWARES,
            &[keys::STORAGE],
            |deps, current| async move {
                let storage = deps.require::<Shared<dyn Storage>>(keys::STORAGE)?;
                let store = Arc::new(StorageTranscriptStore::new(storage.inner()));
                Ok(into_instance(
                    MiddlewareSet::from_instance(current)?
                        .with(TranscriptLoggerMiddleware::new(store)),
                ))
            },
        );
        debug!("Enabled transcript-logger middleware");
    }

    if root.get_typed("feature.use_inspection").unwrap_or(false) {
        registry.compose_factory(
            keys::MIDDLEWARES,
            &[keys::TELEMETRY],
            |deps, current| async move {
                let telemetry = deps.require::<Shared<dyn Telemetry>>(keys::TELEMETRY)?;
                Ok(into_instance(
                    MiddlewareSet::from_instance(current)?
                        .with(InspectionMiddleware::new(telemetry.inner())),
                ))
            },
        );
        debug!("Enabled inspection middleware");
    }
}

fn register_adapter_and_bot(registry: &ServiceRegistry) -> BootstrapResult<()> {
    registry.add_factory(
        keys::ADAPTER,
        &[keys::MIDDLEWARES, keys::CUSTOM_ADAPTERS],
        |deps| async move {
            let middleware = deps.require::<MiddlewareSet>(keys::MIDDLEWARES)?;
            let custom = deps.require::<CustomAdapters>(keys::CUSTOM_ADAPTERS)?;
            if !custom.is_empty() {
                debug!(adapters = ?custom.names(), "Custom adapters available");
            }
            Ok(into_instance(Adapter::new(
                middleware.as_ref().clone(),
                custom.as_ref().clone(),
            )))
        },
    )?;

    registry.add_factory(keys::BOT, &[keys::CONVERSATION_STATE], |deps| async move {
        let state = deps.require::<ConversationState>(keys::CONVERSATION_STATE)?;
        let bot: Arc<dyn Bot> = Arc::new(EchoBot::new(state));
        Ok(into_instance(Shared::new(bot)))
    })?;

    Ok(())
}
