//! Sequential plugin application against the live registry.

use std::sync::Arc;

use crucible_core::ServiceRegistry;
use tracing::{debug, info, warn};

use super::descriptor::PluginSetting;
use super::error::{PluginError, PluginResult};
use super::loader::{PluginLoad, PluginLoader};
use crate::config::ConfigView;

/// Configuration path of the ordered plugin list.
pub const PLUGINS_PATH: &str = "plugins";

/// Applies every configured plugin, in listed order, against `registry`.
///
/// Each plugin is invoked with a view bound to its settings prefix
/// (defaulting to the plugin name) and awaited to completion before the next
/// one runs — plugins never run concurrently, so composer ordering follows
/// the configured list exactly.
///
/// A plugin the loader cannot find is skipped with a warning; a unit with no
/// callable entry point, or a plugin whose extension function fails, aborts
/// with a [`PluginError`] naming it.
pub async fn apply_plugins(
    registry: &Arc<ServiceRegistry>,
    config: &ConfigView,
    loader: &dyn PluginLoader,
) -> PluginResult<()> {
    let settings: Vec<PluginSetting> = config.get_typed(PLUGINS_PATH).unwrap_or_default();
    if settings.is_empty() {
        debug!("No plugins configured");
        return Ok(());
    }

    for setting in settings {
        match loader.load(&setting.name) {
            PluginLoad::NotFound => {
                warn!(plugin = %setting.name, "Plugin not found - skipping");
            }
            PluginLoad::NoEntryPoint => {
                return Err(PluginError::MissingEntryPoint {
                    plugin: setting.name,
                });
            }
            PluginLoad::Loaded(entry) => {
                let view = config.bind(setting.prefix());
                entry(Arc::clone(registry), view)
                    .await
                    .map_err(|source| PluginError::Extension {
                        plugin: setting.name.clone(),
                        source,
                    })?;
                info!(plugin = %setting.name, "Plugin applied");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigSource, Configuration};
    use crate::plugin::descriptor::ExtensionFuture;
    use crate::plugin::loader::StaticPluginLoader;
    use crucible_core::into_instance;
    use serde_json::json;

    fn config_with(tree: serde_json::Value) -> Configuration {
        Configuration::new(vec![ConfigSource::from_values("test", tree)])
    }

    fn marker_entry(registry: Arc<ServiceRegistry>, config: ConfigView) -> ExtensionFuture {
        Box::pin(async move {
            let marker: String = config.get_typed("marker").unwrap_or_default();
            registry.add_instance("plugin-marker", marker)?;
            Ok(())
        })
    }

    fn append_a(registry: Arc<ServiceRegistry>, _config: ConfigView) -> ExtensionFuture {
        Box::pin(async move {
            registry.compose_factory("trace", &[], |_, current| async move {
                let current = current.downcast::<String>().expect("string value");
                Ok(into_instance(format!("{current}a")))
            });
            Ok(())
        })
    }

    fn append_b(registry: Arc<ServiceRegistry>, _config: ConfigView) -> ExtensionFuture {
        Box::pin(async move {
            registry.compose_factory("trace", &[], |_, current| async move {
                let current = current.downcast::<String>().expect("string value");
                Ok(into_instance(format!("{current}b")))
            });
            Ok(())
        })
    }

    fn failing_entry(_registry: Arc<ServiceRegistry>, _config: ConfigView) -> ExtensionFuture {
        Box::pin(async { anyhow::bail!("extension blew up") })
    }

    #[tokio::test]
    async fn missing_plugin_is_skipped_and_later_ones_still_apply() {
        let registry = Arc::new(ServiceRegistry::new());
        let config = config_with(json!({
            "plugins": [{"name": "not-installed"}, {"name": "valid"}],
            "valid": {"marker": "present"},
        }));
        let loader = StaticPluginLoader::new().with_plugin("valid", marker_entry);

        apply_plugins(&registry, &config.view(), &loader)
            .await
            .unwrap();

        let marker = registry.resolve_as::<String>("plugin-marker").await.unwrap();
        assert_eq!(*marker, "present");
    }

    #[tokio::test]
    async fn view_is_bound_to_the_settings_prefix_when_given() {
        let registry = Arc::new(ServiceRegistry::new());
        let config = config_with(json!({
            "plugins": [{"name": "valid", "settings_prefix": "custom.scope"}],
            "valid": {"marker": "wrong"},
            "custom": {"scope": {"marker": "right"}},
        }));
        let loader = StaticPluginLoader::new().with_plugin("valid", marker_entry);

        apply_plugins(&registry, &config.view(), &loader)
            .await
            .unwrap();

        let marker = registry.resolve_as::<String>("plugin-marker").await.unwrap();
        assert_eq!(*marker, "right");
    }

    #[tokio::test]
    async fn plugins_apply_in_listed_order() {
        let registry = Arc::new(
            ServiceRegistry::builder()
                .seed("trace", String::new())
                .build(),
        );
        let config = config_with(json!({
            "plugins": [{"name": "first"}, {"name": "second"}],
        }));
        let loader = StaticPluginLoader::new()
            .with_plugin("first", append_a)
            .with_plugin("second", append_b);

        apply_plugins(&registry, &config.view(), &loader)
            .await
            .unwrap();

        let trace = registry.resolve_as::<String>("trace").await.unwrap();
        assert_eq!(*trace, "ab");
    }

    #[tokio::test]
    async fn opaque_unit_is_a_fatal_contract_violation() {
        let registry = Arc::new(ServiceRegistry::new());
        let config = config_with(json!({"plugins": [{"name": "broken"}]}));
        let loader = StaticPluginLoader::new().with_opaque_unit("broken");

        let err = apply_plugins(&registry, &config.view(), &loader)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PluginError::MissingEntryPoint { plugin } if plugin == "broken"
        ));
    }

    #[tokio::test]
    async fn extension_failure_propagates_with_the_plugin_name() {
        let registry = Arc::new(ServiceRegistry::new());
        let config = config_with(json!({"plugins": [{"name": "faulty"}]}));
        let loader = StaticPluginLoader::new().with_plugin("faulty", failing_entry);

        let err = apply_plugins(&registry, &config.view(), &loader)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PluginError::Extension { plugin, .. } if plugin == "faulty"
        ));
    }

    #[tokio::test]
    async fn empty_or_absent_plugin_list_is_a_no_op() {
        let registry = Arc::new(ServiceRegistry::new());
        let config = config_with(json!({}));
        let loader = StaticPluginLoader::new();

        apply_plugins(&registry, &config.view(), &loader)
            .await
            .unwrap();
    }
}
