//! Echo Host Example
//!
//! A minimal host composed entirely through the Crucible bootstrap kernel:
//! configuration is loaded from the command line, environment, and
//! `crucible.json` (if present); baseline services are registered as lazy
//! factories; and a small "shout" plugin — linked into this binary and
//! discovered through the plugin registry — composes an extra middleware
//! onto the shared chain.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-host -- --feature.show_typing=true
//! CRUCIBLE_FEATURE__SHOW_TYPING=true cargo run --package echo-host
//! ```
//!
//! Any fatal bootstrap error (bad backend selection, plugin contract
//! violation, dependency cycle) exits non-zero with a diagnostic naming the
//! offending key or plugin.

use std::process::ExitCode;
use std::sync::Arc;

use async_trait::async_trait;
use crucible::prelude::*;
use linkme::distributed_slice;
use tracing::info;

// ============================================================================
// The "shout" plugin
// ============================================================================

/// Uppercases incoming message text before the bot sees it.
struct ShoutMiddleware;

#[async_trait]
impl Middleware for ShoutMiddleware {
    fn name(&self) -> &'static str {
        "shout"
    }

    async fn on_turn(&self, turn: &mut TurnContext) -> anyhow::Result<()> {
        if let Some(text) = turn.activity.text.take() {
            turn.activity.text = Some(text.to_uppercase());
        }
        Ok(())
    }
}

fn shout_entry(registry: Arc<ServiceRegistry>, config: ConfigView) -> ExtensionFuture {
    Box::pin(async move {
        // The plugin reads only its own configuration sub-tree.
        if !config.get_typed("enabled").unwrap_or(true) {
            return Ok(());
        }
        registry.compose_factory(keys::MIDDLEWARES, &[], |_, current| async move {
            Ok(into_instance(
                MiddlewareSet::from_instance(current)?.with(ShoutMiddleware),
            ))
        });
        Ok(())
    })
}

#[distributed_slice(PLUGIN_REGISTRY)]
static SHOUT_PLUGIN: PluginRegistration = PluginRegistration {
    name: "shout",
    entry: shout_entry,
};

// ============================================================================
// Host
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("bootstrap failed: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_current_dir()
        .args(std::env::args().skip(1))
        .load()?;

    // Enable the linked demo plugin unless the operator configured a list.
    let root = config.view();
    if root.get("plugins").is_none() {
        root.set("plugins", serde_json::json!([{ "name": "shout" }]));
    }

    let registry = build_runtime(&config, &LinkedPluginLoader).await?;

    let adapter = registry.resolve_as::<Adapter>(keys::ADAPTER).await?;
    let bot = registry.resolve_as::<Shared<dyn Bot>>(keys::BOT).await?;
    info!(
        middlewares = ?adapter.middleware().names(),
        "Host composed"
    );

    for line in ["hello crucible", "compose all the things"] {
        let responses = adapter
            .process_activity(
                Activity::message(line).in_conversation("demo"),
                bot.0.as_ref(),
            )
            .await?;
        for activity in responses {
            println!("[{}] {}", activity.kind, activity.text.unwrap_or_default());
        }
    }

    Ok(())
}
