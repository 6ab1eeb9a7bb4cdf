//! Subscriber installation for binaries and tests that want to see the
//! analysis trace.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a global subscriber, once.
///
/// Does nothing unless `RUST_LOG` is set, so library users keep control of
/// their own subscriber. `EMERGE_LOG_TREE=1` renders spans as an indented
/// tree, which reads better for the nested phase and unification spans.
///
/// ```text
/// RUST_LOG=emerge_sema=debug EMERGE_LOG_TREE=1 cargo test -p emerge_sema
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let tree = std::env::var("EMERGE_LOG_TREE").is_ok_and(|v| v == "1");
        let result = if tree {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init()
        };
        if result.is_err() {
            tracing::debug!("a global subscriber was already installed");
        }
    });
}
