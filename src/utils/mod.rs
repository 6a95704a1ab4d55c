pub mod build_info;

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVES: [&str; 2] = ["vision_wallet=info", "wallet_core=warn"];

/// Installs the global `tracing` subscriber once.
///
/// Filtering starts from `RUST_LOG`, then adds the crate defaults and, when
/// given, the directive from the user's config. Unparseable directives are
/// reported and skipped.
pub fn init_tracing(extra_directive: Option<&str>) {
    TRACING_INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        for raw in DEFAULT_DIRECTIVES.into_iter().chain(extra_directive) {
            match raw.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(err) => eprintln!("ignoring log directive `{raw}`: {err}"),
            }
        }
        // Logs go to stderr so stdout stays clean for machine-readable output.
        // A host application may already have installed a subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
