//! Tracing output for tests.
//!
//! Set `RUST_LOG` (for example `RUST_LOG=colony_core=debug`) to see the
//! simulation's log lines under `cargo test -- --nocapture`.

use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Install a global subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
/// Defaults to `warn` when `RUST_LOG` is unset.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        // Another harness may have installed a subscriber already.
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .with(filter)
            .try_init();
    });
}
