use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

// Tracks whether a global subscriber was already installed by [`init_tracing`].
//
// Installing a global subscriber twice fails, and while `init_tracing` is not called
// multiple times during normal operations, it is called multiple times during tests,
// so this guard is essential.
static TRACING_INITIALIZED: Mutex<bool> = Mutex::new(false);

/// Default filter directive applied when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Initializes the global tracing subscriber for the given service.
///
/// The filter is taken from the `RUST_LOG` environment variable, falling back to
/// `info`. Repeated calls are no-ops, which keeps the function safe to use from
/// every test in a test binary.
pub fn init_tracing(service_name: &str) {
    let mut initialized = TRACING_INITIALIZED.lock().unwrap();
    if *initialized {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    *initialized = true;

    tracing::info!(service_name, "tracing initialized");
}
