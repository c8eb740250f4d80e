//! Keyset fixtures and test set-up helpers.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

use keyweave_core::{
    Key, KeyData, KeyId, KeyStatus, Keyset, KeysetError, OutputPrefixType, Registry,
    config::{self, RegistryConfig},
};
use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, fmt, fmt::MakeWriter, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::SeededEnv;

/// One key with explicit metadata.
pub fn key(
    key_id: KeyId,
    status: KeyStatus,
    output_prefix_type: OutputPrefixType,
    key_data: KeyData,
) -> Key {
    Key { key_data, key_id, status, output_prefix_type }
}

/// Keyset with `primary_key_id` over `keys`, unvalidated.
pub fn keyset(primary_key_id: KeyId, keys: Vec<Key>) -> Keyset {
    Keyset { primary_key_id, keys }
}

/// Fresh registry holding every built-in manager, drawing randomness from a
/// seeded environment.
pub fn registry_with_builtins(seed: u64) -> Result<Registry, KeysetError> {
    let registry = Registry::new();
    config::register(&registry, &RegistryConfig::default(), SeededEnv::with_seed(seed))?;
    Ok(registry)
}

/// Install a test subscriber honouring `RUST_LOG`. Safe to call from every
/// test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
}

/// Run `f` with a thread-local `debug` subscriber and return its result and
/// the formatted log lines it emitted.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = fmt()
        .with_writer(logs.clone())
        .with_max_level(LevelFilter::DEBUG)
        .with_ansi(false)
        .finish();

    let result = {
        let _guard = subscriber.set_default();
        f()
    };

    let bytes = logs.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
    (result, String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
