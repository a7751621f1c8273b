//! Keybridge Testkit: shared test doubles
//!
//! Stub engines, recording UI surfaces and instrumented callback slots used
//! by the integration tests of every keybridge crate.

pub mod callbacks;
pub mod display;
pub mod engines;

pub use callbacks::{counting_slot, CallbackWatch};
pub use display::{RecordingSurface, SurfaceMutation, SwitchableSurfaceProvider};
pub use engines::{EngineCall, Gate, Scripted, StubKeystoreEngine, ENGINE_OK};

use once_cell::sync::OnceCell;

static TRACING: OnceCell<()> = OnceCell::new();

/// Install a test-writer tracing subscriber once per process
pub fn init_test_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("keybridge=debug,keybridge_effects=debug")
            .with_test_writer()
            .try_init();
    });
}
