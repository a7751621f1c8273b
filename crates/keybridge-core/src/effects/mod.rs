//! Effect interfaces consumed by the bridge
//!
//! Every external collaborator is reached through one of these traits:
//! the native keystore engine, the stateless codec functions, the
//! preference store and the host UI. Handlers live in `keybridge-effects`
//! and test doubles in `keybridge-testkit`.

pub mod codec;
pub mod display;
pub mod engine;
pub mod preferences;

pub use codec::CodecEngine;
pub use display::{DisplaySurface, SurfaceProvider, UiExecutor, UiTask};
pub use engine::KeystoreEngine;
pub use preferences::{PreferenceEffects, BLANK_PREVIEW_DEFAULT, BLANK_PREVIEW_KEY};
