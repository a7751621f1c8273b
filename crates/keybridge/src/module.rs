//! The `EncryptionUtils` host module
//!
//! [`EncryptionBridge`] is the surface a host application talks to:
//!
//! - Keystore commands (`init_keystore`, `re_encrypt_db_and_keystore`,
//!   `convert_to_keycard_account`) return immediately and report exactly
//!   once through the supplied [`CallbackSlot`].
//! - Codec helpers are synchronous passthroughs to the [`CodecEngine`].
//! - `set_blank_preview_flag` persists the secure-display flag and applies
//!   it to the active UI surface.

use crate::display::SecureDisplayController;
use keybridge_core::effects::{CodecEngine, KeystoreEngine};
use keybridge_core::{
    BridgeError, ErrorPayload, KeyIdentifier, KeycardConversionRequest, KeystorePaths, Password,
    PasswordChangeRequest, Result,
};
use keybridge_effects::{interpret_engine_response, CallbackSlot, CommandDispatcher, KeystoreCommand};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

/// Name under which the module registers with the host
pub const MODULE_NAME: &str = "EncryptionUtils";

/// Host-facing encryption module
pub struct EncryptionBridge {
    paths: KeystorePaths,
    engine: Arc<dyn KeystoreEngine>,
    codec: Arc<dyn CodecEngine>,
    dispatcher: CommandDispatcher,
    display: SecureDisplayController,
    _runtime: Option<OwnedRuntime>,
}

impl EncryptionBridge {
    pub(crate) fn from_parts(
        paths: KeystorePaths,
        engine: Arc<dyn KeystoreEngine>,
        codec: Arc<dyn CodecEngine>,
        dispatcher: CommandDispatcher,
        display: SecureDisplayController,
        runtime: Option<Runtime>,
    ) -> Self {
        Self {
            paths,
            engine,
            codec,
            dispatcher,
            display,
            _runtime: runtime.map(|rt| OwnedRuntime(Some(rt))),
        }
    }

    /// Module name exposed to the host
    pub fn name(&self) -> &'static str {
        MODULE_NAME
    }

    /// Keystore layout under the no-backup root
    pub fn paths(&self) -> &KeystorePaths {
        &self.paths
    }

    /// Dispatcher running keystore commands
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Secure display controller
    pub fn display(&self) -> &SecureDisplayController {
        &self.display
    }

    /// Prepare the keystore directory of `key_uid`
    ///
    /// Succeeds with the engine's raw response.
    pub fn init_keystore(&self, key_uid: &str, callback: CallbackSlot) {
        let engine = self.engine.clone();
        let paths = self.paths.clone();
        self.dispatch("init_keystore", key_uid, callback, move |key_uid| {
            let dir = paths.keystore_dir(&key_uid);
            KeystoreCommand::new("init_keystore", move || engine.init_keystore(&dir))
                .for_key(key_uid)
        });
    }

    /// Re-encrypt the database and keystore of `key_uid` under `new_password`
    pub fn re_encrypt_db_and_keystore(
        &self,
        key_uid: &str,
        current_password: Password,
        new_password: Password,
        callback: CallbackSlot,
    ) {
        let engine = self.engine.clone();
        self.dispatch("re_encrypt_db_and_keystore", key_uid, callback, move |key_uid| {
            let request = PasswordChangeRequest {
                key_uid: key_uid.clone(),
                current_password,
                new_password,
            };
            KeystoreCommand::new("re_encrypt_db_and_keystore", move || {
                engine.change_database_password(
                    &request.key_uid,
                    &request.current_password,
                    &request.new_password,
                )
            })
            .for_key(key_uid)
        });
    }

    /// Move the accounts of `key_uid` onto the keycard `keycard_uid`
    ///
    /// Initializes the keystore first; an initialization fault is reported
    /// as the command's outcome and the conversion never runs.
    pub fn convert_to_keycard_account(
        &self,
        key_uid: &str,
        account_data: String,
        options: String,
        keycard_uid: String,
        current_password: Password,
        new_password: Password,
        callback: CallbackSlot,
    ) {
        let engine = self.engine.clone();
        let paths = self.paths.clone();
        self.dispatch("convert_to_keycard_account", key_uid, callback, move |key_uid| {
            let dir = paths.keystore_dir(&key_uid);
            let request = KeycardConversionRequest {
                key_uid: key_uid.clone(),
                account_data,
                options,
                keycard_uid,
                current_password,
                new_password,
            };
            KeystoreCommand::new("convert_to_keycard_account", move || {
                engine
                    .init_keystore(&dir)
                    .and_then(interpret_engine_response)
                    .and_then(|_| engine.convert_to_keycard_account(&request))
            })
            .for_key(key_uid)
        });
    }

    /// ABI-encode an ERC-20 `transfer(to, value)` call
    pub fn encode_transfer(&self, to: &str, value: &str) -> Result<String> {
        self.codec.encode_transfer(to, value)
    }

    /// ABI-encode a call to `method` with JSON-array `params_json`
    pub fn encode_function_call(&self, method: &str, params_json: &str) -> Result<String> {
        self.codec.encode_function_call(method, params_json)
    }

    /// Decode ABI parameters described by `decode_params_json`
    pub fn decode_parameters(&self, decode_params_json: &str) -> Result<String> {
        self.codec.decode_parameters(decode_params_json)
    }

    /// `0x`-prefixed hex quantity to decimal
    pub fn hex_to_number(&self, hex: &str) -> Result<String> {
        self.codec.hex_to_number(hex)
    }

    /// Decimal to `0x`-prefixed hex quantity
    pub fn number_to_hex(&self, number: &str) -> Result<String> {
        self.codec.number_to_hex(number)
    }

    /// Keccak-256 of the UTF-8 bytes of `input`
    pub fn sha3(&self, input: &str) -> Result<String> {
        self.codec.sha3(input)
    }

    /// Hex encoding of the UTF-8 bytes of `input`
    pub fn utf8_to_hex(&self, input: &str) -> Result<String> {
        self.codec.utf8_to_hex(input)
    }

    /// UTF-8 text encoded by `hex`
    pub fn hex_to_utf8(&self, hex: &str) -> Result<String> {
        self.codec.hex_to_utf8(hex)
    }

    /// Persist the blank-preview flag and apply it to the active surface
    ///
    /// The host expects no result; persistence failures are logged.
    pub fn set_blank_preview_flag(&self, enabled: bool) {
        if let Err(err) = self.display.set_blank_preview_flag(enabled) {
            warn!(enabled, error = %err, "failed to persist blank-preview flag");
        }
    }

    /// Re-apply the stored blank-preview flag, e.g. after a surface attaches
    pub fn apply_display_protection(&self) {
        self.display.apply_display_protection();
    }

    fn dispatch<F>(&self, operation: &'static str, key_uid: &str, callback: CallbackSlot, build: F)
    where
        F: FnOnce(KeyIdentifier) -> KeystoreCommand,
    {
        match KeyIdentifier::parse(key_uid) {
            Ok(key_uid) => self.dispatcher.execute(build(key_uid), callback),
            Err(err) => reject(operation, err, callback),
        }
    }
}

fn reject(operation: &'static str, err: BridgeError, callback: CallbackSlot) {
    debug!(operation, error = %err, "rejecting keystore command");
    callback.fail(ErrorPayload::from(err));
}

impl fmt::Debug for EncryptionBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionBridge")
            .field("name", &MODULE_NAME)
            .field("paths", &self.paths)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Runtime created by the builder; shut down without blocking on drop
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}
