//! Native keystore engine capability

use crate::errors::Result;
use crate::types::{KeyIdentifier, KeycardConversionRequest, Password};
use std::path::Path;

/// Blocking capability exposed by the native cryptographic engine
///
/// Calls may block for an unbounded time (key derivation, database
/// re-encryption), so the bridge only reaches them from dispatcher workers.
/// A successful return is the engine's raw response string, which may
/// still encode an engine-level error; interpreting it is the dispatcher's
/// job.
pub trait KeystoreEngine: Send + Sync {
    /// Prepare the keystore directory at `keystore_dir`. Must be a no-op
    /// for an already initialized directory.
    fn init_keystore(&self, keystore_dir: &Path) -> Result<String>;

    /// Re-encrypt the database and keystore of `key_uid`
    fn change_database_password(
        &self,
        key_uid: &KeyIdentifier,
        current_password: &Password,
        new_password: &Password,
    ) -> Result<String>;

    /// Convert the accounts of an identity into keycard-backed accounts
    fn convert_to_keycard_account(&self, request: &KeycardConversionRequest) -> Result<String>;
}
