// Identifier and settings-path helpers

use uuid::Uuid;

use crate::error::BootstrapError;

/// Validate a GUID and return it in canonical lowercase hyphenated form.
///
/// Alert profile GUIDs are stored lowercase, so lookups normalize before
/// matching.
pub fn normalize_guid(guid: &str) -> Result<String, BootstrapError> {
    Uuid::parse_str(guid.trim())
        .map(|u| u.hyphenated().to_string())
        .map_err(|_| BootstrapError::InvalidGuid(guid.to_string()))
}

/// Convert a dotted settings path (`server.role`) into the key format used by
/// persisted settings changes (`/server/role`).
pub fn settings_key(dotted: &str) -> String {
    let mut key = String::with_capacity(dotted.len() + 1);
    for segment in dotted.split('.').filter(|s| !s.is_empty()) {
        key.push('/');
        key.push_str(segment);
    }
    key
}

/// Split a persisted settings key (`/server/role`) back into path segments.
pub fn settings_path(key: &str) -> Vec<&str> {
    key.split('/').filter(|s| !s.is_empty()).collect()
}
