//! Common type aliases shared across the crate.
//!
//! Users are keyed internally by UUID but externally by email address (the
//! identity the upstream sign-in provider hands us). Generation records carry
//! two identifiers: the storage-side serial `GenerationId` used for ordering,
//! and the client-generated `uid` string used for correlation across the
//! upload, inference, and persistence steps.

use uuid::Uuid;

pub type UserId = Uuid;
pub type GenerationId = i64;

/// Abbreviate a UUID to its first 8 characters for log lines and object keys.
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbrev_takes_first_block() {
        let uuid: Uuid = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(abbrev_uuid(&uuid), "550e8400");
    }
}
