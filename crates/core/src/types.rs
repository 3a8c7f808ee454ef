/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a new external identifier (32 lowercase hex chars, UUIDv4).
///
/// External identifiers are stable handles for re-import and matching; they
/// never change for the lifetime of the row they are assigned to.
pub fn new_external_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_is_32_hex_chars() {
        let id = new_external_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn external_ids_are_unique() {
        assert_ne!(new_external_id(), new_external_id());
    }
}
