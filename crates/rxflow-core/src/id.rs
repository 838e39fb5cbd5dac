//! Identifier generation for workflow entities.

use time::OffsetDateTime;

/// Generates a fresh entity id (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generates a decoction order number: millisecond timestamp plus a random
/// suffix, so numbers sort roughly by creation time while staying unique
/// across concurrent dispatcher runs.
pub fn generate_order_number() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("DO{}{}", millis, &suffix[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_is_valid_uuid() {
        let id = generate_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        assert!(number.starts_with("DO"));
        // 2-char prefix + 13-digit millis + 6-char suffix
        assert_eq!(number.len(), 21);
    }

    #[test]
    fn test_order_numbers_unique() {
        let numbers: HashSet<String> = (0..1000).map(|_| generate_order_number()).collect();
        assert_eq!(numbers.len(), 1000);
    }
}
