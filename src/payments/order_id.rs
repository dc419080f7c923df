use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};

const SUFFIX_LEN: usize = 9;

/// Generates a merchant order id of the form `TXN_<unix millis>_<9 chars>`.
/// The suffix is lowercase alphanumeric; global uniqueness is backed by the
/// unique index on `subscriptions.order_id`.
pub fn generate() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();

    format!("TXN_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_has_prefix_timestamp_and_suffix() {
        let order_id = generate();
        let parts: Vec<&str> = order_id.splitn(3, '_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TXN");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn consecutive_order_ids_differ() {
        assert_ne!(generate(), generate());
    }
}
