// utils/ticket_label.rs
use chrono::{DateTime, Utc};
use rand::Rng;

/// Display label for a new ticket, e.g. `TKT-18f3c2a1b40-0427`.
pub fn generate_ticket_label(created_at: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    format!(
        "TKT-{:x}-{:04}",
        created_at.timestamp_millis(),
        rng.random_range(0..10000)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn label_encodes_creation_time() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let label = generate_ticket_label(at);
        let parts: Vec<&str> = label.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TKT");
        assert_eq!(i64::from_str_radix(parts[1], 16).unwrap(), 1_700_000_000_000);
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }
}
