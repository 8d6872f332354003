//! Metric name constants, to avoid typos across modules.

/// Connect notifications processed (counter, labels: outcome).
pub const PRESENCE_CONNECTS_TOTAL: &str = "presence_connects_total";
/// Disconnect notifications that recorded a session (counter).
pub const PRESENCE_DISCONNECTS_TOTAL: &str = "presence_disconnects_total";
/// Disconnects dropped as stale, replayed, or unknown (counter, labels: reason).
pub const PRESENCE_STALE_DISCONNECTS_TOTAL: &str = "presence_stale_disconnects_total";
/// Event-handler failures (counter, labels: event).
pub const PRESENCE_EVENT_ERRORS_TOTAL: &str = "presence_event_errors_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_snake_case() {
        let names = [
            PRESENCE_CONNECTS_TOTAL,
            PRESENCE_DISCONNECTS_TOTAL,
            PRESENCE_STALE_DISCONNECTS_TOTAL,
            PRESENCE_EVENT_ERRORS_TOTAL,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
