use std::sync::atomic::{AtomicU64, Ordering};

static ROOMS_CREATED: AtomicU64 = AtomicU64::new(0);
static MESSAGES_SENT: AtomicU64 = AtomicU64::new(0);
static REACTIONS_TOGGLED: AtomicU64 = AtomicU64::new(0);
static AI_COMMANDS_SERVED: AtomicU64 = AtomicU64::new(0);
static PUBLISH_RETRIES: AtomicU64 = AtomicU64::new(0);
static API_ERRORS: AtomicU64 = AtomicU64::new(0);

pub struct Metrics;

impl Metrics {
    pub fn room_created() {
        ROOMS_CREATED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_sent() {
        MESSAGES_SENT.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reaction_toggled() {
        REACTIONS_TOGGLED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ai_command_served() {
        AI_COMMANDS_SERVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn publish_retried() {
        PUBLISH_RETRIES.fetch_add(1, Ordering::Relaxed);
    }

    pub fn api_error() {
        API_ERRORS.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn format_prometheus(uptime_seconds: u64, watched_rooms: usize) -> String {
    format!(
        r#"# HELP server_uptime_seconds Number of seconds the server has been running
# TYPE server_uptime_seconds gauge
server_uptime_seconds {}

# HELP rooms_created_total Rooms created through pitch acceptance
# TYPE rooms_created_total counter
rooms_created_total {}

# HELP messages_sent_total Messages appended to room logs
# TYPE messages_sent_total counter
messages_sent_total {}

# HELP reactions_toggled_total Reaction toggles applied
# TYPE reactions_toggled_total counter
reactions_toggled_total {}

# HELP ai_commands_served_total AI report commands rendered
# TYPE ai_commands_served_total counter
ai_commands_served_total {}

# HELP publish_retries_total Webhook publishes that needed the retry
# TYPE publish_retries_total counter
publish_retries_total {}

# HELP api_errors_total Requests answered with an error status
# TYPE api_errors_total counter
api_errors_total {}

# HELP watched_rooms Rooms with at least one live event subscription
# TYPE watched_rooms gauge
watched_rooms {}
"#,
        uptime_seconds,
        ROOMS_CREATED.load(Ordering::Relaxed),
        MESSAGES_SENT.load(Ordering::Relaxed),
        REACTIONS_TOGGLED.load(Ordering::Relaxed),
        AI_COMMANDS_SERVED.load(Ordering::Relaxed),
        PUBLISH_RETRIES.load(Ordering::Relaxed),
        API_ERRORS.load(Ordering::Relaxed),
        watched_rooms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let before = MESSAGES_SENT.load(Ordering::Relaxed);
        Metrics::message_sent();
        assert_eq!(MESSAGES_SENT.load(Ordering::Relaxed), before + 1);
    }

    #[test]
    fn format_includes_every_series() {
        let output = format_prometheus(42, 3);
        assert!(output.contains("server_uptime_seconds 42"));
        assert!(output.contains("rooms_created_total"));
        assert!(output.contains("messages_sent_total"));
        assert!(output.contains("ai_commands_served_total"));
        assert!(output.contains("watched_rooms 3"));
    }
}
