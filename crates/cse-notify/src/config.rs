use std::time::Duration;

/// Notification delivery tuning. `retry_attempts` answers Open Question (a):
/// the reference implementation observably retries once, so that's the
/// default here, but deployments can override it.
#[derive(Clone, Debug)]
pub struct NotifyConfig {
    pub retry_attempts: u32,
    pub queue_capacity: usize,
    pub request_timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            retry_attempts: 1,
            queue_capacity: 1024,
            request_timeout: Duration::from_secs(5),
        }
    }
}
