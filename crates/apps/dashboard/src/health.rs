use std::time::Duration;

use reqwest::{Client, Url};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Endpoints polled for health, in order: `{api}/health`, then
/// `{origin}/health` when the API lives under a path.
pub fn health_urls(api_url: &str) -> Vec<String> {
    let api = api_url.trim_end_matches('/');
    let mut urls = vec![format!("{api}/health")];
    if let Ok(url) = Url::parse(api) {
        let origin = url.origin().ascii_serialization();
        let fallback = format!("{origin}/health");
        if origin != "null" && !urls.contains(&fallback) {
            urls.push(fallback);
        }
    }
    urls
}

/// Tracks backend availability and reports only changes.
#[derive(Debug, Default)]
pub struct HealthState {
    available: Option<bool>,
}

impl HealthState {
    /// Records a poll result; returns the new state when it differs from the
    /// previous one. The first observation always counts as a change.
    pub fn observe(&mut self, available: bool) -> Option<bool> {
        if self.available == Some(available) {
            return None;
        }
        self.available = Some(available);
        Some(available)
    }
}

async fn probe(client: &Client, urls: &[String]) -> bool {
    for url in urls {
        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return true,
            Ok(resp) => debug!(url = %url, status = resp.status().as_u16(), "health probe failed"),
            Err(err) => debug!(url = %url, error = %err, "health probe failed"),
        }
    }
    false
}

/// Polls until the task is aborted.
pub async fn run(client: Client, api_url: String, period: Duration) {
    let urls = health_urls(&api_url);
    let mut state = HealthState::default();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match state.observe(probe(&client, &urls).await) {
            Some(true) => info!(api = %api_url, "backend available"),
            Some(false) => warn!(api = %api_url, "backend unavailable"),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HealthState, health_urls};

    #[test]
    fn falls_back_to_origin() {
        assert_eq!(
            health_urls("http://127.0.0.1:5003/api/"),
            vec![
                "http://127.0.0.1:5003/api/health".to_string(),
                "http://127.0.0.1:5003/health".to_string(),
            ]
        );
        assert_eq!(
            health_urls("http://example.com"),
            vec!["http://example.com/health".to_string()]
        );
    }

    #[test]
    fn only_transitions_are_reported() {
        let mut s = HealthState::default();
        assert_eq!(s.observe(false), Some(false));
        assert_eq!(s.observe(false), None);
        assert_eq!(s.observe(true), Some(true));
        assert_eq!(s.observe(true), None);
    }
}
