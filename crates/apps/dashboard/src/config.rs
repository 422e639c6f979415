use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5003/api";
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Host settings after flags and environment are merged. Flags win.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub api_url: String,
    pub view: Option<String>,
    pub health_interval: Duration,
    pub request_timeout: Duration,
}

impl HostConfig {
    pub fn from_env(
        api: Option<String>,
        view: Option<String>,
        health_interval_secs: Option<u64>,
    ) -> Self {
        Self::merge(
            api.or_else(|| env_var_string("DASHBOARD_API_URL")),
            view.or_else(|| env_var_string("DASHBOARD_VIEW")),
            health_interval_secs.unwrap_or_else(|| {
                env_var_u64("DASHBOARD_HEALTH_INTERVAL_SECS", DEFAULT_HEALTH_INTERVAL_SECS)
            }),
            env_var_u64("DASHBOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    fn merge(api: Option<String>, view: Option<String>, health_secs: u64, timeout_secs: u64) -> Self {
        let api_url = api
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self {
            api_url,
            view: view.filter(|v| !v.trim().is_empty()),
            health_interval: Duration::from_secs(health_secs.max(1)),
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    parse_or(env::var(key).ok(), default)
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_API_URL, HostConfig, parse_or};
    use std::time::Duration;

    #[test]
    fn parse_falls_back_on_garbage() {
        assert_eq!(parse_or(Some(" 12 ".to_string()), 3u64), 12);
        assert_eq!(parse_or(Some("soon".to_string()), 3u64), 3);
        assert_eq!(parse_or::<u64>(None, 3), 3);
    }

    #[test]
    fn merge_normalizes_inputs() {
        let cfg = HostConfig::merge(Some("http://host:8000/api/".into()), Some(" ".into()), 0, 5);
        assert_eq!(cfg.api_url, "http://host:8000/api");
        assert_eq!(cfg.view, None);
        assert_eq!(cfg.health_interval, Duration::from_secs(1));
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));

        let cfg = HostConfig::merge(None, Some("traffic".into()), 30, 10);
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.view.as_deref(), Some("traffic"));
    }
}
