// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::config::settings::Settings;
    use std::time::Duration;

    #[test]
    fn test_default_settings() {
        let settings = Settings::new().expect("default settings should load");

        assert_eq!(settings.catalog.base_url, "http://localhost:8000");
        assert_eq!(settings.catalog.api_pattern, "/api/books");
        assert_eq!(settings.catalog.card_selector, ".book-card");

        assert!(settings.browser.headless);
        assert!(settings.browser.remote_debugging_url.is_none());

        let policy = settings.retry.policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));

        let collect = settings.collection.collect_config();
        assert_eq!(collect.poll_interval, Duration::from_millis(500));
        assert_eq!(collect.max_wait, Duration::from_millis(5000));
        assert_eq!(collect.max_rounds, 15);

        assert_eq!(settings.agent.model, "gpt-4o-mini");
        assert!(settings.metrics.enabled);
    }

    #[test]
    fn test_validate_rejects_malformed_base_url() {
        let mut settings = Settings::new().expect("default settings should load");
        settings.catalog.base_url = "not a url".to_string();

        let error = settings.validate().unwrap_err();
        assert!(error.to_string().contains("catalog.base_url"));
    }
}
