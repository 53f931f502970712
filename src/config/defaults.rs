use super::*;

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.amber.com.au/v1".to_string(),
            timeout_seconds: 10,
            resolution_minutes: 30,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "/tmp/amber_monitor_session.json".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            overview_days: 30,
            max_chunk_days: 7,
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: 300,
            default_range: "6h".to_string(),
            retry_tick_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/amber_monitor.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            store: StoreConfig::default(),
            report: ReportConfig::default(),
            live: LiveConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
            timezone: "local".to_string(),
        }
    }
}
