use std::{env, str::FromStr, time::Duration};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    /// Queue connection URL (default: `REDIS_URL`).
    /// Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub event_producer_url: String,
    pub webhook: WebhookConfig,
    pub guest: GuestConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Also the consumer group name.
    pub name: String,
    /// Distinguishes replicas within the consumer group.
    pub instance: String,
    pub http_host: String,
    pub http_port: u16,
    pub http_request_timeout_ms: u64,
    pub grpc_port: u16,
    pub grpc_request_timeout_ms: u64,
    pub consumer_max_attempts: u32,
    pub consumer_requeue_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub dsn: String,
    pub max_open_connections: u32,
    pub max_idle_time_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub master: PoolConfig,
    pub slave: PoolConfig,
    pub max_query_duration_warning_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries in the in-memory cache (default: 10,000).
    #[allow(dead_code)]
    pub max_entries: usize,
    /// Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub redis_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    pub base_url: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuestCacheConfig {
    pub enable: bool,
    pub keyf: String,
    pub duration_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicConfig {
    pub enable: bool,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuestEventConfig {
    pub created: TopicConfig,
    pub updated: TopicConfig,
    pub deleted: TopicConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuestConfig {
    pub cache: GuestCacheConfig,
    pub event: GuestEventConfig,
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn string(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> T {
        (self.0)(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn pool(&self, prefix: &str, default_dsn: &str) -> PoolConfig {
        PoolConfig {
            dsn: self.string(&format!("{prefix}_DSN"), default_dsn),
            max_open_connections: self.parse(&format!("{prefix}_MAX_OPEN_CONNECTIONS"), 10),
            max_idle_time_secs: self.parse(&format!("{prefix}_MAX_IDLE_TIME_SECS"), 300),
            max_lifetime_secs: self.parse(&format!("{prefix}_MAX_LIFETIME_SECS"), 1800),
        }
    }

    fn topic(&self, name: &str) -> TopicConfig {
        let upper = name.to_uppercase();
        TopicConfig {
            enable: self.parse(&format!("GUEST_EVENT_{upper}_ENABLE"), true),
            topic: self.string(&format!("GUEST_EVENT_{upper}_TOPIC"), &format!("guest.{name}")),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a default; unparsable values fall back to it.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = Vars(lookup);

        let master = vars.pool("DB_MASTER", "sqlite://guestbook.db?mode=rwc");
        let slave = vars.pool("DB_SLAVE", &master.dsn);
        let redis_url = vars.string("REDIS_URL", "redis://localhost:6379");

        Self {
            server: ServerConfig {
                name: vars.string("SERVER_NAME", "guestbook"),
                instance: vars
                    .string("SERVER_INSTANCE", &vars.string("HOSTNAME", "local")),
                http_host: vars.string("SERVER_HTTP_HOST", "0.0.0.0"),
                http_port: vars.parse("SERVER_HTTP_PORT", 3000),
                http_request_timeout_ms: vars.parse("SERVER_HTTP_REQUEST_TIMEOUT_MS", 10_000),
                grpc_port: vars.parse("SERVER_GRPC_PORT", 50051),
                grpc_request_timeout_ms: vars.parse("SERVER_GRPC_REQUEST_TIMEOUT_MS", 10_000),
                consumer_max_attempts: vars.parse("SERVER_EVENT_CONSUMER_MAX_ATTEMPTS", 5),
                consumer_requeue_delay_ms: vars
                    .parse("SERVER_EVENT_CONSUMER_REQUEUE_DELAY_MS", 1_000),
            },
            database: DatabaseConfig {
                master,
                slave,
                max_query_duration_warning_ms: vars.parse("DB_MAX_QUERY_DURATION_WARNING_MS", 500),
            },
            cache: CacheConfig {
                max_entries: vars.parse("CACHE_MAX_ENTRIES", 10_000),
                redis_url: redis_url.clone(),
            },
            event_producer_url: vars.string("EVENT_PRODUCER_URL", &redis_url),
            webhook: WebhookConfig {
                base_url: vars.string("WEBHOOK_BASE_URL", "https://webhook.site"),
                endpoint: vars.string("WEBHOOK_ENDPOINT", "/"),
            },
            guest: GuestConfig {
                cache: GuestCacheConfig {
                    enable: vars.parse("GUEST_CACHE_ENABLE", true),
                    keyf: vars.string("GUEST_CACHE_KEYF", "guest:%s"),
                    duration_secs: vars.parse("GUEST_CACHE_DURATION_SECS", 300),
                },
                event: GuestEventConfig {
                    created: vars.topic("created"),
                    updated: vars.topic("updated"),
                    deleted: vars.topic("deleted"),
                },
            },
        }
    }
}

impl ServerConfig {
    pub fn http_request_timeout(&self) -> Duration {
        Duration::from_millis(self.http_request_timeout_ms)
    }

    pub fn grpc_request_timeout(&self) -> Duration {
        Duration::from_millis(self.grpc_request_timeout_ms)
    }

    pub fn consumer_requeue_delay(&self) -> Duration {
        Duration::from_millis(self.consumer_requeue_delay_ms)
    }

    /// Consumer name within the group; stable across restarts of one instance.
    pub fn consumer_name(&self) -> String {
        format!("{}-{}", self.name, self.instance)
    }
}

impl PoolConfig {
    pub fn max_idle_time(&self) -> Duration {
        Duration::from_secs(self.max_idle_time_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl DatabaseConfig {
    pub fn max_query_duration_warning(&self) -> Duration {
        Duration::from_millis(self.max_query_duration_warning_ms)
    }
}

impl WebhookConfig {
    /// Full target URL of the webhook.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }
}

impl GuestCacheConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
