use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

/// How the trigger endpoint executes a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    /// Enqueue the job for the background worker and return it while still pending
    Async,
    /// Run the collection inside the request and return the terminal job
    Sync,
}

impl std::fmt::Display for CollectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionMode::Async => write!(f, "async"),
            CollectionMode::Sync => write!(f, "sync"),
        }
    }
}

impl std::str::FromStr for CollectionMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "async" => Ok(CollectionMode::Async),
            "sync" => Ok(CollectionMode::Sync),
            _ => Err(AppError::ConfigError(format!(
                "Invalid COLLECTION_MODE '{}', expected 'async' or 'sync'",
                s
            ))),
        }
    }
}

/// Service configuration, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL; the in-memory job store is used when absent
    pub database_url: Option<String>,
    /// Bearer tokens accepted by the authentication middleware
    pub auth_tokens: Vec<String>,
    pub marketplace_api_base_url: String,
    pub marketplace_api_key: Option<String>,
    pub marketplace_scrape_base_url: String,
    pub collection_mode: CollectionMode,
    pub worker_concurrency: usize,
    pub job_queue_capacity: usize,
    /// Upper bound on result pages fetched per collection run
    pub max_pages: u32,
    pub api_requests_per_second: f64,
    pub scrape_requests_per_second: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_url: None,
            auth_tokens: Vec::new(),
            marketplace_api_base_url: "https://api.marketplace.example.com/v1".to_string(),
            marketplace_api_key: None,
            marketplace_scrape_base_url: "https://www.marketplace.example.com".to_string(),
            collection_mode: CollectionMode::Async,
            worker_concurrency: 4,
            job_queue_capacity: 256,
            max_pages: 3,
            api_requests_per_second: 1.0,
            scrape_requests_per_second: 0.5,
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to defaults
    pub fn from_env() -> AppResult<Self> {
        let default = Self::default();

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(addr) => addr
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid BIND_ADDR '{}': {}", addr, e)))?,
            Err(_) => default.bind_addr,
        };

        let collection_mode = match env::var("COLLECTION_MODE") {
            Ok(mode) => mode.parse()?,
            Err(_) => default.collection_mode,
        };

        let config = Self {
            bind_addr,
            database_url: non_empty_var("DATABASE_URL"),
            auth_tokens: env::var("AUTH_TOKENS")
                .map(|tokens| parse_token_list(&tokens))
                .unwrap_or(default.auth_tokens),
            marketplace_api_base_url: non_empty_var("MARKETPLACE_API_BASE_URL")
                .unwrap_or(default.marketplace_api_base_url),
            marketplace_api_key: non_empty_var("MARKETPLACE_API_KEY"),
            marketplace_scrape_base_url: non_empty_var("MARKETPLACE_SCRAPE_BASE_URL")
                .unwrap_or(default.marketplace_scrape_base_url),
            collection_mode,
            worker_concurrency: parsed_var("WORKER_CONCURRENCY")?
                .unwrap_or(default.worker_concurrency),
            job_queue_capacity: parsed_var("JOB_QUEUE_CAPACITY")?
                .unwrap_or(default.job_queue_capacity),
            max_pages: parsed_var("MAX_PAGES")?.unwrap_or(default.max_pages),
            api_requests_per_second: parsed_var("API_REQUESTS_PER_SECOND")?
                .unwrap_or(default.api_requests_per_second),
            scrape_requests_per_second: parsed_var("SCRAPE_REQUESTS_PER_SECOND")?
                .unwrap_or(default.scrape_requests_per_second),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.auth_tokens.is_empty() {
            return Err(AppError::ConfigError(
                "AUTH_TOKENS must contain at least one token".to_string(),
            ));
        }
        if self.worker_concurrency == 0 {
            return Err(AppError::ConfigError(
                "WORKER_CONCURRENCY must be positive".to_string(),
            ));
        }
        if self.job_queue_capacity == 0 {
            return Err(AppError::ConfigError(
                "JOB_QUEUE_CAPACITY must be positive".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(AppError::ConfigError("MAX_PAGES must be positive".to_string()));
        }
        if self.api_requests_per_second <= 0.0 || self.scrape_requests_per_second <= 0.0 {
            return Err(AppError::ConfigError(
                "Request rates must be positive".to_string(),
            ));
        }
        for (name, url) in [
            ("MARKETPLACE_API_BASE_URL", &self.marketplace_api_base_url),
            ("MARKETPLACE_SCRAPE_BASE_URL", &self.marketplace_scrape_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::ConfigError(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T>(name: &str) -> AppResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_var(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| AppError::ConfigError(format!("Invalid {} '{}': {}", name, raw, e))),
        None => Ok(None),
    }
}

fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
