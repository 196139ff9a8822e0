use log::{debug, info, LevelFilter};
use std::sync::Once;
use std::time::Instant;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Per-module levels applied before `RUST_LOG`
const MODULE_LEVELS: [(&str, LevelFilter); 6] = [
    ("shelfscout_lib", LevelFilter::Debug),
    ("hyper", LevelFilter::Warn),
    ("reqwest", LevelFilter::Warn),
    ("diesel", LevelFilter::Warn),
    ("tokio", LevelFilter::Warn),
    ("axum", LevelFilter::Info),
];

/// Initialize env_logger once; `RUST_LOG` overrides the defaults
pub fn init_logger() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(LevelFilter::Info);
        for (module, level) in MODULE_LEVELS {
            builder.filter_module(module, level);
        }
        builder
            .parse_default_env()
            .format_timestamp_millis()
            .format_module_path(false)
            .init();

        info!("Logging initialized");
    });
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

/// One-line log formats shared by the collectors and job stores
pub struct LogContext;

impl LogContext {
    /// Outbound marketplace request with its final status
    pub fn api_call(source: &str, url: &str, status: &str, duration_ms: Option<u64>) {
        match duration_ms {
            Some(ms) => info!("{} GET {} -> {} ({}ms)", source, url, status, ms),
            None => debug!("{} GET {}", source, url),
        }
    }

    pub fn job_transition(job_id: &Uuid, from: &str, to: &str) {
        info!("Job {}: {} -> {}", job_id, from, to);
    }

    /// `books` is None when the run starts
    pub fn collection_result(keywords: &str, method: &str, books: Option<usize>) {
        match books {
            Some(count) => info!("Collected {} books for '{}' via {}", count, keywords, method),
            None => debug!("Collecting '{}' via {}", keywords, method),
        }
    }
}

/// Logs how long an operation took when finished
pub struct TimedOperation {
    label: String,
    started: Instant,
}

impl TimedOperation {
    pub fn new(label: &str) -> Self {
        debug!("{}: started", label);
        Self {
            label: label.to_string(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub fn finish(self) -> u64 {
        let ms = self.elapsed_ms();
        info!("{}: done in {}ms", self.label, ms);
        ms
    }

    pub fn finish_with_info(self, outcome: &str) -> u64 {
        let ms = self.elapsed_ms();
        info!("{}: {} in {}ms", self.label, outcome, ms);
        ms
    }
}
