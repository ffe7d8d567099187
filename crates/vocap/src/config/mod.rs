mod capture_config;
#[allow(clippy::module_inception)]
mod config;
mod service_config;

pub(crate) use {
    capture_config::CaptureConfig, config::Config, service_config::ServiceConfig,
};

pub(crate) const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
pub(crate) const DEFAULT_EXPIRE_MS: u64 = 4000;
pub(crate) const DEFAULT_LATENCY_MS: u64 = 1000;

pub(crate) fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

pub(crate) fn default_expire_ms() -> u64 {
    DEFAULT_EXPIRE_MS
}

pub(crate) fn default_latency_ms() -> u64 {
    DEFAULT_LATENCY_MS
}
