use std::sync::atomic::{AtomicBool, Ordering};

use envconfig::Envconfig;

// Process-wide switch controlling whether constructed exceptions get their
// stack trace sanitized. On by default, read on every construction.
static SANITIZE_STACKS: AtomicBool = AtomicBool::new(true);

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "SANITIZE_STACKS", default = "true")]
    pub sanitize_stacks: bool,
}

impl Config {
    /// Reads the environment and applies the result to the process-wide
    /// sanitize switch. Call once at startup.
    pub fn init_with_defaults() -> Result<Self, envconfig::Error> {
        let config = Self::init_from_env()?;
        set_sanitize_stacks(config.sanitize_stacks);
        Ok(config)
    }
}

pub fn set_sanitize_stacks(enabled: bool) {
    SANITIZE_STACKS.store(enabled, Ordering::Relaxed);
}

pub fn sanitize_stacks_enabled() -> bool {
    SANITIZE_STACKS.load(Ordering::Relaxed)
}
