//! CLI command definitions and shared helpers.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use mrpin::constants::ENV_LOG;
use mrpin::env::Env;

/// Default log filter when nothing is configured.
const DEFAULT_FILTER: &str = "warn";

/// Log filter directive: `-v` flags win, then `MRPIN_LOG`, then `RUST_LOG`.
pub fn log_filter(verbose: u8, env: &Env) -> String {
    match verbose {
        0 => env
            .first_of(&[ENV_LOG, "RUST_LOG"])
            .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
        1 => "mrpin=debug,info".to_string(),
        _ => "mrpin=trace,debug".to_string(),
    }
}

/// Install the stderr tracing subscriber.
pub fn init_tracing(verbose: u8, env: &Env) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(log_filter(verbose, env))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_overrides_environment() {
        assert_eq!(log_filter(1, &Env::real()), "mrpin=debug,info");
        assert_eq!(log_filter(3, &Env::real()), "mrpin=trace,debug");
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing(0, &Env::real());
        init_tracing(2, &Env::real());
    }
}
