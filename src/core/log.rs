use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Target of every event emitted by this crate.
pub const LOG_TARGET: &str = "kyatfast";

fn crate_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

/// Builds the filters for the subscriber. Without `rust_log` only this crate
/// logs, at the level `verbose` picks. With it, its directives alone decide,
/// so `RUST_LOG=kyatfast=debug` works without `--verbose`.
fn build_filters(verbose: bool, rust_log: Option<&str>) -> (Option<Targets>, EnvFilter) {
    match rust_log {
        Some(directives) => (None, EnvFilter::builder().parse_lossy(directives)),
        None => {
            let level = crate_level(verbose);
            (
                Some(Targets::new().with_target(LOG_TARGET, level)),
                EnvFilter::builder()
                    .with_default_directive(level.into())
                    .parse_lossy(""),
            )
        }
    }
}

/// Installs the global subscriber on stderr, so conversion output on stdout
/// stays clean.
pub fn init_logging(verbose: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (app_filter, env_filter) =
        build_filters(verbose, rust_log.as_deref().filter(|s| !s.trim().is_empty()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_target(verbose)
                .with_writer(std::io::stderr),
        )
        .with(app_filter)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_crate_level() {
        assert_eq!(crate_level(true), LevelFilter::DEBUG);
        assert_eq!(crate_level(false), LevelFilter::WARN);
    }

    #[test]
    fn test_verbose_flag_sets_crate_level() {
        let (targets, _) = build_filters(false, None);
        let targets = targets.unwrap();
        assert!(targets.would_enable(LOG_TARGET, &Level::WARN));
        assert!(!targets.would_enable(LOG_TARGET, &Level::DEBUG));

        let (targets, _) = build_filters(true, None);
        assert!(targets.unwrap().would_enable(LOG_TARGET, &Level::DEBUG));
    }

    #[test]
    fn test_rust_log_is_not_capped() {
        let (targets, env_filter) = build_filters(false, Some("kyatfast=debug"));
        assert!(targets.is_none());
        assert_eq!(env_filter.to_string().to_lowercase(), "kyatfast=debug");
    }
}
