use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "reqform=info,form_runtime=info,form_spec=warn";
const VERBOSE_FILTER: &str = "reqform=debug,form_runtime=debug,form_spec=debug";

/// `--verbose` wins over `RUST_LOG`; otherwise `RUST_LOG` wins over the default.
pub fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(VERBOSE_FILTER);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the stderr subscriber. Stdout stays reserved for the form itself.
pub fn init(verbose: bool) {
    let result = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
    if let Err(err) = result {
        eprintln!("logging already initialised: {}", err);
    }
}
