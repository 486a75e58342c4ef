//! Logging setup for the staker node.
//!
//! Installs a `tracing_subscriber` registry with an `EnvFilter` (`RUST_LOG` wins over the
//! supplied default directive) and a compact formatter. Retry attempts, endpoint
//! rotations and transaction submissions are all emitted through `tracing`.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Error returned when the global subscriber cannot be installed
pub type LoggingError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Directive used when neither the caller nor `RUST_LOG` provide one
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Sets up logging to stdout with the default directive
pub fn setup_logging() -> Result<(), LoggingError> {
	setup_logging_with_writer(std::io::stdout, DEFAULT_LOG_DIRECTIVE)
}

/// Sets up logging with a custom writer and default directive
///
/// # Arguments
/// * `writer` - Destination of the formatted events
/// * `default_directive` - Filter used when `RUST_LOG` is unset or invalid
pub fn setup_logging_with_writer<W>(writer: W, default_directive: &str) -> Result<(), LoggingError>
where
	W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	tracing_subscriber::registry()
		.with(filter)
		.with(
			fmt::layer().with_writer(writer).event_format(
				fmt::format()
					.with_level(true)
					.with_target(true)
					.with_thread_ids(false)
					.with_ansi(false)
					.compact(),
			),
		)
		.try_init()?;
	Ok(())
}
