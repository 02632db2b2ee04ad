//! Logging utilities for the upgrade client
//!
//! With the `logging` feature the macros forward to `tracing`; without it
//! they compile to nothing but still type-check their arguments.

/// Log a warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::warn!($($arg)*);
        }
        #[cfg(not(feature = "logging"))]
        {
            let _ = format_args!($($arg)*);
        }
    };
}

/// Log an info message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::info!($($arg)*);
        }
        #[cfg(not(feature = "logging"))]
        {
            let _ = format_args!($($arg)*);
        }
    };
}

/// Log a debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::debug!($($arg)*);
        }
        #[cfg(not(feature = "logging"))]
        {
            let _ = format_args!($($arg)*);
        }
    };
}

/// Log a trace message
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::trace!($($arg)*);
        }
        #[cfg(not(feature = "logging"))]
        {
            let _ = format_args!($($arg)*);
        }
    };
}

/// Initialize logging subsystem
#[cfg(feature = "logging")]
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Initialize logging subsystem (no-op when logging feature is disabled)
#[cfg(not(feature = "logging"))]
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    Ok(())
}
