//! Serial diagnostics, compiled out entirely without the `debug-log` feature.

/// `diag!(info, "...")` forwards to `log::info!` when `debug-log` is enabled.
/// Without it the arguments are still type-checked but nothing is emitted.
macro_rules! diag {
    ($level:ident, $($arg:tt)+) => {
        #[cfg(feature = "debug-log")]
        log::$level!($($arg)+);
        #[cfg(not(feature = "debug-log"))]
        ::core::mem::drop(::core::format_args!($($arg)+));
    };
}
