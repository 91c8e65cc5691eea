//! ---
//! im_section: "03-logging"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Structured logging adapters and sinks."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
/// Emit an informational log enriched with meter context.
#[macro_export]
macro_rules! meter_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        $crate::tracing::event!(
            $crate::tracing::Level::INFO,
            meter = ctx.meter.unwrap_or(""),
            second = ctx.second.unwrap_or_default(),
            quantum_us = ctx.quantum_us.unwrap_or_default(),
            profile = ctx.profile.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::meter_info!(context = $crate::MeterLogContext::default(), $($arg)+)
    }};
}

/// Emit a debug log enriched with meter context.
#[macro_export]
macro_rules! meter_debug {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        $crate::tracing::event!(
            $crate::tracing::Level::DEBUG,
            meter = ctx.meter.unwrap_or(""),
            second = ctx.second.unwrap_or_default(),
            quantum_us = ctx.quantum_us.unwrap_or_default(),
            profile = ctx.profile.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::meter_debug!(context = $crate::MeterLogContext::default(), $($arg)+)
    }};
}

/// Emit an error log enriched with meter context.
#[macro_export]
macro_rules! meter_error {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        $crate::tracing::event!(
            $crate::tracing::Level::ERROR,
            meter = ctx.meter.unwrap_or(""),
            second = ctx.second.unwrap_or_default(),
            quantum_us = ctx.quantum_us.unwrap_or_default(),
            profile = ctx.profile.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::meter_error!(context = $crate::MeterLogContext::default(), $($arg)+)
    }};
}
