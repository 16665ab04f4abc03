//! Macros for migration error handling.
//!
//! Provides convenience macros for creating and returning [`crate::error::PorterError`]
//! instances with reduced boilerplate.

/// Creates a [`crate::error::PorterError`] from error kind and description.
///
/// Accepts an optional third argument with dynamic detail and an optional trailing
/// `source:` argument with the originating error.
#[macro_export]
macro_rules! porter_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::PorterError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::PorterError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::PorterError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::PorterError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates and returns a [`crate::error::PorterError`] from the current function.
///
/// Combines error creation with early return. Supports the same optional detail and
/// source arguments as [`porter_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::porter_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::porter_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::porter_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::porter_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
