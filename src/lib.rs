//! Interaction sampling and powder-diffraction cross-section caching
//! for Monte Carlo photon and neutron transport.
//!
//! The hot-path entry points are
//! [`select_from_distribution`](sampling::select_from_distribution),
//! [`select_interaction`](fluorescence::select_interaction),
//! [`select_fluorescence_energy`](fluorescence::select_fluorescence_energy)
//! and [`CrossSectionCache::query`](powder::CrossSectionCache::query).
//! The reflection list they consume is built once by
//! [`LineLoader`](powder::LineLoader).

use std::fmt;
use colored::Colorize;

pub mod constants;
pub mod sampling;
pub mod fluorescence;
pub mod powder;
pub mod input;

/// Severity of a message passed to [`report!`].
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum Diagnostic {
    Info,
    Warning,
    Error,
}

#[doc(hidden)]
pub fn emit(diag: Diagnostic, args: fmt::Arguments) {
    match diag {
        Diagnostic::Info => eprintln!("{}: {}", "Info".bold().cyan(), args),
        Diagnostic::Warning => eprintln!("{}: {}", "Warning".bold().yellow(), args),
        Diagnostic::Error => eprintln!("{}: {}", "Error".bold().red(), args),
    }
}

/// Prints a diagnostic to stderr, e.g.
/// ```
/// use fluopowder::{report, Diagnostic};
/// report!(Diagnostic::Warning, "line {} rejected", 12);
///
/// // only if the condition holds
/// let verbose = false;
/// report!(Diagnostic::Info, verbose, "line {} accepted", 13);
/// ```
#[macro_export]
macro_rules! report {
    ($diag:expr, $fmt:literal $($arg:tt)*) => {
        $crate::emit($diag, format_args!($fmt $($arg)*))
    };
    ($diag:expr, $cond:expr, $($arg:tt)*) => {
        if $cond {
            $crate::emit($diag, format_args!($($arg)*));
        }
    };
}
