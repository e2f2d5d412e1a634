//! Defines the [`Termination`] trait.

use std::{convert::Infallible, fmt::Debug, process};

/// Extends [`std::process::Termination`] with a way to inspect the termination status.
///
/// The GUI event loop owns the main thread and never returns, so the application runs on another
/// thread and [`gui::run`][crate::gui::run] exits the process itself, based on the value the
/// application returned.
pub trait Termination: process::Termination {
    fn is_success(&self) -> bool;
}

impl Termination for Infallible {
    fn is_success(&self) -> bool {
        match *self {}
    }
}

impl Termination for () {
    fn is_success(&self) -> bool {
        true
    }
}

impl<T: Termination, E: Debug> Termination for Result<T, E> {
    fn is_success(&self) -> bool {
        match self {
            Ok(term) => term.is_success(),
            Err(_) => false,
        }
    }
}

/// Returns the process exit code for an application's return value.
pub(crate) fn exit_code<T: Termination>(term: &T) -> i32 {
    if term.is_success() {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&()), 0);
        assert_eq!(exit_code(&Ok::<(), anyhow::Error>(())), 0);
        assert_eq!(exit_code(&Err::<(), _>(anyhow::anyhow!("camera unavailable"))), 1);
        assert_eq!(exit_code(&Ok::<_, String>(Err::<(), _>("nested"))), 1);
    }
}
