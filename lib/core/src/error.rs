//! Error handling foundation for the bouncer gate.
//!
//! This module provides only the `Result` type alias using rootcause.
//! Each crate defines its own domain-specific error types in their own
//! error modules, and converts them into a `Report` with `?` at the
//! boundary where the failure is first observed.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_type_works() {
        let ok: Result<&str> = Ok("signed");
        assert_eq!(ok.expect("should be ok"), "signed");
    }
}
