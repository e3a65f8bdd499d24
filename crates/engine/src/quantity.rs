//! Validation of Kubernetes resource quantities.
//!
//! ```text
//! quantity  ::= sign? number suffix?
//! number    ::= digits | digits "." digits? | "." digits
//! suffix    ::= Ki | Mi | Gi | Ti | Pi | Ei          (binary SI)
//!             | n | u | m | k | M | G | T | P | E    (decimal SI)
//!             | ("e" | "E") sign? digits             (decimal exponent)
//! ```

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use snafu::Snafu;

const BINARY_SI_SUFFIXES: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

const DECIMAL_SI_SUFFIXES: [&str; 9] = ["n", "u", "m", "k", "M", "G", "T", "P", "E"];

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum QuantityError {
    #[snafu(display("Quantity is empty"))]
    Empty,

    #[snafu(display("Invalid numeric part in quantity '{value}'"))]
    InvalidNumber { value: String },

    #[snafu(display("Unknown suffix '{suffix}' in quantity '{value}'"))]
    InvalidSuffix { value: String, suffix: String },
}

/// Parses `value` as a Kubernetes quantity such as `250m`, `1.5`, `128Mi`
/// or `1e3`.
///
/// The accepted text is kept verbatim; no canonicalisation is applied.
///
/// # Errors
///
/// Returns a [`QuantityError`] if `value` does not follow the quantity
/// grammar.
pub fn parse_quantity(value: &str) -> Result<Quantity, QuantityError> {
    if value.is_empty() {
        return EmptySnafu.fail();
    }

    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let number_end =
        unsigned.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_end);

    if !is_valid_number(number) {
        return InvalidNumberSnafu { value }.fail();
    }

    if !is_valid_suffix(suffix) {
        return InvalidSuffixSnafu { value, suffix }.fail();
    }

    Ok(Quantity(value.to_string()))
}

fn is_valid_number(number: &str) -> bool {
    let mut parts = number.splitn(2, '.');
    let integer = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();

    !fraction.contains('.')
        && !(integer.is_empty() && fraction.is_empty())
        && integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
}

fn is_valid_suffix(suffix: &str) -> bool {
    if suffix.is_empty()
        || BINARY_SI_SUFFIXES.contains(&suffix)
        || DECIMAL_SI_SUFFIXES.contains(&suffix)
    {
        return true;
    }

    suffix.strip_prefix(['e', 'E']).is_some_and(|exponent| {
        let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    })
}
