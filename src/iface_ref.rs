//! Parsing and validation of textual interface references.
//!
//! A reference names an interface as `path.Identifier`: `io.Reader`,
//! `net/http.Handler`, or `.Local` for an interface in the local package.
//! The split happens at the last dot; everything before it must look like
//! an import path and everything after it must be a bare identifier.

use nom::{
    bytes::complete::take_while1,
    character::complete::char,
    combinator::all_consuming,
    multi::separated_list,
};
use snafu::{ensure, OptionExt, Snafu};

use crate::parser::is_identifier;

type IResult<'a, O> = nom::IResult<&'a str, O>;

/// A parsed reference to a named interface type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRef {
    /// Import path of the owning package; empty for the local package
    pub package_path: String,
    /// The bare interface name
    pub identifier: String,
}

#[derive(Debug, Snafu)]
pub enum ParseError {
    #[snafu(display("expected a 'path.Identifier' reference, found '{}'", reference))]
    MissingDot { reference: String },
    #[snafu(display("missing interface name after the '.' in '{}'", reference))]
    MissingIdentifier { reference: String },
    #[snafu(display("'{}' is not a legal interface identifier", identifier))]
    InvalidIdentifier { identifier: String },
    #[snafu(display("malformed package path '{}'", path))]
    InvalidPath { path: String },
}

/// Parses a raw reference into its package path and identifier.
///
/// For every accepted reference, rejoining the two parts with a dot
/// reproduces the input byte for byte.
pub fn parse_reference(raw: &str) -> Result<InterfaceRef, ParseError> {
    let dot = raw.rfind('.').context(MissingDot {reference: raw})?;
    let (path, identifier) = (&raw[..dot], &raw[dot + 1..]);
    ensure!(!identifier.is_empty(), MissingIdentifier {reference: raw});
    ensure!(is_identifier(identifier), InvalidIdentifier {identifier});
    ensure!(path.is_empty() || is_import_path(path), InvalidPath {path});
    Ok(InterfaceRef {
        package_path: path.to_string(),
        identifier: identifier.to_string(),
    })
}

/// Validates a slash-separated import path.
///
/// Interior segments may contain dots (`gopkg.in`), but the final segment
/// must not: a dot there means the reference tried to name something deeper
/// than `path.Identifier`.
fn is_import_path(path: &str) -> bool {
    let segments = match all_consuming(import_path)(path) {
        Ok((_, segments)) => segments,
        Err(_) => return false,
    };
    let last = segments.last().expect("bug: empty segment list for a non-empty path");
    !last.contains('.')
}

fn import_path(input: &str) -> IResult<Vec<&str>> {
    separated_list(char('/'), path_segment)(input)
}

fn path_segment(input: &str) -> IResult<&str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '.' || c == '_' || c == '-')(input)
}
