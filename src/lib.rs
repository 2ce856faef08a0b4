//! Resolves textual references to named interface types and flattens their
//! method sets into stub-ready signatures.
//!
//! The pieces compose as: parse the reference, load the owning package,
//! look up the interface declaration, flatten its method set (embedded
//! interfaces included), and render each method. Receiver validation is an
//! independent predicate used before stubs are assembled.

pub mod flatten;
pub mod funcs;
pub mod iface_ref;
pub mod loader;
pub mod package;
pub mod parser;
pub mod recv;
pub mod ty;

use snafu::{ResultExt, Snafu};

pub use crate::funcs::{render_stub, Func, Param};
pub use crate::iface_ref::{parse_reference, InterfaceRef};
pub use crate::loader::Loader;
pub use crate::recv::valid_receiver;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{}", source))]
    ParseError {
        source: iface_ref::ParseError,
    },
    #[snafu(display("{}", source))]
    LoadError {
        source: loader::LoadError,
    },
    #[snafu(display("{}", source))]
    LookupError {
        source: package::FindError,
    },
    #[snafu(display("{}", source))]
    FlattenError {
        source: flatten::FlattenError,
    },
}

/// Resolves an interface reference like `"io.ReadWriter"` to its ordered,
/// flattened method set.
///
/// The returned methods render through [`Func`]'s `Display` form; combine
/// them with a validated receiver via [`render_stub`] to produce stub text.
pub fn resolve_methods(reference: &str, loader: &Loader) -> Result<Vec<Func>, Error> {
    let iface_ref = iface_ref::parse_reference(reference).context(ParseError)?;
    let pkg = loader.load(&iface_ref.package_path).context(LoadError)?;
    // fail on non-interface declarations before any embed expansion runs
    pkg.interface(&iface_ref.identifier).context(LookupError)?;
    let funcs = flatten::flatten(&pkg, &iface_ref.identifier, loader).context(FlattenError)?;
    Ok(funcs)
}
