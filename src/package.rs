//! Loaded packages and their declaration tables.

use std::collections::HashMap;

use snafu::Snafu;

use crate::ty::Field;

/// A loaded package: every file of one directory, parsed and merged into a
/// single table of package-scope declarations
#[derive(Debug)]
pub struct Package {
    /// Canonical import path; empty for the local package
    pub path: String,
    /// The name from the package clause, used to qualify exported types
    pub name: String,
    /// Import table merged across the package's files: short name to path
    pub imports: HashMap<String, String>,
    /// Package-scope declarations by name
    pub decls: HashMap<String, Decl>,
}

#[derive(Debug)]
pub struct Decl {
    pub kind: DeclKind,
}

/// What a declared identifier denotes
#[derive(Debug)]
pub enum DeclKind {
    Interface(InterfaceDecl),
    Struct,
    Func,
    /// Any other named type (`type Header map[string][]string`)
    Type,
}

impl DeclKind {
    /// A short description of the kind for diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            DeclKind::Interface(_) => "interface",
            DeclKind::Struct => "struct",
            DeclKind::Func => "function",
            DeclKind::Type => "type",
        }
    }
}

/// An interface declaration as found in source, unflattened
#[derive(Debug)]
pub struct InterfaceDecl {
    /// Explicitly declared methods, in source order
    pub methods: Vec<Method>,
    /// Embedded interface references, in source order
    pub embeds: Vec<EmbeddedRef>,
}

#[derive(Debug)]
pub struct Method {
    pub name: String,
    /// The doc comment directly above the method, as written
    pub doc: Option<String>,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

/// A reference to an embedded interface: `Reader` or `io.Reader`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedRef {
    /// The package qualifier as written, resolved through the import table
    pub qualifier: Option<String>,
    pub name: String,
}

#[derive(Debug, Snafu)]
pub enum FindError {
    #[snafu(display("no declaration named '{}' in package '{}'", name, path))]
    NotFound { path: String, name: String },
    #[snafu(display("'{}' in package '{}' is a {}, not an interface", name, path, kind))]
    NotAnInterface { path: String, name: String, kind: &'static str },
}

impl Package {
    /// Looks up a declared identifier and asserts it denotes an interface
    pub fn interface(&self, name: &str) -> Result<&InterfaceDecl, FindError> {
        let decl = match self.decls.get(name) {
            Some(decl) => decl,
            None => return NotFound {path: self.path.clone(), name}.fail(),
        };
        match &decl.kind {
            DeclKind::Interface(iface) => Ok(iface),
            kind => NotAnInterface {path: self.path.clone(), name, kind: kind.describe()}.fail(),
        }
    }

    /// The name used to qualify exported types declared in this package,
    /// or `None` when the package is the local one
    pub fn qualifier(&self) -> Option<&str> {
        if self.path.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }
}
