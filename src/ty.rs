//! Type expressions as they appear in method signatures.
//!
//! The tree covers the declaration-level subset of the type syntax that
//! interface methods use. Rendering produces the exact source form, with
//! bare exported names qualified by the declaring package's name so the
//! text stays valid at the stub's insertion point: `Header` declared in
//! `net/http` renders as `http.Header`, while `error` and other
//! unexported names render as written.

use crate::funcs::{format_results, join_params, Param};

/// A parameter or result field as parsed from a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The declared name, if any
    pub name: Option<String>,
    pub ty: Ty,
}

/// The direction of a channel type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A parameter/result list of a `func` type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnSig {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

/// A type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    /// A bare identifier: `int`, `error`, `Header`
    Named(String),
    /// A package-qualified identifier as written in source: `token.Pos`
    Qualified(String, String),
    Pointer(Box<Ty>),
    Slice(Box<Ty>),
    /// An array with its length expression kept as raw text
    Array(String, Box<Ty>),
    Map(Box<Ty>, Box<Ty>),
    Chan(ChanDir, Box<Ty>),
    Func(Box<FnSig>),
    /// A `...T` parameter; only legal in final parameter position
    Variadic(Box<Ty>),
    EmptyInterface,
    EmptyStruct,
    Paren(Box<Ty>),
}

impl Ty {
    /// Renders the source text of this type.
    ///
    /// `qualifier` is the declaring package's name, or `None` when the type
    /// was declared in the local package and must stay unqualified.
    pub fn render(&self, qualifier: Option<&str>) -> String {
        match self {
            Ty::Named(name) => match qualifier {
                Some(pkg) if is_exported(name) => format!("{}.{}", pkg, name),
                _ => name.clone(),
            },
            Ty::Qualified(pkg, name) => format!("{}.{}", pkg, name),
            Ty::Pointer(inner) => format!("*{}", inner.render(qualifier)),
            Ty::Slice(inner) => format!("[]{}", inner.render(qualifier)),
            Ty::Array(len, inner) => format!("[{}]{}", len, inner.render(qualifier)),
            Ty::Map(key, value) => {
                format!("map[{}]{}", key.render(qualifier), value.render(qualifier))
            },
            Ty::Chan(ChanDir::Both, inner) => format!("chan {}", inner.render(qualifier)),
            Ty::Chan(ChanDir::Send, inner) => format!("chan<- {}", inner.render(qualifier)),
            Ty::Chan(ChanDir::Recv, inner) => format!("<-chan {}", inner.render(qualifier)),
            Ty::Func(sig) => {
                let params = render_fields(&sig.params, qualifier);
                let results = render_fields(&sig.results, qualifier);
                format!("func({}){}", join_params(&params), format_results(&results))
            },
            Ty::Variadic(inner) => format!("...{}", inner.render(qualifier)),
            Ty::EmptyInterface => "interface{}".to_string(),
            Ty::EmptyStruct => "struct{}".to_string(),
            Ty::Paren(inner) => format!("({})", inner.render(qualifier)),
        }
    }
}

/// Renders a field list into `Param` values ready for display
pub(crate) fn render_fields(fields: &[Field], qualifier: Option<&str>) -> Vec<Param> {
    fields.iter().map(|field| Param {
        name: field.name.clone().unwrap_or_default(),
        ty: field.ty.render(qualifier),
    }).collect()
}

/// Returns true if the name's first character is upper case
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}
