//! Value types for flattened interface methods and their rendering.
//!
//! A `Func` is one method of a flattened method set. Its `Display` form is
//! the stub-ready signature text, e.g. `Read(p []byte) (n int, err error)`.

use std::fmt;

/// A single parameter or result of a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// The declared name; empty when the declaration leaves it unnamed
    pub name: String,
    /// The rendered type expression, usable verbatim in generated code
    pub ty: String,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.ty)
        } else {
            write!(f, "{} {}", self.name, self.ty)
        }
    }
}

/// One method of a flattened interface method set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    pub name: String,
    pub params: Vec<Param>,
    pub res: Vec<Param>,
    /// The method's doc comment as written, reproduced above generated stubs
    pub doc: Option<String>,
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}){}", self.name, join_params(&self.params), format_results(&self.res))
    }
}

/// Renders a comma-separated parameter list (without the parentheses)
pub(crate) fn join_params(params: &[Param]) -> String {
    let rendered: Vec<_> = params.iter().map(|param| param.to_string()).collect();
    rendered.join(", ")
}

/// Renders a result list, including the space that separates it from the
/// parameter list
///
/// The forms are the ones declaration syntax uses:
/// * no results render as nothing
/// * a single unnamed result renders bare: `int`
/// * a single named result renders parenthesized: `(n int)`
/// * multiple results render parenthesized and comma-separated, by type only
///   when every result is unnamed: `(int, error)` / `(n int, err error)`
///
/// Once any result in a multi-result list carries a name, every entry is
/// rendered through `Param` so that no present name is dropped; an unnamed
/// entry in such a list degrades to its bare type.
pub(crate) fn format_results(res: &[Param]) -> String {
    match res {
        [] => String::new(),
        [single] if single.name.is_empty() => format!(" {}", single.ty),
        [single] => format!(" ({})", single),
        _ => {
            if res.iter().all(|param| param.name.is_empty()) {
                let tys: Vec<_> = res.iter().map(|param| param.ty.as_str()).collect();
                format!(" ({})", tys.join(", "))
            } else {
                format!(" ({})", join_params(res))
            }
        },
    }
}

/// Renders one complete method stub for the given receiver expression.
///
/// The receiver is spliced in verbatim; validate it with
/// [`valid_receiver`](crate::recv::valid_receiver) first.
pub fn render_stub(recv: &str, func: &Func) -> String {
    let mut out = String::new();
    if let Some(doc) = &func.doc {
        for line in doc.lines() {
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(&format!("func ({}) {} {{\n\tpanic(\"not implemented\")\n}}\n", recv, func));
    out
}
