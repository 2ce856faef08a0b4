//! Receiver expression validation.
//!
//! Receiver expressions come from the caller and are spliced verbatim into
//! generated stubs, so they are checked for well-formedness first. The core
//! never synthesizes a receiver itself.

use smallvec::SmallVec;

use crate::parser::is_identifier;

/// Returns true if `text` is a syntactically valid method receiver: a bare
/// identifier (`f`), an identifier and a type name (`f F`), or an
/// identifier and a pointer to a type name (`f *F`).
pub fn valid_receiver(text: &str) -> bool {
    let tokens: SmallVec<[&str; 3]> = text.split_whitespace().take(3).collect();
    match tokens.as_slice() {
        [name] => is_identifier(name),
        [name, ty] => {
            let ty_name = if ty.starts_with('*') { &ty[1..] } else { ty };
            is_identifier(name) && is_identifier(ty_name)
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_table() {
        let cases = &[
            ("f", true),
            ("F", true),
            ("f F", true),
            ("f *F", true),
            ("recv *Handler", true),
            ("f\t*F", true),
            ("", false),
            ("a+b", false),
            ("f * F", false),
            ("f **F", false),
            ("f F extra", false),
            ("*F", false),
            ("f chan", false),
            ("1f F", false),
        ];

        for (recv, want) in cases {
            assert_eq!(valid_receiver(recv), *want, "valid_receiver({:?})", recv);
        }
    }
}
