//! Declaration-level parsing of Go source files.
//!
//! Stub generation only needs package clauses, import tables, and type
//! declarations; interface bodies are parsed in full (methods, embedded
//! interfaces, doc comments) while function bodies and other declarations
//! are skipped with a delimiter-aware scan. This is deliberately not a
//! general-purpose front end.

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::{all_consuming, recognize, verify},
    error::ErrorKind,
    sequence::pair,
};
use snafu::Snafu;

use crate::package::{Decl, DeclKind, EmbeddedRef, InterfaceDecl, Method};
use crate::ty::{ChanDir, Field, FnSig, Ty};

type Input<'a> = &'a str;
type IResult<'a, O> = nom::IResult<Input<'a>, O>;

/// Reserved words, never legal as declared names
pub(crate) const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface",
    "map", "package", "range", "return", "select", "struct", "switch", "type", "var",
];

#[derive(Debug, Snafu)]
pub enum SyntaxError {
    #[snafu(display("syntax error on line {}", line))]
    Syntax { line: usize },
}

/// One parsed source file, before merging into a package
#[derive(Debug)]
pub struct SourceFile {
    /// The name from the package clause
    pub package: String,
    /// Imported packages: short name (alias or final path segment) and path
    pub imports: Vec<(String, String)>,
    /// Package-scope declarations in source order
    pub decls: Vec<(String, Decl)>,
}

/// Parses a single source file down to its declaration table
pub fn parse_file(src: &str) -> Result<SourceFile, SyntaxError> {
    match file(src) {
        Ok((_, parsed)) => Ok(parsed),
        Err(nom::Err::Error((rest, _))) | Err(nom::Err::Failure((rest, _))) => {
            Syntax {line: line_of(src, rest)}.fail()
        },
        // This should not be reachable because we are using the 'complete' versions of all parsers
        Err(nom::Err::Incomplete(_)) => unreachable!("bug: parser requested more input"),
    }
}

pub(crate) fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Returns true if the whole string is a single legal identifier
pub fn is_identifier(text: &str) -> bool {
    all_consuming(name_ident)(text).is_ok()
}

fn line_of(src: &str, rest: &str) -> usize {
    let consumed = src.len() - rest.len();
    src[..consumed].matches('\n').count() + 1
}

fn file(input: Input) -> IResult<SourceFile> {
    let input = sc(input);
    let (input, _) = keyword("package")(input)?;
    let (input, package) = name_ident(hs(input))?;

    let mut imports = Vec::new();
    let mut decls = Vec::new();
    let mut input = input;
    loop {
        input = seps(input);
        if input.is_empty() {
            break;
        }
        if let Ok((rest, _)) = keyword("import")(input) {
            let (rest, mut specs) = import_decl(sc(rest))?;
            imports.append(&mut specs);
            input = rest;
        } else if let Ok((rest, _)) = keyword("type")(input) {
            let (rest, mut specs) = type_decl(sc(rest))?;
            decls.append(&mut specs);
            input = rest;
        } else if let Ok((rest, _)) = keyword("func")(input) {
            let (rest, decl) = func_decl(sc(rest))?;
            if let Some(decl) = decl {
                decls.push(decl);
            }
            input = rest;
        } else {
            // var, const, and anything else we have no use for
            let (rest, _) = skip_decl(input)?;
            input = rest;
        }
    }

    Ok((input, SourceFile {package: package.to_string(), imports, decls}))
}

fn import_decl(input: Input) -> IResult<Vec<(String, String)>> {
    if let Some(rest) = strip(input, '(') {
        let mut specs = Vec::new();
        let mut input = rest;
        loop {
            input = seps(input);
            if let Some(rest) = strip(input, ')') {
                return Ok((rest, specs));
            }
            let (rest, spec) = import_spec(input)?;
            if let Some(spec) = spec {
                specs.push(spec);
            }
            input = rest;
        }
    } else {
        let (rest, spec) = import_spec(input)?;
        Ok((rest, spec.into_iter().collect()))
    }
}

/// Parses one import spec. Dot and blank imports produce `None` since they
/// contribute no usable qualifier.
fn import_spec(input: Input) -> IResult<Option<(String, String)>> {
    let (input, alias, usable) = if input.starts_with('"') || input.starts_with('`') {
        (input, None, true)
    } else if let Some(rest) = strip(input, '.') {
        (sc(rest), None, false)
    } else {
        let (rest, id) = identifier(input)?;
        if id == "_" {
            (sc(rest), None, false)
        } else {
            (sc(rest), Some(id), true)
        }
    };
    let (input, path) = string_lit(input)?;
    if !usable {
        return Ok((input, None));
    }
    let short = match alias {
        Some(alias) => alias.to_string(),
        None => last_segment(path).to_string(),
    };
    Ok((input, Some((short, path.to_string()))))
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn type_decl(input: Input) -> IResult<Vec<(String, Decl)>> {
    if let Some(rest) = strip(input, '(') {
        let mut out = Vec::new();
        let mut input = rest;
        loop {
            input = seps(input);
            if let Some(rest) = strip(input, ')') {
                return Ok((rest, out));
            }
            let (rest, spec) = type_spec(input)?;
            out.push(spec);
            input = rest;
        }
    } else {
        let (rest, spec) = type_spec(input)?;
        Ok((rest, vec![spec]))
    }
}

fn type_spec(input: Input) -> IResult<(String, Decl)> {
    let (input, name) = name_ident(input)?;
    let input = hs(input);
    // alias declarations (`type A = B`) carry the same kind information
    let input = match strip(input, '=') {
        Some(rest) => sc(rest),
        None => input,
    };

    if let Ok((rest, _)) = keyword("interface")(input) {
        let (rest, iface) = interface_body(sc(rest))?;
        return Ok((rest, (name.to_string(), Decl {kind: DeclKind::Interface(iface)})));
    }
    if let Ok((rest, _)) = keyword("struct")(input) {
        let (rest, _) = balanced_braces(sc(rest))?;
        return Ok((rest, (name.to_string(), Decl {kind: DeclKind::Struct})));
    }
    if let Ok((rest, _)) = keyword("func")(input) {
        let (rest, _) = signature_tail(sc(rest))?;
        return Ok((rest, (name.to_string(), Decl {kind: DeclKind::Func})));
    }
    let (rest, _) = ty(input)?;
    Ok((rest, (name.to_string(), Decl {kind: DeclKind::Type})))
}

/// Parses a top-level `func` declaration down to its name. Methods carry a
/// receiver and are not package-scope names, so they produce `None`.
fn func_decl(input: Input) -> IResult<Option<(String, Decl)>> {
    if input.starts_with('(') {
        let (rest, _) = skip_decl(input)?;
        return Ok((rest, None));
    }
    let (rest, name) = name_ident(input)?;
    let (rest, _) = skip_decl(rest)?;
    Ok((rest, Some((name.to_string(), Decl {kind: DeclKind::Func}))))
}

fn interface_body(input: Input) -> IResult<InterfaceDecl> {
    let (input, _) = char('{')(input)?;
    let mut methods = Vec::new();
    let mut embeds = Vec::new();
    let mut input = input;
    loop {
        let (rest, doc) = sep_and_doc(input);
        input = rest;
        if let Some(rest) = strip(input, '}') {
            return Ok((rest, InterfaceDecl {methods, embeds}));
        }
        let (rest, name) = name_ident(input)?;
        if let Some(rest) = strip(rest, '.') {
            let (rest, embedded) = name_ident(rest)?;
            embeds.push(EmbeddedRef {
                qualifier: Some(name.to_string()),
                name: embedded.to_string(),
            });
            input = rest;
        } else {
            let after = hs(rest);
            if after.starts_with('(') {
                let (rest, (params, results)) = signature_tail(after)?;
                methods.push(Method {name: name.to_string(), doc, params, results});
                input = rest;
            } else {
                embeds.push(EmbeddedRef {qualifier: None, name: name.to_string()});
                input = rest;
            }
        }
    }
}

/// Parses `(params)` plus an optional same-line result list
fn signature_tail(input: Input) -> IResult<(Vec<Field>, Vec<Field>)> {
    let (input, _) = char('(')(input)?;
    let (input, params) = field_list(input)?;
    let after = hs(input);
    if let Some(rest) = strip(after, '(') {
        let (rest, results) = field_list(rest)?;
        Ok((rest, (params, results)))
    } else if starts_type(after) {
        let (rest, result) = ty(after)?;
        Ok((rest, (params, vec![Field {name: None, ty: result}])))
    } else {
        Ok((input, (params, Vec::new())))
    }
}

/// One comma-separated element of a field list, before grouped names are
/// resolved: `a` here may be a bare type or a name sharing a later type
#[derive(Debug)]
enum Elem {
    Named { name: String, ty: Ty },
    Bare { ty: Ty },
}

/// Parses the elements of a parenthesized field list, the opening paren
/// already consumed, through the closing paren
fn field_list(input: Input) -> IResult<Vec<Field>> {
    let mut elems = Vec::new();
    let mut input = sc(input);
    loop {
        if let Some(rest) = strip(input, ')') {
            input = rest;
            break;
        }
        let (rest, elem) = field_elem(input)?;
        elems.push(elem);
        input = sc(rest);
        if let Some(rest) = strip(input, ',') {
            // tolerate the trailing comma of multi-line lists
            input = sc(rest);
        } else if let Some(rest) = strip(input, ')') {
            input = rest;
            break;
        } else {
            return Err(nom::Err::Error((input, ErrorKind::Char)));
        }
    }
    match resolve_fields(elems) {
        Ok(fields) => Ok((input, fields)),
        Err(()) => Err(nom::Err::Failure((input, ErrorKind::Verify))),
    }
}

fn field_elem(input: Input) -> IResult<Elem> {
    if let Ok((rest, name)) = name_ident(input) {
        // a dot right after the identifier makes it a qualified type, not a name
        if !rest.starts_with('.') {
            let after = hs(rest);
            if starts_type(after) {
                let (rest, elem_ty) = ty(after)?;
                return Ok((rest, Elem::Named {name: name.to_string(), ty: elem_ty}));
            }
        }
    }
    let (rest, elem_ty) = ty(input)?;
    Ok((rest, Elem::Bare {ty: elem_ty}))
}

/// Resolves grouped names to per-name fields: `dst, nonce []byte` becomes
/// two fields of the same type. A list is either fully named or fully
/// unnamed; anything else is malformed.
fn resolve_fields(elems: Vec<Elem>) -> Result<Vec<Field>, ()> {
    let any_named = elems.iter().any(|elem| match elem {
        Elem::Named {..} => true,
        Elem::Bare {..} => false,
    });
    if !any_named {
        let fields = elems.into_iter().map(|elem| match elem {
            Elem::Bare {ty} => Field {name: None, ty},
            Elem::Named {..} => unreachable!("bug: named element in an unnamed list"),
        }).collect();
        return Ok(fields);
    }

    let mut fields = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    for elem in elems {
        match elem {
            // a lone identifier groups with the next element that has a type
            Elem::Bare {ty: Ty::Named(name)} => pending.push(name),
            Elem::Bare {..} => return Err(()),
            Elem::Named {name, ty} => {
                for grouped in pending.drain(..) {
                    fields.push(Field {name: Some(grouped), ty: ty.clone()});
                }
                fields.push(Field {name: Some(name), ty});
            },
        }
    }
    if !pending.is_empty() {
        return Err(());
    }
    Ok(fields)
}

fn ty(input: Input) -> IResult<Ty> {
    if let Some(rest) = strip(input, '*') {
        let (rest, inner) = ty(sc(rest))?;
        return Ok((rest, Ty::Pointer(Box::new(inner))));
    }
    if input.starts_with("...") {
        let (rest, inner) = ty(sc(&input[3..]))?;
        return Ok((rest, Ty::Variadic(Box::new(inner))));
    }
    if input.starts_with("<-") {
        let (rest, _) = keyword("chan")(sc(&input[2..]))?;
        let (rest, inner) = ty(sc(rest))?;
        return Ok((rest, Ty::Chan(ChanDir::Recv, Box::new(inner))));
    }
    if let Some(rest) = strip(input, '[') {
        return slice_or_array(sc(rest));
    }
    if let Ok((rest, _)) = keyword("map")(input) {
        let (rest, _) = char('[')(sc(rest))?;
        let (rest, key) = ty(sc(rest))?;
        let (rest, _) = char(']')(sc(rest))?;
        let (rest, value) = ty(sc(rest))?;
        return Ok((rest, Ty::Map(Box::new(key), Box::new(value))));
    }
    if let Ok((rest, _)) = keyword("chan")(input) {
        let rest = sc(rest);
        if rest.starts_with("<-") {
            let (rest, inner) = ty(sc(&rest[2..]))?;
            return Ok((rest, Ty::Chan(ChanDir::Send, Box::new(inner))));
        }
        let (rest, inner) = ty(rest)?;
        return Ok((rest, Ty::Chan(ChanDir::Both, Box::new(inner))));
    }
    if let Ok((rest, _)) = keyword("func")(input) {
        let (rest, (params, results)) = signature_tail(sc(rest))?;
        return Ok((rest, Ty::Func(Box::new(FnSig {params, results}))));
    }
    if let Ok((rest, _)) = keyword("interface")(input) {
        let (rest, _) = char('{')(sc(rest))?;
        let (rest, _) = char('}')(sc(rest))?;
        return Ok((rest, Ty::EmptyInterface));
    }
    if let Ok((rest, _)) = keyword("struct")(input) {
        let (rest, _) = char('{')(sc(rest))?;
        let (rest, _) = char('}')(sc(rest))?;
        return Ok((rest, Ty::EmptyStruct));
    }
    if let Some(rest) = strip(input, '(') {
        let (rest, inner) = ty(sc(rest))?;
        let (rest, _) = char(')')(sc(rest))?;
        return Ok((rest, Ty::Paren(Box::new(inner))));
    }

    let (rest, first) = name_ident(input)?;
    if let Some(after_dot) = strip(rest, '.') {
        let (rest, name) = name_ident(after_dot)?;
        return Ok((rest, Ty::Qualified(first.to_string(), name.to_string())));
    }
    Ok((rest, Ty::Named(first.to_string())))
}

/// Continues a type that began with `[`: either a slice or an array whose
/// length expression is kept as raw text
fn slice_or_array(input: Input) -> IResult<Ty> {
    if let Some(rest) = strip(input, ']') {
        let (rest, inner) = ty(sc(rest))?;
        return Ok((rest, Ty::Slice(Box::new(inner))));
    }
    let end = match input.find(']') {
        Some(end) => end,
        None => return Err(nom::Err::Failure((input, ErrorKind::Char))),
    };
    let len = input[..end].trim().to_string();
    let (rest, inner) = ty(sc(&input[end + 1..]))?;
    Ok((rest, Ty::Array(len, Box::new(inner))))
}

/// Returns true if the input could begin a type expression on this line
fn starts_type(input: Input) -> bool {
    match input.chars().next() {
        Some(c) => {
            c == '*' || c == '[' || c == '<' || c == '.' || c == '('
                || c == '_' || c.is_alphabetic()
        },
        None => false,
    }
}

fn identifier(input: Input) -> IResult<&str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// An identifier that is not a reserved word
fn name_ident(input: Input) -> IResult<&str> {
    verify(identifier, |id: &str| !is_keyword(id))(input)
}

fn keyword<'a>(word: &'static str) -> impl Fn(Input<'a>) -> IResult<'a, &'a str> {
    move |input| {
        let (rest, id) = identifier(input)?;
        if id == word {
            Ok((rest, id))
        } else {
            Err(nom::Err::Error((input, ErrorKind::Tag)))
        }
    }
}

fn string_lit(input: Input) -> IResult<&str> {
    let quote = match input.chars().next() {
        Some('"') => '"',
        Some('`') => '`',
        _ => return Err(nom::Err::Error((input, ErrorKind::Char))),
    };
    // import paths contain no escapes, so both forms end at the next quote
    match input[1..].find(quote) {
        Some(end) => Ok((&input[end + 2..], &input[1..end + 1])),
        None => Err(nom::Err::Failure((input, ErrorKind::Char))),
    }
}

/// Consumes one leading character if it matches
fn strip(input: Input, c: char) -> Option<Input> {
    if input.starts_with(c) {
        Some(&input[c.len_utf8()..])
    } else {
        None
    }
}

/// Skips spaces, newlines, and comments
fn sc(input: Input) -> Input {
    let mut input = input;
    loop {
        input = input.trim_start();
        if input.starts_with("//") {
            match input.find('\n') {
                Some(end) => input = &input[end..],
                None => return "",
            }
        } else if input.starts_with("/*") {
            match input[2..].find("*/") {
                Some(end) => input = &input[2 + end + 2..],
                None => return "",
            }
        } else {
            return input;
        }
    }
}

/// Skips spaces, comments, and semicolons
fn seps(input: Input) -> Input {
    let mut input = input;
    loop {
        let trimmed = sc(input);
        match strip(trimmed, ';') {
            Some(rest) => input = rest,
            None => return trimmed,
        }
    }
}

/// Skips spaces and tabs only; used for same-line lookahead
fn hs(input: Input) -> Input {
    input.trim_start_matches(|c| c == ' ' || c == '\t')
}

/// Skips separators inside an interface body while collecting the doc
/// comment attached to the next element.
///
/// A doc comment is the contiguous run of `//` lines directly above the
/// element; a blank line detaches it, and a comment trailing the previous
/// element on the same line belongs to that element, not the next one.
fn sep_and_doc(input: Input) -> (Input, Option<String>) {
    let mut input = input;
    let mut doc: Vec<&str> = Vec::new();
    let mut newlines = 0;
    loop {
        if input.starts_with("//") {
            let end = input.find('\n').unwrap_or(input.len());
            if newlines > 0 {
                if newlines > 1 {
                    doc.clear();
                }
                doc.push(input[..end].trim_end());
            }
            newlines = 0;
            input = &input[end..];
            continue;
        }
        if input.starts_with("/*") {
            doc.clear();
            match input[2..].find("*/") {
                Some(end) => input = &input[2 + end + 2..],
                None => input = "",
            }
            continue;
        }
        match input.chars().next() {
            Some(' ') | Some('\t') | Some('\r') | Some(';') => input = &input[1..],
            Some('\n') => {
                newlines += 1;
                input = &input[1..];
            },
            _ => break,
        }
    }
    if newlines > 1 {
        doc.clear();
    }
    let doc = if doc.is_empty() {
        None
    } else {
        Some(doc.join("\n"))
    };
    (input, doc)
}

/// If the input begins a string, rune, or comment, consumes it
fn lex_skip(input: Input) -> Option<Input> {
    if input.starts_with("//") {
        let end = input.find('\n').unwrap_or(input.len());
        return Some(&input[end..]);
    }
    if input.starts_with("/*") {
        return match input[2..].find("*/") {
            Some(end) => Some(&input[2 + end + 2..]),
            None => Some(""),
        };
    }
    if input.starts_with('"') || input.starts_with('\'') {
        let quote = input.as_bytes()[0];
        let bytes = input.as_bytes();
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b if b == quote => return Some(&input[i + 1..]),
                _ => i += 1,
            }
        }
        return Some("");
    }
    if input.starts_with('`') {
        return match input[1..].find('`') {
            Some(end) => Some(&input[1 + end + 1..]),
            None => Some(""),
        };
    }
    None
}

/// Skips one declaration we have no use for: everything up to a newline at
/// bracket depth zero, or past the closing brace of a body
fn skip_decl(input: Input) -> IResult<()> {
    let mut depth = 0usize;
    let mut rest = input;
    while !rest.is_empty() {
        if let Some(skipped) = lex_skip(rest) {
            rest = skipped;
            continue;
        }
        let c = rest.chars().next().expect("bug: empty input in skip loop");
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok((&rest[1..], ()));
                }
            },
            '\n' if depth == 0 => return Ok((rest, ())),
            _ => {},
        }
        rest = &rest[c.len_utf8()..];
    }
    Ok((rest, ()))
}

/// Consumes a brace-delimited block, string- and comment-aware
fn balanced_braces(input: Input) -> IResult<()> {
    if !input.starts_with('{') {
        return Err(nom::Err::Error((input, ErrorKind::Char)));
    }
    let mut depth = 0usize;
    let mut rest = input;
    while !rest.is_empty() {
        if let Some(skipped) = lex_skip(rest) {
            rest = skipped;
            continue;
        }
        let c = rest.chars().next().expect("bug: empty input in skip loop");
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&rest[1..], ()));
                }
            },
            _ => {},
        }
        rest = &rest[c.len_utf8()..];
    }
    Err(nom::Err::Failure((rest, ErrorKind::Char)))
}
