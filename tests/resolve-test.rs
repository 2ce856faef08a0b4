use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;

use implgen::flatten::FlattenError;
use implgen::loader::LoadError;
use implgen::package::FindError;
use implgen::{render_stub, resolve_methods, Error, Func, Loader, Param};

fn goroot() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("goroot")
}

fn goroot_loader() -> Loader {
    Loader::new(vec![goroot()])
}

fn param(name: &str, ty: &str) -> Param {
    Param {name: name.to_string(), ty: ty.to_string()}
}

fn func(name: &str, params: Vec<Param>, res: Vec<Param>) -> Func {
    Func {name: name.to_string(), params, res, doc: None}
}

#[test]
fn resolved_method_sets() {
    let loader = goroot_loader();
    let byte_results = || vec![param("n", "int"), param("err", "error")];
    let cases: Vec<(&str, Vec<Func>)> = vec![
        ("io.ReadWriter", vec![
            func("Read", vec![param("p", "[]byte")], byte_results()),
            func("Write", vec![param("p", "[]byte")], byte_results()),
        ]),
        ("io.ReadWriteCloser", vec![
            func("Read", vec![param("p", "[]byte")], byte_results()),
            func("Write", vec![param("p", "[]byte")], byte_results()),
            func("Close", Vec::new(), vec![param("", "error")]),
        ]),
        ("http.ResponseWriter", vec![
            func("Header", Vec::new(), vec![param("", "http.Header")]),
            func("Write", vec![param("", "[]byte")], vec![param("", "int"), param("", "error")]),
            func("WriteHeader", vec![param("statusCode", "int")], Vec::new()),
        ]),
        ("http.Handler", vec![
            func(
                "ServeHTTP",
                vec![param("", "http.ResponseWriter"), param("", "*http.Request")],
                Vec::new(),
            ),
        ]),
        ("ast.Node", vec![
            func("Pos", Vec::new(), vec![param("", "token.Pos")]),
            func("End", Vec::new(), vec![param("", "token.Pos")]),
        ]),
        ("cipher.AEAD", vec![
            func("NonceSize", Vec::new(), vec![param("", "int")]),
            func("Overhead", Vec::new(), vec![param("", "int")]),
            func(
                "Seal",
                vec![
                    param("dst", "[]byte"),
                    param("nonce", "[]byte"),
                    param("plaintext", "[]byte"),
                    param("additionalData", "[]byte"),
                ],
                vec![param("", "[]byte")],
            ),
            func(
                "Open",
                vec![
                    param("dst", "[]byte"),
                    param("nonce", "[]byte"),
                    param("ciphertext", "[]byte"),
                    param("additionalData", "[]byte"),
                ],
                vec![param("", "[]byte"), param("", "error")],
            ),
        ]),
        ("net.PacketReader", vec![
            func("Fragmented", Vec::new(), vec![param("", "bool")]),
            func("Read", vec![param("p", "[]byte")], byte_results()),
        ]),
    ];

    for (reference, want) in cases {
        let got = resolve_methods(reference, &loader)
            .unwrap_or_else(|err| panic!("resolve_methods({:?}) failed: {}", reference, err));
        assert_eq!(got, want, "methods of {}", reference);
    }
}

#[test]
fn full_and_short_paths_agree() {
    let loader = goroot_loader();
    let full = resolve_methods("net/http.Handler", &loader).expect("full path failed");
    let short = resolve_methods("http.Handler", &loader).expect("short name failed");
    assert_eq!(full, short);

    let direct = loader.load("net/http").expect("load failed");
    let scanned = loader.load("http").expect("load failed");
    assert!(Arc::ptr_eq(&direct, &scanned));
}

#[test]
fn resolution_is_order_stable() {
    let loader = goroot_loader();
    let first = resolve_methods("diamond.Txn", &loader).expect("resolution failed");
    let second = resolve_methods("diamond.Txn", &loader).expect("resolution failed");
    assert_eq!(first, second);

    let names: Vec<_> = first.iter().map(|method| method.name.as_str()).collect();
    assert_eq!(names, vec!["Rollback", "Close", "Commit"]);
}

#[test]
fn explicit_methods_shadow_embedded_ones() {
    let loader = goroot_loader();
    let funcs = resolve_methods("shadow.Tracer", &loader).expect("resolution failed");
    assert_eq!(funcs.len(), 1);
    assert_eq!(
        funcs[0].to_string(),
        "Log(event string, args ...interface{})",
    );
}

#[test]
fn aliased_imports_resolve_embeds() {
    let loader = goroot_loader();
    let funcs = resolve_methods("aliased.Source", &loader).expect("resolution failed");
    let rendered: Vec<String> = funcs.iter().map(|method| method.to_string()).collect();
    assert_eq!(rendered, vec![
        "Len() int",
        "Read(p []byte) (n int, err error)",
    ]);
}

#[test]
fn signature_rendering() {
    let loader = goroot_loader();
    let funcs = resolve_methods("kitchen.Sink", &loader).expect("resolution failed");
    let rendered: Vec<String> = funcs.iter().map(|method| method.to_string()).collect();
    assert_eq!(rendered, vec![
        "Printf(format string, args ...interface{}) (n int, err error)",
        "Watch(events <-chan string, out chan<- []byte) error",
        "Lookup(table map[string][]*kitchen.Result) (map[string]int, bool)",
        "Apply(fn func(key string) (bool, error)) error",
        "Raw() [4]byte",
        "Any() interface{}",
    ]);
}

#[test]
fn doc_comments_reach_the_stub() {
    let loader = goroot_loader();
    let funcs = resolve_methods("docs.Store", &loader).expect("resolution failed");
    assert_eq!(funcs.len(), 3);
    assert_eq!(
        funcs[0].doc.as_deref(),
        Some("// Put writes the blob under the given key,\n// replacing any previous value."),
    );
    assert_eq!(funcs[2].name, "reset");
    assert_eq!(funcs[2].doc, None);

    assert_eq!(
        render_stub("s *Memory", &funcs[0]),
        concat!(
            "// Put writes the blob under the given key,\n",
            "// replacing any previous value.\n",
            "func (s *Memory) Put(key string, blob []byte) error {\n",
            "\tpanic(\"not implemented\")\n",
            "}\n",
        ),
    );
}

#[test]
fn missing_identifiers_are_not_found() {
    let loader = goroot_loader();
    match resolve_methods("net.Tennis", &loader) {
        Err(Error::LookupError {source: FindError::NotFound {name, ..}}) => {
            assert_eq!(name, "Tennis");
        },
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn non_interfaces_are_rejected_by_kind() {
    let loader = goroot_loader();
    match resolve_methods("net.listener", &loader) {
        Err(Error::LookupError {source: FindError::NotAnInterface {kind, ..}}) => {
            assert_eq!(kind, "struct");
        },
        other => panic!("expected NotAnInterface, got {:?}", other),
    }
    match resolve_methods("http.HandlerFunc", &loader) {
        Err(Error::LookupError {source: FindError::NotAnInterface {kind, ..}}) => {
            assert_eq!(kind, "function");
        },
        other => panic!("expected NotAnInterface, got {:?}", other),
    }
}

#[test]
fn unknown_packages_fail_to_load() {
    let loader = goroot_loader();
    match resolve_methods("nosuch.Thing", &loader) {
        Err(Error::LoadError {source: LoadError::PackageNotFound {path}}) => {
            assert_eq!(path, "nosuch");
        },
        other => panic!("expected PackageNotFound, got {:?}", other),
    }
}

#[test]
fn malformed_references_fail_to_parse() {
    let loader = goroot_loader();
    for reference in &["", "nodot", "a + b", "a/b/c/", "net/http.", "pkg.Typ.Foo"] {
        match resolve_methods(reference, &loader) {
            Err(Error::ParseError {..}) => {},
            other => panic!("{:?} should fail to parse, got {:?}", reference, other),
        }
    }
}

#[test]
fn embedding_cycles_are_rejected() {
    let loader = goroot_loader();
    match resolve_methods("cycle.A", &loader) {
        Err(Error::FlattenError {source: FlattenError::EmbedCycle {..}}) => {},
        other => panic!("expected EmbedCycle, got {:?}", other),
    }

    // the same applies when the cycle crosses package boundaries
    match resolve_methods("loop/ping.Ping", &loader) {
        Err(Error::FlattenError {source: FlattenError::EmbedCycle {..}}) => {},
        other => panic!("expected EmbedCycle, got {:?}", other),
    }
}

#[test]
fn local_packages_stay_unqualified() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    fs::write(
        dir.path().join("main.go"),
        concat!(
            "package main\n",
            "\n",
            "type Greeting struct {\n",
            "\tText string\n",
            "}\n",
            "\n",
            "type Greeter interface {\n",
            "\tGreet(name string) Greeting\n",
            "}\n",
        ),
    ).expect("failed to write source");

    let loader = Loader::new(Vec::new()).with_local_root(dir.path());
    let funcs = resolve_methods(".Greeter", &loader).expect("resolution failed");
    assert_eq!(funcs.len(), 1);
    assert_eq!(funcs[0].to_string(), "Greet(name string) Greeting");
}

#[test]
fn concurrent_resolution_shares_the_cache() {
    let loader = goroot_loader();
    let refs: Vec<&str> = [
        "io.ReadWriter",
        "http.Handler",
        "net.Conn",
        "ast.Node",
        "cipher.AEAD",
        "diamond.Txn",
    ].iter().cycle().take(60).copied().collect();

    let results: Vec<Vec<Func>> = refs.par_iter()
        .map(|reference| {
            resolve_methods(reference, &loader)
                .unwrap_or_else(|err| panic!("resolve_methods({:?}) failed: {}", reference, err))
        })
        .collect();

    for (reference, got) in refs.iter().zip(&results) {
        let fresh = goroot_loader();
        let want = resolve_methods(reference, &fresh).expect("resolution failed");
        assert_eq!(got, &want, "methods of {}", reference);
    }

    // same-path loads all observe one package, loaded once
    let packages: Vec<_> = (0..16).into_par_iter()
        .map(|_| loader.load("io").expect("load failed"))
        .collect();
    for pkg in &packages {
        assert!(Arc::ptr_eq(pkg, &packages[0]));
    }
}
