//! Flattening an interface's full method set.
//!
//! Explicitly declared methods come first, in source order, followed by the
//! methods of each embedded interface expanded depth-first in embed order.
//! When a name is reachable through more than one path, the first occurrence
//! shadows the rest, mirroring promoted-method semantics.

use std::collections::HashSet;
use std::sync::Arc;

use snafu::{ensure, ResultExt, Snafu};

use crate::funcs::{Func, Param};
use crate::loader::{self, Loader};
use crate::package::{FindError, Method, Package};
use crate::ty::render_fields;

#[derive(Debug, Snafu)]
pub enum FlattenError {
    #[snafu(display("embedding cycle detected while expanding '{}'", display_ref(path, name)))]
    EmbedCycle { path: String, name: String },
    #[snafu(display("while loading an embedded interface: {}", source))]
    EmbedLoad { source: loader::LoadError },
    #[snafu(display("{}", source))]
    EmbedTarget { source: FindError },
}

fn display_ref(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Flattens the named interface of `pkg` into its ordered method set.
///
/// Resolving the same interface twice yields identical lists; the walk is
/// deterministic and follows declaration order only.
pub fn flatten(pkg: &Arc<Package>, name: &str, loader: &Loader) -> Result<Vec<Func>, FlattenError> {
    let mut flattener = Flattener {
        loader,
        funcs: Vec::new(),
        taken: HashSet::new(),
        expanding: HashSet::new(),
    };
    flattener.expand(pkg, name)?;
    Ok(flattener.funcs)
}

struct Flattener<'a> {
    loader: &'a Loader,
    funcs: Vec<Func>,
    /// Method names already produced; the first occurrence shadows later ones
    taken: HashSet<String>,
    /// Interface identities currently being expanded, for cycle detection
    expanding: HashSet<(String, String)>,
}

impl<'a> Flattener<'a> {
    fn expand(&mut self, pkg: &Arc<Package>, name: &str) -> Result<(), FlattenError> {
        let key = (pkg.path.clone(), name.to_string());
        ensure!(!self.expanding.contains(&key), EmbedCycle {path: pkg.path.clone(), name});

        let decl = pkg.interface(name).context(EmbedTarget)?;
        self.expanding.insert(key.clone());
        for method in &decl.methods {
            self.push_method(method, pkg);
        }
        for embed in &decl.embeds {
            match &embed.qualifier {
                // the builtin error interface lives in no package
                None if embed.name == "error" && !pkg.decls.contains_key("error") => {
                    self.push_builtin_error();
                },
                None => self.expand(pkg, &embed.name)?,
                Some(qualifier) => {
                    // resolve the qualifier through the declaring package's
                    // import table; an unlisted qualifier is tried as a path
                    // so short names still reach the loader's scan
                    let path = pkg.imports.get(qualifier).cloned()
                        .unwrap_or_else(|| qualifier.clone());
                    let target = self.loader.load(&path).context(EmbedLoad)?;
                    self.expand(&target, &embed.name)?;
                },
            }
        }
        self.expanding.remove(&key);
        Ok(())
    }

    fn push_builtin_error(&mut self) {
        if !self.taken.insert("Error".to_string()) {
            return;
        }
        self.funcs.push(Func {
            name: "Error".to_string(),
            params: Vec::new(),
            res: vec![Param {name: String::new(), ty: "string".to_string()}],
            doc: None,
        });
    }

    fn push_method(&mut self, method: &Method, pkg: &Package) {
        if !self.taken.insert(method.name.clone()) {
            // shadowed by an occurrence on a shorter embed path
            return;
        }
        let qualifier = pkg.qualifier();
        self.funcs.push(Func {
            name: method.name.clone(),
            params: render_fields(&method.params, qualifier),
            res: render_fields(&method.results, qualifier),
            doc: method.doc.clone(),
        });
    }
}
