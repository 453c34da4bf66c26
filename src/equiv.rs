//! α-equivalence: equality up to consistent renaming of bound variables.
//! Both trees are walked in lock-step with a scope stack each; a variable is
//! identified by the depth of the binder that introduced it, or by its name
//! when free. Nothing here depends on node identity, so cloning never
//! changes the answer.

use std::collections::BTreeSet;

use crate::{
    analysis,
    ast::Term,
    eval::{self, Context, SilentTracer},
    printer::Flags,
};

/// A variable occurrence identified independently of bound-variable names:
/// the innermost-first index of its binder, or its own name when free.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug)]
enum Occurrence<'a> {
    Bound(usize),
    Free(&'a str),
}

fn resolve<'a>(name: &'a str, scope: &[String]) -> Occurrence<'a> {
    scope
        .iter()
        .rev()
        .position(|bound| bound == name)
        .map(Occurrence::Bound)
        .unwrap_or(Occurrence::Free(name))
}

// The variables occurring free within one binder level of `term`, resolved
// against the enclosing scope. Comparing these per node prunes mismatching
// branches before the full descent reaches them.
fn shallow_occurrences<'a>(term: &'a Term, scope: &[String]) -> BTreeSet<Occurrence<'a>> {
    analysis::free_variables_bounded(term, 1)
        .into_iter()
        .filter_map(|var| match var {
            Term::Var { name, .. } => Some(resolve(name, scope)),
            _ => None,
        })
        .collect()
}

/// Structural α-equivalence of two terms.
pub fn alpha_eq(a: &Term, b: &Term) -> bool {
    fn go(a: &Term, b: &Term, scope_a: &mut Vec<String>, scope_b: &mut Vec<String>) -> bool {
        if !a.same_variant(b) {
            return false;
        }
        if shallow_occurrences(a, scope_a) != shallow_occurrences(b, scope_b) {
            return false;
        }
        match (a, b) {
            (Term::Var { name: na, .. }, Term::Var { name: nb, .. }) => {
                resolve(na, scope_a) == resolve(nb, scope_b)
            }
            (
                Term::Apply {
                    fun: fa, arg: aa, ..
                },
                Term::Apply {
                    fun: fb, arg: ab, ..
                },
            ) => go(fa, fb, scope_a, scope_b) && go(aa, ab, scope_a, scope_b),
            (
                Term::Lambda {
                    param: pa,
                    body: ba,
                    ..
                },
                Term::Lambda {
                    param: pb,
                    body: bb,
                    ..
                },
            ) => {
                scope_a.push(pa.clone());
                scope_b.push(pb.clone());
                let equivalent = go(ba, bb, scope_a, scope_b);
                scope_a.pop();
                scope_b.pop();
                equivalent
            }
            (
                Term::Let {
                    name: na,
                    value: va,
                    ..
                },
                Term::Let {
                    name: nb,
                    value: vb,
                    ..
                },
            ) => na == nb && go(va, vb, scope_a, scope_b),
            _ => false,
        }
    }
    go(a, b, &mut Vec::new(), &mut Vec::new())
}

/// Is `a` α-equivalent to what `b` reduces to under `ctx`? Used to look up
/// an already-reduced term among the named definitions, so only the second
/// argument is evaluated.
pub fn alpha_equivalent(ctx: &Context, a: &Term, b: &Term) -> bool {
    let reduced = eval::reduce(ctx, b, Flags::empty(), &mut SilentTracer);
    alpha_eq(a, &reduced)
}
