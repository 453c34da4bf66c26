//! Pure variable queries over terms: free occurrences, bound binders, and
//! substitution slots. Traversal order is `Apply.fun` before `Apply.arg`
//! throughout, which fixes the order of trace entries.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{Child, Path, Term};

/// Free `Var` occurrences of `term`, one entry per occurrence.
pub fn free_variables(term: &Term) -> Vec<&Term> {
    free_variables_bounded(term, usize::MAX)
}

/// Like [`free_variables`], but stops descending into `Lambda` bodies once
/// `max_depth` binders have been crossed. The α-equivalence check uses this
/// to look at one binder level at a time.
pub fn free_variables_bounded(term: &Term, max_depth: usize) -> Vec<&Term> {
    fn go<'a>(
        term: &'a Term,
        bound: &mut Vec<&'a str>,
        depth: usize,
        max_depth: usize,
        out: &mut Vec<&'a Term>,
    ) {
        match term {
            Term::Var { name, .. } => {
                if !bound.iter().any(|b| b == name) {
                    out.push(term);
                }
            }
            Term::Apply { fun, arg, .. } => {
                go(fun, bound, depth, max_depth, out);
                go(arg, bound, depth, max_depth, out);
            }
            Term::Lambda { param, body, .. } => {
                if depth < max_depth {
                    bound.push(param);
                    go(body, bound, depth + 1, max_depth, out);
                    bound.pop();
                }
            }
            Term::Let { value, .. } => go(value, bound, depth, max_depth, out),
        }
    }
    let mut out = Vec::new();
    go(term, &mut Vec::new(), 0, max_depth, &mut out);
    out
}

/// The set of free variable names of `term`.
pub fn free_names(term: &Term) -> BTreeSet<String> {
    free_variables(term)
        .into_iter()
        .filter_map(|term| match term {
            Term::Var { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

/// Every name bound by some `Lambda` in `term`, mapped to the outermost
/// binder of that name. Renaming that binder (and, through the collision
/// rule, any same-named binder nested below it) is what β-reduction needs
/// to avoid capture, so binders are recorded whether or not their variable
/// ever occurs.
pub fn bound_variables(term: &Term) -> BTreeMap<&str, &Term> {
    fn go<'a>(term: &'a Term, out: &mut BTreeMap<&'a str, &'a Term>) {
        match term {
            Term::Var { .. } => {}
            Term::Apply { fun, arg, .. } => {
                go(fun, out);
                go(arg, out);
            }
            Term::Lambda { param, body, .. } => {
                out.entry(param).or_insert(term);
                go(body, out);
            }
            Term::Let { value, .. } => go(value, out),
        }
    }
    let mut out = BTreeMap::new();
    go(term, &mut out);
    out
}

/// The path of the outermost (leftmost) `Lambda` in `term` binding `name`.
pub fn binder_path(term: &Term, name: &str) -> Option<Path> {
    fn go(term: &Term, name: &str, path: &mut Path) -> bool {
        match term {
            Term::Apply { fun, arg, .. } => {
                path.push(Child::Fun);
                if go(fun, name, path) {
                    return true;
                }
                path.pop();
                path.push(Child::Arg);
                if go(arg, name, path) {
                    return true;
                }
                path.pop();
                false
            }
            Term::Lambda { param, body, .. } => {
                if param == name {
                    return true;
                }
                path.push(Child::Body);
                if go(body, name, path) {
                    return true;
                }
                path.pop();
                false
            }
            _ => false,
        }
    }
    let mut path = Path::new();
    go(term, name, &mut path).then_some(path)
}

/// The slots in `term` that a β-reduction substituting `name` writes to:
/// every free occurrence of `name`, stopping at any `Lambda` that re-binds
/// it.
pub fn find_occurrences<'a>(term: &'a mut Term, name: &str) -> Vec<&'a mut Term> {
    fn go<'a>(term: &'a mut Term, name: &str, out: &mut Vec<&'a mut Term>) {
        match term {
            Term::Var { .. } => {
                if matches!(&*term, Term::Var { name: n, .. } if n == name) {
                    out.push(term);
                }
            }
            Term::Apply { fun, arg, .. } => {
                go(fun, name, out);
                go(arg, name, out);
            }
            Term::Lambda { param, body, .. } => {
                if param != name {
                    go(body, name, out);
                }
            }
            Term::Let { .. } => {}
        }
    }
    let mut out = Vec::new();
    go(term, name, &mut out);
    out
}

/// The same slots as [`find_occurrences`], as paths. The trace uses these to
/// point at the substituted sub-terms after the tree has been rewritten.
pub fn occurrence_paths(term: &Term, name: &str) -> Vec<Path> {
    fn go(term: &Term, name: &str, path: &mut Path, out: &mut Vec<Path>) {
        match term {
            Term::Var { name: n, .. } => {
                if n == name {
                    out.push(path.clone());
                }
            }
            Term::Apply { fun, arg, .. } => {
                path.push(Child::Fun);
                go(fun, name, path, out);
                path.pop();
                path.push(Child::Arg);
                go(arg, name, path, out);
                path.pop();
            }
            Term::Lambda { param, body, .. } => {
                if param != name {
                    path.push(Child::Body);
                    go(body, name, path, out);
                    path.pop();
                }
            }
            Term::Let { .. } => {}
        }
    }
    let mut out = Vec::new();
    go(term, name, &mut Path::new(), &mut out);
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;

    fn names(vars: Vec<&Term>) -> Vec<&str> {
        vars.iter()
            .map(|v| match v {
                Term::Var { name, .. } => name.as_str(),
                _ => panic!("free_variables returned a non-variable"),
            })
            .collect()
    }

    #[test]
    fn test_free_variables_by_occurrence() {
        let term = parse("x (λy.x y z) x").unwrap();
        assert_eq!(names(free_variables(&term)), vec!["x", "x", "z", "x"]);
    }

    #[test]
    fn test_free_variables_depth_bound() {
        let term = parse("λa.λb.c").unwrap();
        assert_eq!(names(free_variables_bounded(&term, 1)), Vec::<&str>::new());
        assert_eq!(names(free_variables_bounded(&term, 2)), vec!["c"]);
        assert_eq!(names(free_variables_bounded(&term, 0)), Vec::<&str>::new());
    }

    #[test]
    fn test_bound_variables_keeps_outermost() {
        let term = parse("λx.(λy.λx.x) y").unwrap();
        let bound = bound_variables(&term);
        assert_eq!(bound.keys().copied().collect::<Vec<_>>(), vec!["x", "y"]);
        // the outer λx wins over the nested one
        assert!(std::ptr::eq(bound["x"], &term));
        // unused binders are still recorded
        assert!(bound.contains_key("y"));
    }

    #[test]
    fn test_binder_path_is_outermost() {
        let term = parse("λx.λy.λx.x").unwrap();
        assert_eq!(binder_path(&term, "x"), Some(vec![]));
        assert_eq!(
            binder_path(&term, "y"),
            Some(vec![crate::ast::Child::Body])
        );
        assert_eq!(binder_path(&term, "z"), None);
    }

    #[test]
    fn test_occurrences_stop_at_rebinders() {
        let mut term = parse("x (λx.x) (λy.x)").unwrap();
        let paths = occurrence_paths(&term, "x");
        assert_eq!(paths.len(), 2);
        let slots = find_occurrences(&mut term, "x");
        assert_eq!(slots.len(), 2);
        for slot in &slots {
            assert!(matches!(&**slot, Term::Var { name, .. } if name == "x"));
        }
    }

    #[test]
    fn test_occurrence_paths_match_slots() {
        let original = parse("λf.f x (λx.x f) x").unwrap();
        let paths = occurrence_paths(&original, "x");
        let mut copy = original.clone();
        let slots = find_occurrences(&mut copy, "x");
        assert_eq!(paths.len(), slots.len());
        for (path, slot) in paths.iter().zip(&slots) {
            assert_eq!(original.get(path), Some(&**slot));
        }
    }
}
