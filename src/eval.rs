//! The rewriter: context inlining, capture-avoiding α-conversion, β-reduction
//! and the normal-order reduction driver. Reduction mutates a private clone
//! of the input in place; redexes and substitution sites are addressed by
//! paths from the root, which stay meaningful across rewrites and let the
//! trace point at sub-terms of both the before and the after tree.

use std::collections::BTreeMap;

use ariadne::{Color, Fmt};

use crate::{
    analysis,
    ast::{Child, Path, Term},
    printer::{self, Flags},
};

/// Interpreter state: the flag set and the top-level `let` definitions.
#[derive(Default)]
pub struct Context {
    pub flags: Flags,
    pub definitions: BTreeMap<String, Term>,
}

/// A rendered whole-term snapshot: the term text and the aligned marker line.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub text: String,
    pub marks: String,
}

#[derive(Debug)]
pub struct AlphaEvent {
    pub step: usize,
    pub from: String,
    pub to: String,
    pub before: Option<Snapshot>,
    pub after: Option<Snapshot>,
}

#[derive(Debug)]
pub struct BetaEvent {
    pub step: usize,
    pub param: String,
    pub argument: String,
    pub sites: usize,
    pub before: Option<Snapshot>,
    pub after: Option<Snapshot>,
}

/// Observer for reduction. Events arrive in reduction order; snapshots are
/// present only when both `TRACE` and `FULL_TRACE` are set.
pub trait Tracer {
    fn defined(&mut self, _name: &str, _redefined: bool) {}
    fn begin(&mut self, _term: &Term) {}
    fn alpha(&mut self, _event: AlphaEvent) {}
    fn beta(&mut self, _event: BetaEvent) {}
    fn finish(&mut self) {}
}

/// Discards every event; used when reducing internally (α-equivalence).
pub struct SilentTracer;
impl Tracer for SilentTracer {}

/// Prints the numbered step list to stdout, honouring `TRACE`/`FULL_TRACE`.
pub struct ConsoleTracer {
    flags: Flags,
}

impl ConsoleTracer {
    pub fn new(flags: Flags) -> Self {
        Self { flags }
    }

    fn snapshots(&self, before: &Option<Snapshot>, after: &Option<Snapshot>) {
        if let (Some(before), Some(after)) = (before, after) {
            println!("     {}", before.text);
            println!("     {}", before.marks);
            println!("   > {}", after.text);
            println!("     {}", after.marks);
            println!();
        }
    }
}

impl Tracer for ConsoleTracer {
    fn defined(&mut self, name: &str, redefined: bool) {
        if self.flags.contains(Flags::TRACE) {
            let verb = if redefined { "redefined:" } else { "defined:" };
            println!("*. {} {name}", verb.fg(Color::Blue));
        }
    }

    fn begin(&mut self, term: &Term) {
        if self.flags.contains(Flags::TRACE) {
            println!("0. {}", printer::print(term, self.flags));
        }
    }

    fn alpha(&mut self, event: AlphaEvent) {
        if self.flags.contains(Flags::TRACE) {
            println!(
                "{}. {} {} <- {}",
                event.step,
                "α-con:".fg(Color::Green),
                event.from,
                event.to
            );
            self.snapshots(&event.before, &event.after);
        }
    }

    fn beta(&mut self, event: BetaEvent) {
        if self.flags.contains(Flags::TRACE) {
            println!(
                "{}. {} {} <- {}",
                event.step,
                "β-red:".fg(Color::Yellow),
                event.param,
                event.argument
            );
            self.snapshots(&event.before, &event.after);
        }
    }

    fn finish(&mut self) {
        if self.flags.contains(Flags::TRACE) {
            println!("*. {}", "done.".fg(Color::Blue));
        }
    }
}

pub fn fresh_name(name: &str) -> String {
    format!("{name}'")
}

/// Renames `from` to `to` under `binder`, replacing the binder's own
/// parameter as well. An inner binder already named `to` is first renamed to
/// a fresher name so the original rename can proceed without capture.
pub fn alpha_convert(binder: &mut Term, from: &str, to: &str) {
    match binder {
        Term::Var { name, .. } => {
            if name == from {
                *name = to.to_owned();
            }
        }
        Term::Apply { fun, arg, .. } => {
            alpha_convert(fun, from, to);
            alpha_convert(arg, from, to);
        }
        Term::Lambda { param, body, .. } => {
            if param == to {
                let fresher = fresh_name(to);
                alpha_convert(body, to, &fresher);
                *param = fresher;
                alpha_convert(body, from, to);
            } else {
                if param == from {
                    *param = to.to_owned();
                }
                alpha_convert(body, from, to);
            }
        }
        Term::Let { value, .. } => alpha_convert(value, from, to),
    }
}

/// A fresh copy of `term` with every free variable that names a definition
/// replaced by a clone of that definition. Single pass: right-hand sides are
/// inserted as written, so chained definitions resolve one level per
/// evaluation.
pub fn inline_definitions(ctx: &Context, term: &Term) -> Term {
    fn go(definitions: &BTreeMap<String, Term>, bound: &mut Vec<String>, term: &Term) -> Term {
        match term {
            Term::Var { name, .. } => {
                if !bound.iter().any(|b| b == name) {
                    if let Some(value) = definitions.get(name) {
                        return value.clone();
                    }
                }
                term.clone()
            }
            Term::Apply { fun, arg, span } => Term::Apply {
                fun: go(definitions, bound, fun).into(),
                arg: go(definitions, bound, arg).into(),
                span: span.clone(),
            },
            Term::Lambda {
                param,
                param_span,
                body,
                span,
            } => {
                bound.push(param.clone());
                let body = go(definitions, bound, body);
                bound.pop();
                Term::Lambda {
                    param: param.clone(),
                    param_span: param_span.clone(),
                    body: body.into(),
                    span: span.clone(),
                }
            }
            Term::Let {
                name,
                name_span,
                value,
                span,
            } => Term::Let {
                name: name.clone(),
                name_span: name_span.clone(),
                value: go(definitions, bound, value).into(),
                span: span.clone(),
            },
        }
    }
    go(&ctx.definitions, &mut Vec::new(), term)
}

/// Locates the leftmost-outermost redex: the application itself if its head
/// is a lambda, else the head, else the argument, descending through lambda
/// bodies. Returns false (leaving `path` partial) when the term is normal.
fn find_redex(term: &Term, path: &mut Path) -> bool {
    match term {
        Term::Apply { fun, arg, .. } => {
            if fun.is_lambda() {
                return true;
            }
            path.push(Child::Fun);
            if find_redex(fun, path) {
                return true;
            }
            path.pop();
            path.push(Child::Arg);
            if find_redex(arg, path) {
                return true;
            }
            path.pop();
            false
        }
        Term::Lambda { body, .. } => {
            path.push(Child::Body);
            if find_redex(body, path) {
                return true;
            }
            path.pop();
            false
        }
        _ => false,
    }
}

const OVERLINE: &str = "\u{203e}";

fn alpha_mark() -> String {
    format!("{}", OVERLINE.fg(Color::Green))
}
fn subst_mark() -> String {
    format!("{}", OVERLINE.fg(Color::Blue))
}
fn argument_mark() -> String {
    format!("{}", OVERLINE.fg(Color::Green))
}
fn param_mark() -> String {
    format!("{}", "^".fg(Color::Yellow))
}

fn alpha_snapshot(root: &Term, binder: &[Child], flags: Flags) -> Snapshot {
    let target = root.get(binder).expect("binder path resolves");
    let (text, marks) = printer::highlight(
        root,
        &|term| std::ptr::eq(term, target).then(alpha_mark),
        &|_| None,
        flags,
    );
    Snapshot { text, marks }
}

fn beta_before_snapshot(root: &Term, redex: &[Child], sites: &[Path], flags: Flags) -> Snapshot {
    let Some(Term::Apply { fun, arg, .. }) = root.get(redex) else {
        unreachable!("redex path points at an application")
    };
    let Term::Lambda { body, .. } = fun.as_ref() else {
        unreachable!("redex head is a lambda")
    };
    let slots: Vec<&Term> = sites
        .iter()
        .map(|site| body.get(site).expect("site path resolves"))
        .collect();
    let arg: &Term = arg;
    let head: &Term = fun;
    let (text, marks) = printer::highlight(
        root,
        &|term| {
            if std::ptr::eq(term, arg) {
                Some(argument_mark())
            } else if slots.iter().any(|slot| std::ptr::eq(*slot, term)) {
                Some(subst_mark())
            } else {
                None
            }
        },
        &|lambda| std::ptr::eq(lambda, head).then(param_mark),
        flags,
    );
    Snapshot { text, marks }
}

fn beta_after_snapshot(root: &Term, redex: &[Child], sites: &[Path], flags: Flags) -> Snapshot {
    let spliced = root.get(redex).expect("redex path resolves");
    let slots: Vec<&Term> = sites
        .iter()
        .map(|site| spliced.get(site).expect("site path resolves"))
        .collect();
    let (text, marks) = printer::highlight(
        root,
        &|term| {
            slots
                .iter()
                .any(|slot| std::ptr::eq(*slot, term))
                .then(subst_mark)
        },
        &|_| None,
        flags,
    );
    Snapshot { text, marks }
}

/// One β-step at `path`: α-convert colliding binders in the head, then
/// substitute a clone of the argument at every slot and splice the body over
/// the application.
fn beta_step(
    root: &mut Term,
    path: &[Child],
    flags: Flags,
    tracer: &mut dyn Tracer,
    step: &mut usize,
) {
    let full = flags.contains(Flags::TRACE) && flags.contains(Flags::FULL_TRACE);

    // rename until no free variable of the argument is bound in the head
    loop {
        let Some(Term::Apply { fun, arg, .. }) = root.get(path) else {
            unreachable!("redex path points at an application")
        };
        let free = analysis::free_names(arg);
        let bound = analysis::bound_variables(fun);
        let Some(name) = free.iter().find(|n| bound.contains_key(n.as_str())) else {
            break;
        };
        let name = name.clone();
        let rel = analysis::binder_path(fun, &name).expect("colliding binder resolves");
        // a candidate that already occurs free in the head would be captured
        // by the very rename that is supposed to prevent capture
        let head_free = analysis::free_names(fun);
        let mut fresh = fresh_name(&name);
        while head_free.contains(&fresh) {
            fresh = fresh_name(&fresh);
        }

        let mut binder = path.to_vec();
        binder.push(Child::Fun);
        binder.extend(rel);

        let before = full.then(|| alpha_snapshot(root, &binder, flags));
        alpha_convert(
            root.get_mut(&binder).expect("binder path resolves"),
            &name,
            &fresh,
        );
        let after = full.then(|| alpha_snapshot(root, &binder, flags));
        tracer.alpha(AlphaEvent {
            step: *step,
            from: name,
            to: fresh,
            before,
            after,
        });
        *step += 1;
    }

    let (param, sites, argument, before) = {
        let Some(Term::Apply { fun, arg, .. }) = root.get(path) else {
            unreachable!("redex path points at an application")
        };
        let Term::Lambda { param, body, .. } = fun.as_ref() else {
            unreachable!("redex head is a lambda")
        };
        let sites = analysis::occurrence_paths(body, param);
        let argument = printer::print(arg, flags);
        let before = full.then(|| beta_before_snapshot(root, path, &sites, flags));
        (param.clone(), sites, argument, before)
    };

    let slot = root.get_mut(path).expect("redex path resolves");
    let app = std::mem::replace(
        &mut *slot,
        Term::Var {
            name: String::new(),
            span: 0..0,
        },
    );
    let Term::Apply { fun, arg, .. } = app else {
        unreachable!("redex path points at an application")
    };
    let Term::Lambda { mut body, .. } = *fun else {
        unreachable!("redex head is a lambda")
    };
    for occurrence in analysis::find_occurrences(&mut body, &param) {
        *occurrence = (*arg).clone();
    }
    *slot = *body;

    let after = full.then(|| beta_after_snapshot(root, path, &sites, flags));
    tracer.beta(BetaEvent {
        step: *step,
        param,
        argument,
        sites: sites.len(),
        before,
        after,
    });
    *step += 1;
}

/// Reduces `term` to normal form under `ctx` (which is only borrowed):
/// inline the definitions, then rewrite the leftmost-outermost redex until
/// none remains. Diverging terms keep this loop running; bounding the work
/// is the caller's business.
pub fn reduce(ctx: &Context, term: &Term, flags: Flags, tracer: &mut dyn Tracer) -> Term {
    let mut term = inline_definitions(ctx, term);
    tracer.begin(&term);
    let mut step = 1;
    loop {
        let mut path = Path::new();
        if !find_redex(&term, &mut path) {
            break;
        }
        beta_step(&mut term, &path, flags, tracer, &mut step);
    }
    tracer.finish();
    term
}

/// Evaluates one statement. A `let` stores its right-hand side (as written)
/// and is the only input that mutates `ctx`; everything else reduces.
pub fn evaluate_with(
    ctx: &mut Context,
    term: &Term,
    flags: Flags,
    tracer: &mut dyn Tracer,
) -> Term {
    if let Term::Let { name, value, .. } = term {
        let redefined = ctx.definitions.contains_key(name);
        ctx.definitions.insert(name.clone(), value.as_ref().clone());
        tracer.defined(name, redefined);
        return value.as_ref().clone();
    }
    reduce(ctx, term, flags, tracer)
}

pub fn evaluate(ctx: &mut Context, term: &Term, flags: Flags) -> Term {
    let mut tracer = ConsoleTracer::new(flags);
    evaluate_with(ctx, term, flags, &mut tracer)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{equiv::alpha_eq, parser::parse};

    #[derive(Default)]
    struct Recording {
        defined: Vec<(String, bool)>,
        alphas: Vec<(String, String)>,
        betas: Vec<BetaEvent>,
    }
    impl Tracer for Recording {
        fn defined(&mut self, name: &str, redefined: bool) {
            self.defined.push((name.to_owned(), redefined));
        }
        fn alpha(&mut self, event: AlphaEvent) {
            self.alphas.push((event.from, event.to));
        }
        fn beta(&mut self, event: BetaEvent) {
            self.betas.push(event);
        }
    }

    fn run(input: &str) -> (Term, Recording) {
        let mut recording = Recording::default();
        let term = reduce(
            &Context::default(),
            &parse(input).unwrap(),
            Flags::empty(),
            &mut recording,
        );
        (term, recording)
    }

    #[test]
    fn test_identity_application() {
        let (term, recording) = run("(λx.x) a");
        assert_eq!(term, parse("a").unwrap());
        assert_eq!(recording.betas.len(), 1);
        assert!(recording.alphas.is_empty());
    }

    #[test]
    fn test_two_arguments() {
        let (term, _) = run("(λx.λy.x) p q");
        assert_eq!(term, parse("p").unwrap());
    }

    #[test]
    fn test_s_k_k_is_identity() {
        let (term, _) = run(r"(\x y z -> x z (y z)) (\x y -> x) (\x y -> x)");
        assert!(alpha_eq(&term, &parse("λz.z").unwrap()));
        let flags = Flags::ABBREV_LAMBDA | Flags::ABBREV_PARENS | Flags::HASKELL_STYLE;
        assert_eq!(printer::print(&term, flags), r"\z -> z");
    }

    #[test]
    fn test_capture_avoidance() {
        let (term, recording) = run("(λx.λy.x) y");
        assert_eq!(term, parse("λy'.y").unwrap());
        assert_eq!(
            recording.alphas,
            vec![("y".to_owned(), "y'".to_owned())]
        );
    }

    #[test]
    fn test_capture_avoidance_through_nested_binder() {
        let (term, _) = run("(λx.λy.λy'.x) y");
        assert!(alpha_eq(&term, &parse("λa.λb.y").unwrap()));
        let Term::Lambda { body, .. } = &term else {
            panic!("expected a lambda");
        };
        let Term::Lambda { body, .. } = body.as_ref() else {
            panic!("expected a nested lambda");
        };
        assert_eq!(body.as_ref(), &parse("y").unwrap());
    }

    #[test]
    fn test_fresh_name_collides_with_argument() {
        // the first fresh candidate y' is itself free in the argument
        let (term, recording) = run("(λx.λy.λy.x) (y y')");
        assert!(alpha_eq(&term, &parse("λa.λb.y y'").unwrap()));
        assert!(recording.alphas.len() >= 2);
    }

    #[test]
    fn test_fresh_name_avoids_free_variables_of_the_head() {
        // naively renaming y to y' would capture the free y' in the body
        let (term, _) = run("(λx.λy.y' x) y");
        assert!(alpha_eq(&term, &parse("λa.y' y").unwrap()));
    }

    #[test]
    fn test_shadowing_blocks_substitution() {
        let (term, recording) = run("(λx.λx.x) a");
        assert_eq!(term, parse("λx.x").unwrap());
        assert_eq!(recording.betas.len(), 1);
        assert_eq!(recording.betas[0].sites, 0);
    }

    #[test]
    fn test_reduction_under_lambda() {
        let (term, _) = run("λx.(λy.y) x");
        assert_eq!(term, parse("λx.x").unwrap());
    }

    #[test]
    fn test_stuck_argument_still_normalises() {
        let (term, _) = run("f ((λx.x) a)");
        assert_eq!(term, parse("f a").unwrap());
    }

    #[test]
    fn test_self_application_steps_to_itself() {
        let input = parse("(λx.x x) (λx.x x)").unwrap();
        let mut term = input.clone();
        let mut step = 1;
        for _ in 0..5 {
            let mut path = Path::new();
            assert!(find_redex(&term, &mut path));
            beta_step(&mut term, &path, Flags::empty(), &mut SilentTracer, &mut step);
            assert_eq!(term, input);
        }
    }

    #[test]
    fn test_normal_order_avoids_diverging_argument() {
        // applicative order would loop on the argument
        let (term, _) = run("(λx.λy.y) ((λx.x x) (λx.x x)) a");
        assert_eq!(term, parse("a").unwrap());
    }

    #[test]
    fn test_church_rosser_on_renamed_input() {
        let (a, _) = run("(λx.λy.x) a");
        let (b, _) = run("(λp.λq.p) a");
        assert!(alpha_eq(&a, &b));
    }

    #[test]
    fn test_alpha_convert_preserves_equivalence() {
        let original = parse("λx.x (λy.x y)").unwrap();
        let mut renamed = original.clone();
        alpha_convert(&mut renamed, "x", "z");
        assert_eq!(renamed, parse("λz.z (λy.z y)").unwrap());
        assert!(alpha_eq(&original, &renamed));
    }

    #[test]
    fn test_alpha_convert_freshens_colliding_binder() {
        let mut term = parse("λx.λx'.x").unwrap();
        alpha_convert(&mut term, "x", "x'");
        assert_eq!(term, parse("λx'.λx''.x'").unwrap());
    }

    #[test]
    fn test_let_updates_definitions() {
        let mut ctx = Context::default();
        let mut recording = Recording::default();
        let stmt = parse("let I = λx.x").unwrap();
        evaluate_with(&mut ctx, &stmt, Flags::empty(), &mut recording);
        assert_eq!(ctx.definitions["I"], parse("λx.x").unwrap());
        evaluate_with(&mut ctx, &stmt, Flags::empty(), &mut recording);
        assert_eq!(
            recording.defined,
            vec![("I".to_owned(), false), ("I".to_owned(), true)]
        );
        assert_eq!(ctx.definitions.len(), 1);
    }

    #[test]
    fn test_inlining_definitions() {
        let mut ctx = Context::default();
        evaluate(&mut ctx, &parse("let I = λx.x").unwrap(), Flags::empty());
        let result = evaluate(&mut ctx, &parse("I a").unwrap(), Flags::empty());
        assert_eq!(result, parse("a").unwrap());
    }

    #[test]
    fn test_shadowed_names_are_not_inlined() {
        let mut ctx = Context::default();
        evaluate(&mut ctx, &parse("let a = λx.x").unwrap(), Flags::empty());
        let result = evaluate(&mut ctx, &parse("λa.a").unwrap(), Flags::empty());
        assert_eq!(result, parse("λa.a").unwrap());
    }

    #[test]
    fn test_inlining_is_single_pass() {
        let mut ctx = Context::default();
        evaluate(&mut ctx, &parse("let A = B").unwrap(), Flags::empty());
        evaluate(&mut ctx, &parse("let B = λx.x").unwrap(), Flags::empty());
        // A resolves to B in one pass; B stays as written
        let result = evaluate(&mut ctx, &parse("A").unwrap(), Flags::empty());
        assert_eq!(result, parse("B").unwrap());
    }

    #[test]
    fn test_inlining_disjoint_context_is_identity() {
        let mut ctx = Context::default();
        evaluate(&mut ctx, &parse("let I = λx.x").unwrap(), Flags::empty());
        let term = parse("λa.a b").unwrap();
        assert_eq!(inline_definitions(&ctx, &term), term);
    }

    #[test]
    fn test_full_trace_snapshots() {
        let flags = Flags::TRACE | Flags::FULL_TRACE;
        let mut recording = Recording::default();
        reduce(
            &Context::default(),
            &parse("(λx.x x) a").unwrap(),
            flags,
            &mut recording,
        );
        assert_eq!(recording.betas.len(), 1);
        let event = &recording.betas[0];
        assert_eq!(event.sites, 2);
        assert_eq!(event.param, "x");
        assert_eq!(event.argument, "a");
        let before = event.before.as_ref().expect("before snapshot");
        assert_eq!(before.text, "(λx.x (x)) (a)");
        let after = event.after.as_ref().expect("after snapshot");
        assert_eq!(after.text, "a (a)");
    }
}
