//! Flag-driven term rendering. Every printing entry point goes through the
//! same traversal, which emits the term text together with a parallel marker
//! line: a per-sub-term predicate can claim a (coloured) marker character,
//! and the marker is inherited by everything rendered inside that sub-term.
//! The plain printers simply drop the marker line.

use std::collections::BTreeSet;

use crate::ast::Term;

/// User-toggled rendering and tracing options, kept as one bitset on the
/// interpreter context.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Flags(u32);

impl Flags {
    /// Print `λx y.B` instead of `λx.λy.B`.
    pub const ABBREV_LAMBDA: Self = Self(0x1);
    /// Omit parentheses around variable (and lambda) arguments.
    pub const ABBREV_PARENS: Self = Self(0x2);
    /// Print `\x -> B` instead of `λx.B`.
    pub const HASKELL_STYLE: Self = Self(0x4);
    /// Suppress result printing.
    pub const NO_PRINT: Self = Self(0x8);
    /// Print the numbered list of reduction steps.
    pub const TRACE: Self = Self(0x10);
    /// Additionally print the before/after highlight pair for each step.
    pub const FULL_TRACE: Self = Self(0x20);
    /// Report results as named definitions when α-equivalent to one.
    pub const VAR_REPLACEMENT: Self = Self(0x40);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn toggle(&mut self, other: Self) {
        self.0 ^= other.0;
    }
}

impl std::ops::BitOr for Flags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

pub type MarkFn<'a> = &'a dyn Fn(&Term) -> Option<String>;

struct Renderer<'a> {
    flags: Flags,
    mark: MarkFn<'a>,
    param_mark: MarkFn<'a>,
    replace: Option<MarkFn<'a>>,
    // parameters folded into the current `λx y z.` group
    folded: BTreeSet<String>,
    marks: Vec<String>,
}

fn emit(top: &mut String, bot: &mut String, text: &str, mark: &str) {
    top.push_str(text);
    for _ in text.chars() {
        bot.push_str(mark);
    }
}

impl Renderer<'_> {
    fn render(
        &mut self,
        term: &Term,
        top: &mut String,
        bot: &mut String,
        combine: bool,
        omit_lambda_parens: bool,
    ) {
        let pushed = if let Some(mark) = (self.mark)(term) {
            self.marks.push(mark);
            true
        } else {
            false
        };
        let mark = self.marks.last().cloned().unwrap_or_else(|| " ".to_owned());

        if let Some(replacement) = self.replace.and_then(|replace| replace(term)) {
            emit(top, bot, &replacement, &mark);
            if pushed {
                self.marks.pop();
            }
            return;
        }

        match term {
            Term::Var { name, .. } => emit(top, bot, name, &mark),
            Term::Apply { fun, arg, .. } => {
                self.render(fun, top, bot, false, false);
                emit(top, bot, " ", &mark);

                let abbrev = self.flags.contains(Flags::ABBREV_PARENS);
                let close = !(abbrev && arg.is_var());
                if close {
                    emit(top, bot, "(", &mark);
                }
                let omit_inner = abbrev && arg.is_lambda();
                self.render(arg, top, bot, false, omit_inner);
                if close {
                    emit(top, bot, ")", &mark);
                }
            }
            Term::Lambda { param, body, .. } => {
                let mut close = false;
                if !combine {
                    if !omit_lambda_parens {
                        close = true;
                        emit(top, bot, "(", &mark);
                    }
                    if self.flags.contains(Flags::HASKELL_STYLE) {
                        emit(top, bot, "\\", &mark);
                    } else {
                        emit(top, bot, "λ", &mark);
                    }
                }

                let param_mark = (self.param_mark)(term).unwrap_or_else(|| mark.clone());
                emit(top, bot, param, &param_mark);

                if self.flags.contains(Flags::ABBREV_LAMBDA) {
                    self.folded.insert(param.clone());
                }

                let mut fold_body = false;
                let mut omit_next = false;
                if self.flags.contains(Flags::ABBREV_LAMBDA) {
                    if let Term::Lambda { param: inner, .. } = body.as_ref() {
                        // an inner parameter re-binding a folded name must
                        // break the group: λx y.λx y.B, never λx y x y.B
                        if self.folded.contains(inner) {
                            self.folded.clear();
                            omit_next = true;
                        } else {
                            fold_body = true;
                        }
                    }
                }

                if fold_body {
                    emit(top, bot, " ", &mark);
                    self.render(body, top, bot, true, false);
                } else {
                    if self.flags.contains(Flags::HASKELL_STYLE) {
                        emit(top, bot, " -> ", &mark);
                    } else {
                        emit(top, bot, ".", &mark);
                    }
                    self.render(body, top, bot, false, omit_next);
                }

                self.folded.remove(param);
                if close {
                    emit(top, bot, ")", &mark);
                }
            }
            Term::Let { name, value, .. } => {
                emit(top, bot, "let ", " ");
                emit(top, bot, name, &mark);
                emit(top, bot, " = ", " ");
                // the value sits in root position, no parens needed
                self.render(value, top, bot, false, true);
            }
        }

        if pushed {
            self.marks.pop();
        }
    }
}

fn render(
    term: &Term,
    flags: Flags,
    mark: MarkFn,
    param_mark: MarkFn,
    replace: Option<MarkFn>,
) -> (String, String) {
    let mut renderer = Renderer {
        flags,
        mark,
        param_mark,
        replace,
        folded: BTreeSet::new(),
        marks: Vec::new(),
    };
    let mut top = String::new();
    let mut bot = String::new();
    // a root-level lambda needs no enclosing parentheses
    renderer.render(term, &mut top, &mut bot, false, true);
    (top, bot)
}

/// Render `term` along with a marker line: `mark` claims a marker character
/// for a sub-term (inherited by its children), `param_mark` claims one for a
/// lambda's parameter.
pub fn highlight(term: &Term, mark: MarkFn, param_mark: MarkFn, flags: Flags) -> (String, String) {
    render(term, flags, mark, param_mark, None)
}

pub fn print(term: &Term, flags: Flags) -> String {
    render(term, flags, &|_| None, &|_| None, None).0
}

/// Like [`print`], but `replace` may swap out the rendering of any sub-term
/// (used to report α-equivalent named definitions).
pub fn print_with(term: &Term, flags: Flags, replace: MarkFn) -> String {
    render(term, flags, &|_| None, &|_| None, Some(replace)).0
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;

    fn printed(input: &str, flags: Flags) -> String {
        print(&parse(input).unwrap(), flags)
    }

    #[test]
    fn test_default_style() {
        assert_eq!(printed("λx.x", Flags::empty()), "λx.x");
        assert_eq!(printed("λx.λy.x", Flags::empty()), "λx.(λy.x)");
        assert_eq!(printed("f x", Flags::empty()), "f (x)");
        assert_eq!(printed("(λx.x) a", Flags::empty()), "(λx.x) (a)");
    }

    #[test]
    fn test_abbrev_parens() {
        assert_eq!(printed("f x", Flags::ABBREV_PARENS), "f x");
        assert_eq!(printed("f (x y)", Flags::ABBREV_PARENS), "f (x y)");
        assert_eq!(printed("f (λx.x)", Flags::ABBREV_PARENS), "f (λx.x)");
    }

    #[test]
    fn test_abbrev_lambda() {
        assert_eq!(printed("λx.λy.λz.x", Flags::ABBREV_LAMBDA), "λx y z.x");
        // a re-bound parameter breaks the fold
        assert_eq!(printed("λx.λy.λx.x", Flags::ABBREV_LAMBDA), "λx y.λx.x");
    }

    #[test]
    fn test_haskell_style() {
        assert_eq!(printed("λx.x", Flags::HASKELL_STYLE), "\\x -> x");
        assert_eq!(
            printed("λx.λy.x", Flags::HASKELL_STYLE | Flags::ABBREV_LAMBDA),
            "\\x y -> x"
        );
    }

    #[test]
    fn test_let_rendering() {
        assert_eq!(
            printed("let I = λx.x", Flags::empty()),
            "let I = λx.x"
        );
    }

    #[test]
    fn test_replacement() {
        let term = parse("f (λx.x)").unwrap();
        let out = print_with(&term, Flags::empty(), &|sub| {
            sub.is_lambda().then(|| "I".to_owned())
        });
        assert_eq!(out, "f (I)");
    }

    #[test]
    fn test_highlight_marks_align() {
        let term = parse("(λx.x) a").unwrap();
        let (top, bot) = highlight(
            &term,
            &|sub| matches!(sub, Term::Var { name, .. } if name == "a").then(|| "^".to_owned()),
            &|_| None,
            Flags::empty(),
        );
        assert_eq!(top, "(λx.x) (a)");
        assert_eq!(bot.chars().count(), top.chars().count());
        assert_eq!(bot.chars().nth(8), Some('^'));
    }

    #[test]
    fn test_print_reparse_round_trip() {
        for input in ["λx.λy.x y (λz.z x)", "(λx.x) (λy.y y)", "f (g x) y"] {
            let term = parse(input).unwrap();
            for flags in [
                Flags::empty(),
                Flags::ABBREV_LAMBDA,
                Flags::ABBREV_PARENS,
                Flags::ABBREV_LAMBDA | Flags::ABBREV_PARENS | Flags::HASKELL_STYLE,
            ] {
                let reparsed = parse(&print(&term, flags)).unwrap();
                assert!(
                    crate::equiv::alpha_eq(&term, &reparsed),
                    "{input} with {flags:?} printed as {}",
                    print(&term, flags)
                );
            }
        }
    }
}
