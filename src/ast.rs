use crate::prelude::Span;

/// One step from a term down to one of its children.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Child {
    Fun,
    Arg,
    Body,
}

/// A chain of child steps identifying a sub-term from a root.
pub type Path = Vec<Child>;

/// `λ`-calculus syntax. Spans point back into the source line and are only
/// used by diagnostics; they are ignored by equality.
#[derive(Clone, Debug)]
pub enum Term {
    /// `x`
    Var { name: String, span: Span },
    /// `fun arg`
    Apply {
        fun: Box<Term>,
        arg: Box<Term>,
        span: Span,
    },
    /// `λparam. body`
    Lambda {
        param: String,
        param_span: Span,
        body: Box<Term>,
        span: Span,
    },
    /// `let name = value` (a top-level definition, never reduced)
    Let {
        name: String,
        name_span: Span,
        value: Box<Term>,
        span: Span,
    },
}

impl Term {
    pub fn span(&self) -> Span {
        match self {
            Term::Var { span, .. }
            | Term::Apply { span, .. }
            | Term::Lambda { span, .. }
            | Term::Let { span, .. } => span.clone(),
        }
    }

    pub fn same_variant(&self, other: &Term) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var { .. })
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self, Term::Lambda { .. })
    }

    pub fn child(&self, child: Child) -> Option<&Term> {
        match (self, child) {
            (Term::Apply { fun, .. }, Child::Fun) => Some(fun),
            (Term::Apply { arg, .. }, Child::Arg) => Some(arg),
            (Term::Lambda { body, .. }, Child::Body) => Some(body),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, child: Child) -> Option<&mut Term> {
        match (self, child) {
            (Term::Apply { fun, .. }, Child::Fun) => Some(fun),
            (Term::Apply { arg, .. }, Child::Arg) => Some(arg),
            (Term::Lambda { body, .. }, Child::Body) => Some(body),
            _ => None,
        }
    }

    pub fn get(&self, path: &[Child]) -> Option<&Term> {
        path.iter().try_fold(self, |term, child| term.child(*child))
    }

    pub fn get_mut(&mut self, path: &[Child]) -> Option<&mut Term> {
        path.iter()
            .try_fold(self, |term, child| term.child_mut(*child))
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Term::Var { name: a, .. }, Term::Var { name: b, .. }) => a == b,
            (
                Term::Apply {
                    fun: fa, arg: aa, ..
                },
                Term::Apply {
                    fun: fb, arg: ab, ..
                },
            ) => fa == fb && aa == ab,
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
            ) => pa == pb && ba == bb,
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
            ) => na == nb && va == vb,
            _ => false,
        }
    }
}
impl Eq for Term {}
