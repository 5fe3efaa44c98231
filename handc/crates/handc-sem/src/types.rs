//! The semantic type domain.
//!
//! Subtyping is deliberately narrow: `Any` is top both ways, `Never`
//! is bottom, `Null` and `T` flow into `Optional[T]`, and nothing else
//! converts implicitly. In particular `Optional[T]` is NOT assignable
//! to `T` without a flow refinement, and Int does not silently widen
//! to Float outside arithmetic.

use std::fmt;

use handc_par::{TypeExpr, TypeName};

/// A semantic type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ty {
    Int,
    Float,
    Bool,
    Text,
    Null,
    Any,
    Never,
    Optional(Box<Ty>),
    List(Box<Ty>),
    Map(Box<Ty>, Box<Ty>),
    Record(String),
    Result(Box<Ty>, Box<Ty>),
}

impl Ty {
    pub fn optional(inner: Ty) -> Ty {
        Ty::Optional(Box::new(inner))
    }

    /// True for Int and Float.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int | Ty::Float)
    }

    /// True if values of `self` may be null (Null, Any or Optional).
    pub fn admits_null(&self) -> bool {
        matches!(self, Ty::Null | Ty::Any | Ty::Optional(_))
    }

    /// Is a value of type `self` assignable to a slot of type `target`?
    pub fn assignable_to(&self, target: &Ty) -> bool {
        if matches!(self, Ty::Any) || matches!(target, Ty::Any) {
            return true;
        }
        if matches!(self, Ty::Never) {
            return true;
        }
        if self == target {
            return true;
        }
        match (self, target) {
            (Ty::Null, Ty::Optional(_)) => true,
            (Ty::Optional(a), Ty::Optional(b)) => a.assignable_to(b),
            (a, Ty::Optional(b)) => a.assignable_to(b),
            _ => false,
        }
    }

    /// Least upper bound used when merging branches.
    ///
    /// `join(T, Null)` is `Optional[T]`; incompatible pairs fall back
    /// to `Any`.
    pub fn join(&self, other: &Ty) -> Ty {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (Ty::Any, _) | (_, Ty::Any) => Ty::Any,
            (Ty::Never, t) | (t, Ty::Never) => t.clone(),
            (Ty::Null, Ty::Optional(t)) | (Ty::Optional(t), Ty::Null) => {
                Ty::Optional(t.clone())
            }
            (Ty::Null, t) | (t, Ty::Null) => Ty::optional(t.clone()),
            (Ty::Optional(a), Ty::Optional(b)) => Ty::optional(a.join(b)),
            (Ty::Optional(a), b) | (b, Ty::Optional(a)) => Ty::optional(a.join(b)),
            _ => Ty::Any,
        }
    }

    /// Lower a syntactic type expression into the semantic domain.
    /// Unknown names become nominal record types; unknown generic
    /// shapes degrade to `Any` arguments rather than erroring here.
    pub fn from_type_expr(expr: &TypeExpr) -> Ty {
        match expr {
            TypeExpr::Name(name) => Self::from_name(name),
            TypeExpr::Optional(opt) => Ty::optional(Self::from_type_expr(&opt.inner)),
            TypeExpr::App(app) => {
                let args: Vec<Ty> = app.args.iter().map(Self::from_type_expr).collect();
                match (app.base.name.as_str(), args.len()) {
                    ("List", 1) => Ty::List(Box::new(args.into_iter().next().unwrap())),
                    ("Optional", 1) => Ty::optional(args.into_iter().next().unwrap()),
                    ("Map", 2) => {
                        let mut it = args.into_iter();
                        let k = it.next().unwrap();
                        let v = it.next().unwrap();
                        Ty::Map(Box::new(k), Box::new(v))
                    }
                    ("Result", 2) => {
                        let mut it = args.into_iter();
                        let t = it.next().unwrap();
                        let e = it.next().unwrap();
                        Ty::Result(Box::new(t), Box::new(e))
                    }
                    _ => Ty::Record(app.base.name.clone()),
                }
            }
        }
    }

    fn from_name(name: &TypeName) -> Ty {
        match name.name.as_str() {
            "Int" => Ty::Int,
            "Float" => Ty::Float,
            "Bool" => Ty::Bool,
            "Text" => Ty::Text,
            "Null" => Ty::Null,
            "Any" => Ty::Any,
            "Never" => Ty::Never,
            "List" => Ty::List(Box::new(Ty::Any)),
            "Map" => Ty::Map(Box::new(Ty::Any), Box::new(Ty::Any)),
            "Result" => Ty::Result(Box::new(Ty::Any), Box::new(Ty::Any)),
            "Optional" => Ty::optional(Ty::Any),
            other => Ty::Record(other.to_string()),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "Int"),
            Ty::Float => write!(f, "Float"),
            Ty::Bool => write!(f, "Bool"),
            Ty::Text => write!(f, "Text"),
            Ty::Null => write!(f, "Null"),
            Ty::Any => write!(f, "Any"),
            Ty::Never => write!(f, "Never"),
            Ty::Optional(t) => write!(f, "{t}?"),
            Ty::List(t) => write!(f, "List[{t}]"),
            Ty::Map(k, v) => write!(f, "Map[{k}, {v}]"),
            Ty::Record(name) => write!(f, "{name}"),
            Ty::Result(t, e) => write!(f, "Result[{t}, {e}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_into_optional() {
        assert!(Ty::Null.assignable_to(&Ty::optional(Ty::Int)));
    }

    #[test]
    fn test_value_into_optional() {
        assert!(Ty::Int.assignable_to(&Ty::optional(Ty::Int)));
        assert!(!Ty::Text.assignable_to(&Ty::optional(Ty::Int)));
    }

    #[test]
    fn test_optional_not_into_plain() {
        assert!(!Ty::optional(Ty::Int).assignable_to(&Ty::Int));
    }

    #[test]
    fn test_any_is_top_both_ways() {
        assert!(Ty::Any.assignable_to(&Ty::Int));
        assert!(Ty::Int.assignable_to(&Ty::Any));
    }

    #[test]
    fn test_never_is_bottom() {
        assert!(Ty::Never.assignable_to(&Ty::Int));
        assert!(!Ty::Int.assignable_to(&Ty::Never));
    }

    #[test]
    fn test_no_int_float_assignability() {
        assert!(!Ty::Int.assignable_to(&Ty::Float));
        assert!(!Ty::Float.assignable_to(&Ty::Int));
    }

    #[test]
    fn test_join_with_null_is_optional() {
        assert_eq!(Ty::Int.join(&Ty::Null), Ty::optional(Ty::Int));
        assert_eq!(Ty::Null.join(&Ty::Int), Ty::optional(Ty::Int));
    }

    #[test]
    fn test_join_same_is_identity() {
        assert_eq!(Ty::Text.join(&Ty::Text), Ty::Text);
    }

    #[test]
    fn test_join_incompatible_is_any() {
        assert_eq!(Ty::Int.join(&Ty::Text), Ty::Any);
    }

    #[test]
    fn test_join_optional_absorbs() {
        assert_eq!(
            Ty::optional(Ty::Int).join(&Ty::Int),
            Ty::optional(Ty::Int)
        );
        assert_eq!(
            Ty::optional(Ty::Int).join(&Ty::Null),
            Ty::optional(Ty::Int)
        );
    }

    #[test]
    fn test_display_canonical_names() {
        assert_eq!(Ty::optional(Ty::Int).to_string(), "Int?");
        assert_eq!(
            Ty::Map(Box::new(Ty::Text), Box::new(Ty::Int)).to_string(),
            "Map[Text, Int]"
        );
        assert_eq!(Ty::Record("User".into()).to_string(), "User");
    }
}
