//! Scope frames for the typechecker.
//!
//! A binding is `(type, proven_non_null)`. Frames are ordered maps so
//! diagnostics and merges are deterministic. Branch checking clones
//! the whole stack; refinement updates inside a clone can never leak
//! into the parent.

use indexmap::IndexMap;

use crate::Ty;

/// A single binding: declared type plus flow-refinement flag.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub ty: Ty,
    pub proven_non_null: bool,
}

impl Binding {
    pub fn new(ty: Ty) -> Self {
        Self {
            ty,
            proven_non_null: false,
        }
    }

    /// The type as seen through the refinement flag: a refined
    /// `Optional[T]` reads as `T`.
    pub fn refined_ty(&self) -> Ty {
        match (&self.ty, self.proven_non_null) {
            (Ty::Optional(inner), true) => (**inner).clone(),
            _ => self.ty.clone(),
        }
    }
}

/// A stack of scope frames, innermost last.
#[derive(Clone, Debug, Default)]
pub struct ScopeStack {
    frames: Vec<IndexMap<String, Binding>>,
}

impl ScopeStack {
    /// Create a stack with a single (global) frame.
    pub fn new() -> Self {
        Self {
            frames: vec![IndexMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(IndexMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Declare `name` in the innermost frame, resetting any refinement.
    pub fn declare(&mut self, name: &str, ty: Ty) {
        self.frames
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_string(), Binding::new(ty));
    }

    /// Look up the nearest binding for `name`.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }

    /// Mutable access to the nearest binding for `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.frames.iter_mut().rev().find_map(|f| f.get_mut(name))
    }

    /// The refined type of `name`, if bound.
    pub fn lookup(&self, name: &str) -> Option<Ty> {
        self.get(name).map(Binding::refined_ty)
    }

    /// Mark `name` as proven non-null in whichever frame binds it.
    pub fn refine_non_null(&mut self, name: &str) {
        if let Some(binding) = self.get_mut(name) {
            binding.proven_non_null = true;
        }
    }

    /// Merge two branch clones of `self` back into one stack.
    ///
    /// Both clones started from the same stack, so frame depths match.
    /// Per frame, only names present in both sides survive, with joined
    /// types; a name is refined only if both branches refined it.
    pub fn merge_branches(a: &ScopeStack, b: &ScopeStack) -> ScopeStack {
        let depth = a.frames.len().min(b.frames.len());
        let mut frames = Vec::with_capacity(depth);
        for i in 0..depth {
            let mut frame = IndexMap::new();
            for (name, ba) in &a.frames[i] {
                if let Some(bb) = b.frames[i].get(name) {
                    frame.insert(
                        name.clone(),
                        Binding {
                            ty: ba.ty.join(&bb.ty),
                            proven_non_null: ba.proven_non_null && bb.proven_non_null,
                        },
                    );
                }
            }
            frames.push(frame);
        }
        ScopeStack { frames }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", Ty::Int);
        assert_eq!(scopes.lookup("x"), Some(Ty::Int));
        assert_eq!(scopes.lookup("y"), None);
    }

    #[test]
    fn test_inner_frame_shadows() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", Ty::Int);
        scopes.push();
        scopes.declare("x", Ty::Text);
        assert_eq!(scopes.lookup("x"), Some(Ty::Text));
        scopes.pop();
        assert_eq!(scopes.lookup("x"), Some(Ty::Int));
    }

    #[test]
    fn test_refinement_unwraps_optional() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", Ty::optional(Ty::Int));
        assert_eq!(scopes.lookup("x"), Some(Ty::optional(Ty::Int)));
        scopes.refine_non_null("x");
        assert_eq!(scopes.lookup("x"), Some(Ty::Int));
    }

    #[test]
    fn test_refinement_on_plain_type_is_harmless() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", Ty::Int);
        scopes.refine_non_null("x");
        assert_eq!(scopes.lookup("x"), Some(Ty::Int));
    }

    #[test]
    fn test_clone_isolates_refinements() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", Ty::optional(Ty::Int));
        let mut branch = scopes.clone();
        branch.refine_non_null("x");
        assert_eq!(branch.lookup("x"), Some(Ty::Int));
        assert_eq!(scopes.lookup("x"), Some(Ty::optional(Ty::Int)));
    }

    #[test]
    fn test_merge_keeps_common_names_only() {
        let mut base = ScopeStack::new();
        base.declare("x", Ty::Int);
        let mut a = base.clone();
        let mut b = base.clone();
        a.declare("only_a", Ty::Text);
        b.declare("only_b", Ty::Text);
        let merged = ScopeStack::merge_branches(&a, &b);
        assert!(merged.lookup("x").is_some());
        assert!(merged.lookup("only_a").is_none());
        assert!(merged.lookup("only_b").is_none());
    }

    #[test]
    fn test_merge_joins_types() {
        let mut base = ScopeStack::new();
        base.declare("x", Ty::Int);
        let mut a = base.clone();
        let b = base.clone();
        if let Some(binding) = a.get_mut("x") {
            binding.ty = Ty::Null;
        }
        let merged = ScopeStack::merge_branches(&a, &b);
        assert_eq!(merged.lookup("x"), Some(Ty::optional(Ty::Int)));
    }

    #[test]
    fn test_merge_refinement_needs_both_sides() {
        let mut base = ScopeStack::new();
        base.declare("x", Ty::optional(Ty::Int));
        let mut a = base.clone();
        let b = base.clone();
        a.refine_non_null("x");
        let merged = ScopeStack::merge_branches(&a, &b);
        assert_eq!(merged.lookup("x"), Some(Ty::optional(Ty::Int)));

        let mut b2 = base.clone();
        b2.refine_non_null("x");
        let merged2 = ScopeStack::merge_branches(&a, &b2);
        assert_eq!(merged2.lookup("x"), Some(Ty::Int));
    }
}
