//! A stack of maps keyed by identifier, generic over the value type:
//! `Scope<ClassId>` during type checking, `Scope<String>` (a storage
//! operand, e.g. `"-8(%rbp)"`) during emission. `find` walks top-of-stack
//! to bottom, so the innermost binding wins — matches spec.md §3's Scope
//! stack and the original's templated `Scope<T>` (`orig/sa.hh`).

use std::collections::HashMap;

#[derive(Debug)]
pub struct Scope<T> {
    frames: Vec<HashMap<String, T>>,
}

impl<T> Default for Scope<T> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<T: Clone> Scope<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn exit(&mut self) {
        self.frames.pop();
    }

    pub fn add(&mut self, name: impl Into<String>, value: T) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    pub fn find(&self, name: &str) -> Option<T> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
    }

    /// Every name currently bound, across all active frames — used only to
    /// build "did you mean?" suggestions for an undefined-variable
    /// diagnostic, never for lookup (`find` is the only lookup path).
    pub fn names(&self) -> Vec<String> {
        self.frames
            .iter()
            .flat_map(|frame| frame.keys().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_binding_wins() {
        let mut scope: Scope<i32> = Scope::new();
        scope.enter();
        scope.add("x", 1);
        scope.enter();
        scope.add("x", 2);
        assert_eq!(scope.find("x"), Some(2));
        scope.exit();
        assert_eq!(scope.find("x"), Some(1));
        scope.exit();
        assert_eq!(scope.find("x"), None);
    }
}
