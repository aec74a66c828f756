//! Blank node identifier generator
//!
//! Issues a monotone sequence of `_:b0`, `_:b1`, ... labels. Identifiers
//! already present in a document are re-issued stably: the same input id
//! always maps to the same generated id within one generator's lifetime.
//!
//! A generator is created per conversion call and owned by that call frame,
//! so teardown is guaranteed on every exit path.

use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct BlankNodeGenerator {
    counter: usize,
    issued: BTreeMap<String, String>,
}

impl BlankNodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a blank node identifier (with the `_:` prefix).
    ///
    /// With `existing`, the mapping is stable: repeated calls with the same
    /// input return the same generated id. With `None`, every call returns a
    /// fresh id.
    pub fn issue(&mut self, existing: Option<&str>) -> String {
        if let Some(old) = existing {
            if let Some(id) = self.issued.get(old) {
                return id.clone();
            }
        }
        let id = format!("_:b{}", self.counter);
        self.counter += 1;
        if let Some(old) = existing {
            self.issued.insert(old.to_string(), id.clone());
        }
        id
    }
}
