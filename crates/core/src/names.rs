//! Collision-free identifier generation.
//!
//! Both strategies share one suffix scheme: the base name first, then
//! `base_1`, `base_2`, ... The bounded form asks an external predicate and
//! gives up after a fixed number of candidates; the unbounded form checks an
//! in-memory set that only grows, so it always terminates.

use std::collections::HashSet;

/// Default candidate budget for [`resolve`].
pub const DEFAULT_MAX_RETRIES: usize = 10;

/// Every candidate up to the retry budget was already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameExhausted {
    pub base: String,
    pub attempts: usize,
}

impl std::fmt::Display for NameExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "could not find a free name for '{}' after {} attempt(s)",
            self.base, self.attempts
        )
    }
}

impl std::error::Error for NameExhausted {}

/// The `attempt`-th candidate for `base` (attempt 0 is the base itself).
pub fn candidate(base: &str, attempt: usize) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}_{}", base, attempt)
    }
}

/// Return the first candidate for which `exists` is false, trying at most
/// `max_retries` candidates including the base.
pub fn resolve<F>(base: &str, exists: F, max_retries: usize) -> Result<String, NameExhausted>
where
    F: Fn(&str) -> bool,
{
    for attempt in 0..max_retries {
        let name = candidate(base, attempt);
        if !exists(&name) {
            return Ok(name);
        }
    }
    Err(NameExhausted {
        base: base.to_string(),
        attempts: max_retries,
    })
}

/// Set of names already handed out during one pass.
#[derive(Debug, Clone, Default)]
pub struct UsedNames {
    names: HashSet<String>,
}

impl UsedNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the first free candidate for `base` and record it.
    pub fn claim(&mut self, base: &str) -> String {
        let mut attempt = 0;
        loop {
            let name = candidate(base, attempt);
            if !self.names.contains(&name) {
                self.names.insert(name.clone());
                return name;
            }
            attempt += 1;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
