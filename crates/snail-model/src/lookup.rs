use snail_core::Envelope;

/// Outcome of a mapper read or create.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// The record exists and has been loaded.
    Found(T),
    /// No record with that identity.
    NotFound,
    /// Values were refused before reaching the store.
    Rejected(Envelope),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(t) => Some(t),
            _ => None,
        }
    }
}

/// Outcome of a key-value update.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    /// At least one field changed and was written.
    Updated(T),
    /// Every proposed field already had that value; nothing was written.
    Unchanged,
    /// No record with that identity.
    Missing,
}

impl<T> std::fmt::Display for Change<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::Updated(_) => f.write_str("updated"),
            Change::Unchanged => f.write_str("no changes"),
            Change::Missing => f.write_str("not found"),
        }
    }
}
