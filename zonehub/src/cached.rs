//! Explicit lazy-value holder.

/// A value that is either not yet computed or computed and held.
///
/// Used instead of `Option` where staleness is a deliberate state with its
/// own transitions: [`Cached::invalidate`] marks the value stale, and the
/// next access recomputes it.
#[derive(Debug, Clone, Default)]
pub enum Cached<T> {
    /// No usable value; the next access must resolve.
    #[default]
    Stale,
    /// A live value.
    Resolved(T),
}

impl<T> Cached<T> {
    /// Return the held value, resolving it first if stale.
    ///
    /// A failed resolution leaves the holder stale, so the next access
    /// retries rather than caching the failure.
    pub fn get_or_try_resolve<E>(
        &mut self,
        resolve: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<&T, E> {
        if let Cached::Stale = self {
            *self = Cached::Resolved(resolve()?);
        }
        match self {
            Cached::Resolved(value) => Ok(value),
            // Assigned just above.
            Cached::Stale => unreachable!(),
        }
    }

    /// Drop the held value.
    pub fn invalidate(&mut self) {
        *self = Cached::Stale;
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Cached::Resolved(_))
    }
}
