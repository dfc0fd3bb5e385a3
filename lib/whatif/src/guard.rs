use crate::{OracleError, WhatIfOptimizer};
use catalog::Index;
use common::Set;
use tracing::{error, trace};

/// Hypothetical indexes registered on a session for the guard's lifetime.
///
/// [`HypoIndexGuard::create`] registers every index of a configuration; the
/// indexes are dropped again by [`HypoIndexGuard::release`], or when the guard
/// goes out of scope, including when creation itself fails halfway.
pub struct HypoIndexGuard<'a, O: WhatIfOptimizer + ?Sized> {
    optimizer: &'a mut O,
    created: Vec<Index>,
}

impl<'a, O: WhatIfOptimizer + ?Sized> HypoIndexGuard<'a, O> {
    pub fn create(optimizer: &'a mut O, indexes: &Set<Index>) -> Result<Self, OracleError> {
        let mut guard = Self {
            optimizer,
            created: Vec::with_capacity(indexes.len()),
        };

        for index in indexes {
            guard.optimizer.create_hypo_index(index)?;
            trace!(index = %index, "Created hypothetical index");
            guard.created.push(index.clone());
        }

        Ok(guard)
    }

    /// The session, with the guarded indexes in place.
    pub fn optimizer(&mut self) -> &mut O {
        &mut *self.optimizer
    }

    pub fn indexes(&self) -> &[Index] {
        &self.created
    }

    /// Drops every guarded index. All drops are attempted; the first failure is returned.
    pub fn release(mut self) -> Result<(), OracleError> {
        self.drop_all()
    }

    fn drop_all(&mut self) -> Result<(), OracleError> {
        let mut first_error = None;
        for index in std::mem::take(&mut self.created).iter().rev() {
            match self.optimizer.drop_hypo_index(index) {
                Ok(()) => trace!(index = %index, "Dropped hypothetical index"),
                Err(err) => {
                    error!(index = %index, error = %err, "Failed to drop hypothetical index");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<'a, O: WhatIfOptimizer + ?Sized> Drop for HypoIndexGuard<'a, O> {
    fn drop(&mut self) {
        // Failures are already logged by `drop_all`.
        let _ = self.drop_all();
    }
}
