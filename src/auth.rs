//! Owner gate around configuration and withdrawal operations.

use crate::domain::Address;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("caller {caller} is not the owner")]
pub struct NotOwner {
    pub caller: Address,
}

/// Authorization gate for owner-only ledger operations.
pub trait Authorization: Send + Sync + fmt::Debug {
    /// Err unless `caller` is the owner.
    fn ensure_owner(&self, caller: &Address) -> Result<(), NotOwner>;

    /// The current owner identity.
    fn owner(&self) -> &Address;
}

/// Fixed single-owner gate.
#[derive(Debug, Clone)]
pub struct SingleOwner {
    owner: Address,
}

impl SingleOwner {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }
}

impl Authorization for SingleOwner {
    fn ensure_owner(&self, caller: &Address) -> Result<(), NotOwner> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(NotOwner {
                caller: caller.clone(),
            })
        }
    }

    fn owner(&self) -> &Address {
        &self.owner
    }
}
