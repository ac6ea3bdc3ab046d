//! Strongly-typed handles into the plan arena.
//!
//! Downstream crates should *not* pass raw indices around. A handle is only
//! meaningful for the `PlanGraph` that issued it.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! new_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }
            pub const fn get(self) -> u64 {
                self.0
            }
            /// Position of the handle in its arena vector.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
            pub const fn from_index(idx: usize) -> Self {
                Self(idx as u64)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

new_id!(OperatorId);
new_id!(InputSlotId);
new_id!(OutputSlotId);
new_id!(AlternativeId);

/// Logical creation timestamp of an elementary operator.
pub type Epoch = u32;

/// The lowest and default epoch.
pub const FIRST_EPOCH: Epoch = 0;
