//! Sequential composition of operations.
//!
//! A composed operation threads one outcome through its steps in order. After every step the
//! result is classified:
//!
//! - `Success` / `Temporary`: continue with the next step, passing the value along;
//! - `Stop`: return it immediately, remaining steps are skipped;
//! - `Failure` / `Unrecoverable`: return immediately (plain failures are fatal by default).
//!
//! When every step ran, the last step's outcome is returned. An empty composition is the
//! identity.
//!
//! ```rust
//! use encore::{compose, ops, ops::*, Operation, Outcome};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut op = compose(ops![from_fn(|o: Outcome| o.hint_temporary()), done()]);
//! assert!(op.call(Outcome::fail("ann")).await.is_success());
//! # });
//! ```

use crate::operation::{BoxOperation, Operation};
use crate::outcome::Outcome;
use async_trait::async_trait;
use std::fmt;

/// Operations bound into one. Created by [`compose`].
pub struct Composed {
    ops: Vec<BoxOperation>,
}

impl fmt::Debug for Composed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composed").field("len", &self.ops.len()).finish()
    }
}

/// Bind `ops` into a single operation.
pub fn compose(ops: Vec<BoxOperation>) -> Composed {
    Composed { ops }
}

impl Composed {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[async_trait]
impl Operation for Composed {
    async fn call(&mut self, mut outcome: Outcome) -> Outcome {
        for (step, op) in self.ops.iter_mut().enumerate() {
            outcome = op.call(outcome).await;
            match &outcome {
                Outcome::Success | Outcome::Temporary(_) => {
                    tracing::trace!(step, outcome = %outcome, "step continues");
                }
                Outcome::Stop(_) | Outcome::Failure(_) | Outcome::Unrecoverable(_) => {
                    tracing::trace!(step, outcome = %outcome, "step interrupts chain");
                    return outcome;
                }
            }
        }
        outcome
    }
}
