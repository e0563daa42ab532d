// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

//! Pure state transitions for bag and direct offers.
//!
//! Nothing in this crate performs I/O. Callers read the current entity
//! state inside a transaction, apply a command, and persist the returned
//! transition in the same transaction.

mod apply;
mod command;
mod error;
mod state;

#[cfg(test)]
mod tests;

pub use apply::{apply_bag, apply_direct};
pub use command::{BagCommand, DirectCommand};
pub use error::CoreError;
pub use state::{BagTransition, DirectTransition};
