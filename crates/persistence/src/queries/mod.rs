// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! Every query is scoped by tenant. Rows from another tenant are invisible
//! rather than reported as errors.

pub mod history;
pub mod offers;
pub mod phase;
pub mod proposals;
