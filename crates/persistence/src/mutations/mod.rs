// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write operations.
//!
//! Mutations assume they run inside the caller's transaction and never open
//! one themselves.

pub mod history;
pub mod offers;
pub mod phase;
pub mod proposals;
