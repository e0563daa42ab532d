// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use tracing::warn;

use crate::error::ApiError;

/// How many times a unit of work is attempted before contention is reported.
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 3;

/// Runs `unit` until it succeeds, fails with something other than
/// contention, or the attempts run out.
///
/// Each attempt must re-read the state it depends on; nothing is carried
/// over from a failed attempt.
pub(crate) fn with_retry<T, F>(operation: &'static str, mut unit: F) -> Result<T, ApiError>
where
    F: FnMut() -> Result<T, ApiError>,
{
    let mut attempt: u32 = 1;
    loop {
        match unit() {
            Err(ApiError::Contention { .. }) if attempt < MAX_TRANSACTION_ATTEMPTS => {
                warn!(operation, attempt, "Concurrent modification detected, retrying");
                attempt += 1;
            }
            Err(ApiError::Contention { .. }) => {
                warn!(operation, attempt, "Giving up after repeated contention");
                return Err(ApiError::Contention { attempts: attempt });
            }
            other => return other,
        }
    }
}
