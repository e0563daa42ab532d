// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use crate::{Persistence, PersistenceError};
use shift_exchange_domain::{
    ExchangeType, OfferDraft, OperationType, OperationTypes, Period, ShiftSlot, TenantId,
};
use time::OffsetDateTime;
use time::macros::{date, datetime};

pub const NOW: OffsetDateTime = datetime!(2025-05-10 09:30 UTC);

pub fn tenant() -> TenantId {
    TenantId::new("assoc-1")
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory persistence")
}

pub fn create_test_slot() -> ShiftSlot {
    ShiftSlot {
        date: date!(2025 - 05 - 19),
        period: Period::Evening,
        shift_type: String::from("CA"),
        time_slot: String::from("19:00-07:00"),
    }
}

pub fn create_test_draft(owner: &str) -> OfferDraft {
    OfferDraft {
        owner_user_id: owner.to_string(),
        slot: create_test_slot(),
        comment: Some(String::from("family event")),
        operation_types: OperationTypes::new([OperationType::Exchange, OperationType::Give]),
    }
}

pub fn insert_offer(
    persistence: &mut Persistence,
    exchange_type: ExchangeType,
    draft: &OfferDraft,
) -> i64 {
    persistence
        .atomic::<_, PersistenceError, _>(|tx| {
            tx.insert_offer(&tenant(), exchange_type, draft, NOW)
        })
        .expect("Failed to insert offer")
}
