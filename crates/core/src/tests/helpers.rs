// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shift_exchange_domain::{
    BagOffer, BagOfferStatus, DirectOffer, DirectOfferStatus, OperationTypes, Period, Proposal,
    ProposalStatus, ShiftSlot, TenantId,
};
use std::collections::BTreeSet;
use time::OffsetDateTime;
use time::macros::{date, datetime};

pub const CREATED: OffsetDateTime = datetime!(2025-05-01 08:00 UTC);
pub const NOW: OffsetDateTime = datetime!(2025-05-10 09:30 UTC);

pub fn create_test_slot() -> ShiftSlot {
    ShiftSlot {
        date: date!(2025 - 05 - 19),
        period: Period::Evening,
        shift_type: String::from("CA"),
        time_slot: String::from("19:00-07:00"),
    }
}

pub fn create_test_bag_offer(status: BagOfferStatus) -> BagOffer {
    BagOffer {
        offer_id: 1,
        tenant: TenantId::new("assoc-1"),
        owner_user_id: String::from("U1"),
        slot: create_test_slot(),
        comment: None,
        operation_types: OperationTypes::default(),
        status,
        interested_users: BTreeSet::new(),
        matched_user_id: None,
        matched_shift_type: None,
        matched_at: None,
        version: 0,
        created_at: CREATED,
        last_modified: CREATED,
    }
}

pub fn create_matched_bag_offer(matched_user_id: &str, shift_type: Option<&str>) -> BagOffer {
    let mut offer: BagOffer = create_test_bag_offer(BagOfferStatus::Matched);
    offer.interested_users.insert(matched_user_id.to_string());
    offer.matched_user_id = Some(matched_user_id.to_string());
    offer.matched_shift_type = shift_type.map(ToString::to_string);
    offer.matched_at = Some(CREATED);
    offer
}

pub fn create_test_direct_offer(status: DirectOfferStatus) -> DirectOffer {
    DirectOffer {
        offer_id: 10,
        tenant: TenantId::new("assoc-1"),
        owner_user_id: String::from("U1"),
        slot: create_test_slot(),
        comment: None,
        operation_types: OperationTypes::default(),
        status,
        has_proposals: false,
        accepted_by: None,
        accepted_at: None,
        version: 0,
        created_at: CREATED,
        last_modified: CREATED,
    }
}

pub fn create_test_proposal(proposal_id: i64, user_id: &str, status: ProposalStatus) -> Proposal {
    Proposal {
        proposal_id,
        tenant: TenantId::new("assoc-1"),
        target_offer_id: 10,
        proposing_user_id: user_id.to_string(),
        counter_shift: None,
        comment: None,
        status,
        created_at: CREATED,
        last_modified: CREATED,
    }
}
