// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{NOW, create_matched_bag_offer, create_test_bag_offer};
use crate::{BagCommand, BagTransition, CoreError, apply_bag};
use shift_exchange_domain::{BagOffer, BagOfferStatus, Phase};
use shift_exchange_history::{HistoryStatus, TransferContext};

fn add_interest(user_id: &str) -> BagCommand {
    BagCommand::AddInterest {
        user_id: user_id.to_string(),
    }
}

#[test]
fn test_add_interest_is_idempotent() {
    let offer: BagOffer = create_test_bag_offer(BagOfferStatus::Pending);

    let first: BagTransition = apply_bag(&offer, add_interest("U2"), Phase::Submission, NOW).unwrap();
    assert!(first.changed);
    assert_eq!(first.offer.last_modified, NOW);

    let second: BagTransition =
        apply_bag(&first.offer, add_interest("U2"), Phase::Submission, NOW).unwrap();
    assert!(!second.changed);
    assert_eq!(second.offer.interested_users, first.offer.interested_users);
    assert_eq!(second.offer.interested_users.len(), 1);
}

#[test]
fn test_owner_cannot_express_interest() {
    let offer: BagOffer = create_test_bag_offer(BagOfferStatus::Pending);
    let result = apply_bag(&offer, add_interest("U1"), Phase::Submission, NOW);
    assert!(matches!(result, Err(CoreError::SelfInterest { .. })));
}

#[test]
fn test_interest_requires_pending_offer() {
    let offer: BagOffer = create_test_bag_offer(BagOfferStatus::Cancelled);
    let result = apply_bag(&offer, add_interest("U2"), Phase::Submission, NOW);
    assert!(matches!(result, Err(CoreError::OfferUnavailable { .. })));
}

#[test]
fn test_remove_interest_of_non_member_is_noop() {
    let offer: BagOffer = create_test_bag_offer(BagOfferStatus::Pending);
    let transition: BagTransition = apply_bag(
        &offer,
        BagCommand::RemoveInterest {
            user_id: String::from("U9"),
        },
        Phase::Submission,
        NOW,
    )
    .unwrap();
    assert!(!transition.changed);
    assert_eq!(transition.offer, offer);
}

#[test]
fn test_record_match_requires_matching_phase_and_interest() {
    let mut offer: BagOffer = create_test_bag_offer(BagOfferStatus::Pending);
    offer.interested_users.insert(String::from("U2"));

    let command = |user: &str| BagCommand::RecordMatch {
        matched_user_id: user.to_string(),
        matched_shift_type: Some(String::from("CM")),
    };

    assert!(matches!(
        apply_bag(&offer, command("U2"), Phase::Submission, NOW),
        Err(CoreError::PhaseViolation { .. })
    ));
    assert!(matches!(
        apply_bag(&offer, command("U3"), Phase::Matching, NOW),
        Err(CoreError::NotInterested { .. })
    ));

    let transition: BagTransition = apply_bag(&offer, command("U2"), Phase::Matching, NOW).unwrap();
    assert_eq!(transition.offer.status, BagOfferStatus::Matched);
    assert_eq!(transition.offer.matched_user_id.as_deref(), Some("U2"));
    assert_eq!(transition.offer.matched_shift_type.as_deref(), Some("CM"));
    assert_eq!(transition.offer.matched_at, Some(NOW));
    assert!(transition.history_entry.is_none());
}

#[test]
fn test_validate_match_appends_one_history_entry() {
    let offer: BagOffer = create_matched_bag_offer("U2", Some("CM"));
    let transition: BagTransition = apply_bag(
        &offer,
        BagCommand::ValidateMatch {
            matched_user_id: String::from("U2"),
        },
        Phase::Matching,
        NOW,
    )
    .unwrap();

    assert_eq!(transition.offer.status, BagOfferStatus::Validated);
    let entry = transition.history_entry.unwrap();
    assert_eq!(entry.original_user_id, "U1");
    assert_eq!(entry.new_user_id, "U2");
    assert_eq!(entry.status, HistoryStatus::Completed);
    assert_eq!(entry.exchanged_at, NOW);
    assert_eq!(
        entry.context,
        TransferContext::Bag {
            offer_id: 1,
            is_permutation: true,
            matched_shift_type: Some(String::from("CM")),
        }
    );
}

#[test]
fn test_validate_requires_matched_status() {
    let offer: BagOffer = create_test_bag_offer(BagOfferStatus::Pending);
    let result = apply_bag(
        &offer,
        BagCommand::ValidateMatch {
            matched_user_id: String::from("U2"),
        },
        Phase::Matching,
        NOW,
    );
    assert!(matches!(result, Err(CoreError::InvalidState { .. })));
}

#[test]
fn test_second_validation_is_invalid_state() {
    let offer: BagOffer = create_matched_bag_offer("U2", None);
    let command = BagCommand::ValidateMatch {
        matched_user_id: String::from("U2"),
    };
    let first: BagTransition = apply_bag(&offer, command.clone(), Phase::Matching, NOW).unwrap();
    let second = apply_bag(&first.offer, command, Phase::Matching, NOW);
    assert!(matches!(second, Err(CoreError::InvalidState { .. })));
}

#[test]
fn test_validate_with_other_member_is_mismatch() {
    let offer: BagOffer = create_matched_bag_offer("U2", None);
    let result = apply_bag(
        &offer,
        BagCommand::ValidateMatch {
            matched_user_id: String::from("U3"),
        },
        Phase::Matching,
        NOW,
    );
    assert!(matches!(result, Err(CoreError::MatchMismatch { .. })));
}

#[test]
fn test_reject_match_returns_offer_to_pool() {
    let offer: BagOffer = create_matched_bag_offer("U2", Some("CM"));
    let transition: BagTransition =
        apply_bag(&offer, BagCommand::RejectMatch, Phase::Matching, NOW).unwrap();

    assert_eq!(transition.offer.status, BagOfferStatus::Pending);
    assert_eq!(transition.offer.matched_user_id, None);
    assert_eq!(transition.offer.matched_shift_type, None);
    assert_eq!(transition.offer.matched_at, None);
    assert!(transition.history_entry.is_none());
    assert!(transition.offer.interested_users.contains("U2"));
}

#[test]
fn test_cancel_outside_submission_is_phase_violation() {
    let offer: BagOffer = create_test_bag_offer(BagOfferStatus::Pending);
    let result = apply_bag(&offer, BagCommand::Cancel, Phase::Matching, NOW);
    assert_eq!(
        result,
        Err(CoreError::PhaseViolation {
            operation: "cancel",
            phase: Phase::Matching,
        })
    );
}

#[test]
fn test_cancel_validated_offer_is_invalid_state() {
    let offer: BagOffer = create_test_bag_offer(BagOfferStatus::Validated);
    let result = apply_bag(&offer, BagCommand::Cancel, Phase::Submission, NOW);
    assert!(matches!(result, Err(CoreError::InvalidState { .. })));
}

#[test]
fn test_cancel_validated_offer_during_matching_is_invalid_state() {
    let offer: BagOffer = create_test_bag_offer(BagOfferStatus::Validated);
    let result = apply_bag(&offer, BagCommand::Cancel, Phase::Matching, NOW);
    assert_eq!(
        result,
        Err(CoreError::InvalidState {
            entity: "bag offer",
            id: 1,
            status: String::from("validated"),
            operation: "cancel",
        })
    );
}

#[test]
fn test_matched_member_cannot_withdraw_interest() {
    let offer: BagOffer = create_matched_bag_offer("U2", None);
    let result = apply_bag(
        &offer,
        BagCommand::RemoveInterest {
            user_id: String::from("U2"),
        },
        Phase::Matching,
        NOW,
    );
    assert!(matches!(result, Err(CoreError::InvalidState { .. })));
}

#[test]
fn test_other_member_may_withdraw_interest_from_matched_offer() {
    let mut offer: BagOffer = create_matched_bag_offer("U2", None);
    offer.interested_users.insert(String::from("U3"));

    let transition: BagTransition = apply_bag(
        &offer,
        BagCommand::RemoveInterest {
            user_id: String::from("U3"),
        },
        Phase::Matching,
        NOW,
    )
    .unwrap();

    assert!(transition.changed);
    assert_eq!(transition.offer.status, BagOfferStatus::Matched);
    assert_eq!(transition.offer.matched_user_id.as_deref(), Some("U2"));
    assert!(!transition.offer.interested_users.contains("U3"));
}

#[test]
fn test_interest_on_terminal_offer_is_frozen() {
    for status in [
        BagOfferStatus::Validated,
        BagOfferStatus::Cancelled,
        BagOfferStatus::Rejected,
    ] {
        let mut offer: BagOffer = create_test_bag_offer(status);
        offer.interested_users.insert(String::from("U2"));

        let result = apply_bag(
            &offer,
            BagCommand::RemoveInterest {
                user_id: String::from("U2"),
            },
            Phase::Matching,
            NOW,
        );
        assert!(
            matches!(result, Err(CoreError::InvalidState { .. })),
            "status {status:?}"
        );
    }
}

#[test]
fn test_admin_reject_clears_match() {
    let offer: BagOffer = create_matched_bag_offer("U2", None);
    let transition: BagTransition =
        apply_bag(&offer, BagCommand::Reject, Phase::Matching, NOW).unwrap();
    assert_eq!(transition.offer.status, BagOfferStatus::Rejected);
    assert_eq!(transition.offer.matched_user_id, None);

    let again = apply_bag(&transition.offer, BagCommand::Reject, Phase::Matching, NOW);
    assert!(matches!(again, Err(CoreError::InvalidState { .. })));
}
