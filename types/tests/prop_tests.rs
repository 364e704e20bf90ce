use proptest::prelude::*;

use governdao_types::{
    AccountId, Proposal, ProposalId, ProposalStatus, Timestamp, TransactionKind,
    TransactionRecord, TxHash, VoteChoice, VoteTally,
};

fn arb_status() -> impl Strategy<Value = ProposalStatus> {
    prop_oneof![
        Just(ProposalStatus::Upcoming),
        Just(ProposalStatus::Active),
        Just(ProposalStatus::Completed),
    ]
}

fn arb_proposal() -> impl Strategy<Value = Proposal> {
    (
        1u64..10_000,
        ".{0,40}",
        ".{0,200}",
        0u64..u64::MAX,
        arb_status(),
        0u64..u64::MAX / 2,
        0u64..u64::MAX / 2,
        "0x[0-9a-f]{40}",
    )
        .prop_map(
            |(id, title, description, deadline, status, yes, no, creator)| Proposal {
                id: ProposalId::from_index(id),
                title,
                description,
                deadline: Timestamp::new(deadline),
                status,
                votes: VoteTally::new(yes, no),
                creator: AccountId::new(creator),
            },
        )
}

proptest! {
    /// Status codes survive code -> status -> code for every known code.
    #[test]
    fn status_code_roundtrip(code in 0u8..3) {
        prop_assert_eq!(ProposalStatus::from_code(code).code(), code);
    }

    /// Every code outside the known range reads as upcoming.
    #[test]
    fn unknown_status_codes_are_upcoming(code in 3u8..=u8::MAX) {
        prop_assert_eq!(ProposalStatus::from_code(code), ProposalStatus::Upcoming);
    }

    /// Persisted proposal lists come back identical, timestamps and status included.
    #[test]
    fn proposal_list_json_is_lossless(list in prop::collection::vec(arb_proposal(), 0..8)) {
        let encoded = serde_json::to_string(&list).unwrap();
        let decoded: Vec<Proposal> = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, list);
    }

    /// Transaction history entries come back identical.
    #[test]
    fn transaction_json_is_lossless(
        hash in "0x[0-9a-f]{64}",
        is_vote in any::<bool>(),
        id in 0u64..1000,
        ts in 0u64..u64::MAX,
    ) {
        let record = TransactionRecord {
            hash: TxHash::new(hash),
            kind: if is_vote { TransactionKind::Vote } else { TransactionKind::Create },
            proposal_id: ProposalId::from_index(id),
            timestamp: Timestamp::new(ts),
        };
        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: TransactionRecord = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, record);
    }

    /// Recording a vote moves exactly one counter by exactly one.
    #[test]
    fn tally_record_is_exactly_one(yes in 0u64..1_000_000, no in 0u64..1_000_000, support in any::<bool>()) {
        let mut tally = VoteTally::new(yes, no);
        tally.record(VoteChoice::from_support(support));
        if support {
            prop_assert_eq!(tally, VoteTally::new(yes + 1, no));
        } else {
            prop_assert_eq!(tally, VoteTally::new(yes, no + 1));
        }
    }
}

#[test]
fn transaction_record_uses_wire_field_names() {
    let record = TransactionRecord::create(TxHash::new("0xabc"), Timestamp::new(5));
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["type"], "create");
    assert_eq!(json["proposalId"], "0");
    assert_eq!(json["timestamp"], 5);
}
