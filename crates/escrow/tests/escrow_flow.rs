//! End-to-end escrow flows through the savepoint-wrapped router.

use mooring_cash::Ledger;
use mooring_core::{
    Context, DeliverResult, Handler, HandlerError, Router, SavepointDecorator, SignerAuth, Tx,
};
use mooring_escrow::{stack, EscrowBucket};
use mooring_messages::{
    CreateEscrowMsg, Msg, ReleaseEscrowMsg, ReturnEscrowMsg, UpdateEscrowPartiesMsg,
};
use mooring_store::{KvStore, MemStore};
use mooring_types::{Coin, Coins, Permission};

fn perm(name: &str) -> Permission {
    Permission::new("sigs", name.as_bytes())
}

fn iov(whole: i64) -> Coin {
    Coin::whole(whole, "IOV")
}

fn coins(entries: Vec<Coin>) -> Coins {
    Coins::new(entries).unwrap()
}

/// A one-replica chain: in-memory store, wallet ledger, and the escrow
/// stack (router behind the savepoint decorator).
struct Chain {
    db: MemStore,
    app: SavepointDecorator<Router>,
    ledger: Ledger,
    bucket: EscrowBucket,
}

impl Chain {
    /// Start a chain where alice holds 100 IOV and 50 ETH.
    fn new() -> Self {
        let mut db = MemStore::new();
        let ledger = Ledger::new();
        ledger
            .issue(&mut db, &perm("alice").address(), &iov(100))
            .unwrap();
        ledger
            .issue(&mut db, &perm("alice").address(), &Coin::whole(50, "ETH"))
            .unwrap();
        Self {
            db,
            app: stack(SignerAuth, ledger),
            ledger,
            bucket: EscrowBucket::new(),
        }
    }

    fn ctx(height: u64, signers: &[&Permission]) -> Context {
        let mut ctx = Context::new(height);
        for signer in signers {
            ctx = ctx.with_signer((*signer).clone());
        }
        ctx
    }

    fn deliver(
        &mut self,
        height: u64,
        signers: &[&Permission],
        msg: Msg,
    ) -> Result<DeliverResult, HandlerError> {
        self.app
            .deliver(&Self::ctx(height, signers), &mut self.db, &Tx::new(msg))
    }

    fn check_gas(&mut self, height: u64, signers: &[&Permission], msg: Msg) -> u64 {
        self.app
            .check(&Self::ctx(height, signers), &mut self.db, &Tx::new(msg))
            .unwrap()
            .gas_allocated
    }

    fn balance(&self, holder: &Permission) -> Coins {
        self.ledger.balance(&self.db, &holder.address()).unwrap()
    }

    fn escrow_balance(&self, id: &[u8]) -> Coins {
        self.ledger
            .balance(&self.db, &Permission::escrow(id).address())
            .unwrap()
    }

    fn create_msg(amount: Coins, timeout: u64) -> Msg {
        Msg::CreateEscrow(CreateEscrowMsg {
            sender: Some(perm("alice")),
            recipient: perm("bob"),
            arbiter: perm("carol"),
            amount,
            timeout,
            memo: String::new(),
        })
    }

    /// Create the standard 10 IOV escrow with timeout 200 at height 100.
    fn create_standard(&mut self) -> Vec<u8> {
        let res = self
            .deliver(100, &[&perm("alice")], Self::create_msg(coins(vec![iov(10)]), 200))
            .unwrap();
        res.data
    }
}

#[test]
fn create_then_full_release() {
    let mut chain = Chain::new();

    let id = chain.create_standard();
    assert_eq!(id, 1u64.to_be_bytes());
    assert_eq!(chain.escrow_balance(&id), coins(vec![iov(10)]));
    assert_eq!(chain.balance(&perm("alice")).get("IOV"), Some(&iov(90)));

    // Arbiter releases everything at height 150.
    let res = chain
        .deliver(
            150,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::full(id.clone())),
        )
        .unwrap();
    assert!(res.data.is_empty());

    assert!(chain.bucket.get(&chain.db, &id).unwrap().is_none());
    assert_eq!(chain.balance(&perm("bob")), coins(vec![iov(10)]));
    assert!(chain.escrow_balance(&id).is_empty());
}

#[test]
fn partial_release_then_full_release() {
    let mut chain = Chain::new();
    let id = chain.create_standard();

    let res = chain
        .deliver(
            101,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::partial(id.clone(), coins(vec![iov(3)]))),
        )
        .unwrap();
    assert_eq!(res.data, id);

    let obj = chain.bucket.get(&chain.db, &id).unwrap().unwrap();
    assert_eq!(obj.escrow.amount, coins(vec![iov(7)]));
    // Conservation: held coins track the record's amount in lockstep.
    assert_eq!(chain.escrow_balance(&id), obj.escrow.amount);
    assert_eq!(chain.balance(&perm("bob")), coins(vec![iov(3)]));

    let res = chain
        .deliver(
            102,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::partial(id.clone(), coins(vec![iov(7)]))),
        )
        .unwrap();
    assert!(res.data.is_empty());
    assert!(chain.bucket.get(&chain.db, &id).unwrap().is_none());
    assert_eq!(chain.balance(&perm("bob")), coins(vec![iov(10)]));
    assert!(chain.escrow_balance(&id).is_empty());
}

#[test]
fn return_after_expiry_requires_no_signer() {
    let mut chain = Chain::new();
    let id = chain.create_standard();

    // No signer at all: expiry is the only gate.
    chain
        .deliver(201, &[], Msg::ReturnEscrow(ReturnEscrowMsg::new(id.clone())))
        .unwrap();

    assert!(chain.bucket.get(&chain.db, &id).unwrap().is_none());
    assert_eq!(chain.balance(&perm("alice")).get("IOV"), Some(&iov(100)));
    assert!(chain.escrow_balance(&id).is_empty());
}

#[test]
fn unauthorized_release_changes_nothing() {
    let mut chain = Chain::new();
    let id = chain.create_standard();
    let before = chain.db.snapshot();

    // Alice is the sender, not the arbiter.
    let err = chain
        .deliver(
            150,
            &[&perm("alice")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::full(id.clone())),
        )
        .unwrap_err();
    assert_eq!(err, HandlerError::Unauthorized);

    assert_eq!(chain.db.get(b"escrow:seq").unwrap(), before.get(b"escrow:seq").unwrap());
    assert_eq!(chain.escrow_balance(&id), coins(vec![iov(10)]));
    assert!(chain.balance(&perm("bob")).is_empty());
}

#[test]
fn update_parties_redirects_release() {
    let mut chain = Chain::new();
    let id = chain.create_standard();

    // The current recipient signs the hand-over to dora.
    chain
        .deliver(
            150,
            &[&perm("bob")],
            Msg::UpdateEscrowParties(UpdateEscrowPartiesMsg {
                escrow_id: id.clone(),
                sender: None,
                recipient: Some(perm("dora")),
                arbiter: None,
            }),
        )
        .unwrap();

    let obj = chain.bucket.get(&chain.db, &id).unwrap().unwrap();
    assert_eq!(obj.escrow.recipient, perm("dora"));
    assert_eq!(obj.escrow.sender, perm("alice"));
    assert_eq!(obj.escrow.arbiter, perm("carol"));
    assert_eq!(obj.escrow.amount, coins(vec![iov(10)]));

    chain
        .deliver(
            151,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::full(id.clone())),
        )
        .unwrap();
    assert_eq!(chain.balance(&perm("dora")), coins(vec![iov(10)]));
    assert!(chain.balance(&perm("bob")).is_empty());
}

#[test]
fn create_with_defaulted_sender() {
    let mut chain = Chain::new();

    let res = chain
        .deliver(
            100,
            &[&perm("alice")],
            Msg::CreateEscrow(CreateEscrowMsg {
                sender: None,
                recipient: perm("bob"),
                arbiter: perm("carol"),
                amount: coins(vec![iov(5)]),
                timeout: 200,
                memo: String::new(),
            }),
        )
        .unwrap();

    let obj = chain.bucket.get(&chain.db, &res.data).unwrap().unwrap();
    assert_eq!(obj.escrow.sender, perm("alice"));
    assert_eq!(chain.balance(&perm("alice")).get("IOV"), Some(&iov(95)));
    assert_eq!(chain.escrow_balance(&res.data), coins(vec![iov(5)]));
}

#[test]
fn release_and_return_boundaries_at_timeout() {
    // Release at exactly the timeout height succeeds.
    let mut chain = Chain::new();
    let id = chain.create_standard();
    chain
        .deliver(
            200,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::full(id)),
        )
        .unwrap();

    // Return at the timeout height fails; one block later it succeeds.
    let mut chain = Chain::new();
    let id = chain.create_standard();
    let err = chain
        .deliver(200, &[], Msg::ReturnEscrow(ReturnEscrowMsg::new(id.clone())))
        .unwrap_err();
    assert_eq!(err, HandlerError::EscrowNotExpired(200));

    chain
        .deliver(201, &[], Msg::ReturnEscrow(ReturnEscrowMsg::new(id)))
        .unwrap();
}

#[test]
fn release_after_expiry_fails() {
    let mut chain = Chain::new();
    let id = chain.create_standard();

    let err = chain
        .deliver(
            201,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::full(id)),
        )
        .unwrap_err();
    assert_eq!(err, HandlerError::EscrowExpired(200));
}

#[test]
fn create_with_past_or_present_timeout_fails() {
    let mut chain = Chain::new();

    let err = chain
        .deliver(100, &[&perm("alice")], Chain::create_msg(coins(vec![iov(10)]), 100))
        .unwrap_err();
    assert_eq!(err, HandlerError::InvalidTimeout(100));

    let err = chain
        .deliver(100, &[&perm("alice")], Chain::create_msg(coins(vec![iov(10)]), 99))
        .unwrap_err();
    assert_eq!(err, HandlerError::InvalidTimeout(99));
}

#[test]
fn over_release_rolls_back_atomically() {
    let mut chain = Chain::new();
    let id = chain.create_standard();

    let err = chain
        .deliver(
            150,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::partial(id.clone(), coins(vec![iov(20)]))),
        )
        .unwrap_err();
    assert!(matches!(err, HandlerError::InsufficientFunds(_)));

    // The failed transfer and every prior write were reverted.
    let obj = chain.bucket.get(&chain.db, &id).unwrap().unwrap();
    assert_eq!(obj.escrow.amount, coins(vec![iov(10)]));
    assert_eq!(chain.escrow_balance(&id), coins(vec![iov(10)]));
    assert!(chain.balance(&perm("bob")).is_empty());
}

#[test]
fn release_of_foreign_denomination_rolls_back() {
    let mut chain = Chain::new();
    let id = chain.create_standard();

    let err = chain
        .deliver(
            150,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::partial(
                id.clone(),
                coins(vec![Coin::whole(1, "ETH")]),
            )),
        )
        .unwrap_err();
    assert!(matches!(err, HandlerError::InsufficientFunds(_)));
    assert_eq!(chain.escrow_balance(&id), coins(vec![iov(10)]));
}

#[test]
fn underfunded_create_rolls_back_record_and_coins() {
    let mut chain = Chain::new();

    let err = chain
        .deliver(100, &[&perm("alice")], Chain::create_msg(coins(vec![iov(500)]), 200))
        .unwrap_err();
    assert!(matches!(err, HandlerError::InsufficientFunds(_)));

    // No record, no sequence advance, balances untouched.
    assert!(chain.bucket.get(&chain.db, &1u64.to_be_bytes()).unwrap().is_none());
    assert_eq!(chain.db.get(b"escrow:seq").unwrap(), None);
    assert_eq!(chain.balance(&perm("alice")).get("IOV"), Some(&iov(100)));
}

#[test]
fn multi_denomination_escrow_conserves_per_denom() {
    let mut chain = Chain::new();

    let amount = coins(vec![iov(10), Coin::whole(5, "ETH")]);
    let res = chain
        .deliver(100, &[&perm("alice")], Chain::create_msg(amount.clone(), 200))
        .unwrap();
    let id = res.data;
    assert_eq!(chain.escrow_balance(&id), amount);

    chain
        .deliver(
            150,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::partial(
                id.clone(),
                coins(vec![Coin::whole(2, "ETH")]),
            )),
        )
        .unwrap();

    let obj = chain.bucket.get(&chain.db, &id).unwrap().unwrap();
    assert_eq!(obj.escrow.amount, coins(vec![Coin::whole(3, "ETH"), iov(10)]));
    assert_eq!(chain.escrow_balance(&id), obj.escrow.amount);
    assert_eq!(chain.balance(&perm("bob")), coins(vec![Coin::whole(2, "ETH")]));
}

#[test]
fn ids_strictly_increase_across_lifecycles() {
    let mut chain = Chain::new();

    let first = chain.create_standard();
    let second = chain
        .deliver(100, &[&perm("alice")], Chain::create_msg(coins(vec![iov(1)]), 200))
        .unwrap()
        .data;

    // Fully release the first escrow, freeing nothing for reuse.
    chain
        .deliver(
            150,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::full(first.clone())),
        )
        .unwrap();

    let third = chain
        .deliver(150, &[&perm("alice")], Chain::create_msg(coins(vec![iov(1)]), 200))
        .unwrap()
        .data;

    assert_eq!(first, 1u64.to_be_bytes());
    assert_eq!(second, 2u64.to_be_bytes());
    assert_eq!(third, 3u64.to_be_bytes());

    // The deleted id stays permanently unreachable.
    let err = chain
        .deliver(
            150,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::full(first)),
        )
        .unwrap_err();
    assert!(matches!(err, HandlerError::NoSuchEscrow(_)));
}

#[test]
fn check_allocates_flat_gas_without_mutating() {
    let mut chain = Chain::new();

    let gas = chain.check_gas(
        100,
        &[&perm("alice")],
        Chain::create_msg(coins(vec![iov(10)]), 200),
    );
    assert_eq!(gas, 300);
    // Speculative execution left no record behind.
    assert!(chain.bucket.get(&chain.db, &1u64.to_be_bytes()).unwrap().is_none());
    assert_eq!(chain.db.get(b"escrow:seq").unwrap(), None);

    let id = chain.create_standard();
    assert_eq!(
        chain.check_gas(
            150,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::full(id.clone()))
        ),
        0
    );
    assert_eq!(
        chain.check_gas(201, &[], Msg::ReturnEscrow(ReturnEscrowMsg::new(id.clone()))),
        0
    );
    assert_eq!(
        chain.check_gas(
            150,
            &[&perm("bob")],
            Msg::UpdateEscrowParties(UpdateEscrowPartiesMsg {
                escrow_id: id,
                sender: None,
                recipient: Some(perm("dora")),
                arbiter: None,
            })
        ),
        50
    );
}

#[test]
fn update_rules() {
    let mut chain = Chain::new();
    let id = chain.create_standard();

    // Changing a slot needs the current holder's signature.
    let err = chain
        .deliver(
            150,
            &[&perm("dora")],
            Msg::UpdateEscrowParties(UpdateEscrowPartiesMsg {
                escrow_id: id.clone(),
                sender: None,
                recipient: Some(perm("dora")),
                arbiter: None,
            }),
        )
        .unwrap_err();
    assert_eq!(err, HandlerError::Unauthorized);

    // Changing two slots needs both holders.
    chain
        .deliver(
            150,
            &[&perm("alice"), &perm("carol")],
            Msg::UpdateEscrowParties(UpdateEscrowPartiesMsg {
                escrow_id: id.clone(),
                sender: Some(perm("ed")),
                recipient: None,
                arbiter: Some(perm("fay")),
            }),
        )
        .unwrap();
    let obj = chain.bucket.get(&chain.db, &id).unwrap().unwrap();
    assert_eq!(obj.escrow.sender, perm("ed"));
    assert_eq!(obj.escrow.arbiter, perm("fay"));

    // Past the timeout the parties are frozen.
    let err = chain
        .deliver(
            201,
            &[&perm("ed")],
            Msg::UpdateEscrowParties(UpdateEscrowPartiesMsg {
                escrow_id: id,
                sender: Some(perm("alice")),
                recipient: None,
                arbiter: None,
            }),
        )
        .unwrap_err();
    assert_eq!(err, HandlerError::EscrowExpired(200));
}

#[test]
fn operations_on_missing_escrow_fail() {
    let mut chain = Chain::new();
    let ghost = 42u64.to_be_bytes().to_vec();

    for msg in [
        Msg::ReleaseEscrow(ReleaseEscrowMsg::full(ghost.clone())),
        Msg::ReturnEscrow(ReturnEscrowMsg::new(ghost.clone())),
        Msg::UpdateEscrowParties(UpdateEscrowPartiesMsg {
            escrow_id: ghost.clone(),
            sender: None,
            recipient: Some(perm("dora")),
            arbiter: None,
        }),
    ] {
        let err = chain.deliver(150, &[&perm("carol")], msg).unwrap_err();
        assert_eq!(err, HandlerError::NoSuchEscrow(ghost.clone()));
    }
}

#[test]
fn total_outflow_matches_original_amount() {
    let mut chain = Chain::new();
    let id = chain.create_standard();

    for _ in 0..2 {
        chain
            .deliver(
                150,
                &[&perm("carol")],
                Msg::ReleaseEscrow(ReleaseEscrowMsg::partial(id.clone(), coins(vec![iov(4)]))),
            )
            .unwrap();
    }
    chain
        .deliver(
            150,
            &[&perm("carol")],
            Msg::ReleaseEscrow(ReleaseEscrowMsg::partial(id.clone(), coins(vec![iov(2)]))),
        )
        .unwrap();

    // 4 + 4 + 2 drained the escrow exactly; the record is gone and the
    // recipient received the full original amount.
    assert!(chain.bucket.get(&chain.db, &id).unwrap().is_none());
    assert!(chain.escrow_balance(&id).is_empty());
    assert_eq!(chain.balance(&perm("bob")), coins(vec![iov(10)]));
}
