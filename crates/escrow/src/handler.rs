//! The four escrow handlers.
//!
//! Each handler runs the same validation in Check and Deliver, so the
//! speculative and authoritative phases agree deterministically across
//! replicas. Check returns a flat gas cost; Deliver performs the
//! mutation. Rollback on error is supplied by the enclosing savepoint
//! decorator; handlers surface errors, never undo their own writes.

use crate::{Escrow, EscrowBucket, EscrowObject};
use mooring_cash::CashController;
use mooring_core::{
    Authenticator, CheckResult, Context, DeliverResult, Handler, HandlerError, QueryRouter,
    Router, Tx,
};
use mooring_messages::{
    CreateEscrowMsg, Msg, ReleaseEscrowMsg, UpdateEscrowPartiesMsg, PATH_CREATE_ESCROW,
    PATH_RELEASE_ESCROW, PATH_RETURN_ESCROW, PATH_UPDATE_ESCROW,
};
use mooring_store::KvStore;
use tracing::debug;

// Flat per-operation gas costs; create pays for the stored record
// up-front.
const CREATE_ESCROW_COST: u64 = 300;
const RELEASE_ESCROW_COST: u64 = 0;
const RETURN_ESCROW_COST: u64 = 0;
const UPDATE_ESCROW_COST: u64 = 50;

/// Register the four escrow routes on the router.
pub fn register_routes<A, C>(router: &mut Router, auth: A, cash: C)
where
    A: Authenticator + Clone + 'static,
    C: CashController + Clone + 'static,
{
    let bucket = EscrowBucket::new();
    router.handle(
        PATH_CREATE_ESCROW,
        Box::new(CreateEscrowHandler::new(auth.clone(), bucket, cash.clone())),
    );
    router.handle(
        PATH_RELEASE_ESCROW,
        Box::new(ReleaseEscrowHandler::new(auth.clone(), bucket, cash.clone())),
    );
    router.handle(
        PATH_RETURN_ESCROW,
        Box::new(ReturnEscrowHandler::new(bucket, cash)),
    );
    router.handle(
        PATH_UPDATE_ESCROW,
        Box::new(UpdateEscrowHandler::new(auth, bucket)),
    );
}

/// Expose the escrow bucket read-only under `/escrows`.
pub fn register_query(query_router: &mut QueryRouter) {
    EscrowBucket::new().register("escrows", query_router);
}

//---- create

/// Locks coins from the sender into a fresh escrow.
pub struct CreateEscrowHandler<A, C> {
    auth: A,
    bucket: EscrowBucket,
    cash: C,
}

impl<A, C> CreateEscrowHandler<A, C> {
    /// Wire the handler to its collaborators.
    pub fn new(auth: A, bucket: EscrowBucket, cash: C) -> Self {
        Self { auth, bucket, cash }
    }
}

impl<A: Authenticator, C: CashController> CreateEscrowHandler<A, C> {
    /// Common pre-processing for both phases.
    fn validate<'a>(&self, ctx: &Context, tx: &'a Tx) -> Result<&'a CreateEscrowMsg, HandlerError> {
        let msg = match tx.msg() {
            Msg::CreateEscrow(msg) => msg,
            other => return Err(HandlerError::UnknownTxType(other.path())),
        };
        msg.validate()?;

        // The timeout must lie in the future.
        if msg.timeout <= ctx.height() {
            return Err(HandlerError::InvalidTimeout(msg.timeout));
        }

        // An explicit sender must have signed; otherwise the main signer
        // substitutes, so there must be one.
        match &msg.sender {
            Some(sender) => {
                if !self.auth.has_address(ctx, &sender.address()) {
                    return Err(HandlerError::Unauthorized);
                }
            }
            None => {
                if self.auth.main_signer(ctx).is_none() {
                    return Err(HandlerError::Unauthorized);
                }
            }
        }

        Ok(msg)
    }
}

impl<A: Authenticator, C: CashController> Handler for CreateEscrowHandler<A, C> {
    fn check(
        &self,
        ctx: &Context,
        _db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<CheckResult, HandlerError> {
        self.validate(ctx, tx)?;
        Ok(CheckResult::with_gas(CREATE_ESCROW_COST))
    }

    fn deliver(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<DeliverResult, HandlerError> {
        let msg = self.validate(ctx, tx)?;

        let sender = match &msg.sender {
            Some(sender) => sender.clone(),
            None => self
                .auth
                .main_signer(ctx)
                .cloned()
                .ok_or(HandlerError::Unauthorized)?,
        };

        let escrow = Escrow {
            sender,
            recipient: msg.recipient.clone(),
            arbiter: msg.arbiter.clone(),
            amount: msg.amount.clone(),
            timeout: msg.timeout,
            memo: msg.memo.clone(),
        };
        let obj = self.bucket.create(db, escrow)?;

        // Move the locked coins onto the escrow's derived address. A
        // failed transfer short-circuits; the outer savepoint reverts
        // the record and any earlier transfers.
        let source = obj.escrow.sender.address();
        let dest = obj.address();
        for coin in obj.escrow.amount.iter() {
            self.cash.move_coins(db, &source, &dest, coin)?;
        }

        debug!(id = %hex::encode(obj.id()), height = ctx.height(), "escrow created");
        Ok(DeliverResult::with_data(obj.id().to_vec()))
    }
}

//---- release

/// Pays out locked coins to the recipient, at the arbiter's direction.
pub struct ReleaseEscrowHandler<A, C> {
    auth: A,
    bucket: EscrowBucket,
    cash: C,
}

impl<A, C> ReleaseEscrowHandler<A, C> {
    /// Wire the handler to its collaborators.
    pub fn new(auth: A, bucket: EscrowBucket, cash: C) -> Self {
        Self { auth, bucket, cash }
    }
}

impl<A: Authenticator, C: CashController> ReleaseEscrowHandler<A, C> {
    /// Common pre-processing for both phases.
    fn validate<'a>(
        &self,
        ctx: &Context,
        db: &dyn KvStore,
        tx: &'a Tx,
    ) -> Result<(&'a ReleaseEscrowMsg, EscrowObject), HandlerError> {
        let msg = match tx.msg() {
            Msg::ReleaseEscrow(msg) => msg,
            other => return Err(HandlerError::UnknownTxType(other.path())),
        };
        msg.validate()?;

        let obj = self
            .bucket
            .get(db, &msg.escrow_id)?
            .ok_or_else(|| HandlerError::NoSuchEscrow(msg.escrow_id.clone()))?;

        if !self.auth.has_address(ctx, &obj.escrow.arbiter.address()) {
            return Err(HandlerError::Unauthorized);
        }

        // Release stays valid through the timeout block itself; only
        // strictly later heights are expired.
        if obj.escrow.timeout < ctx.height() {
            return Err(HandlerError::EscrowExpired(obj.escrow.timeout));
        }

        Ok((msg, obj))
    }
}

impl<A: Authenticator, C: CashController> Handler for ReleaseEscrowHandler<A, C> {
    fn check(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<CheckResult, HandlerError> {
        self.validate(ctx, db, tx)?;
        Ok(CheckResult::with_gas(RELEASE_ESCROW_COST))
    }

    fn deliver(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<DeliverResult, HandlerError> {
        let (msg, mut obj) = self.validate(ctx, db, tx)?;

        // An empty request releases the full remaining balance.
        let request = if msg.amount.is_empty() {
            obj.escrow.amount.clone()
        } else {
            msg.amount.clone()
        };

        let source = obj.address();
        let dest = obj.escrow.recipient.address();
        let mut available = obj.escrow.amount.clone();
        for coin in request.iter() {
            self.cash.move_coins(db, &source, &dest, coin)?;
            // Keep the record's amount in lockstep with the held coins;
            // an over-request underflows here and rolls everything back.
            available = available.subtract(coin)?;
        }

        if available.is_positive() {
            obj.escrow.amount = available;
            self.bucket.save(db, &obj)?;
            debug!(id = %hex::encode(obj.id()), "escrow partially released");
            Ok(DeliverResult::with_data(obj.id().to_vec()))
        } else {
            self.bucket.delete(db, obj.id())?;
            debug!(id = %hex::encode(obj.id()), "escrow fully released");
            Ok(DeliverResult::default())
        }
    }
}

//---- return

/// Hands an expired escrow's coins back to the sender. No signer is
/// required; expiry is the gate.
pub struct ReturnEscrowHandler<C> {
    bucket: EscrowBucket,
    cash: C,
}

impl<C> ReturnEscrowHandler<C> {
    /// Wire the handler to its collaborators.
    pub fn new(bucket: EscrowBucket, cash: C) -> Self {
        Self { bucket, cash }
    }
}

impl<C: CashController> ReturnEscrowHandler<C> {
    /// Common pre-processing for both phases.
    fn validate(
        &self,
        ctx: &Context,
        db: &dyn KvStore,
        tx: &Tx,
    ) -> Result<EscrowObject, HandlerError> {
        let msg = match tx.msg() {
            Msg::ReturnEscrow(msg) => msg,
            other => return Err(HandlerError::UnknownTxType(other.path())),
        };
        msg.validate()?;

        let obj = self
            .bucket
            .get(db, &msg.escrow_id)?
            .ok_or_else(|| HandlerError::NoSuchEscrow(msg.escrow_id.clone()))?;

        // Return requires strict expiry; at the timeout height the
        // arbiter still has the exclusive release window.
        if ctx.height() <= obj.escrow.timeout {
            return Err(HandlerError::EscrowNotExpired(obj.escrow.timeout));
        }

        Ok(obj)
    }
}

impl<C: CashController> Handler for ReturnEscrowHandler<C> {
    fn check(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<CheckResult, HandlerError> {
        self.validate(ctx, db, tx)?;
        Ok(CheckResult::with_gas(RETURN_ESCROW_COST))
    }

    fn deliver(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<DeliverResult, HandlerError> {
        let obj = self.validate(ctx, db, tx)?;

        let source = obj.address();
        let dest = obj.escrow.sender.address();
        for coin in obj.escrow.amount.iter() {
            self.cash.move_coins(db, &source, &dest, coin)?;
        }

        self.bucket.delete(db, obj.id())?;
        debug!(id = %hex::encode(obj.id()), height = ctx.height(), "escrow returned");
        Ok(DeliverResult::default())
    }
}

//---- update

/// Replaces party permissions on an active escrow. Amount and timeout
/// are immutable after creation.
pub struct UpdateEscrowHandler<A> {
    auth: A,
    bucket: EscrowBucket,
}

impl<A> UpdateEscrowHandler<A> {
    /// Wire the handler to its collaborators.
    pub fn new(auth: A, bucket: EscrowBucket) -> Self {
        Self { auth, bucket }
    }
}

impl<A: Authenticator> UpdateEscrowHandler<A> {
    /// Common pre-processing for both phases.
    fn validate<'a>(
        &self,
        ctx: &Context,
        db: &dyn KvStore,
        tx: &'a Tx,
    ) -> Result<(&'a UpdateEscrowPartiesMsg, EscrowObject), HandlerError> {
        let msg = match tx.msg() {
            Msg::UpdateEscrowParties(msg) => msg,
            other => return Err(HandlerError::UnknownTxType(other.path())),
        };
        msg.validate()?;

        let obj = self
            .bucket
            .get(db, &msg.escrow_id)?
            .ok_or_else(|| HandlerError::NoSuchEscrow(msg.escrow_id.clone()))?;

        if ctx.height() > obj.escrow.timeout {
            return Err(HandlerError::EscrowExpired(obj.escrow.timeout));
        }

        // Each party slot being changed must be signed off by its
        // current holder.
        if msg.sender.is_some() && !self.auth.has_address(ctx, &obj.escrow.sender.address()) {
            return Err(HandlerError::Unauthorized);
        }
        if msg.recipient.is_some() && !self.auth.has_address(ctx, &obj.escrow.recipient.address())
        {
            return Err(HandlerError::Unauthorized);
        }
        if msg.arbiter.is_some() && !self.auth.has_address(ctx, &obj.escrow.arbiter.address()) {
            return Err(HandlerError::Unauthorized);
        }

        Ok((msg, obj))
    }
}

impl<A: Authenticator> Handler for UpdateEscrowHandler<A> {
    fn check(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<CheckResult, HandlerError> {
        self.validate(ctx, db, tx)?;
        Ok(CheckResult::with_gas(UPDATE_ESCROW_COST))
    }

    fn deliver(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<DeliverResult, HandlerError> {
        let (msg, mut obj) = self.validate(ctx, db, tx)?;

        if let Some(sender) = &msg.sender {
            obj.escrow.sender = sender.clone();
        }
        if let Some(recipient) = &msg.recipient {
            obj.escrow.recipient = recipient.clone();
        }
        if let Some(arbiter) = &msg.arbiter {
            obj.escrow.arbiter = arbiter.clone();
        }

        self.bucket.save(db, &obj)?;
        debug!(id = %hex::encode(obj.id()), "escrow parties updated");
        Ok(DeliverResult::default())
    }
}
