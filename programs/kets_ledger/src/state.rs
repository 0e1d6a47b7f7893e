use anchor_lang::prelude::*;

use crate::constants::{MAX_BIDS, MAX_NAME_LEN};
use crate::error::KetsError;
use crate::settlement;

///////////////////////
// Registry
///////////////////////

/// Ledger-wide configuration and issuance totals.
///
/// The sum of every industry's `credits_owned` always equals
/// `credits_allocated + credits_auctioned`: trades move credits between
/// industries and never touch these totals.
#[account]
#[derive(Default, Debug)]
pub struct Registry {
    pub regulator: Pubkey,       // fixed at initialization
    pub industry_count: u64,     // registered industries
    pub credits_allocated: u64,  // issued through free allocation
    pub credits_auctioned: u64,  // issued through auction settlement
    pub bump: u8,
}

impl Registry {
    pub const LEN: usize = 32  // regulator
        + 8                    // industry_count
        + 8                    // credits_allocated
        + 8                    // credits_auctioned
        + 1;                   // bump

    pub fn init(&mut self, regulator: Pubkey, bump: u8) {
        self.regulator = regulator;
        self.industry_count = 0;
        self.credits_allocated = 0;
        self.credits_auctioned = 0;
        self.bump = bump;
    }

    pub fn require_regulator(&self, caller: &Pubkey) -> Result<()> {
        require_keys_eq!(self.regulator, *caller, KetsError::Unauthorized);
        Ok(())
    }

    pub fn record_registration(&mut self) -> Result<()> {
        self.industry_count = self
            .industry_count
            .checked_add(1)
            .ok_or(KetsError::MathError)?;
        Ok(())
    }

    /// Regulator-issued credits, added straight to the target's balance.
    pub fn free_allocation(
        &mut self,
        caller: &Pubkey,
        target: &mut Industry,
        credits: u64,
    ) -> Result<()> {
        self.require_regulator(caller)?;
        require!(target.is_registered, KetsError::NotRegistered);
        require!(credits > 0, KetsError::InvalidAmount);

        let balance = target
            .credits_owned
            .checked_add(credits)
            .ok_or(KetsError::MathError)?;
        let allocated = self
            .credits_allocated
            .checked_add(credits)
            .ok_or(KetsError::MathError)?;

        target.credits_owned = balance;
        self.credits_allocated = allocated;
        Ok(())
    }

    /// Credits one settled bid to its industry record.
    pub fn settle_into(&mut self, industry: &mut Industry, credits: u64) -> Result<()> {
        require!(industry.is_registered, KetsError::NotRegistered);

        let balance = industry
            .credits_owned
            .checked_add(credits)
            .ok_or(KetsError::MathError)?;
        let auctioned = self
            .credits_auctioned
            .checked_add(credits)
            .ok_or(KetsError::MathError)?;

        industry.credits_owned = balance;
        self.credits_auctioned = auctioned;
        Ok(())
    }

    pub fn credits_issued(&self) -> Result<u64> {
        self.credits_allocated
            .checked_add(self.credits_auctioned)
            .ok_or_else(|| error!(KetsError::MathError))
    }
}

///////////////////////
// Industry
///////////////////////

/// Ledger participant, keyed by the owner's address.
#[account]
#[derive(Default, Debug)]
pub struct Industry {
    pub owner: Pubkey,
    pub name: String,         // set once at registration
    pub is_registered: bool,
    pub is_eite: bool,        // energy-intensive / trade-exposed
    pub credits_owned: u64,
    pub bump: u8,
}

impl Industry {
    pub const LEN: usize = 32  // owner
        + 4 + MAX_NAME_LEN     // name
        + 1                    // is_registered
        + 1                    // is_eite
        + 8                    // credits_owned
        + 1;                   // bump

    pub fn register(&mut self, owner: Pubkey, name: String, is_eite: bool, bump: u8) -> Result<()> {
        require!(!self.is_registered, KetsError::AlreadyRegistered);
        require!(
            !name.is_empty() && name.len() <= MAX_NAME_LEN,
            KetsError::InvalidName
        );

        self.owner = owner;
        self.name = name;
        self.is_registered = true;
        self.is_eite = is_eite;
        self.credits_owned = 0;
        self.bump = bump;
        Ok(())
    }

    /// Zero-sum move of `credits` from `self` to `to`.
    pub fn trade_to(&mut self, to: &mut Industry, credits: u64) -> Result<()> {
        require!(self.is_registered, KetsError::NotRegistered);
        require!(to.is_registered, KetsError::NotRegistered);
        require_keys_neq!(self.owner, to.owner, KetsError::SelfTrade);
        require!(credits > 0, KetsError::InvalidAmount);
        require!(self.credits_owned >= credits, KetsError::InsufficientBalance);

        let received = to
            .credits_owned
            .checked_add(credits)
            .ok_or(KetsError::MathError)?;

        self.credits_owned -= credits;
        to.credits_owned = received;
        Ok(())
    }
}

///////////////////////
// Auction
///////////////////////

/// The singleton auction slot, reused round after round.
///
/// Escrowed lamports live on each bidder's [`BidReceipt`], never on this
/// account. While bids are pending, `escrow_total` equals the sum of
/// `bid.escrow`, which in turn equals the sum of `bid.credits * min_bid_price`.
/// `proceeds` counts the payments already collected from claimed receipts and
/// held here until the regulator withdraws them.
#[account]
#[derive(Default, Debug)]
pub struct Auction {
    pub round: u64,             // incremented on every create_auction
    pub status: u8,             // Idle=0, Open=1, Closed=2
    pub credits_offered: u64,   // supply at creation
    pub credits_available: u64, // unsold supply
    pub min_bid_price: u64,     // lamports per credit
    pub total_requested: u64,   // credits across pending bids
    pub escrow_total: u64,      // lamports held on pending receipts
    pub proceeds: u64,          // lamports owed to the regulator
    pub opened_at: i64,
    pub bids: Vec<Bid>,         // submission order, one per bidder
    pub bump: u8,
}

impl Auction {
    pub const LEN: usize = 8    // round
        + 1                     // status
        + 8                     // credits_offered
        + 8                     // credits_available
        + 8                     // min_bid_price
        + 8                     // total_requested
        + 8                     // escrow_total
        + 8                     // proceeds
        + 8                     // opened_at
        + 4 + (Bid::LEN * MAX_BIDS) // bids
        + 1;                    // bump

    pub fn status(&self) -> AuctionStatus {
        match self.status {
            0 => AuctionStatus::Idle,
            1 => AuctionStatus::Open,
            _ => AuctionStatus::Closed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == AuctionStatus::Open
    }

    pub fn bid_of(&self, bidder: &Pubkey) -> Option<&Bid> {
        self.bids.iter().find(|b| b.bidder == *bidder)
    }

    /// Lamports a bid for `credits` must attach.
    pub fn required_escrow(&self, credits: u64) -> Result<u64> {
        escrow_for(credits, self.min_bid_price)
    }

    pub fn open(&mut self, credits_available: u64, min_bid_price: u64, now: i64) -> Result<()> {
        require!(!self.is_active(), KetsError::AuctionState);
        require!(
            credits_available > 0 && min_bid_price > 0,
            KetsError::InvalidAmount
        );

        self.round = self.round.checked_add(1).ok_or(KetsError::MathError)?;
        self.status = AuctionStatus::Open as u8;
        self.credits_offered = credits_available;
        self.credits_available = credits_available;
        self.min_bid_price = min_bid_price;
        self.total_requested = 0;
        self.escrow_total = 0;
        self.opened_at = now;
        self.bids.clear();
        Ok(())
    }

    /// Records a bid and returns its position in the book together with the
    /// lamports to escrow for it. Supply is not touched until finalization.
    pub fn record_bid(
        &mut self,
        bidder: &Industry,
        credits: u64,
        lamports: u64,
    ) -> Result<(u32, u64)> {
        require!(self.is_active(), KetsError::AuctionState);
        require!(credits > 0, KetsError::InvalidAmount);
        require!(bidder.is_registered, KetsError::NotRegistered);

        let escrow = self.required_escrow(credits)?;
        require!(lamports == escrow, KetsError::PaymentMismatch);
        require!(self.bid_of(&bidder.owner).is_none(), KetsError::DuplicateBid);
        require!(self.bids.len() < MAX_BIDS, KetsError::BidBookFull);

        let total_requested = self
            .total_requested
            .checked_add(credits)
            .ok_or(KetsError::MathError)?;
        let escrow_total = self
            .escrow_total
            .checked_add(escrow)
            .ok_or(KetsError::MathError)?;

        let index = self.bids.len() as u32;
        self.total_requested = total_requested;
        self.escrow_total = escrow_total;
        self.bids.push(Bid {
            bidder: bidder.owner,
            credits,
            escrow,
        });
        Ok((index, escrow))
    }

    /// Allocates the supply across every pending bid and closes the round.
    ///
    /// Nothing moves here: each bidder's entitlement is returned in the
    /// [`Settlement`] and delivered later by claiming the bid receipt.
    pub fn settle(&mut self) -> Result<Settlement> {
        require!(self.is_active(), KetsError::AuctionState);

        let requested: Vec<u64> = self.bids.iter().map(|b| b.credits).collect();
        let fills = settlement::allocate(self.credits_available, &requested)?;

        let mut outcomes = Vec::with_capacity(self.bids.len());
        let mut credits_settled: u64 = 0;
        let mut payments: u64 = 0;
        let mut refunds: u64 = 0;
        for (bid, &credits_filled) in self.bids.iter().zip(&fills) {
            let outcome = BidOutcome::resolve(
                bid.bidder,
                bid.credits,
                bid.escrow,
                credits_filled,
                self.min_bid_price,
            )?;
            credits_settled = credits_settled
                .checked_add(credits_filled)
                .ok_or(KetsError::MathError)?;
            payments = payments
                .checked_add(outcome.payment)
                .ok_or(KetsError::MathError)?;
            refunds = refunds
                .checked_add(outcome.refund)
                .ok_or(KetsError::MathError)?;
            outcomes.push(outcome);
        }

        let resolved = payments.checked_add(refunds).ok_or(KetsError::MathError)?;
        require!(resolved == self.escrow_total, KetsError::MathError);
        let credits_available = self
            .credits_available
            .checked_sub(credits_settled)
            .ok_or(KetsError::MathError)?;

        self.status = AuctionStatus::Closed as u8;
        self.credits_available = credits_available;
        self.total_requested = 0;
        self.escrow_total = 0;
        self.bids.clear();

        Ok(Settlement {
            round: self.round,
            min_bid_price: self.min_bid_price,
            credits_offered: self.credits_offered,
            fills,
            outcomes,
            credits_settled,
            payments,
            refunds,
        })
    }

    /// Adds a claimed payment to the regulator's proceeds.
    pub fn collect_payment(&mut self, lamports: u64) -> Result<()> {
        self.proceeds = self
            .proceeds
            .checked_add(lamports)
            .ok_or(KetsError::MathError)?;
        Ok(())
    }

    /// Hands all collected proceeds to the regulator.
    pub fn take_proceeds(&mut self) -> Result<u64> {
        require!(self.proceeds > 0, KetsError::InvalidAmount);

        let lamports = self.proceeds;
        self.proceeds = 0;
        Ok(lamports)
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuctionStatus {
    Idle = 0,
    Open = 1,
    Closed = 2,
}

/// A pending bid entry
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Bid {
    pub bidder: Pubkey,
    pub credits: u64,
    pub escrow: u64, // lamports
}

impl Bid {
    pub const LEN: usize = 32  // bidder
        + 8                    // credits
        + 8;                   // escrow
}

fn escrow_for(credits: u64, price: u64) -> Result<u64> {
    let amount = (credits as u128)
        .checked_mul(price as u128)
        .ok_or(KetsError::MathError)?;
    u64::try_from(amount).map_err(|_| error!(KetsError::MathError))
}

///////////////////////
// Receipts
///////////////////////

/// Per-bidder escrow, one per (round, bidder). Holds the bid's lamports
/// until the bid is claimed, then closes back to the bidder.
#[account]
#[derive(Default, Debug)]
pub struct BidReceipt {
    pub round: u64,
    pub bidder: Pubkey,
    pub index: u32,   // position in the round's bid book
    pub credits: u64, // requested
    pub escrow: u64,  // lamports held on this account
    pub bump: u8,
}

impl BidReceipt {
    pub const LEN: usize = 8   // round
        + 32                   // bidder
        + 4                    // index
        + 8                    // credits
        + 8                    // escrow
        + 1;                   // bump

    pub fn record(
        &mut self,
        round: u64,
        bidder: Pubkey,
        index: u32,
        credits: u64,
        escrow: u64,
        bump: u8,
    ) -> Result<()> {
        require!(self.credits == 0, KetsError::DuplicateBid);

        self.round = round;
        self.bidder = bidder;
        self.index = index;
        self.credits = credits;
        self.escrow = escrow;
        self.bump = bump;
        Ok(())
    }
}

/// Fills of one finalized round, indexed like the round's bid book.
#[account]
#[derive(Default, Debug)]
pub struct RoundResult {
    pub round: u64,
    pub min_bid_price: u64,
    pub credits_offered: u64,
    pub credits_settled: u64,
    pub fills: Vec<u64>,
    pub claims_pending: u32,
    pub bump: u8,
}

impl RoundResult {
    pub const LEN: usize = 8   // round
        + 8                    // min_bid_price
        + 8                    // credits_offered
        + 8                    // credits_settled
        + 4 + (8 * MAX_BIDS)   // fills
        + 4                    // claims_pending
        + 1;                   // bump

    pub fn record(&mut self, settlement: &Settlement, bump: u8) {
        self.round = settlement.round;
        self.min_bid_price = settlement.min_bid_price;
        self.credits_offered = settlement.credits_offered;
        self.credits_settled = settlement.credits_settled;
        self.fills = settlement.fills.clone();
        self.claims_pending = settlement.fills.len() as u32;
        self.bump = bump;
    }

    /// Resolves `receipt` against this round. The receipt is closed by the
    /// caller, so each one is claimed at most once.
    pub fn claim(&mut self, receipt: &BidReceipt) -> Result<BidOutcome> {
        require!(receipt.round == self.round, KetsError::ReceiptMismatch);
        let credits_filled = *self
            .fills
            .get(receipt.index as usize)
            .ok_or(KetsError::ReceiptMismatch)?;
        require!(credits_filled <= receipt.credits, KetsError::ReceiptMismatch);

        let outcome = BidOutcome::resolve(
            receipt.bidder,
            receipt.credits,
            receipt.escrow,
            credits_filled,
            self.min_bid_price,
        )?;
        self.claims_pending = self
            .claims_pending
            .checked_sub(1)
            .ok_or(KetsError::ReceiptMismatch)?;
        Ok(outcome)
    }
}

/// Outcome of one bid: `payment + refund == escrow`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidOutcome {
    pub bidder: Pubkey,
    pub credits_requested: u64,
    pub credits_filled: u64,
    pub payment: u64,
    pub refund: u64,
}

impl BidOutcome {
    fn resolve(
        bidder: Pubkey,
        credits_requested: u64,
        escrow: u64,
        credits_filled: u64,
        price: u64,
    ) -> Result<Self> {
        let payment = escrow_for(credits_filled, price)?;
        let refund = escrow.checked_sub(payment).ok_or(KetsError::MathError)?;
        Ok(Self {
            bidder,
            credits_requested,
            credits_filled,
            payment,
            refund,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub round: u64,
    pub min_bid_price: u64,
    pub credits_offered: u64,
    pub fills: Vec<u64>,
    pub outcomes: Vec<BidOutcome>,
    pub credits_settled: u64,
    pub payments: u64,
    pub refunds: u64,
}
