use anchor_lang::prelude::*;

#[event]
pub struct LedgerInitialized {
    pub regulator: Pubkey,
}

#[event]
pub struct IndustryRegistered {
    pub owner: Pubkey,
    pub name: String,
    pub is_eite: bool,
}

#[event]
pub struct CreditsAllocated {
    pub industry: Pubkey,
    pub credits: u64,
    pub balance: u64,
}

#[event]
pub struct CreditsTraded {
    pub from: Pubkey,
    pub to: Pubkey,
    pub credits: u64,
}

#[event]
pub struct AuctionCreated {
    pub round: u64,
    pub credits_available: u64,
    pub min_bid_price: u64,
    pub opened_at: i64,
}

#[event]
pub struct BidPlaced {
    pub round: u64,
    pub bidder: Pubkey,
    pub credits: u64,
    pub escrow: u64,
}

/// One per claimed receipt; `refund` goes back to the bidder with the receipt rent.
#[event]
pub struct BidClaimed {
    pub round: u64,
    pub bidder: Pubkey,
    pub credits_requested: u64,
    pub credits_filled: u64,
    pub payment: u64,
    pub refund: u64,
}

#[event]
pub struct AuctionFinalized {
    pub round: u64,
    pub credits_offered: u64,
    pub credits_settled: u64,
    pub credits_unsold: u64,
    pub payments_due: u64,
    pub refunds_due: u64,
}

#[event]
pub struct ProceedsWithdrawn {
    pub regulator: Pubkey,
    pub lamports: u64,
}
