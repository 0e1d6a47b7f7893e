#![allow(dead_code)]

use anchor_lang::prelude::*;
use kets_ledger::error::KetsError;
use kets_ledger::state::{Auction, BidReceipt, Industry, Registry, RoundResult};

pub fn assert_error<T: std::fmt::Debug>(result: Result<T>, expected: KetsError) {
    let name = format!("{expected:?}");
    let code: u32 = expected.into();
    match result {
        Err(anchor_lang::error::Error::AnchorError(e)) => {
            assert_eq!(e.error_code_number, code, "expected {name}, got {}", e.error_name)
        }
        other => panic!("expected {name}, got {other:?}"),
    }
}

/// In-memory ledger mirroring the accounts the program keeps on chain.
pub struct Ledger {
    pub regulator: Pubkey,
    pub registry: Registry,
    pub auction: Auction,
    pub industries: Vec<Industry>,
    pub receipts: Vec<BidReceipt>,
}

impl Ledger {
    pub fn deploy() -> Self {
        let regulator = Pubkey::new_unique();
        let mut registry = Registry::default();
        registry.init(regulator, 255);
        Self {
            regulator,
            registry,
            auction: Auction::default(),
            industries: Vec::new(),
            receipts: Vec::new(),
        }
    }

    pub fn register(&mut self, name: &str, is_eite: bool) -> usize {
        let mut industry = Industry::default();
        industry
            .register(Pubkey::new_unique(), name.to_string(), is_eite, 254)
            .unwrap();
        self.registry.record_registration().unwrap();
        self.industries.push(industry);
        self.industries.len() - 1
    }

    pub fn allocate(&mut self, idx: usize, credits: u64) -> Result<()> {
        let regulator = self.regulator;
        self.registry
            .free_allocation(&regulator, &mut self.industries[idx], credits)
    }

    pub fn trade(&mut self, from: usize, to: usize, credits: u64) -> Result<()> {
        assert_ne!(from, to);
        let (a, b) = if from < to {
            let (left, right) = self.industries.split_at_mut(to);
            (&mut left[from], &mut right[0])
        } else {
            let (left, right) = self.industries.split_at_mut(from);
            (&mut right[0], &mut left[to])
        };
        a.trade_to(b, credits)
    }

    pub fn bid(&mut self, idx: usize, credits: u64, lamports: u64) -> Result<u64> {
        let bidder = &self.industries[idx];
        let (index, escrow) = self.auction.record_bid(bidder, credits, lamports)?;
        let mut receipt = BidReceipt::default();
        receipt.record(self.auction.round, bidder.owner, index, credits, escrow, 253)?;
        self.receipts.push(receipt);
        Ok(escrow)
    }

    /// Closes the round without claiming anything.
    pub fn finalize(&mut self) -> Result<RoundResult> {
        let settlement = self.auction.settle()?;
        let mut result = RoundResult::default();
        result.record(&settlement, 252);
        Ok(result)
    }

    /// Claims every outstanding receipt of `result`'s round and returns
    /// `(bidder index, refund)` pairs in claim order.
    pub fn claim_all(&mut self, result: &mut RoundResult) -> Result<Vec<(usize, u64)>> {
        let (claimable, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.receipts)
            .into_iter()
            .partition(|r| r.round == result.round);
        self.receipts = rest;

        let mut refunds = Vec::new();
        for receipt in claimable {
            let outcome = result.claim(&receipt)?;
            let idx = self
                .industries
                .iter()
                .position(|i| i.owner == outcome.bidder)
                .unwrap();
            self.registry
                .settle_into(&mut self.industries[idx], outcome.credits_filled)?;
            self.auction.collect_payment(outcome.payment)?;
            refunds.push((idx, outcome.refund));
        }
        Ok(refunds)
    }

    /// Finalizes and claims in one go.
    pub fn settle_round(&mut self) -> Result<Vec<(usize, u64)>> {
        let mut result = self.finalize()?;
        self.claim_all(&mut result)
    }

    pub fn total_credits(&self) -> u64 {
        self.industries.iter().map(|i| i.credits_owned).sum()
    }
}
