use anchor_lang::prelude::*;

pub const REGISTRY_SEED: &[u8] = b"registry";
pub const INDUSTRY_SEED: &[u8] = b"industry";
pub const AUCTION_SEED: &[u8] = b"auction";
pub const BID_SEED: &[u8] = b"bid";
pub const ROUND_SEED: &[u8] = b"round";

/// Longest industry display name, in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// Pending bids one auction round can hold.
pub const MAX_BIDS: usize = 64;

pub fn registry_address() -> Pubkey {
    Pubkey::find_program_address(&[REGISTRY_SEED], &crate::ID).0
}

/// Industry record of `owner`. Clients look up "the industries of an
/// account" by fetching this address.
pub fn industry_address(owner: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[INDUSTRY_SEED, owner.as_ref()], &crate::ID).0
}

pub fn auction_address() -> Pubkey {
    Pubkey::find_program_address(&[AUCTION_SEED], &crate::ID).0
}

/// Escrow receipt of `bidder` in auction `round`.
pub fn receipt_address(round: u64, bidder: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[BID_SEED, &round.to_le_bytes(), bidder.as_ref()],
        &crate::ID,
    )
    .0
}

pub fn round_address(round: u64) -> Pubkey {
    Pubkey::find_program_address(&[ROUND_SEED, &round.to_le_bytes()], &crate::ID).0
}
