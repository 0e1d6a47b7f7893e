use anchor_lang::prelude::*;

#[error_code]
pub enum KetsError {
    #[msg("Signer is not the regulator")]
    Unauthorized,
    #[msg("Industry is not registered")]
    NotRegistered,
    #[msg("Industry is already registered")]
    AlreadyRegistered,
    #[msg("Industry does not own enough credits")]
    InsufficientBalance,
    #[msg("Credit amount or price must be greater than zero")]
    InvalidAmount,
    #[msg("Auction is not in the correct state for this operation")]
    AuctionState,
    #[msg("Attached lamports do not match credits times the minimum bid price")]
    PaymentMismatch,
    #[msg("Industry name must be between 1 and 64 bytes")]
    InvalidName,
    #[msg("Cannot trade credits to yourself")]
    SelfTrade,
    #[msg("Bidder already has a pending bid in this auction")]
    DuplicateBid,
    #[msg("Auction bid book is full")]
    BidBookFull,
    #[msg("Bid receipt does not belong to this settlement round")]
    ReceiptMismatch,
    #[msg("Math overflow/underflow error")]
    MathError,
}
