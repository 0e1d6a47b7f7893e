use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};

pub mod constants;
pub mod error;
pub mod events;
pub mod settlement;
pub mod state;
pub mod vault;

use constants::*;
use error::KetsError;
use events::*;
use state::*;
use vault::{load_industry, release_lamports, store_industry};

declare_id!("DxiLhTTsUqzgw4HJu1dREjmdd5EFMoigku3qf8WPisnG");

#[program]
pub mod kets_ledger {
    use super::*;

    /// Create the registry and the empty auction slot. The program's upgrade
    /// authority is the only signer allowed to do this and becomes the regulator.
    pub fn initialize(ctx: Context<Initialize>) -> Result<()> {
        let regulator = ctx.accounts.regulator.key();
        ctx.accounts.registry.init(regulator, ctx.bumps.registry);

        let auction = &mut ctx.accounts.auction;
        auction.status = AuctionStatus::Idle as u8;
        auction.bump = ctx.bumps.auction;

        emit!(LedgerInitialized { regulator });
        Ok(())
    }

    /// Register the signer as an industry (one-time per owner)
    pub fn register_industry(
        ctx: Context<RegisterIndustry>,
        name: String,
        is_eite: bool,
    ) -> Result<()> {
        let owner = ctx.accounts.owner.key();
        ctx.accounts
            .industry
            .register(owner, name.clone(), is_eite, ctx.bumps.industry)?;
        ctx.accounts.registry.record_registration()?;

        emit!(IndustryRegistered {
            owner,
            name,
            is_eite,
        });
        Ok(())
    }

    /// Regulator issues free credits to a registered industry
    pub fn free_allocation(
        ctx: Context<FreeAllocation>,
        target: Pubkey,
        credits: u64,
    ) -> Result<()> {
        let regulator = ctx.accounts.regulator.key();
        let info = ctx.accounts.industry.to_account_info();
        let mut industry = load_industry(&info)?;

        ctx.accounts
            .registry
            .free_allocation(&regulator, &mut industry, credits)?;
        store_industry(&info, &industry)?;

        emit!(CreditsAllocated {
            industry: target,
            credits,
            balance: industry.credits_owned,
        });
        Ok(())
    }

    /// Signer moves credits from its own industry record to `to`'s
    pub fn trade_credits(ctx: Context<TradeCredits>, to: Pubkey, credits: u64) -> Result<()> {
        let sender_info = ctx.accounts.sender_industry.to_account_info();
        let recipient_info = ctx.accounts.recipient_industry.to_account_info();
        let mut sender = load_industry(&sender_info)?;
        let mut recipient = load_industry(&recipient_info)?;

        sender.trade_to(&mut recipient, credits)?;
        store_industry(&sender_info, &sender)?;
        store_industry(&recipient_info, &recipient)?;

        emit!(CreditsTraded {
            from: ctx.accounts.sender.key(),
            to,
            credits,
        });
        Ok(())
    }

    /// Open a new auction round in the singleton slot
    pub fn create_auction(
        ctx: Context<CreateAuction>,
        credits_available: u64,
        min_bid_price: u64,
    ) -> Result<()> {
        ctx.accounts
            .registry
            .require_regulator(&ctx.accounts.regulator.key())?;

        let now = Clock::get()?.unix_timestamp;
        let auction = &mut ctx.accounts.auction;
        auction.open(credits_available, min_bid_price, now)?;

        msg!(
            "auction round {} open: {} credits at {} lamports",
            auction.round,
            credits_available,
            min_bid_price
        );
        emit!(AuctionCreated {
            round: auction.round,
            credits_available,
            min_bid_price,
            opened_at: auction.opened_at,
        });
        Ok(())
    }

    /// Bidder places a bid, escrowing exactly `credits * min_bid_price`
    /// lamports on its own bid receipt
    pub fn place_bid(ctx: Context<PlaceBid>, credits: u64, lamports: u64) -> Result<()> {
        let bidder = load_industry(&ctx.accounts.bidder_industry.to_account_info())?;
        let auction = &mut ctx.accounts.auction;
        let (index, escrow) = auction.record_bid(&bidder, credits, lamports)?;

        let receipt = &mut ctx.accounts.receipt;
        receipt.record(
            auction.round,
            bidder.owner,
            index,
            credits,
            escrow,
            ctx.bumps.receipt,
        )?;

        let cpi_ctx = CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: ctx.accounts.bidder.to_account_info(),
                to: receipt.to_account_info(),
            },
        );
        system_program::transfer(cpi_ctx, escrow)?;

        emit!(BidPlaced {
            round: auction.round,
            bidder: bidder.owner,
            credits,
            escrow,
        });
        Ok(())
    }

    /// Allocate the supply pro-rata across every pending bid and close the
    /// round. Fills are recorded on the round result; nothing is paid out
    /// until each receipt is claimed.
    pub fn finalize_auction(ctx: Context<FinalizeAuction>) -> Result<()> {
        ctx.accounts
            .registry
            .require_regulator(&ctx.accounts.regulator.key())?;

        let auction = &mut ctx.accounts.auction;
        let settlement = auction.settle()?;
        ctx.accounts
            .round_result
            .record(&settlement, ctx.bumps.round_result);

        msg!(
            "auction round {} finalized: {} credits settled, {} unsold",
            settlement.round,
            settlement.credits_settled,
            auction.credits_available
        );
        emit!(AuctionFinalized {
            round: settlement.round,
            credits_offered: settlement.credits_offered,
            credits_settled: settlement.credits_settled,
            credits_unsold: auction.credits_available,
            payments_due: settlement.payments,
            refunds_due: settlement.refunds,
        });
        Ok(())
    }

    /// Deliver one finalized bid: credit the bidder's industry, move the
    /// payment into proceeds and close the receipt (refund plus rent) back
    /// to the bidder. Any signer may claim on a bidder's behalf.
    pub fn claim_settlement(ctx: Context<ClaimSettlement>) -> Result<()> {
        let outcome = ctx.accounts.round_result.claim(&ctx.accounts.receipt)?;

        let info = ctx.accounts.bidder_industry.to_account_info();
        let mut industry = load_industry(&info)?;
        ctx.accounts
            .registry
            .settle_into(&mut industry, outcome.credits_filled)?;
        store_industry(&info, &industry)?;
        ctx.accounts.auction.collect_payment(outcome.payment)?;

        // the rest of the receipt goes to the bidder when it closes
        release_lamports(
            &ctx.accounts.receipt.to_account_info(),
            &ctx.accounts.auction.to_account_info(),
            outcome.payment,
        )?;

        emit!(BidClaimed {
            round: ctx.accounts.receipt.round,
            bidder: outcome.bidder,
            credits_requested: outcome.credits_requested,
            credits_filled: outcome.credits_filled,
            payment: outcome.payment,
            refund: outcome.refund,
        });
        Ok(())
    }

    /// Regulator collects the lamports paid for claimed credits
    pub fn withdraw_proceeds(ctx: Context<WithdrawProceeds>) -> Result<()> {
        let regulator = ctx.accounts.regulator.key();
        ctx.accounts.registry.require_regulator(&regulator)?;

        let lamports = ctx.accounts.auction.take_proceeds()?;
        release_lamports(
            &ctx.accounts.auction.to_account_info(),
            &ctx.accounts.regulator.to_account_info(),
            lamports,
        )?;

        emit!(ProceedsWithdrawn {
            regulator,
            lamports,
        });
        Ok(())
    }
}

///////////////////////
// Contexts
///////////////////////

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = regulator,
        space = 8 + Registry::LEN,
        seeds = [REGISTRY_SEED],
        bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        init,
        payer = regulator,
        space = 8 + Auction::LEN,
        seeds = [AUCTION_SEED],
        bump
    )]
    pub auction: Account<'info, Auction>,

    #[account(mut)]
    pub regulator: Signer<'info>,

    #[account(
        constraint = program.programdata_address()? == Some(program_data.key()) @ KetsError::Unauthorized
    )]
    pub program: Program<'info, crate::program::KetsLedger>,

    #[account(
        constraint = program_data.upgrade_authority_address == Some(regulator.key()) @ KetsError::Unauthorized
    )]
    pub program_data: Account<'info, ProgramData>,

    pub system_program: Program<'info, System>,
}

/// Industry PDA is created on first registration; a second call finds it
/// already registered and fails.
#[derive(Accounts)]
pub struct RegisterIndustry<'info> {
    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + Industry::LEN,
        seeds = [INDUSTRY_SEED, owner.key().as_ref()],
        bump
    )]
    pub industry: Account<'info, Industry>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(target: Pubkey)]
pub struct FreeAllocation<'info> {
    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    /// CHECK: industry PDA of `target`, read by `vault::load_industry`
    #[account(
        mut,
        seeds = [INDUSTRY_SEED, target.as_ref()],
        bump
    )]
    pub industry: UncheckedAccount<'info>,

    pub regulator: Signer<'info>, // must equal registry.regulator
}

#[derive(Accounts)]
#[instruction(to: Pubkey)]
pub struct TradeCredits<'info> {
    /// CHECK: industry PDA of the signer, read by `vault::load_industry`
    #[account(
        mut,
        seeds = [INDUSTRY_SEED, sender.key().as_ref()],
        bump
    )]
    pub sender_industry: UncheckedAccount<'info>,

    /// CHECK: industry PDA of `to`, read by `vault::load_industry`
    #[account(
        mut,
        seeds = [INDUSTRY_SEED, to.as_ref()],
        bump,
        constraint = to != sender.key() @ KetsError::SelfTrade
    )]
    pub recipient_industry: UncheckedAccount<'info>,

    pub sender: Signer<'info>,
}

#[derive(Accounts)]
pub struct CreateAuction<'info> {
    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [AUCTION_SEED],
        bump = auction.bump
    )]
    pub auction: Account<'info, Auction>,

    pub regulator: Signer<'info>,
}

/// The receipt is created on the first bid of a round; a second bid from the
/// same bidder finds it filled and fails.
#[derive(Accounts)]
pub struct PlaceBid<'info> {
    #[account(
        mut,
        seeds = [AUCTION_SEED],
        bump = auction.bump
    )]
    pub auction: Account<'info, Auction>,

    #[account(
        init_if_needed,
        payer = bidder,
        space = 8 + BidReceipt::LEN,
        seeds = [BID_SEED, &auction.round.to_le_bytes(), bidder.key().as_ref()],
        bump
    )]
    pub receipt: Account<'info, BidReceipt>,

    /// CHECK: industry PDA of the bidder, read by `vault::load_industry`
    #[account(
        seeds = [INDUSTRY_SEED, bidder.key().as_ref()],
        bump
    )]
    pub bidder_industry: UncheckedAccount<'info>,

    #[account(mut)]
    pub bidder: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct FinalizeAuction<'info> {
    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [AUCTION_SEED],
        bump = auction.bump
    )]
    pub auction: Account<'info, Auction>,

    #[account(
        init,
        payer = regulator,
        space = 8 + RoundResult::LEN,
        seeds = [ROUND_SEED, &auction.round.to_le_bytes()],
        bump
    )]
    pub round_result: Account<'info, RoundResult>,

    #[account(mut)]
    pub regulator: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct ClaimSettlement<'info> {
    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [AUCTION_SEED],
        bump = auction.bump
    )]
    pub auction: Account<'info, Auction>,

    #[account(
        mut,
        seeds = [BID_SEED, &receipt.round.to_le_bytes(), bidder.key().as_ref()],
        bump = receipt.bump,
        has_one = bidder @ KetsError::ReceiptMismatch,
        close = bidder
    )]
    pub receipt: Account<'info, BidReceipt>,

    #[account(
        mut,
        seeds = [ROUND_SEED, &receipt.round.to_le_bytes()],
        bump = round_result.bump
    )]
    pub round_result: Account<'info, RoundResult>,

    /// CHECK: industry PDA of the bidder, read by `vault::load_industry`
    #[account(
        mut,
        seeds = [INDUSTRY_SEED, bidder.key().as_ref()],
        bump
    )]
    pub bidder_industry: UncheckedAccount<'info>,

    /// CHECK: receipt owner, bound by `has_one`; receives the refund and rent
    #[account(mut)]
    pub bidder: UncheckedAccount<'info>,

    pub claimant: Signer<'info>,
}

#[derive(Accounts)]
pub struct WithdrawProceeds<'info> {
    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [AUCTION_SEED],
        bump = auction.bump
    )]
    pub auction: Account<'info, Auction>,

    #[account(mut)]
    pub regulator: Signer<'info>,
}
