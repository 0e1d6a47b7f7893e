//! Raw account plumbing shared by the instruction handlers: industry records
//! taken as unchecked PDAs, and lamport moves out of program-owned accounts.

use anchor_lang::prelude::*;

use crate::error::KetsError;
use crate::state::Industry;

/// Reads the industry record behind a seeds-checked PDA. An address that was
/// never registered is still owned by the system program and has no data.
pub fn load_industry(info: &AccountInfo) -> Result<Industry> {
    require!(
        info.owner == &crate::ID && !info.data_is_empty(),
        KetsError::NotRegistered
    );
    let data = info.try_borrow_data()?;
    let industry = Industry::try_deserialize(&mut &data[..])?;
    require!(industry.is_registered, KetsError::NotRegistered);
    Ok(industry)
}

pub fn store_industry(info: &AccountInfo, industry: &Industry) -> Result<()> {
    let mut data = info.try_borrow_mut_data()?;
    let mut writer: &mut [u8] = &mut data[..];
    industry.try_serialize(&mut writer)?;
    Ok(())
}

/// Moves lamports out of a program-owned account.
pub fn release_lamports(from: &AccountInfo, to: &AccountInfo, lamports: u64) -> Result<()> {
    let debited = from
        .lamports()
        .checked_sub(lamports)
        .ok_or(KetsError::MathError)?;
    let credited = to
        .lamports()
        .checked_add(lamports)
        .ok_or(KetsError::MathError)?;

    **from.try_borrow_mut_lamports()? = debited;
    **to.try_borrow_mut_lamports()? = credited;
    Ok(())
}
