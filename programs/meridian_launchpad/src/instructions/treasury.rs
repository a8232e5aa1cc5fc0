/**
 * Treasury & Fund Custody
 *
 * Manual forwarding of unallocated custody, creation of named spending
 * categories carved out of custody, and category-bounded payouts.
 */

use anchor_lang::prelude::*;
use anchor_lang::system_program;

use crate::state::*;
use crate::{
    FundCategoryCreated, FundsForwarded, FundsSpent, LaunchpadError, FUND_CATEGORY_SEED,
    SALE_CONFIG_SEED, SALE_VAULT_SEED,
};

// ===== ACCOUNTS

#[derive(Accounts)]
pub struct ForwardFunds<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [SALE_VAULT_SEED],
        bump = sale_config.vault_bump
    )]
    pub sale_vault: SystemAccount<'info>,

    /// CHECK: validated against the configured treasury address
    #[account(mut, address = sale_config.treasury @ LaunchpadError::Unauthorized)]
    pub treasury: UncheckedAccount<'info>,

    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(id: u8)]
pub struct CreateFundCategory<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        init,
        payer = admin,
        space = FundCategory::LEN,
        seeds = [FUND_CATEGORY_SEED, &[id]],
        bump
    )]
    pub fund_category: Account<'info, FundCategory>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(id: u8)]
pub struct SpendFromCategory<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [FUND_CATEGORY_SEED, &[id]],
        bump = fund_category.bump,
        constraint = fund_category.id == id @ LaunchpadError::InvalidFundCategory
    )]
    pub fund_category: Account<'info, FundCategory>,

    #[account(
        mut,
        seeds = [SALE_VAULT_SEED],
        bump = sale_config.vault_bump
    )]
    pub sale_vault: SystemAccount<'info>,

    /// CHECK: payout destination chosen by the admin
    #[account(mut)]
    pub recipient: UncheckedAccount<'info>,

    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

// ===== HELPERS

/// Lamport transfer out of the vault, signed with the vault PDA seeds
fn vault_transfer<'info>(
    system_program: &Program<'info, System>,
    vault: &SystemAccount<'info>,
    destination: AccountInfo<'info>,
    vault_bump: u8,
    amount: u64,
) -> Result<()> {
    let seeds: &[&[u8]] = &[SALE_VAULT_SEED, &[vault_bump]];
    let signer_seeds = &[seeds];
    let cpi_ctx = CpiContext::new_with_signer(
        system_program.to_account_info(),
        system_program::Transfer {
            from: vault.to_account_info(),
            to: destination,
        },
        signer_seeds,
    );
    system_program::transfer(cpi_ctx, amount)
}

// ===== HANDLERS

pub fn forward_funds_handler(ctx: Context<ForwardFunds>) -> Result<()> {
    let amount = ctx.accounts.sale_config.unallocated_custody();
    if amount == 0 {
        return Ok(());
    }

    let vault_bump = ctx.accounts.sale_config.vault_bump;
    vault_transfer(
        &ctx.accounts.system_program,
        &ctx.accounts.sale_vault,
        ctx.accounts.treasury.to_account_info(),
        vault_bump,
        amount,
    )?;

    let sale = &mut ctx.accounts.sale_config;
    sale.funds_in_custody = sale
        .funds_in_custody
        .checked_sub(amount)
        .ok_or(LaunchpadError::MathOverflow)?;

    emit!(FundsForwarded {
        amount,
        treasury: sale.treasury,
        remaining_custody: sale.funds_in_custody,
    });

    msg!("Forwarded {} lamports to treasury", amount);
    Ok(())
}

pub fn create_fund_category_handler(
    ctx: Context<CreateFundCategory>,
    id: u8,
    name: [u8; 32],
    amount: u64,
) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;
    let sale = &mut ctx.accounts.sale_config;

    require!(amount > 0, LaunchpadError::InvalidFundCategory);
    require!(
        amount <= sale.unallocated_custody(),
        LaunchpadError::InsufficientCustody
    );

    sale.funds_allocated = sale
        .funds_allocated
        .checked_add(amount)
        .ok_or(LaunchpadError::MathOverflow)?;

    let category = &mut ctx.accounts.fund_category;
    category.id = id;
    category.name = name;
    category.allocated = amount;
    category.spent = 0;
    category.created_at = current_time;
    category.bump = ctx.bumps.fund_category;

    emit!(FundCategoryCreated {
        id,
        name,
        allocated: amount,
    });

    Ok(())
}

pub fn spend_from_category_handler(
    ctx: Context<SpendFromCategory>,
    id: u8,
    amount: u64,
) -> Result<()> {
    require!(amount > 0, LaunchpadError::InvalidFundCategory);

    ctx.accounts.fund_category.spend(amount)?;

    let vault_bump = ctx.accounts.sale_config.vault_bump;
    vault_transfer(
        &ctx.accounts.system_program,
        &ctx.accounts.sale_vault,
        ctx.accounts.recipient.to_account_info(),
        vault_bump,
        amount,
    )?;

    let sale = &mut ctx.accounts.sale_config;
    sale.funds_in_custody = sale
        .funds_in_custody
        .checked_sub(amount)
        .ok_or(LaunchpadError::MathOverflow)?;
    sale.funds_allocated = sale
        .funds_allocated
        .checked_sub(amount)
        .ok_or(LaunchpadError::MathOverflow)?;

    emit!(FundsSpent {
        category_id: id,
        amount,
        recipient: ctx.accounts.recipient.key(),
    });

    Ok(())
}
