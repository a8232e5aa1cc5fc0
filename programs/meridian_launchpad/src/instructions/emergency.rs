/**
 * Emergency Controls
 *
 * Circuit breaker for purchase and claim paths, and an admin escape hatch
 * that moves custody to the treasury outside the normal forwarding flow.
 */

use anchor_lang::prelude::*;
use anchor_lang::system_program;

use crate::instructions::configure::UpdateSaleSettings;
use crate::state::*;
use crate::{
    EmergencyWithdrawal, LaunchpadError, SalePaused, SaleUnpaused, SALE_CONFIG_SEED,
    SALE_VAULT_SEED,
};

// ===== ACCOUNTS

#[derive(Accounts)]
pub struct EmergencyWithdraw<'info> {
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

// ===== HANDLERS

pub fn pause_handler(ctx: Context<UpdateSaleSettings>) -> Result<()> {
    ctx.accounts.sale_config.paused = true;
    emit!(SalePaused {
        paused_by: ctx.accounts.admin.key(),
    });
    msg!("Sale paused");
    Ok(())
}

pub fn unpause_handler(ctx: Context<UpdateSaleSettings>) -> Result<()> {
    ctx.accounts.sale_config.paused = false;
    emit!(SaleUnpaused {
        unpaused_by: ctx.accounts.admin.key(),
    });
    msg!("Sale unpaused");
    Ok(())
}

pub fn emergency_withdraw_handler(ctx: Context<EmergencyWithdraw>, amount: u64) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;

    require!(amount > 0, LaunchpadError::InsufficientCustody);
    require!(
        amount <= ctx.accounts.sale_config.funds_in_custody,
        LaunchpadError::InsufficientCustody
    );

    let vault_bump = ctx.accounts.sale_config.vault_bump;
    let seeds: &[&[u8]] = &[SALE_VAULT_SEED, &[vault_bump]];
    let signer_seeds = &[seeds];
    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.system_program.to_account_info(),
        system_program::Transfer {
            from: ctx.accounts.sale_vault.to_account_info(),
            to: ctx.accounts.treasury.to_account_info(),
        },
        signer_seeds,
    );
    system_program::transfer(cpi_ctx, amount)?;

    let sale = &mut ctx.accounts.sale_config;
    sale.funds_in_custody -= amount;
    // Category earmarks cannot exceed what custody still holds
    if sale.funds_allocated > sale.funds_in_custody {
        sale.funds_allocated = sale.funds_in_custody;
    }

    emit!(EmergencyWithdrawal {
        amount,
        treasury: sale.treasury,
        timestamp: current_time,
    });

    msg!("Emergency withdrawal of {} lamports", amount);
    Ok(())
}
