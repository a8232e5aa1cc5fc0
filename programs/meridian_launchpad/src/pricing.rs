/**
 * Pricing Engine
 *
 * Fixed-point conversion from contributed lamports to token amounts, plus
 * engagement and referral bonus math. All division truncates toward zero so
 * rounding can never over-issue against a phase allocation.
 */

use anchor_lang::prelude::*;

use crate::{
    LaunchpadError, BPS_DENOMINATOR, ENGAGEMENT_WEIGHT_DISCORD, ENGAGEMENT_WEIGHT_FORUM,
    ENGAGEMENT_WEIGHT_GITHUB, ENGAGEMENT_WEIGHT_TWITTER, MAX_ENGAGEMENT_BONUS_BPS,
    TOKEN_DECIMALS,
};

/// Convert a contribution to raw token units at the phase price.
/// `price` is lamports per whole token; output is in raw (9-decimal) units.
pub fn tokens_for(contributed: u64, price: u64) -> Result<u64> {
    require!(price > 0, LaunchpadError::InvalidPhaseParams);

    let tokens = (contributed as u128)
        .checked_mul(TOKEN_DECIMALS as u128)
        .ok_or(LaunchpadError::MathOverflow)?
        .checked_div(price as u128)
        .ok_or(LaunchpadError::MathOverflow)?;

    u64::try_from(tokens).map_err(|_| LaunchpadError::MathOverflow.into())
}

/// Engagement bonus rate in bps for a verified profile.
/// Weighted score = 0.30*discord + 0.25*twitter + 0.30*github + 0.15*forum,
/// each category 0-100; the score maps to bps (x10) and is capped at 10%.
pub fn engagement_bonus_bps(
    discord: u8,
    twitter: u8,
    github: u8,
    forum: u8,
    verified: bool,
) -> u64 {
    if !verified {
        return 0;
    }

    // Weighted score scaled by 100 (max 10_000), then /10 to land in bps.
    let weighted_x100 = ENGAGEMENT_WEIGHT_DISCORD * discord.min(100) as u64
        + ENGAGEMENT_WEIGHT_TWITTER * twitter.min(100) as u64
        + ENGAGEMENT_WEIGHT_GITHUB * github.min(100) as u64
        + ENGAGEMENT_WEIGHT_FORUM * forum.min(100) as u64;

    (weighted_x100 / 10).min(MAX_ENGAGEMENT_BONUS_BPS)
}

/// Apply a bps rate to an amount, truncating
pub fn bps_share(amount: u64, bps: u64) -> Result<u64> {
    let share = (amount as u128)
        .checked_mul(bps as u128)
        .ok_or(LaunchpadError::MathOverflow)?
        .checked_div(BPS_DENOMINATOR as u128)
        .ok_or(LaunchpadError::MathOverflow)?;

    u64::try_from(share).map_err(|_| LaunchpadError::MathOverflow.into())
}

/// Bonus token amount for a base award at the combined bonus rate
pub fn bonus_tokens(base_tokens: u64, bonus_bps: u64) -> Result<u64> {
    bps_share(base_tokens, bonus_bps)
}

/// Split a purchase between the vested schedule and the immediate credit.
/// Returns (vested, immediate); the vested share truncates so the immediate
/// remainder absorbs any rounding dust.
pub fn split_distribution(total_tokens: u64, vesting_bps: u16) -> Result<(u64, u64)> {
    let vested = (total_tokens as u128)
        .checked_mul(vesting_bps as u128)
        .ok_or(LaunchpadError::MathOverflow)?
        .checked_div(BPS_DENOMINATOR as u128)
        .ok_or(LaunchpadError::MathOverflow)? as u64;

    let immediate = total_tokens
        .checked_sub(vested)
        .ok_or(LaunchpadError::MathOverflow)?;

    Ok((vested, immediate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PRESALE_VESTING_BPS, PRIVATE_VESTING_BPS};

    const SOL: u64 = 1_000_000_000;

    #[test]
    fn private_phase_scenario_prices_correctly() {
        // Price 0.02 per token, contribution of 25,000 units -> 1,250,000 tokens
        let price = 2 * SOL / 100;
        let contributed = 25_000 * SOL;
        let tokens = tokens_for(contributed, price).unwrap();
        assert_eq!(tokens, 1_250_000 * TOKEN_DECIMALS);

        let (vested, immediate) = split_distribution(tokens, PRIVATE_VESTING_BPS).unwrap();
        assert_eq!(vested, tokens);
        assert_eq!(immediate, 0);
    }

    #[test]
    fn presale_scenario_splits_half_and_half() {
        // Price 0.04, contribution 1,000 -> 25,000 tokens, 50/50 split
        let price = 4 * SOL / 100;
        let contributed = 1_000 * SOL;
        let tokens = tokens_for(contributed, price).unwrap();
        assert_eq!(tokens, 25_000 * TOKEN_DECIMALS);

        let (vested, immediate) = split_distribution(tokens, PRESALE_VESTING_BPS).unwrap();
        assert_eq!(vested, 12_500 * TOKEN_DECIMALS);
        assert_eq!(immediate, 12_500 * TOKEN_DECIMALS);
    }

    #[test]
    fn public_scenario_is_fully_immediate() {
        // Price 0.05, contribution 3,000 -> 60,000 tokens, no vested share
        let price = 5 * SOL / 100;
        let contributed = 3_000 * SOL;
        let tokens = tokens_for(contributed, price).unwrap();
        assert_eq!(tokens, 60_000 * TOKEN_DECIMALS);

        let (vested, immediate) = split_distribution(tokens, 0).unwrap();
        assert_eq!(vested, 0);
        assert_eq!(immediate, tokens);
    }

    #[test]
    fn conversion_truncates_toward_zero() {
        // 10 lamports at 3 lamports/token: 10 * 1e9 / 3 truncates
        let tokens = tokens_for(10, 3).unwrap();
        assert_eq!(tokens, 3_333_333_333);

        // Dust below one raw unit resolves to zero, never rounds up
        assert_eq!(tokens_for(0, 3).unwrap(), 0);
    }

    #[test]
    fn zero_price_is_rejected() {
        assert!(tokens_for(1_000, 0).is_err());
    }

    #[test]
    fn engagement_bonus_weighting_and_cap() {
        // Perfect scores: weighted 100 -> 1000 bps (10%)
        assert_eq!(engagement_bonus_bps(100, 100, 100, 100, true), 1_000);

        // Unverified profiles earn nothing regardless of score
        assert_eq!(engagement_bonus_bps(100, 100, 100, 100, false), 0);

        // 0.30*80 + 0.25*40 + 0.30*60 + 0.15*100 = 67 -> 670 bps
        assert_eq!(engagement_bonus_bps(80, 40, 60, 100, true), 670);

        assert_eq!(engagement_bonus_bps(0, 0, 0, 0, true), 0);
    }

    #[test]
    fn bonus_tokens_truncate() {
        // 670 bps of 1001 = 67.067 -> 67
        assert_eq!(bonus_tokens(1_001, 670).unwrap(), 67);
        assert_eq!(bonus_tokens(0, 1_000).unwrap(), 0);
    }

    #[test]
    fn split_dust_goes_to_immediate() {
        // Odd total at 50%: vested truncates, immediate takes the extra unit
        let (vested, immediate) = split_distribution(101, 5_000).unwrap();
        assert_eq!(vested, 50);
        assert_eq!(immediate, 51);
        assert_eq!(vested + immediate, 101);
    }
}
