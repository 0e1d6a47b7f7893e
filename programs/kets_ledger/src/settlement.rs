//! Pro-rata allocation of auction supply across pending bids.
//!
//! When demand fits the supply every bid is filled in full. When it does not,
//! each bid receives `floor(requested * supply / total_requested)` credits and
//! the units lost to rounding are handed out one at a time, in submission
//! order, to bids that are still short. An oversubscribed auction therefore
//! always settles exactly `supply` credits, and no bid is filled beyond its
//! request.

use anchor_lang::prelude::*;

use crate::error::KetsError;

pub fn allocate(supply: u64, requested: &[u64]) -> Result<Vec<u64>> {
    let total = requested
        .iter()
        .try_fold(0u128, |acc, &r| acc.checked_add(r as u128))
        .ok_or(KetsError::MathError)?;

    if total <= supply as u128 {
        return Ok(requested.to_vec());
    }

    let mut fills = Vec::with_capacity(requested.len());
    let mut assigned: u128 = 0;
    for &r in requested {
        let share = (r as u128)
            .checked_mul(supply as u128)
            .ok_or(KetsError::MathError)?
            / total;
        assigned += share;
        // share < r because supply < total
        fills.push(share as u64);
    }

    let mut leftover = (supply as u128)
        .checked_sub(assigned)
        .ok_or(KetsError::MathError)?;
    for (fill, &r) in fills.iter_mut().zip(requested) {
        if leftover == 0 {
            break;
        }
        if *fill < r {
            *fill += 1;
            leftover -= 1;
        }
    }
    require!(leftover == 0, KetsError::MathError);

    Ok(fills)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undersubscribed_fills_everything() {
        let fills = allocate(500, &[10, 40, 100]).unwrap();
        assert_eq!(fills, vec![10, 40, 100]);
    }

    #[test]
    fn exact_demand_fills_everything() {
        let fills = allocate(30, &[10, 20]).unwrap();
        assert_eq!(fills, vec![10, 20]);
    }

    #[test]
    fn oversubscribed_scales_pro_rata() {
        // 200 requested against 100 supply: every bid is halved
        let fills = allocate(100, &[50, 150]).unwrap();
        assert_eq!(fills, vec![25, 75]);
    }

    #[test]
    fn rounding_remainder_goes_to_earliest_short_bids() {
        // 10 * 10 / 30 = 3.33 each, one unit left over
        let fills = allocate(10, &[10, 10, 10]).unwrap();
        assert_eq!(fills, vec![4, 3, 3]);
        assert_eq!(fills.iter().sum::<u64>(), 10);
    }

    #[test]
    fn tiny_supply_across_many_bids() {
        let fills = allocate(2, &[1, 1, 1, 1, 1]).unwrap();
        assert_eq!(fills, vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn no_bids_settles_nothing() {
        let fills = allocate(500, &[]).unwrap();
        assert!(fills.is_empty());
    }

    #[test]
    fn handles_values_near_u64_max() {
        let fills = allocate(u64::MAX - 1, &[u64::MAX, u64::MAX]).unwrap();
        assert_eq!(fills.iter().map(|&f| f as u128).sum::<u128>(), (u64::MAX - 1) as u128);
        assert_eq!(fills[0], fills[1]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_fills_bounded_by_request_and_supply(
                supply in 1u64..1_000_000,
                requested in proptest::collection::vec(1u64..100_000, 0..64),
            ) {
                let fills = allocate(supply, &requested).unwrap();
                prop_assert_eq!(fills.len(), requested.len());

                let settled: u64 = fills.iter().sum();
                let demand: u64 = requested.iter().sum();
                prop_assert_eq!(settled, demand.min(supply));

                for (fill, req) in fills.iter().zip(&requested) {
                    prop_assert!(fill <= req);
                }
            }
        }
    }
}
