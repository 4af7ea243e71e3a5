use screener_core::ValuationTier;

pub const CHEAP_BELOW: f64 = 12.0;
pub const REASONABLE_BELOW: f64 = 25.0;
pub const EXPENSIVE_BELOW: f64 = 40.0;

/// Bucket a trailing P/E. Each threshold belongs to the tier above it.
pub fn valuation_tier(trailing_pe: Option<f64>) -> ValuationTier {
    match trailing_pe.filter(|pe| !pe.is_nan()) {
        None => ValuationTier::Unknown,
        Some(pe) if pe < CHEAP_BELOW => ValuationTier::Cheap,
        Some(pe) if pe < REASONABLE_BELOW => ValuationTier::Reasonable,
        Some(pe) if pe < EXPENSIVE_BELOW => ValuationTier::Expensive,
        Some(_) => ValuationTier::VeryExpensive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_when_absent() {
        assert_eq!(valuation_tier(None), ValuationTier::Unknown);
        assert_eq!(valuation_tier(Some(f64::NAN)), ValuationTier::Unknown);
    }

    #[test]
    fn test_boundaries_belong_to_higher_tier() {
        assert_eq!(valuation_tier(Some(11.999)), ValuationTier::Cheap);
        assert_eq!(valuation_tier(Some(12.0)), ValuationTier::Reasonable);
        assert_eq!(valuation_tier(Some(24.99)), ValuationTier::Reasonable);
        assert_eq!(valuation_tier(Some(25.0)), ValuationTier::Expensive);
        assert_eq!(valuation_tier(Some(39.99)), ValuationTier::Expensive);
        assert_eq!(valuation_tier(Some(40.0)), ValuationTier::VeryExpensive);
        assert_eq!(valuation_tier(Some(400.0)), ValuationTier::VeryExpensive);
    }

    #[test]
    fn test_negative_pe_is_cheap() {
        assert_eq!(valuation_tier(Some(-5.0)), ValuationTier::Cheap);
    }

    #[test]
    fn test_tiers_are_monotonic() {
        let mut last = ValuationTier::Cheap;
        let mut pe = -10.0;
        while pe < 100.0 {
            let tier = valuation_tier(Some(pe));
            assert!(tier >= last, "tier went down at {}", pe);
            last = tier;
            pe += 0.25;
        }
    }
}
