//! BUY / HOLD / SELL rule cascade.
//!
//! Rules are tried top-down and the first match decides:
//!
//! 1. no trailing P/E, no forward P/E, no revenue flag, bias near zero → SELL
//! 2. revenue flag green → BUY on fair valuation, growth-at-value or bullish analysts; else HOLD
//! 3. cheap → BUY on growth-at-value or bullish analysts; else HOLD
//! 4. reasonable → same as cheap
//! 5. expensive → HOLD
//! 6. very expensive → HOLD for supported tech/communication names, SELL if analysts are bearish, else HOLD
//! 7. unknown valuation → SELL if analysts are bearish and no revenue flag; else HOLD

use screener_core::{Recommendation, RevFlag, ValuationTier};
use serde::Serialize;

use crate::valuation::valuation_tier;

/// Analyst bias above this is bullish, below its negation bearish.
pub const DIRECTIONAL_BIAS: f64 = 0.25;
/// Rule 1 only needs analysts to be silent, which is a tighter band than
/// the directional threshold.
pub const NEAR_ZERO_BIAS: f64 = 0.1;

pub const GROWTH_MAX_TRAILING_PE: f64 = 35.0;
pub const VALUE_MAX_TRAILING_PE: f64 = 20.0;
pub const VALUE_MAX_FORWARD_PE: f64 = 18.0;

/// Sectors where a very expensive multiple is tolerated when supported.
pub const PREMIUM_SECTORS: [&str; 2] = ["Technology", "Communication Services"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierInput<'a> {
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub rev_flag: RevFlag,
    pub sector: Option<&'a str>,
    /// 0.0 when no analyst data exists.
    pub analyst_bias: f64,
}

/// Intermediate values every rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Signals {
    pub tier: ValuationTier,
    pub growth_value_positive: bool,
    pub bullish: bool,
    pub bearish: bool,
}

impl Signals {
    pub fn derive(input: &ClassifierInput<'_>) -> Self {
        Self {
            tier: valuation_tier(input.trailing_pe),
            growth_value_positive: growth_value_positive(input.trailing_pe, input.forward_pe),
            bullish: input.analyst_bias > DIRECTIONAL_BIAS,
            bearish: input.analyst_bias < -DIRECTIONAL_BIAS,
        }
    }

    fn supported(&self) -> bool {
        self.growth_value_positive || self.bullish
    }
}

/// Earnings expected to hold or grow at a sane multiple, or a plain low multiple.
pub fn growth_value_positive(trailing_pe: Option<f64>, forward_pe: Option<f64>) -> bool {
    match (trailing_pe, forward_pe) {
        (Some(t), Some(f)) => {
            (f <= t && t <= GROWTH_MAX_TRAILING_PE)
                || (t < VALUE_MAX_TRAILING_PE && f < VALUE_MAX_FORWARD_PE)
        }
        _ => false,
    }
}

/// Which rule of the cascade produced the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Speculative,
    RevenueGreen,
    Cheap,
    Reasonable,
    Expensive,
    VeryExpensive,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub recommendation: Recommendation,
    pub rule: Rule,
    pub rationale: &'static str,
    pub signals: Signals,
}

pub fn classify(input: &ClassifierInput<'_>) -> Classification {
    let signals = Signals::derive(input);
    let (recommendation, rule, rationale) = decide(input, &signals);
    Classification {
        recommendation,
        rule,
        rationale,
        signals,
    }
}

fn decide(
    input: &ClassifierInput<'_>,
    s: &Signals,
) -> (Recommendation, Rule, &'static str) {
    use Recommendation::*;

    let green = input.rev_flag.is_green();
    let no_earnings = input.trailing_pe.is_none() && input.forward_pe.is_none();

    if no_earnings && !green && input.analyst_bias.abs() < NEAR_ZERO_BIAS {
        return (Sell, Rule::Speculative, "speculative, no earnings/analysts/revenue flag");
    }

    if green {
        let fair = matches!(s.tier, ValuationTier::Cheap | ValuationTier::Reasonable);
        return if fair || s.supported() {
            (Buy, Rule::RevenueGreen, "rev strong + decent valuation/analysts")
        } else {
            (Hold, Rule::RevenueGreen, "rev strong but valuation rich")
        };
    }

    match s.tier {
        ValuationTier::Cheap if s.supported() => (Buy, Rule::Cheap, "cheap + growth/analysts"),
        ValuationTier::Cheap => (Hold, Rule::Cheap, "cheap but no strong growth/analysts"),
        ValuationTier::Reasonable if s.supported() => {
            (Buy, Rule::Reasonable, "reasonable + growth/analysts")
        }
        ValuationTier::Reasonable => (Hold, Rule::Reasonable, "reasonable valuation"),
        ValuationTier::Expensive if s.supported() => {
            (Hold, Rule::Expensive, "expensive but supported")
        }
        ValuationTier::Expensive => (Hold, Rule::Expensive, "expensive, neutral"),
        ValuationTier::VeryExpensive => {
            let premium = input.sector.is_some_and(|sec| PREMIUM_SECTORS.iter().any(|p| *p == sec));
            if premium && s.supported() {
                (Hold, Rule::VeryExpensive, "high quality tech/comm, very expensive")
            } else if s.bearish {
                (Sell, Rule::VeryExpensive, "very expensive + bearish analysts")
            } else {
                (Hold, Rule::VeryExpensive, "very expensive, no strong signals")
            }
        }
        ValuationTier::Unknown if s.bearish && !green => {
            (Sell, Rule::Fallback, "bearish analysts, no revenue flag")
        }
        ValuationTier::Unknown => (Hold, Rule::Fallback, "fallback case"),
    }
}
