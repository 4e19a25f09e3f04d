use serde::{Deserialize, Serialize};

/// The tag that drives how the accounting tool treats a line. A line without a label is an
/// ordinary transfer or trade.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Swap,
    Stake,
    Unstake,
    Reward,
    Airdrop,
    #[serde(rename = "liquidity in")]
    LiquidityIn,
    #[serde(rename = "liquidity out")]
    LiquidityOut,
    Cost,
}

serde_plain::derive_display_from_serialize!(Label);
serde_plain::derive_fromstr_from_deserialize!(Label);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_label_display() {
        assert_eq!(Label::Swap.to_string(), "swap");
        assert_eq!(Label::LiquidityIn.to_string(), "liquidity in");
        assert_eq!(Label::LiquidityOut.to_string(), "liquidity out");
    }

    #[test]
    fn test_label_from_str() {
        assert_eq!(Label::from_str("unstake").unwrap(), Label::Unstake);
        assert_eq!(Label::from_str("liquidity in").unwrap(), Label::LiquidityIn);
        assert!(Label::from_str("gift").is_err());
    }
}
