use crate::balance::{BalanceChanges, BalanceLine};
use crate::commands::Out;
use crate::{utils, Result};
use anyhow::Context;
use std::path::Path;

/// Computes the net balance change of every currency in the canonical file at `path`.
///
/// # Errors
/// - The file does not exist or cannot be read.
/// - An amount is not a decimal number.
pub async fn check(path: &Path) -> Result<Out<Vec<BalanceLine>>> {
    utils::ensure_exists(path).await?;
    let contents = utils::read(path).await?;
    let changes = BalanceChanges::from_csv(&contents)
        .with_context(|| format!("Unable to check {}", path.display()))?;
    let report = changes.report();
    let message = format!(
        "Computed the balance changes of {} currencies in {}",
        report.len(),
        path.display()
    );
    Ok(Out::new(message, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_check() {
        let env = TestEnv::new();
        let path = env.write(
            "koinly_export.csv",
            "Date;Sent Amount;Sent Currency;Received Amount;Received Currency;Fee Amount;\
             Fee Currency;Net Worth Amount;Net Worth Currency;Label;Description;TxHash\n\
             2024-01-01 00:00:00 UTC;10;XTZ;10;slWXTZ;0.002;XTZ;;;swap;;0xabc\n",
        );
        let out = check(&path).await.unwrap();
        let report: Vec<String> = out
            .structure()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(report, ["XTZ: -10.002", "slWXTZ: +10"]);
    }

    #[tokio::test]
    async fn test_check_missing_file() {
        let env = TestEnv::new();
        let err = check(&env.path("nope.csv")).await.unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }
}
