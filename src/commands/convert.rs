use crate::adapters::{read_rows, Source};
use crate::commands::Out;
use crate::consolidate::{sort_by_date, Consolidator};
use crate::diagnostics::Diagnostics;
use crate::model::{CsvLine, LedgerLine, DELIMITER, HEADERS};
use crate::{utils, Config, Result};
use anyhow::{anyhow, ensure, Context};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    source: Source,
    output: PathBuf,
    rows: usize,
    lines: usize,
    diagnostics: Diagnostics,
}

impl ConversionSummary {
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// The number of data rows read from all inputs.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The number of lines written.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Converts the exports in `files` into one canonical file named after the first input, written
/// next to it.
///
/// # Arguments
/// - `config` - Base currencies and localized vocabulary.
/// - `source` - The export format of `files`.
/// - `files` - The exports, in the order `source` expects them. `etherlink` takes the native
///   transfer file followed by the token transfer file.
///
/// # Errors
/// - The number of files does not match `source`.
/// - An input does not exist or cannot be read. Nothing is written in that case.
/// - An adapter meets a value it cannot interpret, such as a non-numeric amount.
pub async fn convert(
    config: &Config,
    source: Source,
    files: &[PathBuf],
) -> Result<Out<ConversionSummary>> {
    ensure!(
        files.len() == source.input_count(),
        "The {source} mode expects {} input file(s) but {} were given",
        source.input_count(),
        files.len()
    );
    for file in files {
        utils::ensure_exists(file).await?;
    }
    let output = output_path(&files[0])?;

    // `try_join!` takes a fixed number of futures, so only the two-file mode reads concurrently.
    let contents = match files {
        [first, second] => {
            let (first, second) = tokio::try_join!(utils::read(first), utils::read(second))?;
            vec![first, second]
        }
        _ => {
            let mut contents = Vec::with_capacity(files.len());
            for file in files {
                contents.push(utils::read(file).await?);
            }
            contents
        }
    };

    let mut diagnostics = Diagnostics::new();
    let mut lines = Vec::new();
    let mut rows = 0;
    for ((adapter, contents), file) in source.adapters(config).iter().zip(&contents).zip(files) {
        let records = read_rows(contents, adapter.delimiter())
            .with_context(|| format!("Unable to read {} as {}", file.display(), adapter.name()))?;
        rows += records.len();
        lines.extend(adapter.convert(&records, &mut diagnostics)?);
    }

    if source.consolidates() {
        sort_by_date(&mut lines);
        let before = lines.len();
        lines = Consolidator::from_config(config).consolidate(&lines, &mut diagnostics);
        debug!("Consolidation turned {before} lines into {}", lines.len());
    }

    utils::write(&output, to_csv(&lines)?).await?;
    info!("Wrote {}", output.display());

    let message = format!(
        "Converted {rows} {source} rows into {} lines in {} with {} diagnostic(s)",
        lines.len(),
        output.display(),
        diagnostics.len()
    );
    Ok(Out::new(
        message,
        ConversionSummary {
            source,
            output,
            rows,
            lines: lines.len(),
            diagnostics,
        },
    ))
}

/// `dir/export.csv` becomes `dir/koinly_export.csv`.
fn output_path(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .with_context(|| format!("{} is not a file path", input.display()))?;
    let name = format!("koinly_{}", name.to_string_lossy());
    Ok(match input.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    })
}

/// Serializes `lines` as a canonical file. The header is written even when there are no lines.
fn to_csv(lines: &[LedgerLine]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(HEADERS).context("Unable to write the header")?;
    for line in lines {
        wtr.serialize(CsvLine::from(line))
            .with_context(|| format!("Unable to write the line dated {}", line.date()))?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow!("Unable to flush the canonical file: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::test::TestEnv;

    const MERIA: &str = "txHash;type;sourceAmount;sourceCurrency;destinationAmount;\
        destinationCurrency;address;memo;destinationType;fee;txInfo;date\n\
        0xabc;credit;;;1.25;DOT;;;;0;reward;2022-05-01 10:00:00\n\
        n/a;exchange;100;EUR;0.004;BTC;;;;0.5;;2022-05-02 11:00:00\n\
        n/a;credit;;;1;DOT;;;;0;mystery;2022-05-03 12:00:00\n";

    const NATIVE: &str = "TxHash,BlockNumber,UnixTimestamp,FromAddress,ToAddress,\
        ContractAddress,Type,Value,Fee,Status,ErrCode,CurrentPrice,TxDateOpeningPrice,\
        TxDateClosingPrice,MethodName\n\
        0xaaa,10,1700000000,0xme,0xgateway,,OUT,10000000000000000000,2000000000000000,ok,,1,1,1,depositETH\n\
        0xbbb,11,1700000100,0xfriend,0xme,,IN,1000000000000000000,0,ok,,1,1,1,\n";

    const TOKEN: &str = "TxHash,BlockNumber,UnixTimestamp,FromAddress,ToAddress,\
        TokenContractAddress,Type,TokenSymbol,TokensTransferred,TokenDecimals,Status\n\
        0xaaa,10,1700000000,0xpool,0xme,0xsl,IN,slWXTZ,10000000000000000000,18,ok\n";

    #[tokio::test]
    async fn test_convert_meria() {
        let env = TestEnv::new();
        let input = env.write("meria.csv", MERIA);
        let out = convert(&env.config(), Source::Meria, &[input])
            .await
            .unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.rows(), 3);
        assert_eq!(summary.lines(), 2);
        assert_eq!(
            summary.diagnostics().count(DiagnosticKind::UnhandledCategory),
            1
        );
        assert_eq!(summary.output(), env.path("koinly_meria.csv"));

        let written = env.read("koinly_meria.csv");
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], HEADERS.join(";"));
        assert_eq!(
            lines[1],
            "2022-05-01 10:00:00 UTC;;;1.25;DOT;;;;;reward;;0xabc"
        );
        assert_eq!(
            lines[2],
            "2022-05-02 11:00:00 UTC;100;EUR;0.004;BTC;0.5;EUR;;;swap;;"
        );
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_convert_etherlink_consolidates() {
        let env = TestEnv::new();
        let native = env.write("native.csv", NATIVE);
        let token = env.write("token.csv", TOKEN);
        let out = convert(&env.config(), Source::Etherlink, &[native, token])
            .await
            .unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.rows(), 3);
        assert_eq!(summary.lines(), 2);
        assert!(summary.diagnostics().is_empty());

        let written = env.read("koinly_native.csv");
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines[1],
            "2023-11-14 22:13:20 UTC;10;XTZ;10;slWXTZ;0.002;XTZ;;;swap;\
             WRAP (depositETH): 0xme to 0xgateway;0xaaa"
        );
        assert!(lines[2].starts_with("2023-11-14 22:15:00 UTC;;;1;XTZ;"));
    }

    #[tokio::test]
    async fn test_convert_missing_file_writes_nothing() {
        let env = TestEnv::new();
        let native = env.write("native.csv", NATIVE);
        let missing = env.path("token.csv");
        let err = convert(&env.config(), Source::Etherlink, &[native, missing.clone()])
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Cannot open \"{}\": file not found.", missing.display())
        );
        assert!(!env.path("koinly_native.csv").exists());
    }

    #[tokio::test]
    async fn test_convert_wrong_file_count() {
        let env = TestEnv::new();
        let input = env.write("meria.csv", MERIA);
        let result = convert(&env.config(), Source::Etherlink, &[input]).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("/data/export.csv")).unwrap(),
            PathBuf::from("/data/koinly_export.csv")
        );
        assert_eq!(
            output_path(Path::new("export.csv")).unwrap(),
            PathBuf::from("koinly_export.csv")
        );
    }

    #[test]
    fn test_empty_output_has_header() {
        let bytes = to_csv(&[]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            format!("{}\n", HEADERS.join(";"))
        );
    }
}
