//! Candidate dumps: one pretty-printed JSON file per top-ranked candidate.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use nanofolio::search::{CandidateSink, RebalancedPortfolio};

use crate::error::{Error, Result};

/// Writes `candidate-<rank>.json` files into a directory.
#[derive(Debug)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    /// Create the sink, making `dir` if needed.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| Error::DumpDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, rank: usize) -> PathBuf {
        self.dir.join(format!("candidate-{rank}.json"))
    }
}

impl CandidateSink for DirSink {
    fn dump(&self, rank: usize, candidate: &RebalancedPortfolio<'_>) {
        let record = serde_json::json!({
            "rank": rank,
            "total": candidate.score.total(),
            "rebalance_total": candidate.score.rebalance_total(),
            "expense_ratio": candidate.expense_ratio(),
            "taxable_sales": candidate.taxable_sales(),
            "candidate": candidate,
        });
        let path = self.path_for(rank);

        // A failed dump must not abort the search.
        let written = serde_json::to_string_pretty(&record)
            .map_err(std::io::Error::from)
            .and_then(|json| fs::write(&path, json));
        match written {
            Ok(()) => debug!("dumped candidate {rank} to {}", path.display()),
            Err(e) => warn!("failed to dump candidate {rank} to {}: {e}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanofolio::search::{SearchOptions, rebalance};
    use nanofolio::{Account, AccountType, Portfolio, Position, Security, SecurityCatalog, Symbol, TargetRatios};

    #[test]
    fn unusable_dir_is_a_dump_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, "").unwrap();

        let err = DirSink::new(&file.join("candidates")).unwrap_err();
        assert!(matches!(err, Error::DumpDir { .. }), "{err}");
        assert!(err.to_string().starts_with("failed to create dump directory"));
    }

    #[test]
    fn writes_ranked_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(&dir.path().join("candidates")).unwrap();

        let catalog = SecurityCatalog::from_securities([
            Security::new(Symbol::new("VTSAX"), "", None, 0.04, 1.0, 1.0).unwrap(),
            Security::new(Symbol::new("VBTLX"), "", None, 0.05, 0.0, 1.0).unwrap(),
        ]);
        let portfolio = Portfolio::new(vec![
            Account::new("Brokerage", "Vanguard", AccountType::Taxable, vec![
                Position::new(Symbol::new("VTSAX"), 5_000.0),
            ]),
            Account::new("IRA", "Vanguard", AccountType::TaxDeferred, vec![
                Position::new(Symbol::new("VTSAX"), 5_000.0),
            ]),
        ]);
        let ratios = TargetRatios::new(0.5, 1.0, 1.0).unwrap();
        let sink_ref: &dyn CandidateSink = &sink;
        let options = SearchOptions {
            dump_top: Some((2, sink_ref)),
            ..SearchOptions::default()
        };
        let outcome = rebalance(&portfolio, &catalog, &ratios, &options).unwrap();
        assert!(outcome.stats.unique >= 2);

        let first = fs::read_to_string(sink.path_for(0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value["rank"], 0);
        assert_eq!(
            value["rebalance_total"].as_f64().unwrap(),
            outcome.best.unwrap().score.rebalance_total()
        );
        assert!(value["candidate"]["orders"].is_array());
        assert!(sink.path_for(1).exists());
        assert!(!sink.path_for(2).exists());
    }
}
