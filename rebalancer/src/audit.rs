//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use nanofolio::diff::{self, Order};
use nanofolio::search::SearchOutcome;
use nanofolio::TargetRatios;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
    path: PathBuf,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

/// Convenience: log a run start event.
pub fn log_run_started(
    audit: &mut AuditLog,
    portfolio_file: &str,
    catalog_file: &str,
    ratios: &TargetRatios,
) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "portfolio_file": portfolio_file,
            "catalog_file": catalog_file,
            "ratios": ratios,
        }),
    )
}

/// Convenience: log search statistics and the winning scores.
pub fn log_search_completed(audit: &mut AuditLog, outcome: &SearchOutcome<'_>) -> Result<()> {
    let best = outcome.best.as_ref().map(|b| {
        serde_json::json!({
            "total": b.score.total(),
            "rebalance_total": b.score.rebalance_total(),
            "score": b.score,
        })
    });

    audit.log(
        "search_completed",
        serde_json::json!({
            "stats": outcome.stats,
            "original": {
                "total": outcome.original_score.total(),
                "score": outcome.original_score,
            },
            "best": best,
        }),
    )
}

/// Convenience: log the planned orders.
pub fn log_orders_planned(audit: &mut AuditLog, orders: &[Order]) -> Result<()> {
    let order_data: Vec<_> = orders
        .iter()
        .map(|o| {
            serde_json::json!({
                "account": o.account.to_string(),
                "symbol": o.symbol.as_str(),
                "action": format!("{}", o.action),
                "amount": o.amount,
            })
        })
        .collect();

    audit.log(
        "orders_planned",
        serde_json::json!({
            "orders": order_data,
            "taxable_sales": diff::taxable_sales(orders),
            "turnover": diff::turnover(orders),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log.log_simple("test_event").unwrap();
            log.log("test_data", serde_json::json!({"key": "value"}))
                .unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        // Each line should be valid JSON
        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }

        // First line should have "test_event"
        assert!(lines[0].contains("\"event\":\"test_event\""));
    }

    #[test]
    fn audit_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        let mut log = AuditLog::open(&path).unwrap();
        log.log_simple("test").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn orders_planned_event() {
        use nanofolio::{AccountKey, AccountType, Action, Symbol};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let orders = vec![Order {
            account: AccountKey {
                name: "Brokerage".into(),
                brokerage: "Vanguard".into(),
                account_type: AccountType::Taxable,
            },
            symbol: Symbol::new("VTSAX"),
            action: Action::Sell,
            amount: 250.0,
        }];

        {
            let mut log = AuditLog::open(&path).unwrap();
            log_orders_planned(&mut log, &orders).unwrap();
        }

        let line = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["event"], "orders_planned");
        assert_eq!(value["taxable_sales"], 250.0);
        assert_eq!(value["orders"][0]["action"], "SELL");
        assert!(value["ts"].is_string());
    }
}
