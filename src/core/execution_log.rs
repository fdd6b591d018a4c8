// Append-only execution log, one JSON record per line

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::core::portfolio::PortfolioState;
use crate::simulation::execution_simulator::ExecutionReport;
use crate::types::{HoldingSide, Side};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Execution log I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Execution log record {line} is not valid JSON: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode execution record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub timestamp: DateTime<Utc>,
    pub market: String,
    pub side: Side,
    pub requested_quantity: Decimal,
    pub filled_quantity: Decimal,
    pub weighted_price: Decimal,
    pub fee_rate: Decimal,
    /// Proceeds for a sell, cost for a buy; fee included.
    pub net_amount: Decimal,
    pub partial: bool,
    pub base_balance: Decimal,
    pub secondary_balance: Decimal,
    pub holding_side: HoldingSide,
    /// Base at or below this amount cannot buy one more quantity step.
    #[serde(default)]
    pub base_dust: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub timestamp: DateTime<Utc>,
    pub market: String,
    pub reason: String,
    pub portfolio: PortfolioState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogRecord {
    Execution(ExecutionRecord),
    Checkpoint(CheckpointRecord),
}

impl LogRecord {
    /// Portfolio state as of this record.
    pub fn portfolio(&self) -> Option<PortfolioState> {
        match self {
            LogRecord::Execution(record) => {
                PortfolioState::new(record.base_balance, record.secondary_balance)
                    .ok()
                    .map(|portfolio| portfolio.with_base_dust(record.base_dust))
            }
            LogRecord::Checkpoint(record) => Some(record.portfolio.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionLog {
    path: PathBuf,
    market: String,
}

impl ExecutionLog {
    pub fn new<P: AsRef<Path>>(path: P, market: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            market: market.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_execution(
        &self,
        report: &ExecutionReport,
        portfolio: &PortfolioState,
    ) -> Result<ExecutionRecord, LogError> {
        let record = ExecutionRecord {
            timestamp: Utc::now(),
            market: self.market.clone(),
            side: report.side,
            requested_quantity: report.requested,
            filled_quantity: report.filled_quantity(),
            weighted_price: report.weighted_price().unwrap_or(Decimal::ZERO),
            fee_rate: report.fee_rate,
            net_amount: report.net_amount(),
            partial: report.is_partial(),
            base_balance: portfolio.base_balance(),
            secondary_balance: portfolio.secondary_balance(),
            holding_side: portfolio.holding_side(),
            base_dust: portfolio.base_dust(),
        };

        self.append(&LogRecord::Execution(record.clone()))?;
        Ok(record)
    }

    pub fn record_checkpoint(&self, portfolio: &PortfolioState, reason: &str) -> Result<(), LogError> {
        self.append(&LogRecord::Checkpoint(CheckpointRecord {
            timestamp: Utc::now(),
            market: self.market.clone(),
            reason: reason.to_string(),
            portfolio: portfolio.clone(),
        }))
    }

    fn append(&self, record: &LogRecord) -> Result<(), LogError> {
        let line = serde_json::to_string(record)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{}", line).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Every record in file order. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<LogRecord>, LogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        let mut records = Vec::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .map_err(|source| LogError::Parse { line: index + 1, source })?;
            records.push(record);
        }

        Ok(records)
    }

    /// Portfolio from the last record written for this market.
    pub fn last_portfolio(&self) -> Result<Option<PortfolioState>, LogError> {
        let records = self.read_all()?;
        Ok(records
            .iter()
            .rev()
            .find(|record| match record {
                LogRecord::Execution(r) => r.market == self.market,
                LogRecord::Checkpoint(r) => r.market == self.market,
            })
            .and_then(LogRecord::portfolio))
    }

    fn io_error(&self, source: std::io::Error) -> LogError {
        LogError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
