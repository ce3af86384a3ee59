use crate::catalog::TableName;
use crate::errors::DatabaseError;
use crate::optimizer::core::statistics_meta::PartitionStats;
use crate::statistics::StatisticsCollector;
use crate::storage::{Region, RegionId, Storage};
use itertools::Itertools;
use log::{info, warn};
use std::fmt;
use std::fmt::Formatter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub enum RegionOutcome {
    Updated(Arc<PartitionStats>),
    /// Statistics were younger than the update frequency
    Skipped(Arc<PartitionStats>),
    Failed(DatabaseError),
}

/// What `ANALYZE <table>` did to each region of the table.
#[derive(Debug)]
pub struct AnalyzeReport {
    pub table_name: TableName,
    pub regions: Vec<(RegionId, RegionOutcome)>,
    /// Persisted statistics of regions that no longer exist
    pub expired: Vec<PathBuf>,
}

impl AnalyzeReport {
    pub fn updated(&self) -> usize {
        self.count(|outcome| matches!(outcome, RegionOutcome::Updated(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, RegionOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, RegionOutcome::Failed(_)))
    }

    fn count(&self, predicate: fn(&RegionOutcome) -> bool) -> usize {
        self.regions
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

impl fmt::Display for AnalyzeReport {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let regions = self
            .regions
            .iter()
            .map(|(region_id, outcome)| match outcome {
                RegionOutcome::Updated(stats) => format!(
                    "region {}: updated, {} rows, {} guideposts",
                    region_id,
                    stats.row_count,
                    stats.guideposts.len()
                ),
                RegionOutcome::Skipped(_) => format!("region {}: skipped", region_id),
                RegionOutcome::Failed(err) => format!("region {}: failed, {}", region_id, err),
            })
            .join("\n");

        write!(f, "Analyze {}\n{}", self.table_name, regions)
    }
}

pub struct Analyze {
    table_name: TableName,
}

impl Analyze {
    pub fn new(table_name: TableName) -> Self {
        Analyze { table_name }
    }

    /// Queues every region of the table, then waits for all of them. A region
    /// that fails, or is rejected by a full queue, is reported and does not
    /// stop the others.
    pub(crate) fn execute<S: Storage>(
        self,
        storage: &S,
        collector: &StatisticsCollector<S>,
    ) -> Result<AnalyzeReport, DatabaseError> {
        let Analyze { table_name } = self;
        let region_ids = storage
            .regions(&table_name)?
            .iter()
            .map(|region| region.id())
            .collect_vec();

        let handles = region_ids
            .iter()
            .map(|region_id| (*region_id, collector.collect_default(*region_id)))
            .collect_vec();
        let regions = handles
            .into_iter()
            .map(|(region_id, handle)| {
                let outcome = match handle.and_then(|handle| handle.wait()) {
                    Ok(outcome) if outcome.scanned => RegionOutcome::Updated(outcome.stats),
                    Ok(outcome) => RegionOutcome::Skipped(outcome.stats),
                    Err(err) => {
                        warn!("[Analyze]: region {} of {}: {}", region_id, table_name, err);
                        RegionOutcome::Failed(err)
                    }
                };
                (region_id, outcome)
            })
            .collect_vec();
        let expired = collector.clean_expired(&table_name, &region_ids)?;

        let report = AnalyzeReport {
            table_name,
            regions,
            expired,
        };
        info!(
            "[Analyze]: {} updated {}, skipped {}, failed {}",
            report.table_name,
            report.updated(),
            report.skipped(),
            report.failed()
        );

        Ok(report)
    }
}
