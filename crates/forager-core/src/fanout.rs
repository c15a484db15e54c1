use futures::stream::{FuturesUnordered, StreamExt};

use crate::error::AppError;
use crate::models::{DetailOutcome, DetailRecord, ProxyEndpoint};
use crate::traits::Enricher;

/// Default number of concurrent detail extractions.
const DEFAULT_CONCURRENCY: usize = 5;

/// One dropped unit of fan-out work.
#[derive(Debug, Clone)]
pub struct FanOutFailure {
    pub url: String,
    pub error: String,
}

/// Order-independent aggregate of a fan-out batch.
#[derive(Debug, Default)]
pub struct FanOutReport {
    pub records: Vec<DetailRecord>,
    pub failures: Vec<FanOutFailure>,
    /// Records that went through anomaly recovery (partial data).
    pub recovered: usize,
}

impl FanOutReport {
    /// Every address was either enriched or reported as a failure.
    pub fn attempted(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

/// Dispatches detail extraction for many addresses onto a bounded set of
/// concurrent tasks, all sharing the one proxy endpoint the resilient
/// fetch already validated.
///
/// Units are independent: a failing unit is recorded and dropped, never
/// allowed to abort its siblings. Results are collected as they complete;
/// no ordering relative to the input is guaranteed.
pub struct FanOutCoordinator<E: Enricher> {
    enricher: E,
    concurrency: usize,
}

impl<E: Enricher> FanOutCoordinator<E> {
    pub fn new(enricher: E) -> Self {
        Self {
            enricher,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Enrich all addresses, blocking until every unit has completed.
    pub async fn enrich_all(&self, addresses: &[String], proxy: &ProxyEndpoint) -> FanOutReport {
        let mut in_flight = FuturesUnordered::new();
        let mut report = FanOutReport::default();

        for url in addresses {
            in_flight.push(async move {
                (url.clone(), self.enricher.enrich(url, proxy).await)
            });

            while in_flight.len() >= self.concurrency {
                if let Some((url, result)) = in_flight.next().await {
                    collect(&mut report, url, result);
                }
            }
        }

        while let Some((url, result)) = in_flight.next().await {
            collect(&mut report, url, result);
        }

        tracing::info!(
            records = report.records.len(),
            failures = report.failures.len(),
            recovered = report.recovered,
            "Fan-out batch complete"
        );
        report
    }
}

fn collect(report: &mut FanOutReport, url: String, result: Result<DetailOutcome, AppError>) {
    match result {
        Ok(DetailOutcome::Complete(record)) => report.records.push(record),
        Ok(DetailOutcome::Recovered { record, reason }) => {
            tracing::warn!(%url, %reason, "Detail extraction recovered with partial data");
            report.recovered += 1;
            report.records.push(record);
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "Detail extraction failed");
            report.failures.push(FanOutFailure {
                url,
                error: e.to_string(),
            });
        }
    }
}
