//! Batch Publisher - Publishes several publications in one run
//!
//! Features:
//! - Parallel or sequential publishing
//! - Fail-fast option for sequential runs
//! - Concurrency control
//! - Detailed reporting for each publication

use crate::api::FileHostApi;
use crate::core::error::PublishError;
use crate::core::model::Publication;
use crate::core::report::PublishReport;
use crate::orchestration::curseforge_publisher::CurseForgePublisher;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Batch publishing options
#[derive(Debug, Clone)]
pub struct BatchPublishOptions {
    /// Publish sequentially (default: parallel)
    pub sequential: bool,

    /// Skip remaining publications after the first failure (sequential only)
    pub fail_fast: bool,

    /// Maximum concurrent publications (default: 3)
    pub max_concurrency: usize,
}

impl Default for BatchPublishOptions {
    fn default() -> Self {
        Self {
            sequential: false,
            fail_fast: false,
            max_concurrency: 3,
        }
    }
}

/// Batch publish result
#[derive(Debug, Clone, Default)]
pub struct BatchPublishResult {
    /// Fully published publications
    pub succeeded: Vec<String>,

    /// Failed publications with error messages
    pub failed: BTreeMap<String, String>,

    /// Skipped publications (due to previous failures)
    pub skipped: Vec<String>,

    /// Overall success status
    pub success: bool,

    /// Reports of every publication that reached the remote, including
    /// partially published ones
    pub reports: HashMap<String, PublishReport>,
}

impl BatchPublishResult {
    fn record(&mut self, name: String, outcome: Result<PublishReport, PublishError>) {
        match outcome {
            Ok(report) => {
                tracing::info!(
                    publication = %name,
                    duration_ms = report.duration,
                    "Publication published"
                );
                self.succeeded.push(name.clone());
                self.reports.insert(name, report);
            }
            Err(error) => {
                tracing::error!(publication = %name, code = error.code(), "{}", error);
                if let PublishError::PartialPublish { report, .. } = &error {
                    self.reports.insert(name.clone(), (**report).clone());
                }
                self.failed.insert(name, error.to_string());
            }
        }
    }

    /// Human-readable summary of the run
    pub fn format_summary(&self) -> String {
        let rule = "=".repeat(60);
        let mut lines = vec![
            String::new(),
            rule.clone(),
            "📊 Publish Summary".to_string(),
            rule.clone(),
        ];

        lines.push(format!("\n✅ Succeeded: {}", self.succeeded.len()));
        for name in &self.succeeded {
            if let Some(report) = self.reports.get(name) {
                lines.push(format!(
                    "   - {} (project {}, file {}, {}ms)",
                    name,
                    report.project_id,
                    report
                        .main_file_id()
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                    report.duration
                ));
                for artifact in &report.secondary {
                    if let Some(file_id) = artifact.file_id() {
                        lines.push(format!("       {} -> file {}", artifact.name, file_id));
                    }
                }
            }
        }

        lines.push(format!("\n❌ Failed: {}", self.failed.len()));
        for (name, error) in &self.failed {
            lines.push(format!("   - {}: {}", name, error));
            if let Some(report) = self.reports.get(name) {
                lines.push(format!(
                    "       main file {} is live; failed: [{}], not attempted: [{}]",
                    report
                        .main_file_id()
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                    report
                        .failed_artifacts()
                        .map(|a| a.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    report
                        .pending_artifacts()
                        .map(|a| a.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
        }

        if !self.skipped.is_empty() {
            lines.push(format!("\n⏭️  Skipped: {}", self.skipped.len()));
            for name in &self.skipped {
                lines.push(format!("   - {}", name));
            }
        }

        lines.push(format!("\n{}", rule));
        lines.push(format!(
            "Overall Status: {}",
            if self.success { "✅ SUCCESS" } else { "❌ FAILED" }
        ));
        lines.push(rule);

        lines.join("\n")
    }
}

/// BatchPublisher - Publishes several publications through one shared API
/// client
pub struct BatchPublisher<A: FileHostApi + 'static> {
    publisher: CurseForgePublisher<A>,
}

impl<A: FileHostApi + 'static> BatchPublisher<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            publisher: CurseForgePublisher::new(api),
        }
    }

    /// Publish every publication.
    ///
    /// Publications are independent: in parallel mode a failure never
    /// cancels the others.
    pub async fn publish_all(
        &self,
        publications: Vec<Publication>,
        options: &BatchPublishOptions,
    ) -> Result<BatchPublishResult, PublishError> {
        if publications.is_empty() {
            return Err(PublishError::ConfigError(
                "At least one publication must be specified".to_string(),
            ));
        }

        tracing::info!(
            count = publications.len(),
            mode = if options.sequential { "sequential" } else { "parallel" },
            max_concurrency = options.max_concurrency,
            "Publishing {} publication(s)",
            publications.len()
        );

        let mut result = BatchPublishResult::default();

        if options.sequential {
            self.publish_sequentially(publications, options, &mut result).await;
        } else {
            self.publish_in_parallel(publications, options, &mut result).await;
        }

        result.success = result.failed.is_empty() && result.skipped.is_empty();
        Ok(result)
    }

    async fn publish_sequentially(
        &self,
        publications: Vec<Publication>,
        options: &BatchPublishOptions,
        result: &mut BatchPublishResult,
    ) {
        for publication in publications {
            if !result.failed.is_empty() && options.fail_fast {
                tracing::warn!(
                    publication = %publication.name,
                    "Skipping publication due to previous failure"
                );
                result.skipped.push(publication.name);
                continue;
            }

            let outcome = self.publisher.publish(&publication).await;
            result.record(publication.name, outcome);
        }
    }

    async fn publish_in_parallel(
        &self,
        publications: Vec<Publication>,
        options: &BatchPublishOptions,
        result: &mut BatchPublishResult,
    ) {
        let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
        let mut tasks = Vec::new();

        for publication in publications {
            let semaphore = Arc::clone(&semaphore);
            let publisher = self.publisher.clone();
            let name = publication.name.clone();

            let task = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|e| {
                    PublishError::ConfigError(format!("Concurrency limiter closed: {}", e))
                })?;
                publisher.publish(&publication).await
            });

            tasks.push((name, task));
        }

        for (name, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(PublishError::ConfigError(format!("Publish task failed: {}", e))),
            };
            result.record(name, outcome);
        }
    }
}
