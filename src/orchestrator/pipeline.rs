//! End-to-end flow from a manifest diff to the printable report

use std::sync::Arc;

use tracing::info;

use crate::config::DepdiffConfig;
use crate::orchestrator::parallel::ParallelRetriever;
use crate::orchestrator::report::ReportGenerator;
use crate::parser::RequirementsDiffParser;
use crate::registry::MetadataClient;
use crate::registry::pypi::{PypiClient, build_http_client};
use crate::retrieval::{DiffRetriever, HybridRetriever, RetrieverOptions, TempDirRegistry};

/// Output when nothing in the input is a version update or every diff came back empty
pub const NO_CHANGES_MESSAGE: &str = "No dependency changes detected.";

pub struct DependencyDiffPipeline<R> {
    parser: RequirementsDiffParser,
    parallel: ParallelRetriever<R>,
    reporter: ReportGenerator,
}

impl DependencyDiffPipeline<HybridRetriever> {
    /// Builds the pipeline against the registry named in `config`.
    pub fn from_config(config: &DepdiffConfig) -> Self {
        let metadata = Arc::new(PypiClient::with_client(
            build_http_client(),
            config.registry_url.clone(),
        ));
        Self::with_metadata_client(config, metadata)
    }

    pub fn with_metadata_client(config: &DepdiffConfig, metadata: Arc<dyn MetadataClient>) -> Self {
        let registry = Arc::new(TempDirRegistry::new());
        let options = RetrieverOptions {
            vcs_enabled: config.vcs.enabled,
            parallel_downloads: config.artifacts.parallel_downloads,
        };
        let retriever = HybridRetriever::new(
            metadata,
            build_http_client(),
            Arc::clone(&registry) as _,
            options,
        );

        Self::new(ParallelRetriever::new(
            retriever,
            registry,
            config.workers,
            config.task_timeout(),
        ))
    }
}

impl<R: DiffRetriever + 'static> DependencyDiffPipeline<R> {
    pub fn new(parallel: ParallelRetriever<R>) -> Self {
        Self {
            parser: RequirementsDiffParser::new(),
            parallel,
            reporter: ReportGenerator::new(),
        }
    }

    /// Parses `input`, retrieves every version update and renders the report.
    pub async fn process_requirements_diff(&self, input: &str) -> String {
        let changes = self.parser.parse(input);
        let updates = changes.iter().filter(|c| c.is_update()).count();
        if updates == 0 {
            info!("No version updates among {} changes", changes.len());
            return NO_CHANGES_MESSAGE.to_string();
        }

        info!("Retrieving diffs for {} updated packages", updates);
        let results = self.parallel.process(&changes).await;
        let report = self.reporter.generate(&results);
        if report.is_empty() {
            return NO_CHANGES_MESSAGE.to_string();
        }
        report
    }

    /// Removes every temporary directory created while processing.
    pub async fn cleanup(&self) {
        self.parallel.cleanup().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::RetrievalError;
    use crate::retrieval::hybrid::MockDiffRetriever;
    use std::time::Duration;

    fn pipeline(retriever: MockDiffRetriever) -> DependencyDiffPipeline<MockDiffRetriever> {
        DependencyDiffPipeline::new(ParallelRetriever::new(
            retriever,
            Arc::new(TempDirRegistry::new()),
            2,
            Duration::from_secs(5),
        ))
    }

    #[tokio::test]
    async fn input_without_updates_reports_no_changes() {
        let mut retriever = MockDiffRetriever::new();
        retriever.expect_get_diff().times(0);
        let pipeline = pipeline(retriever);

        let input = "--- a/requirements.txt\n+++ b/requirements.txt\n+flask==2.0.0\n";

        assert_eq!(
            pipeline.process_requirements_diff(input).await,
            NO_CHANGES_MESSAGE
        );
    }

    #[tokio::test]
    async fn empty_input_reports_no_changes() {
        let pipeline = pipeline(MockDiffRetriever::new());

        assert_eq!(pipeline.process_requirements_diff("").await, NO_CHANGES_MESSAGE);
    }

    #[tokio::test]
    async fn updates_are_rendered_in_report() {
        let mut retriever = MockDiffRetriever::new();
        retriever
            .expect_get_diff()
            .times(2)
            .returning(|change| match change.name.as_str() {
                "requests" => Ok("-old\n+new\n".to_string()),
                _ => Err(RetrievalError::Download("HTTP 404".to_string())),
            });
        let pipeline = pipeline(retriever);

        let input = "\
--- a/requirements.txt
+++ b/requirements.txt
-requests==2.25.1
+requests==2.26.0
-urllib3==1.26.0
+urllib3==1.26.5
+flask==2.0.0
";
        let report = pipeline.process_requirements_diff(input).await;

        assert!(report.contains("DIFF FOR PACKAGE: REQUESTS"));
        assert!(report.contains("-old\n+new"));
        assert!(report.contains("DIFF FOR PACKAGE: URLLIB3"));
        assert!(report.contains("Error: Download failed: HTTP 404"));
        assert!(!report.contains("FLASK"));
        pipeline.cleanup().await;
    }
}
