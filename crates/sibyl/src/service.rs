//! Channel-aware entry point combining governance and response parsing.

use sibyl_analysis::{ResponseRepairParser, StructuredResult};
use sibyl_error::{CallError, SibylResult};
use sibyl_rate_limit::{GovernorRegistry, SibylConfig};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Governed calls on named channels, plus parsing of model replies.
///
/// Cloning is cheap and clones share governors, so one `Sibyl` can be handed
/// to every task of a pipeline.
#[derive(Debug, Clone)]
pub struct Sibyl {
    registry: Arc<GovernorRegistry>,
    parser: Arc<ResponseRepairParser>,
}

impl Sibyl {
    /// Build from configuration with the default response contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the `[backoff]` section is invalid.
    pub fn new(config: SibylConfig) -> SibylResult<Self> {
        Ok(Self::from_parts(
            Arc::new(GovernorRegistry::new(config)?),
            ResponseRepairParser::default(),
        ))
    }

    /// Build from an existing registry and parser.
    pub fn from_parts(registry: Arc<GovernorRegistry>, parser: ResponseRepairParser) -> Self {
        Self {
            registry,
            parser: Arc::new(parser),
        }
    }

    /// Governors by channel.
    pub fn registry(&self) -> &Arc<GovernorRegistry> {
        &self.registry
    }

    /// Response parser.
    pub fn parser(&self) -> &ResponseRepairParser {
        &self.parser
    }

    /// Run `operation` on `channel` under the channel's retry policy.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the channel's retry section is invalid,
    /// otherwise the call error that ended the retry loop.
    #[instrument(skip(self, operation))]
    pub async fn call<F, Fut, T>(&self, channel: &str, operation: F) -> SibylResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let policy = self.registry.retry_policy(channel)?;
        let executor = self.registry.executor(channel).await;
        Ok(executor.execute(&policy, operation).await?)
    }

    /// Run a text-generating `operation` on `channel` and parse its reply.
    ///
    /// Parse failures are not retried; a different call may produce different
    /// text, so that decision stays with the caller.
    ///
    /// # Errors
    ///
    /// Returns the call error as in [`call`](Self::call), or the parse error if
    /// the reply cannot be recovered.
    #[instrument(skip(self, operation))]
    pub async fn analyze<F, Fut>(&self, channel: &str, operation: F) -> SibylResult<StructuredResult>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, CallError>>,
    {
        let raw = self.call(channel, operation).await?;
        debug!(raw_len = raw.len(), "Parsing model reply");
        Ok(self.parser.parse(&raw)?)
    }
}
