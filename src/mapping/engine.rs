//! The mapping orchestrator.
//!
//! [`MappingEngine`] runs one [`MappingRule`] per input collection inside a
//! fresh [`MappingContext`]. It owns what outlives a single transform: the
//! external identifier map, the registry of pending relationships, and the
//! tool transaction that accumulates every successful pass.
//!
//! ```ignore
//! let mut engine = MappingEngine::new(MappingConfig::default());
//! let output = engine.transform(&BlockToElementRule, &mut hub, &mut project, rows);
//! engine.commit(&mut hub, &output)?;
//! ```

use tracing::{debug, error, warn};

use crate::hub::HubSession;
use crate::tool::{Project, ToolTransaction};

use super::config::MappingConfig;
use super::context::MappingContext;
use super::error::MappingError;
use super::rows::{ExternalIdentifierMap, MappedElementRow, MappingOutput, PendingRegistry};

/// One direction of one kind of mapping.
pub trait MappingRule {
    type Input;

    /// Map an input collection, returning the mapped rows.
    ///
    /// Everything else the rule produces stays in the context.
    fn transform(
        &self,
        ctx: &mut MappingContext<'_>,
        input: Self::Input,
    ) -> Result<Vec<MappedElementRow>, MappingError>;
}

/// Log a per-row failure, or hand back anything that must abort the
/// transform.
pub(crate) fn skip_row_local(row: &str, result: Result<(), MappingError>) -> Result<(), MappingError> {
    match result {
        Err(err) if err.is_row_local() => {
            warn!(row = %row, error = %err, "row skipped");
            Ok(())
        }
        other => other,
    }
}

/// Runs mapping rules and keeps cross-pass state.
#[derive(Debug, Default)]
pub struct MappingEngine {
    config: MappingConfig,
    identifiers: ExternalIdentifierMap,
    pending: PendingRegistry,
    transaction: ToolTransaction,
}

impl MappingEngine {
    pub fn new(config: MappingConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Start from previously recorded identifiers.
    pub fn with_identifiers(mut self, identifiers: ExternalIdentifierMap) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn identifiers(&self) -> &ExternalIdentifierMap {
        &self.identifiers
    }

    pub fn pending(&self) -> &PendingRegistry {
        &self.pending
    }

    /// Every tool mutation of the successful passes so far.
    pub fn transaction(&self) -> &ToolTransaction {
        &self.transaction
    }

    /// Hand over the accumulated tool transaction, starting a new one.
    pub fn take_transaction(&mut self) -> ToolTransaction {
        std::mem::take(&mut self.transaction)
    }

    /// Forget relationships that were transferred.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Run a rule over an input collection.
    ///
    /// A failure that escapes the rule is logged with its causes, the pass's
    /// tool changes are rolled back, and an empty output is returned.
    pub fn transform<R: MappingRule>(
        &mut self,
        rule: &R,
        hub: &mut dyn HubSession,
        project: &mut Project,
        input: R::Input,
    ) -> MappingOutput {
        let rule_name = std::any::type_name::<R>();
        let mut ctx = MappingContext::new(hub, project, &self.config, &self.identifiers, &self.pending);
        let result = rule.transform(&mut ctx, input);

        match result {
            Ok(rows) => {
                let (output, transaction, pending) = ctx.finish(rows);
                self.transaction.absorb(transaction);
                self.transaction.apply_region_changes(project);
                self.pending.extend(pending);
                for row in &output.rows {
                    self.identifiers
                        .add(row.hub_iid(), row.dst.clone(), row.direction);
                }
                debug!(
                    rule = rule_name,
                    rows = output.rows.len(),
                    relationships = output.relationships.len(),
                    "transform finished"
                );
                output
            }
            Err(err) => {
                error!(rule = rule_name, error = %err.chain(), "transform failed");
                ctx.abandon().rollback(project);
                MappingOutput::default()
            }
        }
    }

    /// Commit a pass's hub things and forget the transferred relationships.
    pub fn commit(&mut self, hub: &mut dyn HubSession, output: &MappingOutput) -> Result<(), MappingError> {
        let transaction = output.to_transaction();
        if transaction.is_empty() {
            return Ok(());
        }
        hub.write(transaction)?;
        self.clear_pending();
        Ok(())
    }
}
