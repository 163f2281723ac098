use dpf_catalog::{DesiredFormat, FormatCatalog};
use tracing::{debug, info, warn};

use crate::marker::ReconciliationMarker;
use crate::ports::{
    AuditLogger, FormatCreator, FormatRemover, LocalizedNameResolver, WorkFormatsAccessor,
    WorkLocaleResolver, WorkUpdater,
};
use crate::{
    ExistingFormat, NewFormat, ReconcileError, ReconcileSettings, ReconciliationResult,
    RemovalResult, WorkRef,
};

type Result<T> = std::result::Result<T, ReconcileError>;

/// Reconciles a work's formats against a desired catalog.
///
/// Owns its collaborator ports and a [`ReconcileSettings`] policy, nothing
/// else: each call reads host state fresh and writes results back before
/// returning.
///
/// ```text
/// reconcile(catalog, work)
///     │
///     ├── accessor.current_formats      → resolve names, sort by position
///     ├── accessor.marker_field         → only when something is missing
///     ├── updater.set_sequence_position → existing matches, rank changed
///     ├── creator.create + audit        → each missing entry, catalog order
///     └── updater.set_marker_field      → once, after every create succeeded
/// ```
pub struct FormatReconciler<A, C, U, L, N = WorkLocaleResolver>
where
    A: WorkFormatsAccessor,
    C: FormatCreator,
    U: WorkUpdater,
    L: AuditLogger,
    N: LocalizedNameResolver,
{
    accessor: A,
    creator: C,
    updater: U,
    audit: L,
    names: N,
    settings: ReconcileSettings,
}

impl<A, C, U, L> FormatReconciler<A, C, U, L, WorkLocaleResolver>
where
    A: WorkFormatsAccessor,
    C: FormatCreator,
    U: WorkUpdater,
    L: AuditLogger,
{
    /// Build with the default [`WorkLocaleResolver`].
    pub fn new(accessor: A, creator: C, updater: U, audit: L, settings: ReconcileSettings) -> Self {
        Self {
            accessor,
            creator,
            updater,
            audit,
            names: WorkLocaleResolver,
            settings,
        }
    }
}

impl<A, C, U, L, N> FormatReconciler<A, C, U, L, N>
where
    A: WorkFormatsAccessor,
    C: FormatCreator,
    U: WorkUpdater,
    L: AuditLogger,
    N: LocalizedNameResolver,
{
    /// Replace the name resolver.
    pub fn with_resolver<M: LocalizedNameResolver>(self, names: M) -> FormatReconciler<A, C, U, L, M> {
        FormatReconciler {
            accessor: self.accessor,
            creator: self.creator,
            updater: self.updater,
            audit: self.audit,
            names,
            settings: self.settings,
        }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// Resolve `work_id` through the accessor, then [`reconcile`](Self::reconcile).
    ///
    /// # Errors
    /// [`ReconcileError::NotFound`] if the host has no such work.
    pub fn reconcile_by_id(
        &self,
        catalog: &FormatCatalog,
        work_id: &str,
    ) -> Result<ReconciliationResult> {
        let work = self.resolve_work(work_id)?;
        self.reconcile(catalog, &work)
    }

    /// Validate a raw catalog declaration, then [`reconcile`](Self::reconcile).
    ///
    /// # Errors
    /// [`ReconcileError::Configuration`] before any host call if the
    /// declaration is invalid.
    pub fn reconcile_entries(
        &self,
        entries: Vec<DesiredFormat>,
        work: &WorkRef,
    ) -> Result<ReconciliationResult> {
        let catalog = FormatCatalog::new(entries)?;
        self.reconcile(&catalog, work)
    }

    /// Bring `work` in line with `catalog`.
    ///
    /// - Existing formats are matched by exact resolved name.
    /// - Matches get their 1-based catalog rank as sequence position (written
    ///   only when it differs).
    /// - Missing entries are created in catalog order with their global rank,
    ///   each followed by an audit entry.
    /// - When anything was created, the marker is extended with the created
    ///   names and written once, at the end.
    ///
    /// # Errors
    /// The first failing port call aborts the run with
    /// [`ReconcileError::Persistence`]. Creations made before the failure stay
    /// in place and the marker is not written.
    pub fn reconcile(
        &self,
        catalog: &FormatCatalog,
        work: &WorkRef,
    ) -> Result<ReconciliationResult> {
        let mut result = ReconciliationResult::default();
        if catalog.is_empty() {
            debug!(work_id = %work.work_id, "empty catalog, nothing to reconcile");
            return Ok(result);
        }

        let current = self.current_named_formats(work)?;
        let ordered = catalog.ordered(self.settings.order);

        let missing: Vec<(u32, &DesiredFormat)> = ordered
            .iter()
            .enumerate()
            .filter(|(_, d)| !current.iter().any(|(name, _)| *name == d.name))
            .map(|(idx, d)| (idx as u32 + 1, *d))
            .collect();

        // Read the prior marker before any write so a corrupt value aborts
        // the run with the work untouched.
        let mut marker = if missing.is_empty() {
            None
        } else {
            Some(self.read_marker(work)?)
        };

        for (idx, desired) in ordered.iter().enumerate() {
            let position = idx as u32 + 1;
            let Some((_, existing)) = current.iter().find(|(name, _)| *name == desired.name) else {
                continue;
            };
            if existing.sequence_position == position {
                continue;
            }
            self.updater
                .set_sequence_position(work, existing.format_id, position)
                .map_err(ReconcileError::persistence("set_sequence_position"))
                .inspect_err(|e| warn!(work_id = %work.work_id, error = %e, "re-sequencing aborted"))?;
            debug!(
                work_id = %work.work_id,
                format = %desired.name,
                from = existing.sequence_position,
                to = position,
                "format re-sequenced"
            );
            result.resequenced += 1;
        }

        for (position, desired) in &missing {
            let attributes = NewFormat::from_desired(desired, &work.locale, *position);
            self.create_one(work, &attributes).inspect_err(|e| {
                warn!(
                    work_id = %work.work_id,
                    format = %desired.name,
                    created_so_far = result.created,
                    error = %e,
                    "format creation aborted; marker not written"
                )
            })?;
            result.created += 1;
            result.created_names.push(desired.name.clone());
        }

        if let Some(marker) = marker.as_mut() {
            marker.extend(result.created_names.iter().cloned());
            self.write_marker(work, marker)?;
        }

        info!(
            work_id = %work.work_id,
            created = result.created,
            resequenced = result.resequenced,
            "reconciliation complete"
        );
        Ok(result)
    }

    /// Delete, for each name recorded in the marker, the first current format
    /// (by sequence order) with that name, then clear the marker.
    ///
    /// Formats added manually are never touched: neither names missing from
    /// the marker nor later duplicates of a recorded name. Marker names with
    /// no current format are dropped from the marker as well. A failed delete
    /// aborts the batch and leaves the marker unwritten.
    /// An absent or empty marker makes this a no-op with no writes.
    pub fn remove_auto_created<R: FormatRemover>(
        &self,
        remover: &R,
        work: &WorkRef,
    ) -> Result<RemovalResult> {
        let mut result = RemovalResult::default();
        let mut pending = self.read_marker(work)?;
        if pending.is_empty() {
            debug!(work_id = %work.work_id, "no auto-created formats recorded");
            return Ok(result);
        }

        let current = self.current_named_formats(work)?;
        for (name, existing) in &current {
            // Only the first match by sequence order is the auto-created
            // format; later duplicates were added by hand.
            if !pending.remove(name) {
                continue;
            }
            remover
                .delete(work, existing.format_id)
                .map_err(ReconcileError::persistence("delete"))
                .inspect_err(|e| {
                    warn!(
                        work_id = %work.work_id,
                        format = %name,
                        removed_so_far = result.removed,
                        error = %e,
                        "format removal aborted; marker not written"
                    )
                })?;
            self.audit
                .log_format_removed(work, name)
                .map_err(ReconcileError::persistence("log_format_removed"))?;
            result.removed += 1;
            result.removed_names.push(name.clone());
        }

        // Names still pending have no live format any more.
        if !pending.is_empty() {
            debug!(work_id = %work.work_id, stale = pending.len(), "dropping stale marker names");
        }
        self.write_marker(work, &ReconciliationMarker::new())?;

        info!(
            work_id = %work.work_id,
            removed = result.removed,
            "auto-created formats removed"
        );
        Ok(result)
    }

    fn resolve_work(&self, work_id: &str) -> Result<WorkRef> {
        self.accessor
            .find_work(work_id)
            .map_err(ReconcileError::persistence("find_work"))?
            .ok_or_else(|| ReconcileError::NotFound {
                work_id: work_id.to_string(),
            })
    }

    /// Current formats paired with their resolved names, in stored sequence
    /// order (ties keep host order).
    fn current_named_formats(&self, work: &WorkRef) -> Result<Vec<(String, ExistingFormat)>> {
        let mut formats = self
            .accessor
            .current_formats(work)
            .map_err(ReconcileError::persistence("current_formats"))?;
        formats.sort_by_key(|f| f.sequence_position);
        Ok(formats
            .into_iter()
            .map(|f| (self.names.resolve(work, &f), f))
            .collect())
    }

    fn create_one(&self, work: &WorkRef, attributes: &NewFormat) -> Result<()> {
        let created = self
            .creator
            .create(work, attributes)
            .map_err(ReconcileError::persistence("create"))?;
        self.audit
            .log_format_created(work, &attributes.name)
            .map_err(ReconcileError::persistence("log_format_created"))?;
        debug!(
            work_id = %work.work_id,
            format = %attributes.name,
            format_id = created.format_id,
            position = attributes.sequence_position,
            "format created"
        );
        Ok(())
    }

    fn read_marker(&self, work: &WorkRef) -> Result<ReconciliationMarker> {
        let field = &self.settings.marker_field;
        let raw = self
            .accessor
            .marker_field(work, field)
            .map_err(ReconcileError::persistence("marker_field"))?;
        ReconciliationMarker::decode(raw.as_deref()).map_err(|e| ReconcileError::CorruptMarker {
            field: field.clone(),
            reason: e.reason,
        })
    }

    fn write_marker(&self, work: &WorkRef, marker: &ReconciliationMarker) -> Result<()> {
        self.updater
            .set_marker_field(work, &self.settings.marker_field, &marker.encode())
            .map_err(ReconcileError::persistence("set_marker_field"))
    }
}
