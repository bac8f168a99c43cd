//! Resolution of the ancestor chain a record depends on before it can be localized.
//!
//! Starting from one child record, the resolver walks every configured parent
//! relation upwards:
//!
//! - a parent that already has a translation and exposes a children field gets
//!   an `inlineSynchronize` command listing the child, which then counts as
//!   *claimed* and lands in the implicit set
//! - a parent without a translation is walked recursively first, and the
//!   child again counts as claimed
//! - an unclaimed child gets its own `localize` command
//!
//! Each top-level call owns a visited set and a depth counter, so cyclic
//! relation graphs terminate and no record is examined twice.

pub mod errors;
pub mod state;


pub use errors::ResolveError;
pub use state::Resolution;

use state::WalkState;

use crate::backend::{CommandFlusher, LocalizationOracle, RecordStore};
use crate::command::{Command, CommandBatch};
use crate::config::ResolverConfig;
use crate::record::{LanguageId, Record, RecordId, RecordKey};
use crate::relation_schema::RelationSchemaRegistry;

/// One parent relation as seen from the child side.
#[derive(Debug, Clone, Copy)]
struct ParentRelation<'s> {
    parent_table: &'s str,
    parent_field: &'s str,
    children_field: Option<&'s str>,
}

pub struct RelationResolver<'a> {
    registry: &'a RelationSchemaRegistry,
    oracle: &'a dyn LocalizationOracle,
    store: &'a dyn RecordStore,
    flusher: &'a dyn CommandFlusher,
    config: ResolverConfig,
}

impl<'a> RelationResolver<'a> {
    pub fn new(
        registry: &'a RelationSchemaRegistry,
        oracle: &'a dyn LocalizationOracle,
        store: &'a dyn RecordStore,
        flusher: &'a dyn CommandFlusher,
    ) -> Self {
        RelationResolver {
            registry,
            oracle,
            store,
            flusher,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `record` of `table` for `language` into a fresh [`Resolution`].
    pub fn resolve(
        &self,
        record: &Record,
        language: LanguageId,
        table: &str,
    ) -> Result<Resolution, ResolveError> {
        let mut resolution = Resolution::new();
        self.resolve_into(record, language, table, &mut resolution)?;
        Ok(resolution)
    }

    /// Resolve `record` and accumulate into an existing resolution.
    ///
    /// The visited set and depth counter start over for this call; the batch,
    /// implicit set and flush log carry on, so siblings resolved one after
    /// another share their parent's `inlineSynchronize` command.
    pub fn resolve_into(
        &self,
        record: &Record,
        language: LanguageId,
        table: &str,
        resolution: &mut Resolution,
    ) -> Result<(), ResolveError> {
        log::debug!(
            "Resolving {}#{} for language {}",
            table,
            record
                .int(&self.config.id_field)
                .map_or_else(|| "?".to_string(), |id| id.to_string()),
            language
        );

        let mut state = WalkState::new(resolution);
        self.walk(&mut state, record, language, table)?;

        log::debug!(
            "Resolution done after {} walk step(s): {} pending command(s), {} implicit record(s), {} flushed",
            state.depth,
            state.output.batch.len(),
            state.output.implicit.len(),
            state.output.flushed.len()
        );
        Ok(())
    }

    /// Resolve several records of one table into a single resolution.
    pub fn resolve_all<'r>(
        &self,
        records: impl IntoIterator<Item = &'r Record>,
        language: LanguageId,
        table: &str,
    ) -> Result<Resolution, ResolveError> {
        let mut resolution = Resolution::new();
        for record in records {
            self.resolve_into(record, language, table, &mut resolution)?;
        }
        Ok(resolution)
    }

    fn walk(
        &self,
        state: &mut WalkState<'_>,
        element: &Record,
        language: LanguageId,
        table: &str,
    ) -> Result<(), ResolveError> {
        state.depth += 1;
        if state.depth >= self.config.max_depth {
            log::warn!(
                "Depth ceiling of {} reached while resolving table `{}`; skipping branch",
                self.config.max_depth,
                table
            );
            return Ok(());
        }

        let Some(id) = element.int(&self.config.id_field) else {
            log::trace!("Record of `{}` has no `{}`", table, self.config.id_field);
            return Ok(());
        };

        if !state.visited.mark(table, id) {
            log::trace!("{}#{} already visited", table, id);
            return Ok(());
        }

        if self.oracle.translation_pointer_field(table).is_none()
            || self.oracle.language_field(table).is_none()
        {
            log::trace!("Table `{}` is not localizable", table);
            return Ok(());
        }

        let mut claimed = false;

        if let Some(relation) = self.registry.default_relation(table) {
            claimed |= self.evaluate_parent_side(
                state,
                element,
                id,
                language,
                ParentRelation {
                    parent_table: self.registry.content_table(),
                    parent_field: &relation.parent_field,
                    children_field: Some(&relation.children_field),
                },
            )?;
        }

        for relation in self.registry.additional_relations(table) {
            claimed |= self.evaluate_parent_side(
                state,
                element,
                id,
                language,
                ParentRelation {
                    parent_table: &relation.parent_table,
                    parent_field: &relation.parent_field,
                    children_field: relation.children_field.as_deref(),
                },
            )?;
        }

        if claimed {
            log::trace!("{}#{} is claimed by a parent", table, id);
            state.output.implicit.insert(table, id);
        } else {
            self.install(state, RecordKey::new(table, id), Command::localize(language))?;
        }
        Ok(())
    }

    /// Honor one parent relation of `child`. Returns whether the parent side
    /// took over the child's localization.
    fn evaluate_parent_side(
        &self,
        state: &mut WalkState<'_>,
        child: &Record,
        child_id: RecordId,
        language: LanguageId,
        relation: ParentRelation<'_>,
    ) -> Result<bool, ResolveError> {
        let parent_id = match child.int(relation.parent_field) {
            Some(parent_id) if parent_id > 0 => parent_id,
            _ => return Ok(false),
        };
        let parent_key = RecordKey::new(relation.parent_table, parent_id);

        let localized_parent = self
            .oracle
            .find_localization(relation.parent_table, parent_id, language)
            .map_err(|source| ResolveError::Lookup {
                key: parent_key.clone(),
                source,
            })?;

        if let Some(localized_parent) = localized_parent {
            let Some(children_field) = relation.children_field else {
                return Ok(false);
            };
            let Some(localized_id) = localized_parent.int(&self.config.id_field) else {
                log::trace!("Localization of {} has no `{}`", parent_key, self.config.id_field);
                return Ok(false);
            };
            self.synchronize_child(
                state,
                RecordKey::new(relation.parent_table, localized_id),
                children_field,
                language,
                child_id,
            )?;
            return Ok(true);
        }

        let parent = self
            .store
            .fetch(relation.parent_table, parent_id)
            .map_err(|source| ResolveError::Fetch {
                key: parent_key.clone(),
                source,
            })?;

        match parent {
            Some(parent) => {
                self.walk(state, &parent, language, relation.parent_table)?;
                Ok(true)
            }
            None => {
                log::trace!("Parent {} does not exist", parent_key);
                Ok(false)
            }
        }
    }

    /// Add `child_id` to the pending `inlineSynchronize` of `target` for
    /// `field`, or start one.
    fn synchronize_child(
        &self,
        state: &mut WalkState<'_>,
        target: RecordKey,
        field: &str,
        language: LanguageId,
        child_id: RecordId,
    ) -> Result<(), ResolveError> {
        if let Some(Command::InlineSynchronize {
            field: pending_field,
            ids,
            ..
        }) = state.output.batch.get_mut(&target)
        {
            if pending_field == field {
                if !ids.contains(&child_id) {
                    ids.push(child_id);
                }
                return Ok(());
            }
        }

        self.install(
            state,
            target,
            Command::inline_synchronize(field, language, vec![child_id]),
        )
    }

    /// Put `command` in the batch. A different command already pending for
    /// the same target is executed first so it is not lost.
    fn install(
        &self,
        state: &mut WalkState<'_>,
        key: RecordKey,
        command: Command,
    ) -> Result<(), ResolveError> {
        if let Some(pending) = state.output.batch.get(&key) {
            if *pending == command {
                return Ok(());
            }

            log::warn!(
                "Conflicting command for {}; flushing pending {:?} before installing {:?}",
                key,
                pending,
                command
            );
            let flushed = CommandBatch::single(key.clone(), pending.clone());
            self.flusher
                .execute(&flushed)
                .map_err(|source| ResolveError::Flush {
                    key: key.clone(),
                    source,
                })?;
            state.output.flushed.push(flushed);
        }

        state.output.batch.insert(key, command);
        Ok(())
    }
}
