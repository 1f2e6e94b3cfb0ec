//! Work lifecycle service.
//!
//! # Responsibility
//! - Resolve content source (external URL vs. uploaded files).
//! - Persist a work and its audit activity in one unit of work.
//! - Detect lost updates with the `version` token.
//! - Order blob-store side effects around the database transaction.
//!
//! # Invariants
//! - Uploads finish before the transaction begins; a failed upload means no
//!   database write.
//! - A work row is never written without its activity row.
//! - The version compare and the write happen in the same transaction.
//! - Delete updates the database first; blob cleanup afterwards is
//!   best-effort and never fails the call.
//! - No retries; `Conflict` is returned to the caller.

use crate::db::TransactionRunner;
use crate::model::activity::{ActivityType, NewActivity};
use crate::model::form::{Asset, FormValidationError, WorkForm};
use crate::model::work::{ContentType, NewWork, Work, WorkId, INITIAL_VERSION};
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::work_repo::WorkRepository;
use crate::repo::RepoError;
use crate::service::error::{ErrorKind, ServiceError, ServiceResult};
use crate::service::identity::RequestContext;
use crate::service::pagination::{PageRequest, Pagination};
use crate::storage::blob::BlobStore;
use crate::storage::ids::{object_key, IdentifierGenerator};
use log::{error, info, warn};

/// Orchestrates work create/update/delete/list use-cases.
pub struct WorkService<T, W, A, G, B> {
    runner: T,
    works: W,
    activities: A,
    ids: G,
    blobs: B,
}

/// URLs resolved for a form before the transaction starts.
struct ResolvedContent {
    thumbnail_url: String,
    content_url: String,
}

impl<T, W, A, G, B> WorkService<T, W, A, G, B>
where
    T: TransactionRunner,
    W: WorkRepository,
    A: ActivityRepository,
    G: IdentifierGenerator,
    B: BlobStore,
{
    /// Creates a service; every collaborator is required.
    pub fn new(runner: T, works: W, activities: A, ids: G, blobs: B) -> Self {
        Self {
            runner,
            works,
            activities,
            ids,
            blobs,
        }
    }

    /// Lists live works with the total live count.
    ///
    /// Count and page are two separate reads, so under concurrent writes
    /// `total_items` may not match the page exactly.
    pub fn get_all(&self, page: PageRequest) -> ServiceResult<Pagination<Work>> {
        let total_items = self
            .runner
            .read(|conn| self.works.count_all(conn))
            .map_err(ServiceError::internal)
            .inspect_err(|err| log_failure("work_list", None, err))?;
        let items = self
            .runner
            .read(|conn| self.works.get_all(conn, page.offset, page.limit))
            .map_err(ServiceError::internal)
            .inspect_err(|err| log_failure("work_list", None, err))?;

        Ok(Pagination {
            total_items,
            offset: page.offset,
            items,
        })
    }

    /// Gets one live work.
    pub fn find_by_id(&self, id: WorkId) -> ServiceResult<Work> {
        self.runner
            .read(|conn| self.works.find_by_id(conn, id))
            .map_err(ServiceError::from)
            .inspect_err(|err| log_failure("work_get", Some(id), err))
    }

    /// Creates a work at version 1 and records an `Added` activity.
    pub fn create(&self, ctx: &RequestContext, form: &WorkForm) -> ServiceResult<Work> {
        self.create_inner(ctx, form)
            .inspect(|work| {
                info!(
                    "event=work_create module=service status=ok work_id={} type={} version={}",
                    work.id,
                    work.kind.as_str(),
                    work.version
                )
            })
            .inspect_err(|err| log_failure("work_create", None, err))
    }

    /// Applies `form` to work `id` if the caller's version is current.
    pub fn update(&self, ctx: &RequestContext, id: WorkId, form: &WorkForm) -> ServiceResult<Work> {
        self.update_inner(ctx, id, form)
            .inspect(|work| {
                info!(
                    "event=work_update module=service status=ok work_id={} version={}",
                    work.id, work.version
                )
            })
            .inspect_err(|err| log_failure("work_update", Some(id), err))
    }

    /// Soft-deletes a work, then removes the blobs it owns.
    pub fn delete_by_id(&self, id: WorkId) -> ServiceResult<()> {
        let work = self
            .runner
            .read(|conn| self.works.find_by_id(conn, id))
            .map_err(ServiceError::from)
            .inspect_err(|err| log_failure("work_delete", Some(id), err))?;

        self.runner
            .run(|uow| -> ServiceResult<()> {
                self.works.delete_by_id(uow, id)?;
                Ok(())
            })
            .inspect_err(|err| log_failure("work_delete", Some(id), err))?;
        info!("event=work_delete module=service status=ok work_id={id}");

        for reference in work.owned_blob_refs() {
            if let Err(cause) = self.blobs.delete(reference) {
                let err = ServiceError::internal(cause);
                error!(
                    "event=blob_cleanup module=service status=error work_id={id} error_code={} reason=blob_delete_failed error={err}",
                    err.code()
                );
            }
        }

        Ok(())
    }

    fn create_inner(&self, ctx: &RequestContext, form: &WorkForm) -> ServiceResult<Work> {
        form.validate()?;
        let author_id = ctx.require_subject()?;
        let content = self.resolve_content(form)?;

        let new_work = NewWork {
            kind: form.kind,
            title: form.title.trim().to_string(),
            description: form.description.clone(),
            author_id: author_id.to_string(),
            thumbnail_url: content.thumbnail_url,
            content_url: content.content_url,
            version: INITIAL_VERSION,
        };

        self.runner.run(|uow| -> ServiceResult<Work> {
            let work = self
                .works
                .create(uow, &new_work)
                .map_err(ServiceError::internal)?;
            self.activities
                .create(uow, &NewActivity::record(ActivityType::Added, author_id, &work))
                .map_err(ServiceError::internal)?;
            Ok(work)
        })
    }

    fn update_inner(
        &self,
        ctx: &RequestContext,
        id: WorkId,
        form: &WorkForm,
    ) -> ServiceResult<Work> {
        let expected_version = form.validate_for_update()?;
        let actor_id = ctx.require_subject()?;
        // Objects of the replaced version are left in the store.
        let content = self.resolve_content(form)?;

        self.runner.run(|uow| -> ServiceResult<Work> {
            let mut work = self.works.find_by_id(uow.connection()?, id)?;
            if work.version != expected_version {
                return Err(ServiceError::Conflict {
                    id,
                    expected: expected_version,
                    actual: work.version,
                });
            }

            work.kind = form.kind;
            work.title = form.title.trim().to_string();
            work.description = form.description.clone();
            work.thumbnail_url = content.thumbnail_url;
            work.content_url = content.content_url;
            work.version = work.version.checked_add(1).ok_or_else(|| {
                ServiceError::internal(RepoError::InvalidData(format!(
                    "version overflow on work {id}"
                )))
            })?;

            let saved = self
                .works
                .save(uow, &work)
                .map_err(ServiceError::internal)?;
            self.activities
                .create(uow, &NewActivity::record(ActivityType::Updated, actor_id, &saved))
                .map_err(ServiceError::internal)?;
            Ok(saved)
        })
    }

    /// Uploads file assets (thumbnail first) or passes the URL through.
    fn resolve_content(&self, form: &WorkForm) -> ServiceResult<ResolvedContent> {
        match form.kind {
            ContentType::ByUrl => {
                let content_url = form
                    .content_url
                    .as_deref()
                    .map(str::trim)
                    .ok_or(FormValidationError::Required("contentUrl"))?;
                Ok(ResolvedContent {
                    thumbnail_url: String::new(),
                    content_url: content_url.to_string(),
                })
            }
            ContentType::ByFile => {
                let thumbnail = form
                    .thumbnail
                    .as_ref()
                    .ok_or(FormValidationError::Required("thumbnail"))?;
                let content = form
                    .content
                    .as_ref()
                    .ok_or(FormValidationError::Required("content"))?;

                let thumbnail_url = self.upload(thumbnail)?;
                let content_url = self.upload(content)?;
                Ok(ResolvedContent {
                    thumbnail_url,
                    content_url,
                })
            }
        }
    }

    fn upload(&self, asset: &Asset) -> ServiceResult<String> {
        let key = object_key(&self.ids.generate(), &asset.file_name);
        self.blobs
            .upload(&key, asset)
            .map_err(ServiceError::internal)
    }
}

fn log_failure(event: &str, work_id: Option<WorkId>, err: &ServiceError) {
    let work_id = work_id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match err.kind() {
        ErrorKind::Internal => error!(
            "event={event} module=service status=error work_id={work_id} error_code={} error={err}",
            err.code()
        ),
        ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Conflict => warn!(
            "event={event} module=service status=rejected work_id={work_id} error_code={} error={err}",
            err.code()
        ),
    }
}
