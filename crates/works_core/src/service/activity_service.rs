//! Read-only activity (audit log) service.

use crate::db::TransactionRunner;
use crate::model::activity::Activity;
use crate::model::form::FormValidationError;
use crate::repo::activity_repo::ActivityRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::{error, warn};

/// Lists audit records written by the work service.
pub struct ActivityService<T, A> {
    runner: T,
    activities: A,
}

impl<T, A> ActivityService<T, A>
where
    T: TransactionRunner,
    A: ActivityRepository,
{
    pub fn new(runner: T, activities: A) -> Self {
        Self { runner, activities }
    }

    /// Lists every activity, newest first.
    pub fn get_all(&self) -> ServiceResult<Vec<Activity>> {
        self.runner
            .read(|conn| self.activities.get_all(conn))
            .map_err(ServiceError::internal)
            .inspect_err(|err| {
                error!(
                    "event=activity_list module=service status=error error_code={} error={err}",
                    err.code()
                )
            })
    }

    /// Lists activities performed by `user_id`, newest first.
    pub fn find_by_user_id(&self, user_id: &str) -> ServiceResult<Vec<Activity>> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            let err = ServiceError::from(FormValidationError::Required("userId"));
            warn!(
                "event=activity_list module=service status=rejected error_code={} error={err}",
                err.code()
            );
            return Err(err);
        }

        self.runner
            .read(|conn| self.activities.find_by_user_id(conn, user_id))
            .map_err(ServiceError::internal)
            .inspect_err(|err| {
                error!(
                    "event=activity_list module=service status=error user_id={user_id} error_code={} error={err}",
                    err.code()
                )
            })
    }
}
