//! In-app feedback use-case service.

use crate::model::feedback::Feedback;
use crate::model::user::UserId;
use crate::repo::feedback_repo::{FeedbackRepository, SqliteFeedbackRepository};
use crate::service::{ServiceError, ServiceResult};
use rusqlite::Connection;

pub struct FeedbackService<'conn> {
    feedback: SqliteFeedbackRepository<'conn>,
}

impl<'conn> FeedbackService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self {
            feedback: SqliteFeedbackRepository::try_new(conn)?,
        })
    }

    /// Stores one feedback message; blank text is rejected.
    pub fn submit(&self, caller: UserId, text: &str) -> ServiceResult<Feedback> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation(
                "feedback must not be blank".to_string(),
            ));
        }
        Ok(self.feedback.create_feedback(caller, text)?)
    }

    pub fn history(&self, caller: UserId) -> ServiceResult<Vec<Feedback>> {
        Ok(self.feedback.list_feedback_for_user(caller)?)
    }
}
