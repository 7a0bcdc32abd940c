//! App feedback repository.

use crate::model::feedback::Feedback;
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

pub trait FeedbackRepository {
    fn create_feedback(&self, user_id: UserId, text: &str) -> RepoResult<Feedback>;
    /// Lists one user's feedback, oldest first.
    fn list_feedback_for_user(&self, user_id: UserId) -> RepoResult<Vec<Feedback>>;
}

pub struct SqliteFeedbackRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFeedbackRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["app_feedback"])?;
        Ok(Self { conn })
    }
}

impl FeedbackRepository for SqliteFeedbackRepository<'_> {
    fn create_feedback(&self, user_id: UserId, text: &str) -> RepoResult<Feedback> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO app_feedback (id, user_id, feedback) VALUES (?1, ?2, ?3);",
            params![id.to_string(), user_id.to_string(), text],
        )?;
        let feedback = self
            .conn
            .query_row(
                "SELECT id, user_id, feedback, created_at FROM app_feedback WHERE id = ?1;",
                [id.to_string()],
                |row| Ok(parse_feedback_row(row)),
            )
            .optional()?;
        feedback
            .transpose()?
            .ok_or_else(|| RepoError::InvalidData(format!("feedback {id} missing after insert")))
    }

    fn list_feedback_for_user(&self, user_id: UserId) -> RepoResult<Vec<Feedback>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, feedback, created_at
             FROM app_feedback
             WHERE user_id = ?1
             ORDER BY created_at ASC, id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_feedback_row(row)?);
        }
        Ok(entries)
    }
}

fn parse_feedback_row(row: &Row<'_>) -> RepoResult<Feedback> {
    let id_text: String = row.get("id")?;
    let user_id_text: String = row.get("user_id")?;
    Ok(Feedback {
        id: parse_uuid(&id_text, "app_feedback.id")?,
        user_id: parse_uuid(&user_id_text, "app_feedback.user_id")?,
        feedback: row.get("feedback")?,
        created_at: row.get("created_at")?,
    })
}
