//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod attendances;
mod emotions;
mod meetings;
mod notifications;
mod users;

use crate::config::AppConfig;
use crate::errors::{LmsError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 根据全局配置创建存储实例并执行迁移
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config.database.pool_size, config.database.timeout)
                .await?
        } else {
            Self::connect_generic(&db_url, config.database.pool_size, config.database.timeout)
                .await?
        };

        let storage = Self::from_connection(db).await?;
        info!("SeaORM 存储初始化完成，数据库: {}", db_url);
        Ok(storage)
    }

    /// 使用已有连接创建存储实例并执行迁移
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| LmsError::database_operation(format!("数据库迁移失败: {e}")))?;

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| LmsError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("wal_autocheckpoint", "1000");

        // 内存库每个连接都是独立的数据库，只能用单连接
        let pool_size = if url.contains(":memory:") { 1 } else { pool_size };

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    pub(crate) fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(LmsError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 是否为唯一约束冲突
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// Storage trait 实现
use crate::models::{
    attendance::{entities::Attendance, responses::AttendanceListResponse},
    emotions::{entities::EmotionSample, requests::NewEmotionSample},
    meetings::{
        entities::{Meeting, MeetingStatus},
        requests::{MeetingListQuery, NewMeeting},
        responses::MeetingListResponse,
    },
    notifications::{
        entities::Notification,
        requests::{CreateNotificationRequest, NotificationListQuery},
        responses::NotificationListResponse,
    },
    users::{
        entities::{User, UserStatus},
        requests::{NewUser, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::services::attendance::ledger::{AttendancePolicy, JoinOutcome, MeetingWindow};
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user_status(&self, id: i64, status: UserStatus) -> Result<Option<User>> {
        self.update_user_status_impl(id, status).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    async fn list_approved_students_by_ids(&self, ids: &[i64]) -> Result<Vec<User>> {
        self.list_approved_students_by_ids_impl(ids).await
    }

    // 会议模块
    async fn create_meeting(&self, meeting: NewMeeting) -> Result<Meeting> {
        self.create_meeting_impl(meeting).await
    }

    async fn get_meeting_by_id(&self, id: i64) -> Result<Option<Meeting>> {
        self.get_meeting_by_id_impl(id).await
    }

    async fn list_meetings_with_pagination(
        &self,
        query: MeetingListQuery,
    ) -> Result<MeetingListResponse> {
        self.list_meetings_with_pagination_impl(query).await
    }

    async fn list_meeting_participant_ids(&self, meeting_id: i64) -> Result<Vec<i64>> {
        self.list_meeting_participant_ids_impl(meeting_id).await
    }

    async fn is_meeting_participant(&self, meeting_id: i64, user_id: i64) -> Result<bool> {
        self.is_meeting_participant_impl(meeting_id, user_id).await
    }

    async fn add_meeting_participants(&self, meeting_id: i64, user_ids: &[i64]) -> Result<usize> {
        self.add_meeting_participants_impl(meeting_id, user_ids)
            .await
    }

    async fn transition_meeting_status(
        &self,
        id: i64,
        from: MeetingStatus,
        to: MeetingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Meeting>> {
        self.transition_meeting_status_impl(id, from, to, at).await
    }

    // 考勤模块
    async fn join_meeting(
        &self,
        meeting_id: i64,
        student_id: i64,
        window: MeetingWindow,
        policy: AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<Option<(Attendance, JoinOutcome)>> {
        self.join_meeting_impl(meeting_id, student_id, &window, &policy, at)
            .await
    }

    async fn leave_meeting(
        &self,
        meeting_id: i64,
        student_id: i64,
        window: MeetingWindow,
        policy: AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<Option<Attendance>> {
        self.leave_meeting_impl(meeting_id, student_id, &window, &policy, at)
            .await
    }

    async fn finalize_meeting_attendance(
        &self,
        meeting_id: i64,
        participant_ids: &[i64],
        window: MeetingWindow,
        policy: AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        self.finalize_meeting_attendance_impl(meeting_id, participant_ids, &window, &policy, at)
            .await
    }

    async fn get_attendance(
        &self,
        meeting_id: i64,
        student_id: i64,
    ) -> Result<Option<Attendance>> {
        self.get_attendance_impl(meeting_id, student_id).await
    }

    async fn list_meeting_attendances(&self, meeting_id: i64) -> Result<Vec<Attendance>> {
        self.list_meeting_attendances_impl(meeting_id).await
    }

    async fn list_student_attendances_with_pagination(
        &self,
        student_id: i64,
        page: u64,
        size: u64,
    ) -> Result<AttendanceListResponse> {
        self.list_student_attendances_with_pagination_impl(student_id, page, size)
            .await
    }

    // 表情采样模块
    async fn create_emotion_sample(&self, sample: NewEmotionSample) -> Result<Option<EmotionSample>> {
        self.create_emotion_sample_impl(sample).await
    }

    async fn list_meeting_emotion_samples(&self, meeting_id: i64) -> Result<Vec<EmotionSample>> {
        self.list_meeting_emotion_samples_impl(meeting_id).await
    }

    // 通知模块
    async fn create_notifications_batch(
        &self,
        reqs: Vec<CreateNotificationRequest>,
    ) -> Result<Vec<Notification>> {
        self.create_notifications_batch_impl(reqs).await
    }

    async fn list_notifications_with_pagination(
        &self,
        user_id: i64,
        query: NotificationListQuery,
    ) -> Result<NotificationListResponse> {
        self.list_notifications_with_pagination_impl(user_id, query)
            .await
    }

    async fn get_unread_notification_count(&self, user_id: i64) -> Result<i64> {
        self.get_unread_notification_count_impl(user_id).await
    }

    async fn mark_notification_as_read(&self, notification_id: i64, user_id: i64) -> Result<bool> {
        self.mark_notification_as_read_impl(notification_id, user_id)
            .await
    }

    async fn mark_all_notifications_as_read(&self, user_id: i64) -> Result<i64> {
        self.mark_all_notifications_as_read_impl(user_id).await
    }

    async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<bool> {
        self.delete_notification_impl(notification_id, user_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("lms.db").unwrap(),
            "sqlite://lms.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url(":memory:").unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://u:p@localhost/lms").unwrap(),
            "postgres://u:p@localhost/lms"
        );
        assert!(SeaOrmStorage::build_database_url("ftp://nowhere").is_err());
    }
}
