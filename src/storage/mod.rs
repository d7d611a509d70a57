use std::sync::Arc;

use chrono::{DateTime, Utc};

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

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（密码已哈希）
    async fn create_user(&self, user: NewUser) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 审核用户
    async fn update_user_status(&self, id: i64, status: UserStatus) -> Result<Option<User>>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;
    // 按ID批量获取已审核的学生
    async fn list_approved_students_by_ids(&self, ids: &[i64]) -> Result<Vec<User>>;

    /// 会议管理方法
    // 创建会议及参会名单
    async fn create_meeting(&self, meeting: NewMeeting) -> Result<Meeting>;
    // 通过ID获取会议
    async fn get_meeting_by_id(&self, id: i64) -> Result<Option<Meeting>>;
    // 列出会议
    async fn list_meetings_with_pagination(
        &self,
        query: MeetingListQuery,
    ) -> Result<MeetingListResponse>;
    // 会议参会学生ID
    async fn list_meeting_participant_ids(&self, meeting_id: i64) -> Result<Vec<i64>>;
    // 是否在参会名单中
    async fn is_meeting_participant(&self, meeting_id: i64, user_id: i64) -> Result<bool>;
    // 添加参会学生，已在名单中的忽略，返回新增数量
    async fn add_meeting_participants(&self, meeting_id: i64, user_ids: &[i64]) -> Result<usize>;
    // 条件状态迁移：仅当当前状态为 from 时更新，返回 None 表示状态已变化
    async fn transition_meeting_status(
        &self,
        id: i64,
        from: MeetingStatus,
        to: MeetingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Meeting>>;

    /// 考勤方法
    // 入会：首次入会创建记录，已在会中时不重复开启会话；会议不在进行中时返回 None
    async fn join_meeting(
        &self,
        meeting_id: i64,
        student_id: i64,
        window: MeetingWindow,
        policy: AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<Option<(Attendance, JoinOutcome)>>;
    // 离会：没有进行中的会话时返回 None
    async fn leave_meeting(
        &self,
        meeting_id: i64,
        student_id: i64,
        window: MeetingWindow,
        policy: AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<Option<Attendance>>;
    // 会议结束：关闭所有会话并为未入会学生生成缺勤记录，返回关闭的会话数
    async fn finalize_meeting_attendance(
        &self,
        meeting_id: i64,
        participant_ids: &[i64],
        window: MeetingWindow,
        policy: AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<usize>;
    // 获取学生在会议中的考勤记录
    async fn get_attendance(&self, meeting_id: i64, student_id: i64)
    -> Result<Option<Attendance>>;
    // 会议全部考勤记录
    async fn list_meeting_attendances(&self, meeting_id: i64) -> Result<Vec<Attendance>>;
    // 学生考勤历史
    async fn list_student_attendances_with_pagination(
        &self,
        student_id: i64,
        page: u64,
        size: u64,
    ) -> Result<AttendanceListResponse>;

    /// 表情采样方法
    // 会议不在进行中时不写入，返回 None
    async fn create_emotion_sample(&self, sample: NewEmotionSample) -> Result<Option<EmotionSample>>;
    async fn list_meeting_emotion_samples(&self, meeting_id: i64) -> Result<Vec<EmotionSample>>;

    /// 通知方法
    async fn create_notifications_batch(
        &self,
        reqs: Vec<CreateNotificationRequest>,
    ) -> Result<Vec<Notification>>;
    async fn list_notifications_with_pagination(
        &self,
        user_id: i64,
        query: NotificationListQuery,
    ) -> Result<NotificationListResponse>;
    async fn get_unread_notification_count(&self, user_id: i64) -> Result<i64>;
    // 标记已读（仅限本人的通知）
    async fn mark_notification_as_read(&self, notification_id: i64, user_id: i64) -> Result<bool>;
    async fn mark_all_notifications_as_read(&self, user_id: i64) -> Result<i64>;
    async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<bool>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
