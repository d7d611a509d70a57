//! 存储层集成测试：内存 SQLite + 迁移

use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database};

use smart_lms::errors::LmsError;
use smart_lms::models::PaginationQuery;
use smart_lms::models::attendance::entities::AttendanceStatus;
use smart_lms::models::emotions::entities::{Emotion, ExpressionScores};
use smart_lms::models::emotions::requests::NewEmotionSample;
use smart_lms::models::meetings::entities::{Meeting, MeetingStatus};
use smart_lms::models::meetings::requests::{MeetingListQuery, MeetingScope, NewMeeting};
use smart_lms::models::notifications::entities::{NotificationType, ReferenceType};
use smart_lms::models::notifications::requests::{
    CreateNotificationRequest, NotificationListQuery,
};
use smart_lms::models::users::entities::{User, UserRole, UserStatus};
use smart_lms::models::users::requests::{NewUser, UserListQuery};
use smart_lms::services::attendance::ledger::{AttendancePolicy, JoinOutcome, MeetingWindow};
use smart_lms::storage::Storage;
use smart_lms::storage::sea_orm_storage::SeaOrmStorage;

async fn memory_storage() -> SeaOrmStorage {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    SeaOrmStorage::from_connection(db).await.unwrap()
}

async fn create_user(storage: &SeaOrmStorage, name: &str, role: UserRole, status: UserStatus) -> User {
    storage
        .create_user(NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            role,
            status,
            display_name: None,
            avatar_url: None,
        })
        .await
        .unwrap()
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn new_meeting(host_id: i64, room_code: &str, participant_ids: Vec<i64>) -> NewMeeting {
    NewMeeting {
        host_id,
        title: "线性代数 第三讲".to_string(),
        description: None,
        room_code: room_code.to_string(),
        scheduled_start: base_time(),
        duration_minutes: 60,
        participant_ids,
    }
}

/// 已开始的会议，开始时间即 base_time
async fn live_meeting(storage: &SeaOrmStorage, host_id: i64, participant_ids: Vec<i64>) -> Meeting {
    let meeting = storage
        .create_meeting(new_meeting(host_id, "abc-def-ghi", participant_ids))
        .await
        .unwrap();
    storage
        .transition_meeting_status(meeting.id, MeetingStatus::Scheduled, MeetingStatus::Live, base_time())
        .await
        .unwrap()
        .unwrap()
}

fn list_query(scope: MeetingScope) -> MeetingListQuery {
    MeetingListQuery {
        page: 1,
        size: 20,
        scope,
        status: None,
    }
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let storage = memory_storage().await;
    create_user(&storage, "alice", UserRole::Student, UserStatus::Approved).await;

    let err = storage
        .create_user(NewUser {
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            password_hash: "x".to_string(),
            role: UserRole::Student,
            status: UserStatus::Pending,
            display_name: None,
            avatar_url: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, LmsError::Conflict(_)));
}

#[tokio::test]
async fn test_user_status_and_student_lookup() {
    let storage = memory_storage().await;
    let teacher = create_user(&storage, "tom", UserRole::Teacher, UserStatus::Approved).await;
    let approved = create_user(&storage, "amy", UserRole::Student, UserStatus::Approved).await;
    let pending = create_user(&storage, "pete", UserRole::Student, UserStatus::Pending).await;

    let found = storage
        .list_approved_students_by_ids(&[teacher.id, approved.id, pending.id])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, approved.id);

    let updated = storage
        .update_user_status(pending.id, UserStatus::Approved)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, UserStatus::Approved);
    assert!(
        storage
            .update_user_status(9999, UserStatus::Approved)
            .await
            .unwrap()
            .is_none()
    );

    let approved_students = storage
        .list_users_with_pagination(UserListQuery {
            page: Some(1),
            size: Some(10),
            role: Some(UserRole::Student),
            status: Some(UserStatus::Approved),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(approved_students.items.len(), 2);
}

#[tokio::test]
async fn test_meeting_scope_and_participants() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher, UserStatus::Approved).await;
    let other_host = create_user(&storage, "tina", UserRole::Teacher, UserStatus::Approved).await;
    let s1 = create_user(&storage, "amy", UserRole::Student, UserStatus::Approved).await;
    let s2 = create_user(&storage, "bob", UserRole::Student, UserStatus::Approved).await;

    let meeting = storage
        .create_meeting(new_meeting(host.id, "abc-def-ghi", vec![s1.id, s1.id]))
        .await
        .unwrap();
    storage
        .create_meeting(new_meeting(other_host.id, "jkl-mno-pqr", vec![s2.id]))
        .await
        .unwrap();

    assert_eq!(meeting.status, MeetingStatus::Scheduled);
    assert_eq!(
        storage.list_meeting_participant_ids(meeting.id).await.unwrap(),
        vec![s1.id]
    );

    let dup = storage
        .create_meeting(new_meeting(host.id, "abc-def-ghi", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(dup, LmsError::Conflict(_)));

    let hosted = storage
        .list_meetings_with_pagination(list_query(MeetingScope::HostedBy(host.id)))
        .await
        .unwrap();
    assert_eq!(hosted.items.len(), 1);

    let invited = storage
        .list_meetings_with_pagination(list_query(MeetingScope::InvitedUser(s2.id)))
        .await
        .unwrap();
    assert_eq!(invited.items.len(), 1);
    assert_eq!(invited.items[0].host_id, other_host.id);

    let all = storage
        .list_meetings_with_pagination(list_query(MeetingScope::All))
        .await
        .unwrap();
    assert_eq!(all.pagination.total, 2);

    let added = storage
        .add_meeting_participants(meeting.id, &[s1.id, s2.id, s2.id])
        .await
        .unwrap();
    assert_eq!(added, 1);
    assert!(storage.is_meeting_participant(meeting.id, s2.id).await.unwrap());
}

#[tokio::test]
async fn test_meeting_transition_is_conditional() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher, UserStatus::Approved).await;
    let meeting = storage
        .create_meeting(new_meeting(host.id, "abc-def-ghi", vec![]))
        .await
        .unwrap();

    let started_at = base_time() + Duration::minutes(2);
    let live = storage
        .transition_meeting_status(meeting.id, MeetingStatus::Scheduled, MeetingStatus::Live, started_at)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(live.status, MeetingStatus::Live);
    assert_eq!(live.started_at, Some(started_at));
    assert_eq!(live.window().start, started_at);

    // 状态已变化，第二次迁移不生效
    let again = storage
        .transition_meeting_status(meeting.id, MeetingStatus::Scheduled, MeetingStatus::Live, started_at)
        .await
        .unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn test_attendance_join_leave_and_finalize() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher, UserStatus::Approved).await;
    let s1 = create_user(&storage, "amy", UserRole::Student, UserStatus::Approved).await;
    let s2 = create_user(&storage, "bob", UserRole::Student, UserStatus::Approved).await;
    let meeting = live_meeting(&storage, host.id, vec![s1.id, s2.id]).await;

    let start = base_time();
    let window = MeetingWindow {
        start,
        duration_minutes: 60,
    };
    let policy = AttendancePolicy::default();

    let (record, outcome) = storage
        .join_meeting(meeting.id, s1.id, window, policy, start)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome, JoinOutcome::Opened);
    assert!(record.is_active);

    let (_, outcome) = storage
        .join_meeting(meeting.id, s1.id, window, policy, start + Duration::minutes(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome, JoinOutcome::AlreadyActive);

    let after_leave = storage
        .leave_meeting(meeting.id, s1.id, window, policy, start + Duration::minutes(30))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_leave.total_duration_seconds, 30 * 60);
    assert_eq!(after_leave.attendance_percentage, 50.0);
    assert_eq!(after_leave.status, AttendanceStatus::Partial);
    assert!(!after_leave.is_active);

    // 没有进行中的会话
    assert!(
        storage
            .leave_meeting(meeting.id, s1.id, window, policy, start + Duration::minutes(31))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        storage
            .leave_meeting(meeting.id, s2.id, window, policy, start + Duration::minutes(31))
            .await
            .unwrap()
            .is_none()
    );

    let (rejoined, outcome) = storage
        .join_meeting(meeting.id, s1.id, window, policy, start + Duration::minutes(35))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome, JoinOutcome::Opened);
    assert_eq!(rejoined.sessions.len(), 2);

    let closed = storage
        .finalize_meeting_attendance(
            meeting.id,
            &[s1.id, s2.id],
            window,
            policy,
            start + Duration::minutes(60),
        )
        .await
        .unwrap();
    assert_eq!(closed, 1);

    let final_s1 = storage.get_attendance(meeting.id, s1.id).await.unwrap().unwrap();
    assert_eq!(final_s1.total_duration_seconds, 55 * 60);
    assert!(final_s1.attendance_percentage >= after_leave.attendance_percentage);
    assert_eq!(final_s1.status, AttendanceStatus::Present);
    assert!(!final_s1.is_active);

    let final_s2 = storage.get_attendance(meeting.id, s2.id).await.unwrap().unwrap();
    assert_eq!(final_s2.status, AttendanceStatus::Absent);
    assert_eq!(final_s2.attendance_percentage, 0.0);
    assert!(final_s2.sessions.is_empty());

    // 再次结算不会重复生成记录
    storage
        .finalize_meeting_attendance(
            meeting.id,
            &[s1.id, s2.id],
            window,
            policy,
            start + Duration::minutes(61),
        )
        .await
        .unwrap();
    let records = storage.list_meeting_attendances(meeting.id).await.unwrap();
    assert_eq!(records.len(), 2);

    let history = storage
        .list_student_attendances_with_pagination(s1.id, 1, 10)
        .await
        .unwrap();
    assert_eq!(history.items.len(), 1);
    assert_eq!(history.pagination.total, 1);
}

#[tokio::test]
async fn test_late_first_join() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher, UserStatus::Approved).await;
    let s1 = create_user(&storage, "amy", UserRole::Student, UserStatus::Approved).await;
    let meeting = live_meeting(&storage, host.id, vec![s1.id]).await;

    let window = MeetingWindow {
        start: base_time(),
        duration_minutes: 60,
    };
    let policy = AttendancePolicy::default();

    storage
        .join_meeting(meeting.id, s1.id, window, policy, base_time() + Duration::minutes(11))
        .await
        .unwrap()
        .unwrap();
    let record = storage
        .leave_meeting(meeting.id, s1.id, window, policy, base_time() + Duration::minutes(60))
        .await
        .unwrap()
        .unwrap();

    assert!(record.is_late);
    assert_eq!(record.status, AttendanceStatus::Late);
}

#[tokio::test]
async fn test_emotion_samples_are_listed_per_meeting() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher, UserStatus::Approved).await;
    let s1 = create_user(&storage, "amy", UserRole::Student, UserStatus::Approved).await;
    let meeting = live_meeting(&storage, host.id, vec![s1.id]).await;

    let expressions = ExpressionScores {
        happy: 0.8,
        neutral: 0.2,
        ..Default::default()
    };
    let new_sample = NewEmotionSample {
        meeting_id: meeting.id,
        student_id: s1.id,
        dominant_emotion: Emotion::Happy,
        expressions,
        face_detected: true,
        attentiveness: 92.0,
    };
    let sample = storage
        .create_emotion_sample(new_sample.clone())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sample.dominant_emotion, Emotion::Happy);

    storage
        .transition_meeting_status(
            meeting.id,
            MeetingStatus::Live,
            MeetingStatus::Ended,
            base_time() + Duration::minutes(60),
        )
        .await
        .unwrap()
        .unwrap();
    // 会议结束后的采样不再写入
    assert!(storage.create_emotion_sample(new_sample).await.unwrap().is_none());

    let samples = storage.list_meeting_emotion_samples(meeting.id).await.unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].expressions.happy, 0.8);
}

#[tokio::test]
async fn test_join_after_meeting_end_keeps_absent_record() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher, UserStatus::Approved).await;
    let s1 = create_user(&storage, "amy", UserRole::Student, UserStatus::Approved).await;
    let meeting = live_meeting(&storage, host.id, vec![s1.id]).await;
    let window = meeting.window();
    let policy = AttendancePolicy::default();

    let ended_at = base_time() + Duration::minutes(60);
    storage
        .transition_meeting_status(meeting.id, MeetingStatus::Live, MeetingStatus::Ended, ended_at)
        .await
        .unwrap()
        .unwrap();
    storage
        .finalize_meeting_attendance(meeting.id, &[s1.id], window, policy, ended_at)
        .await
        .unwrap();

    // 处理函数读到的还是进行中的会议，写入时会议已结束
    let joined = storage
        .join_meeting(meeting.id, s1.id, window, policy, ended_at + Duration::seconds(1))
        .await
        .unwrap();
    assert!(joined.is_none());

    let record = storage.get_attendance(meeting.id, s1.id).await.unwrap().unwrap();
    assert!(!record.is_active);
    assert!(record.sessions.is_empty());
    assert_eq!(record.status, AttendanceStatus::Absent);
}

#[tokio::test]
async fn test_join_before_start_is_rejected() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher, UserStatus::Approved).await;
    let s1 = create_user(&storage, "amy", UserRole::Student, UserStatus::Approved).await;
    let meeting = storage
        .create_meeting(new_meeting(host.id, "abc-def-ghi", vec![s1.id]))
        .await
        .unwrap();

    let joined = storage
        .join_meeting(meeting.id, s1.id, meeting.window(), AttendancePolicy::default(), base_time())
        .await
        .unwrap();
    assert!(joined.is_none());
    assert!(storage.get_attendance(meeting.id, s1.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_finalize_can_run_again_after_meeting_ended() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher, UserStatus::Approved).await;
    let s1 = create_user(&storage, "amy", UserRole::Student, UserStatus::Approved).await;
    let s2 = create_user(&storage, "bob", UserRole::Student, UserStatus::Approved).await;
    let meeting = live_meeting(&storage, host.id, vec![s1.id, s2.id]).await;
    let window = meeting.window();
    let policy = AttendancePolicy::default();

    storage
        .join_meeting(meeting.id, s1.id, window, policy, base_time())
        .await
        .unwrap()
        .unwrap();

    // 状态已迁移到 ended，但结算没有完成
    let ended_at = base_time() + Duration::minutes(60);
    storage
        .transition_meeting_status(meeting.id, MeetingStatus::Live, MeetingStatus::Ended, ended_at)
        .await
        .unwrap()
        .unwrap();
    assert!(storage.get_attendance(meeting.id, s1.id).await.unwrap().unwrap().is_active);

    let closed = storage
        .finalize_meeting_attendance(meeting.id, &[s1.id, s2.id], window, policy, ended_at)
        .await
        .unwrap();
    assert_eq!(closed, 1);

    let s1_record = storage.get_attendance(meeting.id, s1.id).await.unwrap().unwrap();
    assert!(!s1_record.is_active);
    assert_eq!(s1_record.attendance_percentage, 100.0);
    let s2_record = storage.get_attendance(meeting.id, s2.id).await.unwrap().unwrap();
    assert_eq!(s2_record.status, AttendanceStatus::Absent);
}

#[tokio::test]
async fn test_notifications_are_scoped_to_owner() {
    let storage = memory_storage().await;
    let alice = create_user(&storage, "alice", UserRole::Student, UserStatus::Approved).await;
    let bob = create_user(&storage, "bob", UserRole::Student, UserStatus::Approved).await;

    let reqs = [alice.id, alice.id, bob.id]
        .into_iter()
        .map(|user_id| CreateNotificationRequest {
            user_id,
            notification_type: NotificationType::MeetingScheduled,
            title: "新会议".to_string(),
            content: None,
            reference_type: Some(ReferenceType::Meeting),
            reference_id: Some(1),
        })
        .collect();
    let created = storage.create_notifications_batch(reqs).await.unwrap();
    assert_eq!(created.len(), 3);

    let alice_first = created.iter().find(|n| n.user_id == alice.id).unwrap().id;
    let bob_first = created.iter().find(|n| n.user_id == bob.id).unwrap().id;

    assert_eq!(storage.get_unread_notification_count(alice.id).await.unwrap(), 2);
    assert!(!storage.mark_notification_as_read(bob_first, alice.id).await.unwrap());
    assert!(!storage.delete_notification(bob_first, alice.id).await.unwrap());
    assert!(storage.mark_notification_as_read(alice_first, alice.id).await.unwrap());

    let unread = storage
        .list_notifications_with_pagination(
            alice.id,
            NotificationListQuery {
                pagination: PaginationQuery { page: 1, size: 10 },
                unread_only: Some(true),
            },
        )
        .await
        .unwrap();
    assert_eq!(unread.items.len(), 1);

    assert_eq!(storage.mark_all_notifications_as_read(alice.id).await.unwrap(), 1);
    assert_eq!(storage.get_unread_notification_count(alice.id).await.unwrap(), 0);
    assert_eq!(storage.get_unread_notification_count(bob.id).await.unwrap(), 1);
    assert!(storage.delete_notification(bob_first, bob.id).await.unwrap());
}
