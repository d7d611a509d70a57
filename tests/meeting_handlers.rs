//! 会议结束与考勤处理函数：直接以 HttpRequest 调用服务

use std::sync::Arc;

use actix_web::{HttpMessage, HttpRequest, HttpResponse, http::StatusCode, test, web};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;

use smart_lms::models::ErrorCode;
use smart_lms::models::attendance::entities::AttendanceStatus;
use smart_lms::models::meetings::entities::{Meeting, MeetingStatus};
use smart_lms::models::meetings::requests::NewMeeting;
use smart_lms::models::users::entities::{User, UserRole, UserStatus};
use smart_lms::models::users::requests::NewUser;
use smart_lms::services::attendance::ledger::AttendancePolicy;
use smart_lms::services::{AttendanceService, MeetingService};
use smart_lms::storage::Storage;
use smart_lms::storage::sea_orm_storage::SeaOrmStorage;

async fn memory_storage() -> Arc<dyn Storage> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Arc::new(SeaOrmStorage::from_connection(db).await.unwrap())
}

async fn create_user(storage: &Arc<dyn Storage>, name: &str, role: UserRole) -> User {
    storage
        .create_user(NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            role,
            status: UserStatus::Approved,
            display_name: None,
            avatar_url: None,
        })
        .await
        .unwrap()
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

async fn live_meeting(storage: &Arc<dyn Storage>, host_id: i64, participant_ids: Vec<i64>) -> Meeting {
    let meeting = storage
        .create_meeting(NewMeeting {
            host_id,
            title: "数据结构".to_string(),
            description: None,
            room_code: "QWE-RTY-UPA".to_string(),
            scheduled_start: base_time(),
            duration_minutes: 60,
            participant_ids,
        })
        .await
        .unwrap();
    storage
        .transition_meeting_status(meeting.id, MeetingStatus::Scheduled, MeetingStatus::Live, base_time())
        .await
        .unwrap()
        .unwrap()
}

/// 模拟 RequireJWT 通过后的请求
fn request_as(storage: &Arc<dyn Storage>, user: &User) -> HttpRequest {
    let req = test::TestRequest::post()
        .app_data(web::Data::new(storage.clone()))
        .to_http_request();
    req.extensions_mut().insert(user.clone());
    req
}

async fn body_json(resp: HttpResponse) -> Value {
    let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[actix_web::test]
async fn test_end_on_ended_meeting_finalizes_attendance() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher).await;
    let s1 = create_user(&storage, "amy", UserRole::Student).await;
    let s2 = create_user(&storage, "bob", UserRole::Student).await;
    let meeting = live_meeting(&storage, host.id, vec![s1.id, s2.id]).await;

    storage
        .join_meeting(meeting.id, s1.id, meeting.window(), AttendancePolicy::default(), base_time())
        .await
        .unwrap()
        .unwrap();

    // 状态已迁移，但上一次结算失败
    storage
        .transition_meeting_status(
            meeting.id,
            MeetingStatus::Live,
            MeetingStatus::Ended,
            base_time() + Duration::minutes(45),
        )
        .await
        .unwrap()
        .unwrap();

    let resp = MeetingService::new_lazy()
        .end_meeting(&request_as(&storage, &host), meeting.id)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["status"], "ended");

    let s1_record = storage.get_attendance(meeting.id, s1.id).await.unwrap().unwrap();
    assert!(!s1_record.is_active);
    assert_eq!(s1_record.total_duration_seconds, 45 * 60);
    let s2_record = storage.get_attendance(meeting.id, s2.id).await.unwrap().unwrap();
    assert_eq!(s2_record.status, AttendanceStatus::Absent);
}

#[actix_web::test]
async fn test_end_on_ended_meeting_requires_manager() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher).await;
    let other = create_user(&storage, "tina", UserRole::Teacher).await;
    let meeting = live_meeting(&storage, host.id, vec![]).await;
    storage
        .transition_meeting_status(meeting.id, MeetingStatus::Live, MeetingStatus::Ended, base_time())
        .await
        .unwrap()
        .unwrap();

    let resp = MeetingService::new_lazy()
        .end_meeting(&request_as(&storage, &other), meeting.id)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_join_and_leave_after_end_report_meeting_not_live() {
    let storage = memory_storage().await;
    let host = create_user(&storage, "tom", UserRole::Teacher).await;
    let s1 = create_user(&storage, "amy", UserRole::Student).await;
    let meeting = live_meeting(&storage, host.id, vec![s1.id]).await;
    let service = AttendanceService::new_lazy();

    let resp = service
        .join(&request_as(&storage, &s1), meeting.id)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = MeetingService::new_lazy()
        .end_meeting(&request_as(&storage, &host), meeting.id)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    for resp in [
        service.leave(&request_as(&storage, &s1), meeting.id).await.unwrap(),
        service.join(&request_as(&storage, &s1), meeting.id).await.unwrap(),
    ] {
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::MeetingNotLive as i32);
    }

    let record = storage.get_attendance(meeting.id, s1.id).await.unwrap().unwrap();
    assert!(!record.is_active);
}
