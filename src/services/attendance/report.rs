use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashSet;

use super::AttendanceService;
use crate::models::attendance::entities::{Attendance, AttendanceStatus};
use crate::models::attendance::requests::MyAttendanceParams;
use crate::models::attendance::responses::{AttendanceSummary, MeetingAttendanceResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::services::meetings::access::{ensure_manager, load_meeting};

/// 汇总考勤记录；在名单中但没有记录的学生计为缺勤，平均出勤率按 0 计入
pub fn summarize(records: &[Attendance], participant_ids: &[i64]) -> AttendanceSummary {
    let mut summary = AttendanceSummary::default();
    let recorded: HashSet<i64> = records.iter().map(|r| r.student_id).collect();
    let missing = participant_ids
        .iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|id| !recorded.contains(id))
        .count() as i64;

    let mut percentage_sum = 0.0;
    for record in records {
        match record.status {
            AttendanceStatus::Present => summary.present_count += 1,
            AttendanceStatus::Late => summary.late_count += 1,
            AttendanceStatus::Partial => summary.partial_count += 1,
            AttendanceStatus::Absent => summary.absent_count += 1,
        }
        if record.is_active {
            summary.currently_active += 1;
        }
        percentage_sum += record.attendance_percentage;
    }

    summary.absent_count += missing;
    summary.total_participants = records.len() as i64 + missing;
    if summary.total_participants > 0 {
        let average = percentage_sum / summary.total_participants as f64;
        summary.average_percentage = (average * 100.0).round() / 100.0;
    }
    summary
}

pub async fn meeting_report(
    service: &AttendanceService,
    request: &HttpRequest,
    meeting_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let meeting = match load_meeting(&storage, meeting_id).await {
        Ok(meeting) => meeting,
        Err(response) => return Ok(response),
    };
    if let Err(response) = ensure_manager(&meeting, &user) {
        return Ok(response);
    }

    let records = try_response!(storage.list_meeting_attendances(meeting.id).await);
    let participant_ids = try_response!(storage.list_meeting_participant_ids(meeting.id).await);
    let summary = summarize(&records, &participant_ids);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        MeetingAttendanceResponse {
            meeting_id: meeting.id,
            records,
            summary,
        },
        "查询成功",
    )))
}

pub async fn my_meeting_record(
    service: &AttendanceService,
    request: &HttpRequest,
    meeting_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    match storage.get_attendance(meeting_id, user.id).await {
        Ok(Some(attendance)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(attendance, "查询成功")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AttendanceNotFound,
            "没有该会议的考勤记录",
        ))),
        Err(e) => Ok(e.to_http_response()),
    }
}

pub async fn my_history(
    service: &AttendanceService,
    request: &HttpRequest,
    params: MyAttendanceParams,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));
    let (page, size) = params.pagination.normalized();

    match storage
        .list_student_attendances_with_pagination(user.id, page, size)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功"))),
        Err(e) => Ok(e.to_http_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(student_id: i64, status: AttendanceStatus, percentage: f64, active: bool) -> Attendance {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        Attendance {
            id: student_id,
            meeting_id: 1,
            student_id,
            sessions: Vec::new(),
            first_joined_at: Some(at),
            last_left_at: None,
            total_duration_seconds: 0,
            attendance_percentage: percentage,
            is_late: status == AttendanceStatus::Late,
            status,
            is_active: active,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_summary_counts_and_average() {
        let records = vec![
            record(10, AttendanceStatus::Present, 100.0, false),
            record(11, AttendanceStatus::Late, 80.0, true),
            record(12, AttendanceStatus::Partial, 20.0, false),
        ];
        // 13 从未入会
        let summary = summarize(&records, &[10, 11, 12, 13]);

        assert_eq!(summary.total_participants, 4);
        assert_eq!(summary.present_count, 1);
        assert_eq!(summary.late_count, 1);
        assert_eq!(summary.partial_count, 1);
        assert_eq!(summary.absent_count, 1);
        assert_eq!(summary.currently_active, 1);
        assert_eq!(summary.average_percentage, 50.0);
    }

    #[test]
    fn test_summary_after_finalize_has_no_double_counting() {
        let records = vec![
            record(10, AttendanceStatus::Present, 90.0, false),
            record(13, AttendanceStatus::Absent, 0.0, false),
        ];
        let summary = summarize(&records, &[10, 13, 13]);
        assert_eq!(summary.total_participants, 2);
        assert_eq!(summary.absent_count, 1);
        assert_eq!(summary.average_percentage, 45.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], &[]);
        assert_eq!(summary.total_participants, 0);
        assert_eq!(summary.average_percentage, 0.0);
    }
}
