//! 考勤存储操作
//!
//! 每条考勤记录内嵌会话列表，写入时以 `version` 作为条件，冲突后重新读取再应用，
//! 最多尝试 [`MAX_WRITE_ATTEMPTS`] 次。首次入会的并发插入由唯一索引
//! `(meeting_id, student_id)` 串行化。

use std::collections::HashSet;

use super::SeaOrmStorage;
use crate::entity::attendances::{ActiveModel, Column, Entity as Attendances, Model};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo,
    attendance::{entities::Attendance, responses::AttendanceListResponse},
    meetings::entities::{Meeting, MeetingStatus},
};
use crate::services::attendance::ledger::{
    AttendanceLedger, AttendancePolicy, JoinOutcome, MeetingWindow,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

const MAX_WRITE_ATTEMPTS: usize = 3;

impl SeaOrmStorage {
    /// 入会；会议不在进行中时返回 None
    ///
    /// 每次尝试前都重新读取会议状态。写入成功后再确认一次：若会议已在此期间结束，
    /// 结算可能已经扫描过考勤表，刚开启的会话由这里自行关闭。
    pub async fn join_meeting_impl(
        &self,
        meeting_id: i64,
        student_id: i64,
        window: &MeetingWindow,
        policy: &AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<Option<(Attendance, JoinOutcome)>> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            if self.live_meeting(meeting_id).await?.is_none() {
                return Ok(None);
            }

            let written = match self.find_attendance_model(meeting_id, student_id).await? {
                None => {
                    let mut ledger = AttendanceLedger::new();
                    ledger.join(at);
                    self.insert_ledger(meeting_id, student_id, &ledger, window, policy, at)
                        .await?
                }
                Some(model) => {
                    let mut ledger = AttendanceLedger::from_sessions(model.parse_sessions());
                    if ledger.join(at) == JoinOutcome::AlreadyActive {
                        return Ok(Some((model.into_attendance(), JoinOutcome::AlreadyActive)));
                    }
                    self.write_ledger(&model, ledger, window, policy, at).await?
                }
            };

            let Some(record) = written else {
                debug!(meeting_id, student_id, attempt, "考勤记录写入冲突，重试");
                continue;
            };

            if let Some(ended_at) = self.ended_since_join(meeting_id, at).await? {
                debug!(meeting_id, student_id, "入会期间会议已结束，关闭刚开启的会话");
                self.close_record_sessions(record, window, policy, ended_at)
                    .await?;
                return Ok(None);
            }

            return Ok(Some((record.into_attendance(), JoinOutcome::Opened)));
        }

        Err(LmsError::conflict("考勤记录更新冲突，请稍后重试"))
    }

    /// 进行中的会议
    async fn live_meeting(&self, meeting_id: i64) -> Result<Option<Meeting>> {
        Ok(self
            .get_meeting_by_id_impl(meeting_id)
            .await?
            .filter(|meeting| meeting.status == MeetingStatus::Live))
    }

    /// 会议已不在进行中时返回关闭会话所用的时间
    async fn ended_since_join(
        &self,
        meeting_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(match self.get_meeting_by_id_impl(meeting_id).await? {
            Some(meeting) if meeting.status == MeetingStatus::Live => None,
            Some(meeting) => Some(meeting.ended_at.unwrap_or(at)),
            None => Some(at),
        })
    }

    /// 离会
    pub async fn leave_meeting_impl(
        &self,
        meeting_id: i64,
        student_id: i64,
        window: &MeetingWindow,
        policy: &AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<Option<Attendance>> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Some(model) = self.find_attendance_model(meeting_id, student_id).await? else {
                return Ok(None);
            };

            let mut ledger = AttendanceLedger::from_sessions(model.parse_sessions());
            if ledger.leave(at).is_err() {
                return Ok(None);
            }

            if let Some(updated) = self
                .write_ledger(&model, ledger, window, policy, at)
                .await?
            {
                return Ok(Some(updated.into_attendance()));
            }
            debug!(meeting_id, student_id, attempt, "考勤记录版本冲突，重试");
        }

        Err(LmsError::conflict("考勤记录更新冲突，请稍后重试"))
    }

    /// 会议结束时的考勤结算
    pub async fn finalize_meeting_attendance_impl(
        &self,
        meeting_id: i64,
        participant_ids: &[i64],
        window: &MeetingWindow,
        policy: &AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let records = Attendances::find()
            .filter(Column::MeetingId.eq(meeting_id))
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询考勤记录失败: {e}")))?;

        let mut attended: HashSet<i64> = HashSet::new();
        let mut closed = 0;

        for record in records {
            attended.insert(record.student_id);
            closed += self
                .close_record_sessions(record, window, policy, at)
                .await?;
        }

        // 从未入会的学生记为缺勤
        let empty = AttendanceLedger::new();
        for &student_id in participant_ids {
            if attended.contains(&student_id) {
                continue;
            }
            if self
                .insert_ledger(meeting_id, student_id, &empty, window, policy, at)
                .await?
                .is_none()
            {
                debug!(meeting_id, student_id, "缺勤记录已存在，跳过");
            }
        }

        Ok(closed)
    }

    /// 获取学生在会议中的考勤记录
    pub async fn get_attendance_impl(
        &self,
        meeting_id: i64,
        student_id: i64,
    ) -> Result<Option<Attendance>> {
        Ok(self
            .find_attendance_model(meeting_id, student_id)
            .await?
            .map(Model::into_attendance))
    }

    /// 会议全部考勤记录
    pub async fn list_meeting_attendances_impl(&self, meeting_id: i64) -> Result<Vec<Attendance>> {
        let records = Attendances::find()
            .filter(Column::MeetingId.eq(meeting_id))
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询考勤记录失败: {e}")))?;

        Ok(records.into_iter().map(Model::into_attendance).collect())
    }

    /// 学生考勤历史（分页）
    pub async fn list_student_attendances_with_pagination_impl(
        &self,
        student_id: i64,
        page: u64,
        size: u64,
    ) -> Result<AttendanceListResponse> {
        let page = page.max(1);
        let size = size.clamp(1, 100);

        let paginator = Attendances::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::CreatedAt)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询考勤总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询考勤页数失败: {e}")))?;

        let records = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询考勤列表失败: {e}")))?;

        Ok(AttendanceListResponse {
            items: records.into_iter().map(Model::into_attendance).collect(),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    async fn find_attendance_model(&self, meeting_id: i64, student_id: i64) -> Result<Option<Model>> {
        Attendances::find()
            .filter(Column::MeetingId.eq(meeting_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询考勤记录失败: {e}")))
    }

    /// 关闭一条记录的未结束会话并重新核算
    async fn close_record_sessions(
        &self,
        mut record: Model,
        window: &MeetingWindow,
        policy: &AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut ledger = AttendanceLedger::from_sessions(record.parse_sessions());
            let closed = ledger.close_open(at);

            if self
                .write_ledger(&record, ledger, window, policy, at)
                .await?
                .is_some()
            {
                return Ok(closed);
            }

            record = Attendances::find_by_id(record.id)
                .one(&self.db)
                .await
                .map_err(|e| LmsError::database_operation(format!("查询考勤记录失败: {e}")))?
                .ok_or_else(|| LmsError::not_found("考勤记录不存在"))?;
        }

        Err(LmsError::conflict("考勤记录更新冲突，请稍后重试"))
    }

    /// 插入新记录；唯一索引冲突时返回 None
    async fn insert_ledger(
        &self,
        meeting_id: i64,
        student_id: i64,
        ledger: &AttendanceLedger,
        window: &MeetingWindow,
        policy: &AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<Option<Model>> {
        let tally = ledger.tally(window, policy);
        let now = at.timestamp();

        let model = ActiveModel {
            meeting_id: Set(meeting_id),
            student_id: Set(student_id),
            sessions: Set(serde_json::to_string(ledger.sessions())?),
            first_joined_at: Set(tally.first_joined_at.map(|t| t.timestamp())),
            last_left_at: Set(tally.last_left_at.map(|t| t.timestamp())),
            total_duration_seconds: Set(tally.total_duration_seconds),
            attendance_percentage: Set(tally.attendance_percentage),
            is_late: Set(tally.is_late),
            status: Set(tally.status.to_string()),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(created) => Ok(Some(created)),
            Err(e) if super::is_unique_violation(&e) => Ok(None),
            Err(e) => Err(LmsError::database_operation(format!(
                "创建考勤记录失败: {e}"
            ))),
        }
    }

    /// 以读取时的版本为条件写回；版本已变化时返回 None
    async fn write_ledger(
        &self,
        current: &Model,
        ledger: AttendanceLedger,
        window: &MeetingWindow,
        policy: &AttendancePolicy,
        at: DateTime<Utc>,
    ) -> Result<Option<Model>> {
        let tally = ledger.tally(window, policy);

        let updated = Model {
            sessions: serde_json::to_string(ledger.sessions())?,
            first_joined_at: tally.first_joined_at.map(|t| t.timestamp()),
            last_left_at: tally.last_left_at.map(|t| t.timestamp()),
            total_duration_seconds: tally.total_duration_seconds,
            attendance_percentage: tally.attendance_percentage,
            is_late: tally.is_late,
            status: tally.status.to_string(),
            version: current.version + 1,
            updated_at: at.timestamp(),
            ..current.clone()
        };

        let changes = ActiveModel {
            sessions: Set(updated.sessions.clone()),
            first_joined_at: Set(updated.first_joined_at),
            last_left_at: Set(updated.last_left_at),
            total_duration_seconds: Set(updated.total_duration_seconds),
            attendance_percentage: Set(updated.attendance_percentage),
            is_late: Set(updated.is_late),
            status: Set(updated.status.clone()),
            version: Set(updated.version),
            updated_at: Set(updated.updated_at),
            ..Default::default()
        };

        let result = Attendances::update_many()
            .set(changes)
            .filter(Column::Id.eq(current.id))
            .filter(Column::Version.eq(current.version))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新考勤记录失败: {e}")))?;

        Ok((result.rows_affected > 0).then_some(updated))
    }
}
