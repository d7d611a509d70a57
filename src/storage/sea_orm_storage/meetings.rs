//! 会议存储操作

use std::collections::HashSet;

use super::SeaOrmStorage;
use crate::entity::meeting_participants::{
    self, ActiveModel as ParticipantActiveModel, Entity as MeetingParticipants,
};
use crate::entity::meetings::{ActiveModel, Column, Entity as Meetings};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo,
    meetings::{
        entities::{Meeting, MeetingStatus},
        requests::{MeetingListQuery, MeetingScope, NewMeeting},
        responses::MeetingListResponse,
    },
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Query},
};

impl SeaOrmStorage {
    /// 创建会议并写入参会名单（同一事务）
    pub async fn create_meeting_impl(&self, req: NewMeeting) -> Result<Meeting> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let model = ActiveModel {
            host_id: Set(req.host_id),
            title: Set(req.title),
            description: Set(req.description),
            room_code: Set(req.room_code),
            status: Set(MeetingStatus::Scheduled.to_string()),
            scheduled_start: Set(req.scheduled_start.timestamp()),
            duration_minutes: Set(req.duration_minutes),
            started_at: Set(None),
            ended_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let meeting = model.insert(&txn).await.map_err(|e| {
            if super::is_unique_violation(&e) {
                LmsError::conflict("会议房间号已存在")
            } else {
                LmsError::database_operation(format!("创建会议失败: {e}"))
            }
        })?;

        insert_participants(&txn, meeting.id, &req.participant_ids, now).await?;

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(meeting.into_meeting())
    }

    /// 通过 ID 获取会议
    pub async fn get_meeting_by_id_impl(&self, id: i64) -> Result<Option<Meeting>> {
        let result = Meetings::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询会议失败: {e}")))?;

        Ok(result.map(|m| m.into_meeting()))
    }

    /// 分页列出会议
    pub async fn list_meetings_with_pagination_impl(
        &self,
        query: MeetingListQuery,
    ) -> Result<MeetingListResponse> {
        let page = query.page.max(1);
        let size = query.size.clamp(1, 100);

        let mut select = Meetings::find();

        match query.scope {
            MeetingScope::All => {}
            MeetingScope::HostedBy(host_id) => {
                select = select.filter(Column::HostId.eq(host_id));
            }
            MeetingScope::InvitedUser(user_id) => {
                select = select.filter(
                    Column::Id.in_subquery(
                        Query::select()
                            .column(meeting_participants::Column::MeetingId)
                            .from(meeting_participants::Entity)
                            .and_where(meeting_participants::Column::UserId.eq(user_id))
                            .to_owned(),
                    ),
                );
            }
        }

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select = select.order_by_desc(Column::ScheduledStart);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询会议总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询会议页数失败: {e}")))?;

        let meetings = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询会议列表失败: {e}")))?;

        Ok(MeetingListResponse {
            items: meetings.into_iter().map(|m| m.into_meeting()).collect(),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 参会学生 ID 列表
    pub async fn list_meeting_participant_ids_impl(&self, meeting_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = MeetingParticipants::find()
            .select_only()
            .column(meeting_participants::Column::UserId)
            .filter(meeting_participants::Column::MeetingId.eq(meeting_id))
            .order_by_asc(meeting_participants::Column::UserId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询参会名单失败: {e}")))?;

        Ok(ids)
    }

    /// 是否在参会名单中
    pub async fn is_meeting_participant_impl(&self, meeting_id: i64, user_id: i64) -> Result<bool> {
        let count = MeetingParticipants::find()
            .filter(meeting_participants::Column::MeetingId.eq(meeting_id))
            .filter(meeting_participants::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询参会名单失败: {e}")))?;

        Ok(count > 0)
    }

    /// 添加参会学生
    pub async fn add_meeting_participants_impl(
        &self,
        meeting_id: i64,
        user_ids: &[i64],
    ) -> Result<usize> {
        let existing: HashSet<i64> = self
            .list_meeting_participant_ids_impl(meeting_id)
            .await?
            .into_iter()
            .collect();
        let new_ids: Vec<i64> = user_ids
            .iter()
            .copied()
            .filter(|id| !existing.contains(id))
            .collect();

        let now = chrono::Utc::now().timestamp();
        insert_participants(&self.db, meeting_id, &new_ids, now).await
    }

    /// 条件状态迁移
    pub async fn transition_meeting_status_impl(
        &self,
        id: i64,
        from: MeetingStatus,
        to: MeetingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Meeting>> {
        let ts = at.timestamp();

        let mut update = Meetings::update_many()
            .col_expr(Column::Status, Expr::value(to.to_string()))
            .col_expr(Column::UpdatedAt, Expr::value(ts));
        match to {
            MeetingStatus::Live => {
                update = update.col_expr(Column::StartedAt, Expr::value(ts));
            }
            MeetingStatus::Ended | MeetingStatus::Cancelled => {
                update = update.col_expr(Column::EndedAt, Expr::value(ts));
            }
            MeetingStatus::Scheduled => {}
        }

        let result = update
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(from.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新会议状态失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_meeting_by_id_impl(id).await
    }
}

/// 批量写入参会名单，重复的 ID 只写一次
async fn insert_participants<C: ConnectionTrait>(
    conn: &C,
    meeting_id: i64,
    user_ids: &[i64],
    now: i64,
) -> Result<usize> {
    let mut seen = HashSet::new();
    let models: Vec<ParticipantActiveModel> = user_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .map(|user_id| ParticipantActiveModel {
            meeting_id: Set(meeting_id),
            user_id: Set(user_id),
            added_at: Set(now),
            ..Default::default()
        })
        .collect();

    if models.is_empty() {
        return Ok(0);
    }

    let count = models.len();
    MeetingParticipants::insert_many(models)
        .exec(conn)
        .await
        .map_err(|e| LmsError::database_operation(format!("写入参会名单失败: {e}")))?;

    Ok(count)
}
