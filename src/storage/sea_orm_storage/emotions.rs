//! 表情采样存储操作

use super::SeaOrmStorage;
use crate::entity::student_emotions::{ActiveModel, Column, Entity as StudentEmotions};
use crate::errors::{LmsError, Result};
use crate::entity::meetings::{self, Entity as Meetings};
use crate::models::emotions::{entities::EmotionSample, requests::NewEmotionSample};
use crate::models::meetings::entities::MeetingStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

impl SeaOrmStorage {
    /// 写入一条采样；会议不在进行中时返回 None
    pub async fn create_emotion_sample_impl(
        &self,
        sample: NewEmotionSample,
    ) -> Result<Option<EmotionSample>> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        // 同一事务内确认会议仍在进行
        let live = Meetings::find_by_id(sample.meeting_id)
            .filter(meetings::Column::Status.eq(MeetingStatus::Live.to_string()))
            .count(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询会议失败: {e}")))?;
        if live == 0 {
            return Ok(None);
        }

        let model = ActiveModel {
            meeting_id: Set(sample.meeting_id),
            student_id: Set(sample.student_id),
            dominant_emotion: Set(sample.dominant_emotion.to_string()),
            expressions: Set(serde_json::to_string(&sample.expressions)?),
            face_detected: Set(sample.face_detected),
            attentiveness: Set(sample.attentiveness),
            captured_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("写入表情采样失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(result.into_emotion_sample()))
    }

    /// 会议全部采样（按时间升序）
    pub async fn list_meeting_emotion_samples_impl(
        &self,
        meeting_id: i64,
    ) -> Result<Vec<EmotionSample>> {
        let samples = StudentEmotions::find()
            .filter(Column::MeetingId.eq(meeting_id))
            .order_by_asc(Column::CapturedAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询表情采样失败: {e}")))?;

        Ok(samples
            .into_iter()
            .map(|m| m.into_emotion_sample())
            .collect())
    }
}
