//! 学生表情采样实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_emotions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub meeting_id: i64,
    pub student_id: i64,
    pub dominant_emotion: String,
    #[sea_orm(column_type = "Text")]
    pub expressions: String,
    pub face_detected: bool,
    #[sea_orm(column_type = "Double")]
    pub attentiveness: f64,
    pub captured_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meetings::Entity",
        from = "Column::MeetingId",
        to = "super::meetings::Column::Id"
    )]
    Meeting,
}

impl Related<super::meetings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meeting.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_emotion_sample(self) -> crate::models::emotions::entities::EmotionSample {
        use crate::models::emotions::entities::{Emotion, EmotionSample};

        EmotionSample {
            id: self.id,
            meeting_id: self.meeting_id,
            student_id: self.student_id,
            dominant_emotion: self
                .dominant_emotion
                .parse::<Emotion>()
                .unwrap_or(Emotion::Neutral),
            expressions: serde_json::from_str(&self.expressions).unwrap_or_default(),
            face_detected: self.face_detected,
            attentiveness: self.attentiveness,
            captured_at: super::ts_to_datetime(self.captured_at),
        }
    }
}
