//! 会议实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "meetings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub host_id: i64,
    pub title: String,
    pub description: Option<String>,
    #[sea_orm(unique)]
    pub room_code: String,
    pub status: String,
    pub scheduled_start: i64,
    pub duration_minutes: i32,
    pub started_at: Option<i64>,
    pub ended_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::HostId",
        to = "super::users::Column::Id"
    )]
    Host,
    #[sea_orm(has_many = "super::meeting_participants::Entity")]
    Participants,
    #[sea_orm(has_many = "super::attendances::Entity")]
    Attendances,
    #[sea_orm(has_many = "super::student_emotions::Entity")]
    StudentEmotions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Host.def()
    }
}

impl Related<super::meeting_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::attendances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendances.def()
    }
}

impl Related<super::student_emotions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentEmotions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_meeting(self) -> crate::models::meetings::entities::Meeting {
        use crate::models::meetings::entities::{Meeting, MeetingStatus};

        Meeting {
            id: self.id,
            host_id: self.host_id,
            title: self.title,
            description: self.description,
            room_code: self.room_code,
            status: self
                .status
                .parse::<MeetingStatus>()
                .unwrap_or(MeetingStatus::Scheduled),
            scheduled_start: super::ts_to_datetime(self.scheduled_start),
            duration_minutes: self.duration_minutes,
            started_at: self.started_at.map(super::ts_to_datetime),
            ended_at: self.ended_at.map(super::ts_to_datetime),
            created_at: super::ts_to_datetime(self.created_at),
            updated_at: super::ts_to_datetime(self.updated_at),
        }
    }
}
