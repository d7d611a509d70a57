use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 通知类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/app/types/generated/notification.ts")]
pub enum NotificationType {
    MeetingScheduled,
    MeetingStarted,
    MeetingEnded,
    MeetingCancelled,
    AccountApproved,
    AccountRejected,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationType::MeetingScheduled => "meeting_scheduled",
            NotificationType::MeetingStarted => "meeting_started",
            NotificationType::MeetingEnded => "meeting_ended",
            NotificationType::MeetingCancelled => "meeting_cancelled",
            NotificationType::AccountApproved => "account_approved",
            NotificationType::AccountRejected => "account_rejected",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meeting_scheduled" => Ok(NotificationType::MeetingScheduled),
            "meeting_started" => Ok(NotificationType::MeetingStarted),
            "meeting_ended" => Ok(NotificationType::MeetingEnded),
            "meeting_cancelled" => Ok(NotificationType::MeetingCancelled),
            "account_approved" => Ok(NotificationType::AccountApproved),
            "account_rejected" => Ok(NotificationType::AccountRejected),
            _ => Err(format!("Invalid notification type: {s}")),
        }
    }
}

// 通知关联的资源类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/app/types/generated/notification.ts")]
pub enum ReferenceType {
    Meeting,
    User,
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceType::Meeting => write!(f, "meeting"),
            ReferenceType::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for ReferenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meeting" => Ok(ReferenceType::Meeting),
            "user" => Ok(ReferenceType::User),
            _ => Err(format!("Invalid reference type: {s}")),
        }
    }
}

// 通知实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/notification.ts")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub content: Option<String>,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<i64>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
