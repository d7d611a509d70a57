use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::services::attendance::ledger::MeetingWindow;

// 会议状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/app/types/generated/meeting.ts")]
pub enum MeetingStatus {
    Scheduled, // 已预约
    Live,      // 进行中
    Ended,     // 已结束
    Cancelled, // 已取消
}

impl MeetingStatus {
    /// 状态机：scheduled -> live -> ended，scheduled -> cancelled
    pub fn can_transition_to(self, next: MeetingStatus) -> bool {
        matches!(
            (self, next),
            (MeetingStatus::Scheduled, MeetingStatus::Live)
                | (MeetingStatus::Scheduled, MeetingStatus::Cancelled)
                | (MeetingStatus::Live, MeetingStatus::Ended)
        )
    }

    pub fn is_finished(self) -> bool {
        matches!(self, MeetingStatus::Ended | MeetingStatus::Cancelled)
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeetingStatus::Scheduled => write!(f, "scheduled"),
            MeetingStatus::Live => write!(f, "live"),
            MeetingStatus::Ended => write!(f, "ended"),
            MeetingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MeetingStatus::Scheduled),
            "live" => Ok(MeetingStatus::Live),
            "ended" => Ok(MeetingStatus::Ended),
            "cancelled" => Ok(MeetingStatus::Cancelled),
            _ => Err(format!("Invalid meeting status: {s}")),
        }
    }
}

// 会议实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/meeting.ts")]
pub struct Meeting {
    pub id: i64,
    pub host_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub room_code: String,
    pub status: MeetingStatus,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    /// 迟到判定以实际开始时间为准，尚未开始时使用预约时间
    pub fn window(&self) -> MeetingWindow {
        MeetingWindow {
            start: self.started_at.unwrap_or(self.scheduled_start),
            duration_minutes: i64::from(self.duration_minutes),
        }
    }

    pub fn is_hosted_by(&self, user_id: i64) -> bool {
        self.host_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use MeetingStatus::*;
        assert!(Scheduled.can_transition_to(Live));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(Live.can_transition_to(Ended));

        assert!(!Live.can_transition_to(Cancelled));
        assert!(!Ended.can_transition_to(Live));
        assert!(!Cancelled.can_transition_to(Live));
        assert!(!Scheduled.can_transition_to(Ended));
    }

    #[test]
    fn test_window_prefers_actual_start() {
        let scheduled = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let started = DateTime::<Utc>::from_timestamp(1_700_000_900, 0).unwrap();
        let mut meeting = Meeting {
            id: 1,
            host_id: 1,
            title: "Operating Systems".into(),
            description: None,
            room_code: "ABC123".into(),
            status: MeetingStatus::Scheduled,
            scheduled_start: scheduled,
            duration_minutes: 60,
            started_at: None,
            ended_at: None,
            created_at: scheduled,
            updated_at: scheduled,
        };
        assert_eq!(meeting.window().start, scheduled);

        meeting.started_at = Some(started);
        assert_eq!(meeting.window().start, started);
        assert_eq!(meeting.window().duration_minutes, 60);
    }
}
