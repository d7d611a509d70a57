//! 考勤会话核算
//!
//! 一名学生在一场会议中的所有入会/离会区间构成一个 [`AttendanceLedger`]。
//! 这里只做纯计算，不涉及存储：入会开启会话、离会关闭会话并累计时长，
//! 再依据会议时长与迟到宽限期得出出勤率与考勤状态。

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::attendance::entities::{AttendanceSession, AttendanceStatus};

/// 考勤判定策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttendancePolicy {
    /// 迟到宽限期（分钟）
    pub late_grace_minutes: i64,
    /// 出勤率阈值（百分比），低于该值记为 partial
    pub present_threshold: f64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            late_grace_minutes: 10,
            present_threshold: 75.0,
        }
    }
}

/// 会议的考勤参照窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingWindow {
    pub start: DateTime<Utc>,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Opened,
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    NoActiveSession,
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::NoActiveSession => write!(f, "no active attendance session"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// 核算结果
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceTally {
    pub total_duration_seconds: i64,
    pub attendance_percentage: f64,
    pub is_late: bool,
    pub status: AttendanceStatus,
    pub first_joined_at: Option<DateTime<Utc>>,
    pub last_left_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceLedger {
    sessions: Vec<AttendanceSession>,
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sessions(sessions: Vec<AttendanceSession>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &[AttendanceSession] {
        &self.sessions
    }

    pub fn into_sessions(self) -> Vec<AttendanceSession> {
        self.sessions
    }

    pub fn is_active(&self) -> bool {
        self.sessions.iter().any(AttendanceSession::is_active)
    }

    /// 入会：已有未关闭的会话时不重复开启
    pub fn join(&mut self, at: DateTime<Utc>) -> JoinOutcome {
        if self.is_active() {
            return JoinOutcome::AlreadyActive;
        }
        self.sessions.push(AttendanceSession::open(at));
        JoinOutcome::Opened
    }

    /// 离会：关闭当前会话，返回本次会话时长（秒）
    pub fn leave(&mut self, at: DateTime<Utc>) -> Result<i64, LedgerError> {
        let session = self
            .sessions
            .iter_mut()
            .rev()
            .find(|s| s.is_active())
            .ok_or(LedgerError::NoActiveSession)?;
        Ok(close_session(session, at))
    }

    /// 关闭所有未关闭的会话，返回关闭数量
    pub fn close_open(&mut self, at: DateTime<Utc>) -> usize {
        self.sessions
            .iter_mut()
            .filter(|s| s.is_active())
            .map(|s| close_session(s, at))
            .count()
    }

    /// 已关闭会话的累计时长
    pub fn total_duration_seconds(&self) -> i64 {
        self.sessions
            .iter()
            .filter(|s| !s.is_active())
            .map(|s| s.duration_seconds)
            .sum()
    }

    pub fn first_joined_at(&self) -> Option<DateTime<Utc>> {
        self.sessions.iter().map(|s| s.joined_at).min()
    }

    pub fn last_left_at(&self) -> Option<DateTime<Utc>> {
        self.sessions.iter().filter_map(|s| s.left_at).max()
    }

    pub fn tally(&self, window: &MeetingWindow, policy: &AttendancePolicy) -> AttendanceTally {
        let total = self.total_duration_seconds();
        let percentage = attendance_percentage(total, window.duration_minutes);
        let first_joined_at = self.first_joined_at();
        let late = first_joined_at
            .map(|first| is_late(first, window, policy))
            .unwrap_or(false);

        AttendanceTally {
            total_duration_seconds: total,
            attendance_percentage: percentage,
            is_late: late,
            status: classify(!self.sessions.is_empty(), percentage, late, policy),
            first_joined_at,
            last_left_at: self.last_left_at(),
            is_active: self.is_active(),
        }
    }
}

fn close_session(session: &mut AttendanceSession, at: DateTime<Utc>) -> i64 {
    let duration = at
        .signed_duration_since(session.joined_at)
        .num_seconds()
        .max(0);
    session.left_at = Some(at);
    session.duration_seconds = duration;
    duration
}

/// 出勤率：累计时长 / 会议时长，保留两位小数，封顶 100
pub fn attendance_percentage(total_seconds: i64, duration_minutes: i64) -> f64 {
    if duration_minutes <= 0 {
        return 0.0;
    }
    let expected = (duration_minutes * 60) as f64;
    let raw = total_seconds.max(0) as f64 / expected * 100.0;
    ((raw * 100.0).round() / 100.0).min(100.0)
}

pub fn is_late(first_join: DateTime<Utc>, window: &MeetingWindow, policy: &AttendancePolicy) -> bool {
    first_join > window.start + TimeDelta::minutes(policy.late_grace_minutes)
}

pub fn classify(
    has_sessions: bool,
    percentage: f64,
    late: bool,
    policy: &AttendancePolicy,
) -> AttendanceStatus {
    if !has_sessions {
        AttendanceStatus::Absent
    } else if percentage < policy.present_threshold {
        AttendanceStatus::Partial
    } else if late {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(minutes: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_750_000_000, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    fn window() -> MeetingWindow {
        MeetingWindow {
            start: t(0),
            duration_minutes: 60,
        }
    }

    #[test]
    fn test_join_opens_single_session() {
        let mut ledger = AttendanceLedger::new();
        assert_eq!(ledger.join(t(0)), JoinOutcome::Opened);
        assert_eq!(ledger.join(t(5)), JoinOutcome::AlreadyActive);
        assert_eq!(ledger.sessions().len(), 1);
        assert!(ledger.is_active());
    }

    #[test]
    fn test_leave_accumulates_duration() {
        let mut ledger = AttendanceLedger::new();
        ledger.join(t(0));
        assert_eq!(ledger.leave(t(20)), Ok(1200));
        ledger.join(t(30));
        assert_eq!(ledger.leave(t(45)), Ok(900));

        assert_eq!(ledger.sessions().len(), 2);
        assert_eq!(ledger.total_duration_seconds(), 2100);
        assert!(!ledger.is_active());
        assert_eq!(ledger.last_left_at(), Some(t(45)));
    }

    #[test]
    fn test_leave_without_session() {
        let mut ledger = AttendanceLedger::new();
        assert_eq!(ledger.leave(t(1)), Err(LedgerError::NoActiveSession));

        ledger.join(t(0));
        ledger.leave(t(1)).unwrap();
        assert_eq!(ledger.leave(t(2)), Err(LedgerError::NoActiveSession));
    }

    #[test]
    fn test_leave_before_join_clamps_to_zero() {
        let mut ledger = AttendanceLedger::new();
        ledger.join(t(10));
        assert_eq!(ledger.leave(t(5)), Ok(0));
        assert_eq!(ledger.total_duration_seconds(), 0);
    }

    #[test]
    fn test_open_session_not_counted() {
        let mut ledger = AttendanceLedger::new();
        ledger.join(t(0));
        ledger.leave(t(10)).unwrap();
        ledger.join(t(20));
        assert_eq!(ledger.total_duration_seconds(), 600);
    }

    #[test]
    fn test_close_open() {
        let mut ledger = AttendanceLedger::new();
        assert_eq!(ledger.close_open(t(60)), 0);

        ledger.join(t(0));
        assert_eq!(ledger.close_open(t(60)), 1);
        assert_eq!(ledger.total_duration_seconds(), 3600);
        assert_eq!(ledger.close_open(t(70)), 0);
    }

    #[test]
    fn test_percentage_rounding_and_cap() {
        assert_eq!(attendance_percentage(1800, 60), 50.0);
        assert_eq!(attendance_percentage(1000, 60), 27.78);
        assert_eq!(attendance_percentage(7200, 60), 100.0);
        assert_eq!(attendance_percentage(600, 0), 0.0);
        assert_eq!(attendance_percentage(600, -5), 0.0);
    }

    #[test]
    fn test_is_late_uses_grace_period() {
        let policy = AttendancePolicy::default();
        assert!(!is_late(t(10), &window(), &policy));
        assert!(is_late(t(11), &window(), &policy));
        assert!(!is_late(t(-5), &window(), &policy));
    }

    #[test]
    fn test_classify() {
        let policy = AttendancePolicy::default();
        assert_eq!(classify(false, 0.0, false, &policy), AttendanceStatus::Absent);
        assert_eq!(classify(true, 74.99, false, &policy), AttendanceStatus::Partial);
        assert_eq!(classify(true, 40.0, true, &policy), AttendanceStatus::Partial);
        assert_eq!(classify(true, 75.0, true, &policy), AttendanceStatus::Late);
        assert_eq!(classify(true, 90.0, false, &policy), AttendanceStatus::Present);
    }

    #[test]
    fn test_tally_late_full_attendance() {
        let policy = AttendancePolicy::default();
        let mut ledger = AttendanceLedger::new();
        ledger.join(t(12));
        ledger.leave(t(72)).unwrap();

        let tally = ledger.tally(&window(), &policy);
        assert_eq!(tally.total_duration_seconds, 3600);
        assert_eq!(tally.attendance_percentage, 100.0);
        assert!(tally.is_late);
        assert_eq!(tally.status, AttendanceStatus::Late);
        assert_eq!(tally.first_joined_at, Some(t(12)));
        assert!(!tally.is_active);
    }

    #[test]
    fn test_tally_empty_ledger_is_absent() {
        let tally = AttendanceLedger::new().tally(&window(), &AttendancePolicy::default());
        assert_eq!(tally.status, AttendanceStatus::Absent);
        assert_eq!(tally.attendance_percentage, 0.0);
        assert!(!tally.is_late);
        assert_eq!(tally.first_joined_at, None);
    }

    #[test]
    fn test_percentage_never_decreases_as_sessions_close() {
        let policy = AttendancePolicy::default();
        let mut ledger = AttendanceLedger::new();
        let mut last = 0.0;
        for (join, leave) in [(0, 5), (7, 7), (10, 30), (31, 50), (52, 90)] {
            ledger.join(t(join));
            let open = ledger.tally(&window(), &policy).attendance_percentage;
            assert!(open >= last);
            ledger.leave(t(leave)).unwrap();
            let closed = ledger.tally(&window(), &policy).attendance_percentage;
            assert!(closed >= open);
            assert!((0.0..=100.0).contains(&closed));
            last = closed;
        }
        assert_eq!(last, 100.0);
    }
}
