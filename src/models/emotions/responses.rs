use std::collections::HashMap;

use serde::Serialize;
use ts_rs::TS;

use super::entities::Emotion;

/// 单个学生的专注度汇总
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/emotion.ts")]
pub struct StudentEngagement {
    pub student_id: i64,
    pub sample_count: u64,
    pub average_attentiveness: f64,
    pub dominant_emotion: Option<Emotion>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/emotion.ts")]
pub struct EmotionSummaryResponse {
    pub meeting_id: i64,
    pub total_samples: u64,
    pub average_attentiveness: f64,
    pub distribution: HashMap<Emotion, u64>,
    pub students: Vec<StudentEngagement>,
}
