use serde::Deserialize;
use ts_rs::TS;

use super::entities::{Emotion, ExpressionScores};

// 上报表情采样请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/emotion.ts")]
pub struct RecordEmotionRequest {
    pub expressions: ExpressionScores,
    #[serde(default = "default_face_detected")]
    pub face_detected: bool,
}

fn default_face_detected() -> bool {
    true
}

// 存储层写入参数
#[derive(Debug, Clone)]
pub struct NewEmotionSample {
    pub meeting_id: i64,
    pub student_id: i64,
    pub dominant_emotion: Emotion,
    pub expressions: ExpressionScores,
    pub face_detected: bool,
    pub attentiveness: f64,
}
