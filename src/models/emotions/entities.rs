use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 表情类别（与前端 face-api 输出保持一致）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../frontend/src/app/types/generated/emotion.ts")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Disgusted,
        Emotion::Surprised,
    ];

    /// 专注度权重
    pub fn attentiveness_weight(self) -> f64 {
        match self {
            Emotion::Neutral => 1.0,
            Emotion::Happy => 0.9,
            Emotion::Surprised => 0.7,
            Emotion::Sad => 0.4,
            Emotion::Fearful => 0.3,
            Emotion::Angry => 0.3,
            Emotion::Disgusted => 0.2,
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Disgusted => "disgusted",
            Emotion::Surprised => "surprised",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neutral" => Ok(Emotion::Neutral),
            "happy" => Ok(Emotion::Happy),
            "sad" => Ok(Emotion::Sad),
            "angry" => Ok(Emotion::Angry),
            "fearful" => Ok(Emotion::Fearful),
            "disgusted" => Ok(Emotion::Disgusted),
            "surprised" => Ok(Emotion::Surprised),
            _ => Err(format!("Invalid emotion: {s}")),
        }
    }
}

/// 七类表情概率
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/emotion.ts")]
pub struct ExpressionScores {
    #[serde(default)]
    pub neutral: f64,
    #[serde(default)]
    pub happy: f64,
    #[serde(default)]
    pub sad: f64,
    #[serde(default)]
    pub angry: f64,
    #[serde(default)]
    pub fearful: f64,
    #[serde(default)]
    pub disgusted: f64,
    #[serde(default)]
    pub surprised: f64,
}

impl ExpressionScores {
    pub fn get(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Neutral => self.neutral,
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Angry => self.angry,
            Emotion::Fearful => self.fearful,
            Emotion::Disgusted => self.disgusted,
            Emotion::Surprised => self.surprised,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.into_iter().map(|e| (e, self.get(e)))
    }
}

// 表情采样记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/emotion.ts")]
pub struct EmotionSample {
    pub id: i64,
    pub meeting_id: i64,
    pub student_id: i64,
    pub dominant_emotion: Emotion,
    pub expressions: ExpressionScores,
    pub face_detected: bool,
    pub attentiveness: f64,
    pub captured_at: DateTime<Utc>,
}
