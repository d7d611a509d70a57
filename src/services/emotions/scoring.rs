//! 表情采样评分

use crate::models::emotions::entities::{Emotion, ExpressionScores};

/// 校验概率取值：每项必须是 0..=1 之间的有限数
pub fn validate_scores(scores: &ExpressionScores) -> Result<(), String> {
    for (emotion, value) in scores.iter() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(format!(
                "Expression '{emotion}' must be between 0 and 1, got {value}"
            ));
        }
    }
    Ok(())
}

/// 概率最高的表情，并列时按固定顺序取第一个，全零视为 neutral
pub fn dominant_emotion(scores: &ExpressionScores) -> Emotion {
    let mut best = Emotion::Neutral;
    let mut best_value = 0.0;
    for (emotion, value) in scores.iter() {
        if value > best_value {
            best = emotion;
            best_value = value;
        }
    }
    best
}

/// 专注度（0..=100）：按权重对概率加权平均
pub fn attentiveness(scores: &ExpressionScores, face_detected: bool) -> f64 {
    if !face_detected {
        return 0.0;
    }
    let total: f64 = scores.iter().map(|(_, p)| p).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = scores
        .iter()
        .map(|(e, p)| p * e.attentiveness_weight())
        .sum();
    let score = (weighted / total * 100.0).clamp(0.0, 100.0);
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_emotion() {
        let scores = ExpressionScores {
            happy: 0.7,
            neutral: 0.2,
            sad: 0.1,
            ..Default::default()
        };
        assert_eq!(dominant_emotion(&scores), Emotion::Happy);
        assert_eq!(dominant_emotion(&ExpressionScores::default()), Emotion::Neutral);
    }

    #[test]
    fn test_attentiveness_weights() {
        let neutral = ExpressionScores {
            neutral: 1.0,
            ..Default::default()
        };
        assert_eq!(attentiveness(&neutral, true), 100.0);

        let mixed = ExpressionScores {
            neutral: 0.5,
            disgusted: 0.5,
            ..Default::default()
        };
        assert_eq!(attentiveness(&mixed, true), 60.0);

        let unnormalized = ExpressionScores {
            sad: 0.2,
            ..Default::default()
        };
        assert_eq!(attentiveness(&unnormalized, true), 40.0);
    }

    #[test]
    fn test_attentiveness_without_face_or_signal() {
        let neutral = ExpressionScores {
            neutral: 1.0,
            ..Default::default()
        };
        assert_eq!(attentiveness(&neutral, false), 0.0);
        assert_eq!(attentiveness(&ExpressionScores::default(), true), 0.0);
    }

    #[test]
    fn test_validate_scores() {
        assert!(validate_scores(&ExpressionScores::default()).is_ok());
        let bad = ExpressionScores {
            angry: 1.5,
            ..Default::default()
        };
        assert!(validate_scores(&bad).is_err());
        let nan = ExpressionScores {
            happy: f64::NAN,
            ..Default::default()
        };
        assert!(validate_scores(&nan).is_err());
    }
}
