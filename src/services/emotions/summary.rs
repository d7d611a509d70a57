use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::{BTreeMap, HashMap};

use super::EmotionService;
use crate::models::ApiResponse;
use crate::models::emotions::entities::{Emotion, EmotionSample};
use crate::models::emotions::responses::{EmotionSummaryResponse, StudentEngagement};
use crate::services::current_user;
use crate::services::meetings::access::{ensure_manager, load_meeting};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 出现次数最多的情绪，次数相同时按 `Emotion::ALL` 的顺序取前者
fn most_frequent(counts: &HashMap<Emotion, u64>) -> Option<Emotion> {
    Emotion::ALL
        .iter()
        .copied()
        .filter_map(|emotion| counts.get(&emotion).map(|count| (emotion, *count)))
        .filter(|(_, count)| *count > 0)
        .fold(None, |best: Option<(Emotion, u64)>, (emotion, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((emotion, count)),
        })
        .map(|(emotion, _)| emotion)
}

pub fn summarize_samples(meeting_id: i64, samples: &[EmotionSample]) -> EmotionSummaryResponse {
    let mut distribution: HashMap<Emotion, u64> = HashMap::new();
    let mut per_student: BTreeMap<i64, (u64, f64, HashMap<Emotion, u64>)> = BTreeMap::new();
    let mut total_attentiveness = 0.0;

    for sample in samples {
        *distribution.entry(sample.dominant_emotion).or_default() += 1;
        total_attentiveness += sample.attentiveness;

        let (count, sum, emotions) = per_student.entry(sample.student_id).or_default();
        *count += 1;
        *sum += sample.attentiveness;
        *emotions.entry(sample.dominant_emotion).or_default() += 1;
    }

    let students = per_student
        .into_iter()
        .map(|(student_id, (count, sum, emotions))| StudentEngagement {
            student_id,
            sample_count: count,
            average_attentiveness: round2(sum / count as f64),
            dominant_emotion: most_frequent(&emotions),
        })
        .collect();

    let total_samples = samples.len() as u64;
    EmotionSummaryResponse {
        meeting_id,
        total_samples,
        average_attentiveness: if total_samples == 0 {
            0.0
        } else {
            round2(total_attentiveness / total_samples as f64)
        },
        distribution,
        students,
    }
}

pub async fn meeting_summary(
    service: &EmotionService,
    request: &HttpRequest,
    meeting_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let meeting = match load_meeting(&storage, meeting_id).await {
        Ok(meeting) => meeting,
        Err(response) => return Ok(response),
    };
    if let Err(response) = ensure_manager(&meeting, &user) {
        return Ok(response);
    }

    let samples = try_response!(storage.list_meeting_emotion_samples(meeting.id).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        summarize_samples(meeting.id, &samples),
        "查询成功",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::emotions::entities::ExpressionScores;
    use chrono::Utc;

    fn sample(student_id: i64, emotion: Emotion, attentiveness: f64) -> EmotionSample {
        EmotionSample {
            id: 0,
            meeting_id: 3,
            student_id,
            dominant_emotion: emotion,
            expressions: ExpressionScores::default(),
            face_detected: true,
            attentiveness,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_per_student() {
        let samples = vec![
            sample(2, Emotion::Happy, 90.0),
            sample(1, Emotion::Neutral, 100.0),
            sample(2, Emotion::Happy, 80.0),
            sample(2, Emotion::Sad, 40.0),
        ];
        let summary = summarize_samples(3, &samples);

        assert_eq!(summary.total_samples, 4);
        assert_eq!(summary.average_attentiveness, 77.5);
        assert_eq!(summary.distribution.get(&Emotion::Happy), Some(&2));
        assert_eq!(summary.students.len(), 2);
        assert_eq!(summary.students[0].student_id, 1);
        assert_eq!(summary.students[1].sample_count, 3);
        assert_eq!(summary.students[1].average_attentiveness, 70.0);
        assert_eq!(summary.students[1].dominant_emotion, Some(Emotion::Happy));
    }

    #[test]
    fn test_most_frequent_tie_uses_canonical_order() {
        let counts = HashMap::from([(Emotion::Surprised, 2), (Emotion::Neutral, 2)]);
        assert_eq!(most_frequent(&counts), Some(Emotion::Neutral));
        assert_eq!(most_frequent(&HashMap::new()), None);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize_samples(3, &[]);
        assert_eq!(summary.total_samples, 0);
        assert_eq!(summary.average_attentiveness, 0.0);
        assert!(summary.students.is_empty());
    }
}
