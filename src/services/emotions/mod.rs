pub mod record;
pub mod scoring;
pub mod summary;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::emotions::requests::RecordEmotionRequest;
use crate::storage::Storage;

pub struct EmotionService {
    storage: Option<Arc<dyn Storage>>,
}

impl EmotionService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 学生上报一次表情采样
    pub async fn record_sample(
        &self,
        request: &HttpRequest,
        meeting_id: i64,
        sample: RecordEmotionRequest,
    ) -> ActixResult<HttpResponse> {
        record::record_sample(self, request, meeting_id, sample).await
    }

    // 会议专注度汇总（主持人/管理员）
    pub async fn meeting_summary(
        &self,
        request: &HttpRequest,
        meeting_id: i64,
    ) -> ActixResult<HttpResponse> {
        summary::meeting_summary(self, request, meeting_id).await
    }
}
