pub mod access;
pub mod create;
pub mod detail;
pub mod lifecycle;
pub mod list;
pub mod participants;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::meetings::requests::{
    AddParticipantsRequest, CreateMeetingRequest, MeetingListParams,
};
use crate::storage::Storage;

pub struct MeetingService {
    storage: Option<Arc<dyn Storage>>,
}

impl MeetingService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 创建会议（教师/管理员）
    pub async fn create_meeting(
        &self,
        request: &HttpRequest,
        create: CreateMeetingRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_meeting(self, request, create).await
    }

    // 当前用户可见的会议
    pub async fn list_meetings(
        &self,
        request: &HttpRequest,
        params: MeetingListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_meetings(self, request, params).await
    }

    pub async fn get_meeting(
        &self,
        request: &HttpRequest,
        meeting_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_meeting(self, request, meeting_id).await
    }

    pub async fn add_participants(
        &self,
        request: &HttpRequest,
        meeting_id: i64,
        add: AddParticipantsRequest,
    ) -> ActixResult<HttpResponse> {
        participants::add_participants(self, request, meeting_id, add).await
    }

    pub async fn start_meeting(
        &self,
        request: &HttpRequest,
        meeting_id: i64,
    ) -> ActixResult<HttpResponse> {
        lifecycle::start_meeting(self, request, meeting_id).await
    }

    pub async fn end_meeting(
        &self,
        request: &HttpRequest,
        meeting_id: i64,
    ) -> ActixResult<HttpResponse> {
        lifecycle::end_meeting(self, request, meeting_id).await
    }

    pub async fn cancel_meeting(
        &self,
        request: &HttpRequest,
        meeting_id: i64,
    ) -> ActixResult<HttpResponse> {
        lifecycle::cancel_meeting(self, request, meeting_id).await
    }
}
