pub mod ledger;
pub mod report;
pub mod session;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::attendance::requests::MyAttendanceParams;
use crate::storage::Storage;

pub struct AttendanceService {
    storage: Option<Arc<dyn Storage>>,
}

impl AttendanceService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 学生入会
    pub async fn join(&self, request: &HttpRequest, meeting_id: i64) -> ActixResult<HttpResponse> {
        session::join_meeting(self, request, meeting_id).await
    }

    // 学生离会
    pub async fn leave(&self, request: &HttpRequest, meeting_id: i64) -> ActixResult<HttpResponse> {
        session::leave_meeting(self, request, meeting_id).await
    }

    // 会议考勤报表（主持人/管理员）
    pub async fn meeting_report(
        &self,
        request: &HttpRequest,
        meeting_id: i64,
    ) -> ActixResult<HttpResponse> {
        report::meeting_report(self, request, meeting_id).await
    }

    pub async fn my_meeting_record(
        &self,
        request: &HttpRequest,
        meeting_id: i64,
    ) -> ActixResult<HttpResponse> {
        report::my_meeting_record(self, request, meeting_id).await
    }

    pub async fn my_history(
        &self,
        request: &HttpRequest,
        params: MyAttendanceParams,
    ) -> ActixResult<HttpResponse> {
        report::my_history(self, request, params).await
    }
}
