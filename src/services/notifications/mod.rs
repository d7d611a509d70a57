pub mod dispatch;
pub mod list;
pub mod mark;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::notifications::requests::NotificationListQuery;
use crate::storage::Storage;

pub use dispatch::notify_users;

pub struct NotificationService {
    storage: Option<Arc<dyn Storage>>,
}

impl NotificationService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 当前用户的通知列表
    pub async fn list_notifications(
        &self,
        request: &HttpRequest,
        query: NotificationListQuery,
    ) -> ActixResult<HttpResponse> {
        list::list_notifications(self, request, query).await
    }

    // 未读数量
    pub async fn get_unread_count(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::get_unread_count(self, request).await
    }

    pub async fn mark_as_read(
        &self,
        request: &HttpRequest,
        notification_id: i64,
    ) -> ActixResult<HttpResponse> {
        mark::mark_as_read(self, request, notification_id).await
    }

    pub async fn mark_all_as_read(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        mark::mark_all_as_read(self, request).await
    }

    pub async fn delete_notification(
        &self,
        request: &HttpRequest,
        notification_id: i64,
    ) -> ActixResult<HttpResponse> {
        mark::delete_notification(self, request, notification_id).await
    }
}
