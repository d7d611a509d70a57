//! 通知扇出：为每个接收者落库一条记录，并推送给在线用户。
//!
//! 通知是主操作的附带效果，失败只记日志，不影响主请求的结果。

use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::notifications::entities::{NotificationType, ReferenceType};
use crate::models::notifications::requests::CreateNotificationRequest;
use crate::services::websocket::ConnectionManager;
use crate::storage::Storage;

/// 同一内容发给多个用户
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub notification_type: NotificationType,
    pub title: String,
    pub content: Option<String>,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<i64>,
}

impl NotificationDraft {
    pub fn new(notification_type: NotificationType, title: impl Into<String>) -> Self {
        Self {
            notification_type,
            title: title.into(),
            content: None,
            reference_type: None,
            reference_id: None,
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn reference(mut self, reference_type: ReferenceType, reference_id: i64) -> Self {
        self.reference_type = Some(reference_type);
        self.reference_id = Some(reference_id);
        self
    }

    pub(crate) fn for_recipients(&self, user_ids: &[i64]) -> Vec<CreateNotificationRequest> {
        let mut seen = std::collections::HashSet::new();
        user_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .map(|user_id| CreateNotificationRequest {
                user_id,
                notification_type: self.notification_type,
                title: self.title.clone(),
                content: self.content.clone(),
                reference_type: self.reference_type,
                reference_id: self.reference_id,
            })
            .collect()
    }
}

/// 落库并推送，返回成功创建的条数
pub async fn notify_users(
    storage: &Arc<dyn Storage>,
    user_ids: &[i64],
    draft: NotificationDraft,
) -> usize {
    if user_ids.is_empty() {
        return 0;
    }

    match storage
        .create_notifications_batch(draft.for_recipients(user_ids))
        .await
    {
        Ok(notifications) => {
            let manager = ConnectionManager::get();
            let created = notifications.len();
            let pushed = notifications
                .into_iter()
                .filter(|n| manager.push_notification(n.clone()))
                .count();
            debug!(
                "Created {} {} notifications, {} delivered live",
                created, draft.notification_type, pushed
            );
            created
        }
        Err(e) => {
            warn!(
                "Failed to create {} notifications for {} users: {}",
                draft.notification_type,
                user_ids.len(),
                e
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_fans_out_unique_recipients() {
        let draft = NotificationDraft::new(NotificationType::MeetingStarted, "会议已开始")
            .content("《线性代数》直播已开始")
            .reference(ReferenceType::Meeting, 12);

        let requests = draft.for_recipients(&[3, 4, 3]);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].user_id, 3);
        assert_eq!(requests[1].user_id, 4);
        assert!(requests.iter().all(|r| r.reference_id == Some(12)
            && r.reference_type == Some(ReferenceType::Meeting)
            && r.content.as_deref() == Some("《线性代数》直播已开始")));
    }
}
