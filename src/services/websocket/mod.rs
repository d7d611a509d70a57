/*!
 * WebSocket 实时推送
 *
 * 客户端连接 `ws://host/api/v1/ws?token=<access_token>`，按用户 ID 注册到进程内的
 * 连接表。推送只在进程内尽力而为：不持久化，接收端落后时丢弃旧消息。
 *
 * 服务端推送（`type` 标签）：
 *
 * ```json
 * {"type": "connected", "user_id": 42}
 * {"type": "notification", "payload": {"id": 1, "notification_type": "meeting_started", ...}}
 * {"type": "attendance_update", "payload": {"meeting_id": 7, "student_id": 42, "action": "join", ...}}
 * {"type": "emotion_update", "payload": {"meeting_id": 7, "student_id": 42, "attentiveness": 81.5, ...}}
 * ```
 *
 * 心跳：客户端发送 `{"type": "ping"}`，服务端回复 `{"type": "pong"}`；服务端每 30 秒发送协议层 ping。
 */

use actix_ws::Message;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::StreamExt;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::models::attendance::entities::{Attendance, AttendanceStatus};
use crate::models::emotions::entities::{Emotion, EmotionSample};
use crate::models::notifications::entities::Notification;

static CONNECTION_MANAGER: Lazy<ConnectionManager> = Lazy::new(ConnectionManager::new);

/// 每个用户的广播缓冲
const CHANNEL_CAPACITY: usize = 100;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// 服务端推送的消息
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Connected { user_id: i64 },
    Notification { payload: Notification },
    AttendanceUpdate { payload: AttendanceUpdatePayload },
    EmotionUpdate { payload: EmotionUpdatePayload },
    Ping,
    Pong,
    Error { message: String },
}

/// 客户端可发送的消息
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Ping,
    Pong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceAction {
    Join,
    Leave,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceUpdatePayload {
    pub meeting_id: i64,
    pub student_id: i64,
    pub action: AttendanceAction,
    pub is_active: bool,
    pub total_duration_seconds: i64,
    pub attendance_percentage: f64,
    pub status: AttendanceStatus,
    pub at: DateTime<Utc>,
}

impl AttendanceUpdatePayload {
    pub fn new(attendance: &Attendance, action: AttendanceAction, at: DateTime<Utc>) -> Self {
        Self {
            meeting_id: attendance.meeting_id,
            student_id: attendance.student_id,
            action,
            is_active: attendance.is_active,
            total_duration_seconds: attendance.total_duration_seconds,
            attendance_percentage: attendance.attendance_percentage,
            status: attendance.status,
            at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionUpdatePayload {
    pub meeting_id: i64,
    pub student_id: i64,
    pub dominant_emotion: Emotion,
    pub attentiveness: f64,
    pub face_detected: bool,
    pub captured_at: DateTime<Utc>,
}

impl From<&EmotionSample> for EmotionUpdatePayload {
    fn from(sample: &EmotionSample) -> Self {
        Self {
            meeting_id: sample.meeting_id,
            student_id: sample.student_id,
            dominant_emotion: sample.dominant_emotion,
            attentiveness: sample.attentiveness,
            face_detected: sample.face_detected,
            captured_at: sample.captured_at,
        }
    }
}

/// 用户 ID -> 广播发送器
pub struct ConnectionManager {
    connections: DashMap<i64, broadcast::Sender<WsMessage>>,
}

impl ConnectionManager {
    pub(crate) fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn get() -> &'static Self {
        &CONNECTION_MANAGER
    }

    /// 同一用户的多个连接共享一个发送器
    pub fn register(&self, user_id: i64) -> broadcast::Receiver<WsMessage> {
        self.connections
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 最后一个订阅者离开后移除发送器
    pub fn unregister(&self, user_id: i64) {
        self.connections
            .remove_if(&user_id, |_, sender| sender.receiver_count() == 0);
    }

    /// 用户不在线时返回 false
    pub fn send_to_user(&self, user_id: i64, message: WsMessage) -> bool {
        self.connections
            .get(&user_id)
            .is_some_and(|sender| sender.send(message).is_ok())
    }

    pub fn push_notification(&self, notification: Notification) -> bool {
        let user_id = notification.user_id;
        self.send_to_user(
            user_id,
            WsMessage::Notification {
                payload: notification,
            },
        )
    }

    pub fn online_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.receiver_count() > 0)
            .count()
    }

    pub fn is_online(&self, user_id: i64) -> bool {
        self.connections
            .get(&user_id)
            .is_some_and(|s| s.receiver_count() > 0)
    }
}

pub struct WebSocketService;

impl WebSocketService {
    /// 连接主循环：转发推送、应答心跳，直到任一方关闭
    pub async fn handle_connection(
        user_id: i64,
        mut session: actix_ws::Session,
        mut stream: actix_ws::MessageStream,
    ) {
        info!("WebSocket connected for user: {}", user_id);
        let manager = ConnectionManager::get();
        let mut rx = manager.register(user_id);

        if send_json(&mut session, &WsMessage::Connected { user_id })
            .await
            .is_err()
        {
            drop(rx);
            manager.unregister(user_id);
            return;
        }

        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(ClientMessage::Ping) => {
                                    if send_json(&mut session, &WsMessage::Pong).await.is_err() {
                                        break;
                                    }
                                }
                                Ok(ClientMessage::Pong) => {}
                                Err(e) => {
                                    debug!("Unrecognized message from user {}: {}", user_id, e);
                                    let error = WsMessage::Error { message: "无法识别的消息".to_string() };
                                    if send_json(&mut session, &error).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if session.pong(&data).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            warn!("WebSocket error for user {}: {:?}", user_id, e);
                            break;
                        }
                        _ => {}
                    }
                }

                msg = rx.recv() => {
                    match msg {
                        Ok(ws_msg) => {
                            if send_json(&mut session, &ws_msg).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("WebSocket for user {} lagged by {} messages", user_id, n);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }

                _ = heartbeat.tick() => {
                    if session.ping(b"").await.is_err() {
                        break;
                    }
                }
            }
        }

        drop(rx);
        manager.unregister(user_id);
        let _ = session.close(None).await;
        info!("WebSocket disconnected for user: {}", user_id);
    }
}

async fn send_json(
    session: &mut actix_ws::Session,
    message: &WsMessage,
) -> Result<(), actix_ws::Closed> {
    match serde_json::to_string(message) {
        Ok(json) => session.text(json).await,
        Err(e) => {
            warn!("Failed to serialize websocket message: {}", e);
            Ok(())
        }
    }
}

/// 推送考勤变化给会议主持人
pub fn push_attendance_update(host_id: i64, payload: AttendanceUpdatePayload) {
    ConnectionManager::get().send_to_user(host_id, WsMessage::AttendanceUpdate { payload });
}

/// 推送表情采样给会议主持人
pub fn push_emotion_update(host_id: i64, payload: EmotionUpdatePayload) {
    ConnectionManager::get().send_to_user(host_id, WsMessage::EmotionUpdate { payload });
}

pub fn get_online_count() -> usize {
    ConnectionManager::get().online_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_send_and_unregister() {
        let manager = ConnectionManager::new();
        assert!(!manager.send_to_user(1, WsMessage::Ping));

        let mut rx = manager.register(1);
        assert!(manager.is_online(1));
        assert_eq!(manager.online_count(), 1);
        assert!(manager.send_to_user(1, WsMessage::Pong));
        assert!(matches!(rx.recv().await, Ok(WsMessage::Pong)));

        // 仍有订阅者时不移除
        manager.unregister(1);
        assert!(manager.is_online(1));

        drop(rx);
        manager.unregister(1);
        assert!(!manager.is_online(1));
        assert_eq!(manager.online_count(), 0);
    }

    #[test]
    fn test_message_tagging() {
        let json = serde_json::to_value(WsMessage::Connected { user_id: 9 }).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["user_id"], 9);

        let json = serde_json::to_value(WsMessage::Error {
            message: "x".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");

        assert!(matches!(
            serde_json::from_str::<ClientMessage>(r#"{"type":"ping"}"#),
            Ok(ClientMessage::Ping)
        ));
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"notification"}"#).is_err());
    }
}
