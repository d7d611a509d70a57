use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::MeetingService;
use crate::models::ApiResponse;
use crate::models::meetings::requests::{MeetingListParams, MeetingListQuery, MeetingScope};
use crate::models::users::entities::{User, UserRole};
use crate::services::current_user;

/// 管理员看全部，教师看自己主持的，学生看受邀的
pub(crate) fn scope_for(user: &User) -> MeetingScope {
    match user.role {
        UserRole::Admin => MeetingScope::All,
        UserRole::Teacher => MeetingScope::HostedBy(user.id),
        UserRole::Student => MeetingScope::InvitedUser(user.id),
    }
}

pub async fn list_meetings(
    service: &MeetingService,
    request: &HttpRequest,
    params: MeetingListParams,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));
    let (page, size) = params.pagination.normalized();

    let query = MeetingListQuery {
        page,
        size,
        scope: scope_for(&user),
        status: params.status,
    };

    match storage.list_meetings_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功"))),
        Err(e) => Ok(e.to_http_response()),
    }
}
