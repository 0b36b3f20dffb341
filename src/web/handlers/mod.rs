use salvo::prelude::*;
use serde_json::json;
use tracing::error;

use crate::chat::ChatError;
use crate::web::auth::AuthedUser;
use crate::web::metrics::Metrics;
use crate::web::middleware::auth::authed_user;

pub mod admin;
pub mod ai;
pub mod events;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod pitch;
pub mod projects;
pub mod rooms;

pub(crate) fn render_error(res: &mut Response, status: StatusCode, message: &str) {
    res.status_code(status);
    res.render(Json(json!({ "success": false, "error": message })));
}

/// Maps the chat error taxonomy onto HTTP statuses. Database details go to
/// the log, never into the response body.
pub(crate) fn render_chat_error(res: &mut Response, err: &ChatError) {
    Metrics::api_error();

    match err {
        ChatError::InvalidInput(_) => {
            render_error(res, StatusCode::BAD_REQUEST, &err.to_string())
        }
        ChatError::RoomNotFound(_)
        | ChatError::MessageNotFound(_)
        | ChatError::ProjectNotFound(_) => {
            render_error(res, StatusCode::NOT_FOUND, &err.to_string())
        }
        ChatError::NotAMember { .. } | ChatError::Forbidden(_) => {
            render_error(res, StatusCode::FORBIDDEN, &err.to_string())
        }
        ChatError::Database(db_err) => {
            error!(error = %db_err, "database error while serving request");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    }
}

/// Identity installed by the auth middleware. Its absence means the route
/// was wired outside the protected subtree, which is a server bug.
pub(crate) fn current_user(depot: &Depot, res: &mut Response) -> Option<AuthedUser> {
    let user = authed_user(depot);
    if user.is_none() {
        Metrics::api_error();
        render_error(
            res,
            StatusCode::INTERNAL_SERVER_ERROR,
            "request reached a protected handler without authentication",
        );
    }
    user
}

pub(crate) fn require_role(user: &AuthedUser, role: &str, res: &mut Response) -> bool {
    if user.role == role || user.is_admin() {
        true
    } else {
        Metrics::api_error();
        render_error(
            res,
            StatusCode::FORBIDDEN,
            &format!("this operation requires the {role} role"),
        );
        false
    }
}
