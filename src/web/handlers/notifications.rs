use salvo::prelude::*;
use serde_json::json;

use crate::web::web_state;

use super::{current_user, render_chat_error, render_error};

#[handler]
pub async fn list_notifications(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let limit = req.query::<i64>("limit").unwrap_or(50);

    match web_state()
        .chat
        .list_notifications(&user.user_id, limit)
        .await
    {
        Ok(notifications) => {
            let unread = notifications.iter().filter(|n| !n.read).count();
            res.render(Json(json!({
                "success": true,
                "notifications": notifications,
                "unread": unread,
            })));
        }
        Err(err) => render_chat_error(res, &err),
    }
}

#[handler]
pub async fn mark_notification_read(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some(notification_id) = req.param::<String>("notification_id") else {
        render_error(res, StatusCode::BAD_REQUEST, "missing notification id");
        return;
    };

    match web_state()
        .chat
        .mark_notification_read(&notification_id, &user.user_id)
        .await
    {
        Ok(true) => res.render(Json(json!({ "success": true }))),
        Ok(false) => render_error(res, StatusCode::NOT_FOUND, "notification not found"),
        Err(err) => render_chat_error(res, &err),
    }
}
