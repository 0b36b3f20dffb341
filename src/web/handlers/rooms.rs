use salvo::prelude::*;
use serde::Deserialize;
use serde_json::json;

use crate::db::RoomStatus;
use crate::web::metrics::Metrics;
use crate::web::web_state;

use super::{current_user, render_chat_error, render_error};

#[handler]
pub async fn list_my_rooms(depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };

    match web_state().chat.get_user_rooms(&user.user_id).await {
        Ok(rooms) => {
            res.render(Json(json!({
                "success": true,
                "rooms": rooms,
                "count": rooms.len(),
            })));
        }
        Err(err) => render_chat_error(res, &err),
    }
}

#[handler]
pub async fn get_room(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some(room_id) = req.param::<String>("room_id") else {
        render_error(res, StatusCode::BAD_REQUEST, "missing room id");
        return;
    };

    match web_state()
        .chat
        .get_room_for_user(&room_id, &user.user_id)
        .await
    {
        Ok(room) => {
            res.render(Json(json!({ "success": true, "room": room })));
        }
        Err(err) => render_chat_error(res, &err),
    }
}

#[derive(Debug, Deserialize)]
struct RoomStatusBody {
    status: String,
}

#[handler]
pub async fn set_room_status(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some(room_id) = req.param::<String>("room_id") else {
        render_error(res, StatusCode::BAD_REQUEST, "missing room id");
        return;
    };

    let body: RoomStatusBody = match req.parse_json().await {
        Ok(body) => body,
        Err(err) => {
            Metrics::api_error();
            render_error(
                res,
                StatusCode::BAD_REQUEST,
                &format!("invalid request body: {err}"),
            );
            return;
        }
    };

    let Some(status) = RoomStatus::parse(&body.status) else {
        Metrics::api_error();
        render_error(
            res,
            StatusCode::BAD_REQUEST,
            &format!("unknown room status: {}", body.status),
        );
        return;
    };

    match web_state()
        .chat
        .set_room_status(&room_id, &user.user_id, status)
        .await
    {
        Ok(room) => res.render(Json(json!({ "success": true, "room": room }))),
        Err(err) => render_chat_error(res, &err),
    }
}
