use salvo::prelude::*;
use serde::Deserialize;
use serde_json::json;

use crate::chat::messages::MessageDraft;
use crate::db::MessageKind;
use crate::web::metrics::Metrics;
use crate::web::web_state;

use super::{current_user, render_chat_error, render_error};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageBody {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    attachments: Vec<String>,
    #[serde(default)]
    reply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReactionBody {
    emoji: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditMessageBody {
    body: String,
}

fn room_and_message(req: &Request, res: &mut Response) -> Option<(String, String)> {
    let room_id = req.param::<String>("room_id");
    let message_id = req.param::<String>("message_id");
    match (room_id, message_id) {
        (Some(room_id), Some(message_id)) => Some((room_id, message_id)),
        _ => {
            render_error(res, StatusCode::BAD_REQUEST, "missing room or message id");
            None
        }
    }
}

#[handler]
pub async fn list_messages(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some(room_id) = req.param::<String>("room_id") else {
        render_error(res, StatusCode::BAD_REQUEST, "missing room id");
        return;
    };
    let limit = req.query::<i64>("limit");

    match web_state()
        .chat
        .list_messages(&room_id, &user.user_id, limit)
        .await
    {
        Ok(messages) => {
            res.render(Json(json!({
                "success": true,
                "messages": messages,
                "count": messages.len(),
            })));
        }
        Err(err) => render_chat_error(res, &err),
    }
}

#[handler]
pub async fn send_message(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some(room_id) = req.param::<String>("room_id") else {
        render_error(res, StatusCode::BAD_REQUEST, "missing room id");
        return;
    };

    let body: SendMessageBody = match req.parse_json().await {
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

    let kind = match body.kind.as_deref() {
        None => MessageKind::Text,
        Some(raw) => match MessageKind::parse(raw) {
            // Clients cannot author system or AI messages.
            Some(MessageKind::System) | Some(MessageKind::AiReply) | None => {
                Metrics::api_error();
                render_error(
                    res,
                    StatusCode::BAD_REQUEST,
                    &format!("unsupported message kind: {raw}"),
                );
                return;
            }
            Some(kind) => kind,
        },
    };

    let draft = MessageDraft {
        kind,
        body: body.body,
        attachments: body.attachments,
        reply_to: body.reply_to,
    };

    match web_state()
        .chat
        .send_message(&room_id, &user.user_id, draft)
        .await
    {
        Ok(message) => {
            Metrics::message_sent();
            res.status_code(StatusCode::CREATED);
            res.render(Json(json!({ "success": true, "message": message })));
        }
        Err(err) => render_chat_error(res, &err),
    }
}

#[handler]
pub async fn toggle_reaction(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some((room_id, message_id)) = room_and_message(req, res) else {
        return;
    };

    let body: ReactionBody = match req.parse_json().await {
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

    match web_state()
        .chat
        .toggle_reaction(&room_id, &message_id, &user.user_id, &body.emoji)
        .await
    {
        Ok((message, change)) => {
            Metrics::reaction_toggled();
            res.render(Json(json!({
                "success": true,
                "change": format!("{change:?}").to_lowercase(),
                "message": message,
            })));
        }
        Err(err) => render_chat_error(res, &err),
    }
}

#[handler]
pub async fn mark_message_read(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some((room_id, message_id)) = room_and_message(req, res) else {
        return;
    };

    match web_state()
        .chat
        .mark_message_read(&room_id, &message_id, &user.user_id)
        .await
    {
        Ok(()) => res.render(Json(json!({ "success": true }))),
        Err(err) => render_chat_error(res, &err),
    }
}

#[handler]
pub async fn edit_message(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some((room_id, message_id)) = room_and_message(req, res) else {
        return;
    };

    let body: EditMessageBody = match req.parse_json().await {
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

    match web_state()
        .chat
        .edit_message(&room_id, &message_id, &user.user_id, body.body)
        .await
    {
        Ok(message) => res.render(Json(json!({ "success": true, "message": message }))),
        Err(err) => render_chat_error(res, &err),
    }
}

#[handler]
pub async fn toggle_pin(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some((room_id, message_id)) = room_and_message(req, res) else {
        return;
    };

    match web_state()
        .chat
        .toggle_pin(&room_id, &message_id, &user.user_id)
        .await
    {
        Ok(message) => res.render(Json(json!({ "success": true, "message": message }))),
        Err(err) => render_chat_error(res, &err),
    }
}

#[handler]
pub async fn delete_message(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some((room_id, message_id)) = room_and_message(req, res) else {
        return;
    };

    match web_state()
        .chat
        .delete_message(&room_id, &message_id, &user.user_id)
        .await
    {
        Ok(()) => res.render(Json(json!({ "success": true }))),
        Err(err) => render_chat_error(res, &err),
    }
}
