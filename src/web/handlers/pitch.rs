use salvo::prelude::*;
use serde::Deserialize;
use serde_json::json;

use crate::chat::AcceptPitch;
use crate::db::RoomKind;
use crate::web::auth::{ROLE_AGENCY, ROLE_IDO};
use crate::web::metrics::Metrics;
use crate::web::web_state;

use super::{current_user, render_chat_error, render_error, require_role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptPitchBody {
    project_id: String,
}

#[handler]
pub async fn accept_pitch_agency(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    accept(req, depot, res, RoomKind::Campaign, ROLE_AGENCY).await;
}

#[handler]
pub async fn accept_pitch_ido(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    accept(req, depot, res, RoomKind::Ido, ROLE_IDO).await;
}

async fn accept(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    kind: RoomKind,
    required_role: &str,
) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    if !require_role(&user, required_role, res) {
        return;
    }

    let body: AcceptPitchBody = match req.parse_json().await {
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

    if body.project_id.is_empty() {
        Metrics::api_error();
        render_error(res, StatusCode::BAD_REQUEST, "projectId cannot be empty");
        return;
    }

    match web_state()
        .chat
        .accept_pitch(AcceptPitch {
            project_id: body.project_id,
            counterpart_id: user.user_id,
            kind,
        })
        .await
    {
        Ok(outcome) => {
            if outcome.is_new {
                Metrics::room_created();
            }
            res.render(Json(json!({
                "success": true,
                "chatId": outcome.room_id,
                "isNew": outcome.is_new,
            })));
        }
        Err(err) => render_chat_error(res, &err),
    }
}
