use salvo::prelude::*;
use serde::Deserialize;
use serde_json::json;

use crate::ai::{commands, VcCommand};
use crate::web::metrics::Metrics;
use crate::web::web_state;

use super::{current_user, render_error};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VcCommandBody {
    command: String,
    project_id: String,
}

#[handler]
pub async fn vc_command(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(_user) = current_user(depot, res) else {
        return;
    };

    let body: VcCommandBody = match req.parse_json().await {
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

    let command = match VcCommand::parse(&body.command) {
        Ok(command) => command,
        Err(err) => {
            Metrics::api_error();
            render_error(res, StatusCode::BAD_REQUEST, &err.to_string());
            return;
        }
    };

    let project = match web_state()
        .db
        .project_store()
        .get_project(&body.project_id)
        .await
    {
        Ok(Some(project)) => project,
        Ok(None) => {
            Metrics::api_error();
            render_error(res, StatusCode::NOT_FOUND, "project not found");
            return;
        }
        Err(err) => {
            Metrics::api_error();
            tracing::error!(error = %err, "project lookup failed");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "internal error");
            return;
        }
    };

    let markdown = commands::render(command, &project);
    Metrics::ai_command_served();

    res.render(Json(json!({
        "success": true,
        "command": command.as_str(),
        "markdown": markdown,
    })));
}
