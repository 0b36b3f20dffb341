use chrono::Utc;
use salvo::http::header::AUTHORIZATION;
use salvo::prelude::*;

use crate::web::auth::{bearer_token, AuthedUser};
use crate::web::handlers::render_error;
use crate::web::metrics::Metrics;
use crate::web::web_state;

const AUTH_USER_KEY: &str = "auth_user";

/// Rejects requests without a valid signed bearer token and stashes the
/// caller's identity in the depot for the handlers behind it.
#[handler]
pub async fn require_auth(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    let Some(token) = token else {
        unauthorized(res, ctrl, "missing bearer token");
        return;
    };

    match web_state().verifier.verify(token, Utc::now()) {
        Ok(claims) => {
            depot.insert(
                AUTH_USER_KEY,
                AuthedUser {
                    user_id: claims.sub,
                    role: claims.role,
                },
            );
        }
        Err(err) => unauthorized(res, ctrl, &err.to_string()),
    }
}

fn unauthorized(res: &mut Response, ctrl: &mut FlowCtrl, message: &str) {
    Metrics::api_error();
    render_error(res, StatusCode::UNAUTHORIZED, message);
    ctrl.skip_rest();
}

pub fn authed_user(depot: &Depot) -> Option<AuthedUser> {
    depot.get::<AuthedUser>(AUTH_USER_KEY).ok().cloned()
}
