use salvo::prelude::*;
use serde_json::json;

use crate::web::metrics;
use crate::web::web_state;

#[handler]
pub async fn health_check(res: &mut Response) {
    res.render(Json(json!({ "status": "ok" })));
}

#[handler]
pub async fn get_status(res: &mut Response) {
    let state = web_state();

    let room_count = match state.db.room_store().count_rooms().await {
        Ok(count) => Some(count),
        Err(_) => None,
    };

    res.render(Json(json!({
        "status": "ok",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "database": format!("{:?}", state.db.db_type()).to_lowercase(),
        "rooms": room_count,
        "watched_rooms": state.chat.hub().active_rooms(),
    })));
}

#[handler]
pub async fn metrics_endpoint(res: &mut Response) {
    let state = web_state();
    let body = metrics::format_prometheus(
        state.started_at.elapsed().as_secs(),
        state.chat.hub().active_rooms(),
    );

    res.headers_mut().insert(
        "Content-Type",
        "text/plain; charset=utf-8".parse().expect("static header"),
    );
    res.body(body);
}
