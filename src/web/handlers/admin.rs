use chrono::Utc;
use salvo::prelude::*;
use serde::Deserialize;
use serde_json::json;

use crate::ai::AiError;
use crate::blog::BlogError;
use crate::db::Project;
use crate::web::auth::ROLE_ADMIN;
use crate::web::metrics::Metrics;
use crate::web::web_state;

use super::{current_user, render_error, require_role};

fn demo_projects(now: chrono::DateTime<Utc>) -> Vec<Project> {
    vec![
        Project {
            id: 0,
            project_id: "demo-nebula".to_string(),
            owner_id: "demo-founder-1".to_string(),
            name: "Nebula Protocol".to_string(),
            token_symbol: "NEB".to_string(),
            sector: "DeFi".to_string(),
            stage: "seed".to_string(),
            description: "Cross-chain liquidity aggregation with audited vault contracts \
                          and transparent fee routing."
                .to_string(),
            website: Some("https://nebula.example".to_string()),
            whitepaper_url: Some("https://nebula.example/whitepaper.pdf".to_string()),
            audited: true,
            kyc_verified: true,
            team_public: true,
            target_raise_usd: 2_000_000,
            created_at: now,
        },
        Project {
            id: 0,
            project_id: "demo-voltmesh".to_string(),
            owner_id: "demo-founder-2".to_string(),
            name: "VoltMesh".to_string(),
            token_symbol: "VOLT".to_string(),
            sector: "DePIN".to_string(),
            stage: "private".to_string(),
            description: "Decentralized energy metering network for rooftop solar \
                          micro-producers."
                .to_string(),
            website: Some("https://voltmesh.example".to_string()),
            whitepaper_url: None,
            audited: false,
            kyc_verified: true,
            team_public: true,
            target_raise_usd: 5_000_000,
            created_at: now,
        },
        Project {
            id: 0,
            project_id: "demo-moonpup".to_string(),
            owner_id: "demo-founder-3".to_string(),
            name: "MoonPup".to_string(),
            token_symbol: "MPUP".to_string(),
            sector: "Meme".to_string(),
            stage: "ido".to_string(),
            description: "To the moon.".to_string(),
            website: None,
            whitepaper_url: None,
            audited: false,
            kyc_verified: false,
            team_public: false,
            target_raise_usd: 90_000_000,
            created_at: now,
        },
    ]
}

#[handler]
pub async fn create_demo_projects(depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    if !require_role(&user, ROLE_ADMIN, res) {
        return;
    }

    let mut created = Vec::new();
    let mut skipped = Vec::new();

    for project in demo_projects(Utc::now()) {
        match web_state()
            .db
            .project_store()
            .create_project_if_absent(&project)
            .await
        {
            Ok(true) => created.push(project.project_id),
            Ok(false) => skipped.push(project.project_id),
            Err(err) => {
                Metrics::api_error();
                tracing::error!(error = %err, project_id = %project.project_id, "demo project insert failed");
                render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "internal error");
                return;
            }
        }
    }

    res.render(Json(json!({
        "success": true,
        "created": created,
        "skipped": skipped,
    })));
}

#[derive(Debug, Deserialize)]
struct ComposeBlogBody {
    topic: String,
    #[serde(default)]
    publish: bool,
}

#[handler]
pub async fn compose_blog(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    if !require_role(&user, ROLE_ADMIN, res) {
        return;
    }

    let body: ComposeBlogBody = match req.parse_json().await {
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

    if body.topic.trim().is_empty() {
        Metrics::api_error();
        render_error(res, StatusCode::BAD_REQUEST, "topic cannot be empty");
        return;
    }

    let post = match web_state().blog.compose(&body.topic).await {
        Ok(post) => post,
        Err(err) => {
            render_blog_error(res, &err);
            return;
        }
    };

    let published = if body.publish {
        match web_state().blog.publish(&post).await {
            Ok(()) => true,
            Err(err) => {
                render_blog_error(res, &err);
                return;
            }
        }
    } else {
        false
    };

    res.render(Json(json!({
        "success": true,
        "post": post,
        "published": published,
    })));
}

fn render_blog_error(res: &mut Response, err: &BlogError) {
    Metrics::api_error();
    match err {
        BlogError::Ai(AiError::Disabled) | BlogError::PublisherDisabled => {
            render_error(res, StatusCode::SERVICE_UNAVAILABLE, &err.to_string());
        }
        BlogError::MalformedDraft(_) | BlogError::Ai(AiError::MalformedResponse(_)) => {
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
        }
        other => {
            tracing::error!(error = %other, "blog pipeline error");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    }
}
