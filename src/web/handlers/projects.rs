use salvo::prelude::*;
use serde_json::json;

use crate::chain::{attestation_digest, AttestationKind};
use crate::web::metrics::Metrics;
use crate::web::web_state;

use super::{current_user, render_error};

#[handler]
pub async fn list_projects(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(_user) = current_user(depot, res) else {
        return;
    };
    let limit = req.query::<i64>("limit").unwrap_or(100).clamp(1, 1000);
    let offset = req.query::<i64>("offset").unwrap_or(0).max(0);

    match web_state()
        .db
        .project_store()
        .list_projects(limit, offset)
        .await
    {
        Ok(projects) => {
            res.render(Json(json!({
                "success": true,
                "projects": projects,
                "count": projects.len(),
                "limit": limit,
                "offset": offset,
            })));
        }
        Err(err) => {
            Metrics::api_error();
            tracing::error!(error = %err, "project listing failed");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    }
}

/// The digest a project record would anchor into the on-chain registry,
/// plus the registry contract address when one is configured.
#[handler]
pub async fn project_attestation(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(_user) = current_user(depot, res) else {
        return;
    };
    let Some(project_id) = req.param::<String>("project_id") else {
        render_error(res, StatusCode::BAD_REQUEST, "missing project id");
        return;
    };

    let project = match web_state().db.project_store().get_project(&project_id).await {
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

    let payload = json!({
        "name": project.name,
        "symbol": project.token_symbol,
        "owner": project.owner_id,
        "sector": project.sector,
        "stage": project.stage,
        "audited": project.audited,
        "kycVerified": project.kyc_verified,
    });
    let digest = attestation_digest(AttestationKind::ProjectRegistry, &project_id, &payload);

    res.render(Json(json!({
        "success": true,
        "projectId": project_id,
        "digest": digest,
        "contractAddress": web_state()
            .chain
            .contract_address(AttestationKind::ProjectRegistry),
    })));
}
