use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

use crate::authz::{AuthzPipeline, Identity, RequestContext, RoutePolicy};

/// Path parameter that names the resource an ownership gate checks.
const RESOURCE_ID_PARAM: &str = "id";

/// The pipeline plus the policy one route was assembled with.
#[derive(Clone)]
pub struct RouteGate {
    pipeline: AuthzPipeline,
    policy: RoutePolicy,
}

impl RouteGate {
    pub fn new(pipeline: AuthzPipeline, policy: RoutePolicy) -> Self {
        Self { pipeline, policy }
    }
}

/// Run the authorization pipeline before the handler. On success the caller's
/// `Identity` is placed in the request extensions.
pub async fn authorize(
    State(gate): State<RouteGate>,
    params: Option<RawPathParams>,
    mut req: Request,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let resource_id = params.as_ref().and_then(|params| {
        params
            .iter()
            .find(|(name, _)| *name == RESOURCE_ID_PARAM)
            .and_then(|(_, value)| value.parse::<i64>().ok())
    });

    let context = RequestContext::new(authorization, resource_id);

    match gate.pipeline.evaluate(context, &gate.policy).await {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx.identity);
            next.run(req).await
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Identity established by [`authorize`] for the current request.
pub struct CurrentIdentity(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(CurrentIdentity)
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "Identity missing from request extensions; route is not gated"
                ))
            })
    }
}
