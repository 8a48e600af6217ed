// HTTP request handlers
use crate::application::dashboard_service::{NewDashboard, Publication};
use crate::domain::user::User;
use crate::infrastructure::http_response::ApiResult;
use crate::presentation::app_state::AppState;
use crate::presentation::routes_info::routes_document;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub user: Option<String>,
}

/// Locates a dashboard, from the path, the query string or a JSON body
#[derive(Debug, Default, Deserialize)]
pub struct DashboardLocator {
    pub user: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StudioQuery {
    pub hub: Option<String>,
    pub language: Option<String>,
}

impl DashboardLocator {
    /// Path segments win over query parameters
    fn merge(path: Option<Path<HashMap<String, String>>>, query: DashboardLocator) -> Self {
        let mut params = path.map(|Path(p)| p).unwrap_or_default();
        Self {
            user: params.remove("user").or(query.user),
            name: params.remove("name").or(query.name),
        }
    }
}

/// Static description of every route
pub async fn routes_info() -> Json<Value> {
    Json(routes_document())
}

/// Editor files published without a user
pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.dashboard_service.list_published().await?))
}

pub async fn add_user(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AddUserRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(request) = body?;
    let user = state.user_service.add_user(request.user.as_deref()).await?;
    Ok(Json(user))
}

pub async fn list_user_dashboards(
    Path(user): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.dashboard_service.list_dashboards(&user).await?))
}

pub async fn add_dashboard(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewDashboard>, JsonRejection>,
) -> ApiResult<Json<Publication>> {
    let Json(request) = body?;
    Ok(Json(state.dashboard_service.add_dashboard(request).await?))
}

pub async fn get_dashboard(
    path: Option<Path<HashMap<String, String>>>,
    Query(query): Query<DashboardLocator>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let locator = DashboardLocator::merge(path, query);
    let dashboard = state
        .dashboard_service
        .get_dashboard(locator.user.as_deref(), locator.name.as_deref())
        .await?;
    Ok(Json(dashboard))
}

pub async fn get_dashboard_url(
    path: Option<Path<HashMap<String, String>>>,
    Query(query): Query<DashboardLocator>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let locator = DashboardLocator::merge(path, query);
    let url = state
        .dashboard_service
        .get_dashboard_url(locator.user.as_deref(), locator.name.as_deref())
        .await?;
    Ok(Json(json!({ "url": url })))
}

pub async fn delete_dashboard(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DashboardLocator>, JsonRejection>,
) -> ApiResult<Json<String>> {
    let Json(locator) = body?;
    let deleted = state
        .dashboard_service
        .delete_dashboard(locator.user.as_deref(), locator.name.as_deref())
        .await?;
    Ok(Json(deleted))
}

pub async fn get_studio_url(
    Query(query): Query<StudioQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<Value> {
    let url = state
        .studio_service
        .studio_url(query.hub.as_deref(), query.language.as_deref());
    Json(json!({ "url": url }))
}
