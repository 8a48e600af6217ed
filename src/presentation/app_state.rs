// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::studio_service::StudioService;
use crate::application::user_service::UserService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub dashboard_service: DashboardService,
    pub studio_service: StudioService,
}
