// Domain layer - Users, dashboards and their naming conventions
pub mod dashboard;
pub mod user;
