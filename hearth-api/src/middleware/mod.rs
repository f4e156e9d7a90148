/// Middleware modules for the API server
///
/// Request tracing and CORS come from tower-http and are configured in
/// `app::build_router`; only the security headers layer lives here.

pub mod security;
