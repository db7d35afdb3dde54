use axum::{
    middleware,
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use crate::{
    config::SecuritySettings,
    db::Db,
    handlers::{auth_handler, health_handler, member_handler, plan_handler, transfer_handler},
    middleware::auth::auth_middleware,
};
use gym_share::{JwtSettings, RedisClient};

/// 路由信息结构
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub auth_required: bool,
}

const fn route(method: &'static str, path: &'static str, auth_required: bool) -> RouteInfo {
    RouteInfo { method, path, auth_required }
}

/// 获取所有路由信息
pub fn get_all_routes() -> Vec<RouteInfo> {
    vec![
        // 公开路由（不需要认证）
        route("POST", "/api/auth/signup", false),
        route("POST", "/api/auth/login", false),
        route("GET", "/api/health", false),
        route("GET", "/api/health/ping", false),
        // 受保护的路由（需要认证）
        route("GET", "/api/auth/profile", true),
        route("PUT", "/api/auth/profile", true),
        route("PUT", "/api/auth/password", true),
        route("GET", "/api/plans", true),
        route("POST", "/api/plans", true),
        route("GET", "/api/plans/{id}", true),
        route("PUT", "/api/plans/{id}", true),
        route("DELETE", "/api/plans/{id}", true),
        route("GET", "/api/members", true),
        route("POST", "/api/members", true),
        route("PUT", "/api/members/{id}", true),
        route("DELETE", "/api/members/{id}", true),
        route("GET", "/api/members/expiring", true),
        route("PUT", "/api/members/{id}/renew", true),
        route("GET", "/api/members/export", true),
        route("POST", "/api/members/import", true),
    ]
}

/// 打印所有路由信息
pub fn print_routes() {
    let routes = get_all_routes();

    println!("\n╔══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                           Registered Routes                                   ║");
    println!("╠══════════════════════════════════════════════════════════════════════════════╣");

    // 按是否需要认证分组打印
    let public_routes: Vec<_> = routes.iter().filter(|r| !r.auth_required).collect();
    let protected_routes: Vec<_> = routes.iter().filter(|r| r.auth_required).collect();

    if !public_routes.is_empty() {
        println!("║ Public Routes (No Authentication Required):                                ║");
        println!("╠══════════════════════════════════════════════════════════════════════════════╣");
        for route in &public_routes {
            println!("║ {:<8} {:<65} ║", route.method, route.path);
        }
        println!("╠══════════════════════════════════════════════════════════════════════════════╣");
    }

    if !protected_routes.is_empty() {
        println!("║ Protected Routes (Authentication Required):                                 ║");
        println!("╠══════════════════════════════════════════════════════════════════════════════╣");
        for route in &protected_routes {
            println!("║ {:<8} {:<65} ║", route.method, route.path);
        }
    }

    println!("╠══════════════════════════════════════════════════════════════════════════════╣");
    let total_text = format!("Total: {} routes ({} public, {} protected)",
                            routes.len(),
                            public_routes.len(),
                            protected_routes.len());
    println!("║ {:<76} ║", total_text);
    println!("╚══════════════════════════════════════════════════════════════════════════════╝\n");
}

pub fn create_public_routes(
    repo: Db,
    jwt_cfg: JwtSettings,
    security: SecuritySettings,
) -> Router {
    Router::new()
        .route("/auth/signup", post(auth_handler::signup))
        .route("/auth/login", post(auth_handler::login))
        .route("/health", get(health_handler::health))
        .route("/health/ping", get(health_handler::ping))
        .layer(Extension(repo))
        .layer(Extension(jwt_cfg))
        .layer(Extension(security))
}

pub fn create_protected_routes(
    repo: Db,
    jwt_cfg: JwtSettings,
    security: SecuritySettings,
    redis_client: Option<Arc<RedisClient>>,
) -> Router {
    let router = Router::new()
        // 账户
        .route("/auth/profile", get(auth_handler::get_profile).put(auth_handler::update_profile))
        .route("/auth/password", put(auth_handler::change_password))
        // 套餐
        .route("/plans", get(plan_handler::list_plans).post(plan_handler::create_plan))
        .route(
            "/plans/{id}",
            get(plan_handler::get_plan)
                .put(plan_handler::update_plan)
                .delete(plan_handler::delete_plan),
        )
        // 会员
        .route("/members", get(member_handler::list_members).post(member_handler::create_member))
        .route("/members/expiring", get(member_handler::list_expiring))
        .route("/members/export", get(transfer_handler::export_members))
        .route("/members/import", post(transfer_handler::import_members))
        .route(
            "/members/{id}",
            put(member_handler::update_member).delete(member_handler::delete_member),
        )
        .route("/members/{id}/renew", put(member_handler::renew_member))
        .layer(middleware::from_fn(auth_middleware))
        .layer(Extension(repo))
        .layer(Extension(jwt_cfg))
        .layer(Extension(security));

    // Redis 可选，未启用时中间件直接查库
    match redis_client {
        Some(redis) => router.layer(Extension(redis)),
        None => router,
    }
}

/// 组装应用，先合并路由再添加 /api 前缀
pub fn create_app(
    repo: Db,
    jwt_cfg: JwtSettings,
    security: SecuritySettings,
    redis_client: Option<Arc<RedisClient>>,
) -> Router {
    let public_routes = create_public_routes(repo.clone(), jwt_cfg.clone(), security.clone());
    let protected_routes = create_protected_routes(repo, jwt_cfg, security, redis_client);

    Router::new().nest("/api", public_routes.merge(protected_routes))
}
