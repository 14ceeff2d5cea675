//! API Key 认证中间件
//!
//! 通过 Header 中的 Authorization: Bearer <token> 进行认证。
//! 未配置 Key 时放行所有请求；健康检查接口（完整路径匹配）始终放行。

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
    body::EitherBody,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::models::ApiResponse;

/// 不需要认证的路径（完整匹配）
const PUBLIC_PATHS: &[&str] = &["/api/v1/health"];

/// API Key 中间件
pub struct ApiKeyMiddleware {
    api_key: Option<Rc<str>>,
}

impl ApiKeyMiddleware {
    /// 空字符串表示关闭认证
    pub fn new(api_key: &str) -> Self {
        let api_key = api_key.trim();
        Self {
            api_key: (!api_key.is_empty()).then(|| Rc::from(api_key)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ApiKeyMiddlewareService {
            service: Rc::new(service),
            api_key: self.api_key.clone(),
        })
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: Rc<S>,
    api_key: Option<Rc<str>>,
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let authorized = match self.api_key.as_deref() {
            None => true,
            Some(_) if PUBLIC_PATHS.iter().any(|p| *p == req.path()) => true,
            Some(expected) => bearer_token(&req) == Some(expected),
        };

        Box::pin(async move {
            if authorized {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            log::warn!("拒绝未认证请求: {} {}", req.method(), req.path());
            let response = HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("无效的 Bearer Token".to_string()));
            Ok(req.into_response(response).map_into_right_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App};

    async fn ok_handler() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_requires_bearer_token() {
        let app = test::init_service(
            App::new()
                .wrap(ApiKeyMiddleware::new("secret"))
                .route("/api/v1/health", web::get().to(ok_handler))
                .route("/api/v1/analysis/{symbol}", web::get().to(ok_handler)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/analysis/AAPL").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/v1/analysis/AAPL")
            .insert_header(("Authorization", "Bearer wrong"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/v1/analysis/AAPL")
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_symbol_named_health_still_requires_token() {
        let app = test::init_service(
            App::new()
                .wrap(ApiKeyMiddleware::new("secret"))
                .route("/api/v1/health", web::get().to(ok_handler))
                .route("/api/v1/analysis/{symbol}", web::get().to(ok_handler))
                .route("/api/v1/stocks/{symbol}/history", web::get().to(ok_handler)),
        )
        .await;

        for uri in ["/api/v1/analysis/health", "/api/v1/stocks/health/history", "/api/v1/health/"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let status = test::call_service(&app, req).await.status();
            println!("  {} -> {}", uri, status);
            assert_ne!(status, StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/api/v1/analysis/health")
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_empty_key_disables_auth() {
        let app = test::init_service(
            App::new()
                .wrap(ApiKeyMiddleware::new("  "))
                .route("/api/v1/analysis/AAPL", web::get().to(ok_handler)),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/v1/analysis/AAPL").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
