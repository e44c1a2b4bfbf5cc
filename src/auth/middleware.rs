use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::extractors::AuthenticatedUserId;
use crate::auth::gate::AuthGate;
use crate::error::AppError;

/// Runs the [`AuthGate`] in front of the wrapped service.
///
/// Requires `web::Data<AuthGate>` in the application data. On success the request gets an
/// [`AuthenticatedUserId`] extension; on rejection the wrapped service is never called and
/// the client receives a 401 JSON envelope.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let gate = match req.app_data::<web::Data<AuthGate>>() {
                Some(gate) => gate.clone(),
                None => {
                    let err = AppError::InternalServerError(
                        "AuthGate is not registered as application data".into(),
                    );
                    return Ok(req.error_response(err).map_into_right_body());
                }
            };

            let auth_header = req.headers().get(header::AUTHORIZATION).cloned();

            match gate.authenticate(auth_header.as_ref()).await {
                Ok(authenticated) => {
                    req.extensions_mut()
                        .insert(AuthenticatedUserId(authenticated.user_id));
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(rejection) => {
                    log::debug!("Rejected {} {}: {}", req.method(), req.path(), rejection);
                    Ok(req
                        .error_response(AppError::from(rejection))
                        .map_into_right_body())
                }
            }
        })
    }
}
