use std::time::Instant;

use metrics::{counter, histogram};
use tonic::{Request, Response, Status};
use tracing::{debug, warn};

use super::config::RateLimiter;
use crate::auth::Auth;
use crate::error::AuthError;
use crate::proto::auth_server::Auth as AuthRpc;
use crate::proto::{
    IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse, RegisterRequest,
    RegisterResponse,
};

/// gRPC transport adapter binding the `sso.Auth` service to an [`Auth`]
/// capability.
///
/// The adapter is stateless: it validates required request fields, delegates
/// to the capability, and translates the sentinel domain errors to gRPC
/// status codes. Any unrecognized backend failure collapses to an opaque
/// `Internal` status so callers never see internal detail.
pub struct AuthGrpc<A: Auth> {
    auth: A,
    rate_limiter: RateLimiter,
}

impl<A: Auth> AuthGrpc<A> {
    /// Creates a new transport adapter over the given capability.
    pub fn new(auth: A, rate_limiter: RateLimiter) -> Self {
        Self { auth, rate_limiter }
    }

    #[allow(clippy::result_large_err)]
    fn validate_login(req: &LoginRequest) -> Result<(), Status> {
        if req.email.is_empty() {
            return Err(Status::invalid_argument("email is required"));
        }

        if req.password.is_empty() {
            return Err(Status::invalid_argument("password is required"));
        }

        if req.app_id == 0 {
            return Err(Status::invalid_argument("app_id is required"));
        }

        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_register(req: &RegisterRequest) -> Result<(), Status> {
        if req.email.is_empty() {
            return Err(Status::invalid_argument("email is required"));
        }

        if req.password.is_empty() {
            return Err(Status::invalid_argument("password is required"));
        }

        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_is_admin(req: &IsAdminRequest) -> Result<(), Status> {
        if req.user_id == 0 {
            return Err(Status::invalid_argument("user_id is required"));
        }

        Ok(())
    }
}

#[tonic::async_trait]
impl<A: Auth> AuthRpc for AuthGrpc<A> {
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let start = Instant::now();
        counter!("sso.login.requests").increment(1);

        self.rate_limiter.check_rate_limit().await?;

        let req = request.into_inner();
        Self::validate_login(&req)?;

        let result = self.auth.login(&req.email, &req.password, req.app_id).await;

        histogram!("sso.login.duration").record(start.elapsed().as_secs_f64());

        match result {
            Ok(token) => {
                counter!("sso.login.success").increment(1);
                Ok(Response::new(LoginResponse { token }))
            }
            Err(AuthError::InvalidCredentials) => {
                counter!("sso.login.failure").increment(1);
                debug!("login rejected: invalid credentials");
                Err(Status::invalid_argument("invalid credentials"))
            }
            Err(err) => {
                counter!("sso.login.failure").increment(1);
                warn!(error = %err, "login failed");
                Err(Status::internal("internal error"))
            }
        }
    }

    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let start = Instant::now();
        counter!("sso.register.requests").increment(1);

        self.rate_limiter.check_rate_limit().await?;

        let req = request.into_inner();
        Self::validate_register(&req)?;

        let result = self.auth.register_new_user(&req.email, &req.password).await;

        histogram!("sso.register.duration").record(start.elapsed().as_secs_f64());

        match result {
            Ok(user_id) => {
                counter!("sso.register.success").increment(1);
                Ok(Response::new(RegisterResponse { user_id }))
            }
            Err(AuthError::UserExists) => {
                counter!("sso.register.failure").increment(1);
                debug!("registration rejected: user already exists");
                Err(Status::already_exists("user already exists"))
            }
            Err(err) => {
                counter!("sso.register.failure").increment(1);
                warn!(error = %err, "registration failed");
                Err(Status::internal("internal error"))
            }
        }
    }

    async fn is_admin(
        &self,
        request: Request<IsAdminRequest>,
    ) -> Result<Response<IsAdminResponse>, Status> {
        let start = Instant::now();
        counter!("sso.is_admin.requests").increment(1);

        self.rate_limiter.check_rate_limit().await?;

        let req = request.into_inner();
        Self::validate_is_admin(&req)?;

        let result = self.auth.is_admin(req.user_id).await;

        histogram!("sso.is_admin.duration").record(start.elapsed().as_secs_f64());

        match result {
            Ok(is_admin) => {
                counter!("sso.is_admin.success").increment(1);
                Ok(Response::new(IsAdminResponse { is_admin }))
            }
            Err(AuthError::UserNotFound) => {
                counter!("sso.is_admin.failure").increment(1);
                debug!(user_id = req.user_id, "admin check rejected: user not found");
                Err(Status::not_found("user not found"))
            }
            Err(err) => {
                counter!("sso.is_admin.failure").increment(1);
                warn!(error = %err, "admin check failed");
                Err(Status::internal("internal error"))
            }
        }
    }
}
