use validator::Validate;

use crate::dto::user_dto::{
    LoginRequest, LoginResponse, RegisterRequest, TopUpRequest, TopUpResponse, UserResponse,
};
use crate::dto::ApiResponse;
use crate::models::User;
use crate::services::{AuthService, TopUpService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct UserController {
    auth: AuthService,
    top_ups: TopUpService,
}

impl UserController {
    pub fn new(state: &AppState) -> Self {
        Self {
            auth: state.auth.clone(),
            top_ups: state.top_ups.clone(),
        }
    }

    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        request.validate()?;

        let user = self
            .auth
            .register(&request.name, &request.email, &request.password)
            .await?;

        Ok(ApiResponse::success_with_message(
            UserResponse::from(user),
            "user registered successfully".to_string(),
        ))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<ApiResponse<LoginResponse>, AppError> {
        request.validate()?;

        let token = self.auth.login(&request.email, &request.password).await?;
        Ok(ApiResponse::success(LoginResponse { token }))
    }

    pub fn profile(&self, user: User) -> ApiResponse<UserResponse> {
        ApiResponse::success(UserResponse::from(user))
    }

    pub async fn top_up(
        &self,
        user: &User,
        request: TopUpRequest,
    ) -> Result<ApiResponse<TopUpResponse>, AppError> {
        let (top_up, payment) = self.top_ups.top_up(user, request.amount).await?;

        Ok(ApiResponse::success_with_message(
            TopUpResponse::new(&top_up, &payment),
            "top up created, complete the payment to finish".to_string(),
        ))
    }
}
