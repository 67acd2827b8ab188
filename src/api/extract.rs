use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use log::debug;
use serde::de::DeserializeOwned;

use crate::error::BookingError;

/// 본문 파싱 실패를 `InvalidInput` 으로 돌려주는 JSON 추출기
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!("요청 본문 거부: {}", rejection.body_text());
                Err(BookingError::InvalidInput(rejection.body_text()))
            }
        }
    }
}
