use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::db::reader::user_for_token;
use crate::error::{AppError, Result};

/// Resolve the caller from an `Authorization: Bearer <token>` header.
pub async fn authenticate(pool: &sqlx::SqlitePool, headers: &HeaderMap) -> Result<String> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    user_for_token(pool, token).await?.ok_or(AppError::Unauthorized)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_token, memory_pool};
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer   ")), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let pool = memory_pool().await;
        insert_token(&pool, "good", "user1").await;

        assert_eq!(authenticate(&pool, &headers("Bearer good")).await.unwrap(), "user1");
        assert!(matches!(
            authenticate(&pool, &headers("Bearer bad")).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            authenticate(&pool, &HeaderMap::new()).await,
            Err(AppError::Unauthorized)
        ));
    }
}
