use reqwest::Client;
use serde::de::DeserializeOwned;

use super::{ApiError, ApiResult};
use crate::config::ClientConfig;
use crate::feed::FeedQuery;
use shako_types::*;

/// HTTP client for the social API.
///
/// Every request carries the static API key header; requests made
/// after [`ApiClient::set_access_token`] also carry the bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
            api_key: config.api_key,
            access_token: None,
        }
    }

    /// Set or clear the bearer token used for authenticated requests.
    pub fn set_access_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    /// Attach the API key and, when present, the bearer token.
    fn add_auth_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header("X-Noroff-API-Key", &self.api_key);
        if let Some(token) = &self.access_token {
            req.bearer_auth(token)
        } else {
            req
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response onto the error taxonomy, preferring
    /// the service-provided message over a generic fallback.
    fn error_from(status: reqwest::StatusCode, body: String) -> ApiError {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.first_message().map(str::to_string))
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        match status.as_u16() {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Api(message),
        }
    }

    /// Unwrap a `{ data }` envelope.
    async fn handle_data<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        if status.is_success() {
            let envelope: Single<T> = response.json().await?;
            Ok(envelope.data)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Self::error_from(status, body))
        }
    }

    /// Unwrap a `{ data, meta }` envelope.
    async fn handle_list<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ApiResult<(T, Meta)> {
        let status = response.status();
        if status.is_success() {
            let envelope: Paginated<T> = response.json().await?;
            Ok((envelope.data, envelope.meta))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Self::error_from(status, body))
        }
    }

    /// For endpoints whose response body we do not consume (deletes,
    /// follow toggles, reaction confirmations).
    async fn handle_empty(&self, response: reqwest::Response) -> ApiResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Self::error_from(status, body))
        }
    }

    // Authentication endpoints

    /// Register a new profile. The caller still has to log in.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Profile> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(request)
            .send()
            .await?;
        self.handle_data(response).await
    }

    /// Exchange credentials for a profile plus bearer token. The
    /// token is stored on the client for subsequent requests.
    pub async fn login(&mut self, request: &LoginRequest) -> ApiResult<LoginData> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await?;
        let data: LoginData = self.handle_data(response).await?;
        self.access_token = Some(data.access_token.clone());
        Ok(data)
    }

    // Post endpoints

    /// Fetch a page of the feed with author/comments/reactions
    /// expanded.
    pub async fn get_posts(&self, query: &FeedQuery) -> ApiResult<(Vec<Post>, Meta)> {
        let mut params = vec![
            "_author=true".to_string(),
            "_comments=true".to_string(),
            "_reactions=true".to_string(),
        ];
        params.extend(query.params());
        let url = format!("{}?{}", self.url("/social/posts"), params.join("&"));
        let req = self.add_auth_headers(self.client.get(&url));
        let response = req.send().await?;
        self.handle_list(response).await
    }

    /// Fetch one post with all expansions, as needed by a detail view.
    pub async fn get_post(&self, post_id: &str) -> ApiResult<Post> {
        let url = format!(
            "{}?_author=true&_comments=true&_reactions=true",
            self.url(&format!("/social/posts/{post_id}"))
        );
        let req = self.add_auth_headers(self.client.get(&url));
        let response = req.send().await?;
        self.handle_data(response).await
    }

    /// Full-text search over posts.
    pub async fn search_posts(
        &self,
        q: &str,
        query: &FeedQuery,
    ) -> ApiResult<(Vec<Post>, Meta)> {
        let mut params = vec![format!("q={}", urlencoding::encode(q))];
        params.extend(query.params());
        let url = format!("{}?{}", self.url("/social/posts/search"), params.join("&"));
        let req = self.add_auth_headers(self.client.get(&url));
        let response = req.send().await?;
        self.handle_list(response).await
    }

    pub async fn create_post(&self, request: &CreatePostRequest) -> ApiResult<Post> {
        let req = self.add_auth_headers(self.client.post(self.url("/social/posts")).json(request));
        let response = req.send().await?;
        self.handle_data(response).await
    }

    pub async fn update_post(&self, post_id: &str, request: &CreatePostRequest) -> ApiResult<Post> {
        let url = self.url(&format!("/social/posts/{post_id}"));
        let req = self.add_auth_headers(self.client.put(&url).json(request));
        let response = req.send().await?;
        self.handle_data(response).await
    }

    pub async fn delete_post(&self, post_id: &str) -> ApiResult<()> {
        let url = self.url(&format!("/social/posts/{post_id}"));
        let req = self.add_auth_headers(self.client.delete(&url));
        let response = req.send().await?;
        self.handle_empty(response).await
    }

    // Comment and reaction endpoints

    /// Post a comment, or a reply when `reply_to_id` is given. An
    /// empty body is rejected locally before any network call.
    pub async fn create_comment(
        &self,
        post_id: &str,
        body: &str,
        reply_to_id: Option<i64>,
    ) -> ApiResult<Comment> {
        if body.trim().is_empty() {
            return Err(ApiError::Validation(
                "Comment body must not be empty".to_string(),
            ));
        }
        let url = self.url(&format!("/social/posts/{post_id}/comment"));
        let request = CreateCommentRequest {
            body: body.to_string(),
            reply_to_id,
        };
        let req = self.add_auth_headers(self.client.post(&url).json(&request));
        let response = req.send().await?;
        self.handle_data(response).await
    }

    /// Toggle the acting user's reaction with `symbol` on a post.
    /// The service flips membership based on the bearer token.
    pub async fn react(&self, post_id: &str, symbol: &str) -> ApiResult<()> {
        let url = self.url(&format!(
            "/social/posts/{post_id}/react/{}",
            urlencoding::encode(symbol)
        ));
        let req = self.add_auth_headers(self.client.put(&url));
        let response = req.send().await?;
        self.handle_empty(response).await
    }

    // Profile endpoints

    /// Fetch a profile; `with_follows` expands the follower and
    /// following lists.
    pub async fn get_profile(&self, name: &str, with_follows: bool) -> ApiResult<Profile> {
        let mut url = self.url(&format!("/social/profiles/{}", urlencoding::encode(name)));
        if with_follows {
            url.push_str("?_followers=true&_following=true");
        }
        let req = self.add_auth_headers(self.client.get(&url));
        let response = req.send().await?;
        self.handle_data(response).await
    }

    /// Fetch a page of one profile's posts, with expansions.
    pub async fn get_profile_posts(
        &self,
        name: &str,
        query: &FeedQuery,
    ) -> ApiResult<(Vec<Post>, Meta)> {
        let mut params = vec![
            "_author=true".to_string(),
            "_comments=true".to_string(),
            "_reactions=true".to_string(),
        ];
        params.extend(query.params());
        let url = format!(
            "{}?{}",
            self.url(&format!(
                "/social/profiles/{}/posts",
                urlencoding::encode(name)
            )),
            params.join("&")
        );
        let req = self.add_auth_headers(self.client.get(&url));
        let response = req.send().await?;
        self.handle_list(response).await
    }

    pub async fn update_profile(
        &self,
        name: &str,
        request: &UpdateProfileRequest,
    ) -> ApiResult<Profile> {
        let url = self.url(&format!("/social/profiles/{}", urlencoding::encode(name)));
        let req = self.add_auth_headers(self.client.put(&url).json(request));
        let response = req.send().await?;
        self.handle_data(response).await
    }

    pub async fn follow(&self, name: &str) -> ApiResult<()> {
        let url = self.url(&format!(
            "/social/profiles/{}/follow",
            urlencoding::encode(name)
        ));
        let req = self.add_auth_headers(self.client.put(&url));
        let response = req.send().await?;
        self.handle_empty(response).await
    }

    pub async fn unfollow(&self, name: &str) -> ApiResult<()> {
        let url = self.url(&format!(
            "/social/profiles/{}/unfollow",
            urlencoding::encode(name)
        ));
        let req = self.add_auth_headers(self.client.put(&url));
        let response = req.send().await?;
        self.handle_empty(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_from_prefers_service_message() {
        let body = r#"{"errors":[{"message":"Profile does not exist"}],"status":"Not Found","statusCode":404}"#;
        let err = ApiClient::error_from(reqwest::StatusCode::NOT_FOUND, body.to_string());
        assert!(matches!(err, ApiError::NotFound(m) if m == "Profile does not exist"));
    }

    #[test]
    fn error_from_falls_back_on_unparseable_body() {
        let err = ApiClient::error_from(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "<html>gateway</html>".to_string(),
        );
        assert!(matches!(err, ApiError::Api(m) if m.contains("500")));
    }

    #[test]
    fn error_from_maps_auth_statuses() {
        let body = r#"{"errors":[{"message":"Invalid token"}],"status":"Unauthorized","statusCode":401}"#;
        let err = ApiClient::error_from(reqwest::StatusCode::UNAUTHORIZED, body.to_string());
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err = ApiClient::error_from(reqwest::StatusCode::FORBIDDEN, String::new());
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
