/// Post handlers - feed and creation
use crate::error::Result;
use crate::models::NewPost;
use crate::services::{BlogActions, DEFAULT_POST_LIMIT};
use actix_web::{web, HttpResponse};
use serde::Deserialize;

/// Largest feed a single request may ask for
pub const MAX_POST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub limit: Option<i64>,
}

impl ListPostsQuery {
    fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_POST_LIMIT).min(MAX_POST_LIMIT)
    }
}

pub async fn list_posts(
    actions: web::Data<BlogActions>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    let posts = actions.list_posts(query.effective_limit()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn create_post(
    actions: web::Data<BlogActions>,
    req: web::Json<NewPost>,
) -> Result<HttpResponse> {
    let post = actions.create_post(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}
