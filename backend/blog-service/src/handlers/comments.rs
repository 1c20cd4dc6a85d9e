use crate::error::Result;
use crate::models::NewComment;
use crate::services::BlogActions;
use actix_web::{web, HttpResponse};

pub async fn create_comment(
    actions: web::Data<BlogActions>,
    req: web::Json<NewComment>,
) -> Result<HttpResponse> {
    let comment = actions.create_comment(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(comment))
}
