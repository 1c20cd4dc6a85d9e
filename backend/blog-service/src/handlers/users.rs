/// User handlers - list, profile, sign-up
use crate::error::Result;
use crate::models::NewUser;
use crate::services::BlogActions;
use actix_web::{web, HttpResponse};

pub async fn list_users(actions: web::Data<BlogActions>) -> Result<HttpResponse> {
    let users = actions.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn get_user(
    actions: web::Data<BlogActions>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = actions.get_user_by_id(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn create_user(
    actions: web::Data<BlogActions>,
    req: web::Json<NewUser>,
) -> Result<HttpResponse> {
    let user = actions.create_user(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}
