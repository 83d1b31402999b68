use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use valora_core::{is_valid_email, normalize_phone, Person};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/people",
            get(list_people).post(create_person).delete(clear_people),
        )
        .route("/v1/people/count", get(count_people))
        .route(
            "/v1/people/{id}",
            get(get_person).put(update_person).delete(delete_person),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreatePersonRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Only the fields present are changed
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePersonRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PeopleQuery {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}

fn checked_email(email: &str) -> Result<(), AppError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AppError::ValidationError("Invalid email address".to_string()))
    }
}

fn checked_phone(phone: &str) -> Result<String, AppError> {
    let digits = normalize_phone(phone);
    if digits.is_empty() {
        return Err(AppError::ValidationError(
            "Phone must contain at least one digit".to_string(),
        ));
    }
    Ok(digits)
}

pub async fn create_person(
    State(state): State<AppState>,
    Json(req): Json<CreatePersonRequest>,
) -> Result<(StatusCode, Json<Person>), AppError> {
    checked_email(&req.email)?;
    let phone = checked_phone(&req.phone)?;

    let person = state
        .people
        .create(Person::new(req.name.trim(), req.email.trim(), phone))
        .await?;
    tracing::info!(id = ?person.id, "Person registered");
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn list_people(
    State(state): State<AppState>,
    Query(query): Query<PeopleQuery>,
) -> Result<Json<Vec<Person>>, AppError> {
    let people = match query.name.as_deref() {
        Some(prefix) => state.people.find_by_name_prefix(prefix).await?,
        None => state.people.list_all().await?,
    };
    Ok(Json(people))
}

pub async fn count_people(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let count = state.people.count().await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Person>, AppError> {
    state
        .people
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Person {} not found", id)))
}

pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePersonRequest>,
) -> Result<Json<Person>, AppError> {
    let mut person = state
        .people
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Person {} not found", id)))?;

    if let Some(name) = req.name {
        person.name = name.trim().to_string();
    }
    if let Some(email) = req.email {
        checked_email(&email)?;
        person.set_email(email.trim())?;
    }
    if let Some(phone) = req.phone {
        person.phone = checked_phone(&phone)?.into();
    }

    state.people.update(&person).await?;
    Ok(Json(person))
}

pub async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.people.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_people(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.people.clear_all().await?;
    tracing::warn!("All people records cleared");
    Ok(StatusCode::NO_CONTENT)
}
