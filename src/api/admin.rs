//! Admin endpoints: login, persons, pages, honor list, support inbox, uploads
//!
//! Everything except `login` sits behind [`super::auth::jwt_auth`].

use axum::{
    extract::{Multipart, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use family_tree_types::{
    AdminPersonRow, HonorInput, HonorItem, LoginRequest, LoginResponse, PageUpdate, PersonDetail,
    PersonFormData, PersonId, PersonInput, SitePage, SupportMessage, UploadResponse,
};
use tracing::{info, warn};

use super::auth::AdminPrincipal;
use super::state::AppState;
use crate::auth::verify_password;
use crate::database::{DeleteOutcome, FatherCheck, PersonWrite};
use crate::error::AppError;
use crate::export::{support_messages_csv, CSV_CONTENT_TYPE, CSV_DISPOSITION};

/// Largest accepted upload body
pub const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

const HAS_CHILDREN_MESSAGE: &str = "لا يمكن حذف شخص لديه أبناء. احذف/انقل الأبناء أولاً.";

// ============================================================================
// Login
// ============================================================================

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = req.username.trim();
    let account = state.admins().find_by_username(username).await?;
    match account {
        Some(account) if verify_password(&req.password, &account.password_hash) => {
            let token = state
                .jwt
                .issue(&account.username)
                .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;
            info!(username = %account.username, "admin logged in");
            Ok(Json(LoginResponse {
                token,
                username: account.username,
            }))
        }
        _ => {
            warn!(username, "admin login rejected");
            Err(AppError::Unauthorized)
        }
    }
}

// ============================================================================
// Persons
// ============================================================================

fn require_name(input: &PersonInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::bad_request("الاسم مطلوب"));
    }
    Ok(())
}

fn father_rejected(check: FatherCheck) -> AppError {
    match check {
        FatherCheck::MissingFather(father) => {
            AppError::bad_request(format!("father {father} does not exist"))
        }
        FatherCheck::SelfReference => AppError::bad_request("a person cannot be their own father"),
        FatherCheck::WouldCycle(father) => AppError::bad_request(format!(
            "person {father} is a descendant; choosing them as father would create a cycle"
        )),
        FatherCheck::Ok => AppError::Internal("write rejected without a reason".to_string()),
    }
}

/// GET /api/admin/persons
pub async fn list_persons(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminPersonRow>>, AppError> {
    Ok(Json(state.persons().admin_rows().await?))
}

/// GET /api/admin/persons/form
pub async fn new_person_form(
    State(state): State<AppState>,
) -> Result<Json<PersonFormData>, AppError> {
    Ok(Json(PersonFormData {
        person: None,
        persons: state.persons().father_options(None).await?,
        spouse_names: Vec::new(),
    }))
}

/// GET /api/admin/persons/:id
pub async fn edit_person_form(
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
) -> Result<Json<PersonFormData>, AppError> {
    let repo = state.persons();
    let person = repo.get(id).await?.ok_or_else(AppError::not_found)?;
    let spouse_names = repo
        .spouses_of(id)
        .await?
        .into_iter()
        .map(|s| s.spouse_name)
        .collect();
    Ok(Json(PersonFormData {
        person: Some(person),
        persons: repo.father_options(Some(id)).await?,
        spouse_names,
    }))
}

/// POST /api/admin/persons
pub async fn create_person(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    Json(input): Json<PersonInput>,
) -> Result<(StatusCode, Json<PersonDetail>), AppError> {
    require_name(&input)?;
    let repo = state.persons();
    let id = match repo.create(&input).await? {
        PersonWrite::Saved(id) => id,
        PersonWrite::Rejected(check) => return Err(father_rejected(check)),
        PersonWrite::NotFound => return Err(AppError::not_found()),
    };
    info!(admin = %admin.username, id, "person created");
    let detail = repo
        .detail(id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("person {id} vanished after insert")))?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// PUT /api/admin/persons/:id
pub async fn update_person(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(id): Path<PersonId>,
    Json(input): Json<PersonInput>,
) -> Result<Json<PersonDetail>, AppError> {
    let repo = state.persons();
    if repo.get(id).await?.is_none() {
        return Err(AppError::not_found());
    }
    require_name(&input)?;
    match repo.update(id, &input).await? {
        PersonWrite::Saved(_) => {}
        PersonWrite::Rejected(check) => return Err(father_rejected(check)),
        PersonWrite::NotFound => return Err(AppError::not_found()),
    }
    info!(admin = %admin.username, id, "person updated");
    repo.detail(id)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

/// DELETE /api/admin/persons/:id
pub async fn delete_person(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(id): Path<PersonId>,
) -> Result<StatusCode, AppError> {
    match state.persons().delete(id).await? {
        DeleteOutcome::Deleted => {
            info!(admin = %admin.username, id, "person deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteOutcome::NotFound => Err(AppError::not_found()),
        DeleteOutcome::HasChildren(_) => Err(AppError::bad_request(HAS_CHILDREN_MESSAGE)),
    }
}

// ============================================================================
// Pages
// ============================================================================

/// GET /api/admin/pages
pub async fn list_pages(State(state): State<AppState>) -> Result<Json<Vec<SitePage>>, AppError> {
    Ok(Json(state.cms().pages().await?))
}

/// PUT /api/admin/pages/:slug
pub async fn save_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(update): Json<PageUpdate>,
) -> Result<Json<SitePage>, AppError> {
    let cms = state.cms();
    if !cms.save_page(&slug, &update).await? {
        return Err(AppError::not_found());
    }
    cms.page(&slug).await?.map(Json).ok_or_else(AppError::not_found)
}

// ============================================================================
// Honor list
// ============================================================================

fn require_honor_name(input: &HonorInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::bad_request("الاسم مطلوب"));
    }
    Ok(())
}

/// GET /api/admin/honor
pub async fn list_honor(State(state): State<AppState>) -> Result<Json<Vec<HonorItem>>, AppError> {
    Ok(Json(state.cms().honor_items().await?))
}

/// GET /api/admin/honor/:id
pub async fn get_honor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<HonorItem>, AppError> {
    state
        .cms()
        .honor_item(id)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

/// POST /api/admin/honor
pub async fn create_honor(
    State(state): State<AppState>,
    Json(input): Json<HonorInput>,
) -> Result<(StatusCode, Json<HonorItem>), AppError> {
    require_honor_name(&input)?;
    let cms = state.cms();
    let id = cms.create_honor(&input).await?;
    let item = cms
        .honor_item(id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("honor item {id} vanished after insert")))?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/admin/honor/:id
pub async fn update_honor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<HonorInput>,
) -> Result<Json<HonorItem>, AppError> {
    require_honor_name(&input)?;
    let cms = state.cms();
    if !cms.update_honor(id, &input).await? {
        return Err(AppError::not_found());
    }
    cms.honor_item(id).await?.map(Json).ok_or_else(AppError::not_found)
}

/// DELETE /api/admin/honor/:id
pub async fn delete_honor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if state.cms().delete_honor(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found())
    }
}

// ============================================================================
// Support inbox
// ============================================================================

/// GET /api/admin/support-messages
pub async fn list_support_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<SupportMessage>>, AppError> {
    Ok(Json(state.cms().support_messages().await?))
}

/// DELETE /api/admin/support-messages/:id
pub async fn delete_support_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if state.cms().delete_support_message(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found())
    }
}

/// GET /api/admin/support-messages/export.csv
pub async fn export_support_messages(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let messages = state.cms().support_messages().await?;
    let body = support_messages_csv(&messages)?;
    Ok((
        [(CONTENT_TYPE, CSV_CONTENT_TYPE), (CONTENT_DISPOSITION, CSV_DISPOSITION)],
        body,
    ))
}

// ============================================================================
// Uploads
// ============================================================================

/// Stored file name: `<millis>-<base name>` with whitespace runs turned into `_`
/// and any directory part dropped.
pub fn upload_file_name(millis: i64, original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let mut name = String::with_capacity(base.len());
    let mut in_space = false;
    for c in base.chars() {
        if c.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(c);
            in_space = false;
        }
    }
    if name.is_empty() || name == "." || name == ".." {
        name = "upload".to_string();
    }
    format!("{millis}-{name}")
}

/// POST /api/admin/upload (multipart field `photo`)
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.to_string()))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let original = field.file_name().unwrap_or("photo").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(e.to_string()))?;
        if data.is_empty() {
            break;
        }

        tokio::fs::create_dir_all(&state.uploads_dir).await?;
        let name = upload_file_name(Utc::now().timestamp_millis(), &original);
        tokio::fs::write(state.uploads_dir.join(&name), &data).await?;
        info!(admin = %admin.username, file = %name, bytes = data.len(), "photo uploaded");
        return Ok(Json(UploadResponse {
            url: format!("/uploads/{name}"),
        }));
    }
    Err(AppError::bad_request("No file uploaded"))
}
