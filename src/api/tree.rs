//! Public tree endpoints: nested tree, person detail, server-side layout and
//! SVG rendering. Every request rebuilds the tree from the current rows.

use axum::{
    extract::{Path, Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};
use family_tree_core::viewport::{FIT_MAX_SCALE, FIT_PADDING_AUTO};
use family_tree_core::{
    build_tree, fit_transform, render_svg, FamilyTree, LayoutEngine, NavigationState, Scene,
    Transform, Vec2,
};
use family_tree_types::{PersonDetail, PersonId, SvgParams, TreeLayoutResponse, TreeNodeDto};

use super::state::AppState;
use crate::error::AppError;

const DEFAULT_SVG_SIZE: (f32, f32) = (1200.0, 800.0);
const SVG_SIZE_RANGE: (f32, f32) = (100.0, 8000.0);

async fn load_tree(state: &AppState) -> Result<Option<FamilyTree>, AppError> {
    let records = state.persons().list_all().await?;
    Ok(build_tree(records)?)
}

/// GET /api/tree
pub async fn get_tree(State(state): State<AppState>) -> Result<Json<Option<TreeNodeDto>>, AppError> {
    let tree = load_tree(&state).await?;
    Ok(Json(tree.map(|t| t.to_dto())))
}

/// GET /api/person/:id
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
) -> Result<Json<PersonDetail>, AppError> {
    state
        .persons()
        .detail(id)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

/// GET /api/tree/layout
pub async fn get_layout(State(state): State<AppState>) -> Result<Json<TreeLayoutResponse>, AppError> {
    let Some(tree) = load_tree(&state).await? else {
        return Ok(Json(TreeLayoutResponse {
            nodes: Vec::new(),
            edges: Vec::new(),
            bounds: None,
        }));
    };
    let layout = LayoutEngine::new(state.layout).layout(&tree);
    Ok(Json(layout.to_response(&tree)))
}

/// GET /api/tree.svg
pub async fn get_svg(
    State(state): State<AppState>,
    Query(params): Query<SvgParams>,
) -> Result<impl IntoResponse, AppError> {
    let clamp = |v: Option<f32>, default: f32| {
        v.filter(|v| v.is_finite())
            .unwrap_or(default)
            .clamp(SVG_SIZE_RANGE.0, SVG_SIZE_RANGE.1)
    };
    let size = Vec2::new(
        clamp(params.width, DEFAULT_SVG_SIZE.0),
        clamp(params.height, DEFAULT_SVG_SIZE.1),
    );

    let scene = match load_tree(&state).await? {
        Some(tree) => {
            let engine = LayoutEngine::new(state.layout);
            let layout = engine.layout(&tree);
            let mut nav = NavigationState::new(&tree);
            if let Some(q) = params.q.as_deref() {
                nav.set_query(&tree, q);
            }
            if let Some(person) = params.focus {
                let idx = tree.find(person).ok_or_else(AppError::not_found)?;
                nav.select(&tree, idx)
                    .map_err(|fault| AppError::bad_request(fault.to_string()))?;
            }
            Scene::build(&tree, &layout, engine.config(), &nav)
        }
        None => Scene::default(),
    };

    let transform = fit_transform(scene.bounds, size, FIT_PADDING_AUTO, FIT_MAX_SCALE)
        .unwrap_or(Transform::IDENTITY);
    let svg = render_svg(&scene, transform, size.x, size.y)
        .map_err(|e| AppError::Internal(format!("svg rendering failed: {e}")))?;
    Ok(([(CONTENT_TYPE, "image/svg+xml; charset=utf-8")], svg))
}
