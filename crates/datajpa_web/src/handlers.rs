//! Member HTTP handlers.
//!
//! Paging query parameters are normalized the lenient way: missing or
//! negative `page` becomes 0, missing or non-positive `size` becomes the
//! default size, oversized `size` is capped. Text that is not a number is
//! rejected with a validation problem. `sort` may repeat; terms apply in
//! the order given.

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, HeaderMap},
    response::IntoResponse,
    Json,
};
use datajpa_core::{normalize_page_request, Member, MemberDto, Page, PageRequest, Sort};
use log::debug;
use serde::Serialize;

use crate::problem::{ApiProblem, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Raw paging parameters as they appear in the query string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort: Vec<String>,
}

impl PageQuery {
    /// Collects `page`, `size` and every `sort` pair. A repeated `page` or
    /// `size` keeps the last value; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "page" => query.page = Some(value),
                "size" => query.size = Some(value),
                "sort" => query.sort.push(value),
                _ => {}
            }
        }
        query
    }

    pub fn to_page_request(&self) -> ApiResult<PageRequest> {
        let page = parse_number("page", self.page.as_deref())?;
        let size = parse_number("size", self.size.as_deref())?;

        let mut sort = Sort::unsorted();
        for expression in self.sort.iter().map(|raw| raw.trim()) {
            if expression.is_empty() {
                continue;
            }
            for order in Sort::parse(expression)?.orders() {
                sort = sort.and(order.direction, order.key);
            }
        }
        Ok(normalize_page_request(page, size, sort))
    }
}

/// Extracts a normalized `PageRequest`; rejections are problem responses.
#[derive(Debug, Clone)]
pub struct PageParams(pub PageRequest);

impl<S> FromRequestParts<S> for PageParams
where
    S: Send + Sync,
{
    type Rejection = ApiProblem;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pairs = match Query::<Vec<(String, String)>>::from_request_parts(parts, state).await {
            Ok(Query(pairs)) => pairs,
            Err(rejection) => {
                return Err(ApiProblem::validation(rejection.body_text())
                    .with_request_id(&parts.headers))
            }
        };
        PageQuery::from_pairs(pairs)
            .to_page_request()
            .map(Self)
            .map_err(|problem| problem.with_request_id(&parts.headers))
    }
}

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /members/{id}`: the username as plain text.
pub async fn get_member_username(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let result = async {
        let id = raw_id.trim().parse::<i64>().map_err(|_| {
            ApiProblem::validation(format!("member id `{raw_id}` is not an integer"))
        })?;
        let username = state
            .with_service(move |service| service.find_username(id))
            .await?
            .ok_or_else(|| ApiProblem::not_found(format!("member {id} does not exist")))?;
        Ok::<_, ApiProblem>(username)
    }
    .await;

    let username = result.map_err(|problem| problem.with_request_id(&headers))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        username,
    ))
}

/// `GET /members`: one page of members.
pub async fn list_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    PageParams(request): PageParams,
) -> ApiResult<Json<Page<Member>>> {
    debug!(
        "event=member_list module=web status=start page={} size={}",
        request.page, request.size
    );
    state
        .with_service(move |service| service.list_members(&request))
        .await
        .map(Json)
        .map_err(|problem| problem.with_request_id(&headers))
}

/// `GET /members/dto`: the same page projected to DTOs.
pub async fn list_member_dtos(
    State(state): State<AppState>,
    headers: HeaderMap,
    PageParams(request): PageParams,
) -> ApiResult<Json<Page<MemberDto>>> {
    state
        .with_service(move |service| service.list_member_dtos(&request))
        .await
        .map(Json)
        .map_err(|problem| problem.with_request_id(&headers))
}

fn parse_number(name: &str, raw: Option<&str>) -> ApiResult<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<i64>().map(Some).map_err(|_| {
            ApiProblem::validation(format!("`{name}` must be an integer, got `{value}`"))
        }),
    }
}
