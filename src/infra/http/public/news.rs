use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::{
        HeaderMap, StatusCode,
        header::{ACCEPT, REFERER},
    },
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use url::{Url, form_urlencoded};

use crate::{
    application::{
        comments::{CommentForm, CommentSubmission},
        error::{ErrorReport, HttpError},
        localization::ActiveLanguage,
        news::{DetailOutcome, ListQuery, ListRequest, NewsDetail, NewsListPage},
    },
    domain::entities::{CategoryRecord, TagRecord},
    infra::http::flash::{self, Flash},
    presentation::views::{
        CommentView, FilterLinkView, LayoutContext, NewsDetailTemplate, NewsDetailView,
        NewsListTemplate, NewsListView, PagerView, render_template_response,
    },
    util::timezone::format_display_date,
};

use super::HttpState;

const COMMENT_SENT_AJAX: &str = "Tu comentario ha sido enviado exitosamente y será publicado después de ser revisado por nuestro equipo.";
const COMMENT_SENT: &str = "Tu comentario ha sido enviado y está pendiente de moderación.";
const COMMENT_POST_MISSING: &str = "Post no encontrado o ID no proporcionado";
const COMMENT_INVALID: &str = "Por favor corrige los siguientes errores:";
const COMMENT_FAILED: &str =
    "Ocurrió un error inesperado al procesar tu comentario. Por favor intenta nuevamente.";

fn tag_links(
    state: &HttpState,
    language: &ActiveLanguage,
    tags: &[TagRecord],
    active: Option<&str>,
) -> Vec<FilterLinkView> {
    tags.iter()
        .map(|tag| FilterLinkView {
            label: tag.name.clone(),
            href: state.path(language, &format!("/news/tag/{}/", tag.slug)),
            count: tag.post_count,
            active: active == Some(tag.slug.as_str()),
        })
        .collect()
}

fn category_links(
    state: &HttpState,
    language: &ActiveLanguage,
    categories: &[CategoryRecord],
    active: Option<&str>,
) -> Vec<FilterLinkView> {
    categories
        .iter()
        .map(|category| FilterLinkView {
            label: category.name.clone(),
            href: state.path(language, &format!("/news/category/{}/", category.slug)),
            count: category.post_count,
            active: active == Some(category.slug.as_str()),
        })
        .collect()
}

/// Unprefixed path of a list request.
fn list_path(request: &ListRequest) -> String {
    match (&request.path_tag, &request.path_category) {
        (Some(tag), _) => format!("/news/tag/{tag}/"),
        (None, Some(category)) => format!("/news/category/{category}/"),
        (None, None) => "/news/".to_string(),
    }
}

fn page_href(base: &str, request: &ListRequest, page: &NewsListPage, number: u32) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if request.path_category.is_none() {
        if let Some(category) = page.category.as_ref() {
            query.append_pair("category", &category.slug);
        }
    }
    if !page.search_query.is_empty() {
        query.append_pair("search", &page.search_query);
    }
    query.append_pair("page", &number.to_string());
    format!("{base}?{}", query.finish())
}

async fn render_list(
    state: HttpState,
    language: ActiveLanguage,
    request: ListRequest,
) -> Result<Response, HttpError> {
    let page = state.news.list(language.code(), &request).await?;
    let path = list_path(&request);
    let base = state.path(&language, &path);

    let heading = match (&page.tag, &page.category) {
        (Some(tag), _) => format!("Etiqueta: {}", tag.name),
        (None, Some(category)) => format!("Categoría: {}", category.name),
        (None, None) if !page.search_query.is_empty() => {
            format!("Resultados para «{}»", page.search_query)
        }
        (None, None) => "Noticias".to_string(),
    };
    let active_tag = page.tag.as_ref().map(|tag| tag.slug.as_str());
    let active_category = page.category.as_ref().map(|category| category.slug.as_str());

    let content = NewsListView {
        heading: heading.clone(),
        pager: PagerView::from_page(&page.posts, |number| page_href(&base, &request, &page, number)),
        search_action: state.path(&language, "/news/"),
        search_query: page.search_query.clone(),
        categories: category_links(&state, &language, &page.categories, active_category),
        tags: tag_links(&state, &language, &page.tags, active_tag),
        popular_tags: tag_links(&state, &language, &page.popular_tags, active_tag),
        posts: page.posts.items.clone(),
    };
    let chrome = state
        .chrome(&language, &path, &heading)
        .with_canonical(Some(page.canonical_url.clone()));
    let view = LayoutContext::new(chrome, content);
    Ok(render_template_response(
        NewsListTemplate { view },
        StatusCode::OK,
    ))
}

pub(super) async fn list(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Query(query): Query<ListQuery>,
) -> Result<Response, HttpError> {
    let request = ListRequest {
        query,
        ..ListRequest::default()
    };
    render_list(state, language, request).await
}

pub(super) async fn tag_list(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Response, HttpError> {
    let request = ListRequest {
        path_tag: Some(slug),
        path_category: None,
        query,
    };
    render_list(state, language, request).await
}

pub(super) async fn category_list(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Response, HttpError> {
    let request = ListRequest {
        path_tag: None,
        path_category: Some(slug),
        query,
    };
    render_list(state, language, request).await
}

fn detail_view(
    state: &HttpState,
    language: &ActiveLanguage,
    detail: &NewsDetail,
) -> NewsDetailView {
    let tz = state.localization.display_timezone();
    let post = &detail.post;
    NewsDetailView {
        post_id: post.id,
        title: detail.title.clone(),
        body: detail.body.clone(),
        author: post.author.clone(),
        published: detail.published.clone(),
        category: FilterLinkView {
            label: post.category.name.clone(),
            href: state.path(language, &format!("/news/category/{}/", post.category.slug)),
            count: 0,
            active: false,
        },
        tags: post
            .tags
            .iter()
            .map(|tag| FilterLinkView {
                label: tag.name.clone(),
                href: state.path(language, &format!("/news/tag/{}/", tag.slug)),
                count: 0,
                active: false,
            })
            .collect(),
        featured_image: post.featured_image.clone(),
        available_in_current_language: detail.available_in_current_language,
        comments: detail
            .comments
            .iter()
            .map(|comment| CommentView {
                name: comment.name.clone(),
                body: comment.body.clone(),
                created: format_display_date(comment.created_at, tz),
            })
            .collect(),
        similar: detail.similar.clone(),
        popular_tags: tag_links(state, language, &detail.popular_tags, None),
        previous: detail.previous.clone(),
        next: detail.next.clone(),
        comment_action: state.path(language, "/news/comment/ajax/"),
        captcha: state.captcha.ticket(),
        refresh_captcha_href: state.path(language, "/refresh-captcha/"),
        news_href: state.path(language, "/news/"),
    }
}

pub(super) async fn detail(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Path((year, month, day, slug)): Path<(String, String, String, String)>,
    jar: CookieJar,
) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::public::news::detail";
    let (Ok(year), Ok(month), Ok(day)) = (
        year.parse::<i32>(),
        month.parse::<u32>(),
        day.parse::<u32>(),
    ) else {
        return Err(HttpError::not_found(SOURCE, "Malformed news date"));
    };

    let detail = match state
        .news
        .detail(language.code(), year, month, day, &slug)
        .await?
    {
        DetailOutcome::Page(detail) => detail,
        DetailOutcome::Redirect(target) => return Ok(Redirect::to(&target).into_response()),
    };

    let (jar, flash) = flash::take(jar);
    let content = detail_view(&state, &language, &detail);
    let alternates: Vec<(String, String)> = detail
        .language_urls
        .iter()
        .map(|url| (url.language.clone(), url.url.clone()))
        .collect();
    let path = format!("/news/{year}/{month}/{day}/{slug}/");
    let chrome = state
        .chrome(&language, &path, &detail.title)
        .with_description(detail.meta_description.clone())
        .with_canonical(detail.canonical_url.clone())
        .with_language_urls(&alternates)
        .with_flash(flash.map(Flash::into_view));
    let view = LayoutContext::new(chrome, content);
    Ok((jar, render_template_response(NewsDetailTemplate { view }, StatusCode::OK)).into_response())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn wants_json(headers: &HeaderMap, form: &CommentForm) -> bool {
    header_str(headers, "x-requested-with").eq_ignore_ascii_case("XMLHttpRequest")
        || header_str(headers, ACCEPT.as_str()).contains("application/json")
        || form.wants_json()
}

/// Path and query of the `Referer`, so redirects never leave the site.
fn back_target(headers: &HeaderMap) -> String {
    let Some(referer) = headers.get(REFERER).and_then(|value| value.to_str().ok()) else {
        return "/".to_string();
    };
    if referer.starts_with('/') {
        return local_or_root(referer.to_string());
    }
    match Url::parse(referer) {
        Ok(url) => local_or_root(match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        }),
        Err(_) => "/".to_string(),
    }
}

/// Browsers read `//host` and `/\host` as protocol-relative URLs.
fn local_or_root(path: String) -> String {
    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some('/'), Some('/' | '\\')) => "/".to_string(),
        (Some('/'), _) => path,
        _ => "/".to_string(),
    }
}

fn redirect_back(headers: &HeaderMap, jar: CookieJar, flashes: &[Flash]) -> Response {
    let jar = flashes.iter().fold(jar, |jar, flash| flash::push(jar, flash));
    (jar, Redirect::to(&back_target(headers))).into_response()
}

pub(super) async fn comment(
    State(state): State<HttpState>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<CommentForm>,
) -> Response {
    const SOURCE: &str = "infra::http::public::news::comment";
    let json = wants_json(&headers, &form);

    match state.comments.submit(form).await {
        Ok(CommentSubmission::Accepted { comment }) => {
            if !json {
                return redirect_back(&headers, jar, &[Flash::success(COMMENT_SENT)]);
            }
            let ticket = state.captcha.ticket();
            Json(json!({
                "success": true,
                "message": COMMENT_SENT_AJAX,
                "action": "message",
                "comment_id": comment.id,
                "new_captcha_key": ticket.captcha_key,
                "new_captcha_image_url": ticket.captcha_image,
            }))
            .into_response()
        }
        Ok(CommentSubmission::PostNotFound) => {
            if !json {
                return redirect_back(&headers, jar, &[Flash::error(COMMENT_POST_MISSING)]);
            }
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "message": COMMENT_POST_MISSING })),
            )
                .into_response()
        }
        Ok(CommentSubmission::Invalid(errors)) => {
            if !json {
                // The cookie holds one message; join the per-field lines.
                let summary = errors.summary().join(" ");
                return redirect_back(&headers, jar, &[Flash::error(summary)]);
            }
            let ticket = state.captcha.ticket();
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "message": COMMENT_INVALID,
                    "errors": errors,
                    "new_captcha_key": ticket.captcha_key,
                    "new_captcha_image_url": ticket.captcha_image,
                })),
            )
                .into_response()
        }
        Err(err) => {
            let report =
                ErrorReport::from_error(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, &err);
            let mut response = if json {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "message": COMMENT_FAILED })),
                )
                    .into_response()
            } else {
                redirect_back(&headers, jar, &[Flash::error(COMMENT_FAILED)])
            };
            report.attach(&mut response);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn referer_is_reduced_to_a_local_path() {
        let mut headers = HeaderMap::new();
        assert_eq!(back_target(&headers), "/");

        headers.insert(
            REFERER,
            HeaderValue::from_static("https://evil.example/news/2024/6/10/hola/?x=1"),
        );
        assert_eq!(back_target(&headers), "/news/2024/6/10/hola/?x=1");

        headers.insert(REFERER, HeaderValue::from_static("//evil.example/"));
        assert_eq!(back_target(&headers), "/");

        headers.insert(REFERER, HeaderValue::from_static("/\\evil.example/"));
        assert_eq!(back_target(&headers), "/");

        headers.insert(REFERER, HeaderValue::from_static("https://site.test//evil.example/"));
        assert_eq!(back_target(&headers), "/");
    }

    #[test]
    fn ajax_is_detected_from_headers_or_form() {
        let form = CommentForm::default();
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers, &form));

        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert!(wants_json(&headers, &form));

        let form = CommentForm {
            ajax: Some("1".to_string()),
            ..CommentForm::default()
        };
        assert!(wants_json(&HeaderMap::new(), &form));
    }
}
