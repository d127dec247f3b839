use crate::application::captcha::CaptchaTicket;
use crate::application::error::{ErrorReport, HttpError};
use crate::application::localization::Localization;
use crate::application::news::PostCard;
use crate::application::pagination::Page;
use crate::application::validation::FieldErrors;
use crate::domain::entities::ProductRecord;
use crate::domain::pricing::format_clp;
use crate::domain::types::ProductType;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

pub const SITE_NAME: &str = "TeclaFácil";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "No fue posible mostrar la página",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Full HTML error page. Only the public message and the request id are shown.
pub fn render_error_page(
    chrome: LayoutChrome,
    status: StatusCode,
    message: &str,
    request_id: Option<String>,
) -> Response {
    let content = ErrorPageView {
        status: status.as_u16(),
        title: match status {
            StatusCode::NOT_FOUND => "Página no encontrada".to_string(),
            _ => "Algo salió mal".to_string(),
        },
        message: message.to_string(),
        request_id,
    };
    let view = LayoutContext::new(chrome, content);
    match (ErrorTemplate { view }).render() {
        Ok(html) => (status, Html(html)).into_response(),
        // Never loop back into the error renderer; plain text is enough here.
        Err(_) => (status, message.to_string()).into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let mut response = render_error_page(chrome, StatusCode::NOT_FOUND, "Página no encontrada", None);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct LanguageLinkView {
    pub code: String,
    pub label: String,
    pub href: String,
    pub active: bool,
}

#[derive(Clone)]
pub struct FlashView {
    /// `success` or `error`, used as a CSS modifier.
    pub level: &'static str,
    pub message: String,
}

#[derive(Clone, Default)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub canonical: Option<String>,
    /// `hreflang` alternates as `(language, absolute url)`.
    pub alternates: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub site_name: String,
    pub language: String,
    pub home_href: String,
    pub navigation: Vec<NavigationLinkView>,
    pub languages: Vec<LanguageLinkView>,
    pub meta: PageMetaView,
    pub flash: Option<FlashView>,
}

impl LayoutChrome {
    /// Chrome for a page served at `path` (unprefixed) in `language`. The
    /// language switcher points at the same path in every other language.
    pub fn new(localization: &Localization, language: &str, path: &str, title: &str) -> Self {
        let link = |label: &str, target: &str| NavigationLinkView {
            label: label.to_string(),
            href: localization.localized_path(language, target),
        };
        let languages = localization
            .languages()
            .iter()
            .map(|code| LanguageLinkView {
                code: code.clone(),
                label: code.to_uppercase(),
                href: localization.localized_path(code, path),
                active: code == language,
            })
            .collect();

        Self {
            site_name: SITE_NAME.to_string(),
            language: language.to_string(),
            home_href: localization.localized_path(language, "/"),
            navigation: vec![
                link("Inicio", "/"),
                link("Reservar", "/reservar/"),
                link("Empresas", "/empresas/"),
                link("Noticias", "/news/"),
                link("Tienda", "/shop/"),
                link("Contacto", "/contacto/"),
            ],
            languages,
            meta: PageMetaView {
                title: if title.is_empty() {
                    SITE_NAME.to_string()
                } else {
                    format!("{title} | {SITE_NAME}")
                },
                ..PageMetaView::default()
            },
            flash: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = description.into();
        self
    }

    pub fn with_canonical(mut self, canonical: Option<String>) -> Self {
        self.meta.canonical = canonical;
        self
    }

    pub fn with_flash(mut self, flash: Option<FlashView>) -> Self {
        self.flash = flash;
        self
    }

    /// Replace the switcher with explicit per-language URLs; languages
    /// without a URL are dropped.
    pub fn with_language_urls(mut self, urls: &[(String, String)]) -> Self {
        self.languages = urls
            .iter()
            .map(|(code, href)| LanguageLinkView {
                code: code.clone(),
                label: code.to_uppercase(),
                href: href.clone(),
                active: *code == self.language,
            })
            .collect();
        self.meta.alternates = urls.to_vec();
        self
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub site_name: String,
    pub language: String,
    pub home_href: String,
    pub navigation: Vec<NavigationLinkView>,
    pub languages: Vec<LanguageLinkView>,
    pub meta: PageMetaView,
    pub flash: Option<FlashView>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            site_name: chrome.site_name,
            language: chrome.language,
            home_href: chrome.home_href,
            navigation: chrome.navigation,
            languages: chrome.languages,
            meta: chrome.meta,
            flash: chrome.flash,
            content,
        }
    }
}

/// One entry of a filter sidebar (tags, categories, shop categories).
#[derive(Clone)]
pub struct FilterLinkView {
    pub label: String,
    pub href: String,
    pub count: i64,
    pub active: bool,
}

#[derive(Clone)]
pub struct PagerView {
    pub number: u32,
    pub num_pages: u32,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

impl PagerView {
    /// `href` builds the link of a given page number.
    pub fn from_page<T>(page: &Page<T>, href: impl Fn(u32) -> String) -> Self {
        Self {
            number: page.number,
            num_pages: page.num_pages,
            previous_href: page.has_previous().then(|| href(page.previous_number())),
            next_href: page.has_next().then(|| href(page.next_number())),
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

#[derive(Clone)]
pub struct FormFieldErrors {
    errors: FieldErrors,
}

impl FormFieldErrors {
    pub fn new(errors: FieldErrors) -> Self {
        Self { errors }
    }

    pub fn none() -> Self {
        Self {
            errors: FieldErrors::default(),
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains(field)
    }

    pub fn message(&self, field: &str) -> &str {
        self.errors.first(field).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

// Landing

#[derive(Clone)]
pub struct TestimonialView {
    pub name: String,
    pub stars: String,
    pub comment: String,
}

impl TestimonialView {
    pub fn new(name: &str, rating: i16, comment: &str) -> Self {
        let filled = usize::try_from(rating.clamp(0, 5)).unwrap_or_default();
        Self {
            name: name.to_string(),
            stars: format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled)),
            comment: comment.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct HomeView {
    pub reservations: u64,
    pub pilot_companies: u64,
    pub satisfaction: u32,
    pub testimonials: Vec<TestimonialView>,
    pub cta_email: String,
    pub fb_error: bool,
    pub latest: Vec<PostCard>,
    pub reserve_action: String,
    pub feedback_action: String,
    pub news_href: String,
}

#[derive(Clone)]
pub struct PurchaseOptionView {
    pub code: &'static str,
    pub label: &'static str,
    pub price_label: String,
    pub deposit_label: String,
    pub selected: bool,
}

#[derive(Clone)]
pub struct ReservationView {
    pub action: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub options: Vec<PurchaseOptionView>,
    pub price_label: String,
    pub deposit_label: String,
    pub errors: FormFieldErrors,
}

#[derive(Clone)]
pub struct StaticPageView {
    pub home_href: String,
    pub reserve_href: String,
    pub contact_href: String,
}

#[derive(Clone)]
pub struct SubjectOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Clone)]
pub struct ContactView {
    pub action: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub message: String,
    pub subjects: Vec<SubjectOptionView>,
    pub captcha: CaptchaTicket,
    pub refresh_captcha_href: String,
    pub errors: FormFieldErrors,
}

// News

#[derive(Clone)]
pub struct NewsListView {
    pub heading: String,
    pub posts: Vec<PostCard>,
    pub pager: PagerView,
    pub search_action: String,
    pub search_query: String,
    pub categories: Vec<FilterLinkView>,
    pub tags: Vec<FilterLinkView>,
    pub popular_tags: Vec<FilterLinkView>,
}

#[derive(Clone)]
pub struct CommentView {
    pub name: String,
    pub body: String,
    pub created: String,
}

#[derive(Clone)]
pub struct NewsDetailView {
    pub post_id: i64,
    pub title: String,
    /// Trusted HTML written through the admin API.
    pub body: String,
    pub author: String,
    pub published: String,
    pub category: FilterLinkView,
    pub tags: Vec<FilterLinkView>,
    pub featured_image: Option<String>,
    pub available_in_current_language: bool,
    pub comments: Vec<CommentView>,
    pub similar: Vec<PostCard>,
    pub popular_tags: Vec<FilterLinkView>,
    pub previous: Option<PostCard>,
    pub next: Option<PostCard>,
    pub comment_action: String,
    pub captcha: CaptchaTicket,
    pub refresh_captcha_href: String,
    pub news_href: String,
}

// Shop

#[derive(Clone)]
pub struct ProductView {
    pub name: String,
    pub href: String,
    pub description: String,
    pub price_label: String,
    pub type_label: &'static str,
    pub category: Option<String>,
    pub featured: bool,
}

impl ProductView {
    pub fn new(product: &ProductRecord, href: String) -> Self {
        Self {
            name: product.name.clone(),
            href,
            description: product.description.clone(),
            price_label: format_clp(product.price),
            type_label: product_type_label(product.product_type),
            category: product.category_name.clone(),
            featured: product.featured,
        }
    }
}

pub fn product_type_label(kind: ProductType) -> &'static str {
    match kind {
        ProductType::Physical => "Producto físico",
        ProductType::Course => "Curso",
        ProductType::Digital => "Producto digital",
    }
}

#[derive(Clone)]
pub struct SelectOptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone)]
pub struct ShopView {
    pub action: String,
    pub products: Vec<ProductView>,
    pub featured: Vec<ProductView>,
    pub total_active: u64,
    pub categories: Vec<FilterLinkView>,
    pub types: Vec<SelectOptionView>,
    pub sorts: Vec<SelectOptionView>,
    pub min_price: String,
    pub max_price: String,
    pub pager: PagerView,
}

#[derive(Clone)]
pub struct ProductDetailView {
    pub product: ProductView,
    pub related: Vec<ProductView>,
    pub shop_href: String,
}

#[derive(Clone)]
pub struct ErrorPageView {
    pub status: u16,
    pub title: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub view: LayoutContext<HomeView>,
}

#[derive(Template)]
#[template(path = "reservar.html")]
pub struct ReservationTemplate {
    pub view: LayoutContext<ReservationView>,
}

#[derive(Template)]
#[template(path = "gracias.html")]
pub struct ThanksTemplate {
    pub view: LayoutContext<StaticPageView>,
}

#[derive(Template)]
#[template(path = "empresas.html")]
pub struct CompaniesTemplate {
    pub view: LayoutContext<StaticPageView>,
}

#[derive(Template)]
#[template(path = "contacto.html")]
pub struct ContactTemplate {
    pub view: LayoutContext<ContactView>,
}

#[derive(Template)]
#[template(path = "news_list.html")]
pub struct NewsListTemplate {
    pub view: LayoutContext<NewsListView>,
}

#[derive(Template)]
#[template(path = "news_detail.html")]
pub struct NewsDetailTemplate {
    pub view: LayoutContext<NewsDetailView>,
}

#[derive(Template)]
#[template(path = "shop.html")]
pub struct ShopTemplate {
    pub view: LayoutContext<ShopView>,
}

#[derive(Template)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub view: LayoutContext<ProductDetailView>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
