use axum::{
    Extension, Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    application::{
        contact::{ContactForm, ContactOutcome},
        error::HttpError,
        landing::{
            FeedbackForm, FeedbackOutcome, ReservationForm, ReservationOutcome,
            ReservationPrefill, ReservationPrefillQuery,
        },
        localization::ActiveLanguage,
        validation::FieldErrors,
    },
    domain::{
        pricing::{self, format_clp},
        types::{ContactSubject, PurchaseType},
    },
    infra::http::flash::{self, Flash},
    presentation::views::{
        CompaniesTemplate, ContactTemplate, ContactView, FormFieldErrors, HomeTemplate, HomeView,
        LayoutContext, PurchaseOptionView, ReservationTemplate, ReservationView, StaticPageView,
        SubjectOptionView, TestimonialView, ThanksTemplate, render_template_response,
    },
};

use super::HttpState;

const CONTACT_SENT_MESSAGE: &str =
    "Gracias por escribirnos. Te responderemos a la brevedad.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct HomeQuery {
    email: Option<String>,
    fb_error: Option<String>,
}

pub(super) async fn home(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Query(query): Query<HomeQuery>,
    jar: CookieJar,
) -> Result<Response, HttpError> {
    let metrics = state.landing.home_metrics().await?;
    let latest = state.news.latest(language.code()).await?;
    let (jar, flash) = flash::take(jar);

    let content = HomeView {
        reservations: metrics.reservations,
        pilot_companies: metrics.pilot_companies,
        satisfaction: metrics.satisfaction,
        testimonials: metrics
            .testimonials
            .iter()
            .map(|feedback| TestimonialView::new(&feedback.name, feedback.rating, &feedback.comment))
            .collect(),
        cta_email: query.email.unwrap_or_default(),
        fb_error: query.fb_error.as_deref().is_some_and(|flag| !flag.is_empty()),
        latest,
        reserve_action: state.path(&language, "/reservar/"),
        feedback_action: state.path(&language, "/feedback/"),
        news_href: state.path(&language, "/news/"),
    };
    let chrome = state
        .chrome(&language, "/", "")
        .with_flash(flash.map(Flash::into_view));
    let view = LayoutContext::new(chrome, content);
    Ok((jar, render_template_response(HomeTemplate { view }, StatusCode::OK)).into_response())
}

fn reservation_view(
    state: &HttpState,
    language: &ActiveLanguage,
    form: &ReservationForm,
    prefill: ReservationPrefill,
    errors: FieldErrors,
) -> ReservationView {
    let options = PurchaseType::ALL
        .into_iter()
        .map(|kind| {
            let quote = pricing::quote(kind);
            PurchaseOptionView {
                code: kind.code(),
                label: kind.label(),
                price_label: format_clp(quote.price),
                deposit_label: format_clp(quote.deposit),
                selected: kind.code() == prefill.tipo,
            }
        })
        .collect();

    ReservationView {
        action: state.path(language, "/reservar/"),
        name: form.name.clone(),
        email: prefill.email,
        phone: form.phone.clone(),
        options,
        price_label: prefill.price_label,
        deposit_label: prefill.deposit_label,
        errors: FormFieldErrors::new(errors),
    }
}

pub(super) async fn reservation_form(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Query(query): Query<ReservationPrefillQuery>,
) -> Response {
    let prefill = ReservationPrefill::from_query(&query);
    let content = reservation_view(
        &state,
        &language,
        &ReservationForm::default(),
        prefill,
        FieldErrors::default(),
    );
    let view = LayoutContext::new(state.chrome(&language, "/reservar/", "Reservar"), content);
    render_template_response(ReservationTemplate { view }, StatusCode::OK)
}

pub(super) async fn reserve(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Form(form): Form<ReservationForm>,
) -> Result<Response, HttpError> {
    match state.landing.reserve(form).await? {
        ReservationOutcome::Created(_) => {
            Ok(Redirect::to(&state.path(&language, "/gracias/")).into_response())
        }
        ReservationOutcome::Invalid { form, errors } => {
            let prefill = ReservationPrefill::for_code(form.email.clone(), form.tipo.clone());
            let content = reservation_view(&state, &language, &form, prefill, errors);
            let view =
                LayoutContext::new(state.chrome(&language, "/reservar/", "Reservar"), content);
            Ok(render_template_response(
                ReservationTemplate { view },
                StatusCode::OK,
            ))
        }
    }
}

fn static_page(state: &HttpState, language: &ActiveLanguage) -> StaticPageView {
    StaticPageView {
        home_href: state.path(language, "/"),
        reserve_href: format!("{}?tipo=pilot", state.path(language, "/reservar/")),
        contact_href: state.path(language, "/contacto/"),
    }
}

pub(super) async fn thanks(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
) -> Response {
    let view = LayoutContext::new(
        state.chrome(&language, "/gracias/", "Gracias"),
        static_page(&state, &language),
    );
    render_template_response(ThanksTemplate { view }, StatusCode::OK)
}

pub(super) async fn companies(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
) -> Response {
    let view = LayoutContext::new(
        state.chrome(&language, "/empresas/", "Empresas"),
        static_page(&state, &language),
    );
    render_template_response(CompaniesTemplate { view }, StatusCode::OK)
}

pub(super) async fn feedback(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, HttpError> {
    let home = state.path(&language, "/");
    let target = match state.landing.submit_feedback(form).await? {
        FeedbackOutcome::MissingName => format!("{home}?fb_error=1"),
        FeedbackOutcome::Stored(_) | FeedbackOutcome::Ignored => home,
    };
    Ok(Redirect::to(&target).into_response())
}

fn contact_view(
    state: &HttpState,
    language: &ActiveLanguage,
    form: ContactForm,
    errors: FieldErrors,
) -> ContactView {
    let subjects = ContactSubject::ALL
        .into_iter()
        .map(|subject| SubjectOptionView {
            value: subject.as_str(),
            label: subject.label(),
            selected: subject.as_str() == form.subject.trim(),
        })
        .collect();

    ContactView {
        action: state.path(language, "/contacto/"),
        name: form.name,
        email: form.email,
        phone: form.phone,
        company: form.company,
        message: form.message,
        subjects,
        captcha: state.captcha.ticket(),
        refresh_captcha_href: state.path(language, "/refresh-captcha/"),
        errors: FormFieldErrors::new(errors),
    }
}

pub(super) async fn contact_form(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    jar: CookieJar,
) -> Response {
    let (jar, flash) = flash::take(jar);
    let content = contact_view(&state, &language, ContactForm::default(), FieldErrors::default());
    let chrome = state
        .chrome(&language, "/contacto/", "Contacto")
        .with_flash(flash.map(Flash::into_view));
    let view = LayoutContext::new(chrome, content);
    (jar, render_template_response(ContactTemplate { view }, StatusCode::OK)).into_response()
}

pub(super) async fn contact(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    jar: CookieJar,
    Form(form): Form<ContactForm>,
) -> Result<Response, HttpError> {
    match state.contact.submit(form).await? {
        ContactOutcome::Sent(_) => {
            let jar = flash::push(jar, &Flash::success(CONTACT_SENT_MESSAGE));
            Ok((jar, Redirect::to(&state.path(&language, "/contacto/"))).into_response())
        }
        ContactOutcome::Invalid { form, errors } => {
            let content = contact_view(&state, &language, form, errors);
            let view =
                LayoutContext::new(state.chrome(&language, "/contacto/", "Contacto"), content);
            Ok(render_template_response(
                ContactTemplate { view },
                StatusCode::OK,
            ))
        }
    }
}
