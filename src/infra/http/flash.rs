//! One-shot messages carried across a redirect in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::presentation::views::FlashView;

pub const FLASH_COOKIE: &str = "landing_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    fn encode(&self) -> Option<String> {
        serde_json::to_vec(self)
            .ok()
            .map(|json| URL_SAFE_NO_PAD.encode(json))
    }

    fn decode(raw: &str) -> Option<Self> {
        let json = URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&json).ok()
    }

    pub fn into_view(self) -> FlashView {
        FlashView {
            level: match self.level {
                FlashLevel::Success => "success",
                FlashLevel::Error => "error",
            },
            message: self.message,
        }
    }
}

/// Queue `flash` for the next page view.
pub fn push(jar: CookieJar, flash: &Flash) -> CookieJar {
    let Some(value) = flash.encode() else {
        return jar;
    };
    jar.add(
        Cookie::build((FLASH_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Read and clear the pending flash, if any. Garbage in the cookie is dropped.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(flash) = jar
        .get(FLASH_COOKIE)
        .map(|cookie| Flash::decode(cookie.value()))
    else {
        return (jar, None);
    };
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_flash_is_taken_once() {
        let jar = push(CookieJar::new(), &Flash::success("Listo"));
        let (jar, flash) = take(jar);
        assert_eq!(flash, Some(Flash::success("Listo")));

        let (_, again) = take(jar);
        assert_eq!(again, None);
    }

    #[test]
    fn tampered_cookie_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "%%%"));
        let (jar, flash) = take(jar);
        assert_eq!(flash, None);
        assert!(jar.get(FLASH_COOKIE).is_none());
    }
}
