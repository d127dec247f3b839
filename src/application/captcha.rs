//! In-process image captcha used by the comment and contact forms.
//!
//! Challenges are single use: verifying one removes it whether or not the
//! answer matched.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const CAPTCHA_TTL: Duration = Duration::from_secs(5 * 60);
pub const CHALLENGE_LENGTH: usize = 6;

// No 0/O or 1/I.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

struct Challenge {
    answer: String,
    expires_at: Instant,
}

/// Fresh challenge as returned by `GET /refresh-captcha/`.
#[derive(Debug, Clone, Serialize)]
pub struct CaptchaTicket {
    pub captcha_key: String,
    pub captcha_image: String,
}

pub struct CaptchaStore {
    challenges: DashMap<String, Challenge>,
    ttl: Duration,
}

impl Default for CaptchaStore {
    fn default() -> Self {
        Self::new(CAPTCHA_TTL)
    }
}

impl CaptchaStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            challenges: DashMap::new(),
            ttl,
        }
    }

    /// Create a challenge and return its key.
    pub fn generate_key(&self) -> String {
        self.insert(random_challenge())
    }

    fn insert(&self, answer: String) -> String {
        self.purge_expired();
        let digest = Sha256::digest(Uuid::new_v4().as_bytes()).to_vec();
        let mut key = hex::encode(digest);
        key.truncate(40);
        self.challenges.insert(
            key.clone(),
            Challenge {
                answer,
                expires_at: Instant::now() + self.ttl,
            },
        );
        key
    }

    pub fn ticket(&self) -> CaptchaTicket {
        let key = self.generate_key();
        CaptchaTicket {
            captcha_image: image_url(&key),
            captcha_key: key,
        }
    }

    /// Challenge text for rendering; `None` when unknown or expired.
    pub fn challenge(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entry = self.challenges.get(key)?;
        if entry.expires_at <= now {
            drop(entry);
            self.challenges.remove(key);
            return None;
        }
        Some(entry.answer.clone())
    }

    /// Consume the challenge under `key` and compare, ignoring case.
    pub fn verify(&self, key: &str, answer: &str) -> bool {
        let Some((_, challenge)) = self.challenges.remove(key) else {
            return false;
        };
        challenge.expires_at > Instant::now()
            && challenge.answer.eq_ignore_ascii_case(answer.trim())
    }

    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.challenges.retain(|_, challenge| challenge.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    #[cfg(test)]
    fn insert_known(&self, answer: &str) -> String {
        self.insert(answer.to_string())
    }
}

pub fn image_url(key: &str) -> String {
    format!("/captcha/image/{key}/")
}

fn random_challenge() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(CHALLENGE_LENGTH)
        .map(|byte| ALPHABET[usize::from(*byte) % ALPHABET.len()] as char)
        .collect()
}

/// Render a challenge as a small SVG with jittered glyphs and noise lines.
pub fn render_svg(challenge: &str) -> String {
    let seed = Sha256::digest(challenge.as_bytes()).to_vec();
    let width = 30 * challenge.len() + 20;
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"50\" viewBox=\"0 0 {width} 50\">\
         <rect width=\"100%\" height=\"100%\" fill=\"#f4f4f4\"/>"
    );

    for (index, glyph) in challenge.chars().enumerate() {
        let jitter = seed[index % seed.len()];
        let x = 12 + index * 30;
        let y = 32 + usize::from(jitter % 8);
        let rotate = i32::from(jitter % 30) - 15;
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" font-family=\"monospace\" font-size=\"28\" \
             fill=\"#333\" transform=\"rotate({rotate} {x} {y})\">{glyph}</text>"
        );
    }

    for line in 0..3 {
        let a = usize::from(seed[(line * 4) % seed.len()]);
        let b = usize::from(seed[(line * 4 + 1) % seed.len()]);
        let _ = write!(
            svg,
            "<line x1=\"0\" y1=\"{}\" x2=\"{width}\" y2=\"{}\" stroke=\"#999\" stroke-width=\"1\"/>",
            a % 50,
            b % 50
        );
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenges_are_single_use_and_case_insensitive() {
        let store = CaptchaStore::default();
        let key = store.insert_known("AB12CD");

        assert_eq!(store.challenge(&key).as_deref(), Some("AB12CD"));
        assert!(store.verify(&key, " ab12cd "));
        assert!(!store.verify(&key, "AB12CD"));
        assert!(store.challenge(&key).is_none());
    }

    #[test]
    fn wrong_answer_still_consumes_the_challenge() {
        let store = CaptchaStore::default();
        let key = store.insert_known("XYZ789");

        assert!(!store.verify(&key, "nope"));
        assert!(store.is_empty());
    }

    #[test]
    fn expired_challenges_are_rejected() {
        let store = CaptchaStore::new(Duration::ZERO);
        let key = store.generate_key();

        assert!(store.challenge(&key).is_none());
        assert!(!store.verify(&key, "anything"));
    }

    #[test]
    fn generated_challenges_use_the_unambiguous_alphabet() {
        let store = CaptchaStore::default();
        let ticket = store.ticket();
        let challenge = store.challenge(&ticket.captcha_key).expect("live challenge");

        assert_eq!(challenge.len(), CHALLENGE_LENGTH);
        assert!(challenge.bytes().all(|byte| ALPHABET.contains(&byte)));
        assert_eq!(ticket.captcha_image, format!("/captcha/image/{}/", ticket.captcha_key));
        assert_eq!(ticket.captcha_key.len(), 40);
    }

    #[test]
    fn svg_contains_every_glyph() {
        let svg = render_svg("QW3RTY");
        assert!(svg.starts_with("<svg"));
        for glyph in "QW3RTY".chars() {
            assert!(svg.contains(&format!(">{glyph}</text>")));
        }
    }
}
