//! Captcha hand-off.
//!
//! The court sites gate the cause-list behind an image captcha that only a
//! human can solve. The engine's part is mechanical: pull the image out of
//! the live page so it can be shown to the operator, then type their
//! answer back in and submit.

use crate::capture::navigate::sanitize_js_string;
use crate::fetch::HttpClient;
use crate::renderer::{wait_for_ready, RenderContext};
use anyhow::{bail, Context, Result};
use base64::Engine;
use std::path::{Path, PathBuf};
use tracing::debug;

const IMAGE_FETCH_TIMEOUT_MS: u64 = 15_000;

/// Readiness budget after submitting the captcha form.
const SUBMIT_SETTLE_MS: u64 = 5000;

/// Script resolving the captcha image's src, or null when absent.
const CAPTCHA_SRC_SCRIPT: &str = r#"(() => {
    const img = document.querySelector(
        "img[src*='captcha' i], img[id*='imgCaptcha' i], img[alt='Captcha']");
    return img ? img.src : null;
})()"#;

/// Save the page's captcha image to `dest` for the operator to look at.
///
/// Handles both inline `data:` images and plain image URLs; the latter are
/// fetched over HTTP, outside the browser.
pub async fn save_captcha_image(
    ctx: &dyn RenderContext,
    http: &HttpClient,
    dest: &Path,
) -> Result<PathBuf> {
    let src = ctx
        .execute_js(CAPTCHA_SRC_SCRIPT)
        .await
        .context("failed to look up captcha image")?;
    let Some(src) = src.as_str().map(str::to_owned) else {
        bail!("no captcha image found on the page");
    };

    let bytes = if let Some(data) = src.strip_prefix("data:") {
        let Some((header, payload)) = data.split_once(',') else {
            bail!("malformed data URL in captcha image");
        };
        if !header.ends_with(";base64") {
            bail!("captcha data URL is not base64-encoded");
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .context("captcha data URL payload is not valid base64")?
    } else {
        http.get_bytes(&src, IMAGE_FETCH_TIMEOUT_MS)
            .await
            .context("failed to download captcha image")?
    };

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(dest, &bytes)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    debug!(path = %dest.display(), size = bytes.len(), "saved captcha image");
    Ok(dest.to_path_buf())
}

/// Type the operator's answer into the captcha field and submit the form.
///
/// Returns whether both the field and a submit control were found; whether
/// the answer was *correct* only shows up in the resulting page.
pub async fn submit_captcha(ctx: &dyn RenderContext, answer: &str) -> Result<bool> {
    let fill_script = format!(
        r#"(() => {{
            const field = document.querySelector(
                "input[id*='captcha' i], input[name*='captcha' i]");
            if (!field) return {{ success: false }};
            field.value = '{}';
            field.dispatchEvent(new Event('input', {{ bubbles: true }}));
            return {{ success: true }};
        }})()"#,
        sanitize_js_string(answer)
    );
    let filled = ctx
        .execute_js(&fill_script)
        .await
        .context("failed to fill captcha field")?;
    if !succeeded(&filled) {
        return Ok(false);
    }

    const SUBMIT_SCRIPT: &str = r#"(() => {
        const byText = [...document.querySelectorAll('button, input[type=submit]')]
            .find(el => {
                const label = (el.textContent || el.value || '').trim();
                return label === 'Civil' || label === 'Criminal' || label === 'Go';
            });
        const control = byText || document.querySelector(
            "input[type=submit], button[type=submit]");
        if (!control) return { success: false };
        control.click();
        return { success: true };
    })()"#;
    let submitted = ctx
        .execute_js(SUBMIT_SCRIPT)
        .await
        .context("failed to submit captcha form")?;
    if !succeeded(&submitted) {
        return Ok(false);
    }

    wait_for_ready(ctx, SUBMIT_SETTLE_MS).await;
    Ok(true)
}

fn succeeded(value: &serde_json::Value) -> bool {
    value
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::NavigationResult;
    use async_trait::async_trait;
    use serde_json::json;

    struct CaptchaContext {
        src: Option<String>,
        has_field: bool,
    }

    #[async_trait]
    impl RenderContext for CaptchaContext {
        async fn navigate(&mut self, _url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
            bail!("not used")
        }

        async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
            if script.contains("readyState") {
                return Ok(json!(true));
            }
            if script.contains("img.src") {
                return Ok(match &self.src {
                    Some(src) => json!(src),
                    None => serde_json::Value::Null,
                });
            }
            Ok(json!({ "success": self.has_field }))
        }

        async fn get_html(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn get_url(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn print_pdf(&self) -> Result<Vec<u8>> {
            bail!("not used")
        }

        async fn history_back(&self) -> Result<()> {
            Ok(())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_saves_data_url_image() {
        let payload = base64::engine::general_purpose::STANDARD.encode(b"fake png bytes");
        let ctx = CaptchaContext {
            src: Some(format!("data:image/png;base64,{payload}")),
            has_field: true,
        };
        let http = HttpClient::new(5000);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("captcha.png");

        let path = save_captcha_image(&ctx, &http, &dest).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"fake png bytes");
    }

    #[tokio::test]
    async fn test_missing_image_is_an_error() {
        let ctx = CaptchaContext {
            src: None,
            has_field: true,
        };
        let http = HttpClient::new(5000);
        let dir = tempfile::tempdir().unwrap();
        let result = save_captcha_image(&ctx, &http, &dir.path().join("c.png")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_non_base64_data_url_is_an_error() {
        let ctx = CaptchaContext {
            src: Some("data:image/svg+xml,<svg/>".into()),
            has_field: true,
        };
        let http = HttpClient::new(5000);
        let dir = tempfile::tempdir().unwrap();
        let result = save_captcha_image(&ctx, &http, &dir.path().join("c.png")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_submit_reports_missing_field() {
        let ctx = CaptchaContext {
            src: None,
            has_field: false,
        };
        assert!(!submit_captcha(&ctx, "AB12").await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_succeeds() {
        let ctx = CaptchaContext {
            src: None,
            has_field: true,
        };
        assert!(submit_captcha(&ctx, "AB12").await.unwrap());
    }
}
