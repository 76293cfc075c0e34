//! Rate design endpoints (`/rates`).

use std::borrow::Cow;

use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::models::{OptimisationResult, RateModel};

use super::client::{ApiClient, RequestOptions};
use super::ApiError;

/// Non-standard number literals some JSON encoders emit.
const NON_FINITE_LITERALS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

impl ApiClient {
    /// Bill impacts per customer class for a candidate rate structure.
    pub async fn model_rates<P: Serialize + ?Sized>(&self, parameters: &P) -> Result<RateModel, ApiError> {
        self.post("/rates/model", parameters).await?.deserialize()
    }

    /// Ask the server for an optimised tier structure.
    ///
    /// The unbounded last tier comes back as a bare `Infinity`, which is not
    /// JSON, so this reads the raw body and maps non-finite numbers to
    /// `null` (`RateTier::up_to == None`) before decoding.
    pub async fn optimise_rates<P: Serialize + ?Sized>(
        &self,
        parameters: &P,
    ) -> Result<OptimisationResult, ApiError> {
        let body = serde_json::to_value(parameters).map_err(ApiError::Encode)?;
        let text = self
            .request_text("/rates/optimise", RequestOptions::new(Method::POST).json(body))
            .await?;

        let cleaned = non_finite_to_null(&text);
        if matches!(cleaned, Cow::Owned(_)) {
            debug!("Replaced non-finite numbers in rate optimisation reply");
        }
        serde_json::from_str(&cleaned).map_err(ApiError::Decode)
    }
}

/// Replace `Infinity`, `-Infinity` and `NaN` outside string literals with `null`.
fn non_finite_to_null(text: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut changed = false;
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if !in_string {
            if let Some(literal) = NON_FINITE_LITERALS.iter().find(|l| rest.starts_with(**l)) {
                if !changed {
                    out.reserve(text.len());
                    out.push_str(&text[..text.len() - rest.len()]);
                    changed = true;
                }
                out.push_str("null");
                rest = &rest[literal.len()..];
                continue;
            }
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        }

        if changed {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}
