//! services/api/src/adapters/sanity.rs
//!
//! This module contains the adapter for the headless content store that
//! holds testimonials. It implements the `ContentStore` port from the
//! `core` crate against a Sanity-style HTTP API: documents are written
//! through the mutations endpoint and read back with a filtered query.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tutoring_core::domain::{NewTestimonial, Testimonial};
use tutoring_core::ports::{ContentStore, PortError, PortResult};

const API_VERSION: &str = "v2021-06-07";

/// Only documents an administrator has approved in the studio are public.
const APPROVED_QUERY: &str =
    r#"*[_type == "testimonial" && approved == true] | order(submittedAt desc)"#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ContentStore` port using the content
/// store's HTTP API.
#[derive(Clone)]
pub struct SanityStore {
    client: reqwest::Client,
    api_base: String,
    dataset: String,
    token: String,
}

impl SanityStore {
    /// Creates a new `SanityStore`.
    pub fn new(client: reqwest::Client, api_base: String, dataset: String, token: String) -> Self {
        Self {
            client,
            api_base,
            dataset,
            token,
        }
    }

    fn mutate_url(&self) -> String {
        format!("{}/{}/data/mutate/{}", self.api_base, API_VERSION, self.dataset)
    }

    fn query_url(&self) -> String {
        format!("{}/{}/data/query/{}", self.api_base, API_VERSION, self.dataset)
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct MutateResponse {
    results: Vec<MutateResult>,
}

#[derive(Deserialize)]
struct MutateResult {
    id: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: Vec<TestimonialDoc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestimonialDoc {
    #[serde(rename = "_id")]
    id: String,
    author_name: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    quote_en: String,
    #[serde(default)]
    quote_de: String,
    rating: u8,
    approved: bool,
    submitted_at: chrono::DateTime<Utc>,
}

impl TestimonialDoc {
    fn to_domain(self) -> Testimonial {
        Testimonial {
            id: self.id,
            author_name: self.author_name,
            role: self.role,
            quote_en: self.quote_en,
            quote_de: self.quote_de,
            rating: self.rating,
            approved: self.approved,
            submitted_at: self.submitted_at,
        }
    }
}

//=========================================================================================
// `ContentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentStore for SanityStore {
    async fn create_testimonial(&self, testimonial: &NewTestimonial) -> PortResult<String> {
        let body = json!({
            "mutations": [{
                "create": {
                    "_type": "testimonial",
                    "authorName": testimonial.author_name,
                    "authorEmail": testimonial.author_email,
                    "role": testimonial.role,
                    "quoteEn": testimonial.quote_en,
                    "quoteDe": testimonial.quote_de,
                    "rating": testimonial.rating,
                    "approved": false,
                    "submittedAt": Utc::now().to_rfc3339(),
                }
            }]
        });

        let response = self
            .client
            .post(self.mutate_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "testimonial create failed with {}: {}",
                status, text
            )));
        }

        let mutated: MutateResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        mutated
            .results
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| PortError::Unexpected("mutation returned no document id".to_string()))
    }

    async fn list_approved_testimonials(&self) -> PortResult<Vec<Testimonial>> {
        let response = self
            .client
            .get(self.query_url())
            .bearer_auth(&self.token)
            .query(&[("query", APPROVED_QUERY)])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "testimonial query failed with {}: {}",
                status, text
            )));
        }

        let queried: QueryResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(queried.result.into_iter().map(TestimonialDoc::to_domain).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approved_query_filters_on_the_approval_flag() {
        assert!(APPROVED_QUERY.contains("approved == true"));
    }

    #[test]
    fn parses_a_query_response_document() {
        let body = r#"{
            "result": [{
                "_id": "t-1",
                "authorName": "Marta",
                "role": "IELTS student",
                "quoteEn": "Passed with band 8.",
                "quoteDe": "",
                "rating": 5,
                "approved": true,
                "submittedAt": "2025-02-01T10:00:00Z"
            }]
        }"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        let testimonial = parsed.result.into_iter().next().unwrap().to_domain();
        assert_eq!(testimonial.id, "t-1");
        assert_eq!(testimonial.rating, 5);
        assert!(testimonial.approved);
        assert!(testimonial.quote_de.is_empty());
    }
}
