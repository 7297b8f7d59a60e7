//! Picks a random template from an Imgflip-style listing.

use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::MemeError;

/// Body of `GET /get_memes`.
#[derive(Debug, Deserialize)]
pub struct TemplateListing {
    /// Whether the listing call worked
    pub success: bool,
    /// Present when `success` is true
    #[serde(default)]
    pub data: Option<TemplateData>,
}

/// The `data` object of a listing.
#[derive(Debug, Deserialize)]
pub struct TemplateData {
    /// Available templates
    #[serde(default)]
    pub memes: Vec<MemeTemplate>,
}

/// A single template entry. Only `url` is required.
#[derive(Clone, Debug, Deserialize)]
pub struct MemeTemplate {
    /// Imgflip's template id
    #[serde(default)]
    pub id: Option<String>,
    /// Human-readable template name
    #[serde(default)]
    pub name: Option<String>,
    /// Where the blank template image lives
    pub url: String,
}

impl TemplateListing {
    /// Hands back the templates, or why there aren't any.
    pub fn into_templates(self) -> Result<Vec<MemeTemplate>, MemeError> {
        if !self.success {
            return Err(MemeError::InvalidResponse(
                "template listing reported failure".to_string(),
            ));
        }
        let memes = self.data.map(|data| data.memes).unwrap_or_default();
        if memes.is_empty() {
            return Err(MemeError::InvalidResponse(
                "template listing is empty".to_string(),
            ));
        }
        Ok(memes)
    }
}

/// Uniformly random pick.
pub fn choose_template(templates: &[MemeTemplate]) -> Option<&MemeTemplate> {
    templates.choose(&mut rand::rng())
}

/// Fetches the listing and returns one random template's image URL.
pub async fn fetch_template(
    client: &reqwest::Client,
    listing_url: &str,
) -> Result<String, MemeError> {
    debug!("Fetching template listing from {}", listing_url);
    let response = client.get(listing_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MemeError::UpstreamStatus {
            service: "template listing",
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    let listing: TemplateListing = serde_json::from_slice(&bytes)?;
    let templates = listing.into_templates()?;
    let template = choose_template(&templates)
        .ok_or_else(|| MemeError::InvalidResponse("template listing is empty".to_string()))?;

    info!(
        "Fetched meme template {}: {}",
        template.name.as_deref().unwrap_or("(unnamed)"),
        template.url
    );
    Ok(template.url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_with_memes_parses() {
        let listing: TemplateListing = serde_json::from_str(
            r#"{"success": true, "data": {"memes": [
                {"id": "181913649", "name": "Drake Hotline Bling", "url": "https://i.imgflip.com/30b1gx.jpg", "width": 1200, "height": 1200, "box_count": 2},
                {"url": "https://x/test.png"}
            ]}}"#,
        )
        .expect("parse listing");
        let templates = listing.into_templates().expect("templates");
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].name.as_deref(), Some("Drake Hotline Bling"));
        assert_eq!(templates[1].url, "https://x/test.png");
    }

    #[test]
    fn unsuccessful_listing_is_invalid() {
        let listing: TemplateListing =
            serde_json::from_str(r#"{"success": false}"#).expect("parse listing");
        assert!(matches!(
            listing.into_templates(),
            Err(MemeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn empty_listing_is_invalid() {
        let listing: TemplateListing =
            serde_json::from_str(r#"{"success": true, "data": {"memes": []}}"#)
                .expect("parse listing");
        assert!(listing.into_templates().is_err());
    }

    #[test]
    fn choose_picks_from_list() {
        let templates = vec![
            MemeTemplate {
                id: None,
                name: None,
                url: "https://x/a.jpg".to_string(),
            },
            MemeTemplate {
                id: None,
                name: None,
                url: "https://x/b.jpg".to_string(),
            },
        ];
        for _ in 0..20 {
            let picked = choose_template(&templates).expect("pick");
            assert!(picked.url == "https://x/a.jpg" || picked.url == "https://x/b.jpg");
        }
        assert!(choose_template(&[]).is_none());
    }
}
