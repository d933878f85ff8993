//! Magic: The Gathering card metadata via Scryfall.
//!
//! A card page does not expose its API id directly; it is discovered
//! through the oEmbed link in the page's `<head>`, then the card is
//! fetched from the REST API and flattened. Multi-faced cards take their
//! text and images from the faces array.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

static OEMBED_CARD_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"cards/([a-f0-9-]+)/oembed").expect("oembed pattern is valid")
});

/// Reshaped card record.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub name: String,
    pub colors: Vec<String>,
    pub type_line: String,
    pub set: String,
    pub set_name: String,
    pub oracle_text: String,
    pub flavor_text: String,
    pub rarity: String,
    pub collector_number: String,
    pub artist: String,
    pub released_at: String,
    pub image: String,
    pub back: Option<String>,
}

#[derive(Default, Deserialize)]
struct CardData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    type_line: String,
    #[serde(default)]
    set: String,
    #[serde(default)]
    set_name: String,
    #[serde(default)]
    oracle_text: String,
    #[serde(default)]
    flavor_text: String,
    #[serde(default)]
    rarity: String,
    #[serde(default)]
    collector_number: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    released_at: String,
    #[serde(default)]
    image_uris: ImageUris,
    #[serde(default)]
    card_faces: Vec<CardFace>,
}

#[derive(Default, Deserialize)]
struct CardFace {
    #[serde(default)]
    oracle_text: String,
    #[serde(default)]
    flavor_text: String,
    #[serde(default)]
    image_uris: ImageUris,
}

#[derive(Default, Deserialize)]
struct ImageUris {
    #[serde(default)]
    png: String,
}

fn color_name(code: &str) -> Option<&'static str> {
    match code {
        "W" => Some("White"),
        "U" => Some("Blue"),
        "B" => Some("Black"),
        "R" => Some("Red"),
        "G" => Some("Green"),
        _ => None,
    }
}

pub struct ScryfallClient {
    http: reqwest::Client,
    api_url: String,
}

impl ScryfallClient {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: "https://api.scryfall.com".to_string(),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Discover the card id behind a card page and fetch its record.
    ///
    /// # Errors
    ///
    /// Returns an error if the page carries no oEmbed link or a request
    /// fails.
    pub async fn card_from_page(&self, page_url: &str) -> Result<Card> {
        let response = self
            .http
            .get(page_url)
            .send()
            .await
            .context("Scryfall page request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Scryfall page request returned {status}");
        }

        let html = response
            .text()
            .await
            .context("failed to read Scryfall page body")?;

        let oembed_url = oembed_link(&html)
            .with_context(|| format!("no oEmbed link found on {page_url}"))?;
        let id = parse_oembed_url(&oembed_url)?;

        self.card_by_id(&id).await
    }

    /// Fetch a card record by Scryfall id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn card_by_id(&self, id: &str) -> Result<Card> {
        let response = self
            .http
            .get(format!("{}/cards/{id}", self.api_url))
            .send()
            .await
            .context("Scryfall card request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Scryfall card request returned {status} for {id}");
        }

        let data: CardData = response
            .json()
            .await
            .context("failed to decode Scryfall card response")?;

        Ok(flatten_card(data))
    }
}

fn flatten_card(data: CardData) -> Card {
    let oracle_text = if data.oracle_text.is_empty() {
        data.card_faces
            .first()
            .map(|face| face.oracle_text.clone())
            .unwrap_or_default()
    } else {
        data.oracle_text
    };

    let flavor_text = if data.flavor_text.is_empty() {
        data.card_faces
            .first()
            .map(|face| face.flavor_text.clone())
            .unwrap_or_default()
    } else {
        data.flavor_text
    };

    let image = if data.card_faces.is_empty() {
        data.image_uris.png
    } else {
        data.card_faces[0].image_uris.png.clone()
    };

    let back = data
        .card_faces
        .get(1)
        .map(|face| face.image_uris.png.clone());

    Card {
        name: data.name,
        colors: data
            .colors
            .iter()
            .filter_map(|code| color_name(code))
            .map(String::from)
            .collect(),
        type_line: data.type_line,
        set: data.set.to_uppercase(),
        set_name: data.set_name,
        oracle_text,
        flavor_text,
        rarity: data.rarity,
        collector_number: data.collector_number,
        artist: data.artist,
        released_at: data.released_at,
        image,
        back,
    }
}

/// Find the oEmbed alternate link in a card page's head.
fn oembed_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("link[rel='alternate'][type='application/json+oembed']").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(String::from)
}

/// Extract the card id from an oEmbed URL.
///
/// # Errors
///
/// Returns an error if the URL does not contain a card id.
pub fn parse_oembed_url(url: &str) -> Result<String> {
    let caps = OEMBED_CARD_ID
        .captures(url)
        .with_context(|| format!("not a Scryfall oEmbed URL: {url}"))?;
    Ok(caps[1].to_string())
}
