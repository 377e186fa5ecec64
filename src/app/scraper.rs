//! Directory page scraping
//!
//! Each listing page holds a grid of station containers. A station is only
//! usable if its container has the play control carrying the stream URL; the
//! genre comes from the first genre link in the same container.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::app::context::RunContext;
use crate::app::models::StationCandidate;
use crate::constants::directory;
use crate::errors::{ParseError, ParseResult};

/// Fetch one directory page and extract its station candidates
///
/// Never fails: a page that cannot be fetched or parsed yields no
/// candidates. Known-broken stream URLs are dropped here already.
pub async fn scrape_page(ctx: &RunContext, page_url: &Url) -> Vec<StationCandidate> {
    let html = match ctx.fetcher().fetch_page(page_url).await {
        Ok(html) => html,
        Err(e) => {
            ctx.stats().record_page_failed();
            tracing::warn!("Failed to fetch directory page {}: {}", page_url, e);
            return Vec::new();
        }
    };

    let candidates = match parse_stations(&html) {
        Ok(candidates) => candidates,
        Err(e) => {
            ctx.stats().record_page_failed();
            tracing::warn!("Failed to parse directory page {}: {}", page_url, e);
            return Vec::new();
        }
    };

    ctx.stats().record_page_scraped(candidates.len());
    let listed = candidates.len();
    let candidates: Vec<StationCandidate> = candidates
        .into_iter()
        .filter(|candidate| !ctx.skip_if_known_broken(&candidate.stream_url))
        .collect();

    tracing::info!(
        "Scraped {}: {} stations ({} known broken)",
        page_url,
        candidates.len(),
        listed - candidates.len()
    );
    candidates
}

/// Extract station candidates from directory page markup
///
/// Containers without a play control, or whose control has no stream URL,
/// are skipped.
pub fn parse_stations(html: &str) -> ParseResult<Vec<StationCandidate>> {
    let document = Html::parse_document(html);
    let station_selector = selector(directory::STATION_SELECTOR)?;
    let button_selector = selector(directory::BUTTON_SELECTOR)?;
    let link_selector = selector(directory::LINK_SELECTOR)?;

    let mut candidates = Vec::new();
    for station in document.select(&station_selector) {
        let Some(play) = station
            .select(&button_selector)
            .find(|button| button.value().attr("class") == Some(directory::PLAY_BUTTON_CLASS))
        else {
            tracing::debug!("Station container without play control, skipping");
            continue;
        };

        let stream_url = play
            .value()
            .attr(directory::STREAM_ATTR)
            .map(str::trim)
            .unwrap_or_default();
        if stream_url.is_empty() {
            tracing::debug!("Play control without stream URL, skipping");
            continue;
        }

        let display_name =
            normalize_name(play_attr(&play, directory::NAME_ATTR).unwrap_or_default());
        let genre = find_genre(&station, &link_selector);

        candidates.push(StationCandidate {
            stream_url: stream_url.to_string(),
            display_name,
            genre,
        });
    }

    Ok(candidates)
}

/// Attribute lookup tolerant of the parser lower-casing attribute names
fn play_attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    let value = element.value();
    value
        .attr(name)
        .or_else(|| value.attr(&name.to_ascii_lowercase()))
}

fn find_genre(station: &ElementRef<'_>, link_selector: &Selector) -> String {
    station
        .select(link_selector)
        .find(|link| {
            link.value()
                .attr("href")
                .map(|href| href.contains(directory::GENRE_PATH_MARKER))
                .unwrap_or(false)
        })
        .map(|link| capitalize_first(link.text().collect::<String>().trim()))
        .filter(|genre| !genre.is_empty())
        .unwrap_or_else(|| directory::UNKNOWN_GENRE.to_string())
}

/// Make a station name safe for the pipe-delimited, double-quoted output
///
/// Every quote variant, escaped or literal, becomes an apostrophe and pipes
/// become slashes.
pub fn normalize_name(raw: &str) -> String {
    const QUOTE_ENTITIES: &[&str] = &["&#34;", "&quot;", "&#39;", "&#x27;", "&apos;"];
    const QUOTE_CHARS: &[char] = &[
        '"', '\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}', '\u{201C}', '\u{201D}', '\u{201E}',
        '\u{00AB}', '\u{00BB}', '`', '\u{00B4}',
    ];

    let mut name = raw.to_string();
    for entity in QUOTE_ENTITIES {
        name = name.replace(entity, "'");
    }
    name.replace(QUOTE_CHARS, "'")
        .replace('|', "/")
        .trim()
        .to_string()
}

/// Upper-case the first character, leave the rest alone
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn selector(css: &str) -> ParseResult<Selector> {
    Selector::parse(css).map_err(|_| ParseError::InvalidSelector {
        selector: css.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body><ul class="stations__list">
          <li class="stations__station">
            <button class="b-play station_play" stream="http://cdn.test/relax" radioName="Radio &#34;Relax&#34;"></button>
            <a href="/ua/radiorelax/">Relax</a>
            <a href="/ua/genre/chillout/">  chillout </a>
            <a href="/ua/genre/lounge/">lounge</a>
          </li>
          <li class="stations__station">
            <button class="b-fav">fav</button>
            <a href="/ua/genre/rock/">rock</a>
          </li>
          <li class="stations__station">
            <button class="b-play station_play active" stream="http://cdn.test/other" radioName="Other"></button>
          </li>
          <li class="stations__station">
            <button class="b-play station_play" stream="  http://cdn.test/kyiv " radioName="Kyiv&#39;s FM"></button>
          </li>
        </ul></body></html>"#;

    #[test]
    fn test_parse_stations_extracts_candidates() {
        let candidates = parse_stations(PAGE).unwrap();
        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates[0].stream_url, "http://cdn.test/relax");
        assert_eq!(candidates[0].display_name, "Radio 'Relax'");
        assert_eq!(candidates[0].genre, "Chillout");

        assert_eq!(candidates[1].stream_url, "http://cdn.test/kyiv");
        assert_eq!(candidates[1].display_name, "Kyiv's FM");
        assert_eq!(candidates[1].genre, "Unknown");
    }

    #[test]
    fn test_play_class_must_match_exactly() {
        let candidates = parse_stations(PAGE).unwrap();
        assert!(candidates.iter().all(|c| c.stream_url != "http://cdn.test/other"));
    }

    #[test]
    fn test_page_without_stations() {
        let candidates = parse_stations("<html><body>Nothing here</body></html>").unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_normalize_name_quote_variants() {
        assert_eq!(normalize_name("&#34;Hit&#34; FM"), "'Hit' FM");
        assert_eq!(normalize_name("Rock&#39;n&#39;Roll"), "Rock'n'Roll");
        assert_eq!(normalize_name("\u{201C}Lux\u{201D} \u{00AB}FM\u{00BB}"), "'Lux' 'FM'");
        assert_eq!(normalize_name("Jazz | Blues"), "Jazz / Blues");
        assert_eq!(normalize_name("  \"Plain\"  "), "'Plain'");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("pop"), "Pop");
        assert_eq!(capitalize_first("ёлка"), "Ёлка");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("Dance music"), "Dance music");
    }
}
