//! HTML player page unwrapping
//!
//! Many stations advertise a small HTML page with an `<audio>` player rather
//! than the stream itself. The real endpoint is read from the page's
//! `<source>` elements, or from the `<audio src>` attribute when the page has
//! no `<source>` elements at all.

use scraper::{Html, Selector};

use crate::app::stream::format;
use crate::errors::{ParseError, ParseResult};

const SOURCE_SELECTOR: &str = "source";
const AUDIO_SELECTOR: &str = "audio[src]";

/// Raw `src` values of the audio sources embedded in a wrapper page
///
/// Sources come back in document order. `<source>` elements qualify only
/// when their `type` is a supported audio MIME type and their `src` is not
/// empty. The `src` of `<audio>` elements is used only when the page has no
/// `<source>` element of any kind. An empty result means no usable audio.
pub fn embedded_audio_sources(html: &str) -> ParseResult<Vec<String>> {
    let document = Html::parse_document(html);
    let source_selector = selector(SOURCE_SELECTOR)?;
    let audio_selector = selector(AUDIO_SELECTOR)?;

    let source_elements: Vec<_> = document.select(&source_selector).collect();
    if !source_elements.is_empty() {
        return Ok(source_elements
            .into_iter()
            .filter(|element| {
                element
                    .value()
                    .attr("type")
                    .map(|mime| format::is_supported_audio_type(&format::base_mime(mime)))
                    .unwrap_or(false)
            })
            .filter_map(|element| non_empty(element.value().attr("src")))
            .collect());
    }

    Ok(document
        .select(&audio_selector)
        .filter_map(|element| non_empty(element.value().attr("src")))
        .collect())
}

fn selector(css: &str) -> ParseResult<Selector> {
    Selector::parse(css).map_err(|_| ParseError::InvalidSelector {
        selector: css.to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
