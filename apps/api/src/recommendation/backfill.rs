//! URL back-filling — replaces missing or placeholder course URLs with web
//! sources the search actually returned.

use crate::llm_client::GroundingSource;
use crate::recommendation::CourseRecommendation;

/// True when `url` cannot be a real course link.
pub fn is_placeholder_url(url: Option<&str>) -> bool {
    match url.map(str::trim) {
        None | Some("") | Some("#") | Some("https://") | Some("http://") => true,
        Some(url) => url.contains("placeholder") || url.contains("example.com"),
    }
}

/// Fills placeholder URLs in order with unused grounding URLs, each used at most once.
///
/// Courses with a real URL are left alone. Once the sources run out, the
/// remaining placeholders stay as they are. Returns how many URLs were filled.
pub fn backfill_urls(courses: &mut [CourseRecommendation], sources: &[GroundingSource]) -> usize {
    let mut unused = sources.iter();
    let mut filled = 0;

    for course in courses
        .iter_mut()
        .filter(|c| is_placeholder_url(c.url.as_deref()))
    {
        let Some(source) = unused.next() else {
            break;
        };
        course.url = Some(source.url.clone());
        filled += 1;
    }

    filled
}
