//! Offline search backend: canned results without network access.
//!
//! Lets the full lesson graph run in demos and end-to-end tests. Results
//! are deterministic for a given query.

use async_trait::async_trait;
use eduguardian_core::error::SearchError;
use eduguardian_core::search::*;

pub struct OfflineSearch;

#[async_trait]
impl SearchProvider for OfflineSearch {
    fn name(&self) -> &str {
        "offline"
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let results = canned_results(&request.query, request.max_results);
        let images = if request.include_images {
            vec![format!(
                "https://images.example.com/diagrams/{}.png",
                slug(&request.query)
            )]
        } else {
            Vec::new()
        };
        Ok(SearchResponse { results, images })
    }
}

fn canned_results(query: &str, count: usize) -> Vec<SearchResult> {
    let q = query.to_lowercase();

    let topics: [(&str, &[(&str, &str, &str)]); 2] = [
        ("gravity", &[
            (
                "Gravity - NASA Science",
                "https://science.nasa.gov/gravity",
                "Gravity is the force by which a planet or other body draws objects toward its center.",
            ),
            (
                "Newton's law of universal gravitation",
                "https://en.wikipedia.org/wiki/Newton%27s_law_of_universal_gravitation",
                "Every particle attracts every other particle with a force proportional to the product of their masses.",
            ),
        ]),
        ("black hole", &[
            (
                "What Is a Black Hole? - NASA",
                "https://www.nasa.gov/black-holes",
                "A black hole is a place in space where gravity pulls so much that even light cannot get out.",
            ),
            (
                "Event horizon",
                "https://en.wikipedia.org/wiki/Event_horizon",
                "The event horizon is the boundary beyond which nothing can escape a black hole.",
            ),
        ]),
    ];

    for (keyword, hits) in topics {
        if q.contains(keyword) {
            return hits
                .iter()
                .take(count)
                .map(|(title, url, content)| SearchResult {
                    title: (*title).into(),
                    url: (*url).into(),
                    content: (*content).into(),
                })
                .collect();
        }
    }

    (0..count)
        .map(|i| SearchResult {
            title: format!("Result {} for: {}", i + 1, query),
            url: format!("https://example.com/search?q={}&p={}", query.replace(' ', "+"), i + 1),
            content: format!("Offline reference text {} about '{}'.", i + 1, query),
        })
        .collect()
}

fn slug(query: &str) -> String {
    query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
