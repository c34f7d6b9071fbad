//! Request bodies for the Elasticsearch REST API.

use hotel_booking_core::providers::SearchQuery;
use serde_json::{Value, json};

/// Fields searched by free-text queries, with boosts.
pub const TEXT_FIELDS: [&str; 3] = ["name^3", "description", "city"];

/// Index settings and mapping for hotel documents.
#[must_use]
pub fn index_definition() -> Value {
    json!({
        "settings": {
            "analysis": {
                "normalizer": {
                    "lowercase_normalizer": {
                        "type": "custom",
                        "filter": ["lowercase"]
                    }
                }
            }
        },
        "mappings": {
            "properties": {
                "hotel_id": { "type": "keyword" },
                "owner_id": { "type": "keyword" },
                "name": { "type": "text" },
                "description": { "type": "text" },
                "city": { "type": "keyword", "normalizer": "lowercase_normalizer" },
                "country": { "type": "keyword", "normalizer": "lowercase_normalizer" },
                "star_rating": { "type": "byte" },
                "amenities": { "type": "keyword" },
                "location": { "type": "geo_point" }
            }
        }
    })
}

/// `_search` body for `query`.
#[must_use]
pub fn search_body(query: &SearchQuery) -> Value {
    let must = match query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => json!([{
            "multi_match": {
                "query": text,
                "fields": TEXT_FIELDS,
                "fuzziness": "AUTO"
            }
        }]),
        None => json!([{ "match_all": {} }]),
    };

    let mut filter = Vec::new();
    if let Some(city) = &query.city {
        filter.push(json!({ "term": { "city": city } }));
    }
    if let Some(country) = &query.country {
        filter.push(json!({ "term": { "country": country } }));
    }
    if let Some(min_stars) = query.min_stars {
        filter.push(json!({ "range": { "star_rating": { "gte": min_stars } } }));
    }
    if let Some(near) = &query.near {
        filter.push(json!({
            "geo_distance": {
                "distance": format!("{}km", near.radius_km),
                "location": { "lat": near.point.lat, "lon": near.point.lon }
            }
        }));
    }

    json!({
        "from": query.page.offset(),
        "size": query.page.limit(),
        "track_total_hits": true,
        "_source": false,
        "query": {
            "bool": {
                "must": must,
                "filter": filter
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotel_booking_core::pagination::Page;
    use hotel_booking_core::providers::{GeoFilter, GeoPoint};

    #[test]
    fn text_query_boosts_name() {
        let body = search_body(&SearchQuery {
            text: Some("harbour".to_string()),
            ..SearchQuery::default()
        });
        let multi = &body["query"]["bool"]["must"][0]["multi_match"];
        assert_eq!(multi["query"], "harbour");
        assert_eq!(multi["fields"][0], "name^3");
        assert_eq!(body["query"]["bool"]["filter"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn blank_text_matches_all() {
        let body = search_body(&SearchQuery {
            text: Some("   ".to_string()),
            ..SearchQuery::default()
        });
        assert!(body["query"]["bool"]["must"][0].get("match_all").is_some());
    }

    #[test]
    fn filters_and_paging() {
        let body = search_body(&SearchQuery {
            text: None,
            city: Some("Lisbon".to_string()),
            country: Some("PT".to_string()),
            min_stars: Some(4),
            near: Some(GeoFilter {
                point: GeoPoint { lat: 38.7, lon: -9.1 },
                radius_km: 2.5,
            }),
            page: Page::new(Some(3), Some(10)),
        });

        let filter = body["query"]["bool"]["filter"].as_array().cloned().unwrap_or_default();
        assert_eq!(filter.len(), 4);
        assert_eq!(filter[0]["term"]["city"], "Lisbon");
        assert_eq!(filter[2]["range"]["star_rating"]["gte"], 4);
        assert_eq!(filter[3]["geo_distance"]["distance"], "2.5km");
        assert_eq!(body["from"], 20);
        assert_eq!(body["size"], 10);
    }

    #[test]
    fn mapping_declares_geo_point() {
        let def = index_definition();
        assert_eq!(def["mappings"]["properties"]["location"]["type"], "geo_point");
        assert_eq!(def["mappings"]["properties"]["city"]["type"], "keyword");
    }
}
