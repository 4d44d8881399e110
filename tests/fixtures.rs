use pretty_assertions::assert_eq;

use artmap::{group_records, parse_response, popup_html, project, Coordinate, LocationDisplay};

const COMMONS: &str = "http://commons.wikimedia.org/wiki/Special:FilePath/";

fn van_gogh() -> Vec<LocationDisplay> {
    let records = parse_response(include_str!("fixtures/van_gogh.json")).expect("parse fixture");
    let groups = group_records(records).expect("group fixture");
    project(&groups).expect("project fixture")
}

fn location<'a>(locations: &'a [LocationDisplay], id: &str) -> &'a LocationDisplay {
    locations
        .iter()
        .find(|location| location.id == id)
        .unwrap_or_else(|| panic!("missing location {id}"))
}

#[test]
fn fixture_groups_every_record() {
    let records = parse_response(include_str!("fixtures/van_gogh.json")).expect("parse");
    assert_eq!(records.len(), 6);
    let groups = group_records(records).expect("group");
    assert_eq!(groups.record_count(), 6);
    assert_eq!(groups.len(), 3);
    assert_eq!(groups.get("Q224124").expect("museum").items().len(), 2);
}

#[test]
fn fixture_projection_prefers_first_seen_values() {
    let locations = van_gogh();
    assert_eq!(locations.len(), 3);

    let museum = location(&locations, "Q224124");
    assert_eq!(museum.location_name, "Van Gogh Museum");
    assert_eq!(museum.website, "https://www.vangoghmuseum.nl/");
    assert_eq!(
        museum.coordinate,
        Coordinate {
            latitude: 52.358,
            longitude: 4.881
        }
    );
    let almonds = museum.item("Q727220").expect("almond blossoms");
    assert_eq!(almonds.image_link, format!("{COMMONS}Almond_blossom.jpg"));

    let moma = location(&locations, "Q188740");
    assert_eq!(moma.website, "https://www.moma.org/");
    assert_eq!(moma.coordinate.longitude, -73.978);
    assert_eq!(moma.items.len(), 2);
}

#[test]
fn fixture_popup_sorts_paintings() {
    let locations = van_gogh();
    let html = popup_html(location(&locations, "Q188740"));
    let olive = html.find("The Olive Trees").expect("olive trees");
    let starry = html.find("The Starry Night").expect("starry night");
    assert!(olive < starry);
    assert!(html.contains("<a href=\"https://www.moma.org/\" style = \"color:black\" target=\"_blank\">Museum of Modern Art</a>"));
}

#[test]
fn empty_fixture_projects_nothing() {
    let records = parse_response(include_str!("fixtures/empty.json")).expect("parse");
    let groups = group_records(records).expect("group");
    assert!(groups.is_empty());
    assert!(project(&groups).expect("project").is_empty());
}

#[test]
fn missing_coordinate_is_a_decode_error() {
    let err = parse_response(include_str!("fixtures/missing_coord.json")).unwrap_err();
    assert_eq!(err.to_string(), "binding 0 is missing variable 'coord'");
}
