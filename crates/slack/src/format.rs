//! Text fragments for Slack mrkdwn: links, star ratings, category emoji and
//! event time windows.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::America::Los_Angeles;

use seafoodtruck_core::domain::{BookedTruck, Event, Location, Truck};

pub const SCHEDULE_URL_BASE: &str = "https://www.seattlefoodtruck.com/schedule";
pub const TRUCK_URL_BASE: &str = "https://www.seattlefoodtruck.com/food-trucks";
pub const PHOTO_URL_BASE: &str =
    "https://s3-us-west-2.amazonaws.com/seattlefoodtruck-uploads-prod";

const FILLED_STAR: char = '★';
const EMPTY_STAR: char = '☆';
const STAR_COUNT: usize = 5;

const CATEGORY_EMOJI: &[(&str, &str)] = &[
    ("BBQ", ":cut_of_meat:"),
    ("Beverage", ":cup_with_straw:"),
    ("Burgers", ":hamburger:"),
    ("Indian", ":flag-in:"),
    ("Vegetarian", ":green_salad:"),
    ("Vegan", ":seedling:"),
    ("Native American", ":earth_americas:"),
    ("Asian", ":earth_asia:"),
    ("Hawaiian", ":pineapple:"),
    ("Seafood", ":crab:"),
    ("Sandwiches", ":sandwich:"),
    ("Italian", ":spaghetti:"),
    ("Pizza", ":pizza:"),
    ("Mexican", ":taco:"),
    ("Tacos", ":taco:"),
    ("Burritos", ":burrito:"),
    ("Wraps", ":burrito:"),
    ("Sushi", ":sushi:"),
    ("Japanese", ":japan:"),
    ("Latin American", ":earth_americas:"),
    ("Breakfast", ":fried_egg:"),
    ("American", ":flag-us:"),
    ("Southern", ":face_with_cowboy_hat:"),
    ("Caribbean", ":palm_tree:"),
    ("Central Asian", ":earth_asia:"),
    ("Coffee", ":coffee:"),
    ("Dessert", ":ice_cream:"),
    ("Ethiopian", ":flag-et:"),
    ("European", ":earth_africa:"),
    ("French", ":flag-fr:"),
    ("Global", ":globe_with_meridians:"),
    ("Halal", "حلال"),
    ("Hot Dogs", ":hotdog:"),
    ("Mediterranean", ":stuffed_flatbread:"),
    ("Middle Eastern", ":stuffed_flatbread:"),
];

pub fn schedule_url(location_id: &str) -> String {
    format!("{SCHEDULE_URL_BASE}/{location_id}")
}

pub fn truck_url(truck_id: &str) -> String {
    format!("{TRUCK_URL_BASE}/{truck_id}")
}

pub fn photo_url(photo: &str) -> String {
    format!("{PHOTO_URL_BASE}/{photo}")
}

fn link(url: &str, label: &str) -> String {
    format!("*<{url}|{label}>*")
}

/// Rating rounded half away from zero and clamped to the star range.
pub fn filled_stars(rating: f64) -> usize {
    if !rating.is_finite() {
        return 0;
    }
    rating.round().clamp(0.0, STAR_COUNT as f64) as usize
}

pub fn star_rating(rating: f64) -> String {
    let filled = filled_stars(rating);
    std::iter::repeat(FILLED_STAR)
        .take(filled)
        .chain(std::iter::repeat(EMPTY_STAR).take(STAR_COUNT - filled))
        .collect()
}

pub fn category_emoji(category: &str) -> Option<&'static str> {
    CATEGORY_EMOJI.iter().find(|(label, _)| *label == category).map(|(_, emoji)| *emoji)
}

pub fn category_line(category: &str) -> String {
    match category_emoji(category) {
        Some(emoji) => format!("{emoji} {category}"),
        None => category.to_owned(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

fn clock_time(time: &DateTime<FixedOffset>) -> String {
    time.format("%-I:%M%p").to_string()
}

/// `on Mon, Oct 19 from 11:00AM–2:00PM`, in the event's own UTC offset.
/// Unparseable timestamps are shown as served.
pub fn event_window(event: &Event) -> String {
    match (parse_timestamp(&event.start_time), parse_timestamp(&event.end_time)) {
        (Some(start), Some(end)) => format!(
            "on {} from {}–{}",
            start.format("%a, %b %-d"),
            clock_time(&start),
            clock_time(&end)
        ),
        _ => format!("from {}–{}", event.start_time, event.end_time),
    }
}

pub fn event_header(location: &Location, event: &Event) -> String {
    format!(
        "{}  *{} truck(s)* {}",
        link(&schedule_url(&location.id.0), &location.name),
        event.bookings.len(),
        event_window(event)
    )
}

/// Detail text for one booked truck. `details` adds the rating line when the
/// truck lookup succeeded.
pub fn truck_detail(truck: &BookedTruck, details: Option<&Truck>) -> String {
    let mut text = link(&truck_url(&truck.id.0), &truck.name);
    if let Some(details) = details {
        text.push_str(&format!(
            " {} ({:.1}) {} reviews",
            star_rating(details.rating),
            details.rating,
            details.rating_count
        ));
    }

    let categories = match (truck.food_categories.is_empty(), details) {
        (true, Some(details)) => details.food_categories.as_slice(),
        _ => truck.food_categories.as_slice(),
    };
    for category in categories {
        text.push('\n');
        text.push_str(&category_line(category));
    }
    text
}

/// Photo for the detail accessory, preferring the booking's own reference.
pub fn truck_photo(truck: &BookedTruck, details: Option<&Truck>) -> Option<String> {
    truck
        .featured_photo
        .as_deref()
        .or_else(|| details.and_then(|details| details.featured_photo.as_deref()))
        .map(str::trim)
        .filter(|photo| !photo.is_empty())
        .map(photo_url)
}

/// RFC 822 style stamp in Seattle local time, e.g. `19 Oct 26 09:30 PDT`.
pub fn footer_timestamp(now: DateTime<Utc>) -> String {
    now.with_timezone(&Los_Angeles).format("%d %b %y %H:%M %Z").to_string()
}

pub fn help_text(now: DateTime<Utc>) -> String {
    format!(
        "You can ask me\n\
         • `help`\n\
         • `find trucks at <location> [in <neighborhood>] [today/tomorrow]` - to see trucks booked near a location\n\
         • `find events for <today/tomorrow>` - to see events booked at the usual spots\n\
         \n\
         Slack Events API | {}",
        footer_timestamp(now)
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use seafoodtruck_core::domain::{
        BookedTruck, Event, Location, LocationId, Truck, TruckId,
    };

    use super::{
        category_line, event_header, filled_stars, footer_timestamp, help_text, star_rating,
        truck_detail, truck_photo,
    };

    fn booked(categories: &[&str], photo: Option<&str>) -> BookedTruck {
        BookedTruck {
            id: TruckId("nosh".to_owned()),
            name: "Nosh".to_owned(),
            food_categories: categories.iter().map(|c| (*c).to_owned()).collect(),
            featured_photo: photo.map(str::to_owned),
        }
    }

    fn truck(rating: f64, count: u32) -> Truck {
        Truck {
            id: TruckId("nosh".to_owned()),
            name: "Nosh".to_owned(),
            rating,
            rating_count: count,
            food_categories: vec!["Seafood".to_owned()],
            featured_photo: Some("fallback.jpg".to_owned()),
        }
    }

    #[test]
    fn stars_round_half_away_from_zero() {
        assert_eq!(star_rating(4.6), "★★★★★");
        assert_eq!(star_rating(4.4), "★★★★☆");
        assert_eq!(star_rating(4.5), "★★★★★");
        assert_eq!(star_rating(0.0), "☆☆☆☆☆");
        assert_eq!(star_rating(5.0), "★★★★★");
    }

    #[test]
    fn stars_are_monotonic_and_clamped() {
        let mut previous = 0;
        for tenth in 0..=50 {
            let filled = filled_stars(f64::from(tenth) / 10.0);
            assert!(filled >= previous);
            previous = filled;
        }
        assert_eq!(filled_stars(7.2), 5);
        assert_eq!(filled_stars(-1.0), 0);
        assert_eq!(filled_stars(f64::NAN), 0);
        assert_eq!(star_rating(4.4), star_rating(4.4));
    }

    #[test]
    fn unmapped_categories_have_no_prefix() {
        assert_eq!(category_line("Seafood"), ":crab: Seafood");
        assert_eq!(category_line("Halal"), "حلال Halal");
        assert_eq!(category_line("Fusion"), "Fusion");
    }

    #[test]
    fn header_uses_event_offset_and_twelve_hour_clock() {
        let location = Location {
            id: LocationId("westlake-park".to_owned()),
            name: "Westlake Park".to_owned(),
            latitude: None,
            longitude: None,
            address: None,
            neighborhood_id: None,
            neighborhood: None,
        };
        let event = Event {
            id: 1,
            name: "Lunch".to_owned(),
            start_time: "2026-10-19T11:00:00.000-07:00".to_owned(),
            end_time: "2026-10-19T14:00:00.000-07:00".to_owned(),
            bookings: Vec::new(),
            waitlist: Vec::new(),
        };

        assert_eq!(
            event_header(&location, &event),
            "*<https://www.seattlefoodtruck.com/schedule/westlake-park|Westlake Park>*  \
             *0 truck(s)* on Mon, Oct 19 from 11:00AM–2:00PM"
        );

        let garbled = Event { start_time: "soon".to_owned(), ..event };
        assert!(event_header(&location, &garbled).ends_with("from soon–2026-10-19T14:00:00.000-07:00"));
    }

    #[test]
    fn detail_includes_rating_only_when_truck_is_known() {
        let booking = booked(&["Seafood", "Fusion"], Some("nosh.jpg"));

        assert_eq!(
            truck_detail(&booking, Some(&truck(4.4, 12))),
            "*<https://www.seattlefoodtruck.com/food-trucks/nosh|Nosh>* ★★★★☆ (4.4) 12 reviews\n\
             :crab: Seafood\nFusion"
        );
        assert_eq!(
            truck_detail(&booking, None),
            "*<https://www.seattlefoodtruck.com/food-trucks/nosh|Nosh>*\n:crab: Seafood\nFusion"
        );
    }

    #[test]
    fn photo_prefers_booking_reference() {
        let details = truck(3.0, 1);
        assert_eq!(
            truck_photo(&booked(&[], Some("nosh.jpg")), Some(&details)).as_deref(),
            Some("https://s3-us-west-2.amazonaws.com/seattlefoodtruck-uploads-prod/nosh.jpg")
        );
        assert!(truck_photo(&booked(&[], Some("fallback.jpg")), None).is_some());
        assert_eq!(truck_photo(&booked(&[], None), None), None);
        assert_eq!(truck_photo(&booked(&[], Some("  ")), None), None);
    }

    #[test]
    fn footer_is_rendered_in_pacific_time() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 16, 30, 0).single().expect("valid instant");
        assert_eq!(footer_timestamp(now), "19 Oct 26 09:30 PDT");
        assert!(help_text(now).ends_with("Slack Events API | 19 Oct 26 09:30 PDT"));
        assert!(help_text(now).contains("find events for <today/tomorrow>"));
    }
}
