use serde::Serialize;

use crate::{
    models::{
        bed_config::{describe_beds, BedConfiguration, BedCount},
        property::Property,
    },
    pricing::round2,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoomOption {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sleeps: i64,
    pub beds: Vec<BedCount>,
    pub price_multiplier: f64,
}

const DEFAULT_TIERS: [(&str, &str, i64, f64); 3] = [
    ("standard", "Standard Room", 2, 1.0),
    ("deluxe", "Deluxe Room", 3, 1.35),
    ("suite", "Suite", 4, 1.75),
];

/// One option per bedroom plus the entire place when there is more than one
/// sleeping space. Properties without beds get the default tiers.
pub fn room_options(property: &Property) -> Vec<RoomOption> {
    let options = property
        .bed_config()
        .map(configured_options)
        .unwrap_or_default();

    if options.is_empty() {
        default_options(property.max_guests)
    } else {
        options
    }
}

pub fn find_room<'a>(options: &'a [RoomOption], id: &str) -> Option<&'a RoomOption> {
    options.iter().find(|o| o.id == id)
}

fn configured_options(config: &BedConfiguration) -> Vec<RoomOption> {
    let mut options = Vec::new();

    for (index, bedroom) in config.bedrooms.iter().enumerate() {
        let sleeps = bedroom.sleeps();
        if sleeps == 0 {
            continue;
        }
        let number = index + 1;
        options.push(RoomOption {
            id: format!("bedroom-{number}"),
            name: bedroom
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Bedroom {number}")),
            description: describe_beds(&bedroom.beds),
            sleeps,
            beds: bedroom.beds.clone(),
            price_multiplier: bedroom_multiplier(sleeps),
        });
    }

    let spaces_with_beds = config.spaces().filter(|s| s.sleeps() > 0).count();
    if options.len() > 1 || (spaces_with_beds > 0 && config.total_sleeps() > 0) {
        let bedrooms_total: f64 = options.iter().map(|o| o.price_multiplier).sum();
        let multiplier = (0.9 * bedrooms_total + 0.3 * spaces_with_beds as f64).max(1.0);
        let beds = config.all_beds();

        options.push(RoomOption {
            id: "entire-place".to_string(),
            name: "Entire place".to_string(),
            description: describe_beds(&beds),
            sleeps: config.total_sleeps(),
            beds,
            price_multiplier: round2(multiplier),
        });
    }

    options
}

fn bedroom_multiplier(sleeps: i64) -> f64 {
    round2(1.0 + 0.2 * (sleeps - 2).max(0) as f64)
}

fn default_options(max_guests: i64) -> Vec<RoomOption> {
    DEFAULT_TIERS
        .iter()
        .map(|(id, name, sleeps, multiplier)| {
            let sleeps = (*sleeps).min(max_guests.max(1));
            RoomOption {
                id: id.to_string(),
                name: name.to_string(),
                description: format!("Sleeps {sleeps}"),
                sleeps,
                beds: Vec::new(),
                price_multiplier: *multiplier,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use sqlx::types::Json;

    use super::*;
    use crate::models::{
        bed_config::{BedKind, Bedroom, Space},
        property::PropertyType,
    };

    fn property(max_guests: i64, config: Option<BedConfiguration>) -> Property {
        Property {
            id: 1,
            name: "Casa Azul".to_string(),
            property_type: PropertyType::Villa,
            city: "Oaxaca".to_string(),
            country: "Mexico".to_string(),
            address: String::new(),
            description: String::new(),
            price_per_night: 150.0,
            max_guests,
            total_rooms: 1,
            rating: 4.8,
            review_count: 12,
            amenities: Json(vec![]),
            images: Json(vec![]),
            bed_configuration: config.map(Json),
            created_at: NaiveDateTime::default(),
        }
    }

    fn beds(kind: BedKind, count: i64) -> Vec<BedCount> {
        vec![BedCount { kind, count }]
    }

    #[test]
    fn test_defaults_without_configuration() {
        let options = room_options(&property(3, None));
        let ids: Vec<_> = options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["standard", "deluxe", "suite"]);
        assert_eq!(options[0].sleeps, 2);
        // capped by the property's max guests
        assert_eq!(options[2].sleeps, 3);
        assert_eq!(options[1].price_multiplier, 1.35);
    }

    #[test]
    fn test_options_per_bedroom_and_entire_place() {
        let config = BedConfiguration {
            bedrooms: vec![
                Bedroom {
                    name: Some("Master".to_string()),
                    beds: beds(BedKind::King, 1),
                },
                Bedroom {
                    name: None,
                    beds: beds(BedKind::Single, 3),
                },
            ],
            living_room: Some(Space {
                name: "Living room".to_string(),
                beds: beds(BedKind::SofaBed, 1),
            }),
            other_spaces: vec![],
        };
        let options = room_options(&property(8, Some(config)));

        assert_eq!(options.len(), 3);
        assert_eq!(options[0].name, "Master");
        assert_eq!(options[0].price_multiplier, 1.0);
        assert_eq!(options[1].id, "bedroom-2");
        assert_eq!(options[1].name, "Bedroom 2");
        assert_eq!(options[1].sleeps, 3);
        assert_eq!(options[1].price_multiplier, 1.2);

        let entire = find_room(&options, "entire-place").unwrap();
        assert_eq!(entire.sleeps, 7);
        // 0.9 * (1.0 + 1.2) + 0.3
        assert_eq!(entire.price_multiplier, 2.28);
    }

    #[test]
    fn test_single_bedroom_has_no_entire_place() {
        let config = BedConfiguration {
            bedrooms: vec![Bedroom {
                name: None,
                beds: beds(BedKind::Queen, 1),
            }],
            ..Default::default()
        };
        let options = room_options(&property(2, Some(config)));
        assert_eq!(options.len(), 1);
        assert!(find_room(&options, "entire-place").is_none());
    }

    #[test]
    fn test_empty_configuration_falls_back() {
        let config = BedConfiguration {
            bedrooms: vec![Bedroom {
                name: None,
                beds: vec![],
            }],
            ..Default::default()
        };
        let options = room_options(&property(2, Some(config)));
        assert_eq!(options[0].id, "standard");
    }
}
