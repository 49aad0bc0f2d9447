use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BedKind {
    King,
    Queen,
    Double,
    Single,
    Twin,
    SofaBed,
    Bunk,
}

impl BedKind {
    pub fn sleeps(self) -> i64 {
        match self {
            BedKind::King
            | BedKind::Queen
            | BedKind::Double
            | BedKind::SofaBed
            | BedKind::Bunk => 2,
            BedKind::Single | BedKind::Twin => 1,
        }
    }

    fn label(self) -> &'static str {
        match self {
            BedKind::King => "king",
            BedKind::Queen => "queen",
            BedKind::Double => "double",
            BedKind::Single => "single",
            BedKind::Twin => "twin",
            BedKind::SofaBed => "sofa",
            BedKind::Bunk => "bunk",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedCount {
    pub kind: BedKind,
    pub count: i64,
}

impl BedCount {
    pub fn sleeps(&self) -> i64 {
        self.kind.sleeps() * self.count.max(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Bedroom {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub beds: Vec<BedCount>,
}

impl Bedroom {
    pub fn sleeps(&self) -> i64 {
        self.beds.iter().map(BedCount::sleeps).sum()
    }
}

/// Living room or any other non-bedroom space that may hold beds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Space {
    pub name: String,
    #[serde(default)]
    pub beds: Vec<BedCount>,
}

impl Space {
    pub fn sleeps(&self) -> i64 {
        self.beds.iter().map(BedCount::sleeps).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BedConfiguration {
    #[serde(default)]
    pub bedrooms: Vec<Bedroom>,
    #[serde(default)]
    pub living_room: Option<Space>,
    #[serde(default)]
    pub other_spaces: Vec<Space>,
}

impl BedConfiguration {
    /// Living room first, then the other spaces.
    pub fn spaces(&self) -> impl Iterator<Item = &Space> {
        self.living_room.iter().chain(self.other_spaces.iter())
    }

    pub fn total_sleeps(&self) -> i64 {
        let bedrooms: i64 = self.bedrooms.iter().map(Bedroom::sleeps).sum();
        let spaces: i64 = self.spaces().map(Space::sleeps).sum();
        bedrooms + spaces
    }

    pub fn total_beds(&self) -> i64 {
        self.bedrooms
            .iter()
            .flat_map(|b| b.beds.iter())
            .chain(self.spaces().flat_map(|s| s.beds.iter()))
            .map(|b| b.count.max(0))
            .sum()
    }

    pub fn all_beds(&self) -> Vec<BedCount> {
        self.bedrooms
            .iter()
            .flat_map(|b| b.beds.iter())
            .chain(self.spaces().flat_map(|s| s.beds.iter()))
            .cloned()
            .collect()
    }
}

/// Human readable bed list, e.g. `"1 king bed, 2 single beds"`.
pub fn describe_beds(beds: &[BedCount]) -> String {
    let parts: Vec<String> = beds
        .iter()
        .filter(|b| b.count > 0)
        .map(|b| {
            let noun = if b.count == 1 { "bed" } else { "beds" };
            format!("{} {} {}", b.count, b.kind.label(), noun)
        })
        .collect();

    if parts.is_empty() {
        "no beds".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BedConfiguration {
        serde_json::from_value(serde_json::json!({
            "bedrooms": [
                { "name": "Master", "beds": [{ "kind": "king", "count": 1 }] },
                { "beds": [{ "kind": "single", "count": 2 }] }
            ],
            "living_room": { "name": "Living room", "beds": [{ "kind": "sofa_bed", "count": 1 }] }
        }))
        .unwrap()
    }

    #[test]
    fn test_sleeps_counts_every_space() {
        let config = config();
        assert_eq!(config.bedrooms[0].sleeps(), 2);
        assert_eq!(config.bedrooms[1].sleeps(), 2);
        assert_eq!(config.total_sleeps(), 6);
        assert_eq!(config.total_beds(), 4);
    }

    #[test]
    fn test_describe_beds() {
        let config = config();
        assert_eq!(describe_beds(&config.bedrooms[0].beds), "1 king bed");
        assert_eq!(describe_beds(&config.bedrooms[1].beds), "2 single beds");
        assert_eq!(describe_beds(&[]), "no beds");
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config: BedConfiguration = serde_json::from_str("{}").unwrap();
        assert!(config.bedrooms.is_empty());
        assert_eq!(config.total_sleeps(), 0);
    }
}
