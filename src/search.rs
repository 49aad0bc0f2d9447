use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use thiserror::Error;

use crate::{
    models::property::{Property, PropertyType},
    pricing::round2,
};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("check_in and check_out must be given together")]
    PartialDates,

    #[error("check_out must be after check_in")]
    InvalidDates,

    #[error("{0} must be at least 1")]
    BelowOne(&'static str),

    #[error("price range is invalid")]
    InvalidPriceRange,

    #[error("min_rating must be between 0 and 5")]
    InvalidRating,

    #[error("unknown property type: {0}")]
    UnknownPropertyType(String),

    #[error("unknown sort order: {0}")]
    UnknownSort(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Recommended,
    PriceAsc,
    PriceDesc,
    RatingDesc,
}

impl SortOrder {
    pub fn order_by(self) -> &'static str {
        match self {
            SortOrder::Recommended => " ORDER BY rating DESC, review_count DESC, id ASC",
            SortOrder::PriceAsc => " ORDER BY price_per_night ASC, id ASC",
            SortOrder::PriceDesc => " ORDER BY price_per_night DESC, id ASC",
            SortOrder::RatingDesc => " ORDER BY rating DESC, id ASC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recommended" => Ok(SortOrder::Recommended),
            "price_asc" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            "rating_desc" => Ok(SortOrder::RatingDesc),
            other => Err(SearchError::UnknownSort(other.to_string())),
        }
    }
}

/// Query string as sent by the listing page.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub destination: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: Option<i64>,
    pub rooms: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Comma separated, e.g. `hotel,villa`.
    pub types: Option<String>,
    pub min_rating: Option<f64>,
    /// Comma separated, e.g. `wifi,pool`.
    pub amenities: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilters {
    pub destination: Option<String>,
    pub stay: Option<(NaiveDate, NaiveDate)>,
    pub guests: i64,
    pub rooms: i64,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub property_types: Vec<PropertyType>,
    pub min_rating: Option<f64>,
    pub amenities: Vec<String>,
    pub sort: SortOrder,
    pub page: i64,
    pub page_size: i64,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            destination: None,
            stay: None,
            guests: 1,
            rooms: 1,
            min_price: None,
            max_price: None,
            property_types: Vec::new(),
            min_rating: None,
            amenities: Vec::new(),
            sort: SortOrder::Recommended,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchFilters {
    pub fn from_params(params: SearchParams) -> Result<Self, SearchError> {
        let destination = params
            .destination
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let stay = match (params.check_in, params.check_out) {
            (Some(check_in), Some(check_out)) if check_out > check_in => {
                Some((check_in, check_out))
            }
            (Some(_), Some(_)) => return Err(SearchError::InvalidDates),
            (None, None) => None,
            _ => return Err(SearchError::PartialDates),
        };

        let guests = params.guests.unwrap_or(1);
        if guests < 1 {
            return Err(SearchError::BelowOne("guests"));
        }
        let rooms = params.rooms.unwrap_or(1);
        if rooms < 1 {
            return Err(SearchError::BelowOne("rooms"));
        }

        let negative = |p: Option<f64>| p.is_some_and(|p| p < 0.0 || !p.is_finite());
        if negative(params.min_price) || negative(params.max_price) {
            return Err(SearchError::InvalidPriceRange);
        }
        if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
            if min > max {
                return Err(SearchError::InvalidPriceRange);
            }
        }

        let mut property_types = Vec::new();
        for raw in split_list(params.types.as_deref()) {
            let property_type = PropertyType::from_str(&raw)
                .map_err(|_| SearchError::UnknownPropertyType(raw.clone()))?;
            if !property_types.contains(&property_type) {
                property_types.push(property_type);
            }
        }

        if let Some(rating) = params.min_rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(SearchError::InvalidRating);
            }
        }

        let mut amenities: Vec<String> = Vec::new();
        for amenity in split_list(params.amenities.as_deref()) {
            let amenity = amenity.to_lowercase();
            if !amenities.contains(&amenity) {
                amenities.push(amenity);
            }
        }

        let sort = match params.sort.as_deref().map(str::trim) {
            None | Some("") => SortOrder::default(),
            Some(s) => s.parse()?,
        };

        let page = params.page.unwrap_or(1);
        if page < 1 {
            return Err(SearchError::BelowOne("page"));
        }
        let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        Ok(Self {
            destination,
            stay,
            guests,
            rooms,
            min_price: params.min_price,
            max_price: params.max_price,
            property_types,
            min_rating: params.min_rating,
            amenities,
            sort,
            page,
            page_size,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub fn nights(&self) -> Option<i64> {
        self.stay.map(|(check_in, check_out)| (check_out - check_in).num_days())
    }

    /// Appends ` AND ...` predicates. The builder must already contain a
    /// `WHERE` clause over `properties`.
    pub fn apply(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(destination) = &self.destination {
            let pattern = like_pattern(destination);
            qb.push(" AND (city LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR country LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR name LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        qb.push(" AND max_guests * ")
            .push_bind(self.rooms)
            .push(" >= ")
            .push_bind(self.guests);
        qb.push(" AND total_rooms >= ").push_bind(self.rooms);

        if let Some(min) = self.min_price {
            qb.push(" AND price_per_night >= ").push_bind(min);
        }
        if let Some(max) = self.max_price {
            qb.push(" AND price_per_night <= ").push_bind(max);
        }

        if !self.property_types.is_empty() {
            qb.push(" AND property_type IN (");
            let mut types = qb.separated(", ");
            for property_type in &self.property_types {
                types.push_bind(*property_type);
            }
            types.push_unseparated(")");
        }

        if let Some(rating) = self.min_rating {
            qb.push(" AND rating >= ").push_bind(rating);
        }

        for amenity in &self.amenities {
            qb.push(
                " AND EXISTS (SELECT 1 FROM json_each(properties.amenities) \
                 WHERE lower(json_each.value) = ",
            )
            .push_bind(amenity.clone())
            .push(")");
        }

        if let Some((check_in, check_out)) = self.stay {
            qb.push(
                " AND (properties.total_rooms - COALESCE((SELECT SUM(b.rooms) FROM bookings b \
                 WHERE b.property_id = properties.id AND b.status = 'confirmed' AND b.check_in < ",
            )
            .push_bind(check_out)
            .push(" AND b.check_out > ")
            .push_bind(check_in)
            .push("), 0)) >= ")
            .push_bind(self.rooms);
        }
    }
}

/// Listing card.
#[derive(Debug, Clone, Serialize)]
pub struct PropertySummary {
    pub id: i64,
    pub name: String,
    pub property_type: PropertyType,
    pub city: String,
    pub country: String,
    pub price_per_night: f64,
    pub max_guests: i64,
    pub rating: f64,
    pub review_count: i64,
    pub amenities: Vec<String>,
    pub thumbnail: Option<String>,
    pub nights: Option<i64>,
    /// Pre-tax price of the searched stay for the searched room count.
    pub stay_total: Option<f64>,
}

impl PropertySummary {
    pub fn new(property: &Property, filters: &SearchFilters) -> Self {
        let nights = filters.nights();
        Self {
            id: property.id,
            name: property.name.clone(),
            property_type: property.property_type,
            city: property.city.clone(),
            country: property.country.clone(),
            price_per_night: property.price_per_night,
            max_guests: property.max_guests,
            rating: property.rating,
            review_count: property.review_count,
            amenities: property.amenities.0.clone(),
            thumbnail: property.thumbnail().map(str::to_string),
            nights,
            stay_total: nights
                .map(|n| round2(property.price_per_night * n as f64 * filters.rooms as f64)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub items: Vec<PropertySummary>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// `%text%` with LIKE wildcards in `text` escaped by `\`.
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
