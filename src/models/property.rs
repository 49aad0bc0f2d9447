use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, QueryBuilder, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use validator::Validate;

use super::bed_config::BedConfiguration;
use crate::search::{like_pattern, PropertySummary, SearchFilters, SearchPage};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize, EnumString, Display,
)]
#[sqlx(type_name = "property_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PropertyType {
    Hotel,
    Resort,
    Homestay,
    Apartment,
    Villa,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub property_type: PropertyType,
    pub city: String,
    pub country: String,
    pub address: String,
    pub description: String,
    /// Per room, per night, before tax.
    pub price_per_night: f64,
    /// Per room.
    pub max_guests: i64,
    pub total_rooms: i64,
    pub rating: f64,
    pub review_count: i64,
    pub amenities: Json<Vec<String>>,
    pub images: Json<Vec<String>>,
    pub bed_configuration: Option<Json<BedConfiguration>>,
    pub created_at: NaiveDateTime,
}

impl Property {
    pub fn bed_config(&self) -> Option<&BedConfiguration> {
        self.bed_configuration.as_ref().map(|c| &c.0)
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewProperty {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub property_type: PropertyType,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(exclusive_min = 0.0))]
    pub price_per_night: f64,
    #[validate(range(min = 1))]
    pub max_guests: i64,
    #[validate(range(min = 1))]
    pub total_rooms: i64,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub review_count: i64,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub bed_configuration: Option<BedConfiguration>,
}

/// A city that has at least one property, for destination autocomplete.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Destination {
    pub city: String,
    pub country: String,
    pub property_count: i64,
}

impl Property {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &NewProperty) -> Result<Self, sqlx::Error> {
        // Amenity filters compare lowercase names.
        let mut amenities: Vec<String> = Vec::new();
        for amenity in &data.amenities {
            let amenity = amenity.trim().to_lowercase();
            if !amenity.is_empty() && !amenities.contains(&amenity) {
                amenities.push(amenity);
            }
        }

        sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties (
                name, property_type, city, country, address, description,
                price_per_night, max_guests, total_rooms, rating, review_count,
                amenities, images, bed_configuration
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(data.property_type)
        .bind(data.city.trim())
        .bind(data.country.trim())
        .bind(&data.address)
        .bind(&data.description)
        .bind(data.price_per_night)
        .bind(data.max_guests)
        .bind(data.total_rooms)
        .bind(data.rating)
        .bind(data.review_count)
        .bind(Json(amenities))
        .bind(Json(data.images.clone()))
        .bind(data.bed_configuration.clone().map(Json))
        .fetch_one(pool)
        .await
    }

    pub async fn search(
        pool: &SqlitePool,
        filters: &SearchFilters,
    ) -> Result<SearchPage, sqlx::Error> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM properties WHERE 1=1");
        filters.apply(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM properties WHERE 1=1");
        filters.apply(&mut query);
        query.push(filters.sort.order_by());
        query
            .push(" LIMIT ")
            .push_bind(filters.page_size)
            .push(" OFFSET ")
            .push_bind(filters.offset());

        let properties: Vec<Property> = query.build_query_as().fetch_all(pool).await?;
        log::debug!("search matched {total} properties, returning {}", properties.len());

        Ok(SearchPage {
            items: properties
                .iter()
                .map(|p| PropertySummary::new(p, filters))
                .collect(),
            total,
            page: filters.page,
            page_size: filters.page_size,
        })
    }

    pub async fn destinations(
        pool: &SqlitePool,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Destination>, sqlx::Error> {
        let pattern = like_pattern(query.trim());

        sqlx::query_as::<_, Destination>(
            r#"
            SELECT city, country, COUNT(*) AS property_count
            FROM properties
            WHERE city LIKE ? ESCAPE '\' OR country LIKE ? ESCAPE '\'
            GROUP BY city, country
            ORDER BY property_count DESC, city ASC
            LIMIT ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
