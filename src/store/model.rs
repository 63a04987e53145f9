use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Id;

/// A stored record type, named in error messages.
pub trait Entity {
    const KIND: &'static str;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    pub name: String,
    pub city: String,
    pub state: String,
    pub genres: Genres,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

impl Entity for Venue {
    const KIND: &'static str = "venue";
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub name: String,
    pub city: String,
    pub state: String,
    pub genres: Genres,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

impl Entity for Artist {
    const KIND: &'static str = "artist";
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Show {
    pub venue_id: Id<Venue>,
    pub artist_id: Id<Artist>,
    pub start_time: NaiveDateTime,
}

impl Entity for Show {
    const KIND: &'static str = "show";
}

/// Ordered genre list, persisted as one comma separated column.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Genres(Vec<String>);

impl Genres {
    const SEPARATOR: char = ',';

    pub fn new(genres: Vec<String>) -> Self {
        Genres(genres)
    }

    pub fn encode(&self) -> String {
        self.0.join(&Self::SEPARATOR.to_string())
    }

    /// Absent and empty columns both read back as no genres.
    pub fn decode(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) if !raw.is_empty() => {
                Genres(raw.split(Self::SEPARATOR).map(String::from).collect())
            }
            _ => Genres::default(),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.0.iter().any(|g| g == genre)
    }
}

/// Sort order for listing every venue or artist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Id,
    Name,
    /// By state, then city, then name.
    Location,
}
