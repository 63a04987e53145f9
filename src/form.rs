//! Typed input accepted from HTML forms and JSON bodies.
//!
//! Inputs are validated once, when they are turned into store values.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::store::{Artist, Genres, Id, Show, Venue};

#[derive(FromForm, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct VenueInput {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[field(default = Vec::new())]
    pub genres: Vec<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    #[field(default = false)]
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(FromForm, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ArtistInput {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[field(default = Vec::new())]
    pub genres: Vec<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    #[field(default = false)]
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(FromForm, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ShowInput {
    pub venue_id: Option<i32>,
    pub artist_id: Option<i32>,
    pub start_time: Option<String>,
}

#[derive(FromForm, Debug, Clone, Default)]
pub struct SearchInput {
    #[field(default = String::new())]
    pub search_term: String,
}

impl VenueInput {
    /// The submitted name, for messages about this input.
    pub fn label(&self) -> String {
        label(&self.name)
    }
}

impl ArtistInput {
    pub fn label(&self) -> String {
        label(&self.name)
    }
}

impl TryFrom<VenueInput> for Venue {
    type Error = Error;

    fn try_from(input: VenueInput) -> Result<Venue> {
        Ok(Venue {
            name: required("name", input.name)?,
            city: required("city", input.city)?,
            state: required("state", input.state)?,
            genres: genres(input.genres),
            address: optional(input.address),
            phone: optional(input.phone),
            website: optional(input.website),
            facebook_link: optional(input.facebook_link),
            image_link: optional(input.image_link),
            seeking_talent: input.seeking_talent,
            seeking_description: optional(input.seeking_description),
        })
    }
}

impl TryFrom<ArtistInput> for Artist {
    type Error = Error;

    fn try_from(input: ArtistInput) -> Result<Artist> {
        Ok(Artist {
            name: required("name", input.name)?,
            city: required("city", input.city)?,
            state: required("state", input.state)?,
            genres: genres(input.genres),
            phone: optional(input.phone),
            website: optional(input.website),
            facebook_link: optional(input.facebook_link),
            image_link: optional(input.image_link),
            seeking_venue: input.seeking_venue,
            seeking_description: optional(input.seeking_description),
        })
    }
}

impl TryFrom<ShowInput> for Show {
    type Error = Error;

    fn try_from(input: ShowInput) -> Result<Show> {
        let venue_id = input.venue_id.ok_or_else(|| Error::missing("venue_id"))?;
        let artist_id = input.artist_id.ok_or_else(|| Error::missing("artist_id"))?;
        let start_time = required("start_time", input.start_time)?;

        Ok(Show {
            venue_id: Id::new(venue_id),
            artist_id: Id::new(artist_id),
            start_time: parse_start_time(&start_time)?,
        })
    }
}

impl From<&Venue> for VenueInput {
    fn from(venue: &Venue) -> Self {
        VenueInput {
            name: Some(venue.name.clone()),
            city: Some(venue.city.clone()),
            state: Some(venue.state.clone()),
            genres: venue.genres.as_slice().to_vec(),
            address: venue.address.clone(),
            phone: venue.phone.clone(),
            website: venue.website.clone(),
            facebook_link: venue.facebook_link.clone(),
            image_link: venue.image_link.clone(),
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description.clone(),
        }
    }
}

impl From<&Artist> for ArtistInput {
    fn from(artist: &Artist) -> Self {
        ArtistInput {
            name: Some(artist.name.clone()),
            city: Some(artist.city.clone()),
            state: Some(artist.state.clone()),
            genres: artist.genres.as_slice().to_vec(),
            phone: artist.phone.clone(),
            website: artist.website.clone(),
            facebook_link: artist.facebook_link.clone(),
            image_link: artist.image_link.clone(),
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description.clone(),
        }
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Reads a show's start time from any of the usual date/time spellings.
/// Times with an offset are converted to local time, a bare date means midnight.
pub fn parse_start_time(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();

    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Ok(time.with_timezone(&Local).naive_local());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| Error::Validation(format!("{:?} is not a date and time", text)))
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    optional(value).ok_or_else(|| Error::missing(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn genres(genres: Vec<String>) -> Genres {
    Genres::new(
        genres
            .into_iter()
            .filter_map(|genre| optional(Some(genre)))
            .collect(),
    )
}

fn label(name: &Option<String>) -> String {
    match name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => format!("\"{}\"", name),
        _ => "without a name".to_string(),
    }
}
