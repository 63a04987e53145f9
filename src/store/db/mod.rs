use std::error::Error as StdError;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use rocket::{Build, Rocket};
use rocket_sync_db_pools::database;

use super::{Artist, Genres, Id, Show, Venue};

#[database("sqlite_database")]
pub struct Connection(diesel::SqliteConnection);

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn run_migrations(
    conn: &mut SqliteConnection,
) -> Result<(), Box<dyn StdError + Send + Sync + 'static>> {
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        log::info!("Applied database migration {}", version);
    }
    Ok(())
}

pub async fn initialize(rocket: Rocket<Build>) -> Result<Rocket<Build>, Rocket<Build>> {
    let conn = match Connection::get_one(&rocket).await {
        Some(conn) => conn,
        None => {
            log::error!("Database connection failed.");
            return Err(rocket);
        }
    };

    match conn.run(|c| run_migrations(c)).await {
        Ok(()) => Ok(rocket),
        Err(e) => {
            log::error!("Failed to run database migrations: {}", e);
            Err(rocket)
        }
    }
}

pub mod schema {
    diesel::table! {
        venues (id) {
            id -> Integer,
            name -> Text,
            city -> Text,
            state -> Text,
            genres -> Nullable<Text>,
            address -> Nullable<Text>,
            phone -> Nullable<Text>,
            website -> Nullable<Text>,
            facebook_link -> Nullable<Text>,
            image_link -> Nullable<Text>,
            seeking_talent -> Bool,
            seeking_description -> Nullable<Text>,
        }
    }

    diesel::table! {
        artists (id) {
            id -> Integer,
            name -> Text,
            city -> Text,
            state -> Text,
            genres -> Nullable<Text>,
            phone -> Nullable<Text>,
            website -> Nullable<Text>,
            facebook_link -> Nullable<Text>,
            image_link -> Nullable<Text>,
            seeking_venue -> Bool,
            seeking_description -> Nullable<Text>,
        }
    }

    diesel::table! {
        shows (id) {
            id -> Integer,
            venue_id -> Integer,
            artist_id -> Integer,
            start_time -> Timestamp,
        }
    }

    diesel::joinable!(shows -> venues (venue_id));
    diesel::joinable!(shows -> artists (artist_id));

    diesel::allow_tables_to_appear_in_same_query!(venues, artists, shows);
}

use schema::*;

#[derive(Queryable, Debug, Clone, PartialEq)]
#[diesel(table_name = venues)]
pub struct SqlVenue {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub genres: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = venues, treat_none_as_null = true)]
pub struct NewSqlVenue {
    pub name: String,
    pub city: String,
    pub state: String,
    pub genres: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

impl From<SqlVenue> for (Id<Venue>, Venue) {
    fn from(venue: SqlVenue) -> Self {
        (
            Id::new(venue.id),
            Venue {
                genres: Genres::decode(venue.genres.as_deref()),
                name: venue.name,
                city: venue.city,
                state: venue.state,
                address: venue.address,
                phone: venue.phone,
                website: venue.website,
                facebook_link: venue.facebook_link,
                image_link: venue.image_link,
                seeking_talent: venue.seeking_talent,
                seeking_description: venue.seeking_description,
            },
        )
    }
}

impl From<Venue> for NewSqlVenue {
    fn from(venue: Venue) -> NewSqlVenue {
        NewSqlVenue {
            genres: Some(venue.genres.encode()),
            name: venue.name,
            city: venue.city,
            state: venue.state,
            address: venue.address,
            phone: venue.phone,
            website: venue.website,
            facebook_link: venue.facebook_link,
            image_link: venue.image_link,
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description,
        }
    }
}

#[derive(Queryable, Debug, Clone, PartialEq)]
#[diesel(table_name = artists)]
pub struct SqlArtist {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub genres: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = artists, treat_none_as_null = true)]
pub struct NewSqlArtist {
    pub name: String,
    pub city: String,
    pub state: String,
    pub genres: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

impl From<SqlArtist> for (Id<Artist>, Artist) {
    fn from(artist: SqlArtist) -> Self {
        (
            Id::new(artist.id),
            Artist {
                genres: Genres::decode(artist.genres.as_deref()),
                name: artist.name,
                city: artist.city,
                state: artist.state,
                phone: artist.phone,
                website: artist.website,
                facebook_link: artist.facebook_link,
                image_link: artist.image_link,
                seeking_venue: artist.seeking_venue,
                seeking_description: artist.seeking_description,
            },
        )
    }
}

impl From<Artist> for NewSqlArtist {
    fn from(artist: Artist) -> NewSqlArtist {
        NewSqlArtist {
            genres: Some(artist.genres.encode()),
            name: artist.name,
            city: artist.city,
            state: artist.state,
            phone: artist.phone,
            website: artist.website,
            facebook_link: artist.facebook_link,
            image_link: artist.image_link,
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description,
        }
    }
}

#[derive(Queryable, Debug, Clone, PartialEq)]
#[diesel(table_name = shows)]
pub struct SqlShow {
    pub id: i32,
    pub venue_id: i32,
    pub artist_id: i32,
    pub start_time: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = shows)]
pub struct NewSqlShow {
    pub venue_id: i32,
    pub artist_id: i32,
    pub start_time: NaiveDateTime,
}

impl From<SqlShow> for (Id<Show>, Show) {
    fn from(show: SqlShow) -> Self {
        (
            Id::new(show.id),
            Show {
                venue_id: Id::new(show.venue_id),
                artist_id: Id::new(show.artist_id),
                start_time: show.start_time,
            },
        )
    }
}

impl From<Show> for NewSqlShow {
    fn from(show: Show) -> NewSqlShow {
        NewSqlShow {
            venue_id: show.venue_id.get(),
            artist_id: show.artist_id.get(),
            start_time: show.start_time,
        }
    }
}
