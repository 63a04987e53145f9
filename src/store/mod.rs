mod db;
mod id;
#[macro_use]
pub mod action;
pub mod info;
mod model;
pub mod routes;
pub mod schedule;

use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::query_dsl::LoadQuery;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::{fairing, fairing::Fairing, Build, Rocket};

use crate::error::{Error, Result};
use db::schema::{artists, shows, venues};
use db::{NewSqlShow, SqlArtist, SqlShow, SqlVenue};
use info::{Area, ArtistInfo, SearchResult, ShowInfo, VenueInfo};

pub use action::Actions;
pub use id::Id;
pub use model::{Artist, Entity, Genres, Order, Show, Venue};

mod venue_actions {
    use super::db::schema::venues;
    use super::db::{NewSqlVenue, SqlVenue};
    use super::Venue;
    use diesel::prelude::*;

    derive_actions!(Venue, SqlVenue, NewSqlVenue, venues, venue_id);
}

mod artist_actions {
    use super::db::schema::artists;
    use super::db::{NewSqlArtist, SqlArtist};
    use super::Artist;
    use diesel::prelude::*;

    derive_actions!(Artist, SqlArtist, NewSqlArtist, artists, artist_id);
}

/// Store handle for one operation, wrapping a borrowed database connection.
pub struct Session<'c>(&'c mut SqliteConnection);

impl<'c> Session<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Session(conn)
    }

    fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.0
    }

    /// Books a show. Both the venue and the artist have to exist.
    pub fn create_show(&mut self, show: Show) -> Result<Id<Show>> {
        let sql_show: NewSqlShow = show.into();

        let id = self.conn().transaction::<_, Error, _>(|conn| {
            let venue_exists: bool =
                diesel::select(diesel::dsl::exists(venues::table.find(sql_show.venue_id)))
                    .get_result(conn)?;
            if !venue_exists {
                return Err(Error::Integrity(format!(
                    "venue {} does not exist",
                    sql_show.venue_id
                )));
            }

            let artist_exists: bool =
                diesel::select(diesel::dsl::exists(artists::table.find(sql_show.artist_id)))
                    .get_result(conn)?;
            if !artist_exists {
                return Err(Error::Integrity(format!(
                    "artist {} does not exist",
                    sql_show.artist_id
                )));
            }

            Ok(diesel::insert_into(shows::table)
                .values(&sql_show)
                .returning(shows::id)
                .get_result::<i32>(conn)?)
        })?;

        log::info!("Created show {}", id);
        Ok(Id::new(id))
    }

    pub fn read_show(&mut self, id: Id<Show>) -> Result<Show> {
        shows::table
            .find(id.get())
            .first::<SqlShow>(self.conn())
            .optional()?
            .map(|show| <(Id<Show>, Show)>::from(show).1)
            .ok_or_else(|| Error::not_found(id))
    }

    /// Every show, earliest first.
    pub fn all_shows(&mut self) -> Result<Vec<(Id<Show>, Show)>> {
        Ok(shows::table
            .order((shows::start_time.asc(), shows::id.asc()))
            .load::<SqlShow>(self.conn())?
            .into_iter()
            .map(|x| x.into())
            .collect())
    }

    pub fn show_listing(&mut self) -> Result<Vec<ShowInfo>> {
        let shows = self.all_shows()?;
        let venues = self.load_venues(venues::table.filter(
            venues::id.eq_any(shows::table.select(shows::venue_id)),
        ))?;
        let artists = self.load_artists(artists::table.filter(
            artists::id.eq_any(shows::table.select(shows::artist_id)),
        ))?;

        info::show_listing(shows, &venues, &artists)
    }

    pub fn venue_info(&mut self, id: Id<Venue>, now: NaiveDateTime) -> Result<VenueInfo> {
        let venue = Actions::<Venue>::read(self, id)?;
        let shows = self.load_shows(shows::table.filter(shows::venue_id.eq(id.get())))?;
        let artists = self.load_artists(artists::table.filter(
            artists::id.eq_any(
                shows::table
                    .filter(shows::venue_id.eq(id.get()))
                    .select(shows::artist_id),
            ),
        ))?;

        info::venue_info(id, venue, shows, &artists, now)
    }

    pub fn artist_info(&mut self, id: Id<Artist>, now: NaiveDateTime) -> Result<ArtistInfo> {
        let artist = Actions::<Artist>::read(self, id)?;
        let shows = self.load_shows(shows::table.filter(shows::artist_id.eq(id.get())))?;
        let venues = self.load_venues(venues::table.filter(
            venues::id.eq_any(
                shows::table
                    .filter(shows::artist_id.eq(id.get()))
                    .select(shows::venue_id),
            ),
        ))?;

        info::artist_info(id, artist, shows, &venues, now)
    }

    /// Venues whose name contains `term`, ignoring case, ordered by name.
    pub fn search_venues(&mut self, term: &str, now: NaiveDateTime) -> Result<SearchResult<Venue>> {
        let found: Vec<(Id<Venue>, Venue)> = Actions::<Venue>::all(self, Order::Name)?
            .into_iter()
            .filter(|(_, venue)| name_matches(&venue.name, term))
            .collect();

        let shows = self.load_shows(shows::table)?;
        let counts = info::upcoming_counts(shows, |show| show.venue_id, now);

        Ok(SearchResult::new(
            found
                .into_iter()
                .map(|(id, venue)| info::summarize(id, venue.name, &counts))
                .collect(),
        ))
    }

    /// Artists whose name contains `term`, ignoring case, ordered by name.
    pub fn search_artists(
        &mut self,
        term: &str,
        now: NaiveDateTime,
    ) -> Result<SearchResult<Artist>> {
        let found: Vec<(Id<Artist>, Artist)> = Actions::<Artist>::all(self, Order::Name)?
            .into_iter()
            .filter(|(_, artist)| name_matches(&artist.name, term))
            .collect();

        let shows = self.load_shows(shows::table)?;
        let counts = info::upcoming_counts(shows, |show| show.artist_id, now);

        Ok(SearchResult::new(
            found
                .into_iter()
                .map(|(id, artist)| info::summarize(id, artist.name, &counts))
                .collect(),
        ))
    }

    /// All venues grouped by city and state.
    pub fn areas(&mut self, now: NaiveDateTime) -> Result<Vec<Area>> {
        let venues = Actions::<Venue>::all(self, Order::Location)?;
        let shows = self.load_shows(shows::table)?;
        let counts = info::upcoming_counts(shows, |show| show.venue_id, now);

        Ok(info::group_by_area(venues, &counts))
    }

    fn load_shows<Q>(&mut self, query: Q) -> Result<Vec<(Id<Show>, Show)>>
    where
        Q: LoadQuery<'static, SqliteConnection, SqlShow>,
    {
        Ok(query
            .load::<SqlShow>(self.conn())?
            .into_iter()
            .map(|x| x.into())
            .collect())
    }

    fn load_venues<Q>(&mut self, query: Q) -> Result<HashMap<Id<Venue>, Venue>>
    where
        Q: LoadQuery<'static, SqliteConnection, SqlVenue>,
    {
        Ok(query
            .load::<SqlVenue>(self.conn())?
            .into_iter()
            .map(|x| x.into())
            .collect())
    }

    fn load_artists<Q>(&mut self, query: Q) -> Result<HashMap<Id<Artist>, Artist>>
    where
        Q: LoadQuery<'static, SqliteConnection, SqlArtist>,
    {
        Ok(query
            .load::<SqlArtist>(self.conn())?
            .into_iter()
            .map(|x| x.into())
            .collect())
    }
}

/// Substring match ignoring case, with full Unicode case folding.
fn name_matches(name: &str, term: &str) -> bool {
    name.to_lowercase().contains(&term.to_lowercase())
}

/// Request guard handing out a pooled connection.
pub struct Store(db::Connection);

impl Store {
    pub fn fairing() -> StoreFairing {
        StoreFairing
    }

    /// Runs `f` with a session on the blocking thread pool.
    pub async fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Session<'_>) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.0.run(move |conn| f(&mut Session::new(conn))).await
    }
}

pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> fairing::Info {
        fairing::Info {
            name: "Booking Store Fairing",
            kind: fairing::Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        let rocket = db::Connection::fairing().on_ignite(rocket).await?;
        db::initialize(rocket).await
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Store {
    type Error = <db::Connection as FromRequest<'r>>::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        db::Connection::from_request(request).await.map(Store)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;

    fn connection() -> SqliteConnection {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        db::run_migrations(&mut conn).unwrap();
        conn
    }

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(21, 0, 0)
            .unwrap()
    }

    fn venue(name: &str, city: &str, state: &str) -> Venue {
        Venue {
            name: name.into(),
            city: city.into(),
            state: state.into(),
            genres: Genres::new(vec!["Rock".into(), "Jazz".into()]),
            address: Some("1805 Geary Blvd".into()),
            phone: None,
            website: None,
            facebook_link: None,
            image_link: None,
            seeking_talent: false,
            seeking_description: None,
        }
    }

    fn artist(name: &str) -> Artist {
        Artist {
            name: name.into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            genres: Genres::default(),
            phone: Some("326-123-5000".into()),
            website: None,
            facebook_link: None,
            image_link: Some("https://example.com/artist.png".into()),
            seeking_venue: false,
            seeking_description: None,
        }
    }

    fn book(session: &mut Session<'_>, venue: Id<Venue>, artist: Id<Artist>, start_time: NaiveDateTime) -> Id<Show> {
        session
            .create_show(Show {
                venue_id: venue,
                artist_id: artist,
                start_time,
            })
            .unwrap()
    }

    #[test]
    fn created_venue_reads_back_and_deletes() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let stored = venue("The Fillmore", "San Francisco", "CA");
        let id = session.create(stored.clone()).unwrap();

        let read: Venue = session.read(id).unwrap();
        assert_eq!(read, stored);
        assert!(!read.seeking_talent);
        assert_eq!(read.genres.as_slice(), ["Rock", "Jazz"]);

        let deleted: Venue = session.delete(id).unwrap();
        assert_eq!(deleted.name, "The Fillmore");
        assert!(matches!(
            Actions::<Venue>::read(&mut session, id),
            Err(Error::NotFound { kind: "venue", .. })
        ));
    }

    #[test]
    fn empty_genres_round_trip() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let id = session.create(artist("Matt Quevedo")).unwrap();
        let read: Artist = session.read(id).unwrap();

        assert!(read.genres.as_slice().is_empty());
    }

    #[test]
    fn update_returns_previous_and_stores_new() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let id = session.create(artist("Guns N Petals")).unwrap();
        let changed = Artist {
            seeking_venue: true,
            phone: None,
            ..artist("Guns N Roses")
        };

        let previous: Artist = session.update(id, changed.clone()).unwrap();
        assert_eq!(previous.name, "Guns N Petals");

        let read: Artist = session.read(id).unwrap();
        assert_eq!(read, changed);
    }

    #[test]
    fn updating_unknown_id_is_not_found() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let result = session.update(Id::new(41), venue("Nowhere", "X", "Y"));
        assert!(matches!(result, Err(Error::NotFound { id: 41, .. })));
    }

    #[test]
    fn deleting_a_venue_removes_its_shows() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let fillmore = session.create(venue("The Fillmore", "San Francisco", "CA")).unwrap();
        let hop = session.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        let petals = session.create(artist("Guns N Petals")).unwrap();
        book(&mut session, fillmore, petals, at(1));
        book(&mut session, fillmore, petals, at(2));
        let kept = book(&mut session, hop, petals, at(3));

        Actions::<Venue>::delete(&mut session, fillmore).unwrap();

        let remaining = session.all_shows().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, kept);
        assert!(Actions::<Artist>::read(&mut session, petals).is_ok());
    }

    #[test]
    fn deleting_an_artist_removes_its_shows() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let fillmore = session.create(venue("The Fillmore", "San Francisco", "CA")).unwrap();
        let petals = session.create(artist("Guns N Petals")).unwrap();
        let show = book(&mut session, fillmore, petals, at(1));

        Actions::<Artist>::delete(&mut session, petals).unwrap();

        assert!(session.all_shows().unwrap().is_empty());
        assert!(matches!(session.read_show(show), Err(Error::NotFound { kind: "show", .. })));
    }

    #[test]
    fn booking_needs_existing_venue_and_artist() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let fillmore = session.create(venue("The Fillmore", "San Francisco", "CA")).unwrap();
        let result = session.create_show(Show {
            venue_id: fillmore,
            artist_id: Id::new(12),
            start_time: at(1),
        });

        assert!(matches!(result, Err(Error::Integrity(_))));
        assert!(session.all_shows().unwrap().is_empty());
    }

    #[test]
    fn venue_info_splits_shows_at_now() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let fillmore = session.create(venue("The Fillmore", "San Francisco", "CA")).unwrap();
        let petals = session.create(artist("Guns N Petals")).unwrap();
        book(&mut session, fillmore, petals, at(20));
        book(&mut session, fillmore, petals, at(1));
        book(&mut session, fillmore, petals, at(10));

        let info = session.venue_info(fillmore, at(10)).unwrap();

        assert_eq!(info.shows.upcoming_count(), 2);
        assert_eq!(info.shows.past_count(), 1);
        assert_eq!(info.shows.upcoming()[0].start_time, "2024-06-10 21:00:00");
        assert_eq!(info.shows.upcoming()[0].artist_name, "Guns N Petals");

        let artist_info = session.artist_info(petals, at(10)).unwrap();
        assert_eq!(artist_info.shows.upcoming_count(), 2);
        assert_eq!(artist_info.shows.past()[0].venue_name, "The Fillmore");
    }

    #[test]
    fn dangling_show_fails_the_venue_info() {
        let mut conn = connection();
        let fillmore = {
            let mut session = Session::new(&mut conn);
            session.create(venue("The Fillmore", "San Francisco", "CA")).unwrap()
        };

        diesel::insert_into(shows::table)
            .values(&NewSqlShow {
                venue_id: fillmore.get(),
                artist_id: 99,
                start_time: at(1),
            })
            .execute(&mut conn)
            .unwrap();

        let mut session = Session::new(&mut conn);
        assert!(matches!(
            session.venue_info(fillmore, at(1)),
            Err(Error::DanglingReference { kind: "artist", id: 99, .. })
        ));
        assert!(matches!(
            session.show_listing(),
            Err(Error::DanglingReference { .. })
        ));
    }

    #[test]
    fn empty_search_matches_everything_by_name() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        for name in ["The Musical Hop", "Park Square Live Music & Coffee", "The Dueling Pianos Bar"] {
            session.create(venue(name, "San Francisco", "CA")).unwrap();
        }

        let result = session.search_venues("", at(1)).unwrap();
        let names: Vec<_> = result.data().iter().map(|v| v.name.as_str()).collect();

        assert_eq!(result.count(), 3);
        assert_eq!(
            names,
            vec!["Park Square Live Music & Coffee", "The Dueling Pianos Bar", "The Musical Hop"]
        );
    }

    #[test]
    fn search_ignores_case_and_counts_upcoming_shows() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let hop = session.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        session.create(venue("Park Square", "San Francisco", "CA")).unwrap();
        let petals = session.create(artist("Guns N Petals")).unwrap();
        session.create(artist("Matt Quevedo")).unwrap();
        book(&mut session, hop, petals, at(1));
        book(&mut session, hop, petals, at(20));
        book(&mut session, hop, petals, at(21));

        let venues = session.search_venues("MUSICAL", at(10)).unwrap();
        assert_eq!(venues.count(), 1);
        assert_eq!(venues.data()[0].id, hop);
        assert_eq!(venues.data()[0].num_upcoming_shows, 2);

        let artists = session.search_artists("a", at(10)).unwrap();
        assert_eq!(artists.count(), 2);
        assert_eq!(artists.data()[0].name, "Guns N Petals");
        assert_eq!(artists.data()[1].num_upcoming_shows, 0);
    }

    #[test]
    fn search_wildcards_match_literally() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        session.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        session.create(venue("100% Jazz", "New York", "NY")).unwrap();

        let result = session.search_venues("%", at(1)).unwrap();
        assert_eq!(result.count(), 1);
        assert_eq!(result.data()[0].name, "100% Jazz");
        assert_eq!(session.search_venues("_", at(1)).unwrap().count(), 0);
    }

    #[test]
    fn areas_follow_state_city_name_order() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        session.create(venue("V3", "B", "X")).unwrap();
        let v2 = session.create(venue("V2", "A", "X")).unwrap();
        session.create(venue("V1", "A", "X")).unwrap();
        session.create(venue("V0", "A", "W")).unwrap();
        let petals = session.create(artist("Guns N Petals")).unwrap();
        book(&mut session, v2, petals, at(1) + Duration::days(30));

        let areas = session.areas(at(1)).unwrap();
        let layout: Vec<(&str, &str, Vec<&str>)> = areas
            .iter()
            .map(|area| {
                (
                    area.city.as_str(),
                    area.state.as_str(),
                    area.venues.iter().map(|v| v.name.as_str()).collect(),
                )
            })
            .collect();

        assert_eq!(
            layout,
            vec![
                ("A", "W", vec!["V0"]),
                ("A", "X", vec!["V1", "V2"]),
                ("B", "X", vec!["V3"]),
            ]
        );
        assert_eq!(areas[1].venues[1].num_upcoming_shows, 1);
    }

    #[test]
    fn listing_orders_by_requested_key() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        session.create(artist("Matt Quevedo")).unwrap();
        session.create(artist("Guns N Petals")).unwrap();

        let by_id: Vec<(Id<Artist>, Artist)> = session.all(Order::Id).unwrap();
        let by_name: Vec<(Id<Artist>, Artist)> = session.all(Order::Name).unwrap();

        assert_eq!(by_id[0].1.name, "Matt Quevedo");
        assert_eq!(by_name[0].1.name, "Guns N Petals");
    }

    #[test]
    fn show_listing_is_chronological() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let hop = session.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        let petals = session.create(artist("Guns N Petals")).unwrap();
        let late = book(&mut session, hop, petals, at(20));
        let early = book(&mut session, hop, petals, at(2));

        let listing = session.show_listing().unwrap();
        let ids: Vec<_> = listing.iter().map(|s| s.show_id).collect();

        assert_eq!(ids, vec![early, late]);
        assert_eq!(listing[0].venue_name, "The Musical Hop");
        assert_eq!(listing[0].artist_name, "Guns N Petals");
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let mut conn = connection();
        let mut session = Session::new(&mut conn);

        let cafe = session.create(venue("Café Élysée", "Paris", "IDF")).unwrap();
        session.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();

        for term in ["café élysée", "CAFÉ", "éLYS"] {
            let result = session.search_venues(term, at(1)).unwrap();
            assert_eq!(result.count(), 1, "{}", term);
            assert_eq!(result.data()[0].id, cafe);
        }

        session.create(artist("Ólafur Arnalds")).unwrap();
        assert_eq!(session.search_artists("óLAFUR", at(1)).unwrap().count(), 1);
    }

    #[test]
    fn dangling_show_fails_the_artist_info() {
        let mut conn = connection();
        let petals = {
            let mut session = Session::new(&mut conn);
            session.create(artist("Guns N Petals")).unwrap()
        };

        diesel::insert_into(shows::table)
            .values(&NewSqlShow {
                venue_id: 77,
                artist_id: petals.get(),
                start_time: at(1),
            })
            .execute(&mut conn)
            .unwrap();

        let mut session = Session::new(&mut conn);
        assert!(matches!(
            session.artist_info(petals, at(1)),
            Err(Error::DanglingReference { kind: "venue", id: 77, .. })
        ));
    }

    #[test]
    fn listings_handle_more_shows_than_sql_variables() {
        const SHOWS: usize = 40_000;

        let mut conn = connection();
        let (hop, petals) = {
            let mut session = Session::new(&mut conn);
            let hop = session.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
            let petals = session.create(artist("Guns N Petals")).unwrap();
            (hop, petals)
        };

        let rows: Vec<NewSqlShow> = (0..SHOWS)
            .map(|n| NewSqlShow {
                venue_id: hop.get(),
                artist_id: petals.get(),
                start_time: at(1) + Duration::minutes(n as i64),
            })
            .collect();
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for chunk in rows.chunks(5_000) {
                diesel::insert_into(shows::table).values(chunk).execute(conn)?;
            }
            Ok(())
        })
        .unwrap();

        let mut session = Session::new(&mut conn);
        let now = at(1) + Duration::minutes(10_000);

        assert_eq!(session.show_listing().unwrap().len(), SHOWS);

        let venue_info = session.venue_info(hop, now).unwrap();
        assert_eq!(venue_info.shows.upcoming_count(), SHOWS - 10_000);
        assert_eq!(venue_info.shows.past_count(), 10_000);

        let artist_info = session.artist_info(petals, now).unwrap();
        assert_eq!(artist_info.shows.upcoming_count(), SHOWS - 10_000);

        let areas = session.areas(now).unwrap();
        assert_eq!(areas[0].venues[0].num_upcoming_shows, SHOWS - 10_000);

        let found = session.search_venues("", now).unwrap();
        assert_eq!(found.data()[0].num_upcoming_shows, SHOWS - 10_000);
    }
}
