//! Denormalized views of venues and artists, built from an entity and its shows.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::schedule::{self, Partition};
use super::{Artist, Entity, Id, Show, Venue};
use crate::error::{Error, Result};

/// One show as seen from its venue or from its artist.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShowInfo {
    pub show_id: Id<Show>,
    pub venue_id: Id<Venue>,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub artist_id: Id<Artist>,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

impl ShowInfo {
    pub fn new(show_id: Id<Show>, show: &Show, venue: &Venue, artist: &Artist) -> Self {
        ShowInfo {
            show_id,
            venue_id: show.venue_id,
            venue_name: venue.name.clone(),
            venue_image_link: venue.image_link.clone(),
            artist_id: show.artist_id,
            artist_name: artist.name.clone(),
            artist_image_link: artist.image_link.clone(),
            start_time: show.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Upcoming and past shows with their counts.
///
/// Fields are private so the counts can only come from the lists.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShowsInfo {
    upcoming_shows: Vec<ShowInfo>,
    past_shows: Vec<ShowInfo>,
    upcoming_shows_count: usize,
    past_shows_count: usize,
}

impl ShowsInfo {
    fn new(upcoming_shows: Vec<ShowInfo>, past_shows: Vec<ShowInfo>) -> Self {
        ShowsInfo {
            upcoming_shows_count: upcoming_shows.len(),
            past_shows_count: past_shows.len(),
            upcoming_shows,
            past_shows,
        }
    }

    pub fn upcoming(&self) -> &[ShowInfo] {
        &self.upcoming_shows
    }

    pub fn past(&self) -> &[ShowInfo] {
        &self.past_shows
    }

    pub fn upcoming_count(&self) -> usize {
        self.upcoming_shows_count
    }

    pub fn past_count(&self) -> usize {
        self.past_shows_count
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VenueInfo {
    pub id: Id<Venue>,
    #[serde(flatten)]
    pub venue: Venue,
    #[serde(flatten)]
    pub shows: ShowsInfo,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ArtistInfo {
    pub id: Id<Artist>,
    #[serde(flatten)]
    pub artist: Artist,
    #[serde(flatten)]
    pub shows: ShowsInfo,
}

/// A stored item together with its id.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(bound = "T: Serialize")]
pub struct Listed<T> {
    pub id: Id<T>,
    #[serde(flatten)]
    pub item: T,
}

impl<T> From<(Id<T>, T)> for Listed<T> {
    fn from((id, item): (Id<T>, T)) -> Self {
        Listed { id, item }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(bound = "")]
pub struct Summary<T> {
    pub id: Id<T>,
    pub name: String,
    pub num_upcoming_shows: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(bound = "")]
pub struct SearchResult<T> {
    count: usize,
    data: Vec<Summary<T>>,
}

impl<T> SearchResult<T> {
    pub fn new(data: Vec<Summary<T>>) -> Self {
        SearchResult {
            count: data.len(),
            data,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn data(&self) -> &[Summary<T>] {
        &self.data
    }
}

/// Venues sharing a city and state.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub city: String,
    pub state: String,
    pub venues: Vec<Summary<Venue>>,
}

pub fn venue_info(
    id: Id<Venue>,
    venue: Venue,
    shows: Vec<(Id<Show>, Show)>,
    artists: &HashMap<Id<Artist>, Artist>,
    now: NaiveDateTime,
) -> Result<VenueInfo> {
    let shows = project(shows, now, |show_id, show| {
        let artist = lookup(artists, show_id, show.artist_id)?;
        Ok(ShowInfo::new(show_id, show, &venue, artist))
    })?;

    Ok(VenueInfo { id, venue, shows })
}

pub fn artist_info(
    id: Id<Artist>,
    artist: Artist,
    shows: Vec<(Id<Show>, Show)>,
    venues: &HashMap<Id<Venue>, Venue>,
    now: NaiveDateTime,
) -> Result<ArtistInfo> {
    let shows = project(shows, now, |show_id, show| {
        let venue = lookup(venues, show_id, show.venue_id)?;
        Ok(ShowInfo::new(show_id, show, venue, &artist))
    })?;

    Ok(ArtistInfo { id, artist, shows })
}

/// Every show in the given order, with both its venue and its artist resolved.
pub fn show_listing(
    shows: Vec<(Id<Show>, Show)>,
    venues: &HashMap<Id<Venue>, Venue>,
    artists: &HashMap<Id<Artist>, Artist>,
) -> Result<Vec<ShowInfo>> {
    shows
        .iter()
        .map(|(show_id, show)| {
            let venue = lookup(venues, *show_id, show.venue_id)?;
            let artist = lookup(artists, *show_id, show.artist_id)?;
            Ok(ShowInfo::new(*show_id, show, venue, artist))
        })
        .collect()
}

/// Number of upcoming shows per owner. Owners without shows are left out.
pub fn upcoming_counts<T, F>(
    shows: Vec<(Id<Show>, Show)>,
    owner: F,
    now: NaiveDateTime,
) -> HashMap<Id<T>, usize>
where
    F: Fn(&Show) -> Id<T>,
{
    let mut by_owner: HashMap<Id<T>, Vec<(Id<Show>, Show)>> = HashMap::new();
    for entry in shows {
        by_owner.entry(owner(&entry.1)).or_default().push(entry);
    }

    by_owner
        .into_iter()
        .map(|(id, shows)| (id, schedule::partition(shows, now).upcoming.len()))
        .collect()
}

pub fn summarize<T>(id: Id<T>, name: String, counts: &HashMap<Id<T>, usize>) -> Summary<T> {
    Summary {
        id,
        name,
        num_upcoming_shows: counts.get(&id).copied().unwrap_or(0),
    }
}

/// Groups venues already sorted by state, city and name.
///
/// A new area starts whenever city or state differ from the previous venue,
/// so unsorted input yields repeated areas.
pub fn group_by_area<I>(venues: I, counts: &HashMap<Id<Venue>, usize>) -> Vec<Area>
where
    I: IntoIterator<Item = (Id<Venue>, Venue)>,
{
    let mut areas: Vec<Area> = Vec::new();

    for (id, venue) in venues {
        let summary = summarize(id, venue.name, counts);
        match areas.last_mut() {
            Some(area) if area.city == venue.city && area.state == venue.state => {
                area.venues.push(summary)
            }
            _ => areas.push(Area {
                city: venue.city,
                state: venue.state,
                venues: vec![summary],
            }),
        }
    }

    areas
}

fn project<F>(shows: Vec<(Id<Show>, Show)>, now: NaiveDateTime, mut describe: F) -> Result<ShowsInfo>
where
    F: FnMut(Id<Show>, &Show) -> Result<ShowInfo>,
{
    let Partition { upcoming, past } = schedule::partition(shows, now);

    let upcoming = upcoming
        .iter()
        .map(|(id, show)| describe(*id, show))
        .collect::<Result<Vec<_>>>()?;
    let past = past
        .iter()
        .map(|(id, show)| describe(*id, show))
        .collect::<Result<Vec<_>>>()?;

    Ok(ShowsInfo::new(upcoming, past))
}

fn lookup<'a, T: Entity>(
    items: &'a HashMap<Id<T>, T>,
    show: Id<Show>,
    id: Id<T>,
) -> Result<&'a T> {
    items.get(&id).ok_or(Error::DanglingReference {
        show: show.get(),
        kind: T::KIND,
        id: id.get(),
    })
}
