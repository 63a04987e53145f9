use chrono::{Local, NaiveDateTime};

use super::{Id, Show};

/// Something that takes place at a point in time.
pub trait Scheduled {
    fn start_time(&self) -> NaiveDateTime;
}

impl Scheduled for Show {
    fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }
}

impl Scheduled for (Id<Show>, Show) {
    fn start_time(&self) -> NaiveDateTime {
        self.1.start_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<T> {
    pub upcoming: Vec<T>,
    pub past: Vec<T>,
}

/// Splits `shows` at `now`, a show starting exactly at `now` is upcoming.
/// Both halves are sorted by start time, equal start times keep their input order.
pub fn partition<T, I>(shows: I, now: NaiveDateTime) -> Partition<T>
where
    T: Scheduled,
    I: IntoIterator<Item = T>,
{
    let (mut upcoming, mut past): (Vec<T>, Vec<T>) = shows
        .into_iter()
        .partition(|show| show.start_time() >= now);

    upcoming.sort_by_key(|show| show.start_time());
    past.sort_by_key(|show| show.start_time());

    Partition { upcoming, past }
}

/// Wall clock time the partitioning is done against.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
