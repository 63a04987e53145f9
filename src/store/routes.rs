use rocket::serde::json::Json;
use rocket::Route;

use crate::error::Result;
use crate::form::{ArtistInput, ShowInput, VenueInput};
use crate::store::info::{Area, ArtistInfo, Listed, SearchResult, ShowInfo, VenueInfo};
use crate::store::{action::Actions, schedule, Artist, Id, Order, Show, Store, Venue};

macro_rules! derive_routes {
    ($mod: ident, $type: ident, $input: ident, $info: ident, $info_fn: ident, $search_fn: ident) => {
        pub mod $mod {
            use super::*;

            #[get("/")]
            async fn all(store: Store) -> Result<Json<Vec<Listed<$type>>>> {
                let items = store
                    .run(|s| Actions::<$type>::all(s, Order::Name))
                    .await?;
                Ok(Json(items.into_iter().map(Listed::from).collect()))
            }

            #[post("/", data = "<obj>")]
            async fn create(store: Store, obj: Json<$input>) -> Result<Json<Id<$type>>> {
                let item = $type::try_from(obj.into_inner())?;
                store
                    .run(move |s| Actions::<$type>::create(s, item))
                    .await
                    .map(Json)
            }

            #[post("/<id>", data = "<obj>")]
            async fn update(store: Store, id: Id<$type>, obj: Json<$input>) -> Result<Json<$type>> {
                let item = $type::try_from(obj.into_inner())?;
                store
                    .run(move |s| Actions::<$type>::update(s, id, item))
                    .await
                    .map(Json)
            }

            #[get("/<id>")]
            async fn get(store: Store, id: Id<$type>) -> Result<Json<$info>> {
                store
                    .run(move |s| s.$info_fn(id, schedule::now()))
                    .await
                    .map(Json)
            }

            #[delete("/<id>")]
            async fn delete(store: Store, id: Id<$type>) -> Result<Json<$type>> {
                store
                    .run(move |s| Actions::<$type>::delete(s, id))
                    .await
                    .map(Json)
            }

            #[get("/search?<term>")]
            async fn search(store: Store, term: Option<String>) -> Result<Json<SearchResult<$type>>> {
                let term = term.unwrap_or_default();
                store
                    .run(move |s| s.$search_fn(&term, schedule::now()))
                    .await
                    .map(Json)
            }

            pub fn routes() -> Vec<Route> {
                routes![all, create, update, get, delete, search]
            }
        }
    };
}

derive_routes!(venue, Venue, VenueInput, VenueInfo, venue_info, search_venues);
derive_routes!(artist, Artist, ArtistInput, ArtistInfo, artist_info, search_artists);

pub mod area {
    use super::*;

    #[get("/")]
    async fn all(store: Store) -> Result<Json<Vec<Area>>> {
        store.run(|s| s.areas(schedule::now())).await.map(Json)
    }

    pub fn routes() -> Vec<Route> {
        routes![all]
    }
}

pub mod show {
    use super::*;

    #[get("/")]
    async fn all(store: Store) -> Result<Json<Vec<ShowInfo>>> {
        store.run(|s| s.show_listing()).await.map(Json)
    }

    #[post("/", data = "<obj>")]
    async fn create(store: Store, obj: Json<ShowInput>) -> Result<Json<Id<Show>>> {
        let show = Show::try_from(obj.into_inner())?;
        store.run(move |s| s.create_show(show)).await.map(Json)
    }

    #[get("/<id>")]
    async fn get(store: Store, id: Id<Show>) -> Result<Json<Show>> {
        store.run(move |s| s.read_show(id)).await.map(Json)
    }

    pub fn routes() -> Vec<Route> {
        routes![all, create, get]
    }
}
