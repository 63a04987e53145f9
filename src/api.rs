use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket};
use serde::Serialize;

use crate::store::routes::{area, artist, show, venue};

pub fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api/venues", venue::routes())
        .mount("/api/venues/areas", area::routes())
        .mount("/api/artists", artist::routes())
        .mount("/api/shows", show::routes())
        .register("/api", catchers![json_error])
}

#[derive(Serialize, Debug)]
struct ErrorBody {
    status: u16,
    reason: &'static str,
}

#[catch(default)]
fn json_error(status: Status, _request: &Request<'_>) -> Custom<Json<ErrorBody>> {
    Custom(
        status,
        Json(ErrorBody {
            status: status.code,
            reason: status.reason().unwrap_or("Unknown Error"),
        }),
    )
}
