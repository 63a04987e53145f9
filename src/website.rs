use maud::{html, Markup, DOCTYPE};
use rocket::form::Form;
use rocket::http::Status;
use rocket::request::FlashMessage;
use rocket::response::status::Custom;
use rocket::response::{Flash, Redirect};
use rocket::{Build, Request, Rocket};

use crate::error::{Error, Result};
use crate::form::{self, ArtistInput, SearchInput, ShowInput, VenueInput};
use crate::store::info::{ArtistInfo, SearchResult, ShowInfo, ShowsInfo, VenueInfo};
use crate::store::{schedule, Actions, Artist, Id, Order, Show, Store, Venue};

const GENRES: &[&str] = &[
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Other",
];

pub fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount(
            "/",
            routes![
                home,
                venues,
                search_venues,
                venue,
                create_venue_form,
                create_venue,
                edit_venue_form,
                edit_venue,
                delete_venue,
                delete_venue_verb,
                artists,
                search_artists,
                artist,
                create_artist_form,
                create_artist,
                edit_artist_form,
                edit_artist,
                delete_artist,
                delete_artist_verb,
                shows,
                create_show_form,
                create_show
            ],
        )
        .register("/", catchers![not_found, server_error])
}

#[get("/")]
fn home(flash: Option<FlashMessage<'_>>) -> Markup {
    base_html(
        html! {
            div.home {
                h1 { "Book the music" }
                p { "Find venues and artists, and put on a show." }
                ul {
                    li { a href="/venues/create" { "List a venue" } }
                    li { a href="/artists/create" { "List an artist" } }
                    li { a href="/shows/create" { "Post a show" } }
                }
            }
        },
        &Page::Home,
        flash.as_ref(),
    )
}

//  Venues

#[get("/venues")]
async fn venues(store: Store, flash: Option<FlashMessage<'_>>) -> Result<Markup> {
    let areas = store.run(|s| s.areas(schedule::now())).await?;

    Ok(base_html(
        html! {
            h1 { "Venues" }
            ( search_form("/venues/search", "Find a venue", "") )
            @for area in &areas {
                section.area {
                    h2 { ( area.city ) ", " ( area.state ) }
                    ul.items {
                        @for venue in &area.venues {
                            li {
                                a href=( format!("/venues/{}", venue.id) ) { ( venue.name ) }
                                " "
                                span.upcoming { ( upcoming_label(venue.num_upcoming_shows) ) }
                            }
                        }
                    }
                }
            }
        },
        &Page::Venues,
        flash.as_ref(),
    ))
}

#[post("/venues/search", data = "<search>")]
async fn search_venues(store: Store, search: Form<SearchInput>) -> Result<Markup> {
    let term = search.into_inner().search_term;
    let query = term.clone();
    let results = store
        .run(move |s| s.search_venues(&query, schedule::now()))
        .await?;

    Ok(base_html(
        search_results("/venues", "/venues/search", "Find a venue", &term, &results),
        &Page::Venues,
        None,
    ))
}

#[get("/venues/<id>")]
async fn venue(store: Store, id: Id<Venue>, flash: Option<FlashMessage<'_>>) -> Result<Markup> {
    let info = store
        .run(move |s| s.venue_info(id, schedule::now()))
        .await?;

    Ok(base_html(render_venue(&info), &Page::Venues, flash.as_ref()))
}

#[get("/venues/create")]
fn create_venue_form() -> Markup {
    base_html(
        html! {
            h1 { "List a new venue" }
            ( venue_form("/venues/create", &VenueInput::default()) )
        },
        &Page::Venues,
        None,
    )
}

#[post("/venues/create", data = "<input>")]
async fn create_venue(store: Store, input: Form<VenueInput>) -> Flash<Redirect> {
    let input = input.into_inner();
    let label = input.label();
    let result = match Venue::try_from(input) {
        Ok(venue) => store.run(move |s| Actions::<Venue>::create(s, venue)).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(_) => Flash::success(
            Redirect::to("/"),
            format!("Venue {} was successfully listed!", label),
        ),
        Err(err) => fail(err, "/", &format!("Venue {} could not be listed.", label)),
    }
}

#[get("/venues/<id>/edit")]
async fn edit_venue_form(store: Store, id: Id<Venue>) -> std::result::Result<Markup, Flash<Redirect>> {
    match store.run(move |s| Actions::<Venue>::read(s, id)).await {
        Ok(venue) => Ok(base_html(
            html! {
                h1 { "Edit venue " ( venue.name ) }
                ( venue_form(&format!("/venues/{}/edit", id), &VenueInput::from(&venue)) )
            },
            &Page::Venues,
            None,
        )),
        Err(err) => Err(fail(err, "/", "The venue cannot be edited.")),
    }
}

#[post("/venues/<id>/edit", data = "<input>")]
async fn edit_venue(store: Store, id: Id<Venue>, input: Form<VenueInput>) -> Flash<Redirect> {
    let input = input.into_inner();
    let label = input.label();
    let result = match Venue::try_from(input) {
        Ok(venue) => {
            store
                .run(move |s| Actions::<Venue>::update(s, id, venue))
                .await
        }
        Err(err) => Err(err),
    };

    let page = format!("/venues/{}", id);
    match result {
        Ok(_) => Flash::success(
            Redirect::to(page),
            format!("Venue {} was successfully updated!", label),
        ),
        Err(err) => fail(err, &page, &format!("Venue {} could not be updated.", label)),
    }
}

#[post("/venues/<id>/delete")]
async fn delete_venue(store: Store, id: Id<Venue>) -> Flash<Redirect> {
    remove_venue(store, id).await
}

#[delete("/venues/<id>/delete")]
async fn delete_venue_verb(store: Store, id: Id<Venue>) -> Flash<Redirect> {
    remove_venue(store, id).await
}

async fn remove_venue(store: Store, id: Id<Venue>) -> Flash<Redirect> {
    match store.run(move |s| Actions::<Venue>::delete(s, id)).await {
        Ok(venue) => Flash::success(
            Redirect::to("/"),
            format!("Success deleting Venue \"{}\"", venue.name),
        ),
        Err(err) => fail(err, "/", &format!("Venue {} could not be deleted.", id)),
    }
}

//  Artists

#[get("/artists")]
async fn artists(store: Store, flash: Option<FlashMessage<'_>>) -> Result<Markup> {
    let artists = store
        .run(|s| Actions::<Artist>::all(s, Order::Name))
        .await?;

    Ok(base_html(
        html! {
            h1 { "Artists" }
            ( search_form("/artists/search", "Find an artist", "") )
            ul.items {
                @for (id, artist) in &artists {
                    li { a href=( format!("/artists/{}", id) ) { ( artist.name ) } }
                }
            }
        },
        &Page::Artists,
        flash.as_ref(),
    ))
}

#[post("/artists/search", data = "<search>")]
async fn search_artists(store: Store, search: Form<SearchInput>) -> Result<Markup> {
    let term = search.into_inner().search_term;
    let query = term.clone();
    let results = store
        .run(move |s| s.search_artists(&query, schedule::now()))
        .await?;

    Ok(base_html(
        search_results("/artists", "/artists/search", "Find an artist", &term, &results),
        &Page::Artists,
        None,
    ))
}

#[get("/artists/<id>")]
async fn artist(store: Store, id: Id<Artist>, flash: Option<FlashMessage<'_>>) -> Result<Markup> {
    let info = store
        .run(move |s| s.artist_info(id, schedule::now()))
        .await?;

    Ok(base_html(render_artist(&info), &Page::Artists, flash.as_ref()))
}

#[get("/artists/create")]
fn create_artist_form() -> Markup {
    base_html(
        html! {
            h1 { "List a new artist" }
            ( artist_form("/artists/create", &ArtistInput::default()) )
        },
        &Page::Artists,
        None,
    )
}

#[post("/artists/create", data = "<input>")]
async fn create_artist(store: Store, input: Form<ArtistInput>) -> Flash<Redirect> {
    let input = input.into_inner();
    let label = input.label();
    let result = match Artist::try_from(input) {
        Ok(artist) => store.run(move |s| Actions::<Artist>::create(s, artist)).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(_) => Flash::success(
            Redirect::to("/"),
            format!("Artist {} was successfully listed!", label),
        ),
        Err(err) => fail(err, "/", &format!("Artist {} could not be listed.", label)),
    }
}

#[get("/artists/<id>/edit")]
async fn edit_artist_form(store: Store, id: Id<Artist>) -> std::result::Result<Markup, Flash<Redirect>> {
    match store.run(move |s| Actions::<Artist>::read(s, id)).await {
        Ok(artist) => Ok(base_html(
            html! {
                h1 { "Edit artist " ( artist.name ) }
                ( artist_form(&format!("/artists/{}/edit", id), &ArtistInput::from(&artist)) )
            },
            &Page::Artists,
            None,
        )),
        Err(err) => Err(fail(err, "/", "The artist cannot be edited.")),
    }
}

#[post("/artists/<id>/edit", data = "<input>")]
async fn edit_artist(store: Store, id: Id<Artist>, input: Form<ArtistInput>) -> Flash<Redirect> {
    let input = input.into_inner();
    let label = input.label();
    let result = match Artist::try_from(input) {
        Ok(artist) => {
            store
                .run(move |s| Actions::<Artist>::update(s, id, artist))
                .await
        }
        Err(err) => Err(err),
    };

    let page = format!("/artists/{}", id);
    match result {
        Ok(_) => Flash::success(
            Redirect::to(page),
            format!("Artist {} was successfully updated!", label),
        ),
        Err(err) => fail(err, &page, &format!("Artist {} could not be updated.", label)),
    }
}

#[post("/artists/<id>/delete")]
async fn delete_artist(store: Store, id: Id<Artist>) -> Flash<Redirect> {
    remove_artist(store, id).await
}

#[delete("/artists/<id>/delete")]
async fn delete_artist_verb(store: Store, id: Id<Artist>) -> Flash<Redirect> {
    remove_artist(store, id).await
}

async fn remove_artist(store: Store, id: Id<Artist>) -> Flash<Redirect> {
    match store.run(move |s| Actions::<Artist>::delete(s, id)).await {
        Ok(artist) => Flash::success(
            Redirect::to("/"),
            format!("Success deleting Artist \"{}\"", artist.name),
        ),
        Err(err) => fail(err, "/", &format!("Artist {} could not be deleted.", id)),
    }
}

//  Shows

#[get("/shows")]
async fn shows(store: Store, flash: Option<FlashMessage<'_>>) -> Result<Markup> {
    let shows = store.run(|s| s.show_listing()).await?;

    Ok(base_html(
        html! {
            h1 { "Shows" }
            ol.shows {
                @for show in &shows {
                    li { ( render_show(show, Side::Both) ) }
                }
            }
        },
        &Page::Shows,
        flash.as_ref(),
    ))
}

#[get("/shows/create")]
async fn create_show_form(store: Store) -> Result<Markup> {
    let (venues, artists) = store
        .run(|s| -> Result<_> {
            let venues = Actions::<Venue>::all(s, Order::Name)?;
            let artists = Actions::<Artist>::all(s, Order::Name)?;
            Ok((venues, artists))
        })
        .await?;

    Ok(base_html(
        html! {
            h1 { "Post a new show" }
            form method="post" action="/shows/create" {
                label {
                    "Venue"
                    select name="venue_id" required {
                        @for (id, venue) in &venues {
                            option value=( id ) { ( venue.name ) }
                        }
                    }
                }
                label {
                    "Artist"
                    select name="artist_id" required {
                        @for (id, artist) in &artists {
                            option value=( id ) { ( artist.name ) }
                        }
                    }
                }
                label {
                    "Start time"
                    input type="datetime-local" name="start_time" required;
                }
                button type="submit" { "Create show" }
            }
        },
        &Page::Shows,
        None,
    ))
}

#[post("/shows/create", data = "<input>")]
async fn create_show(store: Store, input: Form<ShowInput>) -> Flash<Redirect> {
    let result = match Show::try_from(input.into_inner()) {
        Ok(show) => store.run(move |s| s.create_show(show)).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(_) => Flash::success(Redirect::to("/"), "Show was successfully listed!"),
        Err(err) => fail(err, "/", "Show could not be listed."),
    }
}

//  Errors

#[catch(404)]
fn not_found(request: &Request<'_>) -> Custom<Markup> {
    Custom(
        Status::NotFound,
        error_page(
            "Not found",
            &format!("Nothing lives at {}.", request.uri().path()),
        ),
    )
}

#[catch(default)]
fn server_error(status: Status, _request: &Request<'_>) -> Custom<Markup> {
    let message = match status.code {
        409 => "That change conflicts with the stored records.",
        422 => "Some of the submitted data could not be used.",
        400..=499 => "The request could not be handled.",
        _ => "Something went wrong on our side.",
    };

    Custom(status, error_page(status.reason().unwrap_or("Error"), message))
}

/// Logs `err` and turns it into a notification on `page`.
/// A vanished record sends the user home instead.
fn fail(err: Error, page: &str, attempt: &str) -> Flash<Redirect> {
    if err.status().code >= 500 {
        log::error!("{} {}", attempt, err);
    } else {
        log::warn!("{} {}", attempt, err);
    }

    let message = match &err {
        Error::Validation(reason) => format!("{} Please check the form: {}.", attempt, reason),
        Error::NotFound { kind, id } => {
            return Flash::error(
                Redirect::to("/"),
                format!("{} The {} with id {} was not found!", attempt, kind, id),
            )
        }
        Error::Integrity(reason) => format!("{} It conflicts with stored data: {}.", attempt, reason),
        Error::DanglingReference { .. } | Error::Database(_) => {
            format!("An error occurred. {}", attempt)
        }
    };

    Flash::error(Redirect::to(page.to_string()), message)
}

#[derive(PartialEq)]
enum Page {
    Home,
    Venues,
    Artists,
    Shows,
}

impl Page {
    fn url(&self) -> &'static str {
        use Page::*;

        match self {
            Home => "/",
            Venues => "/venues",
            Artists => "/artists",
            Shows => "/shows",
        }
    }

    fn title(&self) -> &'static str {
        use Page::*;

        match self {
            Home => "Home",
            Venues => "Venues",
            Artists => "Artists",
            Shows => "Shows",
        }
    }
}

fn base_html(main: Markup, current_page: &Page, flash: Option<&FlashMessage<'_>>) -> Markup {
    use Page::*;
    html! {
        ( DOCTYPE )
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Gigbook | " ( current_page.title() ) }

                link href="/static/main.css" rel="stylesheet";
            }
            body {
                header {
                    div.header {
                        a.title href="/" { h1 { "Gigbook" } }
                        nav {
                            ol {
                                @for page in vec![Venues, Artists, Shows] {
                                    li { ( nav_entry(page, current_page) ) }
                                }
                            }
                        }
                    }
                }
                main {
                    @if let Some(flash) = flash {
                        div class=( format!("flash {}", flash.kind()) ) { ( flash.message() ) }
                    }
                    ( main )
                }
            }
        }
    }
}

fn nav_entry(page: Page, current: &Page) -> Markup {
    html! {
        a.current[current == &page] href=( page.url() ) { ( page.title() ) }
    }
}

fn error_page(title: &str, message: &str) -> Markup {
    base_html(
        html! {
            div.error {
                h1 { ( title ) }
                p { ( message ) }
                a href="/" { "Back home" }
            }
        },
        &Page::Home,
        None,
    )
}

fn search_form(action: &str, placeholder: &str, term: &str) -> Markup {
    html! {
        form.search method="post" action=( action ) {
            input type="search" name="search_term" placeholder=( placeholder ) value=( term );
            button type="submit" { "Search" }
        }
    }
}

fn search_results<T>(
    base: &str,
    action: &str,
    placeholder: &str,
    term: &str,
    results: &SearchResult<T>,
) -> Markup {
    html! {
        ( search_form(action, placeholder, term) )
        h2 { "Number of search results for \"" ( term ) "\": " ( results.count() ) }
        ul.items {
            @for item in results.data() {
                li {
                    a href=( format!("{}/{}", base, item.id) ) { ( item.name ) }
                    " "
                    span.upcoming { ( upcoming_label(item.num_upcoming_shows) ) }
                }
            }
        }
    }
}

fn render_venue(info: &VenueInfo) -> Markup {
    let venue = &info.venue;
    html! {
        div.venue {
            div.details {
                h1 { ( venue.name ) }
                p.subtitle { "ID: " ( info.id ) }
                ( genre_list(venue.genres.as_slice()) )
                dl {
                    @if let Some(address) = &venue.address {
                        dt { "Address" } dd { ( address ) }
                    }
                    dt { "Location" } dd { ( venue.city ) ", " ( venue.state ) }
                    ( contact(&venue.phone, &venue.website, &venue.facebook_link) )
                }
                ( seeking(venue.seeking_talent, "Currently seeking talent", "Not currently seeking talent", &venue.seeking_description) )
                @if let Some(image) = &venue.image_link {
                    img.portrait src=( image ) alt=( venue.name );
                }
                p.actions {
                    a href=( format!("/venues/{}/edit", info.id) ) { "Edit" }
                    form method="post" action=( format!("/venues/{}/delete", info.id) ) {
                        button type="submit" { "Delete" }
                    }
                }
            }
            ( render_shows(&info.shows, Side::Artist) )
        }
    }
}

fn render_artist(info: &ArtistInfo) -> Markup {
    let artist = &info.artist;
    html! {
        div.artist {
            div.details {
                h1 { ( artist.name ) }
                p.subtitle { "ID: " ( info.id ) }
                ( genre_list(artist.genres.as_slice()) )
                dl {
                    dt { "Location" } dd { ( artist.city ) ", " ( artist.state ) }
                    ( contact(&artist.phone, &artist.website, &artist.facebook_link) )
                }
                ( seeking(artist.seeking_venue, "Currently seeking performance venues", "Not currently seeking performance venues", &artist.seeking_description) )
                @if let Some(image) = &artist.image_link {
                    img.portrait src=( image ) alt=( artist.name );
                }
                p.actions {
                    a href=( format!("/artists/{}/edit", info.id) ) { "Edit" }
                    form method="post" action=( format!("/artists/{}/delete", info.id) ) {
                        button type="submit" { "Delete" }
                    }
                }
            }
            ( render_shows(&info.shows, Side::Venue) )
        }
    }
}

fn genre_list(genres: &[String]) -> Markup {
    html! {
        ul.genres {
            @for genre in genres {
                li { ( genre ) }
            }
        }
    }
}

fn contact(phone: &Option<String>, website: &Option<String>, facebook_link: &Option<String>) -> Markup {
    html! {
        dt { "Phone" } dd { ( phone.as_deref().unwrap_or("No phone") ) }
        dt { "Website" }
        dd {
            @match website {
                Some(website) => { a href=( website ) { ( website ) } }
                None => { "No website" }
            }
        }
        dt { "Facebook" }
        dd {
            @match facebook_link {
                Some(link) => { a href=( link ) { ( link ) } }
                None => { "No Facebook link" }
            }
        }
    }
}

fn seeking(seeking: bool, yes: &str, no: &str, description: &Option<String>) -> Markup {
    html! {
        @if seeking {
            div.seeking {
                p.lead { ( yes ) }
                @if let Some(description) = description {
                    p.description { ( description ) }
                }
            }
        } @else {
            p.not-seeking { ( no ) }
        }
    }
}

/// Which side of a show is worth showing on the current page.
#[derive(Clone, Copy, PartialEq)]
enum Side {
    Venue,
    Artist,
    Both,
}

fn render_shows(shows: &ShowsInfo, side: Side) -> Markup {
    html! {
        section.shows {
            h2 { ( shows.upcoming_count() ) " Upcoming " ( plural(shows.upcoming_count(), "Show", "Shows") ) }
            ul {
                @for show in shows.upcoming() {
                    li { ( render_show(show, side) ) }
                }
            }
            h2 { ( shows.past_count() ) " Past " ( plural(shows.past_count(), "Show", "Shows") ) }
            ul {
                @for show in shows.past() {
                    li { ( render_show(show, side) ) }
                }
            }
        }
    }
}

fn render_show(show: &ShowInfo, side: Side) -> Markup {
    html! {
        div.show {
            @if side != Side::Venue {
                @if let Some(image) = &show.artist_image_link {
                    img src=( image ) alt=( show.artist_name );
                }
                a href=( format!("/artists/{}", show.artist_id) ) { ( show.artist_name ) }
            }
            @if side == Side::Both {
                " at "
            }
            @if side != Side::Artist {
                @if let Some(image) = &show.venue_image_link {
                    img src=( image ) alt=( show.venue_name );
                }
                a href=( format!("/venues/{}", show.venue_id) ) { ( show.venue_name ) }
            }
            time datetime=( show.start_time ) { ( format_datetime(&show.start_time) ) }
        }
    }
}

fn venue_form(action: &str, input: &VenueInput) -> Markup {
    html! {
        form.entity method="post" action=( action ) {
            ( text_field("name", "Name", &input.name, true) )
            ( text_field("city", "City", &input.city, true) )
            ( text_field("state", "State", &input.state, true) )
            ( text_field("address", "Address", &input.address, false) )
            ( text_field("phone", "Phone", &input.phone, false) )
            ( genre_select(&input.genres) )
            ( text_field("image_link", "Image link", &input.image_link, false) )
            ( text_field("website", "Website", &input.website, false) )
            ( text_field("facebook_link", "Facebook link", &input.facebook_link, false) )
            label {
                input type="checkbox" name="seeking_talent" value="true" checked[input.seeking_talent];
                " Seeking talent"
            }
            ( text_area("seeking_description", "Seeking description", &input.seeking_description) )
            button type="submit" { "Save venue" }
        }
    }
}

fn artist_form(action: &str, input: &ArtistInput) -> Markup {
    html! {
        form.entity method="post" action=( action ) {
            ( text_field("name", "Name", &input.name, true) )
            ( text_field("city", "City", &input.city, true) )
            ( text_field("state", "State", &input.state, true) )
            ( text_field("phone", "Phone", &input.phone, false) )
            ( genre_select(&input.genres) )
            ( text_field("image_link", "Image link", &input.image_link, false) )
            ( text_field("website", "Website", &input.website, false) )
            ( text_field("facebook_link", "Facebook link", &input.facebook_link, false) )
            label {
                input type="checkbox" name="seeking_venue" value="true" checked[input.seeking_venue];
                " Seeking venues"
            }
            ( text_area("seeking_description", "Seeking description", &input.seeking_description) )
            button type="submit" { "Save artist" }
        }
    }
}

fn text_field(name: &str, label: &str, value: &Option<String>, required: bool) -> Markup {
    html! {
        label {
            ( label )
            input type="text" name=( name ) value=[value.as_deref()] required[required];
        }
    }
}

fn text_area(name: &str, label: &str, value: &Option<String>) -> Markup {
    html! {
        label {
            ( label )
            textarea name=( name ) { ( value.as_deref().unwrap_or_default() ) }
        }
    }
}

fn genre_select(selected: &[String]) -> Markup {
    html! {
        label {
            "Genres"
            select name="genres" multiple {
                @for genre in GENRES {
                    option value=( genre ) selected[selected.iter().any(|g| g == genre)] { ( genre ) }
                }
            }
        }
    }
}

fn upcoming_label(count: usize) -> String {
    format!("{} upcoming {}", count, plural(count, "show", "shows"))
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// Formats a projected start time for reading, e.g. `Fri Jun 21, 2024 9:30PM`.
fn format_datetime(text: &str) -> String {
    form::parse_start_time(text)
        .map(|time| time.format("%a %b %-d, %Y %-I:%M%p").to_string())
        .unwrap_or_else(|_| text.to_string())
}
