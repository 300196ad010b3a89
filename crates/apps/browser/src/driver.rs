//! Async shell around the synchronous session.
//!
//! One current-thread loop multiplexes three sources: script lines from
//! stdin, completions of in-flight backend requests, and the session's next
//! debounce deadline. The session itself never awaits anything.

use std::sync::Arc;
use std::time::Duration;

use foundation::Millis;
use futures_util::stream::{FuturesUnordered, StreamExt};
use runtime::{FetchSeq, Subscription};
use scene::headless::{HeadlessMap, RecordingList};
use scene::{
    Fetch, FetchFailed, HighlightChanged, MapWidget, ResetCompleted, SelectionPending, Session,
};
use serde_json::{json, Value};
use streaming::{Backend, BoxFuture, City, FetchError, LocationRecord, MovieDetail, Suggestions};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::command::Command;

pub type BrowserSession = Session<HeadlessMap, RecordingList>;

/// A finished backend request, ready to hand back to the session.
enum Completion {
    Locations(FetchSeq, Result<Vec<LocationRecord>, FetchError>),
    Suggestions(FetchSeq, Result<Suggestions, FetchError>),
    Movie(FetchSeq, Result<MovieDetail, FetchError>),
    Cities(FetchSeq, Result<Vec<City>, FetchError>),
}

fn dispatch(backend: &Arc<dyn Backend>, fetch: Fetch) -> BoxFuture<'static, Completion> {
    let backend = Arc::clone(backend);
    match fetch {
        Fetch::Locations(ticket) => Box::pin(async move {
            Completion::Locations(ticket.seq, backend.fetch_locations(ticket.query).await)
        }),
        Fetch::Suggestions { seq, query } => {
            Box::pin(async move { Completion::Suggestions(seq, backend.search(query).await) })
        }
        Fetch::Movie { seq, query } => {
            Box::pin(async move { Completion::Movie(seq, backend.fetch_movie(query).await) })
        }
        Fetch::Cities { seq } => {
            Box::pin(async move { Completion::Cities(seq, backend.fetch_cities().await) })
        }
    }
}

/// Subscriptions used to log what the session publishes.
struct Observers {
    resets: Subscription<ResetCompleted>,
    pending: Subscription<SelectionPending>,
    highlights: Subscription<HighlightChanged>,
    failures: Subscription<FetchFailed>,
}

impl Observers {
    fn attach(session: &mut BrowserSession) -> Self {
        let events = session.events_mut();
        Self {
            resets: events.reset_completed.subscribe(),
            pending: events.selection_pending.subscribe(),
            highlights: events.highlight_changed.subscribe(),
            failures: events.fetch_failed.subscribe(),
        }
    }

    fn report(&self, session: &mut BrowserSession) {
        let events = session.events_mut();
        for e in events.reset_completed.poll(&self.resets) {
            info!(seq = %e.seq, count = e.count, "locations loaded");
        }
        for e in events.selection_pending.poll(&self.pending) {
            info!(token = e.token, target = ?e.target, "waiting for locations");
        }
        for e in events.highlight_changed.poll(&self.highlights) {
            info!(location = %e.location, highlighted = e.highlighted, "highlight");
        }
        for e in events.fetch_failed.poll(&self.failures) {
            warn!(endpoint = %e.endpoint, message = %e.message, "request failed");
        }
    }
}

pub struct Driver {
    session: BrowserSession,
    backend: Arc<dyn Backend>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    observers: Observers,
    started: Instant,
}

impl Driver {
    pub fn new(mut session: BrowserSession, backend: Arc<dyn Backend>) -> Self {
        let observers = Observers::attach(&mut session);
        Self {
            session,
            backend,
            in_flight: FuturesUnordered::new(),
            observers,
            started: Instant::now(),
        }
    }

    fn now(&self) -> Millis {
        Millis::from_duration(self.started.elapsed())
    }

    fn submit(&mut self, fetch: Fetch) {
        info!(endpoint = %fetch.endpoint(), seq = %fetch.seq(), "request");
        self.in_flight.push(dispatch(&self.backend, fetch));
    }

    /// Runs until `quit`, or until stdin is exhausted and no request or timer
    /// is left.
    pub async fn run<R>(mut self, mut lines: Lines<R>) -> BrowserSession
    where
        R: AsyncBufRead + Unpin,
    {
        match self.session.start() {
            Ok(fetch) => self.submit(fetch),
            Err(error) => warn!(%error, "session not started"),
        }

        let mut input_open = true;
        loop {
            let deadline = self.session.next_deadline();
            if !input_open && deadline.is_none() && self.in_flight.is_empty() {
                break;
            }
            let wake_at = deadline
                .map(|d| self.started + d.as_duration())
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                line = lines.next_line(), if input_open => match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() || line.trim_start().starts_with('#') {
                            continue;
                        }
                        match line.parse::<Command>() {
                            Ok(Command::Quit) => break,
                            Ok(command) => self.execute(command),
                            Err(error) => warn!(%error, line = %line, "ignored"),
                        }
                    }
                    Ok(None) => input_open = false,
                    Err(error) => {
                        warn!(%error, "stdin closed");
                        input_open = false;
                    }
                },
                Some(done) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(done);
                }
                _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                    let now = self.now();
                    for fetch in self.session.poll(now) {
                        self.submit(fetch);
                    }
                }
            }
            self.observers.report(&mut self.session);
        }

        self.session.teardown();
        self.session
    }

    fn complete(&mut self, done: Completion) {
        let now = self.now();
        match done {
            Completion::Locations(seq, result) => self.session.locations_loaded(seq, result),
            Completion::Suggestions(seq, result) => {
                self.session.suggestions_loaded(seq, result);
                if let Some(s) = self.session.suggestions() {
                    for m in &s.movies {
                        info!(movie = %m.id, title = %m.title, "suggestion");
                    }
                    for l in &s.locations {
                        info!(location = %l.id, name = ?l.short_name, "suggestion");
                    }
                }
            }
            Completion::Movie(seq, result) => self.session.movie_loaded(seq, result, now),
            Completion::Cities(seq, result) => self.session.cities_loaded(seq, result, now),
        }
    }

    fn execute(&mut self, command: Command) {
        let now = self.now();
        if let Command::Open(id) = &command {
            match self.session.open_movie(id) {
                Ok(fetch) => self.submit(fetch),
                Err(error) => warn!(%error, "command rejected"),
            }
            return;
        }
        let session = &mut self.session;
        let result = match command {
            Command::Pan(center) => {
                session.map_mut().drag_to(center);
                session.viewport_changed(now);
                Ok(())
            }
            Command::Zoom(zoom) => {
                let center = session.map().center();
                session.map_mut().set_center(center, zoom);
                session.viewport_changed(now);
                Ok(())
            }
            Command::Resize { width, height } => {
                session.resize(width, height, now);
                Ok(())
            }
            Command::Marker(label) => {
                let marker = session
                    .store()
                    .iter()
                    .find(|e| e.label() == label)
                    .map(|e| e.marker());
                match marker {
                    Some(marker) => session.marker_clicked(marker).map(|_| ()),
                    None => {
                        warn!(label, "no pin with that label");
                        Ok(())
                    }
                }
            }
            Command::Tile(id) => session.tile_clicked(&id).map(|_| ()),
            Command::Add { id, movie, at } => {
                let idx = u32::try_from(session.store().len()).unwrap_or(u32::MAX);
                let record = LocationRecord {
                    id,
                    lat: at.lat,
                    lng: at.lng,
                    idx,
                    movie_id: movie,
                    movie_title: None,
                    movie_release_date: None,
                    movie_poster: None,
                    formatted_name: None,
                    short_name: None,
                    city: session.city().cloned(),
                    city_name: None,
                };
                session.add_location(record).map(|added| {
                    if !added {
                        warn!("location already on the map");
                    }
                })
            }
            Command::Remove(id) => session.remove_location(&id),
            Command::Search(text) => {
                session.search_input(&text, now);
                Ok(())
            }
            Command::PickMovie(id) => session.select_movie_suggestion(&id, now),
            Command::PickLocation(id) => session.select_location_suggestion(&id, now),
            Command::Close => {
                session.close_movie();
                Ok(())
            }
            Command::City(id) => session.select_city(&id, now),
            Command::Clear => {
                let cleared = session.clear_highlights();
                info!(cleared, "highlights cleared");
                Ok(())
            }
            Command::Scroll(row) => {
                session.list_mut().scroll_to(row);
                session.list_scrolled();
                Ok(())
            }
            Command::Status => {
                println!("{}", status(session));
                Ok(())
            }
            Command::Open(_) | Command::Quit => Ok(()),
        };
        if let Err(error) = result {
            warn!(%error, "command rejected");
        }
    }
}

/// JSON snapshot of the session for the `status` command.
pub fn status(session: &BrowserSession) -> Value {
    let map = session.map();
    let locations: Vec<Value> = session
        .store()
        .iter()
        .map(|e| {
            json!({
                "id": e.id().as_str(),
                "label": e.label(),
                "movie": e.movie_id().as_str(),
                "title": e.record().movie_title,
                "highlighted": session.highlights().is_highlighted(e.id()),
                "street_view": session.list().street_view(e.id()),
            })
        })
        .collect();
    let suggestions = session.suggestions().map(|s| {
        json!({
            "movies": s.movies.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            "locations": s.locations.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(),
        })
    });
    let counters: serde_json::Map<String, Value> = session
        .metrics()
        .snapshot()
        .counters
        .into_iter()
        .map(|(name, value)| (name.to_string(), json!(value)))
        .collect();

    json!({
        "center": map.center(),
        "zoom": map.zoom(),
        "bounds": map.bounds(),
        "city": session.city().map(|c| c.as_str()),
        "locations": locations,
        "suggestions": suggestions,
        "movie": session.movie_detail().map(|d| d.title.as_str()),
        "locations_in_flight": session.store().fetch_in_flight(),
        "pending_selection": session.resolver().pending().map(|p| p.token),
        "counters": counters,
    })
}

#[cfg(test)]
mod tests {
    use super::{status, Driver};
    use foundation::{CityId, Coordinate, LocationId, MovieId};
    use scene::headless::{HeadlessMap, RecordingList};
    use scene::{Session, SessionConfig};
    use std::sync::Arc;
    use streaming::{
        BoxFuture, City, FetchError, LocationQuery, LocationRecord, MovieDetail, MovieQuery,
        SearchQuery, Suggestions,
    };
    use tokio::io::AsyncBufReadExt;

    /// Backend answering from fixed data: every location query returns the
    /// same two locations.
    struct FixedBackend;

    fn location(id: &str, idx: u32) -> LocationRecord {
        LocationRecord {
            id: LocationId::new(id),
            lat: 37.7749 + f64::from(idx) * 0.001,
            lng: -122.4194,
            idx,
            movie_id: MovieId::new("tt0052357"),
            movie_title: Some("Vertigo".into()),
            movie_release_date: None,
            movie_poster: None,
            formatted_name: None,
            short_name: None,
            city: Some(CityId::new("sf")),
            city_name: None,
        }
    }

    impl streaming::Backend for FixedBackend {
        fn fetch_locations(
            &self,
            _query: LocationQuery,
        ) -> BoxFuture<'_, Result<Vec<LocationRecord>, FetchError>> {
            Box::pin(async { Ok(vec![location("a", 0), location("b", 1)]) })
        }

        fn fetch_movie(
            &self,
            _query: MovieQuery,
        ) -> BoxFuture<'_, Result<MovieDetail, FetchError>> {
            Box::pin(async {
                Err(FetchError::new(
                    streaming::Endpoint::Movie,
                    streaming::FetchErrorKind::Status(404),
                    "Not found",
                ))
            })
        }

        fn search(&self, _query: SearchQuery) -> BoxFuture<'_, Result<Suggestions, FetchError>> {
            Box::pin(async { Ok(Suggestions::default()) })
        }

        fn fetch_cities(&self) -> BoxFuture<'_, Result<Vec<City>, FetchError>> {
            Box::pin(async {
                Ok(vec![City {
                    id: CityId::new("sf"),
                    shorthand: Some("SF".into()),
                    formatted_name: "San Francisco, CA, USA".into(),
                    lat: 37.7749,
                    lng: -122.4194,
                }])
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn script_drives_session_to_completion() {
        let session = Session::new(
            SessionConfig::default(),
            HeadlessMap::new(Coordinate::new(0.0, 0.0), 2, 800, 600),
            RecordingList::new(5),
        );
        let script = "# comment\ntile a\nbogus\nadd x tt0052357 37.77 -122.42\nremove x\nstatus\n";
        let lines = tokio::io::BufReader::new(script.as_bytes()).lines();

        let driver = Driver::new(session, Arc::new(FixedBackend));
        let session = driver.run(lines).await;

        // The city load armed the location debounce; the driver waited for it
        // and applied the result before stdin ran dry.
        assert!(!session.is_alive());
        let json = status(&session);
        assert_eq!(json["city"], "sf");
        assert_eq!(json["locations"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["counters"]["fetch.locations.issued"], 1);
        assert_eq!(json["counters"]["store.reset"], 1);
        assert_eq!(json["locations_in_flight"], false);
    }
}
