//! Composition root for one browsing session.
//!
//! The session is synchronous and never performs I/O. Timers run on the
//! caller's millisecond clock: inputs take `now`, `poll(now)` fires expired
//! debouncers and returns the fetches to run, and the driver hands each
//! fetch result back through the matching `*_loaded` call.

use foundation::{CityId, LocationId, MarkerHandle, Millis, MovieId};
use runtime::{Counter, Debouncer, FetchSeq, Metrics, SequenceGuard, Subscription, Topic, Verdict};
use streaming::{
    City, Endpoint, FetchError, LocationRecord, MovieDetail, MovieQuery, SearchQuery, Suggestions,
};

use crate::config::SessionConfig;
use crate::events::{
    FetchFailed, HighlightChanged, PendingTarget, ResetCompleted, SelectionPending, SessionEvents,
    ViewportChanged,
};
use crate::highlight::{HighlightEngine, HighlightOutcome, Projection};
use crate::resolver::{Resolution, SelectionResolver, SelectionTarget, ViewportMove};
use crate::store::{EntityStore, LocationTicket, StoreOutcome};
use crate::streetview::StreetViewLoader;
use crate::surface::ListSurface;
use crate::viewport::{MapWidget, ViewportAdapter};
use crate::xref::CrossReferenceIndex;

/// Work the driver must perform on the session's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    Locations(LocationTicket),
    Suggestions { seq: FetchSeq, query: SearchQuery },
    Movie { seq: FetchSeq, query: MovieQuery },
    Cities { seq: FetchSeq },
}

impl Fetch {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Fetch::Locations(_) => Endpoint::Locations,
            Fetch::Suggestions { .. } => Endpoint::Search,
            Fetch::Movie { .. } => Endpoint::Movie,
            Fetch::Cities { .. } => Endpoint::Cities,
        }
    }

    pub fn seq(&self) -> FetchSeq {
        match self {
            Fetch::Locations(ticket) => ticket.seq,
            Fetch::Suggestions { seq, .. }
            | Fetch::Movie { seq, .. }
            | Fetch::Cities { seq } => *seq,
        }
    }
}

/// Rejected input. None of these are fatal; the session stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    TornDown,
    UnknownLocation(LocationId),
    UnknownMovie(MovieId),
    UnknownCity(CityId),
    UnknownMarker(MarkerHandle),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::TornDown => write!(f, "session was torn down"),
            SessionError::UnknownLocation(id) => write!(f, "unknown location {id}"),
            SessionError::UnknownMovie(id) => write!(f, "unknown movie {id}"),
            SessionError::UnknownCity(id) => write!(f, "unknown city {id}"),
            SessionError::UnknownMarker(h) => write!(f, "unknown {h}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// One map + tile-list browsing session.
pub struct Session<W: MapWidget, L: ListSurface> {
    config: SessionConfig,
    viewport: ViewportAdapter<W>,
    viewport_changes: Subscription<ViewportChanged>,
    list: L,
    store: EntityStore,
    xref: CrossReferenceIndex,
    highlights: HighlightEngine,
    resolver: SelectionResolver,
    street_view: StreetViewLoader,
    location_debounce: Debouncer,
    search_debounce: Debouncer,
    search_seq: SequenceGuard,
    movie_seq: SequenceGuard,
    city_seq: SequenceGuard,
    events: SessionEvents,
    metrics: Metrics,
    cities: Vec<City>,
    city: Option<CityId>,
    search_text: String,
    suggestions: Option<Suggestions>,
    movie_detail: Option<MovieDetail>,
    alive: bool,
}

impl<W: MapWidget, L: ListSurface> Session<W, L> {
    pub fn new(config: SessionConfig, map: W, list: L) -> Self {
        let mut viewport = ViewportAdapter::new(map);
        let viewport_changes = viewport.subscribe();
        Self {
            store: EntityStore::new(config.street_view.placeholder.clone()),
            street_view: StreetViewLoader::new(config.street_view.clone()),
            location_debounce: Debouncer::new(config.location_debounce_ms),
            search_debounce: Debouncer::new(config.search_debounce_ms),
            config,
            viewport,
            viewport_changes,
            list,
            xref: CrossReferenceIndex::new(),
            highlights: HighlightEngine::new(),
            resolver: SelectionResolver::new(),
            search_seq: SequenceGuard::new(),
            movie_seq: SequenceGuard::new(),
            city_seq: SequenceGuard::new(),
            events: SessionEvents::new(),
            metrics: Metrics::new(),
            cities: Vec::new(),
            city: None,
            search_text: String::new(),
            suggestions: None,
            movie_detail: None,
            alive: true,
        }
    }

    /// Requests the city list; the first city becomes the initial viewport.
    pub fn start(&mut self) -> Result<Fetch, SessionError> {
        self.ensure_alive()?;
        self.metrics.inc(Counter::CityFetchIssued);
        Ok(Fetch::Cities {
            seq: self.city_seq.issue(),
        })
    }

    // ---- timers -------------------------------------------------------

    /// Fires expired debouncers and returns the fetches they issued.
    ///
    /// Each fetch reads the viewport or search text as of `now`, not as of
    /// the trigger that armed it.
    pub fn poll(&mut self, now: Millis) -> Vec<Fetch> {
        let mut out = Vec::new();
        if !self.alive {
            return out;
        }

        if self.location_debounce.poll(now) {
            let supersedes = self.store.fetch_in_flight();
            let ticket = self
                .store
                .begin_fetch(self.viewport.bounds(), self.viewport.center());
            tracing::debug!(
                seq = %ticket.seq,
                bounds = %ticket.query.bounds.to_url_value(),
                supersedes,
                "location fetch issued"
            );
            self.metrics.inc(Counter::LocationFetchIssued);
            out.push(Fetch::Locations(ticket));
        }

        if self.search_debounce.poll(now) {
            let query = SearchQuery {
                text: self.search_text.clone(),
                city: self.city.clone(),
            };
            if query.is_blank() {
                self.search_seq.invalidate();
                self.suggestions = None;
            } else {
                let seq = self.search_seq.issue();
                self.metrics.inc(Counter::SuggestionFetchIssued);
                out.push(Fetch::Suggestions { seq, query });
            }
        }
        out
    }

    /// Earliest pending debounce deadline, if any.
    pub fn next_deadline(&self) -> Option<Millis> {
        match (self.location_debounce.deadline(), self.search_debounce.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ---- inputs -------------------------------------------------------

    /// The map widget reported a user pan or zoom.
    pub fn viewport_changed(&mut self, now: Millis) {
        if self.ignore_after_teardown("viewport_changed") {
            return;
        }
        self.viewport.notify_changed(now);
        self.drain_viewport_changes();
    }

    pub fn resize(&mut self, width_px: u32, height_px: u32, now: Millis) {
        if self.ignore_after_teardown("resize") {
            return;
        }
        self.viewport.resize(width_px, height_px, now);
        self.drain_viewport_changes();
        self.street_view.refresh(&self.store, &mut self.list);
    }

    pub fn list_scrolled(&mut self) {
        if self.ignore_after_teardown("list_scrolled") {
            return;
        }
        self.street_view.refresh(&self.store, &mut self.list);
    }

    pub fn marker_clicked(
        &mut self,
        marker: MarkerHandle,
    ) -> Result<HighlightOutcome, SessionError> {
        self.ensure_alive()?;
        let Some(id) = self.store.location_for_marker(marker).cloned() else {
            self.metrics.inc(Counter::UnknownReference);
            return Err(SessionError::UnknownMarker(marker));
        };
        Ok(self.toggle(&id))
    }

    pub fn tile_clicked(&mut self, id: &LocationId) -> Result<HighlightOutcome, SessionError> {
        self.ensure_alive()?;
        match self.toggle(id) {
            HighlightOutcome::Unknown => Err(SessionError::UnknownLocation(id.clone())),
            outcome => Ok(outcome),
        }
    }

    pub fn clear_highlights(&mut self) -> usize {
        if self.ignore_after_teardown("clear_highlights") {
            return 0;
        }
        let mut proj = projection(
            &self.store,
            &mut self.viewport,
            &mut self.list,
            &mut self.events.highlight_changed,
        );
        self.highlights.clear_all(&mut proj)
    }

    /// Records the search text; the query is sent once typing pauses.
    pub fn search_input(&mut self, text: &str, now: Millis) {
        if self.ignore_after_teardown("search_input") {
            return;
        }
        self.search_text = text.to_string();
        self.search_debounce.trigger(now);
    }

    pub fn select_movie_suggestion(
        &mut self,
        id: &MovieId,
        now: Millis,
    ) -> Result<(), SessionError> {
        self.ensure_alive()?;
        let Some(movie) = self.suggestions.as_ref().and_then(|s| s.movie(id)) else {
            self.metrics.inc(Counter::UnknownReference);
            return Err(SessionError::UnknownMovie(id.clone()));
        };
        let target = SelectionTarget::Movie {
            id: movie.id.clone(),
            bbox: movie.bbox(),
        };
        self.suggestions = None;
        self.select(target, now);
        Ok(())
    }

    pub fn select_location_suggestion(
        &mut self,
        id: &LocationId,
        now: Millis,
    ) -> Result<(), SessionError> {
        self.ensure_alive()?;
        let Some(location) = self.suggestions.as_ref().and_then(|s| s.location(id)) else {
            self.metrics.inc(Counter::UnknownReference);
            return Err(SessionError::UnknownLocation(id.clone()));
        };
        let target = SelectionTarget::Location {
            id: location.id.clone(),
            coord: location.coord(),
        };
        self.suggestions = None;
        self.select(target, now);
        Ok(())
    }

    /// Requests the detail of the movie filmed at `location`, scoped to the
    /// selected city.
    pub fn open_movie(&mut self, location: &LocationId) -> Result<Fetch, SessionError> {
        self.ensure_alive()?;
        let Some(entity) = self.store.get(location) else {
            self.metrics.inc(Counter::UnknownReference);
            return Err(SessionError::UnknownLocation(location.clone()));
        };
        let query = MovieQuery {
            movie: entity.movie_id().clone(),
            city: self.city.clone(),
        };
        self.metrics.inc(Counter::MovieFetchIssued);
        Ok(Fetch::Movie {
            seq: self.movie_seq.issue(),
            query,
        })
    }

    pub fn close_movie(&mut self) {
        self.movie_detail = None;
    }

    /// Centers the map on `id` at the default zoom and makes it the search
    /// and movie context. Any pending selection is dropped.
    pub fn select_city(&mut self, id: &CityId, now: Millis) -> Result<(), SessionError> {
        self.ensure_alive()?;
        let Some(coord) = self.cities.iter().find(|c| &c.id == id).map(City::coord) else {
            self.metrics.inc(Counter::UnknownReference);
            return Err(SessionError::UnknownCity(id.clone()));
        };
        if self.resolver.cancel().is_some() {
            self.metrics.inc(Counter::SelectionSuperseded);
        }
        tracing::info!(city = %id, "city selected");
        self.city = Some(id.clone());
        self.viewport.set_center(coord, self.config.default_zoom, now);
        self.drain_viewport_changes();
        Ok(())
    }

    /// Adds one location outside a fetch. Its tile is appended without
    /// re-rendering the list, and it joins the movie index right away.
    ///
    /// Returns `false` if the id is already live.
    pub fn add_location(&mut self, record: LocationRecord) -> Result<bool, SessionError> {
        self.ensure_alive()?;
        let id = record.id.clone();
        if !self
            .store
            .append(record, self.viewport.markers_mut(), &mut self.list)
        {
            tracing::debug!(location = %id, "location already present");
            return Ok(false);
        }
        self.xref.rebuild(&self.store);
        self.street_view.refresh(&self.store, &mut self.list);
        self.metrics
            .set_gauge("store.entities", self.store.len() as i64);
        Ok(true)
    }

    /// Removes one location with its pin and tile; it leaves the highlight
    /// set and the movie index too.
    pub fn remove_location(&mut self, id: &LocationId) -> Result<(), SessionError> {
        self.ensure_alive()?;
        if !self
            .store
            .remove(id, self.viewport.markers_mut(), &mut self.list)
        {
            self.metrics.inc(Counter::UnknownReference);
            return Err(SessionError::UnknownLocation(id.clone()));
        }
        if self.highlights.forget(id) {
            self.events.highlight_changed.publish(HighlightChanged {
                location: id.clone(),
                highlighted: false,
            });
        }
        self.xref.rebuild(&self.store);
        self.street_view.forget(id);
        self.metrics
            .set_gauge("store.entities", self.store.len() as i64);
        self.metrics
            .set_gauge("highlight.count", self.highlights.len() as i64);
        Ok(())
    }

    /// Cancels timers, destroys every entity and turns every later
    /// completion into a no-op.
    pub fn teardown(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.location_debounce.teardown();
        self.search_debounce.teardown();
        self.resolver.cancel();
        self.store.teardown(self.viewport.markers_mut(), &mut self.list);
        self.highlights.forget_all();
        self.xref.clear();
        self.street_view.reset();
        self.search_seq.invalidate();
        self.movie_seq.invalidate();
        self.city_seq.invalidate();
        self.suggestions = None;
        self.movie_detail = None;
        tracing::info!("session torn down");
    }

    // ---- completions --------------------------------------------------

    pub fn locations_loaded(
        &mut self,
        seq: FetchSeq,
        result: Result<Vec<LocationRecord>, FetchError>,
    ) {
        if self.ignore_after_teardown("locations_loaded") {
            return;
        }
        let outcome = self
            .store
            .apply(seq, result, self.viewport.markers_mut(), &mut self.list);
        match outcome {
            StoreOutcome::Stale { seq } => {
                tracing::debug!(%seq, "stale location result discarded");
                self.metrics.inc(Counter::StaleDiscarded);
            }
            StoreOutcome::Failed { seq, error } => {
                tracing::warn!(%seq, %error, "location fetch failed; keeping previous locations");
                self.fetch_failed(&error);
            }
            StoreOutcome::Reset { seq, count } => self.after_reset(seq, count),
        }
    }

    pub fn suggestions_loaded(&mut self, seq: FetchSeq, result: Result<Suggestions, FetchError>) {
        if self.ignore_after_teardown("suggestions_loaded") {
            return;
        }
        if self.search_seq.complete(seq) == Verdict::Stale {
            tracing::debug!(%seq, "stale suggestions discarded");
            self.metrics.inc(Counter::StaleDiscarded);
            return;
        }
        match result {
            Ok(s) if s.is_empty() => self.suggestions = None,
            Ok(s) => self.suggestions = Some(s),
            Err(error) => {
                tracing::warn!(%seq, %error, "search failed");
                self.fetch_failed(&error);
            }
        }
    }

    /// Shows the movie detail and selects the movie's locations.
    pub fn movie_loaded(
        &mut self,
        seq: FetchSeq,
        result: Result<MovieDetail, FetchError>,
        now: Millis,
    ) {
        if self.ignore_after_teardown("movie_loaded") {
            return;
        }
        if self.movie_seq.complete(seq) == Verdict::Stale {
            tracing::debug!(%seq, "stale movie detail discarded");
            self.metrics.inc(Counter::StaleDiscarded);
            return;
        }
        match result {
            Ok(detail) => {
                let target = SelectionTarget::Movie {
                    id: detail.id.clone(),
                    bbox: detail.bbox(),
                };
                self.movie_detail = Some(detail);
                self.select(target, now);
            }
            Err(error) => {
                tracing::warn!(%seq, %error, "movie detail fetch failed");
                self.fetch_failed(&error);
            }
        }
    }

    pub fn cities_loaded(
        &mut self,
        seq: FetchSeq,
        result: Result<Vec<City>, FetchError>,
        now: Millis,
    ) {
        if self.ignore_after_teardown("cities_loaded") {
            return;
        }
        if self.city_seq.complete(seq) == Verdict::Stale {
            self.metrics.inc(Counter::StaleDiscarded);
            return;
        }
        match result {
            Ok(cities) => {
                self.cities = cities;
                if let Some(first) = self.cities.first().map(|c| c.id.clone()) {
                    if let Err(error) = self.select_city(&first, now) {
                        tracing::warn!(%error, "initial city not applied");
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%seq, %error, "city list fetch failed");
                self.fetch_failed(&error);
            }
        }
    }

    // ---- read access --------------------------------------------------

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn map(&self) -> &W {
        self.viewport.widget()
    }

    /// Direct widget access for simulating user interaction; call
    /// `viewport_changed` afterwards.
    pub fn map_mut(&mut self) -> &mut W {
        self.viewport.markers_mut()
    }

    pub fn list(&self) -> &L {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut L {
        &mut self.list
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn xref(&self) -> &CrossReferenceIndex {
        &self.xref
    }

    pub fn highlights(&self) -> &HighlightEngine {
        &self.highlights
    }

    pub fn resolver(&self) -> &SelectionResolver {
        &self.resolver
    }

    pub fn events_mut(&mut self) -> &mut SessionEvents {
        &mut self.events
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city(&self) -> Option<&CityId> {
        self.city.as_ref()
    }

    /// Visible search suggestions; `None` when the dropdown is hidden.
    pub fn suggestions(&self) -> Option<&Suggestions> {
        self.suggestions.as_ref()
    }

    pub fn movie_detail(&self) -> Option<&MovieDetail> {
        self.movie_detail.as_ref()
    }

    // ---- internals ----------------------------------------------------

    fn ensure_alive(&mut self) -> Result<(), SessionError> {
        if self.alive {
            Ok(())
        } else {
            self.metrics.inc(Counter::TeardownIgnored);
            Err(SessionError::TornDown)
        }
    }

    fn ignore_after_teardown(&mut self, what: &'static str) -> bool {
        if self.alive {
            return false;
        }
        tracing::debug!(input = what, "ignored after teardown");
        self.metrics.inc(Counter::TeardownIgnored);
        true
    }

    /// Every viewport change, programmatic or not, re-arms the location
    /// debouncer at the time it happened.
    fn drain_viewport_changes(&mut self) {
        for change in self.viewport.poll_changes(&self.viewport_changes) {
            self.location_debounce.trigger(change.at);
        }
    }

    fn after_reset(&mut self, seq: FetchSeq, count: usize) {
        tracing::info!(%seq, count, "locations reset");
        self.metrics.inc(Counter::StoreReset);
        self.metrics.set_gauge("store.entities", count as i64);

        // Pins and tiles are gone; only the set itself still refers to them.
        self.highlights.forget_all();
        self.xref.rebuild(&self.store);
        self.street_view.reset();
        self.street_view.refresh(&self.store, &mut self.list);
        self.events.reset_completed.publish(ResetCompleted { seq, count });

        if let Some(pending) = self.resolver.on_reset(seq) {
            tracing::info!(
                token = pending.token,
                target = ?pending.target,
                "deferred selection applied"
            );
            self.metrics.inc(Counter::SelectionApplied);
            self.apply_target(&pending.target);
        }
        self.metrics
            .set_gauge("highlight.count", self.highlights.len() as i64);
    }

    fn select(&mut self, target: SelectionTarget, now: Millis) {
        if self.resolver.pending().is_some() {
            self.metrics.inc(Counter::SelectionSuperseded);
        }
        let resolution = self.resolver.select(
            target.clone(),
            self.viewport.bounds(),
            self.viewport.center(),
            self.store.latest_seq(),
        );
        match resolution {
            Resolution::Immediate(target) => {
                tracing::info!(?target, "selection applied immediately");
                self.metrics.inc(Counter::SelectionApplied);
                self.apply_target(&target);
            }
            Resolution::Deferred { token, movement } => {
                tracing::info!(token, ?movement, "selection deferred until next load");
                self.metrics.inc(Counter::SelectionDeferred);
                self.events.selection_pending.publish(SelectionPending {
                    token,
                    target: target.pending(),
                });
                match movement {
                    ViewportMove::PanTo(center) => self.viewport.pan_to(center, now),
                    ViewportMove::FitBounds(bounds) => self.viewport.fit_bounds(bounds, now),
                }
                self.drain_viewport_changes();
            }
        }
    }

    fn apply_target(&mut self, target: &PendingTarget) {
        let mut proj = projection(
            &self.store,
            &mut self.viewport,
            &mut self.list,
            &mut self.events.highlight_changed,
        );
        match target {
            PendingTarget::Location(id) => {
                if self.highlights.highlight(id, &mut proj) == HighlightOutcome::Unknown {
                    self.metrics.inc(Counter::UnknownReference);
                }
            }
            PendingTarget::Movie(id) => {
                if self.xref.lookup(id).is_empty() {
                    tracing::debug!(movie = %id, "selected movie has no visible locations");
                    self.metrics.inc(Counter::UnknownReference);
                }
                self.highlights.highlight_movie(id, &self.xref, &mut proj);
            }
        }
    }

    fn toggle(&mut self, id: &LocationId) -> HighlightOutcome {
        let mut proj = projection(
            &self.store,
            &mut self.viewport,
            &mut self.list,
            &mut self.events.highlight_changed,
        );
        let outcome = self.highlights.toggle(id, &mut proj);
        if outcome == HighlightOutcome::Unknown {
            self.metrics.inc(Counter::UnknownReference);
        }
        outcome
    }

    fn fetch_failed(&mut self, error: &FetchError) {
        self.metrics.inc(Counter::FetchFailed);
        self.events.fetch_failed.publish(FetchFailed {
            endpoint: error.endpoint,
            message: error.to_string(),
        });
    }
}

fn projection<'a, W: MapWidget, L: ListSurface>(
    store: &'a EntityStore,
    viewport: &'a mut ViewportAdapter<W>,
    list: &'a mut L,
    events: &'a mut Topic<HighlightChanged>,
) -> Projection<'a, W, L> {
    Projection {
        store,
        markers: viewport.markers_mut(),
        list,
        events,
    }
}
