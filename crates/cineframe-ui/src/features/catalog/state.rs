//! Paginated list controller shared by the catalog and admin listings.
//!
//! # Design
//! - The in-flight guard is taken when an operation is *issued*, before its future is
//!   polled, so two calls in immediate succession produce one request.
//! - Returned futures are `'static` and keep only a weak handle to the controller; a
//!   response that lands after the controller is dropped is discarded.
//! - Every refetch bumps a generation counter. Responses from an older generation are
//!   dropped and never clear the current guard.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use crate::core::filters::FilterSet;
use crate::core::observe::{Listeners, Subscription};
use crate::error::{ApiResult, ListError};
use crate::services::api::{ListResult, Resource, ResourceClient};
use crate::services::transport::Transport;

/// How pages are requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListMode {
    /// Pages of `page_size` items with load-more.
    #[default]
    Paginate,
    /// The whole collection in one request, no `page`/`limit` sent.
    FetchAll,
}

/// Lifecycle of a listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A request is outstanding.
    Fetching,
    /// The last request succeeded.
    Loaded,
    /// The last request failed; previously loaded items are kept.
    Error,
}

/// Items accumulated so far plus the paging cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct ListPage<R> {
    /// Items across every loaded page, in server order.
    pub items: Vec<R>,
    /// Last page loaded (1-based).
    pub current_page: u32,
    /// Total matches reported by the server.
    pub total_count: u64,
    /// Whether another page can be requested.
    pub has_more: bool,
}

impl<R> Default for ListPage<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_count: 0,
            has_more: false,
        }
    }
}

/// Owned copy of the controller state for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct ListSnapshot<R> {
    /// Loaded items and cursor.
    pub page: ListPage<R>,
    /// Current lifecycle state.
    pub status: ListStatus,
    /// Error from the last failed request.
    pub error: Option<ListError>,
    /// Filters the listing was loaded with.
    pub filters: FilterSet,
    /// Paging mode.
    pub mode: ListMode,
}

impl<R> ListSnapshot<R> {
    /// Whether a request is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Fetching
    }
}

struct ListState<R> {
    page: ListPage<R>,
    status: ListStatus,
    error: Option<ListError>,
    filters: FilterSet,
    mode: ListMode,
    in_flight: bool,
    generation: u64,
}

struct Ticket {
    generation: u64,
    append: bool,
    query: Vec<(String, String)>,
}

struct Shared<R: Resource, T> {
    client: ResourceClient<R, T>,
    page_size: u32,
    state: RefCell<ListState<R>>,
    listeners: Listeners,
}

/// Drives one filtered, paginated listing of resource `R`.
pub struct ListController<R: Resource, T> {
    shared: Rc<Shared<R, T>>,
}

impl<R: Resource, T> fmt::Debug for ListController<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("ListController")
            .field("resource", &R::LABEL)
            .field("status", &state.status)
            .field("items", &state.page.items.len())
            .field("in_flight", &state.in_flight)
            .finish_non_exhaustive()
    }
}

impl<R: Resource, T: Transport + 'static> ListController<R, T> {
    /// Idle controller; nothing is requested until [`Self::refetch`].
    #[must_use]
    pub fn new(client: ResourceClient<R, T>, filters: FilterSet, mode: ListMode) -> Self {
        let page_size = client.api().config().page_size;
        Self {
            shared: Rc::new(Shared {
                client,
                page_size,
                state: RefCell::new(ListState {
                    page: ListPage::default(),
                    status: ListStatus::Idle,
                    error: None,
                    filters,
                    mode,
                    in_flight: false,
                    generation: 0,
                }),
                listeners: Listeners::default(),
            }),
        }
    }

    /// Controller already fetching page 1; drive the returned future to complete it.
    pub fn open(
        client: ResourceClient<R, T>,
        filters: FilterSet,
        mode: ListMode,
    ) -> (Self, impl Future<Output = ()> + 'static + use<R, T>) {
        let controller = Self::new(client, filters, mode);
        let first_load = controller.refetch();
        (controller, first_load)
    }

    /// Request the next page and append it. No-op unless loaded, more pages remain,
    /// nothing is in flight, and the mode is [`ListMode::Paginate`].
    pub fn load_more(&self) -> impl Future<Output = ()> + 'static + use<R, T> {
        let ticket = {
            let mut state = self.shared.state.borrow_mut();
            let ready = state.status == ListStatus::Loaded
                && state.page.has_more
                && !state.in_flight
                && state.mode == ListMode::Paginate;
            if ready {
                state.in_flight = true;
                state.status = ListStatus::Fetching;
                let next = state.page.current_page + 1;
                Some(Ticket {
                    generation: state.generation,
                    append: true,
                    query: self.shared.query_for(&state.filters, state.mode, next),
                })
            } else {
                None
            }
        };
        if ticket.is_some() {
            self.shared.listeners.notify();
        }
        self.dispatch(ticket)
    }

    /// Drop loaded items and reload page 1, superseding any outstanding request.
    pub fn refetch(&self) -> impl Future<Output = ()> + 'static + use<R, T> {
        let ticket = {
            let mut state = self.shared.state.borrow_mut();
            state.generation += 1;
            state.in_flight = true;
            state.status = ListStatus::Fetching;
            state.error = None;
            state.page = ListPage::default();
            Ticket {
                generation: state.generation,
                append: false,
                query: self.shared.query_for(&state.filters, state.mode, 1),
            }
        };
        self.shared.listeners.notify();
        self.dispatch(Some(ticket))
    }

    /// Switch filters; refetches only when they differ from the current ones.
    pub fn set_filters(
        &self,
        filters: FilterSet,
    ) -> impl Future<Output = ()> + 'static + use<R, T> {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            if state.filters == filters {
                false
            } else {
                state.filters = filters;
                true
            }
        };
        self.refetch_if(changed)
    }

    /// Switch paging mode; refetches only on change.
    pub fn set_mode(&self, mode: ListMode) -> impl Future<Output = ()> + 'static + use<R, T> {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            if state.mode == mode {
                false
            } else {
                state.mode = mode;
                true
            }
        };
        self.refetch_if(changed)
    }

    fn refetch_if(&self, changed: bool) -> impl Future<Output = ()> + 'static + use<R, T> {
        let refetch = changed.then(|| self.refetch());
        async move {
            if let Some(refetch) = refetch {
                refetch.await;
            }
        }
    }

    fn dispatch(&self, ticket: Option<Ticket>) -> impl Future<Output = ()> + 'static + use<R, T> {
        let weak: Weak<Shared<R, T>> = Rc::downgrade(&self.shared);
        let client = self.shared.client.clone();
        async move {
            let Some(ticket) = ticket else {
                return;
            };
            let result = client.list(ticket.query.clone()).await;
            match weak.upgrade() {
                Some(shared) => shared.complete(&ticket, result),
                None => tracing::debug!(resource = R::LABEL, "list dropped before response"),
            }
        }
    }
}

impl<R: Resource, T> ListController<R, T> {
    /// Register a callback fired after every state transition.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        self.shared.listeners.subscribe(callback)
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ListSnapshot<R> {
        let state = self.shared.state.borrow();
        ListSnapshot {
            page: state.page.clone(),
            status: state.status,
            error: state.error.clone(),
            filters: state.filters.clone(),
            mode: state.mode,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> ListStatus {
        self.shared.state.borrow().status
    }

    /// Whether a request is outstanding.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.shared.state.borrow().in_flight
    }

    /// Items requested per page in [`ListMode::Paginate`].
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.shared.page_size
    }
}

impl<R: Resource, T> Shared<R, T> {
    fn query_for(&self, filters: &FilterSet, mode: ListMode, page: u32) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if mode == ListMode::Paginate {
            query.push(("page".to_string(), page.to_string()));
            query.push(("limit".to_string(), self.page_size.to_string()));
        }
        query.extend(
            filters
                .to_api_params()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );
        query
    }

    fn complete(&self, ticket: &Ticket, result: ApiResult<ListResult<R>>) {
        {
            let mut state = self.state.borrow_mut();
            if ticket.generation != state.generation {
                tracing::warn!(
                    resource = R::LABEL,
                    generation = ticket.generation,
                    current = state.generation,
                    "discarding stale list response"
                );
                return;
            }
            state.in_flight = false;
            match result {
                Ok(list) => {
                    let paginated = state.mode == ListMode::Paginate;
                    let page = &mut state.page;
                    if ticket.append {
                        page.items.extend(list.items);
                    } else {
                        page.items = list.items;
                    }
                    page.current_page = if paginated {
                        list.pagination.current_page.max(1)
                    } else {
                        1
                    };
                    page.total_count = list.pagination.total;
                    page.has_more = paginated && list.pagination.has_more();
                    state.status = ListStatus::Loaded;
                    state.error = None;
                }
                Err(err) => {
                    tracing::warn!(resource = R::LABEL, error = %err, "list load failed");
                    state.status = ListStatus::Error;
                    state.error = Some(ListError::fetch_failed(R::LABEL, err));
                }
            }
        }
        self.listeners.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::core::filters::FilterKey;
    use crate::core::session::Session;
    use crate::error::ApiError;
    use crate::services::api::ApiClient;
    use crate::services::stub::StubTransport;
    use cineframe_api_models::Movie;
    use serde_json::{Value, json};
    use std::cell::Cell;
    use std::ops::RangeInclusive;

    fn movie_page(ids: RangeInclusive<i64>, current: u32, last: u32, total: u64) -> Value {
        let movies: Vec<Value> = ids
            .map(|id| json!({"id": id, "title": format!("Movie {id}")}))
            .collect();
        json!({
            "movies": movies,
            "pagination": {"current_page": current, "last_page": last, "total": total}
        })
    }

    fn movies_client(stub: &StubTransport) -> ResourceClient<Movie, StubTransport> {
        ApiClient::new(
            stub.clone(),
            Session::anonymous(),
            ClientConfig::new("http://api.test"),
        )
        .movies()
    }

    fn ids(controller: &ListController<Movie, StubTransport>) -> Vec<i64> {
        controller
            .snapshot()
            .page
            .items
            .iter()
            .map(|movie| movie.id)
            .collect()
    }

    #[tokio::test]
    async fn first_page_of_three_reports_more() {
        let stub = StubTransport::new();
        stub.push_json(200, movie_page(1..=10, 1, 3, 25));
        let filters = FilterSet::default().with(FilterKey::Genre, "4");
        let (list, load) = ListController::open(movies_client(&stub), filters, ListMode::Paginate);
        assert_eq!(list.status(), ListStatus::Fetching);
        load.await;

        let snapshot = list.snapshot();
        assert_eq!(snapshot.status, ListStatus::Loaded);
        assert_eq!(snapshot.page.items.len(), 10);
        assert_eq!(snapshot.page.total_count, 25);
        assert!(snapshot.page.has_more);
        assert_eq!(
            stub.requests()[0].full_url(),
            "http://api.test/movies?page=1&limit=10&genre=4"
        );
    }

    #[tokio::test]
    async fn load_more_appends_until_last_page() {
        let stub = StubTransport::new();
        stub.push_json(200, movie_page(1..=10, 1, 3, 25))
            .push_json(200, movie_page(11..=20, 2, 3, 25))
            .push_json(200, movie_page(21..=25, 3, 3, 25));
        let (list, load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::Paginate);
        load.await;
        list.load_more().await;
        assert_eq!(list.snapshot().page.current_page, 2);
        list.load_more().await;

        let page = list.snapshot().page;
        assert_eq!(page.items.len(), 25);
        assert_eq!(page.current_page, 3);
        assert!(!page.has_more);

        list.load_more().await;
        assert_eq!(stub.request_count(), 3);
        assert_eq!(stub.requests()[2].query_value("page"), Some("3"));
    }

    #[tokio::test]
    async fn immediate_load_mores_issue_one_request() {
        let stub = StubTransport::new();
        stub.push_json(200, movie_page(1..=10, 1, 3, 25))
            .push_json(200, movie_page(11..=20, 2, 3, 25));
        let (list, load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::Paginate);
        load.await;

        let first = list.load_more();
        let second = list.load_more();
        tokio::join!(first, second);

        assert_eq!(stub.request_count(), 2);
        assert_eq!(list.snapshot().page.items.len(), 20);
    }

    #[tokio::test]
    async fn refetch_returns_to_first_page() {
        let stub = StubTransport::new();
        stub.push_json(200, movie_page(1..=10, 1, 3, 25))
            .push_json(200, movie_page(11..=20, 2, 3, 25))
            .push_json(200, movie_page(1..=10, 1, 3, 25));
        let (list, load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::Paginate);
        load.await;
        list.load_more().await;

        let pending = list.refetch();
        assert!(list.snapshot().page.items.is_empty());
        pending.await;

        assert_eq!(ids(&list), (1..=10).collect::<Vec<_>>());
        assert_eq!(list.snapshot().page.current_page, 1);
    }

    #[tokio::test]
    async fn fetch_all_sends_no_paging_and_never_has_more() {
        let stub = StubTransport::new();
        stub.push_json(200, movie_page(1..=12, 1, 3, 12));
        let (list, load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::FetchAll);
        load.await;

        let request = &stub.requests()[0];
        assert_eq!(request.query_value("page"), None);
        assert_eq!(request.query_value("limit"), None);
        assert!(!list.snapshot().page.has_more);

        list.load_more().await;
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_items_and_releases_guard() {
        let stub = StubTransport::new();
        stub.push_json(200, movie_page(1..=10, 1, 3, 25))
            .push_failure(ApiError::network("offline"));
        let (list, load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::Paginate);
        load.await;
        list.load_more().await;

        let snapshot = list.snapshot();
        assert_eq!(snapshot.status, ListStatus::Error);
        assert_eq!(snapshot.page.items.len(), 10);
        assert_eq!(
            snapshot.error.map(|err| err.message).as_deref(),
            Some("Failed to fetch movies")
        );
        assert!(!list.is_in_flight());

        list.load_more().await;
        assert_eq!(stub.request_count(), 2);
    }

    #[tokio::test]
    async fn equal_filters_do_not_refetch() {
        let stub = StubTransport::new();
        stub.push_json(200, movie_page(1..=10, 1, 1, 10))
            .push_json(200, movie_page(40..=41, 1, 1, 2));
        let filters = FilterSet::default().with(FilterKey::Year, "1999");
        let (list, load) =
            ListController::open(movies_client(&stub), filters.clone(), ListMode::Paginate);
        load.await;

        list.set_filters(filters.clone()).await;
        list.set_mode(ListMode::Paginate).await;
        assert_eq!(stub.request_count(), 1);

        list.set_filters(filters.with(FilterKey::Search, "matrix")).await;
        assert_eq!(stub.request_count(), 2);
        assert_eq!(stub.requests()[1].query_value("search"), Some("matrix"));
        assert_eq!(ids(&list), vec![40, 41]);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let stub = StubTransport::new();
        let gate = stub.push_held_json(200, movie_page(1..=10, 1, 3, 25));
        stub.push_json(200, movie_page(90..=91, 1, 1, 2));
        let (list, first_load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::Paginate);

        tokio::join!(first_load, async {
            tokio::task::yield_now().await;
            list.set_filters(FilterSet::default().with(FilterKey::Search, "heat"))
                .await;
            gate.open();
        });

        assert_eq!(stub.request_count(), 2);
        assert_eq!(ids(&list), vec![90, 91]);
        assert_eq!(list.status(), ListStatus::Loaded);
        assert!(!list.is_in_flight());
    }

    #[tokio::test]
    async fn superseded_load_more_does_not_append() {
        let stub = StubTransport::new();
        stub.push_json(200, movie_page(1..=10, 1, 3, 25));
        let gate = stub.push_held_json(200, movie_page(11..=20, 2, 3, 25));
        stub.push_json(200, movie_page(1..=10, 1, 3, 25));
        let (list, load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::Paginate);
        load.await;

        tokio::join!(list.load_more(), async {
            tokio::task::yield_now().await;
            list.refetch().await;
            gate.open();
        });

        let page = list.snapshot().page;
        assert_eq!(ids(&list), (1..=10).collect::<Vec<_>>());
        assert_eq!(page.current_page, 1);
        assert!(page.has_more);
        assert_eq!(list.status(), ListStatus::Loaded);
        assert!(!list.is_in_flight());

        let gate = stub.push_held_json(200, movie_page(11..=20, 2, 3, 25));
        stub.push_json(200, movie_page(50..=51, 1, 1, 2));
        tokio::join!(list.load_more(), async {
            tokio::task::yield_now().await;
            list.set_filters(FilterSet::default().with(FilterKey::Search, "heat"))
                .await;
            gate.open();
        });
        assert_eq!(ids(&list), vec![50, 51]);
        assert!(!list.snapshot().page.has_more);
    }

    #[tokio::test]
    async fn pages_advance_without_reported_current_page() {
        let stub = StubTransport::new();
        for range in [1..=10, 11..=20, 21..=25] {
            let movies: Vec<Value> = range.map(|id| json!({"id": id})).collect();
            stub.push_json(
                200,
                json!({"movies": movies, "pagination": {"last_page": 3, "total": 25}}),
            );
        }
        let (list, load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::Paginate);
        load.await;
        assert_eq!(list.snapshot().page.current_page, 1);
        list.load_more().await;
        list.load_more().await;
        list.load_more().await;

        let pages: Vec<_> = stub
            .requests()
            .iter()
            .map(|request| request.query_value("page").map(str::to_string))
            .collect();
        assert_eq!(pages, vec![Some("1".into()), Some("2".into()), Some("3".into())]);
        let page = list.snapshot().page;
        assert_eq!(page.current_page, 3);
        assert_eq!(page.items.len(), 25);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn response_after_drop_is_ignored() {
        let stub = StubTransport::new();
        let gate = stub.push_held_json(200, movie_page(1..=10, 1, 1, 10));
        let (list, load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::Paginate);
        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        let subscription = list.subscribe(move || counter.set(counter.get() + 1));

        tokio::join!(load, async move {
            tokio::task::yield_now().await;
            drop(subscription);
            drop(list);
            gate.open();
        });

        assert_eq!(stub.request_count(), 1);
        assert_eq!(notified.get(), 0);
    }

    #[tokio::test]
    async fn subscribers_see_each_transition() {
        let stub = StubTransport::new();
        stub.push_json(200, movie_page(1..=10, 1, 2, 20))
            .push_json(200, movie_page(11..=20, 2, 2, 20));
        let (list, load) =
            ListController::open(movies_client(&stub), FilterSet::default(), ListMode::Paginate);
        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        let _subscription = list.subscribe(move || counter.set(counter.get() + 1));

        load.await;
        assert_eq!(notified.get(), 1);
        list.load_more().await;
        assert_eq!(notified.get(), 3);
    }
}
