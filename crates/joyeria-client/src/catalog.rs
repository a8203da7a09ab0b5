//! Controller for the catalog ("Colecciones") page.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use joyeria_shared::{Product, ProductQuery};

use crate::api::ApiClient;
use crate::cart::Cart;
use crate::error::{CartError, ClientError};
use crate::filter::{category_facets, material_facets, FilterSpec, PageView};
use crate::store::Store;
use crate::url_state::UrlSync;

const LOAD_FAILED: &str = "No fue posible cargar productos";

/// Shared "still mounted" flag. The page's owner keeps a clone and flips it
/// on teardown; fetches completing afterwards are discarded.
#[derive(Debug, Clone)]
pub struct MountHandle(Arc<AtomicBool>);

impl MountHandle {
    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Failed,
    /// The page was unmounted before the fetch completed.
    Discarded,
}

pub struct CatalogPage {
    products: Vec<Product>,
    loading: bool,
    error: Option<String>,
    spec: FilterSpec,
    show_all: bool,
    url: UrlSync,
    mounted: MountHandle,
    cart: Store<Cart>,
}

impl CatalogPage {
    pub fn new(cart: Store<Cart>) -> Self {
        let spec = FilterSpec::default();
        Self {
            products: Vec::new(),
            loading: false,
            error: None,
            url: UrlSync::new(&spec),
            spec,
            show_all: false,
            mounted: MountHandle(Arc::new(AtomicBool::new(true))),
            cart,
        }
    }

    pub fn mount_handle(&self) -> MountHandle {
        self.mounted.clone()
    }

    pub fn unmount(&self) {
        self.mounted.unmount();
    }

    /// Run `fetch` and adopt its result if the page is still mounted.
    pub async fn load<F>(&mut self, fetch: F) -> LoadOutcome
    where
        F: Future<Output = Result<Vec<Product>, ClientError>>,
    {
        self.loading = true;
        self.error = None;

        let result = fetch.await;

        if !self.mounted.is_mounted() {
            debug!("catalog fetch finished after unmount, discarding");
            return LoadOutcome::Discarded;
        }
        self.loading = false;

        match result {
            Ok(products) => {
                let count = products.len();
                self.products = products;
                debug!(count, "catalog loaded");
                LoadOutcome::Loaded(count)
            }
            Err(e) => {
                error!(error = %e, "catalog load failed");
                let message = e.to_string();
                self.error = Some(if message.trim().is_empty() {
                    LOAD_FAILED.to_string()
                } else {
                    message
                });
                LoadOutcome::Failed
            }
        }
    }

    /// Fetch the full catalog from the API.
    pub async fn load_from(&mut self, api: &ApiClient) -> LoadOutcome {
        self.load(api.list_products(&ProductQuery::default())).await
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn categories(&self) -> Vec<String> {
        category_facets(&self.products)
    }

    pub fn materials(&self) -> Vec<String> {
        material_facets(&self.products)
    }

    fn match_count(&self) -> usize {
        self.spec.apply(&self.products).len()
    }

    /// The current screen of results.
    pub fn view(&self) -> PageView<'_> {
        PageView::new(
            self.spec.apply(&self.products),
            self.spec.page,
            self.spec.page_size,
            self.show_all,
        )
    }

    // ------------------------------------------------------------------
    // Filters and paging
    // ------------------------------------------------------------------

    pub fn set_query(&mut self, query: &str) {
        self.spec.set_query(query);
        self.show_all = false;
    }

    pub fn toggle_category(&mut self, category: &str) {
        self.spec.toggle_category(category);
    }

    pub fn toggle_material(&mut self, material: &str) {
        self.spec.toggle_material(material);
    }

    pub fn toggle_price_range(&mut self, range_id: &str) {
        self.spec.toggle_price_range(range_id);
    }

    pub fn clear_filters(&mut self) {
        self.spec.clear();
        self.show_all = false;
    }

    pub fn goto_page(&mut self, n: usize) {
        let count = self.match_count();
        self.spec.goto(n, count);
        self.show_all = false;
    }

    pub fn next_page(&mut self) {
        let count = self.match_count();
        self.spec.next_page(count);
    }

    pub fn prev_page(&mut self) {
        let count = self.match_count();
        self.spec.prev_page(count);
    }

    pub fn toggle_show_all(&mut self) {
        self.show_all = !self.show_all;
        if self.show_all {
            self.spec.page = 1;
        }
    }

    // ------------------------------------------------------------------
    // URL sync
    // ------------------------------------------------------------------

    /// Adopt filter state from the address bar. Returns whether anything
    /// changed.
    pub fn apply_url(&mut self, query: &str) -> bool {
        match self.url.on_url_change(query, &self.spec) {
            Some(spec) => {
                self.spec = spec;
                true
            }
            None => false,
        }
    }

    /// Query string to push to the address bar, if local state moved.
    pub fn pending_url(&mut self) -> Option<String> {
        self.url.on_state_change(&self.spec)
    }

    // ------------------------------------------------------------------
    // Cart
    // ------------------------------------------------------------------

    pub fn add_to_cart(&self, id: Uuid) -> Result<(), CartError> {
        let product = self
            .products
            .iter()
            .find(|p| p.id == id)
            .ok_or(CartError::UnknownProduct(id))?;

        self.cart
            .try_update(|cart| cart.add_product(product))
            .map_err(|e| {
                warn!(product_id = %id, error = %e, "add to cart refused");
                e
            })
    }
}
