//! Catalog filtering and paging.
//!
//! Filtering runs entirely on the client over the fetched catalog. The
//! result is recomputed from scratch whenever the [`FilterSpec`] changes.

use std::collections::BTreeSet;

use joyeria_shared::{PriceRange, Product};

/// 3 x 3 grid.
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Everything that decides which products are shown, and which page of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub query: String,
    pub categories: BTreeSet<String>,
    pub materials: BTreeSet<String>,
    /// Ids into [`joyeria_shared::PRICE_RANGES`].
    pub price_ranges: BTreeSet<String>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            query: String::new(),
            categories: BTreeSet::new(),
            materials: BTreeSet::new(),
            price_ranges: BTreeSet::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

impl FilterSpec {
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page = 1;
    }

    pub fn toggle_category(&mut self, category: &str) {
        toggle(&mut self.categories, category);
        self.page = 1;
    }

    pub fn toggle_material(&mut self, material: &str) {
        toggle(&mut self.materials, material);
        self.page = 1;
    }

    pub fn toggle_price_range(&mut self, range_id: &str) {
        toggle(&mut self.price_ranges, range_id);
        self.page = 1;
    }

    /// Drop every criterion and return to the first page. Page size is kept.
    pub fn clear(&mut self) {
        *self = Self {
            page_size: self.page_size,
            ..Self::default()
        };
    }

    pub fn has_criteria(&self) -> bool {
        !self.query.trim().is_empty()
            || !self.categories.is_empty()
            || !self.materials.is_empty()
            || !self.price_ranges.is_empty()
    }

    pub fn matches(&self, product: &Product) -> bool {
        let query = self.query.trim().to_lowercase();
        if !query.is_empty() {
            let haystack = format!(
                "{} {} {} {}",
                product.name, product.meta, product.description, product.category
            )
            .to_lowercase();
            if !haystack.contains(&query) {
                return false;
            }
        }

        if !self.categories.is_empty() && !self.categories.contains(&product.category) {
            return false;
        }
        if !self.materials.is_empty() && !self.materials.contains(&product.material) {
            return false;
        }

        if !self.price_ranges.is_empty() {
            // Unknown ids are skipped, not treated as matching.
            let in_any = self
                .price_ranges
                .iter()
                .filter_map(|id| PriceRange::by_id(id))
                .any(|range| range.contains(product.price));
            if !in_any {
                return false;
            }
        }

        true
    }

    /// Matching products in input order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    pub fn next_page(&mut self, match_count: usize) {
        self.goto(self.page.saturating_add(1), match_count);
    }

    pub fn prev_page(&mut self, match_count: usize) {
        self.goto(self.page.saturating_sub(1), match_count);
    }

    /// Jump to page `n`, clamped to `[1, total_pages]`.
    pub fn goto(&mut self, n: usize, match_count: usize) {
        let last = total_pages(match_count, self.page_size);
        self.page = n.clamp(1, last);
    }
}

/// Number of pages for `match_count` results; never less than 1.
pub fn total_pages(match_count: usize, page_size: usize) -> usize {
    match_count.div_ceil(page_size.max(1)).max(1)
}

/// Distinct non-empty values of `field`, in first-seen order.
fn distinct<'a>(products: &'a [Product], field: impl Fn(&'a Product) -> &'a str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in products.iter().map(field) {
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

pub fn category_facets(products: &[Product]) -> Vec<String> {
    distinct(products, |p| p.category.as_str())
}

pub fn material_facets(products: &[Product]) -> Vec<String> {
    distinct(products, |p| p.material.as_str())
}

/// What one screen of results shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<'a> {
    pub items: Vec<&'a Product>,
    /// Matches across all pages.
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub show_all: bool,
}

impl<'a> PageView<'a> {
    /// Slice `matches` for `page`, or keep everything when `show_all`.
    pub fn new(matches: Vec<&'a Product>, page: usize, page_size: usize, show_all: bool) -> Self {
        let total = matches.len();
        let total_pages = total_pages(total, page_size);
        let page = page.clamp(1, total_pages);

        let items = if show_all {
            matches
        } else {
            let size = page_size.max(1);
            matches
                .into_iter()
                .skip((page - 1) * size)
                .take(size)
                .collect()
        };

        Self {
            items,
            total,
            page,
            total_pages,
            show_all,
        }
    }

    pub fn has_prev(&self) -> bool {
        !self.show_all && self.page > 1
    }

    pub fn has_next(&self) -> bool {
        !self.show_all && self.page < self.total_pages
    }

    /// Nothing matched.
    pub fn no_results(&self) -> bool {
        self.total == 0
    }

    /// Every match is already on screen.
    pub fn no_more_results(&self) -> bool {
        !self.items.is_empty() && self.items.len() == self.total
    }

    /// Pager controls are only useful with more than one page.
    pub fn show_pager(&self) -> bool {
        !self.show_all && self.total_pages > 1
    }
}
